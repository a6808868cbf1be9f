//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard (staff)
//! GET  /                          - Product dashboard (+ user summary for admins)
//!
//! # Users (admin only)
//! GET  /users                     - User analytics
//!
//! # Banners (staff)
//! GET  /banners                   - Banner list
//! GET  /banners/new               - New banner form
//! POST /banners/new               - Create banner
//! GET  /banners/{id}/edit         - Edit banner form
//! POST /banners/{id}/edit         - Update banner
//! POST /banners/{id}/delete       - Delete banner
//!
//! # Reviews (staff)
//! GET  /reviews                   - Moderation table (filter, paginate)
//! POST /reviews/{id}/moderate     - Approve / hide / reset a review
//!
//! # Support tickets (staff)
//! GET  /tickets                   - Ticket queue (filter, paginate)
//! GET  /tickets/{id}              - Ticket detail
//! POST /tickets/{id}              - Update status, assignee, response
//!
//! # Notifications (staff)
//! GET  /notifications             - Live feed
//! POST /notifications/read        - Mark all read
//! GET  /api/notifications/unread  - Unread count (JSON)
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! POST /auth/logout               - Logout action
//! ```

pub mod auth;
pub mod banners;
pub mod dashboard;
pub mod notifications;
pub mod reviews;
pub mod tickets;
pub mod users;

use std::fmt::Display;
use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use pawpal_core::Paginated;
use serde::{Deserialize, Deserializer};
use url::form_urlencoded;

use crate::api::ApiError;
use crate::error::AppError;
use crate::models::CurrentStaff;
use crate::state::AppState;

/// How many page numbers the pager shows around the current page.
const PAGER_WINDOW: usize = 5;

/// Staff member view for templates.
#[derive(Debug, Clone)]
pub struct StaffView {
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
}

impl From<&CurrentStaff> for StaffView {
    fn from(staff: &CurrentStaff) -> Self {
        Self {
            name: staff.name.clone(),
            email: staff.email.to_string(),
            role: staff.role.to_string(),
            is_admin: staff.is_admin(),
        }
    }
}

/// Sidebar and header data every back-office page needs.
#[derive(Debug, Clone)]
pub struct Nav {
    pub admin_user: StaffView,
    pub current_path: &'static str,
    pub unread_notifications: usize,
}

impl Nav {
    /// Build the nav for `staff` on the section at `current_path`.
    pub async fn new(state: &AppState, staff: &CurrentStaff, current_path: &'static str) -> Self {
        Self {
            admin_user: StaffView::from(staff),
            current_path,
            unread_notifications: state.notifications().unread_count().await,
        }
    }
}

/// One numbered link in a pager.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Pager data for templates.
#[derive(Debug, Clone, Default)]
pub struct PagerView {
    pub previous: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
}

impl PagerView {
    /// Links for `page`, keeping the table's filters in each URL.
    #[must_use]
    pub fn new<T>(path: &str, filters: &[(&str, String)], page: &Paginated<T>) -> Self {
        let href = |number: usize| {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (key, value) in filters {
                query.append_pair(key, value);
            }
            query.append_pair("page", &number.to_string());
            format!("{path}?{}", query.finish())
        };
        Self {
            previous: page.has_previous().then(|| href(page.previous_page())),
            next: page.has_next().then(|| href(page.next_page())),
            pages: page
                .page_numbers(PAGER_WINDOW)
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    current: number == page.current_page,
                })
                .collect(),
        }
    }
}

/// Option for a filter or status select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Render a template, logging failures.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Keep a page usable when one section fails to load.
///
/// An expired token still propagates so the staff member is sent to log
/// in again; every other failure is logged and replaced with `T::default()`
/// plus a message for the page.
///
/// # Errors
///
/// Returns `AppError::Api(ApiError::Unauthorized)` unchanged.
pub fn or_degrade<T: Default>(
    result: Result<T, ApiError>,
    section: &str,
) -> Result<(T, Option<String>), AppError> {
    match result {
        Ok(value) => Ok((value, None)),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!(section, error = %e, "Failed to load section");
            Ok((T::default(), Some(format!("Could not load {section}."))))
        }
    }
}

/// A redirect target from a form, accepted only if it stays on this site.
#[must_use]
pub fn safe_return_path<'a>(path: Option<&'a str>, fallback: &'a str) -> &'a str {
    path.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .unwrap_or(fallback)
}

/// Deserialize an optional query/form value, treating `""` as absent.
///
/// # Errors
///
/// Returns a deserialization error if a non-empty value fails to parse.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Create the banner routes router.
pub fn banner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::index))
        .route("/new", get(banners::new_form).post(banners::create))
        .route("/{id}/edit", get(banners::edit_form).post(banners::update))
        .route("/{id}/delete", post(banners::delete))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reviews::index))
        .route("/{id}/moderate", post(reviews::moderate))
}

/// Create the ticket routes router.
pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tickets::index))
        .route("/{id}", get(tickets::show).post(tickets::update))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index))
        .route("/read", post(notifications::mark_read))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the back-office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/users", get(users::index))
        .nest("/banners", banner_routes())
        .nest("/reviews", review_routes())
        .nest("/tickets", ticket_routes())
        .nest("/notifications", notification_routes())
        .route("/api/notifications/unread", get(notifications::unread))
        .nest("/auth", auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pawpal_core::{PageRequest, paginate};

    use super::*;

    #[test]
    fn test_pager_keeps_filters() {
        let rows: Vec<u32> = (0..45).collect();
        let page = paginate(rows, PageRequest::new(2, 20));
        let pager = PagerView::new("/reviews", &[("status", "PENDING".to_string())], &page);

        assert_eq!(pager.previous.as_deref(), Some("/reviews?status=PENDING&page=1"));
        assert_eq!(pager.next.as_deref(), Some("/reviews?status=PENDING&page=3"));
        assert_eq!(pager.pages.len(), 3);
        assert!(pager.pages[1].current);
    }

    #[test]
    fn test_pager_centres_current_page() {
        let rows: Vec<u32> = (0..200).collect();
        let page = paginate(rows, PageRequest::new(5, 20));
        let pager = PagerView::new("/tickets", &[], &page);

        let numbers: Vec<usize> = pager.pages.iter().map(|link| link.number).collect();
        assert_eq!(numbers, vec![3, 4, 5, 6, 7]);
        assert_eq!(pager.pages[2].href, "/tickets?page=5");
        assert!(pager.pages[2].current);
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/reviews?page=2"), "/reviews"), "/reviews?page=2");
        assert_eq!(safe_return_path(Some("//evil.example"), "/reviews"), "/reviews");
        assert_eq!(safe_return_path(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_return_path(None, "/tickets"), "/tickets");
    }

    #[test]
    fn test_or_degrade() {
        let (value, error) = or_degrade::<Vec<u8>>(Err(ApiError::MissingData), "reviews").unwrap();
        assert!(value.is_empty());
        assert_eq!(error.as_deref(), Some("Could not load reviews."));

        assert!(matches!(
            or_degrade::<Vec<u8>>(Err(ApiError::Unauthorized), "reviews"),
            Err(AppError::Api(ApiError::Unauthorized))
        ));
        assert_eq!(or_degrade(Ok(vec![1u8]), "x").unwrap().0, vec![1]);
    }
}
