//! Homepage banner management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use pawpal_core::{Banner, BannerId, BannerInput};
use serde::Deserialize;
use tracing::instrument;

use super::{Nav, or_degrade, render};
use crate::api::ApiError;
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::models::CurrentStaff;
use crate::state::AppState;

/// `datetime-local` input format.
const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Banner row for the list.
#[derive(Debug, Clone)]
pub struct BannerRow {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: u32,
    pub status: &'static str,
    pub schedule: String,
}

impl BannerRow {
    fn new(banner: &Banner, now: DateTime<Utc>) -> Self {
        let status = if !banner.active {
            "Inactive"
        } else if banner.starts_at.is_some_and(|start| now < start) {
            "Scheduled"
        } else if banner.ends_at.is_some_and(|end| now > end) {
            "Ended"
        } else {
            "Live"
        };
        let fmt = |dt: Option<DateTime<Utc>>| {
            dt.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
        };
        Self {
            id: banner.id,
            title: banner.title.clone(),
            image_url: banner.image_url.clone(),
            link_url: banner.link_url.clone(),
            position: banner.position,
            status,
            schedule: format!("{} to {}", fmt(banner.starts_at), fmt(banner.ends_at)),
        }
    }
}

/// Raw banner form, as the browser submits it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannerForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub link_url: String,
    #[serde(default)]
    pub position: String,
    /// Checkbox: present when ticked.
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
}

impl BannerForm {
    /// Prefill the form from an existing banner.
    #[must_use]
    pub fn from_banner(banner: &Banner) -> Self {
        let fmt = |dt: Option<DateTime<Utc>>| {
            dt.map(|d| d.format(LOCAL_INPUT_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            title: banner.title.clone(),
            image_url: banner.image_url.clone(),
            link_url: banner.link_url.clone().unwrap_or_default(),
            position: banner.position.to_string(),
            active: banner.active.then(|| "true".to_string()),
            starts_at: fmt(banner.starts_at),
            ends_at: fmt(banner.ends_at),
        }
    }

    /// Whether the active checkbox should render ticked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Parse and validate into the API body.
    ///
    /// # Errors
    ///
    /// Returns every problem with the form as a display message.
    pub fn to_input(&self) -> std::result::Result<BannerInput, Vec<String>> {
        let mut errors = Vec::new();

        let position = match self.position.trim() {
            "" => 0,
            raw => raw.parse::<u32>().unwrap_or_else(|_| {
                errors.push("position must be a whole number".to_string());
                0
            }),
        };
        let starts_at = parse_local_datetime(&self.starts_at).unwrap_or_else(|e| {
            errors.push(format!("start date: {e}"));
            None
        });
        let ends_at = parse_local_datetime(&self.ends_at).unwrap_or_else(|e| {
            errors.push(format!("end date: {e}"));
            None
        });

        let input = BannerInput {
            title: self.title.clone(),
            image_url: self.image_url.clone(),
            link_url: Some(self.link_url.clone()),
            position,
            active: self.is_active(),
            starts_at,
            ends_at,
        };
        match input.validate() {
            Ok(valid) if errors.is_empty() => Ok(valid),
            Ok(_) => Err(errors),
            Err(rules) => {
                errors.extend(rules.iter().map(ToString::to_string));
                Err(errors)
            }
        }
    }
}

/// Parse a `datetime-local` value as UTC; blank means unset.
fn parse_local_datetime(
    raw: &str,
) -> std::result::Result<Option<DateTime<Utc>>, chrono::ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, LOCAL_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| Some(naive.and_utc()))
}

/// Banner list template.
#[derive(Template)]
#[template(path = "banners/index.html")]
pub struct BannersTemplate {
    pub nav: Nav,
    pub banners: Vec<BannerRow>,
    pub error: Option<String>,
}

/// Banner create/edit form template.
#[derive(Template)]
#[template(path = "banners/form.html")]
pub struct BannerFormTemplate {
    pub nav: Nav,
    pub heading: String,
    pub action: String,
    pub form: BannerForm,
    pub errors: Vec<String>,
}

/// Banner list page handler, ordered by position.
#[instrument(skip(state, staff))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Html<String>> {
    let (result, nav) = tokio::join!(
        state.api().banners(&staff.access_token),
        Nav::new(&state, &staff, "/banners"),
    );
    let (mut banners, error) = or_degrade(result, "banners")?;
    banners.sort_by_key(|b| (b.position, b.id));

    let now = Utc::now();
    Ok(render(&BannersTemplate {
        nav,
        banners: banners.iter().map(|b| BannerRow::new(b, now)).collect(),
        error,
    }))
}

/// New banner form handler.
#[instrument(skip(state, staff))]
pub async fn new_form(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Html<String> {
    let form = BannerForm {
        active: Some("true".to_string()),
        ..BannerForm::default()
    };
    render(&form_page(&state, &staff, None, form, Vec::new()).await)
}

/// Create banner handler.
#[instrument(skip(state, staff, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(invalid(&state, &staff, None, form, errors).await),
    };

    match state.api().create_banner(&staff.access_token, &input).await {
        Ok(banner) => {
            tracing::info!(banner_id = %banner.id, staff_id = %staff.id, "Banner created");
            Ok(Redirect::to("/banners").into_response())
        }
        Err(ApiError::Rejected(message)) => {
            Ok(invalid(&state, &staff, None, form, vec![message]).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Edit banner form handler.
#[instrument(skip(state, staff))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<BannerId>,
) -> Result<Html<String>> {
    let banner = state.api().banner(&staff.access_token, id).await?;
    let form = BannerForm::from_banner(&banner);
    Ok(render(
        &form_page(&state, &staff, Some(id), form, Vec::new()).await,
    ))
}

/// Update banner handler.
#[instrument(skip(state, staff, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<BannerId>,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(invalid(&state, &staff, Some(id), form, errors).await),
    };

    match state
        .api()
        .update_banner(&staff.access_token, id, &input)
        .await
    {
        Ok(()) => {
            tracing::info!(banner_id = %id, staff_id = %staff.id, "Banner updated");
            Ok(Redirect::to("/banners").into_response())
        }
        Err(ApiError::Rejected(message)) => {
            Ok(invalid(&state, &staff, Some(id), form, vec![message]).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete banner handler.
#[instrument(skip(state, staff))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<BannerId>,
) -> Result<Redirect> {
    state.api().delete_banner(&staff.access_token, id).await?;
    tracing::info!(banner_id = %id, staff_id = %staff.id, "Banner deleted");
    Ok(Redirect::to("/banners"))
}

async fn form_page(
    state: &AppState,
    staff: &CurrentStaff,
    id: Option<BannerId>,
    form: BannerForm,
    errors: Vec<String>,
) -> BannerFormTemplate {
    let (heading, action) = match id {
        Some(id) => ("Edit banner".to_string(), format!("/banners/{id}/edit")),
        None => ("New banner".to_string(), "/banners/new".to_string()),
    };
    BannerFormTemplate {
        nav: Nav::new(state, staff, "/banners").await,
        heading,
        action,
        form,
        errors,
    }
}

async fn invalid(
    state: &AppState,
    staff: &CurrentStaff,
    id: Option<BannerId>,
    form: BannerForm,
    errors: Vec<String>,
) -> Response {
    let page = form_page(state, staff, id, form, errors).await;
    (StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn form() -> BannerForm {
        BannerForm {
            title: " Back to school ".to_string(),
            image_url: "https://cdn.pawpal.vn/school.jpg".to_string(),
            link_url: String::new(),
            position: "2".to_string(),
            active: Some("true".to_string()),
            starts_at: "2026-09-01T08:00".to_string(),
            ends_at: String::new(),
        }
    }

    #[test]
    fn test_form_to_input() {
        let input = form().to_input().unwrap();
        assert_eq!(input.title, "Back to school");
        assert_eq!(input.position, 2);
        assert!(input.active);
        assert_eq!(input.link_url, None);
        assert_eq!(
            input.starts_at,
            Some(Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(input.ends_at, None);
    }

    #[test]
    fn test_form_collects_every_error() {
        let bad = BannerForm {
            title: String::new(),
            position: "first".to_string(),
            ends_at: "tomorrow".to_string(),
            ..form()
        };
        let errors = bad.to_input().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("position")));
        assert!(errors.iter().any(|e| e.contains("end date")));
        assert!(errors.iter().any(|e| e.contains("title")));
    }

    #[test]
    fn test_form_round_trips_banner_schedule() {
        let banner: Banner = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Tet",
            "imageUrl": "https://cdn.pawpal.vn/tet.jpg",
            "position": 1,
            "active": false,
            "startsAt": "2027-01-20T00:00:00Z"
        }))
        .unwrap();
        let form = BannerForm::from_banner(&banner);
        assert_eq!(form.starts_at, "2027-01-20T00:00");
        assert!(!form.is_active());
        assert_eq!(form.to_input().unwrap().starts_at, banner.starts_at);
    }

    #[test]
    fn test_row_status() {
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let mut banner: Banner = serde_json::from_value(serde_json::json!({
            "id": 1, "title": "A", "imageUrl": "https://cdn/a.jpg"
        }))
        .unwrap();
        assert_eq!(BannerRow::new(&banner, now).status, "Live");

        banner.starts_at = Some(Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(BannerRow::new(&banner, now).status, "Scheduled");

        banner.active = false;
        assert_eq!(BannerRow::new(&banner, now).status, "Inactive");
    }
}
