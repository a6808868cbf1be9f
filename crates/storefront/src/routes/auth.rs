//! Authentication route handlers.
//!
//! Customers log in with email and password against the REST API's
//! `POST /auth/login`; the bearer token it returns is stored in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use pawpal_core::Email;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::safe_redirect_target;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Login form data. Not `Debug`: it carries the password.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    /// Set when a backend call rejected the stored token.
    pub expired: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub next: String,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Display the login page.
///
/// An `expired` marker drops the stale customer from the session first.
#[instrument(skip(session, customer))]
pub async fn login_page(
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    let next = safe_redirect_target(query.next.as_deref()).to_string();

    if query.expired.is_some() {
        clear_current_customer(&session).await?;
        clear_sentry_user();
    } else if customer.is_some() {
        return Ok(Redirect::to(&next).into_response());
    }

    Ok(LoginTemplate {
        layout: Layout::default(),
        email: String::new(),
        next,
        notice: query
            .expired
            .map(|_| "Your session has expired. Please log in again.".to_string()),
        error: None,
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_redirect_target(form.next.as_deref()).to_string();
    let retry = |email: String, error: &str| {
        (
            StatusCode::UNAUTHORIZED,
            LoginTemplate {
                layout: Layout::default(),
                email,
                next: next.clone(),
                notice: None,
                error: Some(error.to_string()),
            },
        )
            .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return Ok(retry(form.email, &e.to_string())),
    };
    let password = SecretString::from(form.password);

    match state.api().login(&email, &password).await {
        Ok(result) => {
            let customer = CurrentCustomer::from(result);
            set_current_customer(&session, &customer).await?;
            set_sentry_user(&customer.id, Some(customer.email.as_str()));
            tracing::info!(user_id = %customer.id, "Customer logged in");
            Ok(Redirect::to(&next).into_response())
        }
        Err(ApiError::Unauthorized | ApiError::Rejected(_) | ApiError::NotFound(_)) => {
            tracing::warn!("Login failed for {email}");
            Ok(retry(email.to_string(), "Invalid email or password"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out and destroy the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_customer(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}
