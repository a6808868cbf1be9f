//! Authentication route handlers.
//!
//! Staff sign in with the same REST `POST /auth/login` customers use; only
//! accounts whose role is marketing or admin are let into the back-office.

use askama::Template;
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

use super::render;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalStaff, clear_current_staff, set_current_staff};
use crate::models::CurrentStaff;
use crate::state::AppState;

/// Login form data. Not `Debug`: it carries the password.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Set when a backend call rejected the stored token.
    pub expired: Option<String>,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Display the login page.
#[instrument(skip(session, staff))]
pub async fn login_page(
    session: Session,
    OptionalStaff(staff): OptionalStaff,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    if query.expired.is_some() {
        clear_current_staff(&session).await?;
        clear_sentry_user();
    } else if staff.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(render(&LoginTemplate {
        email: String::new(),
        notice: query
            .expired
            .map(|_| "Your session has expired. Please sign in again.".to_string()),
        error: None,
    })
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let retry = |status: StatusCode, email: String, error: &str| {
        (
            status,
            render(&LoginTemplate {
                email,
                notice: None,
                error: Some(error.to_string()),
            }),
        )
            .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return Ok(retry(StatusCode::UNAUTHORIZED, form.email, &e.to_string())),
    };
    let password = SecretString::from(form.password);

    let login = match state.api().login(&email, &password).await {
        Ok(login) => login,
        Err(ApiError::Unauthorized | ApiError::Rejected(_) | ApiError::NotFound(_)) => {
            tracing::warn!("Staff login failed for {email}");
            return Ok(retry(
                StatusCode::UNAUTHORIZED,
                email.to_string(),
                "Invalid email or password",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(staff) = CurrentStaff::from_login(login) else {
        tracing::warn!("Non-staff account tried to sign in: {email}");
        return Ok(retry(
            StatusCode::FORBIDDEN,
            email.to_string(),
            "This account does not have back-office access",
        ));
    };

    set_current_staff(&session, &staff).await?;
    set_sentry_user(&staff.id, Some(staff.email.as_str()));
    tracing::info!(staff_id = %staff.id, role = %staff.role, "Staff logged in");

    Ok(Redirect::to("/").into_response())
}

/// Log out and destroy the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_staff(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/auth/login").into_response()
}
