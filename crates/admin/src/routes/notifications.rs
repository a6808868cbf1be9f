//! Live notification feed.

use askama::Template;
use axum::{
    Json,
    extract::State,
    response::{Html, Redirect},
};
use serde::Serialize;
use tracing::instrument;

use super::{Nav, render};
use crate::middleware::RequireStaff;
use crate::notifications::Notification;
use crate::state::AppState;

/// Notification feed template.
#[derive(Template)]
#[template(path = "notifications.html")]
pub struct NotificationsTemplate {
    pub nav: Nav,
    pub notifications: Vec<Notification>,
    /// Whether the socket listener is configured at all.
    pub live: bool,
}

/// Body of `GET /api/notifications/unread`.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: usize,
}

/// Notification feed page handler.
#[instrument(skip(state, staff))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Html<String> {
    let (nav, notifications) = tokio::join!(
        Nav::new(&state, &staff, "/notifications"),
        state.notifications().recent(),
    );
    render(&NotificationsTemplate {
        nav,
        notifications,
        live: state.config().notifications.is_some(),
    })
}

/// Mark every notification read.
#[instrument(skip(state, _staff))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
) -> Redirect {
    state.notifications().mark_all_read().await;
    Redirect::to("/notifications")
}

/// Unread badge count, polled by the layout.
#[instrument(skip(state, _staff))]
pub async fn unread(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
) -> Json<UnreadCount> {
    Json(UnreadCount {
        unread: state.notifications().unread_count().await,
    })
}
