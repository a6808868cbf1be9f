//! User analytics (admin role only).

use askama::Template;
use axum::{extract::State, response::Html};
use pawpal_core::UserDashboard;
use tracing::instrument;

use super::{Nav, or_degrade, render};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// One month in the signup chart.
#[derive(Debug, Clone)]
pub struct SignupBar {
    pub month: String,
    pub count: u64,
    /// Bar height relative to the busiest month, 0-100.
    pub percent: u8,
}

/// User analytics template.
#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub nav: Nav,
    pub stats: UserDashboard,
    pub bars: Vec<SignupBar>,
    pub error: Option<String>,
}

#[must_use]
pub fn signup_bars(stats: &UserDashboard) -> Vec<SignupBar> {
    stats
        .signup_bars()
        .into_iter()
        .map(|(month, count, percent)| SignupBar {
            month,
            count,
            percent,
        })
        .collect()
}

/// User analytics page handler.
#[instrument(skip(state, staff))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(staff): RequireAdmin,
) -> Result<Html<String>> {
    let (result, nav) = tokio::join!(
        state.api().user_dashboard(&staff.access_token),
        Nav::new(&state, &staff, "/users"),
    );
    let (stats, error) = or_degrade(result, "user statistics")?;

    Ok(render(&UsersTemplate {
        nav,
        bars: signup_bars(&stats),
        stats,
        error,
    }))
}
