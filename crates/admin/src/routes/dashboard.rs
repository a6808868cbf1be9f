//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use pawpal_core::{ProductDashboard, UserDashboard, format_vnd};
use tracing::instrument;

use super::{Nav, or_degrade, render};
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::notifications::Notification;
use crate::state::AppState;

/// Notifications previewed on the dashboard.
const RECENT_NOTIFICATIONS: usize = 5;

/// Headline numbers.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub products: String,
    pub variants: String,
    pub out_of_stock: String,
    pub low_stock: String,
    pub sold: String,
    pub revenue: String,
}

impl From<&ProductDashboard> for DashboardMetrics {
    fn from(stats: &ProductDashboard) -> Self {
        Self {
            products: stats.total_products.to_string(),
            variants: stats.total_variants.to_string(),
            out_of_stock: stats.out_of_stock.to_string(),
            low_stock: stats.low_stock.to_string(),
            sold: stats.total_sold.to_string(),
            revenue: format_vnd(stats.revenue),
        }
    }
}

/// Best seller row.
#[derive(Debug, Clone)]
pub struct TopProductView {
    pub name: String,
    pub sold: u64,
    pub revenue: String,
}

/// Customer summary, shown to admins only.
#[derive(Debug, Clone)]
pub struct UserSummaryView {
    pub total: u64,
    pub new_this_month: u64,
    pub active: u64,
}

impl From<&UserDashboard> for UserSummaryView {
    fn from(stats: &UserDashboard) -> Self {
        Self {
            total: stats.total_users,
            new_this_month: stats.new_users_this_month,
            active: stats.active_users,
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub metrics: DashboardMetrics,
    pub top_products: Vec<TopProductView>,
    pub users: Option<UserSummaryView>,
    pub notifications: Vec<Notification>,
    pub errors: Vec<String>,
}

/// Dashboard page handler.
///
/// The product and user dashboards load concurrently; either one failing
/// leaves its panel empty with a notice.
#[instrument(skip(state, staff))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Html<String>> {
    let api = state.api();
    let token = staff.access_token.as_str();
    let users = async {
        if staff.is_admin() {
            Some(api.user_dashboard(token).await)
        } else {
            None
        }
    };

    let (products_result, users_result, nav, recent) = tokio::join!(
        api.product_dashboard(token),
        users,
        Nav::new(&state, &staff, "/"),
        state.notifications().recent(),
    );

    let mut errors = Vec::new();
    let (products, error) = or_degrade(products_result, "product statistics")?;
    errors.extend(error);
    let users = match users_result {
        Some(result) => {
            let (users, error) = or_degrade(result, "user statistics")?;
            errors.extend(error);
            Some(UserSummaryView::from(&users))
        }
        None => None,
    };

    let template = DashboardTemplate {
        nav,
        metrics: DashboardMetrics::from(&products),
        top_products: products
            .top_products
            .iter()
            .map(|p| TopProductView {
                name: p.name.clone(),
                sold: p.sold,
                revenue: format_vnd(p.revenue),
            })
            .collect(),
        users,
        notifications: recent.into_iter().take(RECENT_NOTIFICATIONS).collect(),
        errors,
    };

    Ok(render(&template))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_metrics_format_revenue() {
        let stats = ProductDashboard {
            total_products: 120,
            out_of_stock: 4,
            revenue: Decimal::from(15_250_000),
            ..ProductDashboard::default()
        };
        let metrics = DashboardMetrics::from(&stats);
        assert_eq!(metrics.products, "120");
        assert_eq!(metrics.out_of_stock, "4");
        assert_eq!(metrics.revenue, format_vnd(Decimal::from(15_250_000)));
    }
}
