//! Back-office DTOs: support tickets, product reviews and dashboard stats.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, ReviewId, TicketId};
use super::status::{ReviewStatus, TicketStatus};

/// A customer support request routed to the marketing/handler queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: TicketId,
    pub subject: String,
    pub message: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `PATCH /tickets/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// A product review left by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Rating clamped to the 1..=5 star scale.
    #[must_use]
    pub fn stars(&self) -> u8 {
        self.rating.clamp(1, 5)
    }
}

/// Mean star rating of a set of reviews, to one decimal place.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<Decimal> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.stars())).sum();
    let count = u32::try_from(reviews.len()).ok()?;
    Some((Decimal::from(total) / Decimal::from(count)).round_dp(1))
}

/// `GET /products/dashboard` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDashboard {
    pub total_products: u64,
    #[serde(default)]
    pub total_variants: u64,
    #[serde(default)]
    pub out_of_stock: u64,
    #[serde(default)]
    pub low_stock: u64,
    #[serde(default)]
    pub total_sold: u64,
    #[serde(default)]
    pub revenue: Decimal,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
}

/// A best-selling product row on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub sold: u64,
    #[serde(default)]
    pub revenue: Decimal,
}

/// `GET /users/dashboard` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboard {
    pub total_users: u64,
    #[serde(default)]
    pub new_users_this_month: u64,
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub signups_by_month: Vec<MonthlyCount>,
}

impl UserDashboard {
    /// Signup bars scaled to a 0..=100 width for the analytics chart.
    #[must_use]
    pub fn signup_bars(&self) -> Vec<(String, u64, u8)> {
        let max = self
            .signups_by_month
            .iter()
            .map(|m| m.count)
            .max()
            .unwrap_or(0);
        self.signups_by_month
            .iter()
            .map(|m| {
                let pct = if max == 0 {
                    0
                } else {
                    u8::try_from(m.count.saturating_mul(100) / max).unwrap_or(100)
                };
                (m.month.clone(), m.count, pct)
            })
            .collect()
    }
}

/// Count for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: u64,
}
