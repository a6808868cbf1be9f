//! Listing filters and sort orders for the product grid and the
//! back-office review/ticket tables.

use core::fmt;
use core::str::FromStr;
use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    CategoryId, ProductSummary, Review, ReviewStatus, SupportTicket, TicketStatus,
};

/// Lowercased, trimmed search text, or `None` when blank.
fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Product grid filter, built from the listing page's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub in_stock_only: bool,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &ProductSummary) -> bool {
        let search = normalize_search(self.search.as_deref());
        self.matches_with(product, search.as_deref())
    }

    fn matches_with(&self, product: &ProductSummary, search: Option<&str>) -> bool {
        self.category_id
            .is_none_or(|id| product.category_id == Some(id))
            && search.is_none_or(|s| contains_folded(&product.name, s))
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && (!self.in_stock_only || product.in_stock)
    }

    /// Keep the products that match, preserving order.
    #[must_use]
    pub fn apply(&self, products: Vec<ProductSummary>) -> Vec<ProductSummary> {
        let search = normalize_search(self.search.as_deref());
        products
            .into_iter()
            .filter(|p| self.matches_with(p, search.as_deref()))
            .collect()
    }

    /// Whether any constraint is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.category_id.is_some()
            || normalize_search(self.search.as_deref()).is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.in_stock_only
    }
}

/// Product grid sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    BestSelling,
    NameAsc,
}

impl ProductSort {
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::BestSelling,
        Self::NameAsc,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::BestSelling => "best_selling",
            Self::NameAsc => "name_asc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::BestSelling => "Best selling",
            Self::NameAsc => "Name: A to Z",
        }
    }

    fn compare(self, a: &ProductSummary, b: &ProductSummary) -> Ordering {
        match self {
            // Undated products sort last.
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::BestSelling => b.sold.cmp(&a.sold),
            Self::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }

    /// Stable sort: ties keep their incoming order.
    pub fn sort(self, products: &mut [ProductSummary]) {
        products.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid sort order: {s}"))
    }
}

/// Review moderation table filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
    pub rating: Option<u8>,
    pub search: Option<String>,
}

impl ReviewFilter {
    /// Keep the reviews that match, newest first.
    #[must_use]
    pub fn apply(&self, reviews: Vec<Review>) -> Vec<Review> {
        let search = normalize_search(self.search.as_deref());
        let mut kept: Vec<Review> = reviews
            .into_iter()
            .filter(|r| {
                self.status.is_none_or(|s| r.status == s)
                    && self.rating.is_none_or(|stars| r.stars() == stars)
                    && search.as_deref().is_none_or(|s| {
                        contains_folded(&r.comment, s)
                            || contains_folded(&r.user_name, s)
                            || r.product_name
                                .as_deref()
                                .is_some_and(|name| contains_folded(name, s))
                    })
            })
            .collect();
        kept.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        kept
    }
}

/// Support ticket queue filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub search: Option<String>,
}

impl TicketFilter {
    /// Keep the tickets that match, oldest first so the queue is worked in
    /// arrival order.
    #[must_use]
    pub fn apply(&self, tickets: Vec<SupportTicket>) -> Vec<SupportTicket> {
        let search = normalize_search(self.search.as_deref());
        let mut kept: Vec<SupportTicket> = tickets
            .into_iter()
            .filter(|t| {
                self.status.is_none_or(|s| t.status == s)
                    && search.as_deref().is_none_or(|s| {
                        contains_folded(&t.subject, s)
                            || contains_folded(&t.customer_name, s)
                            || contains_folded(&t.customer_email, s)
                    })
            })
            .collect();
        kept.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        kept
    }
}
