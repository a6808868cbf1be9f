//! Catalog DTOs mirrored from the REST API: products, variants, categories
//! and homepage banners.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{BannerId, CategoryId, ProductId, VariantId};

/// A product as returned by `GET /products/productById/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub sold: u64,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Lowest and highest variant price, if the product has any variants.
    #[must_use]
    pub fn price_range(&self) -> Option<(Decimal, Decimal)> {
        let mut prices = self.variants.iter().map(|v| v.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Total stock across variants.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// The first variant that can be bought, falling back to the first one.
    #[must_use]
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.in_stock())
            .or_else(|| self.variants.first())
    }

    /// Image to show on cards: the product's own, else the first variant image.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images
            .first()
            .or_else(|| self.variants.iter().find_map(|v| v.images.first()))
            .map(String::as_str)
    }

    /// Reduce to the listing-card shape.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            image: self.cover_image().map(ToString::to_string),
            price: self.price_range().map_or(Decimal::ZERO, |(lo, _)| lo),
            sold: self.sold,
            rating: self.rating,
            category_id: self.category.as_ref().map(|c| c.id),
            in_stock: self.total_stock() > 0,
            created_at: self.created_at,
        }
    }
}

/// A purchasable SKU of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
}

impl Variant {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Attribute values joined for display, e.g. `Size: M / Color: Red`.
    #[must_use]
    pub fn label(&self) -> String {
        if self.attributes.is_empty() {
            return self.sku.clone().unwrap_or_else(|| "Default".to_string());
        }
        self.attributes
            .iter()
            .map(|a| format!("{}: {}", a.name, a.value))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// One attribute value of a variant (size, flavour, colour...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub value: String,
}

/// Minimal category reference embedded in products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// Product card data used by listings, best sellers and the wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub sold: u64,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub product_count: Option<u64>,
}

/// A homepage banner managed by marketing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Banner {
    /// Whether the banner should be shown at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.is_none_or(|start| now >= start)
            && self.ends_at.is_none_or(|end| now <= end)
    }
}

/// Banners that are live at `now`, ordered by position.
#[must_use]
pub fn live_banners(banners: &[Banner], now: DateTime<Utc>) -> Vec<Banner> {
    let mut live: Vec<Banner> = banners
        .iter()
        .filter(|b| b.is_live_at(now))
        .cloned()
        .collect();
    live.sort_by_key(|b| (b.position, b.id));
    live
}
