//! Cache types for catalog responses.

use pawpal_core::{Banner, Category, CategoryId, Product, ProductId, ProductSummary};

/// Cache key for catalog lookups. Customer-specific data is never cached.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Banners,
    PopularCategories,
    ParentCategories,
    BestSelling,
    Product(ProductId),
    Products { category: Option<CategoryId> },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Banners(Vec<Banner>),
    Categories(Vec<Category>),
    Products(Vec<ProductSummary>),
    Product(Box<Product>),
}
