//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use pawpal_core::{
    Category, CategoryId, PageRequest, Paginated, Product, ProductFilter, ProductId,
    ProductSort, ProductSummary, Wishlist, format_vnd, paginate,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use url::form_urlencoded;

use super::{Layout, empty_string_as_none};
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// How many page numbers the pager shows around the current page.
const PAGER_WINDOW: usize = 5;

/// Product card data for templates (listing, homepage, wishlist).
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    pub sold: u64,
    pub rating: Option<String>,
    pub in_stock: bool,
    pub wishlisted: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &ProductSummary, wishlist: &Wishlist) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            image: product.image.clone(),
            price: format_vnd(product.price),
            sold: product.sold,
            rating: product.rating.map(|r| format!("{r:.1}")),
            in_stock: product.in_stock,
            wishlisted: wishlist.contains(product.id),
        }
    }
}

/// Variant display data for templates.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub label: String,
    pub price: String,
    pub stock: u32,
    pub in_stock: bool,
    pub selected: bool,
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub price: String,
    pub images: Vec<String>,
    pub variants: Vec<VariantView>,
    pub sold: u64,
    pub rating: Option<String>,
    pub in_stock: bool,
    pub wishlisted: bool,
}

impl ProductView {
    fn new(product: &Product, wishlisted: bool) -> Self {
        let default_variant = product.default_variant().map(|v| v.id);
        let price = match product.price_range() {
            Some((lo, hi)) if lo == hi => format_vnd(lo),
            Some((lo, hi)) => format!("{} - {}", format_vnd(lo), format_vnd(hi)),
            None => format_vnd(Decimal::ZERO),
        };

        let mut images = product.images.clone();
        for variant in &product.variants {
            for image in &variant.images {
                if !images.contains(image) {
                    images.push(image.clone());
                }
            }
        }

        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.as_ref().map(|c| c.name.clone()),
            price,
            images,
            variants: product
                .variants
                .iter()
                .map(|v| VariantView {
                    id: v.id.to_string(),
                    label: v.label(),
                    price: format_vnd(v.price),
                    stock: v.stock,
                    in_stock: v.in_stock(),
                    selected: Some(v.id) == default_variant,
                })
                .collect(),
            sold: product.sold,
            rating: product.rating.map(|r| format!("{r:.1}")),
            in_stock: product.total_stock() > 0,
            wishlisted,
        }
    }
}

/// A numbered pager link.
#[derive(Clone)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Pager data for templates.
#[derive(Clone, Default)]
pub struct PagerView {
    pub previous: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
}

/// Sort option for the listing's select box.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Category option for the listing's filter.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub selected: bool,
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub in_stock: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort: Option<ProductSort>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
}

impl ListingQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            category_id: self.category,
            search: self.q.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock_only: self.in_stock.as_deref().is_some_and(|v| !v.is_empty()),
        }
    }

    fn sort(&self) -> ProductSort {
        self.sort.unwrap_or_default()
    }

    /// Listing URL for `page`, keeping every other parameter.
    fn page_href(&self, page: usize) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(category) = self.category {
            query.append_pair("category", &category.to_string());
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query.append_pair("q", q);
        }
        if let Some(min) = self.min_price {
            query.append_pair("min_price", &min.to_string());
        }
        if let Some(max) = self.max_price {
            query.append_pair("max_price", &max.to_string());
        }
        if self.filter().in_stock_only {
            query.append_pair("in_stock", "1");
        }
        if let Some(sort) = self.sort {
            query.append_pair("sort", sort.as_str());
        }
        query.append_pair("page", &page.to_string());
        format!("/products?{}", query.finish())
    }

    fn pager<T>(&self, page: &Paginated<T>) -> PagerView {
        PagerView {
            previous: page
                .has_previous()
                .then(|| self.page_href(page.previous_page())),
            next: page.has_next().then(|| self.page_href(page.next_page())),
            pages: page
                .page_numbers(PAGER_WINDOW)
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: self.page_href(number),
                    current: number == page.current_page,
                })
                .collect(),
        }
    }
}

/// Filter, sort and slice the catalog for one listing page.
#[must_use]
pub fn listing_page(
    products: Vec<ProductSummary>,
    filter: &ProductFilter,
    sort: ProductSort,
    request: PageRequest,
) -> Paginated<ProductSummary> {
    let mut products = filter.apply(products);
    sort.sort(&mut products);
    paginate(products, request)
}

/// The customer's wishlist, or an empty one when anonymous or on error.
pub(crate) async fn load_wishlist(
    state: &AppState,
    customer: Option<&CurrentCustomer>,
) -> Wishlist {
    let Some(customer) = customer else {
        return Wishlist::new();
    };
    match state.api().wishlist(&customer.access_token).await {
        Ok(products) => products.iter().map(|p| p.id).collect(),
        Err(e) => {
            tracing::warn!("Failed to load wishlist: {e}");
            Wishlist::new()
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryOption>,
    pub sort_options: Vec<SortOption>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub in_stock_only: bool,
    pub total_items: usize,
    pub pager: PagerView,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
}

/// Display product listing.
///
/// Fetch failures degrade to an empty grid with an inline error.
#[instrument(skip(state, customer))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<ListingQuery>,
) -> ProductsIndexTemplate {
    let api = state.api();
    let (products, categories, wishlist) = tokio::join!(
        api.products(query.category),
        api.parent_categories(),
        load_wishlist(&state, customer.as_ref()),
    );

    let mut error = None;
    let products = products.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch products: {e}");
        error = Some("We couldn't load products right now. Please try again.".to_string());
        Vec::new()
    });
    let categories: Vec<Category> = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories: {e}");
        Vec::new()
    });

    let filter = query.filter();
    let sort = query.sort();
    let request = PageRequest::new(
        query.page.unwrap_or(1),
        state.config().products_per_page,
    );
    let page = listing_page(products, &filter, sort, request);
    let pager = query.pager(&page);
    let total_items = page.total_items;

    ProductsIndexTemplate {
        layout: Layout::new(customer.as_ref()),
        products: page
            .items
            .iter()
            .map(|p| ProductCardView::new(p, &wishlist))
            .collect(),
        categories: categories
            .into_iter()
            .map(|c| CategoryOption {
                selected: Some(c.id) == query.category,
                id: c.id,
                name: c.name,
            })
            .collect(),
        sort_options: ProductSort::ALL
            .into_iter()
            .map(|s| SortOption {
                value: s.as_str(),
                label: s.label(),
                selected: s == sort,
            })
            .collect(),
        search: query.q.clone().unwrap_or_default(),
        min_price: query.min_price.map(|p| p.to_string()).unwrap_or_default(),
        max_price: query.max_price.map(|p| p.to_string()).unwrap_or_default(),
        in_stock_only: filter.in_stock_only,
        total_items,
        pager,
        error,
    }
}

/// Display product detail page.
#[instrument(skip(state, customer), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<ProductShowTemplate> {
    let (product, wishlist) = tokio::join!(
        state.api().product(id),
        load_wishlist(&state, customer.as_ref()),
    );
    let product = product?;

    Ok(ProductShowTemplate {
        layout: Layout::new(customer.as_ref()),
        product: ProductView::new(&product, wishlist.contains(id)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn summary(id: i64, name: &str, price: i64, in_stock: bool) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            name: name.to_string(),
            image: None,
            price: Decimal::from(price),
            sold: 0,
            rating: None,
            category_id: None,
            in_stock,
            created_at: None,
        }
    }

    #[test]
    fn test_listing_page_filters_sorts_and_slices() {
        let products = vec![
            summary(1, "Cat Tree", 900_000, true),
            summary(2, "Cat Food", 150_000, true),
            summary(3, "Dog Bed", 400_000, true),
            summary(4, "Cat Toy", 50_000, false),
        ];
        let filter = ProductFilter {
            search: Some("cat".to_string()),
            in_stock_only: true,
            ..ProductFilter::default()
        };
        let page = listing_page(products, &filter, ProductSort::PriceAsc, PageRequest::new(1, 1));

        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].name, "Cat Food");
    }

    #[test]
    fn test_page_href_keeps_filters() {
        let query = ListingQuery {
            category: Some(CategoryId::new(2)),
            q: Some("  bowl ".to_string()),
            in_stock: Some("1".to_string()),
            sort: Some(ProductSort::PriceDesc),
            ..ListingQuery::default()
        };
        assert_eq!(
            query.page_href(3),
            "/products?category=2&q=bowl&in_stock=1&sort=price_desc&page=3"
        );
    }

    #[test]
    fn test_pager_links() {
        let query = ListingQuery::default();
        let items: Vec<u32> = (0..30).collect();
        let page = paginate(items, PageRequest::new(2, 12));
        let pager = query.pager(&page);

        assert_eq!(pager.previous.as_deref(), Some("/products?page=1"));
        assert_eq!(pager.next.as_deref(), Some("/products?page=3"));
        assert_eq!(pager.pages.len(), 3);
        assert!(pager.pages[1].current);
    }

    #[test]
    fn test_card_marks_wishlisted() {
        let wishlist: Wishlist = [ProductId::new(2)].into_iter().collect();
        let card = ProductCardView::new(&summary(2, "Cat Food", 150_000, true), &wishlist);
        assert!(card.wishlisted);
        assert_eq!(card.price, "150,000₫");
    }
}
