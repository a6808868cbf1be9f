//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::Utc;
use pawpal_core::{Banner, Category, CategoryId, live_banners};
use tracing::instrument;

use super::Layout;
use super::products::{ProductCardView, load_wishlist};
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Best sellers shown on the homepage.
const BEST_SELLER_LIMIT: usize = 8;

/// Banner slide data for templates.
#[derive(Clone)]
pub struct BannerView {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
}

impl From<Banner> for BannerView {
    fn from(banner: Banner) -> Self {
        Self {
            title: banner.title,
            image_url: banner.image_url,
            link_url: banner.link_url,
        }
    }
}

/// Category tile data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub image: Option<String>,
    pub product_count: Option<u64>,
}

impl From<Category> for CategoryView {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            image: category.image,
            product_count: category.product_count,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub banners: Vec<BannerView>,
    pub categories: Vec<CategoryView>,
    pub best_sellers: Vec<ProductCardView>,
}

/// Display the home page.
///
/// The three sections load concurrently; a section whose fetch fails is
/// left empty.
#[instrument(skip(state, customer))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
) -> HomeTemplate {
    let api = state.api();
    let (banners, categories, best_selling, wishlist) = tokio::join!(
        api.banners(),
        api.popular_categories(),
        api.best_selling(),
        load_wishlist(&state, customer.as_ref()),
    );

    let banners = banners.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch banners: {e}");
        Vec::new()
    });
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch popular categories: {e}");
        Vec::new()
    });
    let best_selling = best_selling.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch best sellers: {e}");
        Vec::new()
    });

    HomeTemplate {
        layout: Layout::new(customer.as_ref()),
        banners: live_banners(&banners, Utc::now())
            .into_iter()
            .map(BannerView::from)
            .collect(),
        categories: categories.into_iter().map(CategoryView::from).collect(),
        best_sellers: best_selling
            .iter()
            .take(BEST_SELLER_LIMIT)
            .map(|p| ProductCardView::new(p, &wishlist))
            .collect(),
    }
}
