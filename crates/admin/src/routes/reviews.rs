//! Review moderation.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use pawpal_core::{
    PageRequest, Review, ReviewFilter, ReviewId, ReviewStatus, average_rating, paginate,
};
use serde::Deserialize;
use tracing::instrument;

use super::{
    Nav, PagerView, SelectOption, empty_string_as_none, or_degrade, render, safe_return_path,
};
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::state::AppState;

/// Moderation table query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewsQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
}

impl ReviewsQuery {
    #[must_use]
    pub fn filter(&self) -> ReviewFilter {
        ReviewFilter {
            status: self.status,
            rating: self.rating.filter(|r| (1..=5).contains(r)),
            search: self.q.clone(),
        }
    }

    /// Filter values to carry into pager links.
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(rating) = self.rating {
            pairs.push(("rating", rating.to_string()));
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        pairs
    }
}

/// Review row for the moderation table.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub product: String,
    pub user_name: String,
    pub stars: String,
    pub comment: String,
    pub status: &'static str,
    pub created_at: String,
    /// Statuses this review can be moved to.
    pub actions: Vec<(&'static str, &'static str)>,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        let stars = review.stars();
        Self {
            id: review.id,
            product: review
                .product_name
                .clone()
                .unwrap_or_else(|| format!("Product #{}", review.product_id)),
            user_name: review.user_name.clone(),
            stars: "★".repeat(usize::from(stars)) + &"☆".repeat(usize::from(5 - stars)),
            comment: review.comment.clone(),
            status: review.status.label(),
            created_at: review.created_at.format("%Y-%m-%d %H:%M").to_string(),
            actions: ReviewStatus::ALL
                .into_iter()
                .filter(|s| *s != review.status)
                .map(|s| (s.as_str(), s.label()))
                .collect(),
        }
    }
}

/// Review moderation template.
#[derive(Template)]
#[template(path = "reviews.html")]
pub struct ReviewsTemplate {
    pub nav: Nav,
    pub reviews: Vec<ReviewRow>,
    pub total: usize,
    pub average: Option<String>,
    pub status_options: Vec<SelectOption>,
    pub rating_options: Vec<SelectOption>,
    pub q: String,
    pub pager: PagerView,
    /// Current URL, so moderation returns to the same page.
    pub return_to: String,
    pub error: Option<String>,
}

/// Moderation table handler.
#[instrument(skip(state, staff))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<ReviewsQuery>,
) -> Result<Html<String>> {
    let (result, nav) = tokio::join!(
        state.api().reviews(&staff.access_token),
        Nav::new(&state, &staff, "/reviews"),
    );
    let (reviews, error) = or_degrade(result, "reviews")?;

    let filtered = query.filter().apply(reviews);
    let average = average_rating(&filtered).map(|avg| avg.to_string());
    let request = PageRequest::new(query.page.unwrap_or(1), state.config().page_size);
    let page = paginate(filtered, request);

    let pairs = query.pairs();
    let pager = PagerView::new("/reviews", &pairs, &page);
    let mut return_to = String::from("/reviews");
    if let Some(link) = pager.pages.iter().find(|p| p.current) {
        return_to.clone_from(&link.href);
    }

    let template = ReviewsTemplate {
        nav,
        reviews: page.items.iter().map(ReviewRow::from).collect(),
        total: page.total_items,
        average,
        status_options: ReviewStatus::ALL
            .into_iter()
            .map(|s| SelectOption {
                value: s.as_str().to_string(),
                label: s.label().to_string(),
                selected: query.status == Some(s),
            })
            .collect(),
        rating_options: (1..=5u8)
            .rev()
            .map(|r| SelectOption {
                value: r.to_string(),
                label: format!("{r} stars"),
                selected: query.rating == Some(r),
            })
            .collect(),
        q: query.q.clone().unwrap_or_default(),
        pager,
        return_to,
        error,
    };

    Ok(render(&template))
}

/// Moderation form data.
#[derive(Debug, Deserialize)]
pub struct ModerateForm {
    pub status: ReviewStatus,
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Set a review's moderation status.
#[instrument(skip(state, staff))]
pub async fn moderate(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ReviewId>,
    Form(form): Form<ModerateForm>,
) -> Result<Redirect> {
    state
        .api()
        .moderate_review(&staff.access_token, id, form.status)
        .await?;
    tracing::info!(
        review_id = %id,
        status = %form.status,
        staff_id = %staff.id,
        "Review moderated"
    );

    Ok(Redirect::to(safe_return_path(
        form.return_to.as_deref(),
        "/reviews",
    )))
}
