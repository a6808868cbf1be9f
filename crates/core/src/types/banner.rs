//! Banner create/edit form used by the back-office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

const MAX_TITLE_LENGTH: usize = 120;

/// Banner form validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BannerError {
    #[error("title is required")]
    MissingTitle,
    #[error("title must be at most {MAX_TITLE_LENGTH} characters")]
    TitleTooLong,
    #[error("image URL must be an absolute http(s) URL")]
    InvalidImageUrl,
    #[error("link must be an absolute URL or a path starting with /")]
    InvalidLink,
    #[error("start date must not be after end date")]
    InvalidSchedule,
}

/// Body of `POST /banners` and `PUT /banners/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInput {
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl BannerInput {
    /// Validate and normalize the form.
    ///
    /// # Errors
    ///
    /// Returns every rule the input breaks.
    pub fn validate(&self) -> Result<Self, Vec<BannerError>> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.push(BannerError::MissingTitle);
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(BannerError::TitleTooLong);
        }

        let image_url = self.image_url.trim().to_string();
        if !is_http_url(&image_url) {
            errors.push(BannerError::InvalidImageUrl);
        }

        let link_url = self
            .link_url
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string);
        if let Some(link) = &link_url
            && !(is_http_url(link) || (link.starts_with('/') && !link.starts_with("//")))
        {
            errors.push(BannerError::InvalidLink);
        }

        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at)
            && start > end
        {
            errors.push(BannerError::InvalidSchedule);
        }

        if errors.is_empty() {
            Ok(Self {
                title,
                image_url,
                link_url,
                ..self.clone()
            })
        } else {
            Err(errors)
        }
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}
