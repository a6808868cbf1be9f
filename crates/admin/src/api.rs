//! PawPal REST API client for the back-office.
//!
//! Every call is made with the signed-in staff member's bearer token; the
//! backend enforces roles as well, so a 401/403 means the token is no
//! longer good for this page. Nothing is cached: moderation and ticket
//! work must always see the latest state.

use std::sync::Arc;

use pawpal_core::{
    ApiEnvelope, Banner, BannerId, BannerInput, Email, EnvelopeError, LoginResult,
    ProductDashboard, Review, ReviewId, ReviewStatus, SupportTicket, TicketId, TicketUpdate,
    UserDashboard,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// API answered `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token is missing, expired or lacks permission.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Successful envelope without the expected payload.
    #[error("Response contained no data")]
    MissingData,

    /// Failed to parse response or build the request URL.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<EnvelopeError> for ApiError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Rejected(message) => Self::Rejected(message),
            EnvelopeError::MissingData => Self::MissingData,
        }
    }
}

/// Client for the PawPal REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ReviewStatusBody {
    status: ReviewStatus,
}

impl ApiClient {
    /// Create a new REST API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pawpal-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Parse(format!("invalid API path {path}: {e}")))
    }

    fn authed(&self, method: Method, path: &str, token: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .inner
            .client
            .request(method, self.url(path)?)
            .bearer_auth(token))
    }

    /// Send a request and decode the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "REST API returned non-success status"
            );
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(ApiEnvelope {
                success: true,
                data: None,
                message: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to parse REST API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(request)
            .await?
            .into_data_or_default()?;
        Ok(())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange staff credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Rejected` for bad
    /// credentials, or another error if the request fails.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResult, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("auth/login")?)
            .json(&LoginBody {
                email: email.as_str(),
                password: password.expose_secret(),
            });
        Ok(self.send(request).await?.into_data()?)
    }

    // =========================================================================
    // Dashboards
    // =========================================================================

    /// Catalog and sales statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn product_dashboard(&self, token: &str) -> Result<ProductDashboard, ApiError> {
        let request = self.authed(Method::GET, "products/dashboard", token)?;
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// Customer account statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn user_dashboard(&self, token: &str) -> Result<UserDashboard, ApiError> {
        let request = self.authed(Method::GET, "users/dashboard", token)?;
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    // =========================================================================
    // Banners
    // =========================================================================

    /// Every banner, including inactive and scheduled ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn banners(&self, token: &str) -> Result<Vec<Banner>, ApiError> {
        let request = self.authed(Method::GET, "banners", token)?;
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// One banner, looked up in the full list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no banner has this ID.
    pub async fn banner(&self, token: &str, id: BannerId) -> Result<Banner, ApiError> {
        self.banners(token)
            .await?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("banner {id}")))
    }

    /// Create a banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the backend rejects it.
    #[instrument(skip(self, token, input), fields(title = %input.title))]
    pub async fn create_banner(
        &self,
        token: &str,
        input: &BannerInput,
    ) -> Result<Banner, ApiError> {
        let request = self.authed(Method::POST, "banners", token)?.json(input);
        Ok(self.send(request).await?.into_data()?)
    }

    /// Replace a banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the backend rejects it.
    #[instrument(skip(self, token, input))]
    pub async fn update_banner(
        &self,
        token: &str,
        id: BannerId,
        input: &BannerInput,
    ) -> Result<(), ApiError> {
        let request = self
            .authed(Method::PUT, &format!("banners/{id}"), token)?
            .json(input);
        self.send_empty(request).await
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_banner(&self, token: &str, id: BannerId) -> Result<(), ApiError> {
        let request = self.authed(Method::DELETE, &format!("banners/{id}"), token)?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Every product review.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn reviews(&self, token: &str) -> Result<Vec<Review>, ApiError> {
        let request = self.authed(Method::GET, "reviews", token)?;
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// Approve or hide a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn moderate_review(
        &self,
        token: &str,
        id: ReviewId,
        status: ReviewStatus,
    ) -> Result<(), ApiError> {
        let request = self
            .authed(Method::PATCH, &format!("reviews/{id}"), token)?
            .json(&ReviewStatusBody { status });
        self.send_empty(request).await
    }

    // =========================================================================
    // Support tickets
    // =========================================================================

    /// Every support ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn tickets(&self, token: &str) -> Result<Vec<SupportTicket>, ApiError> {
        let request = self.authed(Method::GET, "tickets", token)?;
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// One support ticket.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the ticket does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn ticket(&self, token: &str, id: TicketId) -> Result<SupportTicket, ApiError> {
        let request = self.authed(Method::GET, &format!("tickets/{id}"), token)?;
        self.send(request)
            .await?
            .into_data()
            .map_err(|e| match e {
                EnvelopeError::MissingData => ApiError::NotFound(format!("ticket {id}")),
                other => other.into(),
            })
    }

    /// Change a ticket's status, assignee or response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the backend rejects it.
    #[instrument(skip(self, token, update), fields(status = %update.status))]
    pub async fn update_ticket(
        &self,
        token: &str,
        id: TicketId,
        update: &TicketUpdate,
    ) -> Result<(), ApiError> {
        let request = self
            .authed(Method::PATCH, &format!("tickets/{id}"), token)?
            .json(update);
        self.send_empty(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pawpal_core::TicketStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: Url::parse(&format!("{}/", server.uri())).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_dashboards_send_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/dashboard"))
            .and(header("authorization", "Bearer staff"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"totalProducts": 42, "outOfStock": 3, "revenue": "1250000"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"totalUsers": 310, "signupsByMonth": [{"month": "2026-09", "count": 12}]}
            })))
            .mount(&server)
            .await;

        let api = client(&server);
        let products = api.product_dashboard("staff").await.unwrap();
        assert_eq!(products.total_products, 42);
        assert_eq!(products.out_of_stock, 3);
        let users = api.user_dashboard("staff").await.unwrap();
        assert_eq!(users.signups_by_month[0].count, 12);
    }

    #[tokio::test]
    async fn test_banner_crud_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/banners"))
            .and(body_json(json!({
                "title": "Tet sale",
                "imageUrl": "https://cdn.pawpal.vn/tet.jpg",
                "position": 1,
                "active": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": 7, "title": "Tet sale", "imageUrl": "https://cdn.pawpal.vn/tet.jpg"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/banners/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/banners/7"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server);
        let input = BannerInput {
            title: "Tet sale".to_string(),
            image_url: "https://cdn.pawpal.vn/tet.jpg".to_string(),
            position: 1,
            active: true,
            ..BannerInput::default()
        };
        let banner = api.create_banner("t", &input).await.unwrap();
        assert_eq!(banner.id, BannerId::new(7));
        api.update_banner("t", banner.id, &input).await.unwrap();
        api.delete_banner("t", banner.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_banner_lookup_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/banners"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 1, "title": "A", "imageUrl": "https://cdn/a.jpg"}]
            })))
            .mount(&server)
            .await;

        let api = client(&server);
        assert_eq!(api.banner("t", BannerId::new(1)).await.unwrap().title, "A");
        assert!(matches!(
            api.banner("t", BannerId::new(2)).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_moderation_and_ticket_patches() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/reviews/5"))
            .and(body_json(json!({"status": "HIDDEN"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/tickets/3"))
            .and(body_json(json!({"status": "IN_PROGRESS", "assignee": "Minh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server);
        api.moderate_review("t", ReviewId::new(5), ReviewStatus::Hidden)
            .await
            .unwrap();
        let update = TicketUpdate {
            status: TicketStatus::InProgress,
            assignee: Some("Minh".to_string()),
            response: None,
        };
        api.update_ticket("t", TicketId::new(3), &update)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(path("/users/dashboard"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(path("/tickets/99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let api = client(&server);
        assert!(matches!(
            api.user_dashboard("t").await,
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            api.ticket("t", TicketId::new(99)).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
