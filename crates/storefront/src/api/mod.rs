//! PawPal REST API client for the storefront.
//!
//! # Architecture
//!
//! - The REST backend is the source of truth - NO local copies, direct calls
//! - Every response is a `{ success, data, message }` envelope
//! - Catalog reads (banners, categories, best sellers, products) are cached
//!   in memory via `moka`; cart, wishlist, address and voucher calls are
//!   per-customer and always go to the backend
//! - Customer calls authenticate with `Authorization: Bearer <token>`
//!
//! # Example
//!
//! ```rust,ignore
//! use pawpal_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api, config.catalog_cache_ttl)?;
//! let banners = client.banners().await?;
//! let cart = client.cart(&customer.access_token).await?;
//! ```

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use pawpal_core::{
    Address, AddressId, AddressInput, ApiEnvelope, Banner, CartItem, CartItemId,
    Category, CategoryId, Email, EnvelopeError, LoginResult, OrderRequest, PaymentResponse,
    Product, ProductId, ProductSummary, VariantId, Voucher,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;

pub use cache::{CacheKey, CacheValue};

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
///
/// Cheap to clone; clones share the HTTP connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartBody {
    variant_id: VariantId,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WishlistBody {
    product_id: ProductId,
}

impl ApiClient {
    /// Create a new REST API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, cache_ttl: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pawpal-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Parse(format!("invalid API path {path}: {e}")))
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
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
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse REST API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request whose payload is not needed.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(request)
            .await?
            .into_data_or_default()?;
        Ok(())
    }

    /// Serve a catalog read from cache, or fetch and remember it.
    async fn cached<F, Fut>(&self, key: CacheKey, fetch: F) -> Result<CacheValue, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheValue, ApiError>>,
    {
        if let Some(hit) = self.inner.cache.get(&key).await {
            debug!(?key, "Cache hit");
            return Ok(hit);
        }
        let value = fetch().await?;
        self.inner.cache.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
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
        let body = LoginBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let request = self
            .request(Method::POST, self.url("auth/login")?, None)
            .json(&body);
        Ok(self.send(request).await?.into_data()?)
    }

    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    /// Homepage banners.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        let value = self
            .cached(
                CacheKey::Banners,
                || async {
                    let request = self.request(Method::GET, self.url("banners")?, None);
                    let banners = self.send(request).await?.into_data_or_default()?;
                    Ok(CacheValue::Banners(banners))
                },
            )
            .await?;
        match value {
            CacheValue::Banners(banners) => Ok(banners),
            _ => Err(ApiError::MissingData),
        }
    }

    /// Categories featured on the homepage.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn popular_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.categories(CacheKey::PopularCategories, "categories/popular")
            .await
    }

    /// Top-level categories for navigation and listing filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn parent_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.categories(CacheKey::ParentCategories, "categories/parent")
            .await
    }

    async fn categories(&self, key: CacheKey, path: &str) -> Result<Vec<Category>, ApiError> {
        let value = self
            .cached(
                key,
                || async {
                    let request = self.request(Method::GET, self.url(path)?, None);
                    let categories = self.send(request).await?.into_data_or_default()?;
                    Ok(CacheValue::Categories(categories))
                },
            )
            .await?;
        match value {
            CacheValue::Categories(categories) => Ok(categories),
            _ => Err(ApiError::MissingData),
        }
    }

    /// Best-selling products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn best_selling(&self) -> Result<Vec<ProductSummary>, ApiError> {
        self.product_list(CacheKey::BestSelling, self.url("products/best-selling")?)
            .await
    }

    /// Products for the listing page, optionally narrowed to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<ProductSummary>, ApiError> {
        let mut url = self.url("products")?;
        if let Some(id) = category {
            url.query_pairs_mut()
                .append_pair("categoryId", &id.to_string());
        }
        self.product_list(CacheKey::Products { category }, url).await
    }

    async fn product_list(
        &self,
        key: CacheKey,
        url: Url,
    ) -> Result<Vec<ProductSummary>, ApiError> {
        let value = self
            .cached(
                key,
                || async {
                    let request = self.request(Method::GET, url, None);
                    let products = self.send(request).await?.into_data_or_default()?;
                    Ok(CacheValue::Products(products))
                },
            )
            .await?;
        match value {
            CacheValue::Products(products) => Ok(products),
            _ => Err(ApiError::MissingData),
        }
    }

    /// Full product detail.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let value = self
            .cached(
                CacheKey::Product(id),
                || async {
                    let url = self.url(&format!("products/productById/{id}"))?;
                    let request = self.request(Method::GET, url, None);
                    let product: Product = self
                        .send(request)
                        .await?
                        .into_data()
                        .map_err(|e| match e {
                            EnvelopeError::MissingData => {
                                ApiError::NotFound(format!("product {id}"))
                            }
                            other => other.into(),
                        })?;
                    Ok(CacheValue::Product(Box::new(product)))
                },
            )
            .await?;
        match value {
            CacheValue::Product(product) => Ok(*product),
            _ => Err(ApiError::MissingData),
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The customer's cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &str) -> Result<Vec<CartItem>, ApiError> {
        let request = self.request(Method::GET, self.url("cart")?, Some(token));
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.url("cart")?, Some(token))
            .json(&AddToCartBody {
                variant_id,
                quantity,
            });
        self.send_empty(request).await
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("cart/{item_id}"))?;
        let request = self
            .request(Method::PATCH, url, Some(token))
            .json(&QuantityBody { quantity });
        self.send_empty(request).await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(&self, token: &str, item_id: CartItemId) -> Result<(), ApiError> {
        let url = self.url(&format!("cart/{item_id}"))?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Saved shipping addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &str) -> Result<Vec<Address>, ApiError> {
        let request = self.request(Method::GET, self.url("users/addresses")?, Some(token));
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, input))]
    pub async fn create_address(
        &self,
        token: &str,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        let request = self
            .request(Method::POST, self.url("users/addresses")?, Some(token))
            .json(input);
        Ok(self.send(request).await?.into_data()?)
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_address(&self, token: &str, id: AddressId) -> Result<(), ApiError> {
        let url = self.url(&format!("users/addresses/{id}"))?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    /// Vouchers assigned to the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn vouchers(&self, token: &str) -> Result<Vec<Voucher>, ApiError> {
        let request = self.request(Method::GET, self.url("vouchers/user")?, Some(token));
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place the order and, for online payment, obtain the gateway URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the order is rejected.
    #[instrument(
        skip(self, token, order),
        fields(total = %order.total, method = ?order.payment_method)
    )]
    pub async fn create_payment(
        &self,
        token: &str,
        order: &OrderRequest,
    ) -> Result<PaymentResponse, ApiError> {
        let request = self
            .request(Method::POST, self.url("payment/create-payment")?, Some(token))
            .json(order);
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Products on the customer's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn wishlist(&self, token: &str) -> Result<Vec<ProductSummary>, ApiError> {
        let request = self.request(Method::GET, self.url("wishlist")?, Some(token));
        Ok(self.send(request).await?.into_data_or_default()?)
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_wishlist(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.url("wishlist")?, Some(token))
            .json(&WishlistBody { product_id });
        self.send_empty(request).await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_from_wishlist(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("wishlist/{product_id}"))?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ApiClient {
        let config = ApiConfig {
            base_url: Url::parse(&format!("{}/", server.uri())).unwrap(),
            timeout: Duration::from_secs(5),
        };
        ApiClient::new(&config, Duration::from_secs(60)).unwrap()
    }

    #[tokio::test]
    async fn test_catalog_reads_are_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/banners"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 1, "title": "Summer", "imageUrl": "https://cdn/x.jpg", "position": 0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server);
        assert_eq!(api.banners().await.unwrap().len(), 1);
        assert_eq!(api.banners().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_products_by_category_uses_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("categoryId", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 8, "name": "Litter", "price": "89000"}]
            })))
            .mount(&server)
            .await;

        let products = client(&server)
            .products(Some(CategoryId::new(3)))
            .await
            .unwrap();
        assert_eq!(products[0].price, Decimal::from(89_000));
    }

    #[tokio::test]
    async fn test_customer_calls_send_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vouchers/user"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 2, "code": "MEO", "discountPercent": 10}]
            })))
            .mount(&server)
            .await;

        let vouchers = client(&server).vouchers("tok-123").await.unwrap();
        assert_eq!(vouchers[0].code, "MEO");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/cart"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/products/productById/99"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/wishlist"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;
        Mock::given(path("/users/addresses"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false, "message": "database down"
            })))
            .mount(&server)
            .await;

        let api = client(&server);
        assert!(matches!(api.cart("t").await, Err(ApiError::Unauthorized)));
        assert!(matches!(
            api.product(ProductId::new(99)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(api.wishlist("t").await, Err(ApiError::RateLimited(7))));
        match api.addresses("t").await {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "database down");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wishlist"))
            .and(body_json(json!({"productId": 4})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false, "message": "Product unavailable"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .add_to_wishlist("t", ProductId::new(4))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(msg) if msg == "Product unavailable"));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/wishlist/4"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client(&server)
            .remove_from_wishlist("t", ProductId::new(4))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "lan@pawpal.vn", "password": "hunter22"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"accessToken": "jwt", "user": {"id": 1, "email": "lan@pawpal.vn"}}
            })))
            .mount(&server)
            .await;

        let email = Email::parse("Lan@PawPal.vn").unwrap();
        let result = client(&server)
            .login(&email, &SecretString::from("hunter22"))
            .await
            .unwrap();
        assert_eq!(result.access_token, "jwt");
    }
}
