//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::api::{ApiClient, ApiError};
use crate::config::AdminConfig;
use crate::notifications::NotificationFeed;

/// Application state shared across all handlers.
///
/// Cheap to clone (uses `Arc` internally).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    api: ApiClient,
    notifications: NotificationFeed,
}

impl AppState {
    /// Create the state with an empty notification feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                api,
                notifications: NotificationFeed::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The live feed written by the notification listener.
    #[must_use]
    pub fn notifications(&self) -> &NotificationFeed {
        &self.inner.notifications
    }
}
