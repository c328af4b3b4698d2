//! gatorblog - a small multi-user blogging backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Account endpoints (sign-up, sign-in, password reset)     │
//! │  - Blog, comment and like endpoints                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Business logic                                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Blog read cache (Redis or in-memory)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database and cache layer
//! - `auth`: Tokens, password hashing and the auth guard
//! - `notify`: Reset code delivery
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool and the blog cache.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Blog read cache
    pub cache: Arc<data::BlogCache>,

    /// Reset code delivery
    pub notifier: Arc<dyn notify::Notifier>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Connect the configured cache backend
    /// 3. Set up the notifier
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Initialize cache
        let store: Arc<dyn data::CacheStore> = match config.cache.backend {
            config::CacheBackend::Memory => {
                Arc::new(data::MemoryCache::new(config.cache.max_entries))
            }
            config::CacheBackend::Redis => {
                let url = config.cache.redis_url.as_deref().ok_or_else(|| {
                    error::AppError::Config(
                        "cache.redis_url is required when cache.backend=redis".to_string(),
                    )
                })?;
                let redis = data::RedisCache::connect(url)
                    .await
                    .map_err(|e| error::AppError::Internal(e.into()))?;
                Arc::new(redis)
            }
        };
        tracing::info!(backend = ?config.cache.backend, "Cache initialized");

        // 3. Notifier
        let notifier = Arc::new(notify::LogNotifier::new(config.mail.sender.clone()));

        tracing::info!("Application state initialized successfully");

        Ok(Self::with_parts(config, db, store, notifier))
    }

    /// Assemble state from already constructed parts
    pub fn with_parts(
        config: config::AppConfig,
        db: data::Database,
        store: Arc<dyn data::CacheStore>,
        notifier: Arc<dyn notify::Notifier>,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache.blog_ttl_seconds);
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            cache: Arc::new(data::BlogCache::new(store, ttl)),
            notifier,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit, middleware};
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    };

    const MAX_BODY_BYTES: usize = 1024 * 1024;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
        .layer(middleware::from_fn(api::track_http_metrics))
}

async fn health_check() -> &'static str {
    "OK"
}
