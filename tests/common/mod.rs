//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gatorblog::error::AppError;
use gatorblog::notify::Notifier;
use gatorblog::{AppState, config, data};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const JWT_SECRET: &str = "test-secret-key-that-is-32-bytes!";

/// Notifier that keeps reset codes so tests can read them back
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send_reset_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub notifier: Arc<CapturingNotifier>,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

pub fn test_config(db_path: std::path::PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig { path: db_path },
        cache: config::CacheConfig {
            backend: config::CacheBackend::Memory,
            redis_url: None,
            blog_ttl_seconds: 600,
            max_entries: 1_000,
        },
        auth: config::AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: 4,
            reset_code_ttl_minutes: 10,
        },
        mail: config::MailConfig {
            sender: "help@test.example.com".to_string(),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        gatorblog::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().join("test.db"));

        let db = data::Database::connect(&config.database.path).await.unwrap();
        let store = Arc::new(data::MemoryCache::new(config.cache.max_entries));
        let notifier = Arc::new(CapturingNotifier::default());
        let state = AppState::with_parts(config, db, store, notifier.clone());

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = gatorblog::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            notifier,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// POST JSON, optionally authenticated; returns status and body
    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn delete(&self, path: &str, token: &str) -> (u16, Value) {
        let response = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// Register a user and return its token
    pub async fn signup(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/signup",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password123",
                }),
            )
            .await;
        assert_eq!(status, 201, "signup failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a blog and return its id
    pub async fn create_blog(&self, token: &str, title: &str, post: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/blogs",
                Some(token),
                json!({"title": title, "post": post}),
            )
            .await;
        assert_eq!(status, 201, "create blog failed: {body}");
        body["blog"]["id"].as_i64().unwrap()
    }
}
