//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations
//! - Blog read cache (Redis or in-memory)

pub mod cache;
mod database;
mod models;

pub use cache::{BlogCache, CacheError, CacheStore, MemoryCache, RedisCache};
pub use database::Database;
pub use models::*;
