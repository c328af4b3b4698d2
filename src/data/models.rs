//! Data models
//!
//! Rust structs representing database rows and cached snapshots.
//! Ids are SQLite integer keys; timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// The password hash and reset fields never leave the server: the struct
/// is not `Serialize`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Six digit reset code, present between request and verification
    pub reset_code: Option<String>,
    pub reset_code_expires_at: Option<DateTime<Utc>>,
    /// Set by a successful code verification; a password reset is only
    /// accepted while this lies in the future
    pub reset_authorized_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// =============================================================================
// Blog
// =============================================================================

/// A blog post
///
/// Also the payload of blog list/detail cache entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub post: String,
    pub user_id: i64,
    /// Owner username, denormalized at creation time
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blog enriched with its like count and comments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogWithMeta {
    pub id: i64,
    pub title: String,
    pub post: String,
    pub user_id: i64,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub comments: Vec<Comment>,
}

impl BlogWithMeta {
    pub fn new(blog: Blog, likes: i64, comments: Vec<Comment>) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            post: blog.post,
            user_id: blog.user_id,
            user_name: blog.user_name,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
            likes,
            comments,
        }
    }
}

// =============================================================================
// Comment / Like
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub blog_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's like of one blog. Unique per (user_id, blog_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub blog_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Like count of a single blog, as returned by the popularity query
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct BlogLikeCount {
    pub blog_id: i64,
    pub count: i64,
}
