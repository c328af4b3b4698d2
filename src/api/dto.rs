//! Request bodies and the response envelope
//!
//! Every JSON response carries `statusText` and `msg`; the payload fields
//! are flattened next to them.

use serde::{Deserialize, Serialize};

use crate::data::{Blog, BlogWithMeta, Comment, Like};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBlogRequest {
    pub title: String,
    pub post: String,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub post: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Success envelope: `{"statusText": "OK", "msg": ..., ...payload}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(rename = "statusText")]
    pub status_text: &'static str,
    pub msg: String,
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(msg: impl Into<String>, payload: T) -> Self {
        Self {
            status_text: "OK",
            msg: msg.into(),
            payload,
        }
    }
}

/// Payload of responses that only carry a message
#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SignInPayload {
    pub token: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BlogPayload {
    pub blog: Blog,
}

#[derive(Debug, Serialize)]
pub struct BlogsPayload {
    pub blogs: Vec<Blog>,
}

#[derive(Debug, Serialize)]
pub struct BlogsWithMetaPayload {
    pub blogs: Vec<BlogWithMeta>,
}

#[derive(Debug, Serialize)]
pub struct CommentPayload {
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct CommentsPayload {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct LikePayload {
    pub like: Like,
}

#[derive(Debug, Serialize)]
pub struct LikeCountPayload {
    pub likes: i64,
}
