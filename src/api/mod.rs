//! API layer
//!
//! HTTP handlers for:
//! - Accounts (sign-up, sign-in, password reset)
//! - Blogs, comments and likes
//! - Metrics (Prometheus)

mod accounts;
mod blogs;
pub mod dto;
mod engagement;
mod extract;
pub mod metrics;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::AppState;
use crate::auth::require_auth;

pub use metrics::{metrics_router, track_http_metrics};

/// Create the `/api` router
///
/// Routes are split into public and authenticated endpoints; the latter
/// sit behind [`require_auth`].
pub fn api_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/signup", post(accounts::signup))
        .route("/signin", post(accounts::signin))
        .route("/request-reset-code", post(accounts::request_reset_code))
        .route("/verify-reset-code", post(accounts::verify_reset_code))
        .route("/reset-password", post(accounts::reset_password))
        .route("/all-blogs-with-meta", get(blogs::all_blogs_with_meta))
        .route("/popular-blogs", get(blogs::popular_blogs));

    let authenticated_routes = Router::new()
        .route("/blogs", get(blogs::list_blogs).post(blogs::create_blog))
        .route(
            "/blogs/:id",
            get(blogs::get_blog)
                .put(blogs::update_blog)
                .delete(blogs::delete_blog),
        )
        .route(
            "/blogs/:id/comments",
            get(engagement::list_comments).post(engagement::add_comment),
        )
        .route(
            "/blogs/:id/likes",
            get(engagement::like_count).post(engagement::like_blog),
        )
        .route("/blogs-with-meta", get(blogs::blogs_with_meta))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}
