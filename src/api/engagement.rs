//! Comment and like endpoints

use axum::{extract::State, http::StatusCode, response::Json};

use super::dto::{
    ApiResponse, CommentPayload, CommentRequest, CommentsPayload, LikeCountPayload, LikePayload,
};
use super::extract::{ApiJson, ApiPath};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::EngagementService;

fn build_engagement_service(state: &AppState) -> EngagementService {
    EngagementService::new(state.db.clone())
}

/// POST /api/blogs/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(blog_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentPayload>>), AppError> {
    let comment = build_engagement_service(&state)
        .add_comment(&user, blog_id, &req.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Comment added successfully",
            CommentPayload { comment },
        )),
    ))
}

/// GET /api/blogs/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(blog_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<CommentsPayload>>, AppError> {
    let comments = build_engagement_service(&state).comments(blog_id).await?;

    Ok(Json(ApiResponse::ok(
        "Comments fetched successfully",
        CommentsPayload { comments },
    )))
}

/// POST /api/blogs/:id/likes
pub async fn like_blog(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(blog_id): ApiPath<i64>,
) -> Result<(StatusCode, Json<ApiResponse<LikePayload>>), AppError> {
    let like = build_engagement_service(&state).like(&user, blog_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Blog liked successfully", LikePayload { like })),
    ))
}

/// GET /api/blogs/:id/likes
pub async fn like_count(
    State(state): State<AppState>,
    ApiPath(blog_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<LikeCountPayload>>, AppError> {
    let likes = build_engagement_service(&state).like_count(blog_id).await?;

    Ok(Json(ApiResponse::ok(
        "Likes fetched successfully",
        LikeCountPayload { likes },
    )))
}
