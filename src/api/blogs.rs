//! Blog endpoints

use axum::{extract::State, http::StatusCode, response::Json};

use super::dto::{
    ApiResponse, BlogPayload, BlogsPayload, BlogsWithMetaPayload, CreateBlogRequest, ListQuery,
    SearchQuery, UpdateBlogRequest,
};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{BlogChanges, BlogService};

fn build_blog_service(state: &AppState) -> BlogService {
    BlogService::new(state.db.clone(), state.cache.clone())
}

/// GET /api/blogs?title=
pub async fn list_blogs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<BlogsPayload>>, AppError> {
    let blogs = build_blog_service(&state)
        .list(&user, query.title.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(
        "Blogs fetched successfully",
        BlogsPayload { blogs },
    )))
}

/// GET /api/blogs/:id
pub async fn get_blog(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<BlogPayload>>, AppError> {
    let blog = build_blog_service(&state).get(&user, id).await?;

    Ok(Json(ApiResponse::ok(
        "Blog fetched successfully",
        BlogPayload { blog },
    )))
}

/// POST /api/blogs
pub async fn create_blog(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateBlogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BlogPayload>>), AppError> {
    let blog = build_blog_service(&state)
        .create(&user, &req.title, &req.post)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Blog created successfully",
            BlogPayload { blog },
        )),
    ))
}

/// PUT /api/blogs/:id
pub async fn update_blog(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateBlogRequest>,
) -> Result<Json<ApiResponse<BlogPayload>>, AppError> {
    let changes = BlogChanges {
        title: req.title,
        post: req.post,
    };
    let blog = build_blog_service(&state).update(&user, id, changes).await?;

    Ok(Json(ApiResponse::ok(
        "Blog updated successfully",
        BlogPayload { blog },
    )))
}

/// DELETE /api/blogs/:id
pub async fn delete_blog(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<BlogPayload>>, AppError> {
    let blog = build_blog_service(&state).delete(&user, id).await?;

    Ok(Json(ApiResponse::ok(
        "Blog deleted successfully",
        BlogPayload { blog },
    )))
}

/// GET /api/blogs-with-meta?search=
///
/// The caller's own blogs with likes and comments.
pub async fn blogs_with_meta(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<ApiResponse<BlogsWithMetaPayload>>, AppError> {
    let blogs = build_blog_service(&state)
        .with_meta(Some(&user), query.search.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(
        "Blogs fetched successfully",
        BlogsWithMetaPayload { blogs },
    )))
}

/// GET /api/all-blogs-with-meta?search=
pub async fn all_blogs_with_meta(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<ApiResponse<BlogsWithMetaPayload>>, AppError> {
    let blogs = build_blog_service(&state)
        .with_meta(None, query.search.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(
        "Blogs fetched successfully",
        BlogsWithMetaPayload { blogs },
    )))
}

/// GET /api/popular-blogs
pub async fn popular_blogs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BlogsWithMetaPayload>>, AppError> {
    let blogs = build_blog_service(&state).popular().await?;

    Ok(Json(ApiResponse::ok(
        "Popular blogs fetched successfully",
        BlogsWithMetaPayload { blogs },
    )))
}
