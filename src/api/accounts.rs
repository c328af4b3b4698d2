//! Account endpoints: sign-up, sign-in and password reset

use axum::{extract::State, http::StatusCode, response::Json};

use super::dto::{
    ApiResponse, Empty, ResetCodeRequest, ResetPasswordRequest, SignInPayload, SignInRequest,
    SignUpRequest, TokenPayload, VerifyCodeRequest,
};
use super::extract::ApiJson;
use crate::AppState;
use crate::error::AppError;
use crate::service::AccountService;

fn build_account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.db.clone(),
        state.notifier.clone(),
        state.config.auth.clone(),
    )
}

/// POST /api/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenPayload>>), AppError> {
    let token = build_account_service(&state)
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "User registered successfully",
            TokenPayload { token },
        )),
    ))
}

/// POST /api/signin
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignInRequest>,
) -> Result<Json<ApiResponse<SignInPayload>>, AppError> {
    let signed_in = build_account_service(&state)
        .authenticate(&req.email, &req.password)
        .await?;

    Ok(Json(ApiResponse::ok(
        "Signed in successfully",
        SignInPayload {
            token: signed_in.token,
            username: signed_in.user.username,
            email: signed_in.user.email,
        },
    )))
}

/// POST /api/request-reset-code
pub async fn request_reset_code(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetCodeRequest>,
) -> Result<Json<ApiResponse<Empty>>, AppError> {
    build_account_service(&state)
        .request_reset_code(&req.email)
        .await?;

    Ok(Json(ApiResponse::ok("Reset code sent to your email", Empty {})))
}

/// POST /api/verify-reset-code
pub async fn verify_reset_code(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<Empty>>, AppError> {
    build_account_service(&state)
        .verify_reset_code(&req.email, &req.code)
        .await?;

    Ok(Json(ApiResponse::ok("Code verified", Empty {})))
}

/// POST /api/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<Empty>>, AppError> {
    build_account_service(&state)
        .reset_password(&req.email, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::ok("Password updated successfully", Empty {})))
}
