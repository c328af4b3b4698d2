//! Authentication middleware
//!
//! Protects routes that require authentication.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};

use super::token::verify_token;
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

/// The authenticated caller, as asserted by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: String,
}

/// Read the token from `Authorization`, with or without a `Bearer` scheme
///
/// The scheme name is case-insensitive (RFC 7235).
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(strip_bearer_scheme)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

fn strip_bearer_scheme(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(char::is_whitespace) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    }
}

fn authenticate_headers(headers: &HeaderMap, state: &AppState) -> Result<Principal, AppError> {
    let token = extract_token_from_headers(headers)
        .ok_or_else(|| AppError::unauthorized("Missing or invalid token"))?;

    let claims = verify_token(&token, &state.config.auth.jwt_secret).inspect_err(|error| {
        tracing::debug!(%error, "Invalid token");
    })?;

    Ok(Principal {
        email: claims.email,
    })
}

/// Middleware to require authentication
///
/// Verifies the bearer token and adds the [`Principal`] to request
/// extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/blogs", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authenticate_headers(request.headers(), &state)?;
    tracing::debug!(email = %principal.email, "Authenticated request");

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extractor for the acting user
///
/// Uses the [`Principal`] set by [`require_auth`] (or verifies the token
/// itself when the middleware did not run) and loads the matching row.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let principal = match parts.extensions.get::<Principal>().cloned() {
            Some(principal) => principal,
            None => {
                let principal = authenticate_headers(&parts.headers, &state)?;
                parts.extensions.insert(principal.clone());
                principal
            }
        };

        let user = state
            .db
            .get_user_by_email(&principal.email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_raw_and_bearer_tokens() {
        assert_eq!(
            extract_token_from_headers(&headers("abc.def.ghi")).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(
            extract_token_from_headers(&headers("Bearer abc.def.ghi")).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc.def.ghi", "BEARER abc.def.ghi", "Bearer\tabc.def.ghi"] {
            assert_eq!(
                extract_token_from_headers(&headers(value)).as_deref(),
                Some("abc.def.ghi"),
                "{value:?}"
            );
        }
    }

    #[test]
    fn missing_or_blank_header_yields_none() {
        assert!(extract_token_from_headers(&HeaderMap::new()).is_none());
        assert!(extract_token_from_headers(&headers("Bearer ")).is_none());
        assert!(extract_token_from_headers(&headers("bearer")).is_none());
    }
}
