//! Identity extractor.
//!
//! Authentication happens in the fronting identity proxy, which installs a
//! stable opaque user identifier in the `X-User-Id` header. This service
//! trusts that header and performs no authentication of its own.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};

use tamarind_core::UserId;

use crate::error::AppError;

/// Header installed by the identity proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     format!("hello, {user_id}")
/// }
/// ```
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(UserId::new)
            .ok_or_else(|| AppError::NotAuthenticated.into_response())?;

        Ok(Self(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<RequireUser, Response> {
        let (mut parts, ()) = request.into_parts();
        RequireUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_present() {
        let request = Request::builder()
            .header("X-User-Id", "auth0|abc123")
            .body(())
            .expect("request");

        let RequireUser(user_id) = extract(request).await.expect("extractor");
        assert_eq!(user_id.as_str(), "auth0|abc123");
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let request = Request::builder().body(()).expect("request");
        let response = extract(request).await.err().expect("rejection");
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_header_rejected() {
        let request = Request::builder()
            .header("X-User-Id", "   ")
            .body(())
            .expect("request");
        let response = extract(request).await.err().expect("rejection");
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
