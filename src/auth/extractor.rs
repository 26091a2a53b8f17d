// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Verify a raw token and resolve it to the acting user.
pub fn authenticate_token(state: &AppState, token: &str) -> Result<AuthenticatedUser, AuthError> {
    let claims = state.tokens.verify(token)?;
    Ok(AuthenticatedUser::from_claims(claims))
}

/// Token from `Authorization: Bearer <token>`, or `None` if the header is absent.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    // The auth scheme is case-insensitive.
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(AuthError::InvalidAuthHeader)
            } else {
                Ok(Some(token))
            }
        }
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Extractor for authenticated users.
///
/// Validates the bearer token from the Authorization header. Verification
/// is pure: no storage is read and nothing is written.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_profile(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<ProfileResponse>, ApiError> {
///     // user.email is the authenticated account
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AuthError::MissingAuthHeader)?;
        Ok(Auth(authenticate_token(state, token)?))
    }
}

/// Optional authentication extractor.
///
/// `None` when no Authorization header is sent. A header that is present
/// but carries a bad or expired token is still rejected.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(OptionalAuth(Some(authenticate_token(state, token)?))),
            None => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_auth(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_issued_token() {
        let (state, _temp_dir) = test_state();
        let issued = state.tokens.issue("a@b.io").unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {}", issued.token)));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.email, "a@b.io");
    }

    #[tokio::test]
    async fn auth_extractor_rejects_other_schemes() {
        let (state, _temp_dir) = test_state();
        for header in ["Basic abc", "Bearer ", "token"] {
            let mut parts = parts_with_auth(Some(header));
            let result = Auth::from_request_parts(&mut parts, &state).await;
            assert!(
                matches!(result, Err(AuthError::InvalidAuthHeader)),
                "{header:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn auth_extractor_accepts_any_scheme_case() {
        let (state, _temp_dir) = test_state();
        let issued = state.tokens.issue("a@b.io").unwrap();
        for scheme in ["bearer", "BEARER", "Bearer"] {
            let mut parts = parts_with_auth(Some(&format!("{scheme} {}", issued.token)));
            let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
            assert_eq!(user.email, "a@b.io");
        }
    }

    #[tokio::test]
    async fn auth_extractor_rejects_bad_token() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_auth(Some("Bearer not.a.token"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_header() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_auth(None);

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert!(result.unwrap().0.is_none());
    }

    #[tokio::test]
    async fn optional_auth_rejects_invalid_token() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_auth(Some("Bearer garbage"));

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn optional_auth_resolves_valid_token() {
        let (state, _temp_dir) = test_state();
        let issued = state.tokens.issue("a@b.io").unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {}", issued.token)));

        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.unwrap().email, "a@b.io");
    }
}
