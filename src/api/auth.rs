// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login endpoints.

use axum::{extract::State, Json};

use super::{extract::ApiJson, run_blocking};
use crate::{
    auth::AuthError,
    error::ApiError,
    models::{LoginRequest, LoginResponse, RegisterRequest, SuccessResponse},
    state::AppState,
    storage::{HistoryAction, HistoryEntry, StorageError},
};

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Account created", body = SuccessResponse),
        (status = 400, description = "Weak password or invalid email", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run_blocking(move || {
        let user = state
            .users()
            .register(&request.email, &request.password, request.name)?;

        tracing::info!(user_id = %user.id, "User registered");
        state
            .history()
            .append(HistoryEntry::new(HistoryAction::Register).with_actor(&user.email));
        Ok(Json(SuccessResponse::ok()))
    })
    .await
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    run_blocking(move || {
        let user = state
            .users()
            .verify_credentials(&request.email, &request.password)?
            .ok_or(StorageError::InvalidCredentials)?;

        let issued = state.tokens.issue(&user.email).map_err(AuthError::from)?;
        tracing::debug!(user_id = %user.id, "Token issued");

        Ok(Json(LoginResponse {
            token: issued.token,
            email: user.email,
            token_type: "bearer".to_string(),
            expires_at: issued.expires_at,
        }))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::http::StatusCode;

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: Some("Ann".to_string()),
        }
    }

    #[tokio::test]
    async fn register_records_history() {
        let (state, _temp) = test_state();

        let Json(response) = register(State(state.clone()), ApiJson(register_request("a@b.io", "Secret1")))
            .await
            .expect("registration succeeds");
        assert!(response.success);

        let user = state.users().get("a@b.io").unwrap().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ann"));

        let history = state.history().list().unwrap();
        assert_eq!(history[0].action_type, HistoryAction::Register);
        assert_eq!(history[0].actor.as_deref(), Some("a@b.io"));
    }

    #[tokio::test]
    async fn register_invalid_email() {
        let (state, _temp) = test_state();
        let err = register(State(state), ApiJson(register_request("nope", "Secret1")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_email");
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (state, _temp) = test_state();
        register(State(state.clone()), ApiJson(register_request("A@b.io", "Secret1")))
            .await
            .unwrap();

        let Json(response) = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "a@B.io".to_string(),
                password: "Secret1".to_string(),
            }),
        )
        .await
        .expect("login succeeds");

        assert_eq!(response.email, "a@b.io");
        assert_eq!(response.token_type, "bearer");
        let claims = state.tokens.verify(&response.token).unwrap();
        assert_eq!(claims.sub, "a@b.io");
        assert_eq!(claims.exp, response.expires_at.timestamp());
    }

    #[tokio::test]
    async fn login_wrong_password() {
        let (state, _temp) = test_state();
        register(State(state.clone()), ApiJson(register_request("a@b.io", "Secret1")))
            .await
            .unwrap();

        let err = login(
            State(state),
            ApiJson(LoginRequest {
                email: "a@b.io".to_string(),
                password: "Secret2".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "invalid_credentials");
    }
}
