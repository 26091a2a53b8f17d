// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints for the authenticated user.

use axum::{extract::State, Json};

use super::{extract::ApiJson, run_blocking};
use crate::{
    auth::{Auth, AuthError},
    error::ApiError,
    models::{ChangePasswordRequest, ProfileResponse, SuccessResponse},
    state::AppState,
    storage::{HistoryAction, HistoryEntry},
};

/// Get the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorBody),
    )
)]
pub async fn get_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    run_blocking(move || {
        let stored = state
            .users()
            .get(&user.email)?
            .ok_or(AuthError::UnknownAccount)?;
        Ok(Json(stored.into()))
    })
    .await
}

/// Change the authenticated user's password.
#[utoipa::path(
    post,
    path = "/api/profile/change_password",
    request_body = ChangePasswordRequest,
    tag = "Profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password changed", body = SuccessResponse),
        (status = 400, description = "New password is too weak", body = crate::error::ErrorBody),
        (status = 401, description = "Old password is wrong or token invalid", body = crate::error::ErrorBody),
    )
)]
pub async fn change_password(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run_blocking(move || {
        state
            .users()
            .change_password(&user.email, &request.old_password, &request.new_password)?;

        tracing::info!(email = %user.email, "Password changed");
        state.history().append(
            HistoryEntry::new(HistoryAction::PasswordChange)
                .with_actor(&user.email)
                .with_details("Password changed"),
        );
        Ok(Json(SuccessResponse::ok()))
    })
    .await
}

/// Delete the authenticated user's account.
///
/// Idempotent. Decks uploaded by the user are kept.
#[utoipa::path(
    delete,
    path = "/api/profile",
    tag = "Profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted", body = SuccessResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_account(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run_blocking(move || {
        if state.users().delete(&user.email)? {
            tracing::info!(email = %user.email, "Account deleted");
            state.history().append(
                HistoryEntry::new(HistoryAction::DeleteAccount)
                    .with_actor(&user.email)
                    .with_details("Account deleted"),
            );
        }
        Ok(Json(SuccessResponse::ok()))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_state;
    use axum::http::StatusCode;

    fn auth_for(state: &AppState, email: &str) -> Auth {
        let issued = state.tokens.issue(email).unwrap();
        let claims = state.tokens.verify(&issued.token).unwrap();
        Auth(AuthenticatedUser::from_claims(claims))
    }

    #[tokio::test]
    async fn profile_returns_stored_fields() {
        let (state, _temp) = test_state();
        state
            .users()
            .register("a@b.io", "Secret1", Some("Ann".into()))
            .unwrap();

        let Json(profile) = get_profile(auth_for(&state, "a@b.io"), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(
            profile,
            ProfileResponse {
                email: "a@b.io".to_string(),
                theme: Default::default(),
                name: Some("Ann".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn profile_of_missing_account_is_unauthenticated() {
        let (state, _temp) = test_state();
        let err = get_profile(auth_for(&state, "ghost@b.io"), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "unauthenticated");
    }

    #[tokio::test]
    async fn change_password_weak_leaves_hash() {
        let (state, _temp) = test_state();
        state.users().register("a@b.io", "Secret1", None).unwrap();
        let before = state.users().get("a@b.io").unwrap().unwrap().password_hash;

        let err = change_password(
            auth_for(&state, "a@b.io"),
            State(state.clone()),
            ApiJson(ChangePasswordRequest {
                old_password: "Secret1".into(),
                new_password: "weak".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "weak_password");
        assert_eq!(
            state.users().get("a@b.io").unwrap().unwrap().password_hash,
            before
        );
    }

    #[tokio::test]
    async fn change_password_records_history() {
        let (state, _temp) = test_state();
        state.users().register("a@b.io", "Secret1", None).unwrap();

        change_password(
            auth_for(&state, "a@b.io"),
            State(state.clone()),
            ApiJson(ChangePasswordRequest {
                old_password: "Secret1".into(),
                new_password: "Newpass1".into(),
            }),
        )
        .await
        .unwrap();

        let history = state.history().list().unwrap();
        assert_eq!(history[0].action_type, HistoryAction::PasswordChange);
    }

    #[tokio::test]
    async fn delete_account_twice_succeeds() {
        let (state, _temp) = test_state();
        state.users().register("a@b.io", "Secret1", None).unwrap();

        for _ in 0..2 {
            let Json(response) = delete_account(auth_for(&state, "a@b.io"), State(state.clone()))
                .await
                .unwrap();
            assert!(response.success);
        }
        assert!(state.users().get("a@b.io").unwrap().is_none());

        let deletions = state
            .history()
            .list()
            .unwrap()
            .into_iter()
            .filter(|e| e.action_type == HistoryAction::DeleteAccount)
            .count();
        assert_eq!(deletions, 1);
    }
}
