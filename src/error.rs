// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::storage::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// Error response body.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message
    error: String,
    /// Stable machine-readable code
    error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// Internal failure. `detail` is logged, never returned to the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_internal() {
            return ApiError::internal(err);
        }
        let message = err.to_string();
        match err {
            StorageError::NotFound(_) => ApiError::not_found(message),
            StorageError::DuplicateEmail(_) => ApiError::conflict("duplicate_email", message),
            StorageError::DeckExists(_) => ApiError::conflict("conflict", message),
            StorageError::WeakPassword(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "weak_password", message)
            }
            StorageError::InvalidEmail(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_email", message)
            }
            StorageError::NotPdf(_) => ApiError::new(StatusCode::BAD_REQUEST, "not_pdf", message),
            StorageError::InvalidDeckName(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_deck_name", message)
            }
            StorageError::EmptyContent => ApiError::bad_request(message),
            StorageError::InvalidCredentials => {
                ApiError::unauthorized("invalid_credentials", message)
            }
            StorageError::Io(_)
            | StorageError::Json(_)
            | StorageError::Database(_)
            | StorageError::Hashing(_) => ApiError::internal(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(detail) => ApiError::internal(detail),
            other => ApiError::new(other.status_code(), other.error_code(), other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "validation_error",
                rejection.body_text(),
            ),
            _ => ApiError::bad_request(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}
