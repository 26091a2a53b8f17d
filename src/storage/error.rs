// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error type shared by the content store and the repositories.

use std::io;

use crate::auth::password::{PasswordHashError, PasswordPolicyError};

use super::database::DatabaseError;

/// Error type for storage and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedded database failure
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Registration with an email that is already taken
    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    /// Upload of a deck name that is already present
    #[error("Deck {0} already exists; delete it before uploading again")]
    DeckExists(String),

    /// Password rejected by the policy
    #[error(transparent)]
    WeakPassword(#[from] PasswordPolicyError),

    /// Malformed email address
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Upload is not a PDF document
    #[error("{0}")]
    NotPdf(String),

    /// Deck name cannot be used as a storage key
    #[error("Invalid deck name: {0}")]
    InvalidDeckName(String),

    /// Upload carried no bytes
    #[error("Uploaded file is empty")]
    EmptyContent,

    /// Email/password pair did not verify
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Password hashing failed
    #[error(transparent)]
    Hashing(#[from] PasswordHashError),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Whether this error comes from the environment rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            StorageError::Io(_)
                | StorageError::Json(_)
                | StorageError::Database(_)
                | StorageError::Hashing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_internal_errors() {
        let io = StorageError::from(io::Error::other("disk gone"));
        assert!(io.is_internal());
        assert!(!StorageError::NotFound("deck".into()).is_internal());
        assert!(!StorageError::InvalidCredentials.is_internal());
    }

    #[test]
    fn weak_password_message_is_transparent() {
        let err = StorageError::from(PasswordPolicyError::MissingUppercase);
        assert_eq!(
            err.to_string(),
            PasswordPolicyError::MissingUppercase.to_string()
        );
    }
}
