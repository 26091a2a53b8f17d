// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated user representation.

use chrono::{DateTime, Utc};

use super::tokens::TokenClaims;

/// The identity behind a verified bearer token.
///
/// This is the type handlers receive from the [`Auth`](super::Auth)
/// extractor. It says who signed in, not that the account still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Normalized email (token `sub` claim)
    pub email: String,
    /// When the presented token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    /// Create from verified token claims.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            expires_at: claims.expires_at(),
            email: claims.sub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_claims_uses_subject_and_expiry() {
        let user = AuthenticatedUser::from_claims(TokenClaims {
            sub: "a@b.io".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        });
        assert_eq!(user.email, "a@b.io");
        assert_eq!(user.expires_at.timestamp(), 1_700_086_400);
    }
}
