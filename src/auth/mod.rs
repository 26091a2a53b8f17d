// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password-based accounts with stateless bearer tokens.
//!
//! ## Auth Flow
//!
//! 1. Client registers with email and password (`POST /api/register`)
//! 2. Client logs in (`POST /api/login`) and receives an HS256 JWT
//! 3. Client sends `Authorization: Bearer <token>` on protected routes
//! 4. The [`Auth`] extractor verifies signature and expiry and yields the
//!    user's email
//!
//! ## Security
//!
//! - Passwords are stored as Argon2id PHC strings
//! - Tokens expire after a configurable lifetime (24 hours by default)
//! - No clock skew tolerance on expiry
//! - Tokens cannot be revoked before they expire

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod tokens;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{authenticate_token, Auth, OptionalAuth};
pub use password::{HashCost, PasswordHasher};
pub use tokens::{IssuedToken, TokenClaims, TokenError, TokenService};
