// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. Every endpoint has its
//! own response type so the OpenAPI document describes exactly what is
//! returned.
//!
//! ## Model Categories
//!
//! - **Accounts**: registration, login, profile, password change
//! - **Decks**: upload results and deck listings
//! - **Cards**: generated flashcards
//! - **History**: the action ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::cards::Card;
use crate::storage::{HistoryEntry, StoredDeck, StoredUser, Theme};

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// =============================================================================
// Account Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Normalized account email
    pub email: String,
    /// Always `bearer`
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProfileResponse {
    pub email: String,
    pub theme: Theme,
    pub name: Option<String>,
}

impl From<StoredUser> for ProfileResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            email: user.email,
            theme: user.theme,
            name: user.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

// =============================================================================
// Deck Models
// =============================================================================

/// Multipart upload form, for documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    /// PDF document
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Bearer token, accepted only when body tokens are enabled
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    /// Size in bytes
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeckSummary {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl From<StoredDeck> for DeckSummary {
    fn from(deck: StoredDeck) -> Self {
        Self {
            name: deck.name,
            size: deck.size_bytes,
            created_at: deck.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckListResponse {
    pub decks: Vec<DeckSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardsResponse {
    pub success: bool,
    pub cards: Vec<Card>,
    pub deck_name: String,
    pub total: usize,
}

// =============================================================================
// History Models
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of entries to return
    pub limit: Option<usize>,
    /// Number of newest entries to skip
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    /// Newest first
    pub history: Vec<HistoryEntry>,
    /// Number of entries in the ledger
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ClearHistoryResponse {
    pub success: bool,
    /// Number of entries removed
    pub removed: u64,
}
