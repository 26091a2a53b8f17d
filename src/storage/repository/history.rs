// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Action history ledger.
//!
//! Entries are append-only. Ids come from a counter that is never reset,
//! so an id is never reused even after the ledger is cleared. Reads return
//! the newest entry first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Storage, StorageResult};

/// Kinds of recorded actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Upload,
    Synthesize,
    Delete,
    PasswordChange,
    Register,
    DeleteAccount,
}

/// A history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct HistoryEntry {
    /// Monotonic id, assigned on append.
    pub id: u64,
    pub action_type: HistoryAction,
    /// Deck the action applied to, if any.
    pub deck_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Email of the acting user, if known.
    pub actor: Option<String>,
    /// Uploaded size in bytes.
    pub file_size: Option<u64>,
    /// Number of cards produced.
    pub cards_count: Option<usize>,
    /// Human-readable summary.
    pub details: String,
}

impl HistoryEntry {
    /// Create an entry. The id and final timestamp are assigned on append.
    pub fn new(action_type: HistoryAction) -> Self {
        Self {
            id: 0,
            action_type,
            deck_name: None,
            timestamp: Utc::now(),
            actor: None,
            file_size: None,
            cards_count: None,
            details: String::new(),
        }
    }

    /// Deck uploaded.
    pub fn upload(deck_name: &str, size: u64) -> Self {
        Self::new(HistoryAction::Upload)
            .with_deck(deck_name)
            .with_file_size(size)
            .with_details(format!("Uploaded PDF file: {deck_name} ({size} bytes)"))
    }

    /// Cards created from a deck.
    pub fn synthesize(deck_name: &str, cards: usize) -> Self {
        Self::new(HistoryAction::Synthesize)
            .with_deck(deck_name)
            .with_cards_count(cards)
            .with_details(format!("Created flashcards from deck: {deck_name}"))
    }

    /// Deck deleted.
    pub fn delete(deck_name: &str) -> Self {
        Self::new(HistoryAction::Delete)
            .with_deck(deck_name)
            .with_details(format!("Deleted deck: {deck_name}"))
    }

    pub fn with_deck(mut self, deck_name: impl Into<String>) -> Self {
        self.deck_name = Some(deck_name.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    pub fn with_cards_count(mut self, count: usize) -> Self {
        self.cards_count = Some(count);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Repository for the history ledger.
pub struct HistoryRepository<'a> {
    storage: &'a Storage,
}

impl<'a> HistoryRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record an entry, logging instead of failing if it cannot be stored.
    ///
    /// The action being recorded has already happened; a history failure
    /// must not turn it into an error for the caller.
    pub fn append(&self, entry: HistoryEntry) {
        let action = entry.action_type;
        if let Err(e) = self.try_append(entry) {
            tracing::warn!(?action, error = %e, "Failed to record history entry");
        }
    }

    /// Record an entry and return its id.
    pub fn try_append(&self, mut entry: HistoryEntry) -> StorageResult<u64> {
        Ok(self.storage.db().append_history(&mut entry)?)
    }

    /// All entries, newest first.
    pub fn list(&self) -> StorageResult<Vec<HistoryEntry>> {
        Ok(self.storage.db().list_history(None, 0)?.0)
    }

    /// A page of entries, newest first, with the total number of entries.
    pub fn list_page(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<(Vec<HistoryEntry>, u64)> {
        Ok(self.storage.db().list_history(limit, offset)?)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> StorageResult<u64> {
        Ok(self.storage.db().clear_history()?)
    }
}
