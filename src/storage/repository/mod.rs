// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to storage.
//!
//! Each repository borrows the shared [`Storage`](super::Storage) bundle and
//! exposes the operations for one entity type.

pub mod decks;
pub mod history;
pub mod users;

pub use decks::{validate_deck_name, DeckRepository, RecoveryReport, StoredDeck, PDF_MAGIC};
pub use history::{HistoryAction, HistoryEntry, HistoryRepository};
pub use users::{normalize_email, StoredUser, Theme, UserRepository};
