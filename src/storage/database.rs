// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: normalized email → serialized StoredUser
//! - `decks`: deck name → serialized StoredDeck
//! - `history`: entry id → serialized HistoryEntry
//! - `counters`: name → u64 (history id sequence)
//!
//! redb runs one write transaction at a time, so an id allocated inside
//! the transaction that stores the entry always matches commit order.

use std::path::Path;

use redb::{
    Database as RedbDatabase, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition,
};
use serde::{de::DeserializeOwned, Serialize};

use super::repository::decks::StoredDeck;
use super::repository::history::HistoryEntry;
use super::repository::users::StoredUser;

// =============================================================================
// Table Definitions
// =============================================================================

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Identity table: normalized email → StoredUser (JSON bytes).
const USERS: JsonTable = TableDefinition::new("users");

/// Deck registry: deck name → StoredDeck (JSON bytes).
const DECKS: JsonTable = TableDefinition::new("decks");

/// History ledger: monotonic id → HistoryEntry (JSON bytes).
const HISTORY: TableDefinition<u64, &[u8]> = TableDefinition::new("history");

/// Named counters.
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const HISTORY_SEQ: &str = "history_seq";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DatabaseError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID database for identities, the deck registry and history.
pub struct Database {
    db: RedbDatabase,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = RedbDatabase::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(DECKS)?;
            let _ = write_txn.open_table(HISTORY)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap read used by health checks.
    pub fn ping(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(COUNTERS)?;
        Ok(())
    }

    // =========================================================================
    // Generic JSON helpers
    // =========================================================================

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> DbResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn insert_json_if_absent<T: Serialize>(
        &self,
        table: JsonTable,
        key: &str,
        value: &T,
    ) -> DbResult<bool> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            if table.get(key)?.is_some() {
                return Ok(false);
            }
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    fn remove_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> DbResult<Option<T>> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(table)?;
            let bytes = table.remove(key)?.map(|v| v.value().to_vec());
            bytes
        };
        write_txn.commit()?;
        match removed {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_json<T: DeserializeOwned>(&self, table: JsonTable) -> DbResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let mut items = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user unless the email is taken. Returns `false` on conflict.
    pub fn insert_user_if_absent(&self, user: &StoredUser) -> DbResult<bool> {
        self.insert_json_if_absent(USERS, &user.email, user)
    }

    /// Look up a user by normalized email.
    pub fn get_user(&self, email: &str) -> DbResult<Option<StoredUser>> {
        self.get_json(USERS, email)
    }

    /// Overwrite an existing user record.
    pub fn put_user(&self, user: &StoredUser) -> DbResult<()> {
        self.put_json(USERS, &user.email, user)
    }

    /// Remove a user, returning the removed record if there was one.
    pub fn remove_user(&self, email: &str) -> DbResult<Option<StoredUser>> {
        self.remove_json(USERS, email)
    }

    // =========================================================================
    // Decks
    // =========================================================================

    /// Insert or replace a deck registry entry.
    pub fn put_deck(&self, deck: &StoredDeck) -> DbResult<()> {
        self.put_json(DECKS, &deck.name, deck)
    }

    /// Look up a deck by name.
    pub fn get_deck(&self, name: &str) -> DbResult<Option<StoredDeck>> {
        self.get_json(DECKS, name)
    }

    /// Remove a deck entry, returning it if it existed.
    pub fn remove_deck(&self, name: &str) -> DbResult<Option<StoredDeck>> {
        self.remove_json(DECKS, name)
    }

    /// All decks ordered by name, from a single read snapshot.
    pub fn list_decks(&self) -> DbResult<Vec<StoredDeck>> {
        self.list_json(DECKS)
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Store `entry` under the next id of the history sequence.
    ///
    /// The id and timestamp are assigned to `entry` inside the write
    /// transaction, so timestamp order follows id order. The id is returned.
    pub fn append_history(&self, entry: &mut HistoryEntry) -> DbResult<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = counters.get(HISTORY_SEQ)?.map(|v| v.value()).unwrap_or(0) + 1;
            counters.insert(HISTORY_SEQ, id)?;

            entry.id = id;
            entry.timestamp = chrono::Utc::now();
            let json = serde_json::to_vec(entry)?;
            let mut history = write_txn.open_table(HISTORY)?;
            history.insert(id, json.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Newest-first page of history entries plus the total entry count.
    pub fn list_history(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> DbResult<(Vec<HistoryEntry>, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HISTORY)?;
        let total = table.len()?;

        let mut entries = Vec::new();
        let iter = table.iter()?.rev().skip(offset);
        for item in iter.take(limit.unwrap_or(usize::MAX)) {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok((entries, total))
    }

    /// Drop every history entry. The id sequence keeps counting.
    pub fn clear_history(&self) -> DbResult<u64> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let table = write_txn.open_table(HISTORY)?;
            table.len()?
        };
        write_txn.delete_table(HISTORY)?;
        {
            let _ = write_txn.open_table(HISTORY)?;
        }
        write_txn.commit()?;
        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
