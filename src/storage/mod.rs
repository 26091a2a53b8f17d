// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives under a single data directory:
//!
//! ```text
//! {DATA_DIR}/
//!   flashdeck.redb      # users, deck registry, history, counters
//!   decks/
//!     {deck_name}       # raw deck bytes
//!     .staging/         # in-flight uploads (*.part) and deletes (*.trash)
//! ```
//!
//! Structured records go through the embedded [`Database`]; deck bytes go
//! through the [`ContentStore`]. The repositories coordinate the two.

pub mod content;
pub mod database;
pub mod error;
pub mod locks;
pub mod paths;
pub mod repository;

use std::path::Path;
use std::sync::Arc;

pub use content::ContentStore;
pub use database::{Database, DatabaseError};
pub use error::{StorageError, StorageResult};
pub use locks::KeyedLocks;
pub use paths::StoragePaths;
pub use repository::{
    DeckRepository, HistoryAction, HistoryEntry, HistoryRepository, RecoveryReport, StoredDeck,
    StoredUser, Theme, UserRepository,
};

/// Handle to everything persisted by the server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Storage {
    paths: StoragePaths,
    db: Arc<Database>,
    content: ContentStore,
    locks: Arc<KeyedLocks>,
}

impl Storage {
    /// Open storage rooted at `root`, creating directories and tables as needed.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let paths = StoragePaths::new(root);
        let content = ContentStore::new(paths.clone());
        content.initialize()?;
        let db = Database::open(&paths.database_file())?;

        Ok(Self {
            paths,
            db: Arc::new(db),
            content,
            locks: Arc::new(KeyedLocks::new()),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Check both the content directory and the database respond.
    pub fn health_check(&self) -> StorageResult<()> {
        self.content.health_check()?;
        self.db.ping()?;
        Ok(())
    }
}
