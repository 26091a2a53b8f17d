// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent state.
pub const DATA_ROOT: &str = "./data";

/// File name of the embedded database under the data root.
pub const DATABASE_FILE: &str = "flashdeck.redb";

/// Name of the staging directory inside the decks directory.
///
/// Deck names may not start with `.`, so this can never collide with a deck.
const STAGING_DIR: &str = ".staging";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the redb database file.
    pub fn database_file(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    // ========== Deck Content Paths ==========

    /// Directory holding the published bytes of every deck.
    pub fn decks_dir(&self) -> PathBuf {
        self.root.join("decks")
    }

    /// Published content of a deck. `name` must already be validated.
    pub fn deck_content(&self, name: &str) -> PathBuf {
        self.decks_dir().join(name)
    }

    /// Directory for in-flight uploads and deletions.
    pub fn staging_dir(&self) -> PathBuf {
        self.decks_dir().join(STAGING_DIR)
    }

    /// Temporary file an upload is written to before being published.
    pub fn staging_file(&self, id: &str) -> PathBuf {
        self.staging_dir().join(format!("{id}.part"))
    }

    /// Location content is moved to while its registry entry is removed.
    pub fn trash_file(&self, id: &str) -> PathBuf {
        self.staging_dir().join(format!("{id}.trash"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./data"));
        assert_eq!(
            paths.database_file(),
            PathBuf::from("./data/flashdeck.redb")
        );
    }

    #[test]
    fn deck_paths_are_correct() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.decks_dir(), PathBuf::from("/tmp/test-data/decks"));
        assert_eq!(
            paths.deck_content("notes.pdf"),
            PathBuf::from("/tmp/test-data/decks/notes.pdf")
        );
    }

    #[test]
    fn staging_lives_inside_decks_dir() {
        let paths = StoragePaths::new("/srv");
        assert_eq!(paths.staging_dir(), PathBuf::from("/srv/decks/.staging"));
        assert_eq!(
            paths.staging_file("abc"),
            PathBuf::from("/srv/decks/.staging/abc.part")
        );
        assert_eq!(
            paths.trash_file("abc"),
            PathBuf::from("/srv/decks/.staging/abc.trash")
        );
    }
}
