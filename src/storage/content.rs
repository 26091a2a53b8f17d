// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem store for raw deck bytes.
//!
//! Every deck's content is a single file under `decks/`, named after the
//! deck. Writers never touch a published path directly: bytes go to a
//! staging file which is renamed into place, so readers either see the
//! whole file or no file at all. Deletion works the same way in reverse,
//! moving the file into staging first so it can be restored if the
//! registry update fails.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::{StoragePaths, StorageResult};

/// Deck content store.
#[derive(Debug, Clone)]
pub struct ContentStore {
    paths: StoragePaths,
}

impl ContentStore {
    /// Create a new ContentStore. Call `initialize()` before use.
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the directory structure. Safe to call multiple times.
    pub fn initialize(&self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.decks_dir())?;
        fs::create_dir_all(self.paths.staging_dir())?;
        Ok(())
    }

    /// Check the content directory is writable with a write-read-delete cycle.
    pub fn health_check(&self) -> StorageResult<()> {
        let test_file = self
            .paths
            .staging_file(&format!("health-{}", uuid::Uuid::new_v4().simple()));
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(io::Error::other("health check data mismatch").into());
        }
        Ok(())
    }

    /// Whether published content exists for `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.paths.deck_content(name).is_file()
    }

    /// Write `data` as the content of `name`, publishing it by rename.
    pub fn write_atomic(&self, name: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let staging = self.paths.staging_file(&uuid::Uuid::new_v4().simple().to_string());
        let target = self.paths.deck_content(name);

        let written = (|| -> io::Result<()> {
            let mut file = File::create(&staging)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&staging, &target)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(target)
    }

    /// Read the full content of `name`.
    pub fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let mut file = File::open(self.paths.deck_content(name))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Remove the published content of `name`.
    pub fn remove(&self, name: &str) -> StorageResult<()> {
        fs::remove_file(self.paths.deck_content(name))?;
        Ok(())
    }

    /// Unpublish `name` by moving it into staging. Returns the trash path.
    pub fn move_to_trash(&self, name: &str) -> StorageResult<PathBuf> {
        let trash = self.paths.trash_file(&uuid::Uuid::new_v4().simple().to_string());
        fs::rename(self.paths.deck_content(name), &trash)?;
        Ok(trash)
    }

    /// Republish content previously moved by `move_to_trash`.
    pub fn restore_from_trash(&self, trash: &Path, name: &str) -> StorageResult<()> {
        fs::rename(trash, self.paths.deck_content(name))?;
        Ok(())
    }

    /// Permanently delete a trashed file.
    pub fn purge(&self, trash: &Path) -> StorageResult<()> {
        fs::remove_file(trash)?;
        Ok(())
    }

    /// Names of all published content files.
    pub fn list_names(&self) -> StorageResult<Vec<String>> {
        let dir = self.paths.decks_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove everything left in staging by interrupted writes or deletes.
    ///
    /// Only safe while no upload or delete is running.
    pub fn clear_staging(&self) -> StorageResult<usize> {
        let dir = self.paths.staging_dir();
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
