// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deck registry.
//!
//! A deck is a registry entry in the `decks` table plus one content file
//! under `decks/`. The two are kept in step by ordering: on upload the
//! content is published before the entry is committed, on delete the
//! content is moved aside before the entry is removed. Whatever a crash
//! leaves behind is reconciled by [`DeckRepository::recover`].
//!
//! Upload and delete of the same name are serialized through the shared
//! [`KeyedLocks`](crate::storage::KeyedLocks); different names never wait
//! for each other.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{locks::deck_key, Storage, StorageError, StorageResult};

/// Every accepted deck starts with this signature.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Longest accepted deck name, in bytes.
const MAX_DECK_NAME_LEN: usize = 255;

/// Deck registry entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDeck {
    /// Unique deck name (the uploaded filename)
    pub name: String,
    /// Content size in bytes
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Email of the authenticated uploader, if any
    pub uploaded_by: Option<String>,
}

/// What `recover()` cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Leftover staging and trash files
    pub staged_removed: usize,
    /// Content files without a registry entry
    pub orphan_files_removed: usize,
    /// Registry entries without a content file
    pub dangling_entries_removed: usize,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Check that `name` can be used as a deck name and content file name.
pub fn validate_deck_name(name: &str) -> StorageResult<()> {
    let invalid = |reason: &str| -> StorageResult<()> {
        Err(StorageError::InvalidDeckName(format!("{name:?} {reason}")))
    };

    if name.trim().is_empty() {
        return invalid("is empty");
    }
    if name.len() > MAX_DECK_NAME_LEN {
        return invalid("is too long");
    }
    if name.contains(['/', '\\']) {
        return invalid("contains a path separator");
    }
    if name.contains("..") {
        return invalid("contains '..'");
    }
    if name.chars().any(char::is_control) {
        return invalid("contains control characters");
    }
    if name.starts_with('.') {
        return invalid("starts with '.'");
    }
    Ok(())
}

fn has_pdf_extension(name: &str) -> bool {
    name.len() > 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}

/// Repository for deck operations.
pub struct DeckRepository<'a> {
    storage: &'a Storage,
    require_signature: bool,
}

impl<'a> DeckRepository<'a> {
    /// Create a DeckRepository. With `require_signature`, uploads must start
    /// with the PDF magic bytes.
    pub fn new(storage: &'a Storage, require_signature: bool) -> Self {
        Self {
            storage,
            require_signature,
        }
    }

    /// Upload a new deck.
    ///
    /// Fails with `DeckExists` if the name is taken.
    pub fn upload(
        &self,
        name: &str,
        content: &[u8],
        uploaded_by: Option<&str>,
    ) -> StorageResult<StoredDeck> {
        validate_deck_name(name)?;
        if !has_pdf_extension(name) {
            return Err(StorageError::NotPdf("Only PDF files are allowed".to_string()));
        }
        if content.is_empty() {
            return Err(StorageError::EmptyContent);
        }
        if self.require_signature && !content.starts_with(PDF_MAGIC) {
            return Err(StorageError::NotPdf(
                "File content is not a PDF document".to_string(),
            ));
        }

        self.storage.locks().with_lock(&deck_key(name), || {
            let db = self.storage.db();
            if db.get_deck(name)?.is_some() {
                return Err(StorageError::DeckExists(name.to_string()));
            }

            let content_store = self.storage.content();
            content_store.write_atomic(name, content)?;

            let deck = StoredDeck {
                name: name.to_string(),
                size_bytes: content.len() as u64,
                created_at: Utc::now(),
                uploaded_by: uploaded_by.map(str::to_string),
            };
            if let Err(e) = db.put_deck(&deck) {
                if let Err(cleanup) = content_store.remove(name) {
                    tracing::warn!(deck = %name, error = %cleanup, "Failed to remove unregistered deck content");
                }
                return Err(e.into());
            }
            Ok(deck)
        })
    }

    /// All decks ordered by name.
    pub fn list(&self) -> StorageResult<Vec<StoredDeck>> {
        Ok(self.storage.db().list_decks()?)
    }

    /// Get a deck by name.
    pub fn get(&self, name: &str) -> StorageResult<StoredDeck> {
        if validate_deck_name(name).is_err() {
            return Err(StorageError::NotFound(format!("Deck {name}")));
        }
        self.storage
            .db()
            .get_deck(name)?
            .ok_or_else(|| StorageError::NotFound(format!("Deck {name}")))
    }

    /// Read the raw bytes of a deck.
    pub fn read_content(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.get(name)?;
        self.storage.content().read(name)
    }

    /// Delete a deck and its content.
    pub fn delete(&self, name: &str) -> StorageResult<StoredDeck> {
        if validate_deck_name(name).is_err() {
            return Err(StorageError::NotFound(format!("Deck {name}")));
        }

        self.storage.locks().with_lock(&deck_key(name), || {
            let db = self.storage.db();
            let content_store = self.storage.content();

            let deck = db
                .get_deck(name)?
                .ok_or_else(|| StorageError::NotFound(format!("Deck {name}")))?;

            let trash = if content_store.exists(name) {
                Some(content_store.move_to_trash(name)?)
            } else {
                tracing::warn!(deck = %name, "Deck content missing; removing registry entry only");
                None
            };

            if let Err(e) = db.remove_deck(name) {
                if let Some(trash) = &trash {
                    if let Err(restore) = content_store.restore_from_trash(trash, name) {
                        tracing::error!(deck = %name, error = %restore, "Failed to restore deck content");
                    }
                }
                return Err(e.into());
            }

            if let Some(trash) = trash {
                if let Err(e) = content_store.purge(&trash) {
                    tracing::warn!(deck = %name, error = %e, "Failed to purge trashed deck content");
                }
            }
            Ok(deck)
        })
    }

    /// Reconcile the registry with the content directory.
    ///
    /// Must run before the server accepts requests.
    pub fn recover(&self) -> StorageResult<RecoveryReport> {
        let db = self.storage.db();
        let content_store = self.storage.content();
        let mut report = RecoveryReport {
            staged_removed: content_store.clear_staging()?,
            ..Default::default()
        };

        let files: HashSet<String> = content_store.list_names()?.into_iter().collect();
        let registered: HashSet<String> = db.list_decks()?.into_iter().map(|d| d.name).collect();

        for orphan in files.difference(&registered) {
            content_store.remove(orphan)?;
            report.orphan_files_removed += 1;
        }
        for dangling in registered.difference(&files) {
            db.remove_deck(dangling)?;
            report.dangling_entries_removed += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PDF: &[u8] = b"%PDF-1.7\nhello";

    fn setup() -> (TempDir, Storage) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::open(temp.path()).unwrap();
        (temp, storage)
    }

    #[test]
    fn deck_name_validation() {
        assert!(validate_deck_name("notes.pdf").is_ok());
        assert!(validate_deck_name("My Notes (1).pdf").is_ok());
        for bad in ["", "  ", "../x.pdf", "a/b.pdf", "a\\b.pdf", ".hidden.pdf", "a\nb.pdf"] {
            assert!(
                matches!(validate_deck_name(bad), Err(StorageError::InvalidDeckName(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_deck_name(&"a".repeat(300)).is_err());
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(has_pdf_extension("a.pdf"));
        assert!(has_pdf_extension("a.PDF"));
        assert!(!has_pdf_extension(".pdf"));
        assert!(!has_pdf_extension("a.txt"));
        assert!(!has_pdf_extension("pdf"));
    }

    #[test]
    fn upload_get_list() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);

        let deck = repo.upload("b.pdf", PDF, Some("a@b.io")).unwrap();
        assert_eq!(deck.size_bytes, PDF.len() as u64);
        assert_eq!(deck.uploaded_by.as_deref(), Some("a@b.io"));
        repo.upload("a.pdf", PDF, None).unwrap();

        assert_eq!(repo.get("b.pdf").unwrap(), deck);
        assert_eq!(repo.read_content("b.pdf").unwrap(), PDF);
        let names: Vec<_> = repo.list().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn reupload_is_rejected() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);
        repo.upload("a.pdf", PDF, None).unwrap();

        let err = repo.upload("a.pdf", b"%PDF-other", None).unwrap_err();
        assert!(matches!(err, StorageError::DeckExists(_)));
        assert_eq!(repo.read_content("a.pdf").unwrap(), PDF);
    }

    #[test]
    fn non_pdf_leaves_no_trace() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);

        let err = repo.upload("notes.txt", PDF, None).unwrap_err();
        assert!(matches!(err, StorageError::NotPdf(_)));
        let err = repo.upload("fake.pdf", b"plain text", None).unwrap_err();
        assert!(matches!(err, StorageError::NotPdf(_)));

        assert!(repo.list().unwrap().is_empty());
        assert!(storage.content().list_names().unwrap().is_empty());
        assert!(!storage.content().exists("notes.txt"));
    }

    #[test]
    fn signature_check_can_be_disabled() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, false);
        repo.upload("fake.pdf", b"plain text", None).unwrap();
        // The extension is still enforced
        assert!(repo.upload("notes.txt", PDF, None).is_err());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);
        let err = repo.upload("a.pdf", b"", None).unwrap_err();
        assert!(matches!(err, StorageError::EmptyContent));
    }

    #[test]
    fn delete_removes_entry_and_content() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);
        repo.upload("a.pdf", PDF, None).unwrap();

        let deleted = repo.delete("a.pdf").unwrap();
        assert_eq!(deleted.name, "a.pdf");
        assert!(repo.list().unwrap().is_empty());
        assert!(!storage.content().exists("a.pdf"));
        assert_eq!(
            fs::read_dir(storage.paths().staging_dir()).unwrap().count(),
            0
        );

        assert!(matches!(repo.delete("a.pdf"), Err(StorageError::NotFound(_))));
        assert!(matches!(repo.get("a.pdf"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn invalid_names_are_not_found_on_lookup() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);
        assert!(matches!(repo.get("../etc"), Err(StorageError::NotFound(_))));
        assert!(matches!(repo.delete("../etc"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn upload_after_delete_succeeds() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);
        repo.upload("a.pdf", PDF, None).unwrap();
        repo.delete("a.pdf").unwrap();
        repo.upload("a.pdf", b"%PDF-2", None).unwrap();
        assert_eq!(repo.read_content("a.pdf").unwrap(), b"%PDF-2");
    }

    #[test]
    fn concurrent_uploads_of_different_names() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);

        std::thread::scope(|s| {
            for i in 0..8 {
                let repo = &repo;
                s.spawn(move || repo.upload(&format!("deck-{i}.pdf"), PDF, None).unwrap());
            }
        });

        assert_eq!(repo.list().unwrap().len(), 8);
        assert_eq!(storage.content().list_names().unwrap().len(), 8);
    }

    #[test]
    fn concurrent_upload_and_delete_never_orphan() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);

        for _ in 0..20 {
            std::thread::scope(|s| {
                s.spawn(|| {
                    let _ = repo.upload("race.pdf", PDF, None);
                });
                s.spawn(|| {
                    let _ = repo.delete("race.pdf");
                });
            });

            let registered = repo.get("race.pdf").is_ok();
            assert_eq!(registered, storage.content().exists("race.pdf"));
        }
    }

    #[test]
    fn recover_reconciles_registry_and_content() {
        let (_temp, storage) = setup();
        let repo = DeckRepository::new(&storage, true);
        repo.upload("kept.pdf", PDF, None).unwrap();
        repo.upload("dangling.pdf", PDF, None).unwrap();

        fs::remove_file(storage.paths().deck_content("dangling.pdf")).unwrap();
        fs::write(storage.paths().deck_content("orphan.pdf"), PDF).unwrap();
        fs::write(storage.paths().staging_file("interrupted"), b"%PDF-").unwrap();

        let report = repo.recover().unwrap();
        assert_eq!(
            report,
            RecoveryReport {
                staged_removed: 1,
                orphan_files_removed: 1,
                dangling_entries_removed: 1,
            }
        );

        let names: Vec<_> = repo.list().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["kept.pdf"]);
        assert_eq!(storage.content().list_names().unwrap(), vec!["kept.pdf"]);
        assert!(repo.recover().unwrap().is_clean());
    }
}
