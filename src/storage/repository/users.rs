// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User credential repository.
//!
//! Users are keyed by their normalized email in the `users` table. The
//! password hash is stored as a PHC string and never leaves this module
//! except inside [`StoredUser`], which is not exposed over the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::password::{validate_password_policy, PasswordHasher};

use super::super::{locks::user_key, Storage, StorageError, StorageResult};

/// Maximum email length (RFC 5321).
const EMAIL_MAX_LENGTH: usize = 254;

/// UI theme preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// User record stored in the database.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: Uuid,
    /// Normalized email, also the primary key
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[HASH]")
            .field("display_name", &self.display_name)
            .field("theme", &self.theme)
            .finish()
    }
}

/// Canonical form of an email: NFKC, trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.nfkc().collect::<String>().trim().to_lowercase()
}

/// Basic structural check on an already normalized email.
fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > EMAIL_MAX_LENGTH {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }
    !(domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) || domain.contains(".."))
}

/// Repository for user accounts.
pub struct UserRepository<'a> {
    storage: &'a Storage,
    hasher: &'a PasswordHasher,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a Storage, hasher: &'a PasswordHasher) -> Self {
        Self { storage, hasher }
    }

    /// Create an account.
    ///
    /// The uniqueness check and the insert run in one write transaction,
    /// so two concurrent registrations of the same email cannot both win.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<String>,
    ) -> StorageResult<StoredUser> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(StorageError::InvalidEmail(email));
        }
        validate_password_policy(password)?;

        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let now = Utc::now();
        let user = StoredUser {
            id: Uuid::new_v4(),
            email,
            password_hash: self.hasher.hash(password)?,
            display_name,
            theme: Theme::default(),
            created_at: now,
            updated_at: now,
        };

        if !self.storage.db().insert_user_if_absent(&user)? {
            return Err(StorageError::DuplicateEmail(user.email));
        }
        Ok(user)
    }

    /// Look up a user by email (any casing).
    pub fn get(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self.storage.db().get_user(&normalize_email(email))?)
    }

    /// Return the user if `password` verifies, `None` otherwise.
    ///
    /// Unknown email and wrong password are indistinguishable to callers.
    pub fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StorageResult<Option<StoredUser>> {
        match self.get(email)? {
            Some(user) if self.hasher.verify(password, &user.password_hash) => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                self.hasher.verify_missing(password);
                Ok(None)
            }
        }
    }

    /// Replace the password hash after verifying the old password.
    pub fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> StorageResult<()> {
        let email = normalize_email(email);
        self.storage.locks().with_lock(&user_key(&email), || {
            let mut user = self
                .storage
                .db()
                .get_user(&email)?
                .ok_or(StorageError::InvalidCredentials)?;

            if !self.hasher.verify(old_password, &user.password_hash) {
                return Err(StorageError::InvalidCredentials);
            }
            validate_password_policy(new_password)?;

            user.password_hash = self.hasher.hash(new_password)?;
            user.updated_at = Utc::now();
            self.storage.db().put_user(&user)?;
            Ok(())
        })
    }

    /// Remove an account. Returns whether a record existed.
    pub fn delete(&self, email: &str) -> StorageResult<bool> {
        let email = normalize_email(email);
        self.storage.locks().with_lock(&user_key(&email), || {
            Ok(self.storage.db().remove_user(&email)?.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{HashCost, PasswordPolicyError};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, PasswordHasher) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::open(temp.path()).unwrap();
        let hasher = PasswordHasher::new(HashCost::minimal()).unwrap();
        (temp, storage, hasher)
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        // Fullwidth characters fold under NFKC
        assert_eq!(normalize_email("ａ@b.io"), "a@b.io");
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.io"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@b.io"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@b.io"));
        assert!(!is_valid_email("a@.b.io"));
        assert!(!is_valid_email("a b@c.io"));
        assert!(!is_valid_email(&format!("{}@b.io", "a".repeat(300))));
    }

    #[test]
    fn register_then_verify() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);

        let user = repo
            .register("A@B.io", "Secret1", Some("  Ann ".into()))
            .unwrap();
        assert_eq!(user.email, "a@b.io");
        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert_ne!(user.password_hash, "Secret1");

        assert!(repo.verify_credentials("a@b.io", "Secret1").unwrap().is_some());
        assert!(repo.verify_credentials("A@B.IO", "Secret1").unwrap().is_some());
        assert!(repo.verify_credentials("a@b.io", "secret1").unwrap().is_none());
        assert!(repo.verify_credentials("x@b.io", "Secret1").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);

        repo.register("a@b.io", "Secret1", None).unwrap();
        let err = repo.register(" A@b.io", "Other1x", None).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEmail(ref e) if e == "a@b.io"));
    }

    #[test]
    fn weak_password_is_rejected_without_side_effects() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);

        let err = repo.register("a@b.io", "short", None).unwrap_err();
        assert!(matches!(
            err,
            StorageError::WeakPassword(PasswordPolicyError::TooShort { .. })
        ));
        let err = repo.register("a@b.io", "lowercase1", None).unwrap_err();
        assert!(matches!(
            err,
            StorageError::WeakPassword(PasswordPolicyError::MissingUppercase)
        ));
        assert!(repo.get("a@b.io").unwrap().is_none());
    }

    #[test]
    fn invalid_email_is_rejected() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);
        let err = repo.register("not-an-email", "Secret1", None).unwrap_err();
        assert!(matches!(err, StorageError::InvalidEmail(_)));
    }

    #[test]
    fn change_password_requires_old_password() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);
        repo.register("a@b.io", "Secret1", None).unwrap();
        let before = repo.get("a@b.io").unwrap().unwrap().password_hash;

        let err = repo
            .change_password("a@b.io", "Wrong1", "Newpass1")
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidCredentials));
        assert_eq!(repo.get("a@b.io").unwrap().unwrap().password_hash, before);

        let err = repo
            .change_password("a@b.io", "Secret1", "weak")
            .unwrap_err();
        assert!(matches!(err, StorageError::WeakPassword(_)));
        assert_eq!(repo.get("a@b.io").unwrap().unwrap().password_hash, before);

        repo.change_password("a@b.io", "Secret1", "Newpass1").unwrap();
        assert!(repo.verify_credentials("a@b.io", "Newpass1").unwrap().is_some());
        assert!(repo.verify_credentials("a@b.io", "Secret1").unwrap().is_none());
    }

    #[test]
    fn change_password_for_unknown_user_is_invalid_credentials() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);
        let err = repo
            .change_password("ghost@b.io", "Secret1", "Newpass1")
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidCredentials));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);
        repo.register("a@b.io", "Secret1", None).unwrap();

        assert!(repo.delete("A@b.io").unwrap());
        assert!(!repo.delete("a@b.io").unwrap());
        assert!(repo.get("a@b.io").unwrap().is_none());

        // The email is free again
        repo.register("a@b.io", "Secret1", None).unwrap();
    }

    #[test]
    fn debug_redacts_hash() {
        let (_temp, storage, hasher) = setup();
        let repo = UserRepository::new(&storage, &hasher);
        let user = repo.register("a@b.io", "Secret1", None).unwrap();
        let debug = format!("{user:?}");
        assert!(debug.contains("[HASH]"));
        assert!(!debug.contains("$argon2id$"));
    }
}
