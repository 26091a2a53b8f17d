// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};

use crate::auth::{PasswordHasher, TokenService};
use crate::cards::{CardSynthesizer, StubSynthesizer};
use crate::config::ServerConfig;
use crate::storage::{
    DeckRepository, HistoryRepository, Storage, StorageError, StorageResult, UserRepository,
};

/// Shared application state, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub storage: Storage,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<PasswordHasher>,
    pub synthesizer: Arc<dyn CardSynthesizer>,
}

impl AppState {
    /// Build state from configuration over already opened storage.
    pub fn new(config: ServerConfig, storage: Storage) -> StorageResult<Self> {
        let secret = match &config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!(
                    "JWT_SECRET is not set; using a random secret, tokens will not survive a restart"
                );
                random_secret()
            }
        };
        let tokens = TokenService::new(&secret, chrono::Duration::hours(config.token_ttl_hours));
        let hasher = PasswordHasher::new(config.hash_cost).map_err(StorageError::Hashing)?;

        Ok(Self {
            config: Arc::new(config),
            storage,
            tokens: Arc::new(tokens),
            hasher: Arc::new(hasher),
            synthesizer: Arc::new(StubSynthesizer),
        })
    }

    /// Replace the card synthesizer.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn CardSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.storage, &self.hasher)
    }

    pub fn decks(&self) -> DeckRepository<'_> {
        DeckRepository::new(&self.storage, self.config.require_pdf_signature)
    }

    pub fn history(&self) -> HistoryRepository<'_> {
        HistoryRepository::new(&self.storage)
    }
}

fn random_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 64];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// State over a fresh temporary data directory, with cheap password hashing.
#[cfg(test)]
pub fn test_state() -> (AppState, tempfile::TempDir) {
    test_state_with(|_| {})
}

/// Like [`test_state`], with a hook to adjust the configuration.
#[cfg(test)]
pub fn test_state_with(configure: impl FnOnce(&mut ServerConfig)) -> (AppState, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let mut config = ServerConfig {
        data_dir: temp_dir.path().to_path_buf(),
        jwt_secret: Some(b"test-secret-that-is-at-least-32-bytes!".to_vec()),
        hash_cost: crate::auth::HashCost::minimal(),
        ..ServerConfig::default()
    };
    configure(&mut config);

    let storage = Storage::open(&config.data_dir).expect("Failed to open storage");
    let state = AppState::new(config, storage).expect("Failed to build state");
    (state, temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_secrets_differ() {
        assert_ne!(random_secret(), random_secret());
        assert_eq!(random_secret().len(), 64);
    }

    #[test]
    fn state_without_secret_still_issues_tokens() {
        let (state, _temp) = test_state_with(|c| c.jwt_secret = None);
        let issued = state.tokens.issue("a@b.io").unwrap();
        assert!(state.tokens.verify(&issued.token).is_ok());
    }

    #[test]
    fn repositories_share_storage() {
        let (state, _temp) = test_state();
        state.decks().upload("a.pdf", b"%PDF-1", None).unwrap();
        assert_eq!(state.decks().list().unwrap().len(), 1);
        assert!(state.history().list().unwrap().is_empty());
    }
}
