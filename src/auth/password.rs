// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password policy and Argon2id hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...`), so the parameters a
//! hash was produced with travel with it. Changing the configured cost
//! only affects new hashes; existing ones keep verifying.
//!
//! Hashing is deliberately slow. Async callers should run it on the
//! blocking pool.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use thiserror::Error;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane.
pub const DEFAULT_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

// =============================================================================
// Errors
// =============================================================================

/// Password policy violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
}

/// Hashing failures. These are server faults, never the caller's.
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

// =============================================================================
// Policy
// =============================================================================

/// Check `password` against the account password policy.
pub fn validate_password_policy(password: &str) -> Result<(), PasswordPolicyError> {
    let actual = password.chars().count();
    if actual < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual,
        });
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    Ok(())
}

// =============================================================================
// Hasher
// =============================================================================

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl HashCost {
    /// Smallest cost argon2 accepts. Only for tests.
    #[cfg(test)]
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Argon2id password hasher with fixed cost parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a random secret, checked when there is no stored hash so the
    /// caller spends the same time either way.
    dummy_hash: String,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// Build a hasher, rejecting parameters argon2 would refuse.
    pub fn new(cost: HashCost) -> Result<Self, PasswordHashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(&uuid::Uuid::new_v4().to_string())?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify `password` against a stored PHC hash.
    ///
    /// A malformed stored hash never verifies.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        // Parameters come from the PHC string, not from `self`.
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification for an account that does not exist. Always false.
    pub fn verify_missing(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost::minimal()).unwrap()
    }

    #[test]
    fn policy_rejects_short_passwords() {
        assert_eq!(
            validate_password_policy("Ab1"),
            Err(PasswordPolicyError::TooShort { min: 6, actual: 3 })
        );
    }

    #[test]
    fn policy_counts_characters_not_bytes() {
        // Five characters, ten bytes
        assert!(matches!(
            validate_password_policy("Ééééé"),
            Err(PasswordPolicyError::TooShort { actual: 5, .. })
        ));
    }

    #[test]
    fn policy_requires_uppercase() {
        assert_eq!(
            validate_password_policy("password"),
            Err(PasswordPolicyError::MissingUppercase)
        );
    }

    #[test]
    fn policy_accepts_valid_password() {
        assert!(validate_password_policy("Secret1").is_ok());
        assert!(validate_password_policy("Abcdef").is_ok());
    }

    #[test]
    fn hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("Secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Secret1", &hash));
        assert!(!hasher.verify("Secret2", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("Secret1").unwrap();
        let b = hasher.hash("Secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_uses_parameters_from_hash() {
        let old = hasher().hash("Secret1").unwrap();
        let stronger = PasswordHasher::new(HashCost {
            memory_kib: 64,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("Secret1", &old));
    }

    #[test]
    fn missing_account_check_costs_a_real_verification() {
        let hasher = hasher();
        let cost = HashCost::minimal();
        assert!(hasher.dummy_hash.starts_with(&format!(
            "$argon2id$v=19$m={},t={},p={}$",
            cost.memory_kib, cost.iterations, cost.parallelism
        )));
        assert!(!hasher.verify_missing("Secret1"));
        assert!(!hasher.verify_missing(""));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!hasher().verify("Secret1", "not-a-phc-string"));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        let err = PasswordHasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(err, Err(PasswordHashError::InvalidParams(_))));
    }
}
