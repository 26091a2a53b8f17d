// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Flashcard synthesis.
//!
//! Turning a document into question/answer pairs is delegated to a
//! [`CardSynthesizer`]. The server ships with [`StubSynthesizer`], which
//! returns a fixed set of cards for any deck. Cards are computed per
//! request and never stored.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{DeckRepository, StorageResult, StoredDeck};

/// A single question/answer card.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Card {
    /// 1-based position within the generated set
    pub id: u32,
    pub question: String,
    pub answer: String,
    pub deck_name: String,
}

/// Produces cards for a deck.
pub trait CardSynthesizer: Send + Sync {
    fn synthesize(&self, deck: &StoredDeck) -> Vec<Card>;
}

/// Returns the same three cards for every deck.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubSynthesizer;

const STUB_CARDS: [(&str, &str); 3] = [
    ("What is React?", "A library for building user interfaces"),
    ("What is a component?", "A reusable piece of UI"),
    ("What is useState?", "A hook for state in React"),
];

impl CardSynthesizer for StubSynthesizer {
    fn synthesize(&self, deck: &StoredDeck) -> Vec<Card> {
        STUB_CARDS
            .iter()
            .zip(1..)
            .map(|((question, answer), id)| Card {
                id,
                question: (*question).to_string(),
                answer: (*answer).to_string(),
                deck_name: deck.name.clone(),
            })
            .collect()
    }
}

/// Generate cards for the named deck. Fails with `NotFound` if there is no such deck.
pub fn synthesize_cards(
    decks: &DeckRepository<'_>,
    synthesizer: &dyn CardSynthesizer,
    name: &str,
) -> StorageResult<Vec<Card>> {
    let deck = decks.get(name)?;
    Ok(synthesizer.synthesize(&deck))
}
