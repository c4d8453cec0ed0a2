//! Card id <-> scorer vocabulary index mapping.

use crate::data::catalog::CardId;
use crate::data::corpus::{Deck, DECK_SIZE};
use crate::error::AppError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub type ModelIndex = u32;

/// Index used for cards the scorer has never seen.
pub const DEFAULT_INDEX: ModelIndex = 0;

#[derive(Debug, Clone, Default)]
pub struct CardIndex {
    to_index: HashMap<CardId, ModelIndex>,
    to_card: HashMap<ModelIndex, CardId>,
}

impl CardIndex {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (CardId, ModelIndex)>) -> Self {
        let mut index = CardIndex::default();
        for (card, idx) in pairs {
            index.to_index.insert(card, idx);
            index.to_card.insert(idx, card);
        }
        index
    }

    /// Mapping file format: `{ "26000000": 1, "26000001": 2, ... }`.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let parsed: HashMap<String, ModelIndex> = serde_json::from_str(raw)
            .map_err(|e| AppError::JsonError(format!("Failed to parse card mapping: {}", e)))?;

        let mut pairs = Vec::with_capacity(parsed.len());
        for (card, idx) in parsed {
            let card: CardId = card.trim().parse().map_err(|_| {
                AppError::JsonError(format!("Card mapping key is not a card id: {}", card))
            })?;
            pairs.push((card, idx));
        }
        Ok(Self::from_pairs(pairs))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read card mapping {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_index.is_empty()
    }

    pub fn index_of(&self, card: CardId) -> ModelIndex {
        self.to_index.get(&card).copied().unwrap_or(DEFAULT_INDEX)
    }

    /// Indices without a reverse entry come back unchanged.
    pub fn card_of(&self, idx: ModelIndex) -> CardId {
        self.to_card.get(&idx).copied().unwrap_or(idx)
    }

    pub fn encode(&self, deck: &Deck) -> [ModelIndex; DECK_SIZE] {
        deck.map(|card| self.index_of(card))
    }

    pub fn decode(&self, encoded: &[ModelIndex; DECK_SIZE]) -> Deck {
        encoded.map(|idx| self.card_of(idx))
    }

    /// Cards of `deck` that do not survive an encode/decode round trip.
    pub fn unmapped(&self, deck: &Deck) -> Vec<CardId> {
        let decoded = self.decode(&self.encode(deck));
        deck.iter()
            .zip(decoded.iter())
            .filter(|(card, back)| card != back)
            .map(|(card, _)| *card)
            .collect()
    }
}
