//! Batch scoring of the meta pool against one opponent deck.

use crate::analysis::win_rates::{CanonicalDeck, MetaEntry};
use crate::data::card_index::{CardIndex, ModelIndex};
use crate::data::corpus::{Deck, DECK_SIZE};
use crate::error::AppError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub type EncodedDeck = [ModelIndex; DECK_SIZE];

/// Number of input tensors a scorer must declare: opponent decks, candidate decks.
pub const SCORER_INPUTS: usize = 2;

/// An externally trained win-probability model.
///
/// `score_batch` receives two batches of equal length and returns, for each row,
/// the probability that the candidate deck beats the opponent deck.
pub trait Scorer: Send + Sync {
    fn input_count(&self) -> usize;

    fn score_batch(
        &self,
        opponents: &[EncodedDeck],
        candidates: &[EncodedDeck],
    ) -> Result<Vec<f32>, AppError>;
}

/// Logistic model over per-index card strengths, stored as JSON:
/// `{ "bias": 0.1, "weights": [0.0, 0.3, ...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearScorer {
    #[serde(default)]
    pub bias: f32,
    pub weights: Vec<f32>,
}

impl LinearScorer {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::JsonError(format!("Failed to parse oracle model: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    fn strength(&self, deck: &EncodedDeck) -> f32 {
        let total: f32 = deck
            .iter()
            .map(|idx| self.weights.get(*idx as usize).copied().unwrap_or(0.0))
            .sum();
        total / DECK_SIZE as f32
    }
}

impl Scorer for LinearScorer {
    fn input_count(&self) -> usize {
        SCORER_INPUTS
    }

    fn score_batch(
        &self,
        opponents: &[EncodedDeck],
        candidates: &[EncodedDeck],
    ) -> Result<Vec<f32>, AppError> {
        if opponents.len() != candidates.len() {
            return Err(AppError::ModelShapeMismatch(format!(
                "batch sizes differ: {} opponents vs {} candidates",
                opponents.len(),
                candidates.len()
            )));
        }

        Ok(opponents
            .iter()
            .zip(candidates)
            .map(|(opp, cand)| {
                let logit = self.bias + self.strength(cand) - self.strength(opp);
                1.0 / (1.0 + (-logit).exp())
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    /// Position in the oracle pool (0 = most frequent winner).
    pub index: usize,
    pub deck: CanonicalDeck,
    pub win_probability: f32,
    pub pool_size: usize,
}

pub struct OracleRanker<'a> {
    scorer: &'a dyn Scorer,
    card_index: &'a CardIndex,
    pool: &'a [MetaEntry],
}

impl<'a> OracleRanker<'a> {
    pub fn new(scorer: &'a dyn Scorer, card_index: &'a CardIndex, pool: &'a [MetaEntry]) -> Self {
        OracleRanker {
            scorer,
            card_index,
            pool,
        }
    }

    /// Score every pool deck against `opponent` in one batch and keep the best.
    /// Equal probabilities resolve to the lower index.
    pub fn rank(&self, opponent: &Deck) -> Result<BestMatch, AppError> {
        if self.pool.is_empty() {
            return Err(AppError::MetaPoolUnavailable(
                "no winning decks in the corpus".to_string(),
            ));
        }

        let inputs = self.scorer.input_count();
        if inputs != SCORER_INPUTS {
            return Err(AppError::ModelShapeMismatch(format!(
                "expected a {}-input model, got {} inputs",
                SCORER_INPUTS, inputs
            )));
        }

        let opponents = vec![self.card_index.encode(opponent); self.pool.len()];
        let candidates: Vec<EncodedDeck> = self
            .pool
            .iter()
            .map(|entry| self.card_index.encode(entry.deck.cards()))
            .collect();

        let probabilities = self.scorer.score_batch(&opponents, &candidates)?;
        if probabilities.len() != candidates.len() {
            return Err(AppError::ModelShapeMismatch(format!(
                "expected {} probabilities, got {}",
                candidates.len(),
                probabilities.len()
            )));
        }

        let (index, win_probability) = argmax(&probabilities).ok_or_else(|| {
            AppError::ModelShapeMismatch("scorer returned no finite probability".to_string())
        })?;

        Ok(BestMatch {
            index,
            deck: self.pool[index].deck,
            win_probability,
            pool_size: self.pool.len(),
        })
    }
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in values.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| p > b) {
            best = Some((i, p));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_of_equals() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7, 0.1]), Some((1, 0.7)));
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some((1, 0.3)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn linear_scorer_is_even_for_mirror_match() {
        let scorer = LinearScorer::from_json(r#"{"weights": [0.0, 1.0, 2.0]}"#).unwrap();
        let deck = [1, 2, 1, 2, 1, 2, 1, 2];
        let probs = scorer.score_batch(&[deck], &[deck]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn linear_scorer_favours_stronger_candidate() {
        let scorer = LinearScorer {
            bias: 0.0,
            weights: vec![0.0, 1.0, 4.0],
        };
        let weak = [1; DECK_SIZE];
        let strong = [2; DECK_SIZE];
        let probs = scorer.score_batch(&[weak, weak], &[weak, strong]).unwrap();
        assert!(probs[1] > probs[0]);
        assert!(probs[1] > 0.9);
    }

    #[test]
    fn linear_scorer_rejects_uneven_batches() {
        let scorer = LinearScorer {
            bias: 0.0,
            weights: vec![],
        };
        assert!(matches!(
            scorer.score_batch(&[[0; DECK_SIZE]], &[]),
            Err(AppError::ModelShapeMismatch(_))
        ));
    }
}
