use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crown_oracle::analysis::oracle::{EncodedDeck, LinearScorer, OracleRanker, Scorer};
use crown_oracle::analysis::win_rates::{Aggregates, ORACLE_POOL_SIZE};
use crown_oracle::context::{AnalysisContext, CorpusData};
use crown_oracle::data::card_index::{CardIndex, DEFAULT_INDEX};
use crown_oracle::data::catalog::CardCatalog;
use crown_oracle::data::corpus::{Deck, LoadReport, MatchRecord};
use crown_oracle::error::AppError;

const OPPONENT: Deck = [1, 2, 3, 4, 5, 6, 7, 8];

/// Scores a candidate by its first index; counts batch calls.
struct FirstCardScorer {
    inputs: usize,
    calls: AtomicUsize,
    last_batch: AtomicUsize,
}

impl FirstCardScorer {
    fn new(inputs: usize) -> Self {
        FirstCardScorer {
            inputs,
            calls: AtomicUsize::new(0),
            last_batch: AtomicUsize::new(0),
        }
    }
}

impl Scorer for FirstCardScorer {
    fn input_count(&self) -> usize {
        self.inputs
    }

    fn score_batch(
        &self,
        opponents: &[EncodedDeck],
        candidates: &[EncodedDeck],
    ) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_batch.store(candidates.len(), Ordering::SeqCst);
        assert_eq!(opponents.len(), candidates.len());
        assert!(opponents.windows(2).all(|w| w[0] == w[1]));
        Ok(candidates
            .iter()
            .map(|c| if c[0] == 7 { 0.9 } else { 0.1 })
            .collect())
    }
}

struct TruncatingScorer;

impl Scorer for TruncatingScorer {
    fn input_count(&self) -> usize {
        2
    }

    fn score_batch(
        &self,
        _opponents: &[EncodedDeck],
        candidates: &[EncodedDeck],
    ) -> Result<Vec<f32>, AppError> {
        Ok(vec![0.5; candidates.len().saturating_sub(1)])
    }
}

fn winning_decks(count: u32) -> Vec<MatchRecord> {
    (0..count)
        .map(|i| {
            let base = 1_000 + i * 8;
            MatchRecord {
                deck_a: [base, base + 1, base + 2, base + 3, base + 4, base + 5, base + 6, base + 7],
                deck_b: OPPONENT,
                crowns_a: 1,
                crowns_b: 0,
            }
        })
        .collect()
}

fn context_with(records: Vec<MatchRecord>) -> AnalysisContext {
    let report = LoadReport {
        kept: records.len(),
        dropped: 0,
    };
    AnalysisContext::new(CardCatalog::default())
        .with_corpus(Arc::new(CorpusData::build(records, report)))
}

#[test]
fn scores_the_whole_pool_in_one_batch() {
    let records = winning_decks(1200);
    let aggregates = Aggregates::build(&records);
    let pool = aggregates.meta_pool.oracle_pool();
    assert_eq!(pool.len(), ORACLE_POOL_SIZE);

    // Only the deck at rank 600 holds a card the model knows as index 7.
    let target = pool[600].deck.cards()[0];
    let index = CardIndex::from_pairs([(target, 7)]);
    let scorer = FirstCardScorer::new(2);

    let best = OracleRanker::new(&scorer, &index, pool).rank(&OPPONENT).unwrap();

    assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(scorer.last_batch.load(Ordering::SeqCst), ORACLE_POOL_SIZE);
    assert_eq!(best.index, 600);
    assert_eq!(best.deck, pool[600].deck);
    assert!((best.win_probability - 0.9).abs() < 1e-6);
}

#[test]
fn ties_resolve_to_most_frequent_deck() {
    let records = winning_decks(5);
    let aggregates = Aggregates::build(&records);
    let pool = aggregates.meta_pool.oracle_pool();
    let index = CardIndex::default();
    let scorer = FirstCardScorer::new(2);

    let best = OracleRanker::new(&scorer, &index, pool).rank(&OPPONENT).unwrap();
    assert_eq!(best.index, 0);
    assert!(best.index < pool.len());
}

#[test]
fn wrong_input_count_is_shape_mismatch() {
    let records = winning_decks(3);
    let aggregates = Aggregates::build(&records);
    let index = CardIndex::default();
    let scorer = FirstCardScorer::new(3);

    let result = OracleRanker::new(&scorer, &index, aggregates.meta_pool.oracle_pool()).rank(&OPPONENT);
    assert!(matches!(result, Err(AppError::ModelShapeMismatch(_))));
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn short_output_is_shape_mismatch() {
    let records = winning_decks(3);
    let aggregates = Aggregates::build(&records);
    let index = CardIndex::default();

    let result = OracleRanker::new(&TruncatingScorer, &index, aggregates.meta_pool.oracle_pool())
        .rank(&OPPONENT);
    assert!(matches!(result, Err(AppError::ModelShapeMismatch(_))));
}

#[test]
fn context_checks_preconditions() {
    let no_model = context_with(winning_decks(3));
    assert!(matches!(
        no_model.rank_oracle(&OPPONENT),
        Err(AppError::ModelUnavailable(_))
    ));

    let no_corpus = AnalysisContext::new(CardCatalog::default())
        .with_oracle(Arc::new(FirstCardScorer::new(2)), CardIndex::default());
    assert!(matches!(
        no_corpus.rank_oracle(&OPPONENT),
        Err(AppError::MetaPoolUnavailable(_))
    ));

    let empty_corpus = context_with(Vec::new())
        .with_oracle(Arc::new(FirstCardScorer::new(2)), CardIndex::default());
    assert!(matches!(
        empty_corpus.rank_oracle(&OPPONENT),
        Err(AppError::MetaPoolUnavailable(_))
    ));
}

#[test]
fn context_ranks_with_linear_model() {
    // Card 1000 is strong; every other known index is neutral.
    let scorer = LinearScorer::from_json(r#"{"bias": 0.0, "weights": [0.0, 0.0, 8.0]}"#).unwrap();
    let index = CardIndex::from_pairs([(1_000, 2), (1, 1)]);
    let context = context_with(winning_decks(4)).with_oracle(Arc::new(scorer), index);

    let best = context.rank_oracle(&OPPONENT).unwrap();
    assert!(best.deck.contains(1_000));
    assert_eq!(best.pool_size, 4);
    assert!(best.win_probability > 0.5);
}

#[test]
fn unknown_cards_encode_to_default_index() {
    let index = CardIndex::from_pairs([(1, 5)]);
    let encoded = index.encode(&OPPONENT);
    assert_eq!(encoded[0], 5);
    assert!(encoded[1..].iter().all(|i| *i == DEFAULT_INDEX));
}

#[test]
fn context_reports_cards_missing_from_model() {
    let index = CardIndex::from_pairs([(1, 1), (2, 2), (3, 3)]);
    let context = context_with(winning_decks(4))
        .with_oracle(Arc::new(FirstCardScorer::new(2)), index);
    assert_eq!(context.unmapped_cards(&OPPONENT), vec![4, 5, 6, 7, 8]);

    let without_model = context_with(winning_decks(4));
    assert!(without_model.unmapped_cards(&OPPONENT).is_empty());
}
