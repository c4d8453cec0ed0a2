use std::sync::Arc;

use crown_oracle::analysis::counter::{CounterMiner, MIN_COUNTER_MATCHES};
use crown_oracle::analysis::win_rates::{Aggregates, CanonicalDeck};
use crown_oracle::context::{AnalysisContext, CorpusData};
use crown_oracle::data::catalog::CardCatalog;
use crown_oracle::data::corpus::{Deck, LoadReport, MatchRecord};
use crown_oracle::error::AppError;

const HATED: u32 = 26000021;
const COUNTER: u32 = 27000000;
const RAW_FAVOURITE: u32 = 26000011;

const HATED_DECK: Deck = [HATED, 101, 102, 103, 104, 105, 106, 107];
const COUNTER_DECK: Deck = [COUNTER, 201, 202, 203, 204, 205, 206, 207];
const COUNTER_OFF_META: Deck = [COUNTER, 301, 302, 303, 304, 305, 306, 307];
const FAVOURITE_DECK: Deck = [RAW_FAVOURITE, 401, 402, 403, 404, 405, 406, 407];
const BULLY_DECK: Deck = [501, 502, 503, 504, 505, 506, 507, 508];

fn games(deck_a: Deck, deck_b: Deck, count: usize, a_wins: usize) -> Vec<MatchRecord> {
    (0..count)
        .map(|i| MatchRecord {
            deck_a,
            deck_b,
            crowns_a: if i < a_wins { 3 } else { 0 },
            crowns_b: if i < a_wins { 0 } else { 1 },
        })
        .collect()
}

// COUNTER wins 70% against HATED but only 35% overall; RAW_FAVOURITE wins 80%
// against HATED and 80% overall.
fn corpus() -> Vec<MatchRecord> {
    let mut records = games(COUNTER_DECK, HATED_DECK, 600, 420);
    records.extend(games(COUNTER_OFF_META, BULLY_DECK, 600, 0));
    records.extend(games(FAVOURITE_DECK, HATED_DECK, 600, 480));
    records
}

fn context(records: Vec<MatchRecord>) -> AnalysisContext {
    let report = LoadReport {
        kept: records.len(),
        dropped: 0,
    };
    AnalysisContext::new(CardCatalog::default())
        .with_corpus(Arc::new(CorpusData::build(records, report)))
}

#[test]
fn picks_largest_delta_not_raw_win_rate() {
    let result = context(corpus()).find_counter(HATED).unwrap();

    assert_eq!(result.counter, COUNTER);
    assert_eq!(result.matchup.matches, 600);
    assert!((result.matchup_win_rate - 0.7).abs() < 1e-9);
    assert!((result.global_win_rate - 0.35).abs() < 1e-6);
    assert!((result.delta - 0.35).abs() < 1e-6);
}

#[test]
fn returned_deck_is_highest_ranked_winner_with_counter() {
    let result = context(corpus()).find_counter(HATED).unwrap();

    assert!(result.deck.contains(result.counter));
    assert_eq!(result.deck, CanonicalDeck::new(&COUNTER_DECK));
    // BULLY 600 wins, FAVOURITE 480, COUNTER_DECK 420
    assert_eq!(result.deck_rank, 2);
}

#[test]
fn candidates_respect_significance_floor() {
    let mut records = corpus();
    records.extend(games([901, 2, 3, 4, 5, 6, 7, 8], [HATED, 1, 2, 3, 4, 5, 6, 7], 20, 0));
    let aggregates = Aggregates::build(&records);
    let miner = CounterMiner::new(&records, &aggregates);

    let candidates = miner.candidates(HATED).unwrap();
    assert!(!candidates.is_empty());
    assert!(candidates
        .iter()
        .all(|c| c.matchup.matches >= MIN_COUNTER_MATCHES));
    assert!(candidates.iter().all(|c| c.card != 901));
}

#[test]
fn counter_outside_meta_pool_is_no_viable_deck() {
    let mut records = Vec::new();
    // 5000 decks with two wins each fill the whole meta pool.
    for i in 0..5000u32 {
        let base = 10_000 + i * 8;
        let deck = [base, base + 1, base + 2, base + 3, base + 4, base + 5, base + 6, base + 7];
        records.extend(games(deck, BULLY_DECK, 2, 2));
    }
    // The counter beats HATED 600 times, each time in a different one-off deck.
    for j in 0..600u32 {
        let base = 100_000 + j * 7;
        let deck = [COUNTER, base, base + 1, base + 2, base + 3, base + 4, base + 5, base + 6];
        records.extend(games(deck, HATED_DECK, 1, 1));
    }
    records.extend(games(COUNTER_OFF_META, BULLY_DECK, 600, 0));

    let ctx = context(records);
    let pool = &ctx.corpus().unwrap().aggregates.meta_pool;
    assert_eq!(pool.len(), 5000);
    assert!(pool.entries().iter().all(|e| !e.deck.contains(COUNTER)));

    assert_eq!(
        ctx.find_counter(HATED).unwrap_err(),
        AppError::NoViableDeck(COUNTER.to_string())
    );
}

#[test]
fn hated_card_on_side_a_is_not_mined() {
    // COUNTER_DECK sits on side B here, so none of these games count.
    let records = games(HATED_DECK, COUNTER_DECK, 600, 0);
    assert_eq!(
        context(records).find_counter(HATED).unwrap_err(),
        AppError::InsufficientData(HATED)
    );
}

#[test]
fn unseen_hated_card_is_insufficient_data() {
    assert_eq!(
        context(corpus()).find_counter(999).unwrap_err(),
        AppError::InsufficientData(999)
    );
}

#[test]
fn empty_corpus_is_insufficient_data() {
    assert_eq!(
        context(Vec::new()).find_counter(HATED).unwrap_err(),
        AppError::InsufficientData(HATED)
    );
}
