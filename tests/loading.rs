use std::path::PathBuf;
use std::sync::Arc;

use crown_oracle::analysis::win_rates::{CanonicalDeck, CardRecord};
use crown_oracle::context::{AnalysisContext, CorpusData};
use crown_oracle::data::catalog::{CardCatalog, GOLEM_ID, HOG_RIDER_ID, LITTLE_PRINCE_ID};
use crown_oracle::data::corpus::{CorpusLoader, LoadReport};
use crown_oracle::error::AppError;

const KNIGHT_ID: u32 = 26000000;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixture_catalog() -> CardCatalog {
    CardCatalog::load(&fixture_path("cards.json")).expect("fixture catalog should load")
}

fn fixture_context() -> AnalysisContext {
    let (records, report) = CorpusLoader::default()
        .open(&fixture_path("battles.csv"), |_| {})
        .expect("fixture corpus should read")
        .expect("fixture corpus should exist");
    AnalysisContext::new(fixture_catalog()).with_corpus(Arc::new(CorpusData::build(records, report)))
}

#[test]
fn catalog_fixture_respects_allow_list() {
    let catalog = fixture_catalog();
    assert_eq!(catalog.len(), 34);
    assert!(catalog.by_name("Super Secret").is_none());
    assert_eq!(catalog.get(LITTLE_PRINCE_ID).unwrap().name, "Little Prince");
}

#[test]
fn malformed_rows_are_dropped() {
    let context = fixture_context();
    let corpus = context.corpus().unwrap();
    assert_eq!(corpus.report, LoadReport { kept: 4, dropped: 2 });
}

#[test]
fn global_win_rates_from_fixture() {
    let context = fixture_context();

    assert_eq!(
        context.card_win_rate(HOG_RIDER_ID).unwrap(),
        CardRecord { matches: 4, wins: 3 }
    );
    assert_eq!(
        context.card_win_rate(GOLEM_ID).unwrap(),
        CardRecord { matches: 2, wins: 1 }
    );
    assert_eq!(
        context.card_win_rate(KNIGHT_ID).unwrap(),
        CardRecord { matches: 4, wins: 1 }
    );

    let never_played = context.card_win_rate(LITTLE_PRINCE_ID).unwrap();
    assert_eq!(never_played.matches, 0);
    assert_eq!(never_played.win_rate(), 0.0);
}

#[test]
fn meta_pool_from_fixture() {
    let context = fixture_context();
    let pool = context.corpus().unwrap().aggregates.meta_pool.entries();

    assert_eq!(pool.len(), 2);
    assert!(pool[0].deck.contains(HOG_RIDER_ID));
    assert_eq!(pool[0].wins, 3);
    assert!(pool[1].deck.contains(GOLEM_ID));
    assert_eq!(pool[1].wins, 1);
    assert_eq!(pool[0].deck, CanonicalDeck::new(pool[0].deck.cards()));
}

#[test]
fn missing_corpus_reports_data_unavailable() {
    let loaded = CorpusLoader::default()
        .open(&fixture_path("does_not_exist.csv"), |_| {})
        .unwrap();
    assert!(loaded.is_none());

    let context = AnalysisContext::new(fixture_catalog());
    assert!(matches!(
        context.card_win_rate(HOG_RIDER_ID),
        Err(AppError::DataUnavailable(_))
    ));
    assert!(matches!(
        context.find_counter(HOG_RIDER_ID),
        Err(AppError::DataUnavailable(_))
    ));
}

#[test]
fn deck_names_fall_back_to_unknown() {
    let context = fixture_context();
    assert_eq!(
        context.deck_names(&[HOG_RIDER_ID, 1]),
        vec!["Hog Rider".to_string(), "Unknown".to_string()]
    );
}
