//! The frozen, load-once state every query reads from.

use crate::analysis::archetype::{self, Classification};
use crate::analysis::counter::{CounterMiner, CounterResult};
use crate::analysis::oracle::{BestMatch, OracleRanker, Scorer};
use crate::analysis::win_rates::{Aggregates, CardRecord};
use crate::data::card_index::CardIndex;
use crate::data::catalog::{CardCatalog, CardId};
use crate::data::corpus::{Deck, LoadReport, MatchRecord};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug)]
pub struct CorpusData {
    pub records: Vec<MatchRecord>,
    pub report: LoadReport,
    pub aggregates: Aggregates,
    pub built_at: DateTime<Utc>,
}

impl CorpusData {
    pub fn build(records: Vec<MatchRecord>, report: LoadReport) -> Self {
        let aggregates = Aggregates::build(&records);
        CorpusData {
            records,
            report,
            aggregates,
            built_at: Utc::now(),
        }
    }
}

struct OracleModel {
    scorer: Arc<dyn Scorer>,
    card_index: CardIndex,
}

/// Built once at startup and only read afterwards, so it can be shared freely
/// between threads behind an `Arc`.
pub struct AnalysisContext {
    catalog: CardCatalog,
    corpus: Option<Arc<CorpusData>>,
    oracle: Option<OracleModel>,
}

impl AnalysisContext {
    pub fn new(catalog: CardCatalog) -> Self {
        AnalysisContext {
            catalog,
            corpus: None,
            oracle: None,
        }
    }

    pub fn with_corpus(mut self, corpus: Arc<CorpusData>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    pub fn with_oracle(mut self, scorer: Arc<dyn Scorer>, card_index: CardIndex) -> Self {
        self.oracle = Some(OracleModel { scorer, card_index });
        self
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn corpus(&self) -> Result<&CorpusData, AppError> {
        self.corpus.as_deref().ok_or_else(|| {
            AppError::DataUnavailable("the match corpus was not loaded".to_string())
        })
    }

    /// Opponent cards the loaded model has no vocabulary entry for.
    pub fn unmapped_cards(&self, deck: &Deck) -> Vec<CardId> {
        self.oracle
            .as_ref()
            .map(|oracle| oracle.card_index.unmapped(deck))
            .unwrap_or_default()
    }

    pub fn card_win_rate(&self, card: CardId) -> Result<CardRecord, AppError> {
        Ok(self.corpus()?.aggregates.win_rates.stats(card))
    }

    pub fn find_counter(&self, hated: CardId) -> Result<CounterResult, AppError> {
        let corpus = self.corpus()?;
        CounterMiner::new(&corpus.records, &corpus.aggregates).find_counter(hated)
    }

    pub fn rank_oracle(&self, opponent: &Deck) -> Result<BestMatch, AppError> {
        let oracle = self.oracle.as_ref().ok_or_else(|| {
            AppError::ModelUnavailable("no oracle model or card mapping loaded".to_string())
        })?;
        let corpus = self.corpus.as_deref().ok_or_else(|| {
            AppError::MetaPoolUnavailable("the match corpus was not loaded".to_string())
        })?;

        OracleRanker::new(
            oracle.scorer.as_ref(),
            &oracle.card_index,
            corpus.aggregates.meta_pool.oracle_pool(),
        )
        .rank(opponent)
    }

    pub fn classify(&self, deck: &[CardId]) -> Result<Classification, AppError> {
        archetype::classify_ids(&self.catalog, deck)
    }

    /// Card names for a deck, `"Unknown"` for ids outside the catalog.
    pub fn deck_names(&self, deck: &[CardId]) -> Vec<String> {
        deck.iter()
            .map(|id| self.catalog.name_or_unknown(*id).to_string())
            .collect()
    }
}
