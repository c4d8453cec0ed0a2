use crate::analysis::win_rates::{Aggregates, CanonicalDeck, CardRecord};
use crate::data::catalog::CardId;
use crate::data::corpus::{MatchRecord, Side};
use crate::error::AppError;
use std::collections::HashMap;

/// Candidates seen fewer times than this against the hated card are ignored.
pub const MIN_COUNTER_MATCHES: u64 = 500;

/// Baseline assumed for a candidate with no global win rate.
pub const NEUTRAL_WIN_RATE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct CounterResult {
    pub hated: CardId,
    pub counter: CardId,
    pub matchup: CardRecord,
    pub matchup_win_rate: f64,
    pub global_win_rate: f64,
    pub delta: f64,
    pub deck: CanonicalDeck,
    /// Position of `deck` in the meta pool (0 = most frequent winner).
    pub deck_rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterCandidate {
    pub card: CardId,
    pub matchup: CardRecord,
    pub matchup_win_rate: f64,
    pub global_win_rate: f64,
    pub delta: f64,
}

/// Per-card tallies from the A side of games against the hated card, in first-seen order.
struct MatchupTally {
    order: Vec<CardId>,
    stats: HashMap<CardId, CardRecord>,
    games: usize,
}

impl MatchupTally {
    fn collect(records: &[MatchRecord], hated: CardId) -> Self {
        let mut order = Vec::new();
        let mut stats: HashMap<CardId, CardRecord> = HashMap::new();
        let mut games = 0;

        // Only games where B brought the hated card and A did not; A's deck is tallied.
        for record in records {
            if !record.holds(Side::B, hated) || record.holds(Side::A, hated) {
                continue;
            }
            games += 1;
            let won = record.won(Side::A);
            for &card in record.deck(Side::A) {
                let entry = stats.entry(card).or_insert_with(|| {
                    order.push(card);
                    CardRecord::default()
                });
                entry.matches += 1;
                if won {
                    entry.wins += 1;
                }
            }
        }

        MatchupTally {
            order,
            stats,
            games,
        }
    }
}

pub struct CounterMiner<'a> {
    records: &'a [MatchRecord],
    aggregates: &'a Aggregates,
    min_matches: u64,
}

impl<'a> CounterMiner<'a> {
    pub fn new(records: &'a [MatchRecord], aggregates: &'a Aggregates) -> Self {
        CounterMiner {
            records,
            aggregates,
            min_matches: MIN_COUNTER_MATCHES,
        }
    }

    pub fn with_min_matches(mut self, min_matches: u64) -> Self {
        self.min_matches = min_matches.max(1);
        self
    }

    /// Every significant candidate against `hated`, in first-seen order.
    pub fn candidates(&self, hated: CardId) -> Result<Vec<CounterCandidate>, AppError> {
        let tally = MatchupTally::collect(self.records, hated);
        if tally.games == 0 {
            return Err(AppError::InsufficientData(hated));
        }

        let rates = &self.aggregates.win_rates;
        Ok(tally
            .order
            .iter()
            .filter_map(|card| {
                let matchup = tally.stats[card];
                if matchup.matches < self.min_matches {
                    return None;
                }
                let matchup_win_rate = matchup.wins as f64 / matchup.matches as f64;
                let global_win_rate = rates.rate_or(*card, NEUTRAL_WIN_RATE);
                Some(CounterCandidate {
                    card: *card,
                    matchup,
                    matchup_win_rate,
                    global_win_rate,
                    delta: matchup_win_rate - global_win_rate,
                })
            })
            .collect())
    }

    /// Pick the card whose win rate rises most above its own baseline when facing
    /// `hated`, then the highest ranked meta deck that plays it.
    pub fn find_counter(&self, hated: CardId) -> Result<CounterResult, AppError> {
        let mut best: Option<CounterCandidate> = None;
        for candidate in self.candidates(hated)? {
            if best.map_or(true, |b| candidate.delta > b.delta) {
                best = Some(candidate);
            }
        }
        let best = best.ok_or(AppError::InsufficientSignificantData {
            min_matches: self.min_matches,
        })?;

        let (deck_rank, entry) = self
            .aggregates
            .meta_pool
            .counter_pool()
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.deck.contains(best.card))
            .ok_or_else(|| AppError::NoViableDeck(best.card.to_string()))?;

        Ok(CounterResult {
            hated,
            counter: best.card,
            matchup: best.matchup,
            matchup_win_rate: best.matchup_win_rate,
            global_win_rate: best.global_win_rate,
            delta: best.delta,
            deck: entry.deck,
            deck_rank,
        })
    }
}
