use crate::data::catalog::CardId;
use crate::data::corpus::{Deck, MatchRecord, Side};
use std::collections::HashMap;

/// Keeps the win rate of a never-seen card at 0 instead of NaN.
pub const WIN_RATE_EPSILON: f64 = 1e-9;

/// Decks kept for counter mining.
pub const META_POOL_SIZE: usize = 5000;

/// Prefix of the meta pool scored by the oracle.
pub const ORACLE_POOL_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardRecord {
    pub matches: u64,
    pub wins: u64,
}

impl CardRecord {
    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / (self.matches as f64 + WIN_RATE_EPSILON)
    }
}

pub struct WinRateTracker {
    stats: HashMap<CardId, CardRecord>,
}

impl WinRateTracker {
    pub fn new() -> Self {
        WinRateTracker {
            stats: HashMap::new(),
        }
    }

    pub fn add_card_encounter(&mut self, card: CardId, won: bool) {
        let entry = self.stats.entry(card).or_default();
        entry.matches += 1;
        if won {
            entry.wins += 1;
        }
    }

    /// Each side counts on its own, so a card in both decks records one win and one loss.
    pub fn add_match(&mut self, record: &MatchRecord) {
        for side in [Side::A, Side::B] {
            let won = record.won(side);
            for card in distinct_cards(record.deck(side)) {
                self.add_card_encounter(card, won);
            }
        }
    }

    pub fn finish(self) -> GlobalWinRates {
        GlobalWinRates { stats: self.stats }
    }
}

impl Default for WinRateTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn distinct_cards(deck: &Deck) -> impl Iterator<Item = CardId> + '_ {
    deck.iter()
        .enumerate()
        .filter(|(i, card)| !deck[..*i].contains(card))
        .map(|(_, card)| *card)
}

#[derive(Debug, Clone, Default)]
pub struct GlobalWinRates {
    stats: HashMap<CardId, CardRecord>,
}

impl GlobalWinRates {
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn get(&self, card: CardId) -> Option<f64> {
        self.stats.get(&card).map(CardRecord::win_rate)
    }

    pub fn rate_or(&self, card: CardId, default: f64) -> f64 {
        self.get(card).unwrap_or(default)
    }

    /// Counts for `card`; zero for a card the corpus never saw.
    pub fn stats(&self, card: CardId) -> CardRecord {
        self.stats.get(&card).copied().unwrap_or_default()
    }

    /// Best cards by win rate, ties by id.
    pub fn top(&self, n: usize, min_matches: u64) -> Vec<(CardId, CardRecord)> {
        let mut rows: Vec<(CardId, CardRecord)> = self
            .stats
            .iter()
            .filter(|(_, r)| r.matches >= min_matches)
            .map(|(card, r)| (*card, *r))
            .collect();
        rows.sort_by(|a, b| {
            b.1.win_rate()
                .partial_cmp(&a.1.win_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        rows.truncate(n);
        rows
    }
}

/// A deck with its slots sorted, so slot order never splits a deck's count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalDeck(Deck);

impl CanonicalDeck {
    pub fn new(deck: &Deck) -> Self {
        let mut cards = *deck;
        cards.sort_unstable();
        CanonicalDeck(cards)
    }

    pub fn cards(&self) -> &Deck {
        &self.0
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.0.contains(&card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub deck: CanonicalDeck,
    pub wins: u64,
}

/// Winning decks ranked by how often they won. Equal counts fall back to the
/// canonical card order; that tie-break is arbitrary but kept stable.
#[derive(Debug, Clone, Default)]
pub struct MetaPool {
    entries: Vec<MetaEntry>,
}

impl MetaPool {
    pub fn from_counts(counts: HashMap<CanonicalDeck, u64>, limit: usize) -> Self {
        let mut entries: Vec<MetaEntry> = counts
            .into_iter()
            .map(|(deck, wins)| MetaEntry { deck, wins })
            .collect();
        entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.deck.cmp(&b.deck)));
        entries.truncate(limit);
        MetaPool { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MetaEntry] {
        &self.entries
    }

    /// Up to `META_POOL_SIZE` decks, used by the counter miner.
    pub fn counter_pool(&self) -> &[MetaEntry] {
        &self.entries
    }

    /// The first `ORACLE_POOL_SIZE` decks of the counter pool.
    pub fn oracle_pool(&self) -> &[MetaEntry] {
        &self.entries[..self.entries.len().min(ORACLE_POOL_SIZE)]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub win_rates: GlobalWinRates,
    pub meta_pool: MetaPool,
}

impl Aggregates {
    /// Single pass over the corpus producing the win-rate table and the meta pool.
    pub fn build(records: &[MatchRecord]) -> Self {
        let mut tracker = WinRateTracker::new();
        let mut deck_counts: HashMap<CanonicalDeck, u64> = HashMap::new();

        for record in records {
            tracker.add_match(record);
            *deck_counts
                .entry(CanonicalDeck::new(record.winning_deck()))
                .or_insert(0) += 1;
        }

        Aggregates {
            win_rates: tracker.finish(),
            meta_pool: MetaPool::from_counts(deck_counts, META_POOL_SIZE),
        }
    }
}
