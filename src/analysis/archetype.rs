//! Rule-based deck archetypes.
//!
//! Rules are checked top to bottom and the first match wins, so the order of
//! [`ARCHETYPE_RULES`] is the priority between overlapping conditions.

use crate::data::catalog::{
    Card, CardCatalog, CardId, CardType, BALLOON_ID, GOLEM_ID, HOG_RIDER_ID, LAVA_HOUND_ID,
    X_BOW_ID,
};
use crate::data::corpus::DECK_SIZE;
use crate::error::AppError;
use std::collections::HashSet;
use std::fmt;

// Elixir averages are eighths; this absorbs float noise at the thresholds.
const ELIXIR_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    HogCycle,
    GolemBeatdown,
    LavaLoon,
    XBowCycle,
    LogBait,
    Beatdown,
    Cycle,
    Siege,
    Control,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Archetype::HogCycle => "Hog Cycle",
            Archetype::GolemBeatdown => "Golem Beatdown",
            Archetype::LavaLoon => "LavaLoon",
            Archetype::XBowCycle => "X-Bow Cycle",
            Archetype::LogBait => "Log Bait",
            Archetype::Beatdown => "Beatdown",
            Archetype::Cycle => "Cycle",
            Archetype::Siege => "Siege",
            Archetype::Control => "Control",
        };
        f.write_str(label)
    }
}

/// Deck statistics the rules look at.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckProfile {
    pub card_ids: HashSet<CardId>,
    pub average_elixir: f64,
    pub cheap_cards: usize,
    pub heavy_cards: usize,
    pub spells: usize,
    pub buildings: usize,
}

impl DeckProfile {
    pub fn from_cards(cards: &[&Card]) -> Result<Self, AppError> {
        if cards.len() != DECK_SIZE {
            return Err(AppError::InvalidDeckSize(cards.len()));
        }

        let total_elixir: f64 = cards.iter().map(|c| c.elixir).sum();
        Ok(DeckProfile {
            card_ids: cards.iter().map(|c| c.id).collect(),
            average_elixir: total_elixir / DECK_SIZE as f64,
            cheap_cards: cards.iter().filter(|c| c.elixir <= 2.0).count(),
            heavy_cards: cards.iter().filter(|c| c.elixir >= 5.0).count(),
            spells: cards.iter().filter(|c| c.card_type == CardType::Spell).count(),
            buildings: cards
                .iter()
                .filter(|c| c.card_type == CardType::Building)
                .count(),
        })
    }

    fn has(&self, card: CardId) -> bool {
        self.card_ids.contains(&card)
    }

    fn elixir_at_most(&self, limit: f64) -> bool {
        self.average_elixir <= limit + ELIXIR_TOLERANCE
    }

    fn elixir_at_least(&self, limit: f64) -> bool {
        self.average_elixir >= limit - ELIXIR_TOLERANCE
    }
}

pub struct ArchetypeRule {
    pub archetype: Archetype,
    pub matches: fn(&DeckProfile) -> bool,
}

pub const ARCHETYPE_RULES: [ArchetypeRule; 10] = [
    ArchetypeRule {
        archetype: Archetype::HogCycle,
        matches: is_hog_cycle,
    },
    ArchetypeRule {
        archetype: Archetype::GolemBeatdown,
        matches: is_golem_beatdown,
    },
    ArchetypeRule {
        archetype: Archetype::LavaLoon,
        matches: is_lavaloon,
    },
    ArchetypeRule {
        archetype: Archetype::XBowCycle,
        matches: is_xbow_cycle,
    },
    ArchetypeRule {
        archetype: Archetype::LogBait,
        matches: is_log_bait,
    },
    ArchetypeRule {
        archetype: Archetype::Beatdown,
        matches: is_beatdown,
    },
    ArchetypeRule {
        archetype: Archetype::Cycle,
        matches: is_cycle,
    },
    ArchetypeRule {
        archetype: Archetype::Siege,
        matches: is_siege,
    },
    ArchetypeRule {
        archetype: Archetype::Control,
        matches: is_midrange_control,
    },
    ArchetypeRule {
        archetype: Archetype::Control,
        matches: always,
    },
];

fn is_hog_cycle(p: &DeckProfile) -> bool {
    p.has(HOG_RIDER_ID) && p.elixir_at_most(3.3)
}

fn is_golem_beatdown(p: &DeckProfile) -> bool {
    p.has(GOLEM_ID) && p.elixir_at_least(4.0)
}

fn is_lavaloon(p: &DeckProfile) -> bool {
    p.has(LAVA_HOUND_ID) && p.has(BALLOON_ID)
}

fn is_xbow_cycle(p: &DeckProfile) -> bool {
    p.has(X_BOW_ID) && p.buildings >= 1
}

fn is_log_bait(p: &DeckProfile) -> bool {
    p.cheap_cards >= 3 && p.spells >= 2 && p.elixir_at_most(3.5)
}

fn is_beatdown(p: &DeckProfile) -> bool {
    p.elixir_at_least(3.9) && p.heavy_cards >= 2
}

fn is_cycle(p: &DeckProfile) -> bool {
    p.elixir_at_most(3.4) && p.cheap_cards >= 2
}

fn is_siege(p: &DeckProfile) -> bool {
    p.buildings >= 1 && p.elixir_at_most(3.6)
}

fn is_midrange_control(p: &DeckProfile) -> bool {
    !p.elixir_at_most(3.4) && !p.elixir_at_least(4.0)
}

fn always(_: &DeckProfile) -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub archetype: Archetype,
    pub average_elixir: f64,
}

pub fn classify(cards: &[&Card]) -> Result<Classification, AppError> {
    let profile = DeckProfile::from_cards(cards)?;
    let archetype = ARCHETYPE_RULES
        .iter()
        .find(|rule| (rule.matches)(&profile))
        .map(|rule| rule.archetype)
        .unwrap_or(Archetype::Control);

    Ok(Classification {
        archetype,
        average_elixir: profile.average_elixir,
    })
}

/// Classify a deck given by card ids; every id must be in the catalog.
pub fn classify_ids(catalog: &CardCatalog, deck: &[CardId]) -> Result<Classification, AppError> {
    let cards = deck
        .iter()
        .map(|id| {
            catalog
                .get(*id)
                .ok_or_else(|| AppError::UnknownCard(id.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    classify(&cards)
}
