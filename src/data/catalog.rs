//! Read-only card metadata, loaded once from a `cards_i18n.json` style dump.

use crate::error::AppError;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

pub type CardId = u32;

pub const HOG_RIDER_ID: CardId = 26000021;
pub const GOLEM_ID: CardId = 26000009;
pub const LAVA_HOUND_ID: CardId = 26000029;
pub const BALLOON_ID: CardId = 26000006;
pub const X_BOW_ID: CardId = 27000008;
pub const LITTLE_PRINCE_ID: CardId = 26000093;

/// Card ids the catalog keeps from the raw dump. Anything else in the dump is ignored.
pub const ALLOWED_CARD_IDS: [CardId; 110] = [
    26000048, 26000004, 28000001, 26000021, 26000063, 26000010, 28000011, 26000087, 26000009,
    26000085, 28000009, 26000055, 26000060, 26000000, 28000008, 26000018, 26000051, 27000003,
    26000011, 26000044, 26000036, 28000000, 28000015, 26000061, 26000032, 28000004, 26000057,
    26000058, 26000040, 26000062, 26000001, 26000026, 27000000, 27000006, 26000029, 26000030,
    26000059, 26000049, 26000065, 26000034, 26000056, 26000006, 26000052, 28000010, 26000083,
    26000037, 27000012, 26000045, 26000080, 26000007, 26000041, 26000033, 28000003, 26000014,
    26000012, 26000017, 26000035, 26000064, 26000015, 26000042, 27000007, 28000002, 26000002,
    28000018, 26000020, 27000002, 27000001, 28000007, 27000004, 26000008, 26000013, 26000074,
    26000077, 28000005, 26000027, 28000012, 26000046, 28000006, 26000005, 26000038, 26000024,
    26000019, 26000043, 28000017, 27000013, 27000008, 26000039, 26000067, 26000022, 26000068,
    27000010, 26000023, 27000009, 28000014, 26000016, 26000053, 26000028, 26000084, 26000069,
    26000050, 26000003, 26000072, 26000025, 28000013, 26000054, 26000031, 26000047, 28000016,
    27000005, 26000093,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    Champion,
    Legendary,
    Epic,
    Rare,
    Common,
}

impl Rarity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "champion" => Some(Rarity::Champion),
            "legendary" => Some(Rarity::Legendary),
            "epic" => Some(Rarity::Epic),
            "rare" => Some(Rarity::Rare),
            "common" => Some(Rarity::Common),
            _ => None,
        }
    }

    /// Sort rank used when listing the collection (Champion first).
    pub fn order(self) -> u8 {
        match self {
            Rarity::Champion => 1,
            Rarity::Legendary => 2,
            Rarity::Epic => 3,
            Rarity::Rare => 4,
            Rarity::Common => 5,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rarity::Champion => "Champion",
            Rarity::Legendary => "Legendary",
            Rarity::Epic => "Epic",
            Rarity::Rare => "Rare",
            Rarity::Common => "Common",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CardType {
    Troop,
    Spell,
    Building,
    Other(String),
}

impl CardType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "troop" => CardType::Troop,
            "spell" => CardType::Spell,
            "building" => CardType::Building,
            other => CardType::Other(capitalize(other)),
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardType::Troop => f.write_str("Troop"),
            CardType::Spell => f.write_str("Spell"),
            CardType::Building => f.write_str("Building"),
            CardType::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub key: String,
    pub name: String,
    pub rarity: Rarity,
    pub card_type: CardType,
    pub elixir: f64,
}

// Raw entry of the card dump
#[derive(Debug, Deserialize)]
struct RawCard {
    #[serde(default)]
    key: String,
    name: String,
    id: CardId,
    #[serde(default)]
    rarity: Option<String>,
    #[serde(default, rename = "type")]
    card_type: Option<String>,
    #[serde(default)]
    elixir: Option<f64>,
}

impl RawCard {
    fn into_card(self) -> Card {
        Card {
            id: self.id,
            key: self.key,
            name: self.name,
            rarity: self
                .rarity
                .as_deref()
                .and_then(Rarity::parse)
                .unwrap_or(Rarity::Common),
            card_type: self
                .card_type
                .as_deref()
                .map(CardType::parse)
                .unwrap_or(CardType::Troop),
            elixir: self.elixir.unwrap_or(0.0).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    by_id: HashMap<CardId, Card>,
    by_name: HashMap<String, CardId>,
}

impl CardCatalog {
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut catalog = CardCatalog::default();
        for card in cards {
            catalog.insert(card);
        }
        catalog
    }

    /// Parse the raw dump, keep allow-listed ids and merge in Little Prince.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let cards: Vec<RawCard> = serde_json::from_str(raw)
            .map_err(|e| AppError::JsonError(format!("Failed to parse card catalog: {}", e)))?;

        let allowed: HashSet<CardId> = ALLOWED_CARD_IDS.iter().copied().collect();
        let mut catalog = CardCatalog::from_cards(
            cards
                .into_iter()
                .filter(|c| allowed.contains(&c.id))
                .map(RawCard::into_card),
        );
        catalog.insert(little_prince());

        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read card catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    fn insert(&mut self, card: Card) {
        if let Some(old) = self.by_id.get(&card.id) {
            self.by_name.remove(&old.name.to_lowercase());
        }
        self.by_name.insert(card.name.to_lowercase(), card.id);
        self.by_id.insert(card.id, card);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.by_id.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Card> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .and_then(|id| self.by_id.get(id))
    }

    pub fn name_or_unknown(&self, id: CardId) -> &str {
        self.by_id.get(&id).map(|c| c.name.as_str()).unwrap_or("Unknown")
    }

    /// Resolve user input given either as a card name or as a numeric id.
    pub fn resolve(&self, input: &str) -> Result<&Card, AppError> {
        if let Some(card) = self.by_name(input) {
            return Ok(card);
        }
        input
            .trim()
            .parse::<CardId>()
            .ok()
            .and_then(|id| self.get(id))
            .ok_or_else(|| AppError::UnknownCard(input.to_string()))
    }

    pub fn resolve_deck<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<&Card>, AppError> {
        inputs.iter().map(|s| self.resolve(s.as_ref())).collect()
    }

    /// Cards whose name contains `query`, ordered by rarity then name.
    pub fn search(&self, query: &str) -> Vec<&Card> {
        let needle = query.trim().to_lowercase();
        let mut cards: Vec<&Card> = self
            .by_id
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect();
        cards.sort_by(|a, b| {
            a.rarity
                .order()
                .cmp(&b.rarity.order())
                .then_with(|| a.name.cmp(&b.name))
        });
        cards
    }
}

fn little_prince() -> Card {
    Card {
        id: LITTLE_PRINCE_ID,
        key: "little-prince".to_string(),
        name: "Little Prince".to_string(),
        rarity: Rarity::Champion,
        card_type: CardType::Troop,
        elixir: 3.0,
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
