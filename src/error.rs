use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Match data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Not enough data for card {0}")]
    InsufficientData(u32),

    #[error("Not enough significant matchups found (need {min_matches}+ games per candidate)")]
    InsufficientSignificantData { min_matches: u64 },

    #[error("No viable meta deck contains the counter card {0}")]
    NoViableDeck(String),

    #[error("Oracle model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Meta pool not built: {0}")]
    MetaPoolUnavailable(String),

    #[error("Oracle model shape mismatch: {0}")]
    ModelShapeMismatch(String),

    #[error("A deck needs exactly 8 cards, got {0}")]
    InvalidDeckSize(usize),

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}
