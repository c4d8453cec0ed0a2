//! Historical 1v1 match rows and the loader that turns raw lines into them.

use crate::data::catalog::CardId;
use crate::error::AppError;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

pub const DECK_SIZE: usize = 8;

pub type Deck = [CardId; DECK_SIZE];

// Column layout of a raw row (no header):
// extra, extra, player_a, trophies_a, crowns_a, 8 cards, player_b, trophies_b, crowns_b, 8 cards
const COLUMN_COUNT: usize = 24;
const CROWNS_A_COL: usize = 4;
const DECK_A_COL: usize = 5;
const CROWNS_B_COL: usize = 15;
const DECK_B_COL: usize = 16;

const DEFAULT_CHUNK_SIZE: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub deck_a: Deck,
    pub deck_b: Deck,
    pub crowns_a: u32,
    pub crowns_b: u32,
}

impl MatchRecord {
    /// Side A takes the win on equal crowns. This keeps results compatible with the
    /// historical tables; it is a convention, not a game rule.
    pub fn winner(&self) -> Side {
        if self.crowns_b > self.crowns_a {
            Side::B
        } else {
            Side::A
        }
    }

    pub fn deck(&self, side: Side) -> &Deck {
        match side {
            Side::A => &self.deck_a,
            Side::B => &self.deck_b,
        }
    }

    pub fn won(&self, side: Side) -> bool {
        self.winner() == side
    }

    pub fn winning_deck(&self) -> &Deck {
        self.deck(self.winner())
    }

    pub fn holds(&self, side: Side, card: CardId) -> bool {
        self.deck(side).contains(&card)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub kept: usize,
    pub dropped: usize,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.kept + self.dropped
    }
}

/// Parse a single raw row. Rows missing any of the 18 required fields are rejected.
pub fn parse_row(line: &str) -> Option<MatchRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
    if fields.len() < COLUMN_COUNT {
        return None;
    }

    Some(MatchRecord {
        deck_a: parse_deck(&fields[DECK_A_COL..DECK_A_COL + DECK_SIZE])?,
        deck_b: parse_deck(&fields[DECK_B_COL..DECK_B_COL + DECK_SIZE])?,
        crowns_a: parse_count(fields[CROWNS_A_COL])?,
        crowns_b: parse_count(fields[CROWNS_B_COL])?,
    })
}

fn parse_deck(fields: &[&str]) -> Option<Deck> {
    let mut deck = [0; DECK_SIZE];
    for (slot, raw) in deck.iter_mut().zip(fields) {
        *slot = parse_count(raw)?;
    }
    Some(deck)
}

// Accepts "26000000" as well as the float spelling "26000000.0" some exports use.
fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

pub struct CorpusLoader {
    chunk_size: usize,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        CorpusLoader {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CorpusLoader {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        CorpusLoader {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read every row, dropping the malformed ones. `on_progress` receives the running
    /// number of lines consumed after each chunk.
    pub fn read<R: BufRead>(
        &self,
        reader: R,
        mut on_progress: impl FnMut(usize),
    ) -> Result<(Vec<MatchRecord>, LoadReport), AppError> {
        let mut records = Vec::new();
        let mut report = LoadReport::default();
        let mut chunk: Vec<Vec<u8>> = Vec::with_capacity(self.chunk_size);

        for line in reader.split(b'\n') {
            let line = line.map_err(|e| AppError::IoError(format!("Failed to read corpus: {}", e)))?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            chunk.push(line);
            if chunk.len() >= self.chunk_size {
                parse_chunk(&chunk, &mut records, &mut report);
                chunk.clear();
                on_progress(report.total());
            }
        }
        if !chunk.is_empty() {
            parse_chunk(&chunk, &mut records, &mut report);
            on_progress(report.total());
        }

        Ok((records, report))
    }

    /// Open and read a corpus file. A missing file is not an error: it yields `None`.
    pub fn open(
        &self,
        path: &Path,
        on_progress: impl FnMut(usize),
    ) -> Result<Option<(Vec<MatchRecord>, LoadReport)>, AppError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::IoError(format!(
                    "Failed to open corpus {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        self.read(BufReader::new(file), on_progress).map(Some)
    }
}

fn parse_chunk(chunk: &[Vec<u8>], records: &mut Vec<MatchRecord>, report: &mut LoadReport) {
    let parsed: Vec<Option<MatchRecord>> = chunk
        .par_iter()
        .map(|bytes| std::str::from_utf8(bytes).ok().and_then(parse_row))
        .collect();

    for row in parsed {
        match row {
            Some(record) => {
                records.push(record);
                report.kept += 1;
            }
            None => report.dropped += 1,
        }
    }
}
