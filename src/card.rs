use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub fn as_str(self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CardState {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            _ => Err(EngineError::InvalidState(s.to_string())),
        }
    }
}

/// Memory state of one card. The scheduler reads it and returns a replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub state: CardState,
    pub stability: f64,
    pub difficulty: f64,
    pub interval: Interval,
    /// Display only, derived from difficulty.
    pub ease: f64,
    pub reps: u32,
    pub lapses: u32,
    pub last_review: Option<DateTime<Utc>>,
    pub next_review: DateTime<Utc>,
}

impl Card {
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            state: CardState::New,
            stability: 0.0,
            difficulty: 0.0,
            interval: Interval::ZERO,
            ease: crate::scheduler::DEFAULT_EASE,
            reps: 0,
            lapses: 0,
            last_review: None,
            next_review: created,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,
    pub card: Card,
}

impl AsRef<Card> for Card {
    fn as_ref(&self) -> &Card {
        self
    }
}

impl AsRef<Card> for CardRecord {
    fn as_ref(&self) -> &Card {
        &self.card
    }
}

const CSV_HEADER: [&str; 10] = [
    "id",
    "state",
    "stability",
    "difficulty",
    "interval",
    "ease",
    "reps",
    "lapses",
    "last_review",
    "next_review",
];

fn parse_f64(field: &str, name: &str) -> Result<f64> {
    let s = field.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse()
        .map_err(|_| EngineError::InvalidCard(format!("{name} is not a number: {s:?}")))
}

fn parse_u32(field: &str, name: &str) -> Result<u32> {
    let s = field.trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse()
        .map_err(|_| EngineError::InvalidCard(format!("{name} is not a count: {s:?}")))
}

fn parse_optional_timestamp(s: &str) -> Result<Option<DateTime<Utc>>> {
    let s = s.trim();
    if s.is_empty() {
        Ok(None)
    } else {
        DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| EngineError::InvalidTimestamp(s.to_string()))
    }
}

fn get_field(record: &csv::StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Reads a CSV snapshot. Rows without an id get a fresh one; a missing
/// `next_review` means due at `now`.
pub fn load_csv(path: &Path, now: DateTime<Utc>) -> Result<Vec<CardRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let mut cards = Vec::new();
    for result in reader.records() {
        let record = result?;

        let id_raw = get_field(&record, 0).trim();
        let id = if id_raw.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            id_raw.to_string()
        };

        let state_raw = get_field(&record, 1);
        let state = if state_raw.trim().is_empty() {
            CardState::New
        } else {
            state_raw.parse()?
        };

        let card = Card {
            state,
            stability: parse_f64(get_field(&record, 2), "stability")?,
            difficulty: parse_f64(get_field(&record, 3), "difficulty")?,
            interval: Interval::from_days(parse_f64(get_field(&record, 4), "interval")?),
            ease: match parse_f64(get_field(&record, 5), "ease")? {
                e if e == 0.0 => crate::scheduler::DEFAULT_EASE,
                e => e,
            },
            reps: parse_u32(get_field(&record, 6), "reps")?,
            lapses: parse_u32(get_field(&record, 7), "lapses")?,
            last_review: parse_optional_timestamp(get_field(&record, 8))?,
            next_review: parse_optional_timestamp(get_field(&record, 9))?.unwrap_or(now),
        };
        cards.push(CardRecord { id, card });
    }
    tracing::debug!(path = %path.display(), count = cards.len(), "loaded CSV snapshot");
    Ok(cards)
}

pub fn save_csv(path: &Path, cards: &[CardRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;

    for CardRecord { id, card } in cards {
        writer.write_record([
            id.clone(),
            card.state.to_string(),
            card.stability.to_string(),
            card.difficulty.to_string(),
            card.interval.days().to_string(),
            card.ease.to_string(),
            card.reps.to_string(),
            card.lapses.to_string(),
            card.last_review.map_or(String::new(), |t| t.to_rfc3339()),
            card.next_review.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Vec<CardRecord>> {
    let raw = std::fs::read_to_string(path)?;
    let cards: Vec<CardRecord> = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), count = cards.len(), "loaded JSON snapshot");
    Ok(cards)
}

pub fn save_json(path: &Path, cards: &[CardRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(cards)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("csv")
}

pub fn load_snapshot(path: &Path, now: DateTime<Utc>) -> Result<Vec<CardRecord>> {
    if is_csv(path) {
        load_csv(path, now)
    } else {
        load_json(path)
    }
}

pub fn save_snapshot(path: &Path, cards: &[CardRecord]) -> Result<()> {
    if is_csv(path) {
        save_csv(path, cards)
    } else {
        save_json(path, cards)
    }
}
