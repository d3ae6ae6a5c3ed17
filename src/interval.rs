//! Review intervals, carried as fractional days (one minute is `1/1440`).

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::fsrs::{self, Rating};
use crate::params::Parameters;

const MINUTES_PER_DAY: f64 = 1440.0;
const HOURS_PER_DAY: f64 = 24.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub const MIN_REVIEW_DAYS: f64 = 1.0;
pub const MAX_REVIEW_DAYS: f64 = 365.0;
const HARD_FACTOR: f64 = 0.8;
const EASY_FACTOR: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interval(f64);

impl Interval {
    pub const ZERO: Interval = Interval(0.0);

    pub fn from_days(days: f64) -> Self {
        Interval(days)
    }

    pub fn from_minutes(minutes: f64) -> Self {
        Interval(minutes / MINUTES_PER_DAY)
    }

    pub fn days(self) -> f64 {
        self.0
    }

    pub fn minutes(self) -> f64 {
        self.0 * MINUTES_PER_DAY
    }

    pub fn to_duration(self) -> Duration {
        Duration::seconds((self.0 * SECONDS_PER_DAY).round() as i64)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format_interval(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledInterval {
    pub days: f64,
    pub label: String,
}

impl From<Interval> for LabelledInterval {
    fn from(interval: Interval) -> Self {
        Self {
            days: interval.days(),
            label: format_interval(interval.days()),
        }
    }
}

/// Fixed step for a card still in its first learning phase.
pub fn learning_step(rating: Rating) -> Interval {
    match rating {
        Rating::Again => Interval::from_minutes(1.0),
        Rating::Hard => Interval::from_minutes(10.0),
        Rating::Good | Rating::Easy => Interval::from_days(1.0),
    }
}

pub fn relearning_step(rating: Rating) -> Interval {
    match rating {
        Rating::Again | Rating::Hard => Interval::from_minutes(10.0),
        Rating::Good | Rating::Easy => Interval::from_days(1.0),
    }
}

/// Review interval from stability, adjusted by rating and clamped to `[1, 365]` days.
pub fn review_interval(p: &Parameters, stability: f64, rating: Rating) -> Interval {
    let base = fsrs::interval(p, stability).round();
    let adjusted = match rating {
        Rating::Hard => f64::max((base * HARD_FACTOR).round(), 1.0),
        Rating::Easy => (base * EASY_FACTOR).round(),
        Rating::Again | Rating::Good => base,
    };
    Interval::from_days(adjusted.clamp(MIN_REVIEW_DAYS, MAX_REVIEW_DAYS))
}

/// Short display label for a day count: `<1m`, `5m`, `3h`, `12d`, `4mo`, `>1y`.
/// Counts are truncated so a label never reaches the next unit.
pub fn format_interval(days: f64) -> String {
    if days < 1.0 / MINUTES_PER_DAY {
        "<1m".to_string()
    } else if days < 1.0 / HOURS_PER_DAY {
        format!("{}m", whole(days * MINUTES_PER_DAY, 59.0))
    } else if days < 1.0 {
        format!("{}h", whole(days * HOURS_PER_DAY, 23.0))
    } else if days < 30.0 {
        format!("{}d", whole(days, 29.0))
    } else if days < 365.0 {
        format!("{}mo", whole(days / 30.0, 12.0))
    } else {
        ">1y".to_string()
    }
}

// Tolerates unit conversions like 10/1440*1440 landing just under 10.
fn whole(count: f64, max: f64) -> f64 {
    (count + 1e-9).floor().min(max)
}
