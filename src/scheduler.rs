use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::card::{Card, CardState};
use crate::error::{EngineError, Result};
use crate::fsrs::{self, MAX_DIFFICULTY, MIN_DIFFICULTY, Rating};
use crate::interval::{self, Interval, LabelledInterval};
use crate::params::Parameters;

pub const DEFAULT_EASE: f64 = 2.5;
const MIN_EASE: f64 = 1.3;
const EASE_PER_DIFFICULTY: f64 = 0.15;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Display ease derived from difficulty. Scheduling never reads it back.
pub fn ease(difficulty: f64) -> f64 {
    f64::max(MIN_EASE, DEFAULT_EASE - (difficulty - 1.0) * EASE_PER_DIFFICULTY)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub state: CardState,
    pub interval: Interval,
    pub ease: f64,
    pub stability: f64,
    pub difficulty: f64,
    pub next_review: DateTime<Utc>,
    pub reps: u32,
    pub lapses: u32,
    pub last_review: DateTime<Utc>,
}

impl ScheduleResult {
    pub fn into_card(self) -> Card {
        Card {
            state: self.state,
            stability: self.stability,
            difficulty: self.difficulty,
            interval: self.interval,
            ease: self.ease,
            reps: self.reps,
            lapses: self.lapses,
            last_review: Some(self.last_review),
            next_review: self.next_review,
        }
    }
}

/// Would-be intervals for each rating, nothing committed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub again: Interval,
    pub hard: Interval,
    pub good: Interval,
    pub easy: Interval,
}

impl Preview {
    pub fn get(&self, rating: Rating) -> Interval {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

// Preview with display labels, as printed by the CLI and returned over HTTP
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewReport {
    pub again: LabelledInterval,
    pub hard: LabelledInterval,
    pub good: LabelledInterval,
    pub easy: LabelledInterval,
}

impl From<Preview> for PreviewReport {
    fn from(p: Preview) -> Self {
        Self {
            again: p.again.into(),
            hard: p.hard.into(),
            good: p.good.into(),
            easy: p.easy.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    params: Parameters,
}

impl Scheduler {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Advances `card` by one review rated `rating` at `now`.
    ///
    /// On error the caller keeps the card's prior state.
    pub fn schedule_card(
        &self,
        card: &Card,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ScheduleResult> {
        validate(card)?;
        let p = &self.params;

        let mut state = card.state;
        let mut reps = card.reps;
        let mut lapses = card.lapses;
        let stability;
        let difficulty;
        let interval;

        match card.state {
            CardState::New => {
                stability = fsrs::s_0(p, rating);
                difficulty = fsrs::d_0(p, rating);
                reps = 0;
                match rating {
                    Rating::Again => {
                        state = CardState::Learning;
                        lapses += 1;
                    }
                    Rating::Hard => state = CardState::Learning,
                    Rating::Good | Rating::Easy => {
                        state = CardState::Review;
                        reps = 1;
                    }
                }
                interval = interval::learning_step(rating);
            }
            CardState::Learning | CardState::Relearning => {
                let (s, d) = self.memory(card);
                difficulty = d;
                match rating {
                    Rating::Again => {
                        stability = fsrs::s_0(p, Rating::Again);
                        if card.state == CardState::Learning {
                            lapses += 1;
                        }
                    }
                    Rating::Hard => stability = fsrs::s_short_term(p, s, rating),
                    Rating::Good | Rating::Easy => {
                        stability = fsrs::s_short_term(p, s, rating);
                        state = CardState::Review;
                        reps += 1;
                    }
                }
                interval = if card.state == CardState::Learning {
                    interval::learning_step(rating)
                } else {
                    interval::relearning_step(rating)
                };
            }
            CardState::Review => {
                let (s, d) = self.memory(card);
                let r = fsrs::retrievability(p, elapsed_days(card, now), s);
                stability = fsrs::stability(p, d, s, r, rating);
                difficulty = fsrs::difficulty(p, d, rating);
                if rating == Rating::Again {
                    state = CardState::Relearning;
                    lapses += 1;
                    reps = 0;
                    interval = interval::relearning_step(rating);
                } else {
                    reps += 1;
                    interval = interval::review_interval(p, stability, rating);
                }
            }
        }

        debug!(
            from = %card.state,
            to = %state,
            rating = rating.value(),
            stability,
            difficulty,
            interval_days = interval.days(),
            "scheduled card"
        );

        Ok(ScheduleResult {
            state,
            interval,
            ease: ease(difficulty),
            stability,
            difficulty,
            next_review: now + interval.to_duration(),
            reps,
            lapses,
            last_review: now,
        })
    }

    pub fn preview_schedule(&self, card: &Card, now: DateTime<Utc>) -> Result<Preview> {
        let at = |rating| {
            self.schedule_card(card, rating, now)
                .map(|result| result.interval)
        };
        Ok(Preview {
            again: at(Rating::Again)?,
            hard: at(Rating::Hard)?,
            good: at(Rating::Good)?,
            easy: at(Rating::Easy)?,
        })
    }

    pub fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> f64 {
        if card.state == CardState::New || card.stability <= 0.0 {
            return 1.0;
        }
        fsrs::retrievability(&self.params, elapsed_days(card, now), card.stability)
    }

    // Exactly-zero values are legacy "unset" markers
    fn memory(&self, card: &Card) -> (f64, f64) {
        let mut s = card.stability;
        let mut d = card.difficulty;
        if s == 0.0 || d == 0.0 {
            warn!(
                state = %card.state,
                stability = s,
                difficulty = d,
                "unset memory state on reviewed card, using defaults"
            );
        }
        if s == 0.0 {
            s = fsrs::s_0(&self.params, Rating::Good);
        }
        if d == 0.0 {
            d = fsrs::d_0(&self.params, Rating::Good);
        }
        (s, d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY))
    }
}

fn elapsed_days(card: &Card, now: DateTime<Utc>) -> f64 {
    card.last_review
        .map(|last| (now - last).num_seconds() as f64 / SECONDS_PER_DAY)
        .unwrap_or(0.0)
        .max(0.0)
}

fn validate(card: &Card) -> Result<()> {
    if !card.stability.is_finite() || card.stability < 0.0 {
        return Err(EngineError::InvalidCard(format!(
            "stability must be a non-negative number, got {}",
            card.stability
        )));
    }
    if !card.difficulty.is_finite() {
        return Err(EngineError::InvalidCard(format!(
            "difficulty must be a number, got {}",
            card.difficulty
        )));
    }
    if !card.interval.days().is_finite() {
        return Err(EngineError::InvalidCard(format!(
            "interval must be a number, got {}",
            card.interval.days()
        )));
    }
    Ok(())
}
