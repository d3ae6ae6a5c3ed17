//! Spaced-repetition scheduling engine.
//!
//! Given a card's memory state and a rating, [`Scheduler::schedule_card`]
//! computes the replacement state and the next review time. The due-set
//! selector and statistics aggregator in [`review`] work over caller-owned
//! snapshots. Nothing here performs storage or keeps mutable state.

pub mod card;
pub mod error;
pub mod fsrs;
pub mod interval;
pub mod params;
pub mod review;
pub mod scheduler;
pub mod web;

pub use card::{Card, CardRecord, CardState};
pub use error::{EngineError, Result};
pub use fsrs::Rating;
pub use interval::{Interval, LabelledInterval, format_interval};
pub use params::Parameters;
pub use review::{Stats, calculate_stats, get_due_cards};
pub use scheduler::{Preview, PreviewReport, ScheduleResult, Scheduler};
