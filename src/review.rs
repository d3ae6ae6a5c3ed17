use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::{Card, CardState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub new: usize,
    /// Learning and relearning together.
    pub learning: usize,
    pub review: usize,
    pub due: usize,
    pub average_ease: f64,
    pub average_interval: f64,
}

/// Indices of cards due at `now`: new cards first, then by `next_review`.
/// Ties keep collection order.
pub fn due_indices<C: AsRef<Card>>(cards: &[C], now: DateTime<Utc>) -> Vec<usize> {
    let mut due: Vec<usize> = (0..cards.len())
        .filter(|&i| {
            let card: &Card = cards[i].as_ref();
            card.is_due(now)
        })
        .collect();
    due.sort_by_key(|&i| {
        let card: &Card = cards[i].as_ref();
        (card.state != CardState::New, card.next_review)
    });
    due
}

pub fn get_due_cards<C: AsRef<Card>>(cards: &[C], now: DateTime<Utc>) -> Vec<&C> {
    due_indices(cards, now)
        .into_iter()
        .map(|i| &cards[i])
        .collect()
}

pub fn calculate_stats<C: AsRef<Card>>(cards: &[C], now: DateTime<Utc>) -> Stats {
    let mut stats = Stats {
        total: cards.len(),
        ..Stats::default()
    };
    let mut ease_sum = 0.0;
    let mut interval_sum = 0.0;

    for item in cards {
        let card: &Card = item.as_ref();
        match card.state {
            CardState::New => stats.new += 1,
            CardState::Learning | CardState::Relearning => stats.learning += 1,
            CardState::Review => {
                stats.review += 1;
                ease_sum += card.ease;
                interval_sum += card.interval.days();
            }
        }
        if card.is_due(now) {
            stats.due += 1;
        }
    }

    if stats.review > 0 {
        stats.average_ease = ease_sum / stats.review as f64;
        stats.average_interval = interval_sum / stats.review as f64;
    }
    stats
}
