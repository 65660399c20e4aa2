//! News items and their market effects.

use serde::{Deserialize, Serialize};
use types::Timestamp;

/// How a news item perturbs the price model. Effects are plain data
/// interpreted by the room against its price generator when the item is
/// published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum MarketEffect {
    /// Transient additive drift on the guide price. `intensity` is a
    /// fractional per-tick drift.
    GuideShock { intensity: f64, duration_ticks: u32 },
    /// Fundamental repricing by the given fraction.
    IntrinsicShock { pct: f64 },
    /// Flavor only.
    #[default]
    Neutral,
}

/// A published news event.
///
/// Fire-and-forget: the factory advances `ticks_elapsed` once per clock
/// tick and retires the item into its archive once the duration runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub duration_ticks: u32,
    pub ticks_elapsed: u32,
    /// Effect applied when the item was published.
    pub effect: MarketEffect,
    /// Publication wall-clock time (ms).
    pub published_at: Timestamp,
}

impl NewsItem {
    /// Advance one clock tick; returns true once exhausted.
    pub fn advance(&mut self) -> bool {
        if !self.is_exhausted() {
            self.ticks_elapsed += 1;
        }
        self.is_exhausted()
    }

    /// Whether the item has run its course.
    pub fn is_exhausted(&self) -> bool {
        self.ticks_elapsed >= self.duration_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_item_is_born_exhausted() {
        let item = NewsItem {
            id: 1,
            title: "t".into(),
            description: "d".into(),
            duration_ticks: 0,
            ticks_elapsed: 0,
            effect: MarketEffect::Neutral,
            published_at: 0,
        };
        assert!(item.is_exhausted());
    }

    #[test]
    fn advance_counts_up_to_duration() {
        let mut item = NewsItem {
            id: 1,
            title: "t".into(),
            description: "d".into(),
            duration_ticks: 3,
            ticks_elapsed: 0,
            effect: MarketEffect::Neutral,
            published_at: 0,
        };
        assert!(!item.advance());
        assert!(!item.advance());
        assert!(item.advance());
        // Further advances stay exhausted without overcounting.
        assert!(item.advance());
        assert_eq!(item.ticks_elapsed, 3);
    }
}
