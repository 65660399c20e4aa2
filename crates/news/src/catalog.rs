//! The fixed news catalogue.
//!
//! Descriptors are templates: magnitudes are ranges sampled by the factory
//! when an event fires, so the same headline can land soft or hard.

use crate::item::MarketEffect;

/// Effect template with a magnitude range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectTemplate {
    /// Per-tick guide drift drawn from `[min, max]`.
    GuideShock { min: f64, max: f64, duration_ticks: u32 },
    /// Fundamental repricing drawn from `[min, max]`.
    IntrinsicShock { min: f64, max: f64 },
    Neutral,
}

impl EffectTemplate {
    /// Instantiate with a uniform draw `u ∈ [0, 1)`.
    pub fn sample(self, u: f64) -> MarketEffect {
        match self {
            EffectTemplate::GuideShock { min, max, duration_ticks } => MarketEffect::GuideShock {
                intensity: min + (max - min) * u,
                duration_ticks,
            },
            EffectTemplate::IntrinsicShock { min, max } => MarketEffect::IntrinsicShock {
                pct: min + (max - min) * u,
            },
            EffectTemplate::Neutral => MarketEffect::Neutral,
        }
    }
}

/// A catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct NewsDescriptor {
    pub title: &'static str,
    pub description: &'static str,
    pub duration_ticks: u32,
    pub effect: EffectTemplate,
}

/// The full catalogue random news draws from.
pub const CATALOGUE: &[NewsDescriptor] = &[
    NewsDescriptor {
        title: "Earnings beat expectations",
        description: "Quarterly results come in well above consensus estimates.",
        duration_ticks: 10,
        effect: EffectTemplate::GuideShock { min: 0.01, max: 0.04, duration_ticks: 10 },
    },
    NewsDescriptor {
        title: "CEO resigns unexpectedly",
        description: "The chief executive steps down effective immediately.",
        duration_ticks: 10,
        effect: EffectTemplate::GuideShock { min: -0.05, max: -0.02, duration_ticks: 10 },
    },
    NewsDescriptor {
        title: "Analyst upgrade",
        description: "A major bank raises its price target citing strong demand.",
        duration_ticks: 8,
        effect: EffectTemplate::GuideShock { min: 0.005, max: 0.02, duration_ticks: 8 },
    },
    NewsDescriptor {
        title: "Supply chain disruption",
        description: "A key supplier halts shipments after a factory incident.",
        duration_ticks: 12,
        effect: EffectTemplate::GuideShock { min: -0.04, max: -0.01, duration_ticks: 12 },
    },
    NewsDescriptor {
        title: "Surprise buyback programme",
        description: "The board authorises a large share repurchase.",
        duration_ticks: 6,
        effect: EffectTemplate::GuideShock { min: 0.01, max: 0.03, duration_ticks: 6 },
    },
    NewsDescriptor {
        title: "Regulator opens probe",
        description: "Authorities investigate accounting practices.",
        duration_ticks: 15,
        effect: EffectTemplate::IntrinsicShock { min: -0.12, max: -0.04 },
    },
    NewsDescriptor {
        title: "Breakthrough product goes viral",
        description: "Preorders crash the website within hours.",
        duration_ticks: 10,
        effect: EffectTemplate::IntrinsicShock { min: 0.04, max: 0.12 },
    },
    NewsDescriptor {
        title: "Sector-wide rate jitters",
        description: "Traders reposition ahead of the central bank decision.",
        duration_ticks: 8,
        effect: EffectTemplate::GuideShock { min: -0.02, max: 0.02, duration_ticks: 8 },
    },
    NewsDescriptor {
        title: "Rumours swirl on trading floors",
        description: "Unconfirmed chatter moves the tape; nobody knows why.",
        duration_ticks: 5,
        effect: EffectTemplate::Neutral,
    },
];
