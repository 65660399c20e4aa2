//! Intrinsic/guide price generation.
//!
//! The model keeps two prices per room: a slowly drifting *intrinsic*
//! value (the fundamental), and a noisy *guide* price following geometric
//! Brownian motion with mean reversion toward the intrinsic value and
//! optional decaying shocks. Informed bots trade on the intrinsic value;
//! everyone else sees only the guide.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use types::Price;

use crate::rng::SeededPrng;

/// Number of recent guide prices retained for bot signals.
pub const HISTORY_CAP: usize = 20;

/// Default shock lifetime in market ticks.
pub const DEFAULT_SHOCK_TICKS: u32 = 10;

/// Hard floor for both model prices, in dollars.
const PRICE_FLOOR: f64 = 0.01;

/// A transient additive drift applied to the guide price.
///
/// `intensity` is a fractional per-tick drift (0.05 = 5% per tick); every
/// caller converts to this scale before invoking [`PriceGenerator::shock`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shock {
    pub intensity: f64,
    pub ticks_remaining: u32,
}

/// One tick's rounded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePair {
    pub intrinsic: Price,
    pub guide: Price,
}

/// Deterministic-for-a-seed generator of `(intrinsic, guide)` samples.
#[derive(Debug, Clone)]
pub struct PriceGenerator {
    intrinsic_value: f64,
    guide_price: f64,
    drift: f64,
    volatility: f64,
    mean_reversion: f64,
    shock: Option<Shock>,
    history: VecDeque<Price>,
    rng: SeededPrng,
}

impl PriceGenerator {
    /// Create a generator opening at `opening_price` with the given
    /// per-tick volatility fraction.
    pub fn new(opening_price: Price, volatility: f64, rng: SeededPrng) -> Self {
        let opening = opening_price.to_float().max(PRICE_FLOOR);
        Self {
            intrinsic_value: opening,
            guide_price: opening,
            drift: 0.0,
            volatility: volatility.clamp(f64::MIN_POSITIVE, 1.0),
            mean_reversion: 0.1,
            shock: None,
            history: VecDeque::with_capacity(HISTORY_CAP),
            rng,
        }
    }

    /// Override the base drift term.
    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    /// Override the mean-reversion strength (clamped to `[0, 1]`).
    pub fn with_mean_reversion(mut self, strength: f64) -> Self {
        self.mean_reversion = strength.clamp(0.0, 1.0);
        self
    }

    /// Advance the model one tick and return the rounded pair.
    ///
    /// Total drift is the base drift plus the live shock contribution plus
    /// the reversion force pulling the guide toward the intrinsic value;
    /// the guide then takes a GBM step with a standard-normal draw.
    pub fn tick(&mut self) -> PricePair {
        let shock_contribution = self.consume_shock();
        let reversion =
            -((self.guide_price - self.intrinsic_value) / self.intrinsic_value) * self.mean_reversion;
        let total_drift = self.drift + shock_contribution + reversion;

        let z = self.rng.normal();
        let step = (total_drift - self.volatility * self.volatility / 2.0) + self.volatility * z;
        self.guide_price = (self.guide_price * step.exp()).max(PRICE_FLOOR);

        let pair = self.current_pair();
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(pair.guide);
        pair
    }

    fn consume_shock(&mut self) -> f64 {
        match self.shock.as_mut() {
            Some(shock) => {
                let contribution = shock.intensity;
                shock.ticks_remaining -= 1;
                if shock.ticks_remaining == 0 {
                    self.shock = None;
                }
                contribution
            }
            None => 0.0,
        }
    }

    /// Install a decaying shock, replacing any existing one.
    pub fn shock(&mut self, intensity: f64, duration_ticks: u32) {
        if duration_ticks == 0 {
            self.shock = None;
            return;
        }
        self.shock = Some(Shock {
            intensity,
            ticks_remaining: duration_ticks,
        });
    }

    /// Reprice the fundamental by the given fraction.
    pub fn intrinsic_shock(&mut self, pct: f64) {
        self.intrinsic_value = (self.intrinsic_value * (1.0 + pct)).max(PRICE_FLOOR);
    }

    /// Drift the fundamental by `pct` with PRNG-chosen sign.
    ///
    /// Called by the simulator at its precomputed drift timestamps.
    pub fn drift_intrinsic_value(&mut self, pct: f64) {
        let signed = if self.rng.chance(0.5) { pct } else { -pct };
        self.intrinsic_shock(signed);
    }

    /// The rounded pair without advancing the model.
    pub fn current_pair(&self) -> PricePair {
        PricePair {
            intrinsic: Price::from_float(self.intrinsic_value).quantize(),
            guide: Price::from_float(self.guide_price).quantize(),
        }
    }

    /// Raw intrinsic value (model units).
    pub fn intrinsic_value(&self) -> f64 {
        self.intrinsic_value
    }

    /// Raw guide price (model units).
    pub fn guide_price(&self) -> f64 {
        self.guide_price
    }

    /// Current volatility fraction.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Set the volatility fraction (clamped to `(0, 1]`).
    pub fn set_volatility(&mut self, volatility: f64) {
        self.volatility = volatility.clamp(f64::MIN_POSITIVE, 1.0);
    }

    /// Whether a shock is currently live.
    pub fn has_shock(&self) -> bool {
        self.shock.is_some()
    }

    /// Recent guide prices, oldest first, capped at [`HISTORY_CAP`].
    pub fn history(&self) -> impl Iterator<Item = Price> + '_ {
        self.history.iter().copied()
    }
}
