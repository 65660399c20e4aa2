//! Pricing crate: seeded randomness and the intrinsic/guide price model.

mod generator;
mod rng;

pub use generator::{PriceGenerator, PricePair, Shock, DEFAULT_SHOCK_TICKS, HISTORY_CAP};
pub use rng::SeededPrng;
