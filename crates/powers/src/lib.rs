//! Powers crate: in-game abilities, briefcase offers, and timed effects.

mod catalog;
mod factory;

pub use catalog::{spec_by_id, PowerEffect, PowerSpec, PowerTarget, CATALOGUE};
pub use factory::{
    ActivePower, PowerClockOutput, PowerFactory, PowerState, Selected, StoredPower, OFFER_SIZE,
};
