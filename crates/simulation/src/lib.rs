//! Simulation crate: the per-room tick-driven market engine.

mod simulator;

pub use simulator::{
    ClockTickOutput, MarketFillSummary, MarketTickOutput, Simulator, BOT_ID_BASE,
    BOT_INITIAL_SHARES,
};
