//! Sim-core crate: order book, matching, and per-participant tracking.
//!
//! The [`OrderBookWrapper`] is the only entry point the rest of the system
//! uses; the raw [`OrderBook`] and matching functions are exposed for
//! tests and tooling.

mod error;
mod matching;
mod order_book;
mod wrapper;

pub use error::{Result, SimCoreError};
pub use matching::{match_order, match_order_budgeted, MakerFill, MatchResult};
pub use order_book::{OrderBook, PriceLevel};
pub use wrapper::{ClientBook, LimitResult, MarketResult, OrderBookWrapper};
