//! Per-tick market view handed to bot strategies.
//!
//! Strategies are pure consumers: the simulator builds one context per bot
//! per tick from the cached book snapshot, price model output, and the
//! bot's own live orders, and collects the returned actions.

use types::{BookSnapshot, OpenOrder, OrderId, OrderSide, Price, Tick, Timestamp};

use crate::participant::TradingParticipant;

/// Read-only market state for one bot's decision.
#[derive(Debug, Clone, Copy)]
pub struct BotContext<'a> {
    /// Current market tick.
    pub tick: Tick,
    /// Wall-clock time (ms).
    pub now: Timestamp,
    /// Last trade price, falling back to the guide price.
    pub current_price: Price,
    /// Raw intrinsic value from the price model.
    pub intrinsic: f64,
    /// Raw guide price from the price model.
    pub guide: f64,
    /// Recent guide prices, oldest first.
    pub history: &'a [Price],
    /// Cached order-book snapshot for this tick.
    pub snapshot: &'a BookSnapshot,
    /// This bot's live orders.
    pub own_orders: &'a [OpenOrder],
    /// This bot's balances.
    pub account: &'a TradingParticipant,
}

impl BotContext<'_> {
    pub fn best_bid(&self) -> Option<Price> {
        self.snapshot.best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.snapshot.best_ask()
    }

    /// Relative price change over the last `lookback` samples, or `None`
    /// when the history is too short.
    pub fn momentum(&self, lookback: usize) -> Option<f64> {
        if self.history.len() <= lookback {
            return None;
        }
        let newest = self.history[self.history.len() - 1].to_float();
        let oldest = self.history[self.history.len() - 1 - lookback].to_float();
        if oldest <= 0.0 {
            return None;
        }
        Some((newest - oldest) / oldest)
    }

    /// Simple moving average over the last `window` samples.
    pub fn sma(&self, window: usize) -> Option<f64> {
        if window == 0 || self.history.len() < window {
            return None;
        }
        let tail = &self.history[self.history.len() - window..];
        Some(tail.iter().map(|p| p.to_float()).sum::<f64>() / window as f64)
    }

    /// Standard deviation of tick-over-tick returns over the last
    /// `window` samples.
    pub fn return_volatility(&self, window: usize) -> f64 {
        if self.history.len() < 3 {
            return 0.0;
        }
        let start = self.history.len().saturating_sub(window);
        let tail = &self.history[start..];
        let returns: Vec<f64> = tail
            .windows(2)
            .filter_map(|pair| {
                let prev = pair[0].to_float();
                if prev > 0.0 {
                    Some((pair[1].to_float() - prev) / prev)
                } else {
                    None
                }
            })
            .collect();
        if returns.len() < 2 {
            return 0.0;
        }
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let var =
            returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / returns.len() as f64;
        var.sqrt()
    }

    /// Whether this bot already quotes `price` on `side`.
    pub fn has_order_at(&self, side: OrderSide, price: Price) -> bool {
        self.own_orders
            .iter()
            .any(|o| o.side == side && o.price == price)
    }

    /// Whether this bot has any live order on `side`.
    pub fn has_orders(&self, side: OrderSide) -> bool {
        self.own_orders.iter().any(|o| o.side == side)
    }

    /// Number of distinct price levels this bot quotes on `side`.
    pub fn level_count(&self, side: OrderSide) -> usize {
        let mut prices: Vec<Price> = self
            .own_orders
            .iter()
            .filter(|o| o.side == side)
            .map(|o| o.price)
            .collect();
        prices.sort();
        prices.dedup();
        prices.len()
    }

    /// Ids of this bot's orders on `side` placed more than
    /// `older_than_ms` before now.
    pub fn stale_orders(&self, side: OrderSide, older_than_ms: u64) -> Vec<OrderId> {
        self.own_orders
            .iter()
            .filter(|o| o.side == side && self.now.saturating_sub(o.placed_at) > older_than_ms)
            .map(|o| o.id)
            .collect()
    }
}
