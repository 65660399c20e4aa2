//! Momentum bot: chases short-term trends.
//!
//! Measures the relative price change over the last few samples and joins
//! the move when it exceeds a threshold, gated by a random draw so the
//! whole population does not fire on the same tick.

use pricing::SeededPrng;
use types::{OrderSide, Quantity};

use crate::context::BotContext;
use crate::strategies::{price_band, BotAction, Strategy};

/// Configuration for a momentum bot.
#[derive(Debug, Clone)]
pub struct MomentumConfig {
    /// Samples between the two prices compared.
    pub lookback: usize,
    /// Minimum relative move to act on.
    pub threshold: f64,
    /// A uniform draw must exceed this to act.
    pub act_gate: f64,
    /// Shares per order.
    pub order_size: u64,
    /// Quote offset around the guide price.
    pub price_offset: f64,
    /// Own orders older than this are cancelled.
    pub stale_after_ms: u64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: 5,
            threshold: 0.01,
            act_gate: 0.7,
            order_size: 10,
            price_offset: 0.01,
            stale_after_ms: 5_000,
        }
    }
}

/// Trend-following strategy.
pub struct MomentumBot {
    config: MomentumConfig,
    rng: SeededPrng,
}

impl MomentumBot {
    pub fn new(config: MomentumConfig, rng: SeededPrng) -> Self {
        Self { config, rng }
    }
}

impl Strategy for MomentumBot {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction> {
        let mut actions: Vec<BotAction> = Vec::new();
        for side in [OrderSide::Buy, OrderSide::Sell] {
            actions.extend(
                ctx.stale_orders(side, self.config.stale_after_ms)
                    .into_iter()
                    .map(BotAction::Cancel),
            );
        }

        let Some(momentum) = ctx.momentum(self.config.lookback) else {
            return actions;
        };
        let (up_price, down_price) =
            price_band(ctx.guide, self.config.price_offset, self.config.price_offset);
        let quantity = Quantity(self.config.order_size);

        if momentum > self.config.threshold && self.rng.uniform() > self.config.act_gate {
            let affordable = ctx.account.available_cash() >= up_price * quantity;
            if affordable && !ctx.has_order_at(OrderSide::Buy, up_price) {
                actions.push(BotAction::Limit {
                    side: OrderSide::Buy,
                    price: up_price,
                    quantity,
                });
            }
        } else if momentum < -self.config.threshold
            && !ctx.account.shares().is_zero()
            && self.rng.uniform() > self.config.act_gate
        {
            let quantity = quantity.min(ctx.account.shares());
            if !ctx.has_order_at(OrderSide::Sell, down_price) {
                actions.push(BotAction::Limit {
                    side: OrderSide::Sell,
                    price: down_price,
                    quantity,
                });
            }
        }

        actions
    }
}
