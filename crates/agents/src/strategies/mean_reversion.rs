//! Mean-reversion bot: fades deviations from the moving average.

use pricing::SeededPrng;
use types::{OrderSide, Quantity};

use crate::context::BotContext;
use crate::strategies::{price_band, BotAction, Strategy};

/// Configuration for a mean-reversion bot.
#[derive(Debug, Clone)]
pub struct MeanReversionConfig {
    /// SMA window.
    pub window: usize,
    /// Relative deviation from the average that triggers a trade.
    pub deviation: f64,
    /// A uniform draw must exceed this to act.
    pub act_gate: f64,
    /// Shares per order.
    pub order_size: u64,
    /// Quote offset around the guide price.
    pub price_offset: f64,
    /// Own orders older than this are cancelled.
    pub stale_after_ms: u64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            window: 20,
            deviation: 0.02,
            act_gate: 0.5,
            order_size: 10,
            price_offset: 0.005,
            stale_after_ms: 10_000,
        }
    }
}

/// Contrarian strategy trading back toward the rolling average.
pub struct MeanReversionBot {
    config: MeanReversionConfig,
    rng: SeededPrng,
}

impl MeanReversionBot {
    pub fn new(config: MeanReversionConfig, rng: SeededPrng) -> Self {
        Self { config, rng }
    }
}

impl Strategy for MeanReversionBot {
    fn name(&self) -> &'static str {
        "mean-reversion"
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

        let Some(average) = ctx.sma(self.config.window) else {
            return actions;
        };
        let current = ctx.current_price.to_float();
        let (up_price, down_price) =
            price_band(ctx.guide, self.config.price_offset, self.config.price_offset);
        let quantity = Quantity(self.config.order_size);

        if current < average * (1.0 - self.config.deviation)
            && self.rng.uniform() > self.config.act_gate
        {
            // Below average: expect a bounce, buy passively under the guide.
            let affordable = ctx.account.available_cash() >= down_price * quantity;
            if affordable && !ctx.has_order_at(OrderSide::Buy, down_price) {
                actions.push(BotAction::Limit {
                    side: OrderSide::Buy,
                    price: down_price,
                    quantity,
                });
            }
        } else if current > average * (1.0 + self.config.deviation)
            && !ctx.account.shares().is_zero()
            && self.rng.uniform() > self.config.act_gate
        {
            let quantity = quantity.min(ctx.account.shares());
            if !ctx.has_order_at(OrderSide::Sell, up_price) {
                actions.push(BotAction::Limit {
                    side: OrderSide::Sell,
                    price: up_price,
                    quantity,
                });
            }
        }

        actions
    }
}
