//! Spread bot: quotes inside wide spreads.
//!
//! When the book's spread is wide relative to the current price, places a
//! bid and an ask 30% inside the spread from each end, refreshing its own
//! quotes on an interval.

use types::{OrderSide, Price, Quantity};

use crate::context::BotContext;
use crate::strategies::{BotAction, Strategy};

/// Configuration for a spread bot.
#[derive(Debug, Clone)]
pub struct SpreadConfig {
    /// Minimum `spread / current` fraction worth quoting into.
    pub min_spread_pct: f64,
    /// How far into the spread to quote, from each side.
    pub inside_fraction: f64,
    /// Shares per order.
    pub order_size: u64,
    /// Own quotes older than this are cancelled and re-placed.
    pub order_refresh_ms: u64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            min_spread_pct: 0.02,
            inside_fraction: 0.3,
            order_size: 10,
            order_refresh_ms: 3_000,
        }
    }
}

/// Spread-capture strategy.
pub struct SpreadBot {
    config: SpreadConfig,
}

impl SpreadBot {
    pub fn new(config: SpreadConfig) -> Self {
        Self { config }
    }
}

impl Strategy for SpreadBot {
    fn name(&self) -> &'static str {
        "spread"
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction> {
        let mut actions: Vec<BotAction> = Vec::new();
        for side in [OrderSide::Buy, OrderSide::Sell] {
            actions.extend(
                ctx.stale_orders(side, self.config.order_refresh_ms)
                    .into_iter()
                    .map(BotAction::Cancel),
            );
        }

        let (Some(bid), Some(ask)) = (ctx.best_bid(), ctx.best_ask()) else {
            return actions;
        };
        let current = ctx.current_price.to_float();
        let spread = ask.to_float() - bid.to_float();
        if current <= 0.0 || spread / current <= self.config.min_spread_pct {
            return actions;
        }

        let step = spread * self.config.inside_fraction;
        let buy_price = Price::from_float(bid.to_float() + step).to_tick();
        let sell_price = Price::from_float(ask.to_float() - step).to_tick();
        if buy_price >= sell_price {
            return actions;
        }
        let quantity = Quantity(self.config.order_size);

        if ctx.account.available_cash() >= buy_price * quantity
            && !ctx.has_order_at(OrderSide::Buy, buy_price)
        {
            actions.push(BotAction::Limit {
                side: OrderSide::Buy,
                price: buy_price,
                quantity,
            });
        }
        if !ctx.account.shares().is_zero() && !ctx.has_order_at(OrderSide::Sell, sell_price) {
            actions.push(BotAction::Limit {
                side: OrderSide::Sell,
                price: sell_price,
                quantity: quantity.min(ctx.account.shares()),
            });
        }

        actions
    }
}
