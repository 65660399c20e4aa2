//! Liquidity bot: two-sided market maker with inventory-aware skew.
//!
//! Quotes a bid and an ask around the current price. The spread widens
//! with realised volatility; quotes skew away from excess inventory, and a
//! deviation past the hard limit triggers an aggressive market-order
//! rebalance.

use types::{OrderSide, Price, Quantity};

use crate::context::BotContext;
use crate::strategies::{BotAction, Strategy};

/// Configuration for a liquidity bot.
#[derive(Debug, Clone)]
pub struct LiquidityConfig {
    /// Base full-spread fraction; also the minimum market spread worth
    /// quoting into, compared as `(ask - bid) / mid`.
    pub base_spread: f64,
    /// Cap on the volatility-scaled spread fraction.
    pub max_spread: f64,
    /// Return-volatility window (samples).
    pub vol_window: usize,
    /// Shares per quote.
    pub quote_size: u64,
    /// Inventory the bot steers toward.
    pub target_inventory: i64,
    /// Skew per share of inventory deviation.
    pub inventory_skew: f64,
    /// Deviation beyond which the bot rebalances at market.
    pub max_deviation: i64,
    /// Quotes older than this are cancelled and re-placed.
    pub refresh_ms: u64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            base_spread: 0.02,
            max_spread: 0.06,
            vol_window: 20,
            quote_size: 20,
            target_inventory: 100,
            inventory_skew: 0.0001,
            max_deviation: 80,
            refresh_ms: 2_000,
        }
    }
}

/// Market-making strategy.
pub struct LiquidityBot {
    config: LiquidityConfig,
}

impl LiquidityBot {
    pub fn new(config: LiquidityConfig) -> Self {
        Self { config }
    }

    /// Volatility-scaled spread fraction, capped at `max_spread`.
    fn effective_spread(&self, sigma: f64) -> f64 {
        (self.config.base_spread * (1.0 + sigma * 100.0)).min(self.config.max_spread)
    }

    fn inventory(&self, ctx: &BotContext<'_>) -> i64 {
        (ctx.account.shares().raw() + ctx.account.locked_shares().raw()) as i64
    }
}

impl Strategy for LiquidityBot {
    fn name(&self) -> &'static str {
        "liquidity"
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction> {
        let mut actions: Vec<BotAction> = Vec::new();
        for side in [OrderSide::Buy, OrderSide::Sell] {
            actions.extend(
                ctx.stale_orders(side, self.config.refresh_ms)
                    .into_iter()
                    .map(BotAction::Cancel),
            );
        }

        let deviation = self.inventory(ctx) - self.config.target_inventory;
        if deviation.abs() > self.config.max_deviation {
            // Way off target: cross the spread to rebalance.
            let quantity = Quantity((deviation.unsigned_abs()).min(self.config.quote_size));
            let side = if deviation > 0 {
                OrderSide::Sell
            } else {
                OrderSide::Buy
            };
            let executable = match side {
                OrderSide::Sell => ctx.best_bid().is_some() && !ctx.account.shares().is_zero(),
                OrderSide::Buy => ctx.best_ask().is_some(),
            };
            if executable {
                actions.push(BotAction::Market {
                    side,
                    quantity: match side {
                        OrderSide::Sell => quantity.min(ctx.account.shares()),
                        OrderSide::Buy => quantity,
                    },
                });
                return actions;
            }
        }

        // A spread tighter than our base spread leaves no edge to quote.
        if let (Some(bid), Some(ask)) = (ctx.best_bid(), ctx.best_ask()) {
            let mid = (bid.to_float() + ask.to_float()) / 2.0;
            if mid > 0.0 && (ask.to_float() - bid.to_float()) / mid <= self.config.base_spread {
                return actions;
            }
        }

        let mid = ctx.current_price.to_float();
        let sigma = ctx.return_volatility(self.config.vol_window);
        let half = self.effective_spread(sigma) / 2.0;
        let skew = -(deviation as f64) * self.config.inventory_skew;

        let bid_price = Price::from_float(mid * (1.0 - half + skew)).to_tick();
        let mut ask_price = Price::from_float(mid * (1.0 + half + skew)).to_tick();
        if ask_price <= bid_price {
            ask_price = bid_price + Price::MIN_TICK;
        }
        let quantity = Quantity(self.config.quote_size);

        if ctx.account.available_cash() >= bid_price * quantity
            && !ctx.has_order_at(OrderSide::Buy, bid_price)
        {
            actions.push(BotAction::Limit {
                side: OrderSide::Buy,
                price: bid_price,
                quantity,
            });
        }
        if !ctx.account.shares().is_zero() && !ctx.has_order_at(OrderSide::Sell, ask_price) {
            actions.push(BotAction::Limit {
                side: OrderSide::Sell,
                price: ask_price,
                quantity: quantity.min(ctx.account.shares()),
            });
        }

        actions
    }
}
