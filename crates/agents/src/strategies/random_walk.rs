//! Random bot: background activity generator.
//!
//! Flips a coin each tick; rare draws buy or sell near the current price,
//! choosing market or limit half the time each. Refuses to stack more
//! than a handful of its own price levels on one side.

use pricing::SeededPrng;
use types::{OrderSide, Price, Quantity};

use crate::context::BotContext;
use crate::strategies::{BotAction, Strategy};

/// Configuration for a random bot.
#[derive(Debug, Clone)]
pub struct RandomConfig {
    /// A uniform draw above this buys.
    pub buy_threshold: f64,
    /// A uniform draw below this sells.
    pub sell_threshold: f64,
    /// Shares per order.
    pub order_size: u64,
    /// Maximum own price levels per side before refusing new orders.
    pub max_levels: usize,
    /// Limit price deviation around the current price.
    pub price_deviation: f64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 0.9,
            sell_threshold: 0.1,
            order_size: 10,
            max_levels: 10,
            price_deviation: 0.02,
        }
    }
}

/// Coin-flip strategy.
pub struct RandomBot {
    config: RandomConfig,
    rng: SeededPrng,
}

impl RandomBot {
    pub fn new(config: RandomConfig, rng: SeededPrng) -> Self {
        Self { config, rng }
    }
}

impl Strategy for RandomBot {
    fn name(&self) -> &'static str {
        "random"
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction> {
        let draw = self.rng.uniform();
        let side = if draw > self.config.buy_threshold {
            OrderSide::Buy
        } else if draw < self.config.sell_threshold && !ctx.account.shares().is_zero() {
            OrderSide::Sell
        } else {
            return Vec::new();
        };

        if ctx.level_count(side) > self.config.max_levels {
            return Vec::new();
        }

        let quantity = match side {
            OrderSide::Buy => Quantity(self.config.order_size),
            OrderSide::Sell => Quantity(self.config.order_size).min(ctx.account.shares()),
        };

        let use_market = self.rng.chance(0.5);
        if use_market {
            let executable = match side {
                OrderSide::Buy => ctx.best_ask().is_some(),
                OrderSide::Sell => ctx.best_bid().is_some(),
            };
            if !executable {
                return Vec::new();
            }
            if side == OrderSide::Buy {
                let budget_price = ctx.best_ask().expect("checked above");
                if ctx.account.available_cash() < budget_price * quantity {
                    return Vec::new();
                }
            }
            return vec![BotAction::Market { side, quantity }];
        }

        let offset = self.rng.bipolar() * self.config.price_deviation;
        let price = Price::from_float(ctx.current_price.to_float() * (1.0 + offset)).to_tick();
        if ctx.has_order_at(side, price) {
            return Vec::new();
        }
        if side == OrderSide::Buy && ctx.account.available_cash() < price * quantity {
            return Vec::new();
        }
        vec![BotAction::Limit {
            side,
            price,
            quantity,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::TradingParticipant;
    use types::{BookSnapshot, Cash, OpenOrder, OrderId, ParticipantId};

    fn ctx<'a>(
        snapshot: &'a BookSnapshot,
        own: &'a [OpenOrder],
        account: &'a TradingParticipant,
    ) -> BotContext<'a> {
        BotContext {
            tick: 1,
            now: 1_000,
            current_price: Price::from_float(1.0),
            intrinsic: 1.0,
            guide: 1.0,
            history: &[],
            snapshot,
            own_orders: own,
            account,
        }
    }

    #[test]
    fn acts_rarely_but_does_act() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "r", Cash::from_float(10_000.0), true)
                .with_shares(Quantity(100));
        let mut bot = RandomBot::new(RandomConfig::default(), SeededPrng::new(1));

        let mut acted = 0;
        for _ in 0..500 {
            if !bot.decide(&ctx(&snapshot, &[], &account)).is_empty() {
                acted += 1;
            }
        }
        // Roughly 20% of draws act (halved again by the unexecutable
        // market branch on an empty book).
        assert!(acted > 20, "acted {acted}");
        assert!(acted < 200, "acted {acted}");
    }

    #[test]
    fn never_sells_without_shares() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "r", Cash::from_float(10_000.0), true);
        let mut bot = RandomBot::new(RandomConfig::default(), SeededPrng::new(2));

        for _ in 0..500 {
            for action in bot.decide(&ctx(&snapshot, &[], &account)) {
                let side = match action {
                    BotAction::Limit { side, .. } | BotAction::Market { side, .. } => side,
                    BotAction::Cancel(_) => continue,
                };
                assert_eq!(side, OrderSide::Buy);
            }
        }
    }

    #[test]
    fn refuses_to_stack_levels() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "r", Cash::from_float(10_000.0), true)
                .with_shares(Quantity(100));
        // Eleven distinct buy levels already open.
        let own: Vec<OpenOrder> = (0..11)
            .map(|i| OpenOrder {
                id: OrderId::new(ParticipantId(1), i),
                side: OrderSide::Buy,
                price: Price::from_float(0.5 + i as f64 * 0.01),
                quantity: Quantity(1),
                placed_at: 0,
            })
            .collect();
        let mut bot = RandomBot::new(RandomConfig::default(), SeededPrng::new(3));

        for _ in 0..500 {
            for action in bot.decide(&ctx(&snapshot, &own, &account)) {
                assert!(
                    !matches!(action, BotAction::Limit { side: OrderSide::Buy, .. })
                        && !matches!(action, BotAction::Market { side: OrderSide::Buy, .. }),
                    "stacked an eleventh buy level"
                );
            }
        }
    }

    #[test]
    fn limit_prices_stay_near_current() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "r", Cash::from_float(10_000.0), true)
                .with_shares(Quantity(100));
        let mut bot = RandomBot::new(RandomConfig::default(), SeededPrng::new(4));

        for _ in 0..500 {
            for action in bot.decide(&ctx(&snapshot, &[], &account)) {
                if let BotAction::Limit { price, .. } = action {
                    let v = price.to_float();
                    assert!((0.97..=1.04).contains(&v), "price {v}");
                }
            }
        }
    }
}
