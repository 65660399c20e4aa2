//! Partially-informed bot: trades on a noisy intrinsic estimate.
//!
//! The bot holds a private estimate `intrinsic * (1 + noise)` and refreshes
//! the noise whenever the underlying intrinsic value moves. Entries are
//! confident (the buy trigger reads the true intrinsic value); exits lean
//! on the noisy estimate. It prefers market orders when the opposite side
//! has liquidity, falling back to limits otherwise.

use pricing::SeededPrng;
use types::{OrderSide, Quantity};

use crate::context::BotContext;
use crate::strategies::{BotAction, Strategy};

/// Configuration for a partially-informed bot.
#[derive(Debug, Clone)]
pub struct PartiallyInformedConfig {
    /// Buy when `current < buy_discount * intrinsic`.
    pub buy_discount: f64,
    /// Sell when `current > sell_premium * estimate`.
    pub sell_premium: f64,
    /// Half-width of the estimate noise (0.10 = ±10%).
    pub noise: f64,
    /// Shares per order.
    pub order_size: u64,
}

impl Default for PartiallyInformedConfig {
    fn default() -> Self {
        Self {
            buy_discount: 0.96,
            sell_premium: 1.08,
            noise: 0.10,
            order_size: 10,
        }
    }
}

/// Strategy with a noisy view of the fundamental.
pub struct PartiallyInformedBot {
    config: PartiallyInformedConfig,
    rng: SeededPrng,
    estimate: Option<f64>,
    seen_intrinsic: f64,
}

impl PartiallyInformedBot {
    pub fn new(config: PartiallyInformedConfig, rng: SeededPrng) -> Self {
        Self {
            config,
            rng,
            estimate: None,
            seen_intrinsic: 0.0,
        }
    }

    /// Current noisy estimate, resampled when the intrinsic value moved.
    fn estimate(&mut self, intrinsic: f64) -> f64 {
        let moved = self.seen_intrinsic > 0.0
            && ((intrinsic - self.seen_intrinsic) / self.seen_intrinsic).abs() > 1e-9;
        if self.estimate.is_none() || moved {
            let noise = self.rng.bipolar() * self.config.noise;
            self.estimate = Some(intrinsic * (1.0 + noise));
            self.seen_intrinsic = intrinsic;
        }
        self.estimate.expect("estimate set above")
    }
}

impl Strategy for PartiallyInformedBot {
    fn name(&self) -> &'static str {
        "partially-informed"
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction> {
        let estimate = self.estimate(ctx.intrinsic);
        let current = ctx.current_price.to_float();
        let quantity = Quantity(self.config.order_size);

        // Entries compare against the true intrinsic value; only the exit
        // threshold runs on the noisy estimate.
        if current < ctx.intrinsic * self.config.buy_discount {
            let budget_price = ctx.best_ask().unwrap_or(ctx.current_price);
            if ctx.account.available_cash() < budget_price * quantity {
                return Vec::new();
            }
            // Lift the offer when there is one, otherwise rest a bid.
            return if ctx.best_ask().is_some() {
                vec![BotAction::Market {
                    side: OrderSide::Buy,
                    quantity,
                }]
            } else {
                let price = ctx.current_price.to_tick();
                if ctx.has_order_at(OrderSide::Buy, price) {
                    Vec::new()
                } else {
                    vec![BotAction::Limit {
                        side: OrderSide::Buy,
                        price,
                        quantity,
                    }]
                }
            };
        }

        if current > estimate * self.config.sell_premium && !ctx.account.shares().is_zero() {
            let quantity = quantity.min(ctx.account.shares());
            return if ctx.best_bid().is_some() {
                vec![BotAction::Market {
                    side: OrderSide::Sell,
                    quantity,
                }]
            } else {
                let price = ctx.current_price.to_tick();
                if ctx.has_order_at(OrderSide::Sell, price) {
                    Vec::new()
                } else {
                    vec![BotAction::Limit {
                        side: OrderSide::Sell,
                        price,
                        quantity,
                    }]
                }
            };
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::TradingParticipant;
    use types::{BookLevel, BookSnapshot, Cash, ParticipantId, Price};

    fn snapshot(bid: Option<f64>, ask: Option<f64>) -> BookSnapshot {
        BookSnapshot {
            bids: bid
                .map(|p| {
                    vec![BookLevel {
                        price: Price::from_float(p),
                        quantity: Quantity(100),
                        order_count: 1,
                    }]
                })
                .unwrap_or_default(),
            asks: ask
                .map(|p| {
                    vec![BookLevel {
                        price: Price::from_float(p),
                        quantity: Quantity(100),
                        order_count: 1,
                    }]
                })
                .unwrap_or_default(),
            timestamp: 0,
        }
    }

    fn ctx<'a>(
        snapshot: &'a BookSnapshot,
        account: &'a TradingParticipant,
        current: f64,
        intrinsic: f64,
    ) -> BotContext<'a> {
        BotContext {
            tick: 1,
            now: 1_000,
            current_price: Price::from_float(current),
            intrinsic,
            guide: current,
            history: &[],
            snapshot,
            own_orders: &[],
            account,
        }
    }

    #[test]
    fn estimate_stays_within_noise_band() {
        let mut bot =
            PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(1));
        let estimate = bot.estimate(1.0);
        assert!((0.9..=1.1).contains(&estimate), "estimate {estimate}");
    }

    #[test]
    fn estimate_refreshes_only_when_intrinsic_moves() {
        let mut bot =
            PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(2));
        let first = bot.estimate(1.0);
        let second = bot.estimate(1.0);
        assert_eq!(first.to_bits(), second.to_bits());
        let third = bot.estimate(2.0);
        assert_ne!(first.to_bits(), third.to_bits());
    }

    #[test]
    fn deep_discount_buys_at_market_when_asks_exist() {
        let snap = snapshot(None, Some(0.50));
        let account =
            TradingParticipant::new(ParticipantId(1), "pi", Cash::from_float(1_000.0), true);
        let mut bot =
            PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(3));

        // 0.50 is well under 0.96 of the true intrinsic value.
        let actions = bot.decide(&ctx(&snap, &account, 0.50, 1.0));
        assert_eq!(
            actions,
            vec![BotAction::Market {
                side: OrderSide::Buy,
                quantity: Quantity(10),
            }]
        );
    }

    #[test]
    fn buy_trigger_ignores_the_noise() {
        // Just inside the discount of the true intrinsic: every noise draw
        // must produce the same decision, because entries do not consult
        // the estimate.
        let snap = snapshot(None, Some(0.95));
        let account =
            TradingParticipant::new(ParticipantId(1), "pi", Cash::from_float(1_000.0), true);
        for seed in 0..20 {
            let mut bot =
                PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(seed));
            let actions = bot.decide(&ctx(&snap, &account, 0.9599, 1.0));
            assert_eq!(
                actions,
                vec![BotAction::Market {
                    side: OrderSide::Buy,
                    quantity: Quantity(10),
                }],
                "seed {seed}"
            );
        }
    }

    #[test]
    fn deep_discount_rests_limit_when_book_is_empty() {
        let snap = snapshot(None, None);
        let account =
            TradingParticipant::new(ParticipantId(1), "pi", Cash::from_float(1_000.0), true);
        let mut bot =
            PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(4));

        let actions = bot.decide(&ctx(&snap, &account, 0.50, 1.0));
        assert_eq!(
            actions,
            vec![BotAction::Limit {
                side: OrderSide::Buy,
                price: Price::from_float(0.50),
                quantity: Quantity(10),
            }]
        );
    }

    #[test]
    fn rich_price_sells_holdings() {
        let snap = snapshot(Some(2.0), None);
        let account =
            TradingParticipant::new(ParticipantId(1), "pi", Cash::from_float(1_000.0), true)
                .with_shares(Quantity(4));
        let mut bot =
            PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(5));

        // 2.0 clears the sell threshold even for the highest estimate (1.1 * 1.08).
        let actions = bot.decide(&ctx(&snap, &account, 2.0, 1.0));
        assert_eq!(
            actions,
            vec![BotAction::Market {
                side: OrderSide::Sell,
                quantity: Quantity(4),
            }]
        );
    }

    #[test]
    fn fair_price_stays_flat() {
        let snap = snapshot(Some(0.99), Some(1.01));
        let account =
            TradingParticipant::new(ParticipantId(1), "pi", Cash::from_float(1_000.0), true)
                .with_shares(Quantity(10));
        let mut bot =
            PartiallyInformedBot::new(PartiallyInformedConfig::default(), SeededPrng::new(6));

        // 0.97 sits above the intrinsic buy discount (0.96) and below the
        // sell threshold even for the lowest possible estimate
        // (1.08 * 0.9 = 0.972), so no noise draw can trigger either side.
        let actions = bot.decide(&ctx(&snap, &account, 0.97, 1.0));
        assert!(actions.is_empty());
    }
}
