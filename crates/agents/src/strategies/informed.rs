//! Informed bot: trades on the intrinsic value.
//!
//! Buys at market when the price sits well under the fundamental, then
//! takes profit on that purchase through a resting limit sell above it,
//! and dumps at market when the price runs far past the fundamental.
//! The exit is tied to the bot's own buys; shares it happens to hold for
//! other reasons are not auctioned off. Orders still positioned sensibly
//! relative to the intrinsic value are left alone.

use types::{OrderSide, Price, Quantity};

use crate::context::BotContext;
use crate::strategies::{BotAction, Strategy};

/// Configuration for an informed bot.
#[derive(Debug, Clone)]
pub struct InformedConfig {
    /// Buy at market when `current < buy_discount * intrinsic`.
    pub buy_discount: f64,
    /// Sell at market when `current > sell_premium * intrinsic`.
    pub sell_premium: f64,
    /// Resting exit sells are priced at `exit_premium * intrinsic`.
    pub exit_premium: f64,
    /// Shares per order.
    pub order_size: u64,
    /// Sells priced inside `[keep_low, keep_high] * intrinsic` are kept;
    /// anything outside is mispositioned and cancelled.
    pub keep_low: f64,
    pub keep_high: f64,
}

impl Default for InformedConfig {
    fn default() -> Self {
        Self {
            buy_discount: 0.95,
            sell_premium: 1.10,
            exit_premium: 1.05,
            order_size: 10,
            keep_low: 1.0,
            keep_high: 1.15,
        }
    }
}

/// Strategy with exact knowledge of the intrinsic value.
pub struct InformedBot {
    config: InformedConfig,
    /// A market buy was issued and its inventory still needs an exit sell.
    /// The park happens once shares show up in the account view (the same
    /// tick when the bot already held some, otherwise the next).
    pending_exit: bool,
}

impl InformedBot {
    pub fn new(config: InformedConfig) -> Self {
        Self {
            config,
            pending_exit: false,
        }
    }

    fn exit_price(&self, intrinsic: f64) -> Price {
        Price::from_float(intrinsic * self.config.exit_premium).to_tick()
    }
}

impl Strategy for InformedBot {
    fn name(&self) -> &'static str {
        "informed"
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction> {
        let intrinsic = ctx.intrinsic;
        let current = ctx.current_price.to_float();
        let mut actions: Vec<BotAction> = Vec::new();

        // Prune sells that no longer make sense against the fundamental;
        // correctly positioned ones stay.
        let keep = (intrinsic * self.config.keep_low)..=(intrinsic * self.config.keep_high);
        actions.extend(
            ctx.own_orders
                .iter()
                .filter(|o| o.side == OrderSide::Sell && !keep.contains(&o.price.to_float()))
                .map(|o| BotAction::Cancel(o.id)),
        );

        let quantity = Quantity(self.config.order_size);
        if current > intrinsic * self.config.sell_premium && !ctx.account.shares().is_zero() {
            // Dumping at market supersedes any planned exit.
            self.pending_exit = false;
            actions.push(BotAction::Market {
                side: OrderSide::Sell,
                quantity: quantity.min(ctx.account.shares()),
            });
            return actions;
        }

        if current < intrinsic * self.config.buy_discount {
            let budget_price = ctx
                .best_ask()
                .unwrap_or(ctx.current_price);
            if ctx.account.available_cash() >= budget_price * quantity {
                actions.push(BotAction::Market {
                    side: OrderSide::Buy,
                    quantity,
                });
                self.pending_exit = true;
            }
        }

        // Park the exit for inventory picked up by a buy, at the
        // profit-taking level. Fires only after a buy; unrelated holdings
        // never trigger it.
        if self.pending_exit && !ctx.account.shares().is_zero() {
            let exit = self.exit_price(intrinsic);
            if !ctx.has_order_at(OrderSide::Sell, exit) {
                actions.push(BotAction::Limit {
                    side: OrderSide::Sell,
                    price: exit,
                    quantity: quantity.min(ctx.account.shares()),
                });
            }
            self.pending_exit = false;
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::TradingParticipant;
    use types::{BookLevel, BookSnapshot, Cash, OpenOrder, OrderId, ParticipantId};

    fn snapshot_with_ask(price: f64) -> BookSnapshot {
        BookSnapshot {
            bids: vec![],
            asks: vec![BookLevel {
                price: Price::from_float(price),
                quantity: Quantity(100),
                order_count: 1,
            }],
            timestamp: 0,
        }
    }

    fn ctx<'a>(
        snapshot: &'a BookSnapshot,
        own: &'a [OpenOrder],
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
            own_orders: own,
            account,
        }
    }

    #[test]
    fn buys_at_market_when_underpriced() {
        let snapshot = snapshot_with_ask(0.90);
        let account =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true);
        let mut bot = InformedBot::new(InformedConfig::default());

        // No shares yet, so the exit cannot be parked on the same tick.
        let actions = bot.decide(&ctx(&snapshot, &[], &account, 0.90, 1.0));
        assert_eq!(
            actions,
            vec![BotAction::Market {
                side: OrderSide::Buy,
                quantity: Quantity(10),
            }]
        );
    }

    #[test]
    fn sells_at_market_when_overpriced() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true)
                .with_shares(Quantity(25));
        let mut bot = InformedBot::new(InformedConfig::default());

        let actions = bot.decide(&ctx(&snapshot, &[], &account, 1.20, 1.0));
        assert_eq!(
            actions,
            vec![BotAction::Market {
                side: OrderSide::Sell,
                quantity: Quantity(10),
            }]
        );
    }

    #[test]
    fn parks_exit_after_its_own_buy() {
        let underpriced = snapshot_with_ask(0.90);
        let empty_handed =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true);
        let mut bot = InformedBot::new(InformedConfig::default());

        // Tick 1: the buy fires; nothing to exit yet.
        let actions = bot.decide(&ctx(&underpriced, &[], &empty_handed, 0.90, 1.0));
        assert_eq!(actions.len(), 1);

        // Tick 2: the fill has landed, the exit is parked once.
        let filled = empty_handed.clone().with_shares(Quantity(10));
        let fair = BookSnapshot::default();
        let actions = bot.decide(&ctx(&fair, &[], &filled, 1.0, 1.0));
        assert_eq!(
            actions,
            vec![BotAction::Limit {
                side: OrderSide::Sell,
                price: Price::from_float(1.05),
                quantity: Quantity(10),
            }]
        );

        // Tick 3: with the exit resting, nothing new happens.
        let own = [OpenOrder {
            id: OrderId::new(ParticipantId(1), 1),
            side: OrderSide::Sell,
            price: Price::from_float(1.05),
            quantity: Quantity(10),
            placed_at: 0,
        }];
        let actions = bot.decide(&ctx(&fair, &own, &filled, 1.0, 1.0));
        assert!(actions.is_empty(), "{actions:?}");
    }

    #[test]
    fn unrelated_holdings_get_no_exit() {
        // Shares the bot never bought (seeded inventory, power payouts)
        // are not auctioned off.
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true)
                .with_shares(Quantity(25));
        let mut bot = InformedBot::new(InformedConfig::default());

        for _ in 0..5 {
            let actions = bot.decide(&ctx(&snapshot, &[], &account, 1.0, 1.0));
            assert!(actions.is_empty(), "{actions:?}");
        }
    }

    #[test]
    fn keeps_correctly_positioned_exit() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true)
                .with_shares(Quantity(10));
        let own = [OpenOrder {
            id: OrderId::new(ParticipantId(1), 1),
            side: OrderSide::Sell,
            price: Price::from_float(1.05),
            quantity: Quantity(10),
            placed_at: 0,
        }];
        let mut bot = InformedBot::new(InformedConfig::default());

        let actions = bot.decide(&ctx(&snapshot, &own, &account, 1.0, 1.0));
        assert!(actions.is_empty(), "{actions:?}");
    }

    #[test]
    fn cancels_mispositioned_sell_after_intrinsic_falls() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true);
        // Exit priced for an intrinsic of 2.0 that has since halved.
        let own = [OpenOrder {
            id: OrderId::new(ParticipantId(1), 1),
            side: OrderSide::Sell,
            price: Price::from_float(2.10),
            quantity: Quantity(10),
            placed_at: 0,
        }];
        let mut bot = InformedBot::new(InformedConfig::default());

        let actions = bot.decide(&ctx(&snapshot, &own, &account, 1.0, 1.0));
        assert!(actions
            .iter()
            .any(|a| matches!(a, BotAction::Cancel(id) if *id == OrderId::new(ParticipantId(1), 1))));
    }

    #[test]
    fn holds_inside_the_fair_band() {
        let snapshot = BookSnapshot::default();
        let account =
            TradingParticipant::new(ParticipantId(1), "i", Cash::from_float(10_000.0), true);
        let mut bot = InformedBot::new(InformedConfig::default());

        // Price within [0.95, 1.10] of intrinsic and no inventory: no action.
        let actions = bot.decide(&ctx(&snapshot, &[], &account, 1.0, 1.0));
        assert!(actions.is_empty());
    }
}
