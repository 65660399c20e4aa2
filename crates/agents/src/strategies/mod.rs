//! Bot strategy framework and the canonical strategies.
//!
//! A strategy consumes a [`BotContext`] each tick and returns the actions
//! it wants executed. The simulator executes them in order, settling fills
//! before the next bot is polled, so a strategy may assume its own actions
//! are not reordered.

mod informed;
mod liquidity;
mod mean_reversion;
mod momentum;
mod partially_informed;
mod random_walk;
mod spread;

pub use informed::{InformedBot, InformedConfig};
pub use liquidity::{LiquidityBot, LiquidityConfig};
pub use mean_reversion::{MeanReversionBot, MeanReversionConfig};
pub use momentum::{MomentumBot, MomentumConfig};
pub use partially_informed::{PartiallyInformedBot, PartiallyInformedConfig};
pub use random_walk::{RandomBot, RandomConfig};
pub use spread::{SpreadBot, SpreadConfig};

use pricing::SeededPrng;
use serde::{Deserialize, Serialize};
use types::{OrderId, OrderSide, Price, Quantity};

use crate::context::BotContext;

/// One action a strategy wants executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Limit {
        side: OrderSide,
        price: Price,
        quantity: Quantity,
    },
    Market {
        side: OrderSide,
        quantity: Quantity,
    },
    Cancel(OrderId),
}

/// The decision contract every bot strategy implements.
pub trait Strategy: Send {
    /// Stable strategy name (catalogue id).
    fn name(&self) -> &'static str;

    /// Inspect the market and return actions to execute this tick.
    ///
    /// Must be idempotent with respect to already-open intent: a strategy
    /// that already quotes its target level returns nothing rather than
    /// duplicating the order.
    fn decide(&mut self, ctx: &BotContext<'_>) -> Vec<BotAction>;
}

/// Price band around `base`: `(base * (1 + up_pct), base * (1 - down_pct))`,
/// each at least one cent away from `base` and floored at one cent.
pub fn price_band(base: f64, up_pct: f64, down_pct: f64) -> (Price, Price) {
    let min_step = 0.01;
    let up = (base * (1.0 + up_pct)).max(base + min_step);
    let down = (base * (1.0 - down_pct)).min(base - min_step).max(min_step);
    (Price::from_float(up).to_tick(), Price::from_float(down).to_tick())
}

// =============================================================================
// Strategy catalogue
// =============================================================================

/// Enumerates the available strategies for spawning and the HTTP catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotKind {
    Momentum,
    MeanReversion,
    Informed,
    PartiallyInformed,
    Liquidity,
    Random,
    Spread,
}

impl BotKind {
    /// All strategies in spawn rotation order.
    pub fn all() -> [BotKind; 7] {
        [
            BotKind::Momentum,
            BotKind::MeanReversion,
            BotKind::Informed,
            BotKind::PartiallyInformed,
            BotKind::Liquidity,
            BotKind::Random,
            BotKind::Spread,
        ]
    }

    /// Stable catalogue name.
    pub fn name(self) -> &'static str {
        match self {
            BotKind::Momentum => "momentum",
            BotKind::MeanReversion => "mean-reversion",
            BotKind::Informed => "informed",
            BotKind::PartiallyInformed => "partially-informed",
            BotKind::Liquidity => "liquidity",
            BotKind::Random => "random",
            BotKind::Spread => "spread",
        }
    }

    /// Parse a catalogue name.
    pub fn from_name(name: &str) -> Option<BotKind> {
        BotKind::all().into_iter().find(|k| k.name() == name)
    }

    /// Short description for the HTTP catalogue endpoint.
    pub fn description(self) -> &'static str {
        match self {
            BotKind::Momentum => "Chases short-term price trends",
            BotKind::MeanReversion => "Fades deviations from the moving average",
            BotKind::Informed => "Trades on the intrinsic value",
            BotKind::PartiallyInformed => "Trades on a noisy intrinsic estimate",
            BotKind::Liquidity => "Quotes both sides with inventory-aware skew",
            BotKind::Random => "Trades at random for background activity",
            BotKind::Spread => "Quotes inside wide spreads",
        }
    }

    /// Build a strategy instance with its own random stream.
    pub fn build(self, rng: SeededPrng) -> Box<dyn Strategy> {
        match self {
            BotKind::Momentum => Box::new(MomentumBot::new(MomentumConfig::default(), rng)),
            BotKind::MeanReversion => {
                Box::new(MeanReversionBot::new(MeanReversionConfig::default(), rng))
            }
            BotKind::Informed => Box::new(InformedBot::new(InformedConfig::default())),
            BotKind::PartiallyInformed => {
                Box::new(PartiallyInformedBot::new(PartiallyInformedConfig::default(), rng))
            }
            BotKind::Liquidity => Box::new(LiquidityBot::new(LiquidityConfig::default())),
            BotKind::Random => Box::new(RandomBot::new(RandomConfig::default(), rng)),
            BotKind::Spread => Box::new(SpreadBot::new(SpreadConfig::default())),
        }
    }
}

/// Wire descriptor for the bot catalogue endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDescriptor {
    pub id: String,
    pub description: String,
}

/// The full bot catalogue.
pub fn bot_catalogue() -> Vec<BotDescriptor> {
    BotKind::all()
        .into_iter()
        .map(|kind| BotDescriptor {
            id: kind.name().to_string(),
            description: kind.description().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in BotKind::all() {
            assert_eq!(BotKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(BotKind::from_name("nope"), None);
    }

    #[test]
    fn price_band_enforces_min_step() {
        // 1% of $0.10 is under a cent; the band must still separate.
        let (up, down) = price_band(0.10, 0.01, 0.01);
        assert!(up >= Price::from_float(0.11));
        assert!(down <= Price::from_float(0.09));
        assert!(down >= Price::MIN_TICK);
    }

    #[test]
    fn price_band_floors_at_one_cent() {
        let (_, down) = price_band(0.01, 0.01, 0.5);
        assert_eq!(down, Price::MIN_TICK);
    }

    #[test]
    fn catalogue_covers_all_kinds() {
        let catalogue = bot_catalogue();
        assert_eq!(catalogue.len(), BotKind::all().len());
        assert!(catalogue.iter().any(|d| d.id == "informed"));
    }
}
