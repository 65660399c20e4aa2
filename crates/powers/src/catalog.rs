//! The power catalogue.
//!
//! Powers are in-game abilities offered through briefcases. Each spec is
//! static data; the behavioural side lives in the effect enum, which the
//! room interprets against its simulator and clients.

use serde::Serialize;

/// Who a power acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerTarget {
    /// The initiating client only.
    Client,
    /// Every client in the room.
    All,
    /// The market itself.
    Market,
    /// Every client except the initiator.
    Others,
}

/// What consuming a power does. Interpreted by the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEffect {
    /// Quadruple volatility (capped at 1.0) for the duration, then restore.
    VolatilityStorm,
    /// Publish a zero-duration news item applying a random guide shock.
    RumorMill,
    /// Grant the initiator `1000 + ⌊u · starting_cash⌋`; announce to all.
    CashHeritage,
    /// Grant the initiator a single dollar; tell only them.
    HomelessGift,
    /// Disable trading for everyone else for the duration, then restore.
    HackerDdos,
}

/// A catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Higher rarity = offered less often (weight is `1 / rarity`).
    pub rarity: u32,
    #[serde(rename = "type")]
    pub target: PowerTarget,
    pub is_instant: bool,
    /// Display price shown in the briefcase; never charged.
    pub price: u32,
    pub duration_ticks: u32,
    #[serde(skip)]
    pub effect: PowerEffect,
}

/// Every power in the game.
pub const CATALOGUE: &[PowerSpec] = &[
    PowerSpec {
        id: "volatility-storm",
        title: "Volatility Storm",
        description: "Whips the market into a frenzy for a while.",
        rarity: 3,
        target: PowerTarget::Market,
        is_instant: false,
        price: 500,
        duration_ticks: 20,
        effect: PowerEffect::VolatilityStorm,
    },
    PowerSpec {
        id: "rumor-mill",
        title: "Rumor Mill",
        description: "Plants a juicy rumour that jolts the price.",
        rarity: 2,
        target: PowerTarget::Market,
        is_instant: false,
        price: 300,
        duration_ticks: 0,
        effect: PowerEffect::RumorMill,
    },
    PowerSpec {
        id: "cash-heritage",
        title: "Cash Heritage",
        description: "A distant relative leaves you a fortune.",
        rarity: 4,
        target: PowerTarget::Client,
        is_instant: true,
        price: 0,
        duration_ticks: 0,
        effect: PowerEffect::CashHeritage,
    },
    PowerSpec {
        id: "the-homeless-gift",
        title: "The Homeless Gift",
        description: "Somebody hands you a dollar. Every bit counts.",
        rarity: 1,
        target: PowerTarget::Client,
        is_instant: true,
        price: 0,
        duration_ticks: 0,
        effect: PowerEffect::HomelessGift,
    },
    PowerSpec {
        id: "the-hacker-ddos",
        title: "The Hacker: DDoS",
        description: "Knocks every rival's trading terminal offline.",
        rarity: 5,
        target: PowerTarget::Others,
        is_instant: false,
        price: 800,
        duration_ticks: 15,
        effect: PowerEffect::HackerDdos,
    },
];

/// Find a spec by catalogue id.
pub fn spec_by_id(id: &str) -> Option<&'static PowerSpec> {
    CATALOGUE.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_the_five_powers() {
        let ids: Vec<&str> = CATALOGUE.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                "volatility-storm",
                "rumor-mill",
                "cash-heritage",
                "the-homeless-gift",
                "the-hacker-ddos",
            ]
        );
    }

    #[test]
    fn instant_powers_have_no_duration() {
        for spec in CATALOGUE.iter().filter(|s| s.is_instant) {
            assert_eq!(spec.duration_ticks, 0, "{}", spec.id);
        }
    }

    #[test]
    fn serializes_wire_shape() {
        let json = serde_json::to_value(CATALOGUE[0]).unwrap();
        assert_eq!(json["id"], "volatility-storm");
        assert_eq!(json["type"], "market");
        assert_eq!(json["isInstant"], false);
        assert_eq!(json["durationTicks"], 20);
    }

    #[test]
    fn spec_lookup_by_id() {
        assert!(spec_by_id("rumor-mill").is_some());
        assert!(spec_by_id("unknown").is_none());
    }
}
