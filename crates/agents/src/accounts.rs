//! Account registry: the single mutation point for participant balances.
//!
//! The book wrapper returns owned fill events; this registry routes them to
//! the owning participant by id, restores balances when orders cancel, and
//! produces portfolio snapshots. Keeping settlement in one place makes the
//! conservation invariants checkable at a single seam.

use std::collections::HashMap;

use tracing::debug;
use types::{Cash, FillEvent, OpenOrder, OrderSide, ParticipantId, Portfolio, Price, Quantity};

use crate::participant::TradingParticipant;

/// Registry of all participants (clients and bots) in one room.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    participants: HashMap<ParticipantId, TradingParticipant>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant. Replaces any existing entry with the id.
    pub fn register(&mut self, participant: TradingParticipant) {
        self.participants.insert(participant.id(), participant);
    }

    /// Remove a participant, returning its final state.
    pub fn remove(&mut self, id: ParticipantId) -> Option<TradingParticipant> {
        self.participants.remove(&id)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&TradingParticipant> {
        self.participants.get(&id)
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut TradingParticipant> {
        self.participants.get_mut(&id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Apply fill events in order. Fills for unknown owners are dropped
    /// with a debug log; the tick loop never aborts on them.
    pub fn apply_fills(&mut self, fills: &[FillEvent]) {
        for fill in fills {
            match self.participants.get_mut(&fill.owner) {
                Some(participant) => participant.apply_fill(fill),
                None => debug!(owner = %fill.owner, "dropping fill for unknown participant"),
            }
        }
    }

    /// Restore the locked balance of a cancelled order.
    pub fn restore_cancelled(&mut self, open: &OpenOrder) {
        let Some(participant) = self.participants.get_mut(&open.id.owner) else {
            return;
        };
        match open.side {
            OrderSide::Buy => participant.release_buy(open.price, open.quantity),
            OrderSide::Sell => participant.release_sell(open.quantity),
        }
    }

    /// Portfolios for every participant matching `bots`, valued at `price`.
    pub fn portfolios(&self, price: Price, bots: bool) -> Vec<Portfolio> {
        let mut out: Vec<Portfolio> = self
            .participants
            .values()
            .filter(|p| p.is_bot() == bots)
            .map(|p| p.portfolio(price))
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }

    /// Ids of all registered participants.
    pub fn ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.participants.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Sum of net worth across all participants at `price`.
    pub fn total_net_worth(&self, price: Price) -> Cash {
        self.participants.values().map(|p| p.net_worth(price)).sum()
    }

    /// Total shares (held + locked) across all participants.
    pub fn total_shares(&self) -> Quantity {
        self.participants
            .values()
            .map(|p| p.shares() + p.locked_shares())
            .sum()
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
