//! Core identifier types shared across the market simulation.
//!
//! Participants (human clients and bots alike) are identified by a numeric
//! id that is stable for the lifetime of a room. Order ids carry the owning
//! participant so the book wrapper can route fills without a side table.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Separator between the owner and the sequence part of a rendered order id.
pub const ORDER_ID_SEPARATOR: char = '#';

// =============================================================================
// Core ID Types
// =============================================================================

/// Unique identifier for a trading participant (client or bot) within a room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order.
///
/// The owning participant is part of the id, rendered as the prefix before
/// the [`ORDER_ID_SEPARATOR`]; `seq` is a timestamp-derived suffix unique
/// within the owner's orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OrderId {
    /// Participant who placed the order.
    pub owner: ParticipantId,
    /// Per-owner sequence value (derived from the placement timestamp).
    pub seq: u64,
}

impl OrderId {
    /// Create an order id for the given owner and sequence value.
    pub fn new(owner: ParticipantId, seq: u64) -> Self {
        Self { owner, seq }
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.owner, ORDER_ID_SEPARATOR, self.seq)
    }
}

// =============================================================================
// Room / Time Types
// =============================================================================

/// Room identifier (URL path segment chosen by the first client).
pub type RoomId = String;

/// Wall clock timestamp in milliseconds since epoch.
pub type Timestamp = u64;

/// Simulation tick number (discrete market-update step, nominally 200 ms).
pub type Tick = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_display_carries_owner_prefix() {
        let id = OrderId::new(ParticipantId(7), 1_690_000_123);
        assert_eq!(id.to_string(), "7#1690000123");
    }

    #[test]
    fn order_ids_with_same_owner_differ_by_seq() {
        let a = OrderId::new(ParticipantId(1), 10);
        let b = OrderId::new(ParticipantId(1), 11);
        assert_ne!(a, b);
        assert_eq!(a.owner, b.owner);
    }
}
