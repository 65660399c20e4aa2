//! Order and book-snapshot types.
//!
//! Each room trades a single instrument, so orders carry no symbol; the
//! room's ticker name is presentation-only.

use crate::ids::{OrderId, Timestamp};
use crate::money::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Order Side
// =============================================================================

/// Which side of the market the order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

// =============================================================================
// Order Kind
// =============================================================================

/// Execution rule for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Execute immediately at the best available prices.
    Market,
    /// Execute at the given price or better.
    Limit { price: Price },
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MARKET"),
            OrderKind::Limit { price } => write!(f, "LIMIT@{}", price),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order submitted to the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier (owner embedded).
    pub id: OrderId,
    /// Buy or Sell.
    pub side: OrderSide,
    /// Market or Limit.
    pub kind: OrderKind,
    /// Original number of shares.
    pub quantity: Quantity,
    /// Remaining unfilled quantity.
    pub remaining_quantity: Quantity,
    /// Wall-clock placement time (ms).
    pub timestamp: Timestamp,
}

impl Order {
    /// Create a new limit order.
    pub fn limit(
        id: OrderId,
        side: OrderSide,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            side,
            kind: OrderKind::Limit { price },
            quantity,
            remaining_quantity: quantity,
            timestamp,
        }
    }

    /// Create a new market order.
    pub fn market(id: OrderId, side: OrderSide, quantity: Quantity, timestamp: Timestamp) -> Self {
        Self {
            id,
            side,
            kind: OrderKind::Market,
            quantity,
            remaining_quantity: quantity,
            timestamp,
        }
    }

    /// Get the limit price if this is a limit order.
    pub fn limit_price(&self) -> Option<Price> {
        match self.kind {
            OrderKind::Limit { price } => Some(price),
            OrderKind::Market => None,
        }
    }

    /// Check if the order is fully filled.
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }
}

// =============================================================================
// Open orders (owner's view)
// =============================================================================

/// A live order as seen from its owner's side.
///
/// Carries everything needed to answer "am I already quoting this level"
/// and to restore locked balances on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: OrderId,
    pub side: OrderSide,
    pub price: Price,
    /// Remaining quantity.
    pub quantity: Quantity,
    /// Wall-clock placement time (ms).
    pub placed_at: Timestamp,
}

// =============================================================================
// Book Snapshot
// =============================================================================

/// A single aggregated price level in the order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price at this level.
    pub price: Price,
    /// Total quantity available at this price.
    pub quantity: Quantity,
    /// Number of orders at this level.
    pub order_count: usize,
}

/// Snapshot of the order book at a point in time.
///
/// Bids are highest-first, asks lowest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
}

impl BookSnapshot {
    /// Get the best bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// Get the best ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Mid price between best bid and best ask.
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price((bid.0 + ask.0) / 2)),
            _ => None,
        }
    }

    /// Depth view: `[[price, qty]...]` per side, bids descending, asks
    /// ascending. This is the wire shape of the STOCK_MOVEMENT payload.
    pub fn depth(&self) -> (Vec<(Price, Quantity)>, Vec<(Price, Quantity)>) {
        let bids = self.bids.iter().map(|l| (l.price, l.quantity)).collect();
        let asks = self.asks.iter().map(|l| (l.price, l.quantity)).collect();
        (bids, asks)
    }
}
