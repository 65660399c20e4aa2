//! Order book implementation using BTreeMap for price-time priority.
//!
//! The book maintains buy (bid) and sell (ask) orders organized by price.
//! Within each price level, orders are queued in FIFO order (time priority).

use std::collections::{BTreeMap, HashMap, VecDeque};

use types::{BookLevel, BookSnapshot, Order, OrderId, OrderKind, OrderSide, Price, Quantity, Timestamp};

use crate::error::{Result, SimCoreError};

/// A price level containing orders at a single price point.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    /// Total quantity available at this price.
    pub total_quantity: Quantity,
    /// Orders at this price, in time priority order (FIFO).
    pub orders: VecDeque<Order>,
}

impl PriceLevel {
    /// Add an order to the back of the queue.
    pub fn push(&mut self, order: Order) {
        self.total_quantity += order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Peek at the first order without removing it.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Check if this price level is empty.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders at this price level.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

/// Order book for a single room's instrument.
///
/// Uses `BTreeMap` to maintain price levels in sorted order:
/// - Bids: highest price first (iterating in reverse)
/// - Asks: lowest price first (iterating forward)
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    /// Quick lookup of live orders by id.
    order_index: HashMap<OrderId, (OrderSide, Price)>,
    /// Last trade price.
    last_price: Option<Price>,
}

impl OrderBook {
    /// Create a new empty order book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a limit order to the book.
    ///
    /// Market orders never rest; they must go through the matching engine.
    pub fn add_order(&mut self, order: Order) -> Result<()> {
        if order.remaining_quantity.is_zero() {
            return Err(SimCoreError::ZeroQuantity);
        }

        let price = match order.kind {
            OrderKind::Limit { price } => {
                if !price.is_positive() {
                    return Err(SimCoreError::InvalidPrice);
                }
                price
            }
            OrderKind::Market => return Err(SimCoreError::InvalidPrice),
        };

        self.order_index.insert(order.id, (order.side, price));

        let book_side = match order.side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };
        book_side.entry(price).or_default().push(order);

        Ok(())
    }

    /// Remove an order from the book by id.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order> {
        let (side, price) = self
            .order_index
            .remove(&order_id)
            .ok_or(SimCoreError::OrderNotFound(order_id))?;

        let book_side = match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };

        if let Some(level) = book_side.get_mut(&price) {
            if let Some(pos) = level.orders.iter().position(|o| o.id == order_id) {
                let order = level.orders.remove(pos).expect("position just found");
                level.total_quantity = level.total_quantity.saturating_sub(order.remaining_quantity);
                if level.is_empty() {
                    book_side.remove(&price);
                }
                return Ok(order);
            }
        }

        Err(SimCoreError::OrderNotFound(order_id))
    }

    /// Whether an order id is still live in the book.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.order_index.contains_key(&order_id)
    }

    /// Get the best bid price.
    pub fn best_bid_price(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Get the best ask price.
    pub fn best_ask_price(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Peek at the best bid order: `(order_id, remaining_quantity)`.
    pub fn peek_best_bid_order(&self) -> Option<(OrderId, Quantity)> {
        self.bids
            .iter()
            .next_back()
            .and_then(|(_, level)| level.front())
            .map(|order| (order.id, order.remaining_quantity))
    }

    /// Peek at the best ask order: `(order_id, remaining_quantity)`.
    pub fn peek_best_ask_order(&self) -> Option<(OrderId, Quantity)> {
        self.asks
            .iter()
            .next()
            .and_then(|(_, level)| level.front())
            .map(|order| (order.id, order.remaining_quantity))
    }

    /// Fill (reduce) the best order on `side` by the given quantity,
    /// removing it and cleaning up the level when exhausted.
    pub fn fill_best(&mut self, side: OrderSide, quantity: Quantity) {
        let book_side = match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };
        let entry = match side {
            OrderSide::Buy => book_side.iter_mut().next_back(),
            OrderSide::Sell => book_side.iter_mut().next(),
        };

        let mut removed_order = None;
        let mut empty_level = None;
        if let Some((price, level)) = entry {
            let price = *price;
            let mut pop = false;
            if let Some(order) = level.orders.front_mut() {
                order.remaining_quantity = order.remaining_quantity.saturating_sub(quantity);
                if order.remaining_quantity.is_zero() {
                    removed_order = Some(order.id);
                    pop = true;
                }
            }
            level.total_quantity = level.total_quantity.saturating_sub(quantity);
            if pop {
                level.orders.pop_front();
            }
            if level.is_empty() {
                empty_level = Some(price);
            }
        }

        if let Some(order_id) = removed_order {
            self.order_index.remove(&order_id);
        }
        if let Some(price) = empty_level {
            match side {
                OrderSide::Buy => self.bids.remove(&price),
                OrderSide::Sell => self.asks.remove(&price),
            };
        }
    }

    /// Update the last traded price.
    pub fn set_last_price(&mut self, price: Price) {
        self.last_price = Some(price);
    }

    /// Get the last traded price.
    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    /// Check if the book has any orders.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Number of price levels on the bid side.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of price levels on the ask side.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Total live orders.
    pub fn order_count(&self) -> usize {
        self.order_index.len()
    }

    /// Total remaining quantity for `owner` on `side` at `price`.
    pub fn quantity_for(&self, side: OrderSide, price: Price, owner: types::ParticipantId) -> Quantity {
        let book_side = match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        };
        book_side
            .get(&price)
            .map(|level| {
                level
                    .orders
                    .iter()
                    .filter(|o| o.id.owner == owner)
                    .map(|o| o.remaining_quantity)
                    .sum()
            })
            .unwrap_or(Quantity::ZERO)
    }

    /// Get a snapshot of the current book state (all levels).
    pub fn snapshot(&self, timestamp: Timestamp) -> BookSnapshot {
        let bids: Vec<BookLevel> = self
            .bids
            .iter()
            .rev()
            .map(|(price, level)| BookLevel {
                price: *price,
                quantity: level.total_quantity,
                order_count: level.order_count(),
            })
            .collect();

        let asks: Vec<BookLevel> = self
            .asks
            .iter()
            .map(|(price, level)| BookLevel {
                price: *price,
                quantity: level.total_quantity,
                order_count: level.order_count(),
            })
            .collect();

        BookSnapshot {
            bids,
            asks,
            timestamp,
        }
    }
}
