//! Book wrapper: per-participant order tracking and fill routing.
//!
//! The wrapper owns the real matching book plus one [`ClientBook`] per
//! registered participant. Every mutation keeps the two in lockstep: for
//! any live order in the matching book there is exactly one entry in its
//! owner's client book with the same remaining quantity, and vice versa.
//! It also maintains room-level aggregates (volume traded, session high
//! and low).

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use types::{
    BookSnapshot, Cash, FillEvent, OpenOrder, Order, OrderId, OrderSide, ParticipantId, Price,
    Quantity, Timestamp,
};

use crate::error::{Result, SimCoreError};
use crate::matching::{match_order_budgeted, MakerFill};
use crate::order_book::OrderBook;

// =============================================================================
// Per-participant open orders
// =============================================================================

/// One participant's live orders, indexed by side and price.
///
/// Answers "do I already quote price P on side S" and carries the data
/// needed to restore locked balances on cancellation.
#[derive(Debug, Clone, Default)]
pub struct ClientBook {
    bids: BTreeMap<Price, Vec<OpenOrder>>,
    asks: BTreeMap<Price, Vec<OpenOrder>>,
}

impl ClientBook {
    fn side(&self, side: OrderSide) -> &BTreeMap<Price, Vec<OpenOrder>> {
        match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: OrderSide) -> &mut BTreeMap<Price, Vec<OpenOrder>> {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }

    fn add(&mut self, order: OpenOrder) {
        self.side_mut(order.side).entry(order.price).or_default().push(order);
    }

    /// Reduce a live entry after a partial fill; removes it when exhausted.
    fn reduce(&mut self, side: OrderSide, price: Price, id: OrderId, by: Quantity) {
        let levels = self.side_mut(side);
        if let Some(orders) = levels.get_mut(&price) {
            if let Some(entry) = orders.iter_mut().find(|o| o.id == id) {
                entry.quantity = entry.quantity.saturating_sub(by);
                if entry.quantity.is_zero() {
                    orders.retain(|o| o.id != id);
                }
            }
            if orders.is_empty() {
                levels.remove(&price);
            }
        }
    }

    fn remove(&mut self, side: OrderSide, price: Price, id: OrderId) -> Option<OpenOrder> {
        let levels = self.side_mut(side);
        let orders = levels.get_mut(&price)?;
        let pos = orders.iter().position(|o| o.id == id)?;
        let removed = orders.remove(pos);
        if orders.is_empty() {
            levels.remove(&price);
        }
        Some(removed)
    }

    /// Whether this participant already has a live order at `price`.
    pub fn has_order_at(&self, side: OrderSide, price: Price) -> bool {
        self.side(side).contains_key(&price)
    }

    /// Whether this participant has any live order on `side`.
    pub fn has_orders(&self, side: OrderSide) -> bool {
        !self.side(side).is_empty()
    }

    /// Number of distinct price levels quoted on `side`.
    pub fn level_count(&self, side: OrderSide) -> usize {
        self.side(side).len()
    }

    /// All live orders on `side`, ascending by price.
    pub fn orders(&self, side: OrderSide) -> impl Iterator<Item = &OpenOrder> {
        self.side(side).values().flatten()
    }

    /// All live orders on both sides.
    pub fn all_orders(&self) -> impl Iterator<Item = &OpenOrder> {
        self.bids.values().flatten().chain(self.asks.values().flatten())
    }

    /// Total remaining quantity quoted at `price` on `side`.
    pub fn quantity_at(&self, side: OrderSide, price: Price) -> Quantity {
        self.side(side)
            .get(&price)
            .map(|orders| orders.iter().map(|o| o.quantity).sum())
            .unwrap_or(Quantity::ZERO)
    }

    fn drain(&mut self) -> Vec<OpenOrder> {
        let mut all: Vec<OpenOrder> = self.bids.values().flatten().copied().collect();
        all.extend(self.asks.values().flatten().copied());
        self.bids.clear();
        self.asks.clear();
        all
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of submitting a limit order.
#[derive(Debug, Clone)]
pub struct LimitResult {
    pub order_id: OrderId,
    /// Settlements in execution order (maker slice, then taker slice).
    pub fills: Vec<FillEvent>,
    /// Quantity left resting in the book.
    pub resting_quantity: Quantity,
}

/// Result of submitting a market order.
///
/// `total_cost`/`total_quantity` aggregate the executed slices and are
/// available to the caller before it applies the fills (the totals hook of
/// the market-order contract). `leftover` is returned to the caller so it
/// can restore the unused locked balance.
#[derive(Debug, Clone)]
pub struct MarketResult {
    pub order_id: OrderId,
    pub fills: Vec<FillEvent>,
    pub total_cost: Cash,
    pub total_quantity: Quantity,
    pub leftover: Quantity,
}

// =============================================================================
// OrderBookWrapper
// =============================================================================

/// The matching book plus per-participant tracking and room aggregates.
#[derive(Debug, Clone, Default)]
pub struct OrderBookWrapper {
    book: OrderBook,
    client_books: HashMap<ParticipantId, ClientBook>,
    total_value_traded: Cash,
    highest_price: Option<Price>,
    lowest_price: Option<Price>,
}

impl OrderBookWrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant so fills and per-client tracking can route
    /// to it. Idempotent.
    pub fn register_participant(&mut self, id: ParticipantId) {
        self.client_books.entry(id).or_default();
    }

    /// Whether the participant has been registered.
    pub fn is_registered(&self, id: ParticipantId) -> bool {
        self.client_books.contains_key(&id)
    }

    /// Submit a limit order: match immediately, rest the remainder.
    ///
    /// The quoted price is rounded to a whole cent on entry.
    pub fn add_limit(
        &mut self,
        owner: ParticipantId,
        seq: u64,
        side: OrderSide,
        price: Price,
        quantity: Quantity,
        now: Timestamp,
    ) -> Result<LimitResult> {
        if quantity.is_zero() {
            return Err(SimCoreError::ZeroQuantity);
        }
        if !price.is_positive() {
            return Err(SimCoreError::InvalidPrice);
        }
        if !self.is_registered(owner) {
            return Err(SimCoreError::UnknownParticipant(owner));
        }

        let price = price.to_tick();
        let order_id = OrderId::new(owner, seq);
        let mut order = Order::limit(order_id, side, price, quantity, now);

        let matched = match_order_budgeted(&mut self.book, &mut order, None);
        let fills = self.settle(owner, order_id, side, price, &matched.fills);

        let resting_quantity = order.remaining_quantity;
        if !resting_quantity.is_zero() {
            // The residual rests at the quoted price on both books.
            self.book
                .add_order(order)
                .expect("validated residual limit order");
            self.client_books
                .get_mut(&owner)
                .expect("registered above")
                .add(OpenOrder {
                    id: order_id,
                    side,
                    price,
                    quantity: resting_quantity,
                    placed_at: now,
                });
        }

        Ok(LimitResult {
            order_id,
            fills,
            resting_quantity,
        })
    }

    /// Submit a market order. Never rests; returns executed totals and the
    /// unfilled leftover. `budget` bounds total cost for buys (the amount
    /// the caller locked at the best ask).
    pub fn add_market(
        &mut self,
        owner: ParticipantId,
        seq: u64,
        side: OrderSide,
        quantity: Quantity,
        budget: Option<Cash>,
        now: Timestamp,
    ) -> Result<MarketResult> {
        if quantity.is_zero() {
            return Err(SimCoreError::ZeroQuantity);
        }
        if !self.is_registered(owner) {
            return Err(SimCoreError::UnknownParticipant(owner));
        }

        let order_id = OrderId::new(owner, seq);
        let mut order = Order::market(order_id, side, quantity, now);
        let matched = match_order_budgeted(&mut self.book, &mut order, budget);

        let total_quantity = matched.filled_quantity();
        let total_cost: Cash = matched.fills.iter().map(|f| f.price * f.quantity).sum();
        // Market taker slices release exactly what they cost.
        let fills = self.settle_market(owner, order_id, side, &matched.fills);

        Ok(MarketResult {
            order_id,
            fills,
            total_cost,
            total_quantity,
            leftover: matched.remaining_quantity,
        })
    }

    /// Cancel a live order. Idempotent: unknown or already-gone ids return
    /// `None`. Returns the removed entry so the caller can restore the
    /// locked balance.
    pub fn cancel(&mut self, order_id: OrderId) -> Option<OpenOrder> {
        let order = match self.book.cancel_order(order_id) {
            Ok(order) => order,
            Err(_) => return None,
        };
        let price = order.limit_price().expect("resting orders are limits");
        self.client_books
            .get_mut(&order_id.owner)
            .and_then(|cb| cb.remove(order.side, price, order_id))
    }

    /// Cancel every live order belonging to `owner`, returning the removed
    /// entries. Used at room disposal and when a participant is dropped.
    pub fn cancel_all(&mut self, owner: ParticipantId) -> Vec<OpenOrder> {
        let Some(client_book) = self.client_books.get_mut(&owner) else {
            return Vec::new();
        };
        let orders = client_book.drain();
        for open in &orders {
            let _ = self.book.cancel_order(open.id);
        }
        orders
    }

    /// Maker+taker settlement for a limit order's matched slices.
    fn settle(
        &mut self,
        taker: ParticipantId,
        taker_order: OrderId,
        taker_side: OrderSide,
        lock_basis: Price,
        slices: &[MakerFill],
    ) -> Vec<FillEvent> {
        let mut events = Vec::with_capacity(slices.len() * 2);
        for slice in slices {
            self.reconcile_maker(taker_side.opposite(), slice);
            self.record_trade(slice.price, slice.quantity);
            events.push(self.maker_event(taker_side.opposite(), slice));
            events.push(match taker_side {
                OrderSide::Buy => FillEvent::buy(
                    taker,
                    taker_order,
                    slice.price,
                    slice.quantity.raw(),
                    lock_basis,
                ),
                OrderSide::Sell => {
                    FillEvent::sell(taker, taker_order, slice.price, slice.quantity.raw())
                }
            });
        }
        events
    }

    /// Same as [`settle`], but taker buy slices release at execution price
    /// (the caller reconciles the unused market budget separately).
    fn settle_market(
        &mut self,
        taker: ParticipantId,
        taker_order: OrderId,
        taker_side: OrderSide,
        slices: &[MakerFill],
    ) -> Vec<FillEvent> {
        let mut events = Vec::with_capacity(slices.len() * 2);
        for slice in slices {
            self.reconcile_maker(taker_side.opposite(), slice);
            self.record_trade(slice.price, slice.quantity);
            events.push(self.maker_event(taker_side.opposite(), slice));
            events.push(match taker_side {
                OrderSide::Buy => FillEvent::buy(
                    taker,
                    taker_order,
                    slice.price,
                    slice.quantity.raw(),
                    slice.price,
                ),
                OrderSide::Sell => {
                    FillEvent::sell(taker, taker_order, slice.price, slice.quantity.raw())
                }
            });
        }
        events
    }

    /// Shrink or remove the maker's per-client entry for a slice.
    fn reconcile_maker(&mut self, maker_side: OrderSide, slice: &MakerFill) {
        let maker = slice.order_id.owner;
        let Some(client_book) = self.client_books.get_mut(&maker) else {
            debug!(%maker, "fill against unregistered maker");
            return;
        };
        if slice.maker_done {
            client_book.remove(maker_side, slice.price, slice.order_id);
        } else {
            client_book.reduce(maker_side, slice.price, slice.order_id, slice.quantity);
        }
    }

    fn maker_event(&self, maker_side: OrderSide, slice: &MakerFill) -> FillEvent {
        let maker = slice.order_id.owner;
        match maker_side {
            // Maker limit orders execute exactly at their quoted price, so
            // the lock basis is the execution price.
            OrderSide::Buy => FillEvent::buy(
                maker,
                slice.order_id,
                slice.price,
                slice.quantity.raw(),
                slice.price,
            ),
            OrderSide::Sell => {
                FillEvent::sell(maker, slice.order_id, slice.price, slice.quantity.raw())
            }
        }
    }

    fn record_trade(&mut self, price: Price, quantity: Quantity) {
        self.total_value_traded += price * quantity;
        self.highest_price = Some(match self.highest_price {
            Some(high) => high.max(price),
            None => price,
        });
        self.lowest_price = Some(match self.lowest_price {
            Some(low) => low.min(price),
            None => price,
        });
    }

    /// Snapshot of the matching book.
    pub fn snapshot(&self, now: Timestamp) -> BookSnapshot {
        self.book.snapshot(now)
    }

    /// Best bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid_price()
    }

    /// Best ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask_price()
    }

    /// Last traded price.
    pub fn last_trade_price(&self) -> Option<Price> {
        self.book.last_price()
    }

    /// A participant's live orders.
    pub fn client_book(&self, id: ParticipantId) -> Option<&ClientBook> {
        self.client_books.get(&id)
    }

    /// Total value traded through this book.
    pub fn total_value_traded(&self) -> Cash {
        self.total_value_traded
    }

    /// Highest execution price seen.
    pub fn highest_price(&self) -> Option<Price> {
        self.highest_price
    }

    /// Lowest execution price seen.
    pub fn lowest_price(&self) -> Option<Price> {
        self.lowest_price
    }

    /// Check the book/client-book quantity agreement for one participant.
    /// Test support for the wrapper's core invariant.
    pub fn books_agree_for(&self, owner: ParticipantId) -> bool {
        let Some(client_book) = self.client_books.get(&owner) else {
            return true;
        };
        for side in [OrderSide::Buy, OrderSide::Sell] {
            for (price, orders) in client_book.side(side) {
                let client_qty: Quantity = orders.iter().map(|o| o.quantity).sum();
                if self.book.quantity_for(side, *price, owner) != client_qty {
                    return false;
                }
            }
        }
        // Every client-book entry must still be live in the matching book.
        client_book.all_orders().all(|o| self.book.contains(o.id))
    }
}
