//! Fill events emitted by the book wrapper and applied by the accounts
//! registry.

use crate::ids::{OrderId, ParticipantId};
use crate::money::{Cash, Price};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A settlement against one participant's order at a single price level.
///
/// Sign convention: buy fills carry `quantity > 0` and `cost > 0`; sell
/// fills carry both negative. The sign alone routes the settlement, so the
/// accounts registry needs no second side parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    /// Participant whose balances settle.
    pub owner: ParticipantId,
    /// Order the fill belongs to.
    pub order_id: OrderId,
    /// Execution price for this slice.
    pub price: Price,
    /// Shares filled, signed by side.
    pub quantity: i64,
    /// Cash moved, signed by side (`price * |quantity|`, negated for sells).
    pub cost: Cash,
    /// Cash unlocked by this fill. For buys this is the slice's share of
    /// the originally locked amount (`lock_basis * quantity`); when a buy
    /// executes below its limit the difference returns to available cash.
    /// Zero for sell fills (shares carry the lock there).
    pub lock_release: Cash,
}

impl FillEvent {
    /// Build a buy-side settlement. `lock_basis` is the price at which the
    /// order's cash was locked (the limit price, or the execution price for
    /// budget-tracked market orders).
    pub fn buy(
        owner: ParticipantId,
        order_id: OrderId,
        price: Price,
        quantity: u64,
        lock_basis: Price,
    ) -> Self {
        Self {
            owner,
            order_id,
            price,
            quantity: quantity as i64,
            cost: Cash(price.raw() * quantity as i64),
            lock_release: Cash(lock_basis.raw() * quantity as i64),
        }
    }

    /// Build a sell-side settlement.
    pub fn sell(owner: ParticipantId, order_id: OrderId, price: Price, quantity: u64) -> Self {
        Self {
            owner,
            order_id,
            price,
            quantity: -(quantity as i64),
            cost: Cash(-(price.raw() * quantity as i64)),
            lock_release: Cash::ZERO,
        }
    }

    /// Whether this fill settles a buy.
    pub fn is_buy(&self) -> bool {
        self.cost.is_positive()
    }

    /// Unsigned filled quantity.
    pub fn unsigned_quantity(&self) -> u64 {
        self.quantity.unsigned_abs()
    }
}

impl fmt::Display for FillEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = if self.is_buy() { "BUY" } else { "SELL" };
        write!(
            f,
            "Fill[{}] {} {} @ {}",
            self.order_id,
            side,
            self.unsigned_quantity(),
            self.price
        )
    }
}
