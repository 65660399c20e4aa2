//! Trading-participant accounting.
//!
//! Humans and bots share the same balance model: available and locked
//! cash, held and locked shares. Placing an order moves the resource it
//! would consume from available to locked; fills settle out of the locked
//! pool; cancellations move it back. After any operation all four balances
//! are non-negative.

use types::{Cash, FillEvent, ParticipantId, Portfolio, Price, Quantity};

/// Why an order placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    /// Trading is disabled for this participant (e.g. an active power).
    Disabled,
    /// Not enough available cash to cover the order.
    InsufficientCash,
    /// Not enough held shares to cover the order.
    InsufficientShares,
}

impl std::fmt::Display for PlaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceError::Disabled => write!(f, "trading disabled"),
            PlaceError::InsufficientCash => write!(f, "insufficient cash"),
            PlaceError::InsufficientShares => write!(f, "insufficient shares"),
        }
    }
}

impl std::error::Error for PlaceError {}

/// Cash/share balances for one market participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingParticipant {
    id: ParticipantId,
    name: String,
    initial_cash: Cash,
    available_cash: Cash,
    locked_cash: Cash,
    shares: Quantity,
    locked_shares: Quantity,
    trading_disabled: bool,
    is_bot: bool,
}

impl TradingParticipant {
    /// Create a participant with the given starting cash and no shares.
    pub fn new(id: ParticipantId, name: impl Into<String>, initial_cash: Cash, is_bot: bool) -> Self {
        Self {
            id,
            name: name.into(),
            initial_cash,
            available_cash: initial_cash,
            locked_cash: Cash::ZERO,
            shares: Quantity::ZERO,
            locked_shares: Quantity::ZERO,
            trading_disabled: false,
            is_bot,
        }
    }

    /// Seed an initial share position (test scenarios and bot spawning).
    pub fn with_shares(mut self, shares: Quantity) -> Self {
        self.shares = shares;
        self
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bot(&self) -> bool {
        self.is_bot
    }

    pub fn initial_cash(&self) -> Cash {
        self.initial_cash
    }

    pub fn available_cash(&self) -> Cash {
        self.available_cash
    }

    pub fn locked_cash(&self) -> Cash {
        self.locked_cash
    }

    pub fn shares(&self) -> Quantity {
        self.shares
    }

    pub fn locked_shares(&self) -> Quantity {
        self.locked_shares
    }

    pub fn trading_disabled(&self) -> bool {
        self.trading_disabled
    }

    pub fn set_trading_disabled(&mut self, disabled: bool) {
        self.trading_disabled = disabled;
    }

    /// Credit cash directly (power payouts).
    pub fn grant_cash(&mut self, amount: Cash) {
        self.available_cash += amount;
    }

    /// Reserve cash for a buy order. Returns the locked amount, which
    /// doubles as the budget for market buys.
    pub fn place_buy(&mut self, price: Price, quantity: Quantity) -> Result<Cash, PlaceError> {
        if self.trading_disabled {
            return Err(PlaceError::Disabled);
        }
        let cost = price * quantity;
        if self.available_cash < cost {
            return Err(PlaceError::InsufficientCash);
        }
        self.available_cash -= cost;
        self.locked_cash += cost;
        Ok(cost)
    }

    /// Reserve shares for a sell order.
    pub fn place_sell(&mut self, quantity: Quantity) -> Result<(), PlaceError> {
        if self.trading_disabled {
            return Err(PlaceError::Disabled);
        }
        if self.shares < quantity {
            return Err(PlaceError::InsufficientShares);
        }
        self.shares -= quantity;
        self.locked_shares += quantity;
        Ok(())
    }

    /// Settle a fill. Buy fills consume locked cash (returning any excess
    /// over the execution cost to available) and credit shares; sell fills
    /// consume locked shares and credit the proceeds.
    pub fn apply_fill(&mut self, fill: &FillEvent) {
        if fill.is_buy() {
            self.locked_cash -= fill.lock_release;
            self.available_cash += fill.lock_release - fill.cost;
            self.shares += Quantity(fill.unsigned_quantity());
        } else {
            // cost is negative for sells; subtracting adds the proceeds.
            self.available_cash -= fill.cost;
            self.locked_shares = self.locked_shares.saturating_sub(Quantity(fill.unsigned_quantity()));
        }
        debug_assert!(!self.available_cash.is_negative());
        debug_assert!(!self.locked_cash.is_negative());
    }

    /// Return a cancelled buy order's cash to available.
    pub fn release_buy(&mut self, price: Price, quantity: Quantity) {
        let amount = price * quantity;
        self.release_cash(amount);
    }

    /// Return locked cash to available (cancelled or unfilled buys).
    pub fn release_cash(&mut self, amount: Cash) {
        let amount = amount.min(self.locked_cash);
        self.locked_cash -= amount;
        self.available_cash += amount;
    }

    /// Return a cancelled sell order's shares to the held pool.
    pub fn release_sell(&mut self, quantity: Quantity) {
        let quantity = quantity.min(self.locked_shares);
        self.locked_shares -= quantity;
        self.shares += quantity;
    }

    /// Holdings valued at `current_price`.
    pub fn portfolio(&self, current_price: Price) -> Portfolio {
        Portfolio {
            id: self.id,
            name: self.name.clone(),
            cash: self.available_cash,
            shares: self.shares,
            pnl: self.available_cash + self.shares * current_price - self.initial_cash,
        }
    }

    /// Total wealth including locked balances, valued at `price`.
    /// Conservation checks sum this across participants.
    pub fn net_worth(&self, price: Price) -> Cash {
        self.available_cash + self.locked_cash + (self.shares + self.locked_shares) * price
    }
}
