//! Portfolio valuation snapshot for broadcast payloads.

use crate::ids::ParticipantId;
use crate::money::{Cash, Quantity};
use serde::{Deserialize, Serialize};

/// A participant's holdings valued at a reference price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: ParticipantId,
    pub name: String,
    /// Available cash (locked cash is reported once orders settle or cancel).
    pub cash: Cash,
    pub shares: Quantity,
    /// `cash + shares * price - initial_cash`.
    pub pnl: Cash,
}
