//! Error types for sim-core operations.

use std::fmt;
use types::{OrderId, ParticipantId};

/// Result type for sim-core operations.
pub type Result<T> = std::result::Result<T, SimCoreError>;

/// Errors that can occur during book operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCoreError {
    /// The requested order was not found.
    OrderNotFound(OrderId),
    /// Invalid order: zero quantity.
    ZeroQuantity,
    /// Invalid order: non-positive price for limit order.
    InvalidPrice,
    /// The participant has not been registered with the wrapper.
    UnknownParticipant(ParticipantId),
}

impl fmt::Display for SimCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimCoreError::OrderNotFound(id) => write!(f, "order not found: {}", id),
            SimCoreError::ZeroQuantity => write!(f, "order quantity cannot be zero"),
            SimCoreError::InvalidPrice => write!(f, "limit order price must be positive"),
            SimCoreError::UnknownParticipant(id) => {
                write!(f, "participant {} is not registered", id)
            }
        }
    }
}

impl std::error::Error for SimCoreError {}
