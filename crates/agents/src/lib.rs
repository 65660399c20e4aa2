//! Agents crate: participant accounting and trading-bot strategies.
//!
//! This crate provides:
//! - [`TradingParticipant`]: locked/available cash and share accounting
//!   shared by human clients and bots
//! - [`Accounts`]: the registry that applies fill events and restores
//!   cancelled orders
//! - [`Strategy`] and [`BotContext`]: the decision contract bots implement
//! - The seven canonical strategies under [`strategies`]

mod accounts;
mod context;
mod participant;
pub mod strategies;

pub use accounts::Accounts;
pub use context::BotContext;
pub use participant::{PlaceError, TradingParticipant};
pub use strategies::{bot_catalogue, BotAction, BotDescriptor, BotKind, Strategy};
