//! News crate: timed market events and their scheduler.

mod catalog;
mod factory;
mod item;

pub use catalog::{EffectTemplate, NewsDescriptor, CATALOGUE};
pub use factory::{NewsFactory, NewsPublication};
pub use item::{MarketEffect, NewsItem};
