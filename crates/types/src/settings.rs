//! Game settings with clamped partial updates.
//!
//! Settings arrive from the admin client as a partial patch; every value is
//! coerced into its documented range before it is stored, so the rest of
//! the system never revalidates.

use crate::money::{Cash, Price};
use serde::{Deserialize, Serialize};

/// Upper bound on the bot population per room.
pub const MAX_BOTS: u32 = 50;

/// Settings for a single room's game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Cash every participant starts with.
    pub starting_cash: Cash,
    /// Opening guide/intrinsic price.
    pub opening_price: Price,
    /// PRNG seed. Zero is a valid seed, not "unset".
    pub seed: u64,
    /// Market volatility as entered, in percent.
    pub market_volatility: f64,
    /// Game duration in minutes.
    pub game_duration: u32,
    /// Whether random news events fire during the game.
    pub enable_random_news: bool,
    /// Number of bots to spawn.
    pub bots: u32,
    /// Display ticker name ("ticketName" on the wire, a fossil of the
    /// original protocol).
    #[serde(rename = "ticketName")]
    pub ticker_name: String,
    /// Restrict spawned bots to these strategy names (None = all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_selection: Option<Vec<String>>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_cash: Cash::from_float(10_000.0),
            opening_price: Price::from_float(1.0),
            seed: 42,
            market_volatility: 5.0,
            game_duration: 5,
            enable_random_news: true,
            bots: 0,
            ticker_name: "AAPL".to_string(),
            bot_selection: None,
        }
    }
}

/// Partial settings update sent by the admin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub starting_cash: Option<f64>,
    pub opening_price: Option<f64>,
    pub seed: Option<u64>,
    pub market_volatility: Option<f64>,
    pub game_duration: Option<u32>,
    pub enable_random_news: Option<bool>,
    pub bots: Option<i64>,
    #[serde(rename = "ticketName")]
    pub ticker_name: Option<String>,
    pub bot_selection: Option<Vec<String>>,
}

impl GameSettings {
    /// Apply a partial update, clamping every value into its legal range.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(cash) = patch.starting_cash {
            self.starting_cash = Cash::from_float(cash.clamp(0.0, 999_999_999.0));
        }
        if let Some(price) = patch.opening_price {
            self.opening_price = Price::from_float(price.clamp(0.01, 10_000.0));
        }
        if let Some(seed) = patch.seed {
            self.seed = seed;
        }
        if let Some(vol) = patch.market_volatility {
            self.market_volatility = vol;
        }
        if let Some(minutes) = patch.game_duration {
            self.game_duration = minutes.clamp(1, 60);
        }
        if let Some(news) = patch.enable_random_news {
            self.enable_random_news = news;
        }
        if let Some(bots) = patch.bots {
            self.bots = bots.clamp(0, MAX_BOTS as i64) as u32;
        }
        if let Some(ticker) = patch.ticker_name {
            self.ticker_name = ticker;
        }
        if let Some(selection) = patch.bot_selection {
            self.bot_selection = if selection.is_empty() {
                None
            } else {
                Some(selection)
            };
        }
    }

    /// Effective per-tick volatility as a fraction.
    ///
    /// The entered percentage is coerced into `[0.001, 1]` and divided by
    /// 100, so 0 becomes 0.00001 and anything above 1 caps at 0.01.
    pub fn volatility_fraction(&self) -> f64 {
        self.market_volatility.clamp(0.001, 1.0) / 100.0
    }

    /// Game duration in milliseconds.
    pub fn game_duration_ms(&self) -> u64 {
        self.game_duration as u64 * 60 * 1_000
    }
}
