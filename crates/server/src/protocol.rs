//! The numeric-tag JSON wire protocol.
//!
//! Every frame is a JSON object with a numeric `type`; the tag values are
//! part of the wire contract and must not change. Outbound messages are
//! built as `serde_json::Value`s; inbound frames parse into
//! [`ClientMessage`], with malformed or unknown frames yielding `None` so
//! the handler can drop them silently.

use serde_json::{json, Value};
use types::{
    BookSnapshot, GameSettings, ParticipantId, Portfolio, Price, SettingsPatch, Timestamp,
};

/// Wire tags. Negative and sparse values are part of the contract.
pub mod tag {
    pub const ID: i64 = -1;
    pub const JOIN: i64 = 0;
    pub const LEAVE: i64 = 1;
    pub const IS_ADMIN: i64 = 2;
    pub const TOGGLE_PAUSE: i64 = 3;
    pub const MESSAGE: i64 = 4;
    pub const ERROR: i64 = 5;
    pub const PING: i64 = 6;
    pub const PONG: i64 = 7;
    pub const CLOCK: i64 = 8;
    pub const ROOM_STATE: i64 = 9;
    pub const STOCK_ACTION: i64 = 10;
    pub const STOCK_MOVEMENT: i64 = 11;
    pub const PORTFOLIO_UPDATE: i64 = 12;
    pub const SHOCK: i64 = 13;
    pub const NEWS: i64 = 14;
    pub const NOTIFICATION: i64 = 15;
    pub const CLIENT_STATE: i64 = 16;
    pub const ADMIN_SETTINGS: i64 = 30;
    pub const GAME_CONCLUSION: i64 = 60;
    pub const POWER_OFFERS: i64 = 80;
    pub const POWER_SELECT: i64 = 81;
    pub const POWER_CONSUME: i64 = 82;
    pub const POWER_INVENTORY: i64 = 83;
    pub const DEBUG_PRICES: i64 = 99;
}

// =============================================================================
// Inbound
// =============================================================================

/// Trading action side as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockSide {
    Buy,
    Sell,
}

/// Order type as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOrderType {
    Limit,
    Market,
}

/// Admin shock target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShockTarget {
    Intrinsic,
    Market,
}

/// A parsed client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    TogglePause,
    Chat { content: String },
    Ping,
    Pong,
    StockAction {
        side: StockSide,
        order_type: StockOrderType,
        quantity: u64,
        price: Option<f64>,
    },
    Shock { target: ShockTarget },
    AdminSettings { settings: SettingsPatch },
    PowerSelect { index: usize },
    PowerConsume { id: u64 },
}

impl ClientMessage {
    /// Parse one inbound frame. Returns `None` for anything malformed,
    /// unknown, or not a client-to-server tag; the caller drops those.
    pub fn parse(text: &str) -> Option<ClientMessage> {
        let value: Value = serde_json::from_str(text).ok()?;
        let tag = value.get("type")?.as_i64()?;
        match tag {
            tag::TOGGLE_PAUSE => Some(ClientMessage::TogglePause),
            tag::MESSAGE => Some(ClientMessage::Chat {
                content: value.get("content")?.as_str()?.to_string(),
            }),
            tag::PING => Some(ClientMessage::Ping),
            tag::PONG => Some(ClientMessage::Pong),
            tag::STOCK_ACTION => {
                let side = match value.get("action")?.as_str()? {
                    "BUY" => StockSide::Buy,
                    "SELL" => StockSide::Sell,
                    _ => return None,
                };
                let order_type = match value.get("orderType")?.as_str()? {
                    "LIMIT" => StockOrderType::Limit,
                    "MARKET" => StockOrderType::Market,
                    _ => return None,
                };
                let quantity = value.get("quantity")?.as_u64()?;
                let price = value.get("price").and_then(Value::as_f64);
                Some(ClientMessage::StockAction {
                    side,
                    order_type,
                    quantity,
                    price,
                })
            }
            tag::SHOCK => {
                let target = match value.get("target")?.as_str()? {
                    "intrinsic" => ShockTarget::Intrinsic,
                    "market" => ShockTarget::Market,
                    _ => return None,
                };
                Some(ClientMessage::Shock { target })
            }
            tag::ADMIN_SETTINGS => {
                let settings = serde_json::from_value(value.get("settings")?.clone()).ok()?;
                Some(ClientMessage::AdminSettings { settings })
            }
            tag::POWER_SELECT => Some(ClientMessage::PowerSelect {
                index: value.get("index")?.as_u64()? as usize,
            }),
            tag::POWER_CONSUME => Some(ClientMessage::PowerConsume {
                id: value.get("id")?.as_u64()?,
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Notification severity for tag 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationLevel {
    fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
            NotificationLevel::Success => "success",
        }
    }
}

/// Settings in wire units (floats in dollars, not fixed-point raws).
pub fn settings_json(settings: &GameSettings) -> Value {
    json!({
        "startingCash": settings.starting_cash.to_float(),
        "openingPrice": settings.opening_price.to_float(),
        "seed": settings.seed,
        "marketVolatility": settings.market_volatility,
        "gameDuration": settings.game_duration,
        "enableRandomNews": settings.enable_random_news,
        "bots": settings.bots,
        "ticketName": settings.ticker_name,
        "botSelection": settings.bot_selection,
    })
}

fn portfolio_json(portfolio: &Portfolio) -> Value {
    json!({
        "cash": portfolio.cash.to_float(),
        "shares": portfolio.shares.raw(),
        "pnl": portfolio.pnl.to_float(),
    })
}

fn depth_json(snapshot: &BookSnapshot) -> Value {
    let (bids, asks) = snapshot.depth();
    let encode = |levels: Vec<(Price, types::Quantity)>| -> Value {
        levels
            .into_iter()
            .map(|(p, q)| json!([p.to_float(), q.raw()]))
            .collect()
    };
    json!([encode(bids), encode(asks)])
}

/// Outbound frame builders. Kept as free functions returning `Value` so
/// call sites read like the wire contract table.
pub mod out {
    use super::*;

    pub fn id(token: &str) -> Value {
        json!({"type": tag::ID, "id": token})
    }

    pub fn join(room_id: &str, id: ParticipantId, username: &str) -> Value {
        json!({"type": tag::JOIN, "roomId": room_id, "id": id.0, "username": username})
    }

    pub fn leave(room_id: &str, id: ParticipantId) -> Value {
        json!({"type": tag::LEAVE, "roomId": room_id, "id": id.0})
    }

    pub fn is_admin() -> Value {
        json!({"type": tag::IS_ADMIN})
    }

    pub fn toggle_pause() -> Value {
        json!({"type": tag::TOGGLE_PAUSE})
    }

    pub fn chat(room_id: &str, id: ParticipantId, content: &str) -> Value {
        json!({"type": tag::MESSAGE, "roomId": room_id, "id": id.0, "content": content})
    }

    pub fn error(message: &str) -> Value {
        json!({"type": tag::ERROR, "message": message})
    }

    pub fn ping() -> Value {
        json!({"type": tag::PING})
    }

    pub fn pong() -> Value {
        json!({"type": tag::PONG})
    }

    pub fn clock(value: Timestamp, time_left_ms: u64) -> Value {
        json!({"type": tag::CLOCK, "value": value, "timeLeft": time_left_ms})
    }

    #[allow(clippy::too_many_arguments)]
    pub fn room_state(
        room_id: &str,
        paused: bool,
        started: bool,
        ended: bool,
        settings: &GameSettings,
        clock: Timestamp,
        clients: Value,
        price: Price,
    ) -> Value {
        json!({
            "type": tag::ROOM_STATE,
            "roomId": room_id,
            "paused": paused,
            "started": started,
            "ended": ended,
            "settings": settings_json(settings),
            "clock": clock,
            "clients": clients,
            "price": price.to_float(),
        })
    }

    pub fn stock_movement(price: Price, snapshot: &BookSnapshot) -> Value {
        json!({
            "type": tag::STOCK_MOVEMENT,
            "price": price.to_float(),
            "depth": depth_json(snapshot),
        })
    }

    pub fn portfolio_update(portfolio: &Portfolio) -> Value {
        json!({
            "type": tag::PORTFOLIO_UPDATE,
            "id": portfolio.id.0,
            "value": portfolio_json(portfolio),
        })
    }

    pub fn news(title: &str, description: &str, duration_ticks: u32, timestamp: Timestamp) -> Value {
        json!({
            "type": tag::NEWS,
            "title": title,
            "description": description,
            "durationTicks": duration_ticks,
            "timestamp": timestamp,
        })
    }

    pub fn notification(level: NotificationLevel, title: &str, description: Option<&str>) -> Value {
        json!({
            "type": tag::NOTIFICATION,
            "level": level.as_str(),
            "title": title,
            "description": description,
        })
    }

    pub fn client_state(disabled: bool) -> Value {
        json!({"type": tag::CLIENT_STATE, "disabled": disabled})
    }

    pub fn game_conclusion(
        players: &[Portfolio],
        bots: &[Portfolio],
        volume_traded: f64,
        highest_price: Option<Price>,
        lowest_price: Option<Price>,
    ) -> Value {
        let encode = |list: &[Portfolio]| -> Value {
            list.iter()
                .map(|p| {
                    json!({
                        "id": p.id.0,
                        "name": p.name,
                        "cash": p.cash.to_float(),
                        "shares": p.shares.raw(),
                        "pnl": p.pnl.to_float(),
                    })
                })
                .collect()
        };
        json!({
            "type": tag::GAME_CONCLUSION,
            "players": encode(players),
            "bots": encode(bots),
            "volumeTraded": volume_traded,
            "highestPrice": highest_price.map(|p| p.to_float()),
            "lowestPrice": lowest_price.map(|p| p.to_float()),
        })
    }

    pub fn power_offers(powers: Value) -> Value {
        json!({"type": tag::POWER_OFFERS, "powers": powers})
    }

    pub fn power_inventory(powers: Value) -> Value {
        json!({"type": tag::POWER_INVENTORY, "powers": powers})
    }

    pub fn debug_prices(intrinsic: Price, guide: Price) -> Value {
        json!({
            "type": tag::DEBUG_PRICES,
            "intrinsicValue": intrinsic.to_float(),
            "guidePrice": guide.to_float(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stock_action() {
        let message = ClientMessage::parse(
            r#"{"type":10,"action":"BUY","orderType":"LIMIT","quantity":25,"price":1.5}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            ClientMessage::StockAction {
                side: StockSide::Buy,
                order_type: StockOrderType::Limit,
                quantity: 25,
                price: Some(1.5),
            }
        );
    }

    #[test]
    fn parses_market_action_without_price() {
        let message =
            ClientMessage::parse(r#"{"type":10,"action":"SELL","orderType":"MARKET","quantity":5}"#)
                .unwrap();
        assert_eq!(
            message,
            ClientMessage::StockAction {
                side: StockSide::Sell,
                order_type: StockOrderType::Market,
                quantity: 5,
                price: None,
            }
        );
    }

    #[test]
    fn malformed_and_unknown_frames_drop() {
        assert_eq!(ClientMessage::parse("not json"), None);
        assert_eq!(ClientMessage::parse(r#"{"no":"type"}"#), None);
        assert_eq!(ClientMessage::parse(r#"{"type":1234}"#), None);
        // Server-to-client tags are not accepted inbound.
        assert_eq!(ClientMessage::parse(r#"{"type":9}"#), None);
        // Bad field types drop too.
        assert_eq!(
            ClientMessage::parse(r#"{"type":10,"action":"HOLD","orderType":"LIMIT","quantity":1}"#),
            None
        );
    }

    #[test]
    fn parses_admin_settings_patch() {
        let message =
            ClientMessage::parse(r#"{"type":30,"settings":{"bots":5,"ticketName":"GME"}}"#)
                .unwrap();
        match message {
            ClientMessage::AdminSettings { settings } => {
                assert_eq!(settings.bots, Some(5));
                assert_eq!(settings.ticker_name.as_deref(), Some("GME"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_power_messages() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":81,"index":2}"#),
            Some(ClientMessage::PowerSelect { index: 2 })
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":82,"id":7}"#),
            Some(ClientMessage::PowerConsume { id: 7 })
        );
    }

    #[test]
    fn outbound_frames_carry_their_tags() {
        assert_eq!(out::id("r-1")["type"], tag::ID);
        assert_eq!(out::error("nope")["type"], tag::ERROR);
        assert_eq!(out::clock(123, 4_000)["timeLeft"], 4_000);
        let debug = out::debug_prices(Price::from_float(1.5), Price::from_float(2.5));
        assert_eq!(debug["intrinsicValue"], 1.5);
        assert_eq!(debug["guidePrice"], 2.5);
    }

    #[test]
    fn settings_round_trip_through_wire_units() {
        let settings = GameSettings::default();
        let wire = settings_json(&settings);
        assert_eq!(wire["startingCash"], 10_000.0);
        assert_eq!(wire["openingPrice"], 1.0);
        assert_eq!(wire["ticketName"], "AAPL");
    }
}
