//! WebSocket endpoint: `GET /ws`.
//!
//! The session key arrives in the query string: `room`, `username`,
//! `spectator`, and optionally `prevSessionData=<roomId>-<participantId>`
//! for reconnects. After the upgrade the socket is split: one task pumps
//! the room's outbound queue into the sink, the other parses inbound
//! frames and forwards them to the room task. Malformed frames are
//! dropped where they land.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use types::ParticipantId;

use crate::error::{HttpError, HttpResult};
use crate::protocol::{out, ClientMessage};
use crate::runtime::{RoomCommand, RoomHandle};
use crate::state::ServerState;

/// Longest accepted room name and username.
const MAX_NAME_LEN: usize = 64;

/// Session parameters from the query string.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room: String,
    pub username: Option<String>,
    pub spectator: Option<bool>,
    #[serde(rename = "prevSessionData")]
    pub prev_session_data: Option<String>,
}

/// Parse a reconnect token of the form `<roomId>-<participantId>`.
/// Returns `None` unless the room part matches this session's room.
fn parse_reconnect(token: &str, room: &str) -> Option<ParticipantId> {
    let (token_room, id) = token.rsplit_once('-')?;
    if token_room != room {
        return None;
    }
    id.parse::<u64>().ok().map(ParticipantId)
}

/// WebSocket upgrade handler. Session parameters are validated before the
/// upgrade; a bad query never reaches a room task.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<ServerState>,
) -> HttpResult<Response> {
    if query.room.trim().is_empty() {
        return Err(HttpError::BadSession("room is required".into()));
    }
    if query.room.len() > MAX_NAME_LEN {
        return Err(HttpError::BadSession("room name too long".into()));
    }
    if query.username.as_ref().is_some_and(|u| u.len() > MAX_NAME_LEN) {
        return Err(HttpError::BadSession("username too long".into()));
    }
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, query))
        .into_response())
}

async fn handle_socket(mut socket: WebSocket, state: ServerState, query: WsQuery) {
    let spectator = query.spectator.unwrap_or(false);

    // Spectators watch existing rooms; they never create one.
    let handle: RoomHandle = if spectator {
        match state.rooms.get(&query.room) {
            Some(handle) => handle,
            None => {
                let _ = socket
                    .send(Message::Text(out::error("Room not found").to_string().into()))
                    .await;
                let _ = socket.close().await;
                return;
            }
        }
    } else {
        state.rooms.get_or_create(&query.room)
    };

    let prev = query
        .prev_session_data
        .as_deref()
        .and_then(|token| parse_reconnect(token, &query.room));
    let username = query.username.unwrap_or_else(|| "anonymous".to_string());

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let (reply_tx, reply_rx) = oneshot::channel();
    handle.send(RoomCommand::Join {
        tx: out_tx,
        username,
        prev,
        spectator,
        reply: reply_tx,
    });
    let Ok(id) = reply_rx.await else {
        return;
    };
    debug!(room = %query.room, %id, "websocket session attached");

    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            if sender
                .send(Message::Text(message.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let cmd_handle = handle.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if let Some(message) = ClientMessage::parse(&text) {
                        cmd_handle.send(RoomCommand::Message { from: id, message });
                    } else {
                        debug!("dropping unparseable frame");
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(err) => {
                    warn!(%err, "websocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    handle.send(RoomCommand::Disconnect { id });
    debug!(room = %query.room, %id, "websocket session detached");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_token_parses_for_matching_room() {
        assert_eq!(parse_reconnect("lobby-7", "lobby"), Some(ParticipantId(7)));
        assert_eq!(parse_reconnect("other-7", "lobby"), None);
        assert_eq!(parse_reconnect("lobby-x", "lobby"), None);
        assert_eq!(parse_reconnect("garbage", "lobby"), None);
    }

    #[test]
    fn reconnect_token_with_dashes_in_room_name() {
        assert_eq!(
            parse_reconnect("my-fancy-room-12", "my-fancy-room"),
            Some(ParticipantId(12))
        );
    }
}
