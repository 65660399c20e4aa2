//! Room task runtime.
//!
//! Each room runs as one tokio task owning its [`Room`]. Inbound traffic
//! and timer ticks are serialised through a single `select!` loop, which
//! is what gives the core its per-room single-threaded execution model.
//! The task exits (and unregisters itself) when the room empties out.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use types::{ParticipantId, RoomId, Timestamp};

use crate::protocol::ClientMessage;
use crate::room::Room;

/// Market tick period.
const MARKET_TICK: Duration = Duration::from_millis(200);
/// Clock tick period.
const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Commands delivered to a room task.
pub enum RoomCommand {
    /// Attach a session; replies with the assigned participant id.
    Join {
        tx: mpsc::UnboundedSender<Value>,
        username: String,
        prev: Option<ParticipantId>,
        spectator: bool,
        reply: oneshot::Sender<ParticipantId>,
    },
    /// An inbound, already-parsed client frame.
    Message {
        from: ParticipantId,
        message: ClientMessage,
    },
    /// The session's transport went away.
    Disconnect { id: ParticipantId },
}

/// Handle used by transports to reach a room task.
#[derive(Clone)]
pub struct RoomHandle {
    pub cmd_tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn send(&self, command: RoomCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

/// Wall clock in milliseconds.
pub fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Spawn a room task. `on_exit` runs after disposal so the registry can
/// drop its handle.
pub fn spawn_room(room_id: RoomId, on_exit: impl FnOnce() + Send + 'static) -> RoomHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<RoomCommand>();
    let handle = RoomHandle { cmd_tx };

    tokio::spawn(async move {
        let mut room = Room::new(room_id.clone());
        let mut joined_once = false;

        let mut market = interval(MARKET_TICK);
        market.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock = interval(CLOCK_TICK);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(RoomCommand::Join { tx, username, prev, spectator, reply }) => {
                        let id = room.join(tx, username, prev, spectator);
                        joined_once = true;
                        let _ = reply.send(id);
                    }
                    Some(RoomCommand::Message { from, message }) => {
                        room.handle_message(from, message, now_ms());
                    }
                    Some(RoomCommand::Disconnect { id }) => {
                        room.mark_disconnected(id, now_ms());
                    }
                    None => break,
                },
                _ = market.tick() => room.market_tick(now_ms()),
                _ = clock.tick() => room.clock_tick(now_ms()),
            }

            if joined_once && room.is_empty() {
                break;
            }
        }

        room.dispose();
        info!(room = %room_id, "room task finished");
        on_exit();
    });

    handle
}
