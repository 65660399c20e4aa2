//! Shared server state: the room registry.
//!
//! Rooms are created on first join and unregister themselves when their
//! task exits. The registry is the only cross-room shared structure; all
//! game state lives inside the room tasks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use types::RoomId;

use crate::runtime::{spawn_room, RoomHandle};

/// Process-wide registry of live rooms.
#[derive(Default)]
pub struct RoomManager {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a room without creating it.
    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.read().get(room_id).cloned()
    }

    /// Look up a room, spawning its task on first use.
    pub fn get_or_create(self: &Arc<Self>, room_id: &str) -> RoomHandle {
        if let Some(handle) = self.get(room_id) {
            return handle;
        }
        let mut rooms = self.rooms.write();
        // Double-checked under the write lock.
        if let Some(handle) = rooms.get(room_id) {
            return handle.clone();
        }

        let manager = Arc::downgrade(self);
        let id_for_cleanup = room_id.to_string();
        let handle = spawn_room(room_id.to_string(), move || {
            if let Some(manager) = manager.upgrade() {
                manager.rooms.write().remove(&id_for_cleanup);
            }
        });
        info!(room = room_id, "room created");
        rooms.insert(room_id.to_string(), handle.clone());
        handle
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

/// State handed to every route handler.
#[derive(Clone)]
pub struct ServerState {
    pub rooms: Arc<RoomManager>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RoomManager::new()),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
