//! Health endpoints: `GET /` and `GET /zhealth`.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::ServerState;

/// Liveness probe. Also serves as the root response.
pub async fn health(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "rooms": state.rooms.len(),
    }))
}
