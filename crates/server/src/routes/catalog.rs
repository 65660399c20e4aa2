//! Static descriptor endpoints for the power and bot catalogues.

use axum::extract::Path;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{HttpError, HttpResult};

/// `GET /api/powers`: every power in the game.
pub async fn powers() -> Json<Value> {
    Json(json!(::powers::CATALOGUE))
}

/// `GET /api/powers/{id}`: one power descriptor by catalogue id.
pub async fn power(Path(id): Path<String>) -> HttpResult<Json<Value>> {
    match ::powers::spec_by_id(&id) {
        Some(spec) => Ok(Json(json!(spec))),
        None => Err(HttpError::UnknownPower(id)),
    }
}

/// `GET /api/bots`: every bot strategy available for spawning.
pub async fn bots() -> Json<Value> {
    Json(json!(::agents::bot_catalogue()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn powers_catalogue_serves_all_specs() {
        let Json(value) = powers().await;
        assert_eq!(value.as_array().unwrap().len(), ::powers::CATALOGUE.len());
    }

    #[tokio::test]
    async fn power_lookup_by_id() {
        let Json(value) = power(Path("rumor-mill".into())).await.unwrap();
        assert_eq!(value["id"], "rumor-mill");

        let err = power(Path("mega-laser".into())).await.unwrap_err();
        assert!(matches!(err, HttpError::UnknownPower(_)));
    }

    #[tokio::test]
    async fn bots_catalogue_serves_all_strategies() {
        let Json(value) = bots().await;
        assert_eq!(value.as_array().unwrap().len(), 7);
    }
}
