use axum::{extract::State, response::Json};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub mod clients;
pub mod uploads;

pub use clients::client_routes;
pub use uploads::upload_routes;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = crate::database::health_check(&state.db_pool).await;
    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
