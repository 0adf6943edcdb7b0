/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
///
/// A failed database ping reports `degraded`/`disconnected` with a 200, so
/// probes can tell a sick store from a dead process.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{success, Envelope},
};
use axum::{extract::State, Json};
use choreboard_shared::db::pool;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Envelope<HealthResponse>>> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the database");
            false
        }
    };

    Ok(success(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    }))
}
