/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "denylist": "connected",
///   "connections": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 }
/// }
/// ```
///
/// Always answers 200; `status` is `degraded` when either backend is down.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use taskhive_shared::db::pool::{self, PoolStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub denylist: String,
    pub connections: PoolStats,
}

fn label(ok: bool) -> &'static str {
    if ok {
        "connected"
    } else {
        "disconnected"
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, denylist) = tokio::join!(pool::health_check(&state.db), state.revocations.ping());

    if let Err(e) = &database {
        tracing::warn!(error = %e, "Database health check failed");
    }
    if let Err(e) = &denylist {
        tracing::warn!(error = %e, "Denylist health check failed");
    }

    let healthy = database.is_ok() && denylist.is_ok();

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: label(database.is_ok()).to_string(),
        denylist: label(denylist.is_ok()).to_string(),
        connections: pool::get_pool_stats(&state.db),
    })
}
