use actix_web::{HttpResponse, get, web};
use pingo_service::{MetricsStore, MonitorState, MonitorStats};
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    monitor: MonitorState,
    records: u64,
    rounds_completed: u64,
    rounds_failed: u64,
}

/// Health check route
/// Reports the monitor counters and how many records the store holds; a store
/// that cannot be read turns this into a 500.
#[get("/health")]
pub async fn health_route(
    store: web::Data<dyn MetricsStore>,
    stats: web::Data<MonitorStats>,
) -> Result<HttpResponse, AppError> {
    let records = store.count().await?;

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        monitor: stats.state(),
        records,
        rounds_completed: stats.rounds_completed(),
        rounds_failed: stats.rounds_failed(),
    }))
}
