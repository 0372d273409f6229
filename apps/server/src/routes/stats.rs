use actix_web::{HttpResponse, get, web};
use pingo_service::{MetricsRecord, MetricsStore};
use serde::Deserialize;

use crate::error::AppError;

/// Records returned when no filter is given.
const RECENT_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    start: Option<String>,
    end: Option<String>,
    since: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl StatsQuery {
    async fn run(&self, store: &dyn MetricsStore) -> pingo_service::Result<Vec<MetricsRecord>> {
        // A range needs both ends; a lone start or end falls through.
        match (non_empty(&self.start), non_empty(&self.end), non_empty(&self.since)) {
            (Some(start), Some(end), _) => store.query_range(start, end).await,
            (_, _, Some(since)) => store.query_since(since).await,
            _ => store.query_recent(RECENT_LIMIT).await,
        }
    }
}

/// `?start=&end=` for a range, `?since=` for polling, nothing for the recent window.
#[get("/api/stats")]
pub async fn stats_route(
    store: web::Data<dyn MetricsStore>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, AppError> {
    let records = query.run(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::{TimeZone, Utc};
    use pingo_service::{LibsqlStore, MonitorStats};
    use serde_json::Value;
    use tempfile::{TempDir, tempdir};

    use super::*;

    const KEEP_FOREVER: u32 = 36_500;

    async fn seeded_store() -> (Arc<dyn MetricsStore>, TempDir) {
        let dir = tempdir().unwrap();
        let store = LibsqlStore::open(dir.path().join("stats.db")).await.unwrap();

        for hour in [10, 11, 12] {
            let ts = Utc.with_ymd_and_hms(2025, 10, 19, hour, 0, 0).unwrap();
            let record = if hour == 11 {
                MetricsRecord::unreachable(ts)
            } else {
                MetricsRecord::with_latency(ts, [9.0, 10.0, 11.0, 0.5], 0.0)
            };
            store.append(&record, KEEP_FOREVER).await.unwrap();
        }

        (Arc::new(store), dir)
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::from($store.clone()))
                    .app_data(web::Data::new(MonitorStats::default()))
                    .configure(crate::routes::routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_recent_without_parameters() {
        let (store, _dir) = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.len(), 3);
        assert_eq!(body[1]["packet_loss"], 100.0);
        assert!(body[1]["avg"].is_null());
        assert_eq!(body[2]["avg"], 10.0);
    }

    #[actix_web::test]
    async fn test_range_is_inclusive() {
        let (store, _dir) = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::get()
            .uri("/api/stats?start=2025-10-19T11:00:00&end=2025-10-19T12:00:00")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.len(), 2);
    }

    #[actix_web::test]
    async fn test_since_is_exclusive() {
        let (store, _dir) = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::get()
            .uri("/api/stats?since=2025-10-19T11:00:00Z")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.len(), 1);
    }

    #[actix_web::test]
    async fn test_bad_bounds_are_rejected() {
        let (store, _dir) = seeded_store().await;
        let app = app!(store);

        for uri in [
            "/api/stats?start=yesterday&end=2025-10-19T12:00:00",
            "/api/stats?start=2025-10-19T12:00:00&end=2025-10-19T10:00:00",
            "/api/stats?since=not-a-time",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn test_health_reports_record_count() {
        let (store, _dir) = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["records"], 3);
        assert_eq!(body["rounds_completed"], 0);
        assert_eq!(body["monitor"], "waiting");
    }
}
