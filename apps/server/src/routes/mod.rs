use actix_web::web::ServiceConfig;

pub mod health;
pub mod stats;

/// Register every route of the query surface.
pub fn routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_route).service(stats::stats_route);
}
