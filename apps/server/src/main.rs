#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

mod cli;
mod error;
mod routes;

use cli::Cli;
use error::AppError;
use logger::init_tracing;
use pingo_service::{
    LibsqlStore, MetricsStore, MonitorStats, MonitoringExecutor, MonitoringScheduler, PingProbe,
    Target,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = cli.resolve_config().context("Failed to load configuration")?;
    info!("{config}");

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    let store: Arc<dyn MetricsStore> = Arc::new(
        LibsqlStore::open(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database {}", config.db_path.display()))?,
    );
    info!("Database initialized at {}", config.db_path.display());

    let target = Target::parse(config.target.as_str())?;
    let executor = MonitoringExecutor::new(
        Arc::new(PingProbe::new()),
        Arc::clone(&store),
        target,
        config.ping_count,
        config.retention_days,
    );
    let scheduler = MonitoringScheduler::new(Arc::new(executor));
    let stats = scheduler.stats();
    let _monitor = scheduler.spawn();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    run_server(addr, store, stats).await?;

    Ok(())
}

async fn run_server(
    addr: SocketAddr,
    store: Arc<dyn MetricsStore>,
    stats: Arc<MonitorStats>,
) -> Result<(), AppError> {
    info!("Web server starting on http://localhost:{}", addr.port());

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(Arc::clone(&store)))
            .app_data(web::Data::from(Arc::clone(&stats)))
            .configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
