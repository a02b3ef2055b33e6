use k12_tutor::api::{app_router, ApiState};
use k12_tutor::config::Config;
use k12_tutor::db::Db;
use k12_tutor::service::Tutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .init();

    let db = Db::new(&config.database_url).await?;
    if config.seed_catalog {
        db.seed_catalog_if_empty().await?;
    }

    let state = ApiState { tutor: Tutor::new(db) };
    let app = app_router(state);

    let addr = config.bind_addr();
    log::info!("k12-tutor listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
