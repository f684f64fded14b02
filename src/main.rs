use repo_radar::configuration::get_configuration;
use repo_radar::db::create_pool;
use repo_radar::startup::Application;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let configuration = get_configuration().expect("Failed to read configuration");
    let pool = create_pool(&configuration.database)
        .await
        .expect("Failed to connect to the database");

    let app = Application::build(configuration, pool).await?;
    let scheduled = app.bootstrap().await?;
    info!(scheduled, "projects scheduled");

    let listener = TcpListener::bind((app.host.as_str(), app.port)).await?;
    info!(address = %listener.local_addr()?, "listening");

    let scheduler = app.scheduler().clone();
    let served = axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    scheduler.shutdown();
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
