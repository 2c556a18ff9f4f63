use discopower_server::{
    config::ServerConfig,
    routes::{AppState, router},
    store::MetadataStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file path as the only argument
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref()).expect("failed to load configuration");
    tracing::info!(instance = %config.disco.instance, "Loaded configuration");

    let metadata = MetadataStore::load(&config.metadata_path).expect("failed to load metadata");

    let bind_address = config.bind_address.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    let state = Arc::new(AppState::new(config, metadata));

    // Spawn periodic session cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            match cleanup_state.sessions.delete_expired() {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", bind_address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
