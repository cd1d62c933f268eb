//! Process startup: open storage, bind, serve until a shutdown signal.

use thiserror::Error;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::{
    api::{app, state::AppState},
    config::{Config, ConfigError},
    persist::{StorageError, open_store},
    repo::RsvpRepository,
};

/// Fatal startup or serve failure.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad environment.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Storage could not be opened or its schema created.
    #[error("storage init failed: {0}")]
    Storage(#[from] StorageError),
    /// Bind or accept failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the server described by `config` until Ctrl+C or SIGTERM.
pub async fn start_server(config: Config) -> Result<(), ServerError> {
    info!("Initializing storage...");
    let store = open_store(&config.backend).await?;
    let state = AppState::new(RsvpRepository::new(store), config.admin_password.clone());

    let app = app(state, &config);
    let address = config.bind_address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!(mode = ?config.mode, "Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
