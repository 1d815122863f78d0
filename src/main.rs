use std::process::ExitCode;

use campus_hub::{http, Config, InMemoryModelStore, JsonFileModelStore};
use tokio::signal::ctrl_c;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration rejected");
            return ExitCode::FAILURE;
        }
    };
    let address = config.address();

    let served = match &config.data_file {
        Some(path) => match JsonFileModelStore::open(path) {
            Ok(store) => {
                info!(path = %path.display(), "using JSON data file");
                let served = http::serve(store.clone(), &address, shutdown_signal()).await;
                match store.flush() {
                    Ok(()) => info!(path = %path.display(), "data file flushed on shutdown"),
                    Err(e) => error!(path = %path.display(), error = %e, "final flush failed"),
                }
                served
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open data file");
                return ExitCode::FAILURE;
            }
        },
        None => {
            info!("HUB_DATA_FILE not set, records are kept in memory only");
            http::serve(InMemoryModelStore::new(), &address, shutdown_signal()).await
        }
    };

    match served {
        Ok(()) => {
            info!("server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(address = %address, error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
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
