use std::sync::Arc;

use anyhow::Context;
use edugenie_core::config::{self, EduGenieConfig};
use edugenie_core::providers::OpenAIProvider;
use edugenie_server::{router, AppState};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Optional YAML file; otherwise configuration comes from the environment
const CONFIG_PATH_VAR: &str = "EDUGENIE_CONFIG";

fn load_config() -> anyhow::Result<EduGenieConfig> {
    match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            config::load_from_yaml(&path).with_context(|| format!("failed to load {}", path))
        }
        Err(_) => config::from_env().context("failed to read configuration from the environment"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let config = load_config()?;
    let provider = OpenAIProvider::new(config.provider.clone()).context("failed to build provider client")?;
    let address = config.server.bind_address();
    let state = AppState::new(Arc::new(provider), config);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
