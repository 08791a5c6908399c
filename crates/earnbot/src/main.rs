use anyhow::Result;
use clap::Parser;
use database::Database;
use std::sync::Arc;
use telegram::ProfileBot;
use tokio::signal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use utils::{AppConfig, Logger};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let earnbot = Earnbot::new().await;
    earnbot.run().await;

    Ok(())
}

pub struct Earnbot {
    telegram: ProfileBot,
    config: Arc<AppConfig>,
    // Keeps the non-blocking log writer alive for the whole run.
    _log_guard: WorkerGuard,
}

impl Earnbot {
    pub async fn new() -> Self {
        let config = Earnbot::with_config();
        let log_guard = Logger::new(config.cargo_env);
        let database = Earnbot::with_database(config.clone()).await;
        let telegram = ProfileBot::new(config.clone(), database);

        Self {
            telegram,
            config,
            _log_guard: log_guard,
        }
    }

    pub async fn run(self) {
        info!("🧠 earnbot starting (env: {:?})", self.config.cargo_env);

        tokio::select! {
            _ = self.telegram.run() => {
                info!("🔔 bot dispatcher exited");
            },
            _ = shutdown_signal() => {
                info!("🔔 shutdown signal received, stopping ...");
            },
        }
    }
}

impl Earnbot {
    fn with_config() -> Arc<AppConfig> {
        // Load the env file matching CARGO_ENV before clap parses.
        utils::EnvLoader::load_env_file().ok();
        Arc::new(AppConfig::parse())
    }

    async fn with_database(config: Arc<AppConfig>) -> Database {
        Database::new(config)
            .await
            .expect("🔴 Failed to connect to mongodb")
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("🔴 Failed to install Ctrl+C handler");
        info!("🔔 Ctrl+C received");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("🔴 Failed to install signal handler")
            .recv()
            .await;
        info!("🔔 Terminate signal received");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::warn!("❌ Signal received, starting graceful shutdown...");
}
