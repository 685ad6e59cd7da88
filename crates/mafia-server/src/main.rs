//! `mafia-server` binary.
//!
//! Usage: `mafia-server [CONFIG]`. The config path defaults to
//! `$MAFIA_CONFIG`, then `mafia.toml`. Log verbosity follows `RUST_LOG`.

use mafia_server::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MAFIA_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = ServerConfig::load(&path)?;

    tracing::info!(
        config = %path,
        port = config.server.port,
        max_workers = config.server.max_workers,
        roles = ?config.roles,
        "starting mafia server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.max_workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))?;
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<(), MafiaError> {
    let server = MafiaServer::builder()
        .bind(&config.bind_addr())
        .settings(config.game_settings())
        .build()
        .await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
