//! Chess rooms server (default binary).
//!
//! Configuration comes from `CHESS_ROOMS_HOST`, `CHESS_ROOMS_PORT`,
//! `CHESS_ROOMS_LOG` and `CHESS_ROOMS_HANDSHAKE_TIMEOUT_MS`; `RUST_LOG`
//! overrides the log filter.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use chess_rooms::adapter::logging::init_subscriber;
use chess_rooms::adapter::server::{check_tcp_listen_available, run_server, ServerConfig, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();
    init_subscriber(&config.log_filter);

    check_tcp_listen_available(&config.host, config.port)
        .with_context(|| format!("cannot listen on {}", config.bind_addr()))?;

    let state = Arc::new(ServerState::new(config));

    tokio::select! {
        result = run_server(Arc::clone(&state), None) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!(
                rooms = state.registry().room_count(),
                connections = state.dispatcher().connection_count(),
                "shutting down"
            );
            Ok(())
        }
    }
}
