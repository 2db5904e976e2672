//! gymshop - command-line client for the gymshop storefront.
//!
//! Signs in against the backend, keeps the credential pair in the configured
//! token store and exposes the catalog, cart, orders, wishlist and gym
//! content as subcommands.

mod commands;
mod format;

use std::io;

use anyhow::Result;
use gymshop_core::auth::SessionEvent;
use gymshop_core::{ApiClient, Config};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Command, USAGE};

/// Directory for rolling log files; stderr only when unset
const ENV_LOG_DIR: &str = "GYMSHOP_LOG_DIR";

/// Initialize the tracing subscriber for logging.
/// The returned guard must stay alive for file logs to be flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "gymshop.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let mut config = Config::load()?;
    let store = config.token_store()?;
    let client = ApiClient::new(config.client_config(), store)?;
    let mut events = client.subscribe();
    info!(base_url = %config.base_url, "gymshop starting");

    let result = commands::run(&client, &mut config, command).await;

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Expired(reason) = event {
            eprintln!(
                "Session expired ({}). Run `gymshop login` to sign in again.",
                reason.describe()
            );
        }
    }

    result
}
