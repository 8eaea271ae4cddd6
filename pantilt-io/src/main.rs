//! PantiltIO - Command daemon for a pan/tilt scanner head
//!
//! ## Protocol Architecture
//!
//! - **TCP (port 5555)**: Route requests from clients, one thread per client
//! - **UDP (device port 6000)**: 7-byte command frames to the scanner head
//!
//! Every route shares one dispatcher, so the per-route rate limit holds
//! across all connected clients.

use pantilt_io::PantiltConfig;
use pantilt_io::dispatch::Dispatcher;
use pantilt_io::error::{Error, Result};
use pantilt_io::server::CommandServer;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `pantilt-io <path>` (positional)
/// - `pantilt-io --config <path>` (flag-based)
/// - `pantilt-io -c <path>` (short flag)
///
/// Defaults to `pantilt.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "pantilt.toml".to_string()
}

fn load_config(path: &str) -> Result<PantiltConfig> {
    if Path::new(path).exists() {
        PantiltConfig::load(path)
    } else {
        Ok(PantiltConfig::default())
    }
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = load_config(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("PantiltIO v{} starting...", env!("CARGO_PKG_VERSION"));
    if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
    } else {
        log::warn!("Config {} not found, using defaults", config_path);
    }

    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
    log::info!("{} routes configured", dispatcher.routes().len());

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let server = CommandServer::bind(
        &config.server.bind_address,
        Arc::clone(&dispatcher),
        config.server.wire_format,
        Arc::clone(&running),
    )?;
    log::info!("PantiltIO running. Press Ctrl-C to stop.");
    server.run()?;

    // The head keeps moving until told otherwise
    log::info!("Shutting down...");
    if let Err(e) = dispatcher.session().stop() {
        log::error!("Failed to stop head on shutdown: {}", e);
    }

    log::info!("PantiltIO stopped");
    Ok(())
}
