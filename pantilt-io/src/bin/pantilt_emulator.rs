//! Standalone emulated scanner head
//!
//! Serves the UDP frame protocol on `[emulator] bind_address` using the
//! device address and checksum span from `[device]`, so a daemon pointed at
//! it with the same config behaves as against real hardware.
//!
//! Usage: `pantilt-emulator [--config <path>]`

use pantilt_io::PantiltConfig;
use pantilt_io::emulator::Emulator;
use pantilt_io::error::{Error, Result};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Interval between position log lines
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    args.get(1).filter(|a| !a.starts_with('-')).cloned()
}

fn main() -> Result<()> {
    let config = match parse_config_path() {
        Some(path) if Path::new(&path).exists() => PantiltConfig::load(&path)?,
        _ => PantiltConfig::default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let handle = Emulator::spawn(
        &config.emulator,
        config.device.address,
        config.device.checksum_span,
    )?;

    let mut elapsed = Duration::ZERO;
    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
        elapsed += Duration::from_millis(100);
        if elapsed >= STATUS_INTERVAL {
            elapsed = Duration::ZERO;
            log::info!(
                "pan {:.2}°, tilt {:.2}°, {:?}, {} frames",
                handle.pan() as f64 / 100.0,
                handle.tilt() as f64 / 100.0,
                handle.motion(),
                handle.frame_count()
            );
        }
    }

    log::info!("Emulator shutting down");
    handle.stop();
    Ok(())
}
