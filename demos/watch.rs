//! Watches HID devices and logs connect/disconnect/report traffic.
//!
//! Usage: `cargo run --example watch [config.toml]`
//!
//! Without a config file every HID device is matched, which is noisy but
//! handy for finding vendor/product ids to filter on.

use hidwatch::backends::HidRegistry;
use hidwatch::{DeviceMonitor, EventFilter, EventLogger, MonitorConfig};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()?;

    let config = match std::env::args().nth(1) {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::new(vec![], 64),
    };
    log::info!(
        "watching {} filter(s), fallback report size {}",
        config.filters.len(),
        config.fallback_report_size
    );

    let mut monitor = DeviceMonitor::from_config(config);
    monitor.add_listener(EventLogger::new(), EventFilter::All, None);

    // Blocks until process exit; Ctrl-C is the expected way out.
    monitor.start(HidRegistry::new()?)?;
    Ok(())
}
