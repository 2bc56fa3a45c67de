//! hidwatch — HID device monitoring for Rust.
//!
//! Matches HID peripherals against vendor/product/usage filters, tracks
//! connect/disconnect transitions and streams raw input reports to
//! listeners. The OS device registry is reached only through the traits in
//! [`registry`], so the engine runs unchanged against the bundled `hidapi`
//! backend or a scripted double.
//!
//! ```no_run
//! use hidwatch::backends::HidRegistry;
//! use hidwatch::{DeviceFilter, DeviceMonitor, EventFilter, EventLogger};
//!
//! let mut monitor = DeviceMonitor::new(vec![DeviceFilter::new(0x046d, 0xc52b)], 64);
//! monitor.add_listener(EventLogger::new(), EventFilter::All, None);
//! // Blocks this thread, dispatching events until cancelled.
//! monitor.start(HidRegistry::new()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backends;
pub mod config;
pub mod descriptor;
pub mod event;
pub mod eventbus;
pub mod filter;
pub mod filtered_listener;
pub mod logger;
pub mod monitor;
pub mod registry;
pub mod resolver;
pub mod version;

pub use config::{ConfigError, MonitorConfig};
pub use descriptor::DeviceDescriptor;
pub use event::MonitorEvent;
pub use eventbus::{EventFilter, MonitorEventBus, MonitorListener};
pub use filter::DeviceFilter;
pub use filtered_listener::FilteredListener;
pub use logger::EventLogger;
pub use monitor::{CancelToken, DeviceMonitor, MonitorError};
pub use version::VersionCode;
