//! Registry backends for `hidwatch`.
//!
//! Implementations of the [`DeviceRegistry`](crate::registry::DeviceRegistry)
//! trait family for concrete host HID stacks.
//!
//! # Feature flags
//! - **`hid`** — enables the cross-platform `hidapi` polling backend
//!   (default in this build).
//!
//! hidwatch observes devices; it never writes to them or creates virtual
//! ones.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

#[cfg(feature = "hid")]
pub use hid::HidRegistry;
