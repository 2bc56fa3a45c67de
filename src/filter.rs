//! Matching filters.
//!
//! A [`DeviceFilter`] is one entry in the matching set handed to
//! [`DeviceMonitor`](crate::monitor::DeviceMonitor) at construction; the set
//! is immutable for the monitor's lifetime. Vendor and product ids are
//! required; usage page/usage narrow the match to a specific HID interface
//! when given.

use serde::{Deserialize, Serialize};

/// One vendor/product(/usage) matching entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
    #[serde(default)]
    pub usage_page: Option<u16>,
    #[serde(default)]
    pub usage: Option<u16>,
}

impl DeviceFilter {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        DeviceFilter {
            vendor_id,
            product_id,
            usage_page: None,
            usage: None,
        }
    }

    /// Narrows the filter to one usage page/usage pair.
    pub fn with_usage(mut self, usage_page: u16, usage: u16) -> Self {
        self.usage_page = Some(usage_page);
        self.usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_fields_default_to_none_in_toml() {
        let f: DeviceFilter = toml::from_str("vendor_id = 1133\nproduct_id = 50475\n").unwrap();
        assert_eq!(f, DeviceFilter::new(1133, 50475));
    }

    #[test]
    fn builder_sets_usage() {
        let f = DeviceFilter::new(0x046d, 0xc52b).with_usage(0xff00, 0x01);
        assert_eq!(f.usage_page, Some(0xff00));
        assert_eq!(f.usage, Some(0x01));
    }
}
