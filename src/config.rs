//! Construction-time monitor configuration.
//!
//! [`MonitorConfig`] carries the two recognized options — the matching
//! filter list and the fallback report-buffer size — and can be read from a
//! TOML or JSON file so tools don't hard-code vendor/product ids.
//!
//! ```toml
//! fallback_report_size = 64
//!
//! [[filters]]
//! vendor_id = 0x046d
//! product_id = 0xc52b
//!
//! [[filters]]
//! vendor_id = 0x256c
//! product_id = 0x006e
//! usage_page = 0xff00
//! usage = 0x01
//! ```

use crate::filter::DeviceFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fallback_report_size must be greater than zero")]
    InvalidFallbackSize,
}

/// The monitor's full configuration surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Matching set, in order. Empty means "match every HID device".
    #[serde(default)]
    pub filters: Vec<DeviceFilter>,

    /// Report-buffer size for devices that do not declare a usable
    /// `max_input_report_size`. Must be non-zero.
    pub fallback_report_size: usize,
}

impl MonitorConfig {
    pub fn new(filters: Vec<DeviceFilter>, fallback_report_size: usize) -> Self {
        MonitorConfig {
            filters,
            fallback_report_size,
        }
    }

    /// Reads a config file, picking the format from the `.json` extension
    /// (anything else parses as TOML).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&raw)
        } else {
            Self::from_toml_str(&raw)
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(raw)?;
        config.validate()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = serde_json::from_str(raw)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.fallback_report_size == 0 {
            return Err(ConfigError::InvalidFallbackSize);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_with_filters() {
        let config = MonitorConfig::from_toml_str(
            r#"
            fallback_report_size = 64

            [[filters]]
            vendor_id = 0x046d
            product_id = 0xc52b

            [[filters]]
            vendor_id = 0x256c
            product_id = 0x006e
            usage_page = 0xff00
            usage = 0x01
            "#,
        )
        .unwrap();

        assert_eq!(config.fallback_report_size, 64);
        assert_eq!(config.filters.len(), 2);
        assert_eq!(config.filters[0], DeviceFilter::new(0x046d, 0xc52b));
        assert_eq!(
            config.filters[1],
            DeviceFilter::new(0x256c, 0x006e).with_usage(0xff00, 0x01)
        );
    }

    #[test]
    fn parses_json() {
        let config = MonitorConfig::from_json_str(
            r#"{"filters": [{"vendor_id": 1133, "product_id": 50475}], "fallback_report_size": 32}"#,
        )
        .unwrap();
        assert_eq!(config.filters, vec![DeviceFilter::new(1133, 50475)]);
        assert_eq!(config.fallback_report_size, 32);
    }

    #[test]
    fn missing_filters_defaults_to_match_all() {
        let config = MonitorConfig::from_toml_str("fallback_report_size = 8\n").unwrap();
        assert!(config.filters.is_empty());
    }

    #[test]
    fn zero_fallback_is_rejected() {
        let err = MonitorConfig::from_toml_str("fallback_report_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFallbackSize));
    }
}
