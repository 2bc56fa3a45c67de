//! Immutable device property snapshots.
//!
//! A [`DeviceDescriptor`] is taken once per connect event and never mutated;
//! reconnecting the same physical device produces a fresh snapshot. Property
//! extraction is best-effort: a missing or wrong-typed property degrades to
//! its documented sentinel, construction itself never fails.
//!
//! ## Sentinel conventions
//! - required integers (`location_id`, `vendor_id`, `product_id`,
//!   `max_input_report_size`, `interface_id`): `-1` when unavailable
//! - required strings (`name`): empty when unavailable
//! - everything else: `None`

use crate::registry::{PropertyKey, RegistryDevice};
use crate::resolver;
use crate::version::VersionCode;
use serde::Serialize;

/// Snapshot of one physical device's identifying and capability properties.
///
/// The underlying registry device object is *not* part of the snapshot; the
/// registry owns its lifetime and monitor events carry it as a separate
/// borrow next to the descriptor.
#[derive(Clone, Debug, Serialize)]
pub struct DeviceDescriptor {
    /// Slot/path identifier, process-unique per physical port. `-1` if
    /// unavailable.
    pub location_id: i64,

    /// Product name reported by the device, empty if unavailable.
    pub name: String,

    /// USB vendor id, `-1` if unavailable.
    pub vendor_id: i64,

    /// USB product id, `-1` if unavailable.
    pub product_id: i64,

    /// Upper bound on input-report payload length. `-1` if unknown; the
    /// monitor then falls back to its configured default.
    pub max_input_report_size: i64,

    /// Raw packed-BCD device version, when reported.
    pub device_version: Option<i64>,

    /// Decomposed `device_version`, when it parses.
    pub version: Option<VersionCode>,

    /// Firmware serial number, device-dependent.
    pub serial_number: Option<String>,

    /// Polling interval in microseconds, device-dependent.
    pub report_interval_micros: Option<i64>,

    /// USB interface number: direct property when present, otherwise
    /// recovered by the ancestor walk. `-1` when both fail.
    pub interface_id: i64,
}

impl DeviceDescriptor {
    /// Reads every property independently off `device`.
    ///
    /// Also used on removal, when the device may already be detached from
    /// the registry; whatever no longer reads simply degrades to its
    /// sentinel.
    pub fn from_device<D: RegistryDevice>(device: &D) -> Self {
        let device_version = device.int_property(PropertyKey::VersionNumber);
        DeviceDescriptor {
            location_id: device.int_property(PropertyKey::LocationId).unwrap_or(-1),
            name: device
                .string_property(PropertyKey::Product)
                .unwrap_or_default(),
            vendor_id: device.int_property(PropertyKey::VendorId).unwrap_or(-1),
            product_id: device.int_property(PropertyKey::ProductId).unwrap_or(-1),
            max_input_report_size: device
                .int_property(PropertyKey::MaxInputReportSize)
                .unwrap_or(-1),
            device_version,
            version: device_version.and_then(VersionCode::parse),
            serial_number: device.string_property(PropertyKey::SerialNumber),
            report_interval_micros: device.int_property(PropertyKey::ReportInterval),
            interface_id: resolver::resolve_interface_id(device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_double::{FakeDevice, FakeNode};

    #[test]
    fn empty_device_degrades_to_sentinels() {
        let dev = FakeDevice::with_id(1);
        let d = DeviceDescriptor::from_device(&dev);
        assert_eq!(d.location_id, -1);
        assert_eq!(d.name, "");
        assert_eq!(d.vendor_id, -1);
        assert_eq!(d.product_id, -1);
        assert_eq!(d.max_input_report_size, -1);
        assert_eq!(d.device_version, None);
        assert_eq!(d.version, None);
        assert_eq!(d.serial_number, None);
        assert_eq!(d.report_interval_micros, None);
        assert_eq!(d.interface_id, -1);
    }

    #[test]
    fn full_device_reads_every_field() {
        let mut dev = FakeDevice::with_id(1);
        dev.set_int(PropertyKey::LocationId, 0x14100000)
            .set_int(PropertyKey::VendorId, 0x046d)
            .set_int(PropertyKey::ProductId, 0xc52b)
            .set_int(PropertyKey::MaxInputReportSize, 64)
            .set_int(PropertyKey::VersionNumber, 0x0102)
            .set_int(PropertyKey::ReportInterval, 8000)
            .set_int(PropertyKey::InterfaceNumber, 2)
            .set_string(PropertyKey::Product, "Unifying Receiver")
            .set_string(PropertyKey::SerialNumber, "A1B2C3");

        let d = DeviceDescriptor::from_device(&dev);
        assert_eq!(d.location_id, 0x14100000);
        assert_eq!(d.name, "Unifying Receiver");
        assert_eq!(d.vendor_id, 0x046d);
        assert_eq!(d.product_id, 0xc52b);
        assert_eq!(d.max_input_report_size, 64);
        assert_eq!(d.device_version, Some(0x0102));
        let v = d.version.unwrap();
        assert_eq!((v.major, v.minor, v.sub_minor), (1, 0, 2));
        assert_eq!(d.serial_number.as_deref(), Some("A1B2C3"));
        assert_eq!(d.report_interval_micros, Some(8000));
        assert_eq!(d.interface_id, 2);
    }

    #[test]
    fn unparsable_version_keeps_raw_value() {
        let mut dev = FakeDevice::with_id(1);
        dev.set_int(PropertyKey::VersionNumber, 0x42); // hex "42": too short
        let d = DeviceDescriptor::from_device(&dev);
        assert_eq!(d.device_version, Some(0x42));
        assert_eq!(d.version, None);
    }

    #[test]
    fn interface_id_falls_back_to_ancestor_walk() {
        let mut dev = FakeDevice::with_id(1);
        dev.set_chain(vec![
            FakeNode {
                interface_number: None,
            },
            FakeNode {
                interface_number: Some(1),
            },
        ]);
        let d = DeviceDescriptor::from_device(&dev);
        assert_eq!(d.interface_id, 1);
    }
}
