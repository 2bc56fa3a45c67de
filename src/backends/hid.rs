//! `hidapi` polling backend.
//!
//! `hidapi` exposes enumeration and blocking reads but no hot-plug
//! callbacks, so this backend synthesizes the session event model by
//! sweeping the device list on an interval: set differences become
//! matched/removed events, and a zero-timeout read per watched device stages
//! report payloads. Each sweep ends with at least an `Idle` heartbeat, which
//! bounds how long [`next_event`](HidSession::next_event) blocks and keeps
//! the monitor's cancel token responsive.
//!
//! ## Backend limits
//! - `hidapi` does not expose a location id, a max-input-report-size or a
//!   polling interval; those descriptor fields degrade to their sentinels
//!   (`max_input_report_size` then falls back to the monitor's configured
//!   buffer size).
//! - There is no service-plane ancestry to walk; the interface number comes
//!   from the direct property, which `hidapi` reports on every platform.
//! - Report ids are not split from the payload: for devices using numbered
//!   reports the id is the payload's first byte, and `ReportMeta::report_id`
//!   stays 0.

use crate::registry::{
    DeviceRegistry, MatchCriteria, PropertyKey, RegistryDevice, RegistryError, RegistrySession,
    ReportMeta, ReportType, ServiceEntry, SessionEvent,
};
use hidapi::{DeviceInfo, HidApi, HidDevice};
use log::warn;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::ffi::CString;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Entry point: wraps a `HidApi` handle and turns into a [`HidSession`] on
/// open.
pub struct HidRegistry {
    api: HidApi,
    poll_interval: Duration,
}

impl HidRegistry {
    pub fn new() -> Result<Self, RegistryError> {
        let api = HidApi::new().map_err(|e| RegistryError::SessionOpen(e.to_string()))?;
        Ok(HidRegistry {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Overrides the sweep interval. Shorter intervals reduce report
    /// latency at the cost of enumeration churn.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl DeviceRegistry for HidRegistry {
    type Session = HidSession;

    fn open_session(self, criteria: &[MatchCriteria]) -> Result<HidSession, RegistryError> {
        Ok(HidSession {
            api: self.api,
            criteria: criteria.to_vec(),
            poll_interval: self.poll_interval,
            present: HashMap::new(),
            watched: HashMap::new(),
            staged: HashMap::new(),
            pending: VecDeque::new(),
        })
    }
}

/// `hidapi` has no service-plane registry, so entries are uninhabited; the
/// ancestor walk never starts on this backend.
pub enum HidServiceEntry {}

impl ServiceEntry for HidServiceEntry {
    fn parent(&self) -> Option<Self> {
        match *self {}
    }

    fn int_property(&self, _key: PropertyKey) -> Option<i64> {
        match *self {}
    }
}

/// Cloneable snapshot of one enumerated HID interface.
///
/// Identity is the platform path; property reads serve the values captured
/// at enumeration time, which also makes removal-time descriptor reads work
/// after the device is gone.
#[derive(Clone, Debug)]
pub struct HidDeviceHandle {
    id: u64,
    path: CString,
    vendor_id: u16,
    product_id: u16,
    product: Option<String>,
    serial: Option<String>,
    release: u16,
    interface_number: i32,
    usage_page: u16,
    usage: u16,
}

impl HidDeviceHandle {
    fn from_info(info: &DeviceInfo) -> Self {
        let path = info.path().to_owned();
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        HidDeviceHandle {
            id: hasher.finish(),
            path,
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            product: info.product_string().map(str::to_string),
            serial: info.serial_number().map(str::to_string),
            release: info.release_number(),
            interface_number: info.interface_number(),
            usage_page: info.usage_page(),
            usage: info.usage(),
        }
    }

    /// Platform device path, useful for diagnostics.
    pub fn path(&self) -> &CString {
        &self.path
    }

    /// HID usage page this interface was enumerated under.
    pub fn usage_page(&self) -> u16 {
        self.usage_page
    }

    /// HID usage within the page.
    pub fn usage(&self) -> u16 {
        self.usage
    }
}

impl RegistryDevice for HidDeviceHandle {
    type Entry = HidServiceEntry;

    fn registry_id(&self) -> u64 {
        self.id
    }

    fn int_property(&self, key: PropertyKey) -> Option<i64> {
        match key {
            PropertyKey::VendorId => Some(self.vendor_id as i64),
            PropertyKey::ProductId => Some(self.product_id as i64),
            // 0 means "not reported" in hidapi
            PropertyKey::VersionNumber if self.release != 0 => Some(self.release as i64),
            PropertyKey::InterfaceNumber if self.interface_number >= 0 => {
                Some(self.interface_number as i64)
            }
            _ => None,
        }
    }

    fn string_property(&self, key: PropertyKey) -> Option<String> {
        match key {
            PropertyKey::Product => self.product.clone(),
            PropertyKey::SerialNumber => self.serial.clone(),
            _ => None,
        }
    }

    fn service_entry(&self) -> Option<HidServiceEntry> {
        None
    }
}

struct WatchedDevice {
    device: HidDevice,
    capacity: usize,
}

struct StagedReport {
    bytes: Vec<u8>,
    timestamp_micros: u64,
}

pub struct HidSession {
    api: HidApi,
    criteria: Vec<MatchCriteria>,
    poll_interval: Duration,
    /// Matched devices currently attached, by registry id.
    present: HashMap<u64, HidDeviceHandle>,
    /// Devices opened for report delivery.
    watched: HashMap<u64, WatchedDevice>,
    /// Payloads read during a sweep, waiting for `read_report`.
    staged: HashMap<u64, StagedReport>,
    pending: VecDeque<SessionEvent<HidDeviceHandle>>,
}

impl HidSession {
    fn sweep(&mut self) {
        if let Err(err) = self.api.refresh_devices() {
            warn!("device enumeration failed: {err}");
            return;
        }

        let mut seen: HashMap<u64, HidDeviceHandle> = HashMap::new();
        for info in self.api.device_list() {
            if !criteria_match(&self.criteria, info.vendor_id(), info.product_id(), info.usage_page(), info.usage()) {
                continue;
            }
            let handle = HidDeviceHandle::from_info(info);
            seen.insert(handle.registry_id(), handle);
        }

        let gone: Vec<u64> = self
            .present
            .keys()
            .filter(|id| !seen.contains_key(id))
            .copied()
            .collect();
        for id in gone {
            if let Some(handle) = self.present.remove(&id) {
                self.watched.remove(&id);
                self.staged.remove(&id);
                self.pending.push_back(SessionEvent::Removed(handle));
            }
        }

        for (id, handle) in seen {
            if !self.present.contains_key(&id) {
                self.present.insert(id, handle.clone());
                self.pending.push_back(SessionEvent::Matched(handle));
            }
        }

        for (id, watched) in self.watched.iter_mut() {
            if self.staged.contains_key(id) {
                // Previous report not consumed yet; keep arrival order.
                continue;
            }
            let mut buf = vec![0u8; watched.capacity];
            match watched.device.read_timeout(&mut buf, 0) {
                Ok(n) if n > 0 => {
                    buf.truncate(n);
                    self.staged.insert(
                        *id,
                        StagedReport {
                            bytes: buf,
                            timestamp_micros: epoch_micros(),
                        },
                    );
                    if let Some(handle) = self.present.get(id) {
                        self.pending.push_back(SessionEvent::ReportReady(handle.clone()));
                    }
                }
                Ok(_) => {}
                Err(err) => warn!("report read failed on {id:#x}: {err}"),
            }
        }
    }
}

impl RegistrySession for HidSession {
    type Device = HidDeviceHandle;

    fn next_event(&mut self) -> Option<SessionEvent<HidDeviceHandle>> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        std::thread::sleep(self.poll_interval);
        self.sweep();
        Some(self.pending.pop_front().unwrap_or(SessionEvent::Idle))
    }

    fn watch_reports(
        &mut self,
        device: &HidDeviceHandle,
        capacity: usize,
    ) -> Result<(), RegistryError> {
        let opened = self
            .api
            .open_path(&device.path)
            .map_err(|e| RegistryError::Backend(e.to_string()))?;
        self.watched.insert(
            device.registry_id(),
            WatchedDevice {
                device: opened,
                capacity,
            },
        );
        Ok(())
    }

    fn unwatch_reports(&mut self, device: &HidDeviceHandle) {
        self.watched.remove(&device.registry_id());
        self.staged.remove(&device.registry_id());
    }

    fn read_report(
        &mut self,
        device: &HidDeviceHandle,
        buf: &mut [u8],
    ) -> Result<ReportMeta, RegistryError> {
        let staged = self
            .staged
            .remove(&device.registry_id())
            .ok_or_else(|| RegistryError::ReportRead("no report staged".into()))?;
        let len = staged.bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&staged.bytes[..len]);
        Ok(ReportMeta {
            report_type: ReportType::Input,
            report_id: 0,
            len,
            timestamp_micros: staged.timestamp_micros,
        })
    }
}

/// Empty criteria match everything, mirroring a registry session opened
/// without a matching dictionary.
fn criteria_match(
    criteria: &[MatchCriteria],
    vendor_id: u16,
    product_id: u16,
    usage_page: u16,
    usage: u16,
) -> bool {
    if criteria.is_empty() {
        return true;
    }
    criteria.iter().any(|c| {
        c.vendor_id == vendor_id
            && c.product_id == product_id
            && c.usage_page.map_or(true, |up| up == usage_page)
            && c.usage.map_or(true, |u| u == usage)
    })
}

fn epoch_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_criteria_match_all() {
        assert!(criteria_match(&[], 0x1234, 0x5678, 1, 6));
    }

    #[test]
    fn vid_pid_must_both_match() {
        let criteria = vec![MatchCriteria {
            vendor_id: 0x046d,
            product_id: 0xc52b,
            usage_page: None,
            usage: None,
        }];
        assert!(criteria_match(&criteria, 0x046d, 0xc52b, 1, 6));
        assert!(!criteria_match(&criteria, 0x046d, 0xc52c, 1, 6));
        assert!(!criteria_match(&criteria, 0x046e, 0xc52b, 1, 6));
    }

    #[test]
    fn usage_narrows_when_present() {
        let criteria = vec![MatchCriteria {
            vendor_id: 1,
            product_id: 2,
            usage_page: Some(0xff00),
            usage: Some(0x61),
        }];
        assert!(criteria_match(&criteria, 1, 2, 0xff00, 0x61));
        assert!(!criteria_match(&criteria, 1, 2, 0x0001, 0x61));
        assert!(!criteria_match(&criteria, 1, 2, 0xff00, 0x62));
    }

    #[test]
    fn any_entry_in_the_set_may_match() {
        let criteria = vec![
            MatchCriteria {
                vendor_id: 1,
                product_id: 2,
                usage_page: None,
                usage: None,
            },
            MatchCriteria {
                vendor_id: 3,
                product_id: 4,
                usage_page: None,
                usage: None,
            },
        ];
        assert!(criteria_match(&criteria, 3, 4, 1, 6));
        assert!(!criteria_match(&criteria, 3, 2, 1, 6));
    }
}
