//! Monitor events.
//!
//! Every event borrows its descriptor, buffer and registry device for the
//! duration of delivery only. In particular
//! [`ReportReceived`](MonitorEvent::ReportReceived) hands out two views of
//! the same report: `data`, a copy the listener may keep (clone it out), and
//! `buffer`, the monitor-owned backing buffer that is reused in place for
//! the next report. The borrow makes retaining `buffer` past the callback
//! impossible rather than merely discouraged.

use crate::descriptor::DeviceDescriptor;
use crate::registry::ReportType;

/// One monitoring event, delivered serially to the delegate and the event
/// bus.
pub enum MonitorEvent<'a, D> {
    /// A device matching one of the filters was attached.
    Connected {
        descriptor: &'a DeviceDescriptor,
        device: &'a D,
    },

    /// A matched device was detached. `descriptor` is re-read at removal
    /// time and may be partially populated; `location_id` is the last-known
    /// value cached at connect.
    Disconnected {
        location_id: i64,
        descriptor: &'a DeviceDescriptor,
        device: &'a D,
    },

    /// An input report arrived. `data` is the owned copy of exactly the
    /// received bytes; `buffer` is the live per-device buffer and is only
    /// valid during delivery.
    ReportReceived {
        location_id: i64,
        report_type: ReportType,
        report_id: u32,
        data: &'a [u8],
        buffer: &'a [u8],
        device: &'a D,
    },
}

impl<D> MonitorEvent<'_, D> {
    /// Location id of the device this event concerns, `-1` when unknown.
    pub fn location_id(&self) -> i64 {
        match self {
            MonitorEvent::Connected { descriptor, .. } => descriptor.location_id,
            MonitorEvent::Disconnected { location_id, .. } => *location_id,
            MonitorEvent::ReportReceived { location_id, .. } => *location_id,
        }
    }

    pub fn is_report(&self) -> bool {
        matches!(self, MonitorEvent::ReportReceived { .. })
    }
}
