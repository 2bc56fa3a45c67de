//! Collaborator traits for the OS device registry.
//!
//! The registry service itself (enumeration, matching, property storage) is
//! not implemented here; the monitor only ever talks to it through these
//! traits. That keeps the dispatch logic host-agnostic and lets tests drive
//! it with scripted doubles.
//!
//! Property access is deliberately typed: [`RegistryDevice::int_property`] /
//! [`RegistryDevice::string_property`] return `None` on a missing key *or* a
//! type mismatch, never an error. Descriptor construction maps `None` onto
//! documented sentinel values.
//!
//! Service-plane entries ([`ServiceEntry`]) are owned values; dropping one
//! releases the underlying registry handle. Code that walks the ancestor
//! chain therefore cannot leak or double-release a handle.

use crate::filter::DeviceFilter;
use thiserror::Error;

/// Property keys the monitor reads from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    LocationId,
    Product,
    VendorId,
    ProductId,
    MaxInputReportSize,
    VersionNumber,
    SerialNumber,
    ReportInterval,
    InterfaceNumber,
}

/// Owned handle to one entry in the registry's service plane.
///
/// Dropping the value releases the handle.
pub trait ServiceEntry: Sized {
    /// The entry's first parent in the service plane, if any.
    fn parent(&self) -> Option<Self>;

    /// Direct (non-recursive) integer property read on this entry.
    fn int_property(&self, key: PropertyKey) -> Option<i64>;
}

/// A device object owned by the registry service.
///
/// The registry controls the device's lifetime; the monitor only borrows it
/// for property reads and for the duration of event delivery.
pub trait RegistryDevice {
    type Entry: ServiceEntry;

    /// Process-unique identity for this device object. Stable between the
    /// matched and removed events of one attachment.
    fn registry_id(&self) -> u64;

    /// Integer property, `None` on missing key or type mismatch.
    fn int_property(&self, key: PropertyKey) -> Option<i64>;

    /// String property, `None` on missing key or type mismatch.
    fn string_property(&self, key: PropertyKey) -> Option<String>;

    /// The device's underlying service-plane entry, if reachable.
    fn service_entry(&self) -> Option<Self::Entry>;
}

/// One matching-criteria record handed to the registry when opening a
/// session. Built from a [`DeviceFilter`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: Option<u16>,
    pub usage: Option<u16>,
}

impl From<&DeviceFilter> for MatchCriteria {
    fn from(filter: &DeviceFilter) -> Self {
        MatchCriteria {
            vendor_id: filter.vendor_id,
            product_id: filter.product_id,
            usage_page: filter.usage_page,
            usage: filter.usage,
        }
    }
}

/// Report classification as delivered by the host HID stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Input,
    Output,
    Feature,
}

/// Metadata for one report read out of a session.
///
/// `timestamp_micros` is accepted from the backend but not surfaced in
/// monitor events.
#[derive(Debug, Clone, Copy)]
pub struct ReportMeta {
    pub report_type: ReportType,
    pub report_id: u32,
    pub len: usize,
    pub timestamp_micros: u64,
}

/// Raw event delivered by an open session.
pub enum SessionEvent<D> {
    /// A device matching the session criteria appeared.
    Matched(D),
    /// A matched device was detached.
    Removed(D),
    /// An input report is ready to be read for this device.
    ReportReady(D),
    /// Heartbeat with no payload. Lets a backend bound how long
    /// `next_event` blocks so cancellation is observed.
    Idle,
}

/// An open matching session against the registry.
///
/// Events are delivered serially through [`next_event`](Self::next_event);
/// the caller owns the report buffers and passes them in for each read.
pub trait RegistrySession {
    type Device: RegistryDevice;

    /// Blocks until the next raw event. `None` means the event stream has
    /// ended and no further events will ever be delivered.
    fn next_event(&mut self) -> Option<SessionEvent<Self::Device>>;

    /// Arms input-report delivery for `device`. `capacity` is the most bytes
    /// a single report may carry; larger reports are truncated.
    fn watch_reports(
        &mut self,
        device: &Self::Device,
        capacity: usize,
    ) -> Result<(), RegistryError>;

    /// Disarms report delivery for `device`. Safe to call for a device that
    /// was never watched.
    fn unwatch_reports(&mut self, device: &Self::Device);

    /// Reads the pending report for `device` into `buf`, returning its
    /// metadata. Only valid after a `ReportReady` event for that device.
    fn read_report(
        &mut self,
        device: &Self::Device,
        buf: &mut [u8],
    ) -> Result<ReportMeta, RegistryError>;
}

/// Entry point to the registry service: opens a matching session scoped to a
/// set of criteria. Consumed on open; a session lives until dropped.
pub trait DeviceRegistry {
    type Session: RegistrySession;

    fn open_session(self, criteria: &[MatchCriteria]) -> Result<Self::Session, RegistryError>;
}

/// Failures surfaced by a registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry session open failed: {0}")]
    SessionOpen(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("report read failed: {0}")]
    ReportRead(String),

    #[error("backend error: {0}")]
    Backend(String),
}
