//! The device-monitoring engine.
//!
//! A [`DeviceMonitor`] owns the matching-filter set, the delegate slot, the
//! event bus and one report buffer per connected device. [`start`]
//! (DeviceMonitor::start) opens a registry session scoped to the filters and
//! then blocks the calling thread, dispatching matched/removed/report events
//! serially until the session's event stream ends or the monitor's
//! [`CancelToken`] fires.
//!
//! ## Ordering and ownership
//! For a single device the monitor emits `Connected`, then `ReportReceived`
//! in arrival order, then `Disconnected`; events for one monitor are never
//! delivered concurrently. Report buffers are owned by the monitor from
//! connect to just after the `Disconnected` emission and are reused in place
//! between reports; listeners get an owned copy of each payload.
//!
//! One `start` per monitor instance: restarting a monitor that already ran,
//! or starting it from two threads, is caller error.

use crate::config::MonitorConfig;
use crate::descriptor::DeviceDescriptor;
use crate::event::MonitorEvent;
use crate::eventbus::{EventFilter, MonitorEventBus, MonitorListener};
use crate::filter::DeviceFilter;
use crate::registry::{
    DeviceRegistry, MatchCriteria, RegistryDevice, RegistryError, RegistrySession, SessionEvent,
};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Fatal monitor failures. Everything else degrades (sentinel descriptor
/// fields, skipped events) rather than aborting the dispatch loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The registry refused to open a matching session. Not retried
    /// internally; reconstruct the registry and call `start` again.
    #[error("failed to open registry session")]
    SessionOpen(#[from] RegistryError),
}

/// Requests that a running monitor leave its dispatch loop.
///
/// Cloneable and sendable; checked between dispatches, so a callback in
/// flight always finishes. Without a cancel the loop runs until the backend's
/// event stream ends, which for a live registry means process exit.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Book-keeping for one connected device.
struct MonitoredDevice {
    /// Report buffer, sized once at connect and reused for every report.
    buffer: Vec<u8>,
    /// Connect-time snapshot; source of the last-known location id.
    descriptor: DeviceDescriptor,
}

pub struct DeviceMonitor<D: RegistryDevice> {
    filters: Vec<DeviceFilter>,
    fallback_report_size: usize,
    delegate: Option<Box<dyn MonitorListener<D>>>,
    bus: MonitorEventBus<D>,
    devices: HashMap<u64, MonitoredDevice>,
    cancel: CancelToken,
}

impl<D: RegistryDevice> DeviceMonitor<D> {
    /// `fallback_report_size` is used for devices that do not report a
    /// usable `max_input_report_size`; it must be non-zero.
    pub fn new(filters: Vec<DeviceFilter>, fallback_report_size: usize) -> Self {
        DeviceMonitor {
            filters,
            fallback_report_size,
            delegate: None,
            bus: MonitorEventBus::new(),
            devices: HashMap::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn from_config(config: MonitorConfig) -> Self {
        DeviceMonitor::new(config.filters, config.fallback_report_size)
    }

    /// Installs the single delegate. Replaces any previous one.
    pub fn set_delegate(&mut self, delegate: impl MonitorListener<D> + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    /// Registers a broadcast listener; see [`MonitorEventBus::add_listener`].
    pub fn add_listener(
        &mut self,
        listener: impl MonitorListener<D> + 'static,
        filter: EventFilter<D>,
        location: Option<i64>,
    ) -> u64 {
        self.bus.add_listener(listener, filter, location)
    }

    pub fn remove_listener(&mut self, id: u64) {
        self.bus.remove_listener(id);
    }

    /// The listener registry, for enable/disable control.
    pub fn bus_mut(&mut self) -> &mut MonitorEventBus<D> {
        &mut self.bus
    }

    /// Token that stops the dispatch loop from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn filters(&self) -> &[DeviceFilter] {
        &self.filters
    }

    /// Opens a matching session and dispatches events until the stream ends
    /// or the cancel token fires. Blocks the calling thread for its entire
    /// runtime; session-open failure is the only error path.
    pub fn start<R>(&mut self, registry: R) -> Result<(), MonitorError>
    where
        R: DeviceRegistry,
        R::Session: RegistrySession<Device = D>,
    {
        let criteria: Vec<MatchCriteria> = self.filters.iter().map(MatchCriteria::from).collect();
        let mut session = registry.open_session(&criteria)?;
        debug!(
            "registry session open, {} matching criteria",
            criteria.len()
        );

        while !self.cancel.is_cancelled() {
            let Some(event) = session.next_event() else {
                debug!("registry event stream ended");
                break;
            };
            match event {
                SessionEvent::Matched(device) => self.handle_matched(&mut session, device),
                SessionEvent::Removed(device) => self.handle_removed(&mut session, device),
                SessionEvent::ReportReady(device) => self.handle_report(&mut session, device),
                SessionEvent::Idle => {}
            }
        }

        // Loop left by cancellation or stream end: the session drops here,
        // releasing its registration; per-device buffers go with it.
        self.devices.clear();
        Ok(())
    }

    fn handle_matched<S: RegistrySession<Device = D>>(&mut self, session: &mut S, device: D) {
        let descriptor = DeviceDescriptor::from_device(&device);
        let capacity = if descriptor.max_input_report_size > 0 {
            descriptor.max_input_report_size as usize
        } else {
            self.fallback_report_size
        };

        if let Err(err) = session.watch_reports(&device, capacity) {
            // The device is still tracked and Connected still fires; it
            // just won't deliver reports.
            warn!(
                "input-report registration failed for {:?} (location {}): {err}",
                descriptor.name, descriptor.location_id
            );
        }

        self.devices.insert(
            device.registry_id(),
            MonitoredDevice {
                buffer: vec![0u8; capacity],
                descriptor: descriptor.clone(),
            },
        );
        debug!(
            "connected: {:?} vid={:#06x} pid={:#06x} buffer={}B",
            descriptor.name, descriptor.vendor_id, descriptor.product_id, capacity
        );

        let event = MonitorEvent::Connected {
            descriptor: &descriptor,
            device: &device,
        };
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.on_event(&event);
        }
        self.bus.emit(&event);
    }

    fn handle_report<S: RegistrySession<Device = D>>(&mut self, session: &mut S, device: D) {
        let key = device.registry_id();
        let Some(slot) = self.devices.get_mut(&key) else {
            debug!("dropping report for untracked device {key}");
            return;
        };

        let meta = match session.read_report(&device, &mut slot.buffer) {
            Ok(meta) => meta,
            Err(err) => {
                warn!("report read failed for device {key}: {err}");
                return;
            }
        };

        let len = meta.len.min(slot.buffer.len());
        let data = slot.buffer[..len].to_vec();

        let event = MonitorEvent::ReportReceived {
            location_id: slot.descriptor.location_id,
            report_type: meta.report_type,
            report_id: meta.report_id,
            data: &data,
            buffer: &slot.buffer,
            device: &device,
        };
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.on_event(&event);
        }
        self.bus.emit(&event);
    }

    fn handle_removed<S: RegistrySession<Device = D>>(&mut self, session: &mut S, device: D) {
        let key = device.registry_id();
        // Property reads may already come back empty; the descriptor then
        // carries sentinels.
        let descriptor = DeviceDescriptor::from_device(&device);
        let location_id = self
            .devices
            .get(&key)
            .map(|slot| slot.descriptor.location_id)
            .unwrap_or(descriptor.location_id);
        debug!("disconnected: location {location_id}");

        let event = MonitorEvent::Disconnected {
            location_id,
            descriptor: &descriptor,
            device: &device,
        };
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.on_event(&event);
        }
        self.bus.emit(&event);

        // Only after the emission: unregister and release the buffer.
        session.unwatch_reports(&device);
        self.devices.remove(&key);
    }
}
