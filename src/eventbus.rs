//! Per-monitor observer list.
//!
//! Each [`DeviceMonitor`](crate::monitor::DeviceMonitor) owns one
//! [`MonitorEventBus`]; there is no process-global notification channel.
//! Listeners can be muted and re-enabled without re-registering, restricted
//! to an event kind, or pinned to a single device's location id.

use crate::event::MonitorEvent;
use std::collections::HashMap;

/// Trait for reacting to monitor events.
///
/// `D` is the registry-device type of the backend the monitor runs against.
/// Borrows inside the event end with the call; clone out whatever must be
/// kept.
pub trait MonitorListener<D>: Send {
    fn on_event(&mut self, event: &MonitorEvent<'_, D>);
}

impl<D, F> MonitorListener<D> for F
where
    F: FnMut(&MonitorEvent<'_, D>) + Send,
{
    fn on_event(&mut self, event: &MonitorEvent<'_, D>) {
        self(event)
    }
}

/// Determines which kinds of events a listener wants to receive.
pub enum EventFilter<D> {
    All,
    ConnectionsOnly,
    ReportsOnly,
    Custom(fn(&MonitorEvent<'_, D>) -> bool),
}

impl<D> Clone for EventFilter<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for EventFilter<D> {}

/// Metadata-wrapped listener with filter and control flags.
struct ListenerEntry<D> {
    listener: Box<dyn MonitorListener<D>>,
    enabled: bool,
    filter: EventFilter<D>,
    /// When set, only events for this location id are delivered.
    location: Option<i64>,
}

pub struct MonitorEventBus<D> {
    next_id: u64,
    listeners: HashMap<u64, ListenerEntry<D>>,
}

impl<D> MonitorEventBus<D> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    /// Registers a listener with optional filtering and location pinning.
    /// Returns the id used for later enable/disable/remove calls.
    pub fn add_listener(
        &mut self,
        listener: impl MonitorListener<D> + 'static,
        filter: EventFilter<D>,
        location: Option<i64>,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                location,
            },
        );
        self.next_id += 1;
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely.
    pub fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one event to all active and matching listeners.
    pub(crate) fn emit(&mut self, event: &MonitorEvent<'_, D>) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }

            if let Some(wanted) = entry.location {
                if event.location_id() != wanted {
                    continue;
                }
            }

            let passes_filter = match entry.filter {
                EventFilter::All => true,
                EventFilter::ConnectionsOnly => !event.is_report(),
                EventFilter::ReportsOnly => event.is_report(),
                EventFilter::Custom(f) => f(event),
            };

            if passes_filter {
                entry.listener.on_event(event);
            }
        }
    }
}

impl<D> Default for MonitorEventBus<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DeviceDescriptor;
    use crate::registry::test_double::FakeDevice;
    use std::sync::{Arc, Mutex};

    fn descriptor_at(location_id: i64) -> DeviceDescriptor {
        let dev = FakeDevice::with_id(1);
        let mut d = DeviceDescriptor::from_device(&dev);
        d.location_id = location_id;
        d
    }

    fn recorder(log: Arc<Mutex<Vec<i64>>>) -> impl MonitorListener<FakeDevice> {
        move |event: &MonitorEvent<'_, FakeDevice>| {
            log.lock().unwrap().push(event.location_id());
        }
    }

    #[test]
    fn disabled_listener_is_muted() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = MonitorEventBus::new();
        let id = bus.add_listener(recorder(Arc::clone(&log)), EventFilter::All, None);

        let descriptor = descriptor_at(7);
        let device = FakeDevice::with_id(1);
        let event = MonitorEvent::Connected {
            descriptor: &descriptor,
            device: &device,
        };

        bus.emit(&event);
        bus.disable(id);
        bus.emit(&event);
        bus.enable(id);
        bus.emit(&event);

        assert_eq!(log.lock().unwrap().as_slice(), &[7, 7]);
    }

    #[test]
    fn removed_listener_receives_nothing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = MonitorEventBus::new();
        let id = bus.add_listener(recorder(Arc::clone(&log)), EventFilter::All, None);
        bus.remove_listener(id);
        assert!(bus.is_empty());

        let descriptor = descriptor_at(7);
        let device = FakeDevice::with_id(1);
        bus.emit(&MonitorEvent::Connected {
            descriptor: &descriptor,
            device: &device,
        });
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn location_pin_and_kind_filter_route_events() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = MonitorEventBus::new();
        bus.add_listener(
            recorder(Arc::clone(&log)),
            EventFilter::ReportsOnly,
            Some(7),
        );

        let descriptor = descriptor_at(7);
        let device = FakeDevice::with_id(1);

        // Wrong kind: connection event filtered out despite matching location.
        bus.emit(&MonitorEvent::Connected {
            descriptor: &descriptor,
            device: &device,
        });

        // Wrong location: report filtered out.
        bus.emit(&MonitorEvent::ReportReceived {
            location_id: 9,
            report_type: crate::registry::ReportType::Input,
            report_id: 0,
            data: &[1],
            buffer: &[1],
            device: &device,
        });

        // Matching report passes.
        bus.emit(&MonitorEvent::ReportReceived {
            location_id: 7,
            report_type: crate::registry::ReportType::Input,
            report_id: 0,
            data: &[1],
            buffer: &[1],
            device: &device,
        });

        assert_eq!(log.lock().unwrap().as_slice(), &[7]);
    }

    #[test]
    fn custom_filter_is_applied() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = MonitorEventBus::new();
        bus.add_listener(
            recorder(Arc::clone(&log)),
            EventFilter::Custom(|e| e.location_id() > 10),
            None,
        );

        let low = descriptor_at(5);
        let high = descriptor_at(15);
        let device = FakeDevice::with_id(1);
        bus.emit(&MonitorEvent::Connected {
            descriptor: &low,
            device: &device,
        });
        bus.emit(&MonitorEvent::Connected {
            descriptor: &high,
            device: &device,
        });

        assert_eq!(log.lock().unwrap().as_slice(), &[15]);
    }
}
