use crate::event::MonitorEvent;
use crate::eventbus::MonitorListener;
use log::{debug, info};

/// A stock listener that logs every monitor event through the `log` facade.
///
/// Connect/disconnect transitions log at `info`, report traffic at `debug`
/// so a chatty device doesn't drown the interesting transitions.
pub struct EventLogger;

impl EventLogger {
    pub fn new() -> Self {
        EventLogger
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        EventLogger::new()
    }
}

impl<D> MonitorListener<D> for EventLogger {
    fn on_event(&mut self, event: &MonitorEvent<'_, D>) {
        match event {
            MonitorEvent::Connected { descriptor, .. } => {
                info!(
                    "connected {:?} vid={:#06x} pid={:#06x} interface={} version={}",
                    descriptor.name,
                    descriptor.vendor_id,
                    descriptor.product_id,
                    descriptor.interface_id,
                    descriptor
                        .version
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "?".into()),
                );
            }
            MonitorEvent::Disconnected { location_id, .. } => {
                info!("disconnected location={location_id}");
            }
            MonitorEvent::ReportReceived {
                location_id,
                report_id,
                data,
                ..
            } => {
                debug!(
                    "report location={location_id} id={report_id} {} bytes: {:02x?}",
                    data.len(),
                    data
                );
            }
        }
    }
}
