use crate::event::MonitorEvent;
use crate::eventbus::MonitorListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
///
/// Useful when the stock [`EventFilter`](crate::eventbus::EventFilter)
/// variants are too coarse and the predicate needs captured state.
pub struct FilteredListener<D> {
    predicate: Box<dyn Fn(&MonitorEvent<'_, D>) -> bool + Send + Sync>,
    inner: Box<dyn MonitorListener<D>>,
}

impl<D> FilteredListener<D> {
    pub fn new(
        predicate: impl Fn(&MonitorEvent<'_, D>) -> bool + Send + Sync + 'static,
        inner: Box<dyn MonitorListener<D>>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }
}

impl<D> MonitorListener<D> for FilteredListener<D> {
    fn on_event(&mut self, event: &MonitorEvent<'_, D>) {
        if (self.predicate)(event) {
            self.inner.on_event(event);
        }
    }
}
