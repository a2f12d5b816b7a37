//! The analytics sink port.

use std::sync::Arc;

use crate::bus::AnalyticsEvent;

/// Receives viewer interaction events.
///
/// `record` is fire-and-forget: it must not block and never reports
/// failure to the caller. Implementations swallow (and may log) delivery
/// errors at this boundary.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}

impl<T: AnalyticsSink + ?Sized> AnalyticsSink for Arc<T> {
    fn record(&self, event: AnalyticsEvent) {
        (**self).record(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&self, _event: AnalyticsEvent) {}
}
