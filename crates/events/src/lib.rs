//! Panotour analytics events.
//!
//! - [`AnalyticsSink`]: the fire-and-forget port viewers record into.
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, itself a sink.
//! - [`AnalyticsEvent`]: the interaction event envelope.
//! - [`AnalyticsRecorder`]: background service folding bus events into an
//!   [`AnalyticsStore`].

pub mod bus;
pub mod recorder;
pub mod sink;

pub use bus::{AnalyticsEvent, AnalyticsEventType, EventBus};
pub use recorder::{AnalyticsRecorder, AnalyticsStore, AnalyticsSummary};
pub use sink::{AnalyticsSink, NullSink};
