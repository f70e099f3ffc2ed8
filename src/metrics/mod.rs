//! Error aggregation and telemetry.
//!
//! - [`ErrorStats`] - Failed attempts per error kind for one deployment
//! - [`Severity`] - Critical (recurring) vs Intermittent (once)
//! - [`MetricsEmitter`] - Sends error and duration metrics, best effort
//! - [`MetricsSink`] / [`StatsdSink`] - Metric transport

pub mod aggregate;
pub mod emitter;
pub mod sink;

pub use aggregate::{ErrorStat, ErrorStats, Severity};
pub use emitter::{
    MetricsEmitter, METRIC_DEPLOYMENT_DURATION, METRIC_ERROR, METRIC_VALIDATION_DURATION,
};
pub use sink::{Dimensions, MetricsSink, StatsdSink, METRICS_ENDPOINT, METRICS_NAMESPACE};
