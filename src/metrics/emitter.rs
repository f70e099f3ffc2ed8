//! Best-effort telemetry for deployments.
//!
//! Nothing here can fail a run: transport errors are logged and dropped,
//! and a disabled emitter does nothing at all.

use crate::metrics::aggregate::ErrorStats;
use crate::metrics::sink::{Dimensions, MetricsSink};
use crate::steps::names::{DEPLOY_TEMPLATE, VALIDATE};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const METRIC_ERROR: &str = "Error";
pub const METRIC_DEPLOYMENT_DURATION: &str = "DeploymentDuration";
pub const METRIC_VALIDATION_DURATION: &str = "ValidationDuration";

/// Emits error and duration metrics when a sink is configured.
#[derive(Clone, Default)]
pub struct MetricsEmitter {
    sink: Option<Arc<dyn MetricsSink>>,
}

impl MetricsEmitter {
    /// An emitter that sends to `sink`.
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// An emitter that sends nothing.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// One `Error` metric per error kind, valued by its occurrence count.
    pub fn send_error_stats(&self, stats: &ErrorStats) {
        let Some(sink) = &self.sink else {
            return;
        };
        for stat in stats.iter() {
            let record = &stat.record;
            let dims = Dimensions::from([
                ("TestName".to_string(), record.test_name.clone()),
                ("TestCategory".to_string(), stat.test_category.clone()),
                ("Location".to_string(), record.location.clone()),
                ("Error".to_string(), record.error.clone()),
                ("Class".to_string(), record.phase.clone()),
                ("Severity".to_string(), stat.severity().to_string()),
            ]);
            let value = i64::try_from(stat.count).unwrap_or(i64::MAX);
            if let Err(e) = sink.add_metric(METRIC_ERROR, value, &dims) {
                warn!("Failed to send metric: {}", e);
            }
        }
    }

    /// Duration in whole seconds, for the deploy and validate steps only.
    pub fn send_duration(&self, step: &str, location: &str, duration: Duration, error: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        let metric = match step {
            DEPLOY_TEMPLATE => METRIC_DEPLOYMENT_DURATION,
            VALIDATE => METRIC_VALIDATION_DURATION,
            _ => return,
        };
        let dims = Dimensions::from([
            ("Location".to_string(), location.to_string()),
            ("Error".to_string(), error.to_string()),
        ]);
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        if let Err(e) = sink.add_metric(metric, secs, &dims) {
            warn!("Failed to send metric: {}", e);
        }
    }
}

impl std::fmt::Debug for MetricsEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEmitter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
