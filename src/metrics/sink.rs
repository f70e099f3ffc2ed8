//! Metric transports.

use crate::error::Result;
use std::collections::BTreeMap;
use std::net::UdpSocket;

/// Default statsd endpoint; a leading `:` means localhost.
pub const METRICS_ENDPOINT: &str = ":8125";

/// Namespace all metrics are sent under.
pub const METRICS_NAMESPACE: &str = "ACSEngine";

/// Metric dimensions, ordered for stable payloads.
pub type Dimensions = BTreeMap<String, String>;

/// Accepts one metric value with its dimensions.
pub trait MetricsSink: Send + Sync {
    fn add_metric(&self, metric: &str, value: i64, dims: &Dimensions) -> Result<()>;
}

/// Sends each metric as one statsd gauge datagram whose name is a JSON
/// envelope: `{"Namespace":..,"Metric":..,"Dims":{..}}:<value>|g`.
#[derive(Debug, Clone)]
pub struct StatsdSink {
    endpoint: String,
    namespace: String,
}

impl StatsdSink {
    pub fn new(endpoint: &str, namespace: &str) -> Self {
        let endpoint = match endpoint.strip_prefix(':') {
            Some(port) => format!("127.0.0.1:{}", port),
            None => endpoint.to_string(),
        };
        Self {
            endpoint,
            namespace: namespace.to_string(),
        }
    }

    /// The resolved `host:port` datagrams go to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Render the datagram for one metric.
    pub fn payload(&self, metric: &str, value: i64, dims: &Dimensions) -> String {
        let envelope = serde_json::json!({
            "Namespace": self.namespace,
            "Metric": metric,
            "Dims": dims,
        });
        format!("{}:{}|g", envelope, value)
    }
}

impl Default for StatsdSink {
    fn default() -> Self {
        Self::new(METRICS_ENDPOINT, METRICS_NAMESPACE)
    }
}

impl MetricsSink for StatsdSink {
    fn add_metric(&self, metric: &str, value: i64, dims: &Dimensions) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.send_to(self.payload(metric, value, dims).as_bytes(), &self.endpoint)?;
        Ok(())
    }
}
