//! Deployment configuration schema.
//!
//! The configuration file is a JSON object holding an ordered list of
//! deployments. Order matters: a deployment's position is its run index,
//! which feeds into every resource-group name derived for it.

use serde::{Deserialize, Serialize};

/// Test category used when a deployment does not name one.
pub const DEFAULT_TEST_CATEGORY: &str = "generic";

/// Root of a deployment configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Deployments to test, in run-index order.
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

/// One cluster configuration to deploy and validate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Cluster definition path, relative to the cluster-defs directory.
    pub cluster_definition: String,

    /// Target location (region).
    pub location: String,

    /// Orchestrator release override passed to the step script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_release: Option<String>,

    /// Category used to tag error metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_category: Option<String>,
}

impl Deployment {
    /// Create a deployment for a cluster definition and location.
    pub fn new(cluster_definition: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            cluster_definition: cluster_definition.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    /// The cluster definition with its file extension removed.
    ///
    /// Only an extension in the last path element is stripped, so
    /// `examples/dcos-1.10.json` becomes `examples/dcos-1.10`.
    pub fn test_name(&self) -> &str {
        let def = self.cluster_definition.as_str();
        let file_start = def.rfind('/').map(|i| i + 1).unwrap_or(0);
        match def[file_start..].rfind('.') {
            Some(dot) => &def[..file_start + dot],
            None => def,
        }
    }

    /// The test name with path separators flattened, safe for resource names.
    pub fn sanitized_name(&self) -> String {
        self.test_name().replace('/', "-")
    }

    /// The test category, falling back to [`DEFAULT_TEST_CATEGORY`].
    pub fn category(&self) -> &str {
        match self.test_category.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => DEFAULT_TEST_CATEGORY,
        }
    }

    /// The orchestrator release override, if one is set and non-empty.
    pub fn release(&self) -> Option<&str> {
        self.orchestrator_release
            .as_deref()
            .filter(|r| !r.is_empty())
    }
}
