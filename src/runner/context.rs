//! Run-wide and per-attempt context.
//!
//! [`RunContext`] holds what every deployment shares and never changes
//! during a run. [`AttemptContext`] is derived from it for each attempt and
//! owns everything that varies per attempt (names, environment, log file),
//! so concurrent deployments never write to shared state.

use crate::config::{Deployment, EnvList, RunSettings};
use crate::runner::attempt_log::AttemptLog;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Directory of cluster definitions, relative to the working directory.
pub const CLUSTER_DEFS_DIR: &str = "../cluster-defs";

/// Shared, immutable inputs for every attempt of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Settings read from the CI environment.
    pub settings: RunSettings,

    /// Environment every step starts from.
    pub base_env: EnvList,

    /// Directory the step script runs in.
    pub work_dir: PathBuf,

    /// Directory for attempt logs and the report.
    pub log_dir: PathBuf,
}

impl RunContext {
    /// Path of the scenario env file for a deployment.
    pub fn scenario_env_file(&self, deployment: &Deployment) -> PathBuf {
        self.work_dir
            .join(CLUSTER_DEFS_DIR)
            .join(format!("{}.env", deployment.cluster_definition))
    }
}

/// Names and environment for one attempt of one deployment.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    /// Reported test name: cluster definition without extension.
    pub test_name: String,

    /// Resource group created for this attempt.
    pub resource_group: String,

    /// Cluster instance name, also used as the deployment name.
    pub instance_name: String,

    /// Step environment before discovery.
    pub env: EnvList,

    /// Log receiving every step's output.
    pub log: AttemptLog,
}

impl AttemptContext {
    pub fn new(run: &RunContext, deployment: &Deployment, index: usize, attempt: u32) -> Self {
        let resource_group = resource_group_name(
            &run.settings.resource_group_prefix,
            deployment,
            &run.settings.build_number,
            index,
            attempt,
        );
        let instance_name = instance_name(&resource_group);
        let log = AttemptLog::new(&run.log_dir, &resource_group);

        let env = run.base_env.clone().with(
            "CLUSTER_DEFINITION",
            cluster_definition_path(&deployment.cluster_definition),
        );

        Self {
            test_name: deployment.test_name().to_string(),
            resource_group,
            instance_name,
            env,
            log,
        }
    }
}

/// `{prefix}-{sanitized test name}-{location}-{build}-{index}-{attempt}`.
pub fn resource_group_name(
    prefix: &str,
    deployment: &Deployment,
    build_number: &str,
    index: usize,
    attempt: u32,
) -> String {
    format!(
        "{}-{}-{}-{}-{}-{}",
        prefix,
        deployment.sanitized_name(),
        deployment.location,
        build_number,
        index,
        attempt
    )
}

/// `acse` followed by seven hex digits of the resource group's SHA-256.
pub fn instance_name(resource_group: &str) -> String {
    let hash = Sha256::digest(resource_group.as_bytes());
    let hex = hex::encode(&hash[..4]);
    format!("acse{}", &hex[..7])
}

/// Cluster definition path as seen from the working directory.
pub fn cluster_definition_path(cluster_definition: &str) -> String {
    Path::new(CLUSTER_DEFS_DIR)
        .join(cluster_definition)
        .to_string_lossy()
        .into_owned()
}
