//! Run settings read from the environment.
//!
//! Everything a run needs from its CI job (credentials, timeouts, build
//! identity, toggles) is read once at startup into an immutable
//! [`RunSettings`] that is shared by reference with every deployment
//! worker. Nothing is written back into the process environment.

use crate::error::{DeployTestError, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Variables that must be set and non-empty for a run to start.
pub const REQUIRED_VARS: &[&str] = &[
    "SERVICE_PRINCIPAL_CLIENT_ID",
    "SERVICE_PRINCIPAL_CLIENT_SECRET",
    "TENANT_ID",
    "SUBSCRIPTION_ID",
    "STAGE_TIMEOUT_MIN",
    "JOB_BASE_NAME",
    "BUILD_NUMBER",
];

/// Resource-group prefix used when `RESOURCE_GROUP_PREFIX` is unset.
pub const DEFAULT_RESOURCE_GROUP_PREFIX: &str = "y";

/// Attempts per deployment when `NUM_OF_RETRIES` is unset or unparsable.
pub const DEFAULT_RETRIES: u32 = 1;

/// Immutable per-run settings.
///
/// Credentials and the subscription are only checked for presence here;
/// the step script reads them from the environment it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Wall-clock limit for any single step.
    pub stage_timeout: Duration,

    /// CI job name, recorded in the report.
    pub job_name: String,

    /// CI build number, part of every resource-group name.
    pub build_number: String,

    /// Maximum attempts per deployment.
    pub retries: u32,

    /// Prefix for resource-group names.
    pub resource_group_prefix: String,

    /// Whether failed deployments are cleaned up (`AUTOCLEAN` != `false`).
    pub autoclean: bool,

    /// Whether metrics are sent (`ENABLE_METRICS=y`).
    pub enable_metrics: bool,
}

impl RunSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through a lookup function.
    ///
    /// All missing required variables are reported together.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DeployTestError::MissingEnvironment { names: missing });
        }

        let require = |name: &str| get(name).unwrap_or_default();

        let timeout_raw = require("STAGE_TIMEOUT_MIN");
        let timeout_min: u64 =
            timeout_raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| DeployTestError::InvalidEnvironment {
                    name: "STAGE_TIMEOUT_MIN".to_string(),
                    message: e.to_string(),
                })?;
        let stage_timeout = timeout_min
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| DeployTestError::InvalidEnvironment {
                name: "STAGE_TIMEOUT_MIN".to_string(),
                message: format!("{} minutes is out of range", timeout_min),
            })?;

        let retries = match get("NUM_OF_RETRIES").map(|v| v.trim().parse::<u32>()) {
            Some(Ok(0)) => {
                warn!("NUM_OF_RETRIES is 0, running each deployment once");
                1
            }
            Some(Ok(n)) => n,
            _ => DEFAULT_RETRIES,
        };

        let resource_group_prefix = get("RESOURCE_GROUP_PREFIX").unwrap_or_else(|| {
            info!(
                "RESOURCE_GROUP_PREFIX is not set. Using default '{}'",
                DEFAULT_RESOURCE_GROUP_PREFIX
            );
            DEFAULT_RESOURCE_GROUP_PREFIX.to_string()
        });

        Ok(Self {
            stage_timeout,
            job_name: require("JOB_BASE_NAME"),
            build_number: require("BUILD_NUMBER"),
            retries,
            resource_group_prefix,
            autoclean: get("AUTOCLEAN").as_deref() != Some("false"),
            enable_metrics: get("ENABLE_METRICS").as_deref() == Some("y"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SERVICE_PRINCIPAL_CLIENT_ID", "client"),
            ("SERVICE_PRINCIPAL_CLIENT_SECRET", "secret"),
            ("TENANT_ID", "tenant"),
            ("SUBSCRIPTION_ID", "sub-123"),
            ("STAGE_TIMEOUT_MIN", "30"),
            ("JOB_BASE_NAME", "dcos-regression"),
            ("BUILD_NUMBER", "42"),
        ])
    }

    fn settings(env: &HashMap<&str, &str>) -> Result<RunSettings> {
        RunSettings::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn reads_required_values() {
        let s = settings(&base_env()).unwrap();
        assert_eq!(s.stage_timeout, Duration::from_secs(30 * 60));
        assert_eq!(s.job_name, "dcos-regression");
        assert_eq!(s.build_number, "42");
    }

    #[test]
    fn applies_optional_defaults() {
        let s = settings(&base_env()).unwrap();
        assert_eq!(s.retries, 1);
        assert_eq!(s.resource_group_prefix, "y");
        assert!(s.autoclean);
        assert!(!s.enable_metrics);
    }

    #[test]
    fn reports_all_missing_variables() {
        let mut env = base_env();
        env.remove("TENANT_ID");
        env.insert("BUILD_NUMBER", "");

        match settings(&env).unwrap_err() {
            DeployTestError::MissingEnvironment { names } => {
                assert_eq!(names, vec!["TENANT_ID", "BUILD_NUMBER"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let mut env = base_env();
        env.insert("STAGE_TIMEOUT_MIN", "soon");
        assert!(matches!(
            settings(&env).unwrap_err(),
            DeployTestError::InvalidEnvironment { .. }
        ));
    }

    #[test]
    fn rejects_timeout_that_overflows() {
        let mut env = base_env();
        env.insert("STAGE_TIMEOUT_MIN", "307445734561825861");
        match settings(&env).unwrap_err() {
            DeployTestError::InvalidEnvironment { name, .. } => {
                assert_eq!(name, "STAGE_TIMEOUT_MIN");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reads_optional_overrides() {
        let mut env = base_env();
        env.insert("NUM_OF_RETRIES", "3");
        env.insert("RESOURCE_GROUP_PREFIX", "ci");
        env.insert("AUTOCLEAN", "false");
        env.insert("ENABLE_METRICS", "y");

        let s = settings(&env).unwrap();
        assert_eq!(s.retries, 3);
        assert_eq!(s.resource_group_prefix, "ci");
        assert!(!s.autoclean);
        assert!(s.enable_metrics);
    }

    #[test]
    fn unparsable_retries_falls_back_to_default() {
        let mut env = base_env();
        env.insert("NUM_OF_RETRIES", "many");
        assert_eq!(settings(&env).unwrap().retries, 1);
    }

    #[test]
    fn zero_retries_still_runs_once() {
        let mut env = base_env();
        env.insert("NUM_OF_RETRIES", "0");
        assert_eq!(settings(&env).unwrap().retries, 1);
    }

    #[test]
    fn metrics_need_exact_flag() {
        let mut env = base_env();
        env.insert("ENABLE_METRICS", "yes");
        assert!(!settings(&env).unwrap().enable_metrics);
    }
}
