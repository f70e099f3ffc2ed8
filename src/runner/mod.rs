//! Deployment orchestration.
//!
//! - [`DeploymentWorkflow`] - One attempt: discovery, ordered steps, cleanup
//! - [`RetryController`] - Repeats attempts up to a budget
//! - [`Scheduler`] - One concurrent controller per deployment
//!
//! # Example
//!
//! ```no_run
//! use deploytest::config::{Deployment, EnvList, RunSettings};
//! use deploytest::metrics::MetricsEmitter;
//! use deploytest::report::{ErrorPatterns, ReportManager};
//! use deploytest::runner::{DeploymentWorkflow, RunContext, Scheduler};
//! use deploytest::steps::{LaunchLimiter, ScriptExecutor};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # fn main() -> deploytest::Result<()> {
//! let settings = RunSettings::from_env()?;
//! let work_dir = PathBuf::from("/opt/deploytest");
//! let run = RunContext {
//!     settings: settings.clone(),
//!     base_env: EnvList::from_system(),
//!     work_dir: work_dir.clone(),
//!     log_dir: work_dir.join("_logs"),
//! };
//! let deployments = vec![Deployment::new("kubernetes.json", "westus2")];
//!
//! let executor = ScriptExecutor::new(&work_dir, Arc::new(LaunchLimiter::default()));
//! let report = ReportManager::new("job", "1", deployments.len(), ErrorPatterns::default());
//! let metrics = MetricsEmitter::disabled();
//! let workflow = DeploymentWorkflow::new(&executor, &report, &metrics, &run);
//!
//! let result = Scheduler::new(
//!     &workflow,
//!     &report,
//!     &metrics,
//!     settings.retries,
//!     settings.stage_timeout,
//!     run.log_dir.join("TestReport.json"),
//! )
//! .run(&deployments);
//! assert!(result.success());
//! # Ok(())
//! # }
//! ```

pub mod attempt_log;
pub mod context;
pub mod retry;
pub mod scheduler;
pub mod workflow;

pub use attempt_log::AttemptLog;
pub use context::{
    cluster_definition_path, instance_name, resource_group_name, AttemptContext, RunContext,
    CLUSTER_DEFS_DIR,
};
pub use retry::{RetryController, RetryOutcome};
pub use scheduler::{RunResult, Scheduler};
pub use workflow::{AttemptRunner, DeploymentWorkflow, NodeCount};
