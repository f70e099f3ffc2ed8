//! deploytest - Parallel regression runs of cluster deployments.
//!
//! Every deployment in a config file is taken through the same ordered
//! steps (create resource group, predeploy, generate template, deploy,
//! postdeploy, validate) by an external step script, with cleanup after
//! every attempt. Deployments run concurrently, failed attempts are
//! retried, step launches are spaced out globally, and every failure is
//! classified for a JSON report and optional statsd metrics.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and the run command
//! - [`config`] - Deployment config, run settings, env files
//! - [`error`] - Error types and result aliases
//! - [`metrics`] - Error aggregation and telemetry
//! - [`report`] - Failure classification and the test report
//! - [`runner`] - Workflow, retries and scheduling
//! - [`shell`] - Process execution with deadlines
//! - [`steps`] - Step execution and the launch limiter
//! - [`ui`] - Terminal status lines
//!
//! # Example
//!
//! ```
//! use deploytest::config::Deployment;
//! use deploytest::runner::resource_group_name;
//!
//! let deployment = Deployment::new("examples/kubernetes.json", "westus2");
//! assert_eq!(deployment.test_name(), "examples/kubernetes");
//! assert_eq!(
//!     resource_group_name("y", &deployment, "42", 0, 1),
//!     "y-examples-kubernetes-westus2-42-0-1"
//! );
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{DeployTestError, Result};
