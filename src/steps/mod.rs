//! Step execution.
//!
//! - [`LaunchLimiter`] - Process-wide launch permit with delayed release
//! - [`StepRunner`] - Runs one named step; the seam the workflow is built on
//! - [`ScriptExecutor`] - The `StepRunner` that invokes the step script
//! - [`StepResult`] - Captured output, duration, and [`StepOutcome`]
//!
//! # Example
//!
//! ```no_run
//! use deploytest::config::EnvList;
//! use deploytest::steps::{LaunchLimiter, ScriptExecutor, StepRunner};
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let limiter = Arc::new(LaunchLimiter::default());
//! let executor = ScriptExecutor::new(Path::new("/opt/regression"), limiter);
//!
//! let env = EnvList::from_system().with("LOCATION", "westus");
//! let result = executor.run_step("init", "predeploy", &env, Duration::from_secs(600));
//! if !result.is_success() {
//!     eprintln!("{} failed: {}", result.step, result.output);
//! }
//! ```

pub mod executor;
pub mod limiter;
pub mod names;

pub use executor::{ScriptExecutor, StepOutcome, StepResult, StepRunner, STEP_SCRIPT};
pub use limiter::{Clock, LaunchLimiter, ManualClock, SystemClock, DEFAULT_LAUNCH_SPACING};
