//! Step execution engine.
//!
//! A step is one invocation of the step script with a step name argument.
//! [`ScriptExecutor`] takes a launch permit, runs the script under the
//! stage timeout, and folds every way a process can end into a
//! [`StepResult`].

use crate::config::EnvList;
use crate::shell::{execute, CommandOptions};
use crate::steps::limiter::LaunchLimiter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Step script location relative to the working directory.
pub const STEP_SCRIPT: &str = "script/step.sh";

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Exited with code 0.
    Success,

    /// Exited non-zero, was killed by a signal, or never started.
    Failed { exit_code: Option<i32> },

    /// Killed at the stage timeout.
    TimedOut,
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Success => write!(f, "success"),
            StepOutcome::Failed {
                exit_code: Some(code),
            } => write!(f, "exit code {}", code),
            StepOutcome::Failed { exit_code: None } => write!(f, "terminated"),
            StepOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of running one step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name.
    pub step: String,

    /// Combined stdout and stderr.
    pub output: String,

    /// Time from launch to exit.
    pub duration: Duration,

    /// How the step ended.
    pub outcome: StepOutcome,
}

impl StepResult {
    /// Create a success result.
    pub fn success(step: &str, output: impl Into<String>, duration: Duration) -> Self {
        Self {
            step: step.to_string(),
            output: output.into(),
            duration,
            outcome: StepOutcome::Success,
        }
    }

    /// Create a failure result.
    pub fn failure(
        step: &str,
        output: impl Into<String>,
        duration: Duration,
        exit_code: Option<i32>,
    ) -> Self {
        Self {
            step: step.to_string(),
            output: output.into(),
            duration,
            outcome: StepOutcome::Failed { exit_code },
        }
    }

    /// Create a timeout result.
    pub fn timed_out(step: &str, output: impl Into<String>, duration: Duration) -> Self {
        Self {
            step: step.to_string(),
            output: output.into(),
            duration,
            outcome: StepOutcome::TimedOut,
        }
    }

    /// Whether the step succeeded. Timeouts count as failures.
    pub fn is_success(&self) -> bool {
        self.outcome == StepOutcome::Success
    }
}

/// Runs named steps.
///
/// `name` tags log lines (usually the attempt's resource group); `step` is
/// the argument passed to the step script.
pub trait StepRunner: Send + Sync {
    fn run_step(&self, name: &str, step: &str, env: &EnvList, timeout: Duration) -> StepResult;
}

/// Runs steps through the step script, one launch permit per step.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    work_dir: PathBuf,
    script: PathBuf,
    limiter: Arc<LaunchLimiter>,
}

impl ScriptExecutor {
    /// Executor for `<work_dir>/script/step.sh`.
    pub fn new(work_dir: &Path, limiter: Arc<LaunchLimiter>) -> Self {
        Self::with_script(work_dir, work_dir.join(STEP_SCRIPT), limiter)
    }

    /// Executor for an explicit script path.
    pub fn with_script(work_dir: &Path, script: PathBuf, limiter: Arc<LaunchLimiter>) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            script,
            limiter,
        }
    }

    /// The working directory steps run in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

impl StepRunner for ScriptExecutor {
    fn run_step(&self, name: &str, step: &str, env: &EnvList, timeout: Duration) -> StepResult {
        let granted = self.limiter.acquire();
        debug!(step, name, granted_ms = granted.as_millis() as u64, "launch permit granted");

        let options = CommandOptions {
            cwd: Some(self.work_dir.clone()),
            env: env.clone(),
            timeout: Some(timeout),
        };

        let result = match execute(&self.script, &[step], &options) {
            Ok(r) if r.timed_out => {
                let mut output = r.output;
                output.push_str(&format!(
                    "\nstep '{}' did not finish within {}s and was killed\n",
                    step,
                    timeout.as_secs()
                ));
                StepResult::timed_out(step, output, r.duration)
            }
            Ok(r) if r.success => StepResult::success(step, r.output, r.duration),
            Ok(r) => StepResult::failure(step, r.output, r.duration, r.exit_code),
            Err(e) => StepResult::failure(step, e.to_string(), Duration::ZERO, None),
        };

        let now = chrono::Local::now().format("%H:%M:%S");
        if result.is_success() {
            info!("SUCCESS [{}] [{} {}]", now, step, name);
        } else {
            error!("ERROR [{}] [{} {}] {}", now, step, name, result.outcome);
        }
        result
    }
}
