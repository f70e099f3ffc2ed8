//! Run command implementation.
//!
//! Validates inputs and environment, prepares the log and data
//! directories, runs the run-level setup steps, and hands the deployments
//! to the [`Scheduler`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::cli::args::Cli;
use crate::config::{load_test_config, validate, EnvList, RunSettings, TestConfig};
use crate::error::{DeployTestError, Result};
use crate::metrics::{MetricsEmitter, StatsdSink};
use crate::report::{ErrorPatterns, ReportManager, TEST_REPORT};
use crate::runner::{DeploymentWorkflow, RunContext, Scheduler};
use crate::steps::names::{GET_SECRETS, SET_AZURE_ACCOUNT};
use crate::steps::{
    LaunchLimiter, ScriptExecutor, StepRunner, DEFAULT_LAUNCH_SPACING, STEP_SCRIPT,
};
use crate::ui::{format_duration, Console};

use super::CommandResult;

/// Log directory, recreated for every run.
pub const LOG_DIR: &str = "_logs";

/// Data directory setup steps write secrets into.
pub const DATA_DIR: &str = "_data";

/// Validated command-line inputs.
#[derive(Debug)]
struct Inputs {
    config: TestConfig,
    engine: PathBuf,
    patterns: ErrorPatterns,
    work_dir: PathBuf,
}

/// The run command implementation.
pub struct RunCommand {
    args: Cli,
    launch_spacing: Duration,
}

impl RunCommand {
    pub fn new(args: Cli) -> Self {
        Self {
            args,
            launch_spacing: DEFAULT_LAUNCH_SPACING,
        }
    }

    /// Override the minimum gap between step launches.
    pub fn with_launch_spacing(mut self, spacing: Duration) -> Self {
        self.launch_spacing = spacing;
        self
    }

    pub fn args(&self) -> &Cli {
        &self.args
    }

    /// Run with settings and environment taken from the process.
    pub fn execute(&self, console: &Console) -> Result<CommandResult> {
        let inputs = self.inputs()?;
        let settings = RunSettings::from_env()?;
        self.run(inputs, settings, EnvList::from_system(), console)
    }

    /// Run with explicit settings and base environment.
    pub fn execute_with(
        &self,
        settings: RunSettings,
        env: EnvList,
        console: &Console,
    ) -> Result<CommandResult> {
        let inputs = self.inputs()?;
        self.run(inputs, settings, env, console)
    }

    fn inputs(&self) -> Result<Inputs> {
        let config_path = self
            .args
            .config
            .as_deref()
            .ok_or_else(|| DeployTestError::MissingInput {
                what: "Deployment config (-c)".to_string(),
            })?;
        let engine = self
            .args
            .engine
            .clone()
            .ok_or_else(|| DeployTestError::MissingInput {
                what: "Engine executable (-a)".to_string(),
            })?;
        if !engine.exists() {
            return Err(DeployTestError::ConfigNotFound { path: engine });
        }

        let config = load_test_config(config_path)?;
        validate(&config)?;
        let patterns = ErrorPatterns::load(&self.args.errors)?;

        let work_dir = match &self.args.work_dir {
            Some(dir) => dir.clone(),
            None => executable_dir()?,
        };
        let script = work_dir.join(STEP_SCRIPT);
        if !script.is_file() {
            return Err(DeployTestError::ConfigNotFound { path: script });
        }

        Ok(Inputs {
            config,
            engine,
            patterns,
            work_dir,
        })
    }

    fn run(
        &self,
        inputs: Inputs,
        settings: RunSettings,
        env: EnvList,
        console: &Console,
    ) -> Result<CommandResult> {
        let started = Instant::now();
        let Inputs {
            config,
            engine,
            patterns,
            work_dir,
        } = inputs;

        let log_dir = work_dir.join(LOG_DIR);
        let data_dir = work_dir.join(DATA_DIR);
        recreate_dir(&log_dir)?;
        std::fs::create_dir_all(&data_dir)?;
        debug!("Logs in {}, data in {}", log_dir.display(), data_dir.display());

        let limiter = Arc::new(LaunchLimiter::new(self.launch_spacing));
        let executor = ScriptExecutor::new(&work_dir, limiter);

        let mut base_env = env
            .with("ACS_ENGINE_EXE", engine.to_string_lossy())
            .with("DATA_DIR", data_dir.to_string_lossy());
        run_setup(&executor, &base_env, settings.stage_timeout)?;
        base_env.push("SSH_KEY", data_dir.join("id_rsa.pub").to_string_lossy());
        base_env.push("WIN_PWD", data_dir.join("win.pwd").to_string_lossy());

        let deployments = config.deployments;
        let report = ReportManager::new(
            settings.job_name.as_str(),
            settings.build_number.as_str(),
            deployments.len(),
            patterns,
        );
        let metrics = if settings.enable_metrics {
            MetricsEmitter::new(Arc::new(StatsdSink::default()))
        } else {
            MetricsEmitter::disabled()
        };

        let run = RunContext {
            settings,
            base_env,
            work_dir,
            log_dir,
        };
        let workflow = DeploymentWorkflow::new(&executor, &report, &metrics, &run);
        let result = Scheduler::new(
            &workflow,
            &report,
            &metrics,
            run.settings.retries,
            run.settings.stage_timeout,
            run.log_dir.join(TEST_REPORT),
        )
        .run(&deployments);

        for (deployment, ok) in deployments.iter().zip(result.flags()) {
            console.status(
                (*ok).into(),
                &format!("{} in {}", deployment.test_name(), deployment.location),
            );
        }

        let elapsed = format_duration(started.elapsed());
        if result.success() {
            console.success(&format!(
                "All {} deployment(s) passed in {}",
                deployments.len(),
                elapsed
            ));
            Ok(CommandResult::success())
        } else {
            console.error(&format!(
                "{} of {} deployment(s) failed in {}",
                result.failed_count(),
                deployments.len(),
                elapsed
            ));
            Ok(CommandResult::failure(1))
        }
    }
}

/// Log in and fetch secrets; either failing aborts the run.
fn run_setup(runner: &dyn StepRunner, env: &EnvList, timeout: Duration) -> Result<()> {
    for (step, tag) in [(SET_AZURE_ACCOUNT, "init"), (GET_SECRETS, "secrets")] {
        let result = runner.run_step(tag, step, env, timeout);
        if !result.is_success() {
            return Err(DeployTestError::SetupStepFailed {
                step: step.to_string(),
                output: result.output,
            });
        }
    }
    info!("Run setup complete");
    Ok(())
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| DeployTestError::MissingInput {
            what: "Working directory (-w)".to_string(),
        })
}
