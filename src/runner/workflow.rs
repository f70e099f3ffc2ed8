//! One attempt of one deployment.
//!
//! [`DeploymentWorkflow`] discovers the orchestrator, builds the attempt
//! environment, runs the ordered steps until the first failure, and then
//! always cleans up. Every failure comes back as an [`ErrorRecord`] value.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::{Deployment, EnvFileParser, EnvList};
use crate::metrics::MetricsEmitter;
use crate::report::{
    ErrorRecord, ReportManager, ERR_FILE_ACCESS, ERR_NODE_COUNT, ERR_ORCHESTRATOR_TYPE,
    ERR_ORCHESTRATOR_VERSION, ERR_SUCCESS, STEP_PRETEST,
};
use crate::steps::names::{
    CLEANUP, GENERATE_TEMPLATE, GET_NODE_COUNT, GET_ORCHESTRATOR_TYPE, GET_ORCHESTRATOR_VERSION,
    ORDERED_STEPS,
};
use crate::steps::{StepResult, StepRunner};

use super::context::{AttemptContext, RunContext};

/// Runs a single attempt of a deployment.
///
/// `index` is the deployment's position in the config and `attempt` the
/// zero-based attempt number; together they make every attempt's resource
/// group unique. Returns `None` when the attempt succeeded.
pub trait AttemptRunner: Sync {
    fn run_attempt(
        &self,
        deployment: &Deployment,
        index: usize,
        attempt: u32,
        timeout: Duration,
    ) -> Option<ErrorRecord>;
}

/// Expected cluster shape reported by `get_node_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCount {
    pub total: u32,
    pub linux: u32,
    pub windows: u32,
}

impl NodeCount {
    /// Parse `total:linux:windows`.
    pub fn parse(output: &str) -> Option<Self> {
        let mut parts = output.trim().split(':').map(|p| p.trim().parse::<u32>());
        let total = parts.next()?.ok()?;
        let linux = parts.next()?.ok()?;
        let windows = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            total,
            linux,
            windows,
        })
    }
}

/// The deployment workflow over a [`StepRunner`].
pub struct DeploymentWorkflow<'a> {
    runner: &'a dyn StepRunner,
    report: &'a ReportManager,
    metrics: &'a MetricsEmitter,
    run: &'a RunContext,
}

impl<'a> DeploymentWorkflow<'a> {
    pub fn new(
        runner: &'a dyn StepRunner,
        report: &'a ReportManager,
        metrics: &'a MetricsEmitter,
        run: &'a RunContext,
    ) -> Self {
        Self {
            runner,
            report,
            metrics,
            run,
        }
    }

    fn step(&self, ctx: &AttemptContext, step: &str, env: &EnvList, timeout: Duration) -> StepResult {
        self.runner.run_step(&ctx.resource_group, step, env, timeout)
    }

    /// Record a failure that happened outside the ordered steps.
    fn pre_run_failure(
        &self,
        ctx: &AttemptContext,
        deployment: &Deployment,
        step: &str,
        kind: &str,
        output: &str,
    ) -> ErrorRecord {
        ctx.log.append(&format!(
            "Error [{}:{}] {}\nOutput: {}",
            step, ctx.resource_group, kind, output
        ));
        let record = ErrorRecord::pre_run(&ctx.test_name, step, kind, &deployment.location);
        self.report.record(&record);
        record
    }

    /// Discovery, environment merge, and the ordered steps.
    ///
    /// `env` is left holding everything added so far, so cleanup sees the
    /// same environment the last step did.
    fn run_steps(
        &self,
        ctx: &AttemptContext,
        deployment: &Deployment,
        env: &mut EnvList,
        timeout: Duration,
    ) -> Option<ErrorRecord> {
        let discovery = self.step(ctx, GET_ORCHESTRATOR_TYPE, env, timeout);
        let orchestrator = discovery.output.trim();
        if !discovery.is_success() || orchestrator.is_empty() {
            return Some(self.pre_run_failure(
                ctx,
                deployment,
                STEP_PRETEST,
                ERR_ORCHESTRATOR_TYPE,
                &discovery.output,
            ));
        }
        debug!(resource_group = %ctx.resource_group, orchestrator, "orchestrator discovered");

        env.push("LOCATION", deployment.location.as_str());
        env.push("ORCHESTRATOR", orchestrator);
        env.push("INSTANCE_NAME", ctx.instance_name.as_str());
        env.push("DEPLOYMENT_NAME", ctx.instance_name.as_str());
        env.push("RESOURCE_GROUP", ctx.resource_group.as_str());
        if let Some(release) = deployment.release() {
            env.push("ORCHESTRATOR_RELEASE", release);
        }

        let env_file = self.run.scenario_env_file(deployment);
        match EnvFileParser::load_optional(&env_file) {
            Ok(Some(vars)) => env.extend(vars),
            Ok(None) => {}
            Err(e) => {
                warn!("Error [{}] : {:#}", ctx.resource_group, e);
                return Some(self.pre_run_failure(
                    ctx,
                    deployment,
                    STEP_PRETEST,
                    ERR_FILE_ACCESS,
                    &format!("{:#}", e),
                ));
            }
        }

        for step in ORDERED_STEPS {
            let result = self.step(ctx, step, env, timeout);
            if !result.is_success() {
                let record =
                    self.report
                        .process(&result.output, step, &ctx.test_name, &deployment.location);
                self.metrics
                    .send_duration(step, &deployment.location, result.duration, &record.error);
                ctx.log.append(&format!(
                    "Error [{}:{}] {}\nOutput: {}",
                    step, ctx.resource_group, result.outcome, result.output
                ));
                // Without AUTOCLEAN a failed deployment is left in place.
                if !self.run.settings.autoclean {
                    env.push("CLEANUP", "false");
                }
                return Some(record);
            }
            self.metrics
                .send_duration(step, &deployment.location, result.duration, ERR_SUCCESS);
            ctx.log.append(&result.output);

            if step == GENERATE_TEMPLATE {
                if let Some(record) = self.discover_expectations(ctx, deployment, env, timeout) {
                    return Some(record);
                }
            }
        }
        None
    }

    /// Orchestrator version and node counts of the generated template.
    fn discover_expectations(
        &self,
        ctx: &AttemptContext,
        deployment: &Deployment,
        env: &mut EnvList,
        timeout: Duration,
    ) -> Option<ErrorRecord> {
        let version = self.step(ctx, GET_ORCHESTRATOR_VERSION, env, timeout);
        if !version.is_success() {
            return Some(self.pre_run_failure(
                ctx,
                deployment,
                GENERATE_TEMPLATE,
                ERR_ORCHESTRATOR_VERSION,
                &version.output,
            ));
        }
        env.push("EXPECTED_ORCHESTRATOR_VERSION", version.output.trim());

        let nodes = self.step(ctx, GET_NODE_COUNT, env, timeout);
        let count = match nodes.is_success().then(|| NodeCount::parse(&nodes.output)) {
            Some(Some(count)) => count,
            _ => {
                return Some(self.pre_run_failure(
                    ctx,
                    deployment,
                    GENERATE_TEMPLATE,
                    ERR_NODE_COUNT,
                    &nodes.output,
                ));
            }
        };
        env.push("EXPECTED_NODE_COUNT", count.total.to_string());
        env.push("EXPECTED_LINUX_AGENTS", count.linux.to_string());
        env.push("EXPECTED_WINDOWS_AGENTS", count.windows.to_string());
        None
    }

    fn cleanup(&self, ctx: &AttemptContext, env: &EnvList, timeout: Duration) {
        let result = self.step(ctx, CLEANUP, env, timeout);
        if result.is_success() {
            ctx.log.append(&result.output);
        } else {
            error!("Cleanup of {} failed: {}", ctx.resource_group, result.outcome);
            ctx.log.append(&format!(
                "Error [{}:{}] {}\nOutput: {}",
                CLEANUP, ctx.resource_group, result.outcome, result.output
            ));
        }
    }
}

impl AttemptRunner for DeploymentWorkflow<'_> {
    fn run_attempt(
        &self,
        deployment: &Deployment,
        index: usize,
        attempt: u32,
        timeout: Duration,
    ) -> Option<ErrorRecord> {
        let ctx = AttemptContext::new(self.run, deployment, index, attempt);
        let mut env = ctx.env.clone();

        let failure = self.run_steps(&ctx, deployment, &mut env, timeout);
        self.cleanup(&ctx, &env, timeout);
        failure
    }
}
