//! Running every deployment at once.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{error, info};

use crate::config::Deployment;
use crate::metrics::MetricsEmitter;
use crate::report::ReportManager;

use super::retry::RetryController;
use super::workflow::AttemptRunner;

/// Per-deployment success flags, in config order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    flags: Vec<bool>,
}

impl RunResult {
    pub fn new(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Whether every deployment succeeded.
    pub fn success(&self) -> bool {
        self.flags.iter().all(|ok| *ok)
    }

    pub fn failed_count(&self) -> usize {
        self.flags.iter().filter(|ok| !**ok).count()
    }
}

/// Launches one retry controller per deployment on its own thread.
pub struct Scheduler<'a> {
    attempts: &'a dyn AttemptRunner,
    report: &'a ReportManager,
    metrics: &'a MetricsEmitter,
    retries: u32,
    timeout: Duration,
    report_path: PathBuf,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        attempts: &'a dyn AttemptRunner,
        report: &'a ReportManager,
        metrics: &'a MetricsEmitter,
        retries: u32,
        timeout: Duration,
        report_path: PathBuf,
    ) -> Self {
        Self {
            attempts,
            report,
            metrics,
            retries,
            timeout,
            report_path,
        }
    }

    /// Run all deployments, wait for them, and write the report.
    pub fn run(&self, deployments: &[Deployment]) -> RunResult {
        info!(
            "Running {} deployment(s), up to {} attempt(s) each",
            deployments.len(),
            self.retries.max(1)
        );

        let flags = thread::scope(|scope| {
            let handles: Vec<_> = deployments
                .iter()
                .enumerate()
                .map(|(index, deployment)| {
                    scope.spawn(move || {
                        RetryController::new(self.attempts, self.metrics, self.retries)
                            .run(deployment, index, self.timeout)
                            .success
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(deployments)
                .map(|(handle, deployment)| {
                    handle.join().unwrap_or_else(|_| {
                        error!(
                            "Worker for {} in {} panicked",
                            deployment.test_name(),
                            deployment.location
                        );
                        false
                    })
                })
                .collect::<Vec<bool>>()
        });

        if let Err(e) = self.report.create_test_report(&self.report_path) {
            error!("Failed to write {}: {}", self.report_path.display(), e);
        }

        let result = RunResult::new(flags);
        info!(
            "{} of {} deployment(s) failed",
            result.failed_count(),
            deployments.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ErrorPatterns, ErrorRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fails deployments whose location is `bad`; panics on `panic`.
    #[derive(Default)]
    struct ByLocation {
        finished: AtomicUsize,
    }

    impl AttemptRunner for ByLocation {
        fn run_attempt(
            &self,
            deployment: &Deployment,
            _index: usize,
            _attempt: u32,
            _timeout: Duration,
        ) -> Option<ErrorRecord> {
            std::thread::sleep(Duration::from_millis(20));
            self.finished.fetch_add(1, Ordering::SeqCst);
            match deployment.location.as_str() {
                "bad" => Some(ErrorRecord::new("t", "validate", "E", "C", "bad")),
                "panic" => panic!("worker blew up"),
                _ => None,
            }
        }
    }

    fn report() -> ReportManager {
        ReportManager::new("job", "1", 3, ErrorPatterns::default())
    }

    #[test]
    fn run_result_fails_if_any_flag_false() {
        assert!(RunResult::new(vec![true, true]).success());
        assert!(!RunResult::new(vec![true, false]).success());
        assert!(RunResult::new(vec![]).success());
        assert_eq!(RunResult::new(vec![false, true, false]).failed_count(), 2);
    }

    #[test]
    fn waits_for_every_deployment() {
        let temp = TempDir::new().unwrap();
        let runner = ByLocation::default();
        let report = report();
        let metrics = MetricsEmitter::disabled();
        let deployments: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|l| Deployment::new("dcos.json", *l))
            .collect();

        let result = Scheduler::new(
            &runner,
            &report,
            &metrics,
            1,
            Duration::from_secs(1),
            temp.path().join("TestReport.json"),
        )
        .run(&deployments);

        assert!(result.success());
        assert_eq!(result.flags().len(), 4);
        assert_eq!(runner.finished.load(Ordering::SeqCst), 4);
        assert!(temp.path().join("TestReport.json").exists());
    }

    #[test]
    fn flags_keep_config_order() {
        let temp = TempDir::new().unwrap();
        let runner = ByLocation::default();
        let report = report();
        let metrics = MetricsEmitter::disabled();
        let deployments = vec![
            Deployment::new("dcos.json", "ok"),
            Deployment::new("dcos.json", "bad"),
            Deployment::new("dcos.json", "ok"),
        ];

        let result = Scheduler::new(
            &runner,
            &report,
            &metrics,
            2,
            Duration::from_secs(1),
            temp.path().join("TestReport.json"),
        )
        .run(&deployments);

        assert_eq!(result.flags(), &[true, false, true]);
        assert!(!result.success());
        // The failing deployment used its whole budget.
        assert_eq!(runner.finished.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn panicking_worker_counts_as_failure() {
        let temp = TempDir::new().unwrap();
        let runner = ByLocation::default();
        let report = report();
        let metrics = MetricsEmitter::disabled();
        let deployments = vec![
            Deployment::new("dcos.json", "ok"),
            Deployment::new("dcos.json", "panic"),
        ];

        let result = Scheduler::new(
            &runner,
            &report,
            &metrics,
            1,
            Duration::from_secs(1),
            temp.path().join("TestReport.json"),
        )
        .run(&deployments);

        assert_eq!(result.flags(), &[true, false]);
    }

    #[test]
    fn report_write_failure_is_not_fatal() {
        let runner = ByLocation::default();
        let report = report();
        let metrics = MetricsEmitter::disabled();

        let result = Scheduler::new(
            &runner,
            &report,
            &metrics,
            1,
            Duration::from_secs(1),
            PathBuf::from("/nonexistent/dir/TestReport.json"),
        )
        .run(&[Deployment::new("dcos.json", "ok")]);

        assert!(result.success());
    }
}
