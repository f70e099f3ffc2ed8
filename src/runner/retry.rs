//! Retrying a deployment until it succeeds or runs out of attempts.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Deployment;
use crate::metrics::{ErrorStats, MetricsEmitter};

use super::workflow::AttemptRunner;

/// What happened across all attempts of one deployment.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    /// Whether any attempt succeeded.
    pub success: bool,

    /// Attempts made, including the successful one.
    pub attempts: u32,

    /// Failures per error kind.
    pub stats: ErrorStats,
}

/// Repeats attempts of one deployment, strictly one after another.
pub struct RetryController<'a> {
    attempts: &'a dyn AttemptRunner,
    metrics: &'a MetricsEmitter,
    max_attempts: u32,
}

impl<'a> RetryController<'a> {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(attempts: &'a dyn AttemptRunner, metrics: &'a MetricsEmitter, max_attempts: u32) -> Self {
        Self {
            attempts,
            metrics,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run attempts until one succeeds, then report error statistics.
    pub fn run(&self, deployment: &Deployment, index: usize, timeout: Duration) -> RetryOutcome {
        let mut stats = ErrorStats::new();
        let mut success = false;
        let mut made = 0;

        for attempt in 0..self.max_attempts {
            made += 1;
            match self.attempts.run_attempt(deployment, index, attempt, timeout) {
                None => {
                    success = true;
                    break;
                }
                Some(record) => {
                    warn!(
                        "Attempt {}/{} of {} in {} failed: {} ({})",
                        made,
                        self.max_attempts,
                        deployment.test_name(),
                        deployment.location,
                        record.error,
                        record.step
                    );
                    stats.add(record, deployment.category());
                }
            }
        }

        if success {
            info!(
                "{} in {} succeeded after {} attempt(s)",
                deployment.test_name(),
                deployment.location,
                made
            );
        }
        self.metrics.send_error_stats(&stats);

        RetryOutcome {
            success,
            attempts: made,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Dimensions, MetricsSink, Severity};
    use crate::report::ErrorRecord;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Fails the first `failures` attempts with the given kinds, cycling.
    struct Flaky {
        failures: u32,
        kinds: Vec<&'static str>,
        calls: AtomicU32,
        seen: Mutex<Vec<u32>>,
    }

    impl Flaky {
        fn new(failures: u32, kinds: &[&'static str]) -> Self {
            Self {
                failures,
                kinds: kinds.to_vec(),
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AttemptRunner for Flaky {
        fn run_attempt(
            &self,
            deployment: &Deployment,
            _index: usize,
            attempt: u32,
            _timeout: Duration,
        ) -> Option<ErrorRecord> {
            self.seen.lock().unwrap().push(attempt);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.failures {
                return None;
            }
            let kind = self.kinds[n as usize % self.kinds.len()];
            Some(ErrorRecord::new(
                deployment.test_name(),
                "deploy_template",
                kind,
                "Azure",
                &deployment.location,
            ))
        }
    }

    #[derive(Default)]
    struct Counting {
        sent: Mutex<Vec<Dimensions>>,
    }

    impl MetricsSink for Counting {
        fn add_metric(&self, _metric: &str, _value: i64, dims: &Dimensions) -> crate::Result<()> {
            self.sent.lock().unwrap().push(dims.clone());
            Ok(())
        }
    }

    fn deployment() -> Deployment {
        Deployment::new("dcos.json", "westus")
    }

    #[test]
    fn stops_at_first_success() {
        let flaky = Flaky::new(1, &["A"]);
        let metrics = MetricsEmitter::disabled();

        let outcome = RetryController::new(&flaky, &metrics, 5).run(&deployment(), 0, Duration::ZERO);

        assert!(outcome.success);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(*flaky.seen.lock().unwrap(), vec![0, 1]);
        assert_eq!(outcome.stats.total(), 1);
    }

    #[test]
    fn never_exceeds_budget() {
        let flaky = Flaky::new(u32::MAX, &["A"]);
        let metrics = MetricsEmitter::disabled();

        let outcome = RetryController::new(&flaky, &metrics, 3).run(&deployment(), 0, Duration::ZERO);

        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            outcome.stats.get("A").map(|s| s.severity()),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn zero_budget_still_makes_one_attempt() {
        let flaky = Flaky::new(0, &["A"]);
        let metrics = MetricsEmitter::disabled();
        let controller = RetryController::new(&flaky, &metrics, 0);

        assert_eq!(controller.max_attempts(), 1);
        assert!(controller.run(&deployment(), 0, Duration::ZERO).success);
    }

    #[test]
    fn distinct_kinds_are_counted_separately() {
        let flaky = Flaky::new(3, &["A", "B"]);
        let metrics = MetricsEmitter::disabled();

        let outcome = RetryController::new(&flaky, &metrics, 3).run(&deployment(), 0, Duration::ZERO);

        assert!(!outcome.success);
        assert_eq!(outcome.stats.get("A").unwrap().count, 2);
        assert_eq!(outcome.stats.get("B").unwrap().count, 1);
        assert_eq!(outcome.stats.get("B").unwrap().severity(), Severity::Intermittent);
    }

    #[test]
    fn stats_are_emitted_once_after_loop() {
        let flaky = Flaky::new(2, &["A", "B"]);
        let sink = Arc::new(Counting::default());
        let metrics = MetricsEmitter::new(sink.clone());

        RetryController::new(&flaky, &metrics, 3).run(&deployment(), 0, Duration::ZERO);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|d| d["Severity"] == "Intermittent"));
    }

    #[test]
    fn success_first_time_emits_nothing() {
        let flaky = Flaky::new(0, &["A"]);
        let sink = Arc::new(Counting::default());
        let metrics = MetricsEmitter::new(sink.clone());

        RetryController::new(&flaky, &metrics, 3).run(&deployment(), 0, Duration::ZERO);

        assert!(sink.sent.lock().unwrap().is_empty());
    }
}
