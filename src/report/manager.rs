//! Failure collection and the run's test report.
//!
//! [`ReportManager`] is shared by every deployment worker. Workers hand it
//! failing step output to classify; it remembers every resulting record and
//! writes them, grouped by error kind, into one JSON report at the end of
//! the run.

use crate::error::Result;
use crate::report::patterns::ErrorPatterns;
use crate::report::record::ErrorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// File name of the report inside the log directory.
pub const TEST_REPORT: &str = "TestReport.json";

/// Classifies failures and accumulates them for the report.
#[derive(Debug)]
pub struct ReportManager {
    job_name: String,
    build_number: String,
    deployments: usize,
    patterns: ErrorPatterns,
    failures: Mutex<Vec<ErrorRecord>>,
}

impl ReportManager {
    pub fn new(
        job_name: impl Into<String>,
        build_number: impl Into<String>,
        deployments: usize,
        patterns: ErrorPatterns,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            build_number: build_number.into(),
            deployments,
            patterns,
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Classify a failing step's output and record the result.
    pub fn process(&self, output: &str, step: &str, test_name: &str, location: &str) -> ErrorRecord {
        let (kind, class) = self.patterns.classify(output);
        let record = ErrorRecord::new(test_name, step, kind, class, location);
        self.record(&record);
        record
    }

    /// Record a failure that was classified elsewhere.
    pub fn record(&self, record: &ErrorRecord) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }

    /// All recorded failures, in recording order.
    pub fn failures(&self) -> Vec<ErrorRecord> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot the recorded failures as a report.
    pub fn build_report(&self) -> TestReport {
        let failures = self.failures();

        let mut by_kind: BTreeMap<&str, ErrorSummary> = BTreeMap::new();
        for record in &failures {
            let summary = by_kind
                .entry(record.error.as_str())
                .or_insert_with(|| ErrorSummary {
                    error: record.error.clone(),
                    class: record.phase.clone(),
                    count: 0,
                    records: Vec::new(),
                });
            summary.count += 1;
            summary.records.push(record.clone());
        }

        let mut errors: Vec<ErrorSummary> = by_kind.into_values().collect();
        errors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.error.cmp(&b.error)));

        TestReport {
            job_name: self.job_name.clone(),
            build_number: self.build_number.clone(),
            deployments: self.deployments,
            generated_at: Utc::now(),
            failure_count: failures.len(),
            errors,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn create_test_report(&self, path: &Path) -> Result<()> {
        let report = self.build_report();
        let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
        std::fs::write(path, json)?;
        info!(
            "Wrote {} with {} failure(s)",
            path.display(),
            report.failure_count
        );
        Ok(())
    }
}

/// The report written at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub job_name: String,
    pub build_number: String,
    /// Number of deployments in the run.
    pub deployments: usize,
    pub generated_at: DateTime<Utc>,
    /// Failed attempts across all deployments.
    pub failure_count: usize,
    /// Failures grouped by kind, most frequent first.
    pub errors: Vec<ErrorSummary>,
}

/// All failures of one error kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub error: String,
    pub class: String,
    pub count: usize,
    pub records: Vec<ErrorRecord>,
}
