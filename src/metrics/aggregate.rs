//! Per-deployment error aggregation.
//!
//! A deployment's retries can fail the same way repeatedly or in several
//! different ways. [`ErrorStats`] counts failed attempts per error kind so
//! each kind is reported once, with a severity derived from its count.

use crate::report::ErrorRecord;
use std::collections::BTreeMap;
use std::fmt;

/// How often an error kind recurred within one deployment's retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Seen on more than one attempt.
    Critical,
    /// Seen on exactly one attempt.
    Intermittent,
}

impl Severity {
    pub fn from_count(count: u64) -> Self {
        if count > 1 {
            Severity::Critical
        } else {
            Severity::Intermittent
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::Intermittent => write!(f, "Intermittent"),
        }
    }
}

/// Occurrences of one error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorStat {
    /// First record seen for the kind.
    pub record: ErrorRecord,
    /// Test category of the deployment.
    pub test_category: String,
    /// Failed attempts with this kind.
    pub count: u64,
}

impl ErrorStat {
    pub fn severity(&self) -> Severity {
        Severity::from_count(self.count)
    }
}

/// Error kind → occurrences, for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorStats {
    stats: BTreeMap<String, ErrorStat>,
}

impl ErrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a failed attempt. The first record of a kind is kept as its
    /// representative.
    pub fn add(&mut self, record: ErrorRecord, test_category: &str) {
        self.stats
            .entry(record.error.clone())
            .and_modify(|stat| stat.count += 1)
            .or_insert_with(|| ErrorStat {
                record,
                test_category: test_category.to_string(),
                count: 1,
            });
    }

    pub fn get(&self, kind: &str) -> Option<&ErrorStat> {
        self.stats.get(kind)
    }

    /// Stats ordered by error kind.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorStat> {
        self.stats.values()
    }

    /// Number of distinct error kinds.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Failed attempts across all kinds.
    pub fn total(&self) -> u64 {
        self.stats.values().map(|s| s.count).sum()
    }
}
