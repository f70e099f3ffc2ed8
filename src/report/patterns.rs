//! Error pattern registry for step failure classification.
//!
//! Step output is matched against an ordered list of named regexes loaded
//! from a JSON file. The first pattern that matches names the error kind
//! and its class; output matching nothing is `UnspecifiedError`.
//!
//! ```json
//! {
//!   "errors": [
//!     {"name": "QuotaExceeded", "class": "Azure", "regex": "QuotaExceeded"},
//!     {"name": "DeploymentTimeout", "class": "Timeout", "regex": "did not finish within"}
//!   ]
//! }
//! ```

use crate::error::{DeployTestError, Result};
use crate::report::record::{CLASS_UNKNOWN, ERR_UNSPECIFIED};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// One entry of the pattern file.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSpec {
    pub name: String,
    pub class: String,
    pub regex: String,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    errors: Vec<PatternSpec>,
}

/// A compiled error pattern.
#[derive(Debug, Clone)]
pub struct ErrorPattern {
    /// Error kind reported on match.
    pub name: String,
    /// Class reported on match.
    pub class: String,
    regex: Regex,
}

impl ErrorPattern {
    /// Compile a pattern.
    pub fn new(name: &str, class: &str, regex: &str) -> Result<Self> {
        let regex = Regex::new(regex).map_err(|e| DeployTestError::InvalidPattern {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            class: class.to_string(),
            regex,
        })
    }

    fn matches(&self, output: &str) -> bool {
        self.regex.is_match(output)
    }
}

/// Ordered pattern set; first match wins.
#[derive(Debug, Clone, Default)]
pub struct ErrorPatterns {
    patterns: Vec<ErrorPattern>,
}

impl ErrorPatterns {
    pub fn new(patterns: Vec<ErrorPattern>) -> Self {
        Self { patterns }
    }

    /// Parse and compile a pattern file's content.
    pub fn parse(content: &str, source_path: &Path) -> Result<Self> {
        let file: PatternFile =
            serde_json::from_str(content).map_err(|e| DeployTestError::ConfigParseError {
                path: source_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let patterns = file
            .errors
            .iter()
            .map(|p| ErrorPattern::new(&p.name, &p.class, &p.regex))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Load a pattern file. A missing file gives an empty set and a warning,
    /// so every failure classifies as unspecified.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Error pattern file {} not found, failures will be unclassified",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Classify output as `(kind, class)`.
    pub fn classify(&self, output: &str) -> (&str, &str) {
        self.patterns
            .iter()
            .find(|p| p.matches(output))
            .map(|p| (p.name.as_str(), p.class.as_str()))
            .unwrap_or((ERR_UNSPECIFIED, CLASS_UNKNOWN))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
