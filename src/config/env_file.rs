//! Scenario env file parsing.
//!
//! A cluster definition may ship a sibling `<definition>.env` file with
//! extra variables for the step script. Only strict `KEY=VALUE` lines are
//! accepted: no whitespace on either side of `=`, and both sides non-empty.
//! Anything else is skipped without complaint.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static ENV_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+=\S+$").expect("ENV_LINE must compile"));

/// Parses scenario env files into ordered `(key, value)` pairs.
///
/// # Example
///
/// ```
/// use deploytest::config::EnvFileParser;
///
/// let vars = EnvFileParser::parse("FOO=bar\nBAD =x\nEMPTY=\n  KEEP=me  ");
/// assert_eq!(
///     vars,
///     vec![
///         ("FOO".to_string(), "bar".to_string()),
///         ("KEEP".to_string(), "me".to_string()),
///     ]
/// );
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse env file content, keeping file order.
    pub fn parse(content: &str) -> Vec<(String, String)> {
        content.lines().filter_map(Self::parse_line).collect()
    }

    /// Parse a single line; `None` if it is not a strict assignment.
    fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.trim();
        if !ENV_LINE.is_match(line) {
            return None;
        }
        // `==x` matches the pattern but leaves an empty key.
        let (key, value) = line.split_once('=')?;
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some((key.to_string(), value.to_string()))
    }

    /// Load and parse an env file, returning `None` if it doesn't exist.
    pub fn load_optional(path: &Path) -> Result<Option<Vec<(String, String)>>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(Self::parse(&content)))
    }
}
