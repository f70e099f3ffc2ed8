//! Ordered environment lists.
//!
//! Step processes receive an explicit environment rather than inheriting
//! the parent's. [`EnvList`] keeps entries in insertion order and lets a
//! later entry override an earlier one with the same key, mirroring how an
//! `env` array is applied by the OS.

use std::collections::HashSet;

/// An ordered list of `KEY=VALUE` entries where later keys win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvList {
    entries: Vec<(String, String)>,
}

impl EnvList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    pub fn from_system() -> Self {
        std::env::vars().collect()
    }

    /// Append an entry, overriding any earlier entry with the same key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// The effective value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Raw entries in insertion order, including overridden ones.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Effective entries: one per key, holding the last value, ordered by
    /// the position of that last value.
    pub fn resolved(&self) -> Vec<(&str, &str)> {
        let mut seen = HashSet::new();
        let mut out: Vec<(&str, &str)> = self
            .entries
            .iter()
            .rev()
            .filter(|(k, _)| seen.insert(k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        out.reverse();
        out
    }

    /// Number of raw entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for EnvList {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
