//! Destination normalization and longest-prefix lookup.

use std::collections::HashMap;

use crate::reference::{OperatorId, PrefixRule};

/// Normalize a raw MSISDN for prefix matching.
///
/// Drops whitespace and hyphens anywhere, then any leading `+`.
/// Digits keep their order and the result is a fixed point.
pub fn normalize_msisdn(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    compact.trim_start_matches('+').to_string()
}

/// A single rule key in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    /// Country code + national prefix, digits only
    pub key: String,
    /// Owning operator
    pub operator_id: OperatorId,
    /// Priority of the owning operator (tie-break)
    pub priority: i32,
}

/// Prefix rules indexed by key for longest-prefix matching.
///
/// Lookup walks candidate prefix lengths from longest to shortest, so cost is
/// bounded by the longest key, not by the number of rules. Entries sharing a
/// key are kept ordered by `(priority, operator_id)`.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    buckets: HashMap<String, Vec<PrefixEntry>>,
    max_len: usize,
    len: usize,
}

impl PrefixTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rules, looking up each owner's priority.
    ///
    /// Rules whose operator is unknown to `priority_of` are skipped.
    pub fn build<F>(rules: &[PrefixRule], priority_of: F) -> Self
    where
        F: Fn(OperatorId) -> Option<i32>,
    {
        let mut table = Self::new();
        for rule in rules {
            if let Some(priority) = priority_of(rule.operator_id) {
                table.insert(rule.key(), rule.operator_id, priority);
            }
        }
        table
    }

    /// Insert a key. Empty keys and exact duplicates are ignored.
    pub fn insert(&mut self, key: String, operator_id: OperatorId, priority: i32) {
        if key.is_empty() {
            return;
        }

        let bucket = self.buckets.entry(key.clone()).or_default();
        if bucket.iter().any(|e| e.operator_id == operator_id) {
            return;
        }

        self.max_len = self.max_len.max(key.len());
        bucket.push(PrefixEntry {
            key,
            operator_id,
            priority,
        });
        bucket.sort_by_key(|e| (e.priority, e.operator_id));
        self.len += 1;
    }

    /// Find the longest key prefixing `number` whose operator is `eligible`.
    pub fn longest_match<F>(&self, number: &str, eligible: F) -> Option<&PrefixEntry>
    where
        F: Fn(OperatorId) -> bool,
    {
        let upper = self.max_len.min(number.len());

        for len in (1..=upper).rev() {
            if !number.is_char_boundary(len) {
                continue;
            }
            if let Some(bucket) = self.buckets.get(&number[..len]) {
                if let Some(entry) = bucket.iter().find(|e| eligible(e.operator_id)) {
                    return Some(entry);
                }
            }
        }

        None
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
