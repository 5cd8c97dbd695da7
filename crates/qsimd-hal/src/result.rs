//! Execution results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Measurement outcome counts, keyed by bitstring.
///
/// Keys are ordered so that serialized output is stable across runs with the
/// same outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build counts from `(bitstring, count)` pairs.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, u64)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Set the count for a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        self.0.insert(bitstring.into(), count);
    }

    /// Add one observation of a bitstring.
    pub fn increment(&mut self, bitstring: impl Into<String>) {
        *self.0.entry(bitstring.into()).or_insert(0) += 1;
    }

    /// Count for a bitstring, zero if never observed.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// The most frequent outcome. Ties go to the smallest bitstring.
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.sorted_by_count().into_iter().next()
    }

    /// Outcomes by descending count, ties broken by bitstring.
    pub fn sorted_by_count(&self) -> Vec<(&String, u64)> {
        let mut entries: Vec<_> = self.0.iter().map(|(k, v)| (k, *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Relative frequencies. Empty when no shots were recorded.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> BTreeMap<String, f64> {
        let total = self.total_shots();
        if total == 0 {
            return BTreeMap::new();
        }
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), *v as f64 / total as f64))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of a successful [`SimulationBackend::run`](crate::SimulationBackend::run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub counts: Counts,
    /// Shots actually executed.
    pub shots: u32,
    /// Wall-clock run time, if the backend measured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_basics() {
        let mut counts = Counts::new();
        counts.insert("00", 400);
        counts.insert("11", 600);
        counts.increment("01");

        assert_eq!(counts.get("11"), 600);
        assert_eq!(counts.get("10"), 0);
        assert_eq!(counts.total_shots(), 1001);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts.most_frequent(), Some((&"11".to_string(), 600)));
    }

    #[test]
    fn test_sorted_by_count_breaks_ties_by_key() {
        let counts = Counts::from_pairs([("11", 5), ("00", 5), ("01", 9)]);
        let order: Vec<_> = counts
            .sorted_by_count()
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(order, vec!["01", "00", "11"]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let counts = Counts::from_pairs([("00", 250), ("11", 750)]);
        let probs = counts.probabilities();
        assert!((probs["00"] - 0.25).abs() < 1e-12);
        assert!((probs.values().sum::<f64>() - 1.0).abs() < 1e-12);

        assert!(Counts::new().probabilities().is_empty());
    }

    #[test]
    fn test_counts_serialize_as_map() {
        let counts = Counts::from_pairs([("1", 3), ("0", 7)]);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"0":7,"1":3}"#);
    }

    #[test]
    fn test_execution_result() {
        let result = ExecutionResult::new(Counts::from_pairs([("0", 10)]), 10)
            .with_execution_time(3);
        assert_eq!(result.execution_time_ms, Some(3));
        assert_eq!(result.counts.total_shots(), u64::from(result.shots));
    }
}
