//! Rolling duration history per compression path.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// One pass at plan values.
pub const SINGLE_PASS: &str = "single-pass";
/// First-stage preset followed by a refine or aggressive pass.
pub const STAGED: &str = "staged";
/// A codec failure handed the original back.
pub const FALLBACK: &str = "fallback";

/// Samples kept per label; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 100;

/// Summary of the retained samples for one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub count: usize,
    pub average: f64,
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceLog {
    samples: BTreeMap<String, VecDeque<u64>>,
}

impl PerformanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: &str, duration_ms: u64) {
        let history = self.samples.entry(label.to_string()).or_default();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(duration_ms);
    }

    pub fn stats(&self, label: &str) -> Option<PerformanceStats> {
        let history = self.samples.get(label).filter(|h| !h.is_empty())?;
        let total: u64 = history.iter().sum();
        Some(PerformanceStats {
            count: history.len(),
            average: total as f64 / history.len() as f64,
            min: history.iter().copied().min().unwrap_or_default(),
            max: history.iter().copied().max().unwrap_or_default(),
        })
    }

    /// Labels with at least one sample, in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_label_has_no_stats() {
        assert!(PerformanceLog::new().stats(STAGED).is_none());
    }

    #[test]
    fn stats_summarise_samples() {
        let mut log = PerformanceLog::new();
        for ms in [40, 10, 30] {
            log.record(SINGLE_PASS, ms);
        }
        log.record(FALLBACK, 5);

        let stats = log.stats(SINGLE_PASS).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 40);
        assert!((stats.average - 26.666).abs() < 0.01);
        assert_eq!(log.labels().collect::<Vec<_>>(), vec![FALLBACK, SINGLE_PASS]);
    }

    #[test]
    fn history_is_capped() {
        let mut log = PerformanceLog::new();
        for ms in 0..(HISTORY_LIMIT as u64 + 20) {
            log.record(STAGED, ms);
        }
        let stats = log.stats(STAGED).unwrap();
        assert_eq!(stats.count, HISTORY_LIMIT);
        assert_eq!(stats.min, 20);
        assert_eq!(stats.max, HISTORY_LIMIT as u64 + 19);
    }
}
