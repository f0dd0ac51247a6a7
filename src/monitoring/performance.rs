//! # Performance Monitor
//!
//! Records timing spans per named label. Every label retains at most
//! `window_size` of its most recent durations; older samples are dropped first.
//! Labels are independent: recording or summarizing one never touches another.

use crate::constants::defaults;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Summary statistics over a label's retained window, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub count: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub median_ms: f64,
}

/// Thread-safe span recorder shared by concurrently running pipelines
#[derive(Debug)]
pub struct PerformanceMonitor {
    spans: DashMap<String, VecDeque<Duration>>,
    window_size: usize,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_window(defaults::PERFORMANCE_WINDOW)
    }

    /// Create a monitor retaining `window_size` samples per label (minimum 1)
    pub fn with_window(window_size: usize) -> Self {
        Self {
            spans: DashMap::new(),
            window_size: window_size.max(1),
        }
    }

    /// Start a span; the elapsed time is recorded when the timer is stopped
    pub fn start(&self, label: impl Into<String>) -> PerformanceTimer<'_> {
        PerformanceTimer {
            monitor: self,
            label: label.into(),
            started_at: Instant::now(),
        }
    }

    /// Record a duration directly under `label`
    pub fn record(&self, label: &str, duration: Duration) {
        let mut samples = self.spans.entry(label.to_string()).or_default();
        samples.push_back(duration);
        while samples.len() > self.window_size {
            samples.pop_front();
        }
    }

    /// Statistics for one label, or `None` if nothing was recorded under it
    pub fn stats(&self, label: &str) -> Option<PerformanceStats> {
        self.spans
            .get(label)
            .and_then(|samples| summarize(samples.value()))
    }

    /// Statistics for every label observed so far, sorted by label
    pub fn all_stats(&self) -> BTreeMap<String, PerformanceStats> {
        self.spans
            .iter()
            .filter_map(|entry| summarize(entry.value()).map(|stats| (entry.key().clone(), stats)))
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.spans.iter().map(|entry| entry.key().clone()).collect();
        labels.sort();
        labels
    }

    /// Drop every recorded sample
    pub fn reset(&self) {
        self.spans.clear();
    }
}

/// Running span returned by [`PerformanceMonitor::start`]
#[must_use = "a timer records nothing unless stopped"]
#[derive(Debug)]
pub struct PerformanceTimer<'a> {
    monitor: &'a PerformanceMonitor,
    label: String,
    started_at: Instant,
}

impl PerformanceTimer<'_> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Record `now - start` under the timer's label and return it
    pub fn stop(self) -> Duration {
        let elapsed = self.started_at.elapsed();
        self.monitor.record(&self.label, elapsed);
        elapsed
    }
}

fn summarize(samples: &VecDeque<Duration>) -> Option<PerformanceStats> {
    if samples.is_empty() {
        return None;
    }

    let mut millis: Vec<f64> = samples
        .iter()
        .map(|duration| duration.as_secs_f64() * 1000.0)
        .collect();
    millis.sort_by(f64::total_cmp);

    let count = millis.len();
    let total: f64 = millis.iter().sum();
    let middle = count / 2;
    let median_ms = if count % 2 == 0 {
        (millis[middle - 1] + millis[middle]) / 2.0
    } else {
        millis[middle]
    };

    Some(PerformanceStats {
        count,
        average_ms: total / count as f64,
        min_ms: millis[0],
        max_ms: millis[count - 1],
        median_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_stats_for_unknown_label() {
        let monitor = PerformanceMonitor::new();
        assert!(monitor.stats("missing").is_none());
        assert!(monitor.all_stats().is_empty());
    }

    #[test]
    fn test_stats_odd_window() {
        let monitor = PerformanceMonitor::new();
        for value in [30, 10, 20] {
            monitor.record("module.tarot", ms(value));
        }

        let stats = monitor.stats("module.tarot").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_ms, 10.0);
        assert_eq!(stats.max_ms, 30.0);
        assert_eq!(stats.median_ms, 20.0);
        assert_eq!(stats.average_ms, 20.0);
    }

    #[test]
    fn test_median_of_even_window_averages_middle_samples() {
        let monitor = PerformanceMonitor::new();
        for value in [40, 10, 30, 20] {
            monitor.record("span", ms(value));
        }
        assert_eq!(monitor.stats("span").unwrap().median_ms, 25.0);
    }

    #[test]
    fn test_window_drops_oldest_samples() {
        let monitor = PerformanceMonitor::with_window(3);
        for value in [1000, 1, 2, 3] {
            monitor.record("span", ms(value));
        }

        let stats = monitor.stats("span").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.max_ms, 3.0);
        assert_eq!(stats.min_ms, 1.0);
    }

    #[test]
    fn test_default_window_caps_at_one_hundred() {
        let monitor = PerformanceMonitor::new();
        for value in 0..150 {
            monitor.record("span", ms(value));
        }

        let stats = monitor.stats("span").unwrap();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.min_ms, 50.0);
    }

    #[test]
    fn test_labels_are_independent() {
        let monitor = PerformanceMonitor::with_window(2);
        monitor.record("a", ms(5));
        monitor.record("b", ms(7));
        monitor.record("b", ms(9));
        monitor.record("b", ms(11));

        let all = monitor.all_stats();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"].count, 1);
        assert_eq!(all["b"].count, 2);
        assert_eq!(monitor.labels(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_timer_records_elapsed() {
        let monitor = PerformanceMonitor::new();
        let timer = monitor.start("sleep");
        assert_eq!(timer.label(), "sleep");
        std::thread::sleep(ms(5));
        let elapsed = timer.stop();

        assert!(elapsed >= ms(5));
        let stats = monitor.stats("sleep").unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.min_ms >= 5.0);
    }

    #[test]
    fn test_reset_clears_labels() {
        let monitor = PerformanceMonitor::new();
        monitor.record("span", ms(1));
        monitor.reset();
        assert!(monitor.labels().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_recording() {
        let monitor = Arc::new(PerformanceMonitor::new());
        let mut handles = Vec::new();
        for worker in 0..8_u64 {
            let monitor = Arc::clone(&monitor);
            handles.push(tokio::spawn(async move {
                for sample in 0..10_u64 {
                    monitor.record("shared", ms(worker * 10 + sample));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(monitor.stats("shared").unwrap().count, 80);
    }
}
