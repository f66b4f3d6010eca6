//! Aggregate statistics over suite results.
//!
//! This is the contract consumed by external reporters:
//! `{total, passed, failed, duration, passRate, raw}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::harness::{duration_ms, SuiteResults, TestOutcome, TestResult};
use crate::result::GestureResult;

/// Totals across every suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    /// Number of tests
    pub total: usize,
    /// Passed tests
    pub passed: usize,
    /// Failed tests, errored included
    pub failed: usize,
    /// Sum of per-test durations (not wall-clock of the run)
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// `passed / total * 100`, 0 when there are no tests
    pub pass_rate: f64,
    /// Suite name → results
    pub raw: BTreeMap<String, Vec<TestResult>>,
}

impl Default for ResultSummary {
    fn default() -> Self {
        Self::from_suites(&[])
    }
}

impl ResultSummary {
    /// Aggregate suite results
    #[must_use]
    pub fn from_suites(suites: &[SuiteResults]) -> Self {
        let mut raw: BTreeMap<String, Vec<TestResult>> = BTreeMap::new();
        for suite in suites {
            raw.entry(suite.suite_name.clone())
                .or_default()
                .extend(suite.results.iter().cloned());
        }

        let all = || suites.iter().flat_map(|s| s.results.iter());
        let total = all().count();
        let passed = all().filter(|r| r.passed).count();
        let duration = all().map(|r| r.duration).sum();

        Self {
            total,
            passed,
            failed: total - passed,
            duration,
            pass_rate: pass_rate(passed, total),
            raw,
        }
    }

    /// Whether every test passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Number of errored tests (a subset of `failed`)
    #[must_use]
    pub fn errored(&self) -> usize {
        self.raw
            .values()
            .flatten()
            .filter(|r| r.outcome == TestOutcome::Errored)
            .count()
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> GestureResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (passed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
