//! Test harness types: suites, test cases, and their results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::geometry::Anchor;
use crate::path::Path;
use crate::registry::{AssertFn, Hook};
use crate::resolver::PointTarget;

/// Gesture performed by a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    /// Press, move along a curve, release, click
    #[default]
    Drag,
    /// Drag with start == end and a short duration
    Click,
    /// Approach, rest on the target, depart
    Hover,
    /// No pointer simulation; the test is all hooks and assertion
    Custom,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drag => "drag",
            Self::Click => "click",
            Self::Hover => "hover",
            Self::Custom => "custom",
        })
    }
}

/// Hover segment durations; `None` falls back to the runner config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HoverTiming {
    /// Time resting on the target
    pub hold_ms: Option<u64>,
    /// Approach segment duration
    pub approach_ms: Option<u64>,
    /// Departure segment duration
    pub departure_ms: Option<u64>,
}

/// Where and how a gesture moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Start of the gesture
    pub from: Option<PointTarget>,
    /// End of the gesture (hover target for hovers)
    pub to: Option<PointTarget>,
    /// Anchor on the `from` element
    pub from_anchor: Anchor,
    /// Anchor on the `to` element
    pub to_anchor: Anchor,
    /// Drag duration; `None` uses the runner default
    pub duration_ms: Option<u64>,
    /// Path curvature; `None` uses the runner default
    pub curvature: Option<f64>,
    /// Send events (false only generates and visualizes the path)
    pub dispatch_events: bool,
    /// Hover segment timing
    pub hover: HoverTiming,
    /// Where a hover departs to; defaults to `from`
    pub leave_to: Option<PointTarget>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            from_anchor: Anchor::Center,
            to_anchor: Anchor::Center,
            duration_ms: None,
            curvature: None,
            dispatch_events: true,
            hover: HoverTiming::default(),
            leave_to: None,
        }
    }
}

/// How a gesture path is rendered by a [`crate::PathVisualizer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizationConfig {
    /// Draw the full path
    pub show_path: bool,
    /// Animate a cursor along the path
    pub show_cursor: bool,
    /// Stroke color
    pub color: Option<String>,
    /// Keep the overlay visible this long after the replay
    pub linger_ms: u64,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            show_path: true,
            show_cursor: true,
            color: None,
            linger_ms: 0,
        }
    }
}

/// A single gesture test
#[derive(Clone)]
pub struct TestCase {
    /// Test name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Gesture performed
    pub kind: GestureKind,
    /// Gesture endpoints and timing
    pub simulation: SimulationConfig,
    /// Path rendering, when requested
    pub visualization: Option<VisualizationConfig>,
    /// Assertion run after the gesture
    pub assert: Option<AssertFn>,
    /// Runs before the suite's `before_each`
    pub setup: Option<Hook>,
    /// Runs before the suite's `after_each`
    pub teardown: Option<Hook>,
    /// Test timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("simulation", &self.simulation)
            .field("visualization", &self.visualization)
            .field("assert", &self.assert.is_some())
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl TestCase {
    /// Create a test of a kind with an empty simulation
    #[must_use]
    pub fn new(name: impl Into<String>, kind: GestureKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            simulation: SimulationConfig::default(),
            visualization: None,
            assert: None,
            setup: None,
            teardown: None,
            timeout_ms: None,
        }
    }

    /// Drag from one target to another
    #[must_use]
    pub fn drag(
        name: impl Into<String>,
        from: impl Into<PointTarget>,
        to: impl Into<PointTarget>,
    ) -> Self {
        let mut test = Self::new(name, GestureKind::Drag);
        test.simulation.from = Some(from.into());
        test.simulation.to = Some(to.into());
        test
    }

    /// Click a target
    #[must_use]
    pub fn click(name: impl Into<String>, target: impl Into<PointTarget>) -> Self {
        let mut test = Self::new(name, GestureKind::Click);
        test.simulation.to = Some(target.into());
        test
    }

    /// Hover over `target`, approaching from `from`
    #[must_use]
    pub fn hover(
        name: impl Into<String>,
        from: impl Into<PointTarget>,
        target: impl Into<PointTarget>,
    ) -> Self {
        let mut test = Self::new(name, GestureKind::Hover);
        test.simulation.from = Some(from.into());
        test.simulation.to = Some(target.into());
        test
    }

    /// Test with no pointer simulation
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(name, GestureKind::Custom)
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set endpoint anchors
    #[must_use]
    pub const fn with_anchors(mut self, from: Anchor, to: Anchor) -> Self {
        self.simulation.from_anchor = from;
        self.simulation.to_anchor = to;
        self
    }

    /// Set drag duration
    #[must_use]
    pub const fn with_duration(mut self, ms: u64) -> Self {
        self.simulation.duration_ms = Some(ms);
        self
    }

    /// Set path curvature
    #[must_use]
    pub const fn with_curvature(mut self, curvature: f64) -> Self {
        self.simulation.curvature = Some(curvature);
        self
    }

    /// Generate the path without dispatching events
    #[must_use]
    pub const fn without_dispatch(mut self) -> Self {
        self.simulation.dispatch_events = false;
        self
    }

    /// Set hover timing
    #[must_use]
    pub const fn with_hover_timing(mut self, timing: HoverTiming) -> Self {
        self.simulation.hover = timing;
        self
    }

    /// Set where a hover departs to
    #[must_use]
    pub fn with_leave_to(mut self, target: impl Into<PointTarget>) -> Self {
        self.simulation.leave_to = Some(target.into());
        self
    }

    /// Request path visualization
    #[must_use]
    pub fn with_visualization(mut self, config: VisualizationConfig) -> Self {
        self.visualization = Some(config);
        self
    }

    /// Set assertion
    #[must_use]
    pub fn with_assert(mut self, assert: AssertFn) -> Self {
        self.assert = Some(assert);
        self
    }

    /// Set setup hook
    #[must_use]
    pub fn with_setup(mut self, setup: Hook) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Set teardown hook
    #[must_use]
    pub fn with_teardown(mut self, teardown: Hook) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// A named, ordered group of tests with shared lifecycle hooks
#[derive(Clone, Default)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Tests in registration order
    pub tests: Vec<TestCase>,
    /// Runs once before the first test
    pub before_all: Option<Hook>,
    /// Runs once after the last test
    pub after_all: Option<Hook>,
    /// Runs after each test's own setup
    pub before_each: Option<Hook>,
    /// Runs after each test's own teardown
    pub after_each: Option<Hook>,
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("tests", &self.tests)
            .field("before_all", &self.before_all.is_some())
            .field("after_all", &self.after_all.is_some())
            .field("before_each", &self.before_each.is_some())
            .field("after_each", &self.after_each.is_some())
            .finish()
    }
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a test case
    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Add a test case (builder form)
    #[must_use]
    pub fn with_test(mut self, test: TestCase) -> Self {
        self.tests.push(test);
        self
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set `before_all`
    #[must_use]
    pub fn with_before_all(mut self, hook: Hook) -> Self {
        self.before_all = Some(hook);
        self
    }

    /// Set `after_all`
    #[must_use]
    pub fn with_after_all(mut self, hook: Hook) -> Self {
        self.after_all = Some(hook);
        self
    }

    /// Set `before_each`
    #[must_use]
    pub fn with_before_each(mut self, hook: Hook) -> Self {
        self.before_each = Some(hook);
        self
    }

    /// Set `after_each`
    #[must_use]
    pub fn with_after_each(mut self, hook: Hook) -> Self {
        self.after_each = Some(hook);
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

/// Terminal state of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// Assertion held (or there was none)
    Passed,
    /// Assertion returned false
    Failed,
    /// A hook, the gesture, or the assertion raised
    Errored,
}

/// Lifecycle phase of a running test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPhase {
    /// Not started
    Pending,
    /// Own setup, then `before_each`
    Setup,
    /// Resolve, generate path, play events
    Simulating,
    /// Assertion callback
    Asserting,
    /// Own teardown, then `after_each`
    Teardown,
    /// Finished
    Done(TestOutcome),
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Setup start to teardown end
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Error message if a phase raised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Generated gesture path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    /// Terminal state
    pub outcome: TestOutcome,
    /// Teardown failure; never affects `passed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            duration: Duration::ZERO,
            error: None,
            path: None,
            outcome: TestOutcome::Passed,
            teardown_error: None,
        }
    }

    /// Create a result for an assertion that returned false
    #[must_use]
    pub fn fail(name: impl Into<String>) -> Self {
        Self {
            passed: false,
            outcome: TestOutcome::Failed,
            ..Self::pass(name)
        }
    }

    /// Create a result for a test whose lifecycle raised
    #[must_use]
    pub fn errored(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            passed: false,
            error: Some(error.into()),
            outcome: TestOutcome::Errored,
            ..Self::pass(name)
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Attach the generated path
    #[must_use]
    pub fn with_path(mut self, path: Option<Path>) -> Self {
        self.path = path;
        self
    }

    /// Record a teardown failure
    #[must_use]
    pub fn with_teardown_error(mut self, error: Option<String>) -> Self {
        self.teardown_error = error;
        self
    }
}

/// Results from running a test suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual test results in execution order
    pub results: Vec<TestResult>,
    /// Wall-clock duration of the suite, hooks included
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// `after_all` failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_all_error: Option<String>,
}

impl SuiteResults {
    /// Empty results for a suite
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            results: Vec::new(),
            duration: Duration::ZERO,
            after_all_error: None,
        }
    }

    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed tests (errored included)
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Count errored tests
    #[must_use]
    pub fn errored_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == TestOutcome::Errored)
            .count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Sum of per-test durations
    #[must_use]
    pub fn test_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }
}

/// Serialize a `Duration` as fractional milliseconds
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid duration: {ms}")));
        }
        Ok(Duration::from_secs_f64(ms / 1000.0))
    }
}
