//! Test Runner
//!
//! Suite registry and the per-test state machine:
//!
//! ```text
//! pending → setup → simulating → asserting → teardown → done(passed|failed|errored)
//!              │          │            │          ▲
//!              └──────────┴────────────┴──error───┘
//! ```
//!
//! Tests run strictly sequentially in registration order, and suites run
//! one after another. Teardown always runs and always finishes before the
//! next test's setup begins. The runner orders work on the shared DOM but
//! does not isolate tests from each other.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RunnerConfig;
use crate::dom::World;
use crate::gesture::{GestureSimulator, PathVisualizer};
use crate::harness::{SuiteResults, TestCase, TestOutcome, TestPhase, TestResult, TestSuite};
use crate::path::Path;
use crate::registry::Hook;
use crate::result::{GestureError, GestureResult};
use crate::summary::ResultSummary;

/// A phase entered by a test during the last run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Suite name
    pub suite: String,
    /// Test name
    pub test: String,
    /// Phase entered
    pub phase: TestPhase,
}

/// Executes registered suites against a shared [`World`]
pub struct TestRunner {
    world: World,
    config: RunnerConfig,
    visualizer: Option<Arc<dyn PathVisualizer>>,
    suites: Vec<TestSuite>,
    results: Vec<SuiteResults>,
    transitions: Vec<PhaseTransition>,
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("config", &self.config)
            .field("suites", &self.suites.len())
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

struct Lifecycle {
    outcome: TestOutcome,
    error: Option<String>,
    path: Option<Path>,
}

impl Lifecycle {
    fn errored(error: &GestureError, path: Option<Path>) -> Self {
        Self {
            outcome: TestOutcome::Errored,
            error: Some(error.to_string()),
            path,
        }
    }
}

impl TestRunner {
    /// Create a runner with default configuration
    #[must_use]
    pub fn new(world: World) -> Self {
        Self::with_config(world, RunnerConfig::default())
    }

    /// Create a runner with explicit configuration
    #[must_use]
    pub fn with_config(world: World, config: RunnerConfig) -> Self {
        Self {
            world,
            config,
            visualizer: None,
            suites: Vec::new(),
            results: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Attach a path visualizer
    #[must_use]
    pub fn with_visualizer(mut self, visualizer: Arc<dyn PathVisualizer>) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    /// Shared test context
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent runs
    pub fn set_config(&mut self, config: RunnerConfig) {
        self.config = config;
    }

    /// Register a suite; suites run in registration order
    pub fn register_suite(&mut self, suite: TestSuite) {
        tracing::debug!(suite = %suite.name, tests = suite.test_count(), "registered suite");
        self.suites.push(suite);
    }

    /// Registered suites
    #[must_use]
    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Total number of registered tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(TestSuite::test_count).sum()
    }

    /// Results of the latest runs, one entry per suite in execution order
    #[must_use]
    pub fn results(&self) -> &[SuiteResults] {
        &self.results
    }

    /// Results for one suite
    #[must_use]
    pub fn suite_results(&self, name: &str) -> Option<&SuiteResults> {
        self.results.iter().find(|r| r.suite_name == name)
    }

    /// Phase transitions of the latest run
    #[must_use]
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    /// Aggregate statistics over the current results
    #[must_use]
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_suites(&self.results)
    }

    /// Clear the suite registry and all results
    pub fn reset(&mut self) {
        tracing::debug!(suites = self.suites.len(), "runner reset");
        self.suites.clear();
        self.results.clear();
        self.transitions.clear();
    }

    /// Run every registered suite, replacing all previous results
    pub async fn run_all(&mut self) -> &[SuiteResults] {
        let simulator = self.simulator();
        let suites = self.suites.clone();
        tracing::info!(suites = suites.len(), tests = self.test_count(), "running all suites");

        let mut results = Vec::with_capacity(suites.len());
        let mut transitions = Vec::new();
        for suite in &suites {
            results.push(self.execute_suite(&simulator, suite, &mut transitions).await);
        }
        self.results = results;
        self.transitions = transitions;
        &self.results
    }

    /// Run a single suite by name, replacing only that suite's results.
    ///
    /// Returns `None`, leaving all state untouched, if no suite has that name.
    pub async fn run_suite_by_name(&mut self, name: &str) -> Option<SuiteResults> {
        let Some(suite) = self.suites.iter().find(|s| s.name == name).cloned() else {
            tracing::warn!(suite = name, "no suite registered under that name");
            return None;
        };
        let simulator = self.simulator();
        let mut transitions = Vec::new();
        let results = self.execute_suite(&simulator, &suite, &mut transitions).await;

        match self.results.iter_mut().find(|r| r.suite_name == name) {
            Some(slot) => *slot = results.clone(),
            None => self.results.push(results.clone()),
        }
        self.transitions = transitions;
        Some(results)
    }

    fn simulator(&self) -> GestureSimulator {
        GestureSimulator::new(self.config.clone(), self.visualizer.clone())
    }

    async fn execute_suite(
        &self,
        simulator: &GestureSimulator,
        suite: &TestSuite,
        log: &mut Vec<PhaseTransition>,
    ) -> SuiteResults {
        let started = Instant::now();
        let mut out = SuiteResults::new(&suite.name);
        tracing::info!(suite = %suite.name, tests = suite.test_count(), "suite started");

        let before_all = match &suite.before_all {
            Some(hook) => call_hook("beforeAll", hook, &self.world).await,
            None => Ok(()),
        };

        match before_all {
            Ok(()) => {
                for test in &suite.tests {
                    let result = self.execute_test(simulator, suite, test, log).await;
                    out.results.push(result);
                }
            }
            Err(e) => {
                tracing::warn!(suite = %suite.name, error = %e, "beforeAll failed, skipping suite tests");
                for test in &suite.tests {
                    record(log, suite, test, TestPhase::Done(TestOutcome::Errored));
                    out.results.push(TestResult::errored(&test.name, e.to_string()));
                }
            }
        }

        if let Some(hook) = &suite.after_all {
            if let Err(e) = call_hook("afterAll", hook, &self.world).await {
                tracing::warn!(suite = %suite.name, error = %e, "afterAll failed");
                out.after_all_error = Some(e.to_string());
            }
        }

        out.duration = started.elapsed();
        tracing::info!(
            suite = %suite.name,
            passed = out.passed_count(),
            failed = out.failed_count(),
            duration_ms = out.duration.as_millis() as u64,
            "suite finished"
        );
        out
    }

    async fn execute_test(
        &self,
        simulator: &GestureSimulator,
        suite: &TestSuite,
        test: &TestCase,
        log: &mut Vec<PhaseTransition>,
    ) -> TestResult {
        let started = Instant::now();
        record(log, suite, test, TestPhase::Pending);

        let timeout = if self.config.enforce_timeouts {
            test.timeout_ms
        } else {
            None
        };
        let lifecycle = match timeout {
            Some(ms) => {
                let body = self.run_lifecycle(simulator, suite, test, log);
                match tokio::time::timeout(Duration::from_millis(ms), body).await {
                    Ok(lifecycle) => lifecycle,
                    Err(_) => {
                        tracing::warn!(test = %test.name, timeout_ms = ms, "test timed out");
                        Lifecycle::errored(&GestureError::Timeout { ms }, None)
                    }
                }
            }
            None => self.run_lifecycle(simulator, suite, test, log).await,
        };

        record(log, suite, test, TestPhase::Teardown);
        let teardown_error = self.run_teardown(suite, test).await;

        let outcome = lifecycle.outcome;
        record(log, suite, test, TestPhase::Done(outcome));
        let result = TestResult {
            name: test.name.clone(),
            passed: outcome == TestOutcome::Passed,
            duration: started.elapsed(),
            error: lifecycle.error,
            path: lifecycle.path,
            outcome,
            teardown_error,
        };
        tracing::info!(
            suite = %suite.name,
            test = %test.name,
            outcome = ?result.outcome,
            duration_ms = result.duration.as_millis() as u64,
            "test finished"
        );
        result
    }

    async fn run_lifecycle(
        &self,
        simulator: &GestureSimulator,
        suite: &TestSuite,
        test: &TestCase,
        log: &mut Vec<PhaseTransition>,
    ) -> Lifecycle {
        record(log, suite, test, TestPhase::Setup);
        if let Err(e) = self.run_setup(suite, test).await {
            tracing::warn!(test = %test.name, error = %e, "setup failed");
            return Lifecycle::errored(&e, None);
        }

        record(log, suite, test, TestPhase::Simulating);
        let path = match simulator.simulate(self.world.dom(), test).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(test = %test.name, error = %e, "gesture failed");
                return Lifecycle::errored(&e, None);
            }
        };

        record(log, suite, test, TestPhase::Asserting);
        let Some(assert) = &test.assert else {
            return Lifecycle {
                outcome: TestOutcome::Passed,
                error: None,
                path,
            };
        };
        match assert(self.world.clone()).await {
            Ok(true) => Lifecycle {
                outcome: TestOutcome::Passed,
                error: None,
                path,
            },
            Ok(false) => Lifecycle {
                outcome: TestOutcome::Failed,
                error: None,
                path,
            },
            Err(e) => {
                tracing::warn!(test = %test.name, error = %e, "assertion raised");
                Lifecycle::errored(&e, path)
            }
        }
    }

    async fn run_setup(&self, suite: &TestSuite, test: &TestCase) -> GestureResult<()> {
        if let Some(hook) = &test.setup {
            call_hook("setup", hook, &self.world).await?;
        }
        if let Some(hook) = &suite.before_each {
            call_hook("beforeEach", hook, &self.world).await?;
        }
        Ok(())
    }

    async fn run_teardown(&self, suite: &TestSuite, test: &TestCase) -> Option<String> {
        let mut errors = Vec::new();
        if let Some(hook) = &test.teardown {
            if let Err(e) = call_hook("teardown", hook, &self.world).await {
                errors.push(e.to_string());
            }
        }
        if let Some(hook) = &suite.after_each {
            if let Err(e) = call_hook("afterEach", hook, &self.world).await {
                errors.push(e.to_string());
            }
        }
        if errors.is_empty() {
            return None;
        }
        let joined = errors.join("; ");
        tracing::warn!(test = %test.name, error = %joined, "teardown failed");
        Some(joined)
    }
}

async fn call_hook(name: &str, hook: &Hook, world: &World) -> GestureResult<()> {
    hook(world.clone()).await.map_err(|e| match e {
        GestureError::Hook { .. } => e,
        other => GestureError::hook(name, other.to_string()),
    })
}

fn record(log: &mut Vec<PhaseTransition>, suite: &TestSuite, test: &TestCase, phase: TestPhase) {
    tracing::trace!(suite = %suite.name, test = %test.name, ?phase, "phase");
    log.push(PhaseTransition {
        suite: suite.name.clone(),
        test: test.name.clone(),
        phase,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PointerEventKind;
    use crate::mock_dom::{MockDom, MockElement};
    use crate::registry::{assertion, hook};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Journal = Arc<Mutex<Vec<String>>>;

    fn journaling(journal: &Journal, label: &'static str) -> Hook {
        let journal = Arc::clone(journal);
        hook(move |_world| {
            let journal = Arc::clone(&journal);
            async move {
                journal.lock().unwrap().push(label.to_string());
                Ok(())
            }
        })
    }

    fn counting(counter: &Arc<AtomicUsize>) -> Hook {
        let counter = Arc::clone(counter);
        hook(move |_world| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn failing(message: &'static str) -> Hook {
        hook(move |_world| async move { Err(GestureError::dom(message)) })
    }

    fn board() -> MockDom {
        let dom = MockDom::new();
        dom.insert(
            MockElement::new("div")
                .with_id("card")
                .with_rect(0.0, 0.0, 40.0, 40.0),
        );
        dom.insert(
            MockElement::new("div")
                .with_id("slot")
                .with_rect(200.0, 0.0, 40.0, 40.0),
        );
        dom
    }

    fn runner(dom: &MockDom) -> TestRunner {
        TestRunner::new(World::new(dom.clone()))
    }

    mod ordering_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_results_match_tests_in_order() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("mixed")
                    .with_test(TestCase::custom("ok"))
                    .with_test(TestCase::drag("missing", "#card", "#nowhere"))
                    .with_test(TestCase::custom("raises").with_assert(assertion(|_| async {
                        Err(GestureError::assertion("bad state"))
                    })))
                    .with_test(TestCase::custom("false").with_assert(assertion(|_| async { Ok(false) })))
                    .with_test(TestCase::drag("drag", "#card", "#slot").with_duration(100)),
            );

            let results = runner.run_all().await;
            assert_eq!(results.len(), 1);
            let names: Vec<_> = results[0].results.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["ok", "missing", "raises", "false", "drag"]);

            let outcomes: Vec<_> = results[0].results.iter().map(|r| r.outcome).collect();
            assert_eq!(
                outcomes,
                vec![
                    TestOutcome::Passed,
                    TestOutcome::Errored,
                    TestOutcome::Errored,
                    TestOutcome::Failed,
                    TestOutcome::Passed,
                ]
            );
            let missing = &results[0].results[1];
            assert!(missing.error.as_deref().unwrap().contains("#nowhere"));
            assert!(results[0].results[3].error.is_none());
            assert_eq!(results[0].results[4].path.as_ref().unwrap().len(), 7);
        }

        #[tokio::test(start_paused = true)]
        async fn test_hook_order() {
            let dom = board();
            let journal: Journal = Arc::default();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("hooks")
                    .with_before_all(journaling(&journal, "beforeAll"))
                    .with_before_each(journaling(&journal, "beforeEach"))
                    .with_after_each(journaling(&journal, "afterEach"))
                    .with_after_all(journaling(&journal, "afterAll"))
                    .with_test(
                        TestCase::custom("t")
                            .with_setup(journaling(&journal, "setup"))
                            .with_teardown(journaling(&journal, "teardown"))
                            .with_assert({
                                let journal = Arc::clone(&journal);
                                assertion(move |_| {
                                    let journal = Arc::clone(&journal);
                                    async move {
                                        journal.lock().unwrap().push("assert".to_string());
                                        Ok(true)
                                    }
                                })
                            }),
                    ),
            );
            runner.run_all().await;
            assert_eq!(
                *journal.lock().unwrap(),
                vec![
                    "beforeAll",
                    "setup",
                    "beforeEach",
                    "assert",
                    "teardown",
                    "afterEach",
                    "afterAll"
                ]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_phase_transitions() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(TestSuite::new("s").with_test(TestCase::custom("t")));
            runner.run_all().await;
            let phases: Vec<_> = runner.transitions().iter().map(|t| t.phase).collect();
            assert_eq!(
                phases,
                vec![
                    TestPhase::Pending,
                    TestPhase::Setup,
                    TestPhase::Simulating,
                    TestPhase::Asserting,
                    TestPhase::Teardown,
                    TestPhase::Done(TestOutcome::Passed),
                ]
            );
        }
    }

    mod failure_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_after_each_runs_when_assertion_raises() {
            let dom = board();
            let after_each = Arc::new(AtomicUsize::new(0));
            let mut runner = runner(&dom);
            let raising = || {
                TestCase::custom("raises")
                    .with_assert(assertion(|_| async { Err(GestureError::assertion("boom")) }))
            };
            runner.register_suite(
                TestSuite::new("s")
                    .with_after_each(counting(&after_each))
                    .with_test(raising())
                    .with_test(raising())
                    .with_test(TestCase::custom("fine")),
            );
            runner.run_all().await;
            assert_eq!(after_each.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_setup_failure_skips_gesture_but_tears_down() {
            let dom = board();
            let teardown = Arc::new(AtomicUsize::new(0));
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("s").with_test(
                    TestCase::drag("drag", "#card", "#slot")
                        .with_setup(failing("reset failed"))
                        .with_teardown(counting(&teardown)),
                ),
            );
            let results = runner.run_all().await;
            let result = &results[0].results[0];
            assert_eq!(result.outcome, TestOutcome::Errored);
            assert!(result.error.as_deref().unwrap().contains("reset failed"));
            assert!(result.error.as_deref().unwrap().contains("setup"));
            assert!(dom.events().is_empty());
            assert_eq!(teardown.load(Ordering::SeqCst), 1);
            assert!(!runner.transitions().iter().any(|t| t.phase == TestPhase::Simulating));
        }

        #[tokio::test(start_paused = true)]
        async fn test_teardown_error_recorded_not_failing() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("s")
                    .with_after_each(failing("cleanup"))
                    .with_test(TestCase::custom("t").with_teardown(failing("own"))),
            );
            let results = runner.run_all().await;
            let result = &results[0].results[0];
            assert!(result.passed);
            assert!(result.error.is_none());
            let teardown = result.teardown_error.as_deref().unwrap();
            assert!(teardown.contains("own"));
            assert!(teardown.contains("cleanup"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_before_all_failure_errors_every_test() {
            let dom = board();
            let after_all = Arc::new(AtomicUsize::new(0));
            let setups = Arc::new(AtomicUsize::new(0));
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("broken")
                    .with_before_all(failing("no fixture"))
                    .with_after_all(counting(&after_all))
                    .with_test(TestCase::custom("a").with_setup(counting(&setups)))
                    .with_test(TestCase::custom("b")),
            );
            runner.register_suite(TestSuite::new("healthy").with_test(TestCase::custom("c")));

            let results = runner.run_all().await;
            assert_eq!(results[0].total(), 2);
            assert_eq!(results[0].errored_count(), 2);
            assert!(results[0].results[0].error.as_deref().unwrap().contains("no fixture"));
            assert!(results[1].all_passed());
            assert_eq!(after_all.load(Ordering::SeqCst), 1);
            assert_eq!(setups.load(Ordering::SeqCst), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_after_all_failure_is_recorded() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("s")
                    .with_after_all(failing("leak"))
                    .with_test(TestCase::custom("t")),
            );
            let results = runner.run_all().await;
            assert!(results[0].all_passed());
            assert!(results[0].after_all_error.as_deref().unwrap().contains("leak"));
        }
    }

    mod timing_tests {
        use super::*;

        fn sleeping(ms: u64) -> Hook {
            hook(move |world| async move {
                world.sleep_ms(ms).await;
                Ok(())
            })
        }

        #[tokio::test(start_paused = true)]
        async fn test_duration_covers_setup_through_teardown() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("s").with_test(
                    TestCase::custom("slow")
                        .with_setup(sleeping(100))
                        .with_teardown(sleeping(50)),
                ),
            );
            let results = runner.run_all().await;
            assert!(results[0].results[0].duration >= Duration::from_millis(150));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_ignored_by_default() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("s")
                    .with_test(TestCase::custom("slow").with_setup(sleeping(500)).with_timeout(100)),
            );
            let results = runner.run_all().await;
            assert!(results[0].results[0].passed);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_enforced_when_enabled() {
            let dom = board();
            let teardown = Arc::new(AtomicUsize::new(0));
            let mut runner = TestRunner::with_config(
                World::new(dom.clone()),
                RunnerConfig::builder().enforce_timeouts(true).build(),
            );
            runner.register_suite(
                TestSuite::new("s").with_test(
                    TestCase::custom("slow")
                        .with_setup(sleeping(500))
                        .with_teardown(counting(&teardown))
                        .with_timeout(100),
                ),
            );
            let results = runner.run_all().await;
            let result = &results[0].results[0];
            assert_eq!(result.outcome, TestOutcome::Errored);
            assert!(result.error.as_deref().unwrap().contains("100ms"));
            assert_eq!(teardown.load(Ordering::SeqCst), 1);
            assert!(result.duration < Duration::from_millis(500));
        }
    }

    mod registry_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_run_suite_by_name_unknown_is_none() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(TestSuite::new("a").with_test(TestCase::custom("t")));
            runner.run_all().await;
            let before = runner.results().to_vec();

            assert!(runner.run_suite_by_name("zzz").await.is_none());
            assert_eq!(runner.results(), before.as_slice());
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_suite_by_name_replaces_only_that_suite() {
            let dom = board();
            let flip = Arc::new(AtomicUsize::new(0));
            let mut runner = runner(&dom);
            runner.register_suite(TestSuite::new("a").with_test(TestCase::custom("t")));
            runner.register_suite(TestSuite::new("b").with_test(TestCase::custom("u").with_assert({
                let flip = Arc::clone(&flip);
                assertion(move |_| {
                    let flip = Arc::clone(&flip);
                    async move { Ok(flip.fetch_add(1, Ordering::SeqCst) > 0) }
                })
            })));
            runner.run_all().await;
            assert!(!runner.suite_results("b").unwrap().all_passed());
            let a_before = runner.suite_results("a").cloned();

            let rerun = runner.run_suite_by_name("b").await.unwrap();
            assert!(rerun.all_passed());
            assert_eq!(runner.results().len(), 2);
            assert_eq!(runner.results()[1].suite_name, "b");
            assert!(runner.suite_results("b").unwrap().all_passed());
            assert_eq!(runner.suite_results("a").cloned(), a_before);
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_suite_by_name_before_run_all() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(TestSuite::new("a").with_test(TestCase::custom("t")));
            runner.register_suite(TestSuite::new("b").with_test(TestCase::custom("u")));
            runner.run_suite_by_name("b").await.unwrap();
            assert_eq!(runner.results().len(), 1);
            assert_eq!(runner.results()[0].suite_name, "b");
        }

        #[tokio::test(start_paused = true)]
        async fn test_reset_clears_everything() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(TestSuite::new("a").with_test(TestCase::custom("t")));
            runner.run_all().await;
            runner.reset();
            assert!(runner.suites().is_empty());
            assert!(runner.results().is_empty());
            assert_eq!(runner.summary().total, 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_set_config_applies_to_next_run() {
            let dom = board();
            let mut runner = runner(&dom);
            runner.register_suite(
                TestSuite::new("a").with_test(TestCase::drag("d", "#card", "#slot").with_duration(1000)),
            );
            runner.set_config(RunnerConfig::builder().fps(10).build());
            let results = runner.run_all().await;
            assert_eq!(results[0].results[0].path.as_ref().unwrap().len(), 11);
            assert_eq!(dom.events_of(PointerEventKind::Press).len(), 1);
        }
    }
}
