//! Conversion of parsed documents into runnable suites.

use std::path::Path as FsPath;

use crate::assertion::{AssertionKind, AssertionRule, AssertionValidator};
use crate::config::{DEFAULT_CURVATURE, DEFAULT_DURATION_MS};
use crate::harness::{HoverTiming, SimulationConfig, TestCase, TestSuite};
use crate::registry::{assertion, hook, AssertFn, CallbackRegistry, Hook};
use crate::result::GestureResult;
use crate::runner::TestRunner;

use super::schema::{SetupSpec, SpecDefaults, TestFileSpec, TestSpec, TestSuiteSpec};

/// When callback names are looked up in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingMode {
    /// Look names up when the callback runs; a missing name errors that test
    #[default]
    Deferred,
    /// Look names up during conversion; a missing name fails the conversion
    Eager,
}

/// Turns a [`TestFileSpec`] into [`TestSuite`]s
#[derive(Debug, Clone, Default)]
pub struct SpecConverter {
    registry: CallbackRegistry,
    mode: BindingMode,
}

impl SpecConverter {
    /// Create a converter binding names through `registry`
    #[must_use]
    pub fn new(registry: CallbackRegistry) -> Self {
        Self {
            registry,
            mode: BindingMode::Deferred,
        }
    }

    /// Set binding mode
    #[must_use]
    pub const fn with_mode(mut self, mode: BindingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Current binding mode
    #[must_use]
    pub const fn mode(&self) -> BindingMode {
        self.mode
    }

    /// Convert every suite, preserving order
    ///
    /// # Errors
    ///
    /// In eager mode, returns `UnresolvedCallback` for the first unknown
    /// hook or predicate name
    pub fn convert(&self, spec: &TestFileSpec) -> GestureResult<Vec<TestSuite>> {
        let defaults = spec.defaults();
        let suites = spec
            .suites
            .iter()
            .map(|suite| self.convert_suite(suite, &defaults))
            .collect::<GestureResult<Vec<_>>>()?;
        tracing::debug!(
            suites = suites.len(),
            tests = spec.test_count(),
            mode = ?self.mode,
            "converted test document"
        );
        Ok(suites)
    }

    /// Convert one suite
    ///
    /// # Errors
    ///
    /// See [`SpecConverter::convert`]
    pub fn convert_suite(
        &self,
        spec: &TestSuiteSpec,
        defaults: &SpecDefaults,
    ) -> GestureResult<TestSuite> {
        let mut suite = TestSuite::new(spec.name.clone());
        suite.description = spec.description.clone();
        suite.before_all = self.bind_optional(spec.before_all.as_deref())?;
        suite.after_all = self.bind_optional(spec.after_all.as_deref())?;
        suite.before_each = self.bind_optional(spec.before_each.as_deref())?;
        suite.after_each = self.bind_optional(spec.after_each.as_deref())?;
        for test in &spec.tests {
            suite.add_test(self.convert_test(test, defaults)?);
        }
        Ok(suite)
    }

    /// Convert one test, filling duration and curvature from the test, then
    /// the document config, then the built-in defaults
    ///
    /// # Errors
    ///
    /// See [`SpecConverter::convert`]
    pub fn convert_test(&self, spec: &TestSpec, defaults: &SpecDefaults) -> GestureResult<TestCase> {
        let sim = &spec.simulation;
        let simulation = SimulationConfig {
            from: sim.from.clone(),
            to: sim.to.clone(),
            from_anchor: sim.from_position.unwrap_or_default(),
            to_anchor: sim.to_position.unwrap_or_default(),
            duration_ms: Some(
                sim.duration
                    .or(defaults.duration)
                    .unwrap_or(DEFAULT_DURATION_MS),
            ),
            curvature: Some(
                sim.curvature
                    .or(defaults.curvature)
                    .unwrap_or(DEFAULT_CURVATURE),
            ),
            dispatch_events: sim.dispatch_events.unwrap_or(true),
            hover: HoverTiming {
                hold_ms: sim.hover_duration,
                approach_ms: sim.approach_duration,
                departure_ms: sim.departure_duration,
            },
            leave_to: sim.leave_to.clone(),
        };

        let mut test = TestCase::new(spec.name.clone(), spec.kind);
        test.description = spec.description.clone();
        test.simulation = simulation;
        test.visualization = spec.visualization.as_ref().and_then(|v| v.resolve());
        test.timeout_ms = spec.timeout;
        test.assert = spec
            .assert
            .as_ref()
            .map(|rule| self.bind_assertion(rule))
            .transpose()?;
        test.setup = spec
            .setup
            .as_ref()
            .map(|setup| self.bind_setup(setup, defaults))
            .transpose()?;
        test.teardown = self.bind_optional(
            spec.teardown
                .as_ref()
                .and_then(|t| t.execute_function.as_deref()),
        )?;
        Ok(test)
    }

    fn bind_optional(&self, name: Option<&str>) -> GestureResult<Option<Hook>> {
        name.map(|name| self.bind_hook(name)).transpose()
    }

    fn bind_hook(&self, name: &str) -> GestureResult<Hook> {
        match self.mode {
            BindingMode::Eager => self.registry.require_hook(name),
            BindingMode::Deferred => {
                let registry = self.registry.clone();
                let name = name.to_string();
                Ok(hook(move |world| {
                    let resolved = registry.require_hook(&name);
                    async move { resolved?(world).await }
                }))
            }
        }
    }

    // reset, wait, execute
    fn bind_setup(&self, spec: &SetupSpec, defaults: &SpecDefaults) -> GestureResult<Hook> {
        let reset = self.bind_optional(spec.reset_function.as_deref())?;
        let execute = self.bind_optional(spec.execute_function.as_deref())?;
        let wait_ms = spec.wait_time.or(defaults.wait_time).unwrap_or(0);
        Ok(hook(move |world| {
            let reset = reset.clone();
            let execute = execute.clone();
            async move {
                if let Some(reset) = reset {
                    reset(world.clone()).await?;
                }
                if wait_ms > 0 {
                    world.sleep_ms(wait_ms).await;
                }
                if let Some(execute) = execute {
                    execute(world).await?;
                }
                Ok(())
            }
        }))
    }

    fn bind_assertion(&self, rule: &AssertionRule) -> GestureResult<AssertFn> {
        let custom = match (&rule.kind, &rule.custom_function) {
            (AssertionKind::Custom, Some(name)) => Some(name.clone()),
            _ => None,
        };
        if let (BindingMode::Eager, Some(name)) = (self.mode, &custom) {
            self.registry.require_predicate(name)?;
        }

        let registry = self.registry.clone();
        let validator = AssertionValidator::new(self.registry.clone());
        let rule = rule.clone();
        Ok(assertion(move |world| {
            let unresolved = custom
                .as_deref()
                .map(|name| registry.require_predicate(name))
                .transpose();
            let validator = validator.clone();
            let rule = rule.clone();
            async move {
                unresolved?;
                Ok(validator.validate(&world, &rule).await)
            }
        }))
    }
}

/// A parsed document together with its converted suites
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    /// The parsed document
    pub spec: TestFileSpec,
    /// Runnable suites in document order
    pub suites: Vec<TestSuite>,
}

impl LoadedSpec {
    /// Convert an already parsed document
    ///
    /// # Errors
    ///
    /// See [`SpecConverter::convert`]
    pub fn from_spec(spec: TestFileSpec, converter: &SpecConverter) -> GestureResult<Self> {
        let suites = converter.convert(&spec)?;
        Ok(Self { spec, suites })
    }

    /// Parse and convert a JSON document
    ///
    /// # Errors
    ///
    /// Returns `SpecParse` for malformed or invalid documents
    pub fn from_json(json: &str, converter: &SpecConverter) -> GestureResult<Self> {
        Self::from_spec(TestFileSpec::from_json(json)?, converter)
    }

    /// Parse and convert a YAML document
    ///
    /// # Errors
    ///
    /// Returns `SpecParse` for malformed or invalid documents
    pub fn from_yaml(yaml: &str, converter: &SpecConverter) -> GestureResult<Self> {
        Self::from_spec(TestFileSpec::from_yaml(yaml)?, converter)
    }

    /// Load, parse and convert a document file
    ///
    /// # Errors
    ///
    /// Returns `SpecParse` when the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<FsPath>, converter: &SpecConverter) -> GestureResult<Self> {
        Self::from_spec(TestFileSpec::from_path(path)?, converter)
    }

    /// Number of converted tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(TestSuite::test_count).sum()
    }

    /// Register every suite with a runner and apply document-level config
    pub fn register_with(self, runner: &mut TestRunner) {
        let config = self.spec.apply_to(runner.config().clone());
        runner.set_config(config);
        for suite in self.suites {
            runner.register_suite(suite);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::World;
    use crate::geometry::Anchor;
    use crate::harness::GestureKind;
    use crate::mock_dom::{MockDom, MockElement};
    use crate::registry::predicate;
    use crate::resolver::PointTarget;
    use crate::result::GestureError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const DOC: &str = r##"{
        "version": "1.0",
        "config": {"duration": 750},
        "suites": [
            {
                "name": "drags",
                "beforeAll": "boot",
                "tests": [
                    {"name": "a", "type": "drag", "simulation": {"from": "#a", "to": "#b", "curvature": 0.5}},
                    {"name": "b", "type": "drag", "simulation": {"from": "#a", "to": "#b", "duration": 200, "fromPosition": "left"}},
                    {"name": "c", "type": "click", "simulation": {"to": "#b"}, "timeout": 900}
                ]
            },
            {
                "name": "checks",
                "tests": [
                    {"name": "d", "type": "custom", "assert": {"type": "custom", "customFunction": "isReady"}}
                ]
            }
        ]
    }"##;

    fn world() -> (World, MockDom) {
        let dom = MockDom::new();
        dom.insert(MockElement::new("div").with_id("a").with_rect(0.0, 0.0, 10.0, 10.0));
        (World::new(dom.clone()), dom)
    }

    mod convert_tests {
        use super::*;

        #[test]
        fn test_converts_every_suite_and_test() {
            let spec = TestFileSpec::from_json(DOC).unwrap();
            let suites = SpecConverter::default().convert(&spec).unwrap();
            assert_eq!(suites.len(), 2);
            assert_eq!(suites[0].name, "drags");
            assert_eq!(suites[0].test_count(), 3);
            assert_eq!(suites[1].test_count(), 1);
            assert!(suites[0].before_all.is_some());
            assert!(suites[1].before_all.is_none());
        }

        #[test]
        fn test_duration_and_curvature_fallbacks() {
            let spec = TestFileSpec::from_json(DOC).unwrap();
            let suites = SpecConverter::default().convert(&spec).unwrap();
            let tests = &suites[0].tests;

            assert_eq!(tests[0].simulation.duration_ms, Some(750));
            assert_eq!(tests[0].simulation.curvature, Some(0.5));
            assert_eq!(tests[1].simulation.duration_ms, Some(200));
            assert_eq!(tests[1].simulation.curvature, Some(DEFAULT_CURVATURE));
            assert_eq!(tests[1].simulation.from_anchor, Anchor::Left);
            assert_eq!(tests[1].simulation.to_anchor, Anchor::Center);
            assert_eq!(tests[2].kind, GestureKind::Click);
            assert_eq!(tests[2].timeout_ms, Some(900));
        }

        #[test]
        fn test_builtin_defaults_without_config() {
            let json = r##"{"version": "1", "suites": [{"name": "s", "tests": [
                {"name": "t", "type": "drag", "simulation": {"from": "#a", "to": {"x": 5, "y": 5}, "dispatchEvents": false}}
            ]}]}"##;
            let spec = TestFileSpec::from_json(json).unwrap();
            let suites = SpecConverter::default().convert(&spec).unwrap();
            let sim = &suites[0].tests[0].simulation;
            assert_eq!(sim.duration_ms, Some(DEFAULT_DURATION_MS));
            assert_eq!(sim.curvature, Some(DEFAULT_CURVATURE));
            assert!(!sim.dispatch_events);
            assert_eq!(sim.to, Some(PointTarget::point(5.0, 5.0)));
        }
    }

    mod binding_tests {
        use super::*;

        #[test]
        fn test_eager_rejects_unknown_hook() {
            let spec = TestFileSpec::from_json(DOC).unwrap();
            let converter = SpecConverter::default().with_mode(BindingMode::Eager);
            let err = converter.convert(&spec).unwrap_err();
            assert!(matches!(
                err,
                GestureError::UnresolvedCallback { ref name, kind: "hook" } if name == "boot"
            ));
        }

        #[test]
        fn test_eager_rejects_unknown_predicate() {
            let registry = CallbackRegistry::new();
            registry.register_hook("boot", hook(|_| async { Ok(()) }));
            let spec = TestFileSpec::from_json(DOC).unwrap();
            let converter = SpecConverter::new(registry).with_mode(BindingMode::Eager);
            let err = converter.convert(&spec).unwrap_err();
            assert!(matches!(err, GestureError::UnresolvedCallback { kind: "predicate", .. }));
        }

        #[tokio::test]
        async fn test_deferred_resolves_late_registration() {
            let registry = CallbackRegistry::new();
            let spec = TestFileSpec::from_json(DOC).unwrap();
            let suites = SpecConverter::new(registry.clone()).convert(&spec).unwrap();
            let (world, _dom) = world();

            let before_all = suites[0].before_all.clone().unwrap();
            let err = before_all(world.clone()).await.unwrap_err();
            assert!(matches!(err, GestureError::UnresolvedCallback { .. }));

            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            registry.register_hook(
                "boot",
                hook(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                }),
            );
            before_all(world).await.unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_deferred_custom_assertion() {
            let registry = CallbackRegistry::new();
            let spec = TestFileSpec::from_json(DOC).unwrap();
            let suites = SpecConverter::new(registry.clone()).convert(&spec).unwrap();
            let (world, _dom) = world();
            let assert = suites[1].tests[0].assert.clone().unwrap();

            let err = assert(world.clone()).await.unwrap_err();
            assert!(matches!(err, GestureError::UnresolvedCallback { kind: "predicate", .. }));

            registry.register_predicate(
                "isReady",
                predicate(|world, _rule| async move { world.exists("#a").await }),
            );
            assert!(assert(world).await.unwrap());
        }

        #[tokio::test]
        async fn test_builtin_assertion_false_is_not_error() {
            let json = r##"{"version": "1", "suites": [{"name": "s", "tests": [
                {"name": "t", "type": "custom", "assert": {"type": "selector-exists", "selector": "#missing"}}
            ]}]}"##;
            let spec = TestFileSpec::from_json(json).unwrap();
            let suites = SpecConverter::default().convert(&spec).unwrap();
            let (world, _dom) = world();
            let assert = suites[0].tests[0].assert.clone().unwrap();
            assert!(!assert(world).await.unwrap());
        }
    }

    mod setup_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_setup_order_and_wait() {
            let registry = CallbackRegistry::new();
            let log = Arc::new(Mutex::new(Vec::new()));
            for name in ["reset", "prepare", "cleanup"] {
                let log = Arc::clone(&log);
                registry.register_hook(
                    name,
                    hook(move |_| {
                        let log = Arc::clone(&log);
                        async move {
                            let at = tokio::time::Instant::now();
                            log.lock().unwrap().push((name, at));
                            Ok(())
                        }
                    }),
                );
            }
            let json = r#"{"version": "1", "config": {"waitTime": 40}, "suites": [{"name": "s", "tests": [
                {"name": "t", "type": "custom",
                 "setup": {"resetFunction": "reset", "executeFunction": "prepare"},
                 "teardown": {"executeFunction": "cleanup"}}
            ]}]}"#;
            let spec = TestFileSpec::from_json(json).unwrap();
            let suites = SpecConverter::new(registry)
                .with_mode(BindingMode::Eager)
                .convert(&spec)
                .unwrap();
            let test = &suites[0].tests[0];
            let (world, _dom) = world();

            test.setup.clone().unwrap()(world.clone()).await.unwrap();
            test.teardown.clone().unwrap()(world).await.unwrap();

            let log = log.lock().unwrap();
            let names: Vec<_> = log.iter().map(|(n, _)| *n).collect();
            assert_eq!(names, ["reset", "prepare", "cleanup"]);
            assert!(log[1].1 - log[0].1 >= Duration::from_millis(40));
        }
    }

    mod loaded_tests {
        use super::*;

        #[test]
        fn test_loaded_spec_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("gestures.json");
            std::fs::write(&path, DOC).unwrap();
            let loaded = LoadedSpec::from_path(&path, &SpecConverter::default()).unwrap();
            assert_eq!(loaded.test_count(), 4);
            assert_eq!(loaded.spec.suites.len(), 2);
        }

        #[test]
        fn test_register_with_runner() {
            let (world, _dom) = world();
            let mut runner = TestRunner::new(world);
            let loaded = LoadedSpec::from_json(DOC, &SpecConverter::default()).unwrap();
            loaded.register_with(&mut runner);
            assert_eq!(runner.test_count(), 4);
            assert_eq!(runner.config().default_duration_ms, 750);
        }

        #[test]
        fn test_invalid_document_is_spec_parse() {
            let err = LoadedSpec::from_json("[]", &SpecConverter::default()).unwrap_err();
            assert!(matches!(err, GestureError::SpecParse { .. }));
        }
    }
}
