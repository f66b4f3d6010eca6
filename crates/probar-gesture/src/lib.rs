//! Probar Gestures: synthetic pointer gesture testing against a live DOM
//!
//! Drives drag, click, and hover interactions along human-like curved
//! paths, dispatching the same mouse events a real pointer would, then
//! checks declarative or custom assertions against the resulting DOM.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  JSON/YAML document ──► SpecConverter ──► TestSuite/TestCase     │
//! │                              │                                   │
//! │                        CallbackRegistry (hooks, predicates)      │
//! │                                                                  │
//! │  TestRunner ──► GestureSimulator ──► PointResolver ──► Dom       │
//! │      │                │                                 ▲        │
//! │      │                ├── path (quadratic Bézier)       │        │
//! │      │                └── EventSynthesizer ─────────────┘        │
//! │      └──► AssertionValidator ──► ResultSummary                   │
//! │                                                                  │
//! │  AutomationController: single-flight runs + ResultSlot polling   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use probar_gesture::{
//!     assertion, AssertionRule, AssertionValidator, CallbackRegistry, MockDom, MockElement,
//!     TestCase, TestRunner, TestSuite, World,
//! };
//!
//! # async fn demo() {
//! let dom = MockDom::new();
//! dom.insert(MockElement::new("div").with_id("card").with_rect(10.0, 10.0, 50.0, 30.0));
//! dom.insert(MockElement::new("div").with_id("done").with_rect(300.0, 10.0, 100.0, 100.0));
//!
//! let validator = AssertionValidator::new(CallbackRegistry::new());
//! let rule = AssertionRule::selector_exists("#card");
//! let suite = TestSuite::new("board").with_test(
//!     TestCase::drag("move card", "#card", "#done").with_assert(assertion(move |world| {
//!         let validator = validator.clone();
//!         let rule = rule.clone();
//!         async move { Ok(validator.validate(&world, &rule).await) }
//!     })),
//! );
//!
//! let mut runner = TestRunner::new(World::new(dom));
//! runner.register_suite(suite);
//! runner.run_all().await;
//! println!("{}", runner.summary().to_json().unwrap());
//! # }
//! ```

#![warn(missing_docs)]

mod assertion;
mod automation;
mod config;
mod dom;
mod event;
mod geometry;
mod gesture;
mod harness;
mod mock_dom;
mod path;
mod registry;
mod resolver;
mod result;
mod runner;
mod summary;
mod synthesizer;
mod wait;

/// Chromium backend over CDP
#[cfg(feature = "browser")]
pub mod browser;

/// Tracing subscriber setup
pub mod logging;

/// Declarative JSON/YAML test documents
pub mod spec;

pub use assertion::{AssertionKind, AssertionResult, AssertionRule, AssertionValidator};
pub use automation::{
    wait_for_completion, AutomationController, AutomationReport, ResultSlot, RunHandle,
};
pub use config::{
    RunnerConfig, RunnerConfigBuilder, DEFAULT_CLICK_DURATION_MS, DEFAULT_CURVATURE,
    DEFAULT_DURATION_MS, DEFAULT_FPS, ENV_FPS, ENV_SLOW_MOTION, ENV_VISUALIZE, MAX_SLOW_MOTION,
};
pub use dom::{Dom, ElementId, World};
pub use event::{PointerEventKind, SyntheticEvent, PRIMARY_BUTTON_MASK};
pub use geometry::{Anchor, BoundingBox, Point};
pub use gesture::{GestureSimulator, PathVisualizer};
pub use harness::{
    GestureKind, HoverTiming, SimulationConfig, SuiteResults, TestCase, TestOutcome, TestPhase,
    TestResult, TestSuite, VisualizationConfig,
};
pub use mock_dom::{DispatchedEvent, Listener, MockDocument, MockDom, MockElement};
pub use path::{
    control_point, curved_path, frame_count, hover_path, straight_path, HoverPath, Path,
    CURVATURE_SCALE,
};
pub use registry::{assertion, hook, predicate, AssertFn, CallbackRegistry, Hook, Predicate};
pub use resolver::{PointResolver, PointTarget, TargetRole, DEFAULT_HANDLE_SELECTOR};
pub use result::{GestureError, GestureResult};
pub use runner::{PhaseTransition, TestRunner};
pub use spec::{BindingMode, LoadedSpec, SpecConverter, TestFileSpec};
pub use summary::ResultSummary;
pub use synthesizer::{EventSynthesizer, Playback};
pub use wait::{
    poll_until, wait_timeout, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
