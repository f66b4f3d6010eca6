//! Declarative Gesture Test Documents
//!
//! Suites can be written as JSON or YAML and converted into runnable
//! [`TestSuite`](crate::TestSuite)s. Hooks and custom predicates are
//! referenced by name and resolved through a
//! [`CallbackRegistry`](crate::CallbackRegistry).
//!
//! ```yaml
//! version: "1.0"
//! config:
//!   duration: 800
//! suites:
//!   - name: kanban
//!     beforeEach: resetBoard
//!     tests:
//!       - name: move card
//!         type: drag
//!         simulation:
//!           from: "#card-1"
//!           to: "#done"
//!         assert:
//!           type: count-equals
//!           selector: "#done .card"
//!           expected: 1
//! ```

mod convert;
mod schema;

pub use convert::{BindingMode, LoadedSpec, SpecConverter};
pub use schema::{
    SetupSpec, SimulationSpec, SpecDefaults, SpecError, TeardownSpec, TestFileSpec, TestSpec,
    TestSuiteSpec, VisualizationSpec, SUPPORTED_MAJOR_VERSION,
};
