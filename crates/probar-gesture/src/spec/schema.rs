//! Declarative test document schema (JSON or YAML, camelCase keys).
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "config": { "duration": 800, "curvature": 0.2 },
//!   "suites": [{
//!     "name": "kanban",
//!     "beforeEach": "resetBoard",
//!     "tests": [{
//!       "name": "move card",
//!       "type": "drag",
//!       "simulation": { "from": "#card-1", "to": "#done", "toPosition": "top" },
//!       "assert": { "type": "count-equals", "selector": "#done .card", "expected": 1 }
//!     }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path as FsPath;
use thiserror::Error;

use crate::assertion::AssertionRule;
use crate::config::RunnerConfig;
use crate::geometry::Anchor;
use crate::harness::{GestureKind, VisualizationConfig};
use crate::resolver::PointTarget;
use crate::result::GestureError;

/// Major document version this crate reads
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

/// Root of a test document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFileSpec {
    /// Document version ("1", "1.0", 1 ...)
    #[serde(deserialize_with = "version_string")]
    pub version: String,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Document-wide defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SpecDefaults>,
    /// Suites in run order
    pub suites: Vec<TestSuiteSpec>,
}

/// Document-wide defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDefaults {
    /// Drag duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Path curvature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curvature: Option<f64>,
    /// Playback frame rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    /// Setup wait in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<u64>,
}

/// A suite in a test document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteSpec {
    /// Suite name (unique within the document)
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tests in run order
    #[serde(default)]
    pub tests: Vec<TestSpec>,
    /// Hook name run before the first test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_all: Option<String>,
    /// Hook name run after the last test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_all: Option<String>,
    /// Hook name run before each test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_each: Option<String>,
    /// Hook name run after each test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_each: Option<String>,
}

/// A test in a test document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSpec {
    /// Test name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Gesture kind
    #[serde(rename = "type")]
    pub kind: GestureKind,
    /// Gesture endpoints and timing
    #[serde(default)]
    pub simulation: SimulationSpec,
    /// `true`, `false`, or a visualization object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<VisualizationSpec>,
    /// Assertion run after the gesture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assert: Option<AssertionRule>,
    /// Setup steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<SetupSpec>,
    /// Teardown steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown: Option<TeardownSpec>,
    /// Timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Gesture parameters of a test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSpec {
    /// Start selector or `{x, y}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PointTarget>,
    /// End selector or `{x, y}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PointTarget>,
    /// Anchor on the start element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_position: Option<Anchor>,
    /// Anchor on the end element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_position: Option<Anchor>,
    /// Drag duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Path curvature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curvature: Option<f64>,
    /// Dispatch events (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_events: Option<bool>,
    /// Hover rest time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_duration: Option<u64>,
    /// Hover approach duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_duration: Option<u64>,
    /// Hover departure duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_duration: Option<u64>,
    /// Hover exit point (defaults to `from`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_to: Option<PointTarget>,
}

/// Visualization toggle or settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisualizationSpec {
    /// `true` uses default settings, `false` disables
    Enabled(bool),
    /// Explicit settings
    Config(VisualizationConfig),
}

impl VisualizationSpec {
    /// Effective settings, `None` when disabled
    #[must_use]
    pub fn resolve(&self) -> Option<VisualizationConfig> {
        match self {
            Self::Enabled(true) => Some(VisualizationConfig::default()),
            Self::Enabled(false) => None,
            Self::Config(config) => Some(config.clone()),
        }
    }
}

/// Setup steps: reset, wait, execute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupSpec {
    /// Hook name run first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_function: Option<String>,
    /// Wait after reset, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<u64>,
    /// Hook name run last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_function: Option<String>,
}

/// Teardown steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownSpec {
    /// Hook name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_function: Option<String>,
}

/// Errors raised while loading a test document
#[derive(Debug, Error)]
pub enum SpecError {
    /// Malformed JSON/YAML or wrong field types
    #[error("Failed to parse test document: {0}")]
    Parse(String),

    /// Version with an unsupported major number
    #[error("Unsupported version '{0}', expected {SUPPORTED_MAJOR_VERSION}.x")]
    UnsupportedVersion(String),

    /// Suite with an empty name
    #[error("Suite #{index} has an empty name")]
    EmptySuiteName {
        /// Position in the document
        index: usize,
    },

    /// Test with an empty name
    #[error("Test #{index} in suite '{suite}' has an empty name")]
    EmptyTestName {
        /// Suite name
        suite: String,
        /// Position in the suite
        index: usize,
    },

    /// Two suites share a name
    #[error("Duplicate suite name '{0}'")]
    DuplicateSuite(String),

    /// Gesture test without a required endpoint
    #[error("Test '{test}' in suite '{suite}' is missing simulation.{field}")]
    MissingField {
        /// Suite name
        suite: String,
        /// Test name
        test: String,
        /// Missing field
        field: &'static str,
    },

    /// Numeric value out of range
    #[error("Test '{test}' has invalid {field}: {message}")]
    InvalidValue {
        /// Test name
        test: String,
        /// Field name
        field: &'static str,
        /// Problem description
        message: String,
    },

    /// File extension other than json/yaml/yml
    #[error("Unsupported test document extension '{0}'")]
    UnsupportedExtension(String),

    /// File could not be read
    #[error("Failed to read test document: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SpecError> for GestureError {
    fn from(err: SpecError) -> Self {
        Self::spec_parse(err.to_string())
    }
}

fn version_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Int(u64),
        Float(f64),
    }
    Ok(match Version::deserialize(deserializer)? {
        Version::Text(s) => s,
        Version::Int(n) => n.to_string(),
        Version::Float(f) => format!("{f:?}"),
    })
}

impl TestFileSpec {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let spec: Self = serde_json::from_str(json).map_err(|e| SpecError::Parse(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse and validate a YAML document
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or fails validation
    pub fn from_yaml(yaml: &str) -> Result<Self, SpecError> {
        let spec: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| SpecError::Parse(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has another extension,
    /// or fails to parse
    pub fn from_path(path: impl AsRef<FsPath>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content = std::fs::read_to_string(path)?;
        match extension.as_str() {
            "json" => Self::from_json(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            _ => Err(SpecError::UnsupportedExtension(extension)),
        }
    }

    /// Check structural rules
    ///
    /// # Errors
    ///
    /// Returns the first violation found
    pub fn validate(&self) -> Result<(), SpecError> {
        let major = self
            .version
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u64>().ok());
        if major != Some(SUPPORTED_MAJOR_VERSION) {
            return Err(SpecError::UnsupportedVersion(self.version.clone()));
        }

        if let Some(curvature) = self.config.as_ref().and_then(|c| c.curvature) {
            if !curvature.is_finite() {
                return Err(SpecError::InvalidValue {
                    test: "<config>".to_string(),
                    field: "curvature",
                    message: format!("{curvature} is not finite"),
                });
            }
        }

        let mut seen = HashSet::new();
        for (index, suite) in self.suites.iter().enumerate() {
            if suite.name.trim().is_empty() {
                return Err(SpecError::EmptySuiteName { index });
            }
            if !seen.insert(suite.name.as_str()) {
                return Err(SpecError::DuplicateSuite(suite.name.clone()));
            }
            for (index, test) in suite.tests.iter().enumerate() {
                test.validate(&suite.name, index)?;
            }
        }
        Ok(())
    }

    /// Total number of tests across suites
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }

    /// Document defaults (empty when `config` is absent)
    #[must_use]
    pub fn defaults(&self) -> SpecDefaults {
        self.config.clone().unwrap_or_default()
    }

    /// Apply document-level `fps`, `duration` and `curvature` to a runner
    /// configuration
    #[must_use]
    pub fn apply_to(&self, mut config: RunnerConfig) -> RunnerConfig {
        let defaults = self.defaults();
        if let Some(fps) = defaults.fps {
            config.fps = fps;
        }
        if let Some(duration) = defaults.duration {
            config.default_duration_ms = duration;
        }
        if let Some(curvature) = defaults.curvature {
            config.default_curvature = curvature;
        }
        config
    }
}

impl TestSpec {
    fn validate(&self, suite: &str, index: usize) -> Result<(), SpecError> {
        if self.name.trim().is_empty() {
            return Err(SpecError::EmptyTestName {
                suite: suite.to_string(),
                index,
            });
        }
        let missing = |field| SpecError::MissingField {
            suite: suite.to_string(),
            test: self.name.clone(),
            field,
        };
        let sim = &self.simulation;
        match self.kind {
            GestureKind::Drag | GestureKind::Hover => {
                if sim.from.is_none() {
                    return Err(missing("from"));
                }
                if sim.to.is_none() {
                    return Err(missing("to"));
                }
            }
            GestureKind::Click => {
                if sim.to.is_none() && sim.from.is_none() {
                    return Err(missing("to"));
                }
            }
            GestureKind::Custom => {}
        }
        if let Some(curvature) = sim.curvature {
            if !curvature.is_finite() {
                return Err(SpecError::InvalidValue {
                    test: self.name.clone(),
                    field: "curvature",
                    message: format!("{curvature} is not finite"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::AssertionKind;

    const DOC: &str = r##"{
        "version": "1.0",
        "metadata": {"author": "qa"},
        "config": {"duration": 800, "curvature": 0.1, "fps": 30, "waitTime": 50},
        "suites": [{
            "name": "board",
            "beforeEach": "resetBoard",
            "tests": [
                {
                    "name": "drag card",
                    "type": "drag",
                    "simulation": {"from": "#card", "to": {"x": 300, "y": 40}, "toPosition": "top-left"},
                    "assert": {"type": "has-class", "selector": "#card", "expected": "moved"},
                    "setup": {"resetFunction": "resetBoard", "waitTime": 10}
                },
                {
                    "name": "hover tip",
                    "type": "hover",
                    "simulation": {"from": "#a", "to": "#tip", "hoverDuration": 250, "leaveTo": "#b"},
                    "visualization": true
                },
                {"name": "noop", "type": "custom"}
            ]
        }]
    }"##;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_full_document() {
            let spec = TestFileSpec::from_json(DOC).unwrap();
            assert_eq!(spec.version, "1.0");
            assert_eq!(spec.test_count(), 3);
            let suite = &spec.suites[0];
            assert_eq!(suite.before_each.as_deref(), Some("resetBoard"));

            let drag = &suite.tests[0];
            assert_eq!(drag.kind, GestureKind::Drag);
            assert_eq!(drag.simulation.to, Some(PointTarget::point(300.0, 40.0)));
            assert_eq!(drag.simulation.to_position, Some(Anchor::TopLeft));
            assert_eq!(drag.assert.as_ref().unwrap().kind, AssertionKind::HasClass);

            let hover = &suite.tests[1];
            assert_eq!(hover.simulation.hover_duration, Some(250));
            assert_eq!(
                hover.visualization.as_ref().unwrap().resolve(),
                Some(VisualizationConfig::default())
            );
        }

        #[test]
        fn test_numeric_version() {
            let spec = TestFileSpec::from_json(r#"{"version": 1, "suites": []}"#).unwrap();
            assert_eq!(spec.version, "1");
        }

        #[test]
        fn test_yaml_document() {
            let yaml = r##"
version: "1.2"
suites:
  - name: clicks
    tests:
      - name: press
        type: click
        simulation:
          to: "#button"
"##;
            let spec = TestFileSpec::from_yaml(yaml).unwrap();
            assert_eq!(spec.suites[0].tests[0].kind, GestureKind::Click);
        }

        #[test]
        fn test_malformed_json() {
            let err = TestFileSpec::from_json("{not json").unwrap_err();
            assert!(matches!(err, SpecError::Parse(_)));
            let gesture: GestureError = err.into();
            assert!(matches!(gesture, GestureError::SpecParse { .. }));
        }

        #[test]
        fn test_unknown_gesture_type_is_parse_error() {
            let json = r#"{"version": "1", "suites": [{"name": "s", "tests": [{"name": "t", "type": "swipe"}]}]}"#;
            assert!(matches!(
                TestFileSpec::from_json(json),
                Err(SpecError::Parse(_))
            ));
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_rejects_other_major_version() {
            let err = TestFileSpec::from_json(r#"{"version": "2.0", "suites": []}"#).unwrap_err();
            assert!(matches!(err, SpecError::UnsupportedVersion(ref v) if v == "2.0"));
        }

        #[test]
        fn test_rejects_duplicate_suites() {
            let json = r#"{"version": "1", "suites": [{"name": "a"}, {"name": "a"}]}"#;
            assert!(matches!(
                TestFileSpec::from_json(json),
                Err(SpecError::DuplicateSuite(_))
            ));
        }

        #[test]
        fn test_rejects_empty_names() {
            let json = r#"{"version": "1", "suites": [{"name": " "}]}"#;
            assert!(matches!(
                TestFileSpec::from_json(json),
                Err(SpecError::EmptySuiteName { index: 0 })
            ));
            let json = r#"{"version": "1", "suites": [{"name": "s", "tests": [{"name": "", "type": "custom"}]}]}"#;
            assert!(matches!(
                TestFileSpec::from_json(json),
                Err(SpecError::EmptyTestName { index: 0, .. })
            ));
        }

        #[test]
        fn test_drag_requires_endpoints() {
            let json = r##"{"version": "1", "suites": [{"name": "s", "tests": [
                {"name": "t", "type": "drag", "simulation": {"from": "#a"}}
            ]}]}"##;
            let err = TestFileSpec::from_json(json).unwrap_err();
            assert!(matches!(err, SpecError::MissingField { field: "to", .. }));
        }

        #[test]
        fn test_click_accepts_from_only() {
            let json = r##"{"version": "1", "suites": [{"name": "s", "tests": [
                {"name": "t", "type": "click", "simulation": {"from": "#a"}}
            ]}]}"##;
            assert!(TestFileSpec::from_json(json).is_ok());
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_from_path_by_extension() {
            let dir = tempfile::tempdir().unwrap();
            let json = dir.path().join("suite.json");
            std::fs::write(&json, DOC).unwrap();
            assert_eq!(TestFileSpec::from_path(&json).unwrap().test_count(), 3);

            let yml = dir.path().join("suite.yml");
            std::fs::write(&yml, "version: '1'\nsuites: []\n").unwrap();
            assert_eq!(TestFileSpec::from_path(&yml).unwrap().test_count(), 0);

            let txt = dir.path().join("suite.txt");
            std::fs::write(&txt, "").unwrap();
            assert!(matches!(
                TestFileSpec::from_path(&txt),
                Err(SpecError::UnsupportedExtension(_))
            ));
        }

        #[test]
        fn test_missing_file_is_io() {
            let dir = tempfile::tempdir().unwrap();
            let err = TestFileSpec::from_path(dir.path().join("nope.json")).unwrap_err();
            assert!(matches!(err, SpecError::Io(_)));
        }
    }

    #[test]
    fn test_apply_to_runner_config() {
        let spec = TestFileSpec::from_json(DOC).unwrap();
        let config = spec.apply_to(RunnerConfig::default());
        assert_eq!(config.fps, 30);
        assert_eq!(config.default_duration_ms, 800);
        assert!((config.default_curvature - 0.1).abs() < f64::EPSILON);
    }
}
