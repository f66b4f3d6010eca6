//! Runner Configuration
//!
//! Global playback and default-value settings shared by every test the
//! runner executes. Values can come from code (builder), a JSON or YAML
//! document, and `PROBAR_GESTURE_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

use crate::geometry::Point;
use crate::resolver::DEFAULT_HANDLE_SELECTOR;
use crate::result::{GestureError, GestureResult};

/// Default playback frame rate
pub const DEFAULT_FPS: u32 = 60;

/// Default drag duration when neither the test nor the document sets one
pub const DEFAULT_DURATION_MS: u64 = 1000;

/// Default curvature when neither the test nor the document sets one
pub const DEFAULT_CURVATURE: f64 = 0.3;

/// Default duration of a click gesture
pub const DEFAULT_CLICK_DURATION_MS: u64 = 100;

/// Largest accepted slow-motion factor
pub const MAX_SLOW_MOTION: f64 = 100.0;

/// Env var overriding `fps`
pub const ENV_FPS: &str = "PROBAR_GESTURE_FPS";

/// Env var overriding `slow_motion`
pub const ENV_SLOW_MOTION: &str = "PROBAR_GESTURE_SLOW_MOTION";

/// Env var overriding `visualize`
pub const ENV_VISUALIZE: &str = "PROBAR_GESTURE_VISUALIZE";

/// Configuration for the gesture test runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Playback frame rate
    pub fps: u32,
    /// Frame delay multiplier (2.0 plays twice as slow)
    pub slow_motion: f64,
    /// Visualize every gesture, not only tests with a visualization config
    pub visualize: bool,
    /// Selector marking nested grab-handles (empty disables the lookup)
    pub handle_selector: String,
    /// Added to client coordinates to produce screen coordinates
    pub screen_offset: Point,
    /// Duration of click gestures
    pub click_duration_ms: u64,
    /// How long a hover rests on its target
    pub hover_hold_ms: u64,
    /// Duration of the hover approach segment
    pub hover_approach_ms: u64,
    /// Duration of the hover departure segment
    pub hover_departure_ms: u64,
    /// Drag duration used when a test sets none
    pub default_duration_ms: u64,
    /// Curvature used when a test sets none
    pub default_curvature: f64,
    /// Preempt tests that exceed their `timeout`
    pub enforce_timeouts: bool,
    /// Poll interval for completion waits
    pub poll_interval_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            slow_motion: 1.0,
            visualize: false,
            handle_selector: DEFAULT_HANDLE_SELECTOR.to_string(),
            screen_offset: Point::default(),
            click_duration_ms: DEFAULT_CLICK_DURATION_MS,
            hover_hold_ms: 500,
            hover_approach_ms: 300,
            hover_departure_ms: 300,
            default_duration_ms: DEFAULT_DURATION_MS,
            default_curvature: DEFAULT_CURVATURE,
            enforce_timeouts: false,
            poll_interval_ms: 100,
        }
    }
}

impl RunnerConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }

    /// Parse from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range
    pub fn from_json(json: &str) -> GestureResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a value is out of range
    pub fn from_yaml(yaml: &str) -> GestureResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| GestureError::invalid_config(format!("YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<FsPath>) -> GestureResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(GestureError::invalid_config(format!(
                "unsupported config extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Apply `PROBAR_GESTURE_*` overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable does not parse
    pub fn with_env_overrides(self) -> GestureResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a present value does not parse
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> GestureResult<Self> {
        if let Some(raw) = lookup(ENV_FPS) {
            self.fps = raw
                .trim()
                .parse()
                .map_err(|_| GestureError::invalid_config(format!("{ENV_FPS}={raw}")))?;
        }
        if let Some(raw) = lookup(ENV_SLOW_MOTION) {
            self.slow_motion = raw
                .trim()
                .parse()
                .map_err(|_| GestureError::invalid_config(format!("{ENV_SLOW_MOTION}={raw}")))?;
        }
        if let Some(raw) = lookup(ENV_VISUALIZE) {
            self.visualize = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(GestureError::invalid_config(format!(
                        "{ENV_VISUALIZE}={raw}"
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns an error for a slow-motion factor outside
    /// `(0, MAX_SLOW_MOTION]` or a non-finite curvature
    pub fn validate(&self) -> GestureResult<()> {
        if !(self.slow_motion > 0.0 && self.slow_motion <= MAX_SLOW_MOTION) {
            return Err(GestureError::invalid_config(format!(
                "slowMotion must be in (0, {MAX_SLOW_MOTION}], got {}",
                self.slow_motion
            )));
        }
        if !self.default_curvature.is_finite() {
            return Err(GestureError::invalid_config("defaultCurvature must be finite"));
        }
        Ok(())
    }
}

/// Builder for `RunnerConfig`
#[derive(Debug, Clone, Default)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    /// Set playback frame rate
    #[must_use]
    pub fn fps(mut self, fps: u32) -> Self {
        self.config.fps = fps;
        self
    }

    /// Set slow-motion factor
    #[must_use]
    pub fn slow_motion(mut self, factor: f64) -> Self {
        self.config.slow_motion = factor;
        self
    }

    /// Enable/disable visualization of every gesture
    #[must_use]
    pub fn visualize(mut self, enabled: bool) -> Self {
        self.config.visualize = enabled;
        self
    }

    /// Set the nested grab-handle selector
    #[must_use]
    pub fn handle_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.handle_selector = selector.into();
        self
    }

    /// Set the client-to-screen offset
    #[must_use]
    pub fn screen_offset(mut self, offset: Point) -> Self {
        self.config.screen_offset = offset;
        self
    }

    /// Set click gesture duration
    #[must_use]
    pub fn click_duration_ms(mut self, ms: u64) -> Self {
        self.config.click_duration_ms = ms;
        self
    }

    /// Set hover hold, approach and departure durations
    #[must_use]
    pub fn hover_timing(mut self, hold_ms: u64, approach_ms: u64, departure_ms: u64) -> Self {
        self.config.hover_hold_ms = hold_ms;
        self.config.hover_approach_ms = approach_ms;
        self.config.hover_departure_ms = departure_ms;
        self
    }

    /// Set fallback drag duration
    #[must_use]
    pub fn default_duration_ms(mut self, ms: u64) -> Self {
        self.config.default_duration_ms = ms;
        self
    }

    /// Set fallback curvature
    #[must_use]
    pub fn default_curvature(mut self, curvature: f64) -> Self {
        self.config.default_curvature = curvature;
        self
    }

    /// Enable/disable per-test timeout enforcement
    #[must_use]
    pub fn enforce_timeouts(mut self, enabled: bool) -> Self {
        self.config.enforce_timeouts = enabled;
        self
    }

    /// Set completion poll interval
    #[must_use]
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = RunnerConfig::default();
            assert_eq!(config.fps, 60);
            assert!((config.slow_motion - 1.0).abs() < f64::EPSILON);
            assert!(!config.visualize);
            assert_eq!(config.handle_selector, "[data-gesture-handle]");
            assert_eq!(config.click_duration_ms, 100);
            assert_eq!(config.default_duration_ms, 1000);
            assert!((config.default_curvature - 0.3).abs() < f64::EPSILON);
            assert!(!config.enforce_timeouts);
        }

        #[test]
        fn test_builder() {
            let config = RunnerConfig::builder()
                .fps(30)
                .slow_motion(2.0)
                .visualize(true)
                .hover_timing(100, 50, 25)
                .screen_offset(Point::new(5.0, 5.0))
                .build();
            assert_eq!(config.fps, 30);
            assert!(config.visualize);
            assert_eq!(config.hover_hold_ms, 100);
            assert_eq!(config.hover_departure_ms, 25);
            assert_eq!(config.screen_offset, Point::new(5.0, 5.0));
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_partial_json_keeps_defaults() {
            let config = RunnerConfig::from_json(r#"{"fps": 120}"#).unwrap();
            assert_eq!(config.fps, 120);
            assert_eq!(config.click_duration_ms, 100);
        }

        #[test]
        fn test_yaml() {
            let config = RunnerConfig::from_yaml("fps: 24\nslowMotion: 3.0\n").unwrap();
            assert_eq!(config.fps, 24);
            assert!((config.slow_motion - 3.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_rejects_zero_slow_motion() {
            let err = RunnerConfig::from_json(r#"{"slowMotion": 0.0}"#).unwrap_err();
            assert!(matches!(err, GestureError::InvalidConfig { .. }));
        }

        #[test]
        fn test_slow_motion_upper_bound() {
            let err = RunnerConfig::from_json(r#"{"slowMotion": 1e30}"#).unwrap_err();
            assert!(matches!(err, GestureError::InvalidConfig { .. }));
            let config = RunnerConfig::from_json(r#"{"slowMotion": 100.0}"#).unwrap();
            assert!((config.slow_motion - MAX_SLOW_MOTION).abs() < f64::EPSILON);
        }

        #[test]
        fn test_camel_case_keys() {
            let config = RunnerConfig::from_json(
                r#"{"clickDurationMs": 50, "hoverHoldMs": 20, "enforceTimeouts": true}"#,
            )
            .unwrap();
            assert_eq!(config.click_duration_ms, 50);
            assert_eq!(config.hover_hold_ms, 20);
            assert!(config.enforce_timeouts);

            let json = serde_json::to_value(RunnerConfig::default()).unwrap();
            assert_eq!(json["slowMotion"], 1.0);
            assert_eq!(json["handleSelector"], "[data-gesture-handle]");
            assert!(json.get("slow_motion").is_none());
        }

        #[test]
        fn test_from_file_by_extension() {
            let dir = tempfile::tempdir().unwrap();
            let yaml = dir.path().join("runner.yml");
            std::fs::write(&yaml, "visualize: true\n").unwrap();
            assert!(RunnerConfig::from_file(&yaml).unwrap().visualize);

            let txt = dir.path().join("runner.txt");
            std::fs::write(&txt, "").unwrap();
            assert!(RunnerConfig::from_file(&txt).is_err());
        }
    }

    mod override_tests {
        use super::*;

        fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn test_overrides_applied() {
            let config = RunnerConfig::default()
                .with_overrides(lookup(&[
                    (ENV_FPS, "30"),
                    (ENV_SLOW_MOTION, "4"),
                    (ENV_VISUALIZE, "yes"),
                ]))
                .unwrap();
            assert_eq!(config.fps, 30);
            assert!((config.slow_motion - 4.0).abs() < f64::EPSILON);
            assert!(config.visualize);
        }

        #[test]
        fn test_absent_overrides_change_nothing() {
            let config = RunnerConfig::default().with_overrides(lookup(&[])).unwrap();
            assert_eq!(config, RunnerConfig::default());
        }

        #[test]
        fn test_bad_override_is_error() {
            let err = RunnerConfig::default()
                .with_overrides(lookup(&[(ENV_FPS, "fast")]))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_FPS));
        }
    }
}
