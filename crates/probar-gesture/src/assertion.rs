//! Declarative assertions evaluated against the current DOM.
//!
//! A malformed rule (unknown kind, missing selector, unusable `expected`)
//! evaluates to `false` instead of raising, so it fails its test cleanly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::World;
use crate::registry::CallbackRegistry;

/// Closed set of assertion kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionKind {
    /// Selector matches at least one element
    SelectorExists,
    /// Selector matches nothing
    #[serde(alias = "not-exists")]
    SelectorNotExists,
    /// First match has the class named by `expected`
    HasClass,
    /// First match lacks the class named by `expected`
    NotHasClass,
    /// Trimmed text of the first match equals `expected`
    TextEquals,
    /// Trimmed text of the first match contains `expected`
    TextContains,
    /// Number of matches equals `expected`
    CountEquals,
    /// Number of matches is greater than `expected`
    CountGreaterThan,
    /// Registered predicate named by `custom_function`
    Custom,
    /// Any kind not listed above
    #[serde(other)]
    Unknown,
}

impl AssertionKind {
    /// Kind name as written in test documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelectorExists => "selector-exists",
            Self::SelectorNotExists => "selector-not-exists",
            Self::HasClass => "has-class",
            Self::NotHasClass => "not-has-class",
            Self::TextEquals => "text-equals",
            Self::TextContains => "text-contains",
            Self::CountEquals => "count-equals",
            Self::CountGreaterThan => "count-greater-than",
            Self::Custom => "custom",
            Self::Unknown => "unknown",
        }
    }
}

/// A declarative assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRule {
    /// Assertion kind
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    /// Selector the kind reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Expected class, text, or count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Registered predicate name for `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_function: Option<String>,
}

impl AssertionRule {
    /// Create a rule of a kind with no fields set
    #[must_use]
    pub const fn new(kind: AssertionKind) -> Self {
        Self {
            kind,
            selector: None,
            expected: None,
            custom_function: None,
        }
    }

    /// `selector-exists`
    #[must_use]
    pub fn selector_exists(selector: impl Into<String>) -> Self {
        Self::new(AssertionKind::SelectorExists).with_selector(selector)
    }

    /// `selector-not-exists`
    #[must_use]
    pub fn selector_not_exists(selector: impl Into<String>) -> Self {
        Self::new(AssertionKind::SelectorNotExists).with_selector(selector)
    }

    /// `has-class`
    #[must_use]
    pub fn has_class(selector: impl Into<String>, class: &str) -> Self {
        Self::new(AssertionKind::HasClass)
            .with_selector(selector)
            .with_expected(class)
    }

    /// `text-equals`
    #[must_use]
    pub fn text_equals(selector: impl Into<String>, text: &str) -> Self {
        Self::new(AssertionKind::TextEquals)
            .with_selector(selector)
            .with_expected(text)
    }

    /// `count-equals`
    #[must_use]
    pub fn count_equals(selector: impl Into<String>, count: u64) -> Self {
        Self::new(AssertionKind::CountEquals)
            .with_selector(selector)
            .with_expected(count)
    }

    /// `custom`, delegating to a registered predicate
    #[must_use]
    pub fn custom(function: impl Into<String>) -> Self {
        Self {
            custom_function: Some(function.into()),
            ..Self::new(AssertionKind::Custom)
        }
    }

    /// Set the selector
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Set the expected value
    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    fn expected_text(&self) -> Option<String> {
        match self.expected.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    // Any finite number: documents often carry `3.0` or `-1`
    fn expected_count(&self) -> Option<f64> {
        let count = match self.expected.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }?;
        count.is_finite().then_some(count)
    }
}

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    fn from_bool(passed: bool, message: impl FnOnce() -> String) -> Self {
        if passed {
            Self::pass()
        } else {
            Self::fail(message())
        }
    }
}

/// Evaluates [`AssertionRule`]s
#[derive(Debug, Clone, Default)]
pub struct AssertionValidator {
    registry: CallbackRegistry,
}

impl AssertionValidator {
    /// Create a validator resolving `custom` rules through `registry`
    #[must_use]
    pub fn new(registry: CallbackRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate a rule to a plain boolean
    pub async fn validate(&self, world: &World, rule: &AssertionRule) -> bool {
        self.check(world, rule).await.passed
    }

    /// Evaluate a rule, explaining any failure
    pub async fn check(&self, world: &World, rule: &AssertionRule) -> AssertionResult {
        let result = self.evaluate(world, rule).await;
        if !result.passed {
            tracing::debug!(kind = rule.kind.as_str(), message = %result.message, "assertion failed");
        }
        result
    }

    async fn evaluate(&self, world: &World, rule: &AssertionRule) -> AssertionResult {
        if rule.kind == AssertionKind::Custom {
            return self.evaluate_custom(world, rule).await;
        }
        if rule.kind == AssertionKind::Unknown {
            return AssertionResult::fail("unknown assertion kind");
        }
        let Some(selector) = rule.selector.as_deref() else {
            return AssertionResult::fail(format!("{} requires a selector", rule.kind.as_str()));
        };

        let dom = world.dom();
        let outcome = match rule.kind {
            AssertionKind::SelectorExists => dom.query_selector(selector).await.map(|found| {
                AssertionResult::from_bool(found.is_some(), || format!("no element matches {selector}"))
            }),
            AssertionKind::SelectorNotExists => dom.query_selector(selector).await.map(|found| {
                AssertionResult::from_bool(found.is_none(), || format!("{selector} is present"))
            }),
            AssertionKind::HasClass | AssertionKind::NotHasClass => {
                let Some(class) = rule.expected_text() else {
                    return AssertionResult::fail("expected class name missing");
                };
                let want = rule.kind == AssertionKind::HasClass;
                match dom.query_selector(selector).await {
                    Ok(Some(element)) => dom.has_class(&element, &class).await.map(|has| {
                        AssertionResult::from_bool(has == want, || {
                            format!("{selector} has_class({class}) = {has}")
                        })
                    }),
                    Ok(None) => Ok(AssertionResult::fail(format!("no element matches {selector}"))),
                    Err(e) => Err(e),
                }
            }
            AssertionKind::TextEquals | AssertionKind::TextContains => {
                let Some(expected) = rule.expected_text() else {
                    return AssertionResult::fail("expected text missing");
                };
                match dom.query_selector(selector).await {
                    Ok(Some(element)) => dom.text_content(&element).await.map(|text| {
                        let actual = text.trim();
                        let passed = if rule.kind == AssertionKind::TextEquals {
                            actual == expected
                        } else {
                            actual.contains(&expected)
                        };
                        AssertionResult::from_bool(passed, || {
                            format!("expected '{expected}', got '{actual}'")
                        })
                    }),
                    Ok(None) => Ok(AssertionResult::fail(format!("no element matches {selector}"))),
                    Err(e) => Err(e),
                }
            }
            AssertionKind::CountEquals | AssertionKind::CountGreaterThan => {
                let Some(expected) = rule.expected_count() else {
                    return AssertionResult::fail("expected count missing");
                };
                dom.count(selector).await.map(|count| {
                    let actual = count as f64;
                    let passed = if rule.kind == AssertionKind::CountEquals {
                        actual == expected
                    } else {
                        actual > expected
                    };
                    AssertionResult::from_bool(passed, || {
                        format!("{selector}: count {count} vs expected {expected}")
                    })
                })
            }
            AssertionKind::Custom | AssertionKind::Unknown => {
                Ok(AssertionResult::fail("unsupported assertion kind"))
            }
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!(kind = rule.kind.as_str(), error = %e, "assertion could not be evaluated");
            AssertionResult::fail(e.to_string())
        })
    }

    async fn evaluate_custom(&self, world: &World, rule: &AssertionRule) -> AssertionResult {
        let Some(name) = rule.custom_function.as_deref() else {
            return AssertionResult::fail("custom assertion requires customFunction");
        };
        let predicate = match self.registry.require_predicate(name) {
            Ok(predicate) => predicate,
            Err(e) => return AssertionResult::fail(e.to_string()),
        };
        match predicate(world.clone(), rule.clone()).await {
            Ok(passed) => AssertionResult::from_bool(passed, || format!("{name} returned false")),
            Err(e) => {
                tracing::warn!(predicate = name, error = %e, "custom assertion raised");
                AssertionResult::fail(e.to_string())
            }
        }
    }
}
