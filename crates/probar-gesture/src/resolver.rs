//! Point resolution: selector or literal coordinate + anchor → viewport point.
//!
//! The resolver also remembers which element a gesture should press on and
//! which it should release/click on. That element is the semantically
//! correct target, not whatever happens to be under the pixel: widgets that
//! expose an inner grab-handle (marked with the configured handle selector)
//! have that handle preferred over their outer container.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dom::{Dom, ElementId};
use crate::geometry::{Anchor, Point};
use crate::result::{GestureError, GestureResult};

/// Default marker for nested grab-handles inside a widget
pub const DEFAULT_HANDLE_SELECTOR: &str = "[data-gesture-handle]";

/// Where a gesture starts or ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointTarget {
    /// Literal viewport coordinate
    Literal(Point),
    /// CSS selector resolved against the DOM
    Selector(String),
}

impl PointTarget {
    /// Create a selector target
    #[must_use]
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector(selector.into())
    }

    /// Create a literal coordinate target
    #[must_use]
    pub const fn point(x: f64, y: f64) -> Self {
        Self::Literal(Point::new(x, y))
    }
}

impl fmt::Display for PointTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(point) => write!(f, "{point}"),
            Self::Selector(selector) => f.write_str(selector),
        }
    }
}

impl From<Point> for PointTarget {
    fn from(point: Point) -> Self {
        Self::Literal(point)
    }
}

impl From<&str> for PointTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

/// Which end of the gesture a resolution is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRole {
    /// Receives the press
    Start,
    /// Receives the release and click
    End,
}

/// Resolves gesture endpoints and records their event targets
#[derive(Debug, Clone)]
pub struct PointResolver {
    handle_selector: String,
    start_element: Option<ElementId>,
    end_element: Option<ElementId>,
}

impl Default for PointResolver {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLE_SELECTOR)
    }
}

impl PointResolver {
    /// Create a resolver using `handle_selector` to find nested grab-handles
    #[must_use]
    pub fn new(handle_selector: impl Into<String>) -> Self {
        Self {
            handle_selector: handle_selector.into(),
            start_element: None,
            end_element: None,
        }
    }

    /// Resolve a target to a viewport point and record its element for `role`.
    ///
    /// Literal points are returned unchanged and clear the recorded element.
    pub async fn resolve(
        &mut self,
        dom: &dyn Dom,
        target: &PointTarget,
        anchor: Anchor,
        role: TargetRole,
    ) -> GestureResult<Point> {
        let (point, element) = match target {
            PointTarget::Literal(point) => (*point, None),
            PointTarget::Selector(selector) => {
                let element = self.resolve_element(dom, selector).await?;
                let rect = dom.bounding_box(&element).await?;
                (anchor.resolve(&rect), Some(element))
            }
        };

        tracing::trace!(%target, ?role, %point, "resolved gesture point");
        match role {
            TargetRole::Start => self.start_element = element,
            TargetRole::End => self.end_element = element,
        }
        Ok(point)
    }

    async fn resolve_element(&self, dom: &dyn Dom, selector: &str) -> GestureResult<ElementId> {
        let outer = dom
            .query_selector(selector)
            .await?
            .ok_or_else(|| GestureError::element_not_found(selector))?;

        if self.handle_selector.is_empty() {
            return Ok(outer);
        }
        Ok(dom
            .query_selector_within(&outer, &self.handle_selector)
            .await?
            .unwrap_or(outer))
    }

    /// Element recorded for a role, if the target was a selector
    #[must_use]
    pub fn element_for(&self, role: TargetRole) -> Option<&ElementId> {
        match role {
            TargetRole::Start => self.start_element.as_ref(),
            TargetRole::End => self.end_element.as_ref(),
        }
    }

    /// Forget recorded elements
    pub fn clear(&mut self) {
        self.start_element = None;
        self.end_element = None;
    }
}
