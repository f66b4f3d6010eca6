//! Dom - Abstract live-DOM access trait
//!
//! Every gesture, hook, and assertion reaches the page through [`Dom`], so
//! the engine can drive an in-memory document ([`crate::MockDom`]) or a real
//! browser page (`CdpDom`, `browser` feature) without changes.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  World (shared context handed to hooks and assertions)       │
//! │    └── Arc<dyn Dom>                                          │
//! │          ├── MockDom   (in-memory element tree)              │
//! │          └── CdpDom    (chromiumoxide page, JS evaluation)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The DOM is shared across all tests with no isolation. The runner gives
//! ordering guarantees only; tests reset the state they depend on in setup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::event::SyntheticEvent;
use crate::geometry::{BoundingBox, Point};
use crate::result::GestureResult;

/// Opaque handle to an element in a [`Dom`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Create a handle from a backend-specific key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Backend-specific key
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abstract DOM access used by the resolver, synthesizer, and validator
#[async_trait]
pub trait Dom: Send + Sync {
    /// First element matching a selector
    async fn query_selector(&self, selector: &str) -> GestureResult<Option<ElementId>>;

    /// First descendant of `scope` matching a selector
    async fn query_selector_within(
        &self,
        scope: &ElementId,
        selector: &str,
    ) -> GestureResult<Option<ElementId>>;

    /// Number of elements matching a selector
    async fn count(&self, selector: &str) -> GestureResult<usize>;

    /// Element bounding rectangle in viewport coordinates
    async fn bounding_box(&self, element: &ElementId) -> GestureResult<BoundingBox>;

    /// Topmost element at a viewport point
    async fn element_from_point(&self, point: Point) -> GestureResult<Option<ElementId>>;

    /// Whether the element's class list contains `class`
    async fn has_class(&self, element: &ElementId, class: &str) -> GestureResult<bool>;

    /// Element text content (descendants included, untrimmed)
    async fn text_content(&self, element: &ElementId) -> GestureResult<String>;

    /// Dispatch a synthetic event on an element
    async fn dispatch(&self, target: &ElementId, event: &SyntheticEvent) -> GestureResult<()>;
}

/// Shared context passed into setup, teardown, and assertion callbacks
#[derive(Clone)]
pub struct World {
    dom: Arc<dyn Dom>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World").finish_non_exhaustive()
    }
}

impl World {
    /// Wrap a DOM backend
    #[must_use]
    pub fn new(dom: impl Dom + 'static) -> Self {
        Self { dom: Arc::new(dom) }
    }

    /// Wrap an already shared DOM backend
    #[must_use]
    pub fn from_arc(dom: Arc<dyn Dom>) -> Self {
        Self { dom }
    }

    /// The DOM backend
    #[must_use]
    pub fn dom(&self) -> &dyn Dom {
        self.dom.as_ref()
    }

    /// Suspend for a fixed number of milliseconds
    pub async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Whether a selector currently matches anything
    pub async fn exists(&self, selector: &str) -> GestureResult<bool> {
        Ok(self.dom.query_selector(selector).await?.is_some())
    }
}
