//! In-memory DOM for testing gestures without a browser.
//!
//! `MockDom` keeps a flat element list (insertion order is document order),
//! answers a practical subset of CSS selectors (tag, `#id`, `.class`,
//! `[attr]`, `[attr=value]`, descendant and `>` child combinators, selector
//! lists), hit-tests by bounding box, and records every dispatched event with
//! its propagation path. Listeners registered with [`MockDom::on`] mutate the
//! document in response to events, standing in for page scripts.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dom::{Dom, ElementId};
use crate::event::{PointerEventKind, SyntheticEvent};
use crate::geometry::{BoundingBox, Point};
use crate::result::{GestureError, GestureResult};

/// Callback run when a matching event reaches an element.
///
/// Listeners run while the document is locked: mutate the document through
/// the `&mut MockDocument` argument, never through the owning `MockDom`.
pub type Listener = Arc<dyn Fn(&mut MockDocument, &DispatchedEvent) + Send + Sync>;

/// Element description used to populate a [`MockDom`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Tag name (lowercase)
    pub tag: String,
    /// `id` attribute
    pub dom_id: Option<String>,
    /// Class list
    pub classes: Vec<String>,
    /// Other attributes
    pub attributes: BTreeMap<String, String>,
    /// Own text (children contribute their own text to `textContent`)
    pub text: String,
    /// Bounding rectangle
    pub rect: BoundingBox,
    /// Whether the element participates in hit-testing
    pub pointer_events: bool,
}

impl MockElement {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            dom_id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            rect: BoundingBox::default(),
            pointer_events: true,
        }
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set own text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the bounding rectangle
    #[must_use]
    pub const fn with_rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = BoundingBox::new(x, y, width, height);
        self
    }

    /// Enable or disable hit-testing (`pointer-events: none`)
    #[must_use]
    pub const fn with_pointer_events(mut self, enabled: bool) -> Self {
        self.pointer_events = enabled;
        self
    }

    /// Whether the class list contains `class`
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.dom_id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            _ => self.attributes.get(name).cloned(),
        }
    }
}

/// An event as delivered by the mock document
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    /// Element the event was dispatched on
    pub target: ElementId,
    /// The event itself
    pub event: SyntheticEvent,
    /// Elements the event reached, target first
    pub path: Vec<ElementId>,
}

struct Node {
    key: ElementId,
    parent: Option<ElementId>,
    element: MockElement,
    attached: bool,
}

/// Mutable document state behind a [`MockDom`]
#[derive(Default)]
pub struct MockDocument {
    nodes: Vec<Node>,
    events: Vec<DispatchedEvent>,
    listeners: Vec<(ElementId, PointerEventKind, Listener)>,
    next_key: u64,
}

impl fmt::Debug for MockDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDocument")
            .field("nodes", &self.nodes.len())
            .field("events", &self.events.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MockDocument {
    fn insert(&mut self, parent: Option<ElementId>, element: MockElement) -> ElementId {
        self.next_key += 1;
        let key = ElementId::new(format!("mock-{}", self.next_key));
        self.nodes.push(Node {
            key: key.clone(),
            parent,
            element,
            attached: true,
        });
        key
    }

    fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.attached && &node.key == id)
    }

    fn node(&self, id: &ElementId) -> GestureResult<&Node> {
        self.index_of(id)
            .map(|idx| &self.nodes[idx])
            .ok_or_else(|| GestureError::dom(format!("element {id} is not attached")))
    }

    fn node_mut(&mut self, id: &ElementId) -> GestureResult<&mut Node> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| GestureError::dom(format!("element {id} is not attached")))?;
        Ok(&mut self.nodes[idx])
    }

    /// Element data for a handle
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&MockElement> {
        self.node(id).ok().map(|node| &node.element)
    }

    /// Add a class to an element
    pub fn add_class(&mut self, id: &ElementId, class: &str) -> GestureResult<()> {
        let element = &mut self.node_mut(id)?.element;
        if !element.has_class(class) {
            element.classes.push(class.to_string());
        }
        Ok(())
    }

    /// Remove a class from an element
    pub fn remove_class(&mut self, id: &ElementId, class: &str) -> GestureResult<()> {
        self.node_mut(id)?.element.classes.retain(|c| c != class);
        Ok(())
    }

    /// Replace an element's own text
    pub fn set_text(&mut self, id: &ElementId, text: &str) -> GestureResult<()> {
        self.node_mut(id)?.element.text = text.to_string();
        Ok(())
    }

    /// Move or resize an element
    pub fn set_rect(&mut self, id: &ElementId, rect: BoundingBox) -> GestureResult<()> {
        self.node_mut(id)?.element.rect = rect;
        Ok(())
    }

    /// Append a new child element
    pub fn append_child(
        &mut self,
        parent: &ElementId,
        element: MockElement,
    ) -> GestureResult<ElementId> {
        let _ = self.node(parent)?;
        Ok(self.insert(Some(parent.clone()), element))
    }

    /// Detach an element and all of its descendants
    pub fn remove(&mut self, id: &ElementId) -> GestureResult<()> {
        let _ = self.node(id)?;
        let doomed: Vec<ElementId> = self
            .nodes
            .iter()
            .filter(|node| node.attached && (&node.key == id || self.is_descendant_of(&node.key, id)))
            .map(|node| node.key.clone())
            .collect();
        for node in &mut self.nodes {
            if doomed.contains(&node.key) {
                node.attached = false;
            }
        }
        Ok(())
    }

    fn parent_of(&self, id: &ElementId) -> Option<ElementId> {
        self.nodes
            .iter()
            .find(|node| &node.key == id)
            .and_then(|node| node.parent.clone())
    }

    fn is_descendant_of(&self, id: &ElementId, ancestor: &ElementId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if &parent == ancestor {
                return true;
            }
            current = self.parent_of(&parent);
        }
        false
    }

    fn ancestors(&self, id: &ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            current = self.parent_of(&parent);
            chain.push(parent);
        }
        chain
    }

    fn select_all(&self, selector: &str, scope: Option<&ElementId>) -> GestureResult<Vec<ElementId>> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .nodes
            .iter()
            .filter(|node| node.attached)
            .filter(|node| scope.map_or(true, |s| self.is_descendant_of(&node.key, s)))
            .filter(|node| list.iter().any(|complex| self.matches_complex(&node.key, complex)))
            .map(|node| node.key.clone())
            .collect())
    }

    fn matches_complex(&self, id: &ElementId, complex: &[(Combinator, Compound)]) -> bool {
        let Some(((_, last), rest)) = complex.split_last() else {
            return false;
        };
        let Some(element) = self.element(id) else {
            return false;
        };
        if !last.matches(element) {
            return false;
        }
        self.matches_ancestors(id, complex, rest.len())
    }

    // `upto` is the number of compounds left to match to the left of the
    // one already matched at `id`; the combinator of that matched compound
    // decides how far up to look.
    fn matches_ancestors(&self, id: &ElementId, complex: &[(Combinator, Compound)], upto: usize) -> bool {
        if upto == 0 {
            return true;
        }
        let combinator = complex[upto].0;
        let wanted = &complex[upto - 1].1;
        match combinator {
            Combinator::Child => self.parent_of(id).is_some_and(|parent| {
                self.element(&parent).is_some_and(|el| wanted.matches(el))
                    && self.matches_ancestors(&parent, complex, upto - 1)
            }),
            Combinator::Descendant => self.ancestors(id).iter().any(|ancestor| {
                self.element(ancestor).is_some_and(|el| wanted.matches(el))
                    && self.matches_ancestors(ancestor, complex, upto - 1)
            }),
        }
    }

    fn text_of(&self, id: &ElementId) -> String {
        let mut text = self
            .element(id)
            .map(|el| el.text.clone())
            .unwrap_or_default();
        for node in self.nodes.iter().filter(|n| n.attached) {
            if node.parent.as_ref() == Some(id) {
                text.push_str(&self.text_of(&node.key));
            }
        }
        text
    }
}

/// Shared in-memory DOM; clones share one document
#[derive(Clone, Default)]
pub struct MockDom {
    doc: Arc<Mutex<MockDocument>>,
}

impl fmt::Debug for MockDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MockDom").field(&*self.lock()).finish()
    }
}

impl MockDom {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockDocument> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a top-level element
    pub fn insert(&self, element: MockElement) -> ElementId {
        self.lock().insert(None, element)
    }

    /// Insert an element as a child of `parent`
    pub fn insert_child(
        &self,
        parent: &ElementId,
        element: MockElement,
    ) -> GestureResult<ElementId> {
        self.lock().append_child(parent, element)
    }

    /// Register a listener for events of `kind` reaching `element`
    pub fn on<F>(&self, element: &ElementId, kind: PointerEventKind, listener: F)
    where
        F: Fn(&mut MockDocument, &DispatchedEvent) + Send + Sync + 'static,
    {
        self.lock()
            .listeners
            .push((element.clone(), kind, Arc::new(listener)));
    }

    /// Run a closure against the document
    pub fn with_document<R>(&self, f: impl FnOnce(&mut MockDocument) -> R) -> R {
        f(&mut *self.lock())
    }

    /// Snapshot of an element
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<MockElement> {
        self.lock().element(id).cloned()
    }

    /// Add a class to an element
    pub fn add_class(&self, id: &ElementId, class: &str) -> GestureResult<()> {
        self.lock().add_class(id, class)
    }

    /// Remove a class from an element
    pub fn remove_class(&self, id: &ElementId, class: &str) -> GestureResult<()> {
        self.lock().remove_class(id, class)
    }

    /// Replace an element's own text
    pub fn set_text(&self, id: &ElementId, text: &str) -> GestureResult<()> {
        self.lock().set_text(id, text)
    }

    /// Detach an element and its descendants
    pub fn remove(&self, id: &ElementId) -> GestureResult<()> {
        self.lock().remove(id)
    }

    /// All dispatched events, in order
    #[must_use]
    pub fn events(&self) -> Vec<DispatchedEvent> {
        self.lock().events.clone()
    }

    /// Dispatched event kinds, in order
    #[must_use]
    pub fn event_kinds(&self) -> Vec<PointerEventKind> {
        self.lock().events.iter().map(|e| e.event.kind).collect()
    }

    /// Dispatched events of one kind
    #[must_use]
    pub fn events_of(&self, kind: PointerEventKind) -> Vec<DispatchedEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.event.kind == kind)
            .cloned()
            .collect()
    }

    /// Forget recorded events
    pub fn clear_events(&self) {
        self.lock().events.clear();
    }
}

#[async_trait]
impl Dom for MockDom {
    async fn query_selector(&self, selector: &str) -> GestureResult<Option<ElementId>> {
        Ok(self.lock().select_all(selector, None)?.into_iter().next())
    }

    async fn query_selector_within(
        &self,
        scope: &ElementId,
        selector: &str,
    ) -> GestureResult<Option<ElementId>> {
        let doc = self.lock();
        let _ = doc.node(scope)?;
        Ok(doc.select_all(selector, Some(scope))?.into_iter().next())
    }

    async fn count(&self, selector: &str) -> GestureResult<usize> {
        Ok(self.lock().select_all(selector, None)?.len())
    }

    async fn bounding_box(&self, element: &ElementId) -> GestureResult<BoundingBox> {
        Ok(self.lock().node(element)?.element.rect)
    }

    async fn element_from_point(&self, point: Point) -> GestureResult<Option<ElementId>> {
        let doc = self.lock();
        Ok(doc
            .nodes
            .iter()
            .rev()
            .filter(|node| node.attached && node.element.pointer_events)
            .find(|node| node.element.rect.contains(point))
            .map(|node| node.key.clone()))
    }

    async fn has_class(&self, element: &ElementId, class: &str) -> GestureResult<bool> {
        Ok(self.lock().node(element)?.element.has_class(class))
    }

    async fn text_content(&self, element: &ElementId) -> GestureResult<String> {
        let doc = self.lock();
        let _ = doc.node(element)?;
        Ok(doc.text_of(element))
    }

    async fn dispatch(&self, target: &ElementId, event: &SyntheticEvent) -> GestureResult<()> {
        let mut doc = self.lock();
        let _ = doc.node(target)?;

        let mut path = vec![target.clone()];
        if event.bubbles {
            path.extend(doc.ancestors(target));
        }
        let dispatched = DispatchedEvent {
            target: target.clone(),
            event: *event,
            path,
        };

        let listeners: Vec<Listener> = dispatched
            .path
            .iter()
            .flat_map(|id| {
                doc.listeners
                    .iter()
                    .filter(move |(el, kind, _)| el == id && *kind == event.kind)
                    .map(|(_, _, listener)| Arc::clone(listener))
            })
            .collect();

        doc.events.push(dispatched.clone());
        for listener in listeners {
            listener(&mut *doc, &dispatched);
        }
        Ok(())
    }
}

// =============================================================================
// SELECTOR MATCHING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, element: &MockElement) -> bool {
        self.tag.as_ref().map_or(true, |tag| &element.tag == tag)
            && self
                .id
                .as_ref()
                .map_or(true, |id| element.dom_id.as_ref() == Some(id))
            && self.classes.iter().all(|class| element.has_class(class))
            && self
                .attributes
                .iter()
                .all(|(name, value)| match (element.attribute(name), value) {
                    (Some(_), None) => true,
                    (Some(actual), Some(expected)) => &actual == expected,
                    (None, _) => false,
                })
    }
}

fn parse_selector_list(selector: &str) -> GestureResult<Vec<Vec<(Combinator, Compound)>>> {
    let list: Vec<_> = selector
        .split(',')
        .map(parse_complex)
        .collect::<GestureResult<_>>()?;
    if list.is_empty() {
        return Err(unsupported(selector));
    }
    Ok(list)
}

fn parse_complex(selector: &str) -> GestureResult<Vec<(Combinator, Compound)>> {
    let spaced = selector.replace('>', " > ");
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    for token in spaced.split_whitespace() {
        if token == ">" {
            if parts.is_empty() {
                return Err(unsupported(selector));
            }
            combinator = Combinator::Child;
            continue;
        }
        parts.push((combinator, parse_compound(token)?));
        combinator = Combinator::Descendant;
    }
    if parts.is_empty() || combinator == Combinator::Child {
        return Err(unsupported(selector));
    }
    Ok(parts)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(token: &str) -> GestureResult<Compound> {
    let chars: Vec<char> = token.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && is_ident_char(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    if chars.first() == Some(&'*') {
        i = 1;
    } else if chars.first().copied().is_some_and(is_ident_char) {
        compound.tag = Some(read_ident(&mut i).to_ascii_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let id = read_ident(&mut i);
                if id.is_empty() {
                    return Err(unsupported(token));
                }
                compound.id = Some(id);
            }
            '.' => {
                i += 1;
                let class = read_ident(&mut i);
                if class.is_empty() {
                    return Err(unsupported(token));
                }
                compound.classes.push(class);
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or_else(|| unsupported(token))?;
                let inner: String = chars[i + 1..i + close].iter().collect();
                i += close + 1;
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        (name.trim().to_string(), Some(value.to_string()))
                    }
                    None => (inner.trim().to_string(), None),
                };
                if name.is_empty() || !name.chars().all(is_ident_char) {
                    return Err(unsupported(token));
                }
                compound.attributes.push((name, value));
            }
            _ => return Err(unsupported(token)),
        }
    }
    Ok(compound)
}

fn unsupported(selector: &str) -> GestureError {
    GestureError::dom(format!("unsupported selector '{selector}'"))
}
