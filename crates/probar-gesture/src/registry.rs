//! Named callback registry.
//!
//! Declarative test documents refer to setup/teardown hooks and custom
//! assertion predicates by name. The host registers the callbacks here
//! before loading or running test documents; the converter binds names either at
//! conversion time or lazily at execution time (see
//! [`crate::spec::BindingMode`]).

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assertion::AssertionRule;
use crate::dom::World;
use crate::result::{GestureError, GestureResult};

/// Async lifecycle callback (setup, teardown, suite hooks)
pub type Hook = Arc<dyn Fn(World) -> BoxFuture<'static, GestureResult<()>> + Send + Sync>;

/// Async assertion callback attached to a test
pub type AssertFn = Arc<dyn Fn(World) -> BoxFuture<'static, GestureResult<bool>> + Send + Sync>;

/// Async custom assertion predicate, receives the rule that named it
pub type Predicate =
    Arc<dyn Fn(World, AssertionRule) -> BoxFuture<'static, GestureResult<bool>> + Send + Sync>;

/// Wrap an async closure as a [`Hook`]
pub fn hook<F, Fut>(f: F) -> Hook
where
    F: Fn(World) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GestureResult<()>> + Send + 'static,
{
    Arc::new(move |world| Box::pin(f(world)))
}

/// Wrap an async closure as an [`AssertFn`]
pub fn assertion<F, Fut>(f: F) -> AssertFn
where
    F: Fn(World) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GestureResult<bool>> + Send + 'static,
{
    Arc::new(move |world| Box::pin(f(world)))
}

/// Wrap an async closure as a [`Predicate`]
pub fn predicate<F, Fut>(f: F) -> Predicate
where
    F: Fn(World, AssertionRule) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GestureResult<bool>> + Send + 'static,
{
    Arc::new(move |world, rule| Box::pin(f(world, rule)))
}

#[derive(Default)]
struct Callbacks {
    hooks: HashMap<String, Hook>,
    predicates: HashMap<String, Predicate>,
}

/// Shared name → callback mapping
///
/// Cloning is cheap and clones share the same table, so callbacks
/// registered after a document was converted are still visible to deferred
/// bindings.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    inner: Arc<RwLock<Callbacks>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("hooks", &self.hook_names())
            .field("predicates", &self.predicate_names())
            .finish()
    }
}

impl CallbackRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Callbacks> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Callbacks> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register (or replace) a hook
    pub fn register_hook(&self, name: impl Into<String>, hook: Hook) {
        let name = name.into();
        tracing::trace!(%name, "registered hook");
        self.write().hooks.insert(name, hook);
    }

    /// Register (or replace) a predicate
    pub fn register_predicate(&self, name: impl Into<String>, predicate: Predicate) {
        let name = name.into();
        tracing::trace!(%name, "registered predicate");
        self.write().predicates.insert(name, predicate);
    }

    /// Look up a hook
    #[must_use]
    pub fn hook(&self, name: &str) -> Option<Hook> {
        self.read().hooks.get(name).cloned()
    }

    /// Look up a predicate
    #[must_use]
    pub fn predicate(&self, name: &str) -> Option<Predicate> {
        self.read().predicates.get(name).cloned()
    }

    /// Look up a hook, failing when it is not registered
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedCallback` if `name` is unknown
    pub fn require_hook(&self, name: &str) -> GestureResult<Hook> {
        self.hook(name).ok_or_else(|| GestureError::UnresolvedCallback {
            name: name.to_string(),
            kind: "hook",
        })
    }

    /// Look up a predicate, failing when it is not registered
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedCallback` if `name` is unknown
    pub fn require_predicate(&self, name: &str) -> GestureResult<Predicate> {
        self.predicate(name)
            .ok_or_else(|| GestureError::UnresolvedCallback {
                name: name.to_string(),
                kind: "predicate",
            })
    }

    /// Whether a hook is registered under `name`
    #[must_use]
    pub fn contains_hook(&self, name: &str) -> bool {
        self.read().hooks.contains_key(name)
    }

    /// Whether a predicate is registered under `name`
    #[must_use]
    pub fn contains_predicate(&self, name: &str) -> bool {
        self.read().predicates.contains_key(name)
    }

    /// Registered hook names, sorted
    #[must_use]
    pub fn hook_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read().hooks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered predicate names, sorted
    #[must_use]
    pub fn predicate_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read().predicates.keys().cloned().collect();
        names.sort();
        names
    }
}
