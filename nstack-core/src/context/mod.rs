//! Context Chain Engine
//!
//! A [`Context`] is one node in a singly linked chain of scopes. Every node
//! owns a registration table and holds its parent by `Arc`, so anything that
//! keeps a node alive keeps its whole ancestor chain alive with it.
//!
//! ## Architecture
//!
//! ```text
//!   thread A ambient ──► ┌──────────┐ parent ┌──────────┐ parent ┌──────────┐
//!                        │ child C  │───────►│  scope R │───────►│   root   │
//!                        │ L2       │        │ L1       │        │          │
//!                        └──────────┘        └──────────┘        └──────────┘
//!                                                 ▲
//!   Continuation (captured in R) ─────────────────┘
//!   run on thread B ──► fresh child of R becomes B's ambient
//! ```
//!
//! Resolution starts at the ambient node and walks `parent` links outward;
//! the first binding found wins.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use nstack_core::Context;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> &'static str;
//! }
//!
//! struct Formal;
//! impl Greeter for Formal {
//!     fn greet(&self) -> &'static str { "good day" }
//! }
//!
//! struct Casual;
//! impl Greeter for Casual {
//!     fn greet(&self) -> &'static str { "hey" }
//! }
//!
//! Context::create(|| -> nstack_core::Result<()> {
//!     Context::register::<dyn Greeter>(Arc::new(Formal))?;
//!
//!     Context::create(|| -> nstack_core::Result<()> {
//!         assert_eq!(Context::resolve::<dyn Greeter>()?.greet(), "good day");
//!         Context::register::<dyn Greeter>(Arc::new(Casual))?;
//!         assert_eq!(Context::resolve::<dyn Greeter>()?.greet(), "hey");
//!         Ok(())
//!     })?;
//!
//!     assert_eq!(Context::resolve::<dyn Greeter>()?.greet(), "good day");
//!     Ok(())
//! })
//! .unwrap();
//! ```

mod ambient;
mod builder;
mod registry;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::continuation::Continuation;
use crate::contract::ContractId;
use crate::error::{Result, ScopeError};
use crate::scoped::Scoped;

pub(crate) use ambient::AmbientGuard;
pub use builder::ScopeBuilder;
pub use registry::{Factory, Registration, RegistrationKind, Registry, ServiceInfo};

/// Shared handle to a context node
pub type ContextHandle = Arc<Context>;

/// Unique identifier of a context node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A scope in the context chain
pub struct Context {
    id: ContextId,
    label: Option<String>,
    parent: Option<ContextHandle>,
    depth: usize,
    registry: Registry,
}

impl Context {
    pub(crate) fn new(parent: Option<ContextHandle>, label: Option<String>) -> ContextHandle {
        let depth = parent.as_ref().map_or(0, |p| p.depth + 1);
        Arc::new(Self {
            id: ContextId::new(),
            label,
            parent,
            depth,
            registry: Registry::new(),
        })
    }

    // ────────────────────────────────────────────────────────────────────
    // Ambient API
    // ────────────────────────────────────────────────────────────────────

    /// Open a child of the ambient context (or a root), run `body` in it
    ///
    /// The new context is ambient for the whole of `body`, including nested
    /// calls; nested `create` calls make children of it. The previous ambient
    /// context is restored on every exit path, panics included. The body's
    /// return value is passed through.
    pub fn create<F, R>(body: F) -> R
    where
        F: FnOnce() -> R,
    {
        ScopeBuilder::new().create(body)
    }

    /// Options for a new scope (label, explicit parent)
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    /// The context ambient on this thread, if any
    pub fn current() -> Option<ContextHandle> {
        ambient::current()
    }

    /// The ambient context, or `OutOfContext`
    pub fn capture() -> Result<ContextHandle> {
        Self::ambient("capture")
    }

    /// Bind `value` to the contract `C` in the ambient context
    ///
    /// Every resolution of `C` in this scope and its descendants returns this
    /// exact instance unless a descendant shadows it.
    pub fn register<C>(value: Arc<C>) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        Self::ambient("register")?.insert::<C>(value)
    }

    /// Bind a constructor to the contract `C` in the ambient context
    ///
    /// The factory runs once per resolution.
    pub fn register_factory<C, F>(factory: F) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<C> + Send + Sync + 'static,
    {
        Self::ambient("register")?.insert_factory::<C, F>(factory)
    }

    /// Resolve `C` from the ambient context outward
    pub fn resolve<C>() -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        Self::ambient("resolve")?.lookup::<C>()
    }

    /// Like [`resolve`](Self::resolve), but a missing binding is `Ok(None)`
    pub fn try_resolve<C>() -> Result<Option<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        Ok(Self::ambient("resolve")?
            .find::<C>()
            .map(|registration| registration.materialize()))
    }

    /// Whether `C` resolves from here. False outside any scope.
    pub fn is_registered<C>() -> bool
    where
        C: ?Sized + Send + Sync + 'static,
    {
        ambient::current().is_some_and(|context| context.find::<C>().is_some())
    }

    /// Capture the ambient context for `body`, to be run later
    ///
    /// See [`Continuation`]. Fails with `OutOfContext` when nothing is
    /// ambient; running the continuation cannot fail that way.
    pub fn save<F>(body: F) -> Result<Continuation<F>> {
        Ok(Continuation::new(Self::ambient("save")?, body))
    }

    /// Capture the ambient context for an async task
    ///
    /// See [`Scoped`].
    pub fn save_future<F>(future: F) -> Result<Scoped<F>>
    where
        F: Future,
    {
        Ok(Scoped::new(Self::ambient("save")?, future))
    }

    fn ambient(operation: &'static str) -> Result<ContextHandle> {
        ambient::current().ok_or_else(|| ScopeError::out_of_context(operation))
    }

    // ────────────────────────────────────────────────────────────────────
    // Explicit handle API
    // ────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn parent(&self) -> Option<&ContextHandle> {
        self.parent.as_ref()
    }

    /// Number of ancestors; a root has depth 0
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// This context followed by each ancestor up to the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Local registration table
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether `C` is bound in this context itself (ancestors not consulted)
    pub fn contains<C>(&self) -> bool
    where
        C: ?Sized + 'static,
    {
        self.registry.contains(&ContractId::of::<C>())
    }

    /// Bind `value` to `C` in this context
    pub fn insert<C>(&self, value: Arc<C>) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.registry.insert::<C>(Registration::Value(value))?;
        tracing::debug!(
            context = %self.id,
            contract = ContractId::of::<C>().name(),
            "registered value"
        );
        Ok(())
    }

    /// Bind a factory to `C` in this context
    pub fn insert_factory<C, F>(&self, factory: F) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<C> + Send + Sync + 'static,
    {
        let factory: Factory<C> = Arc::new(factory);
        self.registry.insert::<C>(Registration::Factory(factory))?;
        tracing::debug!(
            context = %self.id,
            contract = ContractId::of::<C>().name(),
            "registered factory"
        );
        Ok(())
    }

    /// Resolve `C` starting at this context, nearest binding first
    pub fn lookup<C>(&self) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.find::<C>()
            .map(|registration| registration.materialize())
            .ok_or_else(|| ScopeError::IrresolvableService {
                contract: ContractId::of::<C>().name(),
            })
    }

    fn find<C>(&self) -> Option<Registration<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.ancestors().find_map(|context| {
            let registration = context.registry.get::<C>()?;
            tracing::trace!(
                context = %context.id,
                from = %self.id,
                contract = ContractId::of::<C>().name(),
                "resolved service"
            );
            Some(registration)
        })
    }

    /// Open a child of this context and run `body` in it
    ///
    /// Whatever was ambient on the calling thread is restored afterwards.
    pub fn enter<F, R>(self: &Arc<Self>, body: F) -> R
    where
        F: FnOnce() -> R,
    {
        ScopeBuilder::new().parent(Arc::clone(self)).create(body)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("depth", &self.depth)
            .field("services", &self.registry)
            .finish()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        tracing::trace!(context = %self.id, depth = self.depth, "context released");

        // Unlink ancestors one at a time; a recursive drop would use stack
        // proportional to chain depth.
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = Arc::into_inner(node).and_then(|mut context| context.parent.take());
        }
    }
}

/// Iterator over a context and its ancestors, innermost first
pub struct Ancestors<'a> {
    next: Option<&'a Context>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Context;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}
