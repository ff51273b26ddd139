//! Scope options

use super::ambient::{self, AmbientGuard};
use super::{Context, ContextHandle};

/// Where a new scope attaches
#[derive(Debug, Clone, Default)]
enum Attach {
    /// Child of whatever is ambient (a root if nothing is)
    #[default]
    Ambient,
    /// Child of a captured handle
    Parent(ContextHandle),
    /// Always a root
    Root,
}

/// Builder for a new scope
///
/// ```rust
/// use nstack_core::Context;
///
/// let depth = Context::builder()
///     .label("request")
///     .create(|| Context::current().map(|c| c.depth()));
/// assert_eq!(depth, Some(0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScopeBuilder {
    label: Option<String>,
    attach: Attach,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the scope for logs and [`ContextInfo`](crate::ContextInfo)
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Nest under `parent` instead of the ambient context
    pub fn parent(mut self, parent: ContextHandle) -> Self {
        self.attach = Attach::Parent(parent);
        self
    }

    /// Start a new chain, ignoring the ambient context
    pub fn root(mut self) -> Self {
        self.attach = Attach::Root;
        self
    }

    /// Allocate the context without entering it
    pub(crate) fn build(self) -> ContextHandle {
        let parent = match self.attach {
            Attach::Ambient => ambient::current(),
            Attach::Parent(parent) => Some(parent),
            Attach::Root => None,
        };
        Context::new(parent, self.label)
    }

    /// Create the scope, run `body` inside it and leave it again
    ///
    /// The previous ambient context is restored however `body` exits.
    pub fn create<F, R>(self, body: F) -> R
    where
        F: FnOnce() -> R,
    {
        let context = self.build();
        let _guard = AmbientGuard::enter(context);
        body()
    }
}
