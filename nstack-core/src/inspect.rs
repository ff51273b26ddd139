//! Serializable snapshots of context chains

use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextId, ServiceInfo};
use crate::error::{Result, ScopeError};

/// Point-in-time view of one context node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    pub id: ContextId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub depth: usize,
    /// Local bindings only, sorted by contract name
    pub services: Vec<ServiceInfo>,
}

impl Context {
    /// Snapshot this node
    pub fn info(&self) -> ContextInfo {
        ContextInfo {
            id: self.id(),
            label: self.label().map(str::to_string),
            depth: self.depth(),
            services: self.registry().services(),
        }
    }

    /// Snapshot this node and its ancestors, innermost first
    pub fn chain_info(&self) -> Vec<ContextInfo> {
        self.ancestors().map(Context::info).collect()
    }

    /// Snapshot the ambient chain, innermost first
    pub fn describe_chain() -> Result<Vec<ContextInfo>> {
        Context::current()
            .map(|context| context.chain_info())
            .ok_or_else(|| ScopeError::out_of_context("describe"))
    }
}
