//! Per-context registration table

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::contract::ContractId;
use crate::error::{Result, ScopeError};

/// Zero-argument constructor stored by a factory registration
pub type Factory<C> = Arc<dyn Fn() -> Arc<C> + Send + Sync>;

/// How a contract was bound in a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    /// A single instance, returned on every resolution
    Value,
    /// A constructor, invoked on every resolution
    Factory,
}

/// A binding for the contract `C`
pub enum Registration<C: ?Sized> {
    Value(Arc<C>),
    Factory(Factory<C>),
}

impl<C: ?Sized> Registration<C> {
    /// Produce the service: the stored instance, or a fresh factory result
    pub fn materialize(&self) -> Arc<C> {
        match self {
            Registration::Value(value) => Arc::clone(value),
            Registration::Factory(factory) => factory(),
        }
    }

    pub fn kind(&self) -> RegistrationKind {
        match self {
            Registration::Value(_) => RegistrationKind::Value,
            Registration::Factory(_) => RegistrationKind::Factory,
        }
    }
}

// Manual impl: cloning only bumps the Arc, C itself need not be Clone.
impl<C: ?Sized> Clone for Registration<C> {
    fn clone(&self) -> Self {
        match self {
            Registration::Value(value) => Registration::Value(Arc::clone(value)),
            Registration::Factory(factory) => Registration::Factory(Arc::clone(factory)),
        }
    }
}

/// Type-erased registration plus the metadata needed without downcasting
struct Slot {
    kind: RegistrationKind,
    registration: Box<dyn Any + Send + Sync>,
}

/// Snapshot of one local binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Contract type name
    pub contract: String,
    /// Value or factory
    pub kind: RegistrationKind,
}

/// Registration table owned by a single context
///
/// The key set is append-only: a contract can be bound once and is never
/// replaced or removed while the context lives.
#[derive(Default)]
pub struct Registry {
    slots: RwLock<HashMap<ContractId, Slot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `C` unless it is already bound here
    ///
    /// On conflict the existing binding is left untouched.
    pub fn insert<C>(&self, registration: Registration<C>) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let contract = ContractId::of::<C>();
        let mut slots = self.slots.write();
        match slots.entry(contract) {
            Entry::Occupied(_) => Err(ScopeError::DuplicateRegistration {
                contract: contract.name(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    kind: registration.kind(),
                    registration: Box::new(registration),
                });
                Ok(())
            }
        }
    }

    /// Clone the local binding for `C`, if any
    ///
    /// The lock is released before the caller materializes the service, so
    /// factories are free to use the registry again.
    pub fn get<C>(&self) -> Option<Registration<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let slots = self.slots.read();
        slots
            .get(&ContractId::of::<C>())
            .and_then(|slot| slot.registration.downcast_ref::<Registration<C>>())
            .cloned()
    }

    pub fn contains(&self, contract: &ContractId) -> bool {
        self.slots.read().contains_key(contract)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Local bindings sorted by contract name
    pub fn services(&self) -> Vec<ServiceInfo> {
        let mut services: Vec<ServiceInfo> = self
            .slots
            .read()
            .iter()
            .map(|(contract, slot)| ServiceInfo {
                contract: contract.name().to_string(),
                kind: slot.kind,
            })
            .collect();
        services.sort_by(|a, b| a.contract.cmp(&b.contract));
        services
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        f.debug_set()
            .entries(slots.keys().map(|contract| contract.name()))
            .finish()
    }
}
