//! # Type Registry
//!
//! Bijective mapping between [`TypeIdentifier`]s and [`TypeDescriptor`]s.
//!
//! The registry is the source of truth for "which identifier encodes which
//! type". It is owned by a single codec (one per cache), never shared
//! process-wide, and its full mapping can be captured as a [`RegistryState`]
//! for persistence and restored into a fresh registry on the next start.
//!
//! # Examples
//!
//! ```
//! use serialito_core::{TypeDescriptor, TypeIdentifier, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let employee = registry.register(TypeDescriptor::new("Employee")).unwrap();
//! let person = registry.register(TypeDescriptor::new("Person")).unwrap();
//!
//! assert_eq!(employee, TypeIdentifier::new(0));
//! assert_eq!(person, TypeIdentifier::new(1));
//!
//! // Registering again is a no-op that returns the same identifier
//! assert_eq!(registry.register(TypeDescriptor::new("Employee")).unwrap(), employee);
//!
//! // Restore the mapping into a fresh registry
//! let state = registry.snapshot();
//! let restored = TypeRegistry::new();
//! restored.restore(state.clone()).unwrap();
//! assert_eq!(restored.snapshot(), state);
//! ```

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{Registered, RegistryError, TypeDescriptor, TypeIdentifier};

/// Immutable copy of a registry mapping at a point in time.
///
/// This is the unit a [`RegistryStateStore`](crate::RegistryStateStore) persists.
/// Entries are kept ordered by identifier so two snapshots of the same mapping
/// compare and serialize identically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    entries: BTreeMap<TypeIdentifier, TypeDescriptor>,
}

impl RegistryState {
    /// State of a registry with no registrations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a state from raw `(identifier, descriptor)` pairs.
    ///
    /// # Errors
    ///
    /// * `DuplicateIdentifier` - one identifier is paired with two descriptors
    /// * `DuplicateDescriptor` - one descriptor is paired with two identifiers
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (TypeIdentifier, TypeDescriptor)>,
    {
        let mut map: BTreeMap<TypeIdentifier, TypeDescriptor> = BTreeMap::new();
        for (identifier, descriptor) in entries {
            if let Some(first) = map.get(&identifier) {
                if *first != descriptor {
                    return Err(RegistryError::DuplicateIdentifier {
                        identifier,
                        first: first.clone(),
                        second: descriptor,
                    });
                }
                continue;
            }
            map.insert(identifier, descriptor);
        }

        let state = RegistryState { entries: map };
        state.validate()?;
        Ok(state)
    }

    /// Checks that no descriptor appears under two identifiers.
    ///
    /// Identifier uniqueness is guaranteed by the map itself. Deserialized
    /// states bypass [`RegistryState::from_entries`], so stores call this after parsing.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen: HashMap<&TypeDescriptor, TypeIdentifier> =
            HashMap::with_capacity(self.entries.len());
        for (identifier, descriptor) in &self.entries {
            if let Some(first) = seen.insert(descriptor, *identifier) {
                return Err(RegistryError::DuplicateDescriptor {
                    descriptor: descriptor.clone(),
                    first,
                    second: *identifier,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor registered under `identifier`.
    pub fn get(&self, identifier: TypeIdentifier) -> Option<&TypeDescriptor> {
        self.entries.get(&identifier)
    }

    /// Iterates entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeIdentifier, &TypeDescriptor)> {
        self.entries.iter().map(|(id, descriptor)| (*id, descriptor))
    }

    /// Identifier a registry restored from this state allocates next.
    ///
    /// `None` when the highest identifier is `u32::MAX`.
    pub fn next_identifier(&self) -> Option<TypeIdentifier> {
        match self.entries.keys().next_back() {
            Some(max) => max.next(),
            None => Some(TypeIdentifier::BASE),
        }
    }
}

struct RegistryInner {
    by_id: BTreeMap<TypeIdentifier, TypeDescriptor>,
    by_type: HashMap<TypeDescriptor, TypeIdentifier>,
    // None once the identifier space is exhausted
    next: Option<TypeIdentifier>,
}

impl RegistryInner {
    fn empty() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_type: HashMap::new(),
            next: Some(TypeIdentifier::BASE),
        }
    }
}

/// Thread-safe bijective map between type identifiers and type descriptors.
///
/// # Thread Safety
///
/// The registry uses a `parking_lot::RwLock`. Lookups and already-registered
/// types only take the read lock, so concurrent encoders never block each
/// other. A miss in [`register`](TypeRegistry::register) takes the upgradable
/// read lock, which at most one thread can hold, re-checks the map, and only
/// then upgrades to allocate. Two threads racing to register the same unseen
/// type therefore observe a single identifier.
///
/// # Allocation
///
/// Identifiers are allocated strictly increasing from [`TypeIdentifier::BASE`],
/// one per distinct type, in registration order. After a
/// [`restore`](TypeRegistry::restore) allocation continues after the highest
/// restored identifier, so retired identifiers are never reused.
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::empty()),
        }
    }

    /// Registers a type descriptor, returning its identifier.
    ///
    /// Idempotent: registering a known descriptor returns its existing
    /// identifier without mutating the registry.
    ///
    /// # Errors
    ///
    /// * `IdentifierSpaceExhausted` - every `u32` identifier is taken
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<TypeIdentifier, RegistryError> {
        if let Some(id) = self.inner.read().by_type.get(&descriptor) {
            return Ok(*id);
        }

        let guard = self.inner.upgradable_read();
        // Another thread may have won the race between the two locks
        if let Some(id) = guard.by_type.get(&descriptor) {
            return Ok(*id);
        }

        let mut inner = RwLockUpgradableReadGuard::upgrade(guard);
        let id = inner.next.ok_or(RegistryError::IdentifierSpaceExhausted)?;
        inner.next = id.next();
        inner.by_id.insert(id, descriptor.clone());
        log::debug!("registered type `{}` as identifier {}", descriptor, id);
        inner.by_type.insert(descriptor, id);

        Ok(id)
    }

    /// Registers a Rust type through its [`Registered`] descriptor.
    pub fn register_type<T: Registered + ?Sized>(&self) -> Result<TypeIdentifier, RegistryError> {
        self.register(T::type_descriptor())
    }

    /// Resolves an identifier to its descriptor.
    ///
    /// # Errors
    ///
    /// * `UnknownIdentifier` - nothing is registered under `identifier`
    pub fn resolve_identifier(
        &self,
        identifier: TypeIdentifier,
    ) -> Result<TypeDescriptor, RegistryError> {
        self.inner
            .read()
            .by_id
            .get(&identifier)
            .cloned()
            .ok_or(RegistryError::UnknownIdentifier(identifier))
    }

    /// Resolves a descriptor to its identifier.
    ///
    /// # Errors
    ///
    /// * `UnregisteredType` - the descriptor was never registered
    pub fn resolve_type(&self, descriptor: &TypeDescriptor) -> Result<TypeIdentifier, RegistryError> {
        self.inner
            .read()
            .by_type
            .get(descriptor)
            .copied()
            .ok_or_else(|| RegistryError::UnregisteredType(descriptor.clone()))
    }

    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.inner.read().by_type.contains_key(descriptor)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }

    /// Returns an immutable copy of the current mapping.
    pub fn snapshot(&self) -> RegistryState {
        RegistryState {
            entries: self.inner.read().by_id.clone(),
        }
    }

    /// Replaces the mapping wholesale with `state`.
    ///
    /// Only a registry with no registrations accepts a restore; merging two
    /// allocation histories would break the bijection. On error the existing
    /// mapping is left untouched.
    ///
    /// # Errors
    ///
    /// * `RestoreConflict` - the registry is not empty
    /// * `DuplicateDescriptor` - `state` maps one descriptor twice
    pub fn restore(&self, state: RegistryState) -> Result<(), RegistryError> {
        state.validate()?;

        let mut inner = self.inner.write();
        if !inner.by_id.is_empty() {
            return Err(RegistryError::RestoreConflict {
                existing: inner.by_id.len(),
            });
        }

        inner.next = state.next_identifier();
        inner.by_type = state
            .entries
            .iter()
            .map(|(id, descriptor)| (descriptor.clone(), *id))
            .collect();
        inner.by_id = state.entries;

        Ok(())
    }

    /// Drops every registration and resets allocation to the base identifier.
    pub fn clear(&self) {
        *self.inner.write() = RegistryInner::empty();
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed handle to a codec's registry.
///
/// Registrations can be added and looked up, but the mapping cannot be
/// cleared or replaced: a codec caches its own identifier, so only the
/// codec's lifecycle may reset it.
#[derive(Clone, Copy, Debug)]
pub struct RegistryView<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> RegistryView<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// See [`TypeRegistry::register`].
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<TypeIdentifier, RegistryError> {
        self.registry.register(descriptor)
    }

    pub fn register_type<T: Registered + ?Sized>(&self) -> Result<TypeIdentifier, RegistryError> {
        self.registry.register_type::<T>()
    }

    pub fn resolve_identifier(
        &self,
        identifier: TypeIdentifier,
    ) -> Result<TypeDescriptor, RegistryError> {
        self.registry.resolve_identifier(identifier)
    }

    pub fn resolve_type(&self, descriptor: &TypeDescriptor) -> Result<TypeIdentifier, RegistryError> {
        self.registry.resolve_type(descriptor)
    }

    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.registry.contains(descriptor)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn snapshot(&self) -> RegistryState {
        self.registry.snapshot()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("TypeRegistry")
            .field("entries", &inner.by_id)
            .field("next", &inner.next)
            .finish()
    }
}
