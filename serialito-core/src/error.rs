//! Error types for registries, state stores and codecs.
//!
//! Each concern gets its own enum so callers can match on exactly the
//! failures an operation can produce:
//!
//! - [`RegistryError`] - lookup misses and allocation conflicts in a [`TypeRegistry`](crate::TypeRegistry)
//! - [`StoreError`] - durable-store failures, including the expected "no prior state" outcome
//! - [`EncodingError`] / [`DecodingError`] - per-record failures surfaced by a codec
//! - [`CodecError`] - lifecycle failures while opening, flushing or closing a codec

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::{TypeDescriptor, TypeIdentifier};

/// Errors produced by a [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No type is registered under the identifier.
    #[error("unknown type identifier {0}")]
    UnknownIdentifier(TypeIdentifier),

    /// The type descriptor has never been registered.
    #[error("type `{0}` is not registered")]
    UnregisteredType(TypeDescriptor),

    /// A restore was attempted into a registry that already holds mappings.
    #[error("cannot restore into a non-empty registry ({existing} types already registered)")]
    RestoreConflict { existing: usize },

    /// Two identifiers claim the same type descriptor.
    #[error("type `{descriptor}` is mapped to both {first} and {second}")]
    DuplicateDescriptor {
        descriptor: TypeDescriptor,
        first: TypeIdentifier,
        second: TypeIdentifier,
    },

    /// One identifier is claimed by two type descriptors.
    #[error("identifier {identifier} is claimed by both `{first}` and `{second}`")]
    DuplicateIdentifier {
        identifier: TypeIdentifier,
        first: TypeDescriptor,
        second: TypeDescriptor,
    },

    /// Every identifier in the `u32` space has been allocated.
    #[error("type identifier space exhausted")]
    IdentifierSpaceExhausted,
}

/// Errors produced by a [`RegistryStateStore`](crate::RegistryStateStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No artifact exists at the location. Expected on the first run.
    #[error("no registry state at {}", path.display())]
    NoPriorState { path: PathBuf },

    /// The artifact exists but cannot be fully parsed.
    #[error("corrupt registry state at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The underlying file operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Returns `true` for the "nothing persisted yet" outcome.
    pub fn is_no_prior_state(&self) -> bool {
        matches!(self, StoreError::NoPriorState { .. })
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors produced while encoding a value.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The codec has been closed.
    #[error("codec is closed")]
    Closed,

    /// The value type is not registered and the codec does not register on demand.
    #[error("value type `{0}` is not registered with this codec")]
    UnregisteredType(TypeDescriptor),

    /// On-demand registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The value could not be written (unsupported shape or size limit).
    #[error("failed to serialize value: {0}")]
    Serialize(#[source] bincode::Error),
}

/// Errors produced while decoding a record.
#[derive(Debug, Error)]
pub enum DecodingError {
    /// The codec has been closed.
    #[error("codec is closed")]
    Closed,

    /// The record's leading tag is not present in the registry.
    #[error("record tagged with unknown type identifier {0}")]
    UnknownTypeTag(TypeIdentifier),

    /// The record's tag names a different registered type.
    #[error("record holds `{found}`, expected `{expected}`")]
    TypeMismatch {
        expected: TypeDescriptor,
        found: TypeDescriptor,
    },

    /// The record is truncated or corrupt.
    #[error("malformed record: {0}")]
    Malformed(#[source] bincode::Error),
}

/// Lifecycle errors of a codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Restoring registry state failed while opening.
    #[error("failed to restore registry state: {0}")]
    Store(#[source] StoreError),

    /// Registering or restoring types failed while opening.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Persisting registry state failed while flushing or closing.
    #[error("failed to persist registry state: {0}")]
    Persist(#[source] StoreError),
}
