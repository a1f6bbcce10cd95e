//! # Serialito Core
//!
//! Core types for registration-aware value codecs.
//!
//! A cache that stores values as bytes needs a serializer. Writing a full type
//! name into every record is wasteful, so a [`Codec`] tags each record with a
//! small [`TypeIdentifier`] allocated by a [`TypeRegistry`]. Because those
//! identifiers are only meaningful with the registry that produced them, a
//! persistent codec saves the registry through a [`RegistryStateStore`] when
//! it closes and restores it when it opens again.
//!
//! ## Module Organization
//!
//! - [`descriptor`] - Type identifiers, type descriptors and the [`Registered`] trait
//! - [`registry`] - Bidirectional identifier/descriptor mapping
//! - [`store`] - Durable registry state (`FileStateStore`, persistence contexts)
//! - [`codec`] - The [`ValueCodec`] contract, [`Codec`] and its lifecycle
//! - [`plain_codec`] - Registry-free bincode codec
//! - [`config`] - Codec configuration and policies
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```
//! use serialito_core::{Codec, Registered};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! impl Registered for Person {
//!     const TYPE_NAME: &'static str = "Person";
//! }
//!
//! let codec = Codec::<Person>::transient().unwrap();
//! let person = Person { name: "Ada".into(), age: 36 };
//!
//! let record = codec.encode(&person).unwrap();
//! assert_eq!(codec.decode(&record).unwrap(), person);
//! assert!(codec.equals(&person, &record).unwrap());
//!
//! codec.close().unwrap();
//! ```
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod plain_codec;
pub mod registry;
pub mod store;

#[cfg(feature = "stats")]
mod stats;

pub use codec::{Codec, CodecBuilder, CodecState, EncodedRecord, ValueCodec};
pub use config::{
    CodecConfig, PersistFailurePolicy, RegistrationPolicy, DEFAULT_MAX_RECORD_SIZE,
};
pub use descriptor::{Registered, TypeDescriptor, TypeIdentifier};
pub use error::{CodecError, DecodingError, EncodingError, RegistryError, StoreError};
pub use plain_codec::PlainCodec;
pub use registry::{RegistryState, RegistryView, TypeRegistry};
pub use store::{
    DirectoryContext, FileStateStore, PersistenceContext, RegistryStateStore, FORMAT_VERSION,
    MAGIC, STATE_FILE_NAME,
};

#[cfg(feature = "stats")]
pub use stats::CodecStats;
