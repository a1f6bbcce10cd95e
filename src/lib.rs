//! # Serialito
//!
//! Registration-aware value serializers for caches.
//!
//! Caches that keep values off-heap or on disk store them as bytes. Serialito
//! turns values into compact records tagged with a small integer type
//! identifier instead of a full type name, and keeps the identifier mapping in
//! a per-codec type registry. A persistent codec saves that registry when it
//! closes and restores it when it opens, so records written before a restart
//! stay decodable afterwards.
//!
//! ## Features
//!
//! - **Compact records**: a varint type tag followed by the bincode payload
//! - **Stable identifiers**: allocated in registration order, never reused
//! - **Restart-safe**: registry state is persisted atomically with a checksum
//! - **Thread-safe**: encode and decode from many threads at once
//! - **Derive support**: `#[derive(Registered)]` gives a type its descriptor
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serialito::{Codec, Registered};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
//! struct Description {
//!     alias: String,
//!     code: u32,
//! }
//!
//! let codec = Codec::<Description>::transient().unwrap();
//! let value = Description { alias: "bar".into(), code: 879 };
//!
//! let record = codec.encode(&value).unwrap();
//! assert_eq!(codec.decode(&record).unwrap(), value);
//! ```
//!
//! ## Persistent Codecs
//!
//! A persistent codec restores its registry from the context's storage
//! location when it opens. On the very first run nothing is there yet and it
//! starts empty.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serialito::{Codec, DirectoryContext, FileStateStore, Registered};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
//! struct Employee {
//!     id: u64,
//!     person: Person,
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let context = DirectoryContext::new(dir.path());
//!
//! let codec = Codec::<Employee>::builder()
//!     .register::<Employee>()
//!     .register::<Person>()
//!     .persistent(FileStateStore::new(), &context)
//!     .open()
//!     .unwrap();
//!
//! let employee = Employee { id: 1, person: Person { name: "Ada".into(), age: 36 } };
//! let record = codec.encode(&employee).unwrap();
//! codec.close().unwrap();
//!
//! // Later, in a new process
//! let codec = Codec::<Employee>::persistent(&context).unwrap();
//! assert_eq!(codec.decode(&record).unwrap(), employee);
//! # codec.close().unwrap();
//! ```
//!
//! ## Custom Descriptors
//!
//! The descriptor defaults to the type's name. Pin it before renaming a type
//! whose records are already persisted:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serialito::Registered;
//!
//! #[derive(Serialize, Deserialize, Registered)]
//! #[registered(name = "Employee")]
//! struct StaffMember {
//!     id: u64,
//! }
//!
//! assert_eq!(<StaffMember as Registered>::TYPE_NAME, "Employee");
//! ```
//!
//! ## Logging
//!
//! Lifecycle events (restore, persist, close, on-demand registration) are
//! reported through the `log` facade. Install any logger to see them.
pub use serialito_core::*;
pub use serialito_macros::Registered;
