//! # Registry State Store
//!
//! Durable persistence of one [`RegistryState`] per cache.
//!
//! The store never discovers locations on its own: the owning cache hands it
//! a directory through a [`PersistenceContext`], private to that cache, so
//! unrelated registries can never collide on identifiers.
//!
//! ## Artifact Layout
//!
//! [`FileStateStore`] writes a single file, [`STATE_FILE_NAME`], under the
//! location. All integers are little endian:
//!
//! | Offset | Size | Field                              |
//! |--------|------|------------------------------------|
//! | 0      | 8    | Magic `SRLTREG\0`                  |
//! | 8      | 2    | Format version                     |
//! | 10     | 2    | Reserved (0)                       |
//! | 12     | 4    | Body length                        |
//! | 16     | 4    | CRC32 of the body                  |
//! | 20     | n    | Body: `RegistryState` (bincode)    |
//!
//! The body uses bincode's fixed-int encoding, independent of the options a
//! codec uses for records, so a registry can be restored before any codec
//! exists.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::{RegistryState, StoreError};

/// Name of the artifact written under a cache's storage location.
pub const STATE_FILE_NAME: &str = "registry.state";

/// Leading bytes of every state artifact.
pub const MAGIC: [u8; 8] = *b"SRLTREG\0";

/// Current artifact format version.
pub const FORMAT_VERSION: u16 = 1;

/// Per-cache persistence context supplied by the owning cache.
///
/// The location identifies a directory private to one cache instance.
pub trait PersistenceContext: Send + Sync {
    fn storage_location(&self) -> PathBuf;
}

/// A [`PersistenceContext`] backed by a fixed directory.
///
/// # Examples
///
/// ```
/// use serialito_core::{DirectoryContext, PersistenceContext};
/// use std::path::PathBuf;
///
/// let context = DirectoryContext::new("/var/cache/app/employeeCache");
/// assert_eq!(context.storage_location(), PathBuf::from("/var/cache/app/employeeCache"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryContext {
    directory: PathBuf,
}

impl DirectoryContext {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl PersistenceContext for DirectoryContext {
    fn storage_location(&self) -> PathBuf {
        self.directory.clone()
    }
}

/// Durable store for registry state.
///
/// Stores are only driven from single-threaded lifecycle phases (open and
/// close of the owning codec); implementations need no internal locking.
pub trait RegistryStateStore: Send + Sync {
    /// Writes `state` as the single artifact at `location`.
    ///
    /// Replacing a prior artifact must be atomic: a concurrent reader sees
    /// either the old or the new artifact, never a partial one.
    fn persist(&self, state: &RegistryState, location: &Path) -> Result<(), StoreError>;

    /// Reads the artifact at `location`.
    ///
    /// Returns `StoreError::NoPriorState` when nothing was ever persisted
    /// there and `StoreError::Corrupt` when the artifact cannot be parsed.
    fn restore(&self, location: &Path) -> Result<RegistryState, StoreError>;
}

/// Fixed-size header preceding the state body.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StateHeader {
    magic: [u8; 8],
    version: u16,
    reserved: u16,
    body_len: u32,
    checksum: u32,
}

impl StateHeader {
    const SIZE: usize = 20;

    fn for_body(body: &[u8]) -> io::Result<Self> {
        let body_len = u32::try_from(body.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "registry state body too large")
        })?;

        Ok(Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            reserved: 0,
            body_len,
            checksum: crc32fast::hash(body),
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic)?;
        w.write_u16::<LittleEndian>(self.version)?;
        w.write_u16::<LittleEndian>(self.reserved)?;
        w.write_u32::<LittleEndian>(self.body_len)?;
        w.write_u32::<LittleEndian>(self.checksum)?;
        Ok(())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;

        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid registry state magic",
            ));
        }

        Ok(Self {
            magic,
            version: r.read_u16::<LittleEndian>()?,
            reserved: r.read_u16::<LittleEndian>()?,
            body_len: r.read_u32::<LittleEndian>()?,
            checksum: r.read_u32::<LittleEndian>()?,
        })
    }
}

/// Frames a state as header plus body.
fn encode_state(state: &RegistryState) -> io::Result<Vec<u8>> {
    let body = bincode::serialize(state)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let header = StateHeader::for_body(&body)?;

    let mut buf = Vec::with_capacity(StateHeader::SIZE + body.len());
    header.write(&mut buf)?;
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Parses a framed state, reporting every failure as corruption of `path`.
fn decode_state(path: &Path, bytes: &[u8]) -> Result<RegistryState, StoreError> {
    if bytes.is_empty() {
        return Err(StoreError::corrupt(path, "empty file"));
    }
    if bytes.len() < StateHeader::SIZE {
        return Err(StoreError::corrupt(
            path,
            format!("truncated header: {} of {} bytes", bytes.len(), StateHeader::SIZE),
        ));
    }

    let (mut head, body) = bytes.split_at(StateHeader::SIZE);
    let header = StateHeader::read(&mut head).map_err(|e| StoreError::corrupt(path, e.to_string()))?;

    if header.version != FORMAT_VERSION {
        return Err(StoreError::corrupt(
            path,
            format!("unsupported format version {}", header.version),
        ));
    }
    if header.reserved != 0 {
        return Err(StoreError::corrupt(
            path,
            format!("reserved header field is {}, expected 0", header.reserved),
        ));
    }
    if body.len() != header.body_len as usize {
        return Err(StoreError::corrupt(
            path,
            format!(
                "body length mismatch: header says {}, found {}",
                header.body_len,
                body.len()
            ),
        ));
    }
    if crc32fast::hash(body) != header.checksum {
        return Err(StoreError::corrupt(path, "checksum mismatch"));
    }

    let state: RegistryState = bincode::deserialize(body)
        .map_err(|e| StoreError::corrupt(path, format!("undecodable body: {}", e)))?;
    state
        .validate()
        .map_err(|e| StoreError::corrupt(path, e.to_string()))?;

    Ok(state)
}

/// File-based [`RegistryStateStore`].
///
/// Persisting writes a temporary file in the location, syncs it, then renames
/// it over the artifact. The temporary file is removed on every failure path.
///
/// # Examples
///
/// ```
/// use serialito_core::{FileStateStore, RegistryStateStore, TypeDescriptor, TypeRegistry};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FileStateStore::new();
///
/// let registry = TypeRegistry::new();
/// registry.register(TypeDescriptor::new("Employee")).unwrap();
/// store.persist(&registry.snapshot(), dir.path()).unwrap();
///
/// let restored = store.restore(dir.path()).unwrap();
/// assert_eq!(restored, registry.snapshot());
/// ```
#[derive(Clone, Debug)]
pub struct FileStateStore {
    file_name: String,
}

impl FileStateStore {
    /// Store writing [`STATE_FILE_NAME`].
    pub fn new() -> Self {
        Self::with_file_name(STATE_FILE_NAME)
    }

    /// Store writing a custom file name, for callers that keep several
    /// registries in one location.
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Full path of the artifact under `location`.
    pub fn state_path(&self, location: &Path) -> PathBuf {
        location.join(&self.file_name)
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryStateStore for FileStateStore {
    fn persist(&self, state: &RegistryState, location: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(location).map_err(|e| StoreError::io(location, e))?;

        let path = self.state_path(location);
        let bytes = encode_state(state).map_err(|e| StoreError::io(&path, e))?;

        let mut tmp = NamedTempFile::new_in(location).map_err(|e| StoreError::io(location, e))?;
        tmp.write_all(&bytes)
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        log::debug!(
            "persisted {} type registrations to {}",
            state.len(),
            path.display()
        );
        Ok(())
    }

    fn restore(&self, location: &Path) -> Result<RegistryState, StoreError> {
        let path = self.state_path(location);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NoPriorState { path });
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        let state = decode_state(&path, &bytes)?;
        log::debug!(
            "restored {} type registrations from {}",
            state.len(),
            path.display()
        );
        Ok(state)
    }
}
