use bincode::Options;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    CodecConfig, CodecError, DecodingError, EncodingError, FileStateStore, PersistFailurePolicy,
    PersistenceContext, Registered, RegistrationPolicy, RegistryStateStore, RegistryView,
    TypeDescriptor, TypeIdentifier, TypeRegistry,
};
#[cfg(feature = "stats")]
use crate::CodecStats;

/// Opaque byte sequence produced by a codec.
///
/// For a registration-aware [`Codec`] the layout is a varint-encoded
/// [`TypeIdentifier`] tag followed by the bincode payload of the value. Callers
/// should treat it as opaque: it is only decodable by a codec with the same
/// configuration and registry mapping that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodedRecord(Vec<u8>);

impl EncodedRecord {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for EncodedRecord {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for EncodedRecord {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EncodedRecord {
    fn from(bytes: Vec<u8>) -> Self {
        EncodedRecord(bytes)
    }
}

impl From<EncodedRecord> for Vec<u8> {
    fn from(record: EncodedRecord) -> Self {
        record.0
    }
}

/// The serializer contract a cache drives for every stored value.
///
/// A cache calls [`encode`](ValueCodec::encode) on put, [`decode`](ValueCodec::decode)
/// on get, [`equals`](ValueCodec::equals) for compare-and-swap style operations,
/// and [`close`](ValueCodec::close) exactly once at shutdown. Implementations
/// must tolerate concurrent calls from the cache's worker threads.
///
/// A failure on one record concerns only that record; caches are expected to
/// treat it as "that entry is unreadable", not as a cache-wide fault.
pub trait ValueCodec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<EncodedRecord, EncodingError>;

    fn decode(&self, record: &[u8]) -> Result<T, DecodingError>;

    /// Returns whether `record` holds a value equal to `value`.
    fn equals(&self, value: &T, record: &[u8]) -> Result<bool, DecodingError>;

    /// Releases the codec. The default has nothing to release.
    fn close(&self) -> Result<(), CodecError> {
        Ok(())
    }
}

/// Bincode options for records: varint integers, size limit, no trailing bytes.
pub(crate) fn record_options(max_record_size: u64) -> impl Options + Copy {
    bincode::DefaultOptions::new().with_limit(max_record_size)
}

/// Lifecycle state of a [`Codec`].
///
/// The `Uninitialized` and `Restoring` phases happen inside
/// [`CodecBuilder::open`]; an opened codec starts in `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecState {
    Ready,
    /// Close started; a failed persist leaves the codec here until `close` is retried.
    Closing,
    Closed,
}

struct Persistence {
    store: Box<dyn RegistryStateStore>,
    location: PathBuf,
}

/// Registration-aware codec for values of type `T`.
///
/// Each record carries the [`TypeIdentifier`] of `T` as a leading tag instead
/// of its full type name, keeping records small. The identifier comes from the
/// codec's own [`TypeRegistry`]; nothing is shared between codecs.
///
/// Without persistence the codec is *transient*: the registry lives as long as
/// the codec. With a [`RegistryStateStore`] it is *persistent*: the registry is
/// restored when the codec opens and persisted when it closes, so records
/// written before a restart stay decodable.
///
/// # Thread Safety
///
/// `encode`, `decode` and `equals` take `&self` and can be called from many
/// threads. The identifier of `T` is resolved once and cached in a `OnceCell`,
/// so the hot path does not touch the registry lock. The cache stays valid
/// because [`registry`](Codec::registry) only hands out a [`RegistryView`],
/// which can add registrations but never clear or replace them. `close` and
/// `flush` are serialized by a `parking_lot::Mutex`; a second close never
/// persists twice.
///
/// # Examples
///
/// ```
/// use serialito_core::{Codec, DirectoryContext};
///
/// let dir = tempfile::tempdir().unwrap();
/// let context = DirectoryContext::new(dir.path());
///
/// // First run: nothing persisted yet, the registry starts empty
/// let codec = Codec::<String>::persistent(&context).unwrap();
/// let record = codec.encode(&"apple".to_string()).unwrap();
/// codec.close().unwrap();
///
/// // After a restart the restored registry decodes the old record
/// let codec = Codec::<String>::persistent(&context).unwrap();
/// assert_eq!(codec.decode(&record).unwrap(), "apple");
/// codec.close().unwrap();
/// ```
pub struct Codec<T> {
    registry: TypeRegistry,
    descriptor: TypeDescriptor,
    tag: OnceCell<TypeIdentifier>,
    config: CodecConfig,
    persistence: Option<Persistence>,
    lifecycle: Mutex<CodecState>,
    closed: AtomicBool,
    #[cfg(feature = "stats")]
    stats: CodecStats,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Registered> Codec<T> {
    pub fn builder() -> CodecBuilder<T> {
        CodecBuilder::new()
    }

    /// Transient codec with `T` registered up front.
    pub fn transient() -> Result<Self, CodecError> {
        Self::builder().register::<T>().open()
    }

    /// Persistent codec backed by a [`FileStateStore`] in the context's
    /// location, with `T` registered after the restore.
    pub fn persistent(context: &dyn PersistenceContext) -> Result<Self, CodecError> {
        Self::builder()
            .register::<T>()
            .persistent(FileStateStore::new(), context)
            .open()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Handle for adding and inspecting registrations.
    pub fn registry(&self) -> RegistryView<'_> {
        RegistryView::new(&self.registry)
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn state(&self) -> CodecState {
        *self.lifecycle.lock()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    /// Directory the registry state is persisted to, if any.
    pub fn storage_location(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|p| p.location.as_path())
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CodecStats {
        &self.stats
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Identifier of `T` if it is registered, cached after the first hit.
    fn own_tag(&self) -> Option<TypeIdentifier> {
        if let Some(tag) = self.tag.get() {
            return Some(*tag);
        }
        let tag = self.registry.resolve_type(&self.descriptor).ok()?;
        Some(*self.tag.get_or_init(|| tag))
    }

    fn tag_for_encode(&self) -> Result<TypeIdentifier, EncodingError> {
        if let Some(tag) = self.own_tag() {
            return Ok(tag);
        }

        match self.config.registration {
            RegistrationPolicy::Explicit => {
                Err(EncodingError::UnregisteredType(self.descriptor.clone()))
            }
            RegistrationPolicy::OnDemand => {
                let tag = self.registry.register(self.descriptor.clone())?;
                Ok(*self.tag.get_or_init(|| tag))
            }
        }
    }

    /// Persists a full snapshot of the registry without closing the codec.
    ///
    /// A no-op for transient codecs and for codecs that are already closed
    /// (their state was persisted by `close`).
    pub fn flush(&self) -> Result<(), CodecError> {
        // Held across the persist so a concurrent close cannot release in between
        let state = self.lifecycle.lock();
        if *state == CodecState::Closed {
            log::debug!("codec for `{}` is closed, nothing to flush", self.descriptor);
            return Ok(());
        }
        self.persist_snapshot()
    }

    /// Closes the codec: persists the registry, then releases it.
    ///
    /// The two steps are distinct: a persist failure is reported as
    /// `CodecError::Persist` before anything is released. With
    /// [`PersistFailurePolicy::Fatal`] the codec then stays in
    /// [`CodecState::Closing`], rejecting traffic, and a later `close` retries
    /// the persist. With [`PersistFailurePolicy::Ignore`] the failure is logged
    /// and the codec closes anyway.
    ///
    /// Closing an already closed codec is a no-op.
    pub fn close(&self) -> Result<(), CodecError> {
        let mut state = self.lifecycle.lock();
        match *state {
            CodecState::Closed => {
                log::debug!("codec for `{}` already closed", self.descriptor);
                return Ok(());
            }
            CodecState::Ready => {
                *state = CodecState::Closing;
                self.closed.store(true, Ordering::Release);
            }
            CodecState::Closing => {
                log::debug!("retrying close of codec for `{}`", self.descriptor);
            }
        }

        if let Err(err) = self.persist_snapshot() {
            match self.config.persist_failure {
                PersistFailurePolicy::Fatal => return Err(err),
                PersistFailurePolicy::Ignore => {
                    log::warn!(
                        "closing codec for `{}` without persisted registry state: {}",
                        self.descriptor,
                        err
                    );
                }
            }
        }

        self.release();
        *state = CodecState::Closed;
        log::debug!("codec for `{}` closed", self.descriptor);
        Ok(())
    }

    fn persist_snapshot(&self) -> Result<(), CodecError> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };

        let state = self.registry.snapshot();
        persistence
            .store
            .persist(&state, &persistence.location)
            .map_err(CodecError::Persist)?;
        log::info!(
            "persisted {} type registrations for `{}` to {}",
            state.len(),
            self.descriptor,
            persistence.location.display()
        );
        Ok(())
    }

    fn release(&self) {
        self.registry.clear();
    }
}

impl<T> Codec<T>
where
    T: Registered + Serialize + DeserializeOwned + PartialEq,
{
    /// Encodes `value` as a tagged record.
    ///
    /// # Errors
    ///
    /// * `Closed` - the codec has been closed
    /// * `UnregisteredType` - `T` is not registered and registration is explicit
    /// * `Registry` - on-demand registration failed
    /// * `Serialize` - bincode rejected the value or the record exceeds `max_record_size`
    pub fn encode(&self, value: &T) -> Result<EncodedRecord, EncodingError> {
        let result = self.encode_record(value);
        #[cfg(feature = "stats")]
        match &result {
            Ok(record) => self.stats.record_encode(record.len()),
            Err(_) => self.stats.record_encode_failure(),
        }
        result
    }

    fn encode_record(&self, value: &T) -> Result<EncodedRecord, EncodingError> {
        if self.is_closed() {
            return Err(EncodingError::Closed);
        }

        let tag = self.tag_for_encode()?;
        let options = record_options(self.config.max_record_size);

        let mut buf = Vec::new();
        options
            .serialize_into(&mut buf, &tag.get())
            .map_err(EncodingError::Serialize)?;
        options
            .serialize_into(&mut buf, value)
            .map_err(EncodingError::Serialize)?;

        Ok(EncodedRecord(buf))
    }

    /// Decodes a record produced by [`encode`](Codec::encode).
    ///
    /// # Errors
    ///
    /// * `Closed` - the codec has been closed
    /// * `UnknownTypeTag` - the tag is not in the registry (e.g. stale restored state)
    /// * `TypeMismatch` - the tag belongs to another registered type
    /// * `Malformed` - the record is truncated, corrupt or has trailing bytes
    pub fn decode(&self, record: &[u8]) -> Result<T, DecodingError> {
        let result = self.decode_record(record);
        #[cfg(feature = "stats")]
        match &result {
            Ok(_) => self.stats.record_decode(),
            Err(_) => self.stats.record_decode_failure(),
        }
        result
    }

    fn decode_record(&self, record: &[u8]) -> Result<T, DecodingError> {
        if self.is_closed() {
            return Err(DecodingError::Closed);
        }

        let options = record_options(self.config.max_record_size);
        let mut payload = record;
        let raw: u32 = options
            .deserialize_from(&mut payload)
            .map_err(DecodingError::Malformed)?;
        let tag = TypeIdentifier::new(raw);

        if self.own_tag() != Some(tag) {
            return Err(match self.registry.resolve_identifier(tag) {
                Ok(found) => DecodingError::TypeMismatch {
                    expected: self.descriptor.clone(),
                    found,
                },
                Err(_) => DecodingError::UnknownTypeTag(tag),
            });
        }

        options.deserialize(payload).map_err(DecodingError::Malformed)
    }

    /// Decodes `record` and compares it with `value`.
    pub fn equals(&self, value: &T, record: &[u8]) -> Result<bool, DecodingError> {
        Ok(self.decode(record)? == *value)
    }
}

impl<T> ValueCodec<T> for Codec<T>
where
    T: Registered + Serialize + DeserializeOwned + PartialEq,
{
    fn encode(&self, value: &T) -> Result<EncodedRecord, EncodingError> {
        Codec::encode(self, value)
    }

    fn decode(&self, record: &[u8]) -> Result<T, DecodingError> {
        Codec::decode(self, record)
    }

    fn equals(&self, value: &T, record: &[u8]) -> Result<bool, DecodingError> {
        Codec::equals(self, value, record)
    }

    fn close(&self) -> Result<(), CodecError> {
        Codec::close(self)
    }
}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("descriptor", &self.descriptor)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field(
                "storage_location",
                &self.persistence.as_ref().map(|p| &p.location),
            )
            .field("state", &*self.lifecycle.lock())
            .finish()
    }
}

impl<T> Drop for Codec<T> {
    fn drop(&mut self) {
        if self.persistence.is_some() && *self.lifecycle.get_mut() != CodecState::Closed {
            log::warn!(
                "codec for `{}` dropped without close; registry state was not persisted",
                self.descriptor
            );
        }
    }
}

/// Builder for [`Codec`].
///
/// Types listed with [`register`](CodecBuilder::register) are registered in
/// call order when the codec opens, *after* any persisted state is restored.
/// Restored types keep their identifiers; new ones continue after them.
///
/// # Examples
///
/// ```
/// use serialito_core::{Codec, CodecConfig, RegistrationPolicy, TypeIdentifier};
///
/// let codec = Codec::<String>::builder()
///     .register_descriptor("Employee")
///     .register_descriptor("Person")
///     .config(CodecConfig::default().with_registration(RegistrationPolicy::OnDemand))
///     .open()
///     .unwrap();
///
/// codec.encode(&"text".to_string()).unwrap();
/// assert_eq!(
///     codec.registry().resolve_type(codec.descriptor()).unwrap(),
///     TypeIdentifier::new(2)
/// );
/// ```
pub struct CodecBuilder<T> {
    config: CodecConfig,
    registrations: Vec<TypeDescriptor>,
    persistence: Option<Persistence>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Registered> CodecBuilder<T> {
    pub fn new() -> Self {
        Self {
            config: CodecConfig::default(),
            registrations: Vec::new(),
            persistence: None,
            _marker: PhantomData,
        }
    }

    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registration(mut self, registration: RegistrationPolicy) -> Self {
        self.config.registration = registration;
        self
    }

    /// Queues a Rust type for registration.
    pub fn register<U: Registered + ?Sized>(mut self) -> Self {
        self.registrations.push(U::type_descriptor());
        self
    }

    /// Queues a raw descriptor for registration.
    pub fn register_descriptor(mut self, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.registrations.push(descriptor.into());
        self
    }

    /// Makes the codec persistent: `store` restores and persists the registry
    /// under the context's storage location.
    pub fn persistent<S>(mut self, store: S, context: &dyn PersistenceContext) -> Self
    where
        S: RegistryStateStore + 'static,
    {
        self.persistence = Some(Persistence {
            store: Box::new(store),
            location: context.storage_location(),
        });
        self
    }

    /// Opens the codec.
    ///
    /// A persistent codec first restores its registry. A missing artifact is
    /// the expected first-run outcome and yields an empty registry; any other
    /// store failure aborts the open.
    pub fn open(self) -> Result<Codec<T>, CodecError> {
        let registry = TypeRegistry::new();
        let descriptor = T::type_descriptor();

        if let Some(persistence) = &self.persistence {
            match persistence.store.restore(&persistence.location) {
                Ok(state) => {
                    log::info!(
                        "restoring {} type registrations for `{}` from {}",
                        state.len(),
                        descriptor,
                        persistence.location.display()
                    );
                    registry.restore(state)?;
                }
                Err(err) if err.is_no_prior_state() => {
                    log::debug!("{}; starting with an empty registry", err);
                }
                Err(err) => return Err(CodecError::Store(err)),
            }
        }

        for registration in self.registrations {
            registry.register(registration)?;
        }

        Ok(Codec {
            registry,
            descriptor,
            tag: OnceCell::new(),
            config: self.config,
            persistence: self.persistence,
            lifecycle: Mutex::new(CodecState::Ready),
            closed: AtomicBool::new(false),
            #[cfg(feature = "stats")]
            stats: CodecStats::new(),
            _marker: PhantomData,
        })
    }
}

impl<T: Registered> Default for CodecBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
