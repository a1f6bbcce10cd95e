use serde::Deserialize;

/// How a codec treats a value type missing from its registry.
///
/// # Variants
///
/// * `Explicit` - **Explicit registration** (default)
///   - Types must be registered before the first encode
///   - Encoding an unregistered type fails with `EncodingError::UnregisteredType`
///   - Identifier order is fully decided by the caller
///
/// * `OnDemand` - **Register on first encode**
///   - The first encode of an unseen type allocates its identifier
///   - Identifier order follows encode order, which is only stable across
///     restarts when the registry state is persisted
///
/// # Examples
///
/// ```
/// use serialito_core::RegistrationPolicy;
///
/// assert_eq!(RegistrationPolicy::default(), RegistrationPolicy::Explicit);
///
/// let policy: RegistrationPolicy = "on_demand".into();
/// assert_eq!(policy, RegistrationPolicy::OnDemand);
///
/// let unknown: RegistrationPolicy = "lazy".into();
/// assert_eq!(unknown, RegistrationPolicy::Explicit); // defaults to Explicit
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    #[default]
    Explicit,
    OnDemand,
}

/// Converts a string slice to a `RegistrationPolicy`.
///
/// The conversion is case-insensitive and defaults to `Explicit` for
/// unrecognized values.
///
/// # Supported Values
///
/// - `"explicit"` → `RegistrationPolicy::Explicit`
/// - `"on_demand"`, `"on-demand"` or `"ondemand"` → `RegistrationPolicy::OnDemand`
/// - Any other value → `RegistrationPolicy::Explicit` (default)
impl From<&str> for RegistrationPolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "on_demand" | "on-demand" | "ondemand" => RegistrationPolicy::OnDemand,
            _ => RegistrationPolicy::Explicit,
        }
    }
}

/// What `close` does when persisting the registry fails.
///
/// * `Fatal` - the failure is returned and the codec stays in `Closing`;
///   calling `close` again retries the persist (default)
/// * `Ignore` - the failure is logged and the codec closes anyway, losing the
///   registry state; only safe for caches whose records do not outlive the process
///
/// # Examples
///
/// ```
/// use serialito_core::PersistFailurePolicy;
///
/// let policy: PersistFailurePolicy = "IGNORE".into();
/// assert_eq!(policy, PersistFailurePolicy::Ignore);
/// assert_eq!(PersistFailurePolicy::default(), PersistFailurePolicy::Fatal);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistFailurePolicy {
    #[default]
    Fatal,
    Ignore,
}

impl From<&str> for PersistFailurePolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ignore" => PersistFailurePolicy::Ignore,
            _ => PersistFailurePolicy::Fatal,
        }
    }
}

/// Default upper bound for a single encoded record, in bytes (16 MiB).
pub const DEFAULT_MAX_RECORD_SIZE: u64 = 16 * 1024 * 1024;

/// Codec configuration.
///
/// # Fields
///
/// * `registration` - Handling of value types missing from the registry
/// * `max_record_size` - Size limit applied to both encoding and decoding;
///   a corrupt length prefix inside a record cannot trigger a larger allocation
/// * `persist_failure` - Handling of persist failures during `close`
///
/// Deserializable, so it can be embedded in an application's own config file:
///
/// ```
/// use serialito_core::{CodecConfig, RegistrationPolicy};
///
/// let config = CodecConfig::default()
///     .with_registration(RegistrationPolicy::OnDemand)
///     .with_max_record_size(4096);
///
/// assert_eq!(config.registration, RegistrationPolicy::OnDemand);
/// assert_eq!(config.max_record_size, 4096);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub registration: RegistrationPolicy,
    pub max_record_size: u64,
    pub persist_failure: PersistFailurePolicy,
}

impl CodecConfig {
    pub fn with_registration(mut self, registration: RegistrationPolicy) -> Self {
        self.registration = registration;
        self
    }

    pub fn with_max_record_size(mut self, max_record_size: u64) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    pub fn with_persist_failure(mut self, persist_failure: PersistFailurePolicy) -> Self {
        self.persist_failure = persist_failure;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            registration: RegistrationPolicy::Explicit,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            persist_failure: PersistFailurePolicy::Fatal,
        }
    }
}
