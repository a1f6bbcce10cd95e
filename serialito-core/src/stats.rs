use std::sync::atomic::{AtomicU64, Ordering};

/// Codec statistics for monitoring encode/decode traffic and failures.
///
/// This structure tracks codec activity using atomic operations for
/// thread-safe statistics collection with minimal overhead.
///
/// # Thread Safety
///
/// All operations are thread-safe using atomic operations with `Relaxed` ordering,
/// which provides the best performance while still maintaining consistency.
///
/// # Examples
///
/// ```
/// use serialito_core::CodecStats;
///
/// let stats = CodecStats::new();
///
/// // Simulate codec operations
/// stats.record_encode(12);
/// stats.record_encode(30);
/// stats.record_decode();
/// stats.record_decode_failure();
///
/// assert_eq!(stats.encodes(), 2);
/// assert_eq!(stats.bytes_encoded(), 42);
/// assert_eq!(stats.decodes(), 1);
/// assert!((stats.decode_failure_rate() - 0.5).abs() < 0.001);
/// ```
#[derive(Debug)]
pub struct CodecStats {
    encodes: AtomicU64,
    encode_failures: AtomicU64,
    decodes: AtomicU64,
    decode_failures: AtomicU64,
    bytes_encoded: AtomicU64,
}

impl CodecStats {
    /// Creates a new `CodecStats` instance with zero counters.
    pub fn new() -> Self {
        Self {
            encodes: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            decodes: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
        }
    }

    /// Records a successful encode producing `len` bytes.
    #[inline]
    pub fn record_encode(&self, len: usize) {
        self.encodes.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Records a failed encode.
    #[inline]
    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful decode.
    #[inline]
    pub fn record_decode(&self) {
        self.decodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed decode.
    ///
    /// A failed decode only concerns the record at hand; the counter exists so
    /// a cache can notice unreadable entries piling up.
    #[inline]
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of successful encodes.
    #[inline]
    pub fn encodes(&self) -> u64 {
        self.encodes.load(Ordering::Relaxed)
    }

    /// Returns the number of failed encodes.
    #[inline]
    pub fn encode_failures(&self) -> u64 {
        self.encode_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of successful decodes.
    #[inline]
    pub fn decodes(&self) -> u64 {
        self.decodes.load(Ordering::Relaxed)
    }

    /// Returns the number of failed decodes.
    #[inline]
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Returns the total size of all successfully encoded records, in bytes.
    #[inline]
    pub fn bytes_encoded(&self) -> u64 {
        self.bytes_encoded.load(Ordering::Relaxed)
    }

    /// Calculates the fraction of decode attempts that failed (0.0 to 1.0).
    ///
    /// Returns 0.0 if there have been no decode attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use serialito_core::CodecStats;
    ///
    /// let stats = CodecStats::new();
    /// assert_eq!(stats.decode_failure_rate(), 0.0);
    ///
    /// stats.record_decode();
    /// stats.record_decode();
    /// stats.record_decode();
    /// stats.record_decode_failure();
    /// assert!((stats.decode_failure_rate() - 0.25).abs() < 0.001);
    /// ```
    #[inline]
    pub fn decode_failure_rate(&self) -> f64 {
        let failures = self.decode_failures();
        let total = self.decodes() + failures;
        if total == 0 {
            0.0
        } else {
            failures as f64 / total as f64
        }
    }

    /// Resets all statistics counters to zero.
    pub fn reset(&self) {
        self.encodes.store(0, Ordering::Relaxed);
        self.encode_failures.store(0, Ordering::Relaxed);
        self.decodes.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
        self.bytes_encoded.store(0, Ordering::Relaxed);
    }
}

impl Default for CodecStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CodecStats {
    fn clone(&self) -> Self {
        Self {
            encodes: AtomicU64::new(self.encodes()),
            encode_failures: AtomicU64::new(self.encode_failures()),
            decodes: AtomicU64::new(self.decodes()),
            decode_failures: AtomicU64::new(self.decode_failures()),
            bytes_encoded: AtomicU64::new(self.bytes_encoded()),
        }
    }
}
