use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::codec::record_options;
use crate::{
    DecodingError, EncodedRecord, EncodingError, ValueCodec, DEFAULT_MAX_RECORD_SIZE,
};

/// Untagged bincode codec without a type registry.
///
/// Records hold only the bincode payload, so there is nothing to restore or
/// persist and `close` has nothing to do. Suitable for caches whose records
/// never outlive the process and only ever hold one value type.
///
/// # Examples
///
/// ```
/// use serialito_core::{PlainCodec, ValueCodec};
///
/// let codec = PlainCodec::<String>::new();
/// let record = codec.encode(&"banana".to_string()).unwrap();
/// assert_eq!(codec.decode(&record).unwrap(), "banana");
/// ```
#[derive(Debug)]
pub struct PlainCodec<T> {
    max_record_size: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PlainCodec<T> {
    pub fn new() -> Self {
        Self::with_max_record_size(DEFAULT_MAX_RECORD_SIZE)
    }

    pub fn with_max_record_size(max_record_size: u64) -> Self {
        Self {
            max_record_size,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for PlainCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueCodec<T> for PlainCodec<T>
where
    T: Serialize + DeserializeOwned + PartialEq,
{
    fn encode(&self, value: &T) -> Result<EncodedRecord, EncodingError> {
        record_options(self.max_record_size)
            .serialize(value)
            .map(EncodedRecord::from)
            .map_err(EncodingError::Serialize)
    }

    fn decode(&self, record: &[u8]) -> Result<T, DecodingError> {
        record_options(self.max_record_size)
            .deserialize(record)
            .map_err(DecodingError::Malformed)
    }

    fn equals(&self, value: &T, record: &[u8]) -> Result<bool, DecodingError> {
        Ok(self.decode(record)? == *value)
    }
}
