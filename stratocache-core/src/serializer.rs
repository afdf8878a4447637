//! Persistence hooks.
//!
//! The cache never persists anything by itself. [`CacheSerializer`] is the
//! capability an external persistence layer would implement; the three named
//! formats below are declared so callers can select one by name, but none of
//! them is implemented yet and every call returns
//! [`CacheError::Unsupported`].

use crate::{CacheEntry, CacheError, Result};
use std::io::{Read, Write};
use std::marker::PhantomData;

/// Writes cache entries to, and reads them from, a byte stream.
pub trait CacheSerializer<K, V>: Send + Sync {
    fn serialize(&self, entry: &CacheEntry<V>, writer: &mut dyn Write) -> Result<()>;

    fn deserialize(&self, key: &K, reader: &mut dyn Read) -> Result<CacheEntry<V>>;

    /// File extension used for files written by this serializer, without the dot.
    fn file_extension(&self) -> &'static str;
}

macro_rules! unsupported_serializer {
    ($(#[$doc:meta])* $name:ident, $format:literal, $extension:literal) => {
        $(#[$doc])*
        pub struct $name<K, V> {
            _marker: PhantomData<fn(K, V)>,
        }

        impl<K, V> $name<K, V> {
            pub fn new() -> Self {
                Self {
                    _marker: PhantomData,
                }
            }
        }

        impl<K, V> Default for $name<K, V> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K, V> std::fmt::Debug for $name<K, V> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(stringify!($name))
            }
        }

        impl<K, V> CacheSerializer<K, V> for $name<K, V> {
            fn serialize(&self, _entry: &CacheEntry<V>, _writer: &mut dyn Write) -> Result<()> {
                Err(CacheError::Unsupported(concat!($format, " serialization")))
            }

            fn deserialize(&self, _key: &K, _reader: &mut dyn Read) -> Result<CacheEntry<V>> {
                Err(CacheError::Unsupported(concat!($format, " deserialization")))
            }

            fn file_extension(&self) -> &'static str {
                $extension
            }
        }
    };
}

unsupported_serializer!(
    /// Native binary format.
    BinarySerializer,
    "binary",
    "ser"
);

unsupported_serializer!(
    /// JSON format.
    JsonSerializer,
    "json",
    "json"
);

unsupported_serializer!(
    /// Protocol Buffers format.
    ProtobufSerializer,
    "protobuf",
    "proto"
);
