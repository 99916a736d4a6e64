//! Fixed-size payload trait
//!
//! Every record type stored by a [`BlockStore`](super::BlockStore) must
//! occupy a fixed number of bytes so slot offsets can be computed from
//! positions alone. `bincode` with its default configuration (fixed-width
//! integers, little-endian) gives a stable encoding; implementors declare
//! the encoded size and the store enforces it on every write.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A payload with a fixed `bincode` encoding size.
pub trait FixedPayload: Serialize + DeserializeOwned {
    /// Encoded size in bytes under bincode's default (fixed-int, LE) config.
    const SIZE: usize;
}

macro_rules! impl_fixed_payload_int {
    ($($ty:ty),*) => {
        $(
            impl FixedPayload for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();
            }
        )*
    };
}

impl_fixed_payload_int!(i8, i16, i32, i64, u8, u16, u32, u64);

// serde only implements Deserialize for arrays up to length 32, so the
// byte-blob impls are enumerated rather than const-generic.
macro_rules! impl_fixed_payload_bytes {
    ($($len:literal),*) => {
        $(
            /// Fixed-length byte blobs (e.g. padded strings) are valid payloads.
            impl FixedPayload for [u8; $len] {
                const SIZE: usize = $len;
            }
        )*
    };
}

impl_fixed_payload_bytes!(1, 2, 4, 8, 12, 16, 20, 24, 28, 32);
