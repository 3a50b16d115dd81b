//! Canonical serialization for deterministic hashing.
//!
//! Used for parameter fingerprints and result-cache keys.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable set order: option sets are `BTreeSet`s
//! - No HashMap allowed in hashed data

use std::io;

use serde::Serialize;
use xxhash_rust::xxh64::Xxh64;

/// `io::Write` sink that feeds an xxh64 state, so values hash without an
/// intermediate buffer.
struct HashWriter(Xxh64);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serialize a value to canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
///
/// Only called on plain data types (no maps with non-string keys), for which
/// `serde_json` serialization cannot fail.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let mut writer = HashWriter(Xxh64::new(0));
    serde_json::to_writer(&mut writer, value).expect("Canonical serialization failed");
    writer.0.digest()
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
