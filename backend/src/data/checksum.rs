//! Content fingerprint of the loaded input files.
//!
//! Reported by `/api/health` and `/api/reload` so clients can tell whether
//! the underlying data changed between reloads.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum over a sequence of byte chunks.
///
/// Each chunk is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// produce different fingerprints.
pub fn calculate_checksum<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update((chunk.len() as u64).to_le_bytes());
        hasher.update(chunk);
    }
    hex::encode(hasher.finalize())
}
