// crates/release-evidence-core/src/core/hashing.rs
// ============================================================================
// Module: Release Evidence Content Hashing
// Description: SHA-256 digests and declared-hash comparison for evidence bytes.
// Purpose: Provide the integrity primitive for manifests, inventories, and artifacts.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Every artifact in a release bundle is verified by hashing its raw bytes and
//! comparing the digest with the hex string declared by the manifest or the
//! inventory. Digests are always rendered as lowercase hex.
//!
//! Security posture: declared hashes come from untrusted documents; comparison
//! never panics on malformed input and simply reports a mismatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for release evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the canonical label for the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// Default hash algorithm for release evidence.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw digest bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// Returns true when the declared hex digest names this digest.
    ///
    /// The comparison ignores ASCII case and surrounding whitespace in the
    /// declared value. An empty declared value never matches.
    #[must_use]
    pub fn matches_declared(&self, declared: &str) -> bool {
        self.value.eq_ignore_ascii_case(declared.trim())
    }
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
