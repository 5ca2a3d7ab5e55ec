//! Hashing utilities for change detection.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash
//! - `hash_invocation()`: Order-sensitive hashing of a tool invocation

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A full 64-character SHA256 hash.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash an ordered sequence of arguments.
///
/// Each argument is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// produce different hashes. Order is significant.
pub fn hash_invocation<S: AsRef<str>>(args: &[S]) -> ContentHash {
  let mut hasher = Sha256::new();
  for arg in args {
    let arg = arg.as_ref();
    hasher.update((arg.len() as u64).to_le_bytes());
    hasher.update(arg.as_bytes());
  }
  ContentHash(hex::encode(hasher.finalize()))
}
