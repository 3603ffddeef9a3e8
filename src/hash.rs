//! Content addressing primitives
//!
//! A [`Digest`] is the address of a commit: the hex-encoded SHA-256 of an
//! ordered sequence of fields. [`FieldHasher`] frames every field with a
//! presence tag and a length prefix before feeding it to SHA-256, so that
//! `("ab", "c")` and `("a", "bc")` hash differently and reordering fields
//! changes the result.
//!
//! ## Examples
//!
//! ```rust
//! use sprig::hash::{Digest, FieldHasher};
//!
//! let a = FieldHasher::new().field("parent").field("message").finish();
//! let b = FieldHasher::new().field("message").field("parent").finish();
//! assert_ne!(a, b);
//! assert_eq!(a.as_str().len(), Digest::HEX_LEN);
//! ```

use crate::error::{Result, SprigError};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Tag written before an absent optional field
const TAG_ABSENT: u8 = 0;
/// Tag written before a present field
const TAG_PRESENT: u8 = 1;

/// Fixed-width identifier of a commit
///
/// Always 64 lowercase hexadecimal characters. Construction from untrusted
/// input goes through [`FromStr`] (or serde), which validates the format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Length of the hex form
    pub const HEX_LEN: usize = 64;

    /// Full hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for display
    pub fn short(&self) -> &str {
        &self.0[..8]
    }

    /// Split into the shard prefix and the remainder
    pub(crate) fn shard(&self) -> (&str, &str) {
        self.0.split_at(2)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Digest {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self> {
        let well_formed = s.len() == Self::HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Digest(s.to_string()))
        } else {
            Err(SprigError::InvalidDigest(s.to_string()))
        }
    }
}

impl TryFrom<String> for Digest {
    type Error = SprigError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

/// Incremental digest over an ordered sequence of framed fields
///
/// Each field is written as `tag ‖ len (u64, big-endian) ‖ bytes`. An absent
/// optional field is written as a lone `0` tag.
#[derive(Clone, Default)]
pub struct FieldHasher {
    inner: Sha256,
}

impl FieldHasher {
    /// Start an empty field sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a present field
    pub fn field(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.push(bytes.as_ref());
        self
    }

    /// Append an optional field; `None` hashes differently from every `Some`
    pub fn optional_field<B: AsRef<[u8]>>(mut self, bytes: Option<B>) -> Self {
        match bytes {
            Some(bytes) => self.push(bytes.as_ref()),
            None => self.inner.update([TAG_ABSENT]),
        }
        self
    }

    /// Consume the hasher and produce the digest
    pub fn finish(self) -> Digest {
        Digest(hex::encode(self.inner.finalize()))
    }

    fn push(&mut self, bytes: &[u8]) {
        self.inner.update([TAG_PRESENT]);
        self.inner.update((bytes.len() as u64).to_be_bytes());
        self.inner.update(bytes);
    }
}

/// Digest an ordered sequence of fields in one call
pub fn digest_fields<I, B>(fields: I) -> Digest
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    fields
        .into_iter()
        .fold(FieldHasher::new(), |hasher, field| hasher.field(field))
        .finish()
}

/// Frame a single field the way [`FieldHasher`] does
///
/// Used to build composite canonical forms (a snapshot's path and content)
/// that are themselves hashed as one field.
pub fn frame(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(TAG_PRESENT);
    out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
}
