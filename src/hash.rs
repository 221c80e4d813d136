//! Fixed-size content hashes used to address messages and assemblies.
//!
//! Every frame carries two hashes: the hex-rendered hash of the whole
//! application message and the raw [`Hash`] of the bytes that were split,
//! which keys the reassembly table.

use std::fmt;

use bincode::{Decode, Encode};
use sha2::{Digest, Sha256};

/// Number of bytes in a [`Hash`].
pub const HASH_LEN: usize = 32;

/// A 32-byte SHA-256 digest.
///
/// # Examples
///
/// ```
/// use wirebridge::hash::Hash;
/// let hash = Hash::digest(b"abc");
/// assert_eq!(
///     hash.to_hex(),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self { Self(bytes) }

    /// Hash `data` with SHA-256.
    #[must_use]
    pub fn digest(data: impl AsRef<[u8]>) -> Self { Self(Sha256::digest(data.as_ref()).into()) }

    /// Hash several byte slices as if they were concatenated.
    #[must_use]
    pub fn digest_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Borrow the digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_LEN] { &self.0 }

    /// Render the digest as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self { Self(bytes) }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Hash {
    // Six bytes are enough to tell assemblies apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(&self.0[..6]))
    }
}

#[cfg(test)]
mod tests {
    use super::Hash;

    #[test]
    fn digest_parts_matches_digest_of_concatenation() {
        let whole = Hash::digest(b"headerbody");
        let parts = Hash::digest_parts([b"header".as_slice(), b"body".as_slice()]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn display_renders_full_hex() {
        let hash = Hash::new([0xab; 32]);
        assert_eq!(hash.to_string(), "ab".repeat(32));
        assert_eq!(format!("{hash:?}"), "Hash(abababababab)");
    }
}
