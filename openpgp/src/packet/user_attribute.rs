//! User Attribute packets.

use std::fmt;

use once_cell::sync::OnceCell;

/// Holds a UserAttribute packet.
///
/// The body is opaque to this crate; in practice it holds an image.
/// Like a user id, a user attribute is bound to the primary key by
/// certification signatures, and has a RIPEMD-160 name-hash for
/// correlation with external trust records.
///
/// See [Section 5.12 of RFC 4880].
///
///   [Section 5.12 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.12
#[derive(Clone)]
pub struct UserAttribute {
    /// The user attribute.
    value: Vec<u8>,

    namehash: OnceCell<[u8; 20]>,
}

impl PartialEq for UserAttribute {
    fn eq(&self, other: &UserAttribute) -> bool {
        self.value == other.value
    }
}

impl Eq for UserAttribute {}

impl std::hash::Hash for UserAttribute {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for UserAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UserAttribute({} bytes)", self.value.len())
    }
}

impl From<Vec<u8>> for UserAttribute {
    fn from(u: Vec<u8>) -> Self {
        UserAttribute {
            value: u,
            namehash: OnceCell::new(),
        }
    }
}

impl UserAttribute {
    /// Gets the user attribute packet's raw, unparsed value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the RIPEMD-160 hash of the attribute data.
    pub fn namehash(&self) -> &[u8; 20] {
        self.namehash.get_or_init(|| {
            use digest::Digest;
            let mut h = ripemd::Ripemd160::new();
            h.update(&self.value);
            h.finalize().into()
        })
    }
}
