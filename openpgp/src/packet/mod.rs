//! Packet-related types.
//!
//! OpenPGP data is structured as a sequence of packets.  This crate
//! deals with the packets that make up a transferable public key:
//! public key and subkey packets, user ID and user attribute
//! packets, and signature packets.  Anything else survives as an
//! [`Unknown`] packet so key blocks round-trip bit for bit.

use std::fmt;

mod key;
pub use key::Key;
mod userid;
pub use userid::UserID;
mod user_attribute;
pub use user_attribute::UserAttribute;
pub mod signature;
pub use signature::Signature;
pub use signature::SignatureBuilder;

/// The OpenPGP packet tags as defined in [Section 4.3 of RFC 4880].
///
///   [Section 4.3 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.3
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Tag {
    /// Signature Packet.
    Signature,
    /// Public-Key Packet.
    PublicKey,
    /// User ID Packet.
    UserID,
    /// Public-Subkey Packet.
    PublicSubkey,
    /// User Attribute Packet.
    UserAttribute,
    /// Unassigned packets (as of RFC4880).
    Unknown(u8),
    /// Experimental packets.
    Private(u8),
}

impl From<u8> for Tag {
    fn from(u: u8) -> Self {
        match u {
            2 => Tag::Signature,
            6 => Tag::PublicKey,
            13 => Tag::UserID,
            14 => Tag::PublicSubkey,
            17 => Tag::UserAttribute,
            60..=63 => Tag::Private(u),
            u => Tag::Unknown(u),
        }
    }
}

impl From<Tag> for u8 {
    fn from(t: Tag) -> u8 {
        match t {
            Tag::Signature => 2,
            Tag::PublicKey => 6,
            Tag::UserID => 13,
            Tag::PublicSubkey => 14,
            Tag::UserAttribute => 17,
            Tag::Unknown(u) => u,
            Tag::Private(u) => u,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tag::Signature => f.write_str("Signature Packet"),
            Tag::PublicKey => f.write_str("Public-Key Packet"),
            Tag::UserID => f.write_str("User ID Packet"),
            Tag::PublicSubkey => f.write_str("Public-Subkey Packet"),
            Tag::UserAttribute => f.write_str("User Attribute Packet"),
            Tag::Unknown(u) =>
                f.write_fmt(format_args!("Unknown Packet (tag {})", u)),
            Tag::Private(u) =>
                f.write_fmt(format_args!("Private Packet (tag {})", u)),
        }
    }
}

/// Holds an unknown packet.
///
/// This is used by the parser to hold packets that it does not
/// understand, or that carry an unsupported version.  The body is
/// kept verbatim so that re-serializing reproduces the input.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Unknown {
    tag: Tag,
    body: Vec<u8>,
}

impl Unknown {
    /// Returns a new `Unknown` packet.
    pub fn new(tag: Tag, body: Vec<u8>) -> Self {
        Unknown { tag, body }
    }

    /// Gets the unknown packet's tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Gets a reference to the unknown packet's body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Debug for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Unknown")
            .field("tag", &self.tag)
            .field("body", &format!("{} bytes", self.body.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip() {
        for i in 0..=255u8 {
            let t = Tag::from(i);
            assert_eq!(u8::from(t), i);
        }
    }
}
