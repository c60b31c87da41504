//! OpenPGP key and signature machinery for an agent-backed PGP
//! implementation.
//!
//! This crate implements the parts of OpenPGP ([RFC 4880], with the
//! ECC extensions of [RFC 6637]) that hold a key block together: key
//! identity derivation (fingerprint, key ID, keygrip), the packet
//! model and its canonical serialization, the signature builder and
//! verifier for the certification and binding signature classes, and
//! the key block assembler.
//!
//! A deliberate property of this crate is that secret key material
//! never enters the process.  Everything that needs a private key is
//! expressed through the [`crypto::Signer`] trait; the companion
//! `madrone-ipc` crate implements that trait on top of the secret-key
//! agent's line protocol.  Verification, in contrast, is pure and
//! self-contained.
//!
//! Version 3 keys and signatures are understood when parsing and
//! verifying existing material, but cannot be created; all new
//! artifacts are version 4.
//!
//! [RFC 4880]: https://tools.ietf.org/html/rfc4880
//! [RFC 6637]: https://tools.ietf.org/html/rfc6637

#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod fmt;
pub mod crypto;

pub mod packet;

pub mod parse;
pub mod serialize;

pub mod cert;
pub use cert::Cert;

pub mod types;
use crate::types::{
    Curve,
    HashAlgorithm,
    PublicKeyAlgorithm,
    SignatureType,
    Timestamp,
};

mod fingerprint;
mod keyid;
mod keyhandle;
pub use keyhandle::KeyHandle;

pub mod policy;
pub mod query;

/// Crate result specialization.
pub type Result<T> = ::std::result::Result<T, anyhow::Error>;

/// Errors returned by this crate.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A malformed packet.
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Unsupported packet type.
    #[error("Unsupported packet type.  Tag: {0}")]
    UnsupportedPacketType(packet::Tag),

    /// Unsupported packet or signature version.
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u8),

    /// Unsupported hash algorithm identifier.
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(HashAlgorithm),

    /// Unsupported public key algorithm identifier.
    #[error("Unsupported public key algorithm: {0}")]
    UnsupportedPublicKeyAlgorithm(PublicKeyAlgorithm),

    /// Unsupported elliptic curve.
    #[error("Unsupported elliptic curve: {0}")]
    UnsupportedEllipticCurve(Curve),

    /// Unsupported signature type.
    #[error("Unsupported signature type: {0}")]
    UnsupportedSignatureType(SignatureType),

    /// An elliptic curve OID that does not map to a known curve.
    #[error("Unknown curve OID: {0}")]
    UnknownCurve(String),

    /// Public key material is missing or inconsistent with the
    /// algorithm.
    #[error("Bad key material: {0}")]
    BadKeyMaterial(String),

    /// Malformed MPI.
    #[error("Malformed MPI: {0}")]
    MalformedMPI(String),

    /// Bad signature.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// The signature is good, but has expired.
    #[error("Signature expired at {0}")]
    SignatureExpired(Timestamp),

    /// The issuing key has expired.
    #[error("Key expired at {0}")]
    KeyExpired(Timestamp),

    /// The issuing key has been revoked.
    #[error("Key is revoked")]
    KeyRevoked,

    /// A signing-capable subkey is not cross-certified by a valid
    /// back signature.
    #[error("Missing cross certification on signing subkey {0}")]
    MissingCrossCert(String),

    /// A subpacket marked critical is not understood.
    #[error("Unknown critical subpacket: {0}")]
    CriticalSubpacketUnknown(u8),

    /// The signature names an issuer we have no key for.
    #[error("Unknown issuer: {0}")]
    UnknownIssuer(KeyID),

    /// A key claims to have been created in the future.
    #[error("Key was created {claimed}, but it is only {now}")]
    TimeConflict {
        /// The creation time the key claims.
        claimed: Timestamp,
        /// The current time.
        now: Timestamp,
    },

    /// Malformed key block.
    #[error("Malformed keyblock: {0}")]
    MalformedCert(String),

    /// Malformed user ID.
    #[error("Invalid user ID: {0}")]
    InvalidUserID(String),
}

/// The OpenPGP packets this crate understands.
///
/// These are the packet types that occur in a transferable public
/// key.  Everything else that may occur in a packet stream is kept as
/// an [`packet::Unknown`] packet so that a key block round-trips
/// byte for byte.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[non_exhaustive]
pub enum Packet {
    /// Unknown packet.
    Unknown(packet::Unknown),
    /// Signature packet.
    Signature(packet::Signature),
    /// Public key packet.
    PublicKey(packet::Key),
    /// Public subkey packet.
    PublicSubkey(packet::Key),
    /// User ID packet.
    UserID(packet::UserID),
    /// User attribute packet.
    UserAttribute(packet::UserAttribute),
}

impl Packet {
    /// Returns the `Packet's` corresponding OpenPGP tag.
    pub fn tag(&self) -> packet::Tag {
        use crate::packet::Tag;
        match self {
            Packet::Unknown(p) => p.tag(),
            Packet::Signature(_) => Tag::Signature,
            Packet::PublicKey(_) => Tag::PublicKey,
            Packet::PublicSubkey(_) => Tag::PublicSubkey,
            Packet::UserID(_) => Tag::UserID,
            Packet::UserAttribute(_) => Tag::UserAttribute,
        }
    }

    /// Returns the parsed `Packet's` corresponding OpenPGP tag.
    ///
    /// Like [`Packet::tag`], but only if the packet was successfully
    /// parsed into a structured packet type.
    pub fn kind(&self) -> Option<packet::Tag> {
        match self {
            Packet::Unknown(_) => None,
            _ => Some(self.tag()),
        }
    }
}

impl From<packet::Signature> for Packet {
    fn from(s: packet::Signature) -> Self {
        Packet::Signature(s)
    }
}

impl From<packet::UserID> for Packet {
    fn from(u: packet::UserID) -> Self {
        Packet::UserID(u)
    }
}

impl From<packet::UserAttribute> for Packet {
    fn from(u: packet::UserAttribute) -> Self {
        Packet::UserAttribute(u)
    }
}

/// Holds a fingerprint.
///
/// A fingerprint uniquely identifies a public key.  It is the SHA-1
/// hash over a canonical form of the public key packet; see
/// [Section 12.2 of RFC 4880].
///
///   [Section 12.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-12.2
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum Fingerprint {
    /// 20 byte SHA-1 hash.
    V4([u8; 20]),
    /// Used for holding fingerprints that we don't understand.  A
    /// designated-revoker subpacket, for instance, may carry the
    /// wrong number of bytes.
    Invalid(Box<[u8]>),
}

/// Holds a Key ID.
///
/// A Key ID is a fingerprint fragment: the last eight bytes for a v4
/// key.  It identifies a public key, but is easy to forge; security
/// decisions must always be confirmed against the fingerprint.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum KeyID {
    /// Lower 8 bytes of a v4 fingerprint.
    V4([u8; 8]),
    /// Used for holding key IDs that we don't understand.
    Invalid(Box<[u8]>),
}
