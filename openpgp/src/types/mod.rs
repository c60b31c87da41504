//! Primitive types.
//!
//! This module provides the enumerations and bit fields used
//! throughout the crate: the public key, symmetric, hash, and
//! compression algorithm identifiers, signature types, elliptic
//! curves, key flags, and timestamps.  All of them are closed tagged
//! unions with an `Unknown` escape hatch so that foreign material
//! round-trips unchanged.

use std::fmt;

use crate::Error;
use crate::Fingerprint;
use crate::Result;

mod bitfields;
pub use bitfields::{Features, KeyFlags, KeyServerPreferences};
mod curve;
pub use curve::Curve;
mod timestamp;
pub use timestamp::{Duration, Timestamp};

/// The OpenPGP public key algorithms as defined in [Section 9.1 of
/// RFC 4880], and [Section 5 of RFC 6637].
///
///   [Section 9.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-9.1
///   [Section 5 of RFC 6637]: https://tools.ietf.org/html/rfc6637
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum PublicKeyAlgorithm {
    /// RSA (Encrypt or Sign)
    RSAEncryptSign,
    /// RSA Encrypt-Only, deprecated in RFC 4880.
    RSAEncrypt,
    /// RSA Sign-Only, deprecated in RFC 4880.
    RSASign,
    /// Elgamal (Encrypt-Only)
    ElGamalEncrypt,
    /// DSA (Digital Signature Algorithm)
    DSA,
    /// Elliptic curve DH
    ECDH,
    /// Elliptic curve DSA
    ECDSA,
    /// Elgamal (Encrypt or Sign), deprecated in RFC 4880.
    ElGamalEncryptSign,
    /// "Twisted" Edwards curve DSA
    EdDSA,
    /// Private algorithm identifier.
    Private(u8),
    /// Unknown algorithm identifier.
    Unknown(u8),
}

impl PublicKeyAlgorithm {
    /// Returns true if the algorithm can sign data.
    pub fn for_signing(&self) -> bool {
        use self::PublicKeyAlgorithm::*;
        matches!(self, RSAEncryptSign | RSASign | DSA | ECDSA | EdDSA
                 | ElGamalEncryptSign)
    }

    /// Returns true if the algorithm can encrypt data.
    pub fn for_encryption(&self) -> bool {
        use self::PublicKeyAlgorithm::*;
        matches!(self, RSAEncryptSign | RSAEncrypt | ElGamalEncrypt | ECDH
                 | ElGamalEncryptSign)
    }

    /// Returns whether this algorithm is supported by the
    /// verification backend.
    pub fn is_supported(&self) -> bool {
        use self::PublicKeyAlgorithm::*;
        matches!(self, RSAEncryptSign | RSAEncrypt | RSASign | DSA | ECDH
                 | ECDSA | EdDSA)
    }

    /// Returns the one-letter code used in key listings.
    ///
    /// `R` for RSA, `D` for DSA, `g` for an encryption-only Elgamal
    /// key, `E` for ECDSA and EdDSA, `e` for ECDH, `?` for everything
    /// else.
    pub fn letter(&self) -> char {
        use self::PublicKeyAlgorithm::*;
        match self {
            RSAEncryptSign => 'R',
            RSAEncrypt => 'r',
            RSASign => 's',
            ElGamalEncrypt => 'g',
            ElGamalEncryptSign => 'G',
            DSA => 'D',
            ECDH => 'e',
            ECDSA => 'E',
            EdDSA => 'E',
            _ => '?',
        }
    }
}

impl From<u8> for PublicKeyAlgorithm {
    fn from(u: u8) -> Self {
        use self::PublicKeyAlgorithm::*;
        match u {
            1 => RSAEncryptSign,
            2 => RSAEncrypt,
            3 => RSASign,
            16 => ElGamalEncrypt,
            17 => DSA,
            18 => ECDH,
            19 => ECDSA,
            20 => ElGamalEncryptSign,
            22 => EdDSA,
            100..=110 => Private(u),
            u => Unknown(u),
        }
    }
}

impl From<PublicKeyAlgorithm> for u8 {
    fn from(p: PublicKeyAlgorithm) -> u8 {
        use self::PublicKeyAlgorithm::*;
        match p {
            RSAEncryptSign => 1,
            RSAEncrypt => 2,
            RSASign => 3,
            ElGamalEncrypt => 16,
            DSA => 17,
            ECDH => 18,
            ECDSA => 19,
            ElGamalEncryptSign => 20,
            EdDSA => 22,
            Private(u) => u,
            Unknown(u) => u,
        }
    }
}

impl fmt::Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::PublicKeyAlgorithm::*;
        match self {
            RSAEncryptSign => f.write_str("RSA (Encrypt or Sign)"),
            RSAEncrypt => f.write_str("RSA Encrypt-Only"),
            RSASign => f.write_str("RSA Sign-Only"),
            ElGamalEncrypt => f.write_str("Elgamal (Encrypt-Only)"),
            DSA => f.write_str("DSA (Digital Signature Algorithm)"),
            ECDSA => f.write_str("ECDSA public key algorithm"),
            ElGamalEncryptSign => f.write_str("Elgamal (Encrypt or Sign)"),
            ECDH => f.write_str("ECDH public key algorithm"),
            EdDSA => f.write_str("EdDSA Edwards-curve Digital Signature Algorithm"),
            Private(u) =>
                f.write_fmt(format_args!("Private/Experimental public key algorithm {}", u)),
            Unknown(u) =>
                f.write_fmt(format_args!("Unknown public key algorithm {}", u)),
        }
    }
}

/// The OpenPGP symmetric algorithms as defined in [Section 9.2 of RFC
/// 4880].
///
///   [Section 9.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-9.2
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum SymmetricAlgorithm {
    /// Null encryption.
    Unencrypted,
    /// IDEA block cipher.
    IDEA,
    /// 3-DES in EDE configuration.
    TripleDES,
    /// CAST5/CAST128 block cipher.
    CAST5,
    /// Schneier et.al. Blowfish block cipher.
    Blowfish,
    /// 10-round AES.
    AES128,
    /// 12-round AES.
    AES192,
    /// 14-round AES.
    AES256,
    /// Twofish block cipher.
    Twofish,
    /// 18 rounds of NESSIEs Camellia.
    Camellia128,
    /// 24 rounds of NESSIEs Camellia w/192 bit keys.
    Camellia192,
    /// 24 rounds of NESSIEs Camellia w/256 bit keys.
    Camellia256,
    /// Private algorithm identifier.
    Private(u8),
    /// Unknown algorithm identifier.
    Unknown(u8),
}

impl SymmetricAlgorithm {
    /// Returns whether this algorithm is available for use in
    /// preference lists.
    pub fn is_supported(&self) -> bool {
        use self::SymmetricAlgorithm::*;
        matches!(self, TripleDES | AES128 | AES192 | AES256)
    }

    /// Returns the name used in preference strings, e.g. `AES256`.
    pub fn name(&self) -> String {
        use self::SymmetricAlgorithm::*;
        match self {
            Unencrypted => "Unencrypted".into(),
            IDEA => "IDEA".into(),
            TripleDES => "3DES".into(),
            CAST5 => "CAST5".into(),
            Blowfish => "BLOWFISH".into(),
            AES128 => "AES".into(),
            AES192 => "AES192".into(),
            AES256 => "AES256".into(),
            Twofish => "TWOFISH".into(),
            Camellia128 => "CAMELLIA128".into(),
            Camellia192 => "CAMELLIA192".into(),
            Camellia256 => "CAMELLIA256".into(),
            Private(u) | Unknown(u) => format!("S{}", u),
        }
    }
}

impl From<u8> for SymmetricAlgorithm {
    fn from(u: u8) -> Self {
        use self::SymmetricAlgorithm::*;
        match u {
            0 => Unencrypted,
            1 => IDEA,
            2 => TripleDES,
            3 => CAST5,
            4 => Blowfish,
            7 => AES128,
            8 => AES192,
            9 => AES256,
            10 => Twofish,
            11 => Camellia128,
            12 => Camellia192,
            13 => Camellia256,
            100..=110 => Private(u),
            u => Unknown(u),
        }
    }
}

impl From<SymmetricAlgorithm> for u8 {
    fn from(s: SymmetricAlgorithm) -> u8 {
        use self::SymmetricAlgorithm::*;
        match s {
            Unencrypted => 0,
            IDEA => 1,
            TripleDES => 2,
            CAST5 => 3,
            Blowfish => 4,
            AES128 => 7,
            AES192 => 8,
            AES256 => 9,
            Twofish => 10,
            Camellia128 => 11,
            Camellia192 => 12,
            Camellia256 => 13,
            Private(u) => u,
            Unknown(u) => u,
        }
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The OpenPGP hash algorithms as defined in [Section 9.4 of RFC 4880].
///
///   [Section 9.4 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-9.4
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum HashAlgorithm {
    /// Rivest et.al. message digest 5.
    MD5,
    /// NIST Secure Hash Algorithm (deprecated)
    SHA1,
    /// RIPEMD-160
    RipeMD,
    /// 256-bit version of SHA2
    SHA256,
    /// 384-bit version of SHA2
    SHA384,
    /// 512-bit version of SHA2
    SHA512,
    /// 224-bit version of SHA2
    SHA224,
    /// Private hash algorithm identifier.
    Private(u8),
    /// Unknown hash algorithm identifier.
    Unknown(u8),
}

impl HashAlgorithm {
    /// Returns the name used in preference strings, e.g. `SHA256`.
    pub fn name(&self) -> String {
        use self::HashAlgorithm::*;
        match self {
            MD5 => "MD5".into(),
            SHA1 => "SHA1".into(),
            RipeMD => "RIPEMD160".into(),
            SHA256 => "SHA256".into(),
            SHA384 => "SHA384".into(),
            SHA512 => "SHA512".into(),
            SHA224 => "SHA224".into(),
            Private(u) | Unknown(u) => format!("H{}", u),
        }
    }
}

impl From<u8> for HashAlgorithm {
    fn from(u: u8) -> Self {
        use self::HashAlgorithm::*;
        match u {
            1 => MD5,
            2 => SHA1,
            3 => RipeMD,
            8 => SHA256,
            9 => SHA384,
            10 => SHA512,
            11 => SHA224,
            100..=110 => Private(u),
            u => Unknown(u),
        }
    }
}

impl From<HashAlgorithm> for u8 {
    fn from(h: HashAlgorithm) -> u8 {
        use self::HashAlgorithm::*;
        match h {
            MD5 => 1,
            SHA1 => 2,
            RipeMD => 3,
            SHA256 => 8,
            SHA384 => 9,
            SHA512 => 10,
            SHA224 => 11,
            Private(u) => u,
            Unknown(u) => u,
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        if s.eq_ignore_ascii_case("MD5") {
            Ok(HashAlgorithm::MD5)
        } else if s.eq_ignore_ascii_case("SHA1") {
            Ok(HashAlgorithm::SHA1)
        } else if s.eq_ignore_ascii_case("RIPEMD160") {
            Ok(HashAlgorithm::RipeMD)
        } else if s.eq_ignore_ascii_case("SHA256") {
            Ok(HashAlgorithm::SHA256)
        } else if s.eq_ignore_ascii_case("SHA384") {
            Ok(HashAlgorithm::SHA384)
        } else if s.eq_ignore_ascii_case("SHA512") {
            Ok(HashAlgorithm::SHA512)
        } else if s.eq_ignore_ascii_case("SHA224") {
            Ok(HashAlgorithm::SHA224)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The OpenPGP compression algorithms as defined in [Section 9.3 of RFC 4880].
///
///   [Section 9.3 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-9.3
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum CompressionAlgorithm {
    /// Null compression.
    Uncompressed,
    /// DEFLATE.
    Zip,
    /// ZLIB.
    Zlib,
    /// bzip2.
    BZip2,
    /// Private compression algorithm identifier.
    Private(u8),
    /// Unknown compression algorithm identifier.
    Unknown(u8),
}

impl CompressionAlgorithm {
    /// Returns whether this algorithm is available for use in
    /// preference lists.
    pub fn is_supported(&self) -> bool {
        use self::CompressionAlgorithm::*;
        matches!(self, Uncompressed | Zip | Zlib | BZip2)
    }

    /// Returns the name used in preference strings, e.g. `ZLIB`.
    pub fn name(&self) -> String {
        use self::CompressionAlgorithm::*;
        match self {
            Uncompressed => "Uncompressed".into(),
            Zip => "ZIP".into(),
            Zlib => "ZLIB".into(),
            BZip2 => "BZIP2".into(),
            Private(u) | Unknown(u) => format!("Z{}", u),
        }
    }
}

impl From<u8> for CompressionAlgorithm {
    fn from(u: u8) -> Self {
        use self::CompressionAlgorithm::*;
        match u {
            0 => Uncompressed,
            1 => Zip,
            2 => Zlib,
            3 => BZip2,
            100..=110 => Private(u),
            u => Unknown(u),
        }
    }
}

impl From<CompressionAlgorithm> for u8 {
    fn from(c: CompressionAlgorithm) -> u8 {
        use self::CompressionAlgorithm::*;
        match c {
            Uncompressed => 0,
            Zip => 1,
            Zlib => 2,
            BZip2 => 3,
            Private(u) => u,
            Unknown(u) => u,
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The OpenPGP signature types as defined in [Section 5.2.1 of RFC
/// 4880].
///
///   [Section 5.2.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.1
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum SignatureType {
    /// Signature over a binary document.
    Binary,
    /// Signature over a canonical text document.
    Text,
    /// Standalone signature.
    Standalone,

    /// Generic certification of a User ID and Public Key packet.
    GenericCertification,
    /// Persona certification of a User ID and Public Key packet.
    PersonaCertification,
    /// Casual certification of a User ID and Public Key packet.
    CasualCertification,
    /// Positive certification of a User ID and Public Key packet.
    PositiveCertification,

    /// Subkey Binding Signature
    SubkeyBinding,
    /// Primary Key Binding Signature
    PrimaryKeyBinding,
    /// Signature directly on a key
    DirectKey,

    /// Key revocation signature
    KeyRevocation,
    /// Subkey revocation signature
    SubkeyRevocation,
    /// Certification revocation signature
    CertificationRevocation,

    /// Timestamp signature.
    Timestamp,
    /// Third-Party Confirmation signature.
    Confirmation,

    /// Unknown signature type.
    Unknown(u8),
}

impl SignatureType {
    /// Returns whether this is a certification over a user id
    /// (classes 0x10 through 0x13).
    pub fn is_certification(&self) -> bool {
        use self::SignatureType::*;
        matches!(self, GenericCertification | PersonaCertification
                 | CasualCertification | PositiveCertification)
    }
}

impl From<u8> for SignatureType {
    fn from(u: u8) -> Self {
        use self::SignatureType::*;
        match u {
            0x00 => Binary,
            0x01 => Text,
            0x02 => Standalone,
            0x10 => GenericCertification,
            0x11 => PersonaCertification,
            0x12 => CasualCertification,
            0x13 => PositiveCertification,
            0x18 => SubkeyBinding,
            0x19 => PrimaryKeyBinding,
            0x1f => DirectKey,
            0x20 => KeyRevocation,
            0x28 => SubkeyRevocation,
            0x30 => CertificationRevocation,
            0x40 => Timestamp,
            0x50 => Confirmation,
            u => Unknown(u),
        }
    }
}

impl From<SignatureType> for u8 {
    fn from(t: SignatureType) -> Self {
        use self::SignatureType::*;
        match t {
            Binary => 0x00,
            Text => 0x01,
            Standalone => 0x02,
            GenericCertification => 0x10,
            PersonaCertification => 0x11,
            CasualCertification => 0x12,
            PositiveCertification => 0x13,
            SubkeyBinding => 0x18,
            PrimaryKeyBinding => 0x19,
            DirectKey => 0x1f,
            KeyRevocation => 0x20,
            SubkeyRevocation => 0x28,
            CertificationRevocation => 0x30,
            Timestamp => 0x40,
            Confirmation => 0x50,
            Unknown(u) => u,
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::SignatureType::*;
        match self {
            Binary => f.write_str("Binary"),
            Text => f.write_str("Text"),
            Standalone => f.write_str("Standalone"),
            GenericCertification => f.write_str("GenericCertification"),
            PersonaCertification => f.write_str("PersonaCertification"),
            CasualCertification => f.write_str("CasualCertification"),
            PositiveCertification => f.write_str("PositiveCertification"),
            SubkeyBinding => f.write_str("SubkeyBinding"),
            PrimaryKeyBinding => f.write_str("PrimaryKeyBinding"),
            DirectKey => f.write_str("DirectKey"),
            KeyRevocation => f.write_str("KeyRevocation"),
            SubkeyRevocation => f.write_str("SubkeyRevocation"),
            CertificationRevocation => f.write_str("CertificationRevocation"),
            Timestamp => f.write_str("Timestamp"),
            Confirmation => f.write_str("Confirmation"),
            Unknown(u) =>
                f.write_fmt(format_args!("Unknown signature type 0x{:x}", u)),
        }
    }
}

/// Describes the reason for a revocation.
///
/// See the description of revocation subpackets [Section 5.2.3.23 of
/// RFC 4880].
///
///   [Section 5.2.3.23 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.23
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ReasonForRevocation {
    /// No reason specified (key revocations or cert revocations)
    Unspecified,
    /// Key is superseded (key revocations)
    KeySuperseded,
    /// Key material has been compromised (key revocations)
    KeyCompromised,
    /// Key is retired and no longer used (key revocations)
    KeyRetired,
    /// User ID information is no longer valid (cert revocations)
    UIDRetired,
    /// Private reason identifier.
    Private(u8),
    /// Unknown reason identifier.
    Unknown(u8),
}

impl From<u8> for ReasonForRevocation {
    fn from(u: u8) -> Self {
        use self::ReasonForRevocation::*;
        match u {
            0 => Unspecified,
            1 => KeySuperseded,
            2 => KeyCompromised,
            3 => KeyRetired,
            32 => UIDRetired,
            100..=110 => Private(u),
            u => Unknown(u),
        }
    }
}

impl From<ReasonForRevocation> for u8 {
    fn from(r: ReasonForRevocation) -> u8 {
        use self::ReasonForRevocation::*;
        match r {
            Unspecified => 0,
            KeySuperseded => 1,
            KeyCompromised => 2,
            KeyRetired => 3,
            UIDRetired => 32,
            Private(u) => u,
            Unknown(u) => u,
        }
    }
}

impl fmt::Display for ReasonForRevocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ReasonForRevocation::*;
        match self {
            Unspecified => f.write_str("No reason specified"),
            KeySuperseded => f.write_str("Key is superseded"),
            KeyCompromised => f.write_str("Key material has been compromised"),
            KeyRetired => f.write_str("Key is retired and no longer used"),
            UIDRetired => f.write_str("User ID information is no longer valid"),
            Private(u) =>
                f.write_fmt(format_args!("Private/Experimental revocation reason {}", u)),
            Unknown(u) =>
                f.write_fmt(format_args!("Unknown revocation reason {}", u)),
        }
    }
}

/// Designates a key as a valid third-party revoker.
///
/// This is described in [Section 5.2.3.15 of RFC 4880].  Once a
/// designated revoker appears on a key block, revocation signatures
/// issued by the named fingerprint can revoke the primary key.
///
/// [Section 5.2.3.15 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.15
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevocationKey {
    /// The class octet.  Bit 0x80 must be set; 0x40 means the
    /// information is sensitive and must not be exported.
    class: u8,

    /// The public key algorithm of the designated revoker.
    pk_algo: PublicKeyAlgorithm,

    /// Fingerprint of the authorized key.
    fp: Fingerprint,
}

impl RevocationKey {
    /// The class bit that must always be set.
    pub const CLASS_MANDATORY: u8 = 0x80;
    /// The class bit marking the revoker as sensitive.
    pub const CLASS_SENSITIVE: u8 = 0x40;

    /// Creates a new revocation key.
    pub fn new(pk_algo: PublicKeyAlgorithm, fp: Fingerprint, sensitive: bool)
               -> Self
    {
        RevocationKey {
            class: Self::CLASS_MANDATORY
                | if sensitive { Self::CLASS_SENSITIVE } else { 0 },
            pk_algo,
            fp,
        }
    }

    /// Creates a revocation key from the raw class octet.
    pub fn from_bits(class: u8, pk_algo: PublicKeyAlgorithm, fp: Fingerprint)
                     -> Result<Self>
    {
        if class & Self::CLASS_MANDATORY == 0 {
            return Err(Error::InvalidArgument(
                "Revocation key class bit 0x80 not set".into()).into());
        }
        Ok(RevocationKey { class, pk_algo, fp })
    }

    /// Returns the raw class octet.
    pub fn class(&self) -> u8 {
        self.class
    }

    /// Returns the algorithm of the designated revoker.
    pub fn revoker_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Returns the fingerprint of the designated revoker.
    pub fn revoker_fingerprint(&self) -> &Fingerprint {
        &self.fp
    }

    /// Returns whether the relationship is sensitive, i.e. must not
    /// be exported.
    pub fn sensitive(&self) -> bool {
        self.class & Self::CLASS_SENSITIVE > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_roundtrip() {
        for i in 0..=255u8 {
            let a = PublicKeyAlgorithm::from(i);
            assert_eq!(u8::from(a), i);
            let s = SymmetricAlgorithm::from(i);
            assert_eq!(u8::from(s), i);
            let h = HashAlgorithm::from(i);
            assert_eq!(u8::from(h), i);
            let c = CompressionAlgorithm::from(i);
            assert_eq!(u8::from(c), i);
            let t = SignatureType::from(i);
            assert_eq!(u8::from(t), i);
        }
    }

    #[test]
    fn signing_capability() {
        assert!(PublicKeyAlgorithm::EdDSA.for_signing());
        assert!(PublicKeyAlgorithm::ECDSA.for_signing());
        assert!(!PublicKeyAlgorithm::ECDH.for_signing());
        assert!(PublicKeyAlgorithm::ECDH.for_encryption());
        assert!(!PublicKeyAlgorithm::DSA.for_encryption());
    }

    #[test]
    fn revocation_key_class() {
        let fp = Fingerprint::V4([0x42; 20]);
        let rk = RevocationKey::new(PublicKeyAlgorithm::RSAEncryptSign,
                                    fp.clone(), true);
        assert!(rk.sensitive());
        assert_eq!(rk.class() & 0x80, 0x80);

        assert!(RevocationKey::from_bits(
            0x00, PublicKeyAlgorithm::RSAEncryptSign, fp).is_err());
    }
}
