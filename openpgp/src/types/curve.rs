use std::fmt;

use crate::Error;
use crate::Result;

/// Elliptic curves used in OpenPGP.
///
/// PGP does not include the domain parameters of the curve in the
/// key material; it names the curve by its ASN.1 OID instead (see
/// [Section 11 of RFC 6637]).  This enum maps the OIDs we know to
/// symbolic names; everything else is kept verbatim in `Unknown`.
///
/// [Section 11 of RFC 6637]: https://tools.ietf.org/html/rfc6637#section-11
#[derive(Clone, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum Curve {
    /// NIST curve P-256.
    NistP256,
    /// NIST curve P-384.
    NistP384,
    /// NIST curve P-521.
    NistP521,
    /// brainpoolP256r1.
    BrainpoolP256,
    /// brainpoolP384r1.
    BrainpoolP384,
    /// brainpoolP512r1.
    BrainpoolP512,
    /// D.J. Bernstein's "Twisted" Edwards curve Ed25519.
    Ed25519,
    /// Edwards curve Ed448.
    Ed448,
    /// Elliptic curve Diffie-Hellman using D.J. Bernstein's
    /// Curve25519.
    Cv25519,
    /// Koblitz curve secp256k1.
    Secp256k1,
    /// Unknown curve.
    Unknown(Box<[u8]>),
}

const NIST_P256_OID: &[u8] =
    &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
const NIST_P384_OID: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x22];
const NIST_P521_OID: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x23];
const BRAINPOOL_P256_OID: &[u8] =
    &[0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x07];
const BRAINPOOL_P384_OID: &[u8] =
    &[0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x0B];
const BRAINPOOL_P512_OID: &[u8] =
    &[0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x0D];
const ED25519_OID: &[u8] =
    &[0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01];
const ED448_OID: &[u8] = &[0x2B, 0x65, 0x71];
const CV25519_OID: &[u8] =
    &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01];
const SECP256K1_OID: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x0A];

impl Curve {
    /// Parses the given OID.
    pub fn from_oid(oid: &[u8]) -> Curve {
        // Match on OIDs, see section 11 of RFC6637.
        match oid {
            NIST_P256_OID => Curve::NistP256,
            NIST_P384_OID => Curve::NistP384,
            NIST_P521_OID => Curve::NistP521,
            BRAINPOOL_P256_OID => Curve::BrainpoolP256,
            BRAINPOOL_P384_OID => Curve::BrainpoolP384,
            BRAINPOOL_P512_OID => Curve::BrainpoolP512,
            ED25519_OID => Curve::Ed25519,
            ED448_OID => Curve::Ed448,
            CV25519_OID => Curve::Cv25519,
            SECP256K1_OID => Curve::Secp256k1,
            oid => Curve::Unknown(Vec::from(oid).into_boxed_slice()),
        }
    }

    /// Returns this curve's OID.
    pub fn oid(&self) -> &[u8] {
        match self {
            Curve::NistP256 => NIST_P256_OID,
            Curve::NistP384 => NIST_P384_OID,
            Curve::NistP521 => NIST_P521_OID,
            Curve::BrainpoolP256 => BRAINPOOL_P256_OID,
            Curve::BrainpoolP384 => BRAINPOOL_P384_OID,
            Curve::BrainpoolP512 => BRAINPOOL_P512_OID,
            Curve::Ed25519 => ED25519_OID,
            Curve::Ed448 => ED448_OID,
            Curve::Cv25519 => CV25519_OID,
            Curve::Secp256k1 => SECP256K1_OID,
            Curve::Unknown(oid) => oid,
        }
    }

    /// Returns the symbolic name of this curve.
    ///
    /// This is the name the secret-key agent and the keygrip
    /// computation use, e.g. `Ed25519` or `NIST P-256`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCurve` for curves we only know by OID.
    pub fn name(&self) -> Result<&'static str> {
        match self {
            Curve::NistP256 => Ok("NIST P-256"),
            Curve::NistP384 => Ok("NIST P-384"),
            Curve::NistP521 => Ok("NIST P-521"),
            Curve::BrainpoolP256 => Ok("brainpoolP256r1"),
            Curve::BrainpoolP384 => Ok("brainpoolP384r1"),
            Curve::BrainpoolP512 => Ok("brainpoolP512r1"),
            Curve::Ed25519 => Ok("Ed25519"),
            Curve::Ed448 => Ok("Ed448"),
            Curve::Cv25519 => Ok("Curve25519"),
            Curve::Secp256k1 => Ok("secp256k1"),
            Curve::Unknown(_) =>
                Err(Error::UnknownCurve(self.oid_to_dotted()).into()),
        }
    }

    /// Parses a curve name as it appears in parameter files or on
    /// the command line.
    ///
    /// Both the symbolic names and the compact aliases (`ed25519`,
    /// `cv25519`, `nistp384`, ...) are accepted, case-insensitively.
    pub fn from_name(name: &str) -> Result<Curve> {
        let n = name.trim();
        let eq = |a: &str| n.eq_ignore_ascii_case(a);
        if eq("Ed25519") {
            Ok(Curve::Ed25519)
        } else if eq("Ed448") {
            Ok(Curve::Ed448)
        } else if eq("Curve25519") || eq("cv25519") || eq("X25519") {
            Ok(Curve::Cv25519)
        } else if eq("NIST P-256") || eq("nistp256") {
            Ok(Curve::NistP256)
        } else if eq("NIST P-384") || eq("nistp384") {
            Ok(Curve::NistP384)
        } else if eq("NIST P-521") || eq("nistp521") {
            Ok(Curve::NistP521)
        } else if eq("brainpoolP256r1") {
            Ok(Curve::BrainpoolP256)
        } else if eq("brainpoolP384r1") {
            Ok(Curve::BrainpoolP384)
        } else if eq("brainpoolP512r1") {
            Ok(Curve::BrainpoolP512)
        } else if eq("secp256k1") {
            Ok(Curve::Secp256k1)
        } else {
            Err(Error::UnknownCurve(name.into()).into())
        }
    }

    /// Returns the length of the underlying field in bits.
    ///
    /// For the Edwards curves this is the well-known nominal size
    /// (255 for Ed25519, 441 for Ed448), not the encoded point size.
    pub fn bits(&self) -> Option<usize> {
        match self {
            Curve::NistP256 => Some(256),
            Curve::NistP384 => Some(384),
            Curve::NistP521 => Some(521),
            Curve::BrainpoolP256 => Some(256),
            Curve::BrainpoolP384 => Some(384),
            Curve::BrainpoolP512 => Some(512),
            Curve::Ed25519 => Some(255),
            Curve::Ed448 => Some(441),
            Curve::Cv25519 => Some(255),
            Curve::Secp256k1 => Some(256),
            Curve::Unknown(_) => None,
        }
    }

    /// Returns whether signatures over this curve take the custom
    /// prefixed point encoding (a 0x40 octet followed by the native
    /// encoding) instead of SEC1.
    pub fn uses_native_encoding(&self) -> bool {
        matches!(self, Curve::Ed25519 | Curve::Ed448 | Curve::Cv25519)
    }

    /// Formats the OID in dotted-decimal notation, e.g. `1.3.6.1.4.1.3029.1.5.1`.
    pub(crate) fn oid_to_dotted(&self) -> String {
        let oid = self.oid();
        if oid.is_empty() {
            return "".into();
        }

        let mut s = format!("{}.{}", oid[0] / 40, oid[0] % 40);
        let mut acc: u64 = 0;
        for &b in &oid[1..] {
            acc = (acc << 7) | (b & 0x7f) as u64;
            if b & 0x80 == 0 {
                s.push_str(&format!(".{}", acc));
                acc = 0;
            }
        }
        s
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Curve::*;
        match self {
            NistP256 => f.write_str("NIST curve P-256"),
            NistP384 => f.write_str("NIST curve P-384"),
            NistP521 => f.write_str("NIST curve P-521"),
            BrainpoolP256 => f.write_str("brainpoolP256r1"),
            BrainpoolP384 => f.write_str("brainpoolP384r1"),
            BrainpoolP512 => f.write_str("brainpoolP512r1"),
            Ed25519 => f.write_str("D.J. Bernstein's \"Twisted\" Edwards curve Ed25519"),
            Ed448 => f.write_str("Edwards curve Ed448"),
            Cv25519 => f.write_str("D.J. Bernstein's Curve25519"),
            Secp256k1 => f.write_str("Koblitz curve secp256k1"),
            Unknown(_) =>
                f.write_fmt(format_args!("Unknown curve (OID {})",
                                         self.oid_to_dotted())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_roundtrip() {
        for curve in [Curve::NistP256, Curve::NistP384, Curve::NistP521,
                      Curve::BrainpoolP256, Curve::BrainpoolP384,
                      Curve::BrainpoolP512, Curve::Ed25519, Curve::Ed448,
                      Curve::Cv25519, Curve::Secp256k1] {
            assert_eq!(Curve::from_oid(curve.oid()), curve);
        }
    }

    #[test]
    fn unknown_oid_is_preserved() {
        let oid = [0x2B, 0x06, 0x01, 0x04, 0x01];
        match Curve::from_oid(&oid) {
            Curve::Unknown(o) => assert_eq!(&o[..], &oid[..]),
            c => panic!("unexpected curve {:?}", c),
        }
    }

    #[test]
    fn dotted_oid() {
        assert_eq!(Curve::Ed25519.oid_to_dotted(),
                   "1.3.6.1.4.1.11591.15.1");
        assert_eq!(Curve::NistP256.oid_to_dotted(), "1.2.840.10045.3.1.7");
    }

    #[test]
    fn names() {
        assert_eq!(Curve::from_name("ed25519").unwrap(), Curve::Ed25519);
        assert_eq!(Curve::from_name("Curve25519").unwrap(), Curve::Cv25519);
        assert_eq!(Curve::from_name("NIST P-384").unwrap(), Curve::NistP384);
        assert_eq!(Curve::from_name("nistp521").unwrap(), Curve::NistP521);
        assert!(Curve::from_name("P-1729").is_err());
    }
}
