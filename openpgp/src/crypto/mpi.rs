//! Multiprecision Integers.
//!
//! OpenPGP transports the algorithm-specific parts of a key or a
//! signature as multiprecision integers: a two-octet big-endian bit
//! count followed by the big-endian value with all leading zero
//! octets stripped.  Elliptic curve points and KDF parameters are
//! opaque strings framed by the surrounding structure.

use std::cmp::Ordering;
use std::fmt;

use crate::Error;
use crate::Result;
use crate::crypto::hash::{self, Hash};
use crate::crypto::mem::secure_cmp;
use crate::types::{
    Curve,
    HashAlgorithm,
    PublicKeyAlgorithm,
    SymmetricAlgorithm,
};

/// Holds a single MPI.
#[derive(Clone)]
pub struct MPI {
    /// Integer value as big-endian.
    value: Box<[u8]>,
}

impl From<Vec<u8>> for MPI {
    fn from(v: Vec<u8>) -> Self {
        Self::new(&v)
    }
}

impl MPI {
    /// Creates a new MPI.
    ///
    /// This function takes care of leading zeros.
    pub fn new(value: &[u8]) -> Self {
        let offset = value.iter().take_while(|&&b| b == 0).count();
        MPI {
            value: Vec::from(&value[offset..]).into_boxed_slice(),
        }
    }

    /// Creates a new MPI representing an opaque string, verbatim.
    ///
    /// Used for elliptic curve points, which carry a format octet
    /// that must not be stripped even if it happens to be zero.
    pub fn new_opaque(value: &[u8]) -> Self {
        MPI {
            value: Vec::from(value).into_boxed_slice(),
        }
    }

    /// Returns the length of the MPI in bits.
    pub fn bits(&self) -> usize {
        self.value.len() * 8
            - self.value.get(0).map(|&b| b.leading_zeros() as usize)
                  .unwrap_or(0)
    }

    /// Returns the value of this MPI.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the value of this MPI, left-padded with zeros to `to`
    /// bytes.
    ///
    /// The MPI encoding strips leading zeros, but fixed-width
    /// consumers (curve scalars, EdDSA signature halves) need them
    /// back.  Fails if the value is wider than `to`.
    pub fn value_padded(&self, to: usize) -> Result<Vec<u8>> {
        if self.value.len() > to {
            return Err(Error::InvalidArgument(
                format!("Value too large: {} > {} bytes",
                        self.value.len(), to)).into());
        }

        let mut v = vec![0; to];
        v[to - self.value.len()..].copy_from_slice(&self.value);
        Ok(v)
    }

    /// Dissects this MPI describing a point into the individual
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedEllipticCurve` if the curve is not
    /// supported, `Error::MalformedMPI` if the point is formatted
    /// incorrectly.
    pub fn decode_point(&self, curve: &Curve) -> Result<(&[u8], &[u8])> {
        use self::Curve::*;
        match curve {
            Ed25519 | Cv25519 | Ed448 => {
                // These curves use a custom compression format which
                // only contains the X coordinate.
                let native_len = if let Ed448 = curve { 57 } else { 32 };
                if self.value().len() != 1 + native_len {
                    return Err(Error::MalformedMPI(
                        format!("Bad size of {} key: {} expected: {}",
                                curve, self.value().len(),
                                1 + native_len)).into());
                }

                if self.value().get(0).map(|&b| b != 0x40).unwrap_or(true) {
                    return Err(Error::MalformedMPI(
                        format!("Bad encoding of {} key", curve)).into());
                }

                Ok((&self.value()[1..], &[]))
            },

            _ => {
                // Length of one coordinate in bytes, rounded up.
                let coordinate_length = match curve.bits() {
                    Some(n) => (n + 7) / 8,
                    None => return Err(Error::UnsupportedEllipticCurve(
                        curve.clone()).into()),
                };

                // Check the length of Q.
                let expected_length =
                    1 // 0x04.
                    + (2 // (x, y)
                       * coordinate_length);

                if self.value().len() != expected_length {
                    return Err(Error::MalformedMPI(
                        format!("Invalid length of MPI: {} (expected {})",
                                self.value().len(), expected_length)).into());
                }

                if self.value().get(0).map(|&b| b != 0x04).unwrap_or(true) {
                    return Err(Error::MalformedMPI(
                        format!("Bad prefix: {:?} (expected Some(0x04))",
                                self.value().get(0))).into());
                }

                Ok((&self.value()[1..1 + coordinate_length],
                    &self.value()[1 + coordinate_length..]))
            },
        }
    }
}

impl fmt::Debug for MPI {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_fmt(format_args!(
            "{} bits: {}", self.bits(),
            crate::fmt::to_hex(&*self.value, true)))
    }
}

impl Hash for MPI {
    /// Update the Hash with a hash of the MPIs.
    fn hash(&self, hash: &mut hash::Context) {
        let len = self.bits() as u16;

        hash.update(&len.to_be_bytes());
        hash.update(&self.value);
    }
}

impl PartialOrd for MPI {
    fn partial_cmp(&self, other: &MPI) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MPI {
    fn cmp(&self, other: &MPI) -> Ordering {
        secure_cmp(&self.value, &other.value)
    }
}

impl PartialEq for MPI {
    fn eq(&self, other: &MPI) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MPI {}

impl std::hash::Hash for MPI {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for MPI {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        loop {
            let buf = <Vec<u8>>::arbitrary(g);

            if !buf.is_empty() && buf[0] != 0 {
                break MPI::new(&buf);
            }
        }
    }
}

/// Holds a public key.
///
/// Provides a typed and structured way of storing multiple MPIs (and
/// the occasional elliptic curve) in key packets.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[non_exhaustive]
pub enum PublicKey {
    /// RSA public key.
    RSA {
        /// Public exponent.
        e: MPI,
        /// Public modulo N = pq.
        n: MPI,
    },

    /// NIST DSA public key.
    DSA {
        /// Prime of the ring Zp.
        p: MPI,
        /// Order of `g` in Zp.
        q: MPI,
        /// Public generator of Zp.
        g: MPI,
        /// Public key g^x mod p.
        y: MPI,
    },

    /// Elgamal public key.
    ElGamal {
        /// Prime of the ring Zp.
        p: MPI,
        /// Generator of Zp.
        g: MPI,
        /// Public key g^x mod p.
        y: MPI,
    },

    /// DJB's "Twisted" Edwards curve DSA public key.
    EdDSA {
        /// Curve we're using.
        curve: Curve,
        /// Public point.
        q: MPI,
    },

    /// NIST's Elliptic curve DSA public key.
    ECDSA {
        /// Curve we're using.
        curve: Curve,
        /// Public point.
        q: MPI,
    },

    /// Elliptic curve Elgamal public key.
    ECDH {
        /// Curve we're using.
        curve: Curve,
        /// Public point.
        q: MPI,
        /// Hash algorithm used for key derivation.
        hash: HashAlgorithm,
        /// Algorithm used with the derived key.
        sym: SymmetricAlgorithm,
    },

    /// Unknown number of MPIs for an unknown algorithm.
    Unknown {
        /// The successfully parsed MPIs.
        mpis: Box<[MPI]>,
        /// Any data that failed to parse.
        rest: Box<[u8]>,
    },
}

impl PublicKey {
    /// Returns the length of the public key in bits.
    ///
    /// For finite field crypto this returns the size of the field we
    /// operate in, for ECC it returns `Curve::bits()`.
    ///
    /// Note: This information is useless and should not be used to
    /// gauge the security of a particular key.  This function exists
    /// only because some legacy PGP applications need it.
    ///
    /// Returns `None` for unknown keys and curves.
    pub fn bits(&self) -> Option<usize> {
        use self::PublicKey::*;
        match self {
            RSA { n, .. } => Some(n.bits()),
            DSA { p, .. } => Some(p.bits()),
            ElGamal { p, .. } => Some(p.bits()),
            EdDSA { curve, .. } => curve.bits(),
            ECDSA { curve, .. } => curve.bits(),
            ECDH { curve, .. } => curve.bits(),
            Unknown { .. } => None,
        }
    }

    /// Returns, if known, the public-key algorithm for this public
    /// key.
    pub fn algo(&self) -> Option<PublicKeyAlgorithm> {
        use self::PublicKey::*;
        match self {
            RSA { .. } => Some(PublicKeyAlgorithm::RSAEncryptSign),
            DSA { .. } => Some(PublicKeyAlgorithm::DSA),
            ElGamal { .. } => Some(PublicKeyAlgorithm::ElGamalEncrypt),
            EdDSA { .. } => Some(PublicKeyAlgorithm::EdDSA),
            ECDSA { .. } => Some(PublicKeyAlgorithm::ECDSA),
            ECDH { .. } => Some(PublicKeyAlgorithm::ECDH),
            Unknown { .. } => None,
        }
    }

    /// Returns, if known, the curve.
    pub fn curve(&self) -> Option<&Curve> {
        use self::PublicKey::*;
        match self {
            EdDSA { curve, .. } => Some(curve),
            ECDSA { curve, .. } => Some(curve),
            ECDH { curve, .. } => Some(curve),
            _ => None,
        }
    }

    /// Checks that the key material is well-formed for its
    /// algorithm.
    pub fn well_formed(&self) -> Result<()> {
        use self::PublicKey::*;
        match self {
            RSA { e, n } =>
                if e.bits() == 0 || n.bits() == 0 {
                    Err(Error::BadKeyMaterial(
                        "Zero-length RSA parameter".into()).into())
                } else {
                    Ok(())
                },
            DSA { p, q, g, y } =>
                if p.bits() == 0 || q.bits() == 0 || g.bits() == 0
                    || y.bits() == 0
                {
                    Err(Error::BadKeyMaterial(
                        "Zero-length DSA parameter".into()).into())
                } else {
                    Ok(())
                },
            ElGamal { p, g, y } =>
                if p.bits() == 0 || g.bits() == 0 || y.bits() == 0 {
                    Err(Error::BadKeyMaterial(
                        "Zero-length Elgamal parameter".into()).into())
                } else {
                    Ok(())
                },
            EdDSA { curve, q } | ECDSA { curve, q } | ECDH { curve, q, .. } =>
            {
                q.decode_point(curve)?;
                Ok(())
            },
            Unknown { .. } =>
                Err(Error::BadKeyMaterial(
                    "Unknown key material".into()).into()),
        }
    }
}

impl Hash for PublicKey {
    fn hash(&self, hash: &mut hash::Context) {
        use self::PublicKey::*;
        match self {
            RSA { e, n } => {
                n.hash(hash);
                e.hash(hash);
            },
            DSA { p, q, g, y } => {
                p.hash(hash);
                q.hash(hash);
                g.hash(hash);
                y.hash(hash);
            },
            ElGamal { p, g, y } => {
                p.hash(hash);
                g.hash(hash);
                y.hash(hash);
            },
            EdDSA { curve, q } | ECDSA { curve, q } => {
                hash.update(&[curve.oid().len() as u8]);
                hash.update(curve.oid());
                q.hash(hash);
            },
            ECDH { curve, q, hash: h, sym } => {
                hash.update(&[curve.oid().len() as u8]);
                hash.update(curve.oid());
                q.hash(hash);
                // The KDF parameters: length, reserved octet, hash
                // function, symmetric algorithm.
                hash.update(&[3u8, 1, u8::from(*h), u8::from(*sym)]);
            },
            Unknown { mpis, rest } => {
                for m in mpis.iter() {
                    m.hash(hash);
                }
                hash.update(rest);
            },
        }
    }
}

/// Holds a signature.
///
/// Provides a typed and structured way of storing the MPIs of a
/// signature packet.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Signature {
    /// RSA signature.
    RSA {
        /// Signature m^d mod N.
        s: MPI,
    },

    /// NIST's DSA signature.
    DSA {
        /// `r` value.
        r: MPI,
        /// `s` value.
        s: MPI,
    },

    /// Elgamal signature.
    ///
    /// Deprecated; never emitted, verified for historic material
    /// only.
    ElGamal {
        /// `r` value.
        r: MPI,
        /// `s` value.
        s: MPI,
    },

    /// DJB's "Twisted" Edwards curve DSA signature.
    EdDSA {
        /// `r` value.
        r: MPI,
        /// `s` value.
        s: MPI,
    },

    /// NIST's Elliptic curve DSA signature.
    ECDSA {
        /// `r` value.
        r: MPI,
        /// `s` value.
        s: MPI,
    },

    /// Unknown number of MPIs for an unknown algorithm.
    Unknown {
        /// The successfully parsed MPIs.
        mpis: Box<[MPI]>,
        /// Any data that failed to parse.
        rest: Box<[u8]>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpi_strips_leading_zeros() {
        let m = MPI::new(&[0, 0, 1, 2]);
        assert_eq!(m.value(), &[1, 2]);
        assert_eq!(m.bits(), 9);

        let z = MPI::new(&[0, 0]);
        assert_eq!(z.value().len(), 0);
        assert_eq!(z.bits(), 0);
    }

    #[test]
    fn mpi_opaque_is_verbatim() {
        let m = MPI::new_opaque(&[0, 1, 2]);
        assert_eq!(m.value(), &[0, 1, 2]);
    }

    #[test]
    fn value_padded() {
        let m = MPI::new(&[1, 2]);
        assert_eq!(m.value_padded(4).unwrap(), vec![0, 0, 1, 2]);
        assert!(m.value_padded(1).is_err());
    }

    #[test]
    fn point_decoding() {
        let mut p = vec![0x40];
        p.extend_from_slice(&[1u8; 32]);
        let m = MPI::new_opaque(&p);
        let (x, y) = m.decode_point(&Curve::Ed25519).unwrap();
        assert_eq!(x, &[1u8; 32]);
        assert!(y.is_empty());

        let mut p = vec![0x04];
        p.extend_from_slice(&[2u8; 64]);
        let m = MPI::new_opaque(&p);
        let (x, y) = m.decode_point(&Curve::NistP256).unwrap();
        assert_eq!(x, &[2u8; 32]);
        assert_eq!(y, &[2u8; 32]);

        assert!(MPI::new_opaque(&[0x04; 12])
                .decode_point(&Curve::NistP256).is_err());
    }

    quickcheck::quickcheck! {
        fn mpi_bit_length(mpi: MPI) -> bool {
            mpi.value().is_empty()
                || (mpi.bits() + 7) / 8 == mpi.value().len()
        }
    }
}
