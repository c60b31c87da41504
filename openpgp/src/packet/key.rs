//! Public key packets.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::Error;
use crate::Fingerprint;
use crate::KeyID;
use crate::Result;
use crate::crypto::hash::Hash;
use crate::crypto::mpi;
use crate::crypto::sexp::{self, Keygrip};
use crate::types::{PublicKeyAlgorithm, Timestamp};

/// Holds a public key packet.
///
/// The same type backs the Public-Key and Public-Subkey packets; the
/// distinction is made by the packet tag, which is a property of the
/// position in the key block, not of the key material.
///
/// Secret key material is never held in this process.  A key that
/// has a secret half is referenced by its keygrip, which is the
/// handle the secret-key agent knows it by.
#[derive(Clone)]
pub struct Key {
    /// Version of the key packet.  Only version 4 keys can be
    /// created.
    version: u8,
    /// When the key was created.  Part of the fingerprint.
    creation_time: Timestamp,
    /// Public key algorithm of this key.
    pk_algo: PublicKeyAlgorithm,
    /// The key's public parameters.
    mpis: mpi::PublicKey,

    /// Lazily computed fingerprint.  Not part of the value.
    fingerprint: OnceCell<Fingerprint>,
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        self.version == other.version
            && self.creation_time == other.creation_time
            && self.pk_algo == other.pk_algo
            && self.mpis == other.mpis
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.creation_time.hash(state);
        self.pk_algo.hash(state);
        std::hash::Hash::hash(&self.mpis, state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Key")
            .field("fingerprint", &self.fingerprint())
            .field("creation_time", &self.creation_time)
            .field("pk_algo", &self.pk_algo)
            .field("mpis", &self.mpis)
            .finish()
    }
}

impl Key {
    /// Creates an OpenPGP public key packet from existing key
    /// material.
    pub fn new(creation_time: Timestamp,
               pk_algo: PublicKeyAlgorithm,
               mpis: mpi::PublicKey)
               -> Result<Key>
    {
        mpis.well_formed()?;
        if let Some(a) = mpis.algo() {
            // RSA material is valid for all three RSA algorithm ids.
            let compatible = match (a, pk_algo) {
                (PublicKeyAlgorithm::RSAEncryptSign,
                 PublicKeyAlgorithm::RSAEncryptSign
                 | PublicKeyAlgorithm::RSAEncrypt
                 | PublicKeyAlgorithm::RSASign) => true,
                (a, b) => a == b,
            };
            if !compatible {
                return Err(Error::BadKeyMaterial(
                    format!("Key material is for {}, not {}", a, pk_algo))
                           .into());
            }
        }

        Ok(Key {
            version: 4,
            creation_time,
            pk_algo,
            mpis,
            fingerprint: OnceCell::new(),
        })
    }

    /// Used by the parser.
    pub(crate) fn from_parts(version: u8,
                             creation_time: Timestamp,
                             pk_algo: PublicKeyAlgorithm,
                             mpis: mpi::PublicKey)
                             -> Key
    {
        Key {
            version,
            creation_time,
            pk_algo,
            mpis,
            fingerprint: OnceCell::new(),
        }
    }

    /// Gets the version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Gets the key packet's creation time.
    pub fn creation_time(&self) -> Timestamp {
        self.creation_time
    }

    /// Sets the key packet's creation time, invalidating the cached
    /// fingerprint.
    pub fn set_creation_time(&mut self, t: Timestamp) {
        self.creation_time = t;
        self.fingerprint = OnceCell::new();
    }

    /// Gets the public key algorithm.
    pub fn pk_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Gets the key packet's MPIs.
    pub fn mpis(&self) -> &mpi::PublicKey {
        &self.mpis
    }

    /// Returns the key's fingerprint.
    ///
    /// The fingerprint is the SHA-1 hash over the canonical form of
    /// the key packet (see [Section 12.2 of RFC 4880]).  It is
    /// computed once and cached.
    ///
    ///   [Section 12.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-12.2
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint.get_or_init(|| {
            let mut h = crate::types::HashAlgorithm::SHA1.context()
                .expect("SHA-1 is always supported");

            self.hash(&mut h);

            let mut digest = [0u8; 20];
            h.digest(&mut digest);
            Fingerprint::V4(digest)
        }).clone()
    }

    /// Returns the key's Key ID: the low 64 bits of the
    /// fingerprint.
    pub fn keyid(&self) -> KeyID {
        self.fingerprint().to_keyid()
    }

    /// Returns the key's keygrip: the handle the secret-key agent
    /// names this key by.
    ///
    /// Unlike the fingerprint, the keygrip depends only on the key
    /// material, not on the creation time.
    pub fn keygrip(&self) -> Result<Keygrip> {
        sexp::keygrip(&self.mpis)
    }

    /// Returns the length of the public key in bits.
    pub fn bits(&self) -> Option<usize> {
        self.mpis.bits()
    }

    /// Returns a compact string describing algorithm and strength,
    /// e.g. `rsa2048`, `ed25519`, or `E_1.2.3.4` for an ECC key on
    /// an unrecognised curve.
    pub fn algo_string(&self) -> String {
        use crate::types::Curve;
        use crate::types::PublicKeyAlgorithm::*;

        let prefix = match self.pk_algo {
            RSAEncryptSign | RSAEncrypt | RSASign => Some("rsa"),
            ElGamalEncrypt | ElGamalEncryptSign => Some("elg"),
            DSA => Some("dsa"),
            ECDH | ECDSA | EdDSA => None,
            Private(u) | Unknown(u) =>
                return format!("unknown_{}", u),
        };

        match (prefix, self.mpis.curve()) {
            (Some(prefix), _) =>
                format!("{}{}", prefix, self.bits().unwrap_or(0)),
            (None, Some(curve)) => match curve {
                Curve::NistP256 => "nistp256".into(),
                Curve::NistP384 => "nistp384".into(),
                Curve::NistP521 => "nistp521".into(),
                Curve::BrainpoolP256 => "brainpoolP256r1".into(),
                Curve::BrainpoolP384 => "brainpoolP384r1".into(),
                Curve::BrainpoolP512 => "brainpoolP512r1".into(),
                Curve::Ed25519 => "ed25519".into(),
                Curve::Ed448 => "ed448".into(),
                Curve::Cv25519 => "cv25519".into(),
                Curve::Secp256k1 => "secp256k1".into(),
                curve @ Curve::Unknown(_) =>
                    format!("E_{}", curve.oid_to_dotted()),
            },
            (None, None) => "E_error".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::mpi::MPI;
    use crate::types::Curve;

    fn rsa_key() -> Key {
        Key::new(Timestamp::from(1234567890),
                 PublicKeyAlgorithm::RSAEncryptSign,
                 mpi::PublicKey::RSA {
                     n: MPI::new(&[0xe0; 256]),
                     e: MPI::new(&[1, 0, 1]),
                 }).unwrap()
    }

    fn ed25519_key() -> Key {
        let mut q = vec![0x40];
        q.extend_from_slice(&[9; 32]);
        Key::new(Timestamp::from(1234567890),
                 PublicKeyAlgorithm::EdDSA,
                 mpi::PublicKey::EdDSA {
                     curve: Curve::Ed25519,
                     q: MPI::new_opaque(&q),
                 }).unwrap()
    }

    #[test]
    fn keyid_is_fingerprint_suffix() {
        for key in [rsa_key(), ed25519_key()] {
            let fpr = key.fingerprint();
            let keyid = key.keyid();
            assert_eq!(&fpr.as_bytes()[12..], keyid.as_bytes());
        }
    }

    #[test]
    fn keygrip_is_timestamp_independent() {
        let mut a = rsa_key();
        let grip = a.keygrip().unwrap();
        let fpr = a.fingerprint();
        a.set_creation_time(Timestamp::from(42));
        assert_eq!(a.keygrip().unwrap(), grip);
        assert!(a.fingerprint() != fpr);
    }

    #[test]
    fn algo_strings() {
        assert_eq!(rsa_key().algo_string(), "rsa2048");
        assert_eq!(ed25519_key().algo_string(), "ed25519");
    }

    #[test]
    fn material_mismatch_is_rejected() {
        assert!(Key::new(Timestamp::from(0),
                         PublicKeyAlgorithm::DSA,
                         mpi::PublicKey::RSA {
                             n: MPI::new(&[0xe0; 256]),
                             e: MPI::new(&[1, 0, 1]),
                         }).is_err());
    }
}
