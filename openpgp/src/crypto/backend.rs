//! The signature verification backend.
//!
//! Verification is pure: it needs the public key material, the
//! signature MPIs, and the digest, and never touches the agent.

use crate::Error;
use crate::Result;
use crate::crypto::mpi;
use crate::types::{Curve, HashAlgorithm, PublicKeyAlgorithm};

/// Verifies `sig` over `digest` using the public key `key`.
///
/// Returns `Ok(())` if the signature is cryptographically valid.
pub(crate) fn verify(key: &mpi::PublicKey,
                     sig: &mpi::Signature,
                     hash_algo: HashAlgorithm,
                     digest: &[u8])
                     -> Result<()>
{
    use crate::crypto::mpi::{PublicKey, Signature};

    match (key, sig) {
        (PublicKey::RSA { e, n }, Signature::RSA { s }) =>
            verify_rsa(e, n, s, hash_algo, digest),

        (PublicKey::DSA { p, q, g, y }, Signature::DSA { r, s }) =>
            verify_dsa(p, q, g, y, r, s, digest),

        (PublicKey::EdDSA { curve, q }, Signature::EdDSA { r, s }) =>
            verify_eddsa(curve, q, r, s, digest),

        (PublicKey::ECDSA { curve, q }, Signature::ECDSA { r, s }) =>
            verify_ecdsa(curve, q, r, s, digest),

        (PublicKey::ElGamal { .. }, Signature::ElGamal { .. }) =>
            Err(Error::UnsupportedPublicKeyAlgorithm(
                PublicKeyAlgorithm::ElGamalEncryptSign).into()),

        _ => Err(Error::BadSignature(format!(
            "Key material and signature mismatch: {:?} vs. {:?}",
            key.algo(), sig)).into()),
    }
}

fn verify_rsa(e: &mpi::MPI, n: &mpi::MPI, s: &mpi::MPI,
              hash_algo: HashAlgorithm, digest: &[u8])
              -> Result<()>
{
    use rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey};
    use rsa::traits::PublicKeyParts;

    let key = RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(n.value()),
        BigUint::from_bytes_be(e.value()),
        16384)
        .map_err(|e| Error::BadKeyMaterial(e.to_string()))?;

    let scheme = match hash_algo {
        HashAlgorithm::MD5 => Pkcs1v15Sign::new::<md5::Md5>(),
        HashAlgorithm::SHA1 =>
            Pkcs1v15Sign::new::<sha1collisiondetection::Sha1CD>(),
        HashAlgorithm::RipeMD => Pkcs1v15Sign::new::<ripemd::Ripemd160>(),
        HashAlgorithm::SHA256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::SHA384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::SHA512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        HashAlgorithm::SHA224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        a => return Err(Error::UnsupportedHashAlgorithm(a).into()),
    };

    // The signature has the length of the modulus; the MPI encoding
    // may have stripped leading zeros.
    let sig = s.value_padded((key.n().bits() + 7) / 8)
        .map_err(|_| Error::BadSignature("Signature too large".into()))?;

    key.verify(scheme, digest, &sig)
        .map_err(|e| Error::BadSignature(e.to_string()).into())
}

fn verify_dsa(p: &mpi::MPI, q: &mpi::MPI, g: &mpi::MPI, y: &mpi::MPI,
              r: &mpi::MPI, s: &mpi::MPI, digest: &[u8])
              -> Result<()>
{
    use num_bigint_dig::BigUint;
    use ecdsa::signature::hazmat::PrehashVerifier;

    let components = dsa::Components::from_components(
        BigUint::from_bytes_be(p.value()),
        BigUint::from_bytes_be(q.value()),
        BigUint::from_bytes_be(g.value()))
        .map_err(|e| Error::BadKeyMaterial(e.to_string()))?;
    let key = dsa::VerifyingKey::from_components(
        components,
        BigUint::from_bytes_be(y.value()))
        .map_err(|e| Error::BadKeyMaterial(e.to_string()))?;

    let sig = dsa::Signature::from_components(
        BigUint::from_bytes_be(r.value()),
        BigUint::from_bytes_be(s.value()))
        .map_err(|e| Error::BadSignature(e.to_string()))?;

    key.verify_prehash(digest, &sig)
        .map_err(|e| Error::BadSignature(e.to_string()).into())
}

fn verify_eddsa(curve: &Curve, q: &mpi::MPI,
                r: &mpi::MPI, s: &mpi::MPI, digest: &[u8])
                -> Result<()>
{
    match curve {
        Curve::Ed25519 => {
            let (point, _) = q.decode_point(curve)?;
            let point: [u8; 32] = point.try_into()
                .map_err(|_| Error::MalformedMPI(
                    "Bad Ed25519 point length".into()))?;
            let key = ed25519_dalek::VerifyingKey::from_bytes(&point)
                .map_err(|e| Error::BadKeyMaterial(e.to_string()))?;

            // OpenPGP encodes R and S as separate MPIs, possibly
            // dropping leading zeros; the signature is their
            // zero-padded concatenation.
            let mut sig = [0u8; 64];
            sig[..32].copy_from_slice(&r.value_padded(32)?);
            sig[32..].copy_from_slice(&s.value_padded(32)?);
            let sig = ed25519_dalek::Signature::from_bytes(&sig);

            key.verify_strict(digest, &sig)
                .map_err(|e| Error::BadSignature(e.to_string()).into())
        },
        curve => Err(Error::UnsupportedEllipticCurve(curve.clone()).into()),
    }
}

fn verify_ecdsa(curve: &Curve, q: &mpi::MPI,
                r: &mpi::MPI, s: &mpi::MPI, digest: &[u8])
                -> Result<()>
{
    use ecdsa::signature::hazmat::PrehashVerifier;

    macro_rules! verify_with {
        ($crt: ident, $field_sz: expr) => {{
            let key = $crt::ecdsa::VerifyingKey::from_sec1_bytes(q.value())
                .map_err(|e| Error::BadKeyMaterial(e.to_string()))?;

            let rs = $crt::FieldBytes::clone_from_slice(
                &r.value_padded($field_sz)?);
            let ss = $crt::FieldBytes::clone_from_slice(
                &s.value_padded($field_sz)?);
            let sig = $crt::ecdsa::Signature::from_scalars(rs, ss)
                .map_err(|e| Error::BadSignature(e.to_string()))?;

            key.verify_prehash(digest, &sig)
                .map_err(|e| Error::BadSignature(e.to_string()).into())
        }};
    }

    match curve {
        Curve::NistP256 => verify_with!(p256, 32),
        Curve::NistP384 => verify_with!(p384, 48),
        Curve::NistP521 => verify_with!(p521, 66),
        curve => Err(Error::UnsupportedEllipticCurve(curve.clone()).into()),
    }
}
