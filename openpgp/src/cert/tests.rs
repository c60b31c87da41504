use super::*;

use crate::crypto::mpi::{self, MPI};
use crate::packet::signature::subpacket::SubpacketTag;
use crate::policy::Preferences;
use crate::types::{
    Curve,
    HashAlgorithm,
    KeyFlags,
    PublicKeyAlgorithm,
    ReasonForRevocation,
    SymmetricAlgorithm,
};

use ed25519_dalek::Signer as _;

/// A self-contained Ed25519 signer for the tests; in production the
/// only signer is the agent-backed one from the IPC crate.
struct TestSigner {
    key: Key,
    secret: ed25519_dalek::SigningKey,
}

impl TestSigner {
    fn new(seed: u8, creation_time: Timestamp) -> Self {
        let secret = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
        let mut q = vec![0x40];
        q.extend_from_slice(&secret.verifying_key().to_bytes());
        let key = Key::new(creation_time,
                           PublicKeyAlgorithm::EdDSA,
                           mpi::PublicKey::EdDSA {
                               curve: Curve::Ed25519,
                               q: MPI::new_opaque(&q),
                           }).unwrap();
        TestSigner { key, secret }
    }
}

impl Signer for TestSigner {
    fn public(&self) -> &Key {
        &self.key
    }

    fn sign(&mut self, _hash_algo: HashAlgorithm, digest: &[u8])
            -> Result<mpi::Signature>
    {
        let sig = self.secret.sign(digest).to_bytes();
        Ok(mpi::Signature::EdDSA {
            r: MPI::new(&sig[..32]),
            s: MPI::new(&sig[32..]),
        })
    }
}

fn encryption_subkey(creation_time: Timestamp) -> Key {
    // An ECDH subkey needs no signer; fabricated point material is
    // fine for structural tests.
    let mut q = vec![0x40];
    q.extend_from_slice(&[0x5a; 32]);
    Key::new(creation_time,
             PublicKeyAlgorithm::ECDH,
             mpi::PublicKey::ECDH {
                 curve: Curve::Cv25519,
                 q: MPI::new_opaque(&q),
                 hash: HashAlgorithm::SHA256,
                 sym: SymmetricAlgorithm::AES128,
             }).unwrap()
}

const T0: u32 = 1577836800; // 2020-01-01

fn basic_cert() -> (Cert, TestSigner) {
    let mut signer = TestSigner::new(1, T0.into());
    let cert = CertBuilder::new()
        .set_creation_time(Timestamp::from(T0))
        .add_userid("Alice Lovelace <alice@example.org>")
        .generate(&mut signer, &StandardPolicy::new())
        .unwrap();
    (cert, signer)
}

#[test]
fn generate_basic_cert() {
    let (cert, _) = basic_cert();

    assert_eq!(cert.userids().count(), 1);
    let uid = cert.userids().next().unwrap();
    assert_eq!(uid.userid().email(), Some("alice@example.org"));
    assert_eq!(uid.self_signatures().len(), 1);
    assert!(cert.bad_signatures().next().is_none());

    let sig = uid.binding_signature().unwrap();
    assert_eq!(sig.typ(), SignatureType::PositiveCertification);
    assert_eq!(sig.issuer().unwrap(), cert.keyid());

    // The policy subpackets of a fresh key.
    assert_eq!(sig.preferred_symmetric_algorithms().unwrap().iter()
               .map(|&a| u8::from(a)).collect::<Vec<_>>(),
               vec![9, 8, 7, 2]);
    assert_eq!(sig.preferred_hash_algorithms().unwrap().iter()
               .map(|&a| u8::from(a)).collect::<Vec<_>>(),
               vec![8, 9, 10, 11, 2]);
    assert_eq!(sig.preferred_compression_algorithms().unwrap().iter()
               .map(|&a| u8::from(a)).collect::<Vec<_>>(),
               vec![2, 3, 1]);
    assert!(sig.features().unwrap().supports_mdc());
    assert!(sig.key_server_preferences().unwrap().no_modify());
    assert_eq!(sig.key_flags().unwrap().bits(), 0x03);

    // Exactly one creation time subpacket in the hashed area.
    assert_eq!(sig.hashed_area().iter()
               .filter(|sp| sp.tag() == SubpacketTag::SignatureCreationTime)
               .count(),
               1);
}

#[test]
fn serialization_roundtrip() {
    let (cert, _) = basic_cert();

    let buf = cert.to_vec().unwrap();
    let parsed = Cert::from_bytes(&buf).unwrap();
    assert_eq!(parsed, cert);
    // Byte-for-byte stable.
    assert_eq!(parsed.to_vec().unwrap(), buf);
}

#[test]
fn fingerprint_reproduces_from_serialization() {
    // Re-hashing the serialized key packet must reproduce the
    // fingerprint.
    use sha1collisiondetection::Sha1CD;
    use digest::Digest;

    let (cert, _) = basic_cert();
    let key = cert.primary_key();
    let body = {
        let mut buf = Vec::new();
        key.serialize_body(&mut buf).unwrap();
        buf
    };

    let mut h = Sha1CD::new();
    h.update([0x99]);
    h.update((body.len() as u16).to_be_bytes());
    h.update(&body);
    let digest: [u8; 20] = h.finalize().into();

    assert_eq!(key.fingerprint(), crate::Fingerprint::V4(digest));
    assert_eq!(&digest[12..], key.keyid().as_bytes());
}

#[test]
fn bind_signing_subkey_with_backsig() {
    let (cert, mut primary_signer) = basic_cert();
    let mut subkey_signer = TestSigner::new(2, T0.into());
    let subkey = subkey_signer.public().clone();
    let policy = StandardPolicy::new();

    let template = SignatureBuilder::new(SignatureType::SubkeyBinding)
        .set_signature_creation_time(Timestamp::from(T0)).unwrap()
        .set_key_flags(KeyFlags::empty().set_signing(true)).unwrap();

    let cert = cert.bind_subkey(&mut primary_signer, subkey,
                                template, Some(&mut subkey_signer),
                                &policy).unwrap();

    assert_eq!(cert.subkeys().count(), 1);
    let binding = cert.subkeys().next().unwrap();
    assert_eq!(binding.self_signatures().len(), 1);
    assert!(!binding.missing_cross_cert());

    let sig = binding.binding_signature().unwrap();
    let backsig = sig.embedded_signature().unwrap();
    assert_eq!(backsig.typ(), SignatureType::PrimaryKeyBinding);
    backsig.verify_primary_key_binding(cert.primary_key(),
                                       binding.key()).unwrap();

    // Still fine after a parse round trip.
    let parsed = Cert::from_bytes(&cert.to_vec().unwrap()).unwrap();
    assert_eq!(parsed, cert);
}

#[test]
fn bind_encryption_subkey_has_no_backsig() {
    let (cert, mut primary_signer) = basic_cert();
    let subkey = encryption_subkey(T0.into());
    let policy = StandardPolicy::new();

    let template = SignatureBuilder::new(SignatureType::SubkeyBinding)
        .set_signature_creation_time(Timestamp::from(T0)).unwrap()
        .set_key_flags(KeyFlags::empty()
                       .set_transport_encryption(true)
                       .set_storage_encryption(true)).unwrap();

    let cert = cert.bind_subkey(&mut primary_signer, subkey,
                                template, None, &policy).unwrap();

    let binding = cert.subkeys().next().unwrap();
    let sig = binding.binding_signature().unwrap();
    assert_eq!(sig.key_flags().unwrap().bits(), 0x0c);
    assert!(sig.embedded_signature().is_none());
}

#[test]
fn missing_cross_cert_is_rejected() {
    let (cert, mut primary_signer) = basic_cert();
    let subkey_signer = TestSigner::new(3, T0.into());
    let subkey = subkey_signer.public().clone();

    // A binding that advertises signing capability, but carries no
    // back signature: it must be rejected as tampered.
    let primary = cert.primary_key().clone();
    let sig = SignatureBuilder::new(SignatureType::SubkeyBinding)
        .set_signature_creation_time(Timestamp::from(T0)).unwrap()
        .set_key_flags(KeyFlags::empty().set_signing(true)).unwrap()
        .sign_subkey_binding(&mut primary_signer, &primary, &subkey)
        .unwrap();

    let cert = cert.insert_packets(
        vec![Packet::PublicSubkey(subkey.clone()), sig.clone().into()],
        &StandardPolicy::new()).unwrap();

    let binding = cert.subkeys().next().unwrap();
    assert!(binding.self_signatures().is_empty());
    assert!(binding.missing_cross_cert());
    // The primary key and its user ids remain valid.
    assert_eq!(cert.userids().next().unwrap().self_signatures().len(), 1);

    // With the cross certification requirement lifted, the binding
    // is accepted.
    let lax = StandardPolicy::new().require_cross_certification(false);
    let cert = Cert::from_packets(cert.into_packets(), &lax).unwrap();
    let binding = cert.subkeys().next().unwrap();
    assert_eq!(binding.self_signatures().len(), 1);
    assert!(!binding.missing_cross_cert());
}

#[test]
fn time_travel_is_rejected() {
    let future = Timestamp::now()
        .saturating_add(crate::types::Duration::seconds(10));
    let mut signer = TestSigner::new(4, future);

    let r = CertBuilder::new()
        .add_userid("tachyon@example.org")
        .generate(&mut signer, &StandardPolicy::new());
    let err = r.unwrap_err();
    assert_match!(Some(Error::TimeConflict { .. })
                  = err.downcast_ref::<Error>());

    // The tolerant policy accepts the key and records a warning.
    let tolerant = StandardPolicy::new().ignore_time_conflict(true);
    let cert = CertBuilder::new()
        .add_userid("tachyon@example.org")
        .generate(&mut signer, &tolerant).unwrap();
    assert_eq!(cert.time_conflict(), Some(future));
}

#[test]
fn revocation() {
    let (cert, mut signer) = basic_cert();
    assert_eq!(cert.revocation_status(),
               RevocationStatus::NotAsFarAsWeKnow);

    let revocation = CertRevocationBuilder::new()
        .set_signature_creation_time(Timestamp::from(T0 + 1)).unwrap()
        .set_reason_for_revocation(
            ReasonForRevocation::KeyRetired, b"retired").unwrap()
        .build(&mut signer, &cert).unwrap();

    let cert = cert.insert_packets(vec![revocation.into()],
                                   &StandardPolicy::new()).unwrap();
    match cert.revocation_status() {
        RevocationStatus::Revoked(sigs) => {
            assert_eq!(sigs.len(), 1);
            assert_eq!(sigs[0].reason_for_revocation().unwrap().0,
                       ReasonForRevocation::KeyRetired);
        },
        s => panic!("unexpected status {:?}", s),
    }
}

#[test]
fn userid_revocation() {
    let (cert, mut signer) = basic_cert();
    let uid = cert.userids().next().unwrap().userid().clone();

    let revocation = UserIDRevocationBuilder::new()
        .set_signature_creation_time(Timestamp::from(T0 + 1)).unwrap()
        .set_reason_for_revocation(
            ReasonForRevocation::UIDRetired, b"").unwrap()
        .build(&mut signer, &cert, &uid).unwrap();

    let cert = cert.insert_packets(vec![revocation.into()],
                                   &StandardPolicy::new()).unwrap();
    let binding = cert.userids().next().unwrap();
    assert_eq!(binding.revocations().len(), 1);
}

#[test]
fn subkey_expiration_update_appends() {
    let (cert, mut primary_signer) = basic_cert();
    let subkey = encryption_subkey(T0.into());
    let fpr = subkey.fingerprint();
    let policy = StandardPolicy::new();

    let template = SignatureBuilder::new(SignatureType::SubkeyBinding)
        .set_signature_creation_time(Timestamp::from(T0)).unwrap()
        .set_key_flags(KeyFlags::empty()
                       .set_transport_encryption(true)).unwrap();
    let cert = cert.bind_subkey(&mut primary_signer, subkey, template,
                                None, &policy).unwrap();

    let cert = cert.set_subkey_expiration(
        &mut primary_signer, &fpr,
        Some(crate::types::Duration::weeks(52).unwrap()),
        &policy).unwrap();

    // The old binding is still there; the new one wins.
    let binding = cert.subkeys().next().unwrap();
    assert_eq!(binding.self_signatures().len(), 2);
    let newest = binding.binding_signature().unwrap();
    assert_eq!(newest.key_validity_period(),
               Some(crate::types::Duration::weeks(52).unwrap()));
}

#[test]
fn designated_revoker_roundtrip() {
    let mut signer = TestSigner::new(5, T0.into());
    let revoker_fpr = crate::Fingerprint::V4([0x21; 20]);

    let cert = CertBuilder::new()
        .set_creation_time(Timestamp::from(T0))
        .add_userid("bob@example.org")
        .add_revocation_key(crate::types::RevocationKey::new(
            PublicKeyAlgorithm::EdDSA, revoker_fpr.clone(), false))
        .generate(&mut signer, &StandardPolicy::new()).unwrap();

    let parsed = Cert::from_bytes(&cert.to_vec().unwrap()).unwrap();
    let revokers: Vec<_> = parsed.revocation_keys().collect();
    assert_eq!(revokers.len(), 1);
    assert_eq!(revokers[0].revoker_fingerprint(), &revoker_fpr);
}

#[test]
fn direct_key_signature_without_userid() {
    let mut signer = TestSigner::new(6, T0.into());
    let cert = CertBuilder::new()
        .set_creation_time(Timestamp::from(T0))
        .set_preferences(Preferences::default())
        .generate(&mut signer, &StandardPolicy::new()).unwrap();

    assert_eq!(cert.userids().count(), 0);
    assert_eq!(cert.direct_signatures().len(), 1);
    let sig = &cert.direct_signatures()[0];
    assert_eq!(sig.typ(), SignatureType::DirectKey);
    assert!(sig.features().unwrap().supports_mdc());
}
