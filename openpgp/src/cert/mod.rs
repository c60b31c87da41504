//! OpenPGP key blocks.
//!
//! A certificate (key block) is an ordered tree: one primary key,
//! followed by user ids with their certification signatures, and
//! subkeys with their binding signatures.  This module parses packet
//! streams into that tree, validates the self signatures, enforces
//! the structural invariants, and serializes the tree back into the
//! exact on-wire order.
//!
//! All mutation is append-only: editing operations add new
//! signatures, they never rewrite existing ones.  This mirrors the
//! append-only nature of OpenPGP key history.

use std::fmt;
use std::io;

use crate::Error;
use crate::Fingerprint;
use crate::KeyHandle;
use crate::KeyID;
use crate::Packet;
use crate::Result;
use crate::crypto::Signer;
use crate::packet::signature::SignatureBuilder;
use crate::packet::{Key, Signature, Unknown, UserAttribute, UserID};
use crate::parse::{PacketParser, Parse};
use crate::policy::StandardPolicy;
use crate::serialize::{Serialize, SerializeInto};
use crate::types::{
    Duration,
    RevocationKey,
    SignatureType,
    Timestamp,
};

mod builder;
pub use builder::CertBuilder;
mod revoke;
pub use revoke::{
    CertRevocationBuilder,
    SubkeyRevocationBuilder,
    UserIDRevocationBuilder,
};

const TRACE: bool = false;

/// A user id, its self signatures, and third-party certifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIDBinding {
    userid: UserID,
    selfsigs: Vec<Signature>,
    certifications: Vec<Signature>,
    revocations: Vec<Signature>,
    bad: Vec<Signature>,
}

impl UserIDBinding {
    fn new(userid: UserID) -> Self {
        UserIDBinding {
            userid,
            selfsigs: Vec::new(),
            certifications: Vec::new(),
            revocations: Vec::new(),
            bad: Vec::new(),
        }
    }

    /// Returns the user id.
    pub fn userid(&self) -> &UserID {
        &self.userid
    }

    /// Returns the valid self signatures over this user id.
    pub fn self_signatures(&self) -> &[Signature] {
        &self.selfsigs
    }

    /// Returns the third-party certifications.  These cannot be
    /// verified without the certifier's key and are stored as is.
    pub fn certifications(&self) -> &[Signature] {
        &self.certifications
    }

    /// Returns the valid revocations of this user id.
    pub fn revocations(&self) -> &[Signature] {
        &self.revocations
    }

    /// Returns the most recent valid self signature.
    pub fn binding_signature(&self) -> Option<&Signature> {
        self.selfsigs.iter()
            .max_by_key(|s| s.signature_creation_time())
    }
}

/// A user attribute with its signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAttributeBinding {
    ua: UserAttribute,
    selfsigs: Vec<Signature>,
    certifications: Vec<Signature>,
    revocations: Vec<Signature>,
    bad: Vec<Signature>,
}

impl UserAttributeBinding {
    fn new(ua: UserAttribute) -> Self {
        UserAttributeBinding {
            ua,
            selfsigs: Vec::new(),
            certifications: Vec::new(),
            revocations: Vec::new(),
            bad: Vec::new(),
        }
    }

    /// Returns the user attribute.
    pub fn user_attribute(&self) -> &UserAttribute {
        &self.ua
    }

    /// Returns the valid self signatures over this user attribute.
    pub fn self_signatures(&self) -> &[Signature] {
        &self.selfsigs
    }

    /// Returns the valid revocations of this user attribute.
    pub fn revocations(&self) -> &[Signature] {
        &self.revocations
    }
}

/// A subkey with its binding signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubkeyBinding {
    subkey: Key,
    selfsigs: Vec<Signature>,
    revocations: Vec<Signature>,
    bad: Vec<Signature>,
    /// Set when a binding advertising signing capability was
    /// rejected for lack of a valid back signature.
    missing_cross_cert: bool,
}

impl SubkeyBinding {
    fn new(subkey: Key) -> Self {
        SubkeyBinding {
            subkey,
            selfsigs: Vec::new(),
            revocations: Vec::new(),
            bad: Vec::new(),
            missing_cross_cert: false,
        }
    }

    /// Returns the subkey.
    pub fn key(&self) -> &Key {
        &self.subkey
    }

    /// Returns the valid binding signatures.
    pub fn self_signatures(&self) -> &[Signature] {
        &self.selfsigs
    }

    /// Returns the valid revocations of this subkey.
    pub fn revocations(&self) -> &[Signature] {
        &self.revocations
    }

    /// Returns the most recent valid binding signature.
    pub fn binding_signature(&self) -> Option<&Signature> {
        self.selfsigs.iter()
            .max_by_key(|s| s.signature_creation_time())
    }

    /// Returns whether a binding was rejected because the
    /// signing-capable subkey is not cross-certified by a back
    /// signature.
    pub fn missing_cross_cert(&self) -> bool {
        self.missing_cross_cert
    }
}

/// The revocation status of a key block.
#[derive(Debug, PartialEq, Eq)]
pub enum RevocationStatus<'a> {
    /// The key is definitely revoked: a valid self revocation is
    /// present.
    Revoked(Vec<&'a Signature>),
    /// There is a revocation by a designated revoker which we could
    /// not verify locally.
    CouldBe(Vec<&'a Signature>),
    /// We have no evidence that the key is revoked.
    NotAsFarAsWeKnow,
}

/// A transferable public key (key block).
#[derive(Clone, PartialEq, Eq)]
pub struct Cert {
    primary: Key,

    /// Verified direct key signatures (0x1F).
    primary_selfsigs: Vec<Signature>,
    /// Verified key revocations (0x20) issued by the primary.
    primary_revocations: Vec<Signature>,
    /// Revocations by designated revokers; not locally verifiable.
    primary_other_revocations: Vec<Signature>,
    /// Signatures on the primary that did not verify.
    primary_bad: Vec<Signature>,

    userids: Vec<UserIDBinding>,
    user_attributes: Vec<UserAttributeBinding>,
    subkeys: Vec<SubkeyBinding>,

    /// Packets we do not understand, preserved verbatim.
    unknowns: Vec<Unknown>,
    /// Signatures that could not be anchored anywhere.
    bad: Vec<Signature>,

    /// Set when the primary key claims a creation time in the
    /// future and the policy tolerates it.
    time_conflict: Option<Timestamp>,
}

impl fmt::Debug for Cert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cert")
            .field("fingerprint", &self.fingerprint())
            .field("userids", &self.userids.len())
            .field("subkeys", &self.subkeys.len())
            .finish()
    }
}

impl<'a> Parse<'a, Cert> for Cert {
    fn from_bytes(data: &'a [u8]) -> Result<Cert> {
        let packets = PacketParser::new(data)
            .collect::<Result<Vec<Packet>>>()?;
        Cert::from_packets(packets, &StandardPolicy::new())
    }

    fn from_reader<R: io::Read>(mut reader: R) -> Result<Cert> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let packets = PacketParser::new(&buf)
            .collect::<Result<Vec<Packet>>>()?;
        Cert::from_packets(packets, &StandardPolicy::new())
    }
}

impl Serialize for Cert {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        for p in self.clone().into_packets() {
            p.serialize(o)?;
        }
        Ok(())
    }
}

impl SerializeInto for Cert {
    fn serialized_len(&self) -> usize {
        self.clone().into_packets().iter()
            .map(|p| p.serialized_len()).sum()
    }
}

impl Cert {
    /// Assembles a key block from a packet stream.
    ///
    /// The first packet must be a public key.  Self signatures are
    /// verified; signatures that do not check out are retained in
    /// the per-component `bad` lists and do not invalidate the other
    /// signatures of the block.
    pub fn from_packets(packets: Vec<Packet>, policy: &StandardPolicy)
                        -> Result<Cert>
    {
        tracer!(TRACE, "Cert::from_packets");

        // Group the packets under their anchors, the way they sit in
        // the stream.
        let mut packets = packets.into_iter();

        let primary = match packets.next() {
            Some(Packet::PublicKey(key)) => key,
            Some(p) => return Err(Error::MalformedCert(
                format!("Key block does not begin with a public key \
                         (found {})", p.tag())).into()),
            None => return Err(Error::MalformedCert(
                "Empty key block".into()).into()),
        };

        // A key from the future is either fatal or a warning,
        // depending on the policy.
        let now = Timestamp::now();
        let mut time_conflict = None;
        if primary.creation_time()
            > now.saturating_add(policy.tolerance())
        {
            if policy.ignores_time_conflict() {
                t!("primary key claims creation at {}, tolerated",
                   primary.creation_time());
                time_conflict = Some(primary.creation_time());
            } else {
                return Err(Error::TimeConflict {
                    claimed: primary.creation_time(),
                    now,
                }.into());
            }
        }

        if !primary.pk_algo().for_signing() {
            return Err(Error::MalformedCert(
                format!("Primary key algorithm {} cannot certify",
                        primary.pk_algo())).into());
        }

        enum Anchor {
            Primary,
            UserID(usize),
            UserAttribute(usize),
            Subkey(usize),
        }

        let mut cert = Cert {
            primary,
            primary_selfsigs: Vec::new(),
            primary_revocations: Vec::new(),
            primary_other_revocations: Vec::new(),
            primary_bad: Vec::new(),
            userids: Vec::new(),
            user_attributes: Vec::new(),
            subkeys: Vec::new(),
            unknowns: Vec::new(),
            bad: Vec::new(),
            time_conflict,
        };

        let mut anchor = Anchor::Primary;
        let mut primary_sigs: Vec<Signature> = Vec::new();
        let mut uid_sigs: Vec<Vec<Signature>> = Vec::new();
        let mut ua_sigs: Vec<Vec<Signature>> = Vec::new();
        let mut subkey_sigs: Vec<Vec<Signature>> = Vec::new();

        for packet in packets {
            match packet {
                Packet::PublicKey(_) => {
                    return Err(Error::MalformedCert(
                        "Multiple primary keys in key block".into()).into());
                },
                Packet::UserID(uid) => {
                    cert.userids.push(UserIDBinding::new(uid));
                    uid_sigs.push(Vec::new());
                    anchor = Anchor::UserID(cert.userids.len() - 1);
                },
                Packet::UserAttribute(ua) => {
                    cert.user_attributes.push(UserAttributeBinding::new(ua));
                    ua_sigs.push(Vec::new());
                    anchor = Anchor::UserAttribute(
                        cert.user_attributes.len() - 1);
                },
                Packet::PublicSubkey(key) => {
                    cert.subkeys.push(SubkeyBinding::new(key));
                    subkey_sigs.push(Vec::new());
                    anchor = Anchor::Subkey(cert.subkeys.len() - 1);
                },
                Packet::Unknown(u) => cert.unknowns.push(u),
                Packet::Signature(sig) => {
                    use SignatureType::*;
                    match (sig.typ(), &anchor) {
                        // Key-wide signatures are anchored at the
                        // primary no matter where they sit.
                        (DirectKey, _) | (KeyRevocation, _) =>
                            primary_sigs.push(sig),
                        (_, Anchor::UserID(i)) => uid_sigs[*i].push(sig),
                        (_, Anchor::UserAttribute(i)) =>
                            ua_sigs[*i].push(sig),
                        (_, Anchor::Subkey(i)) => subkey_sigs[*i].push(sig),
                        (_, Anchor::Primary) => cert.bad.push(sig),
                    }
                },
            }
        }

        cert.canonicalize(primary_sigs, uid_sigs, ua_sigs, subkey_sigs,
                          policy);
        Ok(cert)
    }

    /// Verifies the grouped signatures and sorts them into their
    /// final slots.
    fn canonicalize(&mut self,
                    primary_sigs: Vec<Signature>,
                    uid_sigs: Vec<Vec<Signature>>,
                    ua_sigs: Vec<Vec<Signature>>,
                    subkey_sigs: Vec<Vec<Signature>>,
                    policy: &StandardPolicy)
    {
        tracer!(TRACE, "Cert::canonicalize");

        let primary = self.primary.clone();
        let primary_handle = KeyHandle::from(primary.fingerprint());

        // The issuer key ID is lossy, so this only selects
        // candidates; the signature verification decides.
        let issued_by_primary = |sig: &Signature| -> bool {
            match sig.issuer() {
                Some(issuer) =>
                    KeyHandle::from(issuer).aliases(&primary_handle),
                // No issuer subpacket at all; assume a self
                // signature.
                None => true,
            }
        };

        // Primary key signatures first, so designated revokers are
        // known before we look at revocations by third parties.
        let mut deferred_revocations = Vec::new();
        for sig in primary_sigs {
            match sig.typ() {
                SignatureType::DirectKey if issued_by_primary(&sig) => {
                    match sig.verify_direct_key(&primary, &primary) {
                        Ok(()) => self.primary_selfsigs.push(sig),
                        Err(e) => {
                            t!("direct key signature: {}", e);
                            self.primary_bad.push(sig);
                        },
                    }
                },
                SignatureType::KeyRevocation if issued_by_primary(&sig) => {
                    match sig.verify_primary_key_revocation(&primary,
                                                            &primary) {
                        Ok(()) => self.primary_revocations.push(sig),
                        Err(e) => {
                            t!("key revocation: {}", e);
                            self.primary_bad.push(sig);
                        },
                    }
                },
                SignatureType::KeyRevocation =>
                    deferred_revocations.push(sig),
                _ => self.primary_bad.push(sig),
            }
        }

        // User ids.
        for (binding, sigs) in self.userids.iter_mut().zip(uid_sigs) {
            for sig in sigs {
                if sig.typ().is_certification() {
                    if issued_by_primary(&sig) {
                        match sig.verify_userid_binding(
                            &primary, &primary, &binding.userid)
                        {
                            Ok(()) => binding.selfsigs.push(sig),
                            Err(e) => {
                                t!("uid self signature: {}", e);
                                binding.bad.push(sig);
                            },
                        }
                    } else {
                        binding.certifications.push(sig);
                    }
                } else if sig.typ()
                    == SignatureType::CertificationRevocation
                {
                    if issued_by_primary(&sig) {
                        match sig.verify_userid_revocation(
                            &primary, &primary, &binding.userid)
                        {
                            Ok(()) => binding.revocations.push(sig),
                            Err(e) => {
                                t!("uid revocation: {}", e);
                                binding.bad.push(sig);
                            },
                        }
                    } else {
                        binding.certifications.push(sig);
                    }
                } else {
                    binding.bad.push(sig);
                }
            }
        }

        // User attributes.
        for (binding, sigs) in self.user_attributes.iter_mut().zip(ua_sigs) {
            for sig in sigs {
                if sig.typ().is_certification() {
                    if issued_by_primary(&sig) {
                        match sig.verify_user_attribute_binding(
                            &primary, &primary, &binding.ua)
                        {
                            Ok(()) => binding.selfsigs.push(sig),
                            Err(_) => binding.bad.push(sig),
                        }
                    } else {
                        binding.certifications.push(sig);
                    }
                } else if sig.typ()
                    == SignatureType::CertificationRevocation
                {
                    if issued_by_primary(&sig) {
                        match sig.verify_user_attribute_revocation(
                            &primary, &primary, &binding.ua)
                        {
                            Ok(()) => binding.revocations.push(sig),
                            Err(_) => binding.bad.push(sig),
                        }
                    } else {
                        binding.certifications.push(sig);
                    }
                } else {
                    binding.bad.push(sig);
                }
            }
        }

        // Subkeys.  A binding that advertises signing capability
        // must embed a back signature issued by the subkey; without
        // it, anyone could claim someone else's signing subkey as
        // their own.
        for (binding, sigs) in self.subkeys.iter_mut().zip(subkey_sigs) {
            for sig in sigs {
                match sig.typ() {
                    SignatureType::SubkeyBinding => {
                        if !issued_by_primary(&sig) {
                            binding.bad.push(sig);
                            continue;
                        }
                        match sig.verify_subkey_binding(
                            &primary, &primary, &binding.subkey)
                        {
                            Ok(()) => {
                                let needs_backsig = sig.key_flags()
                                    .map(|f| f.for_signing())
                                    .unwrap_or(false);
                                if needs_backsig
                                    && policy.requires_cross_certification()
                                {
                                    let backsig_ok = sig.embedded_signature()
                                        .map(|backsig| {
                                            backsig
                                                .verify_primary_key_binding(
                                                    &primary,
                                                    &binding.subkey)
                                                .is_ok()
                                        })
                                        .unwrap_or(false);
                                    if backsig_ok {
                                        binding.selfsigs.push(sig);
                                    } else {
                                        t!("{}: {}",
                                           binding.subkey.fingerprint(),
                                           Error::MissingCrossCert(
                                               binding.subkey
                                                   .fingerprint()
                                                   .to_string()));
                                        binding.missing_cross_cert = true;
                                        binding.bad.push(sig);
                                    }
                                } else {
                                    binding.selfsigs.push(sig);
                                }
                            },
                            Err(e) => {
                                t!("subkey binding: {}", e);
                                binding.bad.push(sig);
                            },
                        }
                    },
                    SignatureType::SubkeyRevocation
                        if issued_by_primary(&sig) =>
                    {
                        match sig.verify_subkey_revocation(
                            &primary, &primary, &binding.subkey)
                        {
                            Ok(()) => binding.revocations.push(sig),
                            Err(_) => binding.bad.push(sig),
                        }
                    },
                    _ => binding.bad.push(sig),
                }
            }
        }

        // Now all designated revokers are known; anchor third-party
        // revocations we cannot verify locally.
        let revokers: Vec<KeyID> = self.revocation_keys()
            .map(|rk| rk.revoker_fingerprint().to_keyid())
            .collect();
        for sig in deferred_revocations {
            let from_designated = sig.issuer()
                .map(|issuer| revokers.iter().any(|r| *r == issuer))
                .unwrap_or(false);
            if from_designated {
                self.primary_other_revocations.push(sig);
            } else {
                self.primary_bad.push(sig);
            }
        }
    }

    /// Returns the primary key.
    pub fn primary_key(&self) -> &Key {
        &self.primary
    }

    /// Returns the fingerprint of the primary key.
    pub fn fingerprint(&self) -> Fingerprint {
        self.primary.fingerprint()
    }

    /// Returns the key ID of the primary key.
    pub fn keyid(&self) -> KeyID {
        self.primary.keyid()
    }

    /// Returns the verified direct key signatures.
    pub fn direct_signatures(&self) -> &[Signature] {
        &self.primary_selfsigs
    }

    /// Returns the user id bindings.
    pub fn userids(&self) -> impl Iterator<Item = &UserIDBinding> {
        self.userids.iter()
    }

    /// Returns the user attribute bindings.
    pub fn user_attributes(&self)
                           -> impl Iterator<Item = &UserAttributeBinding>
    {
        self.user_attributes.iter()
    }

    /// Returns the subkey bindings.
    pub fn subkeys(&self) -> impl Iterator<Item = &SubkeyBinding> {
        self.subkeys.iter()
    }

    /// Returns all signatures that failed to verify.
    pub fn bad_signatures(&self) -> impl Iterator<Item = &Signature> {
        self.bad.iter()
            .chain(self.primary_bad.iter())
            .chain(self.userids.iter().flat_map(|u| u.bad.iter()))
            .chain(self.user_attributes.iter().flat_map(|u| u.bad.iter()))
            .chain(self.subkeys.iter().flat_map(|s| s.bad.iter()))
    }

    /// Returns the designated revokers, collected from the hashed
    /// areas of the primary key's self signatures.
    pub fn revocation_keys(&self)
                           -> impl Iterator<Item = &RevocationKey>
    {
        self.primary_selfsigs.iter()
            .chain(self.userids.iter().flat_map(|u| u.selfsigs.iter()))
            .flat_map(|sig| sig.revocation_keys())
    }

    /// Returns the revocation status of the primary key.
    pub fn revocation_status(&self) -> RevocationStatus {
        if !self.primary_revocations.is_empty() {
            RevocationStatus::Revoked(
                self.primary_revocations.iter().collect())
        } else if !self.primary_other_revocations.is_empty() {
            RevocationStatus::CouldBe(
                self.primary_other_revocations.iter().collect())
        } else {
            RevocationStatus::NotAsFarAsWeKnow
        }
    }

    /// Returns the creation time the primary key claims, if it lies
    /// in the future and was tolerated by the policy.
    pub fn time_conflict(&self) -> Option<Timestamp> {
        self.time_conflict
    }

    /// Decomposes the key block into packets, in the canonical
    /// on-wire order.
    pub fn into_packets(self) -> Vec<Packet> {
        let mut p = Vec::new();

        p.push(Packet::PublicKey(self.primary));
        p.extend(self.primary_revocations.into_iter().map(Packet::from));
        p.extend(self.primary_other_revocations.into_iter()
                 .map(Packet::from));
        p.extend(self.primary_selfsigs.into_iter().map(Packet::from));
        p.extend(self.primary_bad.into_iter().map(Packet::from));

        for u in self.userids {
            p.push(Packet::UserID(u.userid));
            p.extend(u.selfsigs.into_iter().map(Packet::from));
            p.extend(u.certifications.into_iter().map(Packet::from));
            p.extend(u.revocations.into_iter().map(Packet::from));
            p.extend(u.bad.into_iter().map(Packet::from));
        }

        for u in self.user_attributes {
            p.push(Packet::UserAttribute(u.ua));
            p.extend(u.selfsigs.into_iter().map(Packet::from));
            p.extend(u.certifications.into_iter().map(Packet::from));
            p.extend(u.revocations.into_iter().map(Packet::from));
            p.extend(u.bad.into_iter().map(Packet::from));
        }

        for s in self.subkeys {
            p.push(Packet::PublicSubkey(s.subkey));
            p.extend(s.selfsigs.into_iter().map(Packet::from));
            p.extend(s.revocations.into_iter().map(Packet::from));
            p.extend(s.bad.into_iter().map(Packet::from));
        }

        p.extend(self.unknowns.into_iter().map(Packet::Unknown));
        p.extend(self.bad.into_iter().map(Packet::from));

        p
    }

    /// Merges the given packets into the key block.
    ///
    /// This is the append-only editing primitive: revocations, new
    /// bindings, and new components are added by inserting the
    /// packets and re-validating.
    pub fn insert_packets(self, packets: Vec<Packet>,
                          policy: &StandardPolicy)
                          -> Result<Cert>
    {
        let mut all = self.into_packets();
        all.extend(packets);
        Cert::from_packets(all, policy)
    }

    /// Binds a new user id to the key block.
    ///
    /// `template` provides the signature fields; type, creation
    /// time and issuer are filled in.
    pub fn bind_userid(self, signer: &mut dyn Signer, userid: UserID,
                       template: SignatureBuilder,
                       policy: &StandardPolicy)
                       -> Result<Cert>
    {
        let sig = template
            .set_type(SignatureType::PositiveCertification)
            .sign_userid_binding(signer, &self.primary, &userid)?;
        self.insert_packets(vec![userid.into(), sig.into()], policy)
    }

    /// Binds a new subkey to the key block.
    ///
    /// If the binding grants signing capability, `subkey_signer`
    /// must be given so the back signature can be created.
    pub fn bind_subkey(self, primary_signer: &mut dyn Signer,
                       subkey: Key,
                       template: SignatureBuilder,
                       mut subkey_signer: Option<&mut dyn Signer>,
                       policy: &StandardPolicy)
                       -> Result<Cert>
    {
        let mut template = template
            .set_type(SignatureType::SubkeyBinding);

        let signing_capable = template.key_flags()
            .map(|f| f.for_signing())
            .unwrap_or(false);
        if signing_capable {
            let signer = match subkey_signer.as_deref_mut() {
                Some(s) => s,
                None => return Err(Error::InvalidOperation(
                    "Signing-capable subkey requires the subkey's \
                     signer for the back signature".into()).into()),
            };

            let backsig = SignatureBuilder::new(
                SignatureType::PrimaryKeyBinding)
                .set_hash_algo(template.hash_algo())
                .set_signature_creation_time(
                    template.signature_creation_time()
                        .unwrap_or_else(Timestamp::now))?
                .sign_primary_key_binding(signer, &self.primary, &subkey)?;
            template = template.set_embedded_signature(backsig)?;
        }

        let sig = template
            .sign_subkey_binding(primary_signer, &self.primary, &subkey)?;
        self.insert_packets(
            vec![Packet::PublicSubkey(subkey), sig.into()], policy)
    }

    /// Changes a subkey's expiration by issuing a fresh binding
    /// signature.
    ///
    /// The new binding copies the fields of the subkey's current
    /// binding signature (including an embedded back signature,
    /// which stays valid since it is over the same key pair), with a
    /// fresh creation time and the new expiration.
    pub fn set_subkey_expiration(self, primary_signer: &mut dyn Signer,
                                 subkey_fpr: &Fingerprint,
                                 expiration: Option<Duration>,
                                 policy: &StandardPolicy)
                                 -> Result<Cert>
    {
        let (subkey, template) = {
            let binding = self.subkeys.iter()
                .find(|s| &s.subkey.fingerprint() == subkey_fpr)
                .ok_or_else(|| Error::InvalidArgument(
                    format!("No subkey {}", subkey_fpr)))?;
            let current = binding.binding_signature()
                .ok_or_else(|| Error::InvalidOperation(
                    format!("Subkey {} has no valid binding",
                            subkey_fpr)))?;
            (binding.subkey.clone(),
             SignatureBuilder::from(current.clone()))
        };

        let sig = template
            .set_signature_creation_time(Timestamp::now())?
            .set_key_validity_period(expiration)?
            .sign_subkey_binding(primary_signer, &self.primary, &subkey)?;
        self.insert_packets(vec![sig.into()], policy)
    }
}

#[cfg(test)]
mod tests;
