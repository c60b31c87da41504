//! Types for signatures.
//!
//! Signatures hold a key block together: self signatures bind user
//! ids to the primary key, binding signatures bind subkeys, back
//! signatures prove that a signing subkey consents to the binding,
//! direct key signatures attach key-wide metadata, and revocation
//! signatures retire any of them.
//!
//! Each class hashes its targets in a fixed order, then the
//! signature's own hashed fields, then a trailer.  Getting a single
//! byte of this wrong breaks every downstream signature, so the
//! hashing functions in this module are the single source of truth:
//! both the builder and the verifier go through them.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::Error;
use crate::KeyID;
use crate::Result;
use crate::crypto::{Signer, backend};
use crate::crypto::hash::{self, Hash};
use crate::crypto::mpi;
use crate::packet::{Key, UserAttribute, UserID};
use crate::types::{
    CompressionAlgorithm,
    Duration,
    Features,
    HashAlgorithm,
    KeyFlags,
    KeyServerPreferences,
    PublicKeyAlgorithm,
    ReasonForRevocation,
    RevocationKey,
    SignatureType,
    SymmetricAlgorithm,
    Timestamp,
};

pub mod subpacket;
use subpacket::{
    NotationData,
    Subpacket,
    SubpacketArea,
    SubpacketTag,
    SubpacketValue,
};

/// The fields shared by the signature builder and finished
/// signatures.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SignatureFields {
    /// Version of the signature packet.  New signatures are always
    /// version 4.
    version: u8,
    /// Type of signature.
    typ: SignatureType,
    /// Public-key algorithm used for this signature.
    pk_algo: PublicKeyAlgorithm,
    /// Hash algorithm used to compute the signature.
    hash_algo: HashAlgorithm,
    /// Subpackets that are covered by the signature.
    hashed_area: SubpacketArea,
    /// Subpackets that are advisory only.
    unhashed_area: SubpacketArea,

    /// Creation time and issuer of a version 3 signature, which
    /// carries them as plain fields instead of subpackets.
    v3_info: Option<(Timestamp, KeyID)>,
}

impl SignatureFields {
    /// Used by the parser.
    pub(crate) fn new_v4(typ: SignatureType,
                         pk_algo: PublicKeyAlgorithm,
                         hash_algo: HashAlgorithm,
                         hashed_area: SubpacketArea,
                         unhashed_area: SubpacketArea)
                         -> SignatureFields
    {
        SignatureFields {
            version: 4,
            typ,
            pk_algo,
            hash_algo,
            hashed_area,
            unhashed_area,
            v3_info: None,
        }
    }

    /// Gets the version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Gets the signature type.
    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    /// Gets the public key algorithm.
    pub fn pk_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Gets the hash algorithm.
    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }

    /// Gets a reference to the hashed area.
    pub fn hashed_area(&self) -> &SubpacketArea {
        &self.hashed_area
    }

    /// Gets a mutable reference to the hashed area.
    pub fn hashed_area_mut(&mut self) -> &mut SubpacketArea {
        &mut self.hashed_area
    }

    /// Gets a reference to the unhashed area.
    pub fn unhashed_area(&self) -> &SubpacketArea {
        &self.unhashed_area
    }

    /// Gets a mutable reference to the unhashed area.
    pub fn unhashed_area_mut(&mut self) -> &mut SubpacketArea {
        &mut self.unhashed_area
    }

    /// Returns the subpacket with the given tag from the hashed
    /// area.
    ///
    /// Only the hashed area is consulted: everything in the unhashed
    /// area can be tampered with.
    fn subpacket(&self, tag: SubpacketTag) -> Option<&Subpacket> {
        self.hashed_area.lookup(tag)
    }

    /// Returns the subpacket with the given tag, falling back to the
    /// unhashed area.
    ///
    /// Used only for subpackets that are advisory by nature, like
    /// the issuer key ID and the embedded signature.
    fn subpacket_fallback(&self, tag: SubpacketTag) -> Option<&Subpacket> {
        self.hashed_area.lookup(tag)
            .or_else(|| self.unhashed_area.lookup(tag))
    }

    /// Returns the time the signature was created.
    pub fn signature_creation_time(&self) -> Option<Timestamp> {
        if let Some((t, _)) = &self.v3_info {
            return Some(*t);
        }
        match self.subpacket(SubpacketTag::SignatureCreationTime)?.value() {
            SubpacketValue::SignatureCreationTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the signature's validity period, relative to its
    /// creation time.
    pub fn signature_validity_period(&self) -> Option<Duration> {
        match self.subpacket(SubpacketTag::SignatureExpirationTime)?.value() {
            SubpacketValue::SignatureExpirationTime(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the key's validity period, relative to the key's
    /// creation time.
    pub fn key_validity_period(&self) -> Option<Duration> {
        match self.subpacket(SubpacketTag::KeyExpirationTime)?.value() {
            SubpacketValue::KeyExpirationTime(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the issuer key ID.
    pub fn issuer(&self) -> Option<KeyID> {
        if let Some((_, id)) = &self.v3_info {
            return Some(id.clone());
        }
        match self.subpacket_fallback(SubpacketTag::Issuer)?.value() {
            SubpacketValue::Issuer(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Returns the key flags.
    pub fn key_flags(&self) -> Option<KeyFlags> {
        match self.subpacket(SubpacketTag::KeyFlags)?.value() {
            SubpacketValue::KeyFlags(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the features.
    pub fn features(&self) -> Option<Features> {
        match self.subpacket(SubpacketTag::Features)?.value() {
            SubpacketValue::Features(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the symmetric algorithms the key holder prefers.
    pub fn preferred_symmetric_algorithms(&self)
                                          -> Option<&[SymmetricAlgorithm]>
    {
        match self.subpacket(SubpacketTag::PreferredSymmetricAlgorithms)?
            .value()
        {
            SubpacketValue::PreferredSymmetricAlgorithms(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the hash algorithms the key holder prefers.
    pub fn preferred_hash_algorithms(&self) -> Option<&[HashAlgorithm]> {
        match self.subpacket(SubpacketTag::PreferredHashAlgorithms)?.value() {
            SubpacketValue::PreferredHashAlgorithms(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the compression algorithms the key holder prefers.
    pub fn preferred_compression_algorithms(&self)
                                            -> Option<&[CompressionAlgorithm]>
    {
        match self.subpacket(SubpacketTag::PreferredCompressionAlgorithms)?
            .value()
        {
            SubpacketValue::PreferredCompressionAlgorithms(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the key server preferences.
    pub fn key_server_preferences(&self) -> Option<KeyServerPreferences> {
        match self.subpacket(SubpacketTag::KeyServerPreferences)?.value() {
            SubpacketValue::KeyServerPreferences(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns the URI of the key holder's preferred key server.
    pub fn preferred_key_server(&self) -> Option<&[u8]> {
        match self.subpacket(SubpacketTag::PreferredKeyServer)?.value() {
            SubpacketValue::PreferredKeyServer(uri) => Some(uri),
            _ => None,
        }
    }

    /// Returns whether the user id this signature is over is the
    /// primary user id.
    pub fn primary_userid(&self) -> Option<bool> {
        match self.subpacket(SubpacketTag::PrimaryUserID)?.value() {
            SubpacketValue::PrimaryUserID(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns the policy URI.
    pub fn policy_uri(&self) -> Option<&[u8]> {
        match self.subpacket(SubpacketTag::PolicyURI)?.value() {
            SubpacketValue::PolicyURI(uri) => Some(uri),
            _ => None,
        }
    }

    /// Returns the user id responsible for the signing.
    pub fn signers_user_id(&self) -> Option<&[u8]> {
        match self.subpacket(SubpacketTag::SignersUserID)?.value() {
            SubpacketValue::SignersUserID(uid) => Some(uid),
            _ => None,
        }
    }

    /// Returns the reason for revocation.
    pub fn reason_for_revocation(&self)
                                 -> Option<(ReasonForRevocation, &[u8])>
    {
        match self.subpacket(SubpacketTag::ReasonForRevocation)?.value() {
            SubpacketValue::ReasonForRevocation { code, reason } =>
                Some((*code, reason)),
            _ => None,
        }
    }

    /// Returns the designated revokers.
    pub fn revocation_keys(&self) -> impl Iterator<Item = &RevocationKey> {
        self.hashed_area.iter().filter_map(|sp| match sp.value() {
            SubpacketValue::RevocationKey(rk) => Some(rk),
            _ => None,
        })
    }

    /// Returns the notations.
    ///
    /// Unlike other subpackets, notations accumulate.
    pub fn notation_data(&self) -> Vec<&NotationData> {
        self.hashed_area.iter().filter_map(|sp| match sp.value() {
            SubpacketValue::NotationData(n) => Some(n),
            _ => None,
        }).collect()
    }

    /// Returns the embedded back signature.
    pub fn embedded_signature(&self) -> Option<&Signature> {
        match self.subpacket_fallback(SubpacketTag::EmbeddedSignature)?
            .value()
        {
            SubpacketValue::EmbeddedSignature(sig) => Some(sig),
            _ => None,
        }
    }

    /// Hashes this signature's own contribution: the fields covered
    /// by the signature and the trailer.
    pub(crate) fn hash(&self, hash: &mut hash::Context) {
        if self.version == 3 {
            // A version 3 signature hashes the type and the creation
            // time, nothing else.
            let t = self.v3_info.as_ref()
                .map(|(t, _)| u32::from(*t))
                .unwrap_or(0);
            hash.update(&[u8::from(self.typ)]);
            hash.update(&t.to_be_bytes());
            return;
        }

        // A version 4 signature hashes its version, type,
        // algorithms, and the hashed subpacket area, followed by a
        // trailer giving the length of that contribution.
        let mut hashed = Vec::new();
        self.hashed_area.emit(&mut hashed);

        let mut header = [0u8; 6];
        header[0] = self.version;
        header[1] = self.typ.into();
        header[2] = self.pk_algo.into();
        header[3] = self.hash_algo.into();
        header[4] = (hashed.len() >> 8) as u8;
        header[5] = hashed.len() as u8;

        hash.update(&header[..]);
        hash.update(&hashed);

        let mut trailer = [0u8; 6];
        trailer[0] = self.version;
        trailer[1] = 0xff;
        let len = (header.len() + hashed.len()) as u32;
        trailer[2..6].copy_from_slice(&len.to_be_bytes());

        hash.update(&trailer[..]);
    }

    fn context(&self) -> Result<hash::Context> {
        self.hash_algo.context()
    }

    /// Computes the digest for a signature over the primary key
    /// alone (direct key signatures and key revocations).
    pub(crate) fn digest_direct_key(&self, pk: &Key) -> Result<Vec<u8>> {
        let mut h = self.context()?;
        pk.hash(&mut h);
        self.hash(&mut h);
        Ok(h.into_digest())
    }

    /// Computes the digest for a certification over the primary key
    /// and a user id.
    pub(crate) fn digest_userid_binding(&self, pk: &Key, userid: &UserID)
                                        -> Result<Vec<u8>>
    {
        let mut h = self.context()?;
        pk.hash(&mut h);
        if self.version == 3 {
            // Version 3 signatures hash the user id naked, without
            // the constant and the length.
            h.update(userid.value());
        } else {
            userid.hash(&mut h);
        }
        self.hash(&mut h);
        Ok(h.into_digest())
    }

    /// Computes the digest for a certification over the primary key
    /// and a user attribute.
    pub(crate) fn digest_user_attribute_binding(&self, pk: &Key,
                                                ua: &UserAttribute)
                                                -> Result<Vec<u8>>
    {
        let mut h = self.context()?;
        pk.hash(&mut h);
        if self.version == 3 {
            h.update(ua.value());
        } else {
            ua.hash(&mut h);
        }
        self.hash(&mut h);
        Ok(h.into_digest())
    }

    /// Computes the digest for a signature over the primary key and
    /// a subkey (bindings, back signatures, and subkey
    /// revocations).
    pub(crate) fn digest_subkey_binding(&self, pk: &Key, subkey: &Key)
                                        -> Result<Vec<u8>>
    {
        let mut h = self.context()?;
        pk.hash(&mut h);
        subkey.hash(&mut h);
        self.hash(&mut h);
        Ok(h.into_digest())
    }
}

/// Builds a signature packet.
///
/// This is the mutable version of a `Signature` packet.  To convert
/// it to one, sign something with it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SignatureBuilder {
    fields: SignatureFields,
}

impl Deref for SignatureBuilder {
    type Target = SignatureFields;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl DerefMut for SignatureBuilder {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.fields
    }
}

impl From<Signature> for SignatureBuilder {
    fn from(sig: Signature) -> Self {
        let mut fields = sig.fields;
        fields.version = 4;
        fields.v3_info = None;
        SignatureBuilder { fields }
    }
}

impl SignatureBuilder {
    /// Returns a new `SignatureBuilder` object.
    pub fn new(typ: SignatureType) -> Self {
        SignatureBuilder {
            fields: SignatureFields {
                version: 4,
                typ,
                pk_algo: PublicKeyAlgorithm::Unknown(0),
                hash_algo: HashAlgorithm::SHA256,
                hashed_area: SubpacketArea::empty(),
                unhashed_area: SubpacketArea::empty(),
                v3_info: None,
            },
        }
    }

    /// Sets the signature type.
    pub fn set_type(mut self, t: SignatureType) -> Self {
        self.fields.typ = t;
        self
    }

    /// Sets the hash algorithm.
    pub fn set_hash_algo(mut self, h: HashAlgorithm) -> Self {
        self.fields.hash_algo = h;
        self
    }

    /// Sets the signature's creation time.
    pub fn set_signature_creation_time(mut self, t: Timestamp)
                                       -> Result<Self>
    {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::SignatureCreationTime(t), false))?;
        Ok(self)
    }

    /// Sets the signature's validity period, relative to its
    /// creation time.
    pub fn set_signature_validity_period(mut self, d: Duration)
                                         -> Result<Self>
    {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::SignatureExpirationTime(d), false))?;
        Ok(self)
    }

    /// Sets the key's validity period, relative to the key's
    /// creation time.  `None` means the key never expires.
    pub fn set_key_validity_period(mut self, d: Option<Duration>)
                                   -> Result<Self>
    {
        match d {
            Some(d) =>
                self.fields.hashed_area_mut().replace(Subpacket::new(
                    SubpacketValue::KeyExpirationTime(d), false))?,
            None =>
                self.fields.hashed_area_mut()
                    .remove_all(SubpacketTag::KeyExpirationTime),
        }
        Ok(self)
    }

    /// Sets the key flags.
    pub fn set_key_flags(mut self, flags: KeyFlags) -> Result<Self> {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::KeyFlags(flags), false))?;
        Ok(self)
    }

    /// Sets the preferred symmetric algorithms.
    pub fn set_preferred_symmetric_algorithms(
        mut self, preferences: Vec<SymmetricAlgorithm>)
        -> Result<Self>
    {
        check_preference_list_len(preferences.len())?;
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::PreferredSymmetricAlgorithms(preferences),
            false))?;
        Ok(self)
    }

    /// Sets the preferred hash algorithms.
    pub fn set_preferred_hash_algorithms(
        mut self, preferences: Vec<HashAlgorithm>)
        -> Result<Self>
    {
        check_preference_list_len(preferences.len())?;
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::PreferredHashAlgorithms(preferences), false))?;
        Ok(self)
    }

    /// Sets the preferred compression algorithms.
    pub fn set_preferred_compression_algorithms(
        mut self, preferences: Vec<CompressionAlgorithm>)
        -> Result<Self>
    {
        check_preference_list_len(preferences.len())?;
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::PreferredCompressionAlgorithms(preferences),
            false))?;
        Ok(self)
    }

    /// Sets the features.
    pub fn set_features(mut self, features: Features) -> Result<Self> {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::Features(features), false))?;
        Ok(self)
    }

    /// Sets the key server preferences.
    pub fn set_key_server_preferences(
        mut self, preferences: KeyServerPreferences)
        -> Result<Self>
    {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::KeyServerPreferences(preferences), false))?;
        Ok(self)
    }

    /// Sets the preferred key server.
    pub fn set_preferred_key_server<U: AsRef<[u8]>>(mut self, uri: U)
                                                    -> Result<Self>
    {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::PreferredKeyServer(uri.as_ref().to_vec()),
            false))?;
        Ok(self)
    }

    /// Sets the policy URI.
    pub fn set_policy_uri<U: AsRef<[u8]>>(mut self, uri: U) -> Result<Self> {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::PolicyURI(uri.as_ref().to_vec()), false))?;
        Ok(self)
    }

    /// Marks the user id this signature is over as the primary user
    /// id.
    pub fn set_primary_userid(mut self, primary: bool) -> Result<Self> {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::PrimaryUserID(primary), false))?;
        Ok(self)
    }

    /// Adds a notation.  Notations accumulate; this never replaces
    /// an existing one.
    pub fn add_notation(mut self, notation: NotationData) -> Result<Self> {
        self.fields.hashed_area_mut().add(Subpacket::new(
            SubpacketValue::NotationData(notation), false))?;
        Ok(self)
    }

    /// Sets the designated revokers.
    pub fn set_revocation_keys(mut self, revokers: Vec<RevocationKey>)
                               -> Result<Self>
    {
        self.fields.hashed_area_mut()
            .remove_all(SubpacketTag::RevocationKey);
        for rk in revokers {
            let sensitive = rk.sensitive();
            self.fields.hashed_area_mut().add(Subpacket::new(
                SubpacketValue::RevocationKey(rk), sensitive))?;
        }
        Ok(self)
    }

    /// Sets the reason for revocation.
    pub fn set_reason_for_revocation<R: AsRef<[u8]>>(
        mut self, code: ReasonForRevocation, reason: R)
        -> Result<Self>
    {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::ReasonForRevocation {
                code,
                reason: reason.as_ref().to_vec(),
            }, false))?;
        Ok(self)
    }

    /// Sets the user id responsible for the signing.
    pub fn set_signers_user_id<U: AsRef<[u8]>>(mut self, uid: U)
                                               -> Result<Self>
    {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::SignersUserID(uid.as_ref().to_vec()), false))?;
        Ok(self)
    }

    /// Embeds a back signature.
    pub fn set_embedded_signature(mut self, sig: Signature) -> Result<Self> {
        self.fields.hashed_area_mut().replace(Subpacket::new(
            SubpacketValue::EmbeddedSignature(Box::new(sig)), false))?;
        Ok(self)
    }

    /// Sets the issuer, carried in the unhashed area.
    pub fn set_issuer(mut self, issuer: KeyID) -> Result<Self> {
        self.fields.hashed_area_mut().remove_all(SubpacketTag::Issuer);
        self.fields.unhashed_area_mut().replace(Subpacket::new(
            SubpacketValue::Issuer(issuer), false))?;
        Ok(self)
    }

    /// Creates a certification over the primary key and a user id.
    pub fn sign_userid_binding(self, signer: &mut dyn Signer,
                               pk: &Key, userid: &UserID)
                               -> Result<Signature>
    {
        if !(self.typ.is_certification()
             || self.typ == SignatureType::CertificationRevocation)
        {
            return Err(Error::UnsupportedSignatureType(self.typ).into());
        }

        let fields = self.pre_sign(signer)?;
        let digest = fields.digest_userid_binding(pk, userid)?;
        Self::sign_digest(fields, signer, digest)
    }

    /// Creates a certification over the primary key and a user
    /// attribute.
    pub fn sign_user_attribute_binding(self, signer: &mut dyn Signer,
                                       pk: &Key, ua: &UserAttribute)
                                       -> Result<Signature>
    {
        if !(self.typ.is_certification()
             || self.typ == SignatureType::CertificationRevocation)
        {
            return Err(Error::UnsupportedSignatureType(self.typ).into());
        }

        let fields = self.pre_sign(signer)?;
        let digest = fields.digest_user_attribute_binding(pk, ua)?;
        Self::sign_digest(fields, signer, digest)
    }

    /// Creates a subkey binding or subkey revocation signature.
    ///
    /// `signer` must hold the primary key.
    pub fn sign_subkey_binding(self, signer: &mut dyn Signer,
                               pk: &Key, subkey: &Key)
                               -> Result<Signature>
    {
        if !(self.typ == SignatureType::SubkeyBinding
             || self.typ == SignatureType::SubkeyRevocation)
        {
            return Err(Error::UnsupportedSignatureType(self.typ).into());
        }

        let fields = self.pre_sign(signer)?;
        let digest = fields.digest_subkey_binding(pk, subkey)?;
        Self::sign_digest(fields, signer, digest)
    }

    /// Creates a primary key binding signature, also known as a back
    /// signature or cross certification.
    ///
    /// `subkey_signer` must hold the signing-capable subkey.
    pub fn sign_primary_key_binding(self, subkey_signer: &mut dyn Signer,
                                    pk: &Key, subkey: &Key)
                                    -> Result<Signature>
    {
        if self.typ != SignatureType::PrimaryKeyBinding {
            return Err(Error::UnsupportedSignatureType(self.typ).into());
        }

        let fields = self.pre_sign(subkey_signer)?;
        let digest = fields.digest_subkey_binding(pk, subkey)?;
        Self::sign_digest(fields, subkey_signer, digest)
    }

    /// Creates a direct key signature or a key revocation.
    pub fn sign_direct_key(self, signer: &mut dyn Signer, pk: &Key)
                           -> Result<Signature>
    {
        if !(self.typ == SignatureType::DirectKey
             || self.typ == SignatureType::KeyRevocation)
        {
            return Err(Error::UnsupportedSignatureType(self.typ).into());
        }

        let fields = self.pre_sign(signer)?;
        let digest = fields.digest_direct_key(pk)?;
        Self::sign_digest(fields, signer, digest)
    }

    /// Fills in the fields every new signature carries: the issuing
    /// algorithm, the creation time, and the issuer key id.
    fn pre_sign(self, signer: &dyn Signer) -> Result<SignatureFields> {
        let mut fields = self.fields;

        if fields.version != 4 {
            return Err(Error::UnsupportedVersion(fields.version).into());
        }
        if !fields.hash_algo.is_supported() {
            return Err(
                Error::UnsupportedHashAlgorithm(fields.hash_algo).into());
        }

        fields.pk_algo = signer.public().pk_algo();
        if !fields.pk_algo.for_signing() {
            return Err(
                Error::UnsupportedPublicKeyAlgorithm(fields.pk_algo).into());
        }

        // Every signature must carry its creation time in the hashed
        // area.
        if fields.hashed_area()
            .lookup(SubpacketTag::SignatureCreationTime).is_none()
        {
            fields.hashed_area_mut().add(Subpacket::new(
                SubpacketValue::SignatureCreationTime(Timestamp::now()),
                false))?;
        }

        // The issuer is advisory and goes to the unhashed area.
        if fields.issuer().is_none() {
            fields.unhashed_area_mut().replace(Subpacket::new(
                SubpacketValue::Issuer(signer.public().keyid()), false))?;
        }

        Ok(fields)
    }

    fn sign_digest(fields: SignatureFields, signer: &mut dyn Signer,
                   digest: Vec<u8>)
                   -> Result<Signature>
    {
        let mpis = signer.sign(fields.hash_algo, &digest)?;

        Ok(Signature {
            digest_prefix: [digest[0], digest[1]],
            fields,
            mpis,
        })
    }
}

/// Holds a signature packet.
///
/// See [Section 5.2 of RFC 4880] for details.
///
///   [Section 5.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Fields as configured using the builder.
    fields: SignatureFields,

    /// Lower 16 bits of the signed hash value.
    ///
    /// Kept for cheap rejection of bad signatures before the
    /// expensive public key operation.
    digest_prefix: [u8; 2],

    /// Signature MPIs.
    mpis: mpi::Signature,
}

impl Deref for Signature {
    type Target = SignatureFields;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Signature")
            .field("version", &self.version())
            .field("typ", &self.typ())
            .field("issuer", &self.issuer())
            .field("pk_algo", &self.pk_algo())
            .field("hash_algo", &self.hash_algo())
            .field("hashed_area", self.hashed_area())
            .field("unhashed_area", self.unhashed_area())
            .field("digest_prefix",
                   &crate::fmt::to_hex(&self.digest_prefix, false))
            .field("mpis", &self.mpis)
            .finish()
    }
}

impl Signature {
    /// Used by the parser.
    pub(crate) fn from_parts(fields: SignatureFields,
                             digest_prefix: [u8; 2],
                             mpis: mpi::Signature)
                             -> Signature
    {
        Signature { fields, digest_prefix, mpis }
    }

    pub(crate) fn new_v3(typ: SignatureType,
                         pk_algo: PublicKeyAlgorithm,
                         hash_algo: HashAlgorithm,
                         creation_time: Timestamp,
                         issuer: KeyID,
                         digest_prefix: [u8; 2],
                         mpis: mpi::Signature)
                         -> Signature
    {
        Signature {
            fields: SignatureFields {
                version: 3,
                typ,
                pk_algo,
                hash_algo,
                hashed_area: SubpacketArea::empty(),
                unhashed_area: SubpacketArea::empty(),
                v3_info: Some((creation_time, issuer)),
            },
            digest_prefix,
            mpis,
        }
    }

    /// Gets the hash prefix.
    pub fn digest_prefix(&self) -> &[u8; 2] {
        &self.digest_prefix
    }

    /// Gets the signature packet's MPIs.
    pub fn mpis(&self) -> &mpi::Signature {
        &self.mpis
    }

    /// Verifies the signature against the given digest.
    ///
    /// This is the common core of all verification entry points: it
    /// performs the cheap prefix rejection, refuses signatures whose
    /// hashed area carries an unknown critical subpacket, and
    /// dispatches to the algorithm-specific verifier.
    pub fn verify_digest(&self, key: &Key, digest: &[u8]) -> Result<()> {
        if let Some(tag) = self.hashed_area().unknown_critical() {
            return Err(Error::CriticalSubpacketUnknown(tag).into());
        }

        if digest.len() < 2 || self.digest_prefix != digest[..2] {
            return Err(Error::BadSignature(
                "Digest prefix mismatch".into()).into());
        }

        backend::verify(key.mpis(), &self.mpis, self.hash_algo(), digest)
    }

    /// Verifies a direct key signature.
    ///
    /// `signer` is the key that allegedly made the signature, `pk`
    /// is the primary key.  For a self-signature they are the same.
    pub fn verify_direct_key(&self, signer: &Key, pk: &Key) -> Result<()> {
        if self.typ() != SignatureType::DirectKey {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_direct_key(pk)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a primary key revocation certificate.
    pub fn verify_primary_key_revocation(&self, signer: &Key, pk: &Key)
                                         -> Result<()>
    {
        if self.typ() != SignatureType::KeyRevocation {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_direct_key(pk)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a certification over a user id.
    pub fn verify_userid_binding(&self, signer: &Key,
                                 pk: &Key, userid: &UserID)
                                 -> Result<()>
    {
        if !self.typ().is_certification() {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_userid_binding(pk, userid)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a certification revocation over a user id.
    pub fn verify_userid_revocation(&self, signer: &Key,
                                    pk: &Key, userid: &UserID)
                                    -> Result<()>
    {
        if self.typ() != SignatureType::CertificationRevocation {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_userid_binding(pk, userid)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a certification over a user attribute.
    pub fn verify_user_attribute_binding(&self, signer: &Key,
                                         pk: &Key, ua: &UserAttribute)
                                         -> Result<()>
    {
        if !self.typ().is_certification() {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_user_attribute_binding(pk, ua)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a certification revocation over a user attribute.
    pub fn verify_user_attribute_revocation(&self, signer: &Key,
                                            pk: &Key, ua: &UserAttribute)
                                            -> Result<()>
    {
        if self.typ() != SignatureType::CertificationRevocation {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_user_attribute_binding(pk, ua)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a subkey binding signature.
    ///
    /// This checks the cryptographic binding issued by the primary
    /// key.  If the binding advertises signing capability, the
    /// embedded back signature must additionally be verified with
    /// [`Signature::verify_primary_key_binding`]; a well-formed key
    /// block is rejected without it.
    pub fn verify_subkey_binding(&self, signer: &Key,
                                 pk: &Key, subkey: &Key)
                                 -> Result<()>
    {
        if self.typ() != SignatureType::SubkeyBinding {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_subkey_binding(pk, subkey)?;
        self.verify_digest(signer, &digest)
    }

    /// Verifies a primary key binding signature (back signature).
    ///
    /// The issuer of a back signature is the subkey.
    pub fn verify_primary_key_binding(&self, pk: &Key, subkey: &Key)
                                      -> Result<()>
    {
        if self.typ() != SignatureType::PrimaryKeyBinding {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_subkey_binding(pk, subkey)?;
        self.verify_digest(subkey, &digest)
    }

    /// Verifies a subkey revocation signature.
    pub fn verify_subkey_revocation(&self, signer: &Key,
                                    pk: &Key, subkey: &Key)
                                    -> Result<()>
    {
        if self.typ() != SignatureType::SubkeyRevocation {
            return Err(Error::UnsupportedSignatureType(self.typ()).into());
        }

        let digest = self.fields.digest_subkey_binding(pk, subkey)?;
        self.verify_digest(signer, &digest)
    }

    /// Checks whether the signature is alive at `time`.
    ///
    /// A signature is alive if its creation time is in the past
    /// (allowing for `tolerance` of clock skew), and it has not
    /// expired.
    pub fn signature_alive(&self, time: Timestamp, tolerance: Duration)
                           -> Result<()>
    {
        let creation = self.signature_creation_time()
            .ok_or_else(|| Error::BadSignature(
                "Signature has no creation time subpacket".into()))?;

        if creation > time.saturating_add(tolerance) {
            return Err(Error::TimeConflict {
                claimed: creation,
                now: time,
            }.into());
        }

        if let Some(validity) = self.signature_validity_period() {
            let expiration = creation.saturating_add(validity);
            if expiration <= time {
                return Err(Error::SignatureExpired(expiration).into());
            }
        }

        Ok(())
    }

    /// Checks whether the key the signature is over is alive at
    /// `time`.
    pub fn key_alive(&self, key: &Key, time: Timestamp) -> Result<()> {
        if let Some(validity) = self.key_validity_period() {
            let expiration = key.creation_time().saturating_add(validity);
            if expiration <= time {
                return Err(Error::KeyExpired(expiration).into());
            }
        }

        Ok(())
    }
}

fn check_preference_list_len(len: usize) -> Result<()> {
    // The bound protects preference parsers with fixed buffers.
    if len > 30 {
        Err(Error::InvalidArgument(
            format!("Preference list too long: {} > 30 items", len)).into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::mpi::MPI;

    // A signer whose signatures are structurally valid but
    // cryptographically meaningless; enough to test field and digest
    // plumbing without an agent.
    pub(crate) struct NullSigner {
        key: Key,
    }

    impl NullSigner {
        pub fn new() -> Self {
            NullSigner {
                key: Key::new(
                    Timestamp::from(1183068693),
                    PublicKeyAlgorithm::RSAEncryptSign,
                    mpi::PublicKey::RSA {
                        n: MPI::new(&[0xe7; 256]),
                        e: MPI::new(&[1, 0, 1]),
                    }).unwrap(),
            }
        }
    }

    impl Signer for NullSigner {
        fn public(&self) -> &Key {
            &self.key
        }

        fn sign(&mut self, _hash_algo: HashAlgorithm, digest: &[u8])
                -> Result<mpi::Signature>
        {
            Ok(mpi::Signature::RSA { s: MPI::new(digest) })
        }
    }

    #[test]
    fn builder_fills_mandatory_fields() {
        let mut signer = NullSigner::new();
        let pk = signer.key.clone();
        let uid = UserID::from("Alice <alice@example.org>");

        let sig = SignatureBuilder::new(SignatureType::PositiveCertification)
            .sign_userid_binding(&mut signer, &pk, &uid)
            .unwrap();

        assert_eq!(sig.version(), 4);
        assert_eq!(sig.pk_algo(), PublicKeyAlgorithm::RSAEncryptSign);
        assert!(sig.signature_creation_time().is_some());
        assert_eq!(sig.issuer().unwrap(), pk.keyid());

        // Exactly one creation time subpacket, in the hashed area.
        let n = sig.hashed_area().iter()
            .filter(|sp| sp.tag() == SubpacketTag::SignatureCreationTime)
            .count();
        assert_eq!(n, 1);
        // The issuer is in the unhashed area.
        assert!(sig.unhashed_area()
                .lookup(SubpacketTag::Issuer).is_some());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut signer = NullSigner::new();
        let pk = signer.key.clone();
        let uid = UserID::from("alice@example.org");

        assert!(SignatureBuilder::new(SignatureType::SubkeyBinding)
                .sign_userid_binding(&mut signer, &pk, &uid).is_err());
        assert!(SignatureBuilder::new(SignatureType::Binary)
                .sign_direct_key(&mut signer, &pk).is_err());
    }

    #[test]
    fn digest_covers_hashed_area_only() {
        let mut signer = NullSigner::new();
        let pk = signer.key.clone();
        let uid = UserID::from("alice@example.org");

        let base = SignatureBuilder::new(SignatureType::PositiveCertification)
            .set_signature_creation_time(Timestamp::from(1000)).unwrap();

        let sig1 = base.clone()
            .sign_userid_binding(&mut signer, &pk, &uid).unwrap();
        // Tweaking the hashed area changes the digest ...
        let sig2 = base.clone()
            .set_policy_uri("https://example.org/policy").unwrap()
            .sign_userid_binding(&mut signer, &pk, &uid).unwrap();
        assert!(sig1.mpis() != sig2.mpis());

        // ... tweaking the unhashed area does not.
        let mut tweaked = base
            .sign_userid_binding(&mut signer, &pk, &uid).unwrap();
        tweaked.fields.unhashed_area_mut().add(Subpacket::new(
            SubpacketValue::SignersUserID(b"alice".to_vec()), false))
            .unwrap();
        assert_eq!(sig1.mpis(), tweaked.mpis());
    }

    #[test]
    fn signature_expiration() {
        let mut signer = NullSigner::new();
        let pk = signer.key.clone();

        let sig = SignatureBuilder::new(SignatureType::DirectKey)
            .set_signature_creation_time(Timestamp::from(1000)).unwrap()
            .set_signature_validity_period(Duration::seconds(100)).unwrap()
            .sign_direct_key(&mut signer, &pk).unwrap();

        let tolerance = Duration::seconds(0);
        assert!(sig.signature_alive(Timestamp::from(1050), tolerance).is_ok());
        let err = sig.signature_alive(Timestamp::from(1100), tolerance)
            .unwrap_err();
        assert_match!(Some(Error::SignatureExpired(_))
                      = err.downcast_ref::<Error>());

        // Made 10 seconds in the future.
        let err = sig.signature_alive(Timestamp::from(990), tolerance)
            .unwrap_err();
        assert_match!(Some(Error::TimeConflict { .. })
                      = err.downcast_ref::<Error>());
        assert!(sig.signature_alive(Timestamp::from(990),
                                    Duration::seconds(30)).is_ok());
    }

    #[test]
    fn critical_unknown_subpacket_blocks_verification() {
        let mut signer = NullSigner::new();
        let pk = signer.key.clone();

        let mut builder = SignatureBuilder::new(SignatureType::DirectKey);
        builder.hashed_area_mut().add(Subpacket::new(
            SubpacketValue::Unknown {
                tag: subpacket::SubpacketTag::from(77),
                body: vec![0],
            }, true)).unwrap();
        let sig = builder.sign_direct_key(&mut signer, &pk).unwrap();

        let err = sig.verify_direct_key(&pk, &pk).unwrap_err();
        assert_match!(Some(Error::CriticalSubpacketUnknown(77))
                      = err.downcast_ref::<Error>());
    }
}
