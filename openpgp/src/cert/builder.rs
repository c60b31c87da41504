//! Generates a key block from freshly generated keys.

use crate::Error;
use crate::Result;
use crate::cert::Cert;
use crate::crypto::Signer;
use crate::packet::signature::subpacket::NotationData;
use crate::packet::signature::SignatureBuilder;
use crate::packet::UserID;
use crate::Packet;
use crate::policy::{Preferences, StandardPolicy};
use crate::types::{
    Duration,
    Features,
    HashAlgorithm,
    KeyFlags,
    KeyServerPreferences,
    RevocationKey,
    SignatureType,
    Timestamp,
};

/// Assembles a new key block around a freshly generated primary
/// key.
///
/// The builder does not generate key material; that is the agent's
/// job.  It takes a [`Signer`] for the primary key, issues the self
/// signatures that express the key's policy, and emits a
/// well-formed [`Cert`].  Subkeys are attached afterwards with
/// [`Cert::bind_subkey`], so that the primary's self signature is
/// in place before any binding refers to it.
pub struct CertBuilder {
    creation_time: Option<Timestamp>,
    validity: Option<Duration>,
    primary_flags: KeyFlags,
    userids: Vec<UserID>,
    preferences: Preferences,
    revokers: Vec<RevocationKey>,
    hash_algo: HashAlgorithm,
    policy_uri: Option<Vec<u8>>,
    preferred_keyserver: Option<Vec<u8>>,
    notations: Vec<NotationData>,
}

impl CertBuilder {
    /// Returns a new builder.
    ///
    /// The primary key is certification and signing capable by
    /// default, uses the default preference table, and never
    /// expires.
    pub fn new() -> Self {
        CertBuilder {
            creation_time: None,
            validity: None,
            primary_flags: KeyFlags::empty()
                .set_certification(true)
                .set_signing(true),
            userids: Vec::new(),
            preferences: Preferences::default(),
            revokers: Vec::new(),
            hash_algo: HashAlgorithm::SHA256,
            policy_uri: None,
            preferred_keyserver: None,
            notations: Vec::new(),
        }
    }

    /// Sets the creation time used for the signatures.
    ///
    /// Defaults to the current time.  Setting it explicitly allows
    /// reproducible key blocks.
    pub fn set_creation_time<T: Into<Option<Timestamp>>>(mut self, t: T)
                                                        -> Self
    {
        self.creation_time = t.into();
        self
    }

    /// Sets the primary key's validity period.  `None` means the
    /// key never expires.
    pub fn set_validity_period<D: Into<Option<Duration>>>(mut self, d: D)
                                                          -> Self
    {
        self.validity = d.into();
        self
    }

    /// Sets the capabilities of the primary key.
    ///
    /// Certification capability is always added: a primary key that
    /// cannot certify cannot hold a key block together.
    pub fn set_primary_key_flags(mut self, flags: KeyFlags) -> Self {
        self.primary_flags = flags.set_certification(true);
        self
    }

    /// Adds a user id.
    pub fn add_userid<U: Into<UserID>>(mut self, uid: U) -> Self {
        self.userids.push(uid.into());
        self
    }

    /// Sets the algorithm preferences advertised in the self
    /// signatures.
    pub fn set_preferences(mut self, p: Preferences) -> Self {
        self.preferences = p;
        self
    }

    /// Adds a designated revoker.
    pub fn add_revocation_key(mut self, rk: RevocationKey) -> Self {
        self.revokers.push(rk);
        self
    }

    /// Sets the hash algorithm used for the self signatures.
    pub fn set_hash_algo(mut self, h: HashAlgorithm) -> Self {
        self.hash_algo = h;
        self
    }

    /// Sets the policy URI.
    pub fn set_policy_uri<U: AsRef<[u8]>>(mut self, uri: U) -> Self {
        self.policy_uri = Some(uri.as_ref().to_vec());
        self
    }

    /// Sets the preferred key server URI.
    pub fn set_preferred_keyserver<U: AsRef<[u8]>>(mut self, uri: U)
                                                   -> Self
    {
        self.preferred_keyserver = Some(uri.as_ref().to_vec());
        self
    }

    /// Adds a notation to the self signatures.
    pub fn add_notation(mut self, n: NotationData) -> Self {
        self.notations.push(n);
        self
    }

    /// Issues the self signatures and assembles the key block.
    ///
    /// The primary key is `primary_signer`'s public half.  If no
    /// user id was added, the policy subpackets are carried on a
    /// direct key signature instead.
    pub fn generate(self, primary_signer: &mut dyn Signer,
                    policy: &StandardPolicy)
                    -> Result<Cert>
    {
        if !self.primary_flags.is_creatable() {
            return Err(Error::InvalidArgument(
                format!("Invalid key flags {:?}", self.primary_flags))
                       .into());
        }

        let primary = primary_signer.public().clone();
        let creation_time = self.creation_time
            .unwrap_or_else(Timestamp::now);

        let mut packets =
            Vec::<Packet>::with_capacity(2 + 2 * self.userids.len());
        packets.push(Packet::PublicKey(primary.clone()));

        if self.userids.is_empty() {
            let sig = self
                .self_signature_template(SignatureType::DirectKey,
                                         creation_time)?
                .sign_direct_key(primary_signer, &primary)?;
            packets.push(sig.into());
        } else {
            for uid in &self.userids {
                let sig = self
                    .self_signature_template(
                        SignatureType::PositiveCertification,
                        creation_time)?
                    .sign_userid_binding(primary_signer, &primary, uid)?;
                packets.push(uid.clone().into());
                packets.push(sig.into());
            }
        }

        Cert::from_packets(packets, policy)
    }

    /// Builds the hashed area of a self signature.
    ///
    /// The subpackets appear in a fixed order: creation time, key
    /// flags, key expiration, the three preference lists, features,
    /// key server preferences, policy URI, preferred key server,
    /// notations, and designated revokers.
    fn self_signature_template(&self, typ: SignatureType,
                               creation_time: Timestamp)
                               -> Result<SignatureBuilder>
    {
        let mut builder = SignatureBuilder::new(typ)
            .set_hash_algo(self.hash_algo)
            .set_signature_creation_time(creation_time)?
            .set_key_flags(self.primary_flags)?;

        if let Some(validity) = self.validity {
            builder = builder.set_key_validity_period(Some(validity))?;
        }

        let prefs = &self.preferences;
        if !prefs.symmetric().is_empty() {
            builder = builder.set_preferred_symmetric_algorithms(
                prefs.symmetric().to_vec())?;
        }
        if !prefs.hash().is_empty() {
            builder = builder.set_preferred_hash_algorithms(
                prefs.hash().to_vec())?;
        }
        if !prefs.compression().is_empty() {
            builder = builder.set_preferred_compression_algorithms(
                prefs.compression().to_vec())?;
        }

        if prefs.mdc() {
            builder = builder.set_features(
                Features::empty().set_mdc(true))?;
        }
        if !prefs.ks_modify() {
            builder = builder.set_key_server_preferences(
                KeyServerPreferences::empty().set_no_modify(true))?;
        }

        if let Some(uri) = &self.policy_uri {
            builder = builder.set_policy_uri(uri)?;
        }
        if let Some(uri) = &self.preferred_keyserver {
            builder = builder.set_preferred_key_server(uri)?;
        }
        for n in &self.notations {
            builder = builder.add_notation(n.clone())?;
        }
        if !self.revokers.is_empty() {
            builder = builder.set_revocation_keys(self.revokers.clone())?;
        }

        Ok(builder)
    }
}

impl Default for CertBuilder {
    fn default() -> Self {
        Self::new()
    }
}
