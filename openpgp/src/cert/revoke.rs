//! Builders for revocation signatures.
//!
//! Revocation never rewrites history: a revocation certificate is a
//! new signature that is merged into the key block next to the
//! material it retires.

use crate::Result;
use crate::cert::Cert;
use crate::crypto::Signer;
use crate::packet::signature::SignatureBuilder;
use crate::packet::{Key, Signature, UserID};
use crate::types::{
    HashAlgorithm,
    ReasonForRevocation,
    SignatureType,
    Timestamp,
};

/// A builder for revocations of the primary key.
pub struct CertRevocationBuilder {
    builder: SignatureBuilder,
}

impl CertRevocationBuilder {
    /// Returns a new builder for a key revocation.
    pub fn new() -> Self {
        CertRevocationBuilder {
            builder: SignatureBuilder::new(SignatureType::KeyRevocation),
        }
    }

    /// Sets the signature's creation time.
    pub fn set_signature_creation_time(mut self, t: Timestamp)
                                       -> Result<Self>
    {
        self.builder = self.builder.set_signature_creation_time(t)?;
        Ok(self)
    }

    /// Sets the hash algorithm.
    pub fn set_hash_algo(mut self, h: HashAlgorithm) -> Self {
        self.builder = self.builder.set_hash_algo(h);
        self
    }

    /// Sets the reason for the revocation.
    pub fn set_reason_for_revocation<R: AsRef<[u8]>>(
        mut self, code: ReasonForRevocation, reason: R)
        -> Result<Self>
    {
        self.builder =
            self.builder.set_reason_for_revocation(code, reason)?;
        Ok(self)
    }

    /// Issues the revocation certificate.
    ///
    /// The result is a detached signature; merge it into the key
    /// block with [`Cert::insert_packets`] to actually revoke the
    /// key, or store it offline as a revocation certificate.
    pub fn build(self, signer: &mut dyn Signer, cert: &Cert)
                 -> Result<Signature>
    {
        self.builder.sign_direct_key(signer, cert.primary_key())
    }
}

impl Default for CertRevocationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A builder for subkey revocations.
pub struct SubkeyRevocationBuilder {
    builder: SignatureBuilder,
}

impl SubkeyRevocationBuilder {
    /// Returns a new builder for a subkey revocation.
    pub fn new() -> Self {
        SubkeyRevocationBuilder {
            builder: SignatureBuilder::new(SignatureType::SubkeyRevocation),
        }
    }

    /// Sets the signature's creation time.
    pub fn set_signature_creation_time(mut self, t: Timestamp)
                                       -> Result<Self>
    {
        self.builder = self.builder.set_signature_creation_time(t)?;
        Ok(self)
    }

    /// Sets the reason for the revocation.
    pub fn set_reason_for_revocation<R: AsRef<[u8]>>(
        mut self, code: ReasonForRevocation, reason: R)
        -> Result<Self>
    {
        self.builder =
            self.builder.set_reason_for_revocation(code, reason)?;
        Ok(self)
    }

    /// Issues the revocation signature over `subkey`.
    pub fn build(self, signer: &mut dyn Signer, cert: &Cert, subkey: &Key)
                 -> Result<Signature>
    {
        self.builder
            .sign_subkey_binding(signer, cert.primary_key(), subkey)
    }
}

impl Default for SubkeyRevocationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A builder for user id revocations.
pub struct UserIDRevocationBuilder {
    builder: SignatureBuilder,
}

impl UserIDRevocationBuilder {
    /// Returns a new builder for a certification revocation.
    pub fn new() -> Self {
        UserIDRevocationBuilder {
            builder: SignatureBuilder::new(
                SignatureType::CertificationRevocation),
        }
    }

    /// Sets the signature's creation time.
    pub fn set_signature_creation_time(mut self, t: Timestamp)
                                       -> Result<Self>
    {
        self.builder = self.builder.set_signature_creation_time(t)?;
        Ok(self)
    }

    /// Sets the reason for the revocation.
    pub fn set_reason_for_revocation<R: AsRef<[u8]>>(
        mut self, code: ReasonForRevocation, reason: R)
        -> Result<Self>
    {
        self.builder =
            self.builder.set_reason_for_revocation(code, reason)?;
        Ok(self)
    }

    /// Issues the revocation signature over `userid`.
    pub fn build(self, signer: &mut dyn Signer, cert: &Cert,
                 userid: &UserID)
                 -> Result<Signature>
    {
        self.builder
            .sign_userid_binding(signer, cert.primary_key(), userid)
    }
}

impl Default for UserIDRevocationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
