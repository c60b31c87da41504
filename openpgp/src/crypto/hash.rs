//! Functionality to hash packets, and generate hashes.
//!
//! The hash input computed here doubles as the canonical
//! serialization: for every packet there is exactly one byte
//! sequence, and the fingerprint and every signature class are
//! defined over it.

use std::io;

use digest::DynDigest;

use crate::Error;
use crate::Result;
use crate::packet::Key;
use crate::packet::UserAttribute;
use crate::packet::UserID;
use crate::types::HashAlgorithm;

/// State of a hash function.
pub struct Context {
    algo: HashAlgorithm,
    ctx: Box<dyn DynDigest>,
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Context {
            algo: self.algo,
            ctx: self.ctx.box_clone(),
        }
    }
}

impl Context {
    /// Returns the algorithm.
    pub fn algo(&self) -> HashAlgorithm {
        self.algo
    }

    /// Size of the digest in bytes.
    pub fn digest_size(&self) -> usize {
        self.ctx.output_size()
    }

    /// Writes data into the hash function.
    pub fn update<D: AsRef<[u8]>>(&mut self, data: D) {
        self.ctx.update(data.as_ref());
    }

    /// Finalizes the hash function and writes the digest into the
    /// provided slice.
    ///
    /// Resets the hash function contexts.  `digest` must be at least
    /// `self.digest_size()` bytes large, otherwise the digest will be
    /// truncated.
    pub fn digest<D: AsMut<[u8]>>(&mut self, mut digest: D) {
        let digest = digest.as_mut();
        let result = self.ctx.finalize_reset();
        let n = std::cmp::min(digest.len(), result.len());
        digest[..n].copy_from_slice(&result[..n]);
    }

    /// Finalizes the hash function and returns the digest.
    pub fn into_digest(mut self) -> Vec<u8> {
        self.ctx.finalize_reset().into_vec()
    }
}

impl io::Write for Context {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl HashAlgorithm {
    /// Whether the backend supports this algorithm.
    pub fn is_supported(self) -> bool {
        match self {
            HashAlgorithm::MD5 => true,
            HashAlgorithm::SHA1 => true,
            HashAlgorithm::RipeMD => true,
            HashAlgorithm::SHA256 => true,
            HashAlgorithm::SHA384 => true,
            HashAlgorithm::SHA512 => true,
            HashAlgorithm::SHA224 => true,
            HashAlgorithm::Private(_) => false,
            HashAlgorithm::Unknown(_) => false,
        }
    }

    /// Creates a new hash context for this algorithm.
    ///
    /// SHA-1 is always the collision-detecting variant: a
    /// fingerprint or signature computation must not be usable as a
    /// collision oracle.
    ///
    /// # Errors
    ///
    /// Fails with `Error::UnsupportedHashAlgorithm` if the backend
    /// does not support this algorithm.
    pub fn context(self) -> Result<Context> {
        let ctx: Box<dyn DynDigest> = match self {
            HashAlgorithm::MD5 =>
                Box::new(<md5::Md5 as digest::Digest>::new()),
            HashAlgorithm::SHA1 =>
                Box::new(<sha1collisiondetection::Sha1CD
                          as digest::Digest>::new()),
            HashAlgorithm::RipeMD =>
                Box::new(<ripemd::Ripemd160 as digest::Digest>::new()),
            HashAlgorithm::SHA256 =>
                Box::new(<sha2::Sha256 as digest::Digest>::new()),
            HashAlgorithm::SHA384 =>
                Box::new(<sha2::Sha384 as digest::Digest>::new()),
            HashAlgorithm::SHA512 =>
                Box::new(<sha2::Sha512 as digest::Digest>::new()),
            HashAlgorithm::SHA224 =>
                Box::new(<sha2::Sha224 as digest::Digest>::new()),
            _ => return Err(Error::UnsupportedHashAlgorithm(self).into()),
        };

        Ok(Context { algo: self, ctx })
    }
}

/// Hashes OpenPGP packets and related types.
pub trait Hash {
    /// Updates the given hash with this object.
    fn hash(&self, hash: &mut Context);
}

impl Hash for UserID {
    /// Update the Hash with a hash of the user id.
    fn hash(&self, hash: &mut Context) {
        let mut header = [0; 5];

        header[0] = 0xB4;
        let len = self.value().len() as u32;
        header[1..5].copy_from_slice(&len.to_be_bytes());

        hash.update(&header[..]);
        hash.update(self.value());
    }
}

impl Hash for UserAttribute {
    /// Update the Hash with a hash of the user attribute.
    fn hash(&self, hash: &mut Context) {
        let mut header = [0; 5];

        header[0] = 0xD1;
        let len = self.value().len() as u32;
        header[1..5].copy_from_slice(&len.to_be_bytes());

        hash.update(&header[..]);
        hash.update(self.value());
    }
}

impl Hash for Key {
    /// Update the Hash with a hash of the key.
    fn hash(&self, hash: &mut Context) {
        use crate::serialize::SerializeInto;

        // We hash 6 bytes plus the MPIs.  But, the length field does
        // not include the tag (1 byte) or the length (2 bytes)
        // itself.
        let len = 6 + self.mpis().serialized_len();

        let mut header: Vec<u8> = Vec::with_capacity(9);

        // Tag.
        header.push(0x99);

        // Length (big endian).
        header.push(((len >> 8) & 0xFF) as u8);
        header.push((len & 0xFF) as u8);

        // Version.
        header.push(self.version());

        // Creation time.
        let creation_time: u32 = self.creation_time().into();
        header.extend_from_slice(&creation_time.to_be_bytes());

        // Algorithm.
        header.push(self.pk_algo().into());

        hash.update(&header[..]);

        // MPIs.
        self.mpis().hash(hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_sizes() {
        assert_eq!(HashAlgorithm::SHA1.context().unwrap().digest_size(), 20);
        assert_eq!(HashAlgorithm::RipeMD.context().unwrap().digest_size(), 20);
        assert_eq!(HashAlgorithm::SHA256.context().unwrap().digest_size(), 32);
        assert_eq!(HashAlgorithm::SHA512.context().unwrap().digest_size(), 64);
        assert!(HashAlgorithm::Unknown(42).context().is_err());
    }

    #[test]
    fn sha256_vector() {
        let mut ctx = HashAlgorithm::SHA256.context().unwrap();
        ctx.update(b"abc");
        let mut digest = vec![0; ctx.digest_size()];
        ctx.digest(&mut digest);
        assert_eq!(&digest[..4], &[0xba, 0x78, 0x16, 0xbf]);
    }

    #[test]
    fn context_is_resettable() {
        let mut ctx = HashAlgorithm::SHA1.context().unwrap();
        ctx.update(b"foo");
        let mut first = vec![0; 20];
        ctx.digest(&mut first);

        // After digest(), the context starts over.
        let mut ctx2 = HashAlgorithm::SHA1.context().unwrap();
        ctx.update(b"bar");
        ctx2.update(b"bar");
        let mut a = vec![0; 20];
        let mut b = vec![0; 20];
        ctx.digest(&mut a);
        ctx2.digest(&mut b);
        assert_eq!(a, b);
    }
}
