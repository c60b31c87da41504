//! Packet serialization.
//!
//! Serialization is canonical: for every logical packet there is
//! exactly one byte sequence, and it is the same byte sequence the
//! fingerprint and signature computations hash.  Packet framing
//! always uses the new-format header with minimal length encoding.

use std::io;

use crate::Packet;
use crate::Result;
use crate::crypto::mpi::{self, MPI};
use crate::packet::{Key, Signature, Tag, Unknown, UserAttribute, UserID};

/// Serializes OpenPGP data structures to byte streams.
pub trait Serialize {
    /// Writes a serialized version of the object to `o`.
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()>;
}

/// Serializes OpenPGP data structures into byte vectors.
pub trait SerializeInto: Serialize {
    /// Computes the maximal length of the serialized representation.
    fn serialized_len(&self) -> usize;

    /// Serializes into a byte vector.
    fn to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        self.serialize(&mut buf)?;
        Ok(buf)
    }
}

/// Writes a new-format CTB and length header.
fn write_header(tag: Tag, len: usize, o: &mut dyn io::Write) -> Result<()> {
    o.write_all(&[0xC0 | u8::from(tag)])?;
    if len < 192 {
        o.write_all(&[len as u8])?;
    } else if len < 8384 {
        let v = len - 192;
        o.write_all(&[(v / 256 + 192) as u8, (v % 256) as u8])?;
    } else {
        o.write_all(&[0xFF])?;
        o.write_all(&(len as u32).to_be_bytes())?;
    }
    Ok(())
}

fn header_len(body_len: usize) -> usize {
    1 + if body_len < 192 {
        1
    } else if body_len < 8384 {
        2
    } else {
        5
    }
}

impl Serialize for MPI {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        let bits = self.bits() as u16;
        o.write_all(&bits.to_be_bytes())?;
        o.write_all(self.value())?;
        Ok(())
    }
}

impl SerializeInto for MPI {
    fn serialized_len(&self) -> usize {
        2 + self.value().len()
    }
}

impl Serialize for mpi::PublicKey {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        use crate::crypto::mpi::PublicKey::*;
        match self {
            RSA { e, n } => {
                n.serialize(o)?;
                e.serialize(o)?;
            },
            DSA { p, q, g, y } => {
                p.serialize(o)?;
                q.serialize(o)?;
                g.serialize(o)?;
                y.serialize(o)?;
            },
            ElGamal { p, g, y } => {
                p.serialize(o)?;
                g.serialize(o)?;
                y.serialize(o)?;
            },
            EdDSA { curve, q } | ECDSA { curve, q } => {
                o.write_all(&[curve.oid().len() as u8])?;
                o.write_all(curve.oid())?;
                q.serialize(o)?;
            },
            ECDH { curve, q, hash, sym } => {
                o.write_all(&[curve.oid().len() as u8])?;
                o.write_all(curve.oid())?;
                q.serialize(o)?;
                o.write_all(&[3u8, 1, u8::from(*hash), u8::from(*sym)])?;
            },
            Unknown { mpis, rest } => {
                for m in mpis.iter() {
                    m.serialize(o)?;
                }
                o.write_all(rest)?;
            },
        }
        Ok(())
    }
}

impl SerializeInto for mpi::PublicKey {
    fn serialized_len(&self) -> usize {
        use crate::crypto::mpi::PublicKey::*;
        match self {
            RSA { e, n } =>
                n.serialized_len() + e.serialized_len(),
            DSA { p, q, g, y } =>
                p.serialized_len() + q.serialized_len()
                + g.serialized_len() + y.serialized_len(),
            ElGamal { p, g, y } =>
                p.serialized_len() + g.serialized_len() + y.serialized_len(),
            EdDSA { curve, q } | ECDSA { curve, q } =>
                1 + curve.oid().len() + q.serialized_len(),
            ECDH { curve, q, .. } =>
                1 + curve.oid().len() + q.serialized_len() + 4,
            Unknown { mpis, rest } =>
                mpis.iter().map(|m| m.serialized_len()).sum::<usize>()
                + rest.len(),
        }
    }
}

impl Serialize for mpi::Signature {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        use crate::crypto::mpi::Signature::*;
        match self {
            RSA { s } => s.serialize(o)?,
            DSA { r, s } | ElGamal { r, s } | EdDSA { r, s }
            | ECDSA { r, s } => {
                r.serialize(o)?;
                s.serialize(o)?;
            },
            Unknown { mpis, rest } => {
                for m in mpis.iter() {
                    m.serialize(o)?;
                }
                o.write_all(rest)?;
            },
        }
        Ok(())
    }
}

impl SerializeInto for mpi::Signature {
    fn serialized_len(&self) -> usize {
        use crate::crypto::mpi::Signature::*;
        match self {
            RSA { s } => s.serialized_len(),
            DSA { r, s } | ElGamal { r, s } | EdDSA { r, s }
            | ECDSA { r, s } =>
                r.serialized_len() + s.serialized_len(),
            Unknown { mpis, rest } =>
                mpis.iter().map(|m| m.serialized_len()).sum::<usize>()
                + rest.len(),
        }
    }
}

impl Key {
    pub(crate) fn serialize_body(&self, o: &mut dyn io::Write) -> Result<()> {
        o.write_all(&[self.version()])?;
        o.write_all(&u32::from(self.creation_time()).to_be_bytes())?;
        o.write_all(&[self.pk_algo().into()])?;
        self.mpis().serialize(o)
    }

    pub(crate) fn body_len(&self) -> usize {
        6 + self.mpis().serialized_len()
    }

    /// Serializes the key with the given tag.  A key is a
    /// Public-Key or a Public-Subkey packet depending on its
    /// position in the key block.
    pub(crate) fn serialize_with_tag(&self, tag: Tag,
                                     o: &mut dyn io::Write)
                                     -> Result<()>
    {
        write_header(tag, self.body_len(), o)?;
        self.serialize_body(o)
    }
}

impl Serialize for Key {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        self.serialize_with_tag(Tag::PublicKey, o)
    }
}

impl SerializeInto for Key {
    fn serialized_len(&self) -> usize {
        let body = self.body_len();
        header_len(body) + body
    }
}

impl Serialize for UserID {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        write_header(Tag::UserID, self.value().len(), o)?;
        o.write_all(self.value())?;
        Ok(())
    }
}

impl SerializeInto for UserID {
    fn serialized_len(&self) -> usize {
        header_len(self.value().len()) + self.value().len()
    }
}

impl Serialize for UserAttribute {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        write_header(Tag::UserAttribute, self.value().len(), o)?;
        o.write_all(self.value())?;
        Ok(())
    }
}

impl SerializeInto for UserAttribute {
    fn serialized_len(&self) -> usize {
        header_len(self.value().len()) + self.value().len()
    }
}

impl Signature {
    /// Serializes the signature packet's body.
    ///
    /// This is also the form in which a back signature is embedded
    /// in the subpacket area of its binding signature.
    pub(crate) fn serialize_body_into(&self, buf: &mut Vec<u8>) {
        if self.version() == 3 {
            buf.push(3);
            // Length of the hashed material: type + creation time.
            buf.push(5);
            buf.push(self.typ().into());
            let t = self.signature_creation_time()
                .map(u32::from).unwrap_or(0);
            buf.extend_from_slice(&t.to_be_bytes());
            let issuer = self.issuer().unwrap_or_else(|| 0u64.into());
            buf.extend_from_slice(issuer.as_bytes());
            buf.push(self.pk_algo().into());
            buf.push(self.hash_algo().into());
            buf.extend_from_slice(self.digest_prefix());
            let mut w = Vec::new();
            let _ = self.mpis().serialize(&mut w);
            buf.extend_from_slice(&w);
            return;
        }

        buf.push(self.version());
        buf.push(self.typ().into());
        buf.push(self.pk_algo().into());
        buf.push(self.hash_algo().into());

        let mut hashed = Vec::new();
        self.hashed_area().emit(&mut hashed);
        buf.extend_from_slice(&(hashed.len() as u16).to_be_bytes());
        buf.extend_from_slice(&hashed);

        let mut unhashed = Vec::new();
        self.unhashed_area().emit(&mut unhashed);
        buf.extend_from_slice(&(unhashed.len() as u16).to_be_bytes());
        buf.extend_from_slice(&unhashed);

        buf.extend_from_slice(self.digest_prefix());

        let mut mpis = Vec::new();
        let _ = self.mpis().serialize(&mut mpis);
        buf.extend_from_slice(&mpis);
    }

    pub(crate) fn body_len(&self) -> usize {
        if self.version() == 3 {
            return 1 + 1 + 1 + 4 + 8 + 1 + 1 + 2
                + self.mpis().serialized_len();
        }
        4 + 2 + self.hashed_area().serialized_len()
            + 2 + self.unhashed_area().serialized_len()
            + 2
            + self.mpis().serialized_len()
    }
}

impl Serialize for Signature {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        let mut body = Vec::with_capacity(self.body_len());
        self.serialize_body_into(&mut body);
        write_header(Tag::Signature, body.len(), o)?;
        o.write_all(&body)?;
        Ok(())
    }
}

impl SerializeInto for Signature {
    fn serialized_len(&self) -> usize {
        let body = self.body_len();
        header_len(body) + body
    }
}

impl Serialize for Unknown {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        write_header(self.tag(), self.body().len(), o)?;
        o.write_all(self.body())?;
        Ok(())
    }
}

impl SerializeInto for Unknown {
    fn serialized_len(&self) -> usize {
        header_len(self.body().len()) + self.body().len()
    }
}

impl Serialize for Packet {
    fn serialize(&self, o: &mut dyn io::Write) -> Result<()> {
        match self {
            Packet::Unknown(p) => p.serialize(o),
            Packet::Signature(p) => p.serialize(o),
            Packet::PublicKey(p) =>
                p.serialize_with_tag(Tag::PublicKey, o),
            Packet::PublicSubkey(p) =>
                p.serialize_with_tag(Tag::PublicSubkey, o),
            Packet::UserID(p) => p.serialize(o),
            Packet::UserAttribute(p) => p.serialize(o),
        }
    }
}

impl SerializeInto for Packet {
    fn serialized_len(&self) -> usize {
        match self {
            Packet::Unknown(p) => p.serialized_len(),
            Packet::Signature(p) => p.serialized_len(),
            Packet::PublicKey(p) | Packet::PublicSubkey(p) =>
                p.serialized_len(),
            Packet::UserID(p) => p.serialized_len(),
            Packet::UserAttribute(p) => p.serialized_len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PublicKeyAlgorithm, Timestamp};

    #[test]
    fn mpi_serialization() {
        let m = MPI::new(&[0x01, 0xff]);
        let buf = m.to_vec().unwrap();
        assert_eq!(buf, vec![0x00, 0x09, 0x01, 0xff]);
    }

    #[test]
    fn header_lengths() {
        let mut buf = Vec::new();
        write_header(Tag::UserID, 10, &mut buf).unwrap();
        assert_eq!(buf, vec![0xC0 | 13, 10]);

        let mut buf = Vec::new();
        write_header(Tag::Signature, 300, &mut buf).unwrap();
        assert_eq!(buf, vec![0xC0 | 2, 192, 108]);
        assert_eq!((192u32 - 192) * 256 + 108 + 192, 300);

        let mut buf = Vec::new();
        write_header(Tag::PublicKey, 9000, &mut buf).unwrap();
        assert_eq!(buf[..2], [0xC0 | 6, 0xFF]);
        assert_eq!(buf[2..], 9000u32.to_be_bytes());
    }

    #[test]
    fn key_serialization_matches_hash_length() {
        let key = Key::new(
            Timestamp::from(0x4F3A1B00),
            PublicKeyAlgorithm::RSAEncryptSign,
            mpi::PublicKey::RSA {
                n: MPI::new(&[0xe9; 256]),
                e: MPI::new(&[1, 0, 1]),
            }).unwrap();

        // The body is the hashed form minus the 0x99 framing.
        assert_eq!(key.body_len(), 6 + key.mpis().serialized_len());
        let buf = key.to_vec().unwrap();
        assert_eq!(buf.len(), key.serialized_len());
        assert_eq!(buf[0], 0xC0 | 6);
    }
}
