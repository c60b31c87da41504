//! Packet parsing.
//!
//! Parsing is slice based: key blocks and agent payloads are small
//! and always fully in memory.  Unsupported packet types and
//! versions are preserved as [`Unknown`] packets, so a parsed stream
//! re-serializes without loss; malformed framing is an error.

use std::io;

use crate::Error;
use crate::KeyID;
use crate::Packet;
use crate::Result;
use crate::crypto::mpi::{self, MPI};
use crate::packet::signature::subpacket::SubpacketArea;
use crate::packet::signature::SignatureFields;
use crate::packet::{Key, Signature, Tag, Unknown};
use crate::types::{Curve, PublicKeyAlgorithm, Timestamp};

/// Parsing of OpenPGP data types.
pub trait Parse<'a, T> {
    /// Reads from the given buffer.
    fn from_bytes(data: &'a [u8]) -> Result<T>;

    /// Reads from the given reader.
    fn from_reader<R: io::Read>(reader: R) -> Result<T>;
}

/// A cursor over a byte slice with OpenPGP-flavoured accessors.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn eof(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::MalformedPacket(
                format!("Truncated: expected {} bytes, have {}",
                        n, self.remaining())).into());
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn be_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn be_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Reads an MPI: a 16-bit big-endian bit count followed by the
    /// value.
    fn mpi(&mut self) -> Result<MPI> {
        let bits = self.be_u16()? as usize;
        let bytes = (bits + 7) / 8;
        Ok(MPI::new(self.take(bytes)?))
    }

    /// Reads an MPI whose value is an opaque string (a curve point).
    /// The leading format octet must not be stripped.
    fn mpi_opaque(&mut self) -> Result<MPI> {
        let bits = self.be_u16()? as usize;
        let bytes = (bits + 7) / 8;
        Ok(MPI::new_opaque(self.take(bytes)?))
    }

    /// Reads a curve OID: a one-octet length followed by the OID
    /// body.
    fn curve(&mut self) -> Result<Curve> {
        let len = self.u8()? as usize;
        if len == 0 || len == 0xff {
            return Err(Error::MalformedPacket(
                format!("Reserved OID length {}", len)).into());
        }
        Ok(Curve::from_oid(self.take(len)?))
    }
}

/// Parses a stream of OpenPGP packets from a byte slice.
///
/// The parser is an iterator over the packets in the input.  Framing
/// errors end the iteration with an error; packets that are
/// structurally sound but not understood are yielded as
/// `Packet::Unknown`.
pub struct PacketParser<'a> {
    reader: Reader<'a>,
}

impl<'a> PacketParser<'a> {
    /// Returns a parser for the given input.
    pub fn new(data: &'a [u8]) -> Self {
        PacketParser { reader: Reader::new(data) }
    }

    /// Parses the packet header and returns the tag and body.
    fn next_packet(&mut self) -> Result<(Tag, &'a [u8])> {
        let ctb = self.reader.u8()?;
        if ctb & 0x80 == 0 {
            return Err(Error::MalformedPacket(
                format!("Invalid CTB {:#02x}: bit 7 must be set", ctb))
                       .into());
        }

        if ctb & 0x40 > 0 {
            // New format.
            let tag = Tag::from(ctb & 0x3f);
            let first = self.reader.u8()?;
            let len = match first {
                0..=191 => first as usize,
                192..=223 => {
                    let second = self.reader.u8()?;
                    (first as usize - 192) * 256 + second as usize + 192
                },
                224..=254 =>
                    return Err(Error::MalformedPacket(
                        "Partial body lengths are not supported for \
                         key material".into()).into()),
                255 => self.reader.be_u32()? as usize,
            };
            Ok((tag, self.reader.take(len)?))
        } else {
            // Old format.
            let tag = Tag::from((ctb >> 2) & 0x0f);
            let len = match ctb & 3 {
                0 => self.reader.u8()? as usize,
                1 => self.reader.be_u16()? as usize,
                2 => self.reader.be_u32()? as usize,
                // Indeterminate length: the packet extends to the
                // end of the input.
                _ => self.reader.remaining(),
            };
            Ok((tag, self.reader.take(len)?))
        }
    }
}

impl<'a> Iterator for PacketParser<'a> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.eof() {
            return None;
        }

        let (tag, body) = match self.next_packet() {
            Ok(x) => x,
            Err(e) => {
                // Framing is broken; poison the parser.
                self.reader.pos = self.reader.data.len();
                return Some(Err(e));
            },
        };

        Some(Ok(parse_body(tag, body)))
    }
}

/// Parses a packet body.  Bodies we cannot interpret become
/// `Unknown` packets.
fn parse_body(tag: Tag, body: &[u8]) -> Packet {
    let unknown = || Packet::Unknown(Unknown::new(tag, body.to_vec()));

    match tag {
        Tag::PublicKey | Tag::PublicSubkey => match parse_key_body(body) {
            Ok(key) if tag == Tag::PublicKey => Packet::PublicKey(key),
            Ok(key) => Packet::PublicSubkey(key),
            Err(_) => unknown(),
        },
        Tag::UserID => Packet::UserID(body.to_vec().into()),
        Tag::UserAttribute => Packet::UserAttribute(body.to_vec().into()),
        Tag::Signature => match Signature::parse_body(body) {
            Ok(sig) => Packet::Signature(sig),
            Err(_) => unknown(),
        },
        _ => unknown(),
    }
}

fn parse_key_body(body: &[u8]) -> Result<Key> {
    let mut r = Reader::new(body);

    let version = r.u8()?;
    if version != 4 {
        return Err(Error::UnsupportedVersion(version).into());
    }

    let creation_time = Timestamp::from(r.be_u32()?);
    let pk_algo = PublicKeyAlgorithm::from(r.u8()?);

    use PublicKeyAlgorithm::*;
    let mpis = match pk_algo {
        RSAEncryptSign | RSAEncrypt | RSASign => mpi::PublicKey::RSA {
            n: r.mpi()?,
            e: r.mpi()?,
        },
        DSA => mpi::PublicKey::DSA {
            p: r.mpi()?,
            q: r.mpi()?,
            g: r.mpi()?,
            y: r.mpi()?,
        },
        ElGamalEncrypt | ElGamalEncryptSign => mpi::PublicKey::ElGamal {
            p: r.mpi()?,
            g: r.mpi()?,
            y: r.mpi()?,
        },
        EdDSA => mpi::PublicKey::EdDSA {
            curve: r.curve()?,
            q: r.mpi_opaque()?,
        },
        ECDSA => mpi::PublicKey::ECDSA {
            curve: r.curve()?,
            q: r.mpi_opaque()?,
        },
        ECDH => {
            let curve = r.curve()?;
            let q = r.mpi_opaque()?;
            let kdf_len = r.u8()?;
            if kdf_len != 3 {
                return Err(Error::MalformedPacket(
                    format!("Invalid KDF parameter length {}", kdf_len))
                           .into());
            }
            let reserved = r.u8()?;
            if reserved != 1 {
                return Err(Error::MalformedPacket(
                    format!("Invalid KDF format octet {}", reserved))
                           .into());
            }
            mpi::PublicKey::ECDH {
                curve,
                q,
                hash: r.u8()?.into(),
                sym: r.u8()?.into(),
            }
        },
        Private(_) | Unknown(_) => {
            // Collect whatever MPIs parse, keep the rest verbatim.
            let mut mpis = Vec::new();
            loop {
                let save = r.pos;
                match r.mpi() {
                    Ok(m) => mpis.push(m),
                    Err(_) => {
                        r.pos = save;
                        break;
                    },
                }
            }
            mpi::PublicKey::Unknown {
                mpis: mpis.into_boxed_slice(),
                rest: r.take(r.remaining())?.to_vec().into_boxed_slice(),
            }
        },
    };

    if !r.eof() {
        return Err(Error::MalformedPacket(
            format!("{} octets of trailing junk in key packet",
                    r.remaining())).into());
    }

    Ok(Key::from_parts(version, creation_time, pk_algo, mpis))
}

fn parse_signature_mpis(r: &mut Reader, pk_algo: PublicKeyAlgorithm)
                        -> Result<mpi::Signature>
{
    use PublicKeyAlgorithm::*;
    Ok(match pk_algo {
        RSAEncryptSign | RSASign | RSAEncrypt => mpi::Signature::RSA {
            s: r.mpi()?,
        },
        DSA => mpi::Signature::DSA {
            r: r.mpi()?,
            s: r.mpi()?,
        },
        ElGamalEncryptSign | ElGamalEncrypt => mpi::Signature::ElGamal {
            r: r.mpi()?,
            s: r.mpi()?,
        },
        EdDSA => mpi::Signature::EdDSA {
            r: r.mpi()?,
            s: r.mpi()?,
        },
        ECDSA => mpi::Signature::ECDSA {
            r: r.mpi()?,
            s: r.mpi()?,
        },
        ECDH | Private(_) | Unknown(_) => {
            let mut mpis = Vec::new();
            loop {
                let save = r.pos;
                match r.mpi() {
                    Ok(m) => mpis.push(m),
                    Err(_) => {
                        r.pos = save;
                        break;
                    },
                }
            }
            mpi::Signature::Unknown {
                mpis: mpis.into_boxed_slice(),
                rest: r.take(r.remaining())?.to_vec().into_boxed_slice(),
            }
        },
    })
}

impl Signature {
    /// Parses a signature packet body.
    ///
    /// This is also the form in which a back signature is embedded
    /// in its binding signature.
    pub(crate) fn parse_body(body: &[u8]) -> Result<Signature> {
        let mut r = Reader::new(body);

        let version = r.u8()?;
        match version {
            3 => Self::parse_v3_body(&mut r),
            4 => Self::parse_v4_body(&mut r),
            n => Err(Error::UnsupportedVersion(n).into()),
        }
    }

    fn parse_v4_body(r: &mut Reader) -> Result<Signature> {
        let typ = r.u8()?.into();
        let pk_algo = PublicKeyAlgorithm::from(r.u8()?);
        let hash_algo = r.u8()?.into();

        let hashed_len = r.be_u16()? as usize;
        let hashed_area = SubpacketArea::parse(r.take(hashed_len)?)?;
        let unhashed_len = r.be_u16()? as usize;
        let unhashed_area = SubpacketArea::parse(r.take(unhashed_len)?)?;

        let digest_prefix: [u8; 2] = r.take(2)?.try_into().unwrap();
        let mpis = parse_signature_mpis(r, pk_algo)?;

        if !r.eof() {
            return Err(Error::MalformedPacket(
                format!("{} octets of trailing junk in signature packet",
                        r.remaining())).into());
        }

        Ok(Signature::from_parts(
            SignatureFields::new_v4(typ, pk_algo, hash_algo,
                                    hashed_area, unhashed_area),
            digest_prefix,
            mpis))
    }

    fn parse_v3_body(r: &mut Reader) -> Result<Signature> {
        let hashed_len = r.u8()?;
        if hashed_len != 5 {
            return Err(Error::MalformedPacket(
                format!("Invalid v3 hashed material length {}",
                        hashed_len)).into());
        }

        let typ = r.u8()?.into();
        let creation_time = Timestamp::from(r.be_u32()?);
        let issuer = KeyID::from_bytes(r.take(8)?);
        let pk_algo = PublicKeyAlgorithm::from(r.u8()?);
        let hash_algo = r.u8()?.into();
        let digest_prefix: [u8; 2] = r.take(2)?.try_into().unwrap();
        let mpis = parse_signature_mpis(r, pk_algo)?;

        if !r.eof() {
            return Err(Error::MalformedPacket(
                format!("{} octets of trailing junk in signature packet",
                        r.remaining())).into());
        }

        Ok(Signature::new_v3(typ, pk_algo, hash_algo, creation_time,
                             issuer, digest_prefix, mpis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::signature::SignatureBuilder;
    use crate::packet::UserID;
    use crate::serialize::{Serialize, SerializeInto};
    use crate::types::SignatureType;

    fn roundtrip(packet: &Packet) {
        let buf = packet.to_vec().unwrap();
        let parsed: Vec<Packet> = PacketParser::new(&buf)
            .collect::<Result<_>>().unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(&parsed[0], packet);
        assert_eq!(parsed[0].to_vec().unwrap(), buf);
    }

    fn test_key() -> Key {
        Key::new(Timestamp::from(1183068693),
                 PublicKeyAlgorithm::RSAEncryptSign,
                 mpi::PublicKey::RSA {
                     n: MPI::new(&[0xe5; 256]),
                     e: MPI::new(&[1, 0, 1]),
                 }).unwrap()
    }

    #[test]
    fn key_roundtrip() {
        roundtrip(&Packet::PublicKey(test_key()));
        roundtrip(&Packet::PublicSubkey(test_key()));
    }

    #[test]
    fn ecdh_key_roundtrip() {
        let mut q = vec![0x40];
        q.extend_from_slice(&[0xab; 32]);
        let key = Key::new(
            Timestamp::from(1183068693),
            PublicKeyAlgorithm::ECDH,
            mpi::PublicKey::ECDH {
                curve: Curve::Cv25519,
                q: MPI::new_opaque(&q),
                hash: crate::types::HashAlgorithm::SHA256,
                sym: crate::types::SymmetricAlgorithm::AES128,
            }).unwrap();
        roundtrip(&Packet::PublicSubkey(key));
    }

    #[test]
    fn userid_roundtrip() {
        roundtrip(&Packet::UserID(
            UserID::from("Alice <alice@example.org>")));
    }

    #[test]
    fn signature_roundtrip() {
        use crate::packet::signature::tests::NullSigner;

        let mut signer = NullSigner::new();
        let pk = signer.public().clone();
        let uid = UserID::from("alice@example.org");
        let sig = SignatureBuilder::new(SignatureType::PositiveCertification)
            .set_signature_creation_time(Timestamp::from(1000)).unwrap()
            .sign_userid_binding(&mut signer, &pk, &uid).unwrap();

        roundtrip(&Packet::Signature(sig));
    }

    #[test]
    fn unknown_packet_roundtrip() {
        // A literal data packet (tag 11) is foreign to this crate.
        let mut buf = vec![0xC0 | 11, 4];
        buf.extend_from_slice(b"data");
        let parsed: Vec<Packet> = PacketParser::new(&buf)
            .collect::<Result<_>>().unwrap();
        assert_match!(Packet::Unknown(_) = &parsed[0]);
        assert_eq!(parsed[0].to_vec().unwrap(), buf);
    }

    #[test]
    fn old_format_header() {
        // Old-format CTB for a user id packet: 0x80 | (13 << 2),
        // one-octet length.
        let mut buf = vec![0x80 | (13 << 2), 5];
        buf.extend_from_slice(b"alice");
        let parsed: Vec<Packet> = PacketParser::new(&buf)
            .collect::<Result<_>>().unwrap();
        match &parsed[0] {
            Packet::UserID(uid) => assert_eq!(uid.value(), b"alice"),
            p => panic!("unexpected packet {:?}", p),
        }
    }

    #[test]
    fn truncated_input_is_an_error() {
        let key = test_key();
        let mut buf = Packet::PublicKey(key).to_vec().unwrap();
        buf.truncate(buf.len() - 10);
        let r: Result<Vec<Packet>> =
            PacketParser::new(&buf).collect();
        assert!(r.is_err());
    }

    #[test]
    fn partial_lengths_are_rejected() {
        // 0xE0 is the smallest partial-body length octet.
        let buf = [0xC0 | 6, 0xE0, 0, 0];
        let r: Result<Vec<Packet>> =
            PacketParser::new(&buf).collect();
        assert!(r.is_err());
    }

    #[test]
    fn unsupported_key_version_is_unknown() {
        // A v3 key packet; we do not support v3 keys.
        let mut body = vec![3u8];
        body.extend_from_slice(&[0, 0, 0, 1]); // creation time
        body.extend_from_slice(&[0, 1]); // v3 validity days
        body.push(1); // RSA
        body.extend_from_slice(&[0, 9, 1, 0xff]); // n
        body.extend_from_slice(&[0, 2, 3]); // e
        let mut buf = vec![0xC0 | 6, body.len() as u8];
        buf.extend_from_slice(&body);

        let parsed: Vec<Packet> = PacketParser::new(&buf)
            .collect::<Result<_>>().unwrap();
        assert_match!(Packet::Unknown(_) = &parsed[0]);
        assert_eq!(parsed[0].to_vec().unwrap(), buf);
    }
}
