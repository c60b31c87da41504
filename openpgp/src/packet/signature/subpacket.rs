//! Signature subpackets.
//!
//! A version 4 signature carries two ordered lists of typed TLV
//! records: the hashed area, which is covered by the signature, and
//! the unhashed area, which is advisory.  The key's whole policy
//! (expiration, capabilities, algorithm preferences, designated
//! revokers) travels in these records.
//!
//! Duplicate handling: an occurrence in the hashed area wins over
//! one in the unhashed area; within one area the last occurrence
//! wins; notations accumulate.

use std::fmt;

use crate::Error;
use crate::Fingerprint;
use crate::KeyID;
use crate::Result;
use crate::packet::Signature;
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
    SymmetricAlgorithm,
    Timestamp,
};

/// The length of a subpacket area is limited by the 16-bit length
/// field of the enclosing signature structure.
const MAX_AREA_SIZE: usize = u16::MAX as usize;

/// The subpacket types defined in [Section 5.2.3.1 of RFC 4880].
///
///   [Section 5.2.3.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.1
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SubpacketTag {
    /// The time the signature was made.
    SignatureCreationTime,
    /// The validity period of the signature.
    SignatureExpirationTime,
    /// This subpacket denotes whether a certification signature is
    /// "exportable".
    ExportableCertification,
    /// Signer asserts how much they trust another user to certify.
    TrustSignature,
    /// Used in conjunction with trust signatures to limit the scope
    /// of trust.
    RegularExpression,
    /// Signature's revocability status.
    Revocable,
    /// The validity period of the key.
    KeyExpirationTime,
    /// Symmetric algorithm numbers that indicate which algorithms
    /// the key holder prefers to use.
    PreferredSymmetricAlgorithms,
    /// Authorizes the specified key to issue revocation signatures
    /// for this key.
    RevocationKey,
    /// The OpenPGP Key ID of the key issuing the signature.
    Issuer,
    /// This subpacket describes a "notation" on the signature that
    /// the issuer wishes to make.
    NotationData,
    /// Message digest algorithm numbers that indicate which
    /// algorithms the key holder prefers to receive.
    PreferredHashAlgorithms,
    /// Compression algorithm numbers that indicate which algorithms
    /// the key holder prefers to use.
    PreferredCompressionAlgorithms,
    /// A list of flags that indicate preferences that the key
    /// holder has about how the key is handled on a key server.
    KeyServerPreferences,
    /// This is a URI of a key server that the key holder prefers be
    /// used for updates.
    PreferredKeyServer,
    /// This is a flag in a User ID's self-signature that states
    /// whether this User ID is the main User ID for this key.
    PrimaryUserID,
    /// This subpacket contains a URI of a document that describes
    /// the policy under which the signature was issued.
    PolicyURI,
    /// This subpacket contains a list of binary flags that hold
    /// information about a key.
    KeyFlags,
    /// This subpacket allows a keyholder to state which User ID is
    /// responsible for the signing.
    SignersUserID,
    /// This subpacket is used only on a revocation signature.
    ReasonForRevocation,
    /// The Features subpacket denotes which advanced OpenPGP
    /// features a user's implementation supports.
    Features,
    /// This subpacket identifies a specific target signature to
    /// which a signature refers.
    SignatureTarget,
    /// This subpacket contains a complete Signature packet body.
    EmbeddedSignature,
    /// Reserved subpacket numbers.
    Reserved(u8),
    /// Private or experimental subpacket numbers.
    Private(u8),
    /// Unknown subpacket numbers.
    Unknown(u8),
}

impl From<u8> for SubpacketTag {
    fn from(u: u8) -> Self {
        match u {
            2 => SubpacketTag::SignatureCreationTime,
            3 => SubpacketTag::SignatureExpirationTime,
            4 => SubpacketTag::ExportableCertification,
            5 => SubpacketTag::TrustSignature,
            6 => SubpacketTag::RegularExpression,
            7 => SubpacketTag::Revocable,
            9 => SubpacketTag::KeyExpirationTime,
            11 => SubpacketTag::PreferredSymmetricAlgorithms,
            12 => SubpacketTag::RevocationKey,
            16 => SubpacketTag::Issuer,
            20 => SubpacketTag::NotationData,
            21 => SubpacketTag::PreferredHashAlgorithms,
            22 => SubpacketTag::PreferredCompressionAlgorithms,
            23 => SubpacketTag::KeyServerPreferences,
            24 => SubpacketTag::PreferredKeyServer,
            25 => SubpacketTag::PrimaryUserID,
            26 => SubpacketTag::PolicyURI,
            27 => SubpacketTag::KeyFlags,
            28 => SubpacketTag::SignersUserID,
            29 => SubpacketTag::ReasonForRevocation,
            30 => SubpacketTag::Features,
            31 => SubpacketTag::SignatureTarget,
            32 => SubpacketTag::EmbeddedSignature,
            0 | 1 | 8 | 13..=15 | 17..=19 => SubpacketTag::Reserved(u),
            100..=110 => SubpacketTag::Private(u),
            u => SubpacketTag::Unknown(u),
        }
    }
}

impl From<SubpacketTag> for u8 {
    fn from(t: SubpacketTag) -> Self {
        match t {
            SubpacketTag::SignatureCreationTime => 2,
            SubpacketTag::SignatureExpirationTime => 3,
            SubpacketTag::ExportableCertification => 4,
            SubpacketTag::TrustSignature => 5,
            SubpacketTag::RegularExpression => 6,
            SubpacketTag::Revocable => 7,
            SubpacketTag::KeyExpirationTime => 9,
            SubpacketTag::PreferredSymmetricAlgorithms => 11,
            SubpacketTag::RevocationKey => 12,
            SubpacketTag::Issuer => 16,
            SubpacketTag::NotationData => 20,
            SubpacketTag::PreferredHashAlgorithms => 21,
            SubpacketTag::PreferredCompressionAlgorithms => 22,
            SubpacketTag::KeyServerPreferences => 23,
            SubpacketTag::PreferredKeyServer => 24,
            SubpacketTag::PrimaryUserID => 25,
            SubpacketTag::PolicyURI => 26,
            SubpacketTag::KeyFlags => 27,
            SubpacketTag::SignersUserID => 28,
            SubpacketTag::ReasonForRevocation => 29,
            SubpacketTag::Features => 30,
            SubpacketTag::SignatureTarget => 31,
            SubpacketTag::EmbeddedSignature => 32,
            SubpacketTag::Reserved(u) => u,
            SubpacketTag::Private(u) => u,
            SubpacketTag::Unknown(u) => u,
        }
    }
}

/// A notation on a signature.
///
/// Notations are key-value pairs in the `name@domain` namespace; see
/// [Section 5.2.3.16 of RFC 4880].
///
///   [Section 5.2.3.16 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.16
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotationData {
    flags: u32,
    name: Vec<u8>,
    value: Vec<u8>,
}

impl NotationData {
    /// The flag marking the notation value as human-readable UTF-8.
    pub const FLAG_HUMAN_READABLE: u32 = 0x80000000;

    /// Creates a new notation.
    pub fn new<N, V>(name: N, value: V, flags: u32) -> Self
        where N: AsRef<[u8]>,
              V: AsRef<[u8]>,
    {
        NotationData {
            flags,
            name: name.as_ref().into(),
            value: value.as_ref().into(),
        }
    }

    /// Returns the flags.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Returns whether the value is human-readable.
    pub fn human_readable(&self) -> bool {
        self.flags & Self::FLAG_HUMAN_READABLE > 0
    }

    /// Returns the name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns the value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// The value of a subpacket.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SubpacketValue {
    /// The time the signature was made.
    SignatureCreationTime(Timestamp),
    /// The validity period of the signature, relative to its
    /// creation time.
    SignatureExpirationTime(Duration),
    /// The validity period of the key, relative to the key's
    /// creation time.
    KeyExpirationTime(Duration),
    /// The Key ID of the key issuing the signature.
    Issuer(KeyID),
    /// The symmetric algorithms the key holder prefers, best first.
    PreferredSymmetricAlgorithms(Vec<SymmetricAlgorithm>),
    /// The hash algorithms the key holder prefers, best first.
    PreferredHashAlgorithms(Vec<HashAlgorithm>),
    /// The compression algorithms the key holder prefers, best
    /// first.
    PreferredCompressionAlgorithms(Vec<CompressionAlgorithm>),
    /// A designated revoker.
    RevocationKey(RevocationKey),
    /// A notation.
    NotationData(NotationData),
    /// Key server handling preferences.
    KeyServerPreferences(KeyServerPreferences),
    /// The URI of the key holder's preferred key server.
    PreferredKeyServer(Vec<u8>),
    /// Whether the user id this signature is over is the primary
    /// one.
    PrimaryUserID(bool),
    /// The URI of a policy document.
    PolicyURI(Vec<u8>),
    /// How the key may be used.
    KeyFlags(KeyFlags),
    /// The user id responsible for the signing.
    SignersUserID(Vec<u8>),
    /// Why the key or certification was revoked.
    ReasonForRevocation {
        /// Machine-readable reason.
        code: ReasonForRevocation,
        /// Human-readable explanation.
        reason: Vec<u8>,
    },
    /// The features the key holder's implementation supports.
    Features(Features),
    /// A complete signature packet body; used for back signatures.
    EmbeddedSignature(Box<Signature>),
    /// An uninterpreted subpacket.
    Unknown {
        /// The subpacket type.
        tag: SubpacketTag,
        /// The body, verbatim.
        body: Vec<u8>,
    },
}

impl SubpacketValue {
    /// Returns the subpacket tag for this value.
    pub fn tag(&self) -> SubpacketTag {
        use self::SubpacketValue::*;
        match self {
            SignatureCreationTime(_) => SubpacketTag::SignatureCreationTime,
            SignatureExpirationTime(_) =>
                SubpacketTag::SignatureExpirationTime,
            KeyExpirationTime(_) => SubpacketTag::KeyExpirationTime,
            Issuer(_) => SubpacketTag::Issuer,
            PreferredSymmetricAlgorithms(_) =>
                SubpacketTag::PreferredSymmetricAlgorithms,
            PreferredHashAlgorithms(_) =>
                SubpacketTag::PreferredHashAlgorithms,
            PreferredCompressionAlgorithms(_) =>
                SubpacketTag::PreferredCompressionAlgorithms,
            RevocationKey(_) => SubpacketTag::RevocationKey,
            NotationData(_) => SubpacketTag::NotationData,
            KeyServerPreferences(_) => SubpacketTag::KeyServerPreferences,
            PreferredKeyServer(_) => SubpacketTag::PreferredKeyServer,
            PrimaryUserID(_) => SubpacketTag::PrimaryUserID,
            PolicyURI(_) => SubpacketTag::PolicyURI,
            KeyFlags(_) => SubpacketTag::KeyFlags,
            SignersUserID(_) => SubpacketTag::SignersUserID,
            ReasonForRevocation { .. } => SubpacketTag::ReasonForRevocation,
            Features(_) => SubpacketTag::Features,
            EmbeddedSignature(_) => SubpacketTag::EmbeddedSignature,
            Unknown { tag, .. } => *tag,
        }
    }

    /// Serializes the body of this subpacket.
    pub(crate) fn to_body(&self) -> Vec<u8> {
        use self::SubpacketValue::*;
        let mut buf = Vec::new();
        match self {
            SignatureCreationTime(t) =>
                buf.extend_from_slice(&u32::from(*t).to_be_bytes()),
            SignatureExpirationTime(d) | KeyExpirationTime(d) =>
                buf.extend_from_slice(&u32::from(*d).to_be_bytes()),
            Issuer(id) => buf.extend_from_slice(id.as_bytes()),
            PreferredSymmetricAlgorithms(algos) =>
                buf.extend(algos.iter().map(|&a| u8::from(a))),
            PreferredHashAlgorithms(algos) =>
                buf.extend(algos.iter().map(|&a| u8::from(a))),
            PreferredCompressionAlgorithms(algos) =>
                buf.extend(algos.iter().map(|&a| u8::from(a))),
            RevocationKey(rk) => {
                buf.push(rk.class());
                buf.push(rk.revoker_algo().into());
                buf.extend_from_slice(rk.revoker_fingerprint().as_bytes());
            },
            NotationData(n) => {
                buf.extend_from_slice(&n.flags().to_be_bytes());
                buf.extend_from_slice(&(n.name().len() as u16).to_be_bytes());
                buf.extend_from_slice(&(n.value().len() as u16).to_be_bytes());
                buf.extend_from_slice(n.name());
                buf.extend_from_slice(n.value());
            },
            KeyServerPreferences(p) => buf.push(p.bits()),
            PreferredKeyServer(uri) => buf.extend_from_slice(uri),
            PrimaryUserID(primary) => buf.push(if *primary { 1 } else { 0 }),
            PolicyURI(uri) => buf.extend_from_slice(uri),
            KeyFlags(flags) => buf.push(flags.bits()),
            SignersUserID(uid) => buf.extend_from_slice(uid),
            ReasonForRevocation { code, reason } => {
                buf.push(u8::from(*code));
                buf.extend_from_slice(reason);
            },
            Features(features) => buf.push(features.bits()),
            EmbeddedSignature(sig) => sig.serialize_body_into(&mut buf),
            Unknown { body, .. } => buf.extend_from_slice(body),
        }
        buf
    }

    /// Parses a subpacket body.
    ///
    /// Anything that does not have the expected shape is preserved
    /// as `Unknown`; whether that is an error is the verifier's
    /// call, based on the critical bit.
    pub(crate) fn parse(tag: SubpacketTag, body: Vec<u8>) -> SubpacketValue {
        use self::SubpacketTag as T;
        use self::SubpacketValue::*;

        let be_u32 = |b: &[u8]| -> Option<u32> {
            b.try_into().ok().map(u32::from_be_bytes)
        };

        match tag {
            T::SignatureCreationTime => match be_u32(&body) {
                Some(t) => SignatureCreationTime(t.into()),
                None => Unknown { tag, body },
            },
            T::SignatureExpirationTime => match be_u32(&body) {
                Some(d) => SignatureExpirationTime(d.into()),
                None => Unknown { tag, body },
            },
            T::KeyExpirationTime => match be_u32(&body) {
                Some(d) => KeyExpirationTime(d.into()),
                None => Unknown { tag, body },
            },
            T::Issuer if body.len() == 8 =>
                Issuer(KeyID::from_bytes(&body)),
            T::PreferredSymmetricAlgorithms =>
                PreferredSymmetricAlgorithms(
                    body.iter().map(|&b| b.into()).collect()),
            T::PreferredHashAlgorithms =>
                PreferredHashAlgorithms(
                    body.iter().map(|&b| b.into()).collect()),
            T::PreferredCompressionAlgorithms =>
                PreferredCompressionAlgorithms(
                    body.iter().map(|&b| b.into()).collect()),
            T::RevocationKey if body.len() == 22 => {
                let class = body[0];
                let pk_algo = PublicKeyAlgorithm::from(body[1]);
                let fp = Fingerprint::from_bytes(&body[2..]);
                match crate::types::RevocationKey::from_bits(
                    class, pk_algo, fp)
                {
                    Ok(rk) => RevocationKey(rk),
                    Err(_) => Unknown { tag, body },
                }
            },
            T::NotationData if body.len() >= 8 => {
                let flags = u32::from_be_bytes(body[..4].try_into().unwrap());
                let name_len =
                    u16::from_be_bytes(body[4..6].try_into().unwrap())
                    as usize;
                let value_len =
                    u16::from_be_bytes(body[6..8].try_into().unwrap())
                    as usize;
                if body.len() == 8 + name_len + value_len {
                    NotationData(self::NotationData::new(
                        &body[8..8 + name_len],
                        &body[8 + name_len..],
                        flags))
                } else {
                    Unknown { tag, body }
                }
            },
            T::KeyServerPreferences if body.len() >= 1 =>
                KeyServerPreferences(
                    crate::types::KeyServerPreferences::from_bits(body[0])),
            T::PreferredKeyServer => PreferredKeyServer(body),
            T::PrimaryUserID if body.len() == 1 =>
                PrimaryUserID(body[0] != 0),
            T::PolicyURI => PolicyURI(body),
            T::KeyFlags if body.len() >= 1 =>
                KeyFlags(crate::types::KeyFlags::from_bits(body[0])),
            T::SignersUserID => SignersUserID(body),
            T::ReasonForRevocation if body.len() >= 1 =>
                ReasonForRevocation {
                    code: body[0].into(),
                    reason: body[1..].to_vec(),
                },
            T::Features if body.len() >= 1 =>
                Features(crate::types::Features::from_bits(body[0])),
            T::EmbeddedSignature => {
                match Signature::parse_body(&body) {
                    Ok(sig) => EmbeddedSignature(Box::new(sig)),
                    Err(_) => Unknown { tag, body },
                }
            },
            tag => Unknown { tag, body },
        }
    }
}

/// The length encoding of a subpacket.
///
/// Parsed subpackets remember their length encoding so that
/// re-serializing a signature reproduces the input bit for bit even
/// when the original used a non-minimal encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SubpacketLength {
    /// The length, covering the type octet and the body.
    pub(crate) len: u32,
    /// The raw encoding, if it was not minimal.
    pub(crate) raw: Option<Vec<u8>>,
}

impl SubpacketLength {
    pub(crate) fn minimal(len: u32) -> Self {
        SubpacketLength { len, raw: None }
    }

    /// Writes the length encoding.
    pub(crate) fn emit(&self, buf: &mut Vec<u8>) {
        if let Some(raw) = &self.raw {
            buf.extend_from_slice(raw);
        } else if self.len < 192 {
            buf.push(self.len as u8);
        } else if self.len < 16320 {
            let len = self.len - 192;
            buf.push((len / 256 + 192) as u8);
            buf.push((len % 256) as u8);
        } else {
            buf.push(255);
            buf.extend_from_slice(&self.len.to_be_bytes());
        }
    }

    /// The number of octets the encoding occupies.
    pub(crate) fn encoded_len(&self) -> usize {
        match &self.raw {
            Some(raw) => raw.len(),
            None if self.len < 192 => 1,
            None if self.len < 16320 => 2,
            None => 5,
        }
    }
}

/// A subpacket.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Subpacket {
    /// The length encoding.
    length: SubpacketLength,
    /// Critical flag.
    critical: bool,
    /// Packet value, must match the packet type.
    value: SubpacketValue,
}

impl fmt::Debug for Subpacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("Subpacket");
        if self.critical {
            s.field("critical", &self.critical);
        }
        s.field("value", &self.value);
        s.finish()
    }
}

impl Subpacket {
    /// Creates a new subpacket.
    pub fn new(value: SubpacketValue, critical: bool) -> Subpacket {
        let body_len = value.to_body().len();
        Subpacket {
            length: SubpacketLength::minimal(1 + body_len as u32),
            critical,
            value,
        }
    }

    pub(crate) fn with_length(length: SubpacketLength,
                              critical: bool,
                              value: SubpacketValue)
                              -> Subpacket
    {
        Subpacket { length, critical, value }
    }

    /// Returns whether the critical bit is set.
    pub fn critical(&self) -> bool {
        self.critical
    }

    /// Returns the subpacket tag.
    pub fn tag(&self) -> SubpacketTag {
        self.value.tag()
    }

    /// Returns the subpacket's value.
    pub fn value(&self) -> &SubpacketValue {
        &self.value
    }

    /// Serializes the subpacket, including its length and type
    /// octet.
    pub(crate) fn emit(&self, buf: &mut Vec<u8>) {
        self.length.emit(buf);
        let typ = u8::from(self.tag())
            | if self.critical { 0x80 } else { 0 };
        buf.push(typ);
        buf.extend_from_slice(&self.value.to_body());
    }

    /// Returns the number of octets the serialized subpacket
    /// occupies.
    pub(crate) fn serialized_len(&self) -> usize {
        self.length.encoded_len() + self.length.len as usize
    }
}

/// A subpacket area.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SubpacketArea {
    packets: Vec<Subpacket>,
}

impl fmt::Debug for SubpacketArea {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.packets.iter()).finish()
    }
}

impl SubpacketArea {
    /// Returns an empty subpacket area.
    pub fn empty() -> SubpacketArea {
        SubpacketArea { packets: Vec::new() }
    }

    /// Returns a new subpacket area containing the given
    /// subpackets.
    pub fn new(packets: Vec<Subpacket>) -> SubpacketArea {
        SubpacketArea { packets }
    }

    /// Parses a subpacket area.
    pub(crate) fn parse(data: &[u8]) -> Result<SubpacketArea> {
        let mut packets = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            // Subpacket length.
            let (len, raw_len): (u32, Option<Vec<u8>>) = match data[pos] {
                b if b < 192 => {
                    pos += 1;
                    (b as u32, None)
                },
                b if b < 255 => {
                    if pos + 2 > data.len() {
                        return Err(Error::MalformedPacket(
                            "Truncated subpacket length".into()).into());
                    }
                    let len = (b as u32 - 192) * 256
                        + data[pos + 1] as u32 + 192;
                    pos += 2;
                    (len, None)
                },
                _ => {
                    if pos + 5 > data.len() {
                        return Err(Error::MalformedPacket(
                            "Truncated subpacket length".into()).into());
                    }
                    let len = u32::from_be_bytes(
                        data[pos + 1..pos + 5].try_into().unwrap());
                    let raw = data[pos..pos + 5].to_vec();
                    pos += 5;
                    // Remember the encoding only if it is not
                    // minimal.
                    (len, if len >= 16320 { None } else { Some(raw) })
                },
            };

            if len < 1 {
                return Err(Error::MalformedPacket(
                    "Zero-length subpacket".into()).into());
            }
            if pos + len as usize > data.len() {
                return Err(Error::MalformedPacket(
                    format!("Subpacket extends {} bytes beyond the area",
                            pos + len as usize - data.len())).into());
            }

            // Type octet and body.
            let typ = data[pos];
            let critical = typ & 0x80 > 0;
            let tag = SubpacketTag::from(typ & 0x7f);
            let body = data[pos + 1..pos + len as usize].to_vec();
            pos += len as usize;

            packets.push(Subpacket::with_length(
                SubpacketLength { len, raw: raw_len },
                critical,
                SubpacketValue::parse(tag, body)));
        }

        Ok(SubpacketArea { packets })
    }

    /// Serializes the area, not including the two-octet length
    /// field of the enclosing structure.
    pub(crate) fn emit(&self, buf: &mut Vec<u8>) {
        for sp in &self.packets {
            sp.emit(buf);
        }
    }

    /// Returns the number of octets the serialized area occupies.
    pub fn serialized_len(&self) -> usize {
        self.packets.iter().map(|sp| sp.serialized_len()).sum()
    }

    /// Iterates over the subpackets.
    pub fn iter(&self) -> impl Iterator<Item = &Subpacket> {
        self.packets.iter()
    }

    /// Returns the last subpacket with the given tag.
    ///
    /// For subpackets that may only appear once, the last occurrence
    /// wins.
    pub fn lookup(&self, tag: SubpacketTag) -> Option<&Subpacket> {
        self.packets.iter().rev().find(|sp| sp.tag() == tag)
    }

    /// Adds the given subpacket.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPacket` if adding the packet makes
    /// the area exceed the maximum size of a subpacket area.
    pub fn add(&mut self, packet: Subpacket) -> Result<()> {
        if self.serialized_len() + packet.serialized_len() > MAX_AREA_SIZE {
            return Err(Error::MalformedPacket(
                format!("Subpacket area exceeds {} bytes",
                        MAX_AREA_SIZE)).into());
        }
        self.packets.push(packet);
        Ok(())
    }

    /// Adds the given subpacket, replacing all other subpackets with
    /// the same tag.
    pub fn replace(&mut self, packet: Subpacket) -> Result<()> {
        self.remove_all(packet.tag());
        self.add(packet)
    }

    /// Removes all subpackets with the given tag.
    pub fn remove_all(&mut self, tag: SubpacketTag) {
        self.packets.retain(|sp| sp.tag() != tag);
    }

    /// Returns whether the area contains a critical subpacket we do
    /// not understand.  Such a signature must not verify.
    pub(crate) fn unknown_critical(&self) -> Option<u8> {
        self.packets.iter()
            .filter(|sp| sp.critical())
            .find_map(|sp| match sp.value() {
                SubpacketValue::Unknown { tag, .. } =>
                    Some(u8::from(*tag)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_roundtrip(area: &SubpacketArea) -> SubpacketArea {
        let mut buf = Vec::new();
        area.emit(&mut buf);
        assert_eq!(buf.len(), area.serialized_len());
        SubpacketArea::parse(&buf).unwrap()
    }

    #[test]
    fn roundtrip_simple_area() {
        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::SignatureCreationTime(1234567890.into()),
            false)).unwrap();
        area.add(Subpacket::new(
            SubpacketValue::KeyFlags(KeyFlags::empty()
                                     .set_certification(true)
                                     .set_signing(true)),
            false)).unwrap();
        area.add(Subpacket::new(
            SubpacketValue::PreferredSymmetricAlgorithms(vec![
                SymmetricAlgorithm::AES256,
                SymmetricAlgorithm::AES192,
                SymmetricAlgorithm::AES128,
                SymmetricAlgorithm::TripleDES,
            ]),
            false)).unwrap();

        let parsed = area_roundtrip(&area);
        assert_eq!(area, parsed);

        match parsed.lookup(SubpacketTag::PreferredSymmetricAlgorithms)
            .unwrap().value()
        {
            SubpacketValue::PreferredSymmetricAlgorithms(a) => {
                assert_eq!(a.iter().map(|&x| u8::from(x)).collect::<Vec<_>>(),
                           vec![9, 8, 7, 2]);
            },
            v => panic!("unexpected value {:?}", v),
        }
    }

    #[test]
    fn last_occurrence_wins() {
        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::SignatureCreationTime(1.into()), false)).unwrap();
        area.add(Subpacket::new(
            SubpacketValue::SignatureCreationTime(2.into()), false)).unwrap();

        match area.lookup(SubpacketTag::SignatureCreationTime)
            .unwrap().value()
        {
            SubpacketValue::SignatureCreationTime(t) =>
                assert_eq!(u32::from(*t), 2),
            v => panic!("unexpected value {:?}", v),
        }
    }

    #[test]
    fn critical_bit_roundtrips() {
        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::NotationData(NotationData::new(
                "test@example.org", b"value",
                NotationData::FLAG_HUMAN_READABLE)),
            true)).unwrap();

        let parsed = area_roundtrip(&area);
        let sp = parsed.lookup(SubpacketTag::NotationData).unwrap();
        assert!(sp.critical());
        match sp.value() {
            SubpacketValue::NotationData(n) => {
                assert_eq!(n.name(), b"test@example.org");
                assert_eq!(n.value(), b"value");
                assert!(n.human_readable());
            },
            v => panic!("unexpected value {:?}", v),
        }
    }

    #[test]
    fn unknown_critical_detection() {
        // Tag 99 is in the private range, but unknown to us as a
        // value.
        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::Unknown {
                tag: SubpacketTag::from(66),
                body: vec![1, 2, 3],
            }, true)).unwrap();
        assert_eq!(area.unknown_critical(), Some(66));

        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::Unknown {
                tag: SubpacketTag::from(66),
                body: vec![1, 2, 3],
            }, false)).unwrap();
        assert_eq!(area.unknown_critical(), None);
    }

    #[test]
    fn revocation_key_roundtrip() {
        let rk = RevocationKey::new(
            PublicKeyAlgorithm::RSAEncryptSign,
            crate::Fingerprint::V4([0x77; 20]),
            false);
        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::RevocationKey(rk.clone()), false)).unwrap();

        let parsed = area_roundtrip(&area);
        match parsed.lookup(SubpacketTag::RevocationKey).unwrap().value() {
            SubpacketValue::RevocationKey(got) => assert_eq!(got, &rk),
            v => panic!("unexpected value {:?}", v),
        }
    }

    #[test]
    fn two_byte_length_roundtrip() {
        // A subpacket longer than 190 bytes needs the two-octet
        // length form.
        let mut area = SubpacketArea::empty();
        area.add(Subpacket::new(
            SubpacketValue::PolicyURI(vec![b'u'; 300]), false)).unwrap();

        let parsed = area_roundtrip(&area);
        assert_eq!(area, parsed);
    }

    #[test]
    fn truncated_area_is_rejected() {
        let mut buf = Vec::new();
        SubpacketArea::new(vec![Subpacket::new(
            SubpacketValue::SignatureCreationTime(1.into()), false)])
            .emit(&mut buf);
        buf.pop();
        assert!(SubpacketArea::parse(&buf).is_err());
    }
}
