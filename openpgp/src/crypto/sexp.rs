//! S-Expression support.
//!
//! The secret-key agent names keys and transports key material and
//! signature values as S-expressions in the canonical transport
//! encoding ([S-Expressions]): lists delimited by `(` and `)`, and
//! strings written as `<decimal length>:<raw bytes>`.
//!
//! This module implements the codec, the conversions between
//! S-expressions and the typed MPI representations, and the keygrip,
//! which is the SHA-1 hash of a canonical S-expression of the public
//! parameters and the handle by which the agent names secret keys.
//!
//! [S-Expressions]: https://people.csail.mit.edu/rivest/Sexp.txt

use std::fmt;

use crate::Error;
use crate::Result;
use crate::crypto::mpi::{self, MPI};
use crate::types::{
    Curve,
    HashAlgorithm,
    PublicKeyAlgorithm,
    SymmetricAlgorithm,
};

/// An S-Expression.
///
/// An S-Expression is either a string, or a list of S-Expressions.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Sexp {
    /// Just a string.
    String(Box<[u8]>),
    /// A list of S-Expressions.
    List(Vec<Sexp>),
}

impl fmt::Debug for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sexp::String(s) => match std::str::from_utf8(s) {
                Ok(t) if t.chars().all(|c| !c.is_control()) =>
                    write!(f, "{:?}", t),
                _ => write!(f, "#{}#", crate::fmt::to_hex(s, false)),
            },
            Sexp::List(l) => f.debug_list().entries(l.iter()).finish(),
        }
    }
}

impl Sexp {
    /// Creates a string from a symbolic token.
    pub fn sym(s: &str) -> Sexp {
        Sexp::String(s.as_bytes().into())
    }

    /// Creates a string from raw bytes.
    pub fn bytes<B: AsRef<[u8]>>(b: B) -> Sexp {
        Sexp::String(b.as_ref().into())
    }

    /// Returns the string value, if this is a string.
    pub fn string(&self) -> Option<&[u8]> {
        match self {
            Sexp::String(s) => Some(s),
            Sexp::List(_) => None,
        }
    }

    /// Returns the children, if this is a list.
    pub fn list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::String(_) => None,
            Sexp::List(l) => Some(l),
        }
    }

    /// Looks up a sublist tagged with `token`.
    ///
    /// Searches the children of this list for a list whose first
    /// element is the string `token`, the way `gcry_sexp_find_token`
    /// does.
    pub fn lookup(&self, token: &str) -> Option<&Sexp> {
        for child in self.list()? {
            if let Sexp::List(grandchildren) = child {
                match grandchildren.first() {
                    Some(Sexp::String(s)) if &s[..] == token.as_bytes() =>
                        return Some(child),
                    _ => (),
                }
            }
        }
        None
    }

    /// Looks up the value of a `(token value)` sublist.
    pub fn lookup_value(&self, token: &str) -> Option<&[u8]> {
        match self.lookup(token)?.list()? {
            [_, Sexp::String(v)] => Some(v),
            _ => None,
        }
    }

    /// Parses an S-Expression in canonical transport encoding.
    ///
    /// Whitespace between tokens is tolerated.  Exactly one
    /// expression must be present.
    pub fn from_bytes(data: &[u8]) -> Result<Sexp> {
        let mut pos = 0;
        let sexp = parse_sexp(data, &mut pos)?;
        skip_whitespace(data, &mut pos);
        if pos != data.len() {
            return Err(Error::InvalidArgument(
                format!("Trailing data at offset {}", pos)).into());
        }
        Ok(sexp)
    }

    /// Serializes using the canonical transport encoding.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Sexp::String(s) => {
                buf.extend_from_slice(format!("{}:", s.len()).as_bytes());
                buf.extend_from_slice(s);
            },
            Sexp::List(l) => {
                buf.push(b'(');
                for child in l {
                    child.serialize_into(buf);
                }
                buf.push(b')');
            },
        }
    }
}

fn skip_whitespace(data: &[u8], pos: &mut usize) {
    while data.get(*pos).map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
        *pos += 1;
    }
}

fn parse_sexp(data: &[u8], pos: &mut usize) -> Result<Sexp> {
    skip_whitespace(data, pos);
    match data.get(*pos) {
        Some(b'(') => {
            *pos += 1;
            let mut children = Vec::new();
            loop {
                skip_whitespace(data, pos);
                match data.get(*pos) {
                    Some(b')') => {
                        *pos += 1;
                        return Ok(Sexp::List(children));
                    },
                    Some(_) => children.push(parse_sexp(data, pos)?),
                    None => return Err(Error::InvalidArgument(
                        "Unterminated list".into()).into()),
                }
            }
        },
        Some(b'0'..=b'9') => {
            let start = *pos;
            while data.get(*pos).map(|b| b.is_ascii_digit()).unwrap_or(false) {
                *pos += 1;
            }
            let len: usize = std::str::from_utf8(&data[start..*pos])
                .expect("just matched digits")
                .parse()
                .map_err(|_| Error::InvalidArgument(
                    "Invalid length prefix".into()))?;
            if data.get(*pos) != Some(&b':') {
                return Err(Error::InvalidArgument(
                    format!("Expected ':' at offset {}", *pos)).into());
            }
            *pos += 1;
            if data.len() - *pos < len {
                return Err(Error::InvalidArgument(
                    "Truncated string".into()).into());
            }
            let s = &data[*pos..*pos + len];
            *pos += len;
            Ok(Sexp::bytes(s))
        },
        Some(b) => Err(Error::InvalidArgument(
            format!("Unexpected byte {:#x} at offset {}", b, *pos)).into()),
        None => Err(Error::InvalidArgument("Empty input".into()).into()),
    }
}

/// A keygrip.
///
/// The keygrip is the SHA-1 hash over a canonical S-expression of a
/// key's public parameters.  Unlike the fingerprint it does not
/// depend on the creation time, so it is stable across protocols;
/// the secret-key agent names secret keys by it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Keygrip([u8; 20]);

impl fmt::Debug for Keygrip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Keygrip({})", self)
    }
}

impl fmt::Display for Keygrip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&crate::fmt::to_hex(&self.0, false))
    }
}

impl Keygrip {
    /// Returns a reference to the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parses a keygrip from its 40-digit hexadecimal form.
    pub fn from_hex(hex: &str) -> Result<Keygrip> {
        let bytes = crate::fmt::from_hex(hex, true)?;
        if bytes.len() != 20 {
            return Err(Error::InvalidArgument(
                format!("Expected 20 bytes, got {}", bytes.len())).into());
        }
        let mut grip = [0; 20];
        grip.copy_from_slice(&bytes);
        Ok(Keygrip(grip))
    }
}

impl From<[u8; 20]> for Keygrip {
    fn from(b: [u8; 20]) -> Self {
        Keygrip(b)
    }
}

/// Computes the keygrip of the given public key material.
///
/// The S-expression hashed is algorithm dependent:
///
/// ```text
/// (public-key(rsa(n ...)(e ...)))
/// (public-key(dsa(p ...)(q ...)(g ...)(y ...)))
/// (public-key(elg(p ...)(g ...)(y ...)))
/// (public-key(ecc(curve "NAME")(q ...)))
/// (public-key(ecc(curve "NAME")(flags eddsa)(q ...)))
/// ```
///
/// where NAME is the symbolic curve name, never the OID.
pub fn keygrip(mpis: &mpi::PublicKey) -> Result<Keygrip> {
    let sexp = keygrip_sexp(mpis)?;

    let mut ctx = HashAlgorithm::SHA1.context()?;
    ctx.update(&sexp.to_vec());
    let mut grip = [0u8; 20];
    ctx.digest(&mut grip);
    Ok(Keygrip(grip))
}

fn param(name: &str, value: &MPI) -> Sexp {
    Sexp::List(vec![Sexp::sym(name), Sexp::bytes(value.value())])
}

/// Returns the S-expression the keygrip is computed over.
pub(crate) fn keygrip_sexp(mpis: &mpi::PublicKey) -> Result<Sexp> {
    use crate::crypto::mpi::PublicKey::*;

    let key = match mpis {
        RSA { e, n } => Sexp::List(vec![
            Sexp::sym("rsa"),
            param("n", n),
            param("e", e),
        ]),
        DSA { p, q, g, y } => Sexp::List(vec![
            Sexp::sym("dsa"),
            param("p", p),
            param("q", q),
            param("g", g),
            param("y", y),
        ]),
        ElGamal { p, g, y } => Sexp::List(vec![
            Sexp::sym("elg"),
            param("p", p),
            param("g", g),
            param("y", y),
        ]),
        ECDSA { curve, q } | ECDH { curve, q, .. } => Sexp::List(vec![
            Sexp::sym("ecc"),
            Sexp::List(vec![Sexp::sym("curve"), Sexp::sym(curve.name()?)]),
            param("q", q),
        ]),
        EdDSA { curve, q } => Sexp::List(vec![
            Sexp::sym("ecc"),
            Sexp::List(vec![Sexp::sym("curve"), Sexp::sym(curve.name()?)]),
            Sexp::List(vec![Sexp::sym("flags"), Sexp::sym("eddsa")]),
            param("q", q),
        ]),
        Unknown { .. } =>
            return Err(Error::BadKeyMaterial(
                "Cannot compute keygrip of unknown key material".into())
                       .into()),
    };

    Ok(Sexp::List(vec![Sexp::sym("public-key"), key]))
}

/// The default KDF parameters for an ECDH key over the given curve.
///
/// The agent's public-key S-expression does not carry the OpenPGP
/// KDF parameters; they are chosen by field size.
pub fn default_ecdh_kdf(curve: &Curve)
                        -> (HashAlgorithm, SymmetricAlgorithm)
{
    match curve.bits().unwrap_or(0) {
        0..=256 => (HashAlgorithm::SHA256, SymmetricAlgorithm::AES128),
        257..=384 => (HashAlgorithm::SHA384, SymmetricAlgorithm::AES192),
        _ => (HashAlgorithm::SHA512, SymmetricAlgorithm::AES256),
    }
}

/// Parses a `(public-key ...)` S-expression, as returned by the
/// agent's GENKEY and READKEY commands.
///
/// An `ecc` key without the `eddsa` flag is ambiguous between ECDSA
/// and ECDH; `want` resolves the ambiguity (Curve25519 always means
/// ECDH).
pub fn key_from_sexp(sexp: &Sexp, want: Option<PublicKeyAlgorithm>)
                     -> Result<mpi::PublicKey>
{
    let children = sexp.list()
        .ok_or_else(|| Error::InvalidArgument(
            "Expected a list".into()))?;
    match children.first().and_then(Sexp::string) {
        Some(b"public-key") => (),
        _ => return Err(Error::InvalidArgument(
            "Expected (public-key ...)".into()).into()),
    }

    let (key, key_items) = match children.get(1) {
        Some(k @ Sexp::List(items)) => (k, items),
        _ => return Err(Error::InvalidArgument(
            "Missing key parameters".into()).into()),
    };
    let algo = key_items.first().and_then(Sexp::string)
        .ok_or_else(|| Error::InvalidArgument(
            "Missing algorithm token".into()))?;

    let require = |token: &str| -> Result<MPI> {
        key.lookup_value(token)
            .map(MPI::new)
            .ok_or_else(|| Error::BadKeyMaterial(
                format!("Missing parameter '{}'", token)).into())
    };

    match algo {
        b"rsa" => Ok(mpi::PublicKey::RSA {
            n: require("n")?,
            e: require("e")?,
        }),
        b"dsa" => Ok(mpi::PublicKey::DSA {
            p: require("p")?,
            q: require("q")?,
            g: require("g")?,
            y: require("y")?,
        }),
        b"elg" => Ok(mpi::PublicKey::ElGamal {
            p: require("p")?,
            g: require("g")?,
            y: require("y")?,
        }),
        b"ecc" => {
            let curve = key.lookup_value("curve")
                .and_then(|name| std::str::from_utf8(name).ok()
                          .and_then(|name| Curve::from_name(name).ok()))
                .ok_or_else(|| Error::BadKeyMaterial(
                    "Missing or unknown curve".into()))?;
            // The point is opaque; the format octet is part of the
            // value.
            let q = key.lookup_value("q")
                .map(MPI::new_opaque)
                .ok_or_else(|| Error::BadKeyMaterial(
                    "Missing parameter 'q'".into()))?;

            let eddsa = key.lookup("flags")
                .and_then(Sexp::list)
                .map(|flags| flags[1..].iter().any(
                    |f| f.string() == Some(b"eddsa")))
                .unwrap_or(false);

            if eddsa {
                Ok(mpi::PublicKey::EdDSA { curve, q })
            } else if curve == Curve::Cv25519
                || want == Some(PublicKeyAlgorithm::ECDH)
            {
                let (hash, sym) = default_ecdh_kdf(&curve);
                Ok(mpi::PublicKey::ECDH { curve, q, hash, sym })
            } else {
                Ok(mpi::PublicKey::ECDSA { curve, q })
            }
        },
        other => Err(Error::BadKeyMaterial(
            format!("Unknown algorithm token {:?}",
                    String::from_utf8_lossy(other))).into()),
    }
}

/// Parses a `(sig-val ...)` S-expression, as returned by the agent's
/// PKSIGN command.
pub fn signature_from_sexp(sexp: &Sexp, algo: PublicKeyAlgorithm)
                           -> Result<mpi::Signature>
{
    let children = sexp.list()
        .ok_or_else(|| Error::InvalidArgument("Expected a list".into()))?;
    match children.first().and_then(Sexp::string) {
        Some(b"sig-val") => (),
        _ => return Err(Error::InvalidArgument(
            "Expected (sig-val ...)".into()).into()),
    }

    let val = match children.get(1) {
        Some(v @ Sexp::List(_)) => v,
        _ => return Err(Error::InvalidArgument(
            "Missing signature value".into()).into()),
    };

    let require = |token: &str| -> Result<MPI> {
        val.lookup_value(token)
            .map(MPI::new)
            .ok_or_else(|| Error::BadSignature(
                format!("Missing parameter '{}'", token)).into())
    };

    use crate::types::PublicKeyAlgorithm::*;
    match algo {
        RSAEncryptSign | RSASign => Ok(mpi::Signature::RSA {
            s: require("s")?,
        }),
        DSA => Ok(mpi::Signature::DSA {
            r: require("r")?,
            s: require("s")?,
        }),
        ECDSA => Ok(mpi::Signature::ECDSA {
            r: require("r")?,
            s: require("s")?,
        }),
        EdDSA => Ok(mpi::Signature::EdDSA {
            r: require("r")?,
            s: require("s")?,
        }),
        algo => Err(Error::UnsupportedPublicKeyAlgorithm(algo).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basics() {
        assert_eq!(Sexp::from_bytes(b"()").unwrap(),
                   Sexp::List(vec![]));
        assert_eq!(Sexp::from_bytes(b"2:hi").unwrap(),
                   Sexp::bytes(b"hi"));
        assert_eq!(Sexp::from_bytes(b"(2:hi2:ho)").unwrap(),
                   Sexp::List(vec![
                       Sexp::bytes(b"hi"),
                       Sexp::bytes(b"ho"),
                   ]));
        assert_eq!(Sexp::from_bytes(b"(7:sig-val(3:rsa(1:s3:abc)))").unwrap(),
                   Sexp::List(vec![
                       Sexp::bytes(b"sig-val"),
                       Sexp::List(vec![
                           Sexp::bytes(b"rsa"),
                           Sexp::List(vec![
                               Sexp::bytes(b"s"),
                               Sexp::bytes(b"abc"),
                           ]),
                       ]),
                   ]));

        assert!(Sexp::from_bytes(b"").is_err());
        assert!(Sexp::from_bytes(b"(").is_err());
        assert!(Sexp::from_bytes(b"(2:hi").is_err());
        assert!(Sexp::from_bytes(b"(2:hi)(2:hi)").is_err());
        assert!(Sexp::from_bytes(b"5:nope").is_err());
    }

    #[test]
    fn roundtrip() {
        let input: &[u8] = b"(10:public-key(3:rsa(1:n3:abc)(1:e3:\x01\x00\x01)))";
        let sexp = Sexp::from_bytes(input).unwrap();
        assert_eq!(sexp.to_vec(), input);
    }

    #[test]
    fn lookup() {
        let sexp = Sexp::from_bytes(b"(3:rsa(1:n2:ab)(1:e1:c))").unwrap();
        assert_eq!(sexp.lookup_value("n").unwrap(), b"ab");
        assert_eq!(sexp.lookup_value("e").unwrap(), b"c");
        assert!(sexp.lookup("q").is_none());
    }

    #[test]
    fn parse_rsa_key() {
        let sexp = Sexp::from_bytes(
            b"(10:public-key(3:rsa(1:n3:\x01\x02\x03)(1:e3:\x01\x00\x01)))")
            .unwrap();
        match key_from_sexp(&sexp, None).unwrap() {
            mpi::PublicKey::RSA { n, e } => {
                assert_eq!(n.value(), &[1, 2, 3]);
                assert_eq!(e.value(), &[1, 0, 1]);
            },
            k => panic!("unexpected key {:?}", k),
        }
    }

    #[test]
    fn parse_eddsa_key() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"(10:public-key(3:ecc(5:curve7:Ed25519)\
                                (5:flags5:eddsa)(1:q33:");
        buf.push(0x40);
        buf.extend_from_slice(&[7u8; 32]);
        buf.extend_from_slice(b")))");
        let sexp = Sexp::from_bytes(&buf).unwrap();
        match key_from_sexp(&sexp, None).unwrap() {
            mpi::PublicKey::EdDSA { curve, q } => {
                assert_eq!(curve, Curve::Ed25519);
                assert_eq!(q.value()[0], 0x40);
            },
            k => panic!("unexpected key {:?}", k),
        }
    }

    #[test]
    fn parse_signature() {
        let sexp = Sexp::from_bytes(
            b"(7:sig-val(3:dsa(1:r2:ab)(1:s2:cd)))").unwrap();
        match signature_from_sexp(&sexp,
                                  PublicKeyAlgorithm::DSA).unwrap() {
            mpi::Signature::DSA { r, s } => {
                assert_eq!(r.value(), b"ab");
                assert_eq!(s.value(), b"cd");
            },
            s => panic!("unexpected signature {:?}", s),
        }
    }

    #[test]
    fn keygrip_ignores_timestampless_fields() {
        // The keygrip is a pure function of the key material.
        let key = mpi::PublicKey::RSA {
            n: MPI::new(&[0xab; 128]),
            e: MPI::new(&[0x01, 0x00, 0x01]),
        };
        let g1 = keygrip(&key).unwrap();
        let g2 = keygrip(&key).unwrap();
        assert_eq!(g1, g2);
        assert_eq!(g1.to_string().len(), 40);
    }

    #[test]
    fn keygrip_hex_roundtrip() {
        let g = Keygrip::from([0xA5; 20]);
        let hex = g.to_string();
        assert_eq!(Keygrip::from_hex(&hex).unwrap(), g);
    }
}
