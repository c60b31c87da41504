use crate::Error;
use crate::Fingerprint;
use crate::KeyID;
use crate::Result;

/// Either of the two identifiers a key is known by.
///
/// Lookups and signatures name keys at two precisions: the full
/// fingerprint, or the 64-bit key ID derived from it.  A `KeyHandle`
/// holds whichever one the caller has, and compares the two without
/// overstating what a key ID proves: a key ID is a fingerprint
/// fragment, so it can only ever say "possibly the same key".
#[derive(Debug, Clone, Hash)]
pub enum KeyHandle {
    /// A Fingerprint.
    Fingerprint(Fingerprint),
    /// A KeyID.
    KeyID(KeyID),
}

impl std::fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            KeyHandle::Fingerprint(fpr) => fpr.fmt(f),
            KeyHandle::KeyID(id) => id.fmt(f),
        }
    }
}

impl From<Fingerprint> for KeyHandle {
    fn from(fpr: Fingerprint) -> Self {
        KeyHandle::Fingerprint(fpr)
    }
}

impl From<KeyID> for KeyHandle {
    fn from(id: KeyID) -> Self {
        KeyHandle::KeyID(id)
    }
}

impl KeyHandle {
    /// Parses a key handle from its hexadecimal form, deciding the
    /// precision by length: 20 bytes make a fingerprint, 8 a key
    /// ID.  Whitespace, colons, and a leading `0x` are tolerated.
    pub fn from_hex(hex: &str) -> Result<KeyHandle> {
        let cleaned: String = hex.chars().filter(|&c| c != ':').collect();
        let bytes = crate::fmt::from_hex(&cleaned, true)?;
        match bytes.len() {
            20 => Ok(Fingerprint::from_bytes(&bytes).into()),
            8 => Ok(KeyID::from_bytes(&bytes).into()),
            n => Err(Error::InvalidArgument(
                format!("{} bytes name neither a fingerprint \
                         nor a key ID", n)).into()),
        }
    }

    /// Converts the key handle to a hexadecimal number.
    pub fn to_hex(&self) -> String {
        match self {
            KeyHandle::Fingerprint(fpr) => fpr.to_hex(),
            KeyHandle::KeyID(id) => id.to_hex(),
        }
    }

    /// Returns the key ID this handle resolves to: the identity for
    /// a key ID, the low 64 bits for a fingerprint.
    pub fn to_keyid(&self) -> KeyID {
        match self {
            KeyHandle::Fingerprint(fpr) => fpr.to_keyid(),
            KeyHandle::KeyID(id) => id.clone(),
        }
    }

    /// Returns whether this handle pins down the key exactly.
    ///
    /// Only a fingerprint does.  Security decisions taken on a
    /// non-precise handle must be confirmed against the
    /// fingerprint.
    pub fn is_precise(&self) -> bool {
        matches!(self, KeyHandle::Fingerprint(_))
    }

    /// Returns whether `self` and `other` could name the same key.
    ///
    /// Two handles of the same precision alias when they are equal.
    /// A fingerprint and a key ID alias when the key ID is the one
    /// derived from the fingerprint; since unrelated fingerprints
    /// can share a key ID, this is deliberately weaker than
    /// equality.  It is the right relation for candidate selection,
    /// e.g. matching a signature's issuer against a key.
    pub fn aliases(&self, other: &KeyHandle) -> bool {
        match (self, other) {
            (KeyHandle::Fingerprint(a), KeyHandle::Fingerprint(b)) =>
                a == b,
            (KeyHandle::KeyID(a), KeyHandle::KeyID(b)) => a == b,
            _ => self.to_keyid() == other.to_keyid(),
        }
    }
}

/// Equality requires both handles to have the same precision: a
/// fingerprint never equals a key ID, even its own.  That keeps the
/// relation transitive; use [`KeyHandle::aliases`] to ask the
/// weaker question.
impl PartialEq for KeyHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyHandle::Fingerprint(a), KeyHandle::Fingerprint(b)) =>
                a == b,
            (KeyHandle::KeyID(a), KeyHandle::KeyID(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyHandle {}

#[cfg(test)]
mod tests {
    use super::*;

    fn fpr(suffix: u8) -> Fingerprint {
        let mut raw = [0x11; 20];
        raw[19] = suffix;
        Fingerprint::V4(raw)
    }

    #[test]
    fn from_hex_decides_precision() {
        let h = KeyHandle::from_hex(
            "1111 1111 1111 1111 1111  1111 1111 1111 1111 1142").unwrap();
        assert!(h.is_precise());
        assert_eq!(h, KeyHandle::from(fpr(0x42)));

        let h = KeyHandle::from_hex("0x1111111111111142").unwrap();
        assert!(!h.is_precise());
        assert_eq!(h.to_keyid(), fpr(0x42).to_keyid());

        assert!(KeyHandle::from_hex("111111").is_err());
    }

    #[test]
    fn equality_is_per_precision() {
        let full: KeyHandle = fpr(1).into();
        let short: KeyHandle = fpr(1).to_keyid().into();

        // The fingerprint and its own key ID are not equal, but they
        // alias.
        assert!(full != short);
        assert!(full.aliases(&short));
        assert!(short.aliases(&full));

        assert!(full != fpr(2).into());
        assert!(!full.aliases(&fpr(2).into()));
    }

    #[test]
    fn aliasing_is_not_transitive() {
        // Two unrelated fingerprints that happen to share a key ID:
        // both alias the key ID, neither aliases the other.
        let a = Fingerprint::V4([0xaa; 20]);
        let mut raw = [0xbb; 20];
        raw[12..].copy_from_slice(&[0xaa; 8]);
        let b = Fingerprint::V4(raw);
        assert_eq!(a.to_keyid(), b.to_keyid());

        let a: KeyHandle = a.into();
        let b: KeyHandle = b.into();
        let id: KeyHandle = a.to_keyid().into();
        assert!(a.aliases(&id));
        assert!(b.aliases(&id));
        assert!(!a.aliases(&b));
    }
}
