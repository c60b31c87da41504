use crate::Error;
use crate::Fingerprint;
use crate::KeyID;
use crate::Result;

impl std::fmt::Display for KeyID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for KeyID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("KeyID")
            .field(&self.to_string())
            .finish()
    }
}

impl From<Fingerprint> for KeyID {
    fn from(fp: Fingerprint) -> Self {
        fp.to_keyid()
    }
}

impl From<u64> for KeyID {
    fn from(id: u64) -> Self {
        KeyID::V4(id.to_be_bytes())
    }
}

impl KeyID {
    /// Reads a binary key ID.
    pub fn from_bytes(raw: &[u8]) -> KeyID {
        if raw.len() == 8 {
            let mut keyid: [u8; 8] = Default::default();
            keyid.copy_from_slice(raw);
            KeyID::V4(keyid)
        } else {
            KeyID::Invalid(raw.to_vec().into_boxed_slice())
        }
    }

    /// Reads a hexadecimal key ID.
    ///
    /// Whitespace, colons, and a leading `0x` are ignored.
    pub fn from_hex(hex: &str) -> Result<KeyID> {
        let cleaned: String = hex.chars().filter(|&c| c != ':').collect();
        let bytes = crate::fmt::from_hex(&cleaned, true)?;
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("Empty key ID".into()).into());
        }
        Ok(KeyID::from_bytes(&bytes))
    }

    /// Returns a reference to the raw KeyID.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyID::V4(id) => id,
            KeyID::Invalid(id) => id,
        }
    }

    /// Returns the key ID as a 64-bit number, if it is a v4 key ID.
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            KeyID::V4(id) => Ok(u64::from_be_bytes(*id)),
            KeyID::Invalid(_) => Err(Error::InvalidArgument(
                "Invalid key ID".into()).into()),
        }
    }

    /// Converts the key ID to its hexadecimal representation.
    pub fn to_hex(&self) -> String {
        crate::fmt::to_hex(self.as_bytes(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_roundtrip() {
        let id = KeyID::from(0xAACB3243630052D9u64);
        assert_eq!(id.to_hex(), "AACB3243630052D9");
        assert_eq!(id.as_u64().unwrap(), 0xAACB3243630052D9);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(KeyID::from_hex("0xAACB3243630052D9").unwrap(),
                   KeyID::from(0xAACB3243630052D9u64));
        assert_eq!(KeyID::from_hex("AACB 3243 6300 52D9").unwrap(),
                   KeyID::from(0xAACB3243630052D9u64));
        assert!(KeyID::from_hex("cheese").is_err());

        // Four bytes are kept, but marked invalid.
        assert_match!(KeyID::Invalid(_)
                      = KeyID::from_hex("630052D9").unwrap());
    }
}
