use crate::Error;
use crate::Fingerprint;
use crate::KeyID;
use crate::Result;

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.to_string_pretty())
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("Fingerprint")
            .field(&self.to_string())
            .finish()
    }
}

impl Fingerprint {
    /// Reads a binary fingerprint.
    pub fn from_bytes(raw: &[u8]) -> Fingerprint {
        if raw.len() == 20 {
            let mut fp: [u8; 20] = Default::default();
            fp.copy_from_slice(raw);
            Fingerprint::V4(fp)
        } else {
            Fingerprint::Invalid(raw.to_vec().into_boxed_slice())
        }
    }

    /// Reads a hexadecimal fingerprint.
    ///
    /// Whitespace and colons are ignored so copy-pasted fingerprints
    /// work.
    pub fn from_hex(hex: &str) -> Result<Fingerprint> {
        let cleaned: String = hex.chars().filter(|&c| c != ':').collect();
        let bytes = crate::fmt::from_hex(&cleaned, true)?;
        if bytes.is_empty() {
            return Err(Error::InvalidArgument(
                "Empty fingerprint".into()).into());
        }
        Ok(Fingerprint::from_bytes(&bytes))
    }

    /// Returns a reference to the raw Fingerprint.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Fingerprint::V4(fp) => fp,
            Fingerprint::Invalid(fp) => fp,
        }
    }

    /// Converts the fingerprint to its hexadecimal representation.
    pub fn to_hex(&self) -> String {
        crate::fmt::to_hex(self.as_bytes(), false)
    }

    /// Converts the fingerprint to a key ID.
    pub fn to_keyid(&self) -> KeyID {
        match self {
            Fingerprint::V4(fp) => {
                let mut keyid: [u8; 8] = Default::default();
                keyid.copy_from_slice(&fp[12..]);
                KeyID::V4(keyid)
            },
            Fingerprint::Invalid(fp) =>
                KeyID::Invalid(fp.clone()),
        }
    }

    // Formats a v4 fingerprint in the conventional ten groups of
    // four digits, with extra space in the middle.
    fn to_string_pretty(&self) -> String {
        use std::fmt::Write;

        let raw = self.as_bytes();
        let mut output = String::with_capacity(raw.len() * 5 / 2 + 2);
        for (i, b) in raw.iter().enumerate() {
            if i > 0 && i % 2 == 0 {
                output.push(' ');
            }
            if raw.len() == 20 && i == 10 {
                output.push(' ');
            }
            write!(output, "{:02X}", b).unwrap();
        }
        output
    }
}
