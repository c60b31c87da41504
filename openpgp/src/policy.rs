//! Algorithm preferences and verification policy.
//!
//! A freshly generated key advertises the holder's algorithm
//! preferences in the hashed area of its self signatures.  The
//! defaults below are chosen from what the backend supports, in
//! descending order of preference, with 3DES kept as the universal
//! fallback every implementation can handle.

use crate::Error;
use crate::Result;
use crate::types::{
    CompressionAlgorithm,
    Duration,
    HashAlgorithm,
    SymmetricAlgorithm,
};

/// The maximum number of items in a preference list.
const MAX_PREFS: usize = 30;

/// Algorithm preferences and key-server flags carried in self
/// signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    symmetric: Vec<SymmetricAlgorithm>,
    hash: Vec<HashAlgorithm>,
    compression: Vec<CompressionAlgorithm>,
    /// Advertise support for the modification detection code.
    mdc: bool,
    /// Whether key servers may let third parties modify the key.
    /// `false` sets the no-modify flag.
    ks_modify: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        let mut symmetric: Vec<SymmetricAlgorithm> = [
            SymmetricAlgorithm::AES256,
            SymmetricAlgorithm::AES192,
            SymmetricAlgorithm::AES128,
        ].into_iter().filter(|a| a.is_supported()).collect();
        // 3DES is the universal fallback; it is always included.
        symmetric.push(SymmetricAlgorithm::TripleDES);

        let hash: Vec<HashAlgorithm> = [
            HashAlgorithm::SHA256,
            HashAlgorithm::SHA384,
            HashAlgorithm::SHA512,
            HashAlgorithm::SHA224,
            HashAlgorithm::SHA1,
        ].into_iter().filter(|a| a.is_supported()).collect();

        let mut compression: Vec<CompressionAlgorithm> = [
            CompressionAlgorithm::Zlib,
            CompressionAlgorithm::BZip2,
            CompressionAlgorithm::Zip,
        ].into_iter().filter(|a| a.is_supported()).collect();
        if compression.is_empty() {
            compression.push(CompressionAlgorithm::Uncompressed);
        }

        Preferences {
            symmetric,
            hash,
            compression,
            mdc: true,
            ks_modify: false,
        }
    }
}

impl Preferences {
    /// Returns preferences with empty algorithm lists.
    pub fn empty() -> Self {
        Preferences {
            symmetric: Vec::new(),
            hash: Vec::new(),
            compression: Vec::new(),
            mdc: true,
            ks_modify: false,
        }
    }

    /// Parses a preference string.
    ///
    /// Tokens are separated by spaces or commas and are either
    /// algorithm names (case-insensitive), `SNN`/`HNN`/`ZNN`
    /// numeric codes, or the keywords `mdc`, `no-mdc`, `ks-modify`,
    /// `no-ks-modify`.  The string `default` restores the default
    /// table, `none` yields empty lists.
    ///
    /// Duplicates are dropped; a human-readable warning is returned
    /// for each.
    pub fn parse(s: &str) -> Result<(Preferences, Vec<String>)> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("default") || s.is_empty() {
            return Ok((Preferences::default(), Vec::new()));
        }
        if s.eq_ignore_ascii_case("none") {
            return Ok((Preferences::empty(), Vec::new()));
        }

        let mut prefs = Preferences::empty();
        let mut warnings = Vec::new();

        for token in s.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            if token.eq_ignore_ascii_case("mdc") {
                prefs.mdc = true;
            } else if token.eq_ignore_ascii_case("no-mdc") {
                prefs.mdc = false;
            } else if token.eq_ignore_ascii_case("ks-modify") {
                prefs.ks_modify = true;
            } else if token.eq_ignore_ascii_case("no-ks-modify") {
                prefs.ks_modify = false;
            } else if let Some(algo) = parse_symmetric(token) {
                if prefs.symmetric.contains(&algo) {
                    warnings.push(format!(
                        "Duplicate preference '{}'", token));
                } else {
                    prefs.symmetric.push(algo);
                }
            } else if let Some(algo) = parse_hash(token) {
                if prefs.hash.contains(&algo) {
                    warnings.push(format!(
                        "Duplicate preference '{}'", token));
                } else {
                    prefs.hash.push(algo);
                }
            } else if let Some(algo) = parse_compression(token) {
                if prefs.compression.contains(&algo) {
                    warnings.push(format!(
                        "Duplicate preference '{}'", token));
                } else {
                    prefs.compression.push(algo);
                }
            } else {
                return Err(Error::InvalidArgument(
                    format!("Invalid item '{}' in preference string",
                            token)).into());
            }
        }

        if prefs.symmetric.len() > MAX_PREFS
            || prefs.hash.len() > MAX_PREFS
            || prefs.compression.len() > MAX_PREFS
        {
            return Err(Error::InvalidArgument(
                format!("More than {} preferences", MAX_PREFS)).into());
        }

        Ok((prefs, warnings))
    }

    /// Returns the symmetric algorithm preference list.
    pub fn symmetric(&self) -> &[SymmetricAlgorithm] {
        &self.symmetric
    }

    /// Returns the hash algorithm preference list.
    pub fn hash(&self) -> &[HashAlgorithm] {
        &self.hash
    }

    /// Returns the compression algorithm preference list.
    pub fn compression(&self) -> &[CompressionAlgorithm] {
        &self.compression
    }

    /// Returns whether the key advertises MDC support.
    pub fn mdc(&self) -> bool {
        self.mdc
    }

    /// Returns whether key servers may let third parties modify the
    /// key.
    pub fn ks_modify(&self) -> bool {
        self.ks_modify
    }
}

fn parse_symmetric(token: &str) -> Option<SymmetricAlgorithm> {
    if let Some(n) = numeric_code(token, 'S') {
        return Some(n.into());
    }
    let known = [
        SymmetricAlgorithm::IDEA,
        SymmetricAlgorithm::TripleDES,
        SymmetricAlgorithm::CAST5,
        SymmetricAlgorithm::Blowfish,
        SymmetricAlgorithm::AES128,
        SymmetricAlgorithm::AES192,
        SymmetricAlgorithm::AES256,
        SymmetricAlgorithm::Twofish,
        SymmetricAlgorithm::Camellia128,
        SymmetricAlgorithm::Camellia192,
        SymmetricAlgorithm::Camellia256,
    ];
    known.into_iter().find(|a| token.eq_ignore_ascii_case(&a.name())
                           || (token.eq_ignore_ascii_case("AES128")
                               && *a == SymmetricAlgorithm::AES128))
}

fn parse_hash(token: &str) -> Option<HashAlgorithm> {
    if let Some(n) = numeric_code(token, 'H') {
        return Some(n.into());
    }
    token.parse().ok()
}

fn parse_compression(token: &str) -> Option<CompressionAlgorithm> {
    if let Some(n) = numeric_code(token, 'Z') {
        return Some(n.into());
    }
    let known = [
        CompressionAlgorithm::Uncompressed,
        CompressionAlgorithm::Zip,
        CompressionAlgorithm::Zlib,
        CompressionAlgorithm::BZip2,
    ];
    known.into_iter().find(|a| token.eq_ignore_ascii_case(&a.name()))
}

fn numeric_code(token: &str, prefix: char) -> Option<u8> {
    let rest = token.strip_prefix(prefix)
        .or_else(|| token.strip_prefix(prefix.to_ascii_lowercase()))?;
    rest.parse().ok()
}

/// The verification policy.
///
/// These are the knobs the engine exposes: whether a signing subkey
/// must be cross-certified, whether a key from the future is fatal,
/// and how much clock skew to tolerate.
#[derive(Clone, Debug)]
pub struct StandardPolicy {
    /// Reject signing-capable subkeys without a valid back
    /// signature.
    require_cross_certification: bool,
    /// Downgrade a creation time in the future from an error to a
    /// warning.
    ignore_time_conflict: bool,
    /// Clock skew tolerated before a creation time counts as being
    /// in the future.
    time_tolerance: Duration,
}

impl Default for StandardPolicy {
    fn default() -> Self {
        StandardPolicy {
            require_cross_certification: true,
            ignore_time_conflict: false,
            time_tolerance: Duration::seconds(0),
        }
    }
}

impl StandardPolicy {
    /// Returns the default policy.
    pub fn new() -> Self {
        Default::default()
    }

    /// Controls whether a signing-capable subkey without a valid
    /// back signature is rejected.
    pub fn require_cross_certification(mut self, v: bool) -> Self {
        self.require_cross_certification = v;
        self
    }

    /// Controls whether a key claiming to be created in the future
    /// is fatal or merely a warning.
    pub fn ignore_time_conflict(mut self, v: bool) -> Self {
        self.ignore_time_conflict = v;
        self
    }

    /// Sets the tolerated clock skew.
    pub fn time_tolerance(mut self, d: Duration) -> Self {
        self.time_tolerance = d;
        self
    }

    pub(crate) fn requires_cross_certification(&self) -> bool {
        self.require_cross_certification
    }

    pub(crate) fn ignores_time_conflict(&self) -> bool {
        self.ignore_time_conflict
    }

    pub(crate) fn tolerance(&self) -> Duration {
        self.time_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preferences() {
        let p = Preferences::default();
        assert_eq!(p.symmetric().iter().map(|&a| u8::from(a))
                   .collect::<Vec<_>>(),
                   vec![9, 8, 7, 2]);
        assert_eq!(p.hash().iter().map(|&a| u8::from(a))
                   .collect::<Vec<_>>(),
                   vec![8, 9, 10, 11, 2]);
        assert_eq!(p.compression().iter().map(|&a| u8::from(a))
                   .collect::<Vec<_>>(),
                   vec![2, 3, 1]);
        assert!(p.mdc());
        assert!(!p.ks_modify());

        // 3DES is always included.
        assert!(p.symmetric().contains(&SymmetricAlgorithm::TripleDES));
        assert!(p.symmetric().len() <= 30);
        assert!(p.hash().len() <= 30);
        assert!(p.compression().len() <= 30);
    }

    #[test]
    fn parse_names_and_codes() {
        let (p, w) = Preferences::parse("AES256 S2 SHA512 H8 ZLIB z1")
            .unwrap();
        assert!(w.is_empty());
        assert_eq!(p.symmetric(),
                   &[SymmetricAlgorithm::AES256,
                     SymmetricAlgorithm::TripleDES]);
        assert_eq!(p.hash(),
                   &[HashAlgorithm::SHA512, HashAlgorithm::SHA256]);
        assert_eq!(p.compression(),
                   &[CompressionAlgorithm::Zlib, CompressionAlgorithm::Zip]);
    }

    #[test]
    fn parse_flags() {
        let (p, _) = Preferences::parse("AES256 no-mdc no-ks-modify")
            .unwrap();
        assert!(!p.mdc());
        assert!(!p.ks_modify());

        let (p, _) = Preferences::parse("mdc ks-modify").unwrap();
        assert!(p.mdc());
        assert!(p.ks_modify());
    }

    #[test]
    fn parse_special_strings() {
        let (p, _) = Preferences::parse("default").unwrap();
        assert_eq!(p, Preferences::default());

        let (p, _) = Preferences::parse("none").unwrap();
        assert!(p.symmetric().is_empty());
        assert!(p.hash().is_empty());
        assert!(p.compression().is_empty());
    }

    #[test]
    fn duplicates_warn_and_drop() {
        let (p, w) = Preferences::parse("AES256 AES256 S9").unwrap();
        assert_eq!(p.symmetric(), &[SymmetricAlgorithm::AES256]);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn junk_is_rejected() {
        assert!(Preferences::parse("AES256 chacha20").is_err());
    }
}
