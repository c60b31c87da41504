//! Classification of user-supplied key queries.
//!
//! Users identify keys by whatever they have at hand: an email
//! address, a name fragment, a short or long key ID, a fingerprint
//! pasted from a web page, or a keygrip from agent diagnostics.
//! This module turns such a string into a precise search
//! descriptor for the key store.  Whitespace and colons inside hex
//! tokens are ignored so copy-pasted fingerprints work.

use crate::Error;
use crate::Fingerprint;
use crate::KeyHandle;
use crate::KeyID;
use crate::Result;
use crate::crypto::sexp::Keygrip;
use crate::packet::Key;

/// A classified search query.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SearchDescriptor {
    /// Exact match on the user id (query started with `=`).
    ExactText(String),
    /// Match on the email address (query of the form `<...>`).
    Email(String),
    /// Substring match on the user id.
    Substring(String),
    /// The low four bytes of a key ID (8 hex digits).
    ShortKeyID([u8; 4]),
    /// A full key ID (16 hex digits).
    LongKeyID(KeyID),
    /// A version 3 fingerprint (32 hex digits).
    Fingerprint16([u8; 16]),
    /// A version 4 fingerprint (40 hex digits).
    Fingerprint20(Fingerprint),
    /// A keygrip (`&` followed by 40 hex digits).
    Keygrip(Keygrip),
}

impl SearchDescriptor {
    /// Returns the key handle this query names, for the lookup
    /// modes that name one.
    ///
    /// The short key ID and the v3 fingerprint are too imprecise to
    /// be handles; the text modes select by user id, not by key.
    pub fn key_handle(&self) -> Option<KeyHandle> {
        match self {
            SearchDescriptor::LongKeyID(id) => Some(id.clone().into()),
            SearchDescriptor::Fingerprint20(fpr) =>
                Some(fpr.clone().into()),
            _ => None,
        }
    }

    /// Returns whether the given key is a candidate for this query.
    ///
    /// This is the packet-level half of a key store search: the
    /// identifier modes are decided here, while the text modes
    /// always return false because they select by user id.  A match
    /// on a lossy identifier (short or long key ID) still has to be
    /// confirmed against the fingerprint before any security
    /// decision.
    pub fn matches_key(&self, key: &Key) -> bool {
        let key_handle: KeyHandle = key.fingerprint().into();
        match self {
            SearchDescriptor::ShortKeyID(short) =>
                key.keyid().as_bytes().ends_with(short),
            SearchDescriptor::LongKeyID(id) =>
                KeyHandle::from(id.clone()).aliases(&key_handle),
            SearchDescriptor::Fingerprint20(fpr) =>
                KeyHandle::from(fpr.clone()).aliases(&key_handle),
            // A v3 fingerprint can never name a v4 key.
            SearchDescriptor::Fingerprint16(_) => false,
            SearchDescriptor::Keygrip(grip) =>
                key.keygrip().map(|g| &g == grip).unwrap_or(false),
            SearchDescriptor::ExactText(_)
                | SearchDescriptor::Email(_)
                | SearchDescriptor::Substring(_) => false,
        }
    }
}

/// Classifies a user-supplied query.
///
/// The classifier is total and deterministic: any non-empty string
/// maps to exactly one descriptor.  Hex-shaped tokens become key
/// IDs or fingerprints; everything else falls back to a substring
/// match.
pub fn classify(query: &str) -> Result<SearchDescriptor> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidUserID("Empty query".into()).into());
    }

    match query.as_bytes()[0] {
        // Exact match.
        b'=' => {
            let text = &query[1..];
            if text.is_empty() {
                return Err(Error::InvalidUserID(
                    "Empty exact match".into()).into());
            }
            return Ok(SearchDescriptor::ExactText(text.into()));
        },

        // Email address, with or without the closing bracket.
        b'<' => {
            let addr = query[1..].trim_end_matches('>');
            if addr.is_empty() {
                return Err(Error::InvalidUserID(
                    "Empty email address".into()).into());
            }
            return Ok(SearchDescriptor::Email(addr.into()));
        },

        // Explicit substring match.
        b'*' => {
            let text = &query[1..];
            if text.is_empty() {
                return Err(Error::InvalidUserID(
                    "Empty substring match".into()).into());
            }
            return Ok(SearchDescriptor::Substring(text.into()));
        },

        // Keygrip.
        b'&' => {
            let grip = Keygrip::from_hex(&query[1..])
                .map_err(|_| Error::InvalidUserID(
                    format!("Bad keygrip: {:?}", query)))?;
            return Ok(SearchDescriptor::Keygrip(grip));
        },

        _ => (),
    }

    // Try the hexadecimal forms.  Whitespace and colons are
    // ignored; a 0x prefix is allowed.
    if let Some(bytes) = parse_hex_token(query) {
        match bytes.len() {
            4 => {
                let mut kid = [0u8; 4];
                kid.copy_from_slice(&bytes);
                return Ok(SearchDescriptor::ShortKeyID(kid));
            },
            8 => return Ok(SearchDescriptor::LongKeyID(
                KeyID::from_bytes(&bytes))),
            16 => {
                let mut fpr = [0u8; 16];
                fpr.copy_from_slice(&bytes);
                return Ok(SearchDescriptor::Fingerprint16(fpr));
            },
            20 => return Ok(SearchDescriptor::Fingerprint20(
                Fingerprint::from_bytes(&bytes))),
            _ => (),
        }
    }

    // An email-shaped token.
    if query.contains('<') && query.contains('>') {
        let start = query.find('<').expect("just checked");
        let end = query.rfind('>').expect("just checked");
        if start < end {
            let addr = &query[start + 1..end];
            if !addr.is_empty() {
                return Ok(SearchDescriptor::Email(addr.into()));
            }
        }
    }

    Ok(SearchDescriptor::Substring(query.into()))
}

/// Parses a hex token, ignoring whitespace and colons, accepting an
/// optional `0x` prefix.  Returns `None` if any other character
/// occurs.
fn parse_hex_token(s: &str) -> Option<Vec<u8>> {
    let cleaned: String =
        s.chars().filter(|&c| c != ':' && !c.is_whitespace()).collect();
    let cleaned = cleaned.strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);

    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return None;
    }
    crate::fmt::from_hex(cleaned, false).ok()
}
