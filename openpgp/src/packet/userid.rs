//! User ID packets.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::Error;
use crate::Result;

/// Holds a UserID packet.
///
/// The body is an arbitrary length-prefixed UTF-8 byte string.  By
/// convention it has the shape `Name (Comment) <email>`, and this
/// type lazily splits the convention into its parts, but nothing is
/// enforced on parse: foreign user ids round-trip verbatim.
///
/// See [Section 5.11 of RFC 4880].
///
///   [Section 5.11 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.11
#[derive(Clone)]
pub struct UserID {
    /// The user id.
    value: Vec<u8>,

    /// Lazily parsed convention parts: (name, comment, email).
    parsed: OnceCell<(Option<String>, Option<String>, Option<String>)>,

    /// RIPEMD-160 of the value, used to correlate the user id with
    /// external trust records.
    namehash: OnceCell<[u8; 20]>,
}

impl PartialEq for UserID {
    fn eq(&self, other: &UserID) -> bool {
        self.value == other.value
    }
}

impl Eq for UserID {}

impl PartialOrd for UserID {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserID {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl std::hash::Hash for UserID {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for UserID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UserID({:?})", String::from_utf8_lossy(&self.value))
    }
}

impl fmt::Display for UserID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.value))
    }
}

impl From<Vec<u8>> for UserID {
    fn from(u: Vec<u8>) -> Self {
        UserID {
            value: u,
            parsed: OnceCell::new(),
            namehash: OnceCell::new(),
        }
    }
}

impl From<&[u8]> for UserID {
    fn from(u: &[u8]) -> Self {
        u.to_vec().into()
    }
}

impl<'a> From<&'a str> for UserID {
    fn from(u: &'a str) -> Self {
        u.as_bytes().to_vec().into()
    }
}

impl From<String> for UserID {
    fn from(u: String) -> Self {
        u.into_bytes().into()
    }
}

impl UserID {
    /// Constructs a user id from a name, comment, and email address.
    pub fn from_address<N, C, E>(name: N, comment: C, email: E)
                                 -> Result<UserID>
        where N: Into<Option<String>>,
              C: Into<Option<String>>,
              E: AsRef<str>,
    {
        let name = name.into();
        let comment = comment.into();
        let email = email.as_ref();

        for part in name.iter().chain(comment.iter()) {
            if part.contains(['(', ')', '<', '>']) {
                return Err(Error::InvalidUserID(
                    format!("Bracket in name or comment: {:?}", part)).into());
            }
        }
        if !email.contains('@') || email.contains(['<', '>', ' ']) {
            return Err(Error::InvalidUserID(
                format!("Not a mailbox: {:?}", email)).into());
        }

        let mut value = String::new();
        if let Some(ref name) = name {
            value.push_str(name);
        }
        if let Some(ref comment) = comment {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push('(');
            value.push_str(comment);
            value.push(')');
        }
        if !value.is_empty() {
            value.push(' ');
        }
        value.push('<');
        value.push_str(email);
        value.push('>');

        Ok(value.into())
    }

    /// Gets the user ID packet's value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    fn do_parse(&self)
                -> &(Option<String>, Option<String>, Option<String>)
    {
        self.parsed.get_or_init(|| {
            let text = match std::str::from_utf8(&self.value) {
                Ok(t) => t.trim(),
                Err(_) => return (None, None, None),
            };

            // `Name (Comment) <email>`, every part optional.  A bare
            // mailbox is an email address, anything else without
            // brackets is a name.
            let (rest, email) = match (text.rfind('<'), text.rfind('>')) {
                (Some(lt), Some(gt)) if lt < gt => {
                    let email = text[lt + 1..gt].trim();
                    (text[..lt].trim(), Some(email.to_string()))
                },
                _ if text.contains('@') && !text.contains(' ') =>
                    ("", Some(text.to_string())),
                _ => (text, None),
            };

            let (rest, comment) = match (rest.find('('), rest.rfind(')')) {
                (Some(open), Some(close)) if open < close => {
                    let comment = rest[open + 1..close].trim();
                    (rest[..open].trim(), Some(comment.to_string()))
                },
                _ => (rest, None),
            };

            let name = if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            };

            (name, comment, email)
        })
    }

    /// Returns the name part of the conventional user id form, if
    /// any.
    pub fn name(&self) -> Option<&str> {
        self.do_parse().0.as_deref()
    }

    /// Returns the comment part of the conventional user id form, if
    /// any.
    pub fn comment(&self) -> Option<&str> {
        self.do_parse().1.as_deref()
    }

    /// Returns the email address of the conventional user id form,
    /// if any.
    pub fn email(&self) -> Option<&str> {
        self.do_parse().2.as_deref()
    }

    /// Returns the RIPEMD-160 hash of the user id's value.
    ///
    /// External trust records refer to user ids by this hash.
    pub fn namehash(&self) -> &[u8; 20] {
        self.namehash.get_or_init(|| {
            use digest::Digest;
            let mut h = ripemd::Ripemd160::new();
            h.update(&self.value);
            h.finalize().into()
        })
    }
}
