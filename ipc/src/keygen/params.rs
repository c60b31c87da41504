//! The key generation parameter file.
//!
//! A line-oriented, UTF-8 format.  Blank lines and `#` comments are
//! ignored; `%` lines are directives; everything else is
//! `Keyword: value`.  A block starts at `Key-Type` and ends at the
//! next `Key-Type`, a `%commit`, or the end of the file.

use std::collections::HashMap;
use std::path::PathBuf;

use madrone_openpgp::crypto::mem::Password;
use madrone_openpgp::packet::UserID;
use madrone_openpgp::policy::Preferences;
use madrone_openpgp::types::{Curve, KeyFlags, Timestamp};

use crate::keygen::{
    parse_creation_date,
    parse_expiration,
    parse_revoker,
    KeyParameters,
    KeySpec,
};
use crate::Error;
use crate::Result;

/// Directive state accumulated while reading the file.
#[derive(Default)]
struct Directives {
    dry_run: bool,
    no_protection: bool,
    transient: bool,
    pubring: Option<PathBuf>,
}

/// One block being collected.
struct Block {
    first_line: usize,
    values: HashMap<&'static str, (usize, String)>,
    revokers: Vec<String>,
}

const KEYWORDS: &[&str] = &[
    "Key-Type", "Key-Length", "Key-Curve", "Key-Usage",
    "Subkey-Type", "Subkey-Length", "Subkey-Curve", "Subkey-Usage",
    "Name-Real", "Name-Email", "Name-Comment",
    "Expire-Date", "Creation-Date", "Passphrase", "Preferences",
    "Revoker", "Handle", "Keyserver",
];

impl Block {
    fn new(first_line: usize) -> Self {
        Block {
            first_line,
            values: HashMap::new(),
            revokers: Vec::new(),
        }
    }

    fn set(&mut self, lineno: usize, keyword: &str, value: &str)
           -> Result<()>
    {
        if keyword.eq_ignore_ascii_case("Revoker") {
            self.revokers.push(value.to_string());
            return Ok(());
        }

        let canonical = KEYWORDS.iter()
            .find(|k| k.eq_ignore_ascii_case(keyword))
            .ok_or_else(|| Error::InvalidParameter(
                format!("line {}: unknown keyword {:?}",
                        lineno, keyword)))?;

        if let Some((prev, _)) =
            self.values.insert(canonical, (lineno, value.to_string()))
        {
            return Err(Error::InvalidParameter(
                format!("line {}: duplicate keyword {:?} \
                         (first on line {})", lineno, keyword, prev))
                       .into());
        }
        Ok(())
    }

    fn get(&self, keyword: &str) -> Option<&str> {
        self.values.get(keyword).map(|(_, v)| v.as_str())
    }

    fn finish(self, directives: &Directives) -> Result<KeyParameters> {
        let line = self.first_line;
        let bad = |what: String| -> anyhow::Error {
            Error::InvalidParameter(
                format!("block at line {}: {}", line, what)).into()
        };

        let key = resolve_spec(
            self.get("Key-Type").expect("block starts at Key-Type"),
            self.get("Key-Length"),
            self.get("Key-Curve"))?;
        let usage = self.get("Key-Usage")
            .map(|v| parse_usage(v, &key))
            .transpose()?;

        let subkey = self.get("Subkey-Type")
            .map(|t| resolve_spec(t,
                                  self.get("Subkey-Length"),
                                  self.get("Subkey-Curve")))
            .transpose()?;
        let subkey_usage = match (&subkey, self.get("Subkey-Usage")) {
            (Some(spec), Some(v)) => Some(parse_usage(v, spec)?),
            (None, Some(_)) =>
                return Err(bad("Subkey-Usage without Subkey-Type".into())),
            _ => None,
        };

        let name = self.get("Name-Real");
        let comment = self.get("Name-Comment");
        let email = self.get("Name-Email");
        let userid = match (name, comment, email) {
            (None, None, None) =>
                return Err(bad("no user id given".into())),
            (name, comment, Some(email)) =>
                UserID::from_address(name.map(|s| s.to_string()),
                                     comment.map(|s| s.to_string()),
                                     email)?,
            (Some(name), comment, None) => {
                let mut value = name.to_string();
                if let Some(comment) = comment {
                    value.push_str(&format!(" ({})", comment));
                }
                UserID::from(value)
            },
            (None, Some(_), None) =>
                return Err(bad("a comment alone is not a user id".into())),
        };

        let expiration = self.get("Expire-Date")
            .map(|v| parse_expiration(Timestamp::now(), v))
            .transpose()?
            .flatten();
        let creation_time = self.get("Creation-Date")
            .map(parse_creation_date)
            .transpose()?;

        let preferences = match self.get("Preferences") {
            Some(v) => Preferences::parse(v)?.0,
            None => Preferences::default(),
        };

        let mut revokers = Vec::new();
        for r in &self.revokers {
            revokers.push(parse_revoker(r)?);
        }

        let mut p = KeyParameters::new(key);
        p.usage = usage;
        p.subkey = subkey;
        p.subkey_usage = subkey_usage;
        p.userid = Some(userid);
        p.expiration = expiration;
        p.creation_time = creation_time;
        p.passphrase = self.get("Passphrase")
            .map(|v| Password::from(v.to_string()));
        p.no_protection = directives.no_protection;
        p.transient = directives.transient;
        p.preferences = preferences;
        p.revokers = revokers;
        p.handle = self.get("Handle").map(|s| s.to_string());
        p.keyserver = self.get("Keyserver").map(|s| s.to_string());
        p.pubring = directives.pubring.clone();
        p.dry_run = directives.dry_run;
        Ok(p)
    }
}

fn resolve_spec(typ: &str, length: Option<&str>, curve: Option<&str>)
                -> Result<KeySpec>
{
    let bits = match length {
        Some(l) => l.trim().parse::<u16>().map_err(|_| {
            Error::InvalidParameter(format!("Bad key length {:?}", l))
        })?,
        None => 0,
    };
    let curve = curve
        .map(|c| Curve::from_name(c))
        .transpose()?;

    let typ = typ.trim();
    let numeric = typ.parse::<u8>().ok();

    let spec = if typ.eq_ignore_ascii_case("RSA")
        || typ.eq_ignore_ascii_case("default")
        || numeric == Some(1)
    {
        KeySpec::Rsa { bits }
    } else if typ.eq_ignore_ascii_case("DSA") || numeric == Some(17) {
        KeySpec::Dsa { bits }
    } else if typ.eq_ignore_ascii_case("ELG")
        || typ.eq_ignore_ascii_case("ELG-E")
        || numeric == Some(16) || numeric == Some(20)
    {
        KeySpec::Elgamal { bits }
    } else if typ.eq_ignore_ascii_case("ECDSA") || numeric == Some(19) {
        KeySpec::Ecdsa {
            curve: curve.unwrap_or(Curve::NistP256),
        }
    } else if typ.eq_ignore_ascii_case("EDDSA") || numeric == Some(22) {
        KeySpec::Eddsa {
            curve: curve.unwrap_or(Curve::Ed25519),
        }
    } else if typ.eq_ignore_ascii_case("ECDH") || numeric == Some(18) {
        KeySpec::Ecdh {
            curve: curve.unwrap_or(Curve::Cv25519),
        }
    } else {
        return Err(Error::InvalidParameter(
            format!("Unknown key type {:?}", typ)).into());
    };

    Ok(spec)
}

fn parse_usage(value: &str, spec: &KeySpec) -> Result<KeyFlags> {
    let mut flags = KeyFlags::empty();
    for token in value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        if token.eq_ignore_ascii_case("sign") {
            flags = flags.set_signing(true);
        } else if token.eq_ignore_ascii_case("encrypt") {
            flags = flags
                .set_transport_encryption(true)
                .set_storage_encryption(true);
        } else if token.eq_ignore_ascii_case("auth") {
            flags = flags.set_authentication(true);
        } else if token.eq_ignore_ascii_case("cert") {
            flags = flags.set_certification(true);
        } else {
            return Err(Error::InvalidParameter(
                format!("Unknown usage {:?}", token)).into());
        }
    }

    let algo = spec.algo();
    if flags.for_signing() && !algo.for_signing() {
        return Err(Error::InvalidParameter(
            format!("Usage 'sign' is not possible with {}", algo)).into());
    }
    if (flags.for_transport_encryption() || flags.for_storage_encryption())
        && !algo.for_encryption()
    {
        return Err(Error::InvalidParameter(
            format!("Usage 'encrypt' is not possible with {}", algo))
                   .into());
    }

    Ok(flags)
}

/// Parses a parameter file.
///
/// `%echo` text is passed to `echo`.  Returns one `KeyParameters`
/// per committed block.
pub fn parse_parameter_file<F>(input: &str, mut echo: F)
                               -> Result<Vec<KeyParameters>>
    where F: FnMut(&str),
{
    let mut out = Vec::new();
    let mut directives = Directives::default();
    let mut block: Option<Block> = None;

    for (lineno, raw) in input.lines().enumerate() {
        let lineno = lineno + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(directive) = line.strip_prefix('%') {
            let (name, arg) = match directive.find(char::is_whitespace) {
                Some(pos) => (&directive[..pos],
                              directive[pos + 1..].trim()),
                None => (directive, ""),
            };

            if name.eq_ignore_ascii_case("echo") {
                echo(arg);
            } else if name.eq_ignore_ascii_case("dry-run") {
                directives.dry_run = true;
            } else if name.eq_ignore_ascii_case("no-protection") {
                directives.no_protection = true;
            } else if name.eq_ignore_ascii_case("transient-key") {
                directives.transient = true;
            } else if name.eq_ignore_ascii_case("pubring") {
                directives.pubring = Some(PathBuf::from(arg));
            } else if name.eq_ignore_ascii_case("commit") {
                if let Some(b) = block.take() {
                    out.push(b.finish(&directives)?);
                }
            } else {
                return Err(Error::InvalidParameter(
                    format!("line {}: unknown directive %{}",
                            lineno, name)).into());
            }
            continue;
        }

        let (keyword, value) = line.split_once(':').ok_or_else(|| {
            Error::InvalidParameter(
                format!("line {}: expected 'Keyword: value'", lineno))
        })?;
        let keyword = keyword.trim();
        let value = value.trim();

        if keyword.eq_ignore_ascii_case("Key-Type") {
            // A new block; commit the previous one.
            if let Some(b) = block.take() {
                out.push(b.finish(&directives)?);
            }
            let mut b = Block::new(lineno);
            b.set(lineno, "Key-Type", value)?;
            block = Some(b);
        } else {
            match block.as_mut() {
                Some(b) => b.set(lineno, keyword, value)?,
                None => return Err(Error::InvalidParameter(
                    format!("line {}: parameter block does not start \
                             with \"Key-Type\"", lineno)).into()),
            }
        }
    }

    if let Some(b) = block.take() {
        out.push(b.finish(&directives)?);
    }

    Ok(out)
}
