//! Key generation orchestration.
//!
//! Generation never touches private key material: the agent
//! produces the key and hands back the public half, and everything
//! after that is signature plumbing.  For each key this module
//! validates the parameters, asks the agent for the key material,
//! derives the identifiers, issues the self signatures through the
//! agent, and assembles the final key block.
//!
//! Parameters come from one of three sources: the caller directly
//! ("quick" mode), or a line-oriented parameter file whose grammar
//! is implemented here.  The interactive prompt sequence is a
//! front-end concern and reduces to the same structure.

use std::io::{Read, Write};
use std::path::PathBuf;

use madrone_openpgp::cert::{Cert, CertBuilder};
use madrone_openpgp::crypto::mem::Password;
use madrone_openpgp::crypto::sexp::Sexp;
use madrone_openpgp::packet::signature::SignatureBuilder;
use madrone_openpgp::packet::{Key, UserID};
use madrone_openpgp::policy::{Preferences, StandardPolicy};
use madrone_openpgp::types::{
    Curve,
    Duration,
    KeyFlags,
    PublicKeyAlgorithm,
    RevocationKey,
    SignatureType,
    Timestamp,
};
use madrone_openpgp::{Fingerprint, KeyID};

use crate::agent::{KeyPair, PinentryMode, SharedAgent};
use crate::status::{KeyCreatedKind, Status, StatusWriter};
use crate::Error;
use crate::Result;

mod params;
pub use params::parse_parameter_file;

const TRACE: bool = false;

/// An algorithm selection for one key to be generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySpec {
    /// RSA with the given modulus size.
    Rsa {
        /// Modulus size in bits; 0 selects the default.
        bits: u16,
    },
    /// DSA with the given prime size.
    Dsa {
        /// Prime size in bits; 0 selects the default.
        bits: u16,
    },
    /// Encryption-only Elgamal with the given prime size.
    Elgamal {
        /// Prime size in bits; 0 selects the default.
        bits: u16,
    },
    /// ECDSA over the given curve.
    Ecdsa {
        /// The curve.
        curve: Curve,
    },
    /// EdDSA over the given curve.
    Eddsa {
        /// The curve.
        curve: Curve,
    },
    /// ECDH over the given curve.
    Ecdh {
        /// The curve.
        curve: Curve,
    },
}

impl KeySpec {
    /// Returns the default key: RSA with 2048 bits.
    pub fn default_primary() -> KeySpec {
        KeySpec::Rsa { bits: 0 }
    }

    /// Returns the OpenPGP algorithm this spec generates.
    pub fn algo(&self) -> PublicKeyAlgorithm {
        match self {
            KeySpec::Rsa { .. } => PublicKeyAlgorithm::RSAEncryptSign,
            KeySpec::Dsa { .. } => PublicKeyAlgorithm::DSA,
            KeySpec::Elgamal { .. } => PublicKeyAlgorithm::ElGamalEncrypt,
            KeySpec::Ecdsa { .. } => PublicKeyAlgorithm::ECDSA,
            KeySpec::Eddsa { .. } => PublicKeyAlgorithm::EdDSA,
            KeySpec::Ecdh { .. } => PublicKeyAlgorithm::ECDH,
        }
    }

    /// Returns the default capabilities for a primary key of this
    /// algorithm.
    pub fn default_primary_usage(&self) -> KeyFlags {
        let f = KeyFlags::empty().set_certification(true);
        if self.algo().for_signing() {
            f.set_signing(true)
        } else {
            f
        }
    }

    /// Returns the default capabilities for a subkey of this
    /// algorithm: encryption if it can encrypt, signing otherwise.
    pub fn default_subkey_usage(&self) -> KeyFlags {
        if self.algo().for_encryption() {
            KeyFlags::empty()
                .set_transport_encryption(true)
                .set_storage_encryption(true)
        } else {
            KeyFlags::empty().set_signing(true)
        }
    }

    /// Validates and adjusts the selection.
    ///
    /// Sizes are defaulted, clamped to the permitted range, and
    /// rounded; curves are checked against the supported set.  Each
    /// adjustment produces a warning string.
    pub fn validated(self, expert: bool, large_rsa: bool)
                     -> Result<(KeySpec, Vec<String>)>
    {
        let mut warnings = Vec::new();

        let spec = match self {
            KeySpec::Rsa { bits } => {
                let max = if large_rsa { 8192 } else { 4096 };
                let bits = adjust_size(bits, 1024, 2048, max, 32,
                                       "RSA", &mut warnings);
                KeySpec::Rsa { bits }
            },
            KeySpec::Dsa { bits } => {
                let bits = if expert {
                    adjust_size(bits, 768, 2048, 3072, 64,
                                "DSA", &mut warnings)
                } else {
                    // Without expert mode, DSA sizes snap to whole
                    // kibibits.
                    let bits = adjust_size(bits, 768, 2048, 3072, 64,
                                           "DSA", &mut warnings);
                    if bits > 1024 && bits % 1024 != 0 {
                        let rounded = std::cmp::min(
                            (bits / 1024 + 1) * 1024, 3072);
                        warnings.push(format!(
                            "rounded DSA keysize up to {} bits", rounded));
                        rounded
                    } else {
                        bits
                    }
                };
                KeySpec::Dsa { bits }
            },
            KeySpec::Elgamal { bits } => {
                let bits = adjust_size(bits, 1024, 2048, 4096, 32,
                                       "Elgamal", &mut warnings);
                KeySpec::Elgamal { bits }
            },
            KeySpec::Ecdsa { curve } => {
                check_curve(&curve, false)?;
                KeySpec::Ecdsa { curve }
            },
            KeySpec::Eddsa { curve } => {
                if !matches!(curve, Curve::Ed25519 | Curve::Ed448) {
                    return Err(Error::InvalidParameter(
                        format!("EdDSA is not defined over {}", curve))
                               .into());
                }
                KeySpec::Eddsa { curve }
            },
            KeySpec::Ecdh { curve } => {
                check_curve(&curve, true)?;
                KeySpec::Ecdh { curve }
            },
        };

        Ok((spec, warnings))
    }

    /// Returns the DSA subgroup size for the given prime size.
    pub fn dsa_qbits(pbits: u16) -> u16 {
        if pbits <= 1024 {
            160
        } else if pbits <= 2047 {
            224
        } else {
            256
        }
    }

    /// Builds the parameter S-expression served to the agent's
    /// KEYPARAM inquiry.
    pub fn genkey_sexp(&self) -> Sexp {
        fn param(name: &str, value: String) -> Sexp {
            Sexp::List(vec![Sexp::sym(name), Sexp::bytes(value)])
        }
        fn flags(values: &[&str]) -> Sexp {
            let mut l = vec![Sexp::sym("flags")];
            l.extend(values.iter().map(|v| Sexp::sym(v)));
            Sexp::List(l)
        }

        let key = match self {
            KeySpec::Rsa { bits } => Sexp::List(vec![
                Sexp::sym("rsa"),
                param("nbits", bits.to_string()),
            ]),
            KeySpec::Dsa { bits } => Sexp::List(vec![
                Sexp::sym("dsa"),
                param("nbits", bits.to_string()),
                param("qbits", Self::dsa_qbits(*bits).to_string()),
            ]),
            KeySpec::Elgamal { bits } => Sexp::List(vec![
                Sexp::sym("elg"),
                param("nbits", bits.to_string()),
            ]),
            KeySpec::Ecdsa { curve } => Sexp::List(vec![
                Sexp::sym("ecc"),
                param("curve", curve.name().unwrap_or("?").into()),
                flags(&["nocomp"]),
            ]),
            KeySpec::Eddsa { curve } => Sexp::List(vec![
                Sexp::sym("ecc"),
                param("curve", curve.name().unwrap_or("?").into()),
                flags(&["eddsa"]),
            ]),
            KeySpec::Ecdh { curve } => Sexp::List(vec![
                Sexp::sym("ecc"),
                param("curve", curve.name().unwrap_or("?").into()),
                if *curve == Curve::Cv25519 {
                    flags(&["djb-tweak", "comp"])
                } else {
                    flags(&["nocomp"])
                },
            ]),
        };

        Sexp::List(vec![Sexp::sym("genkey"), key])
    }
}

fn adjust_size(bits: u16, min: u16, default: u16, max: u16, step: u16,
               what: &str, warnings: &mut Vec<String>)
               -> u16
{
    let mut bits = if bits == 0 { default } else { bits };

    if bits < min {
        warnings.push(format!(
            "{} keysize {} too small; using {} bits", what, bits, min));
        bits = min;
    } else if bits > max {
        warnings.push(format!(
            "{} keysize {} too large; using {} bits", what, bits, max));
        bits = max;
    }

    if bits % step != 0 {
        let rounded = std::cmp::min(bits + (step - bits % step), max);
        warnings.push(format!(
            "rounded {} keysize up to {} bits", what, rounded));
        bits = rounded;
    }

    bits
}

fn check_curve(curve: &Curve, for_ecdh: bool) -> Result<()> {
    use Curve::*;
    let ok = match curve {
        NistP256 | NistP384 | NistP521 => true,
        BrainpoolP256 | BrainpoolP384 | BrainpoolP512 => true,
        Secp256k1 => true,
        Cv25519 => for_ecdh,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidParameter(
            format!("Curve {} is not usable here", curve)).into())
    }
}

/// Parses an expiration value.
///
/// The accepted forms are `0` (never), `N` (days), `N[dwmy]` (days,
/// weeks, 30-day months, 365-day years), an ISO date or datetime,
/// and `seconds=N`.
pub fn parse_expiration(now: Timestamp, s: &str)
                        -> Result<Option<Duration>>
{
    let s = s.trim();
    if s.is_empty() || s == "0" || s.eq_ignore_ascii_case("none")
        || s.eq_ignore_ascii_case("never")
    {
        return Ok(None);
    }

    if let Some(seconds) = s.strip_prefix("seconds=") {
        let n: u32 = seconds.parse().map_err(|_| {
            Error::InvalidParameter(format!("Bad expiration {:?}", s))
        })?;
        return Ok(Some(Duration::seconds(n)));
    }

    // An ISO date is distinguished by its shape.
    if s.len() >= 8 && s.as_bytes()[0].is_ascii_digit()
        && (s.contains('-') || s.len() == 8 || s.contains('T'))
        && s.chars().all(|c| c.is_ascii_digit()
                         || c == '-' || c == 'T' || c == 'Z')
    {
        let then = parse_iso_time(s)?;
        return match then.duration_since(now) {
            Some(d) => Ok(Some(d)),
            None => Err(Error::InvalidParameter(
                format!("Expiration {:?} lies in the past", s)).into()),
        };
    }

    let (num, unit) = match s.chars().last() {
        Some(u) if u.is_ascii_alphabetic() =>
            (&s[..s.len() - 1], u.to_ascii_lowercase()),
        _ => (s, 'd'),
    };
    let n: u32 = num.trim().parse().map_err(|_| {
        Error::InvalidParameter(format!("Bad expiration {:?}", s))
    })?;
    if n == 0 {
        return Ok(None);
    }

    let d = match unit {
        'd' => Duration::days(n)?,
        'w' => Duration::weeks(n)?,
        'm' => Duration::months(n)?,
        'y' => Duration::years(n)?,
        u => return Err(Error::InvalidParameter(
            format!("Unknown duration unit {:?}", u)).into()),
    };
    Ok(Some(d))
}

/// Parses a creation date override: `seconds=N`, `YYYYMMDD`,
/// `YYYY-MM-DD`, or `YYYYMMDDThhmmss`.
pub fn parse_creation_date(s: &str) -> Result<Timestamp> {
    let s = s.trim();
    if let Some(seconds) = s.strip_prefix("seconds=") {
        let n: u32 = seconds.parse().map_err(|_| {
            Error::InvalidParameter(format!("Bad creation date {:?}", s))
        })?;
        return Ok(Timestamp::from(n));
    }
    parse_iso_time(s)
}

fn parse_iso_time(s: &str) -> Result<Timestamp> {
    let bad = || Error::InvalidParameter(format!("Bad timestamp {:?}", s));

    let compact: String =
        s.chars().filter(|&c| c != '-' && c != 'Z').collect();
    let (date, time) = match compact.find('T') {
        Some(pos) => (&compact[..pos], Some(&compact[pos + 1..])),
        None => (&compact[..], None),
    };

    if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad().into());
    }
    let year: i64 = date[..4].parse().map_err(|_| bad())?;
    let month: i64 = date[4..6].parse().map_err(|_| bad())?;
    let day: i64 = date[6..8].parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(bad().into());
    }

    let seconds_of_day = match time {
        None => 0,
        Some(t) if t.len() == 6
            && t.chars().all(|c| c.is_ascii_digit()) =>
        {
            let h: i64 = t[..2].parse().map_err(|_| bad())?;
            let m: i64 = t[2..4].parse().map_err(|_| bad())?;
            let sec: i64 = t[4..6].parse().map_err(|_| bad())?;
            if h > 23 || m > 59 || sec > 60 {
                return Err(bad().into());
            }
            h * 3600 + m * 60 + sec
        },
        Some(_) => return Err(bad().into()),
    };

    // Days since the epoch, using the usual proleptic Gregorian
    // day-count arithmetic.
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146097 + doe - 719468;

    let secs = days * 86400 + seconds_of_day;
    if !(0..=u32::MAX as i64).contains(&secs) {
        return Err(bad().into());
    }
    Ok(Timestamp::from(secs as u32))
}

/// Everything needed to generate one key block.
#[derive(Debug)]
pub struct KeyParameters {
    /// The primary key's algorithm.
    pub key: KeySpec,
    /// The primary key's capabilities; defaulted by algorithm.
    pub usage: Option<KeyFlags>,
    /// The subkey to generate alongside, if any.
    pub subkey: Option<KeySpec>,
    /// The subkey's capabilities; defaulted by algorithm.
    pub subkey_usage: Option<KeyFlags>,
    /// The user id to bind.
    pub userid: Option<UserID>,
    /// Validity period of the generated keys.
    pub expiration: Option<Duration>,
    /// Creation time override for reproducible keys.
    pub creation_time: Option<Timestamp>,
    /// The passphrase protecting the key, served over the loopback.
    pub passphrase: Option<Password>,
    /// Store the key unprotected.
    pub no_protection: bool,
    /// Mark the key as transient; implies no protection.
    pub transient: bool,
    /// Preferences advertised in the self signatures.
    pub preferences: Preferences,
    /// Designated revokers.
    pub revokers: Vec<RevocationKey>,
    /// Opaque handle echoed in status lines.
    pub handle: Option<String>,
    /// The preferred key server URI.
    pub keyserver: Option<String>,
    /// The key ring the caller wants the result stored in.
    pub pubring: Option<PathBuf>,
    /// Go through the motions without generating anything.
    pub dry_run: bool,
    /// Enable expert-mode size rounding.
    pub expert: bool,
    /// Permit RSA moduli beyond 4096 bits.
    pub large_rsa: bool,
}

impl KeyParameters {
    /// Returns parameters for the given primary key algorithm, with
    /// everything else defaulted.
    pub fn new(key: KeySpec) -> Self {
        KeyParameters {
            key,
            usage: None,
            subkey: None,
            subkey_usage: None,
            userid: None,
            expiration: None,
            creation_time: None,
            passphrase: None,
            no_protection: false,
            transient: false,
            preferences: Preferences::default(),
            revokers: Vec::new(),
            handle: None,
            keyserver: None,
            pubring: None,
            dry_run: false,
            expert: false,
            large_rsa: false,
        }
    }

    /// Returns the parameters "quick" generation uses: the default
    /// algorithm with an encryption subkey and the given user id.
    pub fn quick<U: Into<UserID>>(userid: U) -> Self {
        let mut p = KeyParameters::new(KeySpec::default_primary());
        p.subkey = Some(KeySpec::Rsa { bits: 0 });
        p.userid = Some(userid.into());
        p
    }
}

/// Generates a key block according to `params`.
///
/// Emits `KEY_CREATED` on success and `KEY_NOT_CREATED` (along with
/// the error) on failure.  A dry run returns `None` without talking
/// to the agent.
pub fn generate<S, W>(agent: &SharedAgent<S>,
                      params: &KeyParameters,
                      policy: &StandardPolicy,
                      status: &mut StatusWriter<W>)
                      -> Result<Option<Cert>>
    where S: Read + Write,
          W: Write,
{
    if params.dry_run {
        return Ok(None);
    }

    match generate_(agent, params, policy, status) {
        Ok(cert) => {
            status.emit(&Status::KeyCreated {
                kind: if params.subkey.is_some() {
                    KeyCreatedKind::Both
                } else {
                    KeyCreatedKind::Primary
                },
                fingerprint: cert.fingerprint(),
                handle: params.handle.clone(),
            })?;
            Ok(Some(cert))
        },
        Err(e) => {
            // The failure is always paired with the structured
            // status line.
            status.emit(&Status::KeyNotCreated {
                handle: params.handle.clone(),
            })?;
            Err(e)
        },
    }
}

fn generate_<S, W>(agent: &SharedAgent<S>,
                   params: &KeyParameters,
                   policy: &StandardPolicy,
                   status: &mut StatusWriter<W>)
                   -> Result<Cert>
    where S: Read + Write,
          W: Write,
{
    tracer!(TRACE, "keygen::generate");

    let (primary_spec, warnings) =
        params.key.clone().validated(params.expert, params.large_rsa)?;
    for w in &warnings {
        t!("{}", w);
    }

    let no_protection = params.no_protection || params.transient;

    // A passphrase is transported over the loopback; announce the
    // upcoming request.
    if let Some(passphrase) = &params.passphrase {
        let mut agent = agent.borrow_mut();
        agent.set_pinentry_mode(PinentryMode::Loopback)?;
        agent.set_passphrase(Some(passphrase.clone()));
        status.emit(&Status::NeedPassphrase {
            keyid: KeyID::from(0),
            main_keyid: KeyID::from(0),
            pk_algo: primary_spec.algo().into(),
        })?;
    }

    // The agent generates the key and returns the public half.
    let (mpis, created_at) = agent.borrow_mut().genkey(
        &primary_spec.genkey_sexp(),
        no_protection,
        Some(primary_spec.algo()))?;

    let creation_time = params.creation_time
        .or(created_at)
        .unwrap_or_else(Timestamp::now);
    let primary = Key::new(creation_time, primary_spec.algo(), mpis)?;
    t!("primary {} ({})", primary.fingerprint(), primary.algo_string());

    let mut primary_signer =
        KeyPair::new(agent.clone(), primary.clone())?;

    let usage = params.usage
        .unwrap_or_else(|| primary_spec.default_primary_usage());

    let mut builder = CertBuilder::new()
        .set_creation_time(creation_time)
        .set_primary_key_flags(usage)
        .set_validity_period(params.expiration)
        .set_preferences(params.preferences.clone());
    if let Some(uid) = &params.userid {
        builder = builder.add_userid(uid.clone());
    }
    if let Some(ks) = &params.keyserver {
        builder = builder.set_preferred_keyserver(ks);
    }
    for rk in &params.revokers {
        builder = builder.add_revocation_key(rk.clone());
    }

    let mut cert = builder.generate(&mut primary_signer, policy)?;

    // The subkey comes second: its binding signature needs the
    // primary, and the cache nonce from the first GENKEY saves a
    // second passphrase prompt.
    if let Some(subkey_spec) = &params.subkey {
        let (subkey_spec, warnings) = subkey_spec.clone()
            .validated(params.expert, params.large_rsa)?;
        for w in &warnings {
            t!("{}", w);
        }

        let (mpis, created_at) = agent.borrow_mut().genkey(
            &subkey_spec.genkey_sexp(),
            no_protection,
            Some(subkey_spec.algo()))?;
        let subkey_creation = params.creation_time
            .or(created_at)
            .unwrap_or_else(Timestamp::now);
        let subkey = Key::new(subkey_creation, subkey_spec.algo(), mpis)?;
        t!("subkey {} ({})", subkey.fingerprint(), subkey.algo_string());

        let subkey_usage = params.subkey_usage
            .unwrap_or_else(|| subkey_spec.default_subkey_usage());

        let template = SignatureBuilder::new(SignatureType::SubkeyBinding)
            .set_signature_creation_time(subkey_creation)?
            .set_key_flags(subkey_usage)?
            .set_key_validity_period(params.expiration)?;

        let mut subkey_signer = if subkey_usage.for_signing() {
            Some(KeyPair::new(agent.clone(), subkey.clone())?)
        } else {
            None
        };

        cert = cert.bind_subkey(
            &mut primary_signer,
            subkey,
            template,
            subkey_signer.as_mut()
                .map(|s| s as &mut dyn madrone_openpgp::crypto::Signer),
            policy)?;
    }

    Ok(cert)
}

/// Parses a `Revoker:` value: `algo:fingerprint`, optionally
/// followed by `sensitive`.
pub(crate) fn parse_revoker(value: &str) -> Result<RevocationKey> {
    let mut parts = value.split_whitespace();
    let spec = parts.next().ok_or_else(|| {
        Error::InvalidParameter("Empty revoker".into())
    })?;
    let sensitive = match parts.next() {
        None => false,
        Some(s) if s.eq_ignore_ascii_case("sensitive") => true,
        Some(junk) => return Err(Error::InvalidParameter(
            format!("Trailing junk in revoker: {:?}", junk)).into()),
    };

    let (algo, fpr) = spec.split_once(':').ok_or_else(|| {
        Error::InvalidParameter(
            format!("Revoker must be algo:fingerprint, got {:?}", spec))
    })?;
    let algo: u8 = algo.parse().map_err(|_| {
        Error::InvalidParameter(format!("Bad revoker algorithm {:?}", algo))
    })?;
    let fpr = Fingerprint::from_hex(fpr)?;
    if fpr.as_bytes().len() != 20 {
        return Err(Error::InvalidParameter(
            "Revoker fingerprint must have 20 bytes".into()).into());
    }

    Ok(RevocationKey::new(algo.into(), fpr, sensitive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_size_table() {
        // Default.
        let (s, w) = KeySpec::Rsa { bits: 0 }
            .validated(false, false).unwrap();
        assert_eq!(s, KeySpec::Rsa { bits: 2048 });
        assert!(w.is_empty());

        // Rounding up to a multiple of 32.
        let (s, w) = KeySpec::Rsa { bits: 2050 }
            .validated(false, false).unwrap();
        assert_eq!(s, KeySpec::Rsa { bits: 2080 });
        assert_eq!(w.len(), 1);

        // Clamping.
        let (s, _) = KeySpec::Rsa { bits: 512 }
            .validated(false, false).unwrap();
        assert_eq!(s, KeySpec::Rsa { bits: 1024 });
        let (s, _) = KeySpec::Rsa { bits: 8192 }
            .validated(false, false).unwrap();
        assert_eq!(s, KeySpec::Rsa { bits: 4096 });
        let (s, _) = KeySpec::Rsa { bits: 8192 }
            .validated(false, true).unwrap();
        assert_eq!(s, KeySpec::Rsa { bits: 8192 });
    }

    #[test]
    fn dsa_size_table() {
        // Normal mode snaps to whole kibibits above 1024.
        let (s, _) = KeySpec::Dsa { bits: 1792 }
            .validated(false, false).unwrap();
        assert_eq!(s, KeySpec::Dsa { bits: 2048 });

        // Expert mode rounds to 64 bits only.
        let (s, _) = KeySpec::Dsa { bits: 1700 }
            .validated(true, false).unwrap();
        assert_eq!(s, KeySpec::Dsa { bits: 1728 });

        assert_eq!(KeySpec::dsa_qbits(1024), 160);
        assert_eq!(KeySpec::dsa_qbits(2047), 224);
        assert_eq!(KeySpec::dsa_qbits(2048), 256);
        assert_eq!(KeySpec::dsa_qbits(3072), 256);
    }

    #[test]
    fn curve_checks() {
        assert!(KeySpec::Ecdsa { curve: Curve::NistP384 }
                .validated(false, false).is_ok());
        assert!(KeySpec::Ecdsa { curve: Curve::Cv25519 }
                .validated(false, false).is_err());
        assert!(KeySpec::Ecdh { curve: Curve::Cv25519 }
                .validated(false, false).is_ok());
        assert!(KeySpec::Eddsa { curve: Curve::Ed25519 }
                .validated(false, false).is_ok());
        assert!(KeySpec::Eddsa { curve: Curve::NistP256 }
                .validated(false, false).is_err());
    }

    #[test]
    fn genkey_sexp_forms() {
        assert_eq!(
            String::from_utf8(
                KeySpec::Rsa { bits: 2048 }.genkey_sexp().to_vec()).unwrap(),
            "(6:genkey(3:rsa(5:nbits4:2048)))");
        assert_eq!(
            String::from_utf8(
                KeySpec::Eddsa { curve: Curve::Ed25519 }
                .genkey_sexp().to_vec()).unwrap(),
            "(6:genkey(3:ecc(5:curve7:Ed25519)(5:flags5:eddsa)))");
        assert_eq!(
            String::from_utf8(
                KeySpec::Dsa { bits: 2048 }.genkey_sexp().to_vec()).unwrap(),
            "(6:genkey(3:dsa(5:nbits4:2048)(5:qbits3:256)))");
    }

    #[test]
    fn expiration_grammar() {
        let now = Timestamp::from(1700000000);
        assert_eq!(parse_expiration(now, "0").unwrap(), None);
        assert_eq!(parse_expiration(now, "never").unwrap(), None);
        assert_eq!(parse_expiration(now, "7").unwrap(),
                   Some(Duration::days(7).unwrap()));
        assert_eq!(parse_expiration(now, "12d").unwrap(),
                   Some(Duration::days(12).unwrap()));
        assert_eq!(parse_expiration(now, "2w").unwrap(),
                   Some(Duration::weeks(2).unwrap()));
        assert_eq!(parse_expiration(now, "6m").unwrap(),
                   Some(Duration::months(6).unwrap()));
        assert_eq!(parse_expiration(now, "1y").unwrap(),
                   Some(Duration::years(1).unwrap()));
        assert_eq!(parse_expiration(now, "seconds=3600").unwrap(),
                   Some(Duration::seconds(3600)));

        // ISO dates; 2023-11-14T22:13:20Z is 1700000000.
        assert_eq!(parse_expiration(now, "2023-11-15").unwrap(),
                   Some(Duration::seconds(1700006400 - 1700000000)));
        assert!(parse_expiration(now, "2023-11-13").is_err());
        assert!(parse_expiration(now, "13x").is_err());
        assert!(parse_expiration(now, "13q").is_err());
    }

    #[test]
    fn creation_date_grammar() {
        assert_eq!(u32::from(parse_creation_date("seconds=1234").unwrap()),
                   1234);
        assert_eq!(parse_creation_date("19700101").unwrap(),
                   Timestamp::from(0));
        assert_eq!(parse_creation_date("2023-11-14").unwrap(),
                   Timestamp::from(1699920000));
        assert_eq!(parse_creation_date("20231114T221320").unwrap(),
                   Timestamp::from(1700000000));
        assert!(parse_creation_date("yesterday").is_err());
    }

    #[test]
    fn revoker_parsing() {
        let rk = parse_revoker(
            "1:8F17777118A33DDA9BA48E62AACB3243630052D9 sensitive")
            .unwrap();
        assert!(rk.sensitive());
        assert_eq!(rk.revoker_algo(),
                   PublicKeyAlgorithm::RSAEncryptSign);

        assert!(parse_revoker("deadbeef").is_err());
        assert!(parse_revoker("1:deadbeef").is_err());
    }
}
