//! The secret-key agent client.
//!
//! The agent owns all private key material.  This module implements
//! the commands the OpenPGP engine uses: probing for keys, key
//! generation, signing, decryption, and the key lifecycle
//! operations.  The [`KeyPair`] type packages a public key and an
//! agent connection into a [`Signer`], which is the only way the
//! engine ever produces a signature.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use madrone_openpgp::crypto::mem::Password;
use madrone_openpgp::crypto::mpi;
use madrone_openpgp::crypto::sexp::{self, Keygrip, Sexp};
use madrone_openpgp::crypto::Signer;
use madrone_openpgp::packet::Key;
use madrone_openpgp::types::{HashAlgorithm, PublicKeyAlgorithm, Timestamp};

use crate::assuan::{self, Connection, Inquiry};
use crate::Error;
use crate::Result;

const TRACE: bool = false;

/// How passphrases are collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum PinentryMode {
    /// Use the agent's pinentry.
    #[default]
    Ask,
    /// Refuse any pinentry interaction.
    Cancel,
    /// Fail if a pinentry would be needed.
    Error,
    /// The client supplies the passphrase over the protocol.
    Loopback,
}

impl PinentryMode {
    fn as_str(&self) -> &'static str {
        match self {
            PinentryMode::Ask => "ask",
            PinentryMode::Cancel => "cancel",
            PinentryMode::Error => "error",
            PinentryMode::Loopback => "loopback",
        }
    }
}

/// Where the agent stores a secret key.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyStorage {
    /// In the agent's key store on disk.
    Local,
    /// On a smartcard with the given serial number.
    Smartcard(String),
    /// Somewhere we do not recognise.
    Unknown,
}

/// A connection to the secret-key agent.
///
/// One transaction is in flight at any time; nested inquiries are
/// serviced synchronously inside the running transaction.  The
/// protocol is stateful, so a connection must not be shared between
/// logical operations without serializing them.
pub struct Agent<S: Read + Write> {
    conn: Connection<S>,

    /// Passphrase cache nonce handed out by the agent; passing it
    /// back lets the agent skip re-prompting within one key
    /// generation.
    cache_nonce: Option<String>,
    /// Like the cache nonce, but for the PASSWD command.
    passwd_nonce: Option<String>,

    pinentry_mode: PinentryMode,
    /// The passphrase served to PASSPHRASE/NEWPASSPHRASE inquiries
    /// in loopback mode.
    pending_passphrase: Option<Password>,

    /// Whether the peer answered `AGENT_ID`, which the real agent
    /// never does.
    hijacked: bool,
}

impl<S: Read + Write> Agent<S> {
    /// Connects over the given stream and performs the initial
    /// handshake.
    ///
    /// The agent greets with an `OK` line; anything else means we
    /// are not talking to an Assuan server.
    pub fn new(stream: S) -> Result<Self> {
        tracer!(TRACE, "Agent::new");

        let mut conn = Connection::new(stream);
        match conn.read_response() {
            Ok(assuan::Response::Ok(_)) => (),
            Ok(r) => return Err(Error::Protocol(
                format!("Unexpected greeting {:?}", r)).into()),
            Err(e) => return Err(Error::AgentUnavailable(
                e.to_string()).into()),
        }

        let mut agent = Agent {
            conn,
            cache_nonce: None,
            passwd_nonce: None,
            pinentry_mode: PinentryMode::default(),
            pending_passphrase: None,
            hijacked: false,
        };

        // Positive handshake first: a genuine agent knows GETINFO.
        // Only then probe with AGENT_ID, a command the real agent
        // rejects; an implementation that answers it with OK has
        // taken over the socket.
        agent.conn.transact_simple("GETINFO version")?;
        match agent.conn.transact_simple("AGENT_ID") {
            Ok(_) => {
                t!("the agent answered AGENT_ID; socket is \
                    served by a foreign implementation");
                agent.hijacked = true;
            },
            Err(_) => (),
        }

        // Option negotiation.  Failures are tolerated: an older
        // agent simply does not know these.
        let _ = agent.conn.transact_simple("OPTION allow-pinentry-notify");
        let _ = agent.conn.transact_simple("OPTION agent-awareness=2.1.0");

        Ok(agent)
    }

    /// Wraps the agent for shared use, so several [`KeyPair`]s can
    /// refer to the same connection.  Operations still run one at a
    /// time.
    pub fn shared(self) -> SharedAgent<S> {
        Rc::new(RefCell::new(self))
    }

    /// Returns whether a foreign implementation answered
    /// `AGENT_ID`.  The caller should warn the user once.
    pub fn hijacked(&self) -> bool {
        self.hijacked
    }

    /// Clears the per-connection state on both ends.
    pub fn reset(&mut self) -> Result<()> {
        self.cache_nonce = None;
        self.passwd_nonce = None;
        self.conn.transact_simple("RESET")?;
        Ok(())
    }

    /// Queries the agent, e.g. for `version`, `s2k_count`, or
    /// `cmd_has_option GET_PASSPHRASE repeat`.
    pub fn get_info(&mut self, what: &str) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.conn.transact(&format!("GETINFO {}", what),
                           &mut |d| data.extend_from_slice(d),
                           &mut |_, _| (),
                           &mut |_, _| Ok(Inquiry::Cancel))?;
        Ok(data)
    }

    /// Returns the agent's version string.
    pub fn version(&mut self) -> Result<String> {
        let data = self.get_info("version")?;
        Ok(String::from_utf8_lossy(&data).trim().to_string())
    }

    /// Selects the pinentry mode.
    pub fn set_pinentry_mode(&mut self, mode: PinentryMode) -> Result<()> {
        self.conn.transact_simple(
            &format!("OPTION pinentry-mode={}", mode.as_str()))?;
        self.pinentry_mode = mode;
        Ok(())
    }

    /// Sets the passphrase served to the agent's inquiries in
    /// loopback mode.
    pub fn set_passphrase(&mut self, passphrase: Option<Password>) {
        self.pending_passphrase = passphrase;
    }

    /// Returns the cache nonce from the last passphrase
    /// interaction, if any.
    pub fn cache_nonce(&self) -> Option<&str> {
        self.cache_nonce.as_deref()
    }

    /// Asks whether the agent holds any of the given secret keys.
    pub fn have_key(&mut self, grips: &[Keygrip]) -> Result<bool> {
        let mut cmd = String::from("HAVEKEY");
        for grip in grips {
            cmd.push(' ');
            cmd.push_str(&grip.to_string());
        }

        match self.conn.transact_simple(&cmd) {
            Ok(_) => Ok(true),
            Err(e) => match e.downcast_ref::<Error>() {
                Some(Error::NoSecretKey) => Ok(false),
                _ => Err(e),
            },
        }
    }

    /// Asks where the secret key with the given grip is stored.
    pub fn key_info(&mut self, grip: &Keygrip) -> Result<KeyStorage> {
        let mut storage = KeyStorage::Unknown;
        self.conn.transact(
            &format!("KEYINFO {}", grip),
            &mut |_| (),
            &mut |keyword, info| {
                if keyword != "KEYINFO" {
                    return;
                }
                // KEYINFO <grip> <type> <serialno> <idstr> ...
                let mut fields = info.split_whitespace();
                let _grip = fields.next();
                match (fields.next(), fields.next()) {
                    (Some("T"), Some(serialno)) =>
                        storage = KeyStorage::Smartcard(serialno.into()),
                    (Some("D"), _) => storage = KeyStorage::Local,
                    _ => (),
                }
            },
            &mut |_, _| Ok(Inquiry::Cancel))?;
        Ok(storage)
    }

    /// Asks the agent to generate a key.
    ///
    /// `params` is the algorithm-specific S-expression served to the
    /// KEYPARAM inquiry, e.g. `(genkey(rsa(nbits "2048")))`.  With
    /// `no_protection` the key is stored unprotected (transient
    /// keys); otherwise the passphrase is collected according to the
    /// pinentry mode.
    ///
    /// Returns the public key material and the creation time if the
    /// agent reported one.
    pub fn genkey(&mut self, params: &Sexp, no_protection: bool,
                  want: Option<PublicKeyAlgorithm>)
                  -> Result<(mpi::PublicKey, Option<Timestamp>)>
    {
        tracer!(TRACE, "Agent::genkey");

        let mut cmd = String::from("GENKEY");
        if no_protection {
            cmd.push_str(" --no-protection");
        }
        if let Some(nonce) = &self.cache_nonce {
            cmd.push(' ');
            cmd.push_str(nonce);
        }

        let mut data = Vec::new();
        let mut cache_nonce = None;
        let mut created_at = None;
        let keyparam = params.to_vec();
        let mode = self.pinentry_mode;
        let passphrase = self.pending_passphrase.clone();

        self.conn.transact(
            &cmd,
            &mut |d| data.extend_from_slice(d),
            &mut |keyword, info| match keyword {
                "CACHE_NONCE" => cache_nonce = Some(info.to_string()),
                "KEY-CREATED-AT" =>
                    created_at = info.trim().parse::<u32>().ok()
                        .map(Timestamp::from),
                "PROGRESS" => t!("progress: {}", info),
                _ => (),
            },
            &mut |keyword, _| match keyword {
                "KEYPARAM" => Ok(Inquiry::Provide(keyparam.clone())),
                "NEWPASSPHRASE" | "PASSPHRASE" =>
                    passphrase_inquiry(mode, &passphrase),
                "PINENTRY_LAUNCHED" => Ok(Inquiry::Provide(Vec::new())),
                _ => Ok(Inquiry::Cancel),
            })?;

        if let Some(nonce) = cache_nonce {
            self.cache_nonce = Some(nonce);
        }

        let sexp = Sexp::from_bytes(&data)?;
        Ok((sexp::key_from_sexp(&sexp, want)?, created_at))
    }

    /// Reads the public part of the key named by `grip`.
    pub fn read_key(&mut self, grip: &Keygrip,
                    want: Option<PublicKeyAlgorithm>)
                    -> Result<mpi::PublicKey>
    {
        let mut data = Vec::new();
        self.conn.transact(
            &format!("READKEY {}", grip),
            &mut |d| data.extend_from_slice(d),
            &mut |_, _| (),
            &mut |_, _| Ok(Inquiry::Cancel))?;

        let sexp = Sexp::from_bytes(&data)?;
        sexp::key_from_sexp(&sexp, want)
    }

    /// Creates a signature over `digest` with the key named by
    /// `grip`.
    ///
    /// This is the SIGKEY / SETKEYDESC / SETHASH / PKSIGN sequence.
    /// `desc` is shown by the pinentry when the key is protected.
    pub fn sign(&mut self, grip: &Keygrip, desc: Option<&str>,
                hash_algo: HashAlgorithm, digest: &[u8],
                algo: PublicKeyAlgorithm)
                -> Result<mpi::Signature>
    {
        tracer!(TRACE, "Agent::sign");

        self.conn.transact_simple(&format!("SIGKEY {}", grip))?;

        if let Some(desc) = desc {
            self.conn.transact_simple(
                &format!("SETKEYDESC {}",
                         assuan::escape_plus(desc.as_bytes())))?;
        }

        self.conn.transact_simple(
            &format!("SETHASH {} {}",
                     u8::from(hash_algo),
                     hex(digest)))?;

        let mut cmd = String::from("PKSIGN");
        if let Some(nonce) = &self.cache_nonce {
            cmd.push_str(" -- ");
            cmd.push_str(nonce);
        }

        let mut data = Vec::new();
        let mut cache_nonce = None;
        let mode = self.pinentry_mode;
        let passphrase = self.pending_passphrase.clone();
        self.conn.transact(
            &cmd,
            &mut |d| data.extend_from_slice(d),
            &mut |keyword, info| {
                if keyword == "CACHE_NONCE" {
                    cache_nonce = Some(info.to_string());
                }
            },
            &mut |keyword, _| match keyword {
                "PASSPHRASE" | "NEWPASSPHRASE" =>
                    passphrase_inquiry(mode, &passphrase),
                "PINENTRY_LAUNCHED" => Ok(Inquiry::Provide(Vec::new())),
                _ => Ok(Inquiry::Cancel),
            })?;

        if let Some(nonce) = cache_nonce {
            self.cache_nonce = Some(nonce);
        }

        let sexp = Sexp::from_bytes(&data)?;
        sexp::signature_from_sexp(&sexp, algo)
    }

    /// Decrypts a ciphertext with the key named by `grip`.
    ///
    /// `ciphertext` is the `(enc-val ...)` S-expression.  Returns
    /// the plaintext and the number of padding bytes if the agent
    /// reported one.
    pub fn decrypt(&mut self, grip: &Keygrip, desc: Option<&str>,
                   ciphertext: &Sexp)
                   -> Result<(madrone_openpgp::crypto::mem::Protected,
                              Option<usize>)>
    {
        self.conn.transact_simple(&format!("SETKEY {}", grip))?;
        if let Some(desc) = desc {
            self.conn.transact_simple(
                &format!("SETKEYDESC {}",
                         assuan::escape_plus(desc.as_bytes())))?;
        }

        let mut data = Vec::new();
        let mut padding = None;
        let ct = ciphertext.to_vec();
        let mode = self.pinentry_mode;
        let passphrase = self.pending_passphrase.clone();
        self.conn.transact(
            "PKDECRYPT",
            &mut |d| data.extend_from_slice(d),
            &mut |keyword, info| {
                if keyword == "PADDING" {
                    padding = info.trim().parse::<usize>().ok();
                }
            },
            &mut |keyword, _| match keyword {
                "CIPHERTEXT" => Ok(Inquiry::Provide(ct.clone())),
                "PASSPHRASE" => passphrase_inquiry(mode, &passphrase),
                "PINENTRY_LAUNCHED" => Ok(Inquiry::Provide(Vec::new())),
                _ => Ok(Inquiry::Cancel),
            })?;

        // The reply is (value <plaintext>), possibly wrapped.
        let sexp = Sexp::from_bytes(&data)?;
        let value = sexp.lookup_value("value")
            .or_else(|| match sexp.list() {
                Some([a, Sexp::String(v)])
                    if a.string() == Some(b"value") => Some(&v[..]),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol(
                "PKDECRYPT reply lacks a value".into()))?;

        let mut plaintext =
            madrone_openpgp::crypto::mem::Protected::from(value);
        if let Some(n) = padding {
            // Strip the padding the agent told us about.
            let len = plaintext.len().saturating_sub(n);
            plaintext = madrone_openpgp::crypto::mem::Protected::from(
                &plaintext[..len]);
        }
        Ok((plaintext, padding))
    }

    /// Imports a protected secret key into the agent.
    pub fn import_key(&mut self, keydata: &[u8], unattended: bool)
                      -> Result<()>
    {
        let cmd = if unattended {
            "IMPORT_KEY --unattended"
        } else {
            "IMPORT_KEY"
        };
        let keydata = keydata.to_vec();
        let mode = self.pinentry_mode;
        let passphrase = self.pending_passphrase.clone();
        self.conn.transact(
            cmd,
            &mut |_| (),
            &mut |_, _| (),
            &mut |keyword, _| match keyword {
                "KEYDATA" => Ok(Inquiry::Provide(keydata.clone())),
                "PASSPHRASE" | "NEWPASSPHRASE" =>
                    passphrase_inquiry(mode, &passphrase),
                "PINENTRY_LAUNCHED" => Ok(Inquiry::Provide(Vec::new())),
                _ => Ok(Inquiry::Cancel),
            })?;
        Ok(())
    }

    /// Exports the (wrapped) secret key named by `grip`.
    pub fn export_key(&mut self, grip: &Keygrip) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mode = self.pinentry_mode;
        let passphrase = self.pending_passphrase.clone();
        self.conn.transact(
            &format!("EXPORT_KEY {}", grip),
            &mut |d| data.extend_from_slice(d),
            &mut |_, _| (),
            &mut |keyword, _| match keyword {
                "PASSPHRASE" => passphrase_inquiry(mode, &passphrase),
                "PINENTRY_LAUNCHED" => Ok(Inquiry::Provide(Vec::new())),
                _ => Ok(Inquiry::Cancel),
            })?;
        Ok(data)
    }

    /// Deletes the secret key named by `grip`.
    pub fn delete_key(&mut self, grip: &Keygrip) -> Result<()> {
        self.conn.transact_simple(&format!("DELETE_KEY {}", grip))?;
        Ok(())
    }

    /// Fetches the key wrapping key used to protect keys in
    /// transit during import and export.
    pub fn keywrap_key(&mut self, export: bool)
                       -> Result<madrone_openpgp::crypto::mem::Protected>
    {
        let cmd = if export {
            "KEYWRAP_KEY --export"
        } else {
            "KEYWRAP_KEY --import"
        };
        let mut data = Vec::new();
        self.conn.transact(cmd,
                           &mut |d| data.extend_from_slice(d),
                           &mut |_, _| (),
                           &mut |_, _| Ok(Inquiry::Cancel))?;
        Ok(data.into())
    }

    /// Changes the passphrase of the key named by `grip`.
    pub fn passwd(&mut self, grip: &Keygrip) -> Result<()> {
        let mut cmd = format!("PASSWD {}", grip);
        if let Some(nonce) = &self.passwd_nonce {
            cmd = format!("PASSWD --passwd-nonce={} {}", nonce, grip);
        }

        let mut passwd_nonce = None;
        let mode = self.pinentry_mode;
        let passphrase = self.pending_passphrase.clone();
        self.conn.transact(
            &cmd,
            &mut |_| (),
            &mut |keyword, info| {
                if keyword == "PASSWD_NONCE" {
                    passwd_nonce = Some(info.to_string());
                }
            },
            &mut |keyword, _| match keyword {
                "PASSPHRASE" | "NEWPASSPHRASE" =>
                    passphrase_inquiry(mode, &passphrase),
                "PINENTRY_LAUNCHED" => Ok(Inquiry::Provide(Vec::new())),
                _ => Ok(Inquiry::Cancel),
            })?;

        if let Some(nonce) = passwd_nonce {
            self.passwd_nonce = Some(nonce);
        }
        Ok(())
    }
}

#[cfg(unix)]
impl Agent<std::os::unix::net::UnixStream> {
    /// Connects to the agent listening on the given socket.
    pub fn connect<P: AsRef<std::path::Path>>(socket: P) -> Result<Self> {
        let stream = std::os::unix::net::UnixStream::connect(socket)
            .map_err(|e| Error::AgentUnavailable(e.to_string()))?;
        Agent::new(stream)
    }
}

/// Serves a passphrase inquiry.  Only loopback mode may answer;
/// everything else cancels, and the agent falls back to its own
/// pinentry.
fn passphrase_inquiry(mode: PinentryMode, passphrase: &Option<Password>)
                      -> Result<Inquiry>
{
    match (mode, passphrase) {
        (PinentryMode::Loopback, Some(p)) => Ok(Inquiry::Provide(
            p.map(|p| p.as_ref().to_vec()))),
        _ => Ok(Inquiry::Cancel),
    }
}

fn hex(data: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(data.len() * 2);
    for b in data {
        write!(s, "{:02X}", b).expect("writing to a String never fails");
    }
    s
}

/// An agent connection shared between several key pairs.
pub type SharedAgent<S> = Rc<RefCell<Agent<S>>>;

/// A secret key managed by the agent, usable as a [`Signer`].
///
/// The pair holds the public half; the secret half never leaves the
/// agent and is addressed by the keygrip.
pub struct KeyPair<S: Read + Write> {
    agent: SharedAgent<S>,
    public: Key,
    grip: Keygrip,
    desc: Option<String>,
}

impl<S: Read + Write> KeyPair<S> {
    /// Creates a key pair for the given public key.
    ///
    /// Fails if the keygrip cannot be computed from the key
    /// material.  Whether the agent actually holds the secret half
    /// is checked by the first operation, or explicitly with
    /// [`Agent::have_key`].
    pub fn new(agent: SharedAgent<S>, public: Key) -> Result<Self> {
        let grip = public.keygrip()?;
        Ok(KeyPair {
            agent,
            public,
            grip,
            desc: None,
        })
    }

    /// Sets the text shown by the pinentry when this key is used.
    pub fn with_description(mut self, desc: String) -> Self {
        self.desc = Some(desc);
        self
    }

    /// Returns the keygrip.
    pub fn keygrip(&self) -> &Keygrip {
        &self.grip
    }
}

impl<S: Read + Write> Signer for KeyPair<S> {
    fn public(&self) -> &Key {
        &self.public
    }

    fn sign(&mut self, hash_algo: HashAlgorithm, digest: &[u8])
            -> Result<mpi::Signature>
    {
        self.agent.borrow_mut().sign(
            &self.grip,
            self.desc.as_deref(),
            hash_algo,
            digest,
            self.public.pk_algo())
    }
}
