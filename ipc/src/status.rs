//! Machine-readable status output.
//!
//! Front-ends drive the engine through a pipe and watch one status
//! line per event.  The grammar is fixed; changing a single field
//! breaks every scripting consumer, so the writer is the only place
//! these lines are formatted.

use std::io::Write;

use madrone_openpgp::Fingerprint;
use madrone_openpgp::KeyID;

use crate::Result;

/// Which keys a generation run produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCreatedKind {
    /// Only a primary key.
    Primary,
    /// Only a subkey was added.
    Subkey,
    /// A primary key and a subkey.
    Both,
}

impl KeyCreatedKind {
    fn letter(&self) -> char {
        match self {
            KeyCreatedKind::Primary => 'P',
            KeyCreatedKind::Subkey => 'S',
            KeyCreatedKind::Both => 'B',
        }
    }
}

/// A status event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Status {
    /// A key was created.
    KeyCreated {
        /// What was created.
        kind: KeyCreatedKind,
        /// Fingerprint of the primary key.
        fingerprint: Fingerprint,
        /// The caller-supplied handle, if any.
        handle: Option<String>,
    },

    /// Key generation failed.
    KeyNotCreated {
        /// The caller-supplied handle, if any.
        handle: Option<String>,
    },

    /// A smartcard operation failed.  1 is cancel, 2 a bad PIN,
    /// everything else generic.
    ScOpFailure {
        /// The failure class.
        code: u32,
    },

    /// Smartcard discovery outcome.
    CardCtrl {
        /// The event class: 3 card present, 4 error, 6 no card
        /// daemon, 7 daemon terminated.
        code: u32,
        /// The card's serial number, when present.
        serialno: Option<String>,
    },

    /// A heartbeat the caller may poll while a long operation runs.
    Progress,

    /// Emitted before a passphrase is requested over the loopback.
    NeedPassphrase {
        /// The key the passphrase is for.
        keyid: KeyID,
        /// The corresponding primary key.
        main_keyid: KeyID,
        /// The key's public key algorithm identifier.
        pk_algo: u8,
    },
}

/// Writes status lines to a sink, one line per event.
pub struct StatusWriter<W: Write> {
    sink: W,
}

impl<W: Write> StatusWriter<W> {
    /// Creates a writer emitting to `sink`.
    pub fn new(sink: W) -> Self {
        StatusWriter { sink }
    }

    /// Emits one status line.
    pub fn emit(&mut self, status: &Status) -> Result<()> {
        match status {
            Status::KeyCreated { kind, fingerprint, handle } => {
                match handle {
                    Some(handle) => writeln!(
                        self.sink, "KEY_CREATED {} {} {}",
                        kind.letter(), fingerprint.to_hex(), handle)?,
                    None => writeln!(
                        self.sink, "KEY_CREATED {} {}",
                        kind.letter(), fingerprint.to_hex())?,
                }
            },
            Status::KeyNotCreated { handle } => {
                match handle {
                    Some(handle) => writeln!(
                        self.sink, "KEY_NOT_CREATED {}", handle)?,
                    None => writeln!(self.sink, "KEY_NOT_CREATED")?,
                }
            },
            Status::ScOpFailure { code } =>
                writeln!(self.sink, "SC_OP_FAILURE {}", code)?,
            Status::CardCtrl { code, serialno } => {
                match serialno {
                    Some(s) =>
                        writeln!(self.sink, "CARDCTRL {} {}", code, s)?,
                    None => writeln!(self.sink, "CARDCTRL {}", code)?,
                }
            },
            Status::Progress =>
                writeln!(self.sink, "PROGRESS tick ? 0 0")?,
            Status::NeedPassphrase { keyid, main_keyid, pk_algo } =>
                writeln!(self.sink, "NEED_PASSPHRASE {} {} {}",
                         keyid.to_hex(), main_keyid.to_hex(), pk_algo)?,
        }
        self.sink.flush()?;
        Ok(())
    }
}

/// The overall outcome of an operation, as reflected in the process
/// exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Everything went fine.
    Success,
    /// The operation finished, but something was ignored (bad
    /// signatures, unusable keys).
    Warnings,
    /// The operation failed.
    Failure,
}

impl Outcome {
    /// Returns the conventional exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Warnings => 1,
            Outcome::Failure => 2,
        }
    }
}
