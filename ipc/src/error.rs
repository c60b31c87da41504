//! The agent's numeric error composite.
//!
//! An `ERR` line carries a number that packs an error source and an
//! error code: the code occupies the low 16 bits, the source sits in
//! bits 24..31.  The composite lets the caller distinguish an error
//! raised by the agent from one merely relayed by it, even when the
//! message text has been discarded.

use std::fmt;

const CODE_MASK: u32 = (1 << 16) - 1;
const SOURCE_SHIFT: u32 = 24;
const SOURCE_MASK: u32 = 127;

/// Where an error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorSource {
    /// Unspecified source.
    Unknown,
    /// The cryptographic library.
    Gcrypt,
    /// The OpenPGP engine.
    Gpg,
    /// The secret-key agent.
    GpgAgent,
    /// The pinentry.
    Pinentry,
    /// The smartcard daemon.
    Scd,
    /// The keyserver access daemon.
    Dirmngr,
    /// Any other source.
    Other(u8),
}

impl From<u8> for ErrorSource {
    fn from(u: u8) -> Self {
        match u {
            0 => ErrorSource::Unknown,
            1 => ErrorSource::Gcrypt,
            2 => ErrorSource::Gpg,
            4 => ErrorSource::GpgAgent,
            5 => ErrorSource::Pinentry,
            6 => ErrorSource::Scd,
            10 => ErrorSource::Dirmngr,
            u => ErrorSource::Other(u),
        }
    }
}

impl From<ErrorSource> for u8 {
    fn from(s: ErrorSource) -> u8 {
        match s {
            ErrorSource::Unknown => 0,
            ErrorSource::Gcrypt => 1,
            ErrorSource::Gpg => 2,
            ErrorSource::GpgAgent => 4,
            ErrorSource::Pinentry => 5,
            ErrorSource::Scd => 6,
            ErrorSource::Dirmngr => 10,
            ErrorSource::Other(u) => u,
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorSource::Unknown => f.write_str("Unspecified source"),
            ErrorSource::Gcrypt => f.write_str("gcrypt"),
            ErrorSource::Gpg => f.write_str("gpg"),
            ErrorSource::GpgAgent => f.write_str("gpg-agent"),
            ErrorSource::Pinentry => f.write_str("pinentry"),
            ErrorSource::Scd => f.write_str("scdaemon"),
            ErrorSource::Dirmngr => f.write_str("dirmngr"),
            ErrorSource::Other(u) =>
                f.write_fmt(format_args!("source {}", u)),
        }
    }
}

/// The error codes the engine inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// No error.
    NoError,
    /// Unspecified failure.
    General,
    /// Bad signature.
    BadSignature,
    /// No public key.
    NoPublicKey,
    /// The supplied passphrase was wrong.
    BadPassphrase,
    /// No secret key.
    NoSecretKey,
    /// The operation is not implemented.
    NotImplemented,
    /// The user canceled the operation.
    Canceled,
    /// The user canceled the operation and all further ones.
    FullyCanceled,
    /// The object already exists.
    Eexist,
    /// The peer does not know the command.
    UnknownCommand,
    /// The inquiry was not understood.
    UnknownInquiry,
    /// Any other code.
    Other(u16),
}

impl From<u16> for ErrorCode {
    fn from(u: u16) -> Self {
        match u {
            0 => ErrorCode::NoError,
            1 => ErrorCode::General,
            8 => ErrorCode::BadSignature,
            9 => ErrorCode::NoPublicKey,
            11 => ErrorCode::BadPassphrase,
            17 => ErrorCode::NoSecretKey,
            69 => ErrorCode::NotImplemented,
            99 => ErrorCode::Canceled,
            198 => ErrorCode::FullyCanceled,
            275 => ErrorCode::UnknownCommand,
            279 => ErrorCode::UnknownInquiry,
            32803 => ErrorCode::Eexist,
            u => ErrorCode::Other(u),
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(c: ErrorCode) -> u16 {
        match c {
            ErrorCode::NoError => 0,
            ErrorCode::General => 1,
            ErrorCode::BadSignature => 8,
            ErrorCode::NoPublicKey => 9,
            ErrorCode::BadPassphrase => 11,
            ErrorCode::NoSecretKey => 17,
            ErrorCode::NotImplemented => 69,
            ErrorCode::Canceled => 99,
            ErrorCode::FullyCanceled => 198,
            ErrorCode::UnknownCommand => 275,
            ErrorCode::UnknownInquiry => 279,
            ErrorCode::Eexist => 32803,
            ErrorCode::Other(u) => u,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorCode::NoError => f.write_str("Success"),
            ErrorCode::General => f.write_str("General error"),
            ErrorCode::BadSignature => f.write_str("Bad signature"),
            ErrorCode::NoPublicKey => f.write_str("No public key"),
            ErrorCode::BadPassphrase => f.write_str("Bad passphrase"),
            ErrorCode::NoSecretKey => f.write_str("No secret key"),
            ErrorCode::NotImplemented => f.write_str("Not implemented"),
            ErrorCode::Canceled => f.write_str("Operation cancelled"),
            ErrorCode::FullyCanceled =>
                f.write_str("Operation fully cancelled"),
            ErrorCode::Eexist => f.write_str("Already exists"),
            ErrorCode::UnknownCommand => f.write_str("Unknown IPC command"),
            ErrorCode::UnknownInquiry => f.write_str("Unknown IPC inquiry"),
            ErrorCode::Other(u) => f.write_fmt(format_args!("code {}", u)),
        }
    }
}

/// An error reported by the agent on an `ERR` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentError {
    composite: u32,
    message: Option<String>,
}

impl AgentError {
    /// Creates an error from the numeric composite and the optional
    /// human-readable text.
    pub fn new(composite: u32, message: Option<String>) -> Self {
        AgentError { composite, message }
    }

    /// Creates an error from a source and a code.
    pub fn from_parts(source: ErrorSource, code: ErrorCode) -> Self {
        let composite = ((u8::from(source) as u32 & SOURCE_MASK)
                         << SOURCE_SHIFT)
            | (u16::from(code) as u32 & CODE_MASK);
        AgentError { composite, message: None }
    }

    /// Returns the raw composite number.
    pub fn composite(&self) -> u32 {
        self.composite
    }

    /// Returns the error source.
    pub fn source(&self) -> ErrorSource {
        (((self.composite >> SOURCE_SHIFT) & SOURCE_MASK) as u8).into()
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        ((self.composite & CODE_MASK) as u16).into()
    }

    /// Returns the message, if the agent sent one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.message {
            Some(m) =>
                write!(f, "{} <{}> ({})", self.code(), self.source(), m),
            None => write!(f, "{} <{}>", self.code(), self.source()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_roundtrip() {
        let e = AgentError::from_parts(ErrorSource::GpgAgent,
                                       ErrorCode::BadPassphrase);
        assert_eq!(e.composite(), (4 << 24) | 11);
        assert_eq!(e.source(), ErrorSource::GpgAgent);
        assert_eq!(e.code(), ErrorCode::BadPassphrase);

        let parsed = AgentError::new(e.composite(), None);
        assert_eq!(parsed.source(), ErrorSource::GpgAgent);
        assert_eq!(parsed.code(), ErrorCode::BadPassphrase);
    }

    #[test]
    fn canceled_from_gpg_agent() {
        // 67108963 is the composite gpg-agent actually sends for a
        // cancel: source 4, code 99.
        let e = AgentError::new(67108963, None);
        assert_eq!(e.source(), ErrorSource::GpgAgent);
        assert_eq!(e.code(), ErrorCode::Canceled);
    }
}
