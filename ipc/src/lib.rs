//! Interprocess communication with the secret-key agent.
//!
//! Every operation that touches private key material goes through an
//! out-of-process agent speaking a line-oriented request/response
//! protocol (the Assuan protocol).  This crate implements the client
//! side of that protocol, the agent commands the OpenPGP engine
//! uses, and the key generation orchestrator that drives the agent
//! and the `madrone-openpgp` key block machinery end to end.
//!
//! The protocol is stateful (cache nonces, the key selected with
//! `SIGKEY`, pending inquiries), so a connection must never be
//! shared between concurrent operations.  Everything here is
//! synchronous; one transaction is in flight per connection at any
//! time.

#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod assuan;
pub mod agent;
pub use agent::{Agent, KeyPair, SharedAgent};
pub mod error;
pub use error::AgentError;
pub mod keygen;
pub mod status;

/// Crate result specialization.
pub type Result<T> = ::std::result::Result<T, anyhow::Error>;

/// Errors returned by this crate.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The agent reported an error.
    #[error("Agent error: {0}")]
    Agent(AgentError),

    /// The agent could not be reached.
    #[error("Agent is unavailable: {0}")]
    AgentUnavailable(String),

    /// The line framing was violated; the connection must be
    /// re-established.
    #[error("Assuan protocol violation: {0}")]
    Protocol(String),

    /// A line exceeds the protocol's length limit.
    #[error("Line too long: {0} bytes")]
    LineTooLong(usize),

    /// The user canceled the operation.
    #[error("Operation canceled")]
    Canceled,

    /// The supplied passphrase was wrong.
    #[error("Bad passphrase")]
    BadPassphrase,

    /// The agent does not know the requested secret key.
    #[error("No secret key")]
    NoSecretKey,

    /// The key to be generated or imported already exists.
    #[error("Key already exists")]
    KeyAlreadyExists,

    /// A key generation parameter is invalid.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    /// Converts an agent `ERR` line into the most specific error
    /// variant.
    pub(crate) fn from_agent(err: AgentError) -> Error {
        use error::ErrorCode;
        match err.code() {
            ErrorCode::Canceled | ErrorCode::FullyCanceled =>
                Error::Canceled,
            ErrorCode::BadPassphrase => Error::BadPassphrase,
            ErrorCode::NoSecretKey => Error::NoSecretKey,
            ErrorCode::Eexist => Error::KeyAlreadyExists,
            _ => Error::Agent(err),
        }
    }
}
