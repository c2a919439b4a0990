//! Error taxonomy for chaincode invocations.
//!
//! Every failure is terminal for the current call. The display text of each
//! variant is what the host returns to the submitting client, so the wording
//! of the routing, arity and decoding variants is kept stable for existing
//! clients that match on it.

use thiserror::Error;

use crate::ledger::LedgerError;

pub type ChaincodeResult<T> = Result<T, ChaincodeError>;

#[derive(Debug, Error)]
pub enum ChaincodeError {
    /// The function name is not one of the chaincode's routed functions.
    #[error("Invalid Smart Contract function name:{function}")]
    UnknownFunction { function: String },

    /// Wrong number of positional arguments.
    #[error("Incorrect number of arguments, expecting {expected}. Args given:{given}")]
    IncorrectArgumentCount { expected: usize, given: usize },

    #[error("Error decoding base64:{0}")]
    Base64Decode(String),

    #[error("Error unmarshallling! Not valid JSON:{0}")]
    InvalidJson(String),

    /// A blob stored under a well-known key could not be parsed.
    #[error("state under key '{key}' is not valid JSON: {message}")]
    CorruptState { key: String, message: String },

    #[error("failed to encode record: {0}")]
    Encode(String),

    /// Host read failure on a get path.
    #[error("Message could not be found behind key:{key}")]
    NotReadable {
        key: String,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Storage(#[from] LedgerError),

    #[error("Unknown chaincode: {name}")]
    UnknownChaincode { name: String },
}

impl ChaincodeError {
    /// Classify a ledger error raised while serving a get request.
    ///
    /// Host read failures are reported by key; namespace violations and
    /// write failures pass through unchanged.
    pub fn from_read(key: &str, err: LedgerError) -> Self {
        match err {
            LedgerError::Read { .. } => ChaincodeError::NotReadable {
                key: key.to_string(),
                source: err,
            },
            other => ChaincodeError::Storage(other),
        }
    }
}
