use thiserror::Error;

use crate::base45::Base45Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Malformed input at any layer of the pipeline.
    #[error("{0}")]
    Format(String),
    /// A payload claim key with no entry in the CWT or hcert registries.
    #[error("unrecognized claim key {0}")]
    UnrecognizedClaim(i128),
    /// A certificate schema release other than the pinned one.
    #[error("unsupported hcert version {0}")]
    UnsupportedVersion(String),
}

impl DecodeError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        DecodeError::Format(message.into())
    }
}

impl From<Base45Error> for DecodeError {
    fn from(err: Base45Error) -> Self {
        DecodeError::Format(err.to_string())
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Format(format!("inflate failed: {}", err))
    }
}

impl From<serde_cbor::Error> for DecodeError {
    fn from(err: serde_cbor::Error) -> Self {
        DecodeError::Format(format!("malformed CBOR: {}", err))
    }
}
