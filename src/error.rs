use serde_json::Value;
use thiserror::Error;

use crate::models::exception::ProtocolError;

/// Malformed input to canonicalization. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("order key is not valid hex: {0}")]
    InvalidHex(String),
    #[error("order key must be 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("not a decimal integer: {0:?}")]
    NotNumeric(String),
    #[error("fractional value not allowed: {0}")]
    Fractional(String),
    #[error("negative value not allowed: {0}")]
    Negative(String),
    #[error("value does not fit in 256 bits: {0}")]
    Overflow(String),
    #[error("unknown protocol tag {0}")]
    UnknownProtocol(u8),
    #[error("typed data encoding failed: {0}")]
    TypedData(String),
}

/// Required signing or runtime parameters are missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("chain id is required for signing")]
    MissingChainId,
    #[error("verifying contract address is required for signing")]
    MissingVerifyingContract,
    #[error("{key} is required")]
    Missing { key: String },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSignatureError {
    #[error("signature is not valid hex")]
    InvalidHex,
    #[error("signature must be 65 bytes, got {0}")]
    Length(usize),
}

/// Opaque failure from the wallet or node layer.
///
/// `payload` keeps the backend's structured failure exactly as reported so
/// the exception decoder can dig the revert data out of it later.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct BackendFailure {
    pub message: String,
    pub payload: Value,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>, payload: Value) -> Self {
        BackendFailure {
            message: message.into(),
            payload,
        }
    }

    /// A failure with no structured payload at all.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, Value::Null)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    MalformedSignature(#[from] MalformedSignatureError),
    #[error(transparent)]
    Backend(#[from] BackendFailure),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
