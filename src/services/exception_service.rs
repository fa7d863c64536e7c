use ethers::abi::{self, ParamType, Token};
use ethers::types::U256;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};

use crate::error::BackendFailure;
use crate::models::exception::{Exception, ProtocolError, EXCEPTION_SIGNATURE};
use crate::services::numeric::{hex_body, uint_from_json};

/// Discriminant ethers-style providers put on failed static calls.
pub const CALL_EXCEPTION: &str = "CALL_EXCEPTION";

/// Where known wallets/providers bury revert data in estimation failures.
pub const NESTED_PAYLOAD_PATHS: &[&str] = &[
    "/error/error/error/data",
    "/error/data/originalError/data",
];

/// The failure shapes different backends use for the same on-chain revert.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureShape<'a> {
    /// Provider already decoded the error arguments.
    Decoded(&'a [Value]),
    /// Raw revert data found somewhere inside a nested error chain.
    Nested(&'a str),
    /// The failure itself is the raw revert data.
    Raw(&'a str),
    Unrecognized,
}

/// Four byte selector of the `Exception` custom error.
pub fn exception_selector() -> [u8; 4] {
    let hash = Keccak256::digest(EXCEPTION_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn exception_params() -> [ParamType; 5] {
    [
        ParamType::Uint(8),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Address,
        ParamType::Address,
    ]
}

/// Turns backend failures into structured protocol exceptions.
///
/// Never fails: anything that is not this protocol's `Exception` decodes to
/// `None` so callers can fall back to the raw backend message.
#[derive(Debug, Clone)]
pub struct ExceptionDecoder {
    nested_paths: Vec<String>,
}

impl Default for ExceptionDecoder {
    fn default() -> Self {
        ExceptionDecoder {
            nested_paths: NESTED_PAYLOAD_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ExceptionDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers another JSON pointer to probe for nested revert data.
    pub fn with_path(mut self, pointer: impl Into<String>) -> Self {
        self.nested_paths.push(pointer.into());
        self
    }

    pub fn classify<'a>(&self, failure: &'a Value) -> FailureShape<'a> {
        if let Some(args) = as_decoded(failure) {
            return FailureShape::Decoded(args);
        }
        if let Some(data) = self.as_nested(failure) {
            return FailureShape::Nested(data);
        }
        if let Some(data) = as_raw(failure) {
            return FailureShape::Raw(data);
        }
        FailureShape::Unrecognized
    }

    pub fn decode(&self, failure: &Value) -> Option<Exception> {
        let decoded = match self.classify(failure) {
            FailureShape::Decoded(args) => from_args(args),
            FailureShape::Nested(data) | FailureShape::Raw(data) => decode_payload(data),
            FailureShape::Unrecognized => None,
        };
        if decoded.is_none() {
            log::debug!("no structured exception in failure: {}", failure);
        }
        decoded
    }

    pub fn decode_failure(&self, failure: &BackendFailure) -> Option<Exception> {
        self.decode(&failure.payload)
    }

    /// Decodes and looks the code up in the taxonomy.
    pub fn protocol_error(&self, failure: &Value) -> Option<ProtocolError> {
        self.decode(failure).map(ProtocolError::from)
    }

    fn as_nested<'a>(&self, failure: &'a Value) -> Option<&'a str> {
        self.nested_paths
            .iter()
            .filter_map(|path| failure.pointer(path))
            .filter_map(Value::as_str)
            .find(|data| !data.is_empty())
    }
}

/// [`ExceptionDecoder::decode`] with the default path registry.
pub fn decode(failure: &Value) -> Option<Exception> {
    ExceptionDecoder::default().decode(failure)
}

fn as_decoded(failure: &Value) -> Option<&[Value]> {
    let object = failure.as_object()?;
    if object.get("code").and_then(Value::as_str) != Some(CALL_EXCEPTION) {
        return None;
    }
    let name_matches = object.get("errorName").and_then(Value::as_str) == Some("Exception")
        || object.get("errorSignature").and_then(Value::as_str) == Some(EXCEPTION_SIGNATURE);
    if !name_matches {
        return None;
    }
    object.get("errorArgs")?.as_array().map(Vec::as_slice)
}

fn as_raw(failure: &Value) -> Option<&str> {
    failure.as_str().filter(|s| !s.is_empty())
}

fn from_args(args: &[Value]) -> Option<Exception> {
    if args.len() < 5 {
        return None;
    }
    let code = uint_from_json(&args[0]).ok()?;
    if code > U256::from(u8::MAX) {
        return None;
    }
    Some(Exception {
        code: code.as_u32() as u8,
        amount: uint_from_json(&args[1]).ok()?,
        amount_expected: uint_from_json(&args[2]).ok()?,
        address: args[3].as_str()?.parse().ok()?,
        address_expected: args[4].as_str()?.parse().ok()?,
    })
}

/// Decodes raw revert data against `Exception(uint8,uint256,uint256,address,address)`.
pub fn decode_payload(data: &str) -> Option<Exception> {
    let bytes = ethers::utils::hex::decode(hex_body(data)).ok()?;
    if bytes.len() < 4 || bytes[..4] != exception_selector() {
        return None;
    }
    let tokens = abi::decode(&exception_params(), &bytes[4..]).ok()?;
    match tokens.as_slice() {
        [Token::Uint(code), Token::Uint(amount), Token::Uint(amount_expected), Token::Address(address), Token::Address(address_expected)]
            if *code <= U256::from(u8::MAX) =>
        {
            Some(Exception {
                code: code.as_u32() as u8,
                amount: *amount,
                amount_expected: *amount_expected,
                address: *address,
                address_expected: *address_expected,
            })
        }
        _ => None,
    }
}

/// ABI-encodes an exception as a contract would revert with it.
pub fn encode_payload(exception: &Exception) -> String {
    let mut bytes = exception_selector().to_vec();
    bytes.extend(abi::encode(&[
        Token::Uint(U256::from(exception.code)),
        Token::Uint(exception.amount),
        Token::Uint(exception.amount_expected),
        Token::Address(exception.address),
        Token::Address(exception.address_expected),
    ]));
    format!("0x{}", ethers::utils::hex::encode(bytes))
}

/// The pre-decoded form of an exception, as reported for failed static calls.
pub fn decoded_failure(exception: &Exception) -> Value {
    json!({
        "code": CALL_EXCEPTION,
        "errorName": "Exception",
        "errorSignature": EXCEPTION_SIGNATURE,
        "errorArgs": [
            exception.code,
            exception.amount.to_string(),
            exception.amount_expected.to_string(),
            format!("{:?}", exception.address),
            format!("{:?}", exception.address_expected),
        ],
    })
}
