use crate::error::MalformedSignatureError;
use crate::models::types::{Hash, Signature};
use crate::services::numeric::hex_body;

const SIGNATURE_LENGTH: usize = 65;

/// Splits a 65-byte `r || s || v` hex signature into its components.
///
/// Backends that return the raw recovery bit (0/1) get `v` lifted into
/// `{27, 28}`; the verifying contract only accepts the latter.
pub fn split(signature: &str) -> Result<Signature, MalformedSignatureError> {
    let bytes = ethers::utils::hex::decode(hex_body(signature))
        .map_err(|_| MalformedSignatureError::InvalidHex)?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(MalformedSignatureError::Length(bytes.len()));
    }

    let mut v = bytes[64];
    if v < 27 {
        v += 27;
    }

    Ok(Signature {
        v,
        r: Hash::from_slice(&bytes[..32]),
        s: Hash::from_slice(&bytes[32..64]),
    })
}
