use serde::{Deserialize, Serialize};
use ethers::abi::Token;
use ethers::types::{H160, H256, U256};

use crate::models::order::Protocol;

pub type Address = H160;
pub type Hash = H256;
pub type Amount = U256;

/// Binding context for typed-data signatures.
///
/// Name and version are fixed per process, chain id and verifying contract
/// come from the caller. The same order signed under two domains yields two
/// unrelated signatures.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

/// A signature split into its `(v, r, s)` components, with `v` in `{27, 28}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub v: u8,
    pub r: Hash,
    pub s: Hash,
}

impl Signature {
    /// Packs back to the 65-byte `r || s || v` layout.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(self.r.as_bytes());
        out[32..64].copy_from_slice(self.s.as_bytes());
        out[64] = self.v;
        out
    }

    /// The `(uint8 v, bytes32 r, bytes32 s)` components tuple.
    pub fn into_token(self) -> Token {
        Token::Tuple(vec![
            Token::Uint(U256::from(self.v)),
            Token::FixedBytes(self.r.as_bytes().to_vec()),
            Token::FixedBytes(self.s.as_bytes().to_vec()),
        ])
    }
}

impl From<Signature> for ethers::types::Signature {
    fn from(sig: Signature) -> Self {
        ethers::types::Signature {
            r: U256::from_big_endian(sig.r.as_bytes()),
            s: U256::from_big_endian(sig.s.as_bytes()),
            v: sig.v as u64,
        }
    }
}

/// User-supplied transaction overrides. Unset fields are left to the backend.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallOverrides {
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
    pub nonce: Option<U256>,
    pub from: Option<Address>,
}

impl CallOverrides {
    /// Same overrides with the gas limit replaced; everything else is kept.
    pub fn with_gas_limit(&self, gas_limit: U256) -> Self {
        CallOverrides {
            gas_limit: Some(gas_limit),
            ..self.clone()
        }
    }
}

/// A contract method invocation that has not been sent yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub method: String,
    pub args: Vec<Token>,
    /// Protocol tags of every market the call touches; drives the gas margin.
    pub protocols: Vec<Protocol>,
}

impl PendingCall {
    pub fn new(method: impl Into<String>, args: Vec<Token>, protocols: Vec<Protocol>) -> Self {
        PendingCall {
            method: method.into(),
            args,
            protocols,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHandle {
    pub hash: Hash,
}
