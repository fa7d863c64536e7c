use serde::{Serialize, Deserialize};
use ethers::abi::Token;
use ethers::types::U256;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;
use crate::models::types::Address;

/// Yield-source integration a market is built on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Protocol {
    Erc4626 = 0,
    Compound = 1,
    Rari = 2,
    Yearn = 3,
    Aave = 4,
    Euler = 5,
    Lido = 6,
}

impl Protocol {
    pub const ALL: [Protocol; 7] = [
        Protocol::Erc4626,
        Protocol::Compound,
        Protocol::Rari,
        Protocol::Yearn,
        Protocol::Aave,
        Protocol::Euler,
        Protocol::Lido,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Erc4626 => "erc4626",
            Protocol::Compound => "compound",
            Protocol::Rari => "rari",
            Protocol::Yearn => "yearn",
            Protocol::Aave => "aave",
            Protocol::Euler => "euler",
            Protocol::Lido => "lido",
        }
    }
}

impl TryFrom<u8> for Protocol {
    type Error = EncodingError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Protocol::ALL
            .into_iter()
            .find(|p| *p as u8 == tag)
            .ok_or(EncodingError::UnknownProtocol(tag))
    }
}

impl From<Protocol> for u8 {
    fn from(protocol: Protocol) -> u8 {
        protocol as u8
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        Protocol::ALL.into_iter().find(|p| p.name() == s).ok_or(())
    }
}

/// Which side of a market an order opens or closes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    VaultInitiate,
    VaultExit,
    TokenInitiate,
    TokenExit,
}

/// An off-chain negotiated order, as exchanged between maker and taker.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub key: String,          // 32-byte identifier, hex encoded
    pub protocol: Protocol,
    pub maker: Address,
    pub underlying: Address,
    pub vault: bool,
    pub exit: bool,
    pub principal: String,    // decimal string, base units
    pub premium: String,      // decimal string, base units
    pub maturity: String,     // unix timestamp
    pub expiry: String,       // unix timestamp
}

impl Order {
    pub fn kind(&self) -> OrderKind {
        match (self.vault, self.exit) {
            (true, false) => OrderKind::VaultInitiate,
            (true, true) => OrderKind::VaultExit,
            (false, false) => OrderKind::TokenInitiate,
            (false, true) => OrderKind::TokenExit,
        }
    }
}

/// The on-chain encoding of an [`Order`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalOrder {
    pub key: [u8; 32],
    pub protocol: Protocol,
    pub maker: Address,
    pub underlying: Address,
    pub vault: bool,
    pub exit: bool,
    pub principal: U256,
    pub premium: U256,
    pub maturity: U256,
    pub expiry: U256,
}

impl CanonicalOrder {
    /// Order tuple in the field order the contract declares.
    pub fn into_token(self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.key.to_vec()),
            Token::Uint(U256::from(self.protocol as u8)),
            Token::Address(self.maker),
            Token::Address(self.underlying),
            Token::Bool(self.vault),
            Token::Bool(self.exit),
            Token::Uint(self.principal),
            Token::Uint(self.premium),
            Token::Uint(self.maturity),
            Token::Uint(self.expiry),
        ])
    }

    /// Message body for typed-data signing. Uints go out as decimal strings.
    pub fn to_message(&self) -> BTreeMap<String, Value> {
        let mut message = BTreeMap::new();
        message.insert("key".to_string(), json!(format!("0x{}", ethers::utils::hex::encode(self.key))));
        message.insert("protocol".to_string(), json!(self.protocol as u8));
        message.insert("maker".to_string(), json!(format!("{:?}", self.maker)));
        message.insert("underlying".to_string(), json!(format!("{:?}", self.underlying)));
        message.insert("vault".to_string(), json!(self.vault));
        message.insert("exit".to_string(), json!(self.exit));
        message.insert("principal".to_string(), json!(self.principal.to_string()));
        message.insert("premium".to_string(), json!(self.premium.to_string()));
        message.insert("maturity".to_string(), json!(self.maturity.to_string()));
        message.insert("expiry".to_string(), json!(self.expiry.to_string()));
        message
    }
}
