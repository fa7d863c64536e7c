use ethers::abi::Token;
use ethers::types::U256;

use crate::error::EncodingError;
use crate::models::order::{CanonicalOrder, Order};
use crate::models::types::{PendingCall, Signature};
use crate::services::numeric::{hex_body, parse_uint};

/// Maps an order to its on-chain encoding. Pure; never touches the network.
pub fn canonicalize(order: &Order) -> Result<CanonicalOrder, EncodingError> {
    Ok(CanonicalOrder {
        key: decode_key(&order.key)?,
        protocol: order.protocol,
        maker: order.maker,
        underlying: order.underlying,
        vault: order.vault,
        exit: order.exit,
        principal: parse_uint(&order.principal)?,
        premium: parse_uint(&order.premium)?,
        maturity: parse_uint(&order.maturity)?,
        expiry: parse_uint(&order.expiry)?,
    })
}

fn decode_key(key: &str) -> Result<[u8; 32], EncodingError> {
    let bytes = ethers::utils::hex::decode(hex_body(key))
        .map_err(|_| EncodingError::InvalidHex(key.to_string()))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| EncodingError::KeyLength(bytes.len()))
}

/// `initiate(Order[], uint256[], Components[])`
pub fn initiate(
    orders: &[CanonicalOrder],
    amounts: &[U256],
    signatures: &[Signature],
) -> PendingCall {
    fill_call("initiate", orders, amounts, signatures)
}

/// `exit(Order[], uint256[], Components[])`
pub fn exit(orders: &[CanonicalOrder], amounts: &[U256], signatures: &[Signature]) -> PendingCall {
    fill_call("exit", orders, amounts, signatures)
}

/// `cancel(Order[])`
pub fn cancel(orders: &[CanonicalOrder]) -> PendingCall {
    PendingCall::new(
        "cancel",
        vec![order_array(orders)],
        orders.iter().map(|o| o.protocol).collect(),
    )
}

fn fill_call(
    method: &str,
    orders: &[CanonicalOrder],
    amounts: &[U256],
    signatures: &[Signature],
) -> PendingCall {
    let args = vec![
        order_array(orders),
        Token::Array(amounts.iter().map(|a| Token::Uint(*a)).collect()),
        Token::Array(signatures.iter().map(|s| s.into_token()).collect()),
    ];
    PendingCall::new(method, args, orders.iter().map(|o| o.protocol).collect())
}

fn order_array(orders: &[CanonicalOrder]) -> Token {
    Token::Array(orders.iter().cloned().map(CanonicalOrder::into_token).collect())
}
