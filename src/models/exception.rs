use serde::Serialize;
use std::fmt;

use crate::models::types::{Address, Amount};

/// Human readable signature of the protocol's single custom error.
pub const EXCEPTION_SIGNATURE: &str = "Exception(uint8,uint256,uint256,address,address)";

/// Structured decode of an `Exception` revert.
///
/// Which fields carry data depends on `code`; unused ones are zero values.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exception {
    pub code: u8,
    pub amount: Amount,
    pub amount_expected: Amount,
    pub address: Address,
    pub address_expected: Address,
}

/// How a taxonomy entry turns an exception into text.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Fixed text only.
    Plain,
    /// Text followed by `amount` against `amount_expected`.
    Amounts,
    /// Text followed by `amount` as a unix timestamp.
    Timestamp,
    /// Text followed by `address`.
    Address,
    /// Text followed by `address` against `address_expected`.
    Addresses,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub code: u8,
    pub name: &'static str,
    pub text: &'static str,
    pub template: Template,
}

const fn entry(code: u8, name: &'static str, text: &'static str, template: Template) -> ExceptionInfo {
    ExceptionInfo { code, name, text, template }
}

/// Codes emitted by the deployed contracts. Newer deployments may emit codes
/// missing here.
pub static EXCEPTIONS: &[ExceptionInfo] = &[
    entry(0, "InvalidSignature", "order signature does not recover to the maker", Template::Addresses),
    entry(1, "ContractPaused", "contract is paused", Template::Plain),
    entry(2, "OrderExpired", "order expired", Template::Timestamp),
    entry(3, "OrderCancelled", "order has been cancelled", Template::Plain),
    entry(4, "VolumeExceeded", "fill exceeds the remaining order volume", Template::Amounts),
    entry(5, "InsufficientPremium", "premium below the order's quoted rate", Template::Amounts),
    entry(6, "MarketPaused", "market is paused", Template::Address),
    entry(7, "MarketNotMatured", "market has not reached maturity", Template::Timestamp),
    entry(8, "MarketMatured", "market has already matured", Template::Timestamp),
    entry(9, "MarketExists", "market already exists for underlying", Template::Address),
    entry(10, "MarketNotFound", "no market exists for underlying", Template::Address),
    entry(11, "TransferFailed", "token transfer failed", Template::Amounts),
    entry(12, "MintFailed", "zcToken mint failed", Template::Amounts),
    entry(13, "BurnFailed", "zcToken burn failed", Template::Amounts),
    entry(14, "DepositFailed", "deposit into the yield source failed", Template::Amounts),
    entry(15, "WithdrawFailed", "withdrawal from the yield source failed", Template::Amounts),
    entry(16, "InsufficientBalance", "insufficient notional balance", Template::Amounts),
    entry(17, "Unauthorized", "sender is not authorized", Template::Addresses),
    entry(18, "OrderFilled", "order has already been filled", Template::Plain),
    entry(19, "InvalidProtocol", "order protocol does not match the market", Template::Amounts),
    entry(20, "WithdrawalNotScheduled", "withdrawal was not scheduled", Template::Address),
    entry(21, "WithdrawalOnHold", "withdrawal is still on hold", Template::Timestamp),
    entry(22, "FeeChangeNotScheduled", "fee change was not scheduled", Template::Plain),
    entry(23, "FeeTooHigh", "fee exceeds the allowed maximum", Template::Amounts),
    entry(24, "ApprovalFailed", "token approval failed", Template::Address),
    entry(25, "InvalidMaturity", "maturity does not match the market", Template::Amounts),
];

pub fn lookup(code: u8) -> Option<&'static ExceptionInfo> {
    EXCEPTIONS.iter().find(|info| info.code == code)
}

/// Renders the message for `template` with the exception's payload.
pub fn render(template: Template, text: &str, exception: &Exception) -> String {
    match template {
        Template::Plain => text.to_string(),
        Template::Amounts => format!(
            "{}: got {}, expected {}",
            text, exception.amount, exception.amount_expected
        ),
        Template::Timestamp => format!("{} (at {})", text, exception.amount),
        Template::Address => format!("{}: {:?}", text, exception.address),
        Template::Addresses => format!(
            "{}: got {:?}, expected {:?}",
            text, exception.address, exception.address_expected
        ),
    }
}

/// A decoded on-chain revert, ready for display.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub exception: Exception,
    pub name: Option<&'static str>,
    pub message: Option<String>,
}

impl From<Exception> for ProtocolError {
    fn from(exception: Exception) -> Self {
        match lookup(exception.code) {
            Some(info) => ProtocolError {
                exception,
                name: Some(info.name),
                message: Some(render(info.template, info.text, &exception)),
            },
            None => ProtocolError {
                exception,
                name: None,
                message: None,
            },
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.name, &self.message) {
            (Some(name), Some(message)) => write!(f, "{}: {}", name, message),
            (Some(name), None) => write!(f, "{}", name),
            _ => write!(f, "exception code {}", self.exception.code),
        }
    }
}

impl std::error::Error for ProtocolError {}
