use ethers::types::U256;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::models::order::Protocol;
use crate::models::types::Address;

pub const DEFAULT_GAS_MARGIN: u64 = 50_000;
/// Euler markets deterministically burn more gas than `eth_estimateGas` reports.
pub const EULER_GAS_MARGIN: u64 = 250_000;

/// Additive gas margins, selected by protocol tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMargins {
    pub default: U256,
    pub per_protocol: BTreeMap<Protocol, U256>,
}

impl Default for GasMargins {
    fn default() -> Self {
        let mut per_protocol = BTreeMap::new();
        per_protocol.insert(Protocol::Euler, U256::from(EULER_GAS_MARGIN));
        GasMargins {
            default: U256::from(DEFAULT_GAS_MARGIN),
            per_protocol,
        }
    }
}

impl GasMargins {
    pub fn margin(&self, protocol: Protocol) -> U256 {
        self.per_protocol.get(&protocol).copied().unwrap_or(self.default)
    }

    /// Largest margin among `protocols`, or the default when empty.
    pub fn margin_for(&self, protocols: &[Protocol]) -> U256 {
        protocols
            .iter()
            .map(|p| self.margin(*p))
            .max()
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub chain_id: Option<u64>,
    pub verifying_contract: Option<Address>,
    pub rpc_url: Option<String>,
    pub gas_margins: GasMargins,
}

impl Config {
    /// Reads the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut gas_margins = GasMargins::default();
        if let Some(margin) = parse_var::<u64>(&lookup, "GAS_MARGIN")? {
            gas_margins.default = U256::from(margin);
        }
        for protocol in Protocol::ALL {
            let key = format!("GAS_MARGIN_{}", protocol.name().to_uppercase());
            if let Some(margin) = parse_var::<u64>(&lookup, &key)? {
                gas_margins.per_protocol.insert(protocol, U256::from(margin));
            }
        }
        if gas_margins.margin(Protocol::Euler) <= gas_margins.default {
            let key = match lookup("GAS_MARGIN_EULER") {
                Some(_) => "GAS_MARGIN_EULER",
                None => "GAS_MARGIN",
            };
            return Err(ConfigurationError::InvalidValue {
                key: key.to_string(),
                value: lookup(key).unwrap_or_default(),
            });
        }

        Ok(Config {
            chain_id: parse_var(&lookup, "CHAIN_ID")?,
            verifying_contract: parse_var(&lookup, "SWIVEL_ADDRESS")?,
            rpc_url: lookup("RPC_URL").filter(|url| !url.is_empty()),
            gas_margins,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigurationError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidValue {
                key: key.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.chain_id, None);
        assert_eq!(config.verifying_contract, None);
        assert_eq!(config.gas_margins, GasMargins::default());
    }

    #[test]
    fn reads_signing_parameters() {
        let config = Config::from_lookup(lookup(&[
            ("CHAIN_ID", "42"),
            ("SWIVEL_ADDRESS", "0x3b983B701406010866bD68331aAed374fb9f50C9"),
            ("RPC_URL", "http://localhost:8545"),
        ]))
        .unwrap();
        assert_eq!(config.chain_id, Some(42));
        assert!(config.verifying_contract.is_some());
        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
    }

    #[test]
    fn malformed_values_are_configuration_errors() {
        let err = Config::from_lookup(lookup(&[("CHAIN_ID", "mainnet")])).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidValue { key: "CHAIN_ID".to_string(), value: "mainnet".to_string() }
        );
    }

    #[test]
    fn per_protocol_margin_overrides() {
        let config = Config::from_lookup(lookup(&[("GAS_MARGIN", "10000"), ("GAS_MARGIN_AAVE", "90000")])).unwrap();
        assert_eq!(config.gas_margins.margin(Protocol::Compound), U256::from(10_000u64));
        assert_eq!(config.gas_margins.margin(Protocol::Aave), U256::from(90_000u64));
        assert_eq!(config.gas_margins.margin(Protocol::Euler), U256::from(EULER_GAS_MARGIN));
    }

    #[test]
    fn euler_margin_must_stay_above_default() {
        let err = Config::from_lookup(lookup(&[("GAS_MARGIN", "400000")])).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidValue { key: "GAS_MARGIN".to_string(), value: "400000".to_string() }
        );

        let err = Config::from_lookup(lookup(&[("GAS_MARGIN_EULER", "50000")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { ref key, .. } if key == "GAS_MARGIN_EULER"));

        let config =
            Config::from_lookup(lookup(&[("GAS_MARGIN", "400000"), ("GAS_MARGIN_EULER", "600000")])).unwrap();
        assert!(config.gas_margins.margin(Protocol::Euler) > config.gas_margins.default);
    }

    #[test]
    fn euler_margin_is_strictly_larger_by_default() {
        let margins = GasMargins::default();
        for protocol in Protocol::ALL {
            if protocol != Protocol::Euler {
                assert!(margins.margin(Protocol::Euler) > margins.margin(protocol));
            }
        }
        assert_eq!(margins.margin_for(&[Protocol::Compound, Protocol::Euler]), U256::from(EULER_GAS_MARGIN));
        assert_eq!(margins.margin_for(&[]), U256::from(DEFAULT_GAS_MARGIN));
    }
}
