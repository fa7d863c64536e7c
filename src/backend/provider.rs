// backend/provider.rs
use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::contract::{Contract, ContractCall, ContractError};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::U256;
use serde_json::Value;
use std::sync::Arc;

use crate::backend::ContractBackend;
use crate::config::Config;
use crate::error::{BackendFailure, ConfigurationError};
use crate::models::types::{Address, CallOverrides, PendingCall, TransactionHandle};
use crate::services::exception_service::{decode_payload, decoded_failure};

pub fn create_provider(config: &Config) -> Result<Provider<Http>, ConfigurationError> {
    let rpc_url = config.rpc_url.as_deref().ok_or_else(|| ConfigurationError::Missing {
        key: "RPC_URL".to_string(),
    })?;
    Provider::<Http>::try_from(rpc_url).map_err(|_| ConfigurationError::InvalidValue {
        key: "RPC_URL".to_string(),
        value: rpc_url.to_string(),
    })
}

/// [`ContractBackend`] over an `ethers` contract binding.
pub struct EthersBackend<M> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> EthersBackend<M> {
    pub fn new(address: Address, abi: Abi, client: Arc<M>) -> Self {
        EthersBackend {
            contract: Contract::new(address, abi, client),
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    fn call(&self, call: &PendingCall) -> Result<ContractCall<M, Token>, BackendFailure> {
        self.contract
            .method::<Token, Token>(&call.method, Token::Tuple(call.args.clone()))
            .map_err(|e| BackendFailure::message(format!("{}: {}", call.method, e)))
    }
}

fn apply_overrides<M: Middleware>(
    mut call: ContractCall<M, Token>,
    overrides: &CallOverrides,
) -> ContractCall<M, Token> {
    if let Some(gas) = overrides.gas_limit {
        call = call.gas(gas);
    }
    if let Some(gas_price) = overrides.gas_price {
        call = call.gas_price(gas_price);
    }
    if let Some(value) = overrides.value {
        call = call.value(value);
    }
    if let Some(nonce) = overrides.nonce {
        call = call.nonce(nonce);
    }
    if let Some(from) = overrides.from {
        call = call.from(from);
    }
    call
}

/// Estimation and submission reverts carry the raw revert data.
fn raw_failure<M: Middleware>(err: ContractError<M>) -> BackendFailure {
    let payload = match err.as_revert() {
        Some(data) => Value::String(format!("0x{}", ethers::utils::hex::encode(data))),
        None => Value::Null,
    };
    BackendFailure::new(err.to_string(), payload)
}

/// Static-call reverts are decoded up front when they are ours.
fn simulation_failure<M: Middleware>(err: ContractError<M>) -> BackendFailure {
    let payload = match err.as_revert() {
        Some(data) => {
            let raw = format!("0x{}", ethers::utils::hex::encode(data));
            match decode_payload(&raw) {
                Some(exception) => decoded_failure(&exception),
                None => Value::String(raw),
            }
        }
        None => Value::Null,
    };
    BackendFailure::new(err.to_string(), payload)
}

#[async_trait]
impl<M: Middleware + 'static> ContractBackend for EthersBackend<M> {
    async fn estimate(&self, call: &PendingCall) -> Result<U256, BackendFailure> {
        self.call(call)?.estimate_gas().await.map_err(raw_failure)
    }

    async fn simulate(&self, call: &PendingCall) -> Result<(), BackendFailure> {
        self.call(call)?.call().await.map_err(simulation_failure)?;
        Ok(())
    }

    async fn submit(
        &self,
        call: &PendingCall,
        overrides: &CallOverrides,
    ) -> Result<TransactionHandle, BackendFailure> {
        let call = apply_overrides(self.call(call)?, overrides);
        let pending = call.send().await.map_err(raw_failure)?;
        Ok(TransactionHandle { hash: *pending })
    }
}
