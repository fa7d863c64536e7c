pub mod provider;

use async_trait::async_trait;
use ethers::types::U256;

use crate::error::BackendFailure;
use crate::models::types::{CallOverrides, PendingCall, TransactionHandle};

/// The network side of a contract call.
///
/// Failures come back as [`BackendFailure`] with the backend's structured
/// error preserved in the payload.
#[async_trait]
pub trait ContractBackend: Send + Sync {
    /// Gas estimate for `call`.
    async fn estimate(&self, call: &PendingCall) -> Result<U256, BackendFailure>;

    /// Read-only dry run; surfaces reverts without spending gas.
    async fn simulate(&self, call: &PendingCall) -> Result<(), BackendFailure>;

    /// Sends the state-changing transaction.
    async fn submit(
        &self,
        call: &PendingCall,
        overrides: &CallOverrides,
    ) -> Result<TransactionHandle, BackendFailure>;
}
