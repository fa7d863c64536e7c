use ethers::types::U256;

use crate::backend::ContractBackend;
use crate::config::GasMargins;
use crate::error::BackendFailure;
use crate::models::types::{CallOverrides, PendingCall, TransactionHandle};

/// Wraps contract submissions with gas estimation and an optional dry run.
///
/// Never retries and never rewraps backend failures: an estimation revert
/// reaches the caller exactly as the backend reported it, so the exception
/// decoder can still read it.
pub struct GasSafetyExecutor<B> {
    backend: B,
    margins: GasMargins,
}

impl<B: ContractBackend> GasSafetyExecutor<B> {
    pub fn new(backend: B) -> Self {
        Self::with_margins(backend, GasMargins::default())
    }

    pub fn with_margins(backend: B, margins: GasMargins) -> Self {
        GasSafetyExecutor { backend, margins }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn margins(&self) -> &GasMargins {
        &self.margins
    }

    /// Gas limit to submit with for an estimate of `estimate`.
    pub fn buffered_limit(&self, call: &PendingCall, estimate: U256) -> U256 {
        estimate.saturating_add(self.margins.margin_for(&call.protocols))
    }

    pub async fn execute(
        &self,
        call: &PendingCall,
        overrides: &CallOverrides,
        optimize: bool,
    ) -> Result<TransactionHandle, BackendFailure> {
        if overrides.gas_limit.is_some() {
            if optimize {
                log::debug!("dry running {} before submission", call.method);
                self.backend.simulate(call).await?;
            }
            log::info!("submitting {} with caller gas limit", call.method);
            return self.backend.submit(call, overrides).await;
        }

        let estimate = match self.backend.estimate(call).await {
            Ok(estimate) => estimate,
            Err(failure) => {
                log::warn!("gas estimation for {} failed: {}", call.method, failure);
                return Err(failure);
            }
        };
        let gas_limit = self.buffered_limit(call, estimate);
        log::info!(
            "submitting {} with gas limit {} (estimate {})",
            call.method, gas_limit, estimate
        );
        self.backend.submit(call, &overrides.with_gas_limit(gas_limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_GAS_MARGIN, EULER_GAS_MARGIN};
    use crate::models::order::Protocol;
    use crate::models::types::{Address, Hash};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Recorded {
        Estimate,
        Simulate,
        Submit(CallOverrides),
    }

    struct MockBackend {
        estimate: Result<U256, BackendFailure>,
        simulate: Result<(), BackendFailure>,
        calls: Mutex<Vec<Recorded>>,
    }

    impl MockBackend {
        fn new(estimate: Result<U256, BackendFailure>) -> Self {
            MockBackend {
                estimate,
                simulate: Ok(()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContractBackend for MockBackend {
        async fn estimate(&self, _call: &PendingCall) -> Result<U256, BackendFailure> {
            self.calls.lock().unwrap().push(Recorded::Estimate);
            self.estimate.clone()
        }

        async fn simulate(&self, _call: &PendingCall) -> Result<(), BackendFailure> {
            self.calls.lock().unwrap().push(Recorded::Simulate);
            self.simulate.clone()
        }

        async fn submit(
            &self,
            _call: &PendingCall,
            overrides: &CallOverrides,
        ) -> Result<TransactionHandle, BackendFailure> {
            self.calls.lock().unwrap().push(Recorded::Submit(overrides.clone()));
            Ok(TransactionHandle { hash: Hash::repeat_byte(0x99) })
        }
    }

    fn call(protocols: Vec<Protocol>) -> PendingCall {
        PendingCall::new("initiate", vec![], protocols)
    }

    #[tokio::test]
    async fn estimates_and_adds_default_margin() {
        let executor = GasSafetyExecutor::new(MockBackend::new(Ok(U256::from(100_000u64))));
        let handle = executor
            .execute(&call(vec![Protocol::Compound]), &CallOverrides::default(), false)
            .await
            .unwrap();
        assert_eq!(handle.hash, Hash::repeat_byte(0x99));

        let expected = CallOverrides::default().with_gas_limit(U256::from(100_000 + DEFAULT_GAS_MARGIN));
        assert_eq!(executor.backend().recorded(), vec![Recorded::Estimate, Recorded::Submit(expected)]);
    }

    #[tokio::test]
    async fn euler_gets_the_larger_margin() {
        let executor = GasSafetyExecutor::new(MockBackend::new(Ok(U256::from(100_000u64))));
        executor
            .execute(&call(vec![Protocol::Compound, Protocol::Euler]), &CallOverrides::default(), false)
            .await
            .unwrap();
        match executor.backend().recorded().last() {
            Some(Recorded::Submit(overrides)) => {
                assert_eq!(overrides.gas_limit, Some(U256::from(100_000 + EULER_GAS_MARGIN)))
            }
            other => panic!("expected a submission, got {:?}", other),
        }
    }

    #[test]
    fn buffered_limit_never_below_estimate() {
        let executor = GasSafetyExecutor::new(MockBackend::new(Ok(U256::zero())));
        for protocol in Protocol::ALL {
            let c = call(vec![protocol]);
            for estimate in [U256::zero(), U256::from(21_000u64), U256::MAX] {
                assert!(executor.buffered_limit(&c, estimate) >= estimate);
            }
        }
    }

    #[tokio::test]
    async fn keeps_other_user_overrides() {
        let executor = GasSafetyExecutor::new(MockBackend::new(Ok(U256::from(1_000u64))));
        let overrides = CallOverrides {
            gas_price: Some(U256::from(7u64)),
            from: Some(Address::repeat_byte(0x33)),
            ..Default::default()
        };
        executor.execute(&call(vec![]), &overrides, false).await.unwrap();
        match executor.backend().recorded().last() {
            Some(Recorded::Submit(sent)) => {
                assert_eq!(sent.gas_price, Some(U256::from(7u64)));
                assert_eq!(sent.from, Some(Address::repeat_byte(0x33)));
                assert_eq!(sent.gas_limit, Some(U256::from(1_000 + DEFAULT_GAS_MARGIN)));
            }
            other => panic!("expected a submission, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn estimation_failure_propagates_untouched() {
        let failure = BackendFailure::new(
            "cannot estimate gas",
            json!({"error": {"error": {"error": {"data": "0xdeadbeef"}}}}),
        );
        let executor = GasSafetyExecutor::new(MockBackend::new(Err(failure.clone())));
        let err = executor
            .execute(&call(vec![Protocol::Aave]), &CallOverrides::default(), true)
            .await
            .unwrap_err();
        assert_eq!(err, failure);
        assert_eq!(executor.backend().recorded(), vec![Recorded::Estimate]);
    }

    #[tokio::test]
    async fn explicit_gas_limit_skips_estimation() {
        let executor = GasSafetyExecutor::new(MockBackend::new(Ok(U256::from(1u64))));
        let overrides = CallOverrides::default().with_gas_limit(U256::from(500_000u64));
        executor.execute(&call(vec![Protocol::Euler]), &overrides, false).await.unwrap();
        assert_eq!(executor.backend().recorded(), vec![Recorded::Submit(overrides)]);
    }

    #[tokio::test]
    async fn explicit_gas_limit_with_optimize_dry_runs_first() {
        let executor = GasSafetyExecutor::new(MockBackend::new(Ok(U256::from(1u64))));
        let overrides = CallOverrides::default().with_gas_limit(U256::from(500_000u64));
        executor.execute(&call(vec![]), &overrides, true).await.unwrap();
        assert_eq!(
            executor.backend().recorded(),
            vec![Recorded::Simulate, Recorded::Submit(overrides)]
        );
    }

    #[tokio::test]
    async fn failed_dry_run_never_submits() {
        let mut backend = MockBackend::new(Ok(U256::from(1u64)));
        backend.simulate = Err(BackendFailure::new("reverted", json!("0x1234")));
        let executor = GasSafetyExecutor::new(backend);
        let overrides = CallOverrides::default().with_gas_limit(U256::from(500_000u64));
        let err = executor.execute(&call(vec![]), &overrides, true).await.unwrap_err();
        assert_eq!(err.payload, json!("0x1234"));
        assert_eq!(executor.backend().recorded(), vec![Recorded::Simulate]);
    }
}
