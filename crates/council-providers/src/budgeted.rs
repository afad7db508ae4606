//! Cost-accounting decorator: wraps any [`ProviderAdapter`] and feeds its
//! reported [`Usage`] into a shared per-run cost ledger, without the
//! wrapped adapter needing to know cost accounting exists (§4.6 "cost
//! accounting must not leak into adapter implementations").

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use council_core::error::CouncilError;

use crate::types::{DoctorReport, GenerateRequest, GenerateResponse, ProviderAdapter, ProviderCapabilities};

/// Cost in USD micros (1/1_000_000 USD) charged per 1000 tokens, split by
/// input/output since most providers price them differently.
#[derive(Debug, Clone, Copy)]
pub struct CostPerThousand {
    pub input_micros: u64,
    pub output_micros: u64,
}

/// Accumulates cost across every call made through a [`BudgetedAdapter`]
/// sharing this ledger, e.g. all adapters used within a single run.
#[derive(Debug, Default)]
pub struct CostLedger {
    total_micros: AtomicU64,
}

impl CostLedger {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, cost: &CostPerThousand, input_tokens: u64, output_tokens: u64) {
        let micros = (input_tokens * cost.input_micros + output_tokens * cost.output_micros)
            / 1000;
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Total spend so far, in USD.
    #[must_use]
    pub fn total_usd(&self) -> f64 {
        self.total_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }
}

/// Decorates a provider adapter with per-call cost accounting against a
/// shared [`CostLedger`]. Delegates every trait method to the inner
/// adapter unchanged except `generate`, which additionally records usage.
pub struct BudgetedAdapter {
    inner: Arc<dyn ProviderAdapter>,
    cost: CostPerThousand,
    ledger: Arc<CostLedger>,
}

impl BudgetedAdapter {
    #[must_use]
    pub fn new(inner: Arc<dyn ProviderAdapter>, cost: CostPerThousand, ledger: Arc<CostLedger>) -> Self {
        Self { inner, cost, ledger }
    }
}

#[async_trait]
impl ProviderAdapter for BudgetedAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.inner.capabilities()
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CouncilError> {
        let response = self.inner.generate(request).await?;
        self.ledger.record(
            &self.cost,
            response.usage.input_tokens,
            response.usage.output_tokens,
        );
        Ok(response)
    }

    fn supports(&self, capability: &str) -> bool {
        self.inner.supports(capability)
    }

    async fn doctor(&self) -> DoctorReport {
        self.inner.doctor().await
    }
}
