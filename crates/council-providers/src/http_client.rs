//! Thin `reqwest` wrapper shared by every HTTP-backed adapter: client
//! construction, a single retry-on-transient-failure policy, and
//! redacted error surfacing.

use std::time::Duration;

use council_core::error::{CouncilError, ProviderError};
use council_redaction::redact_error_message;
use reqwest::RequestBuilder;

/// Maximum number of attempts for a single logical call (1 initial + up to
/// 2 retries on a transient transport failure; 4xx/5xx application errors
/// are not retried here — the orchestrator owns retry policy for those).
const MAX_TRANSPORT_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub(crate) fn new() -> Result<Self, CouncilError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| transport_error("http_client", format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }

    #[must_use]
    pub(crate) fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Execute a request, retrying a bounded number of times on connection
    /// or timeout failures only (never on a received non-2xx response —
    /// that's surfaced to the caller as-is so it can map 4xx/5xx/429
    /// distinctly, per §4.1 "must not silently swallow").
    pub(crate) async fn execute_with_retry(
        &self,
        build: impl Fn() -> RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<reqwest::Response, CouncilError> {
        let mut last_err = None;
        for attempt in 1..=MAX_TRANSPORT_ATTEMPTS {
            let request = build().timeout(timeout);
            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() => {
                    return Err(ProviderError::Timeout {
                        provider: provider.to_string(),
                        duration: timeout,
                    }
                    .into());
                }
                Err(e) => {
                    last_err = Some(e);
                    if attempt < MAX_TRANSPORT_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                    }
                }
            }
        }
        Err(transport_error(
            provider,
            last_err.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}

pub(crate) fn transport_error(provider: &str, message: impl Into<String>) -> CouncilError {
    ProviderError::Transport {
        provider: provider.to_string(),
        message: redact_error_message(&message.into()),
    }
    .into()
}
