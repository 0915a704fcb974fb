use std::fmt::Debug;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{trace, warn};

use super::metrics::RequestMetrics;
use super::types::{ApiError, ApiResponse};

/// Status line and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The request never produced a response (DNS, connect, TLS, reset, body read...).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Single GET, no retry. The only thing that touches the network.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, TransportFailure> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportFailure(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportFailure> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

/// Exponential backoff between transport retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Same bound, no waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (0-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(retry as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    pub fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}

/// Rate limited, retrying GET client shared by every stats API call.
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
    limiter: DefaultDirectRateLimiter,
    retry: RetryPolicy,
    pub metrics: Arc<RequestMetrics>,
}

impl Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("transport", &self.transport)
            .field("retry", &self.retry)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl RemoteClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        requests_per_second: NonZeroU32,
        metrics: Arc<RequestMetrics>,
    ) -> Self {
        Self {
            transport,
            limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
            retry,
            metrics,
        }
    }

    /// GET `url`, retrying transport failures. HTTP statuses are returned as-is.
    pub async fn fetch(&self, url: &str) -> ApiResponse<RawResponse> {
        let mut retries_done = 0;

        loop {
            self.limiter.until_ready().await;
            self.metrics.inc();
            trace!(url, attempt = retries_done + 1, "🛰️ GET");

            match self.transport.get(url).await {
                Ok(res) => return Ok(res),
                Err(e) => {
                    self.metrics.inc_failure();

                    if !self.retry.should_retry(retries_done) {
                        return Err(ApiError::Transport {
                            attempts: retries_done + 1,
                            message: e.0,
                        });
                    }

                    let delay = self.retry.delay_for_retry(retries_done);
                    warn!(
                        error = %e,
                        url,
                        attempt = retries_done + 1,
                        delay_ms = delay.as_millis() as u64,
                        "🛰️ ⚠️ Request failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    retries_done += 1;
                }
            }
        }
    }

    /// GET `url` and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResponse<T> {
        let res = self.fetch(url).await?;

        if !(200..300).contains(&res.status) {
            return Err(ApiError::Status(res.status));
        }

        Ok(serde_json::from_str(&res.body)?)
    }
}
