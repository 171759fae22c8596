//! HTTP client for the NER service
//!
//! The service is an optional collaborator. A failed liveness probe or an
//! exhausted retry marks the client unavailable; callers check
//! [`NerClient::is_available`] and degrade to an empty result instead of
//! failing the scan. Transient errors are retried with a fixed delay; a 404
//! is never retried.

use super::models::{NerEntity, NerRequest, NerResponse};
use crate::config::NerConfig;
use crate::domain::NerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// NER service client
pub struct NerClient {
    client: reqwest::Client,
    config: NerConfig,
    available: AtomicBool,
}

impl NerClient {
    /// Creates a client with the configured per-call timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: NerConfig) -> Result<Self, NerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NerError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            available: AtomicBool::new(false),
        })
    }

    /// Probes `GET {url}/health` and records the outcome
    ///
    /// Returns the resulting availability. Called once at startup; a probe
    /// failure leaves the client permanently degraded until re-probed.
    pub async fn probe(&self) -> bool {
        let health_url = format!("{}/health", self.config.url.trim_end_matches('/'));
        let available = match self.client.get(&health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(
                    url = %health_url,
                    error = %e,
                    "NER service liveness probe failed, NER detection disabled"
                );
                false
            }
        };
        self.available.store(available, Ordering::Relaxed);
        if available {
            tracing::info!(url = %self.config.url, "NER service available");
        }
        available
    }

    /// Whether the service is believed reachable
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Marks the service unavailable after an in-flight failure
    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::Relaxed);
    }

    /// Upper bound on samples posted per call
    pub fn max_samples(&self) -> usize {
        self.config.max_samples
    }

    /// Posts samples and returns one entity list per sample
    ///
    /// Retries transient failures up to `retry_attempts` with a fixed delay.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or immediately for
    /// non-retryable failures (404, malformed response).
    pub async fn recognize(&self, samples: &[String]) -> Result<Vec<Vec<NerEntity>>, NerError> {
        let mut attempt = 0;
        loop {
            match self.recognize_once(samples).await {
                Ok(results) => return Ok(results),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt > self.config.retry_attempts {
                        return Err(e);
                    }
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = self.config.retry_attempts,
                        delay_ms = self.config.retry_delay_ms,
                        error = %e,
                        "Retrying NER request after error"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    async fn recognize_once(&self, samples: &[String]) -> Result<Vec<Vec<NerEntity>>, NerError> {
        let request = NerRequest {
            samples: samples.to_vec(),
        };

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NerError::Timeout(e.to_string())
                } else {
                    NerError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(NerError::NotFound(self.config.url.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NerError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: NerResponse = response
            .json()
            .await
            .map_err(|e| NerError::InvalidResponse(e.to_string()))?;

        if body.results.len() != samples.len() {
            return Err(NerError::InvalidResponse(format!(
                "expected {} result lists, got {}",
                samples.len(),
                body.results.len()
            )));
        }

        Ok(body.results)
    }
}
