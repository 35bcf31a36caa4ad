use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{BiblioError, Result};

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// Thin reqwest wrapper shared by every registry client: spaces requests at
/// least `min_interval` apart, retries transient failures with exponential
/// backoff, and bounds every request with a timeout so a dead registry cannot
/// stall the enrichment batch.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    request_timeout: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(
        min_interval: Duration,
        max_retries: u32,
        request_timeout: Duration,
        user_agent: &str,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            min_interval,
            request_timeout,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        }
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_timeout(url, self.request_timeout).await
    }

    /// GET with an explicit timeout override for endpoints whose budget
    /// differs from the client default.
    pub async fn get_with_timeout(&self, url: &str, timeout: Duration) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            let resp = self.client.get(url).timeout(timeout).send().await;
            match resp {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= self.max_retries {
                        return Err(BiblioError::RateLimit("server".to_string(), 60));
                    }
                    let wait = retry_after_secs(r.headers()).unwrap_or(1);
                    sleep(Duration::from_secs(wait.min(5))).await;
                    attempt += 1;
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(BiblioError::ApiError(
                        url.to_string(),
                        format!("HTTP {status}: {body}"),
                    ));
                }
                Ok(r) => return r.text().await.map_err(BiblioError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(BiblioError::Http(e));
                    }
                    sleep(Duration::from_millis(250 * 2u64.pow(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| BiblioError::Parse(e.to_string()))
    }

    pub async fn get_json_with_timeout<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T> {
        let text = self.get_with_timeout(url, timeout).await?;
        serde_json::from_str(&text).map_err(|e| BiblioError::Parse(e.to_string()))
    }

    /// HEAD existence probe. No retries: callers use this as a last-resort
    /// liveness check, where a second attempt has no value.
    pub async fn head(&self, url: &str, timeout: Duration) -> Result<StatusCode> {
        self.wait_for_rate_limit().await;
        let resp = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(BiblioError::Http)?;
        Ok(resp.status())
    }

    pub async fn post_json_with_headers<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<R> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            let resp = self
                .client
                .post(url)
                .headers(headers.clone())
                .timeout(self.request_timeout)
                .json(body)
                .send()
                .await;

            match resp {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= self.max_retries {
                        return Err(BiblioError::RateLimit("server".to_string(), 60));
                    }
                    let wait = retry_after_secs(r.headers()).unwrap_or(1);
                    sleep(Duration::from_secs(wait.min(5))).await;
                    attempt += 1;
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let msg = r.text().await.unwrap_or_default();
                    return Err(BiblioError::ApiError(
                        url.to_string(),
                        format!("HTTP {status}: {msg}"),
                    ));
                }
                Ok(r) => {
                    let text = r.text().await.map_err(BiblioError::Http)?;
                    return serde_json::from_str(&text)
                        .map_err(|e| BiblioError::Parse(e.to_string()));
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(BiblioError::Http(e));
                    }
                    sleep(Duration::from_millis(250 * 2u64.pow(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

// ─── Throttle ─────────────────────────────────────────────────────────────────

/// Inter-record pause between reference enrichments. Exists to keep the batch
/// from bursting unauthenticated registries; zero disables it (tests).
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn disabled() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}
