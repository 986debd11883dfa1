use anyhow::{Context, Error, Result, anyhow};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = "etfscope/0.1";

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        // Request URLs can carry API keys
        match operation()
            .await
            .map_err(|e| anyhow::Error::from(e.without_url()))
        {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Scheme, host and path of `url`, without the query string.
pub fn endpoint(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// GETs `url` and parses the body as JSON.
///
/// 404 is `Ok(None)`; any other non-success status is an error. Only the
/// endpoint is logged, never the query string.
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    symbol: &str,
) -> Result<Option<serde_json::Value>> {
    debug!(symbol, endpoint = endpoint(url), "Requesting provider data");
    let response = with_retry(|| async { client.get(url).send().await }, 2, 300)
        .await
        .with_context(|| format!("Request failed for symbol: {symbol}"))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        debug!(symbol, "Provider returned 404");
        return Ok(None);
    }
    if !status.is_success() {
        return Err(anyhow!("HTTP error: {} for symbol: {}", status, symbol));
    }

    let text = response
        .text()
        .await
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("Failed to get response text for symbol: {symbol}"))?;
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse JSON response for symbol: {symbol}"))?;
    Ok(Some(value))
}
