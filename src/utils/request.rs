use crate::error::{info_err, info_err_res, TvEpgError};
use crate::model::RetryConfig;
use crate::utils::{debug_if_enabled, sanitize_sensitive_info, ENCODING_GZIP};
use flate2::read::GzDecoder;
use log::{error, info, warn};
use reqwest::header::{HeaderMap, ACCEPT_ENCODING, CONTENT_ENCODING, USER_AGENT};
use reqwest::StatusCode;
use std::io::Read;
use std::time::Duration;

pub fn create_client(timeout_secs: u64, user_agent: &str) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
}

pub fn format_http_status(status: StatusCode) -> String {
    let code = status.as_u16();
    match status.canonical_reason() {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn calculate_retry_backoff(base_delay_ms: u64, multiplier: f64, attempt: u32) -> u64 {
    let base = base_delay_ms.max(1);
    if multiplier <= 1.0 {
        return base;
    }
    let delay = (base as f64) * multiplier.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
    if !delay.is_finite() || delay < 1.0 {
        base
    } else if delay >= u64::MAX as f64 {
        u64::MAX
    } else {
        delay as u64
    }
}

/// Fetches the body as text. Failures are logged and yield `None`.
pub async fn fetch_text(client: &reqwest::Client, url: &str, description: &str) -> Option<String> {
    debug_if_enabled!("fetching {} from {}", description, sanitize_sensitive_info(url));
    match get_text(client, url).await {
        Ok(text) => Some(text),
        Err(err) => {
            error!("Failed to fetch {description}: {err}");
            None
        }
    }
}

async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, TvEpgError> {
    let response = client.get(url).send().await
        .map_err(|err| info_err!("{} {err}", sanitize_sensitive_info(url)))?;
    let status = response.status();
    if !status.is_success() {
        return info_err_res!("Request failed with status {} {}", format_http_status(status), sanitize_sensitive_info(url));
    }
    response.text().await.map_err(|err| info_err!("{} {err}", sanitize_sensitive_info(url)))
}

/// Posts a form and parses the json response.
pub async fn post_form_json<F>(client: &reqwest::Client, url: &str, form: &F) -> Result<serde_json::Value, TvEpgError>
where
    F: serde::Serialize + ?Sized,
{
    let response = client.post(url).form(form).send().await
        .map_err(|err| info_err!("{} {err}", sanitize_sensitive_info(url)))?;
    let status = response.status();
    if !status.is_success() {
        return info_err_res!("Request failed with status {} {}", format_http_status(status), sanitize_sensitive_info(url));
    }
    response.json::<serde_json::Value>().await
        .map_err(|err| info_err!("Invalid json response from {}: {err}", sanitize_sensitive_info(url)))
}

fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    headers.get(CONTENT_ENCODING)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case(ENCODING_GZIP))
}

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Undoes the transfer compression we asked for with `Accept-Encoding: gzip`.
/// Files that are gzip archives themselves (no content-encoding) stay untouched.
pub fn decode_body(headers: &HeaderMap, body: Vec<u8>) -> Result<Vec<u8>, std::io::Error> {
    if is_gzip_encoded(headers) && is_gzip(&body) {
        let mut decoded = Vec::with_capacity(body.len() * 4);
        GzDecoder::new(body.as_slice()).read_to_end(&mut decoded)?;
        Ok(decoded)
    } else {
        Ok(body)
    }
}

async fn download_once(client: &reqwest::Client, url: &str, retry: &RetryConfig) -> Result<Vec<u8>, TvEpgError> {
    let response = client.get(url)
        .header(USER_AGENT, retry.user_agent.as_str())
        .header(ACCEPT_ENCODING, ENCODING_GZIP)
        .timeout(Duration::from_secs(retry.timeout_secs))
        .send()
        .await
        .map_err(|err| info_err!("{err}"))?;
    let status = response.status();
    if !status.is_success() {
        return info_err_res!("status {}", format_http_status(status));
    }
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(|err| info_err!("{err}"))?;
    decode_body(&headers, body.to_vec()).map_err(|err| info_err!("can't decode gzip body: {err}"))
}

/// Downloads a resource, every failure is retried with exponential backoff.
pub async fn download_with_retry(client: &reqwest::Client, name: &str, url: &str, retry: &RetryConfig) -> Result<Vec<u8>, TvEpgError> {
    let max_attempts = retry.max_retries.max(1);
    for attempt in 0..max_attempts {
        info!("Downloading {name} (attempt {}/{max_attempts})", attempt + 1);
        match download_once(client, url, retry).await {
            Ok(content) => return Ok(content),
            Err(err) => {
                warn!("Download failed {name} (attempt {}/{max_attempts}): {err}", attempt + 1);
                if attempt < max_attempts - 1 {
                    let delay = calculate_retry_backoff(retry.retry_delay_ms, retry.backoff_multiplier, attempt);
                    info!("Waiting {delay}ms before retry");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }
    Err(info_err!("Giving up on {name} after {max_attempts} attempts ({})", sanitize_sensitive_info(url)))
}
