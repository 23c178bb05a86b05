//! Startup validation of the polling configuration.

use std::collections::HashSet;

use url::Url;

use crate::error::ConfigError;

const MIN_INTERVAL: u64 = 1;
const MIN_TIMEOUT: u64 = 1;
const MAX_TIMEOUT: u64 = 300; // 5 minutes

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// Validate a single polled URL
pub fn validate_target_url(target: &str) -> Result<(), ConfigError> {
    let url = Url::parse(target).map_err(|e| invalid(format!("invalid URL {target:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other:?} in {target}"))),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(format!("URL has no host: {target}")));
    }

    if url.port() == Some(0) {
        return Err(invalid(format!("port 0 is not valid: {target}")));
    }

    Ok(())
}

/// Validate the whole target list: non-empty, well formed and without duplicates.
///
/// Statuses are keyed by URL, so two identical entries would share one row.
pub fn validate_targets(urls: &[String]) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(invalid("no URLs configured"));
    }

    let mut seen = HashSet::with_capacity(urls.len());
    for url in urls {
        validate_target_url(url)?;
        if !seen.insert(url.as_str()) {
            return Err(invalid(format!("duplicate URL: {url}")));
        }
    }

    Ok(())
}

pub fn validate_interval(name: &str, seconds: u64) -> Result<(), ConfigError> {
    if seconds < MIN_INTERVAL {
        return Err(invalid(format!(
            "{name} too short: {seconds} seconds (minimum: {MIN_INTERVAL})"
        )));
    }
    Ok(())
}

/// Validate timeout is reasonable
pub fn validate_timeout(timeout_seconds: u64) -> Result<(), ConfigError> {
    if timeout_seconds < MIN_TIMEOUT {
        return Err(invalid(format!(
            "timeout too short: {timeout_seconds} seconds (minimum: {MIN_TIMEOUT})"
        )));
    }

    if timeout_seconds > MAX_TIMEOUT {
        return Err(invalid(format!(
            "timeout too long: {timeout_seconds} seconds (maximum: {MAX_TIMEOUT})"
        )));
    }

    Ok(())
}

pub fn validate_pollers(pollers: usize) -> Result<(), ConfigError> {
    if pollers == 0 {
        return Err(invalid("at least one poller is required"));
    }
    Ok(())
}
