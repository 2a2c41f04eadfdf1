//! Shared plumbing for the source HTTP clients.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{BuildError, FetchError};

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, BuildError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("flowpulse/0.1 (workflow-popularity)")
        .build()?;
    Ok(client)
}

/// Normalises a base URL so it ends with exactly one slash, keeping joined
/// paths on the root rather than replacing the last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, BuildError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| BuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

pub(crate) fn expect_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    body: serde_json::Value,
    context: &str,
) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}
