//! Google Fonts catalog client (made by FontLab https://www.fontlab.com/)

use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;

use crate::error::{Error, Result};
use crate::model::{CatalogResponse, FontRecord};

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/webfonts/v1/webfonts";
pub const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client around the font-listing endpoint. One attempt per call; the
/// caller decides whether to retry.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CatalogClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(CATALOG_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gfdl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::from_request)?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the client at another listing endpoint (mirror, test server).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the whole catalog sorted alphabetically. With
    /// `prefer_woff2` the provider returns WOFF2 URLs in each record's
    /// `files` map instead of TTF ones.
    pub async fn fetch_catalog(&self, api_key: &str, prefer_woff2: bool) -> Result<Vec<FontRecord>> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::validation("a Google Fonts API key is required"));
        }

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(3);
        if prefer_woff2 {
            params.push(("capability", "WOFF2"));
        }
        params.push(("sort", "alpha"));
        params.push(("key", api_key));

        debug!("fetching catalog from {} (woff2: {prefer_woff2})", self.endpoint);

        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|err| log_failure(Error::from_request(err)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(log_failure(Error::Auth {
                status: status.as_u16(),
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|err| log_failure(Error::from_request(err)))?;

        if !status.is_success() {
            let err = match serde_json::from_str::<CatalogResponse>(&body) {
                Ok(CatalogResponse {
                    error: Some(api), ..
                }) => Error::Api {
                    code: api.code,
                    message: api.message,
                },
                _ => Error::Status {
                    status: status.as_u16(),
                },
            };
            return Err(log_failure(err));
        }

        let parsed: CatalogResponse =
            serde_json::from_str(&body).map_err(|err| log_failure(Error::from(err)))?;
        let items = parsed.into_result().map_err(log_failure)?;

        debug!("catalog returned {} families", items.len());
        Ok(items)
    }
}

fn log_failure(err: Error) -> Error {
    match std::error::Error::source(&err) {
        Some(cause) => warn!("catalog request failed: {err}: {cause}"),
        None => warn!("catalog request failed: {err}"),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_key_fails_before_any_request() {
        let client = CatalogClient::new()
            .expect("client")
            .endpoint("http://127.0.0.1:9/never");

        let err = client.fetch_catalog("   ", false).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn defaults_to_google_endpoint() {
        let client = CatalogClient::new().expect("client");
        assert_eq!(client.endpoint_url(), DEFAULT_ENDPOINT);
    }
}
