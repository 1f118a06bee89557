//! The fetch seam between the pipeline and the network.

use crate::config::HttpConfig;
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Outcome of one GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// The complete response body. Empty on failure.
    pub bytes: Vec<u8>,
    /// Status line or error text.
    pub status: String,
    pub success: bool,
}

impl FetchResponse {
    pub fn ok(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            status: "200 OK".to_string(),
            success: true,
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            bytes: Vec::new(),
            status: status.into(),
            success: false,
        }
    }
}

/// Asynchronous byte fetcher.
///
/// Implementations never retry and never fail: transport errors become a
/// `FetchResponse` with `success == false`.
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchResponse> + Send;
}

/// Default [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
        })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> FetchResponse {
        debug!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchResponse::failed(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResponse::failed(status.to_string());
        }

        match response.bytes().await {
            Ok(body) => FetchResponse {
                bytes: body.to_vec(),
                status: status.to_string(),
                success: true,
            },
            Err(e) => FetchResponse::failed(e.to_string()),
        }
    }
}
