//! Network access behind a trait so strategies, lifecycle and the sync
//! drain can run against a scripted fetcher in tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::http::{Request, Response};

#[derive(Error, Debug)]
pub enum FetchError {
    /// The network fetch itself failed: connection refused, timeout, DNS.
    /// Always recoverable by falling back to cache or queuing.
    #[error("Connectivity failure: {0}")]
    Connectivity(String),
    /// The client could not even issue the request (bad method, bad
    /// header). Not a connectivity problem; never queued for replay.
    #[error("Client error: {0}")]
    Client(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

pub type AbstractFetcher = Arc<dyn Fetcher + Send + Sync>;

/// Reqwest-backed fetcher used in production.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(
        timeout_secs: u64,
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Connectivity(e.to_string()))?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Connectivity(e.to_string()))?
            .to_vec();

        let mut out = Response::new(status, body);
        out.headers = headers;
        Ok(out)
    }
}
