use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::errors::Error;
use crate::request::{ApiResponse, PreparedRequest};

pub const USER_AGENT: &str = "household-api-client/0.1.0";

/// Sends a fully prepared request. Implementations return `Error::Network` when no response was
/// received; any HTTP status, including failures, is a successful send.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse, Error>;
}

/// Default transport. Keeps a cookie store so the server-managed refresh cookie rides along
/// on every call without this crate ever reading it.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client. Cookie handling is whatever that client was built with.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse, Error> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;
        debug!("http send: method={} url='{}'", method, url);
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(ApiResponse::new(status, headers, body))
    }
}
