use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::IgnoredAny;
use tracing::trace;

use super::request::RpcRequest;
use crate::models::error::RunnerError;

/// Delivers a request to the node and returns its serialized response.
///
/// Each call suspends the calling scenario until the response arrives; no
/// timeout is applied at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RpcRequest) -> Result<String, RunnerError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: &RpcRequest) -> Result<String, RunnerError> {
        (**self).execute(request).await
    }
}

/// Transport posting requests to a JSON-RPC HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(url: &str) -> Result<Self, RunnerError> {
        let url = Url::parse(url)
            .map_err(|err| RunnerError::Transport(format!("invalid RPC url {url}: {err}")))?;
        let client = Client::builder()
            .user_agent("rpc-testing")
            .gzip(true)
            .build()?;
        Ok(Self { client, url })
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &RpcRequest) -> Result<String, RunnerError> {
        trace!("POST {} {}", self.url, request.method);
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        response_body(status, response.text().await?)
    }
}

/// Nodes may report a JSON-RPC error with a non-2xx status. Such a body is
/// returned as is and classified by the client. Only an empty body, or a
/// non-JSON body with an error status, fails the transport.
fn response_body(status: StatusCode, body: String) -> Result<String, RunnerError> {
    if body.trim().is_empty() {
        return Err(RunnerError::Transport(format!("HTTP {status}: empty response")));
    }
    if !status.is_success() && serde_json::from_str::<IgnoredAny>(&body).is_err() {
        return Err(RunnerError::Transport(format!("HTTP {status}: {body}")));
    }
    Ok(body)
}
