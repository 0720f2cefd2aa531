//! The HTTP capability the pipeline dispatches through.
//!
//! [`WreqTransport`] is the production implementation. Tests swap in a
//! scripted transport so nothing touches the network.

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use wreq::{Client, header};
use url::Url;
use wreq_util::Emulation;

use crate::proxy::ProxyConfig;

/// HTTP methods used by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// A fully prepared request: absolute URL, query, headers and optional JSON body.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl TransportRequest {
    /// URL with the query parameters appended to any it already carries.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw upstream answer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// A request that never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Network(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Anything able to issue an HTTP request.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}

/// Transport backed by a browser-emulating `wreq` client.
#[derive(Clone)]
pub struct WreqTransport {
    client: Client,
}

impl WreqTransport {
    pub fn new(timeout: Duration, proxy: Option<&ProxyConfig>) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .emulation(Emulation::Chrome143)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .zstd(true);

        if let Some(proxy) = proxy {
            tracing::debug!(proxy = %proxy.to_host_port(), "routing requests through proxy");
            builder = builder.proxy(wreq::Proxy::all(&proxy.to_url())?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn dispatch(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let url = request.full_url();
        let mut builder = match request.method {
            Method::Get => self.client.get(url.as_str()),
            Method::Post => self.client.post(url.as_str()),
            Method::Delete => self.client.delete(url.as_str()),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            let body = serde_json::to_string(body).map_err(anyhow::Error::from)?;
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(map_wreq_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_wreq_error)?;

        Ok(TransportResponse { status, body })
    }
}

impl Transport for WreqTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        Box::pin(self.dispatch(request))
    }
}

fn map_wreq_error(err: wreq::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() {
        TransportError::Network(err.to_string())
    } else {
        TransportError::Other(err.into())
    }
}
