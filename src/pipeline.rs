//! The shared request pipeline.
//!
//! Every call goes through the same steps, in order:
//! 1. wait on the rate limiter,
//! 2. attach default headers and the cookie header,
//! 3. dispatch through the transport,
//! 4. validate the HTTP status and then the envelope's own `meta.status`,
//! 5. classify whatever went wrong.
//!
//! The upstream sometimes reports errors inside a 200 response, so the
//! in-body status is the authoritative success signal and the HTTP status is
//! only a first gate.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{ApiError, Failure, Result, classify};
use crate::rate_limit::RateLimiter;
use crate::transport::{Method, Transport, TransportRequest, WreqTransport};

/// Status the upstream uses in `meta.status` for success.
pub const STATUS_OK: u16 = 200;

/// One outbound call, before headers and rate limiting are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// Build a spec for an absolute `http(s)` URL.
    ///
    /// Relative or schemeless URLs are rejected here, before the request can
    /// reach the rate limiter or the transport.
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        let url = parse_absolute(url.as_ref())?;
        Ok(Self {
            method,
            url,
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        })
    }

    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::Delete, url)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

fn parse_absolute(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| {
        ApiError::Validation(format!("request URL '{}' is not usable: {}", raw, reason))
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

/// The `meta` block of every upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Meta {
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK,
            error_code: None,
            error_message: None,
        }
    }
}

/// `{meta, data}` wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResponseEnvelope<T> {
    pub meta: Meta,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.meta.status == STATUS_OK
    }

    /// The payload, or an error if the upstream omitted it.
    pub fn into_data(self) -> Result<T> {
        let status = self.meta.status;
        self.data
            .ok_or_else(|| ApiError::unknown(format!("response (status {}) carried no data", status)))
    }
}

/// Whether the pipeline should turn a non-200 `meta.status` into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCheck {
    /// Non-200 statuses become classified errors.
    Enforce,
    /// Structured non-200 envelopes are returned as data, so the caller can
    /// inspect `meta.status` itself. Responses that are not envelopes are
    /// still classified.
    Skip,
}

/// Rate-limited, authenticated access to the upstream.
pub struct RequestPipeline {
    limiter: RateLimiter,
    transport: Arc<dyn Transport>,
    default_headers: Vec<(String, String)>,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: RateLimiter,
        default_headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            limiter,
            transport,
            default_headers,
        }
    }

    /// Pipeline over a wreq transport configured from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = WreqTransport::new(config.timeout, config.proxy.as_ref())
            .map_err(ApiError::Unknown)?;
        Ok(Self::new(
            Arc::new(transport),
            RateLimiter::new(config.min_interval),
            config.default_headers.clone(),
        ))
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run one request through the pipeline and decode its envelope.
    #[instrument(
        skip(self, spec, credential),
        fields(method = %spec.method, url = %spec.url),
        level = "debug"
    )]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        credential: &Credential,
        check: StatusCheck,
    ) -> Result<ResponseEnvelope<T>> {
        self.limiter.enforce().await;

        let request = self.prepare(spec, credential);
        tracing::debug!(query = ?request.query, "dispatching request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                let err = classify(Failure::Transport(e));
                tracing::warn!(error = %err, "transport failure");
                return Err(err);
            }
        };

        let status = response.status;
        let success = (200..300).contains(&status);

        if success && response.body.trim().is_empty() {
            return Ok(ResponseEnvelope {
                meta: Meta::ok(),
                data: None,
            });
        }

        let body: Option<serde_json::Value> = serde_json::from_str(&response.body).ok();

        if !success {
            if check == StatusCheck::Skip
                && let Some(envelope) = body.as_ref().and_then(|v| decode_lenient::<T>(v).ok())
            {
                tracing::debug!(status, meta_status = envelope.meta.status, "returning non-success envelope");
                return Ok(envelope);
            }
            let err = classify(Failure::Http { status, body });
            tracing::warn!(status, error = %err, "request failed");
            return Err(err);
        }

        let Some(value) = body else {
            return Err(classify(Failure::Other(anyhow::anyhow!(
                "response body (HTTP {}) is not JSON",
                status
            ))));
        };

        let envelope = match check {
            StatusCheck::Enforce => ResponseEnvelope::<T>::deserialize(&value).map_err(|e| {
                classify(Failure::Other(
                    anyhow::Error::new(e).context("decode response envelope"),
                ))
            })?,
            StatusCheck::Skip => decode_lenient::<T>(&value)?,
        };

        if check == StatusCheck::Enforce && !envelope.is_success() {
            let meta_status = envelope.meta.status;
            let err = classify(Failure::Http {
                status: meta_status,
                body: Some(value),
            });
            tracing::warn!(status, meta_status, error = %err, "envelope reported failure");
            return Err(err);
        }

        Ok(envelope)
    }

    /// Execute with status enforcement and return the payload.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        credential: &Credential,
    ) -> Result<T> {
        self.execute::<T>(spec, credential, StatusCheck::Enforce)
            .await?
            .into_data()
    }

    /// Execute a call whose payload is irrelevant (mutations).
    pub async fn send(&self, spec: &RequestSpec, credential: &Credential) -> Result<Meta> {
        let envelope = self
            .execute::<serde_json::Value>(spec, credential, StatusCheck::Enforce)
            .await?;
        Ok(envelope.meta)
    }

    fn prepare(&self, spec: &RequestSpec, credential: &Credential) -> TransportRequest {
        let mut headers = self.default_headers.clone();
        if !credential.is_empty() {
            headers.push(("Cookie".to_string(), credential.header_value()));
        }
        for (name, value) in &spec.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        TransportRequest {
            method: spec.method,
            url: spec.url.clone(),
            query: spec.query.clone(),
            headers,
            body: spec.body.clone(),
        }
    }
}

/// Decode an envelope, falling back to meta-only when `data` does not match
/// `T` and the envelope reports a failure. A successful envelope with a
/// mismatched payload is a decode error.
fn decode_lenient<T: DeserializeOwned>(value: &serde_json::Value) -> Result<ResponseEnvelope<T>> {
    let err = match ResponseEnvelope::<T>::deserialize(value) {
        Ok(envelope) => return Ok(envelope),
        Err(e) => e,
    };

    match value.get("meta").and_then(|m| Meta::deserialize(m).ok()) {
        Some(meta) if meta.status != STATUS_OK => Ok(ResponseEnvelope { meta, data: None }),
        _ => Err(classify(Failure::Other(
            anyhow::Error::new(err).context("decode response envelope"),
        ))),
    }
}
