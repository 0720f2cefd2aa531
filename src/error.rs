//! Error taxonomy and failure classification.
//!
//! Every failure coming out of the request pipeline is funnelled through
//! [`classify`], which maps it onto exactly one [`ApiError`] variant. The
//! mapping is total: transport failures, HTTP statuses, the upstream's
//! in-body `meta.status` and anything unexpected all end up in the same
//! closed set of kinds exposed by [`ErrorKind`].

use std::fmt;

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Message used when the upstream did not supply one.
pub const DETAILS_UNKNOWN: &str = "details unknown";

/// Errors surfaced by every client operation.
///
/// Nothing is retried automatically; callers get the classified error as-is.
#[must_use = "errors should be handled or propagated"]
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 400. The upstream rejected the query parameters.
    #[error("invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// HTTP 401. The forwarded cookies are missing or expired.
    #[error("unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// HTTP 403.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// HTTP 404.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// HTTP 429. The local spacing was not enough for the upstream.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// HTTP 500, 502 or 503.
    #[error("upstream unavailable ({status}): {message}")]
    UpstreamUnavailable { status: u16, message: String },

    /// Any other non-success status, including 409 outside the earnings probe.
    #[error("upstream error ({status}): {message}")]
    UpstreamError { status: u16, message: String },

    /// The transport gave up waiting for the upstream.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("network error: {0}")]
    NetworkError(String),

    /// Local pre-flight validation failed. No request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Anything that does not fit the categories above.
    #[error("unknown error: {0:#}")]
    Unknown(#[source] anyhow::Error),
}

/// The closed set of error kinds, without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParameters,
    Unauthenticated,
    Forbidden,
    NotFound,
    RateLimited,
    UpstreamUnavailable,
    UpstreamError,
    Timeout,
    NetworkError,
    ValidationError,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidParameters => "INVALID_PARAMETERS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::UpstreamError { .. } => ErrorKind::UpstreamError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NetworkError(_) => ErrorKind::NetworkError,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP (or in-body) status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidParameters { .. } => Some(400),
            Self::Unauthenticated { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::UpstreamUnavailable { status, .. } | Self::UpstreamError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub(crate) fn unknown(message: impl fmt::Display) -> Self {
        Self::Unknown(anyhow::anyhow!("{}", message))
    }
}

/// A raw failure observed by the pipeline, before classification.
#[derive(Debug)]
pub enum Failure {
    /// The upstream answered, but with a non-success status (either the HTTP
    /// status or the envelope's `meta.status`).
    Http {
        status: u16,
        body: Option<serde_json::Value>,
    },
    /// The request never produced a response.
    Transport(TransportError),
    /// Anything else, e.g. an undecodable body.
    Other(anyhow::Error),
}

/// Map a failure onto the error taxonomy.
pub fn classify(failure: Failure) -> ApiError {
    match failure {
        Failure::Http { status, body } => {
            let message = extract_message(body.as_ref());
            match status {
                400 => ApiError::InvalidParameters { message },
                401 => ApiError::Unauthenticated { message },
                403 => ApiError::Forbidden { message },
                404 => ApiError::NotFound { message },
                429 => ApiError::RateLimited { message },
                500 | 502 | 503 => ApiError::UpstreamUnavailable { status, message },
                _ => ApiError::UpstreamError { status, message },
            }
        }
        Failure::Transport(TransportError::Timeout(detail)) => ApiError::Timeout(detail),
        Failure::Transport(TransportError::Network(detail)) => ApiError::NetworkError(detail),
        Failure::Transport(TransportError::Other(err)) | Failure::Other(err) => {
            ApiError::Unknown(err)
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at a top-level string `message` first, then the envelope's
/// `meta.errorMessage` and `meta.errorCode`.
pub fn extract_message(body: Option<&serde_json::Value>) -> String {
    let Some(body) = body.and_then(|b| b.as_object()) else {
        return DETAILS_UNKNOWN.to_string();
    };

    if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
        return message.to_string();
    }

    let meta = body.get("meta");
    meta.and_then(|m| m.get("errorMessage"))
        .and_then(|m| m.as_str())
        .or_else(|| meta.and_then(|m| m.get("errorCode")).and_then(|c| c.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| DETAILS_UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http(status: u16, body: serde_json::Value) -> ApiError {
        classify(Failure::Http {
            status,
            body: Some(body),
        })
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, ErrorKind::InvalidParameters),
            (401, ErrorKind::Unauthenticated),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::UpstreamUnavailable),
            (502, ErrorKind::UpstreamUnavailable),
            (503, ErrorKind::UpstreamUnavailable),
            (504, ErrorKind::UpstreamError),
            (418, ErrorKind::UpstreamError),
        ];
        for (status, kind) in cases {
            assert_eq!(http(status, json!({})).kind(), kind, "status {}", status);
        }
    }

    #[test]
    fn test_conflict_is_plain_upstream_error() {
        let err = http(409, json!({"meta": {"status": 409}}));
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_message_extraction() {
        let err = http(400, json!({"message": "bad sortKey"}));
        assert_eq!(err.to_string(), "invalid parameters: bad sortKey");

        let err = http(403, json!({"meta": {"status": 403, "errorCode": "FORBIDDEN"}}));
        assert_eq!(err.to_string(), "forbidden: FORBIDDEN");

        // Non-string message is ignored.
        let err = http(403, json!({"message": 12}));
        assert_eq!(err.to_string(), "forbidden: details unknown");

        let err = classify(Failure::Http {
            status: 404,
            body: None,
        });
        assert_eq!(err.to_string(), "not found: details unknown");
    }

    #[test]
    fn test_transport_failures() {
        let err = classify(Failure::Transport(TransportError::Timeout("30s".into())));
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = classify(Failure::Transport(TransportError::Network(
            "connection reset".into(),
        )));
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.to_string().contains("connection reset"));

        let err = classify(Failure::Transport(TransportError::Other(anyhow::anyhow!(
            "builder exploded"
        ))));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains("builder exploded"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::RateLimited.to_string(), "RATE_LIMITED");
        assert_eq!(
            ApiError::Validation("x".into()).kind(),
            ErrorKind::ValidationError
        );
    }
}
