//! Forwarded browser cookies.
//!
//! The caller owns the cookie set (typically exported by a browser extension
//! and stashed somewhere outside this crate). The client only reads it to
//! build the `Cookie` header for each request.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// A single cookie record, shaped like the browser extension export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: Option<bool>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub same_site: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: String::new(),
            expires: None,
            http_only: None,
            secure: None,
            same_site: None,
        }
    }
}

/// Ordered cookie set used to authenticate every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential {
    cookies: Vec<Cookie>,
}

impl Credential {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }

    /// Parse a JSON array of cookie records.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ApiError::Validation(format!("malformed cookie export: {}", e)))
    }

    /// Split an existing `Cookie` header value back into records.
    pub fn from_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (!name.is_empty()).then(|| Cookie::new(name, value))
            })
            .collect();
        Self { cookies }
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `name=value; name=value`, in the order the cookies were supplied.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
