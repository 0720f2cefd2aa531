//! Client configuration.
//!
//! Everything has a working default; [`ClientConfig::from_env`] lets a
//! deployment override the common knobs without code changes.

use std::env;
use std::time::Duration;

use crate::proxy::ProxyConfig;
use crate::rate_limit::DEFAULT_MIN_INTERVAL;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TIME_ZONE: &str = "Asia/Tokyo";

/// Base URLs of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Video, mylist and analytics API.
    pub nvapi: String,
    /// Live broadcast front API.
    pub live: String,
    /// Creator Support Program (earnings) API.
    pub commons: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            nvapi: "https://nvapi.nicovideo.jp".to_string(),
            live: "https://live.nicovideo.jp".to_string(),
            commons: "https://public-api.commons.nicovideo.jp".to_string(),
        }
    }
}

/// Configuration for [`crate::NicoClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Minimum spacing between request starts.
    pub min_interval: Duration,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// IANA zone used to decide what "the current month" is.
    pub time_zone: String,
    pub endpoints: Endpoints,
    /// Headers sent with every request, before the cookie header.
    pub default_headers: Vec<(String, String)>,
    pub proxy: Option<ProxyConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            endpoints: Endpoints::default(),
            default_headers: vec![
                ("X-Frontend-Id".to_string(), "6".to_string()),
                ("X-Frontend-Version".to_string(), "0".to_string()),
                ("X-Request-With".to_string(), "nicovideo".to_string()),
                ("Referer".to_string(), "https://www.nicovideo.jp/".to_string()),
            ],
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `NICO_MIN_INTERVAL_MS`, `NICO_TIMEOUT_SECS`,
    /// `NICO_TIME_ZONE` and `NICO_PROXY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("NICO_MIN_INTERVAL_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.min_interval = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid NICO_MIN_INTERVAL_MS"),
            }
        }

        if let Some(raw) = lookup("NICO_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid NICO_TIMEOUT_SECS"),
            }
        }

        if let Some(zone) = lookup("NICO_TIME_ZONE").filter(|z| !z.trim().is_empty()) {
            config.time_zone = zone.trim().to_string();
        }

        if let Some(raw) = lookup("NICO_PROXY").filter(|p| !p.trim().is_empty()) {
            match ProxyConfig::parse(&raw) {
                Ok(proxy) => config.proxy = Some(proxy),
                Err(e) => tracing::warn!(error = %e, "ignoring NICO_PROXY"),
            }
        }

        config
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Add or replace a default header (case-insensitive name match).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.default_headers.push((name, value.into()));
        self
    }
}
