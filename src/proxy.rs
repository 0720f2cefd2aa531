use crate::error::{ApiError, Result};

/// Upstream HTTP proxy for the wreq transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Parse a proxy string. Accepted shapes:
    /// - `host:port`
    /// - `host:port:user:pass`
    /// - `user:pass@host:port`
    /// - any of the above prefixed with `http://`, `https://` or `socks5://`
    pub fn parse(proxy: &str) -> Result<Self> {
        let invalid = || ApiError::Validation(format!("unrecognized proxy string '{}'", proxy));

        let proxy = proxy.trim();
        let (scheme, rest) = match proxy.split_once("://") {
            Some((scheme @ ("http" | "https" | "socks5"), rest)) => (scheme, rest),
            Some(_) => return Err(invalid()),
            None => ("http", proxy),
        };

        let (auth, host_port) = match rest.rsplit_once('@') {
            Some((auth, host_port)) => (Some(auth), host_port),
            None => (None, rest),
        };

        let parts: Vec<&str> = host_port.split(':').collect();
        let (host, port, credentials) = match (parts.as_slice(), auth) {
            ([host, port], Some(auth)) => {
                let (user, pass) = auth.split_once(':').unwrap_or((auth, ""));
                (*host, *port, Some((user, pass)))
            }
            ([host, port], None) => (*host, *port, None),
            ([host, port, user, pass], None) => (*host, *port, Some((*user, *pass))),
            _ => return Err(invalid()),
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            username: credentials.map(|(user, _)| user.to_string()),
            password: credentials.map(|(_, pass)| pass.to_string()),
        })
    }

    /// Proxy URL with credentials, as wreq expects it.
    pub fn to_url(&self) -> String {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => format!(
                "{}://{}:{}@{}:{}",
                self.scheme, user, pass, self.host, self.port
            ),
            _ => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }

    /// `host:port`, safe for logging.
    pub fn to_host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
