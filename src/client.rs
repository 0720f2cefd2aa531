use std::sync::Arc;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::Result;
use crate::period::{Clock, SystemClock};
use crate::pipeline::RequestPipeline;
use crate::rate_limit::RateLimiter;
use crate::resources::{Analytics, EarningsApi, Lives, Mylists, Session, Videos};
use crate::transport::Transport;

/// Client for the creator-side APIs of one logged-in account.
///
/// Cloning is cheap and clones share the rate limiter, so request spacing
/// holds across every clone.
#[derive(Clone)]
pub struct NicoClient {
    session: Arc<Session>,
}

impl NicoClient {
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_config(credential, ClientConfig::default())
    }

    pub fn with_config(credential: Credential, config: ClientConfig) -> Result<Self> {
        let pipeline = RequestPipeline::from_config(&config)?;
        let clock = Arc::new(SystemClock::new(&config.time_zone));
        Ok(Self::from_parts(pipeline, credential, config, clock))
    }

    /// Client over a caller-supplied transport and clock.
    pub fn with_transport(
        credential: Credential,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pipeline = RequestPipeline::new(
            transport,
            RateLimiter::new(config.min_interval),
            config.default_headers.clone(),
        );
        Self::from_parts(pipeline, credential, config, clock)
    }

    fn from_parts(
        pipeline: RequestPipeline,
        credential: Credential,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if credential.is_empty() {
            tracing::warn!("client created without cookies, requests will be anonymous");
        }
        Self {
            session: Arc::new(Session::new(pipeline, credential, config.endpoints, clock)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn videos(&self) -> Videos<'_> {
        Videos::new(&self.session)
    }

    pub fn lives(&self) -> Lives<'_> {
        Lives::new(&self.session)
    }

    pub fn earnings(&self) -> EarningsApi<'_> {
        EarningsApi::new(&self.session)
    }

    pub fn mylists(&self) -> Mylists<'_> {
        Mylists::new(&self.session)
    }

    pub fn analytics(&self) -> Analytics<'_> {
        Analytics::new(&self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::credential::Cookie;
    use crate::pagination::{OffsetQuery, PageQuery};
    use crate::period::FixedClock;
    use crate::transport::mock::MockTransport;
    use jiff::civil::date;
    use serde_json::json;
    use std::time::Duration;

    fn client(mock: MockTransport) -> (NicoClient, Arc<MockTransport>) {
        let mock = Arc::new(mock);
        let config = ClientConfig::default()
            .with_min_interval(Duration::ZERO)
            .with_endpoints(Endpoints {
                nvapi: "https://nvapi.example.jp".into(),
                live: "https://live.example.jp".into(),
                commons: "https://commons.example.jp".into(),
            });
        let client = NicoClient::with_transport(
            Credential::new(vec![Cookie::new("user_session", "abc")]),
            config,
            mock.clone(),
            Arc::new(FixedClock(date(2024, 6, 15))),
        );
        (client, mock)
    }

    #[tokio::test]
    async fn test_default_headers_and_cookie_on_every_resource() {
        let ok = json!({"meta": {"status": 200}, "data": {"totalCount": 0, "items": []}});
        let (client, mock) = client(
            MockTransport::new()
                .respond(200, ok)
                .respond(200, json!({"meta": {"status": 200}, "data": {"totalCount": 0, "programsList": []}}))
                .respond(200, json!({"meta": {"status": 200}, "data": {"mylists": []}})),
        );

        client.videos().list(PageQuery::default()).await.unwrap();
        client.lives().history("1", OffsetQuery::default()).await.unwrap();
        client.mylists().list().await.unwrap();

        for request in mock.requests() {
            assert_eq!(request.header("Cookie"), Some("user_session=abc"));
            assert_eq!(request.header("X-Frontend-Id"), Some("6"));
            assert_eq!(request.header("X-Request-With"), Some("nicovideo"));
        }
    }

    #[tokio::test]
    async fn test_clones_share_session() {
        let (client, mock) = client(
            MockTransport::new()
                .respond(409, json!({"meta": {"status": 409}}))
                .respond(200, json!({"meta": {"status": 200}, "data": {"totalCount": 0, "items": []}})),
        );
        let other = client.clone();
        let earnings = other.earnings().current(OffsetQuery::default()).await.unwrap();
        assert_eq!(earnings.period.to_string(), "2024-05");
        assert!(Arc::ptr_eq(&client.session, &other.session));
        assert_eq!(mock.requests().len(), 2);
    }
}
