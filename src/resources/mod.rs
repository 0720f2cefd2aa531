//! One module per upstream resource family.
//!
//! Each resource is a thin borrowed handle over a shared [`Session`]; none of
//! them holds state of its own.

use std::sync::Arc;

use crate::config::Endpoints;
use crate::credential::Credential;
use crate::period::Clock;
use crate::pipeline::RequestPipeline;

pub mod analytics;
pub mod earnings;
pub mod lives;
pub mod mylists;
pub mod videos;

pub use analytics::Analytics;
pub use earnings::{EarningsApi, EarningsPeriodResolver};
pub use lives::Lives;
pub use mylists::Mylists;
pub use videos::Videos;

/// Everything a resource needs to issue calls.
pub struct Session {
    pub(crate) pipeline: RequestPipeline,
    pub(crate) credential: Credential,
    pub(crate) endpoints: Endpoints,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(
        pipeline: RequestPipeline,
        credential: Credential,
        endpoints: Endpoints,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline,
            credential,
            endpoints,
            clock,
        }
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::period::FixedClock;
    use crate::pipeline::tests::{credential, pipeline};
    use crate::transport::mock::MockTransport;
    use jiff::civil::Date;

    pub(crate) fn endpoints() -> Endpoints {
        Endpoints {
            nvapi: "https://nvapi.example.jp".into(),
            live: "https://live.example.jp".into(),
            commons: "https://commons.example.jp".into(),
        }
    }

    /// Session over a scripted transport, with "today" pinned to `today`.
    pub(crate) fn session_on(mock: MockTransport, today: Date) -> (Session, Arc<MockTransport>) {
        let (pipeline, mock) = pipeline(mock);
        let session = Session::new(
            pipeline,
            credential(),
            endpoints(),
            Arc::new(FixedClock(today)),
        );
        (session, mock)
    }

    pub(crate) fn session(mock: MockTransport) -> (Session, Arc<MockTransport>) {
        session_on(mock, jiff::civil::date(2024, 6, 15))
    }
}
