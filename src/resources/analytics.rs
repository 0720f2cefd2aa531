use jiff::civil::Date;
use tracing::instrument;

use super::Session;
use crate::error::{ApiError, Result};
use crate::pipeline::RequestSpec;
use crate::types::VideoAnalytics;

/// Per-video statistics.
pub struct Analytics<'a> {
    session: &'a Session,
}

impl<'a> Analytics<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Analytics for `video_id` between `start` and `end`, both inclusive.
    #[instrument(skip(self, start, end), fields(%start, %end), level = "debug")]
    pub async fn video(&self, video_id: &str, start: Date, end: Date) -> Result<VideoAnalytics> {
        if video_id.trim().is_empty() {
            return Err(ApiError::Validation("video id must not be empty".into()));
        }
        if start > end {
            return Err(ApiError::Validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let spec = RequestSpec::get(format!(
            "{}/v1/users/me/videos/{}/analytics",
            self.session.endpoints.nvapi, video_id
        ))?
        .query("startDate", start)
        .query("endDate", end);

        self.session
            .pipeline
            .fetch(&spec, &self.session.credential)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resources::tests::session;
    use crate::transport::mock::MockTransport;
    use jiff::civil::date;
    use serde_json::json;

    #[tokio::test]
    async fn test_video_analytics() {
        let (session, mock) = session(MockTransport::new().respond(
            200,
            json!({
                "meta": {"status": 200},
                "data": {
                    "summary": {"viewCount": 120, "likeCount": 4},
                    "daily": [
                        {"date": "2024-06-01", "viewCount": 70},
                        {"date": "2024-06-02", "viewCount": 50}
                    ]
                }
            }),
        ));

        let analytics = Analytics::new(&session)
            .video("sm9", date(2024, 6, 1), date(2024, 6, 2))
            .await
            .unwrap();
        assert_eq!(analytics.summary.view_count, 120);
        assert_eq!(analytics.daily.len(), 2);

        let request = &mock.requests()[0];
        assert_eq!(
            request.url.as_str(),
            "https://nvapi.example.jp/v1/users/me/videos/sm9/analytics"
        );
        assert_eq!(request.query_param("startDate"), Some("2024-06-01"));
        assert_eq!(request.query_param("endDate"), Some("2024-06-02"));
    }

    #[tokio::test]
    async fn test_single_day_range_allowed() {
        let (session, _) = session(
            MockTransport::new().respond(200, json!({"meta": {"status": 200}, "data": {}})),
        );
        let analytics = Analytics::new(&session)
            .video("sm9", date(2024, 6, 1), date(2024, 6, 1))
            .await
            .unwrap();
        assert_eq!(analytics, VideoAnalytics::default());
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let (session, mock) = session(MockTransport::new());
        let err = Analytics::new(&session)
            .video("sm9", date(2024, 6, 2), date(2024, 6, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("2024-06-02"));
        assert!(mock.requests().is_empty());
    }
}
