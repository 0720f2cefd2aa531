use tracing::instrument;

use super::Session;
use crate::error::Result;
use crate::pagination::{PageQuery, PageResult, fetch_page};
use crate::pipeline::RequestSpec;
use crate::types::{Video, VideoList};

/// Videos uploaded by the authenticated user.
pub struct Videos<'a> {
    session: &'a Session,
}

impl<'a> Videos<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// One page of the user's own videos, newest first.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, query: PageQuery) -> Result<PageResult<Video>> {
        let spec = RequestSpec::get(format!(
            "{}/v1/users/me/videos",
            self.session.endpoints.nvapi
        ))?
        .query("sortKey", "registeredAt")
        .query("sortOrder", "desc");

        fetch_page(
            &self.session.pipeline,
            &self.session.credential,
            spec,
            query,
            |data: VideoList| {
                let items = data.items.into_iter().map(|item| item.essential).collect();
                (items, data.total_count)
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resources::tests::session;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_videos() {
        let (session, mock) = session(MockTransport::new().respond(
            200,
            json!({
                "meta": {"status": 200},
                "data": {
                    "totalCount": 3,
                    "items": [
                        {"essential": {"id": "sm3", "title": "third"}},
                        {"essential": {"id": "sm2", "title": "second"}}
                    ]
                }
            }),
        ));

        let page = Videos::new(&session)
            .list(PageQuery::new(1, 2))
            .await
            .unwrap();

        assert_eq!(page.total_count, 3);
        assert!(page.has_more);
        let ids: Vec<_> = page.items.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["sm3", "sm2"]);

        let request = &mock.requests()[0];
        assert_eq!(request.url.as_str(), "https://nvapi.example.jp/v1/users/me/videos");
        assert_eq!(request.query_param("sortKey"), Some("registeredAt"));
        assert_eq!(request.query_param("sortOrder"), Some("desc"));
        assert_eq!(request.query_param("pageSize"), Some("2"));
        assert_eq!(request.query_param("page"), Some("1"));
    }

    #[tokio::test]
    async fn test_last_page() {
        let (session, _) = session(MockTransport::new().respond(
            200,
            json!({"meta": {"status": 200}, "data": {"totalCount": 3, "items": [{"essential": {"id": "sm1"}}]}}),
        ));
        let page = Videos::new(&session)
            .list(PageQuery::new(2, 2))
            .await
            .unwrap();
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_malformed_endpoint_fails_locally() {
        let (mut session, mock) = session(MockTransport::new());
        session.endpoints.nvapi = "https://nv api.example.jp".into();

        let err = Videos::new(&session)
            .list(PageQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("nv api.example.jp"));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated() {
        let (session, _) = session(MockTransport::new().respond(
            401,
            json!({"meta": {"status": 401, "errorCode": "UNAUTHORIZED"}}),
        ));
        let err = Videos::new(&session)
            .list(PageQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(err.to_string().contains("UNAUTHORIZED"));
    }
}
