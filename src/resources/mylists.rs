use tracing::instrument;

use super::Session;
use crate::error::{ApiError, Result};
use crate::pagination::{PageQuery, PageResult, fetch_page};
use crate::pipeline::RequestSpec;
use crate::types::{Mylist, MylistContents, MylistIndex, MylistItem};

/// The authenticated user's mylists.
pub struct Mylists<'a> {
    session: &'a Session,
}

impl<'a> Mylists<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn base(&self) -> String {
        format!("{}/v1/users/me/mylists", self.session.endpoints.nvapi)
    }

    fn items_url(&self, mylist_id: u64) -> String {
        format!("{}/{}/items", self.base(), mylist_id)
    }

    /// Every mylist the user owns. Not paginated upstream.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self) -> Result<Vec<Mylist>> {
        let spec = RequestSpec::get(self.base())?;
        let index: MylistIndex = self
            .session
            .pipeline
            .fetch(&spec, &self.session.credential)
            .await?;
        Ok(index.mylists)
    }

    /// One page of a mylist's entries.
    #[instrument(skip(self), level = "debug")]
    pub async fn items(&self, mylist_id: u64, query: PageQuery) -> Result<PageResult<MylistItem>> {
        let spec = RequestSpec::get(format!("{}/{}", self.base(), mylist_id))?;
        fetch_page(
            &self.session.pipeline,
            &self.session.credential,
            spec,
            query,
            |data: MylistContents| (data.mylist.items, data.mylist.total_item_count),
        )
        .await
    }

    /// Add videos one at a time, in order.
    ///
    /// Each video is its own rate-limited request. The first failure is
    /// returned and the remaining videos are not attempted.
    #[instrument(skip(self, video_ids), fields(count = video_ids.len()), level = "debug")]
    pub async fn add(&self, mylist_id: u64, video_ids: &[&str], description: &str) -> Result<()> {
        if let Some(blank) = video_ids.iter().position(|id| id.trim().is_empty()) {
            return Err(ApiError::Validation(format!(
                "video id at position {} is empty",
                blank
            )));
        }

        for (added, video_id) in video_ids.iter().enumerate() {
            let spec = RequestSpec::post(self.items_url(mylist_id))?
                .query("itemId", video_id)
                .query("description", description);

            if let Err(e) = self.session.pipeline.send(&spec, &self.session.credential).await {
                tracing::warn!(mylist_id, video_id, added, error = %e, "adding to mylist stopped");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove entries by item id in a single request.
    #[instrument(skip(self, item_ids), fields(count = item_ids.len()), level = "debug")]
    pub async fn remove(&self, mylist_id: u64, item_ids: &[u64]) -> Result<()> {
        if item_ids.is_empty() {
            return Ok(());
        }

        let joined = item_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let spec = RequestSpec::delete(self.items_url(mylist_id))?.query("itemIds", joined);

        self.session
            .pipeline
            .send(&spec, &self.session.credential)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resources::tests::session;
    use crate::transport::Method;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    fn ok() -> serde_json::Value {
        json!({"meta": {"status": 200}})
    }

    #[tokio::test]
    async fn test_list() {
        let (session, mock) = session(MockTransport::new().respond(
            200,
            json!({
                "meta": {"status": 200},
                "data": {"mylists": [
                    {"id": 7, "name": "favorites", "isPublic": true, "itemsCount": 12},
                    {"id": 8, "name": "later"}
                ]}
            }),
        ));
        let lists = Mylists::new(&session).list().await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].name, "favorites");
        assert!(lists[0].is_public);
        assert_eq!(lists[0].items_count, 12);
        assert_eq!(mock.requests()[0].url.as_str(), "https://nvapi.example.jp/v1/users/me/mylists");
    }

    #[tokio::test]
    async fn test_items_page() {
        let (session, mock) = session(MockTransport::new().respond(
            200,
            json!({
                "meta": {"status": 200},
                "data": {"mylist": {
                    "id": 7,
                    "totalItemCount": 5,
                    "items": [{"itemId": 101, "watchId": "sm9"}, {"itemId": 102, "watchId": "sm10"}]
                }}
            }),
        ));
        let page = Mylists::new(&session)
            .items(7, PageQuery::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total_count, 5);
        assert!(page.has_more);
        assert_eq!(page.items[1].watch_id, "sm10");

        let request = &mock.requests()[0];
        assert_eq!(request.url.as_str(), "https://nvapi.example.jp/v1/users/me/mylists/7");
        assert_eq!(request.query_param("pageSize"), Some("2"));
    }

    #[tokio::test]
    async fn test_add_one_request_per_video() {
        let (session, mock) = session(MockTransport::new().respond(201, ok()).respond(200, ok()).respond(200, ok()));
        Mylists::new(&session)
            .add(7, &["sm1", "sm2", "sm3"], "memo")
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        for (request, id) in requests.iter().zip(["sm1", "sm2", "sm3"]) {
            assert_eq!(request.method, Method::Post);
            assert_eq!(request.url.as_str(), "https://nvapi.example.jp/v1/users/me/mylists/7/items");
            assert_eq!(request.query_param("itemId"), Some(id));
            assert_eq!(request.query_param("description"), Some("memo"));
        }
    }

    #[tokio::test]
    async fn test_add_stops_at_first_error() {
        let (session, mock) = session(
            MockTransport::new()
                .respond(200, ok())
                .respond(200, json!({"meta": {"status": 404, "errorMessage": "no such video"}})),
        );
        let err = Mylists::new(&session)
            .add(7, &["sm1", "sm404", "sm3"], "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_ids_up_front() {
        let (session, mock) = session(MockTransport::new());
        let err = Mylists::new(&session)
            .add(7, &["sm1", " "], "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_remove_single_batched_request() {
        let (session, mock) = session(MockTransport::new().respond(200, ok()));
        Mylists::new(&session)
            .remove(7, &[101, 102, 103])
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].query_param("itemIds"), Some("101,102,103"));
    }

    #[tokio::test]
    async fn test_remove_nothing_is_noop() {
        let (session, mock) = session(MockTransport::new());
        Mylists::new(&session).remove(7, &[]).await.unwrap();
        assert!(mock.requests().is_empty());
    }
}
