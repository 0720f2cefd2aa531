use tracing::instrument;

use super::Session;
use crate::error::{ApiError, Result};
use crate::pagination::{OffsetQuery, PageResult, fetch_offset};
use crate::pipeline::RequestSpec;
use crate::types::{LiveHistory, LiveProgram};

/// Live broadcasts hosted by a user.
pub struct Lives<'a> {
    session: &'a Session,
}

impl<'a> Lives<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Broadcast history for `user_id`, including non-public programs.
    ///
    /// `has_more` comes from the offset arithmetic only.
    #[instrument(skip(self), level = "debug")]
    pub async fn history(&self, user_id: &str, query: OffsetQuery) -> Result<PageResult<LiveProgram>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ApiError::Validation("user id must not be empty".into()));
        }

        let spec = RequestSpec::get(format!(
            "{}/front/api/v1/user-broadcast-history",
            self.session.endpoints.live
        ))?
        .query("providerId", user_id)
        .query("providerType", "user")
        .query("isIncludeNonPublic", true)
        .query("withTotalCount", true);

        fetch_offset(
            &self.session.pipeline,
            &self.session.credential,
            spec,
            query,
            |data: LiveHistory| (data.programs_list, data.total_count),
        )
        .await
    }
}
