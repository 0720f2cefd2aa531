//! Pagination contract shared by every list resource.
//!
//! The upstream uses two addressing schemes depending on the service:
//! `page`/`pageSize` (videos, mylist items) and `offset`/`limit` (lives,
//! earnings). They are kept as separate types because the query parameters
//! and the "is there more" arithmetic differ. In both cases `has_more` is
//! computed locally; upstream `hasNext` flags are ignored.

use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::error::Result;
use crate::pipeline::{RequestPipeline, RequestSpec};

/// One page of a list resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub has_more: bool,
}

/// `page`/`pageSize` addressing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
}

impl PageQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn has_more(&self, total_count: u64) -> bool {
        page_has_more(self.page, self.page_size, total_count)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(1, 100)
    }
}

/// `offset`/`limit` addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetQuery {
    pub offset: u32,
    pub limit: u32,
}

impl OffsetQuery {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    pub fn has_more(&self, total_count: u64, returned: usize) -> bool {
        offset_has_more(self.offset, self.limit, total_count, returned)
    }
}

impl Default for OffsetQuery {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

/// `page < ceil(total / page_size)`; never true for a zero page size.
pub fn page_has_more(page: u32, page_size: u32, total_count: u64) -> bool {
    if page_size == 0 {
        return false;
    }
    let total_pages = total_count.div_ceil(u64::from(page_size));
    u64::from(page) < total_pages
}

/// `offset + limit < total` and the page was not empty.
///
/// The second condition guards against endpoints whose total count claims
/// more data while returning an empty page.
pub fn offset_has_more(offset: u32, limit: u32, total_count: u64, returned: usize) -> bool {
    if limit == 0 {
        return false;
    }
    u64::from(offset) + u64::from(limit) < total_count && returned > 0
}

/// Cursor over successive pages.
pub trait Cursor: Copy {
    /// The query for the page after this one, or `None` once the cursor
    /// cannot move any further.
    fn advance(self) -> Option<Self>;
}

impl Cursor for PageQuery {
    fn advance(self) -> Option<Self> {
        Some(Self {
            page: self.page.checked_add(1)?,
            ..self
        })
    }
}

impl Cursor for OffsetQuery {
    fn advance(self) -> Option<Self> {
        if self.limit == 0 {
            return None;
        }
        Some(Self {
            offset: self.offset.checked_add(self.limit)?,
            ..self
        })
    }
}

/// Fetch one page of a `page`/`pageSize` resource.
///
/// `extract` pulls the items and total count out of the decoded payload.
pub async fn fetch_page<D, T>(
    pipeline: &RequestPipeline,
    credential: &Credential,
    spec: RequestSpec,
    query: PageQuery,
    extract: impl FnOnce(D) -> (Vec<T>, u64),
) -> Result<PageResult<T>>
where
    D: DeserializeOwned,
{
    let spec = spec
        .query("pageSize", query.page_size)
        .query("page", query.page);
    let data: D = pipeline.fetch(&spec, credential).await?;
    let (items, total_count) = extract(data);

    Ok(PageResult {
        has_more: query.has_more(total_count),
        items,
        total_count,
    })
}

/// Fetch one page of an `offset`/`limit` resource.
pub async fn fetch_offset<D, T>(
    pipeline: &RequestPipeline,
    credential: &Credential,
    spec: RequestSpec,
    query: OffsetQuery,
    extract: impl FnOnce(D) -> (Vec<T>, u64),
) -> Result<PageResult<T>>
where
    D: DeserializeOwned,
{
    let spec = spec
        .query("offset", query.offset)
        .query("limit", query.limit);
    let data: D = pipeline.fetch(&spec, credential).await?;
    let (items, total_count) = extract(data);

    Ok(PageResult {
        has_more: query.has_more(total_count, items.len()),
        items,
        total_count,
    })
}

/// Stream every item, fetching pages lazily until `has_more` is false or
/// the cursor is exhausted.
///
/// The stream ends after yielding the first error.
pub fn paginate<Q, T, F, Fut>(first: Q, mut fetch: F) -> impl Stream<Item = Result<T>>
where
    Q: Cursor,
    F: FnMut(Q) -> Fut,
    Fut: Future<Output = Result<PageResult<T>>>,
{
    stream::unfold(Some(first), move |state| {
        let pending = state.map(|query| (query, fetch(query)));
        async move {
            let (query, page) = pending?;
            match page.await {
                Ok(page) => {
                    let next = if page.has_more { query.advance() } else { None };
                    Some((Ok(page.items), next))
                }
                Err(e) => Some((Err(e), None)),
            }
        }
    })
    .flat_map(|page| match page {
        Ok(items) => stream::iter(items.into_iter().map(Ok)).left_stream(),
        Err(e) => stream::iter(std::iter::once(Err(e))).right_stream(),
    })
}
