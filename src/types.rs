//! Response payloads.
//!
//! Only the fields the client itself relies on are typed. Everything else the
//! upstream sends is kept in `extra` so callers can still reach it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pagination::PageResult;
use crate::period::EarningsPeriod;

/// `data` of the owned-videos listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<VideoListItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoListItem {
    pub essential: Video,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub registered_at: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub count: Option<VideoCount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCount {
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub comment: u64,
    #[serde(default)]
    pub mylist: u64,
    #[serde(default)]
    pub like: u64,
}

/// `data` of the live-broadcast history endpoint.
///
/// The upstream also sends a `hasNext` flag; it is unreliable and left in
/// `extra` rather than used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveHistory {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub programs_list: Vec<LiveProgram>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveProgram {
    #[serde(default)]
    pub id: Option<LiveProgramId>,
    #[serde(default)]
    pub program: Option<LiveProgramDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LiveProgram {
    /// The `lv...` identifier, if present.
    pub fn program_id(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveProgramId {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveProgramDetails {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `data` of the monthly earnings endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub items: Vec<EarningsItem>,
}

/// Earnings attributed to one work in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsItem {
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of earnings for a resolved month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Earnings {
    pub period: EarningsPeriod,
    pub total_amount: Option<f64>,
    pub page: PageResult<EarningsItem>,
}

/// `data` of the mylist index.
#[derive(Debug, Clone, Deserialize)]
pub struct MylistIndex {
    #[serde(default)]
    pub mylists: Vec<Mylist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mylist {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub items_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `data` of a single mylist's contents.
#[derive(Debug, Clone, Deserialize)]
pub struct MylistContents {
    pub mylist: MylistPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MylistPage {
    pub id: u64,
    #[serde(default)]
    pub total_item_count: u64,
    #[serde(default)]
    pub items: Vec<MylistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MylistItem {
    pub item_id: u64,
    #[serde(default)]
    pub watch_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-video analytics over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalytics {
    #[serde(default)]
    pub summary: AnalyticsMetrics,
    #[serde(default)]
    pub daily: Vec<DailyAnalytics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsMetrics {
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub mylist_count: u64,
    #[serde(default)]
    pub like_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalytics {
    pub date: String,
    #[serde(flatten)]
    pub metrics: AnalyticsMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_list_keeps_unknown_fields() {
        let list: VideoList = serde_json::from_value(json!({
            "totalCount": 1,
            "items": [{
                "essential": {
                    "id": "sm9",
                    "title": "first",
                    "registeredAt": "2007-03-06T00:33:00+09:00",
                    "count": {"view": 10, "comment": 2, "mylist": 1, "like": 3},
                    "isDeleted": false
                },
                "series": null
            }]
        }))
        .unwrap();

        let video = &list.items[0].essential;
        assert_eq!(video.id, "sm9");
        assert_eq!(video.count.unwrap().like, 3);
        assert_eq!(video.extra["isDeleted"], json!(false));
        assert!(list.items[0].extra.contains_key("series"));
    }

    #[test]
    fn test_live_program_id() {
        let history: LiveHistory = serde_json::from_value(json!({
            "totalCount": 3,
            "hasNext": true,
            "programsList": [{"id": {"value": "lv1"}, "program": {"title": "hi"}}, {}]
        }))
        .unwrap();
        assert_eq!(history.programs_list[0].program_id(), Some("lv1"));
        assert_eq!(history.programs_list[1].program_id(), None);
        assert_eq!(history.extra["hasNext"], json!(true));
    }

    #[test]
    fn test_daily_analytics_flatten() {
        let analytics: VideoAnalytics = serde_json::from_value(json!({
            "summary": {"viewCount": 100},
            "daily": [{"date": "2024-06-01", "viewCount": 40, "likeCount": 2}]
        }))
        .unwrap();
        assert_eq!(analytics.summary.view_count, 100);
        assert_eq!(analytics.daily[0].metrics.like_count, 2);
        assert_eq!(analytics.daily[0].date, "2024-06-01");
    }
}
