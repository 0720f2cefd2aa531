pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod pagination;
pub mod period;
pub mod pipeline;
pub mod proxy;
pub mod rate_limit;
pub mod resources;
pub mod transport;
pub mod types;

pub use client::NicoClient;
pub use config::{ClientConfig, Endpoints};
pub use credential::{Cookie, Credential};
pub use error::{ApiError, ErrorKind, Result};
pub use pagination::{OffsetQuery, PageQuery, PageResult, paginate};
pub use period::{Clock, EarningsPeriod, FixedClock, SystemClock};
pub use proxy::ProxyConfig;
pub use types::{Earnings, EarningsItem, LiveProgram, Mylist, MylistItem, Video, VideoAnalytics};
