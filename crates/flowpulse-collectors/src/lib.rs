//! Per-source popularity collectors.
//!
//! Each collector wraps one upstream HTTP surface (YouTube Data API, a
//! Discourse forum, Google Trends) behind the [`SourceCollector`] trait and
//! paces its own requests through a [`RateLimiter`]. Collectors gather
//! normalized [`CollectedItem`]s; persistence happens elsewhere.

pub mod error;
pub mod forum;
mod http;
pub mod rate_limit;
pub mod source;
pub mod trends;
pub mod types;
pub mod youtube;

pub use error::{BuildError, FetchError};
pub use forum::ForumCollector;
pub use rate_limit::{Quota, RateLimiter};
pub use source::SourceCollector;
pub use trends::TrendsCollector;
pub use types::{CollectOutcome, CollectedItem, CollectedMetrics};
pub use youtube::YoutubeCollector;
