//! Normalized output of a collection pass.

use flowpulse_core::{Platform, TrendDirection};
use rust_decimal::Decimal;

use crate::error::FetchError;

/// Metric observation attached to a collected item.
///
/// Ratio fields are rounded to 6 decimal places, engagement to 4, growth to
/// 2, all by the shared normalizer in `flowpulse_core::metrics`. Fields with
/// no meaning for a platform stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectedMetrics {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub like_to_view_ratio: Decimal,
    pub comment_to_view_ratio: Decimal,
    pub engagement_score: Decimal,
    pub replies: Option<i64>,
    pub participants: Option<i64>,
    pub search_volume: Option<i64>,
    pub trend_direction: Option<TrendDirection>,
    pub growth_percentage: Option<Decimal>,
}

/// One item observed on one platform for one country.
#[derive(Debug, Clone)]
pub struct CollectedItem {
    pub name: String,
    pub platform: Platform,
    pub platform_id: String,
    pub country: String,
    pub metrics: CollectedMetrics,
}

/// Result of one `(platform, country)` collection pass.
///
/// Carries whatever was gathered before any transport failure; `error` set
/// means the pass was aborted partway and the caller should record the run
/// as failed while still persisting `items`.
#[derive(Debug)]
pub struct CollectOutcome {
    pub items: Vec<CollectedItem>,
    pub error: Option<FetchError>,
}

impl CollectOutcome {
    pub fn ok(items: Vec<CollectedItem>) -> Self {
        Self { items, error: None }
    }

    pub fn aborted(items: Vec<CollectedItem>, error: FetchError) -> Self {
        Self {
            items,
            error: Some(error),
        }
    }
}
