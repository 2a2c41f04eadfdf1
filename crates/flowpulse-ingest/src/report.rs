use flowpulse_core::Platform;
use serde::Serialize;

/// Terminal state of one `(platform, country)` unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Succeeded,
    Failed,
}

/// Per-unit outcome returned by the orchestrator.
///
/// `items_collected` counts items actually persisted, which can be non-zero
/// even on a failed unit (partial progress before a transport failure or
/// cancellation is kept).
#[derive(Debug, Clone, Serialize)]
pub struct UnitResult {
    pub platform: Platform,
    pub country: String,
    pub items_collected: i32,
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
