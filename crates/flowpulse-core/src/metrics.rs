//! Metric normalization shared by every collector.
//!
//! All derived values are computed in fixed-point [`Decimal`] arithmetic and
//! rounded with [`RoundingStrategy::MidpointAwayFromZero`] (round half away
//! from zero) at the stated number of decimal places. Every division is
//! guarded: zero views yield zero ratios and a zero engagement score, and a
//! zero baseline yields zero growth, so no collector can hit a
//! division-by-zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept on like/comment-to-view ratios.
const RATIO_DECIMALS: u32 = 6;
/// Decimal places kept on engagement scores.
const ENGAGEMENT_DECIMALS: u32 = 4;
/// Decimal places kept on trend growth percentages.
const GROWTH_DECIMALS: u32 = 2;

fn round_to(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// `count / views` rounded to six decimal places, or zero when `views == 0`.
#[must_use]
pub fn ratio(count: i64, views: i64) -> Decimal {
    if views == 0 {
        return Decimal::ZERO;
    }
    round_to(Decimal::from(count) / Decimal::from(views), RATIO_DECIMALS)
}

/// Video engagement: `(likes * 2 + comments * 5) / views`, four decimal
/// places, zero when `views == 0`.
#[must_use]
pub fn video_engagement_score(views: i64, likes: i64, comments: i64) -> Decimal {
    if views == 0 {
        return Decimal::ZERO;
    }
    let weighted = Decimal::from(likes * 2 + comments * 5);
    round_to(weighted / Decimal::from(views), ENGAGEMENT_DECIMALS)
}

/// Forum engagement: `(views * 0.1 + likes * 5 + replies * 3 +
/// participants * 2) / 100`, four decimal places.
#[must_use]
pub fn forum_engagement_score(views: i64, likes: i64, replies: i64, participants: i64) -> Decimal {
    let tenth = Decimal::new(1, 1); // 0.1
    let weighted = Decimal::from(views) * tenth
        + Decimal::from(likes * 5 + replies * 3 + participants * 2);
    round_to(weighted / Decimal::from(100), ENGAGEMENT_DECIMALS)
}

/// Trend engagement: `avg_interest / 10`, four decimal places.
#[must_use]
pub fn trend_engagement_score(avg_interest: i64) -> Decimal {
    round_to(
        Decimal::from(avg_interest) / Decimal::from(10),
        ENGAGEMENT_DECIMALS,
    )
}

/// Search volume estimated from average interest.
#[must_use]
pub fn estimated_search_volume(avg_interest: i64) -> i64 {
    avg_interest.saturating_mul(100)
}

/// Percentage change from `older` to `recent`, two decimal places, zero when
/// the baseline is not positive.
#[must_use]
pub fn growth_percentage(older: i64, recent: i64) -> Decimal {
    if older <= 0 {
        return Decimal::ZERO;
    }
    let delta = Decimal::from(recent - older) / Decimal::from(older);
    round_to(delta * Decimal::from(100), GROWTH_DECIMALS)
}

/// Direction label derived from a growth percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Declining,
    Stable,
}

impl TrendDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rising above +20%, declining below -10%, stable otherwise.
#[must_use]
pub fn trend_direction(growth: Decimal) -> TrendDirection {
    if growth > Decimal::from(20) {
        TrendDirection::Rising
    } else if growth < Decimal::from(-10) {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Mean of `points` truncated toward zero; zero for an empty slice.
///
/// Interest points are 0..=100, so integer division matches truncation.
#[must_use]
pub fn truncated_mean(points: &[i64]) -> i64 {
    if points.is_empty() {
        return 0;
    }
    let sum: i64 = points.iter().sum();
    #[allow(clippy::cast_possible_wrap)]
    let count = points.len() as i64;
    sum / count
}

/// The three interest windows a trend series is reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestWindows {
    /// Truncated mean over the whole series.
    pub average: i64,
    /// Truncated mean over the last 7 points.
    pub recent: i64,
    /// Truncated mean over points 60 to 53 back from the end; zero when the
    /// series is too short to reach that window.
    pub older: i64,
}

/// Reduce an interest-over-time series to its comparison windows.
///
/// Window bounds are clamped to the series length, so short series produce
/// partial (or zero) older windows rather than panicking.
#[must_use]
pub fn interest_windows(points: &[i64]) -> InterestWindows {
    let len = points.len();
    let recent_start = len.saturating_sub(7);
    let older_start = len.saturating_sub(60);
    let older_end = len.saturating_sub(53);

    InterestWindows {
        average: truncated_mean(points),
        recent: truncated_mean(&points[recent_start..]),
        older: if older_start < older_end {
            truncated_mean(&points[older_start..older_end])
        } else {
            0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("decimal literal")
    }

    #[test]
    fn zero_views_guard_all_ratios() {
        assert_eq!(ratio(10, 0), Decimal::ZERO);
        assert_eq!(video_engagement_score(0, 50, 10), Decimal::ZERO);
    }

    #[test]
    fn video_engagement_reference_values() {
        // views=1000, likes=50, comments=10
        assert_eq!(ratio(50, 1000), dec("0.05"));
        assert_eq!(ratio(10, 1000), dec("0.01"));
        assert_eq!(video_engagement_score(1000, 50, 10), dec("0.15"));
    }

    #[test]
    fn forum_engagement_reference_value() {
        // (200*0.1 + 10*5 + 5*3 + 3*2) / 100 = 0.91
        assert_eq!(forum_engagement_score(200, 10, 5, 3), dec("0.91"));
    }

    #[test]
    fn ratio_rounds_half_away_from_zero_at_six_places() {
        // 1/1_600_000 = 0.000000625 -> 0.000001
        assert_eq!(ratio(1, 1_600_000), dec("0.000001"));
    }

    #[test]
    fn growth_and_direction_reference_values() {
        let rising = growth_percentage(50, 65);
        assert_eq!(rising, dec("30.00"));
        assert_eq!(trend_direction(rising), TrendDirection::Rising);

        let declining = growth_percentage(50, 40);
        assert_eq!(declining, dec("-20.00"));
        assert_eq!(trend_direction(declining), TrendDirection::Declining);

        let flat = growth_percentage(0, 99);
        assert_eq!(flat, Decimal::ZERO);
        assert_eq!(trend_direction(flat), TrendDirection::Stable);
    }

    #[test]
    fn direction_boundaries_are_exclusive() {
        assert_eq!(trend_direction(dec("20")), TrendDirection::Stable);
        assert_eq!(trend_direction(dec("20.01")), TrendDirection::Rising);
        assert_eq!(trend_direction(dec("-10")), TrendDirection::Stable);
        assert_eq!(trend_direction(dec("-10.01")), TrendDirection::Declining);
    }

    #[test]
    fn trend_engagement_and_volume() {
        assert_eq!(trend_engagement_score(42), dec("4.2000"));
        assert_eq!(estimated_search_volume(42), 4200);
    }

    #[test]
    fn truncated_mean_truncates_toward_zero() {
        assert_eq!(truncated_mean(&[1, 2]), 1); // 1.5 -> 1
        assert_eq!(truncated_mean(&[]), 0);
    }

    #[test]
    fn interest_windows_on_full_series() {
        // 90 points: value 10 everywhere except the last 7, which are 60.
        let mut points = vec![10_i64; 90];
        for value in points.iter_mut().skip(83) {
            *value = 60;
        }
        let windows = interest_windows(&points);
        assert_eq!(windows.recent, 60);
        assert_eq!(windows.older, 10); // points 30..37, all 10
        assert_eq!(windows.average, (83 * 10 + 7 * 60) / 90);
    }

    #[test]
    fn interest_windows_clamp_short_series() {
        // Too short to reach the 53-back boundary: older window is empty.
        let windows = interest_windows(&[50; 40]);
        assert_eq!(windows.older, 0);
        assert_eq!(windows.recent, 50);

        // 55 points: older window clamps to the first 2 points.
        let mut points = vec![80_i64; 2];
        points.extend(std::iter::repeat(20).take(53));
        let windows = interest_windows(&points);
        assert_eq!(windows.older, 80);
    }
}
