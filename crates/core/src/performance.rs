//! Derived performance types: the five-tier classification and the per
//! student performance figures.

use serde::{Deserialize, Serialize};

/// Performance classification derived from the performance ratio.
///
/// Thresholds are inclusive lower bounds on the ratio: 120, 90, 70, 50.
/// The five-way classification is a core invariant; the label, icon, and
/// css class are presentation metadata carried for the leaderboard badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceTier {
    /// Ratio >= 120: ahead of schedule
    Excellent,
    /// Ratio >= 90: on track
    Good,
    /// Ratio >= 70: slightly behind
    Normal,
    /// Ratio >= 50: behind
    Weak,
    /// Ratio < 50: far behind
    VeryWeak,
}

impl PerformanceTier {
    /// Classify a performance ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 120.0 {
            PerformanceTier::Excellent
        } else if ratio >= 90.0 {
            PerformanceTier::Good
        } else if ratio >= 70.0 {
            PerformanceTier::Normal
        } else if ratio >= 50.0 {
            PerformanceTier::Weak
        } else {
            PerformanceTier::VeryWeak
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Excellent",
            PerformanceTier::Good => "Good",
            PerformanceTier::Normal => "Normal",
            PerformanceTier::Weak => "Weak",
            PerformanceTier::VeryWeak => "Very weak",
        }
    }

    /// Badge icon.
    pub fn icon(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "🌟",
            PerformanceTier::Good => "👍",
            PerformanceTier::Normal => "📊",
            PerformanceTier::Weak => "⚠️",
            PerformanceTier::VeryWeak => "🔴",
        }
    }

    /// CSS class used by the leaderboard badges.
    pub fn css_class(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "better",
            PerformanceTier::Good => "good",
            PerformanceTier::Normal => "normal",
            PerformanceTier::Weak => "weak",
            PerformanceTier::VeryWeak => "very-weak",
        }
    }
}

/// Time-normalized performance figures for one student.
///
/// Recomputed on every leaderboard request; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceResult {
    /// Months since the student's earliest snapshot (fractional)
    pub months_enrolled: f64,

    /// Sum of raw completion values over leaderboard-eligible modules
    pub actual_progress: f64,

    /// Time-expected cumulative progress from the curriculum timeline
    pub expected_progress: f64,

    /// `actual / expected * 100`; exactly 100 when expected is 0
    pub performance_ratio: f64,

    /// `actual / (eligible module count * 100) * 100`, timing-independent
    pub completion_percentage: f64,

    /// Modules with a completion value >= 100
    pub modules_completed: usize,

    /// Modules with any completion value
    pub modules_active: usize,

    /// Tier classification of the performance ratio
    pub tier: PerformanceTier,
}
