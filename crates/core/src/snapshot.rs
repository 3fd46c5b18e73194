//! Dated progress snapshots.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::{SnapshotId, StudentId};
use crate::Time;

/// A dated record of one student's completion percentage per module.
///
/// At most one snapshot exists per (student, date); the storage layer
/// enforces this with upsert-on-conflict semantics. A module absent from
/// `scores` means "not started / not applicable", which is distinct from a
/// stored 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Unique identifier
    pub id: SnapshotId,

    /// Owning student
    pub student_id: StudentId,

    /// The date this snapshot describes (not the insertion time)
    pub snapshot_date: NaiveDate,

    /// Completion percentage per module name.
    ///
    /// Import data is dirty; non-numeric stored values decode as absent
    /// rather than failing the whole record.
    #[serde(deserialize_with = "lenient_scores")]
    pub scores: BTreeMap<String, f64>,

    /// When created
    pub created_at: Time,
}

impl ProgressSnapshot {
    /// Raw stored completion value for a module, if any.
    pub fn score(&self, module: &str) -> Option<f64> {
        self.scores.get(module).copied()
    }
}

/// Clamp a raw completion value into [0, 100] for display.
///
/// Diffing always uses raw stored values; only rendering clamps.
pub fn display_score(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

/// Deserialize a score map, coercing null or non-numeric values to absent.
fn lenient_scores<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(module, value)| value.as_f64().map(|v| (module, v)))
        .collect())
}
