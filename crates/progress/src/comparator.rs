//! Field-by-field comparison of two progress snapshots.

use std::collections::BTreeMap;

use cohortboard_core::{Curriculum, ProgressSnapshot};
use serde::Serialize;

/// Change in one module between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDiff {
    /// Raw value in the current snapshot
    pub current: f64,

    /// Raw value in the previous snapshot; 0 when the module had no prior
    /// record (starting point, not "unknown")
    pub previous: f64,

    /// `current - previous`
    pub delta: f64,

    /// `delta / previous * 100`; `None` when the previous value was 0,
    /// where a percentage change is undefined rather than infinite
    pub pct_change: Option<f64>,
}

/// Diff `current` against `previous`, module by module.
///
/// Only modules present in `current` are considered, raw stored values are
/// compared, and zero deltas are omitted: an empty result means "nothing to
/// report". A missing baseline yields an empty map, which callers render as
/// zero diff rather than an error.
pub fn diff_snapshots(
    curriculum: &Curriculum,
    current: &ProgressSnapshot,
    previous: Option<&ProgressSnapshot>,
) -> BTreeMap<String, ModuleDiff> {
    let mut diffs = BTreeMap::new();
    let Some(previous) = previous else {
        return diffs;
    };

    for module in curriculum.module_names() {
        let Some(current_value) = current.score(module) else {
            continue;
        };
        let previous_value = previous.score(module).unwrap_or(0.0);
        let delta = current_value - previous_value;
        if delta == 0.0 {
            continue;
        }

        let pct_change = if previous_value > 0.0 {
            Some(delta / previous_value * 100.0)
        } else {
            None
        };
        diffs.insert(
            module.to_string(),
            ModuleDiff {
                current: current_value,
                previous: previous_value,
                delta,
                pct_change,
            },
        );
    }
    diffs
}
