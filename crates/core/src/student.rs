//! Student roster model.

use serde::{Deserialize, Serialize};

use crate::id::StudentId;
use crate::performance::PerformanceResult;
use crate::Time;

/// A student enrolled in the program.
///
/// Students are created by roster import and updated on re-import, matched
/// by login handle. They are never hard-deleted; `active` is a soft status
/// flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier
    pub id: StudentId,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Email address
    pub email: String,

    /// Login handle, unique across the roster (import match key)
    pub login: String,

    /// Cohort name, if assigned
    pub cohort: Option<String>,

    /// Soft status flag; inactive students stay in the store
    pub active: bool,

    /// Last login on the learning platform, if known
    pub last_login: Option<Time>,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl Student {
    /// Display name as "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A student paired with their computed performance and leaderboard rank.
///
/// Explicit composed type; the `Student` itself stays immutable and never
/// grows derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct StudentWithPerformance {
    /// The roster entry
    pub student: Student,

    /// Derived performance figures (recomputed per request, not persisted)
    pub performance: PerformanceResult,

    /// 1-based position in the canonical leaderboard order
    pub rank: usize,
}
