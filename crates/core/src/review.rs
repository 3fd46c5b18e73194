//! Review records written by reviewers about students.

use serde::{Deserialize, Serialize};

use crate::id::{ReviewId, StudentId};
use crate::Time;

/// A daily progress note written by a reviewer about a student.
///
/// Review records are append-only: created once, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Unique identifier
    pub id: ReviewId,

    /// Who wrote the review (a staff row in the roster)
    pub reviewer_id: StudentId,

    /// Who the review is about
    pub student_id: StudentId,

    /// When the review was written (UTC)
    pub written_at: Time,

    /// What happened since the last review
    pub retrospective: String,

    /// What is planned next
    pub plan: String,

    /// Feedback for the student
    pub feedback: String,
}

/// Fields for creating a review; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewReview {
    /// Who is writing the review
    pub reviewer_id: StudentId,

    /// Who the review is about
    pub student_id: StudentId,

    /// What happened since the last review
    pub retrospective: String,

    /// What is planned next
    pub plan: String,

    /// Feedback for the student
    pub feedback: String,
}

/// Filter for review queries. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    /// Only reviews about this student
    pub student_id: Option<StudentId>,

    /// Only reviews written by this reviewer
    pub reviewer_id: Option<StudentId>,

    /// Only reviews written at or after this instant
    pub since: Option<Time>,
}

impl ReviewFilter {
    /// Whether a record passes this filter.
    pub fn matches(&self, record: &ReviewRecord) -> bool {
        if let Some(student_id) = self.student_id {
            if record.student_id != student_id {
                return false;
            }
        }
        if let Some(reviewer_id) = self.reviewer_id {
            if record.reviewer_id != reviewer_id {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.written_at < since {
                return false;
            }
        }
        true
    }
}
