//! Repository trait abstraction.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use cohortboard_core::{NewReview, ProgressSnapshot, ReviewFilter, ReviewRecord, Student, StudentId};

/// Error type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Page size used by the provided `list_reviews` pagination loop.
pub const REVIEW_PAGE_SIZE: usize = 1000;

/// Errors that can occur during repository operations.
///
/// Failures of the underlying store propagate unchanged to the caller; the
/// analytics crates perform no retries.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Repository abstraction for cohortboard data.
///
/// This trait is the boundary with the data store. Implementations are
/// shared behind `Arc<dyn Repository>` and injected into the analytics
/// services, so a test double can be substituted freely.
#[async_trait]
pub trait Repository: Send + Sync {
    // === Roster operations ===

    /// Load a student by ID.
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>>;

    /// Load a student by login handle (the roster import match key).
    async fn get_student_by_login(&self, login: &str) -> Result<Option<Student>>;

    /// List students, optionally restricted to active ones.
    async fn list_students(&self, active_only: bool) -> Result<Vec<Student>>;

    /// Create or update a student, matched by login handle.
    ///
    /// On re-import the existing row keeps its id and creation time;
    /// students are never hard-deleted.
    async fn upsert_student(&self, student: Student) -> Result<Student>;

    // === Snapshot operations ===

    /// Load the snapshot for a student on an exact date.
    async fn get_snapshot(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>>;

    /// The snapshot with the highest snapshot date (not insertion time).
    async fn latest_snapshot(&self, student_id: StudentId) -> Result<Option<ProgressSnapshot>>;

    /// The snapshot with the lowest snapshot date.
    async fn earliest_snapshot(&self, student_id: StudentId) -> Result<Option<ProgressSnapshot>>;

    /// The most recent snapshot strictly before `date`.
    async fn closest_snapshot_before(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>>;

    /// Latest snapshot for each of the given students, in one batched call.
    ///
    /// Roster-wide consumers must use this instead of one `latest_snapshot`
    /// round trip per student. Students without any snapshot are absent
    /// from the map.
    async fn latest_snapshots(
        &self,
        student_ids: &[StudentId],
    ) -> Result<HashMap<StudentId, ProgressSnapshot>>;

    /// Update the snapshot for (student, date) if one exists, else insert.
    ///
    /// This is what keeps the one-snapshot-per-student-per-date invariant.
    async fn upsert_snapshot(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        scores: BTreeMap<String, f64>,
    ) -> Result<ProgressSnapshot>;

    // === Review operations ===

    /// Append a review record. Reviews are never updated or deleted.
    async fn create_review(&self, review: NewReview) -> Result<ReviewRecord>;

    /// One page of matching reviews, newest first.
    ///
    /// Ordering must be deterministic so that consecutive pages tile the
    /// full result set.
    async fn list_reviews_page(
        &self,
        filter: &ReviewFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReviewRecord>>;

    /// All matching reviews, newest first.
    ///
    /// Concatenates pages until a short page, so callers see an unbounded
    /// result set regardless of any page-size cap underneath.
    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>> {
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .list_reviews_page(filter, offset, REVIEW_PAGE_SIZE)
                .await?;
            let fetched = page.len();
            all.extend(page);
            if fetched < REVIEW_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }
        Ok(all)
    }
}
