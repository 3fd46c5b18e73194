//! In-memory repository implementation.
//!
//! The injectable test double for the analytics crates, and a convenient
//! backend for throwaway environments. Data lives in `tokio::sync::RwLock`
//! maps and is lost on drop.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use cohortboard_core::{
    NewReview, ProgressSnapshot, ReviewFilter, ReviewId, ReviewRecord, SnapshotId, Student,
    StudentId,
};
use tokio::sync::RwLock;

use super::{Repository, Result};

/// In-memory repository backend.
#[derive(Default)]
pub struct MemoryStorage {
    students: RwLock<HashMap<StudentId, Student>>,
    snapshots: RwLock<HashMap<StudentId, BTreeMap<NaiveDate, ProgressSnapshot>>>,
    reviews: RwLock<Vec<ReviewRecord>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed review record, keeping its id and timestamp.
    ///
    /// `create_review` always stamps the current instant; tests and
    /// backfills need to place records at explicit points in time.
    pub async fn seed_review(&self, record: ReviewRecord) {
        self.reviews.write().await.push(record);
    }
}

fn sort_newest_first(reviews: &mut [ReviewRecord]) {
    reviews.sort_by(|a, b| b.written_at.cmp(&a.written_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl Repository for MemoryStorage {
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        Ok(self.students.read().await.get(&id).cloned())
    }

    async fn get_student_by_login(&self, login: &str) -> Result<Option<Student>> {
        Ok(self
            .students
            .read()
            .await
            .values()
            .find(|s| s.login == login)
            .cloned())
    }

    async fn list_students(&self, active_only: bool) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = self
            .students
            .read()
            .await
            .values()
            .filter(|s| !active_only || s.active)
            .cloned()
            .collect();
        students.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(students)
    }

    async fn upsert_student(&self, mut student: Student) -> Result<Student> {
        let mut students = self.students.write().await;
        let existing = students
            .values()
            .find(|s| s.login == student.login)
            .map(|s| (s.id, s.created_at));

        if let Some((id, created_at)) = existing {
            student.id = id;
            student.created_at = created_at;
            student.updated_at = Utc::now();
        }
        students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn get_snapshot(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&student_id)
            .and_then(|by_date| by_date.get(&date))
            .cloned())
    }

    async fn latest_snapshot(&self, student_id: StudentId) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&student_id)
            .and_then(|by_date| by_date.values().next_back())
            .cloned())
    }

    async fn earliest_snapshot(&self, student_id: StudentId) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&student_id)
            .and_then(|by_date| by_date.values().next())
            .cloned())
    }

    async fn closest_snapshot_before(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&student_id)
            .and_then(|by_date| by_date.range(..date).next_back().map(|(_, s)| s.clone())))
    }

    async fn latest_snapshots(
        &self,
        student_ids: &[StudentId],
    ) -> Result<HashMap<StudentId, ProgressSnapshot>> {
        let snapshots = self.snapshots.read().await;
        let mut latest = HashMap::new();
        for id in student_ids {
            if let Some(snapshot) = snapshots.get(id).and_then(|by_date| by_date.values().next_back())
            {
                latest.insert(*id, snapshot.clone());
            }
        }
        Ok(latest)
    }

    async fn upsert_snapshot(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        scores: BTreeMap<String, f64>,
    ) -> Result<ProgressSnapshot> {
        let mut snapshots = self.snapshots.write().await;
        let by_date = snapshots.entry(student_id).or_default();

        let snapshot = match by_date.get(&date) {
            // Same-date overwrite keeps the original id and creation time.
            Some(existing) => ProgressSnapshot {
                id: existing.id,
                student_id,
                snapshot_date: date,
                scores,
                created_at: existing.created_at,
            },
            None => ProgressSnapshot {
                id: SnapshotId::new(),
                student_id,
                snapshot_date: date,
                scores,
                created_at: Utc::now(),
            },
        };
        by_date.insert(date, snapshot.clone());
        Ok(snapshot)
    }

    async fn create_review(&self, review: NewReview) -> Result<ReviewRecord> {
        let record = ReviewRecord {
            id: ReviewId::new(),
            reviewer_id: review.reviewer_id,
            student_id: review.student_id,
            written_at: Utc::now(),
            retrospective: review.retrospective,
            plan: review.plan,
            feedback: review.feedback,
        };
        self.reviews.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_reviews_page(
        &self,
        filter: &ReviewFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReviewRecord>> {
        let mut matching: Vec<ReviewRecord> = self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}
