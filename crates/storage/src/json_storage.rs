//! JSON file repository implementation.
//!
//! Stores data as JSON files under a root directory: one file per student,
//! one file per review, and one file per (student, date) snapshot under a
//! per-student subdirectory. Snapshot file names are ISO dates, so the
//! per-date uniqueness invariant falls out of the filesystem.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use cohortboard_core::{
    NewReview, ProgressSnapshot, ReviewFilter, ReviewId, ReviewRecord, SnapshotId, Student,
    StudentId,
};
use tokio::fs;
use tracing::debug;

use super::{Repository, Result, StorageError};

/// File-based JSON repository backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at the given directory, creating the
    /// `students/`, `snapshots/`, and `reviews/` subdirectories as needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("students")).await?;
        fs::create_dir_all(root.join("snapshots")).await?;
        fs::create_dir_all(root.join("reviews")).await?;

        Ok(Self { root })
    }

    fn student_path(&self, id: StudentId) -> PathBuf {
        self.root.join("students").join(format!("{}.json", id))
    }

    fn snapshot_dir(&self, student_id: StudentId) -> PathBuf {
        self.root.join("snapshots").join(student_id.to_string())
    }

    fn snapshot_path(&self, student_id: StudentId, date: NaiveDate) -> PathBuf {
        self.snapshot_dir(student_id).join(format!("{}.json", date))
    }

    fn review_path(&self, id: ReviewId) -> PathBuf {
        self.root.join("reviews").join(format!("{}.json", id))
    }

    /// All snapshots for one student, ordered by snapshot date ascending.
    async fn student_snapshots(&self, student_id: StudentId) -> Result<Vec<ProgressSnapshot>> {
        let mut snapshots: Vec<ProgressSnapshot> =
            list_dir(&self.snapshot_dir(student_id)).await?;
        snapshots.sort_by_key(|s| s.snapshot_date);
        Ok(snapshots)
    }
}

#[async_trait]
impl Repository for JsonStorage {
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        read_json(&self.student_path(id)).await
    }

    async fn get_student_by_login(&self, login: &str) -> Result<Option<Student>> {
        let students: Vec<Student> = list_dir(&self.root.join("students")).await?;
        Ok(students.into_iter().find(|s| s.login == login))
    }

    async fn list_students(&self, active_only: bool) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = list_dir(&self.root.join("students")).await?;
        if active_only {
            students.retain(|s| s.active);
        }
        students.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(students)
    }

    async fn upsert_student(&self, mut student: Student) -> Result<Student> {
        if let Some(existing) = self.get_student_by_login(&student.login).await? {
            student.id = existing.id;
            student.created_at = existing.created_at;
            student.updated_at = Utc::now();
        }
        let json = serde_json::to_string_pretty(&student)?;
        fs::write(self.student_path(student.id), json.as_bytes()).await?;
        debug!(id = %student.id, login = %student.login, "stored student");
        Ok(student)
    }

    async fn get_snapshot(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        read_json(&self.snapshot_path(student_id, date)).await
    }

    async fn latest_snapshot(&self, student_id: StudentId) -> Result<Option<ProgressSnapshot>> {
        Ok(self.student_snapshots(student_id).await?.pop())
    }

    async fn earliest_snapshot(&self, student_id: StudentId) -> Result<Option<ProgressSnapshot>> {
        Ok(self.student_snapshots(student_id).await?.into_iter().next())
    }

    async fn closest_snapshot_before(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .student_snapshots(student_id)
            .await?
            .into_iter()
            .rev()
            .find(|s| s.snapshot_date < date))
    }

    async fn latest_snapshots(
        &self,
        student_ids: &[StudentId],
    ) -> Result<HashMap<StudentId, ProgressSnapshot>> {
        let mut latest = HashMap::new();
        for id in student_ids {
            if let Some(snapshot) = self.latest_snapshot(*id).await? {
                latest.insert(*id, snapshot);
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
        fs::create_dir_all(self.snapshot_dir(student_id)).await?;

        let existing: Option<ProgressSnapshot> =
            read_json(&self.snapshot_path(student_id, date)).await?;
        let snapshot = match existing {
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

        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(self.snapshot_path(student_id, date), json.as_bytes()).await?;
        debug!(student = %student_id, %date, "stored snapshot");
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
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(self.review_path(record.id), json.as_bytes()).await?;
        debug!(id = %record.id, student = %record.student_id, "stored review");
        Ok(record)
    }

    async fn list_reviews_page(
        &self,
        filter: &ReviewFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReviewRecord>> {
        let mut matching: Vec<ReviewRecord> = list_dir(&self.root.join("reviews"))
            .await?
            .into_iter()
            .filter(|r: &ReviewRecord| filter.matches(r))
            .collect();
        matching.sort_by(|a, b| b.written_at.cmp(&a.written_at).then(b.id.cmp(&a.id)));
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Io(e)),
    }
}

/// Read every `.json` file in a directory; a missing directory is empty.
async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
        Err(e) => return Err(StorageError::Io(e)),
    };
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(item) = read_json(&entry.path()).await? {
            items.push(item);
        }
    }
    Ok(items)
}
