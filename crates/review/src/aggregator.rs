//! Review log aggregation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, FixedOffset, LocalResult, Months, NaiveTime, TimeZone, Utc};
use cohortboard_core::{ReviewFilter, ReviewRecord, Student, StudentId, Time};
use cohortboard_storage::{Repository, Result};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

/// Display name used when a reviewer's roster lookup resolves nothing.
/// Such reviewers stay in the aggregation; they are never dropped.
pub const UNKNOWN_REVIEWER: &str = "Unknown reviewer";

/// The organization's fixed timezone (UTC+4). All day, week, and month
/// boundaries are local midnights in this zone, whatever the caller's
/// local zone is.
pub fn org_timezone() -> FixedOffset {
    FixedOffset::east_opt(4 * 3600).expect("offset in range")
}

/// Organization-wide review counts for the standard dashboard buckets.
///
/// Every bucket is computed independently from the same fixed "now" over
/// the full review log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewStatistics {
    /// All reviews ever written
    pub total: usize,

    /// Reviews written today (local midnight to local midnight)
    pub today: usize,

    /// Reviews written in the rolling last 7 days
    pub this_week: usize,

    /// Reviews written in the rolling last calendar month
    pub this_month: usize,
}

/// Per-reviewer activity for the dashboard's reviewer table.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewerActivity {
    /// The reviewer (a staff row in the roster)
    pub reviewer_id: StudentId,

    /// Display name, or a placeholder when the roster lookup fails
    pub name: String,

    /// All reviews this reviewer ever wrote
    pub total_reviews: usize,

    /// Reviews this reviewer wrote today
    pub today_reviews: usize,

    /// When this reviewer last wrote a review
    pub last_review: Option<Time>,
}

/// Computes review statistics over the full (transparently paginated)
/// review log. Stateless between calls; repository injected.
pub struct ReviewAggregator {
    repository: Arc<dyn Repository>,
    zone: FixedOffset,
}

impl ReviewAggregator {
    /// Create an aggregator using the organization's standard timezone.
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self::with_zone(repository, org_timezone())
    }

    /// Create an aggregator with an explicit fixed zone.
    pub fn with_zone(repository: Arc<dyn Repository>, zone: FixedOffset) -> Self {
        Self { repository, zone }
    }

    /// The UTC instant of local midnight on `now`'s local date.
    fn local_midnight(&self, now: Time) -> Time {
        let local_date = now.with_timezone(&self.zone).date_naive();
        let midnight = local_date.and_time(NaiveTime::MIN);
        match self.zone.from_local_datetime(&midnight) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            // A fixed offset maps every local time exactly once.
            _ => now,
        }
    }

    /// Local midnight one calendar month back (clamped day-of-month).
    fn month_back(&self, now: Time) -> Time {
        let local_date = now.with_timezone(&self.zone).date_naive();
        let month_ago = local_date
            .checked_sub_months(Months::new(1))
            .unwrap_or(local_date);
        let midnight = month_ago.and_time(NaiveTime::MIN);
        match self.zone.from_local_datetime(&midnight) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            _ => now,
        }
    }

    /// Plain counts over the whole review log.
    pub async fn statistics(&self, now: Time) -> Result<ReviewStatistics> {
        let reviews = self.repository.list_reviews(&ReviewFilter::default()).await?;

        let today_start = self.local_midnight(now);
        let tomorrow_start = today_start + Duration::days(1);
        let week_start = today_start - Duration::days(7);
        let month_start = self.month_back(now);

        let stats = ReviewStatistics {
            total: reviews.len(),
            today: reviews
                .iter()
                .filter(|r| r.written_at >= today_start && r.written_at < tomorrow_start)
                .count(),
            this_week: reviews.iter().filter(|r| r.written_at >= week_start).count(),
            this_month: reviews
                .iter()
                .filter(|r| r.written_at >= month_start)
                .count(),
        };
        debug!(total = stats.total, today = stats.today, "computed review statistics");
        Ok(stats)
    }

    /// Per-reviewer counts, sorted by today's count descending, then by
    /// total count descending.
    pub async fn reviewer_leaderboard(&self, now: Time) -> Result<Vec<ReviewerActivity>> {
        let reviews = self.repository.list_reviews(&ReviewFilter::default()).await?;

        let today_start = self.local_midnight(now);
        let tomorrow_start = today_start + Duration::days(1);

        let mut by_reviewer: HashMap<StudentId, ReviewerActivity> = HashMap::new();
        for review in &reviews {
            let entry = by_reviewer
                .entry(review.reviewer_id)
                .or_insert_with(|| ReviewerActivity {
                    reviewer_id: review.reviewer_id,
                    name: String::new(),
                    total_reviews: 0,
                    today_reviews: 0,
                    last_review: None,
                });
            entry.total_reviews += 1;
            if review.written_at >= today_start && review.written_at < tomorrow_start {
                entry.today_reviews += 1;
            }
            if entry.last_review.map_or(true, |last| review.written_at > last) {
                entry.last_review = Some(review.written_at);
            }
        }

        // Resolve display names concurrently; a failed lookup keeps the
        // reviewer with a placeholder instead of dropping the row.
        let ids: Vec<StudentId> = by_reviewer.keys().copied().collect();
        let students =
            try_join_all(ids.iter().map(|id| self.repository.get_student(*id))).await?;
        for (id, student) in ids.into_iter().zip(students) {
            if let Some(entry) = by_reviewer.get_mut(&id) {
                entry.name = student
                    .map(|s| s.full_name())
                    .unwrap_or_else(|| UNKNOWN_REVIEWER.to_string());
            }
        }

        let mut leaderboard: Vec<ReviewerActivity> = by_reviewer.into_values().collect();
        leaderboard.sort_by(|a, b| {
            b.today_reviews
                .cmp(&a.today_reviews)
                .then(b.total_reviews.cmp(&a.total_reviews))
                .then(a.reviewer_id.cmp(&b.reviewer_id))
        });
        Ok(leaderboard)
    }

    /// The most recent reviews, newest first.
    pub async fn recent_reviews(&self, limit: usize) -> Result<Vec<ReviewRecord>> {
        self.repository
            .list_reviews_page(&ReviewFilter::default(), 0, limit)
            .await
    }

    /// Active students with no review written today, for the dashboard's
    /// pending-reviews alert.
    pub async fn pending_today(&self, now: Time) -> Result<Vec<Student>> {
        let today_start = self.local_midnight(now);
        let tomorrow_start = today_start + Duration::days(1);

        let todays_reviews = self
            .repository
            .list_reviews(&ReviewFilter {
                since: Some(today_start),
                ..Default::default()
            })
            .await?;
        let reviewed: HashSet<StudentId> = todays_reviews
            .iter()
            .filter(|r| r.written_at < tomorrow_start)
            .map(|r| r.student_id)
            .collect();

        let mut students = self.repository.list_students(true).await?;
        students.retain(|s| !reviewed.contains(&s.id));
        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortboard_core::{NewReview, ReviewId};
    use cohortboard_storage::MemoryStorage;

    fn at(s: &str) -> Time {
        s.parse().unwrap()
    }

    fn review_at(reviewer_id: StudentId, student_id: StudentId, written_at: Time) -> ReviewRecord {
        ReviewRecord {
            id: ReviewId::new(),
            reviewer_id,
            student_id,
            written_at,
            retrospective: "progress noted".to_string(),
            plan: String::new(),
            feedback: String::new(),
        }
    }

    async fn add_student(store: &MemoryStorage, login: &str, active: bool) -> Student {
        let now = Utc::now();
        store
            .upsert_student(Student {
                id: StudentId::new(),
                first_name: login.to_string(),
                last_name: "Reviewer".to_string(),
                email: format!("{login}@example.org"),
                login: login.to_string(),
                cohort: None,
                active,
                last_login: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_statistics_buckets() {
        let store = Arc::new(MemoryStorage::new());
        let aggregator = ReviewAggregator::new(store.clone());
        let reviewer = StudentId::new();
        let student = StudentId::new();

        // now: 2026-03-10 14:00 UTC = 18:00 local (UTC+4); local day is
        // [2026-03-09 20:00 UTC, 2026-03-10 20:00 UTC).
        let now = at("2026-03-10T14:00:00Z");
        let written = [
            at("2026-03-10T06:00:00Z"), // today
            at("2026-03-09T21:00:00Z"), // today (local), yesterday in UTC
            at("2026-03-06T10:00:00Z"), // this week
            at("2026-02-20T10:00:00Z"), // this month
            at("2026-01-05T10:00:00Z"), // older
        ];
        for ts in written {
            store.seed_review(review_at(reviewer, student, ts)).await;
        }

        let stats = aggregator.statistics(now).await.unwrap();
        assert_eq!(
            stats,
            ReviewStatistics {
                total: 5,
                today: 2,
                this_week: 3,
                this_month: 4,
            }
        );
    }

    #[tokio::test]
    async fn test_day_boundary_uses_org_zone_not_utc() {
        let store = Arc::new(MemoryStorage::new());
        let aggregator = ReviewAggregator::new(store.clone());

        // 19:59 UTC on the 9th is still the local 9th; 20:00 UTC starts
        // the local 10th.
        store
            .seed_review(review_at(
                StudentId::new(),
                StudentId::new(),
                at("2026-03-09T19:59:59Z"),
            ))
            .await;
        store
            .seed_review(review_at(
                StudentId::new(),
                StudentId::new(),
                at("2026-03-09T20:00:00Z"),
            ))
            .await;

        let stats = aggregator
            .statistics(at("2026-03-10T14:00:00Z"))
            .await
            .unwrap();
        assert_eq!(stats.today, 1);
    }

    #[tokio::test]
    async fn test_reviewer_leaderboard_orders_today_then_total() {
        let store = Arc::new(MemoryStorage::new());
        let aggregator = ReviewAggregator::new(store.clone());
        let now = at("2026-03-10T14:00:00Z");

        let busy_today = add_student(&store, "busy-today", true).await;
        let busy_overall = add_student(&store, "busy-overall", true).await;
        let target = StudentId::new();

        for _ in 0..2 {
            store
                .seed_review(review_at(busy_today.id, target, at("2026-03-10T10:00:00Z")))
                .await;
        }
        for _ in 0..5 {
            store
                .seed_review(review_at(
                    busy_overall.id,
                    target,
                    at("2026-03-01T10:00:00Z"),
                ))
                .await;
        }

        let leaderboard = aggregator.reviewer_leaderboard(now).await.unwrap();
        assert_eq!(leaderboard.len(), 2);
        assert_eq!(leaderboard[0].reviewer_id, busy_today.id);
        assert_eq!(leaderboard[0].name, "busy-today Reviewer");
        assert_eq!(leaderboard[0].today_reviews, 2);
        assert_eq!(leaderboard[1].total_reviews, 5);
        assert_eq!(
            leaderboard[1].last_review,
            Some(at("2026-03-01T10:00:00Z"))
        );
    }

    #[tokio::test]
    async fn test_unresolvable_reviewer_kept_with_placeholder() {
        let store = Arc::new(MemoryStorage::new());
        let aggregator = ReviewAggregator::new(store.clone());

        store
            .seed_review(review_at(
                StudentId::new(),
                StudentId::new(),
                at("2026-03-10T10:00:00Z"),
            ))
            .await;

        let leaderboard = aggregator
            .reviewer_leaderboard(at("2026-03-10T14:00:00Z"))
            .await
            .unwrap();
        assert_eq!(leaderboard.len(), 1);
        assert_eq!(leaderboard[0].name, UNKNOWN_REVIEWER);
    }

    #[tokio::test]
    async fn test_pending_today_excludes_reviewed_students() {
        let store = Arc::new(MemoryStorage::new());
        let aggregator = ReviewAggregator::new(store.clone());
        let now = at("2026-03-10T14:00:00Z");

        let reviewed = add_student(&store, "reviewed", true).await;
        let pending = add_student(&store, "pending", true).await;
        add_student(&store, "inactive", false).await;

        store
            .seed_review(review_at(
                StudentId::new(),
                reviewed.id,
                at("2026-03-10T10:00:00Z"),
            ))
            .await;
        // Yesterday's review does not cover today.
        store
            .seed_review(review_at(
                StudentId::new(),
                pending.id,
                at("2026-03-09T10:00:00Z"),
            ))
            .await;

        let pending_students = aggregator.pending_today(now).await.unwrap();
        assert_eq!(pending_students.len(), 1);
        assert_eq!(pending_students[0].id, pending.id);
    }

    #[tokio::test]
    async fn test_recent_reviews_newest_first() {
        let store = Arc::new(MemoryStorage::new());
        let aggregator = ReviewAggregator::new(store.clone());
        let reviewer = StudentId::new();

        for _ in 0..3 {
            store
                .create_review(NewReview {
                    reviewer_id: reviewer,
                    student_id: StudentId::new(),
                    retrospective: "note".to_string(),
                    plan: String::new(),
                    feedback: String::new(),
                })
                .await
                .unwrap();
        }

        let recent = aggregator.recent_reviews(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].written_at >= recent[1].written_at);
    }
}
