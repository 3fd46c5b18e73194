//! Time-normalized performance computation and roster ranking.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use cohortboard_core::{
    Curriculum, PerformanceResult, PerformanceTier, ProgressSnapshot, StudentId,
    StudentWithPerformance,
};
use cohortboard_storage::{Repository, Result};
use futures::future::try_join_all;
use tracing::debug;

use crate::comparator::{diff_snapshots, ModuleDiff};

/// Months between an enrollment start date and `now`.
///
/// Whole calendar months plus a day-of-month fraction interpolated over a
/// 30-day month. Deliberately not calendar-exact: the 28-31 day variance is
/// an accepted approximation for a coarse pacing signal. Never negative.
pub fn months_enrolled(start: NaiveDate, now: DateTime<Utc>) -> f64 {
    let today = now.date_naive();
    let whole_months =
        (today.year() - start.year()) * 12 + today.month() as i32 - start.month() as i32;
    let partial = (today.day() as i32 - start.day() as i32) as f64 / 30.0;
    (whole_months as f64 + partial).max(0.0)
}

/// Cumulative raw progress over leaderboard-eligible modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressTotals {
    /// Sum of raw completion values
    pub actual: f64,

    /// Eligible modules with any completion value
    pub modules_active: usize,

    /// Eligible modules with a value >= 100
    pub modules_completed: usize,

    /// Total count of eligible modules
    pub eligible_count: usize,
}

/// Computes per-student performance and ranks a roster.
///
/// Holds no mutable state; every call is a pure function of the repository
/// reads it issues. The repository and curriculum are injected so tests can
/// substitute both.
pub struct PerformanceEngine {
    repository: Arc<dyn Repository>,
    curriculum: Curriculum,
}

impl PerformanceEngine {
    /// Create an engine over a repository and a curriculum.
    pub fn new(repository: Arc<dyn Repository>, curriculum: Curriculum) -> Self {
        Self {
            repository,
            curriculum,
        }
    }

    /// The curriculum this engine computes against.
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Sum raw completion over leaderboard-eligible modules.
    ///
    /// `None` (no snapshot at all) is the valid zero-state of a brand-new
    /// student, not an error.
    pub fn actual_progress(&self, snapshot: Option<&ProgressSnapshot>) -> ProgressTotals {
        let eligible = self.curriculum.leaderboard_modules();
        let mut totals = ProgressTotals {
            eligible_count: eligible.len(),
            ..Default::default()
        };
        let Some(snapshot) = snapshot else {
            return totals;
        };

        for module in eligible {
            if let Some(value) = snapshot.score(module) {
                totals.actual += value;
                totals.modules_active += 1;
                if value >= 100.0 {
                    totals.modules_completed += 1;
                }
            }
        }
        totals
    }

    /// Compute the full performance read for one student.
    ///
    /// `start` is the enrollment start date; `None` (no snapshot history)
    /// gives months-enrolled 0, hence expected 0 and the neutral ratio of
    /// exactly 100 so brand-new students are never flagged as failing.
    pub fn compute_performance(
        &self,
        snapshot: Option<&ProgressSnapshot>,
        start: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> PerformanceResult {
        let totals = self.actual_progress(snapshot);
        let months = start.map(|s| months_enrolled(s, now)).unwrap_or(0.0);
        let expected = self.curriculum.expected_progress(months);

        let performance_ratio = if expected <= 0.0 {
            100.0
        } else {
            totals.actual / expected * 100.0
        };

        let max_possible = totals.eligible_count as f64 * 100.0;
        let completion_percentage = if max_possible <= 0.0 {
            0.0
        } else {
            totals.actual / max_possible * 100.0
        };

        PerformanceResult {
            months_enrolled: months,
            actual_progress: totals.actual,
            expected_progress: expected,
            performance_ratio,
            completion_percentage,
            modules_completed: totals.modules_completed,
            modules_active: totals.modules_active,
            tier: PerformanceTier::from_ratio(performance_ratio),
        }
    }

    /// Performance for a single student from their stored snapshots.
    ///
    /// The pipeline is sequential: the start date feeds the months-enrolled
    /// step, which feeds the expected-progress step.
    pub async fn student_performance(
        &self,
        student_id: StudentId,
        now: DateTime<Utc>,
    ) -> Result<PerformanceResult> {
        let latest = self.repository.latest_snapshot(student_id).await?;
        let earliest = self.repository.earliest_snapshot(student_id).await?;
        let start = earliest.map(|s| s.snapshot_date);
        Ok(self.compute_performance(latest.as_ref(), start, now))
    }

    /// Diff a student's latest snapshot against the closest one before it.
    ///
    /// No snapshots, or no prior snapshot, yields an empty diff.
    pub async fn latest_diff(
        &self,
        student_id: StudentId,
    ) -> Result<BTreeMap<String, ModuleDiff>> {
        let Some(latest) = self.repository.latest_snapshot(student_id).await? else {
            return Ok(BTreeMap::new());
        };
        let previous = self
            .repository
            .closest_snapshot_before(student_id, latest.snapshot_date)
            .await?;
        Ok(diff_snapshots(&self.curriculum, &latest, previous.as_ref()))
    }

    /// Diff a student's latest snapshot against a chosen baseline date.
    ///
    /// The baseline is the snapshot on that exact date if one exists,
    /// otherwise the closest one before it. No snapshots at all, or no
    /// snapshot at or before the baseline date, yields an empty diff.
    pub async fn diff_from(
        &self,
        student_id: StudentId,
        baseline: NaiveDate,
    ) -> Result<BTreeMap<String, ModuleDiff>> {
        let Some(latest) = self.repository.latest_snapshot(student_id).await? else {
            return Ok(BTreeMap::new());
        };
        let previous = match self.repository.get_snapshot(student_id, baseline).await? {
            Some(exact) => Some(exact),
            None => {
                self.repository
                    .closest_snapshot_before(student_id, baseline)
                    .await?
            }
        };
        Ok(diff_snapshots(&self.curriculum, &latest, previous.as_ref()))
    }

    /// Rank the active roster.
    ///
    /// One batched latest-snapshot call for the whole roster, earliest
    /// snapshot reads fanned out concurrently, then a pure compute-and-sort.
    /// Canonical order is completion percentage descending with stable
    /// ties; ranks are 1-based positions in that order.
    pub async fn rank_roster(&self, now: DateTime<Utc>) -> Result<Vec<StudentWithPerformance>> {
        let students = self.repository.list_students(true).await?;
        let ids: Vec<StudentId> = students.iter().map(|s| s.id).collect();

        let mut latest = self.repository.latest_snapshots(&ids).await?;
        let earliest =
            try_join_all(ids.iter().map(|id| self.repository.earliest_snapshot(*id))).await?;

        let mut roster: Vec<StudentWithPerformance> = students
            .into_iter()
            .zip(earliest)
            .map(|(student, earliest)| {
                let snapshot = latest.remove(&student.id);
                let start = earliest.map(|s| s.snapshot_date);
                let performance = self.compute_performance(snapshot.as_ref(), start, now);
                StudentWithPerformance {
                    student,
                    performance,
                    rank: 0,
                }
            })
            .collect();

        roster.sort_by(|a, b| {
            b.performance
                .completion_percentage
                .total_cmp(&a.performance.completion_percentage)
        });
        for (position, entry) in roster.iter_mut().enumerate() {
            entry.rank = position + 1;
        }

        debug!(students = roster.len(), "ranked roster");
        Ok(roster)
    }
}

/// Re-rank a computed roster by the historical ratio-first policy.
///
/// Floor-truncated performance ratio descending, so near-equal ratios tie,
/// then completed-module count descending. The canonical leaderboard order
/// is completion-percentage-first (`PerformanceEngine::rank_roster`); this
/// alternative is kept for the reviewer-activity screen.
pub fn rank_by_ratio(mut roster: Vec<StudentWithPerformance>) -> Vec<StudentWithPerformance> {
    roster.sort_by(|a, b| {
        let a_floored = a.performance.performance_ratio.floor();
        let b_floored = b.performance.performance_ratio.floor();
        b_floored.total_cmp(&a_floored).then(
            b.performance
                .modules_completed
                .cmp(&a.performance.modules_completed),
        )
    });
    for (position, entry) in roster.iter_mut().enumerate() {
        entry.rank = position + 1;
    }
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Scores;

    use cohortboard_core::{CurriculumConfig, ModuleDefinition, Student};
    use cohortboard_storage::MemoryStorage;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        format!("{s}T12:00:00Z").parse().unwrap()
    }

    fn two_module_engine(repository: Arc<dyn Repository>) -> PerformanceEngine {
        PerformanceEngine::new(
            repository,
            Curriculum::new(CurriculumConfig {
                modules: vec![
                    ModuleDefinition::new("m1", Some(2.0)),
                    ModuleDefinition::new("m2", Some(3.0)),
                ],
                excluded: Default::default(),
            }),
        )
    }

    fn scores(pairs: &[(&str, f64)]) -> Scores<String, f64> {
        pairs.iter().map(|(m, v)| (m.to_string(), *v)).collect()
    }

    async fn add_student(store: &MemoryStorage, login: &str) -> Student {
        let now = Utc::now();
        store
            .upsert_student(Student {
                id: StudentId::new(),
                first_name: login.to_string(),
                last_name: "Test".to_string(),
                email: format!("{login}@example.org"),
                login: login.to_string(),
                cohort: None,
                active: true,
                last_login: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_months_enrolled_whole_and_partial() {
        assert_eq!(months_enrolled(date("2026-01-15"), at("2026-04-15")), 3.0);

        let with_partial = months_enrolled(date("2026-01-15"), at("2026-04-30"));
        assert!((with_partial - 3.5).abs() < 1e-9);

        // Day-of-month behind the start day pulls the fraction back.
        let pulled_back = months_enrolled(date("2026-01-30"), at("2026-04-15"));
        assert!((pulled_back - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_months_enrolled_never_negative() {
        assert_eq!(months_enrolled(date("2026-06-01"), at("2026-04-15")), 0.0);
    }

    #[test]
    fn test_new_student_gets_neutral_ratio() {
        let engine = two_module_engine(Arc::new(MemoryStorage::new()));
        let result = engine.compute_performance(None, None, at("2026-04-15"));

        assert_eq!(result.months_enrolled, 0.0);
        assert_eq!(result.actual_progress, 0.0);
        assert_eq!(result.expected_progress, 0.0);
        assert_eq!(result.performance_ratio, 100.0);
        assert_eq!(result.completion_percentage, 0.0);
        assert_eq!(result.tier, PerformanceTier::Good);
    }

    #[tokio::test]
    async fn test_three_months_in_expected_straddles_second_module() {
        let store = Arc::new(MemoryStorage::new());
        let engine = two_module_engine(store.clone());
        let id = StudentId::new();

        store
            .upsert_snapshot(id, date("2026-01-10"), scores(&[("m1", 10.0)]))
            .await
            .unwrap();
        store
            .upsert_snapshot(id, date("2026-03-10"), scores(&[("m1", 100.0), ("m2", 40.0)]))
            .await
            .unwrap();

        let result = engine
            .student_performance(id, at("2026-04-10"))
            .await
            .unwrap();

        assert_eq!(result.months_enrolled, 3.0);
        // m1 fully behind (100) + one of m2's three months (33.3).
        assert!((result.expected_progress - 133.33333).abs() < 0.001);
        assert_eq!(result.actual_progress, 140.0);
        assert!((result.performance_ratio - 105.0).abs() < 0.001);
        assert_eq!(result.modules_completed, 1);
        assert_eq!(result.modules_active, 2);
        assert!((result.completion_percentage - 70.0).abs() < 1e-9);
        assert_eq!(result.tier, PerformanceTier::Good);
    }

    #[tokio::test]
    async fn test_rank_roster_by_completion_percentage() {
        let store = Arc::new(MemoryStorage::new());
        let engine = PerformanceEngine::new(
            store.clone(),
            Curriculum::new(CurriculumConfig {
                modules: vec![ModuleDefinition::new("m", Some(1.0))],
                excluded: Default::default(),
            }),
        );

        for (login, value) in [("a", 80.0), ("b", 55.0), ("c", 90.0)] {
            let student = add_student(&store, login).await;
            store
                .upsert_snapshot(student.id, date("2026-01-10"), scores(&[("m", value)]))
                .await
                .unwrap();
        }

        let roster = engine.rank_roster(at("2026-04-10")).await.unwrap();
        let order: Vec<f64> = roster
            .iter()
            .map(|e| e.performance.completion_percentage)
            .collect();
        assert_eq!(order, vec![90.0, 80.0, 55.0]);
        assert_eq!(
            roster.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_roster_includes_students_without_snapshots() {
        let store = Arc::new(MemoryStorage::new());
        let engine = two_module_engine(store.clone());

        let fresh = add_student(&store, "fresh").await;
        let seasoned = add_student(&store, "seasoned").await;
        store
            .upsert_snapshot(seasoned.id, date("2026-01-10"), scores(&[("m1", 60.0)]))
            .await
            .unwrap();

        let roster = engine.rank_roster(at("2026-02-10")).await.unwrap();
        assert_eq!(roster.len(), 2);

        let fresh_entry = roster
            .iter()
            .find(|e| e.student.id == fresh.id)
            .unwrap();
        assert_eq!(fresh_entry.performance.performance_ratio, 100.0);
        assert_eq!(fresh_entry.performance.tier, PerformanceTier::Good);
        assert_eq!(fresh_entry.rank, 2);
    }

    #[tokio::test]
    async fn test_rank_by_ratio_ties_on_floor_then_completed_count() {
        let store = Arc::new(MemoryStorage::new());
        let engine = two_module_engine(store.clone());
        let now = at("2026-04-10");

        let behind = add_student(&store, "behind").await;
        let tied_low = add_student(&store, "tied-low").await;
        let tied_high = add_student(&store, "tied-high").await;

        // Both "tied" students land in the same floored-ratio bucket; the
        // one with a completed module must come first.
        store
            .upsert_snapshot(behind.id, date("2026-01-10"), scores(&[("m1", 30.0)]))
            .await
            .unwrap();
        store
            .upsert_snapshot(tied_low.id, date("2026-01-10"), scores(&[("m1", 70.0), ("m2", 64.5)]))
            .await
            .unwrap();
        store
            .upsert_snapshot(
                tied_high.id,
                date("2026-01-10"),
                scores(&[("m1", 100.0), ("m2", 34.0)]),
            )
            .await
            .unwrap();

        let roster = engine.rank_roster(now).await.unwrap();
        let reranked = rank_by_ratio(roster);

        let order: Vec<&str> = reranked
            .iter()
            .map(|e| e.student.login.as_str())
            .collect();
        assert_eq!(order, vec!["tied-high", "tied-low", "behind"]);
        assert_eq!(reranked[0].rank, 1);
    }

    #[tokio::test]
    async fn test_latest_diff_against_closest_prior_snapshot() {
        let store = Arc::new(MemoryStorage::new());
        let engine = two_module_engine(store.clone());
        let id = StudentId::new();

        store
            .upsert_snapshot(id, date("2026-01-10"), scores(&[("m1", 100.0)]))
            .await
            .unwrap();
        store
            .upsert_snapshot(
                id,
                date("2026-02-10"),
                scores(&[("m1", 100.0), ("m2", 40.0)]),
            )
            .await
            .unwrap();

        let diffs = engine.latest_diff(id).await.unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs["m2"].delta, 40.0);
        assert_eq!(diffs["m2"].pct_change, None);
    }

    #[tokio::test]
    async fn test_diff_from_chosen_baseline_date() {
        let store = Arc::new(MemoryStorage::new());
        let engine = two_module_engine(store.clone());
        let id = StudentId::new();

        store
            .upsert_snapshot(id, date("2026-01-10"), scores(&[("m1", 20.0)]))
            .await
            .unwrap();
        store
            .upsert_snapshot(id, date("2026-02-10"), scores(&[("m1", 60.0)]))
            .await
            .unwrap();
        store
            .upsert_snapshot(id, date("2026-03-10"), scores(&[("m1", 90.0)]))
            .await
            .unwrap();

        // Exact baseline date.
        let diffs = engine.diff_from(id, date("2026-01-10")).await.unwrap();
        assert_eq!(diffs["m1"].delta, 70.0);

        // No snapshot on the chosen date; the closest one before it wins.
        let diffs = engine.diff_from(id, date("2026-02-20")).await.unwrap();
        assert_eq!(diffs["m1"].previous, 60.0);
        assert_eq!(diffs["m1"].delta, 30.0);

        // Baseline predates all history; nothing to compare against.
        let diffs = engine.diff_from(id, date("2025-12-01")).await.unwrap();
        assert!(diffs.is_empty());
    }

    #[tokio::test]
    async fn test_latest_diff_without_history_is_empty() {
        let store = Arc::new(MemoryStorage::new());
        let engine = two_module_engine(store.clone());
        let id = StudentId::new();

        assert!(engine.latest_diff(id).await.unwrap().is_empty());

        store
            .upsert_snapshot(id, date("2026-01-10"), scores(&[("m1", 20.0)]))
            .await
            .unwrap();
        assert!(engine.latest_diff(id).await.unwrap().is_empty());
    }
}
