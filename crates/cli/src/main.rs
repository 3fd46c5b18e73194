//! Cohortboard CLI - cohort progress tracking and review statistics.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::Level;

use cohortboard_core::{display_score, Curriculum, NewReview, Student, StudentId};
use cohortboard_progress::{rank_by_ratio, PerformanceEngine};
use cohortboard_review::ReviewAggregator;
use cohortboard_storage::{JsonStorage, Repository, StorageError};

#[derive(Parser)]
#[command(name = "cohortboard")]
#[command(about = "Cohort progress tracking and review statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or update a student (matched by login)
    AddStudent {
        /// Login handle
        login: String,
        /// First name
        #[arg(long)]
        first_name: String,
        /// Last name
        #[arg(long)]
        last_name: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Cohort name
        #[arg(long)]
        cohort: Option<String>,
    },
    /// Record a progress snapshot for a student
    Record {
        /// Student login
        login: String,
        /// Snapshot date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Module scores as "Module Name=percent"
        #[arg(required = true)]
        scores: Vec<String>,
    },
    /// Write a review about a student
    Review {
        /// Reviewer login
        reviewer: String,
        /// Student login
        student: String,
        /// What happened since the last review
        #[arg(long, default_value = "")]
        retrospective: String,
        /// What is planned next
        #[arg(long, default_value = "")]
        plan: String,
        /// Feedback for the student
        #[arg(long, default_value = "")]
        feedback: String,
    },
    /// Show the ranked leaderboard
    Leaderboard {
        /// Use the historical ratio-first ranking instead of
        /// completion-percentage-first
        #[arg(long)]
        by_ratio: bool,
    },
    /// Show a student's change since their previous snapshot
    Diff {
        /// Student login
        login: String,
        /// Compare against the snapshot at (or closest before) this date
        /// instead of the previous one (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show organization-wide review statistics
    Stats,
    /// Show per-reviewer activity
    Reviewers,
    /// List active students without a review today
    Pending,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let storage = JsonStorage::new(".cohortboard").await?;
    let repository: Arc<dyn Repository> = Arc::new(storage);
    let engine = PerformanceEngine::new(repository.clone(), Curriculum::standard());
    let aggregator = ReviewAggregator::new(repository.clone());

    match cli.command {
        Commands::AddStudent {
            login,
            first_name,
            last_name,
            email,
            cohort,
        } => {
            let now = Utc::now();
            let student = repository
                .upsert_student(Student {
                    id: StudentId::new(),
                    first_name,
                    last_name,
                    email,
                    login,
                    cohort,
                    active: true,
                    last_login: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            println!("Stored student: {} - {}", student.id, student.full_name());
        }
        Commands::Record { login, date, scores } => {
            let student = find_student(repository.as_ref(), &login).await?;
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let scores = parse_scores(&scores)?;
            let snapshot = repository.upsert_snapshot(student.id, date, scores).await?;
            println!(
                "Stored snapshot {} for {}",
                snapshot.snapshot_date,
                student.full_name(),
            );
            for (module, value) in &snapshot.scores {
                println!("  {:<40} {:>5.1}%", module, display_score(*value));
            }
        }
        Commands::Review {
            reviewer,
            student,
            retrospective,
            plan,
            feedback,
        } => {
            let reviewer = find_student(repository.as_ref(), &reviewer).await?;
            let student = find_student(repository.as_ref(), &student).await?;
            let record = repository
                .create_review(NewReview {
                    reviewer_id: reviewer.id,
                    student_id: student.id,
                    retrospective,
                    plan,
                    feedback,
                })
                .await?;
            println!(
                "Recorded review {} by {} about {}",
                record.id,
                reviewer.full_name(),
                student.full_name(),
            );
        }
        Commands::Leaderboard { by_ratio } => {
            let mut roster = engine.rank_roster(Utc::now()).await?;
            if by_ratio {
                roster = rank_by_ratio(roster);
            }

            let total_modules = engine.curriculum().leaderboard_modules().len();
            println!("Leaderboard ({} students)", roster.len());
            for entry in roster {
                let p = &entry.performance;
                println!(
                    "  #{:<3} {:<28} {:>5.1} mo  {:>2}/{} modules  {:>5.1}%  ratio {:>5.0}  {} {}",
                    entry.rank,
                    entry.student.full_name(),
                    p.months_enrolled,
                    p.modules_completed,
                    total_modules,
                    p.completion_percentage,
                    p.performance_ratio,
                    p.tier.icon(),
                    p.tier.label(),
                );
            }
        }
        Commands::Diff { login, date } => {
            let student = find_student(repository.as_ref(), &login).await?;
            let diffs = match date {
                Some(baseline) => engine.diff_from(student.id, baseline).await?,
                None => engine.latest_diff(student.id).await?,
            };

            if diffs.is_empty() {
                println!("No change since the previous snapshot");
                return Ok(());
            }
            println!("Changes for {}", student.full_name());
            for (module, diff) in diffs {
                let pct = diff
                    .pct_change
                    .map(|p| format!("{p:+.1}%"))
                    .unwrap_or_else(|| "N/A".to_string());
                println!(
                    "  {:<40} {:>5.1} -> {:>5.1}  ({:+.1}, {})",
                    module, diff.previous, diff.current, diff.delta, pct,
                );
            }
        }
        Commands::Stats => {
            let stats = aggregator.statistics(Utc::now()).await?;
            println!("Reviews");
            println!("  Today:      {}", stats.today);
            println!("  This week:  {}", stats.this_week);
            println!("  This month: {}", stats.this_month);
            println!("  Total:      {}", stats.total);
        }
        Commands::Reviewers => {
            let leaderboard = aggregator.reviewer_leaderboard(Utc::now()).await?;
            println!("Reviewers ({})", leaderboard.len());
            for (position, reviewer) in leaderboard.iter().enumerate() {
                println!(
                    "  #{:<3} {:<28} today {:>3}  total {:>4}",
                    position + 1,
                    reviewer.name,
                    reviewer.today_reviews,
                    reviewer.total_reviews,
                );
            }
        }
        Commands::Pending => {
            let pending = aggregator.pending_today(Utc::now()).await?;
            println!("Students without a review today ({})", pending.len());
            for student in pending {
                println!("  {} ({})", student.full_name(), student.login);
            }
        }
    }

    Ok(())
}

async fn find_student(repository: &dyn Repository, login: &str) -> Result<Student> {
    repository
        .get_student_by_login(login)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("student with login '{login}'")).into())
}

/// Parse "Module Name=percent" pairs.
fn parse_scores(pairs: &[String]) -> Result<BTreeMap<String, f64>> {
    let mut scores = BTreeMap::new();
    for pair in pairs {
        let (module, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected 'Module Name=percent', got '{pair}'"))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid percent in '{pair}'"))?;
        scores.insert(module.trim().to_string(), value);
    }
    Ok(scores)
}
