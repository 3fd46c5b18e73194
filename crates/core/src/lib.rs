//! Cohortboard core data models.
//!
//! This crate defines the data structures shared across the cohort
//! tracking system: the student roster, dated progress snapshots, review
//! records, the curriculum timeline, and the derived performance types.
//! Everything here is pure data plus pure computation; all I/O lives
//! behind the repository trait in `cohortboard-storage`.

#![warn(missing_docs)]

// Core identities
mod id;

// Roster and records
mod student;
mod snapshot;
mod review;

// Curriculum configuration and pacing
mod curriculum;

// Derived performance types
mod performance;
mod presentation;

// Re-exports
pub use id::*;

pub use student::{Student, StudentWithPerformance};
pub use snapshot::{ProgressSnapshot, display_score};
pub use review::{NewReview, ReviewFilter, ReviewRecord};

pub use curriculum::{Curriculum, CurriculumConfig, ModuleDefinition, TimelineSegment};
pub use performance::{PerformanceResult, PerformanceTier};
pub use presentation::{PresentationLevel, PresentationScores};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
