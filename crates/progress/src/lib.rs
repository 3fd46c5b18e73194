//! Progress analytics: snapshot diffing and the performance engine.
//!
//! Both services are request-scoped pure computations over repository
//! reads; nothing here holds mutable state between calls.

#![warn(missing_docs)]

pub mod comparator;
pub mod engine;

pub use comparator::{diff_snapshots, ModuleDiff};
pub use engine::{months_enrolled, rank_by_ratio, PerformanceEngine, ProgressTotals};
