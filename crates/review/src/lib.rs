//! Review activity statistics.
//!
//! Time-bucketed counts over the append-only review log, anchored to a
//! fixed organizational timezone rather than whatever zone the caller
//! happens to run in.

#![warn(missing_docs)]

pub mod aggregator;

pub use aggregator::{
    org_timezone, ReviewAggregator, ReviewStatistics, ReviewerActivity, UNKNOWN_REVIEWER,
};
