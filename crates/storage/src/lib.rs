//! Storage abstraction and implementations for cohortboard.
//!
//! This crate provides the trait-based repository interface the analytics
//! crates consume, with a JSON-file reference implementation and an
//! in-memory backend used as the test double.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory_storage;

pub use trait_::{Repository, Result, StorageError, REVIEW_PAGE_SIZE};
pub use json_storage::JsonStorage;
pub use memory_storage::MemoryStorage;
