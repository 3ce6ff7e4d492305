//! Shared sentiment-pipeline domain primitives.
//!
//! This crate owns the stage request/result contracts and the object-store
//! key conventions. It intentionally excludes AWS SDK, HTTP, filesystem,
//! and model concerns: everything here is deterministic and I/O-free.

pub mod contract;
pub mod storage_keys;
