//! Deterministic, pure logic shared by the query caches.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod decision;
pub mod merge;
pub mod params;
pub mod path;
pub mod types;
