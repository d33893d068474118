//! Shared test utilities for respondr integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated pipeline runs over a temp storage root
//! - `ScriptedOcr` and `RecordingSleeper` for simulating text detection jobs

pub mod harness;

pub use harness::*;
