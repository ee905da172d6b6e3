//! Shared test utilities for docusearch integration tests.
//!
//! This module provides:
//! - `TestHarness` owning a temp data directory and the services built on it
//! - `MetadataBuilder` for parser output maps

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
