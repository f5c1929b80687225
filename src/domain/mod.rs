//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - votes and dependency edges (`Vote`, `Dependency`, `DependencySet`)
//! - selection configuration (`SelectOptions`)

pub mod types;

pub use types::*;
