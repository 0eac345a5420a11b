//! Command implementations for opts-cli

pub mod build;

pub use build::{Output, run_build};
