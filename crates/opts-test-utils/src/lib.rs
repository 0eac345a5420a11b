//! Shared test utilities for the compiler-options workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each hand-roll configuration directories. It is a dev-dependency only,
//! never published.
//!
//! # Modules
//!
//! - [`config`]: [`ConfigDir`] builder for on-disk `.properties` trees
//! - [`remote`]: canned remote library catalogs and compiler lists

pub mod config;
pub mod remote;

pub use config::ConfigDir;
