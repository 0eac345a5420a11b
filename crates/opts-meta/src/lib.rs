//! Property store and typed configuration schema for the compiler options bundle.
//!
//! This crate is the only place where raw, string-typed configuration is
//! touched. It provides:
//!
//! - [`properties`]: `.properties` parsing and hierarchical per-language lookup
//! - [`schema`]: the load step turning raw keys into typed definitions
//! - [`settings`]: client-facing settings read from the global property group
//! - [`version`]: best-effort semantic version ordering
//! - [`args`]: list and argument splitting helpers shared by the loaders

pub mod args;
pub mod error;
pub mod properties;
pub mod schema;
pub mod settings;
pub mod version;

pub use error::{Error, Result};
pub use properties::{GLOBAL_GROUP, PropertySource, PropertyStore, PropertyValue, per_language};
pub use schema::{
    ConfigSchema, LanguageDefinition, LibraryDefinition, ToolDefinition, VersionDefinition,
};
pub use settings::{AppArguments, ClientSettings, Policies, PolicySetting};
pub use version::{compare_versions, safe_version};
