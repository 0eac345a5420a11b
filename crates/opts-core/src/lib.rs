//! Options bundle resolution and distribution engine
//!
//! This crate turns configuration into the options bundle served to every
//! client session:
//!
//! - **Library catalog**: per-version field inheritance and version ranking
//! - **Tool catalog**: tools validated against executable presence
//! - **Remote federation**: library catalogs of peer instances, memoized
//! - **Compiler registry**: internal fields stripped, semver groups ranked
//! - **Bundle cache**: the published bundle with its JSON and hash
//!
//! # Architecture
//!
//! ```text
//!              OptionsHandler (single writer)
//!                      |
//!      +---------------+----------------+
//!      |               |                |
//!  ClientOptions   compilers      RemoteLibraryFederator
//!      |
//!  libraries / tools  <-  opts-meta (properties, schema, version)
//! ```

pub mod bundle;
pub mod checksum;
pub mod compilers;
pub mod error;
pub mod handler;
pub mod libraries;
pub mod remote;
pub mod report;
pub mod tools;

pub use bundle::{ClientOptions, LanguageInfo, OptionsSnapshot, Source};
pub use checksum::{OPTIONS_HASH_VERSION, compute_options_hash};
pub use compilers::{ClientCompiler, CompilerInfo, Remote, parse_compilers};
pub use error::{Error, Result};
pub use handler::OptionsHandler;
pub use libraries::{Library, LibraryCatalog, VersionInfo};
pub use remote::{
    FederatorConfig, HttpLibraryFetcher, LibraryFetcher, RemoteCatalog, RemoteLibraries,
    RemoteLibrary, RemoteLibraryFederator, RemoteLibraryVersion,
};
pub use report::{BuildReport, BuildWarning, WarnLevel};
pub use tools::{Tool, ToolCatalog, ToolType};
