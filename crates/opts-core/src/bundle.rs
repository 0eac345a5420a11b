//! The options bundle
//!
//! [`ClientOptions`] is the aggregate served to every client session.
//! [`OptionsSnapshot`] pairs one bundle with its serialized form and hash;
//! the three are computed together and never change afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use opts_meta::{
    AppArguments, ClientSettings, ConfigSchema, GLOBAL_GROUP, LanguageDefinition, PropertySource,
};
use serde::{Deserialize, Serialize};

use crate::checksum::compute_options_hash;
use crate::compilers::ClientCompiler;
use crate::error::Result;
use crate::libraries::{LibraryCatalog, build_libraries};
use crate::remote::RemoteLibraries;
use crate::report::BuildReport;
use crate::tools::{ToolCatalog, build_tools};

/// A language as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub id: String,
    pub name: String,
    pub monaco: String,
    pub extensions: Vec<String>,
    /// Derived from the current compiler list
    pub supports_execute: bool,
}

impl From<&LanguageDefinition> for LanguageInfo {
    fn from(def: &LanguageDefinition) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            monaco: def.monaco.clone(),
            extensions: def.extensions.clone(),
            supports_execute: false,
        }
    }
}

/// A file offered in the load/save pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display name
    pub name: String,
    /// Relative URL the file is fetched from
    pub urlpart: String,
}

/// The complete bundle served to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    #[serde(flatten)]
    pub settings: ClientSettings,
    pub languages: BTreeMap<String, LanguageInfo>,
    pub sources: Vec<Source>,
    pub compilers: Vec<ClientCompiler>,
    pub libs: LibraryCatalog,
    /// `remote id -> library id -> library`
    pub remote_libs: BTreeMap<String, RemoteLibraries>,
    pub tools: ToolCatalog,
}

impl ClientOptions {
    /// Build the initial bundle from configuration.
    ///
    /// The compiler list starts empty; it is filled in by the first compiler
    /// update.
    pub fn build(
        props: &dyn PropertySource,
        args: &AppArguments,
        sources: &[Source],
        report: &mut BuildReport,
    ) -> Self {
        let schema = ConfigSchema::load(props);
        Self::from_schema(props, &schema, args, sources, report)
    }

    /// Build the initial bundle from an already loaded schema.
    pub fn from_schema(
        props: &dyn PropertySource,
        schema: &ConfigSchema,
        args: &AppArguments,
        sources: &[Source],
        report: &mut BuildReport,
    ) -> Self {
        if schema.languages.is_empty() {
            report.warn("", GLOBAL_GROUP, "no languages configured");
        }
        let settings = ClientSettings::load(props, &schema.language_ids(), args);
        let libs = build_libraries(&schema.libraries, report);
        let tools = build_tools(&schema.tools, report);

        let mut sources = sources.to_vec();
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            settings,
            languages: schema
                .languages
                .iter()
                .map(|def| (def.id.clone(), LanguageInfo::from(def)))
                .collect(),
            sources,
            compilers: Vec::new(),
            libs,
            remote_libs: BTreeMap::new(),
            tools,
        }
    }
}

/// One published state of the bundle
#[derive(Debug, Clone)]
pub struct OptionsSnapshot {
    options: Arc<ClientOptions>,
    json: Arc<str>,
    hash: String,
}

impl OptionsSnapshot {
    /// Serialize and hash `options`.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let json = serde_json::to_string(&options)?;
        let hash = compute_options_hash(&json);
        Ok(Self {
            options: Arc::new(options),
            json: Arc::from(json),
            hash,
        })
    }

    pub fn options(&self) -> &Arc<ClientOptions> {
        &self.options
    }

    pub fn json(&self) -> &Arc<str> {
        &self.json
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}
