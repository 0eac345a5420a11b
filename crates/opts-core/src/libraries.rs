//! Library catalog
//!
//! Turns [`LibraryDefinition`]s into the client-visible library catalog.
//! Versions copy any field they do not set from their library, and each
//! library's versions are ranked in ascending version order.

use std::collections::BTreeMap;

use opts_meta::version::sort_ascending;
use opts_meta::{LibraryDefinition, VersionDefinition};
use serde::Serialize;

use crate::report::BuildReport;

/// Version label that is resolved at compile time and needs no include path.
pub const AUTODETECT_VERSION: &str = "autodetect";

/// `language -> library id -> library`
pub type LibraryCatalog = BTreeMap<String, BTreeMap<String, Library>>;

/// A library as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
    pub name: String,
    pub url: String,
    pub description: String,
    pub staticliblink: Vec<String>,
    pub liblink: Vec<String>,
    pub dependencies: Vec<String>,
    /// Keyed by version label
    pub versions: BTreeMap<String, VersionInfo>,
    pub examples: Vec<String>,
    pub options: Vec<String>,
    pub packagedheaders: bool,
}

/// One version of a library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub staticliblink: Vec<String>,
    pub alias: Vec<String>,
    pub dependencies: Vec<String>,
    pub path: Vec<String>,
    pub libpath: Vec<String>,
    pub liblink: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookupname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookupversion: Option<String>,
    pub options: Vec<String>,
    pub hidden: bool,
    pub packagedheaders: bool,
    /// Rank among the library's versions, 0 = oldest
    #[serde(rename = "$order")]
    pub order: usize,
}

/// Build the library catalog for every language in `definitions`.
pub fn build_libraries(
    definitions: &BTreeMap<String, Vec<LibraryDefinition>>,
    report: &mut BuildReport,
) -> LibraryCatalog {
    definitions
        .iter()
        .map(|(lang, libs)| {
            let built = libs
                .iter()
                .map(|def| (def.id.clone(), build_library(lang, def, report)))
                .collect();
            (lang.clone(), built)
        })
        .collect()
}

/// Build one library and rank its versions.
pub fn build_library(language: &str, def: &LibraryDefinition, report: &mut BuildReport) -> Library {
    let mut library = Library {
        name: def.name.clone().unwrap_or_default(),
        url: def.url.clone().unwrap_or_default(),
        description: def.description.clone().unwrap_or_default(),
        staticliblink: def.staticliblink.clone().unwrap_or_default(),
        liblink: def.liblink.clone().unwrap_or_default(),
        dependencies: def.dependencies.clone().unwrap_or_default(),
        versions: BTreeMap::new(),
        examples: def.examples.clone().unwrap_or_default(),
        options: def.options.clone().unwrap_or_default(),
        packagedheaders: def.packagedheaders.unwrap_or(false),
    };

    let Some(version_defs) = def.versions.as_ref() else {
        tracing::warn!(library = %def.id, language, "No versions found for library");
        report.warn(language, &def.id, "no versions found for library");
        return library;
    };

    let mut built: Vec<(String, VersionInfo)> = version_defs
        .iter()
        .map(|vdef| {
            let info = build_version(language, &def.id, &library, vdef, report);
            (vdef.label.clone(), info)
        })
        .collect();

    sort_ascending(&mut built, |(_, info)| info.version.as_str());
    for (rank, (_, info)) in built.iter_mut().enumerate() {
        info.order = rank;
    }

    library.versions = built.into_iter().collect();
    library
}

/// Build one version, copying unset fields from `parent`.
fn build_version(
    language: &str,
    library_id: &str,
    parent: &Library,
    def: &VersionDefinition,
    report: &mut BuildReport,
) -> VersionInfo {
    let inherit = |own: &Option<Vec<String>>, fallback: &Vec<String>| {
        own.clone().unwrap_or_else(|| fallback.clone())
    };

    let path = def.path.clone().unwrap_or_default();
    if path.is_empty() && def.label != AUTODETECT_VERSION {
        tracing::warn!(
            library = library_id,
            version = %def.label,
            language,
            "Library version has no include paths"
        );
        report.warn(
            language,
            format!("{library_id} {}", def.label),
            "library version has no include paths",
        );
    }

    VersionInfo {
        version: def.version.clone().unwrap_or_default(),
        staticliblink: inherit(&def.staticliblink, &parent.staticliblink),
        alias: def.alias.clone().unwrap_or_default(),
        dependencies: inherit(&def.dependencies, &parent.dependencies),
        path,
        libpath: def.libpath.clone().unwrap_or_default(),
        liblink: inherit(&def.liblink, &parent.liblink),
        lookupname: def.lookupname.clone(),
        lookupversion: def.lookupversion.clone(),
        options: inherit(&def.options, &parent.options),
        hidden: def.hidden.unwrap_or(false),
        packagedheaders: def.packagedheaders.unwrap_or(parent.packagedheaders),
        order: 0,
    }
}
