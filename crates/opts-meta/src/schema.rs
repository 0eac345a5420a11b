//! Typed configuration schema
//!
//! This module is the single load step between the string-keyed property
//! store and the rest of the system. It reads the per-language key trees
//!
//! ```text
//! libs=<id>:<id>
//! libs.<id>.<field>
//! libs.<id>.versions=<label>:<label>
//! libs.<id>.versions.<label>.<field>
//! tools=<id>:<id>
//! tools.<id>.<field>
//! ```
//!
//! into plain definition structs. Definitions keep "not configured" distinct
//! from "configured as empty" (`None` vs `Some(vec![])`) because the catalog
//! builders apply inheritance only to fields that were never set.

use std::collections::BTreeMap;

use crate::args::{split_arguments, split_colon_list, split_path_list};
use crate::properties::{GLOBAL_GROUP, PropertySource};

/// A language known to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDefinition {
    pub id: String,
    pub name: String,
    pub monaco: String,
    pub extensions: Vec<String>,
}

/// One library as configured for a language.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LibraryDefinition {
    pub id: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub staticliblink: Option<Vec<String>>,
    pub liblink: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
    pub examples: Option<Vec<String>>,
    pub options: Option<Vec<String>>,
    pub packagedheaders: Option<bool>,
    /// `None` when the library has no `versions` list at all.
    pub versions: Option<Vec<VersionDefinition>>,
}

/// One library version as configured, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VersionDefinition {
    pub label: String,
    pub version: Option<String>,
    pub alias: Option<Vec<String>>,
    pub staticliblink: Option<Vec<String>>,
    pub liblink: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
    pub path: Option<Vec<String>>,
    pub libpath: Option<Vec<String>>,
    pub options: Option<Vec<String>>,
    pub hidden: Option<bool>,
    pub packagedheaders: Option<bool>,
    pub lookupname: Option<String>,
    pub lookupversion: Option<String>,
}

/// One tool as configured for a language.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolDefinition {
    pub id: String,
    pub class: Option<String>,
    pub name: Option<String>,
    pub tool_type: Option<String>,
    pub exe: Option<String>,
    pub exclude: Vec<String>,
    pub include_key: Option<String>,
    pub options: Vec<String>,
    pub args: Option<String>,
    pub language_id: Option<String>,
    pub stdin_hint: Option<String>,
    pub monaco_stdin: Option<String>,
    pub icon: Option<String>,
    pub dark_icon: Option<String>,
}

/// Everything the catalog builders need, read once from a property source.
#[derive(Debug, Clone, Default)]
pub struct ConfigSchema {
    pub languages: Vec<LanguageDefinition>,
    /// `language -> libraries` in declaration order.
    pub libraries: BTreeMap<String, Vec<LibraryDefinition>>,
    /// `language -> tools` in declaration order.
    pub tools: BTreeMap<String, Vec<ToolDefinition>>,
}

impl ConfigSchema {
    /// Read the full schema from `props`.
    pub fn load(props: &dyn PropertySource) -> Self {
        let languages = load_languages(props);
        let mut libraries = BTreeMap::new();
        let mut tools = BTreeMap::new();

        for lang in &languages {
            let libs = load_library_definitions(props, &lang.id);
            if !libs.is_empty() {
                libraries.insert(lang.id.clone(), libs);
            }
            let lang_tools = load_tool_definitions(props, &lang.id);
            if !lang_tools.is_empty() {
                tools.insert(lang.id.clone(), lang_tools);
            }
        }

        tracing::debug!(
            languages = languages.len(),
            libraries = libraries.values().map(Vec::len).sum::<usize>(),
            tools = tools.values().map(Vec::len).sum::<usize>(),
            "Loaded configuration schema"
        );

        Self {
            languages,
            libraries,
            tools,
        }
    }

    /// Language ids in declaration order.
    pub fn language_ids(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.id.clone()).collect()
    }
}

/// Read the global `languages` list and each language's display metadata.
///
/// Duplicate ids are ignored after their first occurrence.
pub fn load_languages(props: &dyn PropertySource) -> Vec<LanguageDefinition> {
    let ids = props
        .raw(None, "languages")
        .map(split_colon_list)
        .unwrap_or_default();
    if ids.is_empty() {
        tracing::warn!(
            group = GLOBAL_GROUP,
            "No languages configured; the bundle will have no libraries or tools"
        );
    }

    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .map(|id| {
            let lang = Some(id.as_str());
            LanguageDefinition {
                name: props.get_string_or(lang, "languageName", &id),
                monaco: props.get_string_or(lang, "monacoLanguage", &id),
                extensions: props
                    .raw(lang, "extensions")
                    .map(split_colon_list)
                    .unwrap_or_default(),
                id,
            }
        })
        .collect()
}

/// Read every library enabled for `language`.
pub fn load_library_definitions(
    props: &dyn PropertySource,
    language: &str,
) -> Vec<LibraryDefinition> {
    let lang = Some(language);
    let Some(ids) = props.raw(lang, "libs").map(split_colon_list) else {
        return Vec::new();
    };

    ids.into_iter()
        .map(|id| {
            let base = format!("libs.{id}");
            let key = |field: &str| format!("{base}.{field}");
            let list = |field: &str| props.raw(lang, &key(field)).map(split_colon_list);

            let versions = props
                .raw(lang, &key("versions"))
                .map(split_colon_list)
                .filter(|labels| !labels.is_empty())
                .map(|labels| {
                    let mut seen = std::collections::HashSet::new();
                    labels
                        .into_iter()
                        .filter(|label| seen.insert(label.clone()))
                        .map(|label| load_version_definition(props, language, &base, label))
                        .collect()
                });

            LibraryDefinition {
                name: props.get_string(lang, &key("name")),
                url: props.get_string(lang, &key("url")),
                description: props.get_string(lang, &key("description")),
                staticliblink: list("staticliblink"),
                liblink: list("liblink"),
                dependencies: list("dependencies"),
                examples: list("examples"),
                options: props.raw(lang, &key("options")).map(split_arguments),
                packagedheaders: optional_bool(props, lang, &key("packagedheaders")),
                versions,
                id,
            }
        })
        .collect()
}

fn load_version_definition(
    props: &dyn PropertySource,
    language: &str,
    library_base: &str,
    label: String,
) -> VersionDefinition {
    let lang = Some(language);
    let base = format!("{library_base}.versions.{label}");
    let key = |field: &str| format!("{base}.{field}");
    let list = |field: &str| props.raw(lang, &key(field)).map(split_colon_list);
    let non_empty = |field: &str| {
        props
            .raw(lang, &key(field))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    VersionDefinition {
        version: props.get_string(lang, &key("version")),
        alias: list("alias"),
        staticliblink: list("staticliblink"),
        liblink: list("liblink"),
        dependencies: list("dependencies"),
        path: props.raw(lang, &key("path")).map(split_path_list),
        libpath: props.raw(lang, &key("libpath")).map(split_path_list),
        options: props.raw(lang, &key("options")).map(split_arguments),
        hidden: optional_bool(props, lang, &key("hidden")),
        packagedheaders: optional_bool(props, lang, &key("packagedheaders")),
        lookupname: non_empty("lookupname"),
        lookupversion: non_empty("lookupversion"),
        label,
    }
}

/// Read every tool enabled for `language`.
pub fn load_tool_definitions(props: &dyn PropertySource, language: &str) -> Vec<ToolDefinition> {
    let lang = Some(language);
    let Some(ids) = props.raw(lang, "tools").map(split_colon_list) else {
        return Vec::new();
    };

    ids.into_iter()
        .map(|id| {
            let base = format!("tools.{id}");
            let key = |field: &str| format!("{base}.{field}");
            let get = |field: &str| props.get_string(lang, &key(field));

            ToolDefinition {
                class: get("class"),
                name: get("name"),
                tool_type: get("type"),
                exe: get("exe").filter(|exe| !exe.is_empty()),
                exclude: props
                    .raw(lang, &key("exclude"))
                    .map(split_colon_list)
                    .unwrap_or_default(),
                include_key: get("includeKey"),
                options: props
                    .raw(lang, &key("options"))
                    .map(split_arguments)
                    .unwrap_or_default(),
                args: get("args"),
                language_id: get("languageId"),
                stdin_hint: get("stdinHint"),
                monaco_stdin: get("monacoStdin"),
                icon: get("icon"),
                dark_icon: get("darkIcon"),
                id,
            }
        })
        .collect()
}

fn optional_bool(props: &dyn PropertySource, lang: Option<&str>, key: &str) -> Option<bool> {
    props.get_value(lang, key).map(|v| v.is_truthy())
}
