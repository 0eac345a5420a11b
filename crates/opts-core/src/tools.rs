//! Tool catalog
//!
//! A tool only enters the catalog when its executable exists on disk.
//! Nothing is executed here; the check is a plain existence test.

use std::collections::BTreeMap;
use std::path::Path;

use opts_meta::ToolDefinition;
use serde::Serialize;

use crate::report::BuildReport;

/// `language -> tool id -> tool`
pub type ToolCatalog = BTreeMap<String, BTreeMap<String, Tool>>;

/// When a tool runs relative to compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// Runs on the source, independent of the compiler output
    Independent,
    /// Runs on the compiler output
    #[default]
    Postcompilation,
}

impl ToolType {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "independent" => Some(Self::Independent),
            "postcompilation" => Some(Self::Postcompilation),
            _ => None,
        }
    }
}

/// A tool as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub exe: String,
    pub exclude: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_key: Option<String>,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monaco_stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_icon: Option<String>,
    /// Language whose compilers this tool is attached to
    pub compiler_language: String,
}

/// Build the tool catalog, dropping tools whose executable is missing.
pub fn build_tools(
    definitions: &BTreeMap<String, Vec<ToolDefinition>>,
    report: &mut BuildReport,
) -> ToolCatalog {
    let mut catalog = ToolCatalog::new();
    for (lang, defs) in definitions {
        let tools = catalog.entry(lang.clone()).or_default();
        for def in defs {
            if let Some(tool) = build_tool(lang, def, report) {
                tools.insert(def.id.clone(), tool);
            }
        }
    }
    catalog
}

/// Build one tool, or `None` if its executable does not exist.
pub fn build_tool(language: &str, def: &ToolDefinition, report: &mut BuildReport) -> Option<Tool> {
    let Some(exe) = def.exe.as_deref().filter(|exe| executable_exists(exe)) else {
        tracing::warn!(tool = %def.id, language, exe = ?def.exe, "Unable to stat tool binary");
        report.warn(language, &def.id, "unable to stat tool binary");
        return None;
    };

    let tool_type = match def.tool_type.as_deref() {
        None => ToolType::default(),
        Some(raw) => ToolType::parse(raw).unwrap_or_else(|| {
            tracing::warn!(tool = %def.id, language, tool_type = raw, "Unknown tool type, assuming postcompilation");
            report.warn(language, &def.id, format!("unknown tool type '{raw}'"));
            ToolType::default()
        }),
    };

    Some(Tool {
        id: def.id.clone(),
        name: def.name.clone().unwrap_or_else(|| def.id.clone()),
        tool_type,
        class: def.class.clone(),
        exe: exe.to_string(),
        exclude: def.exclude.clone(),
        include_key: def.include_key.clone(),
        options: def.options.clone(),
        args: def.args.clone(),
        language_id: def.language_id.clone(),
        stdin_hint: def.stdin_hint.clone(),
        monaco_stdin: def.monaco_stdin.clone(),
        icon: def.icon.clone(),
        dark_icon: def.dark_icon.clone(),
        compiler_language: language.to_string(),
    })
}

fn executable_exists(exe: &str) -> bool {
    Path::new(exe).exists()
}
