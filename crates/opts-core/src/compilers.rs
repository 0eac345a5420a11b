//! Compiler registry
//!
//! Compiler descriptions arrive from compiler discovery with fields that
//! must never reach clients (executable paths, version detection flags,
//! tool paths).
//! [`CompilerInfo`] is the full description; [`ClientCompiler`] is the
//! client-visible projection, which simply has no internal-only fields.
//!
//! Compilers flagged `isSemVer` are grouped by `group` and ranked newest
//! first: `$order` is `0` for the newest and decreases by one per step.

use std::collections::{BTreeMap, HashSet};

use opts_meta::compare_versions;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::bundle::LanguageInfo;
use crate::error::Result;
use crate::remote::{RemoteLibraryFederator, remote_id};
use crate::report::BuildReport;

/// Key used for the ordering rank in serialized entries.
const ORDER_KEY: &str = "$order";

/// Where a remotely executed compiler lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remote {
    pub target: String,
    #[serde(default)]
    pub base_path: String,
}

impl Remote {
    /// Base URL of the remote instance.
    pub fn full_url(&self) -> String {
        format!("{}{}", self.target, self.base_path)
    }
}

/// A compiler as supplied by compiler discovery
///
/// Input is loosely typed: every field except `id` and `lang` may be absent,
/// `null` or of an unexpected type, and is then treated as unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerInfo {
    pub id: String,
    pub lang: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub semver: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub supports_execute: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub supports_binary: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub remote: Option<Remote>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub alias: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub instruction_set: Option<String>,

    // Internal only: never copied into `ClientCompiler`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub exe: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub version_flag: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub version_re: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub compiler_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub demangler: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub demangler_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub objdumper: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub post_process: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_sem_ver: Option<bool>,

    /// Any other client-visible fields, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompilerInfo {
    fn executes(&self) -> bool {
        self.supports_execute.unwrap_or(false)
    }

    fn in_semver_group(&self) -> bool {
        self.is_sem_ver.unwrap_or(false)
    }
}

/// A compiler as served to clients: the input minus internal-only fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCompiler {
    pub id: String,
    pub lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_execute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_binary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<Remote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_set: Option<String>,
    /// Rank within the semver group, 0 = newest, then -1, -2, ...
    #[serde(rename = "$order", skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&CompilerInfo> for ClientCompiler {
    fn from(info: &CompilerInfo) -> Self {
        let mut extra = info.extra.clone();
        extra.remove(ORDER_KEY);
        Self {
            id: info.id.clone(),
            lang: info.lang.clone(),
            name: info.name.clone(),
            group: info.group.clone(),
            group_name: info.group_name.clone(),
            semver: info.semver.clone(),
            supports_execute: info.supports_execute,
            supports_binary: info.supports_binary,
            remote: info.remote.clone(),
            options: info.options.clone(),
            alias: info.alias.clone(),
            instruction_set: info.instruction_set.clone(),
            order: None,
            extra,
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            tracing::debug!(%value, error = %err, "Ignoring compiler field of unexpected type");
            Ok(None)
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse a JSON array of compiler descriptions.
///
/// Entries without a usable `id` or `lang` are skipped and reported; the
/// rest of the list is kept. Only a body that is not a JSON array is an
/// error.
pub fn parse_compilers(body: &[u8], report: &mut BuildReport) -> Result<Vec<CompilerInfo>> {
    let entries: Vec<Value> = serde_json::from_slice(body)?;
    let mut compilers = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let subject = entry
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| format!("#{index}"), str::to_string);
        let language = entry
            .get("lang")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match serde_json::from_value::<CompilerInfo>(entry) {
            Ok(compiler) => compilers.push(compiler),
            Err(err) => {
                tracing::warn!(compiler = %subject, error = %err, "Skipping unusable compiler entry");
                report.warn(language, subject, format!("unusable compiler entry: {err}"));
            }
        }
    }
    Ok(compilers)
}

/// Recompute each language's execute support from the compiler list.
///
/// Every flag is reset first, so a language only supports execution while
/// at least one of its compilers does.
pub fn derive_execute_support(
    languages: &mut BTreeMap<String, LanguageInfo>,
    compilers: &[CompilerInfo],
) {
    for lang in languages.values_mut() {
        lang.supports_execute = false;
    }
    for compiler in compilers.iter().filter(|c| c.executes()) {
        match languages.get_mut(&compiler.lang) {
            Some(lang) => lang.supports_execute = true,
            None => tracing::warn!(
                compiler = %compiler.id,
                language = %compiler.lang,
                "Compiler supports execution for an unknown language"
            ),
        }
    }
}

/// Assign `$order` to every compiler that belongs to a semver group.
///
/// `infos` and `clients` must be parallel slices.
pub fn assign_semver_orders(infos: &[CompilerInfo], clients: &mut [ClientCompiler]) {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, info) in infos.iter().enumerate().filter(|(_, c)| c.in_semver_group()) {
        groups
            .entry(info.group.as_deref().unwrap_or_default())
            .or_default()
            .push(idx);
    }

    let semver = |idx: usize| infos[idx].semver.as_deref().unwrap_or_default();
    for members in groups.values_mut() {
        // Newest first; equal versions keep their list order.
        members.sort_by(|&a, &b| compare_versions(semver(b), semver(a)));
        for (rank, &idx) in members.iter().enumerate() {
            clients[idx].order = Some(-(rank as i64));
        }
    }
}

/// Turn a new compiler list into client-visible entries.
///
/// Remote compilers trigger a catalog fetch for their language, one at a
/// time in list order. A failed fetch only leaves that remote's catalog
/// empty; it is recorded in `report` once per remote at error level.
pub async fn resolve_compilers(
    compilers: &[CompilerInfo],
    languages: &mut BTreeMap<String, LanguageInfo>,
    federator: &RemoteLibraryFederator,
    report: &mut BuildReport,
) -> Vec<ClientCompiler> {
    let compilers = compilers.to_vec();
    derive_execute_support(languages, &compilers);

    let mut reported = HashSet::new();
    for compiler in &compilers {
        let Some(remote) = &compiler.remote else {
            continue;
        };
        let url = remote.full_url();
        let catalog = federator.fetch_catalog(&compiler.lang, &url).await;
        if let Some(failure) = catalog.failure {
            if reported.insert(remote_id(&url, &compiler.lang)) {
                report.error(
                    compiler.lang.as_str(),
                    url,
                    format!("remote libraries unavailable: {failure}"),
                );
            }
        }
    }

    let mut clients: Vec<ClientCompiler> = compilers.iter().map(ClientCompiler::from).collect();
    assign_semver_orders(&compilers, &mut clients);
    clients
}
