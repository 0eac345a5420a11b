//! Hierarchical property store
//!
//! Configuration is supplied as flat `key=value` pairs grouped by file:
//! one global group plus one group per language. Language-scoped lookups
//! check the language's group first, then the global group, then fall
//! back to the caller's default.
//!
//! Files are named `<group>.<env>.properties`. When loading a directory,
//! environments are applied in the order given, so later environments
//! override earlier ones (e.g. `defaults` then `local`).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Name of the group holding settings shared by every language.
pub const GLOBAL_GROUP: &str = "compiler-explorer";

const PROPERTIES_EXTENSION: &str = "properties";

/// A property value after type inference.
///
/// Raw text is inferred the same way for every key: `true`/`yes` and
/// `false`/`no` become booleans, integer literals become `Int`, decimal
/// literals become `Float`, everything else stays a string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    /// Infer a typed value from raw property text.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" | "yes" => return PropertyValue::Bool(true),
            "false" | "no" => return PropertyValue::Bool(false),
            _ => {}
        }
        if is_integer_literal(raw) {
            if let Ok(n) = raw.parse::<i64>() {
                return PropertyValue::Int(n);
            }
        }
        if is_decimal_literal(raw) {
            if let Ok(f) = raw.parse::<f64>() {
                return PropertyValue::Float(f);
            }
        }
        PropertyValue::Str(raw.to_string())
    }

    /// Truthiness as used for feature flags: non-zero numbers and
    /// non-empty strings count as enabled.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Bool(b) => *b,
            PropertyValue::Int(n) => *n != 0,
            PropertyValue::Float(f) => *f != 0.0,
            PropertyValue::Str(s) => !s.is_empty(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(n) => write!(f, "{n}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Str(s) => f.write_str(s),
        }
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

fn is_decimal_literal(raw: &str) -> bool {
    let body = raw.strip_prefix('-').unwrap_or(raw);
    match body.split_once('.') {
        Some((int, frac)) => {
            int.bytes().all(|b| b.is_ascii_digit())
                && !frac.is_empty()
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Read access to configuration properties.
///
/// Implementors only provide [`raw`](PropertySource::raw); the typed
/// getters are derived from it. Every getter tolerates absent keys by
/// returning the supplied default.
pub trait PropertySource: Send + Sync {
    /// Raw text for `key`, scoped to `language` when given.
    fn raw(&self, language: Option<&str>, key: &str) -> Option<&str>;

    /// String value, `None` when the key is absent.
    fn get_string(&self, language: Option<&str>, key: &str) -> Option<String> {
        self.raw(language, key).map(str::to_string)
    }

    fn get_string_or(&self, language: Option<&str>, key: &str, default: &str) -> String {
        self.raw(language, key).unwrap_or(default).to_string()
    }

    /// Typed value, `None` when the key is absent.
    fn get_value(&self, language: Option<&str>, key: &str) -> Option<PropertyValue> {
        self.raw(language, key).map(PropertyValue::parse)
    }

    fn get_bool(&self, language: Option<&str>, key: &str, default: bool) -> bool {
        self.get_value(language, key)
            .map(|v| v.is_truthy())
            .unwrap_or(default)
    }

    fn get_i64(&self, language: Option<&str>, key: &str, default: i64) -> i64 {
        match self.get_value(language, key) {
            Some(value) => value.as_i64().unwrap_or_else(|| {
                tracing::warn!(key, %value, "Expected an integer property, using default");
                default
            }),
            None => default,
        }
    }
}

/// Evaluate `lookup` once per language, producing a `language -> value` map.
///
/// This is the multi-language form of a property lookup.
pub fn per_language<T>(
    languages: &[String],
    mut lookup: impl FnMut(&str) -> T,
) -> BTreeMap<String, T> {
    languages
        .iter()
        .map(|lang| (lang.clone(), lookup(lang)))
        .collect()
}

/// A parsed `key=value` line that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub line: usize,
    pub text: String,
}

/// Parse `.properties` text into ordered key/value pairs.
///
/// Blank lines and lines starting with `#` are ignored. Keys and values are
/// trimmed. Lines without `=` are returned separately so the caller can
/// report them.
pub fn parse_properties(text: &str) -> (Vec<(String, String)>, Vec<MalformedLine>) {
    let mut pairs = Vec::new();
    let mut malformed = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                pairs.push((key.trim().to_string(), value.trim().to_string()));
            }
            _ => malformed.push(MalformedLine {
                line: idx + 1,
                text: trimmed.to_string(),
            }),
        }
    }

    (pairs, malformed)
}

/// In-memory property store keyed by group.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    groups: HashMap<String, BTreeMap<String, String>>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single property in `group`, replacing any previous value.
    pub fn set(&mut self, group: &str, key: impl Into<String>, value: impl Into<String>) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, group: &str, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(group, key, value);
        self
    }

    /// Merge `.properties` text into `group`. Returns the number of keys set.
    ///
    /// `origin` is only used for log messages.
    pub fn merge_text(&mut self, group: &str, text: &str, origin: &str) -> usize {
        let (pairs, malformed) = parse_properties(text);
        for bad in malformed {
            tracing::warn!(origin, line = bad.line, text = %bad.text, "Skipping malformed property line");
        }
        let count = pairs.len();
        for (key, value) in pairs {
            self.set(group, key, value);
        }
        count
    }

    /// Load every `<group>.<env>.properties` file in `dir` whose env is in `envs`.
    ///
    /// Environments are applied in the order given. Within one environment,
    /// files are applied in name order. Files for other environments are ignored.
    pub fn load_dir(dir: &Path, envs: &[String]) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let entries = fs::read_dir(dir).map_err(|source| Error::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<(String, String, std::path::PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::Read {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROPERTIES_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((group, env)) = stem.rsplit_once('.') else {
                tracing::debug!(?path, "Ignoring properties file without an environment suffix");
                continue;
            };
            files.push((group.to_string(), env.to_string(), path));
        }
        files.sort_by(|a, b| a.2.cmp(&b.2));

        let mut store = Self::new();
        for env in envs {
            for (group, _, path) in files.iter().filter(|(_, e, _)| e == env) {
                let text = fs::read_to_string(path).map_err(|source| Error::Read {
                    path: path.clone(),
                    source,
                })?;
                let origin = path.display().to_string();
                let count = store.merge_text(group, &text, &origin);
                tracing::debug!(group, env, count, "Loaded properties");
            }
        }

        Ok(store)
    }

    /// Names of all groups present in the store (sorted).
    pub fn groups(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

impl PropertySource for PropertyStore {
    fn raw(&self, language: Option<&str>, key: &str) -> Option<&str> {
        if let Some(lang) = language {
            if let Some(value) = self.groups.get(lang).and_then(|g| g.get(key)) {
                return Some(value.as_str());
            }
        }
        self.groups
            .get(GLOBAL_GROUP)
            .and_then(|g| g.get(key))
            .map(String::as_str)
    }
}
