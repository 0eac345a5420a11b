//! Build diagnostics
//!
//! Catalog builders never abort on bad configuration. Every degraded or
//! omitted entry is logged and recorded here so callers can inspect what
//! was skipped.

use serde::Serialize;

/// Severity level for build warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarnLevel {
    /// Configuration entry degraded or omitted
    Warning,
    /// Remote library catalog lost
    Error,
}

impl std::fmt::Display for WarnLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One recorded configuration problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    /// Severity
    pub level: WarnLevel,
    /// Language the entry belongs to
    pub language: String,
    /// Library, version or tool id the warning is about
    pub subject: String,
    /// Human-readable description
    pub message: String,
}

impl std::fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.level, self.language, self.subject, self.message
        )
    }
}

/// Warnings collected while building catalogs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. The caller is responsible for logging it.
    pub fn warn(
        &mut self,
        language: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(WarnLevel::Warning, language.into(), subject.into(), message.into());
    }

    /// Record a lost remote contribution.
    pub fn error(
        &mut self,
        language: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(WarnLevel::Error, language.into(), subject.into(), message.into());
    }

    fn push(&mut self, level: WarnLevel, language: String, subject: String, message: String) {
        self.warnings.push(BuildWarning {
            level,
            language,
            subject,
            message,
        });
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Warnings about a given subject id
    pub fn about<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a BuildWarning> + 'a {
        self.warnings.iter().filter(move |w| w.subject == subject)
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Append all warnings from `other`.
    pub fn extend(&mut self, other: BuildReport) {
        self.warnings.extend(other.warnings);
    }
}
