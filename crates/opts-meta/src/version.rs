//! Best-effort semantic version ordering.
//!
//! Version labels in configuration are not reliably semver compliant
//! (`1.80`, `trunk`, `12.2.0 (experimental)`). [`safe_version`] normalizes a
//! label before parsing:
//!
//! - only the first whitespace-separated token is considered
//! - a leading `v` or `=` is dropped
//! - missing minor/patch components are padded with `0`
//!
//! Labels that still fail to parse compare as `0.0.0`. The resulting order is
//! total and comparison never fails.
//!
//! # Examples
//!
//! ```
//! use opts_meta::version::compare_versions;
//! use std::cmp::Ordering;
//!
//! assert_eq!(compare_versions("1.80.0", "1.82.0"), Ordering::Less);
//! assert_eq!(compare_versions("13", "12.2.0"), Ordering::Greater);
//! assert_eq!(compare_versions("trunk", "0.0.0"), Ordering::Equal);
//! ```

use std::cmp::Ordering;

use semver::Version;

/// Parse `label` as a semantic version, substituting `0.0.0` when it cannot be
/// understood.
pub fn safe_version(label: &str) -> Version {
    normalize(label)
        .and_then(|candidate| Version::parse(&candidate).ok())
        .unwrap_or_else(|| Version::new(0, 0, 0))
}

/// Compare two version labels under [`safe_version`] normalization.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    safe_version(a).cmp(&safe_version(b))
}

/// Stable ascending sort by version label. Equal versions keep their
/// relative order.
pub fn sort_ascending<T>(items: &mut [T], label: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| safe_version(label(item)));
}

fn normalize(label: &str) -> Option<String> {
    let token = label.split_whitespace().next()?;
    let token = token
        .strip_prefix('v')
        .or_else(|| token.strip_prefix('V'))
        .or_else(|| token.strip_prefix('='))
        .unwrap_or(token);

    // Pad only the numeric core; pre-release and build metadata are kept as-is.
    let split_at = token.find(['-', '+']).unwrap_or(token.len());
    let (core, suffix) = token.split_at(split_at);
    let padded = match core.matches('.').count() {
        0 => format!("{core}.0.0"),
        1 => format!("{core}.0"),
        _ => core.to_string(),
    };
    Some(format!("{padded}{suffix}"))
}
