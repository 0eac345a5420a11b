//! Client-facing settings
//!
//! Static parts of the options bundle: feature flags, policy switches,
//! sharing settings and per-language defaults. Everything here is read once
//! at startup and never changes for the lifetime of the process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::properties::{PropertySource, per_language};

/// Process arguments that feed into the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppArguments {
    /// Active environments, most general first (e.g. `["prod", "amazon"]`).
    pub env: Vec<String>,
    pub release_build_number: Option<String>,
    pub git_release_name: Option<String>,
    pub do_cache: bool,
}

/// A consent policy toggle shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySetting {
    pub enabled: bool,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policies {
    pub cookies: PolicySetting,
    pub privacy: PolicySetting,
}

/// Settings serialized verbatim into the options bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub sharing_enabled: bool,
    pub github_enabled: bool,
    pub show_sponsors: bool,
    pub url_shorten_service: String,
    pub default_source: String,
    pub default_libs: BTreeMap<String, String>,
    pub default_compiler: BTreeMap<String, String>,
    pub compile_options: BTreeMap<String, String>,
    pub supports_binary: BTreeMap<String, bool>,
    pub supports_binary_object: BTreeMap<String, bool>,
    /// True when any language enables execution in its properties.
    pub supports_execute: bool,
    pub supports_library_code_filter: bool,
    pub sentry_dsn: String,
    pub sentry_environment: String,
    pub release: String,
    pub git_release_commit: String,
    pub cookie_domain_re: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_storage_prefix: Option<String>,
    pub cv_compiler_count_max: i64,
    pub default_font_scale: i64,
    pub do_cache: bool,
    pub third_party_integration_enabled: bool,
    pub status_tracking_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_versions_url: Option<String>,
    pub policies: Policies,
    pub motd_url: String,
    pub pageload_url: String,
}

impl ClientSettings {
    /// Read settings for `languages` from `props`.
    pub fn load(props: &dyn PropertySource, languages: &[String], args: &AppArguments) -> Self {
        let global = |key: &str, default: &str| props.get_string_or(None, key, default);
        let flag = |key: &str, default: bool| props.get_bool(None, key, default);
        let per_lang_string = |key: &str| {
            per_language(languages, |lang| props.get_string_or(Some(lang), key, ""))
        };
        let per_lang_flag = |key: &str, default: bool| {
            per_language(languages, |lang| props.get_bool(Some(lang), key, default))
        };

        let supports_execute = per_lang_flag("supportsExecute", true)
            .values()
            .any(|&enabled| enabled);
        let supports_library_code_filter = per_lang_flag("supportsLibraryCodeFilter", false)
            .values()
            .any(|&enabled| enabled);

        let sentry_environment = props
            .get_string(None, "sentryEnvironment")
            .filter(|env| !env.is_empty())
            .or_else(|| args.env.first().cloned())
            .unwrap_or_default();
        let release = args
            .release_build_number
            .clone()
            .or_else(|| args.git_release_name.clone())
            .unwrap_or_default();

        Self {
            sharing_enabled: flag("clientSharingEnabled", true),
            github_enabled: flag("clientGitHubRibbonEnabled", true),
            show_sponsors: flag("showSponsors", false),
            url_shorten_service: global("urlShortenService", "default"),
            default_source: global("defaultSource", ""),
            default_libs: per_lang_string("defaultLibs"),
            default_compiler: per_lang_string("defaultCompiler"),
            compile_options: per_lang_string("defaultOptions"),
            supports_binary: per_lang_flag("supportsBinary", true),
            supports_binary_object: per_lang_flag("supportsBinaryObject", true),
            supports_execute,
            supports_library_code_filter,
            sentry_dsn: global("sentryDsn", ""),
            sentry_environment,
            release,
            git_release_commit: args.git_release_name.clone().unwrap_or_default(),
            cookie_domain_re: global("cookieDomainRe", ""),
            local_storage_prefix: props.get_string(None, "localStoragePrefix"),
            cv_compiler_count_max: props.get_i64(None, "cvCompilerCountMax", 6),
            default_font_scale: props.get_i64(None, "defaultFontScale", 14),
            do_cache: args.do_cache,
            third_party_integration_enabled: flag("thirdPartyIntegrationEnabled", true),
            status_tracking_enabled: flag("statusTrackingEnabled", true),
            compiler_versions_url: props.get_string(None, "compilerVersionsUrl"),
            policies: Policies {
                cookies: PolicySetting {
                    enabled: flag("cookiePolicyEnabled", false),
                    key: "cookie_status".to_string(),
                },
                privacy: PolicySetting {
                    enabled: flag("privacyPolicyEnabled", false),
                    key: "privacy_status".to_string(),
                },
            },
            motd_url: global("motdUrl", ""),
            pageload_url: global("pageloadUrl", ""),
        }
    }
}
