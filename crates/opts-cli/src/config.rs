//! Runtime configuration
//!
//! Settings come from an optional TOML file and are overridden by
//! command-line flags:
//!
//! ```toml
//! config_dir = "etc/config"
//! envs = ["amazon"]
//! remote_timeout_secs = 10
//! release_build_number = "1234"
//! do_cache = true
//!
//! [[sources]]
//! name = "Browser"
//! urlpart = "browser"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use opts_core::{FederatorConfig, Source};
use opts_meta::AppArguments;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Properties directory used when neither the file nor the flags name one
pub const DEFAULT_CONFIG_DIR: &str = "etc/config";

/// Environment that is always loaded first
pub const BASE_ENV: &str = "defaults";

/// Contents of the TOML runtime config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub config_dir: Option<PathBuf>,
    pub envs: Vec<String>,
    pub remote_timeout_secs: Option<u64>,
    pub release_build_number: Option<String>,
    pub git_release_name: Option<String>,
    pub do_cache: bool,
    pub sources: Vec<Source>,
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CliError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything a bundle build needs, after flags are applied
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config_dir: PathBuf,
    /// `defaults` followed by the requested environments, without repeats
    pub envs: Vec<String>,
    pub args: AppArguments,
    pub federator: FederatorConfig,
    pub sources: Vec<Source>,
}

impl Settings {
    /// Merge `file` with the flags in `cli`. Flags win.
    pub fn resolve(file: RuntimeConfig, cli: &Cli) -> Self {
        let requested = if cli.envs.is_empty() {
            file.envs
        } else {
            cli.envs.clone()
        };
        let mut envs = vec![BASE_ENV.to_string()];
        for env in requested {
            if !envs.contains(&env) {
                envs.push(env);
            }
        }

        let federator = match cli.remote_timeout.or(file.remote_timeout_secs) {
            Some(secs) => FederatorConfig {
                timeout: Duration::from_secs(secs),
            },
            None => FederatorConfig::default(),
        };

        let args = AppArguments {
            // Client-visible environment list excludes the implicit base.
            env: envs.iter().skip(1).cloned().collect(),
            release_build_number: file.release_build_number,
            git_release_name: file.git_release_name,
            do_cache: file.do_cache,
        };

        Self {
            config_dir: cli
                .config_dir
                .clone()
                .or(file.config_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            envs,
            args,
            federator,
            sources: file.sources,
        }
    }

    /// Load the file named by `--config`, if any, and apply the flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => RuntimeConfig::load(path)?,
            None => RuntimeConfig::default(),
        };
        Ok(Self::resolve(file, cli))
    }
}
