//! Build the bundle and render it for stdout

use std::fs;
use std::path::Path;

use colored::Colorize;
use opts_core::{BuildReport, CompilerInfo, OptionsHandler, RemoteLibraryFederator, parse_compilers};
use opts_meta::PropertyStore;

use crate::config::Settings;
use crate::error::{CliError, Result};

/// What to print once the bundle is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Json,
    PrettyJson,
    HashOnly,
}

/// Load properties, build catalogs, apply the compiler list and render.
pub async fn run_build(
    settings: &Settings,
    compilers: Option<&Path>,
    output: Output,
    verbose: bool,
) -> Result<String> {
    let store = PropertyStore::load_dir(&settings.config_dir, &settings.envs)?;
    tracing::debug!(
        dir = %settings.config_dir.display(),
        envs = ?settings.envs,
        groups = store.groups().len(),
        "Loaded properties"
    );

    let federator = RemoteLibraryFederator::http(settings.federator)?;
    let (handler, mut report) =
        OptionsHandler::from_properties(&store, &settings.args, &settings.sources, federator)?;

    if let Some(path) = compilers {
        let list = read_compilers(path, &mut report)?;
        tracing::info!(count = list.len(), "Applying compiler list");
        report.extend(handler.set_compilers(&list).await?);
    }
    if verbose {
        print_warnings(&report);
    }

    let rendered = match output {
        Output::HashOnly => handler.get_hash(),
        Output::Json => handler.get_json().to_string(),
        Output::PrettyJson => {
            serde_json::to_string_pretty(&*handler.get()).map_err(opts_core::Error::from)?
        }
    };
    Ok(rendered)
}

fn read_compilers(path: &Path, report: &mut BuildReport) -> Result<Vec<CompilerInfo>> {
    let body = fs::read(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    parse_compilers(&body, report).map_err(|source| CliError::CompilersParse {
        path: path.to_path_buf(),
        source,
    })
}

fn print_warnings(report: &BuildReport) {
    for warning in report.warnings() {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::{RuntimeConfig, Settings};
    use clap::Parser;
    use opts_meta::GLOBAL_GROUP;
    use opts_test_utils::ConfigDir;
    use opts_test_utils::remote::discovered_compiler;
    use serde_json::{Value, json};

    fn settings(config: &ConfigDir) -> Settings {
        let cli = Cli::try_parse_from([
            "options-bundle",
            "--config-dir",
            config.path().to_str().unwrap(),
        ])
        .unwrap();
        Settings::resolve(RuntimeConfig::default(), &cli)
    }

    fn config() -> ConfigDir {
        ConfigDir::new()
            .properties(GLOBAL_GROUP, "defaults", &[("languages", "c++")])
            .properties(
                "c++",
                "defaults",
                &[
                    ("libs", "fmt"),
                    ("libs.fmt.versions", "1000"),
                    ("libs.fmt.versions.1000.version", "10.0.0"),
                    ("libs.fmt.versions.1000.path", "/opt/fmt/include"),
                ],
            )
    }

    #[tokio::test]
    async fn test_json_output_contains_catalogs() {
        let config = config();

        let out = run_build(&settings(&config), None, Output::Json, false)
            .await
            .unwrap();

        let bundle: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(bundle["libs"]["c++"]["fmt"]["versions"]["1000"]["$order"], 0);
        assert!(bundle["compilers"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hash_only_output() {
        let config = config();

        let out = run_build(&settings(&config), None, Output::HashOnly, false)
            .await
            .unwrap();

        assert_eq!(out.len(), 64);
    }

    #[tokio::test]
    async fn test_compiler_list_is_applied() {
        let config = config();
        let compilers = config.path().join("compilers.json");
        let list = json!([
            discovered_compiler("g122", "c++", "gcc", "12.2.0"),
            discovered_compiler("g131", "c++", "gcc", "13.1.0"),
        ]);
        fs::write(&compilers, list.to_string()).unwrap();

        let out = run_build(&settings(&config), Some(&compilers), Output::PrettyJson, false)
            .await
            .unwrap();

        let bundle: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(bundle["compilers"][1]["$order"], 0);
        assert_eq!(bundle["compilers"][0]["$order"], -1);
        assert_eq!(bundle["languages"]["c++"]["supportsExecute"], true);
        assert!(out.contains('\n'));
    }

    #[tokio::test]
    async fn test_malformed_compiler_list_is_an_error() {
        let config = config();
        let compilers = config.path().join("compilers.json");
        fs::write(&compilers, "{not json").unwrap();

        let err = run_build(&settings(&config), Some(&compilers), Output::Json, false)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::CompilersParse { .. }));
    }

    #[tokio::test]
    async fn test_bad_compiler_entries_are_skipped() {
        let config = config();
        let compilers = config.path().join("compilers.json");
        let list = json!([
            discovered_compiler("g131", "c++", "gcc", "13.1.0"),
            {"id": "broken"},
            {"id": "nulls", "lang": "c++", "demangler": null, "group": null}
        ]);
        fs::write(&compilers, list.to_string()).unwrap();

        let out = run_build(&settings(&config), Some(&compilers), Output::Json, true)
            .await
            .unwrap();

        let bundle: Value = serde_json::from_str(&out).unwrap();
        let ids: Vec<&str> = bundle["compilers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["g131", "nulls"]);
    }

    #[tokio::test]
    async fn test_missing_config_dir_is_an_error() {
        let config = ConfigDir::new();
        let mut settings = settings(&config);
        settings.config_dir = config.missing("etc");

        let err = run_build(&settings, None, Output::Json, false)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Meta(opts_meta::Error::DirectoryNotFound { .. })));
    }
}
