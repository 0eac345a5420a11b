//! End-to-end integration test for the full bundle pipeline
//!
//! Properties directory -> catalogs -> compiler update with a remote peer ->
//! published snapshot.

use std::time::Duration;

use httpmock::prelude::*;
use opts_core::{
    CompilerInfo, FederatorConfig, OptionsHandler, RemoteLibraryFederator, Source,
    compute_options_hash,
};
use opts_meta::{AppArguments, GLOBAL_GROUP, PropertyStore};
use opts_test_utils::ConfigDir;
use opts_test_utils::remote::{discovered_compiler, sample_catalog};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn setup_config() -> ConfigDir {
    let config = ConfigDir::new();
    let tidy = config.executable("clang-tidy");
    config
        .properties(
            GLOBAL_GROUP,
            "defaults",
            &[("languages", "c++:c"), ("cookiePolicyEnabled", "true")],
        )
        .properties(
            "c++",
            "defaults",
            &[
                ("languageName", "C++"),
                ("supportsExecute", "true"),
                ("libs", "boost:fmt"),
                ("libs.boost.name", "Boost"),
                ("libs.boost.versions", "180:182"),
                ("libs.boost.versions.180.version", "1.80.0"),
                ("libs.boost.versions.180.path", "/opt/boost_1_80"),
                ("libs.boost.versions.182.version", "1.82.0"),
                ("libs.boost.versions.182.path", "/opt/boost_1_82"),
                ("libs.fmt.name", "{fmt}"),
                ("tools", "clangtidy:ghost"),
                ("tools.clangtidy.exe", tidy.to_str().unwrap()),
                ("tools.clangtidy.type", "independent"),
                ("tools.ghost.exe", "/nonexistent/ghost"),
            ],
        )
}

#[tokio::test]
async fn test_full_pipeline() {
    let config = setup_config();
    let store = PropertyStore::load_dir(config.path(), &["defaults".to_string()]).unwrap();

    let server = MockServer::start_async().await;
    let remote_libs = server
        .mock_async(|when, then| {
            when.method(GET).path("/gpu/api/libraries/c++");
            then.status(200).json_body(sample_catalog());
        })
        .await;

    let federator = RemoteLibraryFederator::http(FederatorConfig {
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let sources = vec![Source {
        name: "Browser".to_string(),
        urlpart: "browser".to_string(),
    }];
    let args = AppArguments {
        env: vec!["test".to_string()],
        release_build_number: Some("77".to_string()),
        ..AppArguments::default()
    };

    let (handler, report) = OptionsHandler::from_properties(&store, &args, &sources, federator).unwrap();

    // Config problems are reported, not fatal.
    assert_eq!(report.about("fmt").count(), 1);
    assert_eq!(report.about("ghost").count(), 1);
    let initial_hash = handler.get_hash();

    let mut remote = discovered_compiler("gpu-nvcc", "c++", "nvcc", "12.3.0");
    remote["remote"] = json!({"target": server.base_url(), "basePath": "/gpu"});
    let compilers: Vec<CompilerInfo> = serde_json::from_value(json!([
        discovered_compiler("g122", "c++", "gcc", "12.2.0"),
        discovered_compiler("g131", "c++", "gcc", "13.1.0"),
        remote,
        {"id": "cc", "lang": "c", "supportsExecute": false}
    ]))
    .unwrap();

    handler.set_compilers(&compilers).await.unwrap();
    remote_libs.assert_hits_async(1).await;

    let snapshot = handler.snapshot();
    assert_ne!(snapshot.hash(), initial_hash);
    assert_eq!(snapshot.hash(), compute_options_hash(snapshot.json()));

    let bundle: Value = serde_json::from_str(snapshot.json()).unwrap();

    assert_eq!(bundle["release"], "77");
    assert_eq!(bundle["sentryEnvironment"], "test");
    assert_eq!(bundle["policies"]["cookies"]["enabled"], true);
    assert_eq!(bundle["sources"][0]["name"], "Browser");
    assert_eq!(bundle["languages"]["c++"]["name"], "C++");
    assert_eq!(bundle["languages"]["c++"]["supportsExecute"], true);
    assert_eq!(bundle["languages"]["c"]["supportsExecute"], false);

    let boost = &bundle["libs"]["c++"]["boost"]["versions"];
    assert_eq!(boost["180"]["$order"], 0);
    assert_eq!(boost["182"]["$order"], 1);
    assert!(bundle["libs"]["c++"]["fmt"]["versions"].as_object().unwrap().is_empty());

    assert_eq!(bundle["tools"]["c++"]["clangtidy"]["type"], "independent");
    assert!(bundle["tools"]["c++"].get("ghost").is_none());

    let remote_ids: Vec<&String> = bundle["remoteLibs"].as_object().unwrap().keys().collect();
    assert_eq!(remote_ids.len(), 1);
    let peer = &bundle["remoteLibs"][remote_ids[0].as_str()];
    assert_eq!(peer["fmt"]["versions"]["1000"]["version"], "10.0.0");

    let compilers = bundle["compilers"].as_array().unwrap();
    assert_eq!(compilers.len(), 4);
    for compiler in compilers {
        for internal in ["exe", "versionFlag", "compilerType", "demangler", "objdumper", "isSemVer"] {
            assert!(compiler.get(internal).is_none(), "{internal} leaked in {compiler}");
        }
    }
    assert_eq!(compilers[0]["$order"], -1);
    assert_eq!(compilers[1]["$order"], 0);
    assert_eq!(compilers[2]["$order"], 0);
    assert!(compilers[3].get("$order").is_none());
}
