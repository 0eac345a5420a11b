//! Scenario tests for the options bundle engine
//!
//! Grouped by concern: library ranking, remote federation and publication
//! under concurrent reads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use httpmock::prelude::*;
use opts_core::{
    BuildReport, ClientOptions, CompilerInfo, FederatorConfig, OptionsHandler,
    RemoteLibraryFederator, WarnLevel, compute_options_hash,
};
use opts_meta::{AppArguments, GLOBAL_GROUP, PropertyStore};
use opts_test_utils::remote::{discovered_compiler, sample_catalog};
use serde_json::json;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn store() -> PropertyStore {
    PropertyStore::new()
        .with(GLOBAL_GROUP, "languages", "c++:c")
        .with("c++", "libs", "boost")
        .with("c++", "libs.boost.versions", "182:180")
        .with("c++", "libs.boost.versions.180.version", "1.80.0")
        .with("c++", "libs.boost.versions.180.path", "/opt/boost_1_80")
        .with("c++", "libs.boost.versions.182.version", "1.82.0")
        .with("c++", "libs.boost.versions.182.path", "/opt/boost_1_82")
}

fn handler(timeout: Duration) -> OptionsHandler {
    let federator = RemoteLibraryFederator::http(FederatorConfig { timeout }).unwrap();
    let (handler, _) =
        OptionsHandler::from_properties(&store(), &AppArguments::default(), &[], federator).unwrap();
    handler
}

fn remote_compiler(id: &str, lang: &str, target: &str) -> serde_json::Value {
    let mut compiler = discovered_compiler(id, lang, "remote", "1.0.0");
    compiler["remote"] = json!({"target": target, "basePath": ""});
    compiler
}

fn compilers(value: serde_json::Value) -> Vec<CompilerInfo> {
    serde_json::from_value(value).unwrap()
}

// =============================================================================
// Library ranking
// =============================================================================

mod libraries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn declaration_order_does_not_affect_rank() {
        let options =
            ClientOptions::build(&store(), &AppArguments::default(), &[], &mut BuildReport::new());

        let versions = &options.libs["c++"]["boost"].versions;
        assert_eq!(versions["180"].order, 0);
        assert_eq!(versions["182"].order, 1);
    }

    #[test]
    fn rebuilding_from_same_config_is_identical() {
        let build = || {
            ClientOptions::build(&store(), &AppArguments::default(), &[], &mut BuildReport::new())
        };

        assert_eq!(build(), build());
    }
}

// =============================================================================
// Remote federation
// =============================================================================

mod federation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn compilers_sharing_a_remote_fetch_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/libraries/c");
                then.status(200).json_body(sample_catalog());
            })
            .await;
        let handler = handler(Duration::from_secs(5));
        let list = compilers(json!([
            remote_compiler("r1", "c", &server.base_url()),
            remote_compiler("r2", "c", &server.base_url()),
        ]));

        handler.set_compilers(&list).await.unwrap();
        handler.set_compilers(&list).await.unwrap();

        mock.assert_hits_async(1).await;
        let options = handler.get();
        assert_eq!(options.remote_libs.len(), 1);
        assert_eq!(options.remote_libs.values().next().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failing_remote_leaves_rest_of_bundle_intact() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/libraries/c");
                then.status(503);
            })
            .await;
        let handler = handler(Duration::from_secs(5));
        let list = compilers(json!([
            remote_compiler("r1", "c", &server.base_url()),
            discovered_compiler("g131", "c++", "gcc", "13.1.0"),
        ]));

        let report = handler.set_compilers(&list).await.unwrap();

        let options = handler.get();
        assert_eq!(options.compilers.len(), 2);
        assert!(options.remote_libs.values().all(|libs| libs.is_empty()));
        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings()[0].level, WarnLevel::Error);
        assert_eq!(options.libs["c++"]["boost"].versions.len(), 2);
    }

    #[tokio::test]
    async fn unreachable_remote_is_cached_as_empty() {
        let handler = handler(Duration::from_millis(500));
        // Port 9 (discard) on localhost is expected to refuse connections.
        let list = compilers(json!([remote_compiler("r1", "c", "http://127.0.0.1:9")]));

        handler.set_compilers(&list).await.unwrap();

        let options = handler.get();
        assert_eq!(options.remote_libs.len(), 1);
        assert!(options.remote_libs.values().all(|libs| libs.is_empty()));
    }
}

// =============================================================================
// Publication
// =============================================================================

mod publication {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_always_see_a_consistent_snapshot() {
        let handler = Arc::new(handler(Duration::from_secs(5)));
        let done = Arc::new(AtomicBool::new(false));

        let mut readers = Vec::new();
        for _ in 0..4 {
            let handler = handler.clone();
            let done = done.clone();
            readers.push(tokio::spawn(async move {
                let mut checked = 0usize;
                while !done.load(Ordering::Acquire) {
                    let snapshot = handler.snapshot();
                    assert_eq!(snapshot.hash(), compute_options_hash(snapshot.json()));
                    let count = snapshot.options().compilers.len();
                    assert_eq!(snapshot.json().matches("\"lang\"").count(), count);
                    checked += 1;
                    tokio::task::yield_now().await;
                }
                checked
            }));
        }

        for round in 1..=20 {
            let list: Vec<_> = (0..round)
                .map(|i| discovered_compiler(&format!("g{i}"), "c++", "gcc", &format!("{}.0.0", i + 1)))
                .collect();
            handler.set_compilers(&compilers(json!(list))).await.unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.await.unwrap() > 0);
        }
        assert_eq!(handler.get().compilers.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_updates_are_serialized() {
        let handler = Arc::new(handler(Duration::from_secs(5)));
        let a = compilers(json!([discovered_compiler("a", "c++", "gcc", "12.0.0")]));
        let b = compilers(json!([
            discovered_compiler("b1", "c++", "gcc", "13.0.0"),
            discovered_compiler("b2", "c++", "gcc", "14.0.0"),
        ]));

        let (ra, rb) = tokio::join!(handler.set_compilers(&a), handler.set_compilers(&b));
        ra.unwrap();
        rb.unwrap();

        let options = handler.get();
        let ids: Vec<&str> = options.compilers.iter().map(|c| c.id.as_str()).collect();
        assert!(ids == ["a"] || ids == ["b1", "b2"], "mixed update: {ids:?}");
        assert_eq!(handler.get_hash(), compute_options_hash(&handler.get_json()));
    }
}
