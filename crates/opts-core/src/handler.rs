//! Options bundle cache
//!
//! [`OptionsHandler`] owns the current [`OptionsSnapshot`] and is the only
//! writer of bundle state. Updates build a complete new snapshot (bundle,
//! JSON and hash) before swapping it in, so readers observe either the old
//! or the new state, never a mix.
//!
//! Updates are serialized by an async mutex held for the whole update,
//! including remote fetches. Readers never take that mutex; they only clone
//! an `Arc` under a short read lock.

use std::sync::{Arc, PoisonError, RwLock};

use opts_meta::{AppArguments, PropertySource};

use crate::bundle::{ClientOptions, OptionsSnapshot, Source};
use crate::compilers::{CompilerInfo, resolve_compilers};
use crate::error::Result;
use crate::remote::RemoteLibraryFederator;
use crate::report::BuildReport;

/// Holder of the current options bundle.
///
/// # Example
///
/// ```ignore
/// use opts_core::{OptionsHandler, RemoteLibraryFederator, FederatorConfig};
///
/// let federator = RemoteLibraryFederator::http(FederatorConfig::default())?;
/// let (handler, report) = OptionsHandler::from_properties(&props, &args, &sources, federator)?;
/// handler.set_compilers(&compilers).await?;
/// println!("{}", handler.get_hash());
/// ```
#[derive(Debug)]
pub struct OptionsHandler {
    current: RwLock<Arc<OptionsSnapshot>>,
    update_lock: tokio::sync::Mutex<()>,
    federator: RemoteLibraryFederator,
}

impl OptionsHandler {
    /// Publish `options` as the initial state.
    pub fn new(options: ClientOptions, federator: RemoteLibraryFederator) -> Result<Self> {
        let snapshot = OptionsSnapshot::new(options)?;
        tracing::info!(hash = %snapshot.hash(), "OPTIONS HASH");
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            update_lock: tokio::sync::Mutex::new(()),
            federator,
        })
    }

    /// Build the initial bundle from configuration and publish it.
    ///
    /// Configuration problems never fail the build; they are returned in the
    /// report.
    pub fn from_properties(
        props: &dyn PropertySource,
        args: &AppArguments,
        sources: &[Source],
        federator: RemoteLibraryFederator,
    ) -> Result<(Self, BuildReport)> {
        let mut report = BuildReport::new();
        let options = ClientOptions::build(props, args, sources, &mut report);
        if !report.is_empty() {
            tracing::info!(warnings = report.len(), "Options built with configuration warnings");
        }
        Ok((Self::new(options, federator)?, report))
    }

    /// Replace the compiler list.
    ///
    /// Remote compilers have their language's library catalog fetched first;
    /// a failing remote only leaves its catalog empty and is returned in the
    /// report at error level.
    pub async fn set_compilers(&self, compilers: &[CompilerInfo]) -> Result<BuildReport> {
        let _guard = self.update_lock.lock().await;

        let mut report = BuildReport::new();
        let mut options = ClientOptions::clone(self.snapshot().options());
        options.compilers =
            resolve_compilers(compilers, &mut options.languages, &self.federator, &mut report)
                .await;
        options.remote_libs = self.federator.cached();

        self.publish(options)?;
        Ok(report)
    }

    fn publish(&self, options: ClientOptions) -> Result<()> {
        let snapshot = Arc::new(OptionsSnapshot::new(options)?);
        tracing::info!(hash = %snapshot.hash(), "OPTIONS HASH");
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = snapshot;
        Ok(())
    }

    /// The current bundle, serialized form and hash, as one consistent unit.
    pub fn snapshot(&self) -> Arc<OptionsSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current bundle. Treat as read-only.
    pub fn get(&self) -> Arc<ClientOptions> {
        self.snapshot().options().clone()
    }

    /// The current bundle serialized as JSON.
    pub fn get_json(&self) -> Arc<str> {
        self.snapshot().json().clone()
    }

    /// Hash of the current serialized bundle.
    pub fn get_hash(&self) -> String {
        self.snapshot().hash().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::compute_options_hash;
    use crate::remote::{FederatorConfig, LibraryFetcher};
    use async_trait::async_trait;
    use opts_meta::{GLOBAL_GROUP, PropertyStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;

    struct OfflineFetcher;

    #[async_trait]
    impl LibraryFetcher for OfflineFetcher {
        async fn fetch(&self, url: &Url) -> crate::Result<Vec<u8>> {
            Err(crate::Error::RemoteRequest {
                url: url.to_string(),
                message: "offline".to_string(),
            })
        }
    }

    fn handler() -> OptionsHandler {
        let store = PropertyStore::new().with(GLOBAL_GROUP, "languages", "c++:c");
        let federator =
            RemoteLibraryFederator::new(Arc::new(OfflineFetcher), FederatorConfig::default());
        let (handler, _) =
            OptionsHandler::from_properties(&store, &AppArguments::default(), &[], federator)
                .unwrap();
        handler
    }

    fn compilers(value: serde_json::Value) -> Vec<CompilerInfo> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_hash_matches_serialized_form() {
        let handler = handler();
        let snapshot = handler.snapshot();
        assert_eq!(snapshot.hash(), compute_options_hash(snapshot.json()));
        assert_eq!(handler.get_hash(), snapshot.hash());
    }

    #[tokio::test]
    async fn test_set_compilers_replaces_list_and_rehashes() {
        let handler = handler();
        let before = handler.get_hash();

        handler
            .set_compilers(&compilers(json!([{"id": "g132", "lang": "c++", "exe": "/usr/bin/g++"}])))
            .await
            .unwrap();

        let options = handler.get();
        assert_eq!(options.compilers.len(), 1);
        assert_ne!(handler.get_hash(), before);
        assert!(!handler.get_json().contains("/usr/bin/g++"));
    }

    #[tokio::test]
    async fn test_identical_updates_produce_identical_hashes() {
        let handler = handler();
        let list = compilers(json!([
            {"id": "gcc12", "lang": "c++", "group": "gcc", "isSemVer": true, "semver": "12.2.0"},
            {"id": "gcc13", "lang": "c++", "group": "gcc", "isSemVer": true, "semver": "13.1.0"}
        ]));

        handler.set_compilers(&list).await.unwrap();
        let first = handler.get_hash();
        handler.set_compilers(&list).await.unwrap();

        assert_eq!(handler.get_hash(), first);
    }

    #[tokio::test]
    async fn test_failed_remote_still_publishes() {
        let handler = handler();
        let list = compilers(json!([
            {"id": "remote-gcc", "lang": "c++", "remote": {"target": "https://peer.example", "basePath": "/gpu"}},
            {"id": "local", "lang": "c", "supportsExecute": true}
        ]));

        let report = handler.set_compilers(&list).await.unwrap();

        let options = handler.get();
        assert_eq!(options.compilers.len(), 2);
        assert!(options.remote_libs["peer_example/gpu_c++"].is_empty());
        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings()[0].level, crate::report::WarnLevel::Error);
        assert_eq!(report.warnings()[0].subject, "https://peer.example/gpu");
        assert!(options.languages["c"].supports_execute);
        assert!(!options.languages["c++"].supports_execute);
    }

    #[tokio::test]
    async fn test_caller_list_is_not_aliased() {
        let handler = handler();
        let mut list = compilers(json!([{"id": "a", "lang": "c", "name": "before"}]));

        handler.set_compilers(&list).await.unwrap();
        list[0].name = Some("after".to_string());

        assert_eq!(handler.get().compilers[0].name.as_deref(), Some("before"));
    }

    #[tokio::test]
    async fn test_old_snapshot_stays_consistent() {
        let handler = handler();
        let old = handler.snapshot();

        handler
            .set_compilers(&compilers(json!([{"id": "a", "lang": "c"}])))
            .await
            .unwrap();

        assert!(old.options().compilers.is_empty());
        assert_eq!(old.hash(), compute_options_hash(old.json()));
        assert_ne!(old.hash(), handler.get_hash());
    }
}
