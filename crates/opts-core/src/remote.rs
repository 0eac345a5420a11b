//! Remote library federation
//!
//! Compilers hosted by a peer instance use that instance's libraries. The
//! [`RemoteLibraryFederator`] fetches a peer's catalog for one language from
//! `GET <remote>/api/libraries/<language>` and memoizes the result per remote
//! identity for the lifetime of the process.
//!
//! Failures never propagate: a remote that cannot be reached, answers with a
//! non-success status, times out, or returns malformed JSON is cached as an
//! empty catalog so the rest of the bundle stays usable.
//!
//! Concurrent callers for the same remote share a single in-flight request.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use url::Url;

use crate::error::{Error, Result};

/// Default bound on a single remote catalog request.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// `library id -> library` for one remote and language
pub type RemoteLibraries = BTreeMap<String, RemoteLibrary>;

/// A library published by a remote instance, re-keyed by version id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteLibrary {
    pub id: String,
    pub versions: BTreeMap<String, RemoteLibraryVersion>,
    /// Remaining fields, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLibraryVersion {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire shape of one entry in the remote's JSON array
#[derive(Debug, Deserialize)]
struct WireLibrary {
    id: String,
    #[serde(default)]
    versions: Vec<RemoteLibraryVersion>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<WireLibrary> for RemoteLibrary {
    fn from(wire: WireLibrary) -> Self {
        Self {
            id: wire.id,
            versions: wire
                .versions
                .into_iter()
                .map(|v| (v.id.clone(), v))
                .collect(),
            extra: wire.extra,
        }
    }
}

/// Parse a remote catalog body into a keyed mapping.
pub fn parse_remote_libraries(body: &[u8]) -> Result<RemoteLibraries> {
    let wire: Vec<WireLibrary> = serde_json::from_slice(body)?;
    Ok(wire
        .into_iter()
        .map(|lib| (lib.id.clone(), RemoteLibrary::from(lib)))
        .collect())
}

/// Cache key for a remote catalog: host, port and path of the remote
/// followed by `_` and the language.
///
/// Dots become `_`, so `godbolt.org/gpu` and `c++` give `godbolt_org/gpu_c++`.
/// Literal `%` and `_` are percent-escaped first, and the language never
/// contains a bare `_`, so distinct inputs always yield distinct ids.
/// Unparsable URLs fall back to the raw string.
pub fn remote_id(remote_base_url: &str, language: &str) -> String {
    let location = match Url::parse(remote_base_url) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let path = url.path().trim_end_matches('/');
            match url.port() {
                Some(port) => format!("{host}:{port}{path}"),
                None => format!("{host}{path}"),
            }
        }
        Err(_) => remote_base_url.to_string(),
    };
    format!("{}_{}", escape_id(&location, "_"), escape_id(language, "%2E"))
}

fn escape_id(raw: &str, dot: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '.' => out.push_str(dot),
            other => out.push(other),
        }
    }
    out
}

/// `<remote>/api/libraries/<language>`, respecting any base path on the remote.
pub fn libraries_url(remote_base_url: &str, language: &str) -> Result<Url> {
    let invalid = |message: String| Error::InvalidRemoteUrl {
        url: remote_base_url.to_string(),
        message,
    };
    let mut url = Url::parse(remote_base_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["api", "libraries", language]);
    Ok(url)
}

/// Transport for remote catalog requests.
#[async_trait]
pub trait LibraryFetcher: Send + Sync {
    /// Fetch the body at `url`. Non-success statuses are errors.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// [`LibraryFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpLibraryFetcher {
    client: reqwest::Client,
}

impl HttpLibraryFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LibraryFetcher for HttpLibraryFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let request_failed = |e: reqwest::Error| Error::RemoteRequest {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_failed)?
            .error_for_status()
            .map_err(request_failed)?;
        let body = response.bytes().await.map_err(request_failed)?;
        Ok(body.to_vec())
    }
}

/// Settings for the federator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FederatorConfig {
    /// Upper bound on a single fetch, including body download
    pub timeout: Duration,
}

impl Default for FederatorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

/// Outcome of the first fetch for one remote identity
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCatalog {
    pub libraries: Arc<RemoteLibraries>,
    /// Why the catalog is empty, when the fetch failed
    pub failure: Option<Arc<str>>,
}

type Slot = Arc<OnceCell<RemoteCatalog>>;

/// Memoizing fetcher of remote library catalogs.
pub struct RemoteLibraryFederator {
    fetcher: Arc<dyn LibraryFetcher>,
    config: FederatorConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RemoteLibraryFederator {
    pub fn new(fetcher: Arc<dyn LibraryFetcher>, config: FederatorConfig) -> Self {
        Self {
            fetcher,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Federator using [`HttpLibraryFetcher`] with the configured timeout.
    pub fn http(config: FederatorConfig) -> Result<Self> {
        let fetcher = HttpLibraryFetcher::new(config.timeout)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    /// Catalog of `language` libraries on the remote at `remote_base_url`.
    ///
    /// The first call per remote identity performs the request; later and
    /// concurrent calls get the same result without touching the network.
    pub async fn fetch(&self, language: &str, remote_base_url: &str) -> Arc<RemoteLibraries> {
        self.fetch_catalog(language, remote_base_url).await.libraries
    }

    /// Like [`fetch`](Self::fetch), also reporting whether the memoized
    /// fetch failed.
    pub async fn fetch_catalog(&self, language: &str, remote_base_url: &str) -> RemoteCatalog {
        let id = remote_id(remote_base_url, language);
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(id.clone()).or_default().clone()
        };

        slot.get_or_init(|| async {
            match self.load(language, remote_base_url).await {
                Ok(libs) => {
                    tracing::debug!(remote = %id, libraries = libs.len(), "Fetched remote libraries");
                    RemoteCatalog {
                        libraries: Arc::new(libs),
                        failure: None,
                    }
                }
                Err(err) => {
                    tracing::error!(remote = %id, error = %err, "Error while fetching remote libraries, but continuing");
                    RemoteCatalog {
                        libraries: Arc::new(RemoteLibraries::new()),
                        failure: Some(Arc::from(err.to_string())),
                    }
                }
            }
        })
        .await
        .clone()
    }

    async fn load(&self, language: &str, remote_base_url: &str) -> Result<RemoteLibraries> {
        let url = libraries_url(remote_base_url, language)?;
        tracing::info!(%url, "Fetching remote libraries");
        let body = tokio::time::timeout(self.config.timeout, self.fetcher.fetch(&url))
            .await
            .map_err(|_| Error::RemoteTimeout {
                url: url.to_string(),
                seconds: self.config.timeout.as_secs(),
            })??;
        parse_remote_libraries(&body)
    }

    /// Every completed catalog, keyed by remote identity.
    pub fn cached(&self) -> BTreeMap<String, RemoteLibraries> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .iter()
            .filter_map(|(id, slot)| {
                slot.get()
                    .map(|catalog| (id.clone(), (*catalog.libraries).clone()))
            })
            .collect()
    }
}

impl std::fmt::Debug for RemoteLibraryFederator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLibraryFederator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
