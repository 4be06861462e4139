use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, info, warn};

use crate::capabilities::client::{CapabilitiesClient, CapabilitiesRequest};
use crate::capabilities::parse::parse_capabilities;
use crate::capabilities::{CapabilitiesError, CapabilityDocument};

/// Identifies one memoized capability fetch: the endpoint URL exactly as
/// configured (with embedded credentials stripped) plus the protocol version.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CacheKey {
    /// Credential-stripped endpoint URL.
    pub url: String,
    /// Protocol version the document was requested with.
    pub version: String,
}

impl CacheKey {
    /// Creates a key from a credential-stripped endpoint URL and version.
    #[must_use]
    pub fn new(url: &str, version: &str) -> Self {
        Self {
            url: url.to_string(),
            version: version.to_string(),
        }
    }
}

/// A parsed capability document shared between all layers referencing it.
pub type SharedCapabilities = Arc<CapabilityDocument>;

/// Process-lifetime memoization of parsed capability documents.
///
/// Each [`CacheKey`] is fetched and parsed at most once per process run,
/// however many layers reference it and however concurrently they do so;
/// concurrent callers for the same uncached key await a single in-flight
/// fetch. Failures are cached negatively: a known-broken endpoint is not
/// retried for the lifetime of the process. There is no expiry, no
/// invalidation and no persistence; a process restart is the only way to
/// refresh.
#[derive(Clone, Debug)]
pub struct CapabilitiesCache {
    client: Arc<dyn CapabilitiesClient>,
    cache: Cache<CacheKey, Result<SharedCapabilities, CapabilitiesError>>,
}

impl CapabilitiesCache {
    /// Creates an empty cache on top of the given fetch client.
    #[must_use]
    pub fn new(client: Arc<dyn CapabilitiesClient>) -> Self {
        Self {
            client,
            cache: Cache::builder().name("capabilities_cache").build(),
        }
    }

    /// Returns the capability document for a request, fetching and parsing
    /// it on first use of the request's [`CacheKey`].
    ///
    /// Coalescing and negative caching are per key; independent endpoints
    /// never wait on each other.
    pub async fn get(
        &self,
        request: &CapabilitiesRequest,
    ) -> Result<SharedCapabilities, CapabilitiesError> {
        let key = request.key().clone();
        let client = Arc::clone(&self.client);
        let request = request.clone();
        self.cache
            .get_with(key, async move { fetch_and_parse(&*client, &request).await })
            .await
    }
}

async fn fetch_and_parse(
    client: &dyn CapabilitiesClient,
    request: &CapabilitiesRequest,
) -> Result<SharedCapabilities, CapabilitiesError> {
    let url = &request.key().url;
    debug!("fetching capabilities from {}", request.url());
    let result = async {
        let body = client.fetch(request).await?;
        parse_capabilities(url, &body)
    }
    .await;
    match result {
        Ok(document) => {
            info!(
                "fetched capabilities from {url} ({} layers)",
                document.layers.len()
            );
            Ok(Arc::new(document))
        }
        Err(error) => {
            warn!("caching failed capabilities fetch for {url}: {error}");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::future::join_all;

    use super::*;
    use crate::capabilities::HttpAuth;

    const MINIMAL_DOC: &str = r#"<?xml version="1.0"?>
        <WMS_Capabilities version="1.3.0">
            <Service><Title>Test</Title></Service>
            <Capability><Layer><Name>roads</Name></Layer></Capability>
        </WMS_Capabilities>"#;

    #[derive(Debug, Default)]
    struct CountingClient {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CapabilitiesClient for CountingClient {
        async fn fetch(&self, request: &CapabilitiesRequest) -> Result<Bytes, CapabilitiesError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(CapabilitiesError::SourceUnavailable {
                    url: request.key().url.clone(),
                    reason: "connection refused".to_string(),
                })
            } else {
                Ok(Bytes::from_static(MINIMAL_DOC.as_bytes()))
            }
        }
    }

    fn request(url: &str, version: &str) -> CapabilitiesRequest {
        CapabilitiesRequest::new(url, version, HttpAuth::default(), None).unwrap()
    }

    #[tokio::test]
    async fn repeated_gets_fetch_once() {
        let client = Arc::new(CountingClient::default());
        let cache = CapabilitiesCache::new(Arc::clone(&client) as _);
        let req = request("http://example.com/wms", "1.1.1");

        let first = cache.get(&req).await.unwrap();
        let second = cache.get(&req).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn concurrent_gets_for_one_key_coalesce() {
        let client = Arc::new(CountingClient::default());
        let cache = CapabilitiesCache::new(Arc::clone(&client) as _);
        let req = request("http://example.com/wms", "1.1.1");

        let results = join_all((0..16).map(|_| cache.get(&req))).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_versions_are_distinct_keys() {
        let client = Arc::new(CountingClient::default());
        let cache = CapabilitiesCache::new(Arc::clone(&client) as _);

        cache.get(&request("http://example.com/wms", "1.1.1")).await.unwrap();
        cache.get(&request("http://example.com/wms", "1.3.0")).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_cached_negatively() {
        let client = Arc::new(CountingClient {
            fail: true,
            ..CountingClient::default()
        });
        let cache = CapabilitiesCache::new(Arc::clone(&client) as _);
        let req = request("http://broken.example.com/wms", "1.1.1");

        let first = cache.get(&req).await.unwrap_err();
        let second = cache.get(&req).await.unwrap_err();

        assert!(matches!(first, CapabilitiesError::SourceUnavailable { .. }));
        assert_eq!(first, second);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
