// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Remote module fetcher with write-through caching.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::cache::ContentCache;
use crate::capability::HttpClient;
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::specifier::ModuleSpecifier;

/// Fetches network modules and records successful responses in the cache.
#[derive(Clone)]
pub struct RemoteFetcher {
    client: Arc<dyn HttpClient>,
    cache: ContentCache,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl RemoteFetcher {
    /// Create a fetcher using the deadline and parallelism from `config`.
    pub fn new(client: Arc<dyn HttpClient>, cache: ContentCache, config: &LoaderConfig) -> Self {
        Self::with_limits(client, cache, config.fetch_timeout(), config.max_concurrent_fetches)
    }

    /// Create a fetcher with explicit limits.
    pub fn with_limits(
        client: Arc<dyn HttpClient>,
        cache: ContentCache,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            client,
            cache,
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// The cache responses are written to.
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Retrieve a network module.
    ///
    /// Non-2xx responses, transport failures, and deadline expiry are
    /// [`LoaderError::Fetch`] and leave the cache untouched. On success the
    /// body is stored before it is returned.
    #[instrument(skip(self, specifier), fields(specifier = %specifier))]
    pub async fn fetch(&self, specifier: &ModuleSpecifier) -> Result<String> {
        if !specifier.is_remote() {
            return Err(LoaderError::malformed(
                specifier.as_str(),
                "",
                "not a network specifier",
            ));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LoaderError::Aborted)?;

        debug!("Fetching");
        let response = tokio::time::timeout(self.timeout, self.client.get(specifier.as_url()))
            .await
            .map_err(|_| {
                LoaderError::fetch_cause(
                    specifier.as_str(),
                    format!("timed out after {:?}", self.timeout),
                )
            })??;

        if !response.is_success() {
            warn!(status = response.status, "Fetch failed");
            return Err(LoaderError::fetch_status(specifier.as_str(), response.status));
        }

        debug!(status = response.status, bytes = response.body.len(), "Fetched");
        self.cache.put(specifier, &response.body).await?;
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::HttpResponse;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use url::Url;

    struct FixedClient {
        status: u16,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedClient {
        fn new(status: u16) -> Self {
            Self {
                status,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpClient for FixedClient {
        async fn get(&self, url: &Url) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(HttpResponse {
                status: self.status,
                body: format!("export default '{}';", url),
            })
        }
    }

    fn setup(client: Arc<FixedClient>, timeout: Duration) -> (TempDir, RemoteFetcher) {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path()).unwrap();
        let fetcher = RemoteFetcher::with_limits(client, cache, timeout, 4);
        (temp, fetcher)
    }

    #[tokio::test]
    async fn test_success_writes_through() {
        let client = Arc::new(FixedClient::new(200));
        let (_temp, fetcher) = setup(Arc::clone(&client), Duration::from_secs(5));
        let specifier = ModuleSpecifier::parse("https://example.com/lib.js").unwrap();

        let body = fetcher.fetch(&specifier).await.unwrap();
        assert_eq!(body, "export default 'https://example.com/lib.js';");
        assert_eq!(fetcher.cache().get(&specifier).await.unwrap(), Some(body));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_not_cached() {
        let client = Arc::new(FixedClient::new(404));
        let (_temp, fetcher) = setup(client, Duration::from_secs(5));
        let specifier = ModuleSpecifier::parse("https://example.com/missing.js").unwrap();

        let err = fetcher.fetch(&specifier).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.status(), Some(404));
        assert!(fetcher.cache().get(&specifier).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_enforced() {
        let client = Arc::new(FixedClient {
            delay: Duration::from_secs(60),
            ..FixedClient::new(200)
        });
        let (_temp, fetcher) = setup(client, Duration::from_secs(2));
        let specifier = ModuleSpecifier::parse("https://example.com/slow.js").unwrap();

        let err = fetcher.fetch(&specifier).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("timed out"));
        assert!(fetcher.cache().get(&specifier).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_specifier_is_rejected() {
        let client = Arc::new(FixedClient::new(200));
        let (_temp, fetcher) = setup(Arc::clone(&client), Duration::from_secs(5));
        let specifier = ModuleSpecifier::parse("file:///main.js").unwrap();

        assert!(fetcher.fetch(&specifier).await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}
