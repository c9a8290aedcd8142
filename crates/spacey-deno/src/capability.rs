// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host capabilities the loader depends on.
//!
//! Loading only needs two things from the host: reading a local module and
//! issuing an HTTP GET. Both are traits so runs can be wired with fakes, and
//! both can be wrapped by [`Intercepted`] to observe every access.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::specifier::ModuleSpecifier;

/// Reads local module sources.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Read the source of a `file:` specifier.
    ///
    /// A missing file must be reported as [`LoaderError::LocalNotFound`].
    async fn read_source(&self, specifier: &ModuleSpecifier) -> Result<String>;
}

/// Response to an HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Body decoded as text
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs network retrievals.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL. Transport failures are [`LoaderError::Fetch`] without a status.
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: SourceReader + ?Sized> SourceReader for Arc<T> {
    async fn read_source(&self, specifier: &ModuleSpecifier) -> Result<String> {
        (**self).read_source(specifier).await
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        (**self).get(url).await
    }
}

/// [`SourceReader`] backed by the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

#[async_trait]
impl SourceReader for FsReader {
    async fn read_source(&self, specifier: &ModuleSpecifier) -> Result<String> {
        let path = specifier.to_file_path()?;
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoaderError::LocalNotFound {
                specifier: specifier.to_string(),
                path,
            }),
            Err(e) => Err(LoaderError::io(path, e)),
        }
    }
}

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Create a client using the timeouts and user agent from `config`.
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| LoaderError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoaderError::fetch_cause(url.as_str(), e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LoaderError::fetch_cause(url.as_str(), e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// A single use of a host capability.
#[derive(Debug, Clone, Copy)]
pub enum CapabilityAccess<'a> {
    /// Local module read
    ReadSource(&'a ModuleSpecifier),
    /// Network GET
    HttpGet(&'a Url),
}

/// Observer invoked before each capability access.
pub trait CapabilityHook: Send + Sync {
    /// Called with the access about to happen.
    fn on_access(&self, access: &CapabilityAccess<'_>);
}

impl<F> CapabilityHook for F
where
    F: Fn(&CapabilityAccess<'_>) + Send + Sync,
{
    fn on_access(&self, access: &CapabilityAccess<'_>) {
        self(access)
    }
}

/// Hook that logs each access at `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl CapabilityHook for TracingHook {
    fn on_access(&self, access: &CapabilityAccess<'_>) {
        match access {
            CapabilityAccess::ReadSource(specifier) => debug!(%specifier, "capability: read"),
            CapabilityAccess::HttpGet(url) => debug!(%url, "capability: http get"),
        }
    }
}

/// Wraps a capability so a hook sees every access before it is delegated.
#[derive(Debug, Clone)]
pub struct Intercepted<C, H> {
    inner: C,
    hook: H,
}

impl<C, H> Intercepted<C, H> {
    /// Wrap `inner`, reporting accesses to `hook`.
    pub fn new(inner: C, hook: H) -> Self {
        Self { inner, hook }
    }

    /// Get the wrapped capability.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C, H> SourceReader for Intercepted<C, H>
where
    C: SourceReader,
    H: CapabilityHook,
{
    async fn read_source(&self, specifier: &ModuleSpecifier) -> Result<String> {
        self.hook.on_access(&CapabilityAccess::ReadSource(specifier));
        self.inner.read_source(specifier).await
    }
}

#[async_trait]
impl<C, H> HttpClient for Intercepted<C, H>
where
    C: HttpClient,
    H: CapabilityHook,
{
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.hook.on_access(&CapabilityAccess::HttpGet(url));
        self.inner.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_reader_reads_and_reports_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.js");
        std::fs::write(&path, "export {};").unwrap();

        let present = ModuleSpecifier::from_path(&path).unwrap();
        assert_eq!(FsReader.read_source(&present).await.unwrap(), "export {};");

        let missing = ModuleSpecifier::from_path(&temp.path().join("gone.js")).unwrap();
        let err = FsReader.read_source(&missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalNotFound);
        assert!(err.to_string().contains("gone.js"));
    }

    #[tokio::test]
    async fn test_fs_reader_rejects_remote() {
        let remote = ModuleSpecifier::parse("https://example.com/a.js").unwrap();
        let err = FsReader.read_source(&remote).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSpecifier);
    }

    struct StaticClient;

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn get(&self, url: &Url) -> Result<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                body: format!("// {}", url),
            })
        }
    }

    #[tokio::test]
    async fn test_interceptor_sees_every_access() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let client = Intercepted::new(StaticClient, move |access: &CapabilityAccess<'_>| {
            assert!(matches!(access, CapabilityAccess::HttpGet(_)));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let url = Url::parse("https://example.com/x.js").unwrap();
        let response = client.get(&url).await.unwrap();
        client.get(&url).await.unwrap();

        assert_eq!(response.body, "// https://example.com/x.js");
        assert!(response.is_success());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_tracing_hook_composes_with_shared_capabilities() {
        let shared: Arc<dyn HttpClient> = Arc::new(StaticClient);
        let traced = Intercepted::new(Arc::clone(&shared), TracingHook);
        let url = Url::parse("https://example.com/y.js").unwrap();
        assert_eq!(traced.get(&url).await.unwrap().status, 200);
    }
}
