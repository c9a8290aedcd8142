// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Wires configuration, host capabilities, and an engine into a loader.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::ContentCache;
use crate::capability::{FsReader, HttpClient, Intercepted, ReqwestClient, SourceReader, TracingHook};
use crate::config::LoaderConfig;
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::fetch::RemoteFetcher;
use crate::loader::{LinkOutcome, Loader};
use crate::specifier::ModuleSpecifier;

/// Runs entry modules with the production file system and network.
pub struct Runner<E: ExecutionEngine> {
    config: LoaderConfig,
    loader: Loader<E>,
}

impl<E: ExecutionEngine> Runner<E> {
    /// Create a runner.
    ///
    /// Local modules are read from disk, remote ones through reqwest and the
    /// content cache at `config.cache_dir()`. With `trace_capabilities` set,
    /// both capabilities log every access.
    pub fn new(config: LoaderConfig, engine: E) -> Result<Self> {
        let cache = ContentCache::new(config.cache_dir())?;
        let mut client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&config)?);
        let mut reader: Arc<dyn SourceReader> = Arc::new(FsReader);

        if config.trace_capabilities {
            debug!("Tracing capability access");
            client = Arc::new(Intercepted::new(client, TracingHook));
            reader = Arc::new(Intercepted::new(reader, TracingHook));
        }

        let fetcher = RemoteFetcher::new(client, cache, &config);
        let loader = Loader::new(Arc::new(engine), reader, fetcher);
        Ok(Self { config, loader })
    }

    /// Create a runner around an existing loader.
    pub fn with_loader(config: LoaderConfig, loader: Loader<E>) -> Self {
        Self { config, loader }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Get the loader.
    pub fn loader(&self) -> &Loader<E> {
        &self.loader
    }

    /// Get the content cache.
    pub fn cache(&self) -> &ContentCache {
        self.loader.fetcher().cache()
    }

    /// Link the graph rooted at a local file.
    pub async fn link_file(&self, path: &Path) -> Result<LinkOutcome<E::Unit>> {
        let specifier = ModuleSpecifier::from_path(path)?;
        self.link_specifier(specifier).await
    }

    /// Link the graph rooted at any supported specifier. A remote entry is
    /// served from the cache when present.
    pub async fn link_specifier(&self, specifier: ModuleSpecifier) -> Result<LinkOutcome<E::Unit>> {
        info!(entry = %specifier, "Linking");
        self.loader.link_specifier(specifier).await
    }

    /// Link a local file, then evaluate it once.
    pub async fn run_file(&self, path: &Path) -> Result<E::Value> {
        let outcome = self.link_file(path).await?;
        self.loader.evaluate_entry(&outcome.graph)
    }
}
