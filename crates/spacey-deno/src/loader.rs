// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module graph loader.
//!
//! [`Loader::link`] builds the graph of everything an entry module
//! statically imports. Each specifier is loaded at most once per run:
//! concurrent requests for the same module share one in-flight future, and a
//! module already present in the graph (even one still linking) is reused
//! rather than visited again. Sibling imports are loaded concurrently and the
//! first failure ends the run.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{self, AbortHandle, BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::capability::SourceReader;
use crate::engine::{ExecutionEngine, ImportMeta};
use crate::error::{LoaderError, Result};
use crate::fetch::RemoteFetcher;
use crate::graph::{ModuleGraph, ModuleRecord, ModuleState, RecordRef};
use crate::media::MediaType;
use crate::specifier::{resolve, ModuleSpecifier};
use crate::transpile;

/// Counters for the work done during one run.
#[derive(Debug, Default)]
pub struct LoadStats {
    local_reads: AtomicUsize,
    cache_hits: AtomicUsize,
    network_fetches: AtomicUsize,
    transpiles: AtomicUsize,
    units_created: AtomicUsize,
}

impl LoadStats {
    fn inc_local_reads(&self) {
        self.local_reads.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_network_fetches(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_transpiles(&self) {
        self.transpiles.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_units_created(&self) {
        self.units_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of the counters.
    pub fn snapshot(&self) -> LoadCounts {
        LoadCounts {
            local_reads: self.local_reads.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            transpiles: self.transpiles.load(Ordering::Relaxed),
            units_created: self.units_created.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`LoadStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadCounts {
    /// Local modules read
    pub local_reads: usize,
    /// Remote modules served from the content cache
    pub cache_hits: usize,
    /// Remote modules requested from the network
    pub network_fetches: usize,
    /// Modules transpiled
    pub transpiles: usize,
    /// Engine units created
    pub units_created: usize,
}

impl LoadCounts {
    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{} local, {} cached, {} fetched, {} transpiled",
            self.local_reads, self.cache_hits, self.network_fetches, self.transpiles
        )
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct LinkOutcome<U> {
    /// The linked graph
    pub graph: ModuleGraph<U>,
    /// Work done while building it
    pub stats: LoadCounts,
}

type LoadFuture<U> = Shared<BoxFuture<'static, Result<RecordRef<U>>>>;

/// Builds module graphs.
pub struct Loader<E: ExecutionEngine> {
    engine: Arc<E>,
    reader: Arc<dyn SourceReader>,
    fetcher: RemoteFetcher,
}

impl<E: ExecutionEngine> Loader<E> {
    /// Create a loader reading local modules through `reader` and remote
    /// ones through `fetcher` and its cache.
    pub fn new(engine: Arc<E>, reader: Arc<dyn SourceReader>, fetcher: RemoteFetcher) -> Self {
        Self {
            engine,
            reader,
            fetcher,
        }
    }

    /// The engine units are created with.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// The local-read capability.
    pub fn reader(&self) -> &Arc<dyn SourceReader> {
        &self.reader
    }

    /// The remote fetcher.
    pub fn fetcher(&self) -> &RemoteFetcher {
        &self.fetcher
    }

    /// Link the graph rooted at an entry module whose source is already known.
    ///
    /// Any failure aborts the whole run and is returned; the partial graph
    /// is discarded.
    pub async fn link(
        &self,
        entry_source: String,
        entry_specifier: ModuleSpecifier,
    ) -> Result<LinkOutcome<E::Unit>> {
        self.run(entry_specifier, Some(entry_source)).await
    }

    /// Link the graph rooted at `entry_specifier`, obtaining the entry the
    /// same way as any other module and counting it in the run's stats.
    pub async fn link_specifier(
        &self,
        entry_specifier: ModuleSpecifier,
    ) -> Result<LinkOutcome<E::Unit>> {
        self.run(entry_specifier, None).await
    }

    #[instrument(skip(self, entry_specifier, entry_source), fields(entry = %entry_specifier))]
    async fn run(
        &self,
        entry_specifier: ModuleSpecifier,
        entry_source: Option<String>,
    ) -> Result<LinkOutcome<E::Unit>> {
        let run = Run::new(self, entry_specifier);
        let mut guard = FailOnDrop::new(&run.graph);

        let result = run.link_entry(entry_source).await;
        let stats = run.context.stats.snapshot();

        match result {
            Ok(()) => {
                guard.disarm();
                drop(guard);
                info!(modules = run.graph.len(), "Linked graph ({})", stats.summary());
                Ok(LinkOutcome {
                    graph: run.graph,
                    stats,
                })
            }
            Err(e) => {
                warn!(error = %e, "Linking failed");
                Err(e)
            }
        }
    }

    /// Like [`link`](Self::link), but can be cancelled through the returned
    /// handle. An aborted run resolves to [`LoaderError::Aborted`] and drops
    /// every outstanding fetch.
    pub fn link_abortable(
        &self,
        entry_source: String,
        entry_specifier: ModuleSpecifier,
    ) -> (impl Future<Output = Result<LinkOutcome<E::Unit>>> + '_, AbortHandle) {
        let (linking, handle) = future::abortable(self.link(entry_source, entry_specifier));
        let linking = async move {
            match linking.await {
                Ok(result) => result,
                Err(future::Aborted) => {
                    warn!("Linking aborted");
                    Err(LoaderError::Aborted)
                }
            }
        };
        (linking, handle)
    }

    /// Evaluate the entry unit of a linked graph.
    pub fn evaluate_entry(&self, graph: &ModuleGraph<E::Unit>) -> Result<E::Value> {
        let entry = graph.entry();
        let record = graph.get(entry).ok_or_else(|| {
            LoaderError::link(entry.as_str(), "entry module is not in the graph")
        })?;

        let record = record.read();
        if record.state != ModuleState::Linked {
            return Err(LoaderError::link(
                entry.as_str(),
                format!("entry module is {:?}, not linked", record.state),
            ));
        }

        debug!(%entry, "Evaluating");
        self.engine
            .evaluate(&record.unit)
            .map_err(|e| LoaderError::Evaluation {
                specifier: entry.to_string(),
                message: e.message,
            })
    }
}

/// What a load needs, owned so in-flight loads can outlive any one requester.
struct LoadContext<E: ExecutionEngine> {
    engine: Arc<E>,
    reader: Arc<dyn SourceReader>,
    fetcher: RemoteFetcher,
    stats: Arc<LoadStats>,
}

impl<E: ExecutionEngine> Clone for LoadContext<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            reader: Arc::clone(&self.reader),
            fetcher: self.fetcher.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<E: ExecutionEngine> LoadContext<E> {
    /// Obtain, transpile, and compile a module that is not the entry.
    async fn load(self, specifier: ModuleSpecifier) -> Result<RecordRef<E::Unit>> {
        let raw = self.obtain(&specifier).await?;
        let record = self.build_record(specifier, raw, false)?;
        Ok(Arc::new(RwLock::new(record)))
    }

    /// Raw source of a module: a local read, a cache hit, or a fetch.
    async fn obtain(&self, specifier: &ModuleSpecifier) -> Result<String> {
        if specifier.is_local() {
            self.stats.inc_local_reads();
            return self.reader.read_source(specifier).await;
        }
        match self.fetcher.cache().get(specifier).await? {
            Some(source) => {
                self.stats.inc_cache_hits();
                Ok(source)
            }
            None => {
                self.stats.inc_network_fetches();
                self.fetcher.fetch(specifier).await
            }
        }
    }

    fn build_record(
        &self,
        specifier: ModuleSpecifier,
        raw: String,
        is_entry: bool,
    ) -> Result<ModuleRecord<E::Unit>> {
        let media_type = MediaType::from_specifier(&specifier);
        let raw_source: Arc<str> = Arc::from(raw);
        let executable_source = if media_type.needs_transpile() {
            self.stats.inc_transpiles();
            Arc::from(transpile::transpile(&specifier, &raw_source, media_type)?)
        } else {
            Arc::clone(&raw_source)
        };

        let meta = ImportMeta::new(specifier.clone(), is_entry);
        let unit = self
            .engine
            .create_unit(&executable_source, specifier.as_str(), meta)
            .map_err(|e| LoaderError::link(specifier.as_str(), e.message))?;
        self.stats.inc_units_created();

        Ok(ModuleRecord::new(
            specifier,
            raw_source,
            executable_source,
            media_type,
            is_entry,
            unit,
        ))
    }
}

/// State for one call to [`Loader::link`].
struct Run<E: ExecutionEngine> {
    context: LoadContext<E>,
    graph: ModuleGraph<E::Unit>,
    in_flight: DashMap<ModuleSpecifier, LoadFuture<E::Unit>>,
}

impl<E: ExecutionEngine> Run<E> {
    fn new(loader: &Loader<E>, entry: ModuleSpecifier) -> Self {
        Self {
            context: LoadContext {
                engine: Arc::clone(&loader.engine),
                reader: Arc::clone(&loader.reader),
                fetcher: loader.fetcher.clone(),
                stats: Arc::new(LoadStats::default()),
            },
            graph: ModuleGraph::new(entry),
            in_flight: DashMap::new(),
        }
    }

    async fn link_entry(&self, source: Option<String>) -> Result<()> {
        let specifier = self.graph.entry().clone();
        let source = match source {
            Some(source) => source,
            None => self.context.obtain(&specifier).await?,
        };
        let record = self.context.build_record(specifier, source, true)?;
        let record = self.graph.insert(Arc::new(RwLock::new(record)));
        self.link_children(record).await
    }

    /// Make sure `specifier` is in the graph, recursing into its imports if
    /// this call is the one that loaded it.
    async fn link_child(&self, specifier: ModuleSpecifier) -> Result<()> {
        if self.graph.contains(&specifier) {
            return Ok(());
        }

        let (load, owner) = self.request(&specifier);
        let record = self.graph.insert(load.await?);
        if owner {
            self.link_children(record).await
        } else {
            Ok(())
        }
    }

    /// Get the in-flight load for `specifier`, starting it if nobody has.
    fn request(&self, specifier: &ModuleSpecifier) -> (LoadFuture<E::Unit>, bool) {
        match self.in_flight.entry(specifier.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let load = self
                    .context
                    .clone()
                    .load(specifier.clone())
                    .boxed()
                    .shared();
                entry.insert(load.clone());
                (load, true)
            }
        }
    }

    fn link_children(&self, record: RecordRef<E::Unit>) -> BoxFuture<'_, Result<()>> {
        async move {
            let (specifier, references) = {
                let r = record.read();
                let references = self.context.engine.declared_imports(&r.unit);
                (r.specifier.clone(), references)
            };
            let references = references
                .map_err(|e| LoaderError::link(specifier.as_str(), e.message))
                .map_err(|e| self.fail(&record, e))?;

            let mut dependencies: Vec<ModuleSpecifier> = Vec::with_capacity(references.len());
            for reference in &references {
                let child = resolve(reference, &specifier)
                    .map_err(|e| self.fail(&record, e))?;
                if !dependencies.contains(&child) {
                    dependencies.push(child);
                }
            }
            record.write().dependencies = dependencies.clone();

            let children = dependencies.into_iter().map(|child| self.link_child(child));
            future::try_join_all(children)
                .await
                .map_err(|e| self.fail(&record, e))?;

            record.write().state = ModuleState::Linked;
            debug!(%specifier, "Linked");
            Ok(())
        }
        .boxed()
    }

    fn fail(&self, record: &RecordRef<E::Unit>, error: LoaderError) -> LoaderError {
        let mut r = record.write();
        if r.state != ModuleState::Failed {
            r.state = ModuleState::Failed;
            debug!(specifier = %r.specifier, error = %error, "Module failed");
        }
        error
    }
}

/// Marks the graph failed unless the run finished.
struct FailOnDrop<'a, U> {
    graph: &'a ModuleGraph<U>,
    armed: bool,
}

impl<'a, U> FailOnDrop<'a, U> {
    fn new(graph: &'a ModuleGraph<U>) -> Self {
        Self { graph, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<U> Drop for FailOnDrop<'_, U> {
    fn drop(&mut self) {
        if self.armed {
            self.graph.fail_pending();
        }
    }
}
