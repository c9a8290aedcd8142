// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-deno
//!
//! Deno-style ES module loading for the Spacey JavaScript engine.
//!
//! Given an entry module, the loader resolves every static import against
//! its importer, reads local modules from disk, fetches `http:`/`https:`
//! modules through a durable content cache, erases TypeScript types, and
//! hands each module to an [`ExecutionEngine`]. The result is a
//! [`ModuleGraph`] with exactly one record per module, ready to evaluate.
//!
//! - Specifiers are URLs over `file`, `http` and `https`
//! - Remote sources are cached on disk and never fetched twice
//! - Cyclic and diamond imports are linked once each
//! - TypeScript is erased in place, keeping line and column positions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_deno::{LoaderConfig, ModuleInspector, Runner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = Runner::new(LoaderConfig::load()?, ModuleInspector)?;
//!     let outcome = runner.link_file(Path::new("main.ts")).await?;
//!     println!("{} modules", outcome.graph.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom hosts
//!
//! Loading only needs a [`SourceReader`] and an [`HttpClient`]. Either can be
//! replaced, and either can be wrapped in [`Intercepted`] to observe access:
//!
//! ```rust,ignore
//! let reader = Intercepted::new(FsReader, |access: &CapabilityAccess<'_>| {
//!     eprintln!("{:?}", access);
//! });
//! let loader = Loader::new(Arc::new(engine), Arc::new(reader), fetcher);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod loader;
pub mod media;
pub mod runner;
pub mod specifier;
pub mod transpile;

// Re-exports
pub use cache::ContentCache;
pub use capability::{
    CapabilityAccess, CapabilityHook, FsReader, HttpClient, HttpResponse, Intercepted,
    ReqwestClient, SourceReader, TracingHook,
};
pub use config::LoaderConfig;
pub use engine::{EngineError, ExecutionEngine, ImportMeta, ModuleInspector};
pub use error::{ErrorKind, LoaderError, Result};
pub use fetch::RemoteFetcher;
pub use graph::{ModuleGraph, ModuleRecord, ModuleState};
pub use loader::{LinkOutcome, LoadCounts, Loader};
pub use media::MediaType;
pub use runner::Runner;
pub use specifier::{resolve, ModuleSpecifier};
pub use transpile::{needs_transpile, transpile};

/// Version of spacey-deno
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
