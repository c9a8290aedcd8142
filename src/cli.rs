// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CLI argument parsing for spacey.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// spacey - load, cache and inspect ES module graphs
#[derive(Parser, Debug)]
#[command(name = "spacey")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file, after the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Content cache directory
    #[arg(long, global = true, env = "SPACEY_DENO_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the dependency tree of a module
    Info(InfoArgs),

    /// Link modules, downloading remote dependencies into the cache
    Cache(CacheArgs),

    /// List cached remote modules
    CacheList,

    /// Remove every cached module
    CacheClear,

    /// Print the cache directory
    CacheDir,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Entry module: a local path or an http(s) URL
    pub entry: String,

    /// Print the graph as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Entry modules: local paths or http(s) URLs
    #[arg(required = true)]
    pub entries: Vec<String>,
}
