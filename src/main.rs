// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Spacey - ES module loader for the Spacey JavaScript engine
//!
//! This is the main entry point for the spacey CLI.
//!
//! ## Commands
//!
//! - `info`: print the dependency tree of a module
//! - `cache`: download every remote dependency of a module
//! - `cache-list`, `cache-clear`, `cache-dir`: manage the content cache

mod cli;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use spacey_deno::graph::{GraphInfo, ModuleInfo, ModuleState};
use spacey_deno::{ContentCache, LoaderConfig, ModuleInspector, ModuleSpecifier, Runner};
use std::collections::{HashMap, HashSet};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{CacheArgs, Cli, Commands, InfoArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "spacey_deno=debug,spacey=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Info(args) => info(args, config).await,
        Commands::Cache(args) => cache(args, config).await,
        Commands::CacheList => cache_list(&config),
        Commands::CacheClear => cache_clear(&config).await,
        Commands::CacheDir => {
            println!("{}", config.cache_dir().display());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<LoaderConfig> {
    let mut config = LoaderConfig::load()?;
    if let Some(path) = &cli.config {
        config
            .merge_from_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Interpret a command-line entry as a URL or a local path.
fn entry_specifier(entry: &str) -> anyhow::Result<ModuleSpecifier> {
    let is_url = ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| entry.starts_with(scheme));
    let specifier = if is_url {
        ModuleSpecifier::parse(entry)?
    } else {
        ModuleSpecifier::from_path(std::path::Path::new(entry))?
    };
    Ok(specifier)
}

async fn info(args: InfoArgs, config: LoaderConfig) -> anyhow::Result<()> {
    let runner = Runner::new(config, ModuleInspector)?;
    let outcome = runner.link_specifier(entry_specifier(&args.entry)?).await?;
    let info = outcome.graph.to_info();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let total: usize = info.modules.iter().map(|m| m.size).sum();
    println!("{} {}", "entry:".bold(), info.entry);
    println!("{} {}", "modules:".bold(), info.modules.len());
    println!("{} {}", "size:".bold(), format_bytes(total as u64));
    println!("{} {}", "loaded:".bold(), outcome.stats.summary().dimmed());
    println!();
    print_tree(&info);
    Ok(())
}

fn print_tree(info: &GraphInfo) {
    let modules: HashMap<&str, &ModuleInfo> = info
        .modules
        .iter()
        .map(|m| (m.specifier.as_str(), m))
        .collect();
    let mut printed = HashSet::new();
    print_module(&modules, &info.entry, "", "", &mut printed);
}

fn print_module<'a>(
    modules: &HashMap<&'a str, &'a ModuleInfo>,
    specifier: &'a str,
    lead: &str,
    child_lead: &str,
    printed: &mut HashSet<&'a str>,
) {
    let Some(&module) = modules.get(specifier) else {
        println!("{}{} {}", lead, specifier, "(missing)".red());
        return;
    };

    let label = if module.state == ModuleState::Linked {
        specifier.cyan().to_string()
    } else {
        format!("{} ({:?})", specifier, module.state).red().to_string()
    };

    if !printed.insert(module.specifier.as_str()) {
        println!("{}{} {}", lead, label, "*".dimmed());
        return;
    }
    println!(
        "{}{} {}",
        lead,
        label,
        format!("({}, {})", module.media_type, format_bytes(module.size as u64)).dimmed()
    );

    let count = module.dependencies.len();
    for (i, dependency) in module.dependencies.iter().enumerate() {
        let last = i + 1 == count;
        let (branch, next) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        print_module(
            modules,
            dependency,
            &format!("{}{}", child_lead, branch),
            &format!("{}{}", child_lead, next),
            printed,
        );
    }
}

async fn cache(args: CacheArgs, config: LoaderConfig) -> anyhow::Result<()> {
    let runner = Runner::new(config, ModuleInspector)?;

    for entry in &args.entries {
        let outcome = runner.link_specifier(entry_specifier(entry)?).await?;
        let stats = outcome.stats;
        println!(
            "{} {} ({} modules, {} downloaded, {} already cached)",
            "Cached".green(),
            entry.cyan(),
            outcome.graph.len(),
            stats.network_fetches,
            stats.cache_hits
        );
    }
    Ok(())
}

fn cache_list(config: &LoaderConfig) -> anyhow::Result<()> {
    let cache = ContentCache::new(config.cache_dir())?;
    let entries = cache.entries()?;
    if entries.is_empty() {
        println!("{}", "Cache is empty".yellow());
        return Ok(());
    }

    let mut total = 0;
    for entry in &entries {
        total += entry.size;
        println!("{} {}", entry.specifier.cyan(), format_bytes(entry.size).dimmed());
    }
    println!();
    println!("{} modules, {}", entries.len(), format_bytes(total));
    Ok(())
}

async fn cache_clear(config: &LoaderConfig) -> anyhow::Result<()> {
    let cache = ContentCache::new(config.cache_dir())?;
    cache.clear().await?;
    println!("{}", "Cache cleared".green());
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
