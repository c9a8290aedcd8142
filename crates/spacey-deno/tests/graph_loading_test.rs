//! Module graph loading integration tests
//!
//! Runs the loader against an in-memory host and a counting engine so the
//! at-most-once, cycle, cache and failure rules can be observed directly.

use async_trait::async_trait;
use parking_lot::Mutex;
use spacey_deno::engine::{InspectedUnit, ModuleSummary};
use spacey_deno::{
    CapabilityAccess, ContentCache, EngineError, ErrorKind, ExecutionEngine, HttpClient,
    HttpResponse, ImportMeta, Intercepted, Loader, LoaderError, ModuleInspector, ModuleSpecifier,
    ModuleState, RemoteFetcher, Result, SourceReader,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// In-memory file system and web server with per-specifier call counts
#[derive(Default)]
struct FakeHost {
    files: Mutex<HashMap<String, String>>,
    reads: Mutex<HashMap<String, usize>>,
    gets: Mutex<HashMap<String, usize>>,
    latency: Duration,
    hang: bool,
}

impl FakeHost {
    fn with_files(files: &[(&str, &str)]) -> Self {
        let host = Self::default();
        for (specifier, source) in files {
            host.serve(specifier, source);
        }
        host
    }

    fn serve(&self, specifier: &str, source: &str) {
        self.files
            .lock()
            .insert(specifier.to_string(), source.to_string());
    }

    fn gets(&self, specifier: &str) -> usize {
        self.gets.lock().get(specifier).copied().unwrap_or(0)
    }

    fn total_gets(&self) -> usize {
        self.gets.lock().values().sum()
    }

    fn reads(&self, specifier: &str) -> usize {
        self.reads.lock().get(specifier).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SourceReader for FakeHost {
    async fn read_source(&self, specifier: &ModuleSpecifier) -> Result<String> {
        *self.reads.lock().entry(specifier.to_string()).or_default() += 1;
        let source = self.files.lock().get(specifier.as_str()).cloned();
        source.ok_or_else(|| LoaderError::LocalNotFound {
            specifier: specifier.to_string(),
            path: specifier.path().into(),
        })
    }
}

#[async_trait]
impl HttpClient for FakeHost {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        *self.gets.lock().entry(url.to_string()).or_default() += 1;
        if self.hang {
            return std::future::pending().await;
        }
        tokio::time::sleep(self.latency).await;

        let body = self.files.lock().get(url.as_str()).cloned();
        Ok(match body {
            Some(body) => HttpResponse { status: 200, body },
            None => HttpResponse {
                status: 404,
                body: "Not Found".into(),
            },
        })
    }
}

/// Unit of [`CountingEngine`]
#[derive(Debug)]
struct CountedUnit {
    inner: InspectedUnit,
    throws: bool,
}

/// Engine that counts unit creation per module and evaluations overall.
///
/// Source containing `@@reject` fails to compile; source containing
/// `throw` fails to evaluate.
#[derive(Default)]
struct CountingEngine {
    created: Mutex<HashMap<String, usize>>,
    evaluated: AtomicUsize,
}

impl CountingEngine {
    fn created(&self, specifier: &str) -> usize {
        self.created.lock().get(specifier).copied().unwrap_or(0)
    }
}

impl ExecutionEngine for CountingEngine {
    type Unit = CountedUnit;
    type Value = ModuleSummary;

    fn create_unit(
        &self,
        source: &str,
        identifier: &str,
        meta: ImportMeta,
    ) -> std::result::Result<CountedUnit, EngineError> {
        *self.created.lock().entry(identifier.to_string()).or_default() += 1;
        if source.contains("@@reject") {
            return Err(EngineError::new("SyntaxError: unexpected token '@@'"));
        }
        Ok(CountedUnit {
            inner: ModuleInspector.create_unit(source, identifier, meta)?,
            throws: source.contains("throw"),
        })
    }

    fn declared_imports(&self, unit: &CountedUnit) -> std::result::Result<Vec<String>, EngineError> {
        ModuleInspector.declared_imports(&unit.inner)
    }

    fn evaluate(&self, unit: &CountedUnit) -> std::result::Result<ModuleSummary, EngineError> {
        self.evaluated.fetch_add(1, Ordering::SeqCst);
        if unit.throws {
            return Err(EngineError::new("Error: boom"));
        }
        ModuleInspector.evaluate(&unit.inner)
    }
}

struct Harness {
    host: Arc<FakeHost>,
    engine: Arc<CountingEngine>,
    loader: Loader<CountingEngine>,
}

fn harness(host: FakeHost, cache_root: &std::path::Path) -> Harness {
    harness_with_timeout(host, cache_root, Duration::from_secs(30))
}

fn harness_with_timeout(host: FakeHost, cache_root: &std::path::Path, timeout: Duration) -> Harness {
    let host = Arc::new(host);
    let engine = Arc::new(CountingEngine::default());
    let cache = ContentCache::new(cache_root).unwrap();
    let fetcher = RemoteFetcher::with_limits(host.clone(), cache, timeout, 8);
    let loader = Loader::new(Arc::clone(&engine), host.clone(), fetcher);
    Harness {
        host,
        engine,
        loader,
    }
}

fn spec(s: &str) -> ModuleSpecifier {
    ModuleSpecifier::parse(s).unwrap()
}

const ENTRY: &str = "file:///entry";
const LIB: &str = "https://example.com/lib";
const HELPER: &str = "https://example.com/helper";

fn example_site() -> FakeHost {
    FakeHost::with_files(&[
        (LIB, "import { help } from './helper';\nexport const lib = help;"),
        (HELPER, "import { lib } from './lib';\nexport const help = () => lib;"),
    ])
}

const ENTRY_SOURCE: &str = "import { lib } from 'https://example.com/lib';\n\
                            import { help } from 'https://example.com/helper';\n\
                            help(lib);";

#[tokio::test]
async fn test_end_to_end_remote_graph() {
    let temp = TempDir::new().unwrap();
    let h = harness(example_site(), temp.path());

    let outcome = h
        .loader
        .link(ENTRY_SOURCE.into(), spec(ENTRY))
        .await
        .unwrap();
    let graph = &outcome.graph;

    assert_eq!(graph.len(), 3);
    for specifier in [ENTRY, LIB, HELPER] {
        assert_eq!(graph.state(&spec(specifier)), Some(ModuleState::Linked));
        assert_eq!(h.engine.created(specifier), 1);
    }
    assert_eq!(h.host.gets(LIB), 1);
    assert_eq!(h.host.gets(HELPER), 1);
    assert_eq!(outcome.stats.network_fetches, 2);
    assert_eq!(h.engine.evaluated.load(Ordering::SeqCst), 0);

    let summary = h.loader.evaluate_entry(graph).unwrap();
    assert_eq!(summary.url, ENTRY);
    assert!(summary.main);
    assert_eq!(h.engine.evaluated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_local_cycle_links_both_modules() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        FakeHost::with_files(&[
            ("file:///app/a.js", "import { b } from './b.js';\nexport const a = 1;"),
            ("file:///app/b.js", "import { a } from './a.js';\nexport const b = 2;"),
        ]),
        temp.path(),
    );

    let outcome = h
        .loader
        .link("import './a.js';".into(), spec("file:///app/main.js"))
        .await
        .unwrap();

    assert_eq!(outcome.graph.len(), 3);
    assert!(outcome.graph.is_fully_linked());
    assert_eq!(h.host.reads("file:///app/a.js"), 1);
    assert_eq!(h.host.reads("file:///app/b.js"), 1);

    let a = outcome.graph.get(&spec("file:///app/a.js")).unwrap();
    assert_eq!(a.read().dependencies, vec![spec("file:///app/b.js")]);
}

#[tokio::test]
async fn test_shared_dependency_loads_once_under_concurrency() {
    let temp = TempDir::new().unwrap();
    let mut files = vec![(
        "https://example.com/shared.ts".to_string(),
        "export const shared: string = 'x';".to_string(),
    )];
    for name in ["a", "b", "c", "d", "e"] {
        files.push((
            format!("https://example.com/{}.js", name),
            "import { shared } from './shared.ts';\nexport default shared;".to_string(),
        ));
    }
    let host = FakeHost {
        latency: Duration::from_millis(20),
        ..FakeHost::default()
    };
    for (specifier, source) in &files {
        host.serve(specifier, source);
    }
    let h = harness(host, temp.path());

    let entry = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|n| format!("import 'https://example.com/{}.js';", n))
        .collect::<Vec<_>>()
        .join("\n");
    let outcome = h.loader.link(entry, spec("file:///main.js")).await.unwrap();

    assert_eq!(outcome.graph.len(), 7);
    assert!(outcome.graph.is_fully_linked());
    assert_eq!(h.host.gets("https://example.com/shared.ts"), 1);
    assert_eq!(h.engine.created("https://example.com/shared.ts"), 1);
    assert_eq!(outcome.stats.transpiles, 1);
    assert_eq!(outcome.stats.units_created, 7);
}

#[tokio::test]
async fn test_warm_cache_avoids_network() {
    let temp = TempDir::new().unwrap();

    let cold = harness(example_site(), temp.path());
    let first = cold
        .loader
        .link(ENTRY_SOURCE.into(), spec(ENTRY))
        .await
        .unwrap();
    assert_eq!(cold.host.total_gets(), 2);

    let warm = harness(example_site(), temp.path());
    let second = warm
        .loader
        .link(ENTRY_SOURCE.into(), spec(ENTRY))
        .await
        .unwrap();

    assert_eq!(warm.host.total_gets(), 0);
    assert_eq!(second.stats.cache_hits, 2);
    assert_eq!(second.stats.network_fetches, 0);
    for specifier in [LIB, HELPER] {
        let before = first.graph.get(&spec(specifier)).unwrap();
        let after = second.graph.get(&spec(specifier)).unwrap();
        assert_eq!(before.read().raw_source, after.read().raw_source);
    }
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached_and_is_retried() {
    let temp = TempDir::new().unwrap();
    let h = harness(FakeHost::default(), temp.path());
    let entry = "import 'https://example.com/late.js';";

    let err = h
        .loader
        .link(entry.into(), spec("file:///main.js"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert_eq!(err.status(), Some(404));

    let cache = h.loader.fetcher().cache();
    let late = spec("https://example.com/late.js");
    assert!(cache.get(&late).await.unwrap().is_none());
    assert!(cache.entries().unwrap().is_empty());

    h.host.serve("https://example.com/late.js", "export default 1;");
    let outcome = h
        .loader
        .link(entry.into(), spec("file:///main.js"))
        .await
        .unwrap();
    assert!(outcome.graph.is_fully_linked());
    assert_eq!(h.host.gets("https://example.com/late.js"), 2);
    assert_eq!(
        cache.get(&late).await.unwrap().as_deref(),
        Some("export default 1;")
    );
}

#[tokio::test]
async fn test_first_error_fails_the_run() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        FakeHost::with_files(&[
            ("file:///app/ok.js", "export default 1;"),
            ("file:///app/rejected.js", "@@reject"),
        ]),
        temp.path(),
    );

    let err = h
        .loader
        .link(
            "import './ok.js';\nimport './rejected.js';".into(),
            spec("file:///app/main.js"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Link);
    assert!(err.to_string().contains("file:///app/rejected.js"));
}

#[tokio::test]
async fn test_evaluation_error_passes_through() {
    let temp = TempDir::new().unwrap();
    let h = harness(FakeHost::default(), temp.path());

    let outcome = h
        .loader
        .link("throw new Error('boom');".into(), spec("file:///app/main.js"))
        .await
        .unwrap();
    let err = h.loader.evaluate_entry(&outcome.graph).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Evaluation);
    assert_eq!(
        err.to_string(),
        "Uncaught error in file:///app/main.js: Error: boom"
    );
}

#[tokio::test(start_paused = true)]
async fn test_fetch_deadline_fails_the_run() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost {
        hang: true,
        ..FakeHost::default()
    };
    let h = harness_with_timeout(host, temp.path(), Duration::from_secs(3));

    let err = h
        .loader
        .link(
            "import 'https://example.com/slow.js';".into(),
            spec("file:///main.js"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert_eq!(err.status(), None);
    assert!(h.loader.fetcher().cache().entries().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_outstanding_fetches() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost {
        hang: true,
        ..FakeHost::default()
    };
    let h = harness(host, temp.path());

    let (linking, handle) = h.loader.link_abortable(
        "import 'https://example.com/a.js';\nimport 'https://example.com/b.js';".into(),
        spec("file:///main.js"),
    );
    let abort = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
    };

    let (result, ()) = tokio::join!(linking, abort);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    assert!(h.loader.fetcher().cache().entries().unwrap().is_empty());
}

#[tokio::test]
async fn test_interceptor_observes_capabilities() {
    let temp = TempDir::new().unwrap();
    let host = Arc::new(FakeHost::with_files(&[
        ("file:///app/util.js", "export default 1;"),
        ("https://example.com/x.js", "export default 2;"),
    ]));
    let accesses = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&accesses);
    let hook = move |access: &CapabilityAccess<'_>| {
        let entry = match access {
            CapabilityAccess::ReadSource(specifier) => format!("read {}", specifier),
            CapabilityAccess::HttpGet(url) => format!("get {}", url),
        };
        log.lock().push(entry);
    };

    let cache = ContentCache::new(temp.path()).unwrap();
    let client = Intercepted::new(Arc::clone(&host), hook.clone());
    let reader = Intercepted::new(Arc::clone(&host), hook);
    let fetcher = RemoteFetcher::with_limits(Arc::new(client), cache, Duration::from_secs(5), 2);
    let loader = Loader::new(Arc::new(ModuleInspector), Arc::new(reader), fetcher);

    loader
        .link(
            "import './util.js';\nimport 'https://example.com/x.js';".into(),
            spec("file:///app/main.js"),
        )
        .await
        .unwrap();

    let mut seen = accesses.lock().clone();
    seen.sort();
    assert_eq!(
        seen,
        vec!["get https://example.com/x.js", "read file:///app/util.js"]
    );
}
