// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Durable content cache for remote module sources.
//!
//! Entries live at `<root>/v1/<encoded specifier>` and hold the raw,
//! pre-transpile source. The cache is append-only: an entry that exists is
//! never rewritten, and writes become visible atomically.

use crate::error::{LoaderError, Result};
use crate::specifier::ModuleSpecifier;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Layout version directory
const VERSION_DIR: &str = "v1";

/// Staging directory for in-progress writes
const TMP_DIR: &str = "tmp";

/// Longest file name component produced by the key encoding.
const MAX_SEGMENT: usize = 200;

/// Marks a directory component; never produced by percent-encoding.
const CONTINUATION: char = '+';

/// Content cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

/// A cached source, as reported by [`ContentCache::entries`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    /// Specifier the source was fetched from
    pub specifier: String,
    /// Entry file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

impl ContentCache {
    /// Open (creating if needed) a cache at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [root.join(VERSION_DIR), root.join(TMP_DIR)] {
            std::fs::create_dir_all(&dir).map_err(|e| LoaderError::io(&dir, e))?;
        }
        Ok(Self { root })
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for a specifier.
    pub fn entry_path(&self, specifier: &ModuleSpecifier) -> PathBuf {
        let mut path = self.root.join(VERSION_DIR);
        for segment in encode_key(specifier.as_str()) {
            path.push(segment);
        }
        path
    }

    /// Look up the cached source for a specifier.
    pub async fn get(&self, specifier: &ModuleSpecifier) -> Result<Option<String>> {
        let path = self.entry_path(specifier);
        match fs::read_to_string(&path).await {
            Ok(source) => {
                debug!(%specifier, "Cache hit");
                Ok(Some(source))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(%specifier, "Cache miss");
                Ok(None)
            }
            Err(e) => Err(LoaderError::cache(path, e.to_string())),
        }
    }

    /// Store a source for a specifier.
    ///
    /// The content is written and synced to a temporary file, then moved into
    /// place without replacing an existing entry. Losing that race to a
    /// concurrent writer counts as success.
    pub async fn put(&self, specifier: &ModuleSpecifier, source: &str) -> Result<()> {
        let path = self.entry_path(specifier);
        let tmp_dir = self.root.join(TMP_DIR);
        let data = source.as_bytes().to_vec();

        let published = tokio::task::spawn_blocking({
            let path = path.clone();
            move || write_entry(&tmp_dir, &path, &data)
        })
        .await
        .map_err(|e| LoaderError::cache(&path, e.to_string()))??;

        if published {
            debug!(%specifier, path = %path.display(), "Cached source");
        } else {
            debug!(%specifier, "Cache entry already present");
        }
        Ok(())
    }

    /// Delete the entry for a specifier. Returns whether one existed.
    pub async fn remove(&self, specifier: &ModuleSpecifier) -> Result<bool> {
        let path = self.entry_path(specifier);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LoaderError::io(path, e)),
        }
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<()> {
        info!("Clearing cache at {}", self.root.display());

        for dir in [self.root.join(VERSION_DIR), self.root.join(TMP_DIR)] {
            match fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(LoaderError::io(dir, e)),
            }
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| LoaderError::io(&dir, e))?;
        }
        Ok(())
    }

    /// List all entries, sorted by specifier.
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        let base = self.root.join(VERSION_DIR);
        let mut entries = Vec::new();

        for entry in walkdir::WalkDir::new(&base).min_depth(1) {
            let entry = entry.map_err(|e| LoaderError::cache(&base, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&base) else {
                continue;
            };
            let Some(specifier) = decode_key(relative) else {
                debug!(path = %entry.path().display(), "Skipping foreign file in cache");
                continue;
            };
            let size = entry
                .metadata()
                .map_err(|e| LoaderError::cache(entry.path(), e.to_string()))?
                .len();
            entries.push(CacheEntryInfo {
                specifier,
                path: entry.path().to_path_buf(),
                size,
            });
        }

        entries.sort_by(|a, b| a.specifier.cmp(&b.specifier));
        Ok(entries)
    }

    /// Total size of all entries in bytes.
    pub fn size(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(|e| e.size).sum())
    }
}

/// Write `data` to `path` through a synced temporary file. Returns `false`
/// when the entry already existed.
fn write_entry(tmp_dir: &Path, path: &Path, data: &[u8]) -> Result<bool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LoaderError::io(parent, e))?;
    }

    let mut file = tempfile::NamedTempFile::new_in(tmp_dir)
        .map_err(|e| LoaderError::cache(tmp_dir, e.to_string()))?;
    file.write_all(data)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| LoaderError::cache(file.path(), e.to_string()))?;

    match file.persist_noclobber(path) {
        Ok(_) => Ok(true),
        // The temporary file is deleted when the error is dropped
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(LoaderError::cache(path, e.error.to_string())),
    }
}

/// Encode a specifier into path components.
///
/// The percent-encoded key is split into chunks of at most 200 bytes. Every
/// component but the last is a directory and ends with `+`. The short chunk,
/// if any, comes first so the final file name never degenerates to `.` or
/// `..`.
pub fn encode_key(specifier: &str) -> Vec<String> {
    let encoded = urlencoding::encode(specifier);
    let bytes = encoded.as_bytes();
    if bytes.len() <= MAX_SEGMENT {
        return vec![encoded.into_owned()];
    }

    let mut segments = Vec::new();
    let head = bytes.len() % MAX_SEGMENT;
    let mut offset = 0;
    if head > 0 {
        segments.push(format!("{}{}", &encoded[..head], CONTINUATION));
        offset = head;
    }
    while offset < bytes.len() {
        let end = offset + MAX_SEGMENT;
        let chunk = &encoded[offset..end];
        if end == bytes.len() {
            segments.push(chunk.to_string());
        } else {
            segments.push(format!("{}{}", chunk, CONTINUATION));
        }
        offset = end;
    }
    segments
}

/// Recover the specifier from an entry path relative to the version directory.
pub fn decode_key(relative: &Path) -> Option<String> {
    let components: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let (last, dirs) = components.split_last()?;

    let mut encoded = String::new();
    for dir in dirs {
        encoded.push_str(dir.strip_suffix(CONTINUATION)?);
    }
    if last.ends_with(CONTINUATION) {
        return None;
    }
    encoded.push_str(last);
    urlencoding::decode(&encoded).ok().map(|s| s.into_owned())
}

/// Default cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spacey")
        .join("deno")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(s: &str) -> ModuleSpecifier {
        ModuleSpecifier::parse(s).unwrap()
    }

    #[test]
    fn test_encode_key_is_reversible() {
        let key = "https://example.com/a/b.ts?x=1&y=%20";
        let segments = encode_key(key);
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].contains('/'));
        assert_eq!(decode_key(Path::new(&segments[0])).unwrap(), key);
    }

    #[test]
    fn test_long_keys_split_into_directories() {
        let key = format!("https://example.com/{}.ts", "x".repeat(450));
        let segments = encode_key(&key);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.len() <= MAX_SEGMENT + 1));
        assert!(segments[..2].iter().all(|s| s.ends_with('+')));
        assert!(!segments[2].ends_with('+'));

        let path: PathBuf = segments.iter().collect();
        assert_eq!(decode_key(&path).unwrap(), key);
    }

    #[test]
    fn test_distinct_specifiers_get_distinct_paths() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path()).unwrap();
        let a = cache.entry_path(&spec("https://example.com/a/b.ts"));
        let b = cache.entry_path(&spec("https://example.com/a%2Fb.ts"));
        let c = cache.entry_path(&spec("http://example.com/a/b.ts"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path()).unwrap();
        let found = cache.get(&spec("https://example.com/nope.ts")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path()).unwrap();
        let specifier = spec("https://example.com/lib.ts");

        cache.put(&specifier, "export const x = 1;").await.unwrap();
        assert_eq!(
            cache.get(&specifier).await.unwrap().as_deref(),
            Some("export const x = 1;")
        );

        // No temporary files left behind
        let leftovers = std::fs::read_dir(temp.path().join(TMP_DIR)).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_entries_are_never_overwritten() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path()).unwrap();
        let specifier = spec("https://example.com/lib.ts");

        cache.put(&specifier, "first").await.unwrap();
        cache.put(&specifier, "second").await.unwrap();
        assert_eq!(cache.get(&specifier).await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_entries_remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path()).unwrap();
        let long = spec(&format!("https://example.com/{}.js", "y".repeat(300)));
        let short = spec("https://example.com/a.js");

        cache.put(&short, "a").await.unwrap();
        cache.put(&long, "bb").await.unwrap();

        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].specifier, short.as_str());
        assert_eq!(entries[1].specifier, long.as_str());
        assert_eq!(cache.size().unwrap(), 3);

        assert!(cache.remove(&short).await.unwrap());
        assert!(!cache.remove(&short).await.unwrap());

        cache.clear().await.unwrap();
        assert!(cache.entries().unwrap().is_empty());
        assert!(cache.get(&long).await.unwrap().is_none());
    }
}
