// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module specifier canonicalization
//!
//! A specifier is an absolute URL over one of the supported schemes. Relative
//! references are joined against the importing module's specifier using the
//! WHATWG URL rules, the same rules `new URL(reference, base)` applies.

use crate::error::{LoaderError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Schemes a module may be loaded from
pub const SUPPORTED_SCHEMES: &[&str] = &["file", "http", "https"];

/// Canonical absolute location of a module; the identity key of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleSpecifier(Url);

impl ModuleSpecifier {
    /// Parse an absolute specifier string
    pub fn parse(value: &str) -> Result<Self> {
        let url = Url::parse(value)
            .map_err(|e| LoaderError::malformed(value, "", e.to_string()))?;
        Self::from_url(url, value, "")
    }

    /// Build a `file:` specifier for a path, made absolute against the
    /// current directory when relative. `.` and `..` segments are removed,
    /// so every spelling of a path yields the same specifier.
    pub fn from_path(path: &Path) -> Result<Self> {
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| LoaderError::io(path, e))?;
            cwd.join(path)
        };
        let display = abs_path.display().to_string();
        let url = Url::from_file_path(&abs_path)
            .map_err(|_| LoaderError::malformed(&display, "", "not a valid file path"))?;
        // `from_file_path` keeps dot segments; a parse normalizes them away
        let url = Url::parse(url.as_str())
            .map_err(|e| LoaderError::malformed(&display, "", e.to_string()))?;
        Self::from_url(url, &display, "")
    }

    fn from_url(mut url: Url, reference: &str, base: &str) -> Result<Self> {
        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(LoaderError::malformed(
                reference,
                base,
                format!("unsupported scheme '{}:'", url.scheme()),
            ));
        }
        if url.cannot_be_a_base() {
            return Err(LoaderError::malformed(reference, base, "not a hierarchical URL"));
        }
        if url.scheme() != "file" && url.host_str().map_or(true, str::is_empty) {
            return Err(LoaderError::malformed(reference, base, "missing host"));
        }
        url.set_fragment(None);
        Ok(Self(url))
    }

    /// The specifier as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The URL scheme (`file`, `http` or `https`)
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Whether the module lives on the network
    pub fn is_remote(&self) -> bool {
        matches!(self.0.scheme(), "http" | "https")
    }

    /// Whether the module lives on the local file system
    pub fn is_local(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// Path component of the URL, used for extension detection
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Convert a `file:` specifier back to a file system path
    pub fn to_file_path(&self) -> Result<PathBuf> {
        if !self.is_local() {
            return Err(LoaderError::malformed(
                self.as_str(),
                "",
                "not a file: specifier",
            ));
        }
        self.0
            .to_file_path()
            .map_err(|_| LoaderError::malformed(self.as_str(), "", "not a local file path"))
    }
}

impl fmt::Display for ModuleSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for ModuleSpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Resolve a module reference against the specifier of the importing module.
///
/// Absolute URLs, scheme-relative (`//host/x`), absolute-path (`/x`) and
/// path-relative (`./x`, `../x`, `x`) references are all accepted. The result
/// only depends on the two inputs.
pub fn resolve(reference: &str, base: &ModuleSpecifier) -> Result<ModuleSpecifier> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(LoaderError::malformed(reference, base.as_str(), "empty reference"));
    }

    let joined = base
        .0
        .join(reference)
        .map_err(|e| LoaderError::malformed(reference, base.as_str(), e.to_string()))?;

    ModuleSpecifier::from_url(joined, reference, base.as_str())
}
