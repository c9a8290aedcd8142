// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Media type detection from specifier extensions

use crate::specifier::ModuleSpecifier;
use serde::Serialize;
use std::fmt;

/// Syntax family of a module, as far as the loader cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// `.js`, `.mjs`, `.cjs` or no extension
    JavaScript,
    /// `.ts`, `.mts`, `.cts`
    TypeScript,
    /// `.d.ts`, `.d.mts`, `.d.cts`
    Dts,
    /// `.jsx`
    Jsx,
    /// `.tsx`
    Tsx,
    /// `.json`
    Json,
    /// Any other extension
    Unknown,
}

impl MediaType {
    /// Detect the media type from the last path segment of a specifier
    pub fn from_specifier(specifier: &ModuleSpecifier) -> Self {
        let file_name = specifier.path().rsplit('/').next().unwrap_or_default();
        Self::from_file_name(file_name)
    }

    /// Detect the media type from a file name
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".d.ts") || lower.ends_with(".d.mts") || lower.ends_with(".d.cts") {
            return MediaType::Dts;
        }

        match lower.rsplit_once('.').map(|(_, ext)| ext) {
            None => MediaType::JavaScript,
            Some("js" | "mjs" | "cjs") => MediaType::JavaScript,
            Some("ts" | "mts" | "cts") => MediaType::TypeScript,
            Some("jsx") => MediaType::Jsx,
            Some("tsx") => MediaType::Tsx,
            Some("json") => MediaType::Json,
            Some(_) => MediaType::Unknown,
        }
    }

    /// Whether sources of this type must go through the transpiler
    pub fn needs_transpile(self) -> bool {
        matches!(
            self,
            MediaType::TypeScript | MediaType::Dts | MediaType::Jsx | MediaType::Tsx
        )
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::JavaScript => "JavaScript",
            MediaType::TypeScript => "TypeScript",
            MediaType::Dts => "Dts",
            MediaType::Jsx => "JSX",
            MediaType::Tsx => "TSX",
            MediaType::Json => "JSON",
            MediaType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}
