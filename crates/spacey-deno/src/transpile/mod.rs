// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source transpiler.
//!
//! Converts TypeScript into JavaScript the execution engine can run. The
//! conversion is pure: no I/O, and the same input always yields the same
//! output. JavaScript and JSON sources pass through unchanged.

pub mod scanner;
mod strip;

use crate::error::{LoaderError, Result};
use crate::media::MediaType;
use crate::specifier::ModuleSpecifier;
use std::fmt;
use tracing::debug;

/// 1-based position in a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number, starting at 1
    pub line: usize,
    /// Column in characters, starting at 1
    pub column: usize,
}

impl SourceLocation {
    /// Compute the location of a byte offset.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let before = source.get(..offset.min(source.len())).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Whether a module at this specifier must be transpiled before execution.
pub fn needs_transpile(specifier: &ModuleSpecifier) -> bool {
    MediaType::from_specifier(specifier).needs_transpile()
}

/// Produce executable source for a module.
pub fn transpile(specifier: &ModuleSpecifier, source: &str, media_type: MediaType) -> Result<String> {
    match media_type {
        // Declaration files have no runtime content
        MediaType::Dts => Ok(String::new()),
        MediaType::Jsx | MediaType::Tsx => Err(LoaderError::Transpile {
            specifier: specifier.to_string(),
            location: SourceLocation { line: 1, column: 1 },
            message: "JSX syntax is not supported".into(),
        }),
        MediaType::TypeScript => {
            let output = strip::erase(source).map_err(|e| LoaderError::Transpile {
                specifier: specifier.to_string(),
                location: SourceLocation::from_offset(source, e.offset),
                message: e.message,
            })?;
            debug!(%specifier, bytes = output.len(), "Erased TypeScript");
            Ok(output)
        }
        _ => Ok(source.to_string()),
    }
}
