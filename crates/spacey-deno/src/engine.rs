// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution engine adapter.
//!
//! The loader never parses or runs code itself. It hands executable source
//! to an [`ExecutionEngine`], asks the resulting unit for its static imports,
//! and leaves evaluation to the caller once the graph is linked.

use serde::Serialize;
use thiserror::Error;

use crate::error::Result;
use crate::specifier::{self, ModuleSpecifier};
use crate::transpile::scanner::{ScanError, Scanner, TokenKind};

/// Diagnostic reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Engine message, passed through untouched
    pub message: String,
}

impl EngineError {
    /// Create an engine error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Metadata made available to a module as `import.meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMeta {
    /// The module's own specifier
    pub url: ModuleSpecifier,
    /// Whether this is the entry module of the run
    pub main: bool,
}

impl ImportMeta {
    /// Create metadata for a module.
    pub fn new(url: ModuleSpecifier, main: bool) -> Self {
        Self { url, main }
    }

    /// Resolve a reference relative to this module, as `import.meta.resolve`.
    pub fn resolve(&self, reference: &str) -> Result<ModuleSpecifier> {
        specifier::resolve(reference, &self.url)
    }
}

/// An engine that compiles and evaluates modules inside a shared context.
pub trait ExecutionEngine: Send + Sync + 'static {
    /// A compiled module
    type Unit: Send + Sync + 'static;

    /// Result of evaluating a unit
    type Value: Send + 'static;

    /// Compile executable source into a unit.
    fn create_unit(
        &self,
        source: &str,
        identifier: &str,
        meta: ImportMeta,
    ) -> std::result::Result<Self::Unit, EngineError>;

    /// Raw references of the unit's static imports, in declaration order.
    fn declared_imports(&self, unit: &Self::Unit) -> std::result::Result<Vec<String>, EngineError>;

    /// Evaluate a unit whose graph has been linked.
    fn evaluate(&self, unit: &Self::Unit) -> std::result::Result<Self::Value, EngineError>;
}

/// Engine that reads module structure without executing anything.
///
/// Used by the command-line `info` and `cache` commands, which need the
/// import graph but no runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleInspector;

/// Unit produced by [`ModuleInspector`].
#[derive(Debug, Clone)]
pub struct InspectedUnit {
    /// Import metadata the unit was created with
    pub meta: ImportMeta,
    /// Static import references
    pub imports: Vec<String>,
}

/// What [`ModuleInspector`] reports on evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    /// Module specifier
    pub url: String,
    /// Whether the module is the entry
    pub main: bool,
    /// Static import references
    pub imports: Vec<String>,
}

impl ExecutionEngine for ModuleInspector {
    type Unit = InspectedUnit;
    type Value = ModuleSummary;

    fn create_unit(
        &self,
        source: &str,
        identifier: &str,
        meta: ImportMeta,
    ) -> std::result::Result<InspectedUnit, EngineError> {
        let imports = static_imports(source)
            .map_err(|e| EngineError::new(format!("{} in {}", e.message, identifier)))?;
        Ok(InspectedUnit { meta, imports })
    }

    fn declared_imports(&self, unit: &InspectedUnit) -> std::result::Result<Vec<String>, EngineError> {
        Ok(unit.imports.clone())
    }

    fn evaluate(&self, unit: &InspectedUnit) -> std::result::Result<ModuleSummary, EngineError> {
        Ok(ModuleSummary {
            url: unit.meta.url.to_string(),
            main: unit.meta.main,
            imports: unit.imports.clone(),
        })
    }
}

/// Extract the module references of top-level `import` and `export ... from`
/// statements. Dynamic `import()` and `import.meta` are not static imports.
pub fn static_imports(source: &str) -> std::result::Result<Vec<String>, ScanError> {
    let tokens = Scanner::new(source).scan()?;
    let text = |i: usize| &source[tokens[i].span.start..tokens[i].span.end];
    let is_word = |i: usize, word: &str| {
        tokens.get(i).is_some_and(|t| t.kind == TokenKind::Ident) && text(i) == word
    };
    let string_at = |i: usize| {
        tokens
            .get(i)
            .filter(|t| t.kind == TokenKind::String)
            .map(|_| unquote(text(i)))
    };

    let mut imports = Vec::new();
    let mut depth = 0usize;
    for i in 0..tokens.len() {
        match tokens[i].kind {
            TokenKind::Punct("(" | "[" | "{") => {
                depth += 1;
                continue;
            }
            TokenKind::Punct(")" | "]" | "}") => {
                depth = depth.saturating_sub(1);
                continue;
            }
            TokenKind::Ident if depth == 0 => {}
            _ => continue,
        }
        let after_dot = i > 0 && matches!(tokens[i - 1].kind, TokenKind::Punct("." | "?."));
        if after_dot || !(is_word(i, "import") || is_word(i, "export")) {
            continue;
        }

        // Side-effect import
        if is_word(i, "import") {
            if let Some(reference) = string_at(i + 1) {
                imports.push(reference);
                continue;
            }
        }

        let mut k = i + 1;
        while k < tokens.len() {
            match tokens[k].kind {
                TokenKind::Ident if is_word(k, "from") => break,
                TokenKind::Ident | TokenKind::Punct("," | "*") => k += 1,
                TokenKind::Punct("{") => {
                    while k < tokens.len() && tokens[k].kind != TokenKind::Punct("}") {
                        k += 1;
                    }
                    k += 1;
                }
                _ => break,
            }
        }
        if is_word(k, "from") {
            if let Some(reference) = string_at(k + 1) {
                imports.push(reference);
            }
        }
    }
    Ok(imports)
}

fn unquote(literal: &str) -> String {
    literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}
