// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module loading and linking

use crate::transpile::SourceLocation;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while building or running a module graph.
///
/// Cloneable so a single failure can be handed to every task waiting on the
/// same in-flight module.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// Reference could not be parsed or resolved to a supported scheme
    #[error("Invalid module specifier '{reference}' (relative to '{base}'): {reason}")]
    MalformedSpecifier {
        /// The raw reference as written in the importing module
        reference: String,
        /// The specifier it was resolved against
        base: String,
        /// Reason for failure
        reason: String,
    },

    /// Local module does not exist
    #[error("Cannot find module '{specifier}' at {}", .path.display())]
    LocalNotFound {
        /// Module specifier
        specifier: String,
        /// File system path that was read
        path: PathBuf,
    },

    /// Remote module could not be retrieved
    #[error("Failed to fetch '{specifier}': {}", fetch_reason(.status, .cause))]
    Fetch {
        /// Module specifier
        specifier: String,
        /// HTTP status, when the server answered
        status: Option<u16>,
        /// Transport-level cause or response summary
        cause: String,
    },

    /// TypeScript source could not be erased to JavaScript
    #[error("TranspileError: {message} at {specifier}:{location}")]
    Transpile {
        /// Module specifier
        specifier: String,
        /// Best-effort position of the offending syntax
        location: SourceLocation,
        /// What went wrong
        message: String,
    },

    /// The execution engine rejected a module
    #[error("LinkError: {reason} ({specifier})")]
    Link {
        /// Module specifier
        specifier: String,
        /// Engine diagnostic
        reason: String,
    },

    /// Evaluation failed inside the execution engine
    #[error("Uncaught error in {specifier}: {message}")]
    Evaluation {
        /// Module specifier
        specifier: String,
        /// Engine diagnostic, passed through untouched
        message: String,
    },

    /// File system error
    #[error("File system error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Content cache error
    #[error("Cache error at {}: {reason}", .path.display())]
    Cache {
        /// Entry or directory involved
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was aborted before linking finished
    #[error("Module loading aborted")]
    Aborted,
}

/// Tag of a [`LoaderError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`LoaderError::MalformedSpecifier`]
    MalformedSpecifier,
    /// See [`LoaderError::LocalNotFound`]
    LocalNotFound,
    /// See [`LoaderError::Fetch`]
    Fetch,
    /// See [`LoaderError::Transpile`]
    Transpile,
    /// See [`LoaderError::Link`]
    Link,
    /// See [`LoaderError::Evaluation`]
    Evaluation,
    /// See [`LoaderError::Io`]
    Io,
    /// See [`LoaderError::Cache`]
    Cache,
    /// See [`LoaderError::Config`]
    Config,
    /// See [`LoaderError::Aborted`]
    Aborted,
}

impl LoaderError {
    /// The taxonomy tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedSpecifier { .. } => ErrorKind::MalformedSpecifier,
            Self::LocalNotFound { .. } => ErrorKind::LocalNotFound,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Transpile { .. } => ErrorKind::Transpile,
            Self::Link { .. } => ErrorKind::Link,
            Self::Evaluation { .. } => ErrorKind::Evaluation,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cache { .. } => ErrorKind::Cache,
            Self::Config(_) => ErrorKind::Config,
            Self::Aborted => ErrorKind::Aborted,
        }
    }

    /// Create a malformed specifier error
    pub fn malformed(
        reference: impl Into<String>,
        base: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedSpecifier {
            reference: reference.into(),
            base: base.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error for a non-success HTTP status
    pub fn fetch_status(specifier: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            specifier: specifier.into(),
            status: Some(status),
            cause: format!("HTTP {}", status),
        }
    }

    /// Create a fetch error for a transport failure
    pub fn fetch_cause(specifier: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Fetch {
            specifier: specifier.into(),
            status: None,
            cause: cause.into(),
        }
    }

    /// Create a link error
    pub fn link(specifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Link {
            specifier: specifier.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Create a cache error
    pub fn cache(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Cache {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status of a fetch failure, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

fn fetch_reason(status: &Option<u16>, cause: &str) -> String {
    match *status {
        Some(code) if !cause.contains(&code.to_string()) => format!("HTTP {} ({})", code, cause),
        _ => cause.to_string(),
    }
}
