// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-run module graph.
//!
//! A [`ModuleGraph`] is created when a run starts and owns every
//! [`ModuleRecord`] discovered during it. There is at most one record per
//! specifier; records are inserted as soon as they are built, before their
//! own imports are visited, so a module that imports itself (directly or
//! transitively) finds its in-progress record instead of loading it again.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::media::MediaType;
use crate::specifier::ModuleSpecifier;

/// Lifecycle state of a module record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    /// Built but not yet in the graph
    Unlinked,
    /// In the graph, children still being visited
    Linking,
    /// Every child is present in the graph
    Linked,
    /// Loading this module or one of its children failed
    Failed,
}

/// A module discovered during a run.
#[derive(Debug)]
pub struct ModuleRecord<U> {
    /// Module identity
    pub specifier: ModuleSpecifier,
    /// Source as read or fetched
    pub raw_source: Arc<str>,
    /// Source handed to the engine (shares `raw_source` when no transpile ran)
    pub executable_source: Arc<str>,
    /// Media type derived from the specifier
    pub media_type: MediaType,
    /// Lifecycle state
    pub state: ModuleState,
    /// Whether this is the run's entry module
    pub is_entry: bool,
    /// Engine unit compiled from `executable_source`
    pub unit: U,
    /// Resolved static imports, deduplicated, in declaration order
    pub dependencies: Vec<ModuleSpecifier>,
}

impl<U> ModuleRecord<U> {
    /// Create an unlinked record.
    pub fn new(
        specifier: ModuleSpecifier,
        raw_source: Arc<str>,
        executable_source: Arc<str>,
        media_type: MediaType,
        is_entry: bool,
        unit: U,
    ) -> Self {
        Self {
            specifier,
            raw_source,
            executable_source,
            media_type,
            state: ModuleState::Unlinked,
            is_entry,
            unit,
            dependencies: Vec::new(),
        }
    }
}

/// Shared handle to a record owned by a graph.
pub type RecordRef<U> = Arc<RwLock<ModuleRecord<U>>>;

/// Mapping from specifier to record for one run.
pub struct ModuleGraph<U> {
    records: DashMap<ModuleSpecifier, RecordRef<U>>,
    entry: ModuleSpecifier,
}

impl<U> ModuleGraph<U> {
    /// Create an empty graph for a run rooted at `entry`.
    pub fn new(entry: ModuleSpecifier) -> Self {
        Self {
            records: DashMap::new(),
            entry,
        }
    }

    /// Entry specifier of the run.
    pub fn entry(&self) -> &ModuleSpecifier {
        &self.entry
    }

    /// Get the record for a specifier.
    pub fn get(&self, specifier: &ModuleSpecifier) -> Option<RecordRef<U>> {
        self.records.get(specifier).map(|r| Arc::clone(r.value()))
    }

    /// Whether the graph holds a record for `specifier`, in any state.
    pub fn contains(&self, specifier: &ModuleSpecifier) -> bool {
        self.records.contains_key(specifier)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// State of a record.
    pub fn state(&self, specifier: &ModuleSpecifier) -> Option<ModuleState> {
        self.records.get(specifier).map(|r| r.read().state)
    }

    /// All specifiers, sorted.
    pub fn specifiers(&self) -> Vec<ModuleSpecifier> {
        let mut specifiers: Vec<_> = self.records.iter().map(|r| r.key().clone()).collect();
        specifiers.sort();
        specifiers
    }

    /// Insert a record, moving it to `Linking`.
    ///
    /// If a record for the same specifier is already present, that record is
    /// kept and returned; the graph never holds two records for one module.
    pub fn insert(&self, record: RecordRef<U>) -> RecordRef<U> {
        let specifier = record.read().specifier.clone();
        self.records
            .entry(specifier.clone())
            .or_insert_with(|| {
                let mut r = record.write();
                if r.state == ModuleState::Unlinked {
                    r.state = ModuleState::Linking;
                }
                drop(r);
                debug!(%specifier, "Inserted module record");
                record
            })
            .value()
            .clone()
    }

    /// Records reachable from the entry in depth-first pre-order, each once.
    pub fn walk(&self) -> Vec<RecordRef<U>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![self.entry.clone()];

        while let Some(specifier) = stack.pop() {
            if !visited.insert(specifier.clone()) {
                continue;
            }
            let Some(record) = self.get(&specifier) else {
                continue;
            };
            let dependencies = record.read().dependencies.clone();
            stack.extend(dependencies.into_iter().rev());
            order.push(record);
        }
        order
    }

    /// Whether every record reached `Linked`.
    pub fn is_fully_linked(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| r.read().state == ModuleState::Linked)
    }

    /// Mark every record that has not finished linking as failed.
    pub(crate) fn fail_pending(&self) {
        for record in self.records.iter() {
            let mut r = record.write();
            if matches!(r.state, ModuleState::Unlinked | ModuleState::Linking) {
                r.state = ModuleState::Failed;
            }
        }
    }

    /// Serializable summary of the graph, in walk order.
    pub fn to_info(&self) -> GraphInfo {
        let modules = self
            .walk()
            .iter()
            .map(|record| {
                let r = record.read();
                ModuleInfo {
                    specifier: r.specifier.to_string(),
                    state: r.state,
                    media_type: r.media_type,
                    size: r.raw_source.len(),
                    dependencies: r.dependencies.iter().map(|d| d.to_string()).collect(),
                }
            })
            .collect();

        GraphInfo {
            entry: self.entry.to_string(),
            modules,
        }
    }
}

impl<U> std::fmt::Debug for ModuleGraph<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("entry", &self.entry)
            .field("modules", &self.specifiers())
            .finish()
    }
}

/// Summary of a graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphInfo {
    /// Entry specifier
    pub entry: String,
    /// Modules reachable from the entry
    pub modules: Vec<ModuleInfo>,
}

/// Summary of one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    /// Module specifier
    pub specifier: String,
    /// Final state
    pub state: ModuleState,
    /// Media type
    pub media_type: MediaType,
    /// Raw source size in bytes
    pub size: usize,
    /// Resolved dependencies
    pub dependencies: Vec<String>,
}
