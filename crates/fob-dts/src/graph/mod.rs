//! Module graph over declaration modules.
//!
//! The graph is built once from the entries, then shared read-only by every
//! later stage. Unresolved specifiers and modules the front end failed to parse
//! are recorded rather than raised, so that only the entries whose closure
//! touches them fail.

mod construction;
mod cycles;
mod external_dep;
mod statistics;
mod traversal;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{DeclarationModule, FrontEndError, FxIndexMap, ModuleId, SymbolTable};

pub use cycles::ModuleCycle;
pub use external_dep::ExternalDependency;
pub use statistics::GraphStatistics;

/// Outgoing edge of a module, one per distinct specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleEdge {
    Internal { specifier: String, target: ModuleId },
    External { specifier: String },
    Unresolved { specifier: String },
}

impl ModuleEdge {
    pub fn specifier(&self) -> &str {
        match self {
            Self::Internal { specifier, .. }
            | Self::External { specifier }
            | Self::Unresolved { specifier } => specifier,
        }
    }

    pub fn target(&self) -> Option<&ModuleId> {
        match self {
            Self::Internal { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Immutable declaration module graph. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    inner: Arc<GraphInner>,
}

#[derive(Debug, Default)]
struct GraphInner {
    /// Modules in DFS discovery order
    modules: FxIndexMap<ModuleId, DeclarationModule>,
    /// Edges per module, parallel to `modules`
    edges: Vec<Vec<ModuleEdge>>,
    /// Internal edge targets as module indices, parallel to `modules`
    adjacency: Vec<Vec<usize>>,
    entries: Vec<ModuleId>,
    external_deps: FxIndexMap<String, ExternalDependency>,
    failures: FxHashMap<ModuleId, FrontEndError>,
    symbols: SymbolTable,
    /// Strongly connected component per module, parallel to `modules`
    scc_of: Vec<usize>,
    sccs: Vec<Vec<usize>>,
    cyclic: Vec<bool>,
}

impl ModuleGraph {
    pub fn module(&self, id: &ModuleId) -> Option<&DeclarationModule> {
        self.inner.modules.get(id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.inner.modules.contains_key(id)
    }

    /// Modules in discovery order.
    pub fn modules(&self) -> impl Iterator<Item = &DeclarationModule> {
        self.inner.modules.values()
    }

    pub fn len(&self) -> usize {
        self.inner.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.modules.is_empty()
    }

    pub fn entries(&self) -> &[ModuleId] {
        &self.inner.entries
    }

    pub fn edges(&self, id: &ModuleId) -> &[ModuleEdge] {
        self.index_of(id)
            .and_then(|index| self.inner.edges.get(index))
            .map_or(&[], Vec::as_slice)
    }

    /// Edge a module uses for `specifier`.
    pub fn edge(&self, from: &ModuleId, specifier: &str) -> Option<&ModuleEdge> {
        self.edges(from)
            .iter()
            .find(|edge| edge.specifier() == specifier)
    }

    /// Internal modules `id` depends on, in edge order.
    pub fn dependencies(&self, id: &ModuleId) -> Vec<&ModuleId> {
        self.edges(id).iter().filter_map(ModuleEdge::target).collect()
    }

    /// Modules with an internal edge to `id`, in discovery order.
    pub fn dependents(&self, id: &ModuleId) -> Vec<&ModuleId> {
        let Some(target) = self.index_of(id) else {
            return Vec::new();
        };
        self.inner
            .adjacency
            .iter()
            .enumerate()
            .filter(|(_, targets)| targets.contains(&target))
            .filter_map(|(index, _)| self.id_at(index))
            .collect()
    }

    pub fn failure(&self, id: &ModuleId) -> Option<&FrontEndError> {
        self.inner.failures.get(id)
    }

    pub fn external_dependencies(&self) -> Vec<&ExternalDependency> {
        self.inner.external_deps.values().collect()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.inner.symbols
    }

    /// Whether the module is part of an import cycle.
    pub fn is_cyclic(&self, id: &ModuleId) -> bool {
        self.index_of(id)
            .and_then(|index| self.inner.cyclic.get(index).copied())
            .unwrap_or(false)
    }

    /// Whether both modules sit in the same import cycle.
    pub fn in_same_cycle(&self, a: &ModuleId, b: &ModuleId) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) => self.inner.cyclic[a] && self.inner.scc_of[a] == self.inner.scc_of[b],
            _ => false,
        }
    }

    fn index_of(&self, id: &ModuleId) -> Option<usize> {
        self.inner.modules.get_index_of(id)
    }

    fn id_at(&self, index: usize) -> Option<&ModuleId> {
        self.inner.modules.get_index(index).map(|(id, _)| id)
    }
}
