//! Chunk planning for multi-entry builds.
//!
//! A symbol reached by two or more entries moves to the shared chunk; everything
//! else stays inline in the one entry that reaches it. Reachability is
//! transitive, so whatever a shared symbol references is reached by at least the
//! same entries and is shared too: the shared chunk never imports from an entry.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::graph::ModuleGraph;
use crate::reachability::Reachability;
use crate::{ModuleId, SymbolId};

/// What one entry's own output contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPlan {
    pub entry: ModuleId,
    /// Symbols rendered inline in the entry output.
    pub owned: FxHashSet<SymbolId>,
    /// Shared symbols the entry imports by name, in id order.
    pub shared_imports: Vec<SymbolId>,
    /// The entry relies on shared ambient declarations only and needs a
    /// side-effect import of the shared chunk.
    pub needs_shared_side_effect: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    pub shared: FxHashSet<SymbolId>,
    /// Shared symbols imported by at least one entry, in id order.
    pub shared_exports: Vec<SymbolId>,
    pub entries: Vec<EntryPlan>,
}

impl ChunkPlan {
    pub fn has_shared_chunk(&self) -> bool {
        !self.shared.is_empty()
    }

    pub fn entry(&self, entry: &ModuleId) -> Option<&EntryPlan> {
        self.entries.iter().find(|plan| &plan.entry == entry)
    }
}

pub struct ChunkPlanner<'a> {
    graph: &'a ModuleGraph,
}

impl<'a> ChunkPlanner<'a> {
    pub fn new(graph: &'a ModuleGraph) -> Self {
        Self { graph }
    }

    pub fn plan(&self, analyses: &[Reachability]) -> ChunkPlan {
        let symbols = self.graph.symbols();
        let is_placeable = |id: &SymbolId| symbols.get(*id).is_some_and(|s| !s.is_external());

        let mut reach_count: FxHashMap<SymbolId, usize> = FxHashMap::default();
        for analysis in analyses {
            for id in analysis.set.retained().iter().filter(|&id| is_placeable(id)) {
                *reach_count.entry(*id).or_default() += 1;
            }
        }

        let shared: FxHashSet<SymbolId> = reach_count
            .into_iter()
            .filter(|(_, count)| *count >= 2)
            .map(|(id, _)| id)
            .collect();

        let mut exported: FxHashSet<SymbolId> = FxHashSet::default();
        let mut entries = Vec::with_capacity(analyses.len());

        for analysis in analyses {
            let owned: FxHashSet<SymbolId> = analysis
                .set
                .retained()
                .iter()
                .copied()
                .filter(|id| is_placeable(id) && !shared.contains(id))
                .collect();

            let mut needed: FxHashSet<SymbolId> = analysis
                .manifest
                .targets()
                .filter(|id| shared.contains(id))
                .collect();
            for id in &owned {
                needed.extend(
                    analysis
                        .set
                        .references(*id)
                        .iter()
                        .filter(|target| shared.contains(*target)),
                );
            }
            // Ambient declarations cannot be imported by name.
            needed.retain(|id| symbols.get(*id).is_some_and(|s| !s.is_ambient()));

            let mut shared_imports: Vec<SymbolId> = needed.into_iter().collect();
            shared_imports.sort_unstable();
            exported.extend(shared_imports.iter().copied());

            let reaches_shared_ambient = analysis
                .set
                .retained()
                .iter()
                .any(|id| shared.contains(id) && symbols.get(*id).is_some_and(|s| s.is_ambient()));

            entries.push(EntryPlan {
                entry: analysis.entry.clone(),
                needs_shared_side_effect: shared_imports.is_empty() && reaches_shared_ambient,
                owned,
                shared_imports,
            });
        }

        let mut shared_exports: Vec<SymbolId> = exported.into_iter().collect();
        shared_exports.sort_unstable();

        debug!(
            shared = shared.len(),
            entries = entries.len(),
            "chunk plan computed"
        );

        ChunkPlan {
            shared,
            shared_exports,
            entries,
        }
    }
}
