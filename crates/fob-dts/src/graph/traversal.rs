//! Stable traversal orders over the module graph.

use rustc_hash::FxHashSet;

use super::{ModuleEdge, ModuleGraph};
use crate::{Error, FrontEndError, ModuleId, Result};

impl ModuleGraph {
    /// Emission order for the modules reachable from `roots`.
    ///
    /// A rooted DFS follows edges in statement order. Strongly connected
    /// components are ordered by the finish time of their first-discovered
    /// member, so dependencies come before their dependents; members of one
    /// component keep discovery order, so the first-visited module of a cycle
    /// is emitted first.
    pub fn traversal(&self, roots: &[ModuleId]) -> Vec<ModuleId> {
        let count = self.inner.modules.len();
        let mut discovered: Vec<Option<usize>> = vec![None; count];
        let mut finished: Vec<usize> = vec![usize::MAX; count];
        let mut next_discovery = 0;
        let mut next_finish = 0;

        for root in roots {
            let Some(root) = self.index_of(root) else {
                continue;
            };
            if discovered[root].is_some() {
                continue;
            }
            discovered[root] = Some(next_discovery);
            next_discovery += 1;

            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if let Some(&next) = self.inner.adjacency[node].get(frame.1) {
                    frame.1 += 1;
                    if discovered[next].is_none() {
                        discovered[next] = Some(next_discovery);
                        next_discovery += 1;
                        stack.push((next, 0));
                    }
                } else {
                    finished[node] = next_finish;
                    next_finish += 1;
                    stack.pop();
                }
            }
        }

        // Finish time of each component's first-discovered member.
        let mut component_finish = vec![usize::MAX; self.inner.sccs.len()];
        let mut component_first = vec![usize::MAX; self.inner.sccs.len()];
        for (index, discovery) in discovered.iter().enumerate() {
            let Some(discovery) = *discovery else {
                continue;
            };
            let scc = self.inner.scc_of[index];
            if discovery < component_first[scc] {
                component_first[scc] = discovery;
                component_finish[scc] = finished[index];
            }
        }

        let mut order: Vec<(usize, usize, usize)> = discovered
            .iter()
            .enumerate()
            .filter_map(|(index, discovery)| {
                discovery.map(|d| (component_finish[self.inner.scc_of[index]], d, index))
            })
            .collect();
        order.sort_unstable();

        order
            .into_iter()
            .filter_map(|(_, _, index)| self.id_at(index).cloned())
            .collect()
    }

    /// Modules reachable from `entry` in DFS pre-order.
    ///
    /// Fails on the first unresolved specifier or front-end failure inside the
    /// closure, which is what makes errors local to the entries they affect.
    pub fn closure(&self, entry: &ModuleId) -> Result<Vec<ModuleId>> {
        if !self.contains(entry) {
            return Err(match self.failure(entry) {
                Some(FrontEndError::NotFound(_)) | None => Error::UnresolvedModule {
                    specifier: entry.to_string(),
                    importer: None,
                },
                Some(err) => Error::FrontEnd(err.clone()),
            });
        }

        let mut seen: FxHashSet<&ModuleId> = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![entry];

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id.clone());

            let edges = self.edges(id);
            for edge in edges {
                match edge {
                    ModuleEdge::Unresolved { specifier } => {
                        return Err(Error::UnresolvedModule {
                            specifier: specifier.clone(),
                            importer: Some(id.clone()),
                        });
                    }
                    ModuleEdge::Internal { specifier, target } => {
                        match self.failure(target) {
                            Some(FrontEndError::NotFound(_)) => {
                                return Err(Error::UnresolvedModule {
                                    specifier: specifier.clone(),
                                    importer: Some(id.clone()),
                                });
                            }
                            Some(err) => return Err(Error::FrontEnd(err.clone())),
                            None => {}
                        }
                    }
                    ModuleEdge::External { .. } => {}
                }
            }

            for target in edges.iter().rev().filter_map(ModuleEdge::target) {
                if !seen.contains(target) {
                    stack.push(target);
                }
            }
        }

        Ok(order)
    }
}
