//! Import cycle reporting.

use serde::{Deserialize, Serialize};

use super::ModuleGraph;
use crate::ModuleId;

/// One strongly connected group of modules, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCycle {
    pub modules: Vec<ModuleId>,
}

impl ModuleCycle {
    /// Format the cycle as a human-readable chain.
    ///
    /// Example: "a.d.ts -> b.d.ts -> a.d.ts"
    pub fn format_chain(&self) -> String {
        self.modules
            .iter()
            .chain(self.modules.first())
            .map(ModuleId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains(id)
    }
}

impl ModuleGraph {
    /// All import cycles, ordered by the discovery of their first module.
    pub fn cycles(&self) -> Vec<ModuleCycle> {
        let mut cycles: Vec<&Vec<usize>> = self
            .inner
            .sccs
            .iter()
            .filter(|members| members.first().is_some_and(|&m| self.inner.cyclic[m]))
            .collect();
        cycles.sort_unstable_by_key(|members| members.first().copied());

        cycles
            .into_iter()
            .map(|members| ModuleCycle {
                modules: members
                    .iter()
                    .filter_map(|&index| self.id_at(index).cloned())
                    .collect(),
            })
            .collect()
    }
}
