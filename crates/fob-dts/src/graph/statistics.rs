use serde::{Deserialize, Serialize};

use super::ModuleGraph;
use crate::SymbolStatistics;

/// Basic statistics about a `ModuleGraph` useful for logging.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStatistics {
    pub module_count: usize,
    pub entry_point_count: usize,
    pub external_dependency_count: usize,
    pub failed_module_count: usize,
    pub cyclic_module_count: usize,
    pub symbols: SymbolStatistics,
}

impl ModuleGraph {
    /// Compute statistics snapshot.
    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            module_count: self.len(),
            entry_point_count: self.inner.entries.len(),
            external_dependency_count: self.inner.external_deps.len(),
            failed_module_count: self.inner.failures.len(),
            cyclic_module_count: self.inner.cyclic.iter().filter(|&&c| c).count(),
            symbols: self.inner.symbols.statistics(),
        }
    }
}
