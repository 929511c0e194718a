//! Statistics and analysis helpers for symbols.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{Symbol, SymbolKind};

/// Statistics about symbols across the entire graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolStatistics {
    pub total_symbols: usize,
    pub external_symbols: usize,
    pub ambient_symbols: usize,
    /// Breakdown by symbol kind, in first-seen order
    pub by_kind: Vec<(SymbolKind, usize)>,
}

impl SymbolStatistics {
    pub fn from_symbols<'a, I>(symbols: I) -> Self
    where
        I: Iterator<Item = &'a Symbol>,
    {
        let mut stats = Self::default();
        let mut kind_slots: FxHashMap<SymbolKind, usize> = FxHashMap::default();

        for symbol in symbols {
            stats.total_symbols += 1;
            if symbol.is_external() {
                stats.external_symbols += 1;
            }
            if symbol.is_ambient() {
                stats.ambient_symbols += 1;
            }

            let slot = *kind_slots.entry(symbol.kind).or_insert_with(|| {
                stats.by_kind.push((symbol.kind, 0));
                stats.by_kind.len() - 1
            });
            stats.by_kind[slot].1 += 1;
        }

        stats
    }

    pub fn count(&self, kind: SymbolKind) -> usize {
        self.by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, count)| *count)
    }
}
