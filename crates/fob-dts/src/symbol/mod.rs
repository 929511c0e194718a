//! Symbol tracking across the whole declaration graph.
//!
//! The table is filled once while the graph is built and is read-only
//! afterwards, so per-entry analysis can share it across threads.

mod statistics;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{DeclarationKind, ImportedName, ModuleId};

pub use statistics::SymbolStatistics;

/// Dense symbol identifier, assigned in graph discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of symbols. Exhaustively matched wherever kind-specific
/// behavior is needed (namespace synthesis, default aliasing, renaming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Interface,
    Function,
    TypeAlias,
    Enum,
    Namespace,
    Variable,
    /// `declare global` / `declare module "x"`; retained unconditionally and
    /// never renamed.
    ModuleAugmentation,
    /// Binding imported from a module outside the bundled set.
    ExternalImport,
    /// Aggregate object synthesized for `import * as` / `export * as`.
    NamespaceObject,
}

impl From<DeclarationKind> for SymbolKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Class => Self::Class,
            DeclarationKind::Interface => Self::Interface,
            DeclarationKind::Function => Self::Function,
            DeclarationKind::TypeAlias => Self::TypeAlias,
            DeclarationKind::Enum => Self::Enum,
            DeclarationKind::Namespace => Self::Namespace,
            DeclarationKind::Variable => Self::Variable,
            DeclarationKind::ModuleAugmentation => Self::ModuleAugmentation,
        }
    }
}

impl SymbolKind {
    /// Whether the collision resolver assigns this symbol a final name.
    pub fn is_renamable(&self) -> bool {
        !matches!(self, Self::ModuleAugmentation)
    }
}

/// Where a symbol comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolOrigin {
    /// Declared in a bundled module. Merged declarations (interface + namespace
    /// of the same name) share one symbol.
    Declared {
        module: ModuleId,
        declarations: Vec<usize>,
    },
    External {
        specifier: String,
        imported: ImportedName,
    },
    Namespace { target: ModuleId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Bare local name before renaming. Binding key for declared symbols
    /// (`default` for anonymous defaults), first alias for namespace objects.
    pub name: String,
    pub kind: SymbolKind,
    pub origin: SymbolOrigin,
}

impl Symbol {
    /// Owning module of a declared symbol.
    pub fn module(&self) -> Option<&ModuleId> {
        match &self.origin {
            SymbolOrigin::Declared { module, .. } => Some(module),
            _ => None,
        }
    }

    pub fn declarations(&self) -> &[usize] {
        match &self.origin {
            SymbolOrigin::Declared { declarations, .. } => declarations,
            _ => &[],
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self.kind, SymbolKind::ModuleAugmentation)
    }

    pub fn is_external(&self) -> bool {
        matches!(self.origin, SymbolOrigin::External { .. })
    }

    pub fn namespace_target(&self) -> Option<&ModuleId> {
        match &self.origin {
            SymbolOrigin::Namespace { target } => Some(target),
            _ => None,
        }
    }
}

/// Collection of all symbols in a graph.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    declared: FxHashMap<(ModuleId, String), SymbolId>,
    namespaces: FxHashMap<ModuleId, SymbolId>,
    externals: FxHashMap<(String, ImportedName), SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: String, kind: SymbolKind, origin: SymbolOrigin) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            id,
            name,
            kind,
            origin,
        });
        id
    }

    /// Register a declaration under `key`, merging with an existing symbol of
    /// the same key in the same module.
    pub(crate) fn declare(
        &mut self,
        module: &ModuleId,
        key: &str,
        kind: DeclarationKind,
        index: usize,
    ) -> SymbolId {
        let lookup = (module.clone(), key.to_string());
        if let Some(&id) = self.declared.get(&lookup) {
            if let SymbolOrigin::Declared { declarations, .. } =
                &mut self.symbols[id.index()].origin
            {
                declarations.push(index);
            }
            return id;
        }

        let id = self.push(
            key.to_string(),
            kind.into(),
            SymbolOrigin::Declared {
                module: module.clone(),
                declarations: vec![index],
            },
        );
        self.declared.insert(lookup, id);
        id
    }

    /// One namespace object per target module; the first alias names it.
    pub(crate) fn intern_namespace(&mut self, target: &ModuleId, alias: &str) -> SymbolId {
        if let Some(&id) = self.namespaces.get(target) {
            return id;
        }
        let id = self.push(
            alias.to_string(),
            SymbolKind::NamespaceObject,
            SymbolOrigin::Namespace {
                target: target.clone(),
            },
        );
        self.namespaces.insert(target.clone(), id);
        id
    }

    /// External bindings are shared by `(specifier, imported name)`.
    pub(crate) fn intern_external(
        &mut self,
        specifier: &str,
        imported: &ImportedName,
        local: &str,
    ) -> SymbolId {
        let key = (specifier.to_string(), imported.clone());
        if let Some(&id) = self.externals.get(&key) {
            return id;
        }
        let name = match imported {
            ImportedName::Named(name) => name.clone(),
            ImportedName::Default | ImportedName::Namespace => local.to_string(),
        };
        let id = self.push(
            name,
            SymbolKind::ExternalImport,
            SymbolOrigin::External {
                specifier: specifier.to_string(),
                imported: imported.clone(),
            },
        );
        self.externals.insert(key, id);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn declared(&self, module: &ModuleId, key: &str) -> Option<SymbolId> {
        self.declared
            .get(&(module.clone(), key.to_string()))
            .copied()
    }

    pub fn namespace_of(&self, target: &ModuleId) -> Option<SymbolId> {
        self.namespaces.get(target).copied()
    }

    pub fn external(&self, specifier: &str, imported: &ImportedName) -> Option<SymbolId> {
        self.externals
            .get(&(specifier.to_string(), imported.clone()))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Declared symbols of `module`, ordered by their first declaration.
    pub fn declared_in(&self, module: &ModuleId) -> Vec<SymbolId> {
        let mut ids: Vec<(usize, SymbolId)> = self
            .symbols
            .iter()
            .filter(|symbol| symbol.module() == Some(module))
            .map(|symbol| {
                let first = symbol.declarations().first().copied().unwrap_or_default();
                (first, symbol.id)
            })
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn statistics(&self) -> SymbolStatistics {
        SymbolStatistics::from_symbols(self.symbols.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> ModuleId {
        ModuleId::new(path).unwrap()
    }

    #[test]
    fn test_declare_merges_same_key() {
        let mut table = SymbolTable::new();
        let a = id("a.d.ts");
        let first = table.declare(&a, "Box", DeclarationKind::Interface, 0);
        let other = table.declare(&a, "Other", DeclarationKind::TypeAlias, 1);
        let merged = table.declare(&a, "Box", DeclarationKind::Namespace, 2);

        assert_eq!(first, merged);
        assert_ne!(first, other);
        let symbol = table.get(first).unwrap();
        assert_eq!(symbol.kind, SymbolKind::Interface);
        assert_eq!(symbol.declarations(), &[0, 2]);
        assert_eq!(table.declared_in(&a), vec![first, other]);
    }

    #[test]
    fn test_same_name_in_different_modules_is_distinct() {
        let mut table = SymbolTable::new();
        let x = table.declare(&id("a.d.ts"), "Foo", DeclarationKind::Interface, 0);
        let y = table.declare(&id("b.d.ts"), "Foo", DeclarationKind::Interface, 0);
        assert_ne!(x, y);
        assert_eq!(table.declared(&id("b.d.ts"), "Foo"), Some(y));
    }

    #[test]
    fn test_intern_namespace_and_external_dedup() {
        let mut table = SymbolTable::new();
        let target = id("utils.d.ts");
        let ns = table.intern_namespace(&target, "utils");
        assert_eq!(table.intern_namespace(&target, "helpers"), ns);
        assert_eq!(table.get(ns).unwrap().name, "utils");
        assert_eq!(table.namespace_of(&target), Some(ns));

        let named = ImportedName::Named("ReactNode".to_string());
        let ext = table.intern_external("react", &named, "Node");
        assert_eq!(table.intern_external("react", &named, "ReactNode"), ext);
        assert_eq!(table.get(ext).unwrap().name, "ReactNode");

        let default = table.intern_external("react", &ImportedName::Default, "React");
        assert_ne!(default, ext);
        assert_eq!(table.get(default).unwrap().name, "React");
        assert!(table.get(default).unwrap().is_external());
    }
}
