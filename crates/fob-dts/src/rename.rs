//! Collision resolution.
//!
//! Retained symbols are visited module by module in emission order: declared
//! symbols in source order, then the namespace objects and external bindings the
//! module's import/export statements introduce. The first symbol with a bare
//! name keeps it; later ones get `name$1`, `name$2`, ... in encounter order.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::debug;

use crate::declaration::ANONYMOUS_DEFAULT_KEY;
use crate::graph::{ModuleEdge, ModuleGraph};
use crate::{
    DeclarationModule, ExportKind, ImportedName, ModuleId, Symbol, SymbolId, SymbolKind,
    SymbolOrigin,
};

/// Suffixes tried per base name before giving up.
pub const DEFAULT_MAX_SUFFIX: u32 = 10_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no free name for '{name}' after {limit} suffixes")]
pub struct RenameExhausted {
    pub name: String,
    pub limit: u32,
}

/// Final display name of every retained symbol. Injective.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    names: FxHashMap<SymbolId, String>,
    owners: FxHashMap<String, SymbolId>,
}

impl RenameMap {
    pub fn get(&self, id: SymbolId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Symbol that owns a final name.
    pub fn owner(&self, name: &str) -> Option<SymbolId> {
        self.owners.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All assignments in symbol id order.
    pub fn entries(&self) -> Vec<(SymbolId, &str)> {
        let mut entries: Vec<(SymbolId, &str)> = self
            .names
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    fn insert(&mut self, id: SymbolId, name: String) {
        self.owners.insert(name.clone(), id);
        self.names.insert(id, name);
    }
}

pub struct CollisionResolver<'a> {
    graph: &'a ModuleGraph,
    reserved: FxHashSet<String>,
    max_suffix: u32,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(graph: &'a ModuleGraph) -> Self {
        Self {
            graph,
            reserved: FxHashSet::default(),
            max_suffix: DEFAULT_MAX_SUFFIX,
        }
    }

    /// Names no symbol may take (globals referenced by the output).
    pub fn reserve<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn max_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    pub fn resolve(
        &self,
        order: &[ModuleId],
        retained: &FxHashSet<SymbolId>,
    ) -> Result<RenameMap, RenameExhausted> {
        let symbols = self.graph.symbols();
        let mut state = Assigner {
            renames: RenameMap::default(),
            next_suffix: FxHashMap::default(),
            reserved: &self.reserved,
            max_suffix: self.max_suffix,
        };

        for module_id in order {
            let Some(module) = self.graph.module(module_id) else {
                continue;
            };
            for id in symbols.declared_in(module_id) {
                if retained.contains(&id) {
                    self.visit(&mut state, id)?;
                }
            }
            for id in self.introduced_symbols(module) {
                if retained.contains(&id) {
                    self.visit(&mut state, id)?;
                }
            }
        }

        // Symbols reached only through front-end fallbacks into modules outside
        // the order.
        let mut leftovers: Vec<SymbolId> = retained.iter().copied().collect();
        leftovers.sort_unstable();
        for id in leftovers {
            self.visit(&mut state, id)?;
        }

        debug!(symbols = state.renames.len(), "collision resolution complete");
        Ok(state.renames)
    }

    fn visit(&self, state: &mut Assigner<'_>, id: SymbolId) -> Result<(), RenameExhausted> {
        if state.renames.get(id).is_some() {
            return Ok(());
        }
        let Some(symbol) = self.graph.symbols().get(id) else {
            return Ok(());
        };
        if !symbol.kind.is_renamable() {
            return Ok(());
        }
        let base = self.base_name(symbol);
        state.assign(id, &base)
    }

    /// Namespace objects and external bindings created by `module`'s
    /// statements, in statement order.
    fn introduced_symbols(&self, module: &DeclarationModule) -> Vec<SymbolId> {
        let symbols = self.graph.symbols();
        let mut ids = Vec::new();

        for import in module.imports.iter() {
            let Some(edge) = self.graph.edge(&module.id, &import.source) else {
                continue;
            };
            for binding in &import.bindings {
                let id = match (edge, &binding.imported) {
                    (ModuleEdge::Internal { target, .. }, ImportedName::Namespace) => {
                        symbols.namespace_of(target)
                    }
                    (ModuleEdge::External { specifier }, imported) => {
                        symbols.external(specifier, imported)
                    }
                    _ => None,
                };
                ids.extend(id);
            }
        }

        for export in module.exports.iter() {
            let Some(source) = export.re_exported_from.as_deref() else {
                continue;
            };
            let Some(edge) = self.graph.edge(&module.id, source) else {
                continue;
            };
            let id = match (export.kind, edge) {
                (ExportKind::NamespaceReExport, ModuleEdge::Internal { target, .. }) => {
                    symbols.namespace_of(target)
                }
                (ExportKind::NamespaceReExport, ModuleEdge::External { specifier }) => {
                    symbols.external(specifier, &ImportedName::Namespace)
                }
                (ExportKind::ReExport, ModuleEdge::External { specifier }) => {
                    let imported = export.local.as_deref().unwrap_or(&export.name);
                    symbols.external(specifier, &ImportedName::from_export_name(imported))
                }
                _ => None,
            };
            ids.extend(id);
        }

        ids
    }

    fn base_name(&self, symbol: &Symbol) -> String {
        match (&symbol.kind, &symbol.origin) {
            (SymbolKind::ModuleAugmentation, _) => symbol.name.clone(),
            (_, SymbolOrigin::Declared { module, .. }) => {
                let is_default = self
                    .graph
                    .module(module)
                    .is_some_and(|owner| exported_only_as_default(owner, &symbol.name));
                if is_default {
                    synthetic_default_name(module)
                } else {
                    symbol.name.clone()
                }
            }
            _ => symbol.name.clone(),
        }
    }
}

struct Assigner<'r> {
    renames: RenameMap,
    next_suffix: FxHashMap<String, u32>,
    reserved: &'r FxHashSet<String>,
    max_suffix: u32,
}

impl Assigner<'_> {
    fn is_free(&self, name: &str) -> bool {
        self.renames.owner(name).is_none() && !self.reserved.contains(name)
    }

    fn assign(&mut self, id: SymbolId, base: &str) -> Result<(), RenameExhausted> {
        if self.is_free(base) {
            self.renames.insert(id, base.to_string());
            return Ok(());
        }

        let mut suffix = self.next_suffix.get(base).copied().unwrap_or(1);
        loop {
            if suffix > self.max_suffix {
                return Err(RenameExhausted {
                    name: base.to_string(),
                    limit: self.max_suffix,
                });
            }
            let candidate = format!("{base}${suffix}");
            suffix += 1;
            if self.is_free(&candidate) {
                self.next_suffix.insert(base.to_string(), suffix);
                self.renames.insert(id, candidate);
                return Ok(());
            }
        }
    }
}

/// Anonymous defaults always qualify; named declarations qualify when their
/// module exports them under `default` and nothing else.
fn exported_only_as_default(module: &DeclarationModule, key: &str) -> bool {
    if key == ANONYMOUS_DEFAULT_KEY {
        return true;
    }
    let mut as_default = false;
    for export in module.exports.iter() {
        match export.kind {
            ExportKind::Default if export.local.as_deref() == Some(key) => as_default = true,
            ExportKind::Named if export.local.as_deref() == Some(key) => return false,
            _ => {}
        }
    }
    as_default
}

/// `<stem>_default`, using the directory name for `index` modules.
pub fn synthetic_default_name(module: &ModuleId) -> String {
    let parent = module.parent_dir();
    let stem = match module.stem() {
        "index" => parent
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("index"),
        stem => stem,
    };
    format!("{}_default", sanitize_identifier(stem))
}

fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if out.chars().next().is_none_or(|ch| ch.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
