//! Per-entry reachability.
//!
//! Starting from the symbols an entry exports, a work list follows every
//! reference edge of every retained declaration. Module augmentations in the
//! entry's module closure are seeded unconditionally. Anything never reached is
//! pruned, together with its documentation.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::link::{Binding, Linker};
use crate::{Error, FxIndexSet, ModuleId, Result, SymbolId, SymbolOrigin};

/// One row of an entry's public surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub exported: String,
    pub target: SymbolId,
    pub is_type_only: bool,
    pub is_default: bool,
}

/// Ordered public surface of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub entry: ModuleId,
    pub entries: Vec<ManifestEntry>,
    /// `export * from "<external>"` statements passed through verbatim.
    pub external_stars: Vec<String>,
}

impl ExportManifest {
    pub fn get(&self, exported: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.exported == exported)
    }

    pub fn targets(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.entries.iter().map(|entry| entry.target)
    }
}

/// Address of one declaration node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclKey {
    pub module: ModuleId,
    pub index: usize,
}

/// Member of a synthesized namespace object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMember {
    pub exported: String,
    pub target: SymbolId,
}

/// Retained symbols plus the reference bindings of their declarations.
///
/// Sets for several entries can be merged; bindings of a declaration do not
/// depend on the entry that reached it.
#[derive(Debug, Clone, Default)]
pub struct ReachableSet {
    retained: FxHashSet<SymbolId>,
    edges: FxHashMap<SymbolId, Vec<SymbolId>>,
    links: FxHashMap<DeclKey, Vec<Binding>>,
    namespaces: FxHashMap<SymbolId, Vec<NamespaceMember>>,
    globals: FxIndexSet<String>,
}

impl ReachableSet {
    pub fn union<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a ReachableSet>,
    {
        let mut merged = Self::default();
        for set in sets {
            merged.retained.extend(set.retained.iter().copied());
            for (id, edges) in &set.edges {
                merged.edges.entry(*id).or_insert_with(|| edges.clone());
            }
            for (key, links) in &set.links {
                merged
                    .links
                    .entry(key.clone())
                    .or_insert_with(|| links.clone());
            }
            for (id, members) in &set.namespaces {
                merged
                    .namespaces
                    .entry(*id)
                    .or_insert_with(|| members.clone());
            }
            merged.globals.extend(set.globals.iter().cloned());
        }
        merged
    }

    pub fn is_retained(&self, id: SymbolId) -> bool {
        self.retained.contains(&id)
    }

    pub fn retained(&self) -> &FxHashSet<SymbolId> {
        &self.retained
    }

    /// Retained symbols in id order.
    pub fn retained_sorted(&self) -> Vec<SymbolId> {
        let mut ids: Vec<SymbolId> = self.retained.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Symbols referenced by `id`'s declarations (or members, for namespace
    /// objects), deduplicated in first-reference order.
    pub fn references(&self, id: SymbolId) -> &[SymbolId] {
        self.edges.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn links(&self, key: &DeclKey) -> Option<&[Binding]> {
        self.links.get(key).map(Vec::as_slice)
    }

    pub fn namespace_members(&self, id: SymbolId) -> Option<&[NamespaceMember]> {
        self.namespaces.get(&id).map(Vec::as_slice)
    }

    /// Global names referenced by retained declarations.
    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.globals.iter().map(String::as_str)
    }
}

/// Result of analyzing one entry.
#[derive(Debug, Clone)]
pub struct Reachability {
    pub entry: ModuleId,
    pub manifest: ExportManifest,
    /// Emission order of the entry's modules.
    pub order: Vec<ModuleId>,
    pub set: ReachableSet,
}

impl Reachability {
    pub fn analyze(linker: &Linker<'_>, entry: &ModuleId) -> Result<Self> {
        let graph = linker.graph();
        let closure = graph.closure(entry)?;
        let manifest = build_manifest(linker, entry)?;
        let symbols = graph.symbols();

        let mut set = ReachableSet::default();
        let mut queue: VecDeque<SymbolId> = manifest.targets().collect();

        for module in &closure {
            for id in symbols.declared_in(module) {
                if symbols.get(id).is_some_and(|symbol| symbol.is_ambient()) {
                    queue.push_back(id);
                }
            }
        }

        while let Some(id) = queue.pop_front() {
            if !set.retained.insert(id) {
                continue;
            }
            let Some(symbol) = symbols.get(id) else {
                continue;
            };

            let mut edges: Vec<SymbolId> = Vec::new();
            match &symbol.origin {
                SymbolOrigin::Declared {
                    module,
                    declarations,
                } => {
                    let Some(owner) = graph.module(module) else {
                        continue;
                    };
                    for &index in declarations {
                        let Some(declaration) = owner.declarations.get(index) else {
                            continue;
                        };
                        let mut bindings = Vec::new();
                        for reference in declaration.references() {
                            let binding = linker
                                .resolve_local(module, &reference.name)
                                .map_err(|err| with_declaration(err, &declaration.binding_key()))?;
                            match binding {
                                Binding::Symbol(target) => {
                                    if !edges.contains(&target) {
                                        edges.push(target);
                                    }
                                }
                                Binding::Global => {
                                    set.globals.insert(reference.name.clone());
                                }
                            }
                            bindings.push(binding);
                        }
                        set.links.insert(
                            DeclKey {
                                module: module.clone(),
                                index,
                            },
                            bindings,
                        );
                    }
                }
                SymbolOrigin::Namespace { target } => {
                    let members = namespace_members(linker, target)?;
                    edges.extend(members.iter().map(|member| member.target));
                    set.namespaces.insert(id, members);
                }
                SymbolOrigin::External { .. } => {}
            }

            queue.extend(edges.iter().copied());
            if !edges.is_empty() {
                set.edges.insert(id, edges);
            }
        }

        debug!(
            entry = %entry,
            exports = manifest.entries.len(),
            retained = set.retained.len(),
            "reachability analyzed"
        );

        Ok(Self {
            entry: entry.clone(),
            order: graph.traversal(std::slice::from_ref(entry)),
            manifest,
            set,
        })
    }
}

fn build_manifest(linker: &Linker<'_>, entry: &ModuleId) -> Result<ExportManifest> {
    let surface = linker.exported_names(entry)?;
    let mut entries = Vec::with_capacity(surface.names.len());

    for name in surface.names {
        let target = match linker.resolve_export(entry, &name.name)? {
            Some(Binding::Symbol(target)) => target,
            Some(Binding::Global) | None => {
                return Err(Error::UnresolvedSymbol {
                    name: name.name,
                    module: entry.clone(),
                    declaration: None,
                });
            }
        };
        entries.push(ManifestEntry {
            is_default: name.name == "default",
            exported: name.name,
            target,
            is_type_only: name.is_type_only,
        });
    }

    Ok(ExportManifest {
        entry: entry.clone(),
        entries,
        external_stars: surface.external_stars,
    })
}

/// Members of the namespace object for `target`, one per exported name.
fn namespace_members(linker: &Linker<'_>, target: &ModuleId) -> Result<Vec<NamespaceMember>> {
    let surface = linker.exported_names(target)?;
    for specifier in &surface.external_stars {
        warn!(
            module = %target,
            specifier = %specifier,
            "namespace object omits names re-exported from an external module"
        );
    }
    let mut members = Vec::with_capacity(surface.names.len());

    for name in surface.names {
        if name.name == "default" {
            warn!(module = %target, "namespace object omits the `default` export");
            continue;
        }
        match linker.resolve_export(target, &name.name)? {
            Some(Binding::Symbol(symbol)) => members.push(NamespaceMember {
                exported: name.name,
                target: symbol,
            }),
            Some(Binding::Global) | None => {
                return Err(Error::UnresolvedSymbol {
                    name: name.name,
                    module: target.clone(),
                    declaration: None,
                });
            }
        }
    }

    Ok(members)
}

fn with_declaration(err: Error, declaration: &str) -> Error {
    match err {
        Error::UnresolvedSymbol {
            name,
            module,
            declaration: None,
        } => Error::UnresolvedSymbol {
            name,
            module,
            declaration: Some(declaration.to_string()),
        },
        other => other,
    }
}
