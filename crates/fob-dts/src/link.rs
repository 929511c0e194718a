//! Name resolution over import and export tables.
//!
//! Local identifiers resolve to a declaration in the same module, then to an
//! import binding, then to whatever the front end reports. Export names resolve
//! through re-export chains and `export *` fan-out.

use rustc_hash::FxHashSet;
use tracing::warn;

use crate::frontend::{FrontEnd, ReferenceTarget};
use crate::graph::{ModuleEdge, ModuleGraph};
use crate::{Error, Export, ExportKind, FxIndexMap, ImportedName, ModuleId, Result, SymbolId};

/// What an identifier is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Symbol(SymbolId),
    /// Ambient global that needs no declaration in the output.
    Global,
}

impl Binding {
    pub fn symbol(self) -> Option<SymbolId> {
        match self {
            Self::Symbol(id) => Some(id),
            Self::Global => None,
        }
    }
}

/// An external name a module makes visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedName {
    pub name: String,
    pub is_type_only: bool,
}

/// Everything a module exports, after star expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSurface {
    pub names: Vec<ExportedName>,
    /// `export * from "<external>"` reached through star chains.
    pub external_stars: Vec<String>,
}

pub struct Linker<'a> {
    graph: &'a ModuleGraph,
    frontend: &'a dyn FrontEnd,
}

impl<'a> Linker<'a> {
    pub fn new(graph: &'a ModuleGraph, frontend: &'a dyn FrontEnd) -> Self {
        Self { graph, frontend }
    }

    pub fn graph(&self) -> &'a ModuleGraph {
        self.graph
    }

    /// Resolve an identifier used inside `module`.
    pub fn resolve_local(&self, module: &ModuleId, name: &str) -> Result<Binding> {
        self.resolve_local_inner(module, name, &mut FxHashSet::default())
    }

    /// Resolve the symbol behind `export_name` of `module`.
    ///
    /// `Ok(None)` means the module does not export that name.
    pub fn resolve_export(&self, module: &ModuleId, export_name: &str) -> Result<Option<Binding>> {
        self.resolve_export_inner(module, export_name, &mut FxHashSet::default())
    }

    fn resolve_local_inner(
        &self,
        module_id: &ModuleId,
        name: &str,
        visiting: &mut FxHashSet<(ModuleId, String)>,
    ) -> Result<Binding> {
        let symbols = self.graph.symbols();
        if let Some(id) = symbols.declared(module_id, name) {
            return Ok(Binding::Symbol(id));
        }

        let module = self
            .graph
            .module(module_id)
            .ok_or_else(|| unresolved_symbol(name, module_id))?;

        let binding = module
            .imports
            .iter()
            .find_map(|import| import.binding(name).map(|binding| (import, binding)));

        if let Some((import, binding)) = binding {
            return match self.edge(module_id, &import.source)? {
                ModuleEdge::Internal { target, .. } => match &binding.imported {
                    ImportedName::Namespace => symbols
                        .namespace_of(target)
                        .map(Binding::Symbol)
                        .ok_or_else(|| unresolved_symbol(name, module_id)),
                    imported => {
                        let export_name = imported.export_name().unwrap_or("default");
                        self.resolve_export_inner(target, export_name, visiting)?
                            .ok_or_else(|| unresolved_symbol(export_name, target))
                    }
                },
                ModuleEdge::External { specifier } => symbols
                    .external(specifier, &binding.imported)
                    .map(Binding::Symbol)
                    .ok_or_else(|| unresolved_symbol(name, module_id)),
                ModuleEdge::Unresolved { .. } => unreachable_edge(&import.source, module_id),
            };
        }

        match self.frontend.resolve_reference(module_id, name) {
            Some(ReferenceTarget::Global) => Ok(Binding::Global),
            Some(ReferenceTarget::Symbol(key)) => symbols
                .declared(&key.module, &key.name)
                .map(Binding::Symbol)
                .ok_or_else(|| unresolved_symbol(&key.name, &key.module)),
            None => Err(unresolved_symbol(name, module_id)),
        }
    }

    fn resolve_export_inner(
        &self,
        module_id: &ModuleId,
        export_name: &str,
        visiting: &mut FxHashSet<(ModuleId, String)>,
    ) -> Result<Option<Binding>> {
        if !visiting.insert((module_id.clone(), export_name.to_string())) {
            return Ok(None);
        }
        let Some(module) = self.graph.module(module_id) else {
            return Ok(None);
        };

        let row = module
            .exports
            .iter()
            .find(|export| export.binds_name() && export.name == export_name);

        if let Some(export) = row {
            return self.resolve_row(module_id, export, visiting).map(Some);
        }

        // `export *` never forwards `default`.
        if export_name == "default" {
            return Ok(None);
        }

        for star in module.exports.iter().filter(|e| e.is_star_re_export()) {
            let Some(source) = star.re_exported_from.as_deref() else {
                continue;
            };
            if let ModuleEdge::Internal { target, .. } = self.edge(module_id, source)? {
                if let Some(binding) = self.resolve_export_inner(target, export_name, visiting)? {
                    return Ok(Some(binding));
                }
            }
        }

        Ok(None)
    }

    fn resolve_row(
        &self,
        module_id: &ModuleId,
        export: &Export,
        visiting: &mut FxHashSet<(ModuleId, String)>,
    ) -> Result<Binding> {
        let symbols = self.graph.symbols();
        match export.kind {
            ExportKind::Named | ExportKind::Default => match export.local.as_deref() {
                Some(local) => self.resolve_local_inner(module_id, local, visiting),
                None => symbols
                    .declared(module_id, crate::declaration::ANONYMOUS_DEFAULT_KEY)
                    .map(Binding::Symbol)
                    .ok_or_else(|| unresolved_symbol(&export.name, module_id)),
            },
            ExportKind::ReExport => {
                let source = export.re_exported_from.as_deref().unwrap_or_default();
                let imported = export.local.as_deref().unwrap_or(&export.name);
                match self.edge(module_id, source)? {
                    ModuleEdge::Internal { target, .. } => self
                        .resolve_export_inner(target, imported, visiting)?
                        .ok_or_else(|| unresolved_symbol(imported, target)),
                    ModuleEdge::External { specifier } => symbols
                        .external(specifier, &ImportedName::from_export_name(imported))
                        .map(Binding::Symbol)
                        .ok_or_else(|| unresolved_symbol(imported, module_id)),
                    ModuleEdge::Unresolved { .. } => unreachable_edge(source, module_id),
                }
            }
            ExportKind::NamespaceReExport => {
                let source = export.re_exported_from.as_deref().unwrap_or_default();
                let symbol = match self.edge(module_id, source)? {
                    ModuleEdge::Internal { target, .. } => symbols.namespace_of(target),
                    ModuleEdge::External { specifier } => {
                        symbols.external(specifier, &ImportedName::Namespace)
                    }
                    ModuleEdge::Unresolved { .. } => return unreachable_edge(source, module_id),
                };
                symbol
                    .map(Binding::Symbol)
                    .ok_or_else(|| unresolved_symbol(&export.name, module_id))
            }
            ExportKind::StarReExport => Err(unresolved_symbol(&export.name, module_id)),
        }
    }

    /// Names exported by `module` in declaration order, followed by names
    /// contributed through `export *` in statement order.
    pub fn exported_names(&self, module: &ModuleId) -> Result<ExportSurface> {
        let mut names: FxIndexMap<String, bool> = FxIndexMap::default();
        let mut external_stars = Vec::new();
        let mut visiting = FxHashSet::default();
        self.collect_exports(module, false, &mut names, &mut external_stars, &mut visiting)?;

        Ok(ExportSurface {
            names: names
                .into_iter()
                .map(|(name, is_type_only)| ExportedName { name, is_type_only })
                .collect(),
            external_stars,
        })
    }

    fn collect_exports(
        &self,
        module_id: &ModuleId,
        via_star: bool,
        names: &mut FxIndexMap<String, bool>,
        external_stars: &mut Vec<String>,
        visiting: &mut FxHashSet<ModuleId>,
    ) -> Result<()> {
        if !visiting.insert(module_id.clone()) {
            return Ok(());
        }
        let Some(module) = self.graph.module(module_id) else {
            return Ok(());
        };

        for export in module.exports.iter().filter(|e| e.binds_name()) {
            if via_star && export.is_default() {
                continue;
            }
            names.entry(export.name.clone()).or_insert(export.is_type_only);
        }

        for star in module.exports.iter().filter(|e| e.is_star_re_export()) {
            let Some(source) = star.re_exported_from.as_deref() else {
                continue;
            };
            match self.edge(module_id, source)? {
                ModuleEdge::Internal { target, .. } => {
                    let mut inner: FxIndexMap<String, bool> = FxIndexMap::default();
                    self.collect_exports(target, true, &mut inner, external_stars, visiting)?;
                    for (name, is_type_only) in inner {
                        if names.contains_key(&name) {
                            if self.is_star_conflict(module_id, &name, target)? {
                                warn!(
                                    module = %module_id,
                                    name = %name,
                                    source,
                                    "name provided by several `export *` sources; keeping the first"
                                );
                            }
                            continue;
                        }
                        names.insert(name, is_type_only || star.is_type_only);
                    }
                }
                ModuleEdge::External { specifier } => {
                    if !external_stars.contains(specifier) {
                        external_stars.push(specifier.clone());
                    }
                }
                ModuleEdge::Unresolved { .. } => return unreachable_edge(source, module_id),
            }
        }

        Ok(())
    }

    /// A later star source provides `name` bound to a different symbol than the
    /// one `module` already exposes.
    fn is_star_conflict(&self, module: &ModuleId, name: &str, source: &ModuleId) -> Result<bool> {
        let kept = self.resolve_export(module, name)?;
        let other = self.resolve_export(source, name)?;
        Ok(kept != other)
    }

    fn edge(&self, module: &ModuleId, specifier: &str) -> Result<&'a ModuleEdge> {
        self.graph
            .edge(module, specifier)
            .ok_or_else(|| Error::UnresolvedModule {
                specifier: specifier.to_string(),
                importer: Some(module.clone()),
            })
    }
}

fn unresolved_symbol(name: &str, module: &ModuleId) -> Error {
    Error::UnresolvedSymbol {
        name: name.to_string(),
        module: module.clone(),
        declaration: None,
    }
}

/// Unresolved edges are rejected by the closure check before linking starts;
/// reaching one here still reports the specifier instead of panicking.
fn unreachable_edge<T>(specifier: &str, importer: &ModuleId) -> Result<T> {
    Err(Error::UnresolvedModule {
        specifier: specifier.to_string(),
        importer: Some(importer.clone()),
    })
}
