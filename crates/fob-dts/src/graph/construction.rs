//! Graph discovery, edge resolution and symbol registration.

use std::sync::Arc;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use super::{ExternalDependency, GraphInner, ModuleEdge, ModuleGraph};
use crate::frontend::{FrontEnd, Resolution};
use crate::{DeclarationModule, ExportKind, ImportedName, ModuleId};

impl ModuleGraph {
    /// Discover every module reachable from `entries` through the front end.
    ///
    /// Discovery is a depth-first pre-order walk following each module's edges
    /// in statement order. Nothing here fails: unresolved specifiers become
    /// [`ModuleEdge::Unresolved`] and parse failures are kept per module.
    pub fn build(frontend: &dyn FrontEnd, entries: &[ModuleId]) -> Self {
        let mut inner = GraphInner {
            entries: entries.to_vec(),
            ..GraphInner::default()
        };

        let mut seen: FxHashSet<ModuleId> = FxHashSet::default();
        let mut stack: Vec<ModuleId> = entries.iter().rev().cloned().collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }

            let module = match frontend.parse_module(&id) {
                Ok(module) => module,
                Err(err) => {
                    warn!(module = %id, error = %err, "front end failed to produce module");
                    inner.failures.insert(id, err);
                    continue;
                }
            };

            let edges = resolve_edges(frontend, &module, &mut inner);
            debug!(module = %id, edges = edges.len(), "discovered declaration module");

            for target in edges.iter().rev().filter_map(ModuleEdge::target) {
                if !seen.contains(target) {
                    stack.push(target.clone());
                }
            }

            inner.modules.insert(id, module);
            inner.edges.push(edges);
        }

        inner.adjacency = inner
            .edges
            .iter()
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(ModuleEdge::target)
                    .filter_map(|target| inner.modules.get_index_of(target))
                    .collect()
            })
            .collect();

        compute_components(&mut inner);
        register_symbols(&mut inner);

        debug!(
            modules = inner.modules.len(),
            symbols = inner.symbols.len(),
            failures = inner.failures.len(),
            "module graph built"
        );

        Self {
            inner: Arc::new(inner),
        }
    }
}

fn resolve_edges(
    frontend: &dyn FrontEnd,
    module: &DeclarationModule,
    inner: &mut GraphInner,
) -> Vec<ModuleEdge> {
    module
        .specifiers()
        .into_iter()
        .map(|specifier| match frontend.resolve_specifier(&module.id, specifier) {
            Resolution::Internal(target) => ModuleEdge::Internal {
                specifier: specifier.to_string(),
                target,
            },
            Resolution::External => {
                inner
                    .external_deps
                    .entry(specifier.to_string())
                    .or_insert_with(|| ExternalDependency::new(specifier))
                    .push_importer(module.id.clone());
                ModuleEdge::External {
                    specifier: specifier.to_string(),
                }
            }
            Resolution::Unresolved => {
                debug!(module = %module.id, specifier, "unresolved module specifier");
                ModuleEdge::Unresolved {
                    specifier: specifier.to_string(),
                }
            }
        })
        .collect()
}

/// Tag strongly connected components so cycles are known before emission.
fn compute_components(inner: &mut GraphInner) {
    let count = inner.modules.len();
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(count, count);
    let nodes: Vec<NodeIndex> = (0..count).map(|index| graph.add_node(index)).collect();

    let mut self_loops = vec![false; count];
    for (from, targets) in inner.adjacency.iter().enumerate() {
        for &to in targets {
            if from == to {
                self_loops[from] = true;
            }
            graph.add_edge(nodes[from], nodes[to], ());
        }
    }

    inner.scc_of = vec![0; count];
    inner.cyclic = vec![false; count];
    inner.sccs = tarjan_scc(&graph)
        .into_iter()
        .map(|component| component.into_iter().map(|node| graph[node]).collect())
        .collect();

    for (scc, members) in inner.sccs.iter_mut().enumerate() {
        members.sort_unstable();
        let is_cycle = members.len() > 1 || members.iter().any(|&m| self_loops[m]);
        for &member in members.iter() {
            inner.scc_of[member] = scc;
            inner.cyclic[member] = is_cycle;
        }
    }
}

/// Declared symbols first (module discovery order, then source order), then the
/// namespace objects and external bindings introduced by import/export
/// statements.
fn register_symbols(inner: &mut GraphInner) {
    let GraphInner {
        modules,
        edges,
        symbols,
        ..
    } = inner;

    for module in modules.values() {
        for (index, declaration) in module.declarations.iter().enumerate() {
            symbols.declare(&module.id, &declaration.binding_key(), declaration.kind, index);
        }
    }

    for (module, module_edges) in modules.values().zip(edges.iter()) {
        let edge_for = |specifier: &str| {
            module_edges
                .iter()
                .find(|edge| edge.specifier() == specifier)
        };

        for import in module.imports.iter() {
            match edge_for(&import.source) {
                Some(ModuleEdge::Internal { target, .. }) => {
                    for binding in &import.bindings {
                        if binding.imported == ImportedName::Namespace {
                            symbols.intern_namespace(target, &binding.local);
                        }
                    }
                }
                Some(ModuleEdge::External { specifier }) => {
                    for binding in &import.bindings {
                        symbols.intern_external(specifier, &binding.imported, &binding.local);
                    }
                }
                Some(ModuleEdge::Unresolved { .. }) | None => {}
            }
        }

        for export in module.exports.iter() {
            let Some(source) = export.re_exported_from.as_deref() else {
                continue;
            };
            match (export.kind, edge_for(source)) {
                (ExportKind::NamespaceReExport, Some(ModuleEdge::Internal { target, .. })) => {
                    symbols.intern_namespace(target, &export.name);
                }
                (ExportKind::NamespaceReExport, Some(ModuleEdge::External { specifier })) => {
                    symbols.intern_external(specifier, &ImportedName::Namespace, &export.name);
                }
                (ExportKind::ReExport, Some(ModuleEdge::External { specifier })) => {
                    let imported = export.local.as_deref().unwrap_or(&export.name);
                    symbols.intern_external(
                        specifier,
                        &ImportedName::from_export_name(imported),
                        &export.name,
                    );
                }
                _ => {}
            }
        }
    }
}
