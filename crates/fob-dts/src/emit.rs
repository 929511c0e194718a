//! Output assembly.
//!
//! A chunk is laid out as: banner, hoisted directives, external imports, the
//! shared-chunk import, one region per module in emission order, and finally
//! the export statement. Sections are separated by a blank line.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::ModuleGraph;
use crate::namespace;
use crate::reachability::ReachableSet;
use crate::rewrite::Rewriter;
use crate::{
    Declaration, FxIndexMap, FxIndexSet, ImportedName, ModuleId, RenameMap, Result, SymbolId,
    SymbolOrigin,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitOptions {
    /// Comment placed on the first line of every chunk.
    pub banner: Option<String>,
    /// Wrap each module's declarations in `//#region` markers.
    pub region_markers: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            banner: None,
            region_markers: true,
        }
    }
}

/// One name of a chunk's export statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    pub exported: String,
    pub target: SymbolId,
    pub is_type_only: bool,
}

/// Import of the shared chunk from an entry chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedImport {
    /// `import { A, B } from "<path>";`
    Named { path: String, names: Vec<SymbolId> },
    /// `import "<path>";` for entries that only need shared ambient blocks.
    SideEffect { path: String },
}

/// Everything the emitter needs to know about one output chunk.
#[derive(Debug, Clone, Default)]
pub struct ChunkSpec {
    /// Modules in emission order.
    pub order: Vec<ModuleId>,
    /// Symbols rendered inline in this chunk. External symbols are ignored.
    pub symbols: FxHashSet<SymbolId>,
    pub shared_import: Option<SharedImport>,
    pub exports: Vec<ExportSpec>,
    /// `export * from "<external>"` statements.
    pub external_stars: Vec<String>,
}

pub struct Emitter<'a> {
    graph: &'a ModuleGraph,
    reachable: &'a ReachableSet,
    renames: &'a RenameMap,
    options: &'a EmitOptions,
}

impl<'a> Emitter<'a> {
    pub fn new(
        graph: &'a ModuleGraph,
        reachable: &'a ReachableSet,
        renames: &'a RenameMap,
        options: &'a EmitOptions,
    ) -> Self {
        Self {
            graph,
            reachable,
            renames,
            options,
        }
    }

    pub fn emit(&self, chunk: &ChunkSpec) -> Result<String> {
        let rewriter = Rewriter::new(self.graph, self.reachable, self.renames);
        let regions = self.render_regions(&rewriter, chunk)?;

        let mut sections: Vec<String> = Vec::new();
        if let Some(banner) = &self.options.banner {
            sections.push(banner.clone());
        }

        let directives = self.directives(&regions);
        if !directives.is_empty() {
            sections.push(directives.join("\n"));
        }

        let external_imports = self.external_imports(&rewriter, chunk)?;
        if !external_imports.is_empty() {
            sections.push(external_imports.join("\n"));
        }

        match &chunk.shared_import {
            Some(SharedImport::Named { path, names }) if !names.is_empty() => {
                let mut list = Vec::with_capacity(names.len());
                for id in names {
                    list.push(self.name_of(&rewriter, *id)?);
                }
                sections.push(format!("import {{ {} }} from \"{path}\";", list.join(", ")));
            }
            Some(SharedImport::Named { .. }) | None => {}
            Some(SharedImport::SideEffect { path }) => {
                sections.push(format!("import \"{path}\";"));
            }
        }

        for region in &regions {
            sections.push(self.wrap_region(region));
        }

        sections.push(self.export_statement(&rewriter, chunk)?);

        debug!(
            regions = regions.len(),
            exports = chunk.exports.len(),
            "chunk emitted"
        );

        let mut code = sections.join("\n\n");
        code.push('\n');
        Ok(code)
    }

    fn render_regions(&self, rewriter: &Rewriter<'_>, chunk: &ChunkSpec) -> Result<Vec<Region>> {
        let symbols = self.graph.symbols();
        let mut ids: Vec<SymbolId> = chunk.symbols.iter().copied().collect();
        ids.sort_unstable();

        // Per module: declaration indices, then namespace objects targeting it.
        let mut declarations: FxHashMap<&ModuleId, Vec<(usize, SymbolId)>> = FxHashMap::default();
        let mut namespaces: FxHashMap<&ModuleId, Vec<SymbolId>> = FxHashMap::default();
        for id in ids {
            let Some(symbol) = symbols.get(id) else {
                continue;
            };
            match &symbol.origin {
                SymbolOrigin::Declared {
                    module,
                    declarations: indices,
                } => declarations
                    .entry(module)
                    .or_default()
                    .extend(indices.iter().map(|&index| (index, id))),
                SymbolOrigin::Namespace { target } => {
                    namespaces.entry(target).or_default().push(id);
                }
                SymbolOrigin::External { .. } => {}
            }
        }

        let mut modules: Vec<&ModuleId> = chunk.order.iter().collect();
        let mut stray: Vec<&ModuleId> = declarations
            .keys()
            .chain(namespaces.keys())
            .copied()
            .filter(|module| !chunk.order.contains(*module))
            .collect::<FxIndexSet<_>>()
            .into_iter()
            .collect();
        stray.sort_unstable();
        modules.extend(stray);

        // A merged symbol carries its doc comment on the first declaration only.
        let mut documented: FxHashSet<SymbolId> = FxHashSet::default();
        let mut regions = Vec::new();
        for module_id in modules {
            let mut blocks = Vec::new();

            if let Some(mut indices) = declarations.remove(module_id) {
                indices.sort_unstable();
                indices.dedup_by_key(|(index, _)| *index);
                let module = self.graph.module(module_id);
                for (index, id) in indices {
                    let Some(declaration) = module.and_then(|m| m.declarations.get(index)) else {
                        continue;
                    };
                    let text = rewriter.render(module_id, index)?;
                    let with_doc = declaration.doc.is_some() && documented.insert(id);
                    blocks.push(format_declaration(declaration, &text, with_doc));
                }
            }

            if let Some(ids) = namespaces.remove(module_id) {
                for id in ids {
                    blocks.push(namespace::synthesize(
                        rewriter,
                        self.reachable,
                        id,
                        module_id,
                    )?);
                }
            }

            if !blocks.is_empty() {
                regions.push(Region {
                    module: module_id.clone(),
                    blocks,
                });
            }
        }

        Ok(regions)
    }

    fn wrap_region(&self, region: &Region) -> String {
        let body = region.blocks.join("\n");
        if self.options.region_markers {
            format!(
                "//#region {path}\n{body}\n//#endregion {path}",
                path = region.module
            )
        } else {
            body
        }
    }

    /// Directives of modules that contribute to the chunk, deduplicated by
    /// literal text.
    fn directives(&self, regions: &[Region]) -> Vec<String> {
        let mut seen: FxIndexSet<&str> = FxIndexSet::default();
        for region in regions {
            if let Some(module) = self.graph.module(&region.module) {
                seen.extend(module.directives.iter().map(|d| d.trim()));
            }
        }
        seen.into_iter().map(str::to_string).collect()
    }

    /// External symbols referenced by the chunk's declarations or exports.
    fn external_imports(&self, rewriter: &Rewriter<'_>, chunk: &ChunkSpec) -> Result<Vec<String>> {
        let symbols = self.graph.symbols();

        let mut needed: FxHashSet<SymbolId> = FxHashSet::default();
        for id in &chunk.symbols {
            needed.extend(self.reachable.references(*id).iter().copied());
        }
        needed.extend(chunk.exports.iter().map(|export| export.target));

        let mut externals: Vec<SymbolId> = needed
            .into_iter()
            .filter(|id| symbols.get(*id).is_some_and(|s| s.is_external()))
            .collect();
        externals.sort_unstable();

        let mut groups: FxIndexMap<&str, ExternalGroup> = FxIndexMap::default();
        for id in externals {
            let Some(SymbolOrigin::External {
                specifier,
                imported,
            }) = symbols.get(id).map(|symbol| &symbol.origin)
            else {
                continue;
            };
            let local = self.name_of(rewriter, id)?;
            let group = groups.entry(specifier.as_str()).or_default();
            match imported {
                ImportedName::Namespace => group.namespaces.push(local),
                ImportedName::Default => group.defaults.push(local),
                ImportedName::Named(name) if *name == local => group.named.push(local),
                ImportedName::Named(name) => group.named.push(format!("{name} as {local}")),
            }
        }

        let mut lines = Vec::new();
        for (specifier, group) in groups {
            for local in group.namespaces {
                lines.push(format!("import * as {local} from \"{specifier}\";"));
            }
            for local in group.defaults {
                lines.push(format!("import {local} from \"{specifier}\";"));
            }
            if !group.named.is_empty() {
                lines.push(format!(
                    "import {{ {} }} from \"{specifier}\";",
                    group.named.join(", ")
                ));
            }
        }
        Ok(lines)
    }

    fn export_statement(&self, rewriter: &Rewriter<'_>, chunk: &ChunkSpec) -> Result<String> {
        let mut specifiers = Vec::with_capacity(chunk.exports.len());
        for export in &chunk.exports {
            let local = self.name_of(rewriter, export.target)?;
            let mut specifier = if local == export.exported {
                local
            } else {
                format!("{local} as {}", export.exported)
            };
            if export.is_type_only {
                specifier.insert_str(0, "type ");
            }
            specifiers.push(specifier);
        }

        let mut lines = Vec::new();
        if !specifiers.is_empty() {
            lines.push(format!("export {{ {} }};", specifiers.join(", ")));
        }
        for specifier in &chunk.external_stars {
            lines.push(format!("export * from \"{specifier}\";"));
        }
        if lines.is_empty() {
            lines.push("export {};".to_string());
        }
        Ok(lines.join("\n"))
    }

    fn name_of(&self, rewriter: &Rewriter<'_>, id: SymbolId) -> Result<String> {
        let owner = self
            .graph
            .symbols()
            .get(id)
            .and_then(|symbol| symbol.module().or_else(|| symbol.namespace_target()))
            .or_else(|| self.graph.entries().first());
        match owner {
            Some(module) => rewriter.final_name(id, module).map(str::to_string),
            None => Ok(self.renames.get(id).unwrap_or_default().to_string()),
        }
    }
}

struct Region {
    module: ModuleId,
    blocks: Vec<String>,
}

#[derive(Default)]
struct ExternalGroup {
    namespaces: Vec<String>,
    defaults: Vec<String>,
    named: Vec<String>,
}

/// Strip export modifiers, add `declare` where a top-level declaration needs
/// it, and prepend the documentation comment when `with_doc` is set.
fn format_declaration(declaration: &Declaration, text: &str, with_doc: bool) -> String {
    let mut statement = text.trim();
    for prefix in ["export default ", "export "] {
        if let Some(rest) = statement.strip_prefix(prefix) {
            statement = rest.trim_start();
            break;
        }
    }

    let mut out = String::new();
    if let Some(doc) = declaration.doc.as_ref().filter(|_| with_doc) {
        out.push_str(doc.trim_end());
        out.push('\n');
    }
    if declaration.kind.needs_declare_keyword() && !statement.starts_with("declare ") {
        out.push_str("declare ");
    }
    out.push_str(statement);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeclarationKind;

    #[test]
    fn test_format_declaration_adds_declare() {
        let decl = Declaration::builder(DeclarationKind::Class, Some("Foo")).build();
        assert_eq!(format_declaration(&decl, "class Foo {}", true), "declare class Foo {}");
        assert_eq!(
            format_declaration(&decl, "export declare class Foo {}", true),
            "declare class Foo {}"
        );
    }

    #[test]
    fn test_format_declaration_keeps_interfaces_and_doc() {
        let decl = Declaration::builder(DeclarationKind::Interface, Some("Props"))
            .doc("/** Props. */")
            .build();
        assert_eq!(
            format_declaration(&decl, "export interface Props {}", true),
            "/** Props. */\ninterface Props {}"
        );
    }

    #[test]
    fn test_format_declaration_can_drop_doc() {
        let decl = Declaration::builder(DeclarationKind::Namespace, Some("Props"))
            .doc("/** Props. */")
            .build();
        assert_eq!(
            format_declaration(&decl, "namespace Props {}", false),
            "declare namespace Props {}"
        );
    }

    #[test]
    fn test_format_declaration_anonymous_default() {
        let decl = Declaration::builder(DeclarationKind::Function, None).build();
        assert_eq!(
            format_declaration(&decl, "export default function button_default(): void;", true),
            "declare function button_default(): void;"
        );
    }

    #[test]
    fn test_format_declaration_global_augmentation() {
        let decl =
            Declaration::builder(DeclarationKind::ModuleAugmentation, Some("global")).build();
        assert_eq!(
            format_declaration(&decl, "global { interface Window { app: string } }", true),
            "declare global { interface Window { app: string } }"
        );
    }
}
