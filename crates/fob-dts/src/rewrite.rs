//! Reference rewriting.
//!
//! Only the name slot and the reference slots of a declaration change; every
//! other character of the declaration text is copied through untouched.

use crate::graph::ModuleGraph;
use crate::link::Binding;
use crate::reachability::{DeclKey, ReachableSet};
use crate::{Error, ModuleId, RenameMap, Result, Segment, SymbolId};

pub struct Rewriter<'a> {
    graph: &'a ModuleGraph,
    reachable: &'a ReachableSet,
    renames: &'a RenameMap,
}

impl<'a> Rewriter<'a> {
    pub fn new(graph: &'a ModuleGraph, reachable: &'a ReachableSet, renames: &'a RenameMap) -> Self {
        Self {
            graph,
            reachable,
            renames,
        }
    }

    /// Final name of a symbol; a retained symbol without one is a dangling
    /// reference.
    pub fn final_name(&self, id: SymbolId, module: &ModuleId) -> Result<&'a str> {
        self.renames.get(id).ok_or_else(|| Error::DanglingReference {
            name: self
                .graph
                .symbols()
                .get(id)
                .map_or_else(|| format!("#{}", id.index()), |symbol| symbol.name.clone()),
            module: module.clone(),
        })
    }

    /// Render one declaration with every slot substituted.
    pub fn render(&self, module_id: &ModuleId, index: usize) -> Result<String> {
        let declaration = self
            .graph
            .module(module_id)
            .and_then(|module| module.declarations.get(index))
            .ok_or_else(|| Error::DanglingReference {
                name: format!("declaration #{index}"),
                module: module_id.clone(),
            })?;

        let key = DeclKey {
            module: module_id.clone(),
            index,
        };
        let bindings = self
            .reachable
            .links(&key)
            .ok_or_else(|| Error::DanglingReference {
                name: declaration.binding_key(),
                module: module_id.clone(),
            })?;

        let mut out = String::new();
        let mut references = bindings.iter();

        for segment in &declaration.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Name if declaration.is_ambient() => {
                    out.push_str(declaration.name.as_deref().unwrap_or("global"));
                }
                Segment::Name => {
                    let owner = self
                        .graph
                        .symbols()
                        .declared(module_id, &declaration.binding_key())
                        .ok_or_else(|| Error::DanglingReference {
                            name: declaration.binding_key(),
                            module: module_id.clone(),
                        })?;
                    out.push_str(self.final_name(owner, module_id)?);
                }
                Segment::Ref(reference) => {
                    let binding = references.next().ok_or_else(|| Error::DanglingReference {
                        name: reference.name.clone(),
                        module: module_id.clone(),
                    })?;
                    let root = match binding {
                        Binding::Symbol(target) => self.final_name(*target, module_id)?,
                        Binding::Global => reference.name.as_str(),
                    };
                    out.push_str(&reference.render_with(root));
                }
            }
        }

        Ok(out)
    }
}
