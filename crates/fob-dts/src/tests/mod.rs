//! Cross-stage unit tests over small in-memory graphs.


use crate::{
    Declaration, DeclarationKind, DeclarationModule, DeclarationModuleBuilder, ModuleGraph,
    ModuleId, StaticFrontEnd, SymbolId,
};

pub(crate) fn id(path: &str) -> ModuleId {
    ModuleId::new(path).unwrap()
}

pub(crate) fn module(path: &str) -> DeclarationModuleBuilder {
    DeclarationModule::builder(id(path))
}

pub(crate) fn interface(name: &str, template: &str) -> Declaration {
    Declaration::from_template(DeclarationKind::Interface, Some(name), template).unwrap()
}

pub(crate) fn global(template: &str) -> Declaration {
    Declaration::from_template(DeclarationKind::ModuleAugmentation, Some("global"), template)
        .unwrap()
}

pub(crate) fn frontend(modules: Vec<DeclarationModule>) -> StaticFrontEnd {
    modules
        .into_iter()
        .fold(StaticFrontEnd::new(), StaticFrontEnd::with_module)
}

pub(crate) fn build(frontend: &StaticFrontEnd, entries: &[&str]) -> ModuleGraph {
    let entries: Vec<ModuleId> = entries.iter().map(|entry| id(entry)).collect();
    ModuleGraph::build(frontend, &entries)
}

/// Declared symbol `name` of `module`.
pub(crate) fn declared(graph: &ModuleGraph, module: &str, name: &str) -> SymbolId {
    graph.symbols().declared(&id(module), name).unwrap()
}
