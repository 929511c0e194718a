use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Declaration, Export, Import, ModuleId};

/// Parsed declaration module handed over by the front end.
///
/// Heavy collections are wrapped in Arc so modules can be shared between the
/// graph and the per-entry analysis threads without copying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationModule {
    pub id: ModuleId,
    /// Top-level declarations in source order.
    #[serde(with = "arc_vec_serde")]
    pub declarations: Arc<Vec<Declaration>>,
    #[serde(with = "arc_vec_serde")]
    pub imports: Arc<Vec<Import>>,
    #[serde(with = "arc_vec_serde")]
    pub exports: Arc<Vec<Export>>,
    /// Triple-slash directives (`/// <reference types="node" />`), verbatim.
    #[serde(default)]
    pub directives: Vec<String>,
}

// Serde helper for Arc<Vec<T>>
mod arc_vec_serde {
    use super::*;
    use serde::de::Deserializer;
    use serde::ser::Serializer;

    pub fn serialize<S, T>(value: &Arc<Vec<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        value.as_ref().serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Arc<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Vec::deserialize(deserializer).map(Arc::new)
    }
}

impl DeclarationModule {
    pub fn builder(id: ModuleId) -> DeclarationModuleBuilder {
        DeclarationModuleBuilder {
            module: Self {
                id,
                declarations: Arc::new(Vec::new()),
                imports: Arc::new(Vec::new()),
                exports: Arc::new(Vec::new()),
                directives: Vec::new(),
            },
        }
    }

    /// Module specifiers in edge order: import statements first, then
    /// `export ... from` statements, each in source order, without duplicates.
    pub fn specifiers(&self) -> Vec<&str> {
        let mut specifiers: Vec<&str> = Vec::new();
        let from_imports = self.imports.iter().map(|import| import.source.as_str());
        let from_exports = self
            .exports
            .iter()
            .filter_map(|export| export.re_exported_from.as_deref());

        for specifier in from_imports.chain(from_exports) {
            if !specifiers.contains(&specifier) {
                specifiers.push(specifier);
            }
        }
        specifiers
    }

    /// Index of the first declaration registered under `key`.
    pub fn declaration_index(&self, key: &str) -> Option<usize> {
        self.declarations
            .iter()
            .position(|decl| decl.binding_key() == key)
    }

    /// All declaration indices registered under `key` (merged declarations
    /// such as interface + namespace share a binding).
    pub fn declaration_indices(&self, key: &str) -> Vec<usize> {
        self.declarations
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.binding_key() == key)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn exports_iter(&self) -> impl Iterator<Item = &Export> {
        self.exports.iter()
    }

    pub fn imports_iter(&self) -> impl Iterator<Item = &Import> {
        self.imports.iter()
    }

    /// Check if this module imports from a specific source specifier.
    pub fn has_import_from(&self, source: &str) -> bool {
        self.imports.iter().any(|imp| imp.source == source)
    }

    pub fn has_star_exports(&self) -> bool {
        self.exports.iter().any(Export::is_star_re_export)
    }
}

/// Builder for `DeclarationModule` to avoid long argument lists in constructors.
pub struct DeclarationModuleBuilder {
    module: DeclarationModule,
}

impl DeclarationModuleBuilder {
    pub fn declarations(mut self, declarations: Vec<Declaration>) -> Self {
        self.module.declarations = Arc::new(declarations);
        self
    }

    pub fn declaration(mut self, declaration: Declaration) -> Self {
        Arc::make_mut(&mut self.module.declarations).push(declaration);
        self
    }

    pub fn imports(mut self, imports: Vec<Import>) -> Self {
        self.module.imports = Arc::new(imports);
        self
    }

    pub fn import(mut self, import: Import) -> Self {
        Arc::make_mut(&mut self.module.imports).push(import);
        self
    }

    pub fn exports(mut self, exports: Vec<Export>) -> Self {
        self.module.exports = Arc::new(exports);
        self
    }

    pub fn export(mut self, export: Export) -> Self {
        Arc::make_mut(&mut self.module.exports).push(export);
        self
    }

    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.module.directives.push(directive.into());
        self
    }

    pub fn build(self) -> DeclarationModule {
        self.module
    }
}
