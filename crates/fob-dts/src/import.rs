use serde::{Deserialize, Serialize};

/// Which export of the source module an import binding refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportedName {
    Named(String),
    Default,
    /// `import * as ns` / `export * as ns`.
    Namespace,
}

impl ImportedName {
    /// Export name looked up in the source module; `None` for namespace imports.
    pub fn export_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Default => Some("default"),
            Self::Namespace => None,
        }
    }

    pub(crate) fn from_export_name(name: &str) -> Self {
        if name == "default" {
            Self::Default
        } else {
            Self::Named(name.to_string())
        }
    }
}

/// One local binding introduced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
    pub is_type_only: bool,
}

/// A raw import statement of a declaration module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Module specifier exactly as written.
    pub source: String,
    pub bindings: Vec<ImportBinding>,
    /// `import type { ... }`.
    pub is_type_only: bool,
}

impl Import {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            bindings: Vec::new(),
            is_type_only: false,
        }
    }

    /// `import { imported as local }`.
    pub fn named(mut self, imported: impl Into<String>, local: impl Into<String>) -> Self {
        self.bindings.push(ImportBinding {
            local: local.into(),
            imported: ImportedName::from_export_name(&imported.into()),
            is_type_only: false,
        });
        self
    }

    /// `import local from`.
    pub fn default_as(mut self, local: impl Into<String>) -> Self {
        self.bindings.push(ImportBinding {
            local: local.into(),
            imported: ImportedName::Default,
            is_type_only: false,
        });
        self
    }

    /// `import * as local from`.
    pub fn namespace_as(mut self, local: impl Into<String>) -> Self {
        self.bindings.push(ImportBinding {
            local: local.into(),
            imported: ImportedName::Namespace,
            is_type_only: false,
        });
        self
    }

    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        for binding in &mut self.bindings {
            binding.is_type_only = true;
        }
        self
    }

    pub fn binding(&self, local: &str) -> Option<&ImportBinding> {
        self.bindings.iter().find(|binding| binding.local == local)
    }

    /// Side-effect only import (`import "./polyfill"`).
    pub fn is_side_effect_only(&self) -> bool {
        self.bindings.is_empty()
    }
}
