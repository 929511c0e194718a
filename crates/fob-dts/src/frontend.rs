//! Seam between the bundler core and the type-checking front end.
//!
//! The core never reads files or parses TypeScript. Everything it knows about a
//! module comes through [`FrontEnd`]: the parsed [`DeclarationModule`], how a
//! specifier resolves, and (as a fallback) where an otherwise unbound identifier
//! points.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::module_id::DECLARATION_EXTENSIONS;
use crate::{DeclarationModule, ModuleId};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrontEndError {
    #[error("module '{0}' not found")]
    NotFound(ModuleId),

    #[error("failed to parse '{module}': {message}")]
    Parse { module: ModuleId, message: String },

    #[error("invalid module fixture: {0}")]
    InvalidFixture(String),
}

/// Outcome of resolving a module specifier from an importing module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Resolves to a declaration module inside the package.
    Internal(ModuleId),
    /// Outside the package; the import is preserved in the output.
    External,
    /// Looks internal but resolves to nothing.
    Unresolved,
}

/// Declared symbol addressed by module and local binding name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolKey {
    pub module: ModuleId,
    pub name: String,
}

/// Where the front end says an unbound identifier points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    /// Built-in or ambient global (`Promise`, `HTMLElement`, ...).
    Global,
    Symbol(SymbolKey),
}

/// Everything the bundler needs from the TypeScript compiler.
pub trait FrontEnd: Send + Sync {
    fn parse_module(&self, id: &ModuleId) -> Result<DeclarationModule, FrontEndError>;

    fn resolve_specifier(&self, from: &ModuleId, specifier: &str) -> Resolution;

    /// Fallback for identifiers that are neither declared nor imported in
    /// `from`. Returning `None` makes the reference an unresolved-symbol error.
    fn resolve_reference(&self, _from: &ModuleId, _name: &str) -> Option<ReferenceTarget> {
        None
    }
}

/// Specifiers that can only ever refer to package-internal modules.
pub(crate) fn is_internal_specifier(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with('/') || specifier.starts_with('#')
}

const JS_TO_DECLARATION: &[(&str, &str)] =
    &[(".js", ".d.ts"), (".mjs", ".d.mts"), (".cjs", ".d.cts")];

/// In-memory front end over pre-parsed modules.
///
/// Resolution of relative specifiers follows declaration-file conventions: the
/// exact path, `.js` extensions swapped for their declaration counterparts, a
/// declaration extension appended, and finally `<dir>/index.d.ts`.
#[derive(Debug, Default, Clone)]
pub struct StaticFrontEnd {
    modules: FxHashMap<ModuleId, DeclarationModule>,
    aliases: FxHashMap<String, ModuleId>,
    globals: FxHashSet<String>,
}

#[derive(Deserialize)]
struct Fixture {
    modules: Vec<DeclarationModule>,
    #[serde(default)]
    aliases: FxHashMap<String, ModuleId>,
    #[serde(default)]
    globals: Vec<String>,
}

impl StaticFrontEnd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture of the form
    /// `{ "modules": [...], "aliases": {...}, "globals": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, FrontEndError> {
        let fixture: Fixture = serde_json::from_str(json)
            .map_err(|err| FrontEndError::InvalidFixture(err.to_string()))?;

        let mut frontend = Self::new();
        for module in fixture.modules {
            frontend.insert(module);
        }
        frontend.aliases = fixture.aliases;
        frontend.globals.extend(fixture.globals);
        Ok(frontend)
    }

    pub fn insert(&mut self, module: DeclarationModule) {
        self.modules.insert(module.id.clone(), module);
    }

    pub fn with_module(mut self, module: DeclarationModule) -> Self {
        self.insert(module);
        self
    }

    /// Map a bare or `#` specifier onto a package-internal module.
    pub fn with_alias(mut self, specifier: impl Into<String>, target: ModuleId) -> Self {
        self.aliases.insert(specifier.into(), target);
        self
    }

    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.insert(name.into());
        self
    }

    pub fn module(&self, id: &ModuleId) -> Option<&DeclarationModule> {
        self.modules.get(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn lookup(&self, path: &str) -> Option<ModuleId> {
        let id = ModuleId::new(path).ok()?;
        self.modules.contains_key(&id).then_some(id)
    }

    fn resolve_path(&self, base: &str) -> Option<ModuleId> {
        if let Some(id) = self.lookup(base) {
            return Some(id);
        }

        let swapped = JS_TO_DECLARATION.iter().find_map(|(js, dts)| {
            base.strip_suffix(js)
                .and_then(|stem| self.lookup(&format!("{stem}{dts}")))
        });
        if swapped.is_some() {
            return swapped;
        }

        DECLARATION_EXTENSIONS
            .iter()
            .map(|ext| format!("{base}{ext}"))
            .chain(["/index.d.ts", "/index.d.mts", "/index.ts"].map(|index| format!("{base}{index}")))
            .find_map(|candidate| self.lookup(&candidate))
    }
}

impl FrontEnd for StaticFrontEnd {
    fn parse_module(&self, id: &ModuleId) -> Result<DeclarationModule, FrontEndError> {
        self.modules
            .get(id)
            .cloned()
            .ok_or_else(|| FrontEndError::NotFound(id.clone()))
    }

    fn resolve_specifier(&self, from: &ModuleId, specifier: &str) -> Resolution {
        if let Some(target) = self.aliases.get(specifier) {
            return Resolution::Internal(target.clone());
        }

        if !is_internal_specifier(specifier) {
            return Resolution::External;
        }

        let base = if specifier.starts_with('.') {
            from.parent_dir().join(specifier)
        } else {
            Path::new(specifier).to_path_buf()
        };

        match base.to_str().and_then(|base| self.resolve_path(base)) {
            Some(id) => Resolution::Internal(id),
            None => Resolution::Unresolved,
        }
    }

    fn resolve_reference(&self, _from: &ModuleId, name: &str) -> Option<ReferenceTarget> {
        self.globals
            .contains(name)
            .then_some(ReferenceTarget::Global)
    }
}
