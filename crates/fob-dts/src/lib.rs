#![cfg_attr(docsrs, feature(doc_cfg))]
//! # fob-dts
//!
//! Merges per-module TypeScript declaration artifacts into bundled declaration
//! files: one self-contained `.d.ts` per entry, or entry files plus a shared
//! chunk when several entries reach the same declarations.
//!
//! The pipeline runs in fixed stages over one immutable module graph:
//! graph construction, per-entry reachability, collision resolution, reference
//! rewriting, namespace synthesis, chunk planning and emission. Parsing and
//! type-level name resolution belong to a [`FrontEnd`]; [`StaticFrontEnd`]
//! serves pre-built modules from memory.
//!
//! ## Quick Start
//!
//! ```
//! use fob_dts::{
//!     Declaration, DeclarationKind, DeclarationModule, DtsBundleConfig, DtsBundler, Export,
//!     Import, ModuleId, StaticFrontEnd,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let b = DeclarationModule::builder(ModuleId::new("src/b.d.ts")?)
//!     .declaration(Declaration::from_template(
//!         DeclarationKind::Interface,
//!         Some("Bar"),
//!         "interface % { id: string; }",
//!     )?)
//!     .export(Export::named("Bar", "Bar"))
//!     .build();
//! let a = DeclarationModule::builder(ModuleId::new("src/a.d.ts")?)
//!     .import(Import::new("./b").named("Bar", "Bar"))
//!     .declaration(Declaration::from_template(
//!         DeclarationKind::Interface,
//!         Some("Foo"),
//!         "interface % { bar: @Bar; }",
//!     )?)
//!     .export(Export::named("Foo", "Foo"))
//!     .build();
//!
//! let frontend = StaticFrontEnd::new().with_module(a).with_module(b);
//! let output = DtsBundler::new(DtsBundleConfig::new(["src/a.d.ts"]))?
//!     .bundle(&frontend)
//!     .into_result()?;
//!
//! let code = &output.chunks[0].code;
//! assert!(code.contains("interface Foo { bar: Bar; }"));
//! assert!(code.ends_with("export { Foo };\n"));
//! # Ok(())
//! # }
//! ```

pub mod bundler;
pub mod chunk;
pub mod config;
pub mod declaration;
pub mod emit;
pub mod export;
pub mod frontend;
pub mod graph;
pub mod import;
pub mod link;
pub mod module;
pub mod module_id;
pub mod namespace;
pub mod output;
pub mod reachability;
pub mod rename;
pub mod rewrite;
pub mod symbol;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

#[cfg(test)]
mod tests;

pub use bundler::DtsBundler;
pub use chunk::{ChunkPlan, ChunkPlanner, EntryPlan};
pub use config::{DtsBundleConfig, EntryPoint, EntrySpec};
pub use declaration::{
    Declaration, DeclarationBuilder, DeclarationKind, Reference, ReferenceKind, Segment,
    TemplateError,
};
pub use emit::{ChunkSpec, EmitOptions, Emitter, ExportSpec, SharedImport};
pub use export::{Export, ExportKind};
pub use frontend::{
    FrontEnd, FrontEndError, ReferenceTarget, Resolution, StaticFrontEnd, SymbolKey,
};
pub use graph::{
    ExternalDependency, GraphStatistics, ModuleCycle, ModuleEdge, ModuleGraph,
};
pub use import::{Import, ImportBinding, ImportedName};
pub use link::{Binding, Linker};
pub use module::{DeclarationModule, DeclarationModuleBuilder};
pub use module_id::{ModuleId, ModuleIdError};
pub use output::{BundleOutput, ChunkKind, EntryFailure, OutputChunk, OutputManifest};
pub use reachability::{ExportManifest, ManifestEntry, ReachableSet, Reachability};
pub use rename::{CollisionResolver, RenameExhausted, RenameMap};
pub use rewrite::Rewriter;
pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolOrigin, SymbolStatistics, SymbolTable};

/// Insertion-ordered map with the Fx hasher. Iteration order is part of the
/// output, so ordered maps are used wherever a map is iterated.
pub(crate) type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
pub(crate) type FxIndexSet<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;

/// Error types for fob-dts operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A specifier could not be mapped to a bundled or external module.
    #[error("Unresolved module '{specifier}'{}", imported_from(.importer))]
    UnresolvedModule {
        specifier: String,
        importer: Option<ModuleId>,
    },

    /// A reference points at a name nothing declares.
    #[error("Unresolved symbol '{name}' in '{module}'{}", used_by(.declaration))]
    UnresolvedSymbol {
        name: String,
        module: ModuleId,
        declaration: Option<String>,
    },

    #[error("Rename exhausted: {0}")]
    RenameExhausted(#[from] RenameExhausted),

    /// A retained declaration referenced a symbol without a final name.
    #[error("Dangling reference to '{name}' in '{module}'")]
    DanglingReference { name: String, module: ModuleId },

    /// The shared chunk failed, taking down every entry importing from it.
    #[error("Shared chunk failed: {0}")]
    SharedChunk(String),

    #[error("Front end error: {0}")]
    FrontEnd(#[from] FrontEndError),

    #[error("Invalid declaration template: {0}")]
    Template(#[from] TemplateError),

    #[error("Invalid module id: {0}")]
    ModuleId(#[from] ModuleIdError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Output file already exists and overwrite is disabled.
    #[error("Output exists: {0}")]
    OutputExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more entries failed; the rest may have produced output.
    #[error("{} of the requested entries failed: {}", .0.len(), format_failures(.0))]
    EntriesFailed(Vec<EntryFailure>),
}

/// Result type alias for fob-dts operations.
pub type Result<T> = std::result::Result<T, Error>;

fn imported_from(importer: &Option<ModuleId>) -> String {
    importer
        .as_ref()
        .map(|importer| format!(" imported from '{importer}'"))
        .unwrap_or_default()
}

fn used_by(declaration: &Option<String>) -> String {
    declaration
        .as_ref()
        .map(|declaration| format!(" (referenced by '{declaration}')"))
        .unwrap_or_default()
}

fn format_failures(failures: &[EntryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::UnresolvedModule { .. } => "UNRESOLVED_MODULE",
            Error::UnresolvedSymbol { .. } => "UNRESOLVED_SYMBOL",
            Error::RenameExhausted(_) => "RENAME_EXHAUSTED",
            Error::DanglingReference { .. } => "DANGLING_REFERENCE",
            Error::SharedChunk(_) => "SHARED_CHUNK",
            Error::FrontEnd(_) => "FRONT_END_ERROR",
            Error::Template(_) => "INVALID_TEMPLATE",
            Error::ModuleId(_) => "INVALID_MODULE_ID",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::OutputExists(_) => "OUTPUT_EXISTS",
            Error::Io(_) => "IO_ERROR",
            Error::EntriesFailed(_) => "ENTRIES_FAILED",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::UnresolvedModule { specifier, .. } => Some(Box::new(format!(
                "Check that '{}' points at a declaration file the front end knows about, or register it as an alias.",
                specifier
            ))),
            Error::UnresolvedSymbol { name, .. } => Some(Box::new(format!(
                "'{}' is neither declared, imported nor a known global. Import it or add it to the front end's globals.",
                name
            ))),
            Error::RenameExhausted(exhausted) => Some(Box::new(format!(
                "More than {} symbols are named '{}'. Raise the suffix limit or rename some of them at the source.",
                exhausted.limit, exhausted.name
            ))),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for syntax errors.\nError: {}",
                msg
            ))),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it's within the output directory and doesn't contain '..' components.",
                path
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            Error::OutputExists(msg) => Some(Box::new(format!(
                "Output file already exists: {}\nUse write_to_force to replace existing files.",
                msg
            ))),
            Error::EntriesFailed(failures) if failures.len() > 1 => Some(Box::new(
                "Multiple entries failed. Each failure is listed above.".to_string(),
            )),
            _ => None,
        }
    }
}
