//! Shared test utilities for fob-dts integration tests
//!
//! Builders for in-memory declaration modules so each test reads as the
//! module graph it describes.

#![allow(dead_code)]

use fob_dts::{
    BundleOutput, Declaration, DeclarationKind, DeclarationModule, DeclarationModuleBuilder,
    DtsBundleConfig, DtsBundler, ModuleId, StaticFrontEnd,
};

pub fn id(path: &str) -> ModuleId {
    ModuleId::new(path).expect("valid module id")
}

/// Start a module at `path`.
pub fn module(path: &str) -> DeclarationModuleBuilder {
    DeclarationModule::builder(id(path))
}

pub fn decl(kind: DeclarationKind, name: &str, template: &str) -> Declaration {
    Declaration::from_template(kind, Some(name), template).expect("valid template")
}

pub fn interface(name: &str, template: &str) -> Declaration {
    decl(DeclarationKind::Interface, name, template)
}

pub fn type_alias(name: &str, template: &str) -> Declaration {
    decl(DeclarationKind::TypeAlias, name, template)
}

pub fn global(template: &str) -> Declaration {
    decl(DeclarationKind::ModuleAugmentation, "global", template)
}

pub fn frontend(modules: Vec<DeclarationModule>) -> StaticFrontEnd {
    modules
        .into_iter()
        .fold(StaticFrontEnd::new(), |frontend, module| {
            frontend.with_module(module)
        })
}

/// Bundle `entries` one output per entry.
pub fn bundle(frontend: &StaticFrontEnd, entries: &[&str]) -> BundleOutput {
    bundle_with(frontend, DtsBundleConfig::new(entries.iter().copied()))
}

/// Bundle `entries` with a shared chunk.
pub fn bundle_chunked(frontend: &StaticFrontEnd, entries: &[&str]) -> BundleOutput {
    bundle_with(
        frontend,
        DtsBundleConfig::new(entries.iter().copied()).chunking(true),
    )
}

pub fn bundle_with(frontend: &StaticFrontEnd, config: DtsBundleConfig) -> BundleOutput {
    DtsBundler::new(config)
        .expect("valid config")
        .bundle(frontend)
}

/// Code of the chunk written for `file_name`.
pub fn code<'a>(output: &'a BundleOutput, file_name: &str) -> &'a str {
    &output
        .chunk(file_name)
        .unwrap_or_else(|| panic!("no chunk named {file_name}"))
        .code
}
