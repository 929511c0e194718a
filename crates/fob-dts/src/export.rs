use serde::{Deserialize, Serialize};

/// Export declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    /// `export { local as name }` or an exported declaration.
    Named,
    /// `export default local`, `export { local as default }` or an exported
    /// default declaration.
    Default,
    /// `export { imported as name } from './module'`
    ReExport,
    /// Star re-export: `export * from './module'`
    ///
    /// This re-exports all named exports from the source module.
    /// Unlike `ReExport`, this doesn't specify individual export names, and it
    /// never forwards `default`.
    StarReExport,
    /// Namespace re-export: `export * as name from './module'`
    NamespaceReExport,
}

/// One row of a module's export table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Export {
    /// External name (`*` for star re-exports).
    pub name: String,
    pub kind: ExportKind,
    /// Local binding for `Named`/`Default`; the imported name for `ReExport`.
    /// `None` on a `Default` export means the module's anonymous default
    /// declaration.
    pub local: Option<String>,
    pub is_type_only: bool,
    pub re_exported_from: Option<String>,
}

impl Export {
    /// `export { local as exported }`. Exporting as `default` produces a
    /// [`ExportKind::Default`] row.
    pub fn named(exported: impl Into<String>, local: impl Into<String>) -> Self {
        let name = exported.into();
        let kind = if name == "default" {
            ExportKind::Default
        } else {
            ExportKind::Named
        };
        Self {
            name,
            kind,
            local: Some(local.into()),
            is_type_only: false,
            re_exported_from: None,
        }
    }

    /// `export default local`.
    pub fn default_of(local: impl Into<String>) -> Self {
        Self::named("default", local)
    }

    /// `export default <anonymous declaration>`.
    pub fn anonymous_default() -> Self {
        Self {
            name: "default".to_string(),
            kind: ExportKind::Default,
            local: None,
            is_type_only: false,
            re_exported_from: None,
        }
    }

    /// `export { imported as exported } from 'source'`.
    pub fn re_export(
        exported: impl Into<String>,
        imported: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: exported.into(),
            kind: ExportKind::ReExport,
            local: Some(imported.into()),
            is_type_only: false,
            re_exported_from: Some(source.into()),
        }
    }

    /// `export * from 'source'`.
    pub fn star(source: impl Into<String>) -> Self {
        Self {
            name: "*".to_string(),
            kind: ExportKind::StarReExport,
            local: None,
            is_type_only: false,
            re_exported_from: Some(source.into()),
        }
    }

    /// `export * as alias from 'source'`.
    pub fn namespace(alias: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: alias.into(),
            kind: ExportKind::NamespaceReExport,
            local: None,
            is_type_only: false,
            re_exported_from: Some(source.into()),
        }
    }

    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        self
    }

    /// Convenience check for default exports.
    pub fn is_default(&self) -> bool {
        self.name == "default"
    }

    /// Returns true if the export re-exports from another module.
    pub fn is_re_export(&self) -> bool {
        matches!(
            self.kind,
            ExportKind::ReExport | ExportKind::StarReExport | ExportKind::NamespaceReExport
        )
    }

    /// Returns true if this is a star re-export (`export * from './module'`).
    pub fn is_star_re_export(&self) -> bool {
        matches!(self.kind, ExportKind::StarReExport)
    }

    /// Returns true if this row binds a single external name (everything except
    /// `export *`).
    pub fn binds_name(&self) -> bool {
        !self.is_star_re_export()
    }
}
