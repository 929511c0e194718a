use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a [`ModuleId`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModuleIdError {
    #[error("module path is empty")]
    Empty,

    #[error("module path '{0}' is not valid UTF-8")]
    NonUtf8(String),
}

/// Stable identity of a declaration module.
///
/// The path is cleaned (`.` and `..` resolved) and always uses `/` separators so
/// the same file reached through different specifiers maps to one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ModuleIdError> {
        let raw = path.as_ref();
        if raw.as_os_str().is_empty() {
            return Err(ModuleIdError::Empty);
        }

        let cleaned = raw.clean();
        let text = cleaned
            .to_str()
            .ok_or_else(|| ModuleIdError::NonUtf8(cleaned.display().to_string()))?
            .replace('\\', "/");

        if text.is_empty() || text == "." {
            return Err(ModuleIdError::Empty);
        }

        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    /// Directory containing the module, used as the base for relative specifiers.
    pub fn parent_dir(&self) -> PathBuf {
        self.as_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// File name with any declaration or source extension removed.
    ///
    /// `src/button.d.ts` yields `button`; `src/index.d.mts` yields `index`.
    pub fn stem(&self) -> &str {
        let file_name = self
            .as_path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(self.as_str());
        strip_declaration_extension(file_name)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extensions recognized as declaration or TypeScript sources, longest first.
pub(crate) const DECLARATION_EXTENSIONS: &[&str] = &[
    ".d.ts", ".d.mts", ".d.cts", ".tsx", ".mts", ".cts", ".ts",
];

pub(crate) fn strip_declaration_extension(file_name: &str) -> &str {
    DECLARATION_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name)
}
