//! Bundler configuration.
//!
//! Sources are layered lowest to highest: built-in defaults, a JSON/TOML/YAML
//! config file, then `FOB_DTS_*` environment variables.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format as _, Json, Serialized, Toml, Yaml};
use figment::value::Uncased;
use figment::Figment;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::module_id::strip_declaration_extension;
use crate::{EmitOptions, Error, ModuleId, Result};

/// Config files looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAMES: &[&str] = &["fob-dts.config.json", "fob-dts.toml", "fob-dts.yaml"];

const ENV_PREFIX: &str = "FOB_DTS_";

/// An entry point: either a bare path or a named path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Path(String),
    Named { name: String, path: String },
}

impl EntrySpec {
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Named { path, .. } => path,
        }
    }

    /// Output name; defaults to the file name without its declaration extension.
    pub fn name(&self) -> String {
        match self {
            Self::Named { name, .. } => name.clone(),
            Self::Path(path) => {
                let file_name = Path::new(path)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or(path);
                strip_declaration_extension(file_name).to_string()
            }
        }
    }
}

impl From<&str> for EntrySpec {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

/// A validated entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub id: ModuleId,
}

impl EntryPoint {
    /// Output file name relative to the output directory.
    pub fn file_name(&self) -> String {
        format!("{}.d.ts", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DtsBundleConfig {
    pub entries: Vec<EntrySpec>,
    pub out_dir: PathBuf,
    /// Split declarations reached by several entries into a shared chunk.
    pub chunking: bool,
    pub shared_chunk_name: String,
    pub region_markers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl Default for DtsBundleConfig {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            out_dir: PathBuf::from("dist"),
            chunking: false,
            shared_chunk_name: "shared".to_string(),
            region_markers: true,
            banner: None,
        }
    }
}

impl DtsBundleConfig {
    pub fn new<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntrySpec>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn chunking(mut self, enabled: bool) -> Self {
        self.chunking = enabled;
        self
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn shared_chunk_name(mut self, name: impl Into<String>) -> Self {
        self.shared_chunk_name = name.into();
        self
    }

    pub fn region_markers(mut self, enabled: bool) -> Self {
        self.region_markers = enabled;
        self
    }

    pub fn banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Load configuration from defaults, a config file and the environment.
    ///
    /// Without an explicit path the first of [`CONFIG_FILE_NAMES`] present in
    /// the working directory is used, if any.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(Error::InvalidConfig(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => CONFIG_FILE_NAMES
                .iter()
                .map(Path::new)
                .find(|path| path.exists())
                .map(Path::to_path_buf),
        };

        if let Some(path) = config_file {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Json::file(path)),
            };
        }

        // FOB_DTS_OUT_DIR, FOB_DTS_CHUNKING, FOB_DTS_SHARED_CHUNK_NAME, ...
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .map(|key| Uncased::from(env_key_to_field(key.as_str()))),
        );

        figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            banner: self.banner.clone(),
            region_markers: self.region_markers,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.entry_points().map(|_| ())
    }

    /// Validated entry points in configuration order.
    pub fn entry_points(&self) -> Result<Vec<EntryPoint>> {
        if self.entries.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one entry is required".to_string(),
            ));
        }
        validate_chunk_name(&self.shared_chunk_name, "shared chunk name")?;

        let mut names = FxHashSet::default();
        let mut points = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.path().trim().is_empty() {
                return Err(Error::InvalidConfig("entry path is empty".to_string()));
            }
            let name = entry.name();
            validate_entry_name(&name)?;
            if !names.insert(name.clone()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate entry name '{name}'; give one of the entries an explicit name"
                )));
            }
            if self.chunking && name == self.shared_chunk_name {
                return Err(Error::InvalidConfig(format!(
                    "entry name '{name}' clashes with the shared chunk name"
                )));
            }
            points.push(EntryPoint {
                name,
                id: ModuleId::new(entry.path())?,
            });
        }
        Ok(points)
    }
}

/// `SHARED_CHUNK_NAME` -> `sharedChunkName`.
fn env_key_to_field(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch.to_ascii_lowercase());
        }
    }
    out
}

fn validate_chunk_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidConfig(format!("{what} is empty")));
    }
    if name.contains(['/', '\\']) || name.contains("..") || name.contains('\0') {
        return Err(Error::InvalidConfig(format!(
            "{what} '{name}' must be a plain file name"
        )));
    }
    Ok(())
}

/// Entry names may contain subdirectories but never leave the output directory.
fn validate_entry_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidConfig("entry name is empty".to_string()));
    }
    let escapes = name.starts_with('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if escapes {
        return Err(Error::InvalidConfig(format!(
            "entry name '{name}' must be a relative path inside the output directory"
        )));
    }
    Ok(())
}
