//! Bundling results: rendered chunks, the entry manifest and per-entry failures.

pub mod writer;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, FxIndexMap, ModuleId, Result};

/// Role of an output chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChunkKind {
    Entry { entry: ModuleId },
    Shared,
}

/// One rendered declaration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputChunk {
    /// Path relative to the output directory.
    pub file_name: String,
    pub code: String,
    pub kind: ChunkKind,
    /// Names listed in the chunk's export statement.
    pub exports: Vec<String>,
}

impl OutputChunk {
    pub fn is_entry(&self) -> bool {
        matches!(self.kind, ChunkKind::Entry { .. })
    }
}

/// Entry specifier -> output files, entry file first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputManifest {
    entries: FxIndexMap<String, Vec<String>>,
}

impl OutputManifest {
    pub(crate) fn insert(&mut self, entry: &ModuleId, files: Vec<String>) {
        self.entries.insert(entry.to_string(), files);
    }

    pub fn files(&self, entry: &str) -> Option<&[String]> {
        self.entries.get(entry).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(entry, files)| (entry.as_str(), files.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// An entry that produced no output.
#[derive(Debug)]
pub struct EntryFailure {
    pub entry: ModuleId,
    pub error: Error,
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.entry, self.error)
    }
}

/// Everything one bundling run produced.
#[derive(Debug, Default)]
pub struct BundleOutput {
    pub chunks: Vec<OutputChunk>,
    pub manifest: OutputManifest,
    pub failures: Vec<EntryFailure>,
}

impl BundleOutput {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn chunk(&self, file_name: &str) -> Option<&OutputChunk> {
        self.chunks.iter().find(|chunk| chunk.file_name == file_name)
    }

    /// Output chunk of one entry.
    pub fn entry_chunk(&self, entry: &ModuleId) -> Option<&OutputChunk> {
        self.chunks
            .iter()
            .find(|chunk| matches!(&chunk.kind, ChunkKind::Entry { entry: e } if e == entry))
    }

    pub fn shared_chunk(&self) -> Option<&OutputChunk> {
        self.chunks
            .iter()
            .find(|chunk| chunk.kind == ChunkKind::Shared)
    }

    pub fn failure(&self, entry: &ModuleId) -> Option<&Error> {
        self.failures
            .iter()
            .find(|failure| &failure.entry == entry)
            .map(|failure| &failure.error)
    }

    /// Fail the whole run if any entry failed.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::EntriesFailed(self.failures))
        }
    }

    /// Writes every chunk under `dir`, erroring if a file already exists.
    ///
    /// Either all files are written or none are.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        writer::write_chunks_to(&self.chunks, dir.as_ref(), false)
    }

    /// Writes every chunk under `dir`, replacing existing files.
    pub fn write_to_force(&self, dir: impl AsRef<Path>) -> Result<()> {
        writer::write_chunks_to(&self.chunks, dir.as_ref(), true)
    }
}
