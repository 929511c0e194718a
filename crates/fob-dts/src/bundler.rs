//! Pipeline orchestration.
//!
//! The module graph is built once for all entries and shared read-only. In
//! single mode every entry runs reachability, renaming and emission on its own
//! (in parallel). In chunk mode reachability still runs per entry, then one
//! synchronized pass renames the union and plans the shared chunk.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::chunk::{ChunkPlan, ChunkPlanner, EntryPlan};
use crate::config::{DtsBundleConfig, EntryPoint};
use crate::emit::{ChunkSpec, EmitOptions, Emitter, ExportSpec, SharedImport};
use crate::frontend::FrontEnd;
use crate::graph::ModuleGraph;
use crate::link::Linker;
use crate::output::{BundleOutput, ChunkKind, EntryFailure, OutputChunk};
use crate::reachability::{ExportManifest, ReachableSet, Reachability};
use crate::rename::{CollisionResolver, DEFAULT_MAX_SUFFIX, RenameMap};
use crate::{Error, ModuleId, Result};

pub struct DtsBundler {
    config: DtsBundleConfig,
    entries: Vec<EntryPoint>,
    emit_options: EmitOptions,
    max_suffix: u32,
}

impl DtsBundler {
    /// Validate `config` and prepare a bundler for it.
    pub fn new(config: DtsBundleConfig) -> Result<Self> {
        let entries = config.entry_points()?;
        Ok(Self {
            emit_options: config.emit_options(),
            entries,
            config,
            max_suffix: DEFAULT_MAX_SUFFIX,
        })
    }

    /// Bound on `$N` suffixes tried per name before renaming gives up.
    pub fn max_rename_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    pub fn config(&self) -> &DtsBundleConfig {
        &self.config
    }

    pub fn entries(&self) -> &[EntryPoint] {
        &self.entries
    }

    /// Build the module graph for the configured entries.
    pub fn graph(&self, frontend: &dyn FrontEnd) -> ModuleGraph {
        let ids: Vec<ModuleId> = self.entries.iter().map(|entry| entry.id.clone()).collect();
        ModuleGraph::build(frontend, &ids)
    }

    /// Run the whole pipeline. Entry failures are collected in
    /// [`BundleOutput::failures`]; a failed entry produces no chunk.
    pub fn bundle(&self, frontend: &dyn FrontEnd) -> BundleOutput {
        let graph = self.graph(frontend);
        let linker = Linker::new(&graph, frontend);

        let output = if self.config.chunking {
            self.bundle_chunked(&linker)
        } else {
            self.bundle_single(&linker)
        };

        info!(
            entries = self.entries.len(),
            chunks = output.chunks.len(),
            failed = output.failures.len(),
            "declaration bundling finished"
        );
        output
    }

    fn resolver<'g>(&self, graph: &'g ModuleGraph, set: &ReachableSet) -> CollisionResolver<'g> {
        CollisionResolver::new(graph)
            .reserve(set.globals())
            .max_suffix(self.max_suffix)
    }

    fn bundle_single(&self, linker: &Linker<'_>) -> BundleOutput {
        let results: Vec<Result<OutputChunk>> = self
            .entries
            .par_iter()
            .map(|entry| self.bundle_entry(linker, entry))
            .collect();

        let mut output = BundleOutput::default();
        for (entry, result) in self.entries.iter().zip(results) {
            match result {
                Ok(chunk) => {
                    output.manifest.insert(&entry.id, vec![chunk.file_name.clone()]);
                    output.chunks.push(chunk);
                }
                Err(error) => output.failures.push(EntryFailure {
                    entry: entry.id.clone(),
                    error,
                }),
            }
        }
        output
    }

    fn bundle_entry(&self, linker: &Linker<'_>, entry: &EntryPoint) -> Result<OutputChunk> {
        let graph = linker.graph();
        let analysis = Reachability::analyze(linker, &entry.id)?;
        let renames = self
            .resolver(graph, &analysis.set)
            .resolve(&analysis.order, analysis.set.retained())?;

        let chunk = ChunkSpec {
            order: analysis.order.clone(),
            symbols: analysis.set.retained().clone(),
            shared_import: None,
            exports: manifest_exports(&analysis.manifest),
            external_stars: analysis.manifest.external_stars.clone(),
        };
        let code = Emitter::new(graph, &analysis.set, &renames, &self.emit_options).emit(&chunk)?;

        Ok(entry_chunk(entry, code, &analysis.manifest))
    }

    fn bundle_chunked(&self, linker: &Linker<'_>) -> BundleOutput {
        let graph = linker.graph();
        let results: Vec<Result<Reachability>> = self
            .entries
            .par_iter()
            .map(|entry| Reachability::analyze(linker, &entry.id))
            .collect();

        let mut output = BundleOutput::default();
        let mut points: Vec<&EntryPoint> = Vec::new();
        let mut analyses: Vec<Reachability> = Vec::new();
        for (entry, result) in self.entries.iter().zip(results) {
            match result {
                Ok(analysis) => {
                    points.push(entry);
                    analyses.push(analysis);
                }
                Err(error) => output.failures.push(EntryFailure {
                    entry: entry.id.clone(),
                    error,
                }),
            }
        }
        if analyses.is_empty() {
            return output;
        }

        let merged = ReachableSet::union(analyses.iter().map(|analysis| &analysis.set));
        let roots: Vec<ModuleId> = points.iter().map(|entry| entry.id.clone()).collect();
        let order = graph.traversal(&roots);

        let renames = match self.resolver(graph, &merged).resolve(&order, merged.retained()) {
            Ok(renames) => renames,
            Err(exhausted) => {
                for entry in points {
                    output.failures.push(EntryFailure {
                        entry: entry.id.clone(),
                        error: Error::RenameExhausted(exhausted.clone()),
                    });
                }
                return output;
            }
        };

        let plan = ChunkPlanner::new(graph).plan(&analyses);
        let emitter = Emitter::new(graph, &merged, &renames, &self.emit_options);

        let shared_file = format!("{}.d.ts", self.config.shared_chunk_name);
        let shared = if plan.has_shared_chunk() {
            let spec = shared_chunk_spec(&plan, &order, &renames);
            Some(emitter.emit(&spec).map(|code| OutputChunk {
                file_name: shared_file.clone(),
                code,
                kind: ChunkKind::Shared,
                exports: spec.exports.iter().map(|e| e.exported.clone()).collect(),
            }))
        } else {
            None
        };
        let shared_error = match &shared {
            Some(Err(error)) => Some(error.to_string()),
            _ => None,
        };

        for (entry, analysis) in points.into_iter().zip(&analyses) {
            let Some(entry_plan) = plan.entry(&entry.id) else {
                continue;
            };
            let uses_shared =
                !entry_plan.shared_imports.is_empty() || entry_plan.needs_shared_side_effect;

            if let (true, Some(message)) = (uses_shared, &shared_error) {
                output.failures.push(EntryFailure {
                    entry: entry.id.clone(),
                    error: Error::SharedChunk(message.clone()),
                });
                continue;
            }

            let shared_path = shared_import_path(&entry.name, &self.config.shared_chunk_name);
            let spec = entry_chunk_spec(entry_plan, analysis, shared_path);
            match emitter.emit(&spec) {
                Ok(code) => {
                    let chunk = entry_chunk(entry, code, &analysis.manifest);
                    let mut files = vec![chunk.file_name.clone()];
                    if uses_shared {
                        files.push(shared_file.clone());
                    }
                    output.manifest.insert(&entry.id, files);
                    output.chunks.push(chunk);
                }
                Err(error) => output.failures.push(EntryFailure {
                    entry: entry.id.clone(),
                    error,
                }),
            }
        }

        if let Some(Ok(chunk)) = shared {
            output.chunks.push(chunk);
        }

        debug!(
            shared = plan.shared.len(),
            renamed = renames.len(),
            "chunked bundle assembled"
        );
        output
    }
}

fn manifest_exports(manifest: &ExportManifest) -> Vec<ExportSpec> {
    manifest
        .entries
        .iter()
        .map(|entry| ExportSpec {
            exported: entry.exported.clone(),
            target: entry.target,
            is_type_only: entry.is_type_only,
        })
        .collect()
}

fn entry_chunk(entry: &EntryPoint, code: String, manifest: &ExportManifest) -> OutputChunk {
    OutputChunk {
        file_name: entry.file_name(),
        code,
        kind: ChunkKind::Entry {
            entry: entry.id.clone(),
        },
        exports: manifest
            .entries
            .iter()
            .map(|row| row.exported.clone())
            .collect(),
    }
}

fn shared_chunk_spec(plan: &ChunkPlan, order: &[ModuleId], renames: &RenameMap) -> ChunkSpec {
    let exports = plan
        .shared_exports
        .iter()
        .filter_map(|id| {
            renames.get(*id).map(|name| ExportSpec {
                exported: name.to_string(),
                target: *id,
                is_type_only: false,
            })
        })
        .collect();

    ChunkSpec {
        order: order.to_vec(),
        symbols: plan.shared.clone(),
        shared_import: None,
        exports,
        external_stars: Vec::new(),
    }
}

fn entry_chunk_spec(plan: &EntryPlan, analysis: &Reachability, shared_path: String) -> ChunkSpec {
    let shared_import = if !plan.shared_imports.is_empty() {
        Some(SharedImport::Named {
            path: shared_path,
            names: plan.shared_imports.clone(),
        })
    } else if plan.needs_shared_side_effect {
        Some(SharedImport::SideEffect { path: shared_path })
    } else {
        None
    };

    ChunkSpec {
        order: analysis.order.clone(),
        symbols: plan.owned.clone(),
        shared_import,
        exports: manifest_exports(&analysis.manifest),
        external_stars: analysis.manifest.external_stars.clone(),
    }
}

/// Relative import of the shared chunk from an entry file, in the `.js` form
/// TypeScript resolves to the sibling declaration file.
fn shared_import_path(entry_name: &str, shared_name: &str) -> String {
    let depth = entry_name.matches('/').count();
    if depth == 0 {
        format!("./{shared_name}.js")
    } else {
        format!("{}{shared_name}.js", "../".repeat(depth))
    }
}
