use crate::config::ExtractOptions;
use crate::error::ExtractError;
use crate::graph::GraphStore;
use crate::indexer::extract::{ExtractedFile, SourceExtractor};
use crate::model::Snapshot;
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

pub mod extract;
pub mod http;
pub mod java;
pub mod pattern;
pub mod scan;
pub mod xref;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub scanned: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub classes: usize,
    pub methods: usize,
    pub fields: usize,
    pub endpoints: usize,
    pub links: xref::LinkStats,
    pub duration_ms: u64,
}

/// A file that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWarning {
    pub path: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ExtractReport {
    pub graph: GraphStore,
    pub stats: IndexStats,
    pub warnings: Vec<FileWarning>,
}

impl ExtractReport {
    pub fn snapshot(&self) -> Snapshot {
        self.graph.export()
    }
}

/// Drives scanning, per-file extraction, merging and linking.
pub struct Indexer {
    options: ExtractOptions,
}

impl Indexer {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Extracts a directory tree or a single file.
    pub fn extract_path(&self, path: &Path) -> Result<ExtractReport, ExtractError> {
        let started = Instant::now();
        if !path.exists() {
            return Err(ExtractError::PathNotFound(path.to_path_buf()));
        }
        let scan = if path.is_file() {
            scan::ScanResult {
                files: vec![scan::scan_file(path)],
                warnings: Vec::new(),
            }
        } else if path.is_dir() {
            let scan_options = scan::ScanOptions {
                extension: self.options.extension.clone(),
                respect_ignore: self.options.respect_ignore,
            };
            scan::scan_root(path, &scan_options).map_err(ExtractError::Scan)?
        } else {
            return Err(ExtractError::InvalidPath(path.to_path_buf()));
        };
        tracing::debug!(
            root = %path.display(),
            files = scan.files.len(),
            walk_errors = scan.warnings.len(),
            "scanned input"
        );
        self.run(
            &scan.files,
            scan.warnings,
            |file| {
                (
                    file.rel_path.clone(),
                    crate::util::read_to_string(&file.abs_path),
                )
            },
            started,
        )
    }

    /// Extracts in-memory sources given as `(relative path, text)` pairs. They are
    /// merged in path order, like files from a directory scan.
    pub fn extract_sources(
        &self,
        sources: &[(String, String)],
    ) -> Result<ExtractReport, ExtractError> {
        let started = Instant::now();
        let mut sorted: Vec<&(String, String)> = sources.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        self.run(
            &sorted,
            Vec::new(),
            |(path, text)| (path.clone(), Ok(text.clone())),
            started,
        )
    }

    /// `warnings` carries problems found before extraction, such as unreadable
    /// directories; they count as skipped inputs.
    fn run<T, F>(
        &self,
        inputs: &[T],
        mut warnings: Vec<FileWarning>,
        load: F,
        started: Instant,
    ) -> Result<ExtractReport, ExtractError>
    where
        T: Sync,
        F: Fn(&T) -> (String, Result<String>) + Sync,
    {
        let kind = self.options.extractor;
        let scope = self.options.annotation_scope;
        let outcomes: Vec<Result<ExtractedFile, FileWarning>> = if self.options.parallel {
            kind.build(scope).map_err(ExtractError::Setup)?;
            inputs
                .par_iter()
                .map_init(
                    || kind.build(scope),
                    |extractor, input| {
                        let (path, source) = load(input);
                        match extractor {
                            Ok(extractor) => extract_one(extractor.as_mut(), &path, source),
                            Err(err) => Err(warning(&path, format!("{err:#}"))),
                        }
                    },
                )
                .collect()
        } else {
            let mut extractor = kind.build(scope).map_err(ExtractError::Setup)?;
            inputs
                .iter()
                .map(|input| {
                    let (path, source) = load(input);
                    extract_one(extractor.as_mut(), &path, source)
                })
                .collect()
        };

        let mut graph = GraphStore::new();
        let mut extracted = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(file) => {
                    merge_file(&mut graph, &file, &self.options.mappings);
                    extracted.push(file);
                }
                Err(warning) => warnings.push(warning),
            }
        }
        let links = xref::link_references(&mut graph, &extracted);

        let graph_stats = graph.stats();
        let stats = IndexStats {
            scanned: inputs.len(),
            extracted: extracted.len(),
            skipped: warnings.len(),
            classes: graph_stats.classes,
            methods: graph_stats.methods,
            fields: graph_stats.fields,
            endpoints: graph_stats.endpoints,
            links,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            extractor = ?kind,
            scanned = stats.scanned,
            extracted = stats.extracted,
            skipped = stats.skipped,
            classes = stats.classes,
            methods = stats.methods,
            endpoints = stats.endpoints,
            duration_ms = stats.duration_ms,
            "extraction complete"
        );
        Ok(ExtractReport {
            graph,
            stats,
            warnings,
        })
    }
}

fn extract_one(
    extractor: &mut dyn SourceExtractor,
    path: &str,
    source: Result<String>,
) -> Result<ExtractedFile, FileWarning> {
    let source = match source {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(path, error = %format!("{err:#}"), "read error");
            return Err(warning(path, format!("{err:#}")));
        }
    };
    match extractor.extract(&source, path) {
        Ok(file) => {
            tracing::debug!(
                path,
                extractor = extractor.name(),
                classes = file.classes.len(),
                "extracted file"
            );
            Ok(file)
        }
        Err(err) => {
            tracing::warn!(path, error = %format!("{err:#}"), "extract error");
            Err(warning(path, format!("{err:#}")))
        }
    }
}

fn warning(path: &str, message: String) -> FileWarning {
    FileWarning {
        path: path.to_string(),
        message,
    }
}

/// Adds a file's records to the store: each class, then its methods with any
/// endpoints they handle, then its fields.
fn merge_file(graph: &mut GraphStore, file: &ExtractedFile, mappings: &http::HttpMappings) {
    for class in &file.classes {
        graph.add_class(class.record.clone());
        for method in &class.methods {
            graph.add_method(method.clone());
            for endpoint in http::infer_endpoints(method, &class.record, mappings) {
                graph.add_endpoint(endpoint);
            }
        }
        for field in &class.fields {
            graph.add_field(field.clone());
        }
    }
}
