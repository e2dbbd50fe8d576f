use super::FileWarning;
use anyhow::Result;
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Relative to the scan root, `/`-separated.
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// Files found by a walk, plus the parts of the tree the walk could not read.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub warnings: Vec<FileWarning>,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File extension without the dot.
    pub extension: String,
    /// Honour `.gitignore`/`.ignore` files while walking.
    pub respect_ignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extension: "java".to_string(),
            respect_ignore: false,
        }
    }
}

/// Files under `root` with the configured extension, sorted by relative path.
/// Unreadable directories and broken ignore files end up in `warnings`.
pub fn scan_root(root: &Path, options: &ScanOptions) -> Result<ScanResult> {
    let walker = WalkBuilder::new(root)
        .standard_filters(options.respect_ignore)
        .require_git(false)
        .hidden(false)
        .filter_entry(|entry| entry.file_name() != OsStr::new(".git"))
        .build();

    let mut scan = ScanResult::default();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "walk error");
                scan.warnings.push(walk_warning(root, &err));
                continue;
            }
        };
        if let Some(err) = entry.error() {
            tracing::warn!(path = %entry.path().display(), error = %err, "ignore file error");
            scan.warnings.push(walk_warning(root, err));
        }
        let path = entry.path();
        let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
        if !is_file || !has_extension(path, &options.extension) {
            continue;
        }
        scan.files.push(ScannedFile {
            rel_path: crate::util::normalize_rel_path(root, path)?,
            abs_path: path.to_path_buf(),
        });
    }
    scan.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(scan)
}

/// A single input file, keyed by its file name.
pub fn scan_file(path: &Path) -> ScannedFile {
    let rel_path = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| crate::util::normalize_path(path));
    ScannedFile {
        rel_path,
        abs_path: path.to_path_buf(),
    }
}

fn walk_warning(root: &Path, err: &ignore::Error) -> FileWarning {
    let path = match error_path(err) {
        Some(path) => crate::util::normalize_rel_path(root, path)
            .unwrap_or_else(|_| crate::util::normalize_path(path)),
        None => crate::util::normalize_path(root),
    };
    FileWarning {
        path,
        message: err.to_string(),
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::Loop { child, .. } => Some(child),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension.trim_start_matches('.'))
}
