use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop an extraction before any file is read. Per-file problems
/// never surface here; they are reported as warnings on the extraction report.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("input path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("input path is neither a file nor a directory: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("scanning input failed: {0:#}")]
    Scan(anyhow::Error),

    #[error("extractor setup failed: {0:#}")]
    Setup(anyhow::Error),
}
