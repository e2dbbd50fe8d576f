// Configuration for jgraph.
// Process-wide defaults come from environment variables; the library itself only
// ever sees the explicit option structs below.

use crate::indexer::extract::{AnnotationScope, ExtractorKind};
use crate::indexer::http::HttpMappings;
use std::env;
use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Environment defaults. CLI flags override every field.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file extension (JGRAPH_EXTENSION)
    pub extension: String,

    /// Extractor implementation (JGRAPH_EXTRACTOR)
    pub extractor: ExtractorKind,

    /// Extract files on the rayon pool (JGRAPH_PARALLEL)
    pub parallel: bool,

    /// Annotation frequency entries kept by the summarizer (JGRAPH_TOP_ANNOTATIONS)
    pub top_annotations: usize,

    /// Endpoints kept in the summary sample (JGRAPH_ENDPOINT_SAMPLE)
    pub endpoint_sample: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: "java".to_string(),
            extractor: ExtractorKind::Pattern,
            parallel: true,
            top_annotations: 20,
            endpoint_sample: 10,
        }
    }
}

impl Config {
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(val) = lookup("JGRAPH_EXTENSION") {
            let ext = val.trim().trim_start_matches('.');
            if ext.is_empty() {
                warn_invalid("JGRAPH_EXTENSION", &val, &config.extension);
            } else {
                config.extension = ext.to_string();
            }
        }

        if let Some(val) = lookup("JGRAPH_EXTRACTOR") {
            match ExtractorKind::parse(&val) {
                Some(kind) => config.extractor = kind,
                None => warn_invalid("JGRAPH_EXTRACTOR", &val, &format!("{:?}", config.extractor)),
            }
        }

        if let Some(val) = lookup("JGRAPH_PARALLEL") {
            match parse_bool(&val) {
                Some(parsed) => config.parallel = parsed,
                None => warn_invalid("JGRAPH_PARALLEL", &val, &config.parallel.to_string()),
            }
        }

        if let Some(val) = lookup("JGRAPH_TOP_ANNOTATIONS") {
            match val.trim().parse() {
                Ok(parsed) => config.top_annotations = parsed,
                Err(_) => warn_invalid(
                    "JGRAPH_TOP_ANNOTATIONS",
                    &val,
                    &config.top_annotations.to_string(),
                ),
            }
        }

        if let Some(val) = lookup("JGRAPH_ENDPOINT_SAMPLE") {
            match val.trim().parse() {
                Ok(parsed) => config.endpoint_sample = parsed,
                Err(_) => warn_invalid(
                    "JGRAPH_ENDPOINT_SAMPLE",
                    &val,
                    &config.endpoint_sample.to_string(),
                ),
            }
        }

        config
    }

    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            extension: self.extension.clone(),
            extractor: self.extractor,
            parallel: self.parallel,
            ..ExtractOptions::default()
        }
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            top_annotations: self.top_annotations,
            endpoint_sample: self.endpoint_sample,
        }
    }
}

fn warn_invalid(key: &str, value: &str, default: &str) {
    tracing::warn!(key, value, default, "invalid configuration value, using default");
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Everything an extraction run needs.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub extension: String,
    pub extractor: ExtractorKind,
    pub mappings: HttpMappings,
    pub annotation_scope: AnnotationScope,
    pub parallel: bool,
    pub respect_ignore: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extension: "java".to_string(),
            extractor: ExtractorKind::default(),
            mappings: HttpMappings::default(),
            annotation_scope: AnnotationScope::default(),
            parallel: true,
            respect_ignore: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub top_annotations: usize,
    pub endpoint_sample: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_annotations: 20,
            endpoint_sample: 10,
        }
    }
}
