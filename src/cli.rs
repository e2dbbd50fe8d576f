use crate::config::{Config, ExtractOptions, SummaryOptions};
use crate::indexer::extract::{AnnotationScope, ExtractorKind};
use crate::indexer::http::HttpMappings;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "jgraph",
    version,
    about = "Structural model of Java codebases",
    after_help = r#"Examples:
  jgraph extract --path ./legacy-app --format yaml --output model.yaml
  jgraph stats --path ./legacy-app --extractor tree-sitter
  jgraph summary --path ./legacy-app --mapping GetJson=GET --top-annotations 10
  jgraph style --snapshot model.json
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract the structural model and print the snapshot.
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print node, edge and extraction counts.
    Stats {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the API signature: annotation frequency, verbs, endpoint sample.
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Annotation frequency entries to keep.
        #[arg(long)]
        top_annotations: Option<usize>,
        /// Endpoints to include in the sample.
        #[arg(long)]
        endpoint_sample: Option<usize>,
    },
    /// Detect the API style and REST maturity level.
    Style {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory or single source file to extract.
    #[arg(long, conflicts_with = "snapshot")]
    pub path: Option<PathBuf>,
    /// Previously saved JSON or YAML snapshot to load instead of extracting.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub extractor: Option<ExtractorKind>,
    /// Source file extension, without the dot.
    #[arg(long)]
    pub extension: Option<String>,
    /// Extra annotation to HTTP verb mapping. Repeatable.
    #[arg(long = "mapping", value_name = "NAME=VERB")]
    pub mappings: Vec<String>,
    #[arg(long, value_enum, default_value_t = AnnotationScope::Declaration)]
    pub annotation_scope: AnnotationScope,
    /// Extract files one at a time instead of on the thread pool.
    #[arg(long)]
    pub sequential: bool,
    /// Skip files matched by .gitignore/.ignore.
    #[arg(long)]
    pub respect_ignore: bool,
}

impl SourceArgs {
    pub fn input_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Environment defaults overridden by whatever was given on the command line.
    pub fn extract_options(&self, config: &Config) -> Result<ExtractOptions> {
        let mut options = config.extract_options();
        if let Some(kind) = self.extractor {
            options.extractor = kind;
        }
        if let Some(extension) = &self.extension {
            options.extension = extension.trim_start_matches('.').to_string();
        }
        let mut mappings = HttpMappings::default();
        for raw in &self.mappings {
            let (name, verb) =
                HttpMappings::parse_entry(raw).with_context(|| format!("--mapping {raw}"))?;
            mappings.insert(name, verb);
        }
        options.mappings = mappings;
        options.annotation_scope = self.annotation_scope;
        if self.sequential {
            options.parallel = false;
        }
        options.respect_ignore = self.respect_ignore;
        Ok(options)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Write to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn summary_options(
    config: &Config,
    top_annotations: Option<usize>,
    endpoint_sample: Option<usize>,
) -> SummaryOptions {
    let mut options = config.summary_options();
    if let Some(top) = top_annotations {
        options.top_annotations = top;
    }
    if let Some(sample) = endpoint_sample {
        options.endpoint_sample = sample;
    }
    options
}
