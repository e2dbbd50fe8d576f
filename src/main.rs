use anyhow::{Context, Result};
use clap::Parser;
use jgraph::cli::{self, Command, OutputArgs, OutputFormat, SourceArgs};
use jgraph::config::Config;
use jgraph::graph::GraphStore;
use jgraph::indexer::{FileWarning, IndexStats, Indexer};
use jgraph::model::{GraphStats, Snapshot};
use jgraph::{style, summary, util};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

struct Loaded {
    snapshot: Snapshot,
    index: Option<IndexStats>,
    warnings: Vec<FileWarning>,
}

#[derive(Serialize)]
struct StatsOutput {
    graph: GraphStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexStats>,
    warnings: Vec<FileWarning>,
}

#[derive(Serialize)]
struct StyleOutput {
    style: style::StyleReport,
    maturity: style::RestMaturity,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let config = Config::get();

    match args.command {
        Command::Extract { source, output } => {
            let loaded = load(&source, config)?;
            write_output(&output, &loaded.snapshot)
        }
        Command::Stats { source, output } => {
            let loaded = load(&source, config)?;
            let stats = StatsOutput {
                graph: loaded.snapshot.stats,
                index: loaded.index,
                warnings: loaded.warnings,
            };
            write_output(&output, &stats)
        }
        Command::Summary {
            source,
            output,
            top_annotations,
            endpoint_sample,
        } => {
            let loaded = load(&source, config)?;
            let options = cli::summary_options(config, top_annotations, endpoint_sample);
            let signature = summary::summarize(&loaded.snapshot, &options);
            write_output(&output, &signature)
        }
        Command::Style { source, output } => {
            let loaded = load(&source, config)?;
            let report = StyleOutput {
                style: style::detect_style(&loaded.snapshot),
                maturity: style::rest_maturity(&loaded.snapshot),
            };
            write_output(&output, &report)
        }
    }
}

fn load(source: &SourceArgs, config: &Config) -> Result<Loaded> {
    if let Some(path) = &source.snapshot {
        let snapshot = read_snapshot(path)?;
        let graph = GraphStore::from_snapshot(&snapshot);
        return Ok(Loaded {
            snapshot: graph.export(),
            index: None,
            warnings: Vec::new(),
        });
    }
    let options = source.extract_options(config)?;
    let path = source.input_path();
    let report = Indexer::new(options)
        .extract_path(&path)
        .with_context(|| format!("extract {}", path.display()))?;
    Ok(Loaded {
        snapshot: report.snapshot(),
        index: Some(report.stats),
        warnings: report.warnings,
    })
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let text = util::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let snapshot = if is_yaml {
        serde_yaml_ng::from_str(&text).with_context(|| format!("parse {}", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?
    };
    Ok(snapshot)
}

fn write_output<T: Serialize>(args: &OutputArgs, value: &T) -> Result<()> {
    let text = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml_ng::to_string(value)?,
    };
    match &args.output {
        Some(path) => {
            util::ensure_parent_dir(path)?;
            std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}
