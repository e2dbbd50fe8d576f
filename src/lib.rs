pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod model;
pub mod style;
pub mod summary;
pub mod util;

pub use config::{ExtractOptions, SummaryOptions};
pub use error::ExtractError;
pub use graph::GraphStore;
pub use indexer::{ExtractReport, Indexer};
pub use model::Snapshot;
