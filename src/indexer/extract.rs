use crate::indexer::{java, pattern};
use crate::model::{ClassRecord, FieldRecord, MethodRecord};
use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A method invocation found inside a method body, still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub caller_method: String,
    /// Receiver expression as written (`repo`, `this`, `UserService`), if any.
    pub receiver: Option<String>,
    pub callee_method: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedClass {
    pub record: ClassRecord,
    pub methods: Vec<MethodRecord>,
    pub fields: Vec<FieldRecord>,
    pub calls: Vec<CallSite>,
}

impl ExtractedClass {
    pub fn new(record: ClassRecord) -> Self {
        Self {
            record,
            methods: Vec::new(),
            fields: Vec::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedFile {
    pub package: String,
    pub imports: Vec<String>,
    pub classes: Vec<ExtractedClass>,
}

/// Recovers structural records from one file's source text.
///
/// Implementations must be deterministic: the same text and path always yield the
/// same records in the same order.
pub trait SourceExtractor: Send {
    fn name(&self) -> &'static str;

    fn extract(&mut self, source: &str, file_path: &str) -> Result<ExtractedFile>;
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorKind {
    /// Regex-based extraction over comment- and string-masked text.
    #[default]
    Pattern,
    /// tree-sitter-java grammar.
    TreeSitter,
}

impl ExtractorKind {
    pub fn build(self, scope: AnnotationScope) -> Result<Box<dyn SourceExtractor>> {
        Ok(match self {
            ExtractorKind::Pattern => Box::new(pattern::PatternExtractor::with_scope(scope)),
            ExtractorKind::TreeSitter => Box::new(java::JavaExtractor::new()?),
        })
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pattern" | "regex" => Some(ExtractorKind::Pattern),
            "tree-sitter" | "treesitter" | "grammar" => Some(ExtractorKind::TreeSitter),
            _ => None,
        }
    }
}

/// Which annotations the pattern extractor attributes to a declaration.
#[derive(ValueEnum, Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationScope {
    /// Annotations written directly before the declaration.
    #[default]
    Declaration,
    /// Every annotation in the file, for every class and method.
    File,
}
