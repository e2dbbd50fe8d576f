use crate::model::{Annotation, ClassRecord, EndpointRecord, MethodRecord};
use anyhow::{Result, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE",
];
pub const HTTP_REQUEST: &str = "REQUEST";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Annotation name to HTTP verb. Insertion ordered so listings are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpMappings {
    entries: IndexMap<String, String>,
}

impl Default for HttpMappings {
    fn default() -> Self {
        let mut mappings = Self::empty();
        for (name, verb) in [
            ("GetMapping", "GET"),
            ("PostMapping", "POST"),
            ("PutMapping", "PUT"),
            ("DeleteMapping", "DELETE"),
            ("PatchMapping", "PATCH"),
            ("RequestMapping", HTTP_REQUEST),
        ] {
            mappings.insert(name, verb);
        }
        mappings
    }
}

impl HttpMappings {
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Adds or replaces a mapping. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, verb: impl Into<String>) {
        self.entries.insert(name.into(), verb.into());
    }

    pub fn verb_for(&self, annotation: &str) -> Option<&str> {
        self.entries.get(annotation).map(|verb| verb.as_str())
    }

    /// Parses a `Name=VERB` entry, e.g. `GetJson=GET`.
    pub fn parse_entry(raw: &str) -> Result<(String, String)> {
        let Some((name, verb)) = raw.split_once('=') else {
            bail!("mapping must look like NAME=VERB, got {raw:?}");
        };
        let name = name.trim().trim_start_matches('@');
        if name.is_empty() {
            bail!("mapping {raw:?} has an empty annotation name");
        }
        let Some(verb) = normalize_method(verb) else {
            bail!("mapping {raw:?} has an unknown HTTP verb");
        };
        Ok((name.to_string(), verb))
    }
}

pub fn normalize_method(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.trim_matches('"').to_ascii_uppercase();
    if upper == "ALL" || upper == "ANY" || upper == HTTP_REQUEST {
        return Some(HTTP_REQUEST.to_string());
    }
    if HTTP_METHODS.iter().any(|method| *method == upper) {
        return Some(upper);
    }
    None
}

pub fn join_paths(prefix: &str, suffix: &str) -> String {
    let mut left = prefix.trim().to_string();
    let right = suffix.trim();
    if left.is_empty() {
        left = "/".to_string();
    }
    if !left.starts_with('/') {
        left = format!("/{left}");
    }
    let left = left.trim_end_matches('/');
    let right = right.trim_start_matches('/');
    if left.is_empty() {
        format!("/{right}")
    } else if right.is_empty() {
        left.to_string()
    } else {
        format!("{left}/{right}")
    }
}

/// `/<class>/<method>`, lowercased.
pub fn synthesized_path(class_name: &str, method_name: &str) -> String {
    format!(
        "/{}/{}",
        class_name.to_lowercase(),
        method_name.to_lowercase()
    )
}

/// One endpoint per recognized mapping annotation on `method`.
///
/// An explicit `value`/`path` wins over the synthesized path and is prefixed by
/// the class-level mapping path, if the class declares one.
pub fn infer_endpoints(
    method: &MethodRecord,
    class: &ClassRecord,
    mappings: &HttpMappings,
) -> Vec<EndpointRecord> {
    let prefix = class
        .annotations
        .iter()
        .filter(|ann| mappings.verb_for(&ann.name).is_some())
        .find_map(explicit_path);
    let handler_class = class.qualname();
    let mut out = Vec::new();
    for annotation in &method.annotations {
        let Some(verb) = mappings.verb_for(&annotation.name) else {
            continue;
        };
        let path = match explicit_path(annotation) {
            Some(path) => join_paths(prefix.as_deref().unwrap_or(""), &path),
            None => synthesized_path(&class.name, &method.name),
        };
        out.push(EndpointRecord {
            http_method: verb.to_string(),
            path,
            handler_class: handler_class.clone(),
            handler_method: method.name.clone(),
            params: method.parameters.clone(),
            consumes: content_types(annotation, "consumes"),
            produces: content_types(annotation, "produces"),
        });
    }
    out
}

fn explicit_path(annotation: &Annotation) -> Option<String> {
    annotation
        .string_values("value")
        .into_iter()
        .next()
        .or_else(|| annotation.string_values("path").into_iter().next())
}

fn content_types(annotation: &Annotation, element: &str) -> Vec<String> {
    let values = annotation.string_values(element);
    if values.is_empty() {
        vec![DEFAULT_CONTENT_TYPE.to_string()]
    } else {
        values
    }
}
