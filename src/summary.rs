//! Compact statistical signatures over a snapshot.

use crate::config::SummaryOptions;
use crate::model::Snapshot;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSample {
    pub method: String,
    pub path: String,
    pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSignature {
    pub total_classes: usize,
    pub total_methods: usize,
    pub total_endpoints: usize,
    pub annotation_counts: IndexMap<String, usize>,
    pub http_methods: IndexMap<String, usize>,
    pub endpoints: Vec<EndpointSample>,
    pub java_types: IndexMap<String, usize>,
    pub packages: Vec<String>,
}

pub fn summarize(snapshot: &Snapshot, options: &SummaryOptions) -> ApiSignature {
    ApiSignature {
        total_classes: snapshot.classes.len(),
        total_methods: snapshot.methods.len(),
        total_endpoints: snapshot.endpoints.len(),
        annotation_counts: annotation_frequency(snapshot, options.top_annotations),
        http_methods: http_method_distribution(snapshot),
        endpoints: endpoint_sample(snapshot, options.endpoint_sample),
        java_types: java_type_distribution(snapshot),
        packages: top_level_packages(snapshot),
    }
}

/// Every class then method annotation, in insertion order.
pub(crate) fn all_annotations(snapshot: &Snapshot) -> impl Iterator<Item = &str> {
    let classes = snapshot.classes.values().flat_map(|c| c.annotation_names());
    let methods = snapshot.methods.values().flat_map(|m| m.annotation_names());
    classes.chain(methods)
}

/// Top `limit` annotations by descending count. Equal counts keep first-seen order.
pub fn annotation_frequency(snapshot: &Snapshot, limit: usize) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for name in all_annotations(snapshot) {
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }
    top_counts(counts, limit)
}

pub(crate) fn top_counts(counts: IndexMap<String, usize>, limit: usize) -> IndexMap<String, usize> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked.into_iter().collect()
}

pub fn http_method_distribution(snapshot: &Snapshot) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for endpoint in snapshot.endpoints.values() {
        *counts.entry(endpoint.http_method.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn endpoint_sample(snapshot: &Snapshot, limit: usize) -> Vec<EndpointSample> {
    snapshot
        .endpoints
        .values()
        .take(limit)
        .map(|endpoint| EndpointSample {
            method: endpoint.http_method.clone(),
            path: endpoint.path.clone(),
            handler: endpoint.handler(),
        })
        .collect()
}

pub fn java_type_distribution(snapshot: &Snapshot) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for class in snapshot.classes.values() {
        *counts
            .entry(class.java_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Distinct first package segments, sorted. Default-package classes are skipped.
pub fn top_level_packages(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .classes
        .values()
        .filter(|class| !class.package.is_empty())
        .filter_map(|class| class.package.split('.').next())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
