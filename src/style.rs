use crate::model::Snapshot;
use crate::summary::all_annotations;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keywords per API style, in tie-break order.
const STYLE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "REST",
        &["RequestMapping", "GetMapping", "PostMapping", "RestController"],
    ),
    ("SOAP", &["WebService", "WebMethod"]),
    ("GraphQL", &["GraphQLQuery", "GraphQLMutation"]),
    ("RPC", &["JsonRpc", "Rpc"]),
];

pub const MAX_MATURITY_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleReport {
    pub primary_style: String,
    pub scores: IndexMap<String, usize>,
    pub endpoint_count: usize,
    pub has_rest_endpoints: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestMaturity {
    pub level: u8,
    pub max_level: u8,
    pub description: String,
    pub http_methods: Vec<String>,
    pub endpoint_count: usize,
    pub recommendations: Vec<String>,
}

/// Scores each style by the number of annotations containing one of its keywords.
pub fn detect_style(snapshot: &Snapshot) -> StyleReport {
    let annotations: Vec<&str> = all_annotations(snapshot).collect();
    let mut scores = IndexMap::new();
    for (style, keywords) in STYLE_PATTERNS {
        let score = annotations
            .iter()
            .filter(|ann| keywords.iter().any(|k| ann.contains(k)))
            .count();
        scores.insert(style.to_string(), score);
    }
    let mut primary = STYLE_PATTERNS[0].0;
    let mut best = 0;
    for (style, score) in &scores {
        if *score > best {
            best = *score;
            primary = style.as_str();
        }
    }
    StyleReport {
        primary_style: primary.to_string(),
        scores,
        endpoint_count: snapshot.endpoints.len(),
        has_rest_endpoints: !snapshot.endpoints.is_empty(),
    }
}

/// Richardson maturity from the endpoint set. Hypermedia (level 3) is never
/// inferred.
pub fn rest_maturity(snapshot: &Snapshot) -> RestMaturity {
    if snapshot.endpoints.is_empty() {
        return RestMaturity {
            level: 0,
            max_level: MAX_MATURITY_LEVEL,
            description: "No REST endpoints found".to_string(),
            http_methods: Vec::new(),
            endpoint_count: 0,
            recommendations: recommendations(0),
        };
    }
    let mut methods: Vec<String> = Vec::new();
    for endpoint in snapshot.endpoints.values() {
        if !methods.contains(&endpoint.http_method) {
            methods.push(endpoint.http_method.clone());
        }
    }
    let has_resources = snapshot.endpoints.values().any(|ep| ep.path.contains('/'));
    let mut level = 0;
    if has_resources {
        level = 1;
    }
    if methods.len() > 1 {
        level = 2;
    }
    RestMaturity {
        level,
        max_level: MAX_MATURITY_LEVEL,
        description: maturity_description(level).to_string(),
        http_methods: methods,
        endpoint_count: snapshot.endpoints.len(),
        recommendations: recommendations(level),
    }
}

pub fn maturity_description(level: u8) -> &'static str {
    match level {
        0 => "No REST endpoints - uses legacy/SOAP patterns",
        1 => "Resource-based APIs - basic REST structure",
        2 => "HTTP Verbs used - proper REST implementation",
        3 => "HATEOAS implemented - fully mature REST API",
        _ => "Unknown",
    }
}

pub fn recommendations(level: u8) -> Vec<String> {
    let items: &[&str] = match level {
        0 => &[
            "Migrate to REST architecture",
            "Create resource-based endpoints",
            "Use standard HTTP methods",
        ],
        1 => &[
            "Implement proper HTTP method verbs (GET, POST, PUT, DELETE)",
            "Add versioning to API paths",
            "Standardize error responses",
        ],
        2 => &[
            "Implement HATEOAS for discoverability",
            "Add comprehensive API documentation",
            "Consider API versioning strategy",
        ],
        _ => &[
            "Maintain comprehensive API documentation",
            "Monitor API versioning strategy",
            "Consider adding caching strategies",
        ],
    };
    items.iter().map(|item| item.to_string()).collect()
}
