//! Cross-reference linking: resolves type names, annotation usages and call sites
//! recorded by the extractors against the classes present in the graph store.

use crate::graph::{GraphStore, class_id, method_id};
use crate::indexer::extract::{CallSite, ExtractedClass, ExtractedFile};
use crate::model::{JavaType, qualify};
use crate::util;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub extends: usize,
    pub implements: usize,
    pub annotated_with: usize,
    pub calls: usize,
}

/// Links every extracted file against `store`. Files must already be merged.
pub fn link_references(store: &mut GraphStore, files: &[ExtractedFile]) -> LinkStats {
    let index = TypeIndex::build(store);
    let mut stats = LinkStats::default();
    let mut superclasses: HashMap<String, String> = HashMap::new();

    for file in files {
        let scope = FileScope::new(&index, file);
        for class in &file.classes {
            let qualname = class.record.qualname();
            if let Some(parent) = class
                .record
                .superclass
                .as_deref()
                .and_then(|raw| scope.resolve(raw))
            {
                if store.record_extends(&qualname, &parent) {
                    stats.extends += 1;
                }
                superclasses.insert(qualname.clone(), parent);
            }
            for raw in &class.record.interfaces {
                if let Some(interface) = scope.resolve(raw) {
                    if store.record_implements(&qualname, &interface) {
                        stats.implements += 1;
                    }
                }
            }
            let class_node = class_id(&qualname);
            for annotation in &class.record.annotations {
                if let Some(target) = scope.resolve_annotation(store, &annotation.name) {
                    if store.record_annotated_with(&class_node, &target) {
                        stats.annotated_with += 1;
                    }
                }
            }
            for method in &class.methods {
                let method_node = method_id(&qualname, &method.name);
                for annotation in &method.annotations {
                    if let Some(target) = scope.resolve_annotation(store, &annotation.name) {
                        if store.record_annotated_with(&method_node, &target) {
                            stats.annotated_with += 1;
                        }
                    }
                }
            }
        }
    }

    let mut recorded: HashSet<(String, String)> = HashSet::new();
    for file in files {
        let scope = FileScope::new(&index, file);
        for class in &file.classes {
            let qualname = class.record.qualname();
            for call in &class.calls {
                let Some(target) = scope.call_target(class, &qualname, call, &superclasses) else {
                    continue;
                };
                let callee_class = resolve_inherited(store, &target, &call.callee_method, &superclasses);
                let key = (
                    method_id(&qualname, &call.caller_method),
                    method_id(&callee_class, &call.callee_method),
                );
                if recorded.contains(&key) {
                    continue;
                }
                if store.record_call(&qualname, &call.caller_method, &callee_class, &call.callee_method)
                {
                    recorded.insert(key);
                    stats.calls += 1;
                }
            }
        }
    }

    tracing::debug!(
        extends = stats.extends,
        implements = stats.implements,
        annotated_with = stats.annotated_with,
        calls = stats.calls,
        "linked references"
    );
    stats
}

/// Walks up the superclass chain until a class declaring `method` is found.
/// Falls back to `class` itself so the caller still gets a candidate.
fn resolve_inherited(
    store: &GraphStore,
    class: &str,
    method: &str,
    superclasses: &HashMap<String, String>,
) -> String {
    let mut current = class.to_string();
    let mut seen = HashSet::new();
    loop {
        if store.method(&current, method).is_some() {
            return current;
        }
        if !seen.insert(current.clone()) {
            break;
        }
        match superclasses.get(&current) {
            Some(parent) => current = parent.clone(),
            None => break,
        }
    }
    class.to_string()
}

struct TypeIndex {
    known: HashSet<String>,
    by_simple_name: HashMap<String, Vec<String>>,
}

impl TypeIndex {
    fn build(store: &GraphStore) -> Self {
        let mut known = HashSet::new();
        let mut by_simple_name: HashMap<String, Vec<String>> = HashMap::new();
        for (_, record) in store.classes() {
            let qualname = record.qualname();
            if known.insert(qualname.clone()) {
                by_simple_name
                    .entry(record.name.clone())
                    .or_default()
                    .push(qualname);
            }
        }
        Self {
            known,
            by_simple_name,
        }
    }
}

struct FileScope<'a> {
    index: &'a TypeIndex,
    package: &'a str,
    imports: &'a [String],
}

impl<'a> FileScope<'a> {
    fn new(index: &'a TypeIndex, file: &'a ExtractedFile) -> Self {
        Self {
            index,
            package: &file.package,
            imports: &file.imports,
        }
    }

    /// Qualified name of a type reference as written in this file.
    fn resolve(&self, raw: &str) -> Option<String> {
        let name = util::strip_generics(raw);
        if name.is_empty() {
            return None;
        }
        if name.contains('.') && self.index.known.contains(&name) {
            return Some(name);
        }
        let simple = name.rsplit('.').next().unwrap_or(&name);
        for import in self.imports {
            if import.ends_with(".*") {
                continue;
            }
            if import.rsplit('.').next() == Some(simple) && self.index.known.contains(import) {
                return Some(import.clone());
            }
        }
        let local = qualify(self.package, simple);
        if self.index.known.contains(&local) {
            return Some(local);
        }
        for import in self.imports {
            if let Some(package) = import.strip_suffix(".*") {
                let candidate = qualify(package, simple);
                if self.index.known.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }
        match self.index.by_simple_name.get(simple) {
            Some(candidates) if candidates.len() == 1 => Some(candidates[0].clone()),
            _ => None,
        }
    }

    fn resolve_annotation(&self, store: &GraphStore, name: &str) -> Option<String> {
        let target = self.resolve(name)?;
        let record = store.class(&target)?;
        (record.java_type == JavaType::Annotation).then_some(target)
    }

    fn call_target(
        &self,
        class: &ExtractedClass,
        qualname: &str,
        call: &CallSite,
        superclasses: &HashMap<String, String>,
    ) -> Option<String> {
        let receiver = match call.receiver.as_deref() {
            None | Some("this") => return Some(qualname.to_string()),
            Some("super") => return superclasses.get(qualname).cloned(),
            Some(receiver) => receiver,
        };
        if let Some(field) = class.fields.iter().find(|f| f.name == receiver) {
            return self.resolve(&field.field_type);
        }
        let parameter = class
            .methods
            .iter()
            .filter(|m| m.name == call.caller_method)
            .flat_map(|m| m.parameters.iter())
            .find(|p| p.name == receiver);
        if let Some(parameter) = parameter {
            return self.resolve(&parameter.type_name);
        }
        if receiver.chars().next().is_some_and(|ch| ch.is_ascii_uppercase()) {
            return self.resolve(receiver);
        }
        None
    }
}
