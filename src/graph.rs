//! In-memory knowledge graph over extracted records.
//!
//! Nodes live in an arena and are addressed by [`NodeIndex`]. The owner link of a
//! member or endpoint (`declares` from its class, `handles` to its handler) is
//! stored on the node itself, so a node can never carry two of them. Every other
//! relationship is an entry in the edge list, with per-node adjacency vectors.

use crate::model::{
    ClassRecord, EdgeKind, EdgeRecord, EndpointRecord, FieldRecord, GraphStats, MethodRecord,
    NodeKind, Snapshot, qualify,
};
use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    kind: NodeKind,
    /// `declares` source for methods/fields, `handles` target for endpoints.
    owner: Option<NodeIndex>,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    source: NodeIndex,
    target: NodeIndex,
    kind: EdgeKind,
}

pub fn class_id(qualname: &str) -> String {
    format!("class:{qualname}")
}

pub fn method_id(class_qualname: &str, name: &str) -> String {
    format!("method:{}", qualify(class_qualname, name))
}

pub fn field_id(class_qualname: &str, name: &str) -> String {
    format!("field:{}", qualify(class_qualname, name))
}

pub fn endpoint_id(http_method: &str, path: &str) -> String {
    format!("endpoint:{http_method}:{path}")
}

#[derive(Debug, Default, Clone)]
pub struct GraphStore {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    classes: IndexMap<String, ClassRecord>,
    methods: IndexMap<String, MethodRecord>,
    fields: IndexMap<String, FieldRecord>,
    endpoints: IndexMap<String, EndpointRecord>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites a class. Returns its node id.
    pub fn add_class(&mut self, record: ClassRecord) -> String {
        let id = class_id(&record.qualname());
        self.upsert_node(&id, NodeKind::Class);
        self.classes.insert(id.clone(), record);
        id
    }

    /// Adds or overwrites a method and links it to its class when the class is known.
    pub fn add_method(&mut self, record: MethodRecord) -> String {
        let id = method_id(&record.class_name, &record.name);
        let node = self.upsert_node(&id, NodeKind::Method);
        let owner = self.index.get(&class_id(&record.class_name)).copied();
        self.set_owner(node, owner);
        self.methods.insert(id.clone(), record);
        id
    }

    pub fn add_field(&mut self, record: FieldRecord) -> String {
        let id = field_id(&record.class_name, &record.name);
        let node = self.upsert_node(&id, NodeKind::Field);
        let owner = self.index.get(&class_id(&record.class_name)).copied();
        self.set_owner(node, owner);
        self.fields.insert(id.clone(), record);
        id
    }

    /// Adds or overwrites an endpoint. The `handles` link points at the handler of
    /// the latest write, so two handlers claiming one verb and path resolve to the
    /// last one added.
    pub fn add_endpoint(&mut self, record: EndpointRecord) -> String {
        let id = endpoint_id(&record.http_method, &record.path);
        let node = self.upsert_node(&id, NodeKind::Endpoint);
        let handler = self
            .index
            .get(&method_id(&record.handler_class, &record.handler_method))
            .copied();
        self.set_owner(node, handler);
        self.endpoints.insert(id.clone(), record);
        id
    }

    /// Adds a `calls` edge between two known methods. Unknown endpoints are a
    /// silent no-op; the return value says whether an edge was added.
    pub fn record_call(
        &mut self,
        caller_class: &str,
        caller_method: &str,
        callee_class: &str,
        callee_method: &str,
    ) -> bool {
        let caller = self.lookup(&method_id(caller_class, caller_method), NodeKind::Method);
        let callee = self.lookup(&method_id(callee_class, callee_method), NodeKind::Method);
        match (caller, callee) {
            (Some(source), Some(target)) => {
                self.push_edge(source, target, EdgeKind::Calls);
                true
            }
            _ => false,
        }
    }

    pub fn record_extends(&mut self, class: &str, superclass: &str) -> bool {
        self.link_classes(class, superclass, EdgeKind::Extends)
    }

    pub fn record_implements(&mut self, class: &str, interface: &str) -> bool {
        self.link_classes(class, interface, EdgeKind::Implements)
    }

    /// Links a class or method node to the class node of an annotation type.
    pub fn record_annotated_with(&mut self, node_id: &str, annotation_class: &str) -> bool {
        let Some(source) = self.index.get(node_id).copied() else {
            return false;
        };
        let Some(target) = self.lookup(&class_id(annotation_class), NodeKind::Class) else {
            return false;
        };
        let duplicate = self.outgoing[source.0].iter().any(|&edge| {
            let edge = self.edges[edge];
            edge.kind == EdgeKind::AnnotatedWith && edge.target == target
        });
        if duplicate {
            return false;
        }
        self.push_edge(source, target, EdgeKind::AnnotatedWith);
        true
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            classes: self.classes.len(),
            methods: self.methods.len(),
            fields: self.fields.len(),
            endpoints: self.endpoints.len(),
            total_nodes: self.nodes.len(),
            total_edges: self.edge_count(),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.nodes.iter().filter(|n| n.owner.is_some()).count()
    }

    pub fn class(&self, qualname: &str) -> Option<&ClassRecord> {
        self.classes.get(&class_id(qualname))
    }

    pub fn method(&self, class_qualname: &str, name: &str) -> Option<&MethodRecord> {
        self.methods.get(&method_id(class_qualname, name))
    }

    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassRecord)> {
        self.classes.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Node id of the owning class (methods, fields) or handler (endpoints).
    pub fn owner_of(&self, id: &str) -> Option<&str> {
        let idx = self.index.get(id)?;
        let owner = self.nodes[idx.0].owner?;
        Some(self.nodes[owner.0].id.as_str())
    }

    /// Ids of nodes connected to `id` by edges of `kind`, in edge insertion order.
    pub fn neighbors(&self, id: &str, kind: EdgeKind, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        if matches!(kind, EdgeKind::Declares | EdgeKind::Handles) {
            return self.owner_neighbors(idx, kind, direction);
        }
        let list = match direction {
            Direction::Outgoing => &self.outgoing[idx.0],
            Direction::Incoming => &self.incoming[idx.0],
        };
        list.iter()
            .map(|&edge| self.edges[edge])
            .filter(|edge| edge.kind == kind)
            .map(|edge| match direction {
                Direction::Outgoing => self.nodes[edge.target.0].id.as_str(),
                Direction::Incoming => self.nodes[edge.source.0].id.as_str(),
            })
            .collect()
    }

    /// Every edge as records. Owner edges come first in record order (`declares`
    /// for methods then fields, `handles` for endpoints), followed by the edge list
    /// in insertion order. The order only depends on the records and the edge list,
    /// so a store rebuilt with [`GraphStore::from_snapshot`] exports the same edges.
    pub fn edges(&self) -> Vec<EdgeRecord> {
        let mut out = Vec::with_capacity(self.edge_count());
        for id in self.methods.keys().chain(self.fields.keys()) {
            if let Some(owner) = self.owner_of(id) {
                out.push(EdgeRecord {
                    source: owner.to_string(),
                    target: id.clone(),
                    kind: EdgeKind::Declares,
                });
            }
        }
        for id in self.endpoints.keys() {
            if let Some(handler) = self.owner_of(id) {
                out.push(EdgeRecord {
                    source: id.clone(),
                    target: handler.to_string(),
                    kind: EdgeKind::Handles,
                });
            }
        }
        for edge in &self.edges {
            out.push(EdgeRecord {
                source: self.nodes[edge.source.0].id.clone(),
                target: self.nodes[edge.target.0].id.clone(),
                kind: edge.kind,
            });
        }
        out
    }

    /// Fully owned copy of every record plus the edge list and stats.
    pub fn export(&self) -> Snapshot {
        Snapshot {
            classes: self.classes.clone(),
            methods: self.methods.clone(),
            fields: self.fields.clone(),
            endpoints: self.endpoints.clone(),
            edges: self.edges(),
            stats: self.stats(),
        }
    }

    /// Rebuilds a store from a snapshot. Owner links are re-derived from the
    /// records; the remaining edges are replayed and dropped when an end is unknown.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut store = Self::new();
        for record in snapshot.classes.values() {
            store.add_class(record.clone());
        }
        for record in snapshot.methods.values() {
            store.add_method(record.clone());
        }
        for record in snapshot.fields.values() {
            store.add_field(record.clone());
        }
        for record in snapshot.endpoints.values() {
            store.add_endpoint(record.clone());
        }
        for edge in &snapshot.edges {
            if matches!(edge.kind, EdgeKind::Declares | EdgeKind::Handles) {
                continue;
            }
            let (Some(&source), Some(&target)) =
                (store.index.get(&edge.source), store.index.get(&edge.target))
            else {
                continue;
            };
            store.push_edge(source, target, edge.kind);
        }
        store
    }

    fn upsert_node(&mut self, id: &str, kind: NodeKind) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = NodeIndex(self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            kind,
            owner: None,
        });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn set_owner(&mut self, node: NodeIndex, owner: Option<NodeIndex>) {
        // Re-adding a member whose class is unknown keeps the existing link.
        if owner.is_some() {
            self.nodes[node.0].owner = owner;
        }
    }

    fn lookup(&self, id: &str, kind: NodeKind) -> Option<NodeIndex> {
        let idx = *self.index.get(id)?;
        (self.nodes[idx.0].kind == kind).then_some(idx)
    }

    fn link_classes(&mut self, from: &str, to: &str, kind: EdgeKind) -> bool {
        let source = self.lookup(&class_id(from), NodeKind::Class);
        let target = self.lookup(&class_id(to), NodeKind::Class);
        match (source, target) {
            (Some(source), Some(target)) if source != target => {
                let exists = self.outgoing[source.0].iter().any(|&edge| {
                    let edge = self.edges[edge];
                    edge.kind == kind && edge.target == target
                });
                if !exists {
                    self.push_edge(source, target, kind);
                }
                !exists
            }
            _ => false,
        }
    }

    fn push_edge(&mut self, source: NodeIndex, target: NodeIndex, kind: EdgeKind) {
        let edge = self.edges.len();
        self.edges.push(Edge {
            source,
            target,
            kind,
        });
        self.outgoing[source.0].push(edge);
        self.incoming[target.0].push(edge);
    }

    fn owner_neighbors(&self, idx: NodeIndex, kind: EdgeKind, direction: Direction) -> Vec<&str> {
        let node = &self.nodes[idx.0];
        // declares: class -> member; handles: endpoint -> method
        let child_kinds: &[NodeKind] = match kind {
            EdgeKind::Declares => &[NodeKind::Method, NodeKind::Field],
            _ => &[NodeKind::Endpoint],
        };
        let child_side = match (kind, direction) {
            (EdgeKind::Declares, Direction::Incoming) => true,
            (EdgeKind::Declares, Direction::Outgoing) => false,
            (_, Direction::Outgoing) => true,
            (_, Direction::Incoming) => false,
        };
        if child_side {
            if !child_kinds.contains(&node.kind) {
                return Vec::new();
            }
            node.owner
                .map(|owner| vec![self.nodes[owner.0].id.as_str()])
                .unwrap_or_default()
        } else {
            self.nodes
                .iter()
                .filter(|child| child_kinds.contains(&child.kind) && child.owner == Some(idx))
                .map(|child| child.id.as_str())
                .collect()
        }
    }
}
