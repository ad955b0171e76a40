//! Authoritative in-memory graph state.

use std::collections::HashMap;

use crate::model::{EdgeRecord, ElementRef, NodeRecord};

/// The set of node and edge records currently materialized.
///
/// Invariants: node and edge ids are each unique within their own set, and
/// every edge's `source`/`target` resolves to a node present in the same
/// state. The controller owns this exclusively; the rendering surface only
/// mirrors it.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    nodes: HashMap<String, NodeRecord>,
    edges: HashMap<String, EdgeRecord>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn contains(&self, element: &ElementRef) -> bool {
        match element {
            ElementRef::Node(id) => self.contains_node(id),
            ElementRef::Edge(id) => self.contains_edge(id),
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeRecord> {
        self.edges.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Inserts a node. Re-inserting an existing id is a no-op; returns
    /// whether the node was added.
    pub fn insert_node(&mut self, node: NodeRecord) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Inserts an edge if both endpoints exist and the id is new; returns
    /// whether the edge was added.
    pub fn insert_edge(&mut self, edge: EdgeRecord) -> bool {
        if self.edges.contains_key(&edge.id)
            || !self.nodes.contains_key(&edge.source)
            || !self.nodes.contains_key(&edge.target)
        {
            return false;
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    /// The element itself plus its direct neighbourhood: for a node, its
    /// incident edges and their far-end nodes; for an edge, its two
    /// endpoints. Used for tap highlighting.
    pub fn neighbourhood(&self, element: &ElementRef) -> Vec<ElementRef> {
        let mut out = vec![element.clone()];
        match element {
            ElementRef::Node(id) => {
                for edge in self.edges.values() {
                    let other = if edge.source == *id {
                        &edge.target
                    } else if edge.target == *id {
                        &edge.source
                    } else {
                        continue;
                    };
                    out.push(ElementRef::Edge(edge.id.clone()));
                    let other = ElementRef::Node(other.clone());
                    if !out.contains(&other) {
                        out.push(other);
                    }
                }
            }
            ElementRef::Edge(id) => {
                if let Some(edge) = self.edges.get(id) {
                    out.push(ElementRef::Node(edge.source.clone()));
                    let target = ElementRef::Node(edge.target.clone());
                    if !out.contains(&target) {
                        out.push(target);
                    }
                }
            }
        }
        out
    }

    /// Checks the edge-validity invariant. Test support.
    pub fn edges_are_valid(&self) -> bool {
        self.edges.values().all(|edge| {
            self.nodes.contains_key(&edge.source) && self.nodes.contains_key(&edge.target)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeRecord {
        NodeRecord {
            id: id.into(),
            label: String::new(),
            properties: Default::default(),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> EdgeRecord {
        EdgeRecord {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: String::new(),
            properties: Default::default(),
        }
    }

    #[test]
    fn reinserting_a_node_is_a_no_op() {
        let mut state = GraphState::new();
        assert!(state.insert_node(node("a")));
        assert!(!state.insert_node(node("a")));
        assert_eq!(state.node_count(), 1);
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut state = GraphState::new();
        state.insert_node(node("a"));
        assert!(!state.insert_edge(edge("e1", "a", "missing")));
        state.insert_node(node("b"));
        assert!(state.insert_edge(edge("e1", "a", "b")));
        assert!(!state.insert_edge(edge("e1", "a", "b")));
        assert!(state.edges_are_valid());
    }

    #[test]
    fn node_neighbourhood_includes_incident_edges_and_far_ends() {
        let mut state = GraphState::new();
        state.insert_node(node("a"));
        state.insert_node(node("b"));
        state.insert_node(node("c"));
        state.insert_edge(edge("e1", "a", "b"));
        state.insert_edge(edge("e2", "c", "a"));
        state.insert_edge(edge("e3", "b", "c"));

        let hood = state.neighbourhood(&ElementRef::Node("a".into()));
        assert!(hood.contains(&ElementRef::Node("a".into())));
        assert!(hood.contains(&ElementRef::Edge("e1".into())));
        assert!(hood.contains(&ElementRef::Edge("e2".into())));
        assert!(hood.contains(&ElementRef::Node("b".into())));
        assert!(hood.contains(&ElementRef::Node("c".into())));
        assert!(!hood.contains(&ElementRef::Edge("e3".into())));
    }

    #[test]
    fn edge_neighbourhood_is_its_endpoints() {
        let mut state = GraphState::new();
        state.insert_node(node("a"));
        state.insert_node(node("b"));
        state.insert_edge(edge("e1", "a", "b"));

        let hood = state.neighbourhood(&ElementRef::Edge("e1".into()));
        assert_eq!(hood.len(), 3);
        assert!(hood.contains(&ElementRef::Node("a".into())));
        assert!(hood.contains(&ElementRef::Node("b".into())));
    }
}
