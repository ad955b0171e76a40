//! Record models for graph elements, query results, and merge reporting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar property value carried by a node or edge.
///
/// The remote service returns arbitrary JSON; only scalars are kept as
/// element properties. Structured values are not part of the record model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl PropertyValue {
    /// Convert a JSON value to a scalar property, if it is one.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::String(s) => Some(PropertyValue::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PropertyValue::Integer(i))
                } else {
                    n.as_f64().map(PropertyValue::Float)
                }
            }
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Null => Some(PropertyValue::Null),
            _ => None,
        }
    }
}

/// Property map keyed by property name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A node in the exploration graph.
///
/// Identity is by `id`: re-adding a node with an existing id must never
/// create a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Stable identifier, unique across the graph.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Arbitrary scalar properties.
    #[serde(default)]
    pub properties: Properties,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Stable identifier, unique across the graph.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Display label.
    pub label: String,
    /// Arbitrary scalar properties.
    #[serde(default)]
    pub properties: Properties,
}

/// Reference to a materialized element, used for selection and highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ElementRef {
    Node(String),
    Edge(String),
}

impl ElementRef {
    /// The element's id, whichever kind it is.
    pub fn id(&self) -> &str {
        match self {
            ElementRef::Node(id) | ElementRef::Edge(id) => id,
        }
    }
}

/// Deduplicated records produced by the response normalizer,
/// partitioned into nodes and links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedRecords {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<EdgeRecord>,
}

impl NormalizedRecords {
    /// True when the result carries neither nodes nor links.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Outcome of one merge into graph state.
///
/// A merge never fails wholesale: edges with unresolvable endpoints are
/// dropped and reported here instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Nodes newly added to graph state.
    pub added_nodes: usize,
    /// Edges newly added to graph state.
    pub added_edges: usize,
    /// Nodes skipped because their id already existed.
    pub skipped_nodes: usize,
    /// Edges skipped because their id already existed.
    pub skipped_edges: usize,
    /// Ids of edges dropped because an endpoint resolved in neither the
    /// incoming batch nor existing state.
    pub dropped_edges: Vec<String>,
}

impl MergeReport {
    /// True when the merge added at least one element.
    pub fn changed(&self) -> bool {
        self.added_nodes > 0 || self.added_edges > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_from_json_scalars() {
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!("x")),
            Some(PropertyValue::String("x".into()))
        );
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!(3)),
            Some(PropertyValue::Integer(3))
        );
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!(2.5)),
            Some(PropertyValue::Float(2.5))
        );
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!(true)),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(
            PropertyValue::from_json(&serde_json::Value::Null),
            Some(PropertyValue::Null)
        );
    }

    #[test]
    fn property_from_json_rejects_structured_values() {
        assert_eq!(PropertyValue::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(PropertyValue::from_json(&serde_json::json!({"a": 1})), None);
    }

    #[test]
    fn element_ref_id() {
        assert_eq!(ElementRef::Node("n1".into()).id(), "n1");
        assert_eq!(ElementRef::Edge("e1".into()).id(), "e1");
    }
}
