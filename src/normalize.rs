//! Response normalization: raw query results into node/link records.
//!
//! The remote service answers with JSON whose exact envelope is owned by the
//! service, not by the controller. The normalizer's contract is narrow:
//! produce a [`NormalizedRecords`] partition with no duplicate ids within
//! each returned list. Deduplication against already-materialized graph
//! state is the controller's job, not the normalizer's.

use serde_json::Value;

use crate::error::AppError;
use crate::model::{EdgeRecord, NodeRecord, NormalizedRecords, Properties, PropertyValue};

/// Converts one raw query result into deduplicated node/link records.
pub trait ResponseNormalizer: Send + Sync {
    fn normalize(&self, raw: &Value) -> Result<NormalizedRecords, AppError>;
}

/// Normalizer for gremlin-flavoured responses.
///
/// Accepts a `result.data` envelope, a `data` envelope, or a bare array.
/// Expansion queries return nested lists (`[other_nodes, edges, node]`);
/// nesting is flattened to any depth. Elements are classified by their
/// `type` field (`vertex` or `edge`); edges carry `outV` (source) and
/// `inV` (target). Vertex properties in gremlin value-list form are
/// collapsed to their first scalar value.
#[derive(Debug, Clone, Default)]
pub struct GremlinNormalizer;

impl GremlinNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Peel the response envelope down to the element list.
    fn data<'a>(&self, raw: &'a Value) -> Result<&'a Value, AppError> {
        let inner = raw
            .pointer("/result/data")
            .or_else(|| raw.get("data"))
            .unwrap_or(raw);
        if inner.is_array() {
            Ok(inner)
        } else {
            Err(AppError::Normalization(format!(
                "expected an element list, got {}",
                type_name(inner)
            )))
        }
    }

    /// Flatten arbitrarily nested lists into a flat element sequence.
    fn flatten<'a>(&self, value: &'a Value, out: &mut Vec<&'a Value>) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.flatten(item, out);
                }
            }
            other => out.push(other),
        }
    }

    fn parse_vertex(&self, element: &Value) -> Result<NodeRecord, AppError> {
        Ok(NodeRecord {
            id: element_id(element)?,
            label: element_label(element),
            properties: parse_properties(element.get("properties")),
        })
    }

    fn parse_edge(&self, element: &Value) -> Result<EdgeRecord, AppError> {
        let id = element_id(element)?;
        let source = scalar_id(element.get("outV")).ok_or_else(|| {
            AppError::Normalization(format!("edge {id} is missing its outV endpoint"))
        })?;
        let target = scalar_id(element.get("inV")).ok_or_else(|| {
            AppError::Normalization(format!("edge {id} is missing its inV endpoint"))
        })?;
        Ok(EdgeRecord {
            id,
            source,
            target,
            label: element_label(element),
            properties: parse_properties(element.get("properties")),
        })
    }
}

impl ResponseNormalizer for GremlinNormalizer {
    fn normalize(&self, raw: &Value) -> Result<NormalizedRecords, AppError> {
        let mut elements = Vec::new();
        self.flatten(self.data(raw)?, &mut elements);

        let mut records = NormalizedRecords::default();
        for element in elements {
            let Some(obj) = element.as_object() else {
                return Err(AppError::Normalization(format!(
                    "expected an element object, got {}",
                    type_name(element)
                )));
            };
            match obj.get("type").and_then(Value::as_str) {
                Some("vertex") => {
                    let node = self.parse_vertex(element)?;
                    if !records.nodes.iter().any(|n| n.id == node.id) {
                        records.nodes.push(node);
                    }
                }
                Some("edge") => {
                    let edge = self.parse_edge(element)?;
                    if !records.links.iter().any(|e| e.id == edge.id) {
                        records.links.push(edge);
                    }
                }
                Some(other) => {
                    return Err(AppError::Normalization(format!(
                        "unknown element type: {other}"
                    )));
                }
                None => {
                    return Err(AppError::Normalization(
                        "element is missing its type field".into(),
                    ));
                }
            }
        }

        Ok(records)
    }
}

/// Element ids come back as strings or numbers; both map to the string id space.
fn scalar_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn element_id(element: &Value) -> Result<String, AppError> {
    scalar_id(element.get("id"))
        .ok_or_else(|| AppError::Normalization("element is missing its id field".into()))
}

fn element_label(element: &Value) -> String {
    element
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Collapse a gremlin property map to scalar values.
///
/// Handles three shapes per key: a plain scalar, a `{"value": ...}` object,
/// and the vertex value-list form `[{"id": ..., "value": ...}, ...]` (first
/// entry wins). Non-scalar values are skipped.
fn parse_properties(properties: Option<&Value>) -> Properties {
    let mut out = Properties::new();
    let Some(map) = properties.and_then(Value::as_object) else {
        return out;
    };
    for (key, value) in map {
        let scalar = match value {
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("value"))
                .and_then(PropertyValue::from_json),
            Value::Object(_) => value.get("value").and_then(PropertyValue::from_json),
            other => PropertyValue::from_json(other),
        };
        if let Some(scalar) = scalar {
            out.insert(key.clone(), scalar);
        }
    }
    out
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
