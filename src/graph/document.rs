//! JSON interchange format for attributed graphs
//!
//! The diagram parser lives outside this crate; it hands graphs over in
//! this format, and annotated graphs are written back in it for renderers.

use super::{AttrValue, Attrs, Graph, GraphId};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    /// Node owning the nested graph this node lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

fn convert_attrs(owner: &str, raw: Map<String, Value>) -> Result<Attrs> {
    let mut attrs = Attrs::new();
    for (key, value) in raw {
        let converted = AttrValue::from_json(value).map_err(|e| match e {
            Error::Document(msg) => {
                Error::document(format!("attribute {:?} of {}: {}", key, owner, msg))
            }
            other => other,
        })?;
        if let Some(value) = converted {
            attrs.insert(key, value);
        }
    }
    Ok(attrs)
}

impl GraphDocument {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the graph. Parents must be listed before their children and
    /// edge endpoints before the edge.
    pub fn into_graph(self) -> Result<Graph> {
        let mut graph = Graph::new();

        for record in self.nodes {
            let target = match &record.parent {
                Some(parent) => {
                    let parent = graph.require_node(parent)?;
                    graph.nested_graph(parent)?
                }
                None => GraphId::ROOT,
            };
            let attrs = convert_attrs(&format!("node {}", record.id), record.attrs)?;
            graph.create_node(target, &record.id, attrs)?;
        }

        for record in self.edges {
            let start = graph.require_node(&record.source)?;
            let end = graph.require_node(&record.target)?;
            let owner = match &record.id {
                Some(id) => format!("edge {}", id),
                None => format!("edge {} -> {}", record.source, record.target),
            };
            let attrs = convert_attrs(&owner, record.attrs)?;
            graph.create_edge(record.id.as_deref(), start, end, attrs)?;
        }

        tracing::debug!(
            "Loaded graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

impl Graph {
    /// Render attribute values as JSON; element references become IDs.
    pub fn attr_to_json(&self, value: &AttrValue) -> Value {
        match value {
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Int(i) => Value::from(*i),
            AttrValue::Str(s) => Value::String(s.clone()),
            AttrValue::List(items) => {
                Value::Array(items.iter().map(|item| self.attr_to_json(item)).collect())
            }
            AttrValue::Node(n) if self.contains_node(*n) => Value::String(self.node_id(*n).into()),
            AttrValue::Edge(e) if self.edge_attrs(*e).is_some() => {
                Value::String(self.edge_id(*e).into())
            }
            AttrValue::Node(_) | AttrValue::Edge(_) => Value::Null,
        }
    }

    fn attrs_to_json(&self, attrs: &Attrs) -> Map<String, Value> {
        attrs
            .iter()
            .map(|(key, value)| (key.clone(), self.attr_to_json(value)))
            .collect()
    }

    pub fn to_document(&self) -> GraphDocument {
        let nodes = self
            .nodes()
            .map(|node| NodeRecord {
                id: self.node_id(node).to_string(),
                parent: self
                    .graph_of_node(node)
                    .and_then(|g| self.parent_node(g))
                    .map(|p| self.node_id(p).to_string()),
                attrs: self
                    .node_attrs(node)
                    .map(|a| self.attrs_to_json(a))
                    .unwrap_or_default(),
            })
            .collect();

        let edges = self
            .edges()
            .filter_map(|edge| {
                let (start, end) = self.edge_endpoints(edge)?;
                Some(EdgeRecord {
                    id: Some(self.edge_id(edge).to_string()),
                    source: self.node_id(start).to_string(),
                    target: self.node_id(end).to_string(),
                    attrs: self
                        .edge_attrs(edge)
                        .map(|a| self.attrs_to_json(a))
                        .unwrap_or_default(),
                })
            })
            .collect();

        GraphDocument { nodes, edges }
    }
}
