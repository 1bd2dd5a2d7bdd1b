//! Attributed, hierarchically nested directed graph
//!
//! All nodes and edges of the whole hierarchy live in a single
//! [`StableGraph`] arena owned by the root [`Graph`]. A nested graph is only a
//! membership list plus the handle of the node that owns it, so cross
//! references are handles rather than pointers and removal never invalidates
//! the handles of other elements.
//!
//! Every attribute write goes through [`Graph::set_node_attr`] /
//! [`Graph::set_edge_attr`] (or their `remove_*` counterparts), which update
//! the root-scoped [`AttrIndex`] in the same call.

use crate::error::{ElementKind, Error, Result};
use indexmap::IndexSet;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub mod attr;
pub mod document;
#[cfg(test)]
pub(crate) mod fixture;
pub mod index;
pub mod search;

pub use attr::{AttrValue, Attrs, attrs};
pub use document::GraphDocument;
pub use index::AttrIndex;
pub use search::{GraphSearch, SearchDirection, Strategy};

/// Stable handle of a node in the arena
pub type NodeHandle = NodeIndex;
/// Stable handle of an edge in the arena
pub type EdgeHandle = EdgeIndex;

/// Handle of one graph in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(usize);

impl GraphId {
    pub const ROOT: GraphId = GraphId(0);
}

#[derive(Debug, Clone)]
struct NodeData {
    id: String,
    attrs: Attrs,
    graph: GraphId,
    nested: Option<GraphId>,
    /// Incident edges, a self-loop appears once
    connected: IndexSet<EdgeHandle>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    id: String,
    attrs: Attrs,
    graph: GraphId,
}

#[derive(Debug, Clone)]
struct NestedGraph {
    parent: Option<NodeHandle>,
    depth: usize,
    alive: bool,
    nodes: IndexSet<NodeHandle>,
    edges: IndexSet<EdgeHandle>,
}

impl NestedGraph {
    fn new(parent: Option<NodeHandle>, depth: usize) -> Self {
        Self {
            parent,
            depth,
            alive: true,
            nodes: IndexSet::new(),
            edges: IndexSet::new(),
        }
    }
}

/// The root graph: owns the element arena, the nested graph table and the
/// node and edge attribute indices.
#[derive(Debug, Clone)]
pub struct Graph {
    arena: StableGraph<NodeData, EdgeData>,
    graphs: Vec<NestedGraph>,
    node_index: AttrIndex<NodeHandle>,
    edge_index: AttrIndex<EdgeHandle>,
    next_edge_id: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            arena: StableGraph::new(),
            graphs: vec![NestedGraph::new(None, 0)],
            node_index: AttrIndex::new(ElementKind::Node),
            edge_index: AttrIndex::new(ElementKind::Edge),
            next_edge_id: 0,
        }
    }

    fn live_graph(&self, graph: GraphId) -> Result<&NestedGraph> {
        self.graphs
            .get(graph.0)
            .filter(|g| g.alive)
            .ok_or_else(|| Error::missing(ElementKind::Node, format!("graph #{}", graph.0)))
    }

    fn missing_node(node: NodeHandle) -> Error {
        Error::missing(ElementKind::Node, format!("#{}", node.index()))
    }

    fn missing_edge(edge: EdgeHandle) -> Error {
        Error::missing(ElementKind::Edge, format!("#{}", edge.index()))
    }

    // -------------------------------------------------------------------------
    // Construction and removal
    // -------------------------------------------------------------------------

    /// Create a node inside `graph`.
    pub fn create_node(&mut self, graph: GraphId, id: &str, attrs: Attrs) -> Result<NodeHandle> {
        self.live_graph(graph)?;
        if self.node_index.by_id(id).is_some() {
            return Err(Error::duplicate(ElementKind::Node, id));
        }

        let handle = self.arena.add_node(NodeData {
            id: id.to_string(),
            attrs,
            graph,
            nested: None,
            connected: IndexSet::new(),
        });
        self.node_index
            .insert(id, handle, &self.arena[handle].attrs)?;
        self.graphs[graph.0].nodes.insert(handle);
        Ok(handle)
    }

    /// Create an edge between two existing nodes.
    ///
    /// The edge is placed in the lowest graph containing both endpoints. A
    /// missing `id` is replaced by a generated one.
    pub fn create_edge(
        &mut self,
        id: Option<&str>,
        start: NodeHandle,
        end: NodeHandle,
        attrs: Attrs,
    ) -> Result<EdgeHandle> {
        let start_graph = self
            .arena
            .node_weight(start)
            .ok_or_else(|| Self::missing_node(start))?
            .graph;
        let end_graph = self
            .arena
            .node_weight(end)
            .ok_or_else(|| Self::missing_node(end))?
            .graph;

        let id = match id {
            Some(id) => {
                if self.edge_index.by_id(id).is_some() {
                    return Err(Error::duplicate(ElementKind::Edge, id));
                }
                id.to_string()
            }
            None => self.generate_edge_id(),
        };

        let graph = self.common_graph(start_graph, end_graph);
        let handle = self.arena.add_edge(
            start,
            end,
            EdgeData {
                id: id.clone(),
                attrs,
                graph,
            },
        );
        self.edge_index
            .insert(&id, handle, &self.arena[handle].attrs)?;
        self.arena[start].connected.insert(handle);
        self.arena[end].connected.insert(handle);
        self.graphs[graph.0].edges.insert(handle);
        Ok(handle)
    }

    fn generate_edge_id(&mut self) -> String {
        loop {
            let candidate = format!("_edge_{}", self.next_edge_id);
            self.next_edge_id += 1;
            if self.edge_index.by_id(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn parent_graph(&self, graph: GraphId) -> Option<GraphId> {
        self.graphs[graph.0]
            .parent
            .and_then(|node| self.arena.node_weight(node))
            .map(|data| data.graph)
    }

    fn common_graph(&self, a: GraphId, b: GraphId) -> GraphId {
        let mut ancestors = HashSet::new();
        let mut current = Some(a);
        while let Some(graph) = current {
            ancestors.insert(graph);
            current = self.parent_graph(graph);
        }

        let mut current = Some(b);
        while let Some(graph) = current {
            if ancestors.contains(&graph) {
                return graph;
            }
            current = self.parent_graph(graph);
        }
        GraphId::ROOT
    }

    pub fn remove_edge(&mut self, edge: EdgeHandle) -> Result<()> {
        let (start, end) = self
            .arena
            .edge_endpoints(edge)
            .ok_or_else(|| Self::missing_edge(edge))?;
        self.edge_index.remove(edge, &self.arena[edge].attrs)?;

        let data = self
            .arena
            .remove_edge(edge)
            .ok_or_else(|| Self::missing_edge(edge))?;
        self.arena[start].connected.shift_remove(&edge);
        self.arena[end].connected.shift_remove(&edge);
        self.graphs[data.graph.0].edges.shift_remove(&edge);
        Ok(())
    }

    /// Remove a node, its connected edges and its nested graph's content.
    pub fn remove_node(&mut self, node: NodeHandle) -> Result<()> {
        let (nested, connected) = {
            let data = self
                .arena
                .node_weight(node)
                .ok_or_else(|| Self::missing_node(node))?;
            (data.nested, data.connected.clone())
        };

        if let Some(nested) = nested {
            let children: Vec<NodeHandle> = self.graphs[nested.0].nodes.iter().copied().collect();
            for child in children {
                self.remove_node(child)?;
            }
            self.graphs[nested.0].alive = false;
        }

        for edge in connected {
            self.remove_edge(edge)?;
        }

        self.node_index.remove(node, &self.arena[node].attrs)?;
        let data = self
            .arena
            .remove_node(node)
            .ok_or_else(|| Self::missing_node(node))?;
        self.graphs[data.graph.0].nodes.shift_remove(&node);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// The node's child graph, created on first request.
    pub fn nested_graph(&mut self, node: NodeHandle) -> Result<GraphId> {
        let data = self
            .arena
            .node_weight(node)
            .ok_or_else(|| Self::missing_node(node))?;
        if let Some(nested) = data.nested {
            return Ok(nested);
        }

        let depth = self.graphs[data.graph.0].depth + 1;
        let nested = GraphId(self.graphs.len());
        self.graphs.push(NestedGraph::new(Some(node), depth));
        self.arena[node].nested = Some(nested);
        Ok(nested)
    }

    /// The node's child graph if it has been materialized.
    pub fn existing_nested_graph(&self, node: NodeHandle) -> Option<GraphId> {
        self.arena.node_weight(node).and_then(|data| data.nested)
    }

    pub fn parent_node(&self, graph: GraphId) -> Option<NodeHandle> {
        self.graphs.get(graph.0).and_then(|g| g.parent)
    }

    pub fn graph_of_node(&self, node: NodeHandle) -> Option<GraphId> {
        self.arena.node_weight(node).map(|data| data.graph)
    }

    pub fn graph_of_edge(&self, edge: EdgeHandle) -> Option<GraphId> {
        self.arena.edge_weight(edge).map(|data| data.graph)
    }

    pub fn depth(&self, graph: GraphId) -> usize {
        self.graphs.get(graph.0).map(|g| g.depth).unwrap_or_default()
    }

    /// Nodes directly inside `graph`, in insertion order
    pub fn nodes_in(&self, graph: GraphId) -> impl Iterator<Item = NodeHandle> + '_ {
        self.graphs
            .get(graph.0)
            .into_iter()
            .flat_map(|g| g.nodes.iter().copied())
    }

    /// Edges directly inside `graph`, in insertion order
    pub fn edges_in(&self, graph: GraphId) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.graphs
            .get(graph.0)
            .into_iter()
            .flat_map(|g| g.edges.iter().copied())
    }

    // -------------------------------------------------------------------------
    // Root-scoped queries
    // -------------------------------------------------------------------------

    /// All nodes of the hierarchy, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.node_index.handles()
    }

    /// All edges of the hierarchy, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.edge_index.handles()
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.node_index.by_id(id)
    }

    pub fn edge_by_id(&self, id: &str) -> Option<EdgeHandle> {
        self.edge_index.by_id(id)
    }

    /// Like [`Graph::node_by_id`], failing with `MissingElement`
    pub fn require_node(&self, id: &str) -> Result<NodeHandle> {
        self.node_by_id(id)
            .ok_or_else(|| Error::missing(ElementKind::Node, id))
    }

    pub fn require_edge(&self, id: &str) -> Result<EdgeHandle> {
        self.edge_by_id(id)
            .ok_or_else(|| Error::missing(ElementKind::Edge, id))
    }

    pub fn create_node_index(&mut self, key: &str) -> Result<()> {
        let arena = &self.arena;
        self.node_index
            .create_index(key, |h| arena.node_weight(h).and_then(|d| d.attrs.get(key)))
    }

    pub fn create_edge_index(&mut self, key: &str) -> Result<()> {
        let arena = &self.arena;
        self.edge_index
            .create_index(key, |h| arena.edge_weight(h).and_then(|d| d.attrs.get(key)))
    }

    pub fn nodes_by_attr(&self, key: &str, value: impl Into<AttrValue>) -> Result<Vec<NodeHandle>> {
        self.node_index.by_attr(key, &value.into())
    }

    pub fn edges_by_attr(&self, key: &str, value: impl Into<AttrValue>) -> Result<Vec<EdgeHandle>> {
        self.edge_index.by_attr(key, &value.into())
    }

    // -------------------------------------------------------------------------
    // Element access
    // -------------------------------------------------------------------------

    /// ID of a live node.
    ///
    /// # Panics
    /// Panics if the handle does not refer to a live node.
    pub fn node_id(&self, node: NodeHandle) -> &str {
        &self.arena[node].id
    }

    /// ID of a live edge.
    ///
    /// # Panics
    /// Panics if the handle does not refer to a live edge.
    pub fn edge_id(&self, edge: EdgeHandle) -> &str {
        &self.arena[edge].id
    }

    pub fn contains_node(&self, node: NodeHandle) -> bool {
        self.arena.contains_node(node)
    }

    pub fn node_attrs(&self, node: NodeHandle) -> Option<&Attrs> {
        self.arena.node_weight(node).map(|d| &d.attrs)
    }

    pub fn edge_attrs(&self, edge: EdgeHandle) -> Option<&Attrs> {
        self.arena.edge_weight(edge).map(|d| &d.attrs)
    }

    pub fn node_attr(&self, node: NodeHandle, key: &str) -> Option<&AttrValue> {
        self.node_attrs(node).and_then(|attrs| attrs.get(key))
    }

    pub fn edge_attr(&self, edge: EdgeHandle, key: &str) -> Option<&AttrValue> {
        self.edge_attrs(edge).and_then(|attrs| attrs.get(key))
    }

    pub fn node_str(&self, node: NodeHandle, key: &str) -> Option<&str> {
        self.node_attr(node, key).and_then(AttrValue::as_str)
    }

    pub fn edge_str(&self, edge: EdgeHandle, key: &str) -> Option<&str> {
        self.edge_attr(edge, key).and_then(AttrValue::as_str)
    }

    /// True when the node carries `key = true`
    pub fn node_flag(&self, node: NodeHandle, key: &str) -> bool {
        self.node_attr(node, key).is_some_and(AttrValue::is_true)
    }

    pub fn edge_endpoints(&self, edge: EdgeHandle) -> Option<(NodeHandle, NodeHandle)> {
        self.arena.edge_endpoints(edge)
    }

    /// Edges incident to `node` in connection order
    pub fn connected_edges(&self, node: NodeHandle) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.arena
            .node_weight(node)
            .into_iter()
            .flat_map(|d| d.connected.iter().copied())
    }

    // -------------------------------------------------------------------------
    // Attribute mutation
    // -------------------------------------------------------------------------

    pub fn set_node_attr(
        &mut self,
        node: NodeHandle,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Result<()> {
        self.write_node_attr(node, key, Some(value.into()))
    }

    pub fn remove_node_attr(&mut self, node: NodeHandle, key: &str) -> Result<()> {
        self.write_node_attr(node, key, None)
    }

    pub fn set_edge_attr(
        &mut self,
        edge: EdgeHandle,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Result<()> {
        self.write_edge_attr(edge, key, Some(value.into()))
    }

    pub fn remove_edge_attr(&mut self, edge: EdgeHandle, key: &str) -> Result<()> {
        self.write_edge_attr(edge, key, None)
    }

    fn write_node_attr(
        &mut self,
        node: NodeHandle,
        key: &str,
        value: Option<AttrValue>,
    ) -> Result<()> {
        let data = self
            .arena
            .node_weight_mut(node)
            .ok_or_else(|| Self::missing_node(node))?;
        let old = data.attrs.get(key);
        if old == value.as_ref() {
            return Ok(());
        }
        if self.node_index.has_index(key) {
            self.node_index.update(key, old, value.as_ref(), node)?;
        }
        match value {
            Some(value) => {
                data.attrs.insert(key.to_string(), value);
            }
            None => {
                data.attrs.shift_remove(key);
            }
        }
        Ok(())
    }

    fn write_edge_attr(
        &mut self,
        edge: EdgeHandle,
        key: &str,
        value: Option<AttrValue>,
    ) -> Result<()> {
        let data = self
            .arena
            .edge_weight_mut(edge)
            .ok_or_else(|| Self::missing_edge(edge))?;
        let old = data.attrs.get(key);
        if old == value.as_ref() {
            return Ok(());
        }
        if self.edge_index.has_index(key) {
            self.edge_index.update(key, old, value.as_ref(), edge)?;
        }
        match value {
            Some(value) => {
                data.attrs.insert(key.to_string(), value);
            }
            None => {
                data.attrs.shift_remove(key);
            }
        }
        Ok(())
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_type = BTreeMap::new();
        for node in self.nodes() {
            let kind = self.node_str(node, "type").unwrap_or("-").to_string();
            *nodes_by_type.entry(kind).or_insert(0) += 1;
        }
        let mut edges_by_type = BTreeMap::new();
        for edge in self.edges() {
            let kind = self.edge_str(edge, "type").unwrap_or("-").to_string();
            *edges_by_type.entry(kind).or_insert(0) += 1;
        }

        GraphStats {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            nested_graphs: self.graphs.iter().skip(1).filter(|g| g.alive).count(),
            max_depth: self
                .graphs
                .iter()
                .filter(|g| g.alive)
                .map(|g| g.depth)
                .max()
                .unwrap_or_default(),
            nodes_by_type,
            edges_by_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nested_graphs: usize,
    pub max_depth: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<String, usize>,
}
