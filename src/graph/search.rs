//! Callback-driven graph traversal
//!
//! One traversal core, configured along two independent axes: the
//! expansion [`Strategy`] (stack or queue) and the [`SearchDirection`]
//! (follow edges out of or into the current node). Callers steer the walk
//! through two closures:
//!
//! - `on_enter(node) -> bool` runs once per node when it is taken off the
//!   frontier. Returning `false` makes the node a boundary: none of its
//!   edges is passed to `on_edge`, so edges leaving a boundary are never
//!   tagged. Callers that need them inspect the boundary's edges directly.
//! - `on_edge(current, edge, neighbor, seen) -> bool` runs for every edge of
//!   an expanded node, including edges to neighbors that were already
//!   discovered (`seen == true`), so callers can tag edges on visited paths.
//!   Returning `true` enqueues an unseen neighbor.
//!
//! Each node enters the frontier at most once.

use super::{EdgeHandle, Graph, NodeHandle};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Expand the most recently discovered node first
    #[default]
    DepthFirst,
    /// Expand the earliest discovered node first
    BreadthFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// Follow edges starting at the current node
    #[default]
    Forward,
    /// Follow edges ending at the current node
    Backward,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphSearch<'g> {
    graph: &'g Graph,
    strategy: Strategy,
    direction: SearchDirection,
}

impl<'g> GraphSearch<'g> {
    pub fn new(graph: &'g Graph, strategy: Strategy, direction: SearchDirection) -> Self {
        Self {
            graph,
            strategy,
            direction,
        }
    }

    /// Forward depth-first search
    pub fn dfs(graph: &'g Graph) -> Self {
        Self::new(graph, Strategy::DepthFirst, SearchDirection::Forward)
    }

    /// Forward breadth-first search
    pub fn bfs(graph: &'g Graph) -> Self {
        Self::new(graph, Strategy::BreadthFirst, SearchDirection::Forward)
    }

    pub fn forward(mut self) -> Self {
        self.direction = SearchDirection::Forward;
        self
    }

    pub fn backward(mut self) -> Self {
        self.direction = SearchDirection::Backward;
        self
    }

    /// Run the traversal from `start` until the frontier is empty.
    ///
    /// All start nodes are marked seen before the first one is expanded.
    /// Returns the number of nodes entered.
    pub fn run<I, E, F>(&self, start: I, mut on_enter: E, mut on_edge: F) -> usize
    where
        I: IntoIterator<Item = NodeHandle>,
        E: FnMut(NodeHandle) -> bool,
        F: FnMut(NodeHandle, EdgeHandle, NodeHandle, bool) -> bool,
    {
        let mut seen = HashSet::new();
        let mut frontier = VecDeque::new();
        for node in start {
            if seen.insert(node) {
                frontier.push_back(node);
            }
        }

        let mut entered = 0;
        while let Some(current) = self.pop(&mut frontier) {
            entered += 1;
            if !on_enter(current) {
                continue;
            }

            for edge in self.graph.connected_edges(current) {
                let Some(neighbor) = self.neighbor(current, edge) else {
                    continue;
                };
                let already_seen = seen.contains(&neighbor);
                if on_edge(current, edge, neighbor, already_seen) && !already_seen {
                    seen.insert(neighbor);
                    frontier.push_back(neighbor);
                }
            }
        }

        tracing::trace!(
            "{:?} {:?} search entered {} nodes",
            self.strategy,
            self.direction,
            entered
        );
        entered
    }

    fn pop(&self, frontier: &mut VecDeque<NodeHandle>) -> Option<NodeHandle> {
        match self.strategy {
            Strategy::DepthFirst => frontier.pop_back(),
            Strategy::BreadthFirst => frontier.pop_front(),
        }
    }

    fn neighbor(&self, current: NodeHandle, edge: EdgeHandle) -> Option<NodeHandle> {
        let (start, end) = self.graph.edge_endpoints(edge)?;
        match self.direction {
            SearchDirection::Forward if start == current => Some(end),
            SearchDirection::Backward if end == current => Some(start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Attrs, GraphId};

    /// A -> B, A -> C, B -> D, C -> D
    fn diamond() -> (Graph, [NodeHandle; 4]) {
        let mut graph = Graph::new();
        let a = graph.create_node(GraphId::ROOT, "A", Attrs::new()).unwrap();
        let b = graph.create_node(GraphId::ROOT, "B", Attrs::new()).unwrap();
        let c = graph.create_node(GraphId::ROOT, "C", Attrs::new()).unwrap();
        let d = graph.create_node(GraphId::ROOT, "D", Attrs::new()).unwrap();
        graph.create_edge(Some("AB"), a, b, Attrs::new()).unwrap();
        graph.create_edge(Some("AC"), a, c, Attrs::new()).unwrap();
        graph.create_edge(Some("BD"), b, d, Attrs::new()).unwrap();
        graph.create_edge(Some("CD"), c, d, Attrs::new()).unwrap();
        (graph, [a, b, c, d])
    }

    fn visit_order(search: GraphSearch<'_>, start: NodeHandle) -> Vec<String> {
        let mut order = Vec::new();
        search.run(
            [start],
            |n| {
                order.push(search.graph.node_id(n).to_string());
                true
            },
            |_, _, _, _| true,
        );
        order
    }

    #[test]
    fn test_bfs_order() {
        let (graph, [a, ..]) = diamond();
        assert_eq!(visit_order(GraphSearch::bfs(&graph), a), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_dfs_order() {
        let (graph, [a, ..]) = diamond();
        assert_eq!(visit_order(GraphSearch::dfs(&graph), a), ["A", "C", "D", "B"]);
    }

    #[test]
    fn test_backward_search() {
        let (graph, [.., d]) = diamond();
        assert_eq!(
            visit_order(GraphSearch::bfs(&graph).backward(), d),
            ["D", "B", "C", "A"]
        );
    }

    #[test]
    fn test_edges_to_seen_nodes_are_reported() {
        let (graph, [a, ..]) = diamond();
        let mut reported = Vec::new();
        GraphSearch::bfs(&graph).run(
            [a],
            |_| true,
            |_, e, _, seen| {
                reported.push((graph.edge_id(e).to_string(), seen));
                true
            },
        );
        assert_eq!(
            reported,
            [
                ("AB".to_string(), false),
                ("AC".to_string(), false),
                ("BD".to_string(), false),
                ("CD".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_declined_enter_stops_expansion() {
        let (graph, [a, b, ..]) = diamond();
        let mut entered = Vec::new();
        let mut inspected_from = Vec::new();
        let count = GraphSearch::bfs(&graph).run(
            [a],
            |n| {
                entered.push(n);
                n != b
            },
            |current, _, next, _| {
                inspected_from.push(current);
                next != graph.node_by_id("C").unwrap()
            },
        );
        // B is entered but not expanded, C is never enqueued
        assert_eq!(entered, vec![a, b]);
        assert_eq!(count, 2);
        // the edge B -> D of the declined node is never reported
        assert_eq!(inspected_from, vec![a, a]);
    }

    #[test]
    fn test_start_nodes_are_seen_up_front() {
        let (graph, [a, b, c, d]) = diamond();
        let mut entered = Vec::new();
        GraphSearch::bfs(&graph).run(
            [d, a, d],
            |n| {
                entered.push(n);
                true
            },
            |_, _, _, _| true,
        );
        assert_eq!(entered, vec![d, a, b, c]);
    }
}
