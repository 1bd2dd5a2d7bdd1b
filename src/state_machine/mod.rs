//! State machine module - Infer state machine definitions from process diagrams

use crate::config::AnalyzerConfig;
use crate::graph::{Graph, NodeHandle};
use crate::Result;

pub mod analyzer;
pub mod annotation;
pub mod definition;
pub mod state;
pub mod transition;

// Re-export key types
pub use analyzer::{ProcessAnalyzer, keys};
pub use definition::{Definition, DefinitionBuilder, Diagnostic, ElementRef};
pub use state::{EdgeType, INITIAL_STATE, NodeType};
pub use transition::{Action, Transition};

/// Infer the state machine of `participant_id` from `graph`.
///
/// The graph is annotated in place with the derived attributes listed in
/// [`keys`] and can only be analyzed once; clone it to analyze several
/// participants.
pub fn infer_state_machine(
    graph: &mut Graph,
    participant_id: &str,
    config: &AnalyzerConfig,
) -> Result<Definition> {
    ProcessAnalyzer::new(graph, participant_id, config.clone())?.run()
}

/// Participant nodes, in insertion order
pub fn participants(graph: &Graph) -> Vec<NodeHandle> {
    graph
        .nodes()
        .filter(|n| NodeType::of(graph, *n) == NodeType::Participant)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixture::DiagramFixture;

    #[test]
    fn test_participants_in_insertion_order() {
        let mut f = DiagramFixture::new();
        f.participant("Order", "Order", "P1");
        f.task("Pay", "Pay", "P2");
        f.participant("Invoice", "Invoice", "P3");
        let graph = f.into_graph();

        let ids: Vec<&str> = participants(&graph)
            .into_iter()
            .map(|n| graph.node_id(n))
            .collect();
        assert_eq!(ids, ["Order", "Invoice"]);
    }

    #[test]
    fn test_cloned_graph_analyzed_per_participant() {
        let mut f = DiagramFixture::new();
        f.participant("Order", "Order", "P1");
        f.participant("Invoice", "Invoice", "P3");
        f.start("Start", "P2");
        f.task("Pay", "Pay", "P2");
        f.end("End", "P2");
        f.chain(&["Start", "Pay", "End"]);
        f.message("m1", "Pay", "Order", "");
        let graph = f.into_graph();

        let config = AnalyzerConfig::default();
        let order = infer_state_machine(&mut graph.clone(), "Order", &config).unwrap();
        let invoice = infer_state_machine(&mut graph.clone(), "Invoice", &config).unwrap();
        assert!(order.action("Pay").is_some());
        assert!(invoice.actions.is_empty());
    }
}
