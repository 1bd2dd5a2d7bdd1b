//! Diagram vocabulary and state naming

use crate::graph::{EdgeHandle, Graph, NodeHandle};

/// Name of the implicit "does not exist" state
pub const INITIAL_STATE: &str = "";

/// Node classification derived from the `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    StartEvent,
    EndEvent,
    IntermediateCatchEvent,
    IntermediateThrowEvent,
    Task,
    Gateway,
    Participant,
    TextAnnotation,
    Other,
}

impl NodeType {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "startEvent" => NodeType::StartEvent,
            "endEvent" => NodeType::EndEvent,
            "intermediateCatchEvent" => NodeType::IntermediateCatchEvent,
            "intermediateThrowEvent" => NodeType::IntermediateThrowEvent,
            "participant" => NodeType::Participant,
            "textAnnotation" => NodeType::TextAnnotation,
            "task" | "subProcess" | "callActivity" => NodeType::Task,
            k if k.ends_with("Task") => NodeType::Task,
            k if k.ends_with("Gateway") => NodeType::Gateway,
            _ => NodeType::Other,
        }
    }

    pub fn of(graph: &Graph, node: NodeHandle) -> Self {
        graph
            .node_str(node, "type")
            .map(Self::parse)
            .unwrap_or(NodeType::Other)
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeType::StartEvent => "startEvent",
            NodeType::EndEvent => "endEvent",
            NodeType::IntermediateCatchEvent => "intermediateCatchEvent",
            NodeType::IntermediateThrowEvent => "intermediateThrowEvent",
            NodeType::Task => "task",
            NodeType::Gateway => "gateway",
            NodeType::Participant => "participant",
            NodeType::TextAnnotation => "textAnnotation",
            NodeType::Other => "other",
        }
    }
}

/// Edge classification derived from the `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeType {
    SequenceFlow,
    MessageFlow,
    Association,
    Other,
}

impl EdgeType {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "sequenceFlow" => EdgeType::SequenceFlow,
            "messageFlow" => EdgeType::MessageFlow,
            "association" => EdgeType::Association,
            _ => EdgeType::Other,
        }
    }

    pub fn of(graph: &Graph, edge: EdgeHandle) -> Self {
        graph
            .edge_str(edge, "type")
            .map(Self::parse)
            .unwrap_or(EdgeType::Other)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EdgeType::SequenceFlow => "sequenceFlow",
            EdgeType::MessageFlow => "messageFlow",
            EdgeType::Association => "association",
            EdgeType::Other => "other",
        }
    }
}

/// Generated name for a state nobody labelled
pub fn placeholder_state_name(prefix: &str, node_id: &str) -> String {
    format!("{}{}", prefix, node_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_parse() {
        assert_eq!(NodeType::parse("startEvent"), NodeType::StartEvent);
        assert_eq!(NodeType::parse("sendTask"), NodeType::Task);
        assert_eq!(NodeType::parse("callActivity"), NodeType::Task);
        assert_eq!(NodeType::parse("exclusiveGateway"), NodeType::Gateway);
        assert_eq!(NodeType::parse("dataStoreReference"), NodeType::Other);
    }

    #[test]
    fn test_edge_type_parse() {
        assert_eq!(EdgeType::parse("messageFlow"), EdgeType::MessageFlow);
        assert_eq!(EdgeType::parse("dataOutputAssociation"), EdgeType::Other);
        assert_eq!(EdgeType::MessageFlow.name(), "messageFlow");
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_state_name("S_", "Event_1"), "S_Event_1");
    }
}
