//! Process analyzer
//!
//! Infers the state machine of one participant from a process diagram. The
//! participant is observed only through its message exchanges: a task in
//! another process that sends a message to the participant invokes an
//! action, and the task that gets the answer back determines which state
//! the action leads to. States are the stretches of the diagram between
//! such exchanges.
//!
//! The run is split into stages, each a method below:
//!
//! 1. classify message flows into invoking and (potentially) receiving nodes
//! 2. pair every invoking node with the receiving nodes its flow reaches
//! 3. read `@label` annotations
//! 4. compute, for every state-defining node, the next invoking nodes and
//!    the annotations on the way there, then name the state
//! 5. assemble actions and transitions
//!
//! Derived attributes are written back onto the graph for renderers (see
//! [`keys`]). Structural problems become diagnostics in the returned
//! definition; only integrity failures abort the run.

use super::annotation::LabelParser;
use super::definition::{Definition, DefinitionBuilder, ElementRef};
use super::state::{EdgeType, INITIAL_STATE, NodeType, placeholder_state_name};
use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::graph::{AttrValue, EdgeHandle, Graph, GraphSearch, NodeHandle, attrs};
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeSet, HashSet};


/// Attribute keys read and written by the analyzer
pub mod keys {
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const TEXT: &str = "text";
    pub const PROCESS: &str = "process";

    pub const INVOKING: &str = "_invoking";
    pub const RECEIVING: &str = "_receiving";
    pub const POTENTIAL_RECEIVING: &str = "_potential_receiving";
    pub const ACTION: &str = "_action";
    pub const TRANSITION: &str = "_transition";
    pub const ANNOTATION_STATE: &str = "_annotation_state";
    pub const STATE: &str = "_state";
    pub const NEXT_INVOKING_NODES: &str = "_next_invoking_nodes";
    pub const NEXT_ANNOTATIONS: &str = "_next_annotations";
    pub const GENERATED: &str = "_generated";
    pub const ERROR: &str = "_error";
}

/// Participant IDs end up as identifiers in generated code
pub fn is_valid_participant_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[derive(Debug, Clone, Default)]
struct StateRecord {
    /// Invoking, potentially receiving and end nodes reachable without
    /// passing another one of them
    next: IndexSet<NodeHandle>,
    annotations: BTreeSet<String>,
    annotated_by: Vec<NodeHandle>,
    region_nodes: IndexSet<NodeHandle>,
    region_edges: IndexSet<EdgeHandle>,
    name: String,
}

pub struct ProcessAnalyzer<'g> {
    graph: &'g mut Graph,
    config: AnalyzerConfig,
    builder: DefinitionBuilder,
    participant: NodeHandle,
    process: String,
    invoking_arrows: IndexMap<NodeHandle, Vec<EdgeHandle>>,
    receiving_arrows: IndexMap<NodeHandle, Vec<EdgeHandle>>,
    /// invoking node -> paired receiving nodes
    receivers: IndexMap<NodeHandle, IndexSet<NodeHandle>>,
    /// receiving node -> the invoking node it was first paired with
    invokers: IndexMap<NodeHandle, NodeHandle>,
    states: IndexMap<NodeHandle, StateRecord>,
}

impl<'g> ProcessAnalyzer<'g> {
    /// Prepare a run: declare the attribute indices and resolve the participant.
    ///
    /// The graph must not have been analyzed before.
    pub fn new(graph: &'g mut Graph, participant_id: &str, config: AnalyzerConfig) -> Result<Self> {
        if !is_valid_participant_id(participant_id) {
            return Err(Error::InvalidParticipantId(participant_id.to_string()));
        }

        graph.create_node_index(keys::TYPE)?;
        graph.create_edge_index(keys::TYPE)?;
        for key in [keys::INVOKING, keys::RECEIVING, keys::POTENTIAL_RECEIVING] {
            graph.create_node_index(key)?;
        }

        let participant = graph.require_node(participant_id)?;
        if NodeType::of(graph, participant) != NodeType::Participant {
            tracing::warn!("Node {} is not a participant", participant_id);
        }

        let process = match graph.node_str(participant, keys::PROCESS) {
            Some(process) => process.to_string(),
            None => {
                let process = format!("_process_{}", participant_id);
                graph.set_node_attr(participant, keys::PROCESS, process.as_str())?;
                process
            }
        };
        tracing::debug!("Analyzing participant {} (process {})", participant_id, process);

        Ok(Self {
            graph,
            config,
            builder: DefinitionBuilder::new(participant_id),
            participant,
            process,
            invoking_arrows: IndexMap::new(),
            receiving_arrows: IndexMap::new(),
            receivers: IndexMap::new(),
            invokers: IndexMap::new(),
            states: IndexMap::new(),
        })
    }

    pub fn run(mut self) -> Result<Definition> {
        self.classify_message_flows()?;
        self.pair_invoking_nodes()?;
        self.resolve_annotations()?;
        self.build_state_relation()?;
        self.propagate_annotations()?;
        self.resolve_state_names()?;
        self.assemble()?;

        let definition = self.builder.build();
        tracing::info!(
            "Inferred {} states and {} actions for {} ({} errors, {} warnings)",
            definition.states.len(),
            definition.actions.len(),
            definition.name,
            definition.errors.len(),
            definition.warnings.len()
        );
        Ok(definition)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn in_participant(&self, node: NodeHandle) -> bool {
        self.graph.node_str(node, keys::PROCESS) == Some(self.process.as_str())
    }

    fn annotation_of(&self, node: NodeHandle) -> Option<&str> {
        self.graph.node_str(node, keys::ANNOTATION_STATE)
    }

    fn action_of(&self, node: NodeHandle) -> String {
        self.graph
            .node_str(node, keys::ACTION)
            .unwrap_or_default()
            .to_string()
    }

    fn display_name(&self, node: NodeHandle) -> String {
        match self.graph.node_str(node, keys::NAME).map(str::trim) {
            Some(name) if !name.is_empty() => format!("{:?} ({})", name, self.graph.node_id(node)),
            _ => self.graph.node_id(node).to_string(),
        }
    }

    fn element_refs(&self, nodes: &[NodeHandle], edges: &[EdgeHandle]) -> Vec<ElementRef> {
        nodes
            .iter()
            .map(|n| ElementRef::Node(self.graph.node_id(*n).to_string()))
            .chain(
                edges
                    .iter()
                    .map(|e| ElementRef::Edge(self.graph.edge_id(*e).to_string())),
            )
            .collect()
    }

    fn report_error(
        &mut self,
        message: String,
        nodes: &[NodeHandle],
        edges: &[EdgeHandle],
    ) -> Result<()> {
        tracing::debug!("Structural error: {}", message);
        let elements = self.element_refs(nodes, edges);
        self.builder.add_error(message, elements);
        for &node in nodes {
            self.graph.set_node_attr(node, keys::ERROR, true)?;
        }
        for &edge in edges {
            self.graph.set_edge_attr(edge, keys::ERROR, true)?;
        }
        Ok(())
    }

    fn report_warning(&mut self, message: String, nodes: &[NodeHandle], edges: &[EdgeHandle]) {
        tracing::warn!("{}", message);
        let elements = self.element_refs(nodes, edges);
        self.builder.add_warning(message, elements);
    }

    // -------------------------------------------------------------------------
    // Message exchange
    // -------------------------------------------------------------------------

    /// Preferred action name: the arrow's label, then the name of the task
    /// receiving the call, then the caller's own name.
    fn action_name(&self, edge: EdgeHandle, source: NodeHandle, target: NodeHandle) -> String {
        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        non_empty(self.graph.edge_str(edge, keys::NAME))
            .or_else(|| {
                (NodeType::of(self.graph, target) != NodeType::Participant)
                    .then(|| non_empty(self.graph.node_str(target, keys::NAME)))
                    .flatten()
            })
            .or_else(|| non_empty(self.graph.node_str(source, keys::NAME)))
            .unwrap_or_else(|| self.graph.node_id(source).to_string())
    }

    fn classify_message_flows(&mut self) -> Result<()> {
        let flows = self
            .graph
            .edges_by_attr(keys::TYPE, EdgeType::MessageFlow.name())?;

        for edge in flows {
            let Some((source, target)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let source_inside = self.in_participant(source);
            let target_inside = self.in_participant(target);

            if !source_inside && target_inside {
                self.invoking_arrows.entry(source).or_default().push(edge);
                let action = self.action_name(edge, source, target);

                match self.graph.node_str(source, keys::ACTION).map(str::to_string) {
                    Some(existing) if existing != action => {
                        let message = format!(
                            "Multiple actions invoked by a single task {}: {:?} and {:?}",
                            self.display_name(source),
                            existing,
                            action
                        );
                        let arrows = self.invoking_arrows[&source].clone();
                        self.report_error(message, &[source], &arrows)?;
                    }
                    Some(_) => {}
                    None => {
                        self.graph.set_node_attr(source, keys::INVOKING, true)?;
                        self.graph.set_node_attr(source, keys::ACTION, action)?;
                    }
                }
            } else if source_inside && !target_inside {
                self.receiving_arrows.entry(target).or_default().push(edge);
                self.graph.set_node_attr(target, keys::RECEIVING, true)?;
                self.graph
                    .set_node_attr(target, keys::POTENTIAL_RECEIVING, true)?;
            }
        }

        tracing::debug!(
            "Found {} invoking and {} potentially receiving nodes",
            self.invoking_arrows.len(),
            self.receiving_arrows.len()
        );
        Ok(())
    }

    /// Receiving nodes reachable from `node` within its own process without
    /// passing another invoking node, a catch event or an end event, together
    /// with the edges followed on the way.
    fn find_receiving_nodes(&self, node: NodeHandle) -> (IndexSet<NodeHandle>, HashSet<EdgeHandle>) {
        let graph: &Graph = &*self.graph;
        let process = graph.node_str(node, keys::PROCESS);
        let mut found = IndexSet::new();
        let mut followed = HashSet::new();

        GraphSearch::dfs(graph).run(
            [node],
            |current| {
                if current != node && graph.node_flag(current, keys::RECEIVING) {
                    found.insert(current);
                    return false;
                }
                true
            },
            |_, edge, next, _| {
                if EdgeType::of(graph, edge) != EdgeType::SequenceFlow
                    || graph.node_str(next, keys::PROCESS) != process
                {
                    return false;
                }
                let blocked = graph.node_flag(next, keys::INVOKING)
                    || matches!(
                        NodeType::of(graph, next),
                        NodeType::IntermediateCatchEvent | NodeType::EndEvent
                    );
                let passable = graph.node_flag(next, keys::RECEIVING) || !blocked;
                if passable {
                    followed.insert(edge);
                }
                passable
            },
        );
        (found, followed)
    }

    /// Nodes and edges on the followed paths from an invoking node to its
    /// receiving nodes
    fn transition_span(
        &self,
        receiving: &IndexSet<NodeHandle>,
        followed: &HashSet<EdgeHandle>,
    ) -> (Vec<NodeHandle>, Vec<EdgeHandle>) {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        GraphSearch::dfs(self.graph).backward().run(
            receiving.iter().copied(),
            |current| {
                nodes.push(current);
                true
            },
            |_, edge, _, _| {
                let on_path = followed.contains(&edge);
                if on_path {
                    edges.push(edge);
                }
                on_path
            },
        );
        (nodes, edges)
    }

    fn pair_invoking_nodes(&mut self) -> Result<()> {
        let invoking = self.graph.nodes_by_attr(keys::INVOKING, true)?;
        let mut unpaired = Vec::new();
        let mut reported = HashSet::new();

        for node in invoking {
            let arrows = self.invoking_arrows.get(&node).cloned().unwrap_or_default();
            if arrows.len() > 1 {
                let message = format!(
                    "Multiple invoking arrows leave task {}",
                    self.display_name(node)
                );
                self.report_error(message, &[node], &arrows)?;
            }

            let (found, followed) = self.find_receiving_nodes(node);
            if found.is_empty() {
                unpaired.push(node);
                continue;
            }

            for &receiving in &found {
                let arrows = self
                    .receiving_arrows
                    .get(&receiving)
                    .cloned()
                    .unwrap_or_default();
                if arrows.len() > 1 && reported.insert(receiving) {
                    let message = format!(
                        "Multiple receiving arrows arrive at task {}",
                        self.display_name(receiving)
                    );
                    self.report_error(message, &[receiving], &arrows)?;
                }
                self.invokers.entry(receiving).or_insert(node);
            }

            let action = self.action_of(node);
            let (span_nodes, span_edges) = self.transition_span(&found, &followed);
            for span_node in span_nodes {
                self.graph
                    .set_node_attr(span_node, keys::TRANSITION, action.as_str())?;
            }
            for span_edge in span_edges {
                self.graph
                    .set_edge_attr(span_edge, keys::TRANSITION, action.as_str())?;
            }

            tracing::debug!(
                "Action {:?} is answered at {} receiving nodes",
                action,
                found.len()
            );
            self.receivers.insert(node, found);
        }

        for node in unpaired {
            self.pair_with_itself(node)?;
        }

        for node in self.graph.nodes_by_attr(keys::RECEIVING, true)? {
            if !self.invokers.contains_key(&node) {
                tracing::debug!("{} receives messages but answers no action", self.display_name(node));
                self.graph.remove_node_attr(node, keys::RECEIVING)?;
            }
        }
        Ok(())
    }

    /// No receiving node was found: the invoking node receives the answer
    /// itself, as in a synchronous call. In rewrite mode the implied return
    /// message is added to the diagram.
    fn pair_with_itself(&mut self, node: NodeHandle) -> Result<()> {
        let action = self.action_of(node);
        let name = self.display_name(node);
        let arrow = self
            .invoking_arrows
            .get(&node)
            .and_then(|arrows| arrows.first().copied());

        if self.config.rewrite
            && let Some(arrow) = arrow
            && let Some((_, callee)) = self.graph.edge_endpoints(arrow)
        {
            let edge = self.graph.create_edge(
                None,
                callee,
                node,
                attrs([
                    (keys::TYPE, AttrValue::from(EdgeType::MessageFlow.name())),
                    (keys::NAME, AttrValue::from(action.as_str())),
                    (keys::GENERATED, AttrValue::from(true)),
                    (keys::TRANSITION, AttrValue::from(action.as_str())),
                ]),
            )?;
            self.receiving_arrows.entry(node).or_default().push(edge);
            let message = format!(
                "No receiving task found for {}; generated a return message flow",
                name
            );
            self.report_warning(message, &[node], &[edge]);
        } else {
            let message = format!(
                "No receiving task found for {}; treating it as a synchronous call",
                name
            );
            self.report_warning(message, &[node], &[]);
        }

        self.graph.set_node_attr(node, keys::RECEIVING, true)?;
        self.graph
            .set_node_attr(node, keys::POTENTIAL_RECEIVING, true)?;
        self.graph
            .set_node_attr(node, keys::TRANSITION, action.as_str())?;
        self.receivers.insert(node, IndexSet::from([node]));
        self.invokers.insert(node, node);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Annotations
    // -------------------------------------------------------------------------

    fn accepts_annotations(&self, node: NodeHandle) -> bool {
        node != self.participant
            && !matches!(
                NodeType::of(self.graph, node),
                NodeType::Participant | NodeType::TextAnnotation
            )
            && !self.in_participant(node)
            && !self.graph.node_flag(node, keys::ERROR)
    }

    /// State labels from the node's name and its attached text annotations
    fn collect_labels(
        &self,
        parser: &LabelParser,
        node: NodeHandle,
    ) -> (BTreeSet<String>, Vec<NodeHandle>) {
        let graph: &Graph = &*self.graph;
        let mut labels = BTreeSet::new();
        let mut sources = vec![node];

        if let Some(name) = graph.node_str(node, keys::NAME) {
            labels.extend(parser.parse_text(name));
        }

        for edge in graph.connected_edges(node) {
            if EdgeType::of(graph, edge) != EdgeType::Association {
                continue;
            }
            let Some((start, end)) = graph.edge_endpoints(edge) else {
                continue;
            };
            let other = if start == node { end } else { start };
            if NodeType::of(graph, other) != NodeType::TextAnnotation {
                continue;
            }
            let text = graph
                .node_str(other, keys::TEXT)
                .or_else(|| graph.node_str(other, keys::NAME));
            if let Some(text) = text {
                labels.extend(parser.parse_text(text));
                sources.push(other);
            }
        }
        (labels, sources)
    }

    fn resolve_annotations(&mut self) -> Result<()> {
        let parser = LabelParser::for_participant(
            self.graph.node_str(self.participant, keys::NAME),
            &self.config.label_marker,
        )?;
        tracing::debug!("Reading state labels with marker {:?}", parser.marker());

        let nodes: Vec<NodeHandle> = self.graph.nodes().collect();
        let mut labelled = 0;
        for node in nodes {
            if !self.accepts_annotations(node) {
                continue;
            }

            let (labels, sources) = self.collect_labels(&parser, node);
            match labels.len() {
                0 => self.graph.remove_node_attr(node, keys::ANNOTATION_STATE)?,
                1 => {
                    let label = labels.into_iter().next().unwrap_or_default();
                    self.graph
                        .set_node_attr(node, keys::ANNOTATION_STATE, label)?;
                    labelled += 1;
                }
                _ => {
                    let names: Vec<String> = labels.iter().map(|l| format!("{:?}", l)).collect();
                    let message = format!(
                        "Multiple annotations on a single node {}: {}",
                        self.display_name(node),
                        names.join(", ")
                    );
                    self.report_error(message, &sources, &[])?;
                    self.graph.remove_node_attr(node, keys::ANNOTATION_STATE)?;
                }
            }
        }

        tracing::debug!("Found {} labelled nodes", labelled);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // States
    // -------------------------------------------------------------------------

    /// Start events outside the participant, then potentially receiving nodes
    fn state_defining_nodes(&self) -> Result<Vec<NodeHandle>> {
        let mut nodes = IndexSet::new();
        for node in self
            .graph
            .nodes_by_attr(keys::TYPE, NodeType::StartEvent.name())?
        {
            if !self.in_participant(node) {
                nodes.insert(node);
            }
        }
        nodes.extend(self.graph.nodes_by_attr(keys::POTENTIAL_RECEIVING, true)?);
        Ok(nodes.into_iter().collect())
    }

    fn ends_state(&self, node: NodeHandle) -> bool {
        self.graph.node_flag(node, keys::INVOKING)
            || self.graph.node_flag(node, keys::POTENTIAL_RECEIVING)
            || NodeType::of(self.graph, node) == NodeType::EndEvent
    }

    /// Walk forward from a state-defining node to the next invoking nodes,
    /// then back over the walked edges only, collecting the state's region
    /// and the labels on it.
    fn explore_state(&self, node: NodeHandle) -> StateRecord {
        let graph: &Graph = &*self.graph;

        let mut next = IndexSet::new();
        let mut walked = HashSet::new();

        // A task that receives an answer and then invokes the next action
        // itself ends its state at once. Self-paired tasks are excluded: the
        // state they receive is the one after their own call.
        let invokes_next = graph.node_flag(node, keys::INVOKING)
            && self.invokers.get(&node) != Some(&node);
        if invokes_next {
            next.insert(node);
        }

        GraphSearch::dfs(graph).run(
            if invokes_next { None } else { Some(node) },
            |current| {
                if current != node && self.ends_state(current) {
                    next.insert(current);
                    return false;
                }
                true
            },
            |_, edge, neighbor, _| {
                if EdgeType::of(graph, edge) != EdgeType::SequenceFlow
                    || self.in_participant(neighbor)
                {
                    return false;
                }
                walked.insert(edge);
                true
            },
        );

        let mut annotations = BTreeSet::new();
        let mut annotated_by = Vec::new();
        let mut region_nodes = IndexSet::from([node]);
        let mut region_edges = IndexSet::new();

        if let Some(label) = self.annotation_of(node) {
            annotations.insert(label.to_string());
            annotated_by.push(node);
        }

        GraphSearch::dfs(graph).backward().run(
            next.iter().copied(),
            |current| {
                let boundary = next.contains(&current);
                if !boundary {
                    region_nodes.insert(current);
                }
                // a boundary node that receives answers defines its own state
                let counts = current != node
                    && (!boundary || !graph.node_flag(current, keys::POTENTIAL_RECEIVING));
                if counts && let Some(label) = self.annotation_of(current) {
                    annotations.insert(label.to_string());
                    annotated_by.push(current);
                }
                true
            },
            |_, edge, _, _| {
                let on_path = walked.contains(&edge);
                if on_path {
                    region_edges.insert(edge);
                }
                on_path
            },
        );

        StateRecord {
            next,
            annotations,
            annotated_by,
            region_nodes,
            region_edges,
            name: String::new(),
        }
    }

    fn build_state_relation(&mut self) -> Result<()> {
        for node in self.state_defining_nodes()? {
            let record = self.explore_state(node);

            if record.annotations.len() > 1 {
                let names: Vec<String> = record
                    .annotations
                    .iter()
                    .map(|l| format!("{:?}", l))
                    .collect();
                let message = format!(
                    "Multiple annotations reachable from {}: {}",
                    self.display_name(node),
                    names.join(", ")
                );
                let mut involved = vec![node];
                involved.extend(record.annotated_by.iter().filter(|n| **n != node));
                self.report_error(message, &involved, &[])?;
            }

            self.states.insert(node, record);
        }

        tracing::debug!("Explored {} state-defining nodes", self.states.len());
        Ok(())
    }

    /// Other potentially receiving nodes answered by the same participant
    /// elements the invoking node calls
    fn receiving_siblings(&self, invoking: NodeHandle, receiving: NodeHandle) -> Vec<NodeHandle> {
        let callees: HashSet<NodeHandle> = self
            .invoking_arrows
            .get(&invoking)
            .into_iter()
            .flatten()
            .filter_map(|arrow| self.graph.edge_endpoints(*arrow))
            .map(|(_, callee)| callee)
            .collect();

        self.receiving_arrows
            .iter()
            .filter(|(node, _)| **node != receiving && **node != invoking)
            .filter(|(node, _)| self.graph.node_flag(**node, keys::POTENTIAL_RECEIVING))
            .filter(|(_, arrows)| {
                arrows.iter().any(|arrow| {
                    self.graph
                        .edge_endpoints(*arrow)
                        .is_some_and(|(caller, _)| callees.contains(&caller))
                })
            })
            .map(|(node, _)| *node)
            .collect()
    }

    /// Copy an unambiguous next-state label to the single unlabelled sibling
    /// of a receiving node.
    fn propagate_annotations(&mut self) -> Result<()> {
        let pairs: Vec<(NodeHandle, NodeHandle)> = self
            .invokers
            .iter()
            .filter(|(receiving, invoking)| receiving != invoking)
            .map(|(receiving, invoking)| (*receiving, *invoking))
            .collect();

        for (receiving, invoking) in pairs {
            if self.annotation_of(receiving).is_some() {
                continue;
            }
            let Some(annotations) = self
                .states
                .get(&receiving)
                .map(|record| record.annotations.clone())
            else {
                continue;
            };
            if annotations.len() != 1 {
                continue;
            }

            let [sibling] = self.receiving_siblings(invoking, receiving)[..] else {
                continue;
            };
            if self.annotation_of(sibling).is_some() {
                continue;
            }
            let Some(record) = self.states.get_mut(&sibling) else {
                continue;
            };
            if !record.annotations.is_empty() {
                continue;
            }
            record.annotations = annotations.clone();

            let label = annotations.into_iter().next().unwrap_or_default();
            let message = format!(
                "Propagated state {:?} from {} to {}",
                label,
                self.display_name(receiving),
                self.display_name(sibling)
            );
            self.report_warning(message, &[receiving, sibling], &[]);
        }
        Ok(())
    }

    fn state_name(&self, node: NodeHandle, record: &StateRecord) -> String {
        if record.annotations.len() == 1
            && let Some(label) = record.annotations.first()
        {
            return label.clone();
        }

        let plain_start = NodeType::of(self.graph, node) == NodeType::StartEvent
            && !self.graph.node_flag(node, keys::POTENTIAL_RECEIVING);
        let reaches_end = record
            .next
            .iter()
            .any(|n| NodeType::of(self.graph, *n) == NodeType::EndEvent);

        if plain_start || reaches_end {
            INITIAL_STATE.to_string()
        } else {
            placeholder_state_name(&self.config.placeholder_prefix, self.graph.node_id(node))
        }
    }

    fn resolve_state_names(&mut self) -> Result<()> {
        let nodes: Vec<NodeHandle> = self.states.keys().copied().collect();
        for node in &nodes {
            let name = self.state_name(*node, &self.states[node]);
            self.states[node].name = name;
        }

        for node in &nodes {
            let record = &self.states[node];
            let name = record.name.clone();
            let next: Vec<AttrValue> = record.next.iter().map(|n| AttrValue::Node(*n)).collect();
            let labels: Vec<AttrValue> = record
                .annotations
                .iter()
                .map(|l| AttrValue::from(l.as_str()))
                .collect();
            let region_nodes: Vec<NodeHandle> = record.region_nodes.iter().copied().collect();
            let region_edges: Vec<EdgeHandle> = record.region_edges.iter().copied().collect();

            self.graph
                .set_node_attr(*node, keys::NEXT_INVOKING_NODES, next)?;
            self.graph
                .set_node_attr(*node, keys::NEXT_ANNOTATIONS, labels)?;
            for region_node in region_nodes {
                self.graph
                    .set_node_attr(region_node, keys::STATE, name.as_str())?;
            }
            for region_edge in region_edges {
                self.graph
                    .set_edge_attr(region_edge, keys::STATE, name.as_str())?;
            }
        }

        // state-defining nodes keep their own name over any region they lie in
        for node in &nodes {
            let name = self.states[node].name.clone();
            self.graph.set_node_attr(*node, keys::STATE, name)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Assembly
    // -------------------------------------------------------------------------

    fn assemble(&mut self) -> Result<()> {
        for record in self.states.values() {
            if !record.name.is_empty() {
                self.builder.add_state(record.name.clone());
            }
        }

        for node in self.graph.nodes_by_attr(keys::INVOKING, true)? {
            let action = self.action_of(node);
            self.builder.add_action(action);
        }

        for record in self.states.values() {
            for next in &record.next {
                if !self.graph.node_flag(*next, keys::INVOKING) {
                    continue;
                }
                let Some(receivers) = self.receivers.get(next) else {
                    continue;
                };
                let action = self
                    .graph
                    .node_str(*next, keys::ACTION)
                    .unwrap_or_default()
                    .to_string();
                for receiving in receivers {
                    if let Some(target) = self.states.get(receiving) {
                        self.builder.add_transition(
                            action.as_str(),
                            record.name.as_str(),
                            [target.name.as_str()],
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
