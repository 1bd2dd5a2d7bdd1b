//! Test helper for assembling process diagrams by ID

use super::{AttrValue, Attrs, EdgeHandle, Graph, GraphId, NodeHandle, attrs};

pub(crate) struct DiagramFixture {
    pub graph: Graph,
}

impl DiagramFixture {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    fn handle(&self, id: &str) -> NodeHandle {
        self.graph
            .node_by_id(id)
            .unwrap_or_else(|| panic!("fixture node {id} not created"))
    }

    pub fn node(&mut self, id: &str, kind: &str, name: &str, process: &str) -> NodeHandle {
        let mut bag: Attrs = attrs([("type", kind), ("name", name)]);
        if !process.is_empty() {
            bag.insert("process".into(), AttrValue::from(process));
        }
        self.graph.create_node(GraphId::ROOT, id, bag).unwrap()
    }

    pub fn participant(&mut self, id: &str, name: &str, process: &str) -> NodeHandle {
        self.node(id, "participant", name, process)
    }

    pub fn start(&mut self, id: &str, process: &str) -> NodeHandle {
        self.node(id, "startEvent", "", process)
    }

    pub fn end(&mut self, id: &str, process: &str) -> NodeHandle {
        self.node(id, "endEvent", "", process)
    }

    pub fn task(&mut self, id: &str, name: &str, process: &str) -> NodeHandle {
        self.node(id, "task", name, process)
    }

    pub fn catch(&mut self, id: &str, name: &str, process: &str) -> NodeHandle {
        self.node(id, "intermediateCatchEvent", name, process)
    }

    pub fn gateway(&mut self, id: &str, process: &str) -> NodeHandle {
        self.node(id, "exclusiveGateway", "", process)
    }

    /// Text annotation attached to `target` by an association
    pub fn annotate(&mut self, id: &str, text: &str, target: &str) -> NodeHandle {
        let note = self.node(id, "textAnnotation", text, "");
        let target = self.handle(target);
        self.graph
            .create_edge(None, target, note, attrs([("type", "association")]))
            .unwrap();
        note
    }

    pub fn flow(&mut self, from: &str, to: &str) -> EdgeHandle {
        let (a, b) = (self.handle(from), self.handle(to));
        self.graph
            .create_edge(None, a, b, attrs([("type", "sequenceFlow")]))
            .unwrap()
    }

    /// Sequence flows along a chain of node IDs
    pub fn chain(&mut self, ids: &[&str]) {
        for pair in ids.windows(2) {
            self.flow(pair[0], pair[1]);
        }
    }

    pub fn message(&mut self, id: &str, from: &str, to: &str, label: &str) -> EdgeHandle {
        let (a, b) = (self.handle(from), self.handle(to));
        self.graph
            .create_edge(
                Some(id),
                a,
                b,
                attrs([("type", "messageFlow"), ("name", label)]),
            )
            .unwrap()
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}
