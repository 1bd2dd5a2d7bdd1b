//! Diagram sources - Where the interchange document is read from
//!
//! The diagram parser is an external tool; this crate consumes its output as
//! a JSON [`GraphDocument`](crate::graph::GraphDocument). Sources only deal
//! with getting the text in and turning it into a [`Graph`].

use crate::Result;
use crate::graph::{Graph, GraphDocument};
use async_trait::async_trait;
use std::path::PathBuf;

pub mod file;
pub mod stdin;

pub use file::FileSource;
pub use stdin::StdinSource;

/// Source of a process diagram
///
/// Implementations:
/// - `FileSource`: reads a document from disk
/// - `StdinSource`: reads a document piped into the process
#[async_trait]
pub trait DiagramSource: Send + Sync {
    /// Human-readable origin, for logs
    fn describe(&self) -> String;

    /// Raw document text
    async fn read(&self) -> Result<String>;

    /// Read and build the diagram graph
    async fn load(&self) -> Result<Graph> {
        let text = self.read().await?;
        tracing::debug!("Read {} bytes from {}", text.len(), self.describe());
        let graph = GraphDocument::from_json_str(&text)?.into_graph()?;
        tracing::info!(
            "Loaded diagram from {} ({} nodes, {} edges)",
            self.describe(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

/// Create a diagram source: a file path, or stdin for `None` and `-`
pub fn create_diagram_source(path: Option<PathBuf>) -> Box<dyn DiagramSource> {
    match path {
        Some(path) if path.as_os_str() != "-" => Box::new(FileSource::new(path)),
        _ => Box::new(StdinSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_diagram_source() {
        assert_eq!(create_diagram_source(None).describe(), "stdin");
        assert_eq!(create_diagram_source(Some("-".into())).describe(), "stdin");
        assert_eq!(
            create_diagram_source(Some("diagram.json".into())).describe(),
            "diagram.json"
        );
    }
}
