//! Diagram documents on disk

use super::DiagramSource;
use crate::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DiagramSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<String> {
        let text = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read diagram {:?}", self.path))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_load_document_file() {
        let path = std::env::temp_dir().join(format!("process-fsm-{}.json", std::process::id()));
        let doc = r#"{
            "nodes": [
                { "id": "S", "attrs": { "type": "startEvent", "process": "P" } },
                { "id": "T", "attrs": { "type": "task", "name": "Create", "process": "P" } }
            ],
            "edges": [ { "source": "S", "target": "T", "attrs": { "type": "sequenceFlow" } } ]
        }"#;
        fs::write(&path, doc).await.unwrap();

        let graph = FileSource::new(&path).load().await.unwrap();
        fs::remove_file(&path).await.unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = FileSource::new("/nonexistent/diagram.json")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("Failed to read diagram"));
    }
}
