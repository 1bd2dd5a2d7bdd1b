//! Diagram documents piped into the process

use super::DiagramSource;
use crate::Result;
use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

pub struct StdinSource;

#[async_trait]
impl DiagramSource for StdinSource {
    fn describe(&self) -> String {
        "stdin".to_string()
    }

    async fn read(&self) -> Result<String> {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read diagram from stdin")?;
        Ok(text)
    }
}
