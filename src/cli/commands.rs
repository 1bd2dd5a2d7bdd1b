//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::graph::Graph;
use crate::source::create_diagram_source;
use crate::{Config, Result, cli::Cli};
use std::path::PathBuf;

async fn load_diagram(diagram: Option<PathBuf>) -> Result<Graph> {
    create_diagram_source(diagram).load().await
}

/// Analyze command implementation
pub mod analyze {
    use super::*;
    use crate::cli::{Commands, OutputFormat, output};
    use crate::state_machine::infer_state_machine;

    /// Execute the analyze command
    pub async fn execute(args: Cli, config: Config) -> Result<i32> {
        let (diagram, participant, rewrite, output_format, annotated) = match args.command {
            Commands::Analyze {
                diagram,
                participant,
                rewrite,
                output,
                annotated,
            } => (diagram, participant, rewrite, output, annotated),
            _ => unreachable!("analyze::execute called with wrong command"),
        };

        let output_format = match output_format {
            Some(format) => format,
            None => OutputFormat::from_config(&config)?,
        };
        let mut analyzer_config = config.analyzer.clone();
        analyzer_config.rewrite |= rewrite;

        let mut graph = load_diagram(diagram).await?;

        tracing::info!("Analyzing participant: {}", participant);
        let definition = infer_state_machine(&mut graph, &participant, &analyzer_config)?;

        let mut stdout = std::io::stdout();
        match output_format {
            OutputFormat::Json => output::definition_json(&mut stdout, &definition)?,
            OutputFormat::Table => output::definition_table(&mut stdout, &definition)?,
        }

        if let Some(path) = annotated {
            tracing::info!("Writing annotated diagram to {:?}", path);
            let document = graph.to_document().to_json_string()?;
            tokio::fs::write(&path, document).await?;
        }

        Ok(0)
    }
}

/// Check command implementation
pub mod check {
    use super::*;
    use crate::cli::{Commands, output};
    use crate::state_machine::{infer_state_machine, participants};

    /// Execute the check command
    pub async fn execute(args: Cli, config: Config) -> Result<i32> {
        let (diagram, mut requested) = match args.command {
            Commands::Check {
                diagram,
                participant,
            } => (diagram, participant),
            _ => unreachable!("check::execute called with wrong command"),
        };

        let graph = load_diagram(diagram).await?;
        if requested.is_empty() {
            requested = participants(&graph)
                .into_iter()
                .map(|n| graph.node_id(n).to_string())
                .collect();
            tracing::info!("Checking all {} participants", requested.len());
        }

        let mut definitions = Vec::with_capacity(requested.len());
        for participant in &requested {
            // every run annotates its own copy
            let definition =
                infer_state_machine(&mut graph.clone(), participant, &config.analyzer)?;
            definitions.push(definition);
        }

        output::check_report(&mut std::io::stdout(), &definitions)?;

        let failed = definitions.iter().filter(|d| !d.is_usable()).count();
        if failed > 0 {
            tracing::warn!("{} of {} definitions have errors", failed, definitions.len());
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

/// Inspect command implementation
pub mod inspect {
    use super::*;
    use crate::cli::output::{self, ParticipantSummary};
    use crate::state_machine::participants;

    /// Execute the inspect command
    pub async fn execute(diagram: Option<PathBuf>) -> Result<i32> {
        let graph = load_diagram(diagram).await?;
        let stats = graph.stats();

        let summaries: Vec<ParticipantSummary> = participants(&graph)
            .into_iter()
            .map(|n| ParticipantSummary {
                id: graph.node_id(n).to_string(),
                name: graph.node_str(n, "name").map(str::to_string),
                process: graph.node_str(n, "process").map(str::to_string),
            })
            .collect();

        output::stats_table(&mut std::io::stdout(), &stats, &summaries)?;
        Ok(0)
    }
}
