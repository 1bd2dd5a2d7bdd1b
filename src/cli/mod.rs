//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Process diagram state machine inference CLI
#[derive(Parser, Debug)]
#[command(name = "process-fsm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides config, overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer the state machine of one participant
    Analyze {
        /// Diagram document (JSON); stdin when omitted or "-"
        #[arg(short, long)]
        diagram: Option<PathBuf>,

        /// ID of the participant node
        #[arg(short, long, env = "PROCESS_FSM_PARTICIPANT")]
        participant: String,

        /// Add return message flows for invoking tasks that never receive an answer
        #[arg(long)]
        rewrite: bool,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Write the annotated diagram document to this file
        #[arg(long)]
        annotated: Option<PathBuf>,
    },

    /// Report structural errors for one or more participants
    Check {
        /// Diagram document (JSON); stdin when omitted or "-"
        #[arg(short, long)]
        diagram: Option<PathBuf>,

        /// Participants to check; all participant nodes when omitted
        #[arg(short, long)]
        participant: Vec<String>,
    },

    /// Print diagram statistics
    Inspect {
        /// Diagram document (JSON); stdin when omitted or "-"
        #[arg(short, long)]
        diagram: Option<PathBuf>,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

impl OutputFormat {
    /// Format named in the configuration file
    pub fn from_config(config: &Config) -> Result<Self> {
        OutputFormat::from_str(&config.output.format, true).map_err(|_| {
            crate::Error::Config(format!(
                "Unknown output format {:?} (expected json or table)",
                config.output.format
            ))
        })
    }
}

/// Execute the CLI command, returning the process exit code
pub async fn execute(args: Cli, config: Config) -> Result<i32> {
    match args.command {
        Commands::Analyze { .. } => commands::analyze::execute(args, config).await,
        Commands::Check { .. } => commands::check::execute(args, config).await,
        Commands::Inspect { diagram } => commands::inspect::execute(diagram).await,
    }
}
