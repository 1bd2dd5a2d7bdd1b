//! Process Diagram State Machine Inference
//!
//! Infers the state machine of a participant from a BPMN-style process
//! diagram, by observing the messages other processes exchange with it.
//!
//! This library provides functionality for:
//! - Holding diagrams as attributed, nested graphs with attribute indices
//! - Loading diagrams from a JSON interchange document (file or stdin)
//! - Inferring states, actions and transitions for one participant
//! - Reporting structural problems as diagnostics instead of failing

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod source;
pub mod state_machine;

pub use config::Config;
pub use error::{Error, Result};
pub use graph::Graph;
pub use state_machine::{Definition, infer_state_machine};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
///
/// Logs go to stderr; stdout carries the command output.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "process-fsm");
    }
}
