//! Output formatting module
//!
//! This module handles formatting definitions, diagnostics and diagram
//! statistics for different output formats.

use crate::graph::GraphStats;
use crate::state_machine::transition::display_state;
use crate::state_machine::{Definition, Diagnostic};
use crate::Result;
use serde::Serialize;

/// Participant row of the inspect report
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSummary {
    pub id: String,
    pub name: Option<String>,
    pub process: Option<String>,
}

/// Output a definition as JSON
pub fn definition_json(w: &mut impl std::io::Write, definition: &Definition) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, definition)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Output a definition as text table
pub fn definition_table(w: &mut impl std::io::Write, definition: &Definition) -> Result<()> {
    writeln!(w, "State Machine: {}", definition.name)?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    writeln!(w, "Summary:")?;
    writeln!(w, "  States:   {}", definition.states.len())?;
    writeln!(w, "  Actions:  {}", definition.actions.len())?;
    writeln!(w, "  Errors:   {}", definition.errors.len())?;
    writeln!(w, "  Warnings: {}", definition.warnings.len())?;
    writeln!(w)?;

    writeln!(w, "States:")?;
    for state in &definition.states {
        writeln!(w, "  - {}", display_state(state))?;
    }
    writeln!(w)?;

    let transitions: Vec<_> = definition.transitions().collect();
    if !transitions.is_empty() {
        writeln!(w, "Transitions:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:<24} {:<24} {:<30}", "Action", "From", "To")?;
        writeln!(w, "{:-<80}", "")?;
        for transition in &transitions {
            let targets: Vec<String> = transition.targets.iter().map(|t| display_state(t)).collect();
            writeln!(
                w,
                "{:<24} {:<24} {:<30}",
                transition.action,
                display_state(&transition.source),
                targets.join(" | ")
            )?;
        }
        writeln!(w)?;
    }

    // actions nobody can invoke from a known state
    let idle: Vec<&str> = definition
        .actions
        .iter()
        .filter(|(_, action)| action.transitions.is_empty())
        .map(|(name, _)| name.as_str())
        .collect();
    if !idle.is_empty() {
        writeln!(w, "Actions without transitions: {}", idle.join(", "))?;
        writeln!(w)?;
    }

    write_diagnostics(w, definition)?;
    Ok(())
}

fn write_diagnostic_list(
    w: &mut impl std::io::Write,
    title: &str,
    diagnostics: &[Diagnostic],
) -> Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    writeln!(w, "{}:", title)?;
    for diagnostic in diagnostics {
        let elements: Vec<&str> = diagnostic.elements.iter().map(|e| e.id()).collect();
        if elements.is_empty() {
            writeln!(w, "   {}", diagnostic.message)?;
        } else {
            writeln!(w, "   {} [{}]", diagnostic.message, elements.join(", "))?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn write_diagnostics(w: &mut impl std::io::Write, definition: &Definition) -> Result<()> {
    write_diagnostic_list(w, "Errors", &definition.errors)?;
    write_diagnostic_list(w, "Warnings", &definition.warnings)
}

/// Output the diagnostics of several definitions
pub fn check_report(w: &mut impl std::io::Write, definitions: &[Definition]) -> Result<()> {
    for definition in definitions {
        let verdict = if definition.is_usable() { "ok" } else { "FAILED" };
        writeln!(
            w,
            "{}: {} ({} errors, {} warnings)",
            definition.name,
            verdict,
            definition.errors.len(),
            definition.warnings.len()
        )?;
        write_diagnostics(w, definition)?;
    }
    if definitions.is_empty() {
        writeln!(w, "No participants found")?;
    }
    Ok(())
}

/// Output diagram statistics as text table
pub fn stats_table(
    w: &mut impl std::io::Write,
    stats: &GraphStats,
    participants: &[ParticipantSummary],
) -> Result<()> {
    writeln!(w, "Diagram Statistics")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    writeln!(w, "  Total Nodes:    {}", stats.total_nodes)?;
    writeln!(w, "  Total Edges:    {}", stats.total_edges)?;
    writeln!(w, "  Nested Graphs:  {}", stats.nested_graphs)?;
    writeln!(w, "  Max Depth:      {}", stats.max_depth)?;
    writeln!(w)?;

    writeln!(w, "Nodes by type:")?;
    for (kind, count) in &stats.nodes_by_type {
        writeln!(w, "  {:<30} {:>6}", kind, count)?;
    }
    writeln!(w)?;

    writeln!(w, "Edges by type:")?;
    for (kind, count) in &stats.edges_by_type {
        writeln!(w, "  {:<30} {:>6}", kind, count)?;
    }
    writeln!(w)?;

    if !participants.is_empty() {
        writeln!(w, "Participants:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:<24} {:<30} {:<24}", "ID", "Name", "Process")?;
        writeln!(w, "{:-<80}", "")?;
        for participant in participants {
            writeln!(
                w,
                "{:<24} {:<30} {:<24}",
                participant.id,
                participant.name.as_deref().unwrap_or("-"),
                participant.process.as_deref().unwrap_or("-")
            )?;
        }
        writeln!(w)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{DefinitionBuilder, ElementRef};

    fn create_test_definition() -> Definition {
        let mut builder = DefinitionBuilder::new("Article");
        builder
            .add_transition("Create", "", ["Draft"])
            .add_transition("Publish", "Draft", ["Published"])
            .add_action("Archive")
            .add_warning(
                "No receiving task found for Archive",
                vec![ElementRef::Node("Task_9".into())],
            );
        builder.build()
    }

    #[test]
    fn test_definition_json() {
        let mut output = Vec::new();
        definition_json(&mut output, &create_test_definition()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["name"], "Article");
        assert_eq!(value["states"], serde_json::json!(["", "Draft", "Published"]));
        assert_eq!(
            value["actions"]["Publish"]["transitions"]["Draft"],
            serde_json::json!(["Published"])
        );
        assert_eq!(value["warnings"][0]["elements"][0]["id"], "Task_9");
    }

    #[test]
    fn test_definition_table() {
        let mut output = Vec::new();
        definition_table(&mut output, &create_test_definition()).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("(initial)"));
        assert!(text.contains("Publish"));
        assert!(text.contains("Actions without transitions: Archive"));
        assert!(text.contains("[Task_9]"));
    }

    #[test]
    fn test_check_report() {
        let mut broken = DefinitionBuilder::new("Order");
        broken.add_error("Multiple annotations on a single node", vec![]);
        let definitions = [create_test_definition(), broken.build()];

        let mut output = Vec::new();
        check_report(&mut output, &definitions).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Article: ok"));
        assert!(text.contains("Order: FAILED (1 errors, 0 warnings)"));
    }

    #[test]
    fn test_stats_table() {
        let mut graph = crate::graph::Graph::new();
        graph
            .create_node(
                crate::graph::GraphId::ROOT,
                "Order",
                crate::graph::attrs([("type", "participant"), ("process", "P1")]),
            )
            .unwrap();
        let participants = [ParticipantSummary {
            id: "Order".into(),
            name: None,
            process: Some("P1".into()),
        }];

        let mut output = Vec::new();
        stats_table(&mut output, &graph.stats(), &participants).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Total Nodes:    1"));
        assert!(text.contains("participant"));
        assert!(text.contains("P1"));
    }
}
