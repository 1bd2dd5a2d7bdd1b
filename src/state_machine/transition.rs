//! Actions and their transition tables

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named action: for each source state it may be invoked in, the states
/// it may result in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub transitions: BTreeMap<String, BTreeSet<String>>,
}

impl Action {
    /// Merge `targets` into the transition from `source`
    pub fn add_transition<I, S>(&mut self, source: impl Into<String>, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transitions
            .entry(source.into())
            .or_default()
            .extend(targets.into_iter().map(Into::into));
    }

    pub fn targets(&self, source: &str) -> Option<&BTreeSet<String>> {
        self.transitions.get(source)
    }
}

/// One row of a flattened transition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub action: String,
    pub source: String,
    pub targets: BTreeSet<String>,
}

impl Transition {
    /// Get display label for the transition
    pub fn display_label(&self) -> String {
        let targets: Vec<String> = self.targets.iter().map(|t| display_state(t)).collect();
        format!(
            "{}: {} -> {}",
            self.action,
            display_state(&self.source),
            targets.join(" | ")
        )
    }
}

/// Human-readable state name; the initial state has an empty name
pub fn display_state(name: &str) -> String {
    if name.is_empty() {
        "(initial)".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_transition_merges_targets() {
        let mut action = Action::default();
        action.add_transition("", ["Draft"]);
        action.add_transition("", ["Deleted"]);
        action.add_transition("", ["Draft"]);

        let targets: Vec<&str> = action.targets("").unwrap().iter().map(String::as_str).collect();
        assert_eq!(targets, ["Deleted", "Draft"]);
        assert!(action.targets("Draft").is_none());
    }

    #[test]
    fn test_display_label() {
        let transition = Transition {
            action: "create".into(),
            source: "".into(),
            targets: ["Draft".to_string(), "".to_string()].into(),
        };
        assert_eq!(
            transition.display_label(),
            "create: (initial) -> (initial) | Draft"
        );
    }
}
