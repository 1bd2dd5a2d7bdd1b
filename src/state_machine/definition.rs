//! State machine definition and its builder
//!
//! The builder is what the analyzer writes into; [`Definition`] is the
//! immutable result handed to code generators. Every collection is ordered
//! so two equivalent diagrams serialize to byte-identical output no matter
//! in which order their elements were discovered.

use super::state::INITIAL_STATE;
use super::transition::{Action, Transition};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Reference to a diagram element, by ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ElementRef {
    Node(String),
    Edge(String),
}

impl ElementRef {
    pub fn id(&self) -> &str {
        match self {
            ElementRef::Node(id) | ElementRef::Edge(id) => id,
        }
    }
}

/// A structural error or review note, with the elements involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub elements: Vec<ElementRef>,
}

#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    name: String,
    states: BTreeSet<String>,
    actions: BTreeMap<String, Action>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl DefinitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: BTreeSet::from([INITIAL_STATE.to_string()]),
            actions: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Register a state. The initial state always exists.
    pub fn add_state(&mut self, name: impl Into<String>) -> &mut Self {
        self.states.insert(name.into());
        self
    }

    pub fn add_action(&mut self, name: impl Into<String>) -> &mut Self {
        self.actions.entry(name.into()).or_default();
        self
    }

    /// Register `action: source -> targets`, merging with any targets
    /// already known for the same action and source.
    pub fn add_transition<I, S>(
        &mut self,
        action: impl Into<String>,
        source: impl Into<String>,
        targets: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = source.into();
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();

        self.states.insert(source.clone());
        self.states.extend(targets.iter().cloned());
        self.actions
            .entry(action.into())
            .or_default()
            .add_transition(source, targets);
        self
    }

    pub fn add_error(&mut self, message: impl Into<String>, elements: Vec<ElementRef>) -> &mut Self {
        self.errors.push(Diagnostic {
            message: message.into(),
            elements,
        });
        self
    }

    /// Record a result that is usable but should be reviewed by a human
    pub fn add_warning(
        &mut self,
        message: impl Into<String>,
        elements: Vec<ElementRef>,
    ) -> &mut Self {
        self.warnings.push(Diagnostic {
            message: message.into(),
            elements,
        });
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn build(self) -> Definition {
        Definition {
            name: self.name,
            states: self.states,
            actions: self.actions,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Inferred state machine definition
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    pub name: String,
    pub states: BTreeSet<String>,
    pub actions: BTreeMap<String, Action>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Definition {
    /// A definition with structural errors must not be turned into a
    /// running state machine.
    pub fn is_usable(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Flattened transition table, ordered by action then source state
    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.actions.iter().flat_map(|(action, def)| {
            def.transitions.iter().map(move |(source, targets)| Transition {
                action: action.clone(),
                source: source.clone(),
                targets: targets.clone(),
            })
        })
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_always_present() {
        let definition = DefinitionBuilder::new("Article").build();
        assert!(definition.states.contains(""));
        assert_eq!(definition.states.len(), 1);
        assert!(definition.is_usable());
    }

    #[test]
    fn test_transition_union_is_idempotent() {
        let mut split = DefinitionBuilder::new("m");
        split.add_transition("edit", "Draft", ["Draft"]);
        split.add_transition("edit", "Draft", ["Review"]);

        let mut joined = DefinitionBuilder::new("m");
        joined.add_transition("edit", "Draft", ["Review", "Draft"]);

        let (split, joined) = (split.build(), joined.build());
        assert_eq!(split.actions, joined.actions);
        assert_eq!(split.states, joined.states);
        assert_eq!(split.to_json().unwrap(), joined.to_json().unwrap());
    }

    #[test]
    fn test_transition_registers_action_and_states() {
        let mut builder = DefinitionBuilder::new("m");
        builder.add_action("delete").add_transition("create", "", ["Draft"]);
        let definition = builder.build();

        assert!(definition.action("delete").unwrap().transitions.is_empty());
        let states: Vec<&str> = definition.states.iter().map(String::as_str).collect();
        assert_eq!(states, ["", "Draft"]);

        let rows: Vec<Transition> = definition.transitions().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, "create");
    }

    #[test]
    fn test_errors_make_definition_unusable() {
        let mut builder = DefinitionBuilder::new("m");
        builder.add_warning("check this", vec![]);
        assert!(!builder.has_errors());
        builder.add_error("broken", vec![ElementRef::Node("Task_1".into())]);
        assert!(builder.has_errors());

        let definition = builder.build();
        assert!(!definition.is_usable());
        assert_eq!(definition.errors[0].elements[0].id(), "Task_1");

        let json = definition.to_json().unwrap();
        assert!(json.contains(r#""kind": "node""#));
    }
}
