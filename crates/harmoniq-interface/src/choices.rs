//! Suggested values for the "add interface" command.

use std::io::IsTerminal;

use crate::variable::Choice;
use crate::InterfaceError;

pub const ADD_INTERFACE_VARIABLE: &str = "intf-add";
pub const ADD_INTERFACE_TEXT: &str = "Add Interface";

/// Chain offered only when a console is attached.
pub const CONSOLE_CHOICE: &str = "rc,none";

/// Runtime facts that decide which choices are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Environment {
    pub stdin_is_terminal: bool,
}

impl Environment {
    pub fn detect() -> Self {
        Self {
            stdin_is_terminal: std::io::stdin().is_terminal(),
        }
    }
}

struct ChoiceRule {
    value: &'static str,
    label: &'static str,
    include_if: fn(&Environment) -> bool,
}

fn always(_: &Environment) -> bool {
    true
}

fn console_attached(environment: &Environment) -> bool {
    cfg!(windows) || environment.stdin_is_terminal
}

const ADD_INTERFACE_CHOICES: [ChoiceRule; 5] = [
    ChoiceRule {
        value: CONSOLE_CHOICE,
        label: "Console",
        include_if: console_attached,
    },
    ChoiceRule {
        value: "telnet,none",
        label: "Telnet",
        include_if: always,
    },
    ChoiceRule {
        value: "http,none",
        label: "Web",
        include_if: always,
    },
    ChoiceRule {
        value: "logger,none",
        label: "Debug logging",
        include_if: always,
    },
    ChoiceRule {
        value: "gestures,none",
        label: "Mouse Gestures",
        include_if: always,
    },
];

/// Evaluates the choice table once against `environment`.
pub fn add_interface_choices(environment: &Environment) -> Result<Vec<Choice>, InterfaceError> {
    let mut choices = Vec::new();
    choices
        .try_reserve_exact(ADD_INTERFACE_CHOICES.len())
        .map_err(|_| InterfaceError::OutOfMemory)?;
    choices.extend(
        ADD_INTERFACE_CHOICES
            .iter()
            .filter(|rule| (rule.include_if)(environment))
            .map(|rule| Choice {
                value: rule.value.to_string(),
                label: rule.label.to_string(),
            }),
    );
    Ok(choices)
}
