//! Transition representation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What causes a transition to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Externally invoked control operation
    Command,
    /// Spontaneous change inside the system (completion, fault, auto-advance)
    Event,
}

impl TriggerKind {
    /// Prefix used by the numbered transition listing
    pub fn display_prefix(&self) -> &'static str {
        match self {
            TriggerKind::Command => "CMD: ",
            TriggerKind::Event => "AUTO: ",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TriggerKind::Command => "command",
            TriggerKind::Event => "event",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TriggerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" | "cmd" => Ok(TriggerKind::Command),
            "event" | "auto" => Ok(TriggerKind::Event),
            other => Err(Error::malformed_transition(format!(
                "unrecognized trigger kind '{}', expected 'command' or 'event'",
                other
            ))),
        }
    }
}

/// A transition between two catalog states.
///
/// Endpoints are indices into the owning model's state catalog; use
/// [`StateMachineModel::source_of`](super::StateMachineModel::source_of) and
/// friends to resolve them. Only a model creates transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub trigger_label: String,
    pub trigger_kind: TriggerKind,
}

impl Transition {
    pub(crate) fn new(
        source: usize,
        target: usize,
        trigger_label: impl Into<String>,
        trigger_kind: TriggerKind,
    ) -> Self {
        Self {
            source,
            target,
            trigger_label: trigger_label.into(),
            trigger_kind,
        }
    }

    /// Catalog index of the source state
    pub fn source(&self) -> usize {
        self.source
    }

    /// Catalog index of the target state
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn is_command(&self) -> bool {
        self.trigger_kind == TriggerKind::Command
    }

    pub fn is_event(&self) -> bool {
        self.trigger_kind == TriggerKind::Event
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Label with its kind prefix, e.g. `CMD: Scan` or `AUTO: Abort complete`
    pub fn display_label(&self) -> String {
        format!("{}{}", self.trigger_kind.display_prefix(), self.trigger_label)
    }

    /// Matrix cell line, e.g. `Scan (command)`
    pub fn cell_label(&self) -> String {
        format!("{} ({})", self.trigger_label, self.trigger_kind)
    }
}
