//! State representation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type StateId = String;

/// A state in the state machine (operational or observational)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    pub name: StateId,
    pub class: StateClass,
}

/// State classification axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateClass {
    /// Power/availability state of a controller (INIT, OFF, ON, OP_FAULT)
    Operational,
    /// What a subarray-like unit is currently doing (IDLE, SCANNING, ...)
    Observational,
}

impl StateClass {
    pub fn color(&self) -> &'static str {
        match self {
            StateClass::Operational => "lightblue",
            StateClass::Observational => "lightgreen",
        }
    }

    /// DOT node shape
    pub fn shape(&self) -> &'static str {
        match self {
            StateClass::Operational => "box",
            StateClass::Observational => "ellipse",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StateClass::Operational => "operational",
            StateClass::Observational => "observational",
        }
    }
}

impl fmt::Display for StateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StateClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operational" | "op" => Ok(StateClass::Operational),
            "observational" | "obs" => Ok(StateClass::Observational),
            other => Err(Error::custom(format!("Unknown state class: {}", other))),
        }
    }
}

impl State {
    pub fn new(name: impl Into<StateId>, class: StateClass) -> Self {
        Self {
            name: name.into(),
            class,
        }
    }

    pub fn is_operational(&self) -> bool {
        self.class == StateClass::Operational
    }

    pub fn is_observational(&self) -> bool {
        self.class == StateClass::Observational
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parsing() {
        assert_eq!(
            "Observational".parse::<StateClass>().unwrap(),
            StateClass::Observational
        );
        assert_eq!("op".parse::<StateClass>().unwrap(), StateClass::Operational);
        assert!("power".parse::<StateClass>().is_err());
    }

    #[test]
    fn test_class_serde_lowercase() {
        let json = serde_json::to_string(&State::new("READY", StateClass::Observational)).unwrap();
        assert_eq!(json, r#"{"name":"READY","class":"observational"}"#);
    }
}
