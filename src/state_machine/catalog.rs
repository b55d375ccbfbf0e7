//! Reference observation-state catalog
//!
//! The operational and observation state machine implemented by the TMC,
//! CSP, SDP and MCCS subarray controllers, as documented by the obsState
//! architecture decision record.

use crate::Result;
use crate::state_machine::TriggerKind::{Command, Event};
use crate::state_machine::{StateClass, StateMachineModel, TriggerKind};

pub const OPERATIONAL_STATES: [&str; 4] = ["INIT", "OFF", "ON", "OP_FAULT"];

pub const OBSERVATION_STATES: [&str; 10] = [
    "EMPTY",
    "RESOURCING",
    "IDLE",
    "CONFIGURING",
    "READY",
    "SCANNING",
    "ABORTING",
    "ABORTED",
    "RESTARTING",
    "OBS_FAULT",
];

/// States accepting the Abort command
pub const ABORTABLE_STATES: [&str; 5] = ["RESOURCING", "IDLE", "CONFIGURING", "READY", "SCANNING"];

const OPERATIONAL_TRANSITIONS: &[(&str, &str, &str, TriggerKind)] = &[
    ("INIT", "OFF", "Init complete", Event),
    ("OFF", "ON", "On", Command),
    ("ON", "OFF", "Off", Command),
    ("ON", "EMPTY", "Startup complete", Event),
    ("INIT", "OP_FAULT", "Fatal error", Event),
    ("OFF", "OP_FAULT", "Fatal error", Event),
    ("ON", "OP_FAULT", "Fatal error", Event),
    ("OP_FAULT", "OFF", "Reset", Command),
];

const OBSERVATION_TRANSITIONS: &[(&str, &str, &str, TriggerKind)] = &[
    ("EMPTY", "RESOURCING", "AssignResources", Command),
    ("RESOURCING", "IDLE", "Assigned", Event),
    ("RESOURCING", "IDLE", "Released", Event),
    ("RESOURCING", "EMPTY", "Released", Event),
    ("IDLE", "RESOURCING", "AssignResources", Command),
    ("IDLE", "RESOURCING", "ReleaseResources", Command),
    ("IDLE", "CONFIGURING", "Configure", Command),
    ("CONFIGURING", "READY", "Configured", Event),
    ("READY", "CONFIGURING", "Configure", Command),
    ("READY", "IDLE", "End", Command),
    ("READY", "SCANNING", "Scan", Command),
    ("SCANNING", "READY", "EndScan", Command),
    ("SCANNING", "READY", "Scan complete", Event),
    ("ABORTING", "ABORTED", "Abort complete", Event),
    ("ABORTED", "RESTARTING", "Restart", Command),
    ("OBS_FAULT", "RESTARTING", "Restart", Command),
    ("RESTARTING", "EMPTY", "Restart complete", Event),
    ("OBS_FAULT", "OBS_FAULT", "Observation fault", Event),
];

/// Build the reference model.
///
/// Declaration order: operational states, observation states, operational
/// transitions, observation transitions, Abort edges, then the fault edges
/// out of every observation state.
pub fn reference_model() -> Result<StateMachineModel> {
    let mut model = StateMachineModel::new();

    for name in OPERATIONAL_STATES {
        model.add_state(name, StateClass::Operational)?;
    }
    for name in OBSERVATION_STATES {
        model.add_state(name, StateClass::Observational)?;
    }

    for &(source, target, label, kind) in OPERATIONAL_TRANSITIONS
        .iter()
        .chain(OBSERVATION_TRANSITIONS)
    {
        model.add_transition(source, target, label, kind)?;
    }

    for source in ABORTABLE_STATES {
        model.add_transition(source, "ABORTING", "Abort", Command)?;
    }

    for source in OBSERVATION_STATES {
        if source != "OBS_FAULT" {
            model.add_transition(source, "OBS_FAULT", "Observation Fault", Event)?;
        }
        model.add_transition(source, "OP_FAULT", "Fatal error", Event)?;
    }

    tracing::debug!(
        states = model.states().len(),
        transitions = model.transitions().len(),
        "built reference obsState model"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_model_shape() {
        let model = reference_model().unwrap();
        let stats = model.stats();
        assert_eq!(stats.total_states, 14);
        assert_eq!(stats.operational_states, 4);
        assert_eq!(stats.observational_states, 10);
        assert_eq!(
            stats.total_transitions,
            OPERATIONAL_TRANSITIONS.len() + OBSERVATION_TRANSITIONS.len() + 5 + 9 + 10
        );
    }

    #[test]
    fn test_state_names_are_unique() {
        let model = reference_model().unwrap();
        let mut names: Vec<_> = model.states().iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), model.states().len());
    }

    #[test]
    fn test_empty_cannot_be_aborted() {
        let model = reference_model().unwrap();
        assert!(
            model
                .transitions_from("EMPTY")
                .unwrap()
                .iter()
                .all(|t| t.trigger_label != "Abort")
        );
    }
}
