//! State machine module - Model and analyze observation-state transition graphs

use crate::Result;

pub mod analyzer;
pub mod catalog;
pub mod model;
pub mod state;
pub mod transition;

// Re-export key types
pub use analyzer::{
    Adjacent, AnalysisReport, Step, TransitionAnalyzer, TransitionEntry, TransitionMatrix,
    TwoHopPath,
};
pub use model::{ModelStats, StateMachineModel};
pub use state::{State, StateClass, StateId};
pub use transition::{Transition, TriggerKind};

/// Build the reference observation-state model
pub fn reference_model() -> Result<StateMachineModel> {
    catalog::reference_model()
}
