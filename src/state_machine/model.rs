use crate::error::{Error, Result};
use crate::state_machine::{State, StateClass, Transition, TriggerKind};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// The fixed catalog of states and transitions of a subsystem state machine.
///
/// States and transitions live in insertion-ordered arenas; everything else
/// refers to them by index. The model is a multigraph: parallel transitions
/// between the same pair of states and self-loops are both allowed.
#[derive(Debug, Clone, Default)]
pub struct StateMachineModel {
    /// States in declaration order. Row/column order of every tabular output.
    states: Vec<State>,

    /// Transitions in declaration order. Numbering of the transition listing.
    transitions: Vec<Transition>,

    /// Name to catalog index lookup.
    ///
    /// Names are unique across both classes, so this is also the
    /// duplicate-declaration check.
    state_index: HashMap<String, usize>,

    /// Per-state outgoing transition indices, in declaration order.
    outgoing: Vec<Vec<usize>>,

    /// Per-state incoming transition indices, in declaration order.
    incoming: Vec<Vec<usize>>,
}

impl StateMachineModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a state.
    ///
    /// Re-declaring a state with the same class is a no-op; re-declaring it
    /// with another class is a [`Error::DuplicateState`].
    pub fn add_state(&mut self, name: impl Into<String>, class: StateClass) -> Result<usize> {
        let name = name.into();
        if let Some(&idx) = self.state_index.get(&name) {
            let existing = self.states[idx].class;
            if existing != class {
                return Err(Error::DuplicateState {
                    name,
                    existing,
                    requested: class,
                });
            }
            return Ok(idx);
        }

        let idx = self.states.len();
        tracing::debug!(state = %name, %class, "declaring state");
        self.state_index.insert(name.clone(), idx);
        self.states.push(State::new(name, class));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(idx)
    }

    /// Declares a transition between two previously declared states.
    ///
    /// Identical declarations are kept as parallel edges. Labels must fit on
    /// one line, so control characters are a [`Error::MalformedTransition`].
    pub fn add_transition(
        &mut self,
        source: &str,
        target: &str,
        trigger_label: impl Into<String>,
        trigger_kind: TriggerKind,
    ) -> Result<usize> {
        let from_idx = self.index_of(source)?;
        let to_idx = self.index_of(target)?;
        let trigger_label = trigger_label.into();
        if trigger_label.chars().any(char::is_control) {
            return Err(Error::malformed_transition(format!(
                "{} -> {}: trigger label {:?} contains control characters",
                source, target, trigger_label
            )));
        }

        let idx = self.transitions.len();
        tracing::debug!(
            %source,
            %target,
            trigger = %trigger_label,
            kind = %trigger_kind,
            "declaring transition"
        );
        self.transitions
            .push(Transition::new(from_idx, to_idx, trigger_label, trigger_kind));
        self.outgoing[from_idx].push(idx);
        self.incoming[to_idx].push(idx);
        Ok(idx)
    }

    /// Same as [`add_transition`](Self::add_transition) with the kind given as
    /// text (`command`/`cmd` or `event`/`auto`).
    pub fn add_transition_str(
        &mut self,
        source: &str,
        target: &str,
        trigger_label: impl Into<String>,
        trigger_kind: &str,
    ) -> Result<usize> {
        let kind = trigger_kind.parse::<TriggerKind>()?;
        self.add_transition(source, target, trigger_label, kind)
    }

    /// All states in declaration order
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// All transitions in declaration order
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state_index.contains_key(name)
    }

    /// Catalog index of a state
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.state_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_state(name))
    }

    /// Get a state by its name
    pub fn state(&self, name: &str) -> Result<&State> {
        self.index_of(name).map(|idx| &self.states[idx])
    }

    /// Source state of a transition, `None` if it is not from this model's catalog
    pub fn source_of(&self, transition: &Transition) -> Option<&State> {
        self.states.get(transition.source)
    }

    /// Target state of a transition, `None` if it is not from this model's catalog
    pub fn target_of(&self, transition: &Transition) -> Option<&State> {
        self.states.get(transition.target)
    }

    /// State at a catalog index taken from this model's own transitions
    pub(crate) fn state_at(&self, idx: usize) -> &State {
        &self.states[idx]
    }

    /// Outgoing transitions of a state with full multiplicity, in declaration order
    pub fn transitions_from(&self, name: &str) -> Result<Vec<&Transition>> {
        let idx = self.index_of(name)?;
        Ok(self.outgoing_of(idx).collect())
    }

    /// Incoming transitions of a state with full multiplicity, in declaration order
    pub fn transitions_into(&self, name: &str) -> Result<Vec<&Transition>> {
        let idx = self.index_of(name)?;
        Ok(self.incoming_of(idx).collect())
    }

    pub(crate) fn outgoing_of(&self, idx: usize) -> impl Iterator<Item = &Transition> {
        self.outgoing[idx].iter().map(|&t| &self.transitions[t])
    }

    pub(crate) fn incoming_of(&self, idx: usize) -> impl Iterator<Item = &Transition> {
        self.incoming[idx].iter().map(|&t| &self.transitions[t])
    }

    /// A petgraph view of the model.
    ///
    /// Node `i` is catalog state `i`; each edge weight is the index of the
    /// transition it stands for.
    pub fn to_graph(&self) -> DiGraph<usize, usize> {
        let mut graph = DiGraph::with_capacity(self.states.len(), self.transitions.len());
        for idx in 0..self.states.len() {
            graph.add_node(idx);
        }
        for (idx, transition) in self.transitions.iter().enumerate() {
            graph.add_edge(
                NodeIndex::new(transition.source),
                NodeIndex::new(transition.target),
                idx,
            );
        }
        graph
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph ObsStateMachine {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [style=filled];\n\n");

        for state in &self.states {
            dot.push_str(&format!(
                "  \"{}\" [shape={}, fillcolor=\"{}\"];\n",
                state.name,
                state.class.shape(),
                state.class.color()
            ));
        }

        dot.push('\n');

        for transition in &self.transitions {
            let style = match transition.trigger_kind {
                TriggerKind::Command => "solid",
                TriggerKind::Event => "dashed",
            };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\", style={}];\n",
                self.state_at(transition.source).name,
                self.state_at(transition.target).name,
                transition.display_label().replace('"', "\\\""),
                style
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Get model statistics
    pub fn stats(&self) -> ModelStats {
        let count_class =
            |class: StateClass| self.states.iter().filter(|s| s.class == class).count();
        let count_kind = |kind: TriggerKind| {
            self.transitions
                .iter()
                .filter(|t| t.trigger_kind == kind)
                .count()
        };

        ModelStats {
            total_states: self.states.len(),
            operational_states: count_class(StateClass::Operational),
            observational_states: count_class(StateClass::Observational),
            total_transitions: self.transitions.len(),
            command_transitions: count_kind(TriggerKind::Command),
            event_transitions: count_kind(TriggerKind::Event),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModelStats {
    pub total_states: usize,
    pub operational_states: usize,
    pub observational_states: usize,
    pub total_transitions: usize,
    pub command_transitions: usize,
    pub event_transitions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_model() -> StateMachineModel {
        let mut model = StateMachineModel::new();
        model.add_state("IDLE", StateClass::Observational).unwrap();
        model.add_state("CONFIGURING", StateClass::Observational).unwrap();
        model.add_state("READY", StateClass::Observational).unwrap();
        model
            .add_transition("IDLE", "CONFIGURING", "Configure", TriggerKind::Command)
            .unwrap();
        model
            .add_transition("CONFIGURING", "READY", "Configured", TriggerKind::Event)
            .unwrap();
        model
            .add_transition("READY", "IDLE", "End", TriggerKind::Command)
            .unwrap();
        model
    }

    #[test]
    fn test_empty_model() {
        let model = StateMachineModel::new();
        assert!(model.states().is_empty());
        assert!(model.transitions().is_empty());
        assert_eq!(model.stats().total_states, 0);
    }

    #[test]
    fn test_add_state_is_idempotent() {
        let mut model = StateMachineModel::new();
        let first = model.add_state("ON", StateClass::Operational).unwrap();
        let second = model.add_state("ON", StateClass::Operational).unwrap();
        assert_eq!(first, second);
        assert_eq!(model.states().len(), 1);
    }

    #[test]
    fn test_add_state_conflicting_class() {
        let mut model = StateMachineModel::new();
        model.add_state("ON", StateClass::Operational).unwrap();
        let err = model.add_state("ON", StateClass::Observational).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateState {
                existing: StateClass::Operational,
                requested: StateClass::Observational,
                ..
            }
        ));
        assert_eq!(model.states().len(), 1);
    }

    #[test]
    fn test_add_transition_unknown_state() {
        let mut model = small_model();
        let err = model
            .add_transition("IDLE", "SCANNING", "Scan", TriggerKind::Command)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownState(ref name) if name == "SCANNING"));

        let err = model
            .add_transition("NOWHERE", "IDLE", "Scan", TriggerKind::Command)
            .unwrap_err();
        assert!(err.is_unknown_state());
        assert_eq!(model.transitions().len(), 3);
    }

    #[test]
    fn test_add_transition_bad_kind() {
        let mut model = small_model();
        let err = model
            .add_transition_str("IDLE", "READY", "Jump", "teleport")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedTransition(_)));
        assert_eq!(model.transitions().len(), 3);
    }

    #[test]
    fn test_multiline_label_rejected() {
        let mut model = small_model();
        for label in ["Multi\nline", "Carriage\rreturn", "Tab\tbed"] {
            let err = model
                .add_transition("IDLE", "READY", label, TriggerKind::Event)
                .unwrap_err();
            assert!(matches!(err, Error::MalformedTransition(_)), "{label:?}");
        }
        assert_eq!(model.transitions().len(), 3);
    }

    #[test]
    fn test_endpoints_of_foreign_transition() {
        let model = small_model();
        let mut other = StateMachineModel::new();
        for name in ["A", "B", "C", "D", "E"] {
            other.add_state(name, StateClass::Observational).unwrap();
        }
        other
            .add_transition("D", "E", "Elsewhere", TriggerKind::Command)
            .unwrap();

        let foreign = &other.transitions()[0];
        assert_eq!((foreign.source(), foreign.target()), (3, 4));
        assert!(model.source_of(foreign).is_none());
        assert!(model.target_of(foreign).is_none());

        let own = &model.transitions()[0];
        assert_eq!(model.source_of(own).unwrap().name, "IDLE");
        assert_eq!(model.target_of(own).unwrap().name, "CONFIGURING");
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let mut model = small_model();
        model
            .add_transition("READY", "IDLE", "End", TriggerKind::Command)
            .unwrap();
        assert_eq!(model.transitions().len(), 4);
        assert_eq!(model.transitions_from("READY").unwrap().len(), 2);
        assert_eq!(model.transitions_into("IDLE").unwrap().len(), 2);
    }

    #[test]
    fn test_insertion_order() {
        let model = small_model();
        let names: Vec<_> = model.states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["IDLE", "CONFIGURING", "READY"]);

        let labels: Vec<_> = model
            .transitions()
            .iter()
            .map(|t| t.trigger_label.as_str())
            .collect();
        assert_eq!(labels, ["Configure", "Configured", "End"]);
    }

    #[test]
    fn test_to_graph_matches_catalog() {
        let model = small_model();
        let graph = model.to_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph[NodeIndex::new(2)], 2);
    }

    #[test]
    fn test_to_dot_output() {
        let model = small_model();
        let dot = model.to_dot();
        assert!(dot.starts_with("digraph ObsStateMachine"));
        assert!(
            dot.contains("\"IDLE\" -> \"CONFIGURING\" [label=\"CMD: Configure\", style=solid];")
        );
        assert!(
            dot.contains("\"CONFIGURING\" -> \"READY\" [label=\"AUTO: Configured\", style=dashed];")
        );
    }

    #[test]
    fn test_stats() {
        let mut model = small_model();
        model.add_state("OFF", StateClass::Operational).unwrap();
        let stats = model.stats();
        assert_eq!(stats.total_states, 4);
        assert_eq!(stats.operational_states, 1);
        assert_eq!(stats.observational_states, 3);
        assert_eq!(stats.command_transitions, 2);
        assert_eq!(stats.event_transitions, 1);
    }

    proptest! {
        #[test]
        fn prop_every_declared_transition_is_kept(
            edges in prop::collection::vec((0usize..5, 0usize..5, any::<bool>()), 0..40)
        ) {
            let mut model = StateMachineModel::new();
            for i in 0..5 {
                model.add_state(format!("S{}", i), StateClass::Observational).unwrap();
            }
            for (i, (from, to, cmd)) in edges.iter().enumerate() {
                let kind = if *cmd { TriggerKind::Command } else { TriggerKind::Event };
                model
                    .add_transition(
                        &format!("S{}", from),
                        &format!("S{}", to),
                        format!("T{}", i),
                        kind,
                    )
                    .unwrap();
            }

            prop_assert_eq!(model.transitions().len(), edges.len());
            prop_assert_eq!(model.states().len(), 5);
            for transition in model.transitions() {
                prop_assert!(model.source_of(transition).is_some_and(|s| model.contains(&s.name)));
                prop_assert!(model.target_of(transition).is_some_and(|s| model.contains(&s.name)));
            }
            let out_total: usize = model
                .states()
                .iter()
                .map(|s| model.transitions_from(&s.name).unwrap().len())
                .sum();
            prop_assert_eq!(out_total, edges.len());
        }
    }
}
