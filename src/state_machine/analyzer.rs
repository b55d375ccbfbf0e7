//! Transition analyzer
//!
//! Read-only queries over a [`StateMachineModel`]: transition listings,
//! adjacency, command/event classification, self loops, two-hop paths and
//! the transition matrix. Also hosts the checks the BDD harness runs against
//! change events reported by live devices.

use super::{State, StateMachineModel, Transition, TriggerKind};
use crate::error::{Error, Result};
use petgraph::Direction;
use petgraph::algo::{astar, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use serde::Serialize;
use std::collections::BTreeSet;

/// Label fragments that mark a transition as a fault condition
pub const DEFAULT_FAULT_KEYWORDS: [&str; 2] = ["fault", "error"];

/// One row of the numbered transition listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEntry<'a> {
    /// 1-based, in declaration order
    pub index: usize,
    pub source: &'a str,
    /// Label prefixed with `CMD: ` or `AUTO: `
    pub trigger_display: String,
    pub target: &'a str,
}

/// A neighbour in the adjacency view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Adjacent<'a> {
    pub state: &'a str,
    pub trigger_label: &'a str,
    pub trigger_kind: TriggerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwoHopPath<'a> {
    pub source: &'a str,
    pub mid: &'a str,
    pub target: &'a str,
    pub first_trigger: String,
    pub second_trigger: String,
}

/// What a harness has to do to follow one hop of a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    /// Invoke a command on the device
    Invoke { command: String, next: String },
    /// Wait for the device to move on its own
    Await { event: String, next: String },
}

impl Step {
    fn from_transition(model: &StateMachineModel, transition: &Transition) -> Self {
        let next = model.state_at(transition.target).name.clone();
        match transition.trigger_kind {
            TriggerKind::Command => Step::Invoke {
                command: transition.trigger_label.clone(),
                next,
            },
            TriggerKind::Event => Step::Await {
                event: transition.trigger_label.clone(),
                next,
            },
        }
    }
}

/// Source x target table of transition labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionMatrix {
    pub states: Vec<String>,
    /// `cells[source][target]`, one `"<label> (<kind>)"` line per transition
    pub cells: Vec<Vec<Vec<String>>>,
}

impl TransitionMatrix {
    /// Cell text with parallel transitions joined by newlines
    pub fn cell(&self, source: usize, target: usize) -> String {
        self.cells[source][target].join("\n")
    }

    /// Render as a markdown table.
    ///
    /// Newlines inside a cell become `<br>` so each state stays on one row.
    pub fn to_markdown(&self) -> String {
        let escape = |s: &str| s.replace('|', "\\|");

        let mut out = String::from("| From \\ To |");
        for name in &self.states {
            out.push_str(&format!(" {} |", escape(name)));
        }
        out.push('\n');

        out.push_str("|---|");
        for _ in &self.states {
            out.push_str("---|");
        }
        out.push('\n');

        for (row, name) in self.states.iter().enumerate() {
            out.push_str(&format!("| {} |", escape(name)));
            for col in 0..self.states.len() {
                let lines: Vec<String> = self.cells[row][col].iter().map(|l| escape(l)).collect();
                if lines.is_empty() {
                    out.push_str("  |");
                } else {
                    out.push_str(&format!(" {} |", lines.join("<br>")));
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Summary of a model's structure
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub stats: super::ModelStats,
    pub commands: BTreeSet<String>,
    pub events: BTreeSet<String>,
    pub initial_states: Vec<String>,
    pub terminal_states: Vec<String>,
    pub self_looping_states: Vec<String>,
    pub transient_states: Vec<String>,
    pub fault_states: Vec<String>,
    pub has_cycles: bool,
}

/// Stateless query layer over a borrowed model
#[derive(Debug, Clone)]
pub struct TransitionAnalyzer<'a> {
    model: &'a StateMachineModel,
    fault_keywords: Vec<String>,
}

impl<'a> TransitionAnalyzer<'a> {
    pub fn new(model: &'a StateMachineModel) -> Self {
        Self {
            model,
            fault_keywords: DEFAULT_FAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Replace the label fragments used to recognise fault transitions.
    ///
    /// Blank fragments are dropped; they would match every label.
    pub fn with_fault_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fault_keywords = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn model(&self) -> &'a StateMachineModel {
        self.model
    }

    /// Every transition, numbered from 1 in declaration order
    pub fn list_transitions(&self) -> Vec<TransitionEntry<'a>> {
        let model = self.model;
        model
            .transitions()
            .iter()
            .enumerate()
            .map(|(idx, t)| TransitionEntry {
                index: idx + 1,
                source: &model.state_at(t.source).name,
                trigger_display: t.display_label(),
                target: &model.state_at(t.target).name,
            })
            .collect()
    }

    /// Adjacency view of the transitions leaving `state`.
    ///
    /// Lossy: parallel transitions to the same target collapse into one entry
    /// carrying the last-declared label and kind. Use
    /// [`outgoing_edges`](Self::outgoing_edges) for full multiplicity.
    pub fn outgoing(&self, state: &str) -> Result<Vec<Adjacent<'a>>> {
        let idx = self.model.index_of(state)?;
        Ok(self.collapse(self.model.outgoing_of(idx), Direction::Outgoing))
    }

    /// Adjacency view of the transitions entering `state`, collapsed by source.
    pub fn incoming(&self, state: &str) -> Result<Vec<Adjacent<'a>>> {
        let idx = self.model.index_of(state)?;
        Ok(self.collapse(self.model.incoming_of(idx), Direction::Incoming))
    }

    fn collapse(
        &self,
        edges: impl Iterator<Item = &'a Transition>,
        direction: Direction,
    ) -> Vec<Adjacent<'a>> {
        let mut neighbours: Vec<(usize, Adjacent<'a>)> = Vec::new();
        for t in edges {
            let other = match direction {
                Direction::Outgoing => t.target,
                Direction::Incoming => t.source,
            };
            let entry = Adjacent {
                state: &self.model.states()[other].name,
                trigger_label: &t.trigger_label,
                trigger_kind: t.trigger_kind,
            };
            match neighbours.iter_mut().find(|(idx, _)| *idx == other) {
                Some((_, existing)) => *existing = entry,
                None => neighbours.push((other, entry)),
            }
        }
        neighbours.into_iter().map(|(_, adj)| adj).collect()
    }

    /// Every transition leaving `state`, parallel edges included
    pub fn outgoing_edges(&self, state: &str) -> Result<Vec<&'a Transition>> {
        self.model.transitions_from(state)
    }

    /// Every transition entering `state`, parallel edges included
    pub fn incoming_edges(&self, state: &str) -> Result<Vec<&'a Transition>> {
        self.model.transitions_into(state)
    }

    pub fn all_commands(&self) -> BTreeSet<&'a str> {
        self.labels_of(TriggerKind::Command)
    }

    pub fn all_events(&self) -> BTreeSet<&'a str> {
        self.labels_of(TriggerKind::Event)
    }

    fn labels_of(&self, kind: TriggerKind) -> BTreeSet<&'a str> {
        self.model
            .transitions()
            .iter()
            .filter(|t| t.trigger_kind == kind)
            .map(|t| t.trigger_label.as_str())
            .collect()
    }

    /// States with at least one transition back to themselves, catalog order
    pub fn self_looping_states(&self) -> Vec<&'a State> {
        self.states_where(|idx| self.model.outgoing_of(idx).any(|t| t.is_self_loop()))
    }

    /// Every `source -> mid -> target` composition with `source != target`.
    ///
    /// Each pair of matching transitions yields its own entry.
    pub fn two_hop_paths(&self) -> Vec<TwoHopPath<'a>> {
        let model = self.model;
        let mut paths = Vec::new();
        for (source_idx, source) in model.states().iter().enumerate() {
            for first in model.outgoing_of(source_idx) {
                let mid = model.state_at(first.target);
                for second in model.outgoing_of(first.target) {
                    if second.target == source_idx {
                        continue;
                    }
                    paths.push(TwoHopPath {
                        source: &source.name,
                        mid: &mid.name,
                        target: &model.state_at(second.target).name,
                        first_trigger: first.display_label(),
                        second_trigger: second.display_label(),
                    });
                }
            }
        }
        paths
    }

    pub fn matrix(&self) -> TransitionMatrix {
        let n = self.model.states().len();
        let mut cells = vec![vec![Vec::new(); n]; n];
        for t in self.model.transitions() {
            cells[t.source][t.target].push(t.cell_label());
        }
        TransitionMatrix {
            states: self.model.states().iter().map(|s| s.name.clone()).collect(),
            cells,
        }
    }

    /// The transition matrix as a markdown table
    pub fn render_matrix(&self) -> String {
        self.matrix().to_markdown()
    }

    /// Check a transition reported by a live device against the model.
    ///
    /// Returns the first declared transition matching all three parts.
    pub fn validate_observed(
        &self,
        previous: &str,
        trigger: &str,
        next: &str,
    ) -> Result<&'a Transition> {
        let target = self.model.index_of(next)?;
        self.model
            .transitions_from(previous)?
            .into_iter()
            .find(|t| t.target == target && t.trigger_label == trigger)
            .ok_or_else(|| {
                tracing::debug!(%previous, %trigger, %next, "observed transition not in model");
                Error::IllegalTransition {
                    previous: previous.to_string(),
                    trigger: trigger.to_string(),
                    next: next.to_string(),
                }
            })
    }

    /// Check a `previous_value -> value` change event whose trigger is unknown.
    ///
    /// Returns every transition that could explain the change.
    pub fn validate_change(&self, previous: &str, next: &str) -> Result<Vec<&'a Transition>> {
        let target = self.model.index_of(next)?;
        let candidates: Vec<_> = self
            .model
            .transitions_from(previous)?
            .into_iter()
            .filter(|t| t.target == target)
            .collect();
        if candidates.is_empty() {
            return Err(Error::IllegalTransition {
                previous: previous.to_string(),
                trigger: "*".to_string(),
                next: next.to_string(),
            });
        }
        Ok(candidates)
    }

    /// Whether a harness should invoke `label` or wait for it
    pub fn classify_trigger(&self, label: &str) -> Result<TriggerKind> {
        let kinds: BTreeSet<TriggerKind> = self
            .model
            .transitions()
            .iter()
            .filter(|t| t.trigger_label == label)
            .map(|t| t.trigger_kind)
            .collect();
        match (kinds.first(), kinds.len()) {
            (Some(&kind), 1) => Ok(kind),
            (None, _) => Err(Error::UnknownTrigger(label.to_string())),
            _ => Err(Error::AmbiguousTrigger(label.to_string())),
        }
    }

    /// States on which the command `label` is accepted, catalog order
    pub fn commands_by_source(&self, label: &str) -> Vec<&'a State> {
        self.states_where(|idx| {
            self.model
                .outgoing_of(idx)
                .any(|t| t.is_command() && t.trigger_label == label)
        })
    }

    /// States the system leaves on its own: every outgoing transition is an event
    pub fn transient_states(&self) -> Vec<&'a State> {
        self.states_where(|idx| {
            let mut outgoing = self.model.outgoing_of(idx).peekable();
            outgoing.peek().is_some() && outgoing.all(|t| t.is_event())
        })
    }

    pub fn is_fault_transition(&self, transition: &Transition) -> bool {
        let label = transition.trigger_label.to_lowercase();
        transition.is_event() && self.fault_keywords.iter().any(|k| label.contains(k.as_str()))
    }

    /// Targets of fault-labelled event transitions, catalog order
    pub fn fault_states(&self) -> Vec<&'a State> {
        self.states_where(|idx| {
            self.model
                .incoming_of(idx)
                .any(|t| self.is_fault_transition(t))
        })
    }

    /// States with no incoming transitions
    pub fn initial_states(&self) -> Vec<&'a State> {
        self.states_where(|idx| self.model.incoming_of(idx).next().is_none())
    }

    /// States with no outgoing transitions
    pub fn terminal_states(&self) -> Vec<&'a State> {
        self.states_where(|idx| self.model.outgoing_of(idx).next().is_none())
    }

    fn states_where(&self, mut keep: impl FnMut(usize) -> bool) -> Vec<&'a State> {
        self.model
            .states()
            .iter()
            .enumerate()
            .filter(|(idx, _)| keep(*idx))
            .map(|(_, s)| s)
            .collect()
    }

    /// States reachable from `state` (itself included), catalog order
    pub fn reachable_from(&self, state: &str) -> Result<Vec<&'a State>> {
        let start = self.model.index_of(state)?;
        let graph = self.model.to_graph();
        let mut reached = vec![false; graph.node_count()];
        let mut bfs = Bfs::new(&graph, NodeIndex::new(start));
        while let Some(node) = bfs.next(&graph) {
            reached[node.index()] = true;
        }
        Ok(self.states_where(|idx| reached[idx]))
    }

    /// Fewest-transition path between two states over any transition.
    ///
    /// Among parallel transitions the first-declared one is taken. An empty
    /// path means `from == to`; `None` means `to` is unreachable.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Option<Vec<&'a Transition>>> {
        self.path_in(&self.model.to_graph(), from, to)
    }

    /// Steps a harness follows to drive a device from `from` to `to`
    /// without passing through a fault transition.
    pub fn command_sequence(&self, from: &str, to: &str) -> Result<Option<Vec<Step>>> {
        let transitions = self.model.transitions();
        let mut graph = self.model.to_graph();
        graph.retain_edges(|g, edge| !self.is_fault_transition(&transitions[g[edge]]));

        let path = self.path_in(&graph, from, to)?;
        Ok(path.map(|hops| {
            hops.into_iter()
                .map(|t| Step::from_transition(self.model, t))
                .collect()
        }))
    }

    fn path_in(
        &self,
        graph: &DiGraph<usize, usize>,
        from: &str,
        to: &str,
    ) -> Result<Option<Vec<&'a Transition>>> {
        let start = NodeIndex::new(self.model.index_of(from)?);
        let goal = NodeIndex::new(self.model.index_of(to)?);

        let Some((_, nodes)) = astar(graph, start, |n| n == goal, |_| 1usize, |_| 0) else {
            return Ok(None);
        };

        let transitions = self.model.transitions();
        let mut hops = Vec::with_capacity(nodes.len().saturating_sub(1));
        for pair in nodes.windows(2) {
            let idx = graph
                .edges_connecting(pair[0], pair[1])
                .map(|e| *e.weight())
                .min()
                .ok_or_else(|| Error::custom("path step without a transition"))?;
            hops.push(&transitions[idx]);
        }
        Ok(Some(hops))
    }

    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.model.to_graph())
    }

    pub fn report(&self) -> AnalysisReport {
        let names = |states: Vec<&State>| -> Vec<String> {
            states.into_iter().map(|s| s.name.clone()).collect()
        };
        let labels = |set: BTreeSet<&str>| -> BTreeSet<String> {
            set.into_iter().map(String::from).collect()
        };

        AnalysisReport {
            stats: self.model.stats(),
            commands: labels(self.all_commands()),
            events: labels(self.all_events()),
            initial_states: names(self.initial_states()),
            terminal_states: names(self.terminal_states()),
            self_looping_states: names(self.self_looping_states()),
            transient_states: names(self.transient_states()),
            fault_states: names(self.fault_states()),
            has_cycles: self.has_cycles(),
        }
    }
}
