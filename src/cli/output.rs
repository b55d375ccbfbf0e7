//! Output formatting module
//!
//! Presentation adapters turning analyzer query results into text tables or JSON.

use crate::Result;
use crate::state_machine::{
    Adjacent, AnalysisReport, StateMachineModel, Step, Transition, TransitionEntry, TwoHopPath,
};
use serde::Serialize;

/// Output any query result as pretty JSON
pub fn output_json<T: Serialize + ?Sized>(w: &mut impl std::io::Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Numbered transition listing
pub fn output_transitions(
    w: &mut impl std::io::Write,
    listing: &[TransitionEntry<'_>],
) -> Result<()> {
    writeln!(w, "{:>4}  {:<12} {:<28} {:<12}", "#", "Source", "Trigger", "Target")?;
    writeln!(w, "{:-<60}", "")?;
    for entry in listing {
        writeln!(
            w,
            "{:>4}  {:<12} {:<28} {:<12}",
            entry.index, entry.source, entry.trigger_display, entry.target
        )?;
    }
    Ok(())
}

/// Collapsed adjacency of one state
pub fn output_adjacency(
    w: &mut impl std::io::Write,
    state: &str,
    arrow: &str,
    neighbours: &[Adjacent<'_>],
) -> Result<()> {
    if neighbours.is_empty() {
        writeln!(w, "{} has no neighbours", state)?;
        return Ok(());
    }
    for adj in neighbours {
        writeln!(
            w,
            "{} {} {:<12} {} ({})",
            state, arrow, adj.state, adj.trigger_label, adj.trigger_kind
        )?;
    }
    Ok(())
}

/// Individual transitions, one per line
pub fn output_edges(
    w: &mut impl std::io::Write,
    model: &StateMachineModel,
    edges: &[&Transition],
) -> Result<()> {
    for t in edges {
        writeln!(
            w,
            "{:<12} --[{}]--> {}",
            model.state_at(t.source).name,
            t.display_label(),
            model.state_at(t.target).name
        )?;
    }
    Ok(())
}

pub fn output_paths(w: &mut impl std::io::Write, paths: &[TwoHopPath<'_>]) -> Result<()> {
    for p in paths {
        writeln!(
            w,
            "{} --[{}]--> {} --[{}]--> {}",
            p.source, p.first_trigger, p.mid, p.second_trigger, p.target
        )?;
    }
    writeln!(w)?;
    writeln!(w, "Total: {} paths", paths.len())?;
    Ok(())
}

/// Harness steps from a starting state
pub fn output_steps(w: &mut impl std::io::Write, from: &str, steps: &[Step]) -> Result<()> {
    writeln!(w, "start in {}", from)?;
    for (idx, step) in steps.iter().enumerate() {
        match step {
            Step::Invoke { command, next } => {
                writeln!(w, "{:>3}. invoke {:<20} -> {}", idx + 1, command, next)?
            }
            Step::Await { event, next } => {
                writeln!(w, "{:>3}. await {:<21} -> {}", idx + 1, event, next)?
            }
        }
    }
    Ok(())
}

pub fn output_report(w: &mut impl std::io::Write, report: &AnalysisReport) -> Result<()> {
    let join = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    writeln!(w, "State Machine Analysis")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;
    writeln!(w, "Summary:")?;
    writeln!(
        w,
        "  States:        {} ({} operational, {} observational)",
        report.stats.total_states,
        report.stats.operational_states,
        report.stats.observational_states
    )?;
    writeln!(
        w,
        "  Transitions:   {} ({} command, {} event)",
        report.stats.total_transitions,
        report.stats.command_transitions,
        report.stats.event_transitions
    )?;
    writeln!(w, "  Cyclic:        {}", report.has_cycles)?;
    writeln!(w)?;

    let commands: Vec<String> = report.commands.iter().cloned().collect();
    let events: Vec<String> = report.events.iter().cloned().collect();
    writeln!(w, "Commands:        {}", join(&commands))?;
    writeln!(w, "Events:          {}", join(&events))?;
    writeln!(w, "Initial states:  {}", join(&report.initial_states))?;
    writeln!(w, "Terminal states: {}", join(&report.terminal_states))?;
    writeln!(w, "Self loops:      {}", join(&report.self_looping_states))?;
    writeln!(w, "Transient:       {}", join(&report.transient_states))?;
    writeln!(w, "Fault states:    {}", join(&report.fault_states))?;
    Ok(())
}
