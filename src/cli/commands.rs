//! CLI command implementations
//!
//! Each command writes to the given sink so it can be exercised in tests.

use crate::cli::OutputFormat;
use crate::cli::output;
use crate::parser::ModelSchema;
use crate::state_machine::{StateMachineModel, TransitionAnalyzer};
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Numbered transition listing
pub fn transitions(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    format: OutputFormat,
) -> Result<()> {
    let listing = analyzer.list_transitions();
    tracing::info!("Listing {} transitions", listing.len());
    match format {
        OutputFormat::Json => output::output_json(w, &listing),
        OutputFormat::Table => output::output_transitions(w, &listing),
    }
}

pub fn matrix(w: &mut impl Write, analyzer: &TransitionAnalyzer<'_>) -> Result<()> {
    write!(w, "{}", analyzer.render_matrix())?;
    Ok(())
}

pub fn outgoing(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    state: &str,
    all: bool,
) -> Result<()> {
    if all {
        let edges = analyzer.outgoing_edges(state)?;
        output::output_edges(w, analyzer.model(), &edges)
    } else {
        output::output_adjacency(w, state, "->", &analyzer.outgoing(state)?)
    }
}

pub fn incoming(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    state: &str,
    all: bool,
) -> Result<()> {
    if all {
        let edges = analyzer.incoming_edges(state)?;
        output::output_edges(w, analyzer.model(), &edges)
    } else {
        output::output_adjacency(w, state, "<-", &analyzer.incoming(state)?)
    }
}

pub fn paths(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    format: OutputFormat,
) -> Result<()> {
    let paths = analyzer.two_hop_paths();
    tracing::info!("Found {} two-hop paths", paths.len());
    match format {
        OutputFormat::Json => output::output_json(w, &paths),
        OutputFormat::Table => output::output_paths(w, &paths),
    }
}

pub fn triggers(w: &mut impl Write, analyzer: &TransitionAnalyzer<'_>) -> Result<()> {
    writeln!(w, "Commands:")?;
    for label in analyzer.all_commands() {
        let sources: Vec<_> = analyzer
            .commands_by_source(label)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        writeln!(w, "  {:<20} accepted in {}", label, sources.join(", "))?;
    }
    writeln!(w)?;
    writeln!(w, "Events:")?;
    for label in analyzer.all_events() {
        writeln!(w, "  {}", label)?;
    }
    Ok(())
}

/// Check an observed transition; an illegal one is reported and returned as an error
pub fn check(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    previous: &str,
    trigger: &str,
    next: &str,
) -> Result<()> {
    match analyzer.validate_observed(previous, trigger, next) {
        Ok(transition) => {
            writeln!(
                w,
                "✅ {} --[{}]--> {}",
                previous,
                transition.display_label(),
                next
            )?;
            Ok(())
        }
        Err(err @ Error::IllegalTransition { .. }) => {
            writeln!(w, "❌ {}", err)?;
            if let Ok(candidates) = analyzer.validate_change(previous, next) {
                let labels: Vec<_> = candidates.iter().map(|t| t.display_label()).collect();
                writeln!(w, "   declared triggers: {}", labels.join(", "))?;
            }
            Err(err)
        }
        Err(err) => Err(err),
    }
}

pub fn path(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    from: &str,
    to: &str,
    steps: bool,
) -> Result<()> {
    if steps {
        return match analyzer.command_sequence(from, to)? {
            Some(steps) => output::output_steps(w, from, &steps),
            None => Err(Error::custom(format!(
                "{} is not reachable from {} without a fault transition",
                to, from
            ))),
        };
    }

    match analyzer.shortest_path(from, to)? {
        Some(hops) => output::output_edges(w, analyzer.model(), &hops),
        None => Err(Error::custom(format!("{} is not reachable from {}", to, from))),
    }
}

pub fn report(
    w: &mut impl Write,
    analyzer: &TransitionAnalyzer<'_>,
    format: OutputFormat,
) -> Result<()> {
    let report = analyzer.report();
    match format {
        OutputFormat::Json => output::output_json(w, &report),
        OutputFormat::Table => output::output_report(w, &report),
    }
}

pub fn dot(w: &mut impl Write, model: &StateMachineModel, output: Option<&Path>) -> Result<()> {
    let dot = model.to_dot();
    match output {
        Some(path) => {
            std::fs::write(path, dot)?;
            writeln!(w, "Graph exported to {}", path.display())?;
        }
        None => write!(w, "{}", dot)?,
    }
    Ok(())
}

pub fn export(w: &mut impl Write, model: &StateMachineModel, output: &Path) -> Result<()> {
    ModelSchema::from_model(model).to_file(output)?;
    writeln!(w, "Model exported to {}", output.display())?;
    Ok(())
}

/// Schema validate command implementation
pub mod schema_validate {
    use super::*;

    /// Execute the schema-validate command
    pub fn execute(w: &mut impl Write, schema_path: &Path) -> Result<()> {
        tracing::info!("Validating schema: {:?}", schema_path);

        let schema = match ModelSchema::from_file(schema_path) {
            Ok(s) => s,
            Err(e) => {
                writeln!(w, "❌ Failed to load schema: {}", e)?;
                return Err(e);
            }
        };

        writeln!(w, "📋 Schema Validation Report")?;
        writeln!(w, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(w, "File: {:?}", schema_path)?;
        writeln!(w, "States:      {}", schema.states.len())?;
        writeln!(w, "Transitions: {}", schema.transitions.len())?;
        writeln!(w)?;

        let model = match schema.into_model().map_err(|e| e.in_file(schema_path)) {
            Ok(model) => model,
            Err(e) => {
                writeln!(w, "❌ Errors:")?;
                writeln!(w, "   {}", e)?;
                return Err(e);
            }
        };

        let analyzer = TransitionAnalyzer::new(&model);
        let mut warnings = Vec::new();
        for state in analyzer.initial_states() {
            if state.is_observational() {
                warnings.push(format!("{} has no incoming transitions", state.name));
            }
        }
        for state in analyzer.terminal_states() {
            warnings.push(format!("{} has no outgoing transitions", state.name));
        }
        for label in analyzer.all_commands() {
            if analyzer.all_events().contains(label) {
                warnings.push(format!("{} is declared both as a command and as an event", label));
            }
        }

        if !warnings.is_empty() {
            writeln!(w, "⚠️  Warnings:")?;
            for warning in &warnings {
                writeln!(w, "   {}", warning)?;
            }
            writeln!(w)?;
        }

        writeln!(w, "✅ Schema is valid!")?;
        Ok(())
    }
}
