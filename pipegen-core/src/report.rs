//! Human-facing diagnostic reports.
//!
//! The report summarises the supply/demand balance and per-layer
//! connectivity of one instance. The plotting collaborator extracts two
//! fields by pattern matching on fixed label strings, so
//! [`TOTAL_COST_MARKER`] and [`RESOLUTION_TIME_MARKER`] must appear verbatim,
//! each followed by a single numeric token, whenever a solver outcome is
//! attached.

use std::fmt::Write as _;
use std::path::Path;

use crate::{dzn::write_atomic, error::Result, instance::Instance, topology::LayerPair};

/// Label preceding the solver's objective value. Consumed verbatim by the
/// plotting collaborator.
pub const TOTAL_COST_MARKER: &str = "TOTAL COST:";

/// Label preceding the solver's elapsed time. Consumed verbatim by the
/// plotting collaborator.
pub const RESOLUTION_TIME_MARKER: &str = "Resolution time:";

/// Outcome reported by the external solver collaborator, attached to a
/// report when available.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOutcome {
    /// Objective value of the best solution, if one was found.
    pub total_cost: Option<f64>,
    /// Wall-clock solve time in seconds.
    pub resolution_time_secs: f64,
}

/// Renders the plain-text diagnostic report.
#[must_use]
pub fn render(instance: &Instance, outcome: Option<&SolverOutcome>) -> String {
    let meta = instance.metadata();
    let mut out = String::new();

    let _ = writeln!(out, "=== INSTANCE REPORT ===");
    let _ = writeln!(out, "size class: {}", meta.size_class);
    if let Some(category) = meta.category {
        let _ = writeln!(out, "category: {category}");
    }
    if let Some(variant) = meta.variant {
        let _ = writeln!(out, "stress variant: {variant}");
    }
    if let Some(justification) = &meta.justification {
        let _ = writeln!(out, "expected hardness: {justification}");
    }
    if let Some(seed) = meta.seed {
        let _ = writeln!(out, "seed: {seed}");
    }
    let _ = writeln!(out, "nodes: {}", meta.node_count);
    let _ = writeln!(out, "arcs: {}", meta.arc_count);
    out.push('\n');

    let _ = writeln!(out, "SUPPLY/DEMAND BALANCE:");
    let _ = writeln!(out, "  total supply: {:.2}", meta.total_supply);
    let _ = writeln!(out, "  total demand: {:.2}", meta.total_demand);
    let _ = writeln!(out, "  realized slack factor: {:.2}", meta.slack_factor);
    out.push('\n');

    let _ = writeln!(out, "CONNECTIVITY:");
    let topology = instance.topology();
    let _ = writeln!(
        out,
        "  plants -> tanks: {} arcs",
        topology.pair(LayerPair::PlantTank).len()
    );
    let _ = writeln!(
        out,
        "  tanks -> transfers: {} arcs",
        topology.pair(LayerPair::TankTransfer).len()
    );
    let _ = writeln!(
        out,
        "  transfers -> finals: {} arcs",
        topology.pair(LayerPair::TransferFinal).len()
    );

    if let Some(outcome) = outcome {
        out.push('\n');
        let _ = writeln!(out, "SOLVER OUTCOME:");
        if let Some(total_cost) = outcome.total_cost {
            let _ = writeln!(out, "{TOTAL_COST_MARKER} ${total_cost:.2}");
        }
        let _ = writeln!(
            out,
            "{RESOLUTION_TIME_MARKER} {:.2}",
            outcome.resolution_time_secs
        );
    }

    out
}

/// Renders the report and writes it to `path` atomically.
///
/// # Errors
/// Returns [`crate::GeneratorError::Write`] with the target path on any I/O
/// failure.
pub fn write(instance: &Instance, outcome: Option<&SolverOutcome>, path: &Path) -> Result<()> {
    write_atomic(path, render(instance, outcome).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{generator::GeneratorBuilder, index::LayerSizes, topology::LayerPair};

    fn instance() -> Instance {
        let sizes = LayerSizes::new(2, 3, 4, 5).expect("sizes are valid");
        GeneratorBuilder::new(sizes)
            .with_seed(8)
            .build()
            .generate()
            .expect("generation succeeds")
    }

    #[rstest]
    fn report_summarises_balance_and_connectivity() {
        let instance = instance();
        let report = render(&instance, None);
        assert!(report.contains("realized slack factor: 1.30"));
        let pt = instance.topology().pair(LayerPair::PlantTank).len();
        assert!(report.contains(&format!("plants -> tanks: {pt} arcs")));
        assert!(!report.contains(TOTAL_COST_MARKER));
    }

    #[rstest]
    fn marker_lines_carry_one_numeric_token() {
        let outcome = SolverOutcome {
            total_cost: Some(1234.5),
            resolution_time_secs: 17.25,
        };
        let report = render(&instance(), Some(&outcome));

        let cost_line = report
            .lines()
            .find(|line| line.starts_with(TOTAL_COST_MARKER))
            .expect("cost marker is present");
        assert_eq!(cost_line, "TOTAL COST: $1234.50");

        let time_line = report
            .lines()
            .find(|line| line.starts_with(RESOLUTION_TIME_MARKER))
            .expect("time marker is present");
        let token = time_line
            .trim_start_matches(RESOLUTION_TIME_MARKER)
            .trim();
        assert_eq!(token.parse::<f64>().expect("numeric token"), 17.25);
    }

    #[rstest]
    fn cost_marker_is_omitted_without_a_solution() {
        let outcome = SolverOutcome {
            total_cost: None,
            resolution_time_secs: 60.0,
        };
        let report = render(&instance(), Some(&outcome));
        assert!(!report.contains(TOTAL_COST_MARKER));
        assert!(report.contains(RESOLUTION_TIME_MARKER));
    }
}
