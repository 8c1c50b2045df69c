//! The immutable problem instance and its metadata record.
//!
//! An [`Instance`] is assembled exactly once per generation pass and never
//! mutated afterwards; serialization is a pure projection of it. Construction
//! is the single choke point where numeric sanity and parallel-array lengths
//! are enforced, so nothing malformed can reach the serializer.

use serde::Serialize;

use crate::{
    cost::DIAMETER_CATALOG,
    demand::SizeCategory,
    error::{GeneratorError, Result},
    index::{LayerSizes, NodeClass},
    stress::StressVariant,
    topology::Topology,
};

/// Computed size label, classified from arc and node counts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    /// Up to 50 arcs and 15 nodes.
    Small,
    /// Above 50 arcs or 15 nodes.
    Medium,
    /// Above 100 arcs or 25 nodes.
    Large,
    /// Above 200 arcs or 40 nodes.
    VeryLarge,
}

impl SizeClass {
    /// Classifies an instance by its arc and node counts.
    #[must_use]
    pub const fn classify(arc_count: usize, node_count: usize) -> Self {
        if arc_count > 200 || node_count > 40 {
            Self::VeryLarge
        } else if arc_count > 100 || node_count > 25 {
            Self::Large
        } else if arc_count > 50 || node_count > 15 {
            Self::Medium
        } else {
            Self::Small
        }
    }
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::VeryLarge => "very_large",
        };
        f.write_str(name)
    }
}

/// Descriptive record attached to every generated instance.
#[derive(Clone, Debug, Serialize)]
pub struct InstanceMetadata {
    /// Size label computed from the realized arc and node counts.
    pub size_class: SizeClass,
    /// Category whose envelopes were used for sampling, when applicable.
    pub category: Option<SizeCategory>,
    /// Total supply after rounding.
    pub total_supply: f64,
    /// Exact total demand.
    pub total_demand: f64,
    /// Realized slack factor (total supply / total demand).
    pub slack_factor: f64,
    /// Total arc count.
    pub arc_count: usize,
    /// Total node count.
    pub node_count: usize,
    /// Seed pinned for this draw, if any.
    pub seed: Option<u64>,
    /// Stress variant that produced this instance, if any.
    pub variant: Option<StressVariant>,
    /// Why the instance is expected to be hard or infeasible (stress only).
    pub justification: Option<String>,
}

/// A fully assembled, immutable problem instance.
#[derive(Clone, Debug)]
pub struct Instance {
    sizes: LayerSizes,
    topology: Topology,
    supply: Vec<f64>,
    demand: Vec<f64>,
    install_cost: Vec<f64>,
    trans_cost: Vec<f64>,
    metadata: InstanceMetadata,
}

impl Instance {
    /// Validates and assembles an instance.
    ///
    /// `supply` and `demand` are per-node arrays over the full 1-based index
    /// range; `install_cost` is the row-major `nA × nD` table; `trans_cost`
    /// is parallel to the canonical arc order.
    ///
    /// # Errors
    /// Returns [`GeneratorError::ParallelArrayMismatch`] when an array length
    /// disagrees with the topology, and [`GeneratorError::MalformedMetadata`]
    /// when any value is non-finite or negative.
    pub fn try_new(
        sizes: LayerSizes,
        topology: Topology,
        supply: Vec<f64>,
        demand: Vec<f64>,
        install_cost: Vec<f64>,
        trans_cost: Vec<f64>,
        metadata: InstanceMetadata,
    ) -> Result<Self> {
        let arc_count = topology.arc_count();
        let node_count = sizes.total();
        let diameters = DIAMETER_CATALOG.len();

        check_len("supply", &supply, node_count)?;
        check_len("demand", &demand, node_count)?;
        check_len("trans_cost", &trans_cost, arc_count)?;
        check_len("install_cost", &install_cost, arc_count * diameters)?;

        check_values("supply", &supply)?;
        check_values("demand", &demand)?;
        check_values("trans_cost", &trans_cost)?;
        check_values("install_cost", &install_cost)?;
        for (field, value) in [
            ("total_supply", metadata.total_supply),
            ("total_demand", metadata.total_demand),
            ("slack_factor", metadata.slack_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GeneratorError::MalformedMetadata { field, value });
            }
        }

        Ok(Self {
            sizes,
            topology,
            supply,
            demand,
            install_cost,
            trans_cost,
            metadata,
        })
    }

    /// The validated layer sizes.
    #[must_use]
    pub const fn sizes(&self) -> &LayerSizes {
        &self.sizes
    }

    /// The arc lists in canonical order.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Per-node supply, zero outside the Plant block.
    #[must_use]
    pub fn supply(&self) -> &[f64] {
        &self.supply
    }

    /// Per-node demand, zero outside the Transfer and Final blocks.
    #[must_use]
    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    /// The row-major `nA × nD` installation cost table.
    #[must_use]
    pub fn install_cost(&self) -> &[f64] {
        &self.install_cost
    }

    /// Transport unit costs, parallel to the canonical arc order.
    #[must_use]
    pub fn trans_cost(&self) -> &[f64] {
        &self.trans_cost
    }

    /// The metadata record.
    #[must_use]
    pub const fn metadata(&self) -> &InstanceMetadata {
        &self.metadata
    }
}

/// Assembles the full per-node supply and demand arrays from the block-local
/// values produced by the demand synthesizer.
#[must_use]
pub(crate) fn assemble_node_arrays(
    sizes: &LayerSizes,
    per_plant_supply: f64,
    transfer_demand: &[f64],
    final_demand: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let total = sizes.total();
    let mut supply = vec![0.0; total];
    let mut demand = vec![0.0; total];

    for id in sizes.ids_of(NodeClass::Plant) {
        supply[id - 1] = per_plant_supply;
    }
    for (offset, id) in sizes.ids_of(NodeClass::Transfer).enumerate() {
        demand[id - 1] = transfer_demand[offset];
    }
    for (offset, id) in sizes.ids_of(NodeClass::Final).enumerate() {
        demand[id - 1] = final_demand[offset];
    }

    (supply, demand)
}

fn check_len(array: &'static str, values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(GeneratorError::ParallelArrayMismatch {
            array,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn check_values(field: &'static str, values: &[f64]) -> Result<()> {
    for &value in values {
        if !value.is_finite() || value < 0.0 {
            return Err(GeneratorError::MalformedMetadata { field, value });
        }
    }
    Ok(())
}
