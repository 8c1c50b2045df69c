//! Adversarial instance generators.
//!
//! Each variant reuses the standard pipeline but deliberately violates
//! exactly one feasibility-related invariant, and records why the result is
//! expected to be hard or infeasible in its metadata. All variants start from
//! the complete bipartite mesh so the injected violation is the only
//! structural anomaly.

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    cost::{
        install_cost_table, max_capacity, sample_transport_costs, sample_uniform_costs,
    },
    demand::{balance, sample_demands, Balance},
    error::Result,
    generator::RngStreams,
    index::{LayerSizes, NodeClass, NodeId},
    instance::{assemble_node_arrays, Instance, InstanceMetadata, SizeClass},
    topology::Topology,
};

/// Transport cost floor for stress variants (looser than the standard 0.1).
const STRESS_COST_FLOOR: f64 = 0.5;

/// Demand multiplier over the theoretical maximum deliverable flow used by
/// the overload variant.
const OVERLOAD_FACTOR: f64 = 2.0;

/// The six adversarial generation modes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StressVariant {
    /// Total demand far above the theoretical maximum deliverable flow.
    DemandOverload,
    /// A single tank forces all flow through one intermediate node.
    Bottleneck,
    /// Transport costs so high that any feasible flow is implausible.
    ProhibitiveCost,
    /// Arcs removed post-hoc, isolating a subset of final nodes.
    FragmentedTopology,
    /// Slack factor forced to ~1.001, near-zero feasible headroom.
    NearExactBalance,
    /// One demand subgroup needs the largest diameter, another the smallest.
    ConflictingCapacity,
}

impl StressVariant {
    /// All variants, in a stable order for batch drivers.
    pub const ALL: [Self; 6] = [
        Self::DemandOverload,
        Self::Bottleneck,
        Self::ProhibitiveCost,
        Self::FragmentedTopology,
        Self::NearExactBalance,
        Self::ConflictingCapacity,
    ];

    /// Stable lowercase name, used in artifact file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DemandOverload => "demand_overload",
            Self::Bottleneck => "bottleneck",
            Self::ProhibitiveCost => "prohibitive_cost",
            Self::FragmentedTopology => "fragmented_topology",
            Self::NearExactBalance => "near_exact_balance",
            Self::ConflictingCapacity => "conflicting_capacity",
        }
    }

    /// Generates one adversarial instance with both RNG streams pinned to
    /// seeds derived from `seed`.
    ///
    /// # Errors
    /// Returns an error when a sampled value is malformed or a balance ratio
    /// is undefined; see [`crate::GeneratorError`].
    pub fn generate_seeded(self, seed: u64) -> Result<Instance> {
        let mut streams = RngStreams::from_seed(seed);
        self.generate(Some(seed), &mut streams)
    }

    /// Generates one adversarial instance over caller-provided RNG streams.
    ///
    /// # Errors
    /// Returns an error when a sampled value is malformed or a balance ratio
    /// is undefined; see [`crate::GeneratorError`].
    #[instrument(skip(streams), fields(variant = self.name()))]
    pub fn generate(self, seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
        let instance = match self {
            Self::DemandOverload => demand_overload(seed, streams),
            Self::Bottleneck => bottleneck(seed, streams),
            Self::ProhibitiveCost => prohibitive_cost(seed, streams),
            Self::FragmentedTopology => fragmented_topology(seed, streams),
            Self::NearExactBalance => near_exact_balance(seed, streams),
            Self::ConflictingCapacity => conflicting_capacity(seed, streams),
        }?;
        info!(
            arcs = instance.metadata().arc_count,
            slack = instance.metadata().slack_factor,
            "generated stress instance"
        );
        Ok(instance)
    }
}

impl std::fmt::Display for StressVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn demand_overload(seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
    let sizes = LayerSizes::new(2, 3, 4, 6)?;
    let topology = Topology::complete(&sizes);
    let arc_count = topology.arc_count();

    // Every arc at the widest diameter still cannot carry this much.
    let ceiling = max_capacity() * arc_count as f64;
    let target = ceiling * OVERLOAD_FACTOR;
    let per_node = crate::util::round2(target / (sizes.transfers() + sizes.finals()) as f64);
    let transfer_demand = vec![per_node; sizes.transfers()];
    let final_demand = vec![per_node; sizes.finals()];

    let bal = balance(transfer_demand, final_demand, sizes.plants(), 0.1)?;
    let trans_cost =
        sample_transport_costs(arc_count, 8.0, 3.0, STRESS_COST_FLOOR, &mut streams.numeric);
    let justification = format!(
        "total demand {:.1} exceeds the theoretical maximum deliverable capacity {:.1} ({arc_count} arcs at the widest diameter)",
        bal.total_demand, ceiling
    );

    assemble(
        sizes,
        topology,
        bal,
        trans_cost,
        StressVariant::DemandOverload,
        justification,
        seed,
    )
}

fn bottleneck(seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
    let sizes = LayerSizes::new(4, 1, 6, 10)?;
    let topology = Topology::complete(&sizes);
    let arc_count = topology.arc_count();

    let transfer_demand = sample_demands(sizes.transfers(), (500.0, 800.0), &mut streams.numeric);
    let final_demand = sample_demands(sizes.finals(), (600.0, 900.0), &mut streams.numeric);
    let bal = balance(transfer_demand, final_demand, sizes.plants(), 0.8)?;
    let trans_cost =
        sample_transport_costs(arc_count, 8.0, 3.0, STRESS_COST_FLOOR, &mut streams.numeric);
    let justification =
        "all flow must transit a single tank node, and supply covers only 80% of demand"
            .to_owned();

    assemble(
        sizes,
        topology,
        bal,
        trans_cost,
        StressVariant::Bottleneck,
        justification,
        seed,
    )
}

fn prohibitive_cost(seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
    let sizes = LayerSizes::new(3, 4, 5, 7)?;
    let topology = Topology::complete(&sizes);
    let arc_count = topology.arc_count();

    let transfer_demand = sample_demands(sizes.transfers(), (80.0, 150.0), &mut streams.numeric);
    let final_demand = sample_demands(sizes.finals(), (100.0, 180.0), &mut streams.numeric);
    let bal = balance(transfer_demand, final_demand, sizes.plants(), 1.1)?;
    let trans_cost = sample_uniform_costs(arc_count, (5000.0, 20_000.0), &mut streams.numeric);
    let justification =
        "transport unit costs in [5000, 20000] are unrelated to the demand scale, so any feasible flow is economically implausible"
            .to_owned();

    assemble(
        sizes,
        topology,
        bal,
        trans_cost,
        StressVariant::ProhibitiveCost,
        justification,
        seed,
    )
}

fn fragmented_topology(seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
    let sizes = LayerSizes::new(3, 5, 6, 8)?;
    let mut topology = Topology::complete(&sizes);

    let finals: Vec<NodeId> = sizes.ids_of(NodeClass::Final).collect();
    let isolated: Vec<NodeId> = finals
        .choose_multiple(&mut streams.general, (sizes.finals() / 2).min(3))
        .copied()
        .collect();
    topology.fragment(&isolated, &mut streams.general);
    let arc_count = topology.arc_count();

    let transfer_demand = sample_demands(sizes.transfers(), (200.0, 400.0), &mut streams.numeric);
    let final_demand = sample_demands(sizes.finals(), (300.0, 500.0), &mut streams.numeric);
    let bal = balance(transfer_demand, final_demand, sizes.plants(), 1.2)?;
    let trans_cost =
        sample_transport_costs(arc_count, 8.0, 3.0, STRESS_COST_FLOOR, &mut streams.numeric);
    let justification = format!(
        "final nodes {isolated:?} are isolated with no incoming arcs, violating layer coverage"
    );

    assemble(
        sizes,
        topology,
        bal,
        trans_cost,
        StressVariant::FragmentedTopology,
        justification,
        seed,
    )
}

fn near_exact_balance(seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
    let sizes = LayerSizes::new(6, 10, 15, 25)?;
    let topology = Topology::complete(&sizes);
    let arc_count = topology.arc_count();

    let transfer_demand = sample_demands(sizes.transfers(), (10.0, 500.0), &mut streams.numeric);
    let final_demand = sample_demands(sizes.finals(), (20.0, 600.0), &mut streams.numeric);
    let bal = balance(transfer_demand, final_demand, sizes.plants(), 1.001)?;
    let trans_cost =
        sample_transport_costs(arc_count, 8.0, 3.0, STRESS_COST_FLOOR, &mut streams.numeric);
    let justification = format!(
        "slack factor {:.3} leaves near-zero feasible headroom on a {arc_count}-arc instance",
        bal.realized_slack
    );

    assemble(
        sizes,
        topology,
        bal,
        trans_cost,
        StressVariant::NearExactBalance,
        justification,
        seed,
    )
}

fn conflicting_capacity(seed: Option<u64>, streams: &mut RngStreams) -> Result<Instance> {
    let sizes = LayerSizes::new(2, 3, 4, 6)?;
    let topology = Topology::complete(&sizes);
    let arc_count = topology.arc_count();

    // Transfer demands overwhelm the smallest diameter; final demands would
    // waste anything wider.
    let transfer_demand = sample_demands(sizes.transfers(), (800.0, 1200.0), &mut streams.numeric);
    let final_demand = sample_demands(sizes.finals(), (50.0, 100.0), &mut streams.numeric);
    let bal = balance(transfer_demand, final_demand, sizes.plants(), 1.05)?;
    let trans_cost = sample_uniform_costs(arc_count, (1.0, 5.0), &mut streams.numeric);
    let justification =
        "transfer demands exceed the smallest diameter capacity (795 l/min) while final demands sit far below it, forcing conflicting capacity choices on a shared topology"
            .to_owned();

    assemble(
        sizes,
        topology,
        bal,
        trans_cost,
        StressVariant::ConflictingCapacity,
        justification,
        seed,
    )
}

fn assemble(
    sizes: LayerSizes,
    topology: Topology,
    bal: Balance,
    trans_cost: Vec<f64>,
    variant: StressVariant,
    justification: String,
    seed: Option<u64>,
) -> Result<Instance> {
    let arc_count = topology.arc_count();
    let install_cost = install_cost_table(arc_count);
    let (supply, demand) =
        assemble_node_arrays(&sizes, bal.per_plant_supply, &bal.transfer_demand, &bal.final_demand);

    let metadata = InstanceMetadata {
        size_class: SizeClass::classify(arc_count, sizes.total()),
        category: None,
        total_supply: bal.total_supply,
        total_demand: bal.total_demand,
        slack_factor: bal.realized_slack,
        arc_count,
        node_count: sizes.total(),
        seed,
        variant: Some(variant),
        justification: Some(justification),
    };

    Instance::try_new(sizes, topology, supply, demand, install_cost, trans_cost, metadata)
}
