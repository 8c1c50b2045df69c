//! Generation orchestration: builder, RNG streams, and the standard pipeline.
//!
//! Each generation call is an independent, fully synchronous pass: topology,
//! then demand/supply, then costs, then one immutable [`Instance`]. Two
//! separately seedable RNG streams are used — a general-purpose stream for
//! topology and layer-size draws, and a numeric stream for demand and cost
//! sampling — so callers that need byte-identical re-runs pin both.

use rand::{rngs::SmallRng, SeedableRng};
use tracing::{info, instrument};

use crate::{
    cost::{install_cost_table, sample_transport_costs, TRANSPORT_COST_FLOOR},
    demand::{balance, sample_demands, SizeCategory, DEFAULT_TARGET_SLACK},
    error::Result,
    index::LayerSizes,
    instance::{assemble_node_arrays, Instance, InstanceMetadata, SizeClass},
    topology::Topology,
};

/// Derives the numeric-stream seed from the general-stream seed when the
/// caller pins only one value.
const NUMERIC_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Pair of independently seedable RNG streams.
#[derive(Debug)]
pub struct RngStreams {
    /// General-purpose stream: topology and layer-size draws.
    pub general: SmallRng,
    /// Numeric stream: demand and cost sampling.
    pub numeric: SmallRng,
}

impl RngStreams {
    /// Seeds both streams deterministically from one value.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            general: SmallRng::seed_from_u64(seed),
            numeric: SmallRng::seed_from_u64(seed ^ NUMERIC_STREAM_SALT),
        }
    }

    /// Seeds each stream separately.
    #[must_use]
    pub fn from_seeds(general: u64, numeric: u64) -> Self {
        Self {
            general: SmallRng::seed_from_u64(general),
            numeric: SmallRng::seed_from_u64(numeric),
        }
    }

    /// Non-reproducible streams from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            general: SmallRng::from_entropy(),
            numeric: SmallRng::from_entropy(),
        }
    }
}

/// Configures and constructs [`Generator`] instances.
///
/// # Examples
/// ```
/// use pipegen_core::{GeneratorBuilder, LayerSizes};
///
/// let sizes = LayerSizes::new(1, 2, 2, 3).expect("valid sizes");
/// let generator = GeneratorBuilder::new(sizes)
///     .with_seed(12345)
///     .build();
/// let instance = generator.generate().expect("generation succeeds");
/// assert_eq!(instance.metadata().node_count, 8);
/// ```
#[derive(Clone, Debug)]
pub struct GeneratorBuilder {
    sizes: LayerSizes,
    category: SizeCategory,
    target_slack: f64,
    seed: Option<u64>,
    numeric_seed: Option<u64>,
}

impl GeneratorBuilder {
    /// Creates a builder for the given validated layer sizes.
    #[must_use]
    pub fn new(sizes: LayerSizes) -> Self {
        Self {
            sizes,
            category: SizeCategory::Small,
            target_slack: DEFAULT_TARGET_SLACK,
            seed: None,
            numeric_seed: None,
        }
    }

    /// Creates a builder with layer sizes drawn from the category's ranges.
    ///
    /// A pinned seed also pins the drawn sizes, so seeded callers get the
    /// same configuration on every run.
    #[must_use]
    pub fn sampled(category: SizeCategory, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let sizes = category.sample_sizes(&mut rng);
        Self::new(sizes).with_category(category)
    }

    /// Selects the sampling envelopes (demand range, transport cost shape).
    #[must_use]
    pub fn with_category(mut self, category: SizeCategory) -> Self {
        self.category = category;
        self
    }

    /// Overrides the target slack factor (default 1.3).
    #[must_use]
    pub fn with_target_slack(mut self, target_slack: f64) -> Self {
        self.target_slack = target_slack;
        self
    }

    /// Pins both RNG streams to seeds derived from one value.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.numeric_seed = None;
        self
    }

    /// Pins the two RNG streams separately.
    #[must_use]
    pub fn with_seeds(mut self, general: u64, numeric: u64) -> Self {
        self.seed = Some(general);
        self.numeric_seed = Some(numeric);
        self
    }

    /// Constructs the generator.
    #[must_use]
    pub fn build(self) -> Generator {
        Generator {
            sizes: self.sizes,
            category: self.category,
            target_slack: self.target_slack,
            seed: self.seed,
            numeric_seed: self.numeric_seed,
        }
    }
}

/// Produces feasible-by-design instances for a fixed size configuration.
#[derive(Clone, Debug)]
pub struct Generator {
    sizes: LayerSizes,
    category: SizeCategory,
    target_slack: f64,
    seed: Option<u64>,
    numeric_seed: Option<u64>,
}

impl Generator {
    /// The layer sizes this generator draws for.
    #[must_use]
    pub const fn sizes(&self) -> &LayerSizes {
        &self.sizes
    }

    /// The configured target slack factor.
    #[must_use]
    pub const fn target_slack(&self) -> f64 {
        self.target_slack
    }

    /// Runs one generation pass and returns a fresh instance.
    ///
    /// Unseeded generators draw from operating-system entropy, so repeated
    /// calls produce different instances; seeded generators reproduce the
    /// same instance on every call.
    ///
    /// # Errors
    /// Returns an error when the demand/supply balance is undefined or the
    /// assembled arrays fail validation; see [`crate::GeneratorError`].
    #[instrument(skip(self), fields(nodes = self.sizes.total()))]
    pub fn generate(&self) -> Result<Instance> {
        let mut streams = self.streams();
        let instance = generate_with(
            self.sizes,
            self.category,
            self.target_slack,
            self.seed,
            &mut streams,
        )?;
        info!(
            arcs = instance.metadata().arc_count,
            slack = instance.metadata().slack_factor,
            "generated instance"
        );
        Ok(instance)
    }

    fn streams(&self) -> RngStreams {
        match (self.seed, self.numeric_seed) {
            (Some(general), Some(numeric)) => RngStreams::from_seeds(general, numeric),
            (Some(seed), None) => RngStreams::from_seed(seed),
            (None, _) => RngStreams::from_entropy(),
        }
    }
}

/// The standard pipeline over caller-provided RNG streams.
fn generate_with(
    sizes: LayerSizes,
    category: SizeCategory,
    target_slack: f64,
    seed: Option<u64>,
    streams: &mut RngStreams,
) -> Result<Instance> {
    let topology = Topology::sample(&sizes, &mut streams.general);
    let envelope = category.envelope();

    let transfer_demand = sample_demands(sizes.transfers(), envelope.demand, &mut streams.numeric);
    let final_demand = sample_demands(sizes.finals(), envelope.demand, &mut streams.numeric);
    let bal = balance(transfer_demand, final_demand, sizes.plants(), target_slack)?;

    let arc_count = topology.arc_count();
    let (mean, std) = envelope.transport;
    let trans_cost = sample_transport_costs(
        arc_count,
        mean,
        std,
        TRANSPORT_COST_FLOOR,
        &mut streams.numeric,
    );
    let install_cost = install_cost_table(arc_count);

    let (supply, demand) =
        assemble_node_arrays(&sizes, bal.per_plant_supply, &bal.transfer_demand, &bal.final_demand);

    let metadata = InstanceMetadata {
        size_class: SizeClass::classify(arc_count, sizes.total()),
        category: Some(category),
        total_supply: bal.total_supply,
        total_demand: bal.total_demand,
        slack_factor: bal.realized_slack,
        arc_count,
        node_count: sizes.total(),
        seed,
        variant: None,
        justification: None,
    };

    Instance::try_new(sizes, topology, supply, demand, install_cost, trans_cost, metadata)
}
