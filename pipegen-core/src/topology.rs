//! Layered topology construction with per-layer-pair coverage guarantees.
//!
//! Arcs only connect adjacent layers (Plant→Tank, Tank→Transfer,
//! Transfer→Final). The canonical arc order concatenates the three lists in
//! that sequence; cost arrays are parallel to it.

use rand::{rngs::SmallRng, seq::SliceRandom, Rng};
use tracing::debug;

use crate::index::{LayerSizes, NodeClass, NodeId};

/// A directed arc between two adjacent layers, in global node indices.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PipeArc {
    /// Upstream endpoint.
    pub from: NodeId,
    /// Downstream endpoint.
    pub to: NodeId,
}

/// The three adjacent layer pairs, in canonical order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayerPair {
    /// Plant → Tank.
    PlantTank,
    /// Tank → Transfer.
    TankTransfer,
    /// Transfer → Final.
    TransferFinal,
}

impl LayerPair {
    /// All pairs in canonical order.
    pub const ALL: [Self; 3] = [Self::PlantTank, Self::TankTransfer, Self::TransferFinal];

    /// The upstream and downstream classes of this pair.
    #[must_use]
    pub const fn classes(self) -> (NodeClass, NodeClass) {
        match self {
            Self::PlantTank => (NodeClass::Plant, NodeClass::Tank),
            Self::TankTransfer => (NodeClass::Tank, NodeClass::Transfer),
            Self::TransferFinal => (NodeClass::Transfer, NodeClass::Final),
        }
    }
}

/// Arc lists for the three layer pairs.
///
/// Duplicate `(from, to)` pairs are possible and deliberately kept: the
/// sampling passes do not deduplicate, and downstream consumers must tolerate
/// repeated arcs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Topology {
    plant_tank: Vec<PipeArc>,
    tank_transfer: Vec<PipeArc>,
    transfer_final: Vec<PipeArc>,
}

impl Topology {
    /// Samples a topology with the two-pass coverage policy.
    ///
    /// Pass one gives every downstream node one random predecessor; pass two
    /// gives every upstream node left without outgoing arcs one random
    /// successor. This guarantees in-degree ≥ 1 for every non-plant node and
    /// out-degree ≥ 1 within each pair for every non-final node. It does NOT
    /// guarantee a single connected component spanning Plant→Final.
    #[must_use]
    pub fn sample(sizes: &LayerSizes, rng: &mut SmallRng) -> Self {
        let topology = Self {
            plant_tank: sample_pair(sizes, LayerPair::PlantTank, rng),
            tank_transfer: sample_pair(sizes, LayerPair::TankTransfer, rng),
            transfer_final: sample_pair(sizes, LayerPair::TransferFinal, rng),
        };
        debug!(
            plant_tank = topology.plant_tank.len(),
            tank_transfer = topology.tank_transfer.len(),
            transfer_final = topology.transfer_final.len(),
            "sampled topology"
        );
        topology
    }

    /// Builds the complete bipartite mesh between every adjacent layer pair.
    ///
    /// Stress variants start from the full mesh so that a later violation of
    /// one invariant is the only reason an instance is hard.
    #[must_use]
    pub fn complete(sizes: &LayerSizes) -> Self {
        Self {
            plant_tank: complete_pair(sizes, LayerPair::PlantTank),
            tank_transfer: complete_pair(sizes, LayerPair::TankTransfer),
            transfer_final: complete_pair(sizes, LayerPair::TransferFinal),
        }
    }

    /// Removes arcs post-hoc to deliberately break the coverage guarantee.
    ///
    /// Keeps one third of the Plant→Tank arcs and one half of the
    /// Tank→Transfer arcs (at least one each), then severs every arc into the
    /// Final nodes listed in `isolated`. Callers pick `isolated` from the
    /// Final block's global indices.
    pub fn fragment(&mut self, isolated: &[NodeId], rng: &mut SmallRng) {
        retain_random(&mut self.plant_tank, 3, rng);
        retain_random(&mut self.tank_transfer, 2, rng);
        self.transfer_final
            .retain(|arc| !isolated.contains(&arc.to));
        debug!(isolated = isolated.len(), "fragmented topology");
    }

    /// The arcs of the given layer pair.
    #[must_use]
    pub fn pair(&self, pair: LayerPair) -> &[PipeArc] {
        match pair {
            LayerPair::PlantTank => &self.plant_tank,
            LayerPair::TankTransfer => &self.tank_transfer,
            LayerPair::TransferFinal => &self.transfer_final,
        }
    }

    /// Iterates over all arcs in the canonical global order.
    pub fn arcs(&self) -> impl Iterator<Item = &PipeArc> {
        self.plant_tank
            .iter()
            .chain(&self.tank_transfer)
            .chain(&self.transfer_final)
    }

    /// Total arc count across all layer pairs.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.plant_tank.len() + self.tank_transfer.len() + self.transfer_final.len()
    }
}

fn sample_pair(sizes: &LayerSizes, pair: LayerPair, rng: &mut SmallRng) -> Vec<PipeArc> {
    let (up, down) = pair.classes();
    let up_start = sizes.block_start(up);
    let down_start = sizes.block_start(down);
    let up_len = sizes.len_of(up);
    let down_len = sizes.len_of(down);

    let mut arcs = Vec::with_capacity(down_len);
    let mut out_degree = vec![0usize; up_len];

    // Pass one: every downstream node draws one predecessor.
    for to in down_start..down_start + down_len {
        let offset = rng.gen_range(0..up_len);
        out_degree[offset] += 1;
        arcs.push(PipeArc {
            from: up_start + offset,
            to,
        });
    }

    // Pass two: rescue upstream nodes stranded with zero outgoing arcs.
    for (offset, degree) in out_degree.iter().enumerate() {
        if *degree == 0 {
            let to = down_start + rng.gen_range(0..down_len);
            arcs.push(PipeArc {
                from: up_start + offset,
                to,
            });
        }
    }

    arcs
}

fn complete_pair(sizes: &LayerSizes, pair: LayerPair) -> Vec<PipeArc> {
    let (up, down) = pair.classes();
    let mut arcs = Vec::with_capacity(sizes.len_of(up) * sizes.len_of(down));
    for from in sizes.ids_of(up) {
        for to in sizes.ids_of(down) {
            arcs.push(PipeArc { from, to });
        }
    }
    arcs
}

/// Keeps `len / divisor` randomly chosen arcs (at least one), preserving the
/// original relative order so the canonical arc index stays deterministic
/// given the RNG stream.
fn retain_random(arcs: &mut Vec<PipeArc>, divisor: usize, rng: &mut SmallRng) {
    let keep = (arcs.len() / divisor).max(1);
    if keep >= arcs.len() {
        return;
    }
    let mut positions: Vec<usize> = (0..arcs.len()).collect();
    positions.shuffle(rng);
    positions.truncate(keep);
    positions.sort_unstable();
    let kept: Vec<PipeArc> = positions.iter().map(|&i| arcs[i]).collect();
    *arcs = kept;
}
