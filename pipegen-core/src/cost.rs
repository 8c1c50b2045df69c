//! Transport and installation cost assignment.
//!
//! Transport unit costs are sampled from a normal distribution and floored at
//! a small positive minimum so no zero-cost path can degenerate the solver's
//! objective. Installation costs come from a fixed two-variant table per
//! diameter; the variant alternates strictly by canonical arc position, so
//! two runs over the same topology always produce the same variant pattern
//! regardless of the numeric RNG stream.

use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

use crate::util::round2;

/// One pipe diameter choice from the project catalog.
#[derive(Clone, Copy, Debug)]
pub struct DiameterOption {
    /// Nominal size in millimetres.
    pub nominal_mm: u32,
    /// Maximum volumetric flow in l/min.
    pub capacity: f64,
    /// Installation cost, variant A (cheaper).
    pub install_a: f64,
    /// Installation cost, variant B (costlier).
    pub install_b: f64,
}

/// The fixed diameter catalog (D2, D3, D5 in the project's nomenclature).
pub const DIAMETER_CATALOG: [DiameterOption; 3] = [
    DiameterOption {
        nominal_mm: 75,
        capacity: 795.0,
        install_a: 20.0,
        install_b: 50.0,
    },
    DiameterOption {
        nominal_mm: 100,
        capacity: 1414.0,
        install_a: 24.0,
        install_b: 62.0,
    },
    DiameterOption {
        nominal_mm: 150,
        capacity: 3181.0,
        install_a: 32.0,
        install_b: 78.0,
    },
];

/// Minimum transport unit cost for standard instances.
pub const TRANSPORT_COST_FLOOR: f64 = 0.1;

/// The largest single-diameter flow capacity in the catalog.
#[must_use]
pub fn max_capacity() -> f64 {
    DIAMETER_CATALOG
        .iter()
        .map(|d| d.capacity)
        .fold(0.0, f64::max)
}

/// Samples one transport unit cost per arc from `Normal(mean, std)`, floored
/// at `floor` and rounded to two decimals.
///
/// # Panics
/// Never panics for the envelopes shipped with this crate: every standard
/// deviation in use is finite and positive.
#[must_use]
pub fn sample_transport_costs(
    arc_count: usize,
    mean: f64,
    std: f64,
    floor: f64,
    rng: &mut SmallRng,
) -> Vec<f64> {
    let normal = Normal::new(mean, std).expect("transport cost std must be finite and positive");
    (0..arc_count)
        .map(|_| round2(normal.sample(rng).max(floor)))
        .collect()
}

/// Samples one transport unit cost per arc uniformly from `range`, rounded
/// to two decimals. Used by stress variants whose costs are deliberately
/// unrelated to the demand scale.
#[must_use]
pub fn sample_uniform_costs(arc_count: usize, range: (f64, f64), rng: &mut SmallRng) -> Vec<f64> {
    use rand::Rng;
    (0..arc_count)
        .map(|_| round2(rng.gen_range(range.0..=range.1)))
        .collect()
}

/// Builds the `arc_count × nD` installation cost table, flattened row-major.
///
/// Even arc positions take variant A, odd positions variant B.
#[must_use]
pub fn install_cost_table(arc_count: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(arc_count * DIAMETER_CATALOG.len());
    for arc in 0..arc_count {
        for diameter in &DIAMETER_CATALOG {
            if arc % 2 == 0 {
                table.push(diameter.install_a);
            } else {
                table.push(diameter.install_b);
            }
        }
    }
    table
}
