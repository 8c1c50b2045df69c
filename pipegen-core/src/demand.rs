//! Demand and supply synthesis with a controllable slack factor.
//!
//! Demands are drawn uniformly from a per-category envelope; every plant is
//! then assigned the same supply so that total supply hits the target slack
//! factor. The realized slack is recomputed after rounding, since rounding
//! can shift the true ratio and the metadata must not overstate the headroom.

use rand::{rngs::SmallRng, Rng};
use serde::Serialize;

use crate::{
    error::{GeneratorError, Result},
    index::LayerSizes,
    util::round2,
};

/// Default supply headroom above exact balance (30%).
pub const DEFAULT_TARGET_SLACK: f64 = 1.3;

/// Declared size category selecting the sampling envelopes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    /// Small instances, sized for quick solver runs.
    Small,
    /// Medium instances.
    Medium,
    /// Large instances.
    Large,
}

/// Sampling envelopes for one size category.
#[derive(Clone, Copy, Debug)]
pub struct Envelope {
    /// Inclusive bounds for per-node demand, l/min.
    pub demand: (f64, f64),
    /// Mean and standard deviation of the transport unit cost.
    pub transport: (f64, f64),
    /// Inclusive layer-size ranges: plants, tanks, transfers, finals.
    pub layers: [(usize, usize); 4],
}

impl SizeCategory {
    /// The sampling envelope for this category.
    #[must_use]
    pub const fn envelope(self) -> Envelope {
        match self {
            Self::Small => Envelope {
                demand: (40.0, 100.0),
                transport: (8.0, 2.0),
                layers: [(1, 2), (5, 10), (5, 10), (10, 20)],
            },
            Self::Medium => Envelope {
                demand: (60.0, 160.0),
                transport: (10.0, 2.5),
                layers: [(3, 4), (10, 20), (10, 20), (20, 50)],
            },
            Self::Large => Envelope {
                demand: (90.0, 240.0),
                transport: (12.0, 3.0),
                layers: [(5, 7), (20, 50), (25, 50), (50, 100)],
            },
        }
    }

    /// Draws layer sizes from this category's ranges.
    ///
    /// # Panics
    /// Never panics: the envelope ranges are all non-empty and positive.
    #[must_use]
    pub fn sample_sizes(self, rng: &mut SmallRng) -> LayerSizes {
        let [p, t, c1, c2] = self.envelope().layers;
        LayerSizes::new(
            rng.gen_range(p.0..=p.1),
            rng.gen_range(t.0..=t.1),
            rng.gen_range(c1.0..=c1.1),
            rng.gen_range(c2.0..=c2.1),
        )
        .expect("category layer ranges start at 1")
    }
}

impl std::fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(name)
    }
}

/// Demand and supply values for one instance, before assembly into the
/// per-node arrays.
#[derive(Clone, Debug)]
pub struct Balance {
    /// One demand per Transfer node, in block order.
    pub transfer_demand: Vec<f64>,
    /// One demand per Final node, in block order.
    pub final_demand: Vec<f64>,
    /// Uniform supply assigned to every Plant node.
    pub per_plant_supply: f64,
    /// Exact total demand.
    pub total_demand: f64,
    /// Total supply after rounding.
    pub total_supply: f64,
    /// Slack factor recomputed from the rounded supply.
    pub realized_slack: f64,
}

/// Draws `count` strictly positive demands uniformly from `range`, rounded to
/// two decimals.
#[must_use]
pub fn sample_demands(count: usize, range: (f64, f64), rng: &mut SmallRng) -> Vec<f64> {
    (0..count)
        .map(|_| round2(rng.gen_range(range.0..=range.1)))
        .collect()
}

/// Balances the given demands against a uniform plant supply.
///
/// The per-plant supply is `total_demand * target_slack / plant_count`,
/// rounded to two decimals. The realized slack factor is recomputed from the
/// rounded value.
///
/// # Errors
/// Returns [`GeneratorError::DivisionUndefined`] when `plant_count` is zero:
/// no valid supply distribution exists.
pub fn balance(
    transfer_demand: Vec<f64>,
    final_demand: Vec<f64>,
    plant_count: usize,
    target_slack: f64,
) -> Result<Balance> {
    if plant_count == 0 {
        return Err(GeneratorError::DivisionUndefined {
            quantity: "supply",
            denominator: "plants",
        });
    }

    let total_demand: f64 = transfer_demand.iter().chain(&final_demand).sum();
    let plant_count_f = plant_count as f64;
    let per_plant_supply = round2(total_demand * target_slack / plant_count_f);
    let total_supply = per_plant_supply * plant_count_f;
    let realized_slack = if total_demand > 0.0 {
        total_supply / total_demand
    } else {
        0.0
    };

    Ok(Balance {
        transfer_demand,
        final_demand,
        per_plant_supply,
        total_demand,
        total_supply,
        realized_slack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    fn demands_stay_in_envelope() {
        let mut rng = SmallRng::seed_from_u64(1);
        let range = SizeCategory::Small.envelope().demand;
        let demands = sample_demands(200, range, &mut rng);
        assert_eq!(demands.len(), 200);
        for d in demands {
            assert!(d >= range.0 && d <= range.1, "demand {d} escaped envelope");
            assert!(d > 0.0);
        }
    }

    #[rstest]
    fn realized_slack_tracks_target() {
        let mut rng = SmallRng::seed_from_u64(2);
        let transfer = sample_demands(10, (40.0, 100.0), &mut rng);
        let fin = sample_demands(15, (40.0, 100.0), &mut rng);
        let balance = balance(transfer, fin, 3, DEFAULT_TARGET_SLACK).expect("plants > 0");

        assert!(balance.realized_slack >= DEFAULT_TARGET_SLACK - 0.02);
        assert!(balance.realized_slack <= DEFAULT_TARGET_SLACK + 0.02);
        assert!(
            (balance.total_supply - balance.per_plant_supply * 3.0).abs() < 1e-9,
            "total supply must be the rounded per-plant value times the count"
        );
    }

    #[rstest]
    fn zero_plants_is_undefined() {
        let err = balance(vec![50.0], vec![60.0], 0, DEFAULT_TARGET_SLACK)
            .expect_err("zero plants must fail");
        assert!(matches!(err, GeneratorError::DivisionUndefined { .. }));
    }

    #[rstest]
    #[case(SizeCategory::Small)]
    #[case(SizeCategory::Medium)]
    #[case(SizeCategory::Large)]
    fn sampled_sizes_respect_ranges(#[case] category: SizeCategory) {
        let mut rng = SmallRng::seed_from_u64(9);
        let [p, t, c1, c2] = category.envelope().layers;
        for _ in 0..20 {
            let sizes = category.sample_sizes(&mut rng);
            assert!((p.0..=p.1).contains(&sizes.plants()));
            assert!((t.0..=t.1).contains(&sizes.tanks()));
            assert!((c1.0..=c1.1).contains(&sizes.transfers()));
            assert!((c2.0..=c2.1).contains(&sizes.finals()));
        }
    }
}
