//! Black-box tests for the generation pipeline and the parameter artifact.

use pipegen_core::{
    cost::DIAMETER_CATALOG, dzn, GeneratorBuilder, GeneratorError, GeneratorErrorCode, LayerPair,
    LayerSizes, NodeClass, SizeCategory, StressVariant,
};
use rstest::rstest;

#[rstest]
fn cost_arrays_are_parallel_to_the_arc_list() {
    let sizes = LayerSizes::new(3, 6, 7, 12).expect("sizes are valid");
    let instance = GeneratorBuilder::new(sizes)
        .with_category(SizeCategory::Medium)
        .with_seed(101)
        .build()
        .generate()
        .expect("generation succeeds");

    let arc_count = instance.topology().arc_count();
    let arc_from: Vec<_> = instance.topology().arcs().map(|a| a.from).collect();
    let arc_to: Vec<_> = instance.topology().arcs().map(|a| a.to).collect();

    assert_eq!(arc_from.len(), arc_count);
    assert_eq!(arc_to.len(), arc_count);
    assert_eq!(instance.trans_cost().len(), arc_count);
    assert_eq!(
        instance.install_cost().len(),
        arc_count * DIAMETER_CATALOG.len()
    );
    assert_eq!(instance.metadata().arc_count, arc_count);
}

#[rstest]
fn every_downstream_node_receives_an_arc() {
    let sizes = LayerSizes::new(2, 5, 6, 11).expect("sizes are valid");
    let instance = GeneratorBuilder::new(sizes)
        .with_seed(555)
        .build()
        .generate()
        .expect("generation succeeds");

    for pair in LayerPair::ALL {
        let (_, down) = pair.classes();
        let destinations: Vec<_> = instance
            .topology()
            .pair(pair)
            .iter()
            .map(|arc| arc.to)
            .collect();
        for id in instance.sizes().ids_of(down) {
            assert!(
                destinations.contains(&id),
                "{down} node {id} missing from destinations of {pair:?}"
            );
        }
    }
}

#[rstest]
fn test_scenario_one_plant_two_tanks() {
    let sizes = LayerSizes::new(1, 2, 2, 3).expect("sizes are valid");
    let generator = GeneratorBuilder::new(sizes).with_seed(12345).build();
    let instance = generator.generate().expect("generation succeeds");

    assert_eq!(instance.metadata().node_count, 8);
    let expected_arcs: usize = LayerPair::ALL
        .iter()
        .map(|pair| instance.topology().pair(*pair).len())
        .sum();
    assert_eq!(instance.metadata().arc_count, expected_arcs);

    let rendered = dzn::render(&instance);
    for line in ["nP = 1;", "nT = 2;", "nC1 = 2;", "nC2 = 3;"] {
        assert!(rendered.contains(line), "missing `{line}`");
    }
}

#[rstest]
fn seeded_runs_produce_byte_identical_artifacts() {
    let sizes = LayerSizes::new(2, 6, 5, 14).expect("sizes are valid");
    let build = || {
        GeneratorBuilder::new(sizes)
            .with_category(SizeCategory::Small)
            .with_seed(424_242)
            .build()
            .generate()
            .expect("generation succeeds")
    };

    let dir = tempfile::tempdir().expect("temp dir");
    let first = dir.path().join("a.dzn");
    let second = dir.path().join("b.dzn");
    dzn::write(&build(), &first).expect("first write succeeds");
    dzn::write(&build(), &second).expect("second write succeeds");

    assert_eq!(
        std::fs::read(&first).expect("first artifact"),
        std::fs::read(&second).expect("second artifact"),
    );
}

#[rstest]
fn zero_plants_never_yields_an_artifact() {
    let err = LayerSizes::new(0, 2, 2, 3).expect_err("zero plants must fail");
    assert_eq!(err.code(), GeneratorErrorCode::InvalidSize);
    assert!(matches!(
        err,
        GeneratorError::InvalidSize {
            class: NodeClass::Plant,
            got: 0
        }
    ));
}

#[rstest]
fn overload_variant_renders_with_its_justification() {
    let instance = StressVariant::DemandOverload
        .generate_seeded(99)
        .expect("variant generates");
    assert!(instance.metadata().slack_factor < 1.0);

    let rendered = dzn::render(&instance);
    assert!(rendered.contains("% stress variant: demand_overload"));
    assert!(rendered.contains("demand") || rendered.contains("capacity"));
}

#[rstest]
fn metadata_serializes_for_the_sidecar() {
    let sizes = LayerSizes::new(1, 2, 2, 3).expect("sizes are valid");
    let instance = GeneratorBuilder::new(sizes)
        .with_seed(7)
        .build()
        .generate()
        .expect("generation succeeds");

    let json = serde_json::to_value(instance.metadata()).expect("metadata serializes");
    assert_eq!(json["node_count"], 8);
    assert_eq!(json["seed"], 7);
    assert_eq!(json["size_class"], "small");
}
