use kinfit::prelude::*;
use kinfit::transform::{ilr, invilr};

fn branched_model() -> DegradationModel {
    ModelSpec::new()
        .add("parent", CompartmentSpec::new(SubmodelType::Sfo).to("m1").to("m2"))
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo))
        .add("m2", CompartmentSpec::new(SubmodelType::Sfo))
        .compile(UseOfFractions::Max)
        .unwrap()
}

#[test]
fn model_transformations_round_trip() {
    let model = branched_model();
    let tr = Transformations::for_model(&model);
    assert_eq!(
        tr.natural_names(),
        &["k_parent", "f_parent_to_m1", "f_parent_to_m2", "k_m1", "k_m2"]
    );
    // Rates positive, fractions strictly inside the simplex with room for
    // the implicit sink fraction.
    let natural = [0.3, 0.2, 0.5, 0.07, 0.004];
    let transformed = tr.to_transformed(&natural);
    assert_eq!(transformed.len(), 5);
    let back = tr.to_natural(&transformed);
    for (a, b) in natural.iter().zip(back.iter()) {
        assert!((a - b).abs() < 1e-10, "{} vs {}", a, b);
    }
}

#[test]
fn arbitrary_transformed_vectors_stay_feasible() {
    let model = branched_model();
    let tr = Transformations::for_model(&model);
    for transformed in [
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
        vec![5.0, -20.0, 20.0, -5.0, 100.0],
        vec![-300.0, 40.0, 40.0, 3.0, -3.0],
    ] {
        let natural = tr.to_natural(&transformed);
        assert!(natural[0] > 0.0);
        assert!(natural[3] > 0.0);
        assert!(natural[4] > 0.0);
        let f1 = natural[1];
        let f2 = natural[2];
        assert!((0.0..=1.0).contains(&f1));
        assert!((0.0..=1.0).contains(&f2));
        assert!(f1 + f2 <= 1.0 + 1e-12);
    }
}

#[test]
fn biphasic_mixing_parameter_is_a_single_coordinate_group() {
    let model = ModelSpec::parent_only(SubmodelType::Dfop)
        .compile(UseOfFractions::Min)
        .unwrap();
    let tr = Transformations::for_model(&model);
    assert_eq!(tr.transformed_names(), &["log_k1", "log_k2", "g_ilr_1"]);
    // Any real coordinate maps to g strictly between 0 and 1.
    for z in [-40.0, -1.0, 0.0, 1.0, 40.0] {
        let natural = tr.to_natural(&[0.0, 0.0, z]);
        assert!(natural[2] > 0.0 && natural[2] < 1.0, "g = {}", natural[2]);
    }
    // The origin of the coordinate is the balanced mixture.
    let natural = tr.to_natural(&[0.0, 0.0, 0.0]);
    assert!((natural[2] - 0.5).abs() < 1e-12);
}

#[test]
fn ilr_matches_hand_computed_two_component_case() {
    // For (x, 1 - x) the single coordinate is sqrt(1/2) ln(x / (1 - x)).
    let x = 0.8;
    let z = ilr(&[x, 1.0 - x]);
    let expected = (0.5f64).sqrt() * (x / (1.0 - x)).ln();
    assert!((z[0] - expected).abs() < 1e-12);
    let back = invilr(&z);
    assert!((back[0] - x).abs() < 1e-12);
}
