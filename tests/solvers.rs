use kinfit::prelude::*;
use std::collections::HashMap;

fn initial(name: &str, value: f64) -> HashMap<String, f64> {
    HashMap::from([(name.to_string(), value)])
}

#[test]
fn sfo_strategies_agree() {
    let model = ModelSpec::parent_only(SubmodelType::Sfo)
        .compile(UseOfFractions::Min)
        .unwrap();
    let times = [0.0, 1.0, 5.0, 10.0, 50.0];
    let x0 = initial("parent", 100.0);
    let mut results = Vec::new();
    for strategy in [Strategy::Analytical, Strategy::Eigen, Strategy::Numerical] {
        let trajectory = predict(
            &model,
            &[0.1],
            &x0,
            &times,
            strategy,
            Tolerances::default(),
            Output::Observed,
        )
        .unwrap();
        results.push(trajectory.column("parent").unwrap().to_vec());
    }
    let reference = 100.0 * (-0.1f64 * 10.0).exp();
    for values in &results {
        assert!(
            ((values[3] - reference) / reference).abs() < 1e-6,
            "{} vs {}",
            values[3],
            reference
        );
    }
    for values in &results[1..] {
        for (a, b) in results[0].iter().zip(values.iter()) {
            assert!(((a - b) / a.max(1e-10)).abs() < 1e-6);
        }
    }
}

#[test]
fn eigen_matches_numerical_for_metabolite_chain() {
    let model = ModelSpec::new()
        .add("parent", CompartmentSpec::new(SubmodelType::Sfo).to("m1"))
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo))
        .compile(UseOfFractions::Min)
        .unwrap();
    // k_parent_sink, k_parent_m1, k_m1_sink
    let parms = [0.3, 0.2, 0.1];
    let times = [0.0, 0.5, 2.0, 7.0, 30.0];
    let x0 = initial("parent", 100.0);
    let eigen = predict(
        &model,
        &parms,
        &x0,
        &times,
        Strategy::Eigen,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap();
    let numerical = predict(
        &model,
        &parms,
        &x0,
        &times,
        Strategy::Numerical,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap();
    for name in ["parent", "m1"] {
        for (a, b) in eigen
            .column(name)
            .unwrap()
            .iter()
            .zip(numerical.column(name).unwrap().iter())
        {
            assert!((a - b).abs() < 1e-6 * a.abs().max(1.0), "{} vs {}", a, b);
        }
    }
}

#[test]
fn mass_is_conserved_without_sinks() {
    let model = ModelSpec::new()
        .add(
            "parent",
            CompartmentSpec::new(SubmodelType::Sfo).no_sink().to("m1"),
        )
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo).no_sink())
        .compile(UseOfFractions::Min)
        .unwrap();
    assert_eq!(model.parameter_names(), &["k_parent_m1"]);
    let times: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let trajectory = predict(
        &model,
        &[0.25],
        &initial("parent", 100.0),
        &times,
        Strategy::Numerical,
        Tolerances::default(),
        Output::States,
    )
    .unwrap();
    let parent = trajectory.column("parent").unwrap();
    let m1 = trajectory.column("m1").unwrap();
    for (p, m) in parent.iter().zip(m1.iter()) {
        assert!((p + m - 100.0).abs() < 1e-6, "total mass {}", p + m);
    }
}

#[test]
fn total_mass_never_increases_with_metabolite_sink() {
    let model = ModelSpec::new()
        .add(
            "parent",
            CompartmentSpec::new(SubmodelType::Sfo).no_sink().to("m1"),
        )
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo))
        .compile(UseOfFractions::Min)
        .unwrap();
    let times: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let trajectory = predict(
        &model,
        &[0.25, 0.05],
        &initial("parent", 100.0),
        &times,
        Strategy::Numerical,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap();
    let parent = trajectory.column("parent").unwrap();
    let m1 = trajectory.column("m1").unwrap();
    let mut previous = f64::INFINITY;
    for (p, m) in parent.iter().zip(m1.iter()) {
        let total = p + m;
        assert!(total <= previous + 1e-8);
        previous = total;
    }
}

#[test]
fn analytical_strategy_rejects_multi_compartment_models() {
    let model = ModelSpec::new()
        .add("parent", CompartmentSpec::new(SubmodelType::Sfo).to("m1"))
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo))
        .compile(UseOfFractions::Min)
        .unwrap();
    let err = predict(
        &model,
        &[0.3, 0.2, 0.1],
        &initial("parent", 100.0),
        &[0.0, 1.0],
        Strategy::Analytical,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap_err();
    assert!(matches!(err, KinError::Strategy(_)));
}

#[test]
fn unknown_initial_state_is_rejected() {
    let model = ModelSpec::parent_only(SubmodelType::Sfo)
        .compile(UseOfFractions::Min)
        .unwrap();
    let err = predict(
        &model,
        &[0.1],
        &initial("something_else", 1.0),
        &[0.0, 1.0],
        Strategy::Numerical,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap_err();
    assert!(matches!(err, KinError::Configuration(_)));
}

#[test]
fn sforb_observed_is_free_plus_bound() {
    let model = ModelSpec::parent_only(SubmodelType::Sforb)
        .compile(UseOfFractions::Min)
        .unwrap();
    // k_parent_free_bound, k_parent_bound_free, k_parent_free_sink
    let parms = [0.3, 0.05, 0.2];
    let times = [0.0, 1.0, 4.0, 15.0];
    let x0 = initial("parent_free", 100.0);
    let analytical = predict(
        &model,
        &parms,
        &x0,
        &times,
        Strategy::Analytical,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap();
    let numerical = predict(
        &model,
        &parms,
        &x0,
        &times,
        Strategy::Numerical,
        Tolerances::default(),
        Output::Observed,
    )
    .unwrap();
    for (a, b) in analytical
        .column("parent")
        .unwrap()
        .iter()
        .zip(numerical.column("parent").unwrap().iter())
    {
        assert!((a - b).abs() < 1e-6 * a.abs().max(1.0), "{} vs {}", a, b);
    }
}
