use kinfit::prelude::*;

// Parent decline dataset from the FOCUS kinetics guidance.
fn guidance_dataset() -> Dataset {
    Dataset::from_series(
        "parent",
        &[0.0, 1.0, 3.0, 7.0, 14.0, 28.0, 63.0, 91.0, 119.0],
        &[85.1, 57.9, 29.9, 14.6, 9.7, 6.6, 4.0, 3.9, 0.6],
    )
}

fn parent_sfo() -> DegradationModel {
    ModelSpec::parent_only(SubmodelType::Sfo)
        .compile(UseOfFractions::Min)
        .unwrap()
}

#[test]
fn sfo_fit_recovers_reference_estimates() {
    let data = guidance_dataset();
    let result = fit(&parent_sfo(), &data, FitSettings::default()).unwrap();
    assert!(result.converged);

    let parent_0 = result.parameter("parent_0").unwrap();
    assert!(
        (80.0..=85.5).contains(&parent_0.estimate),
        "parent_0 = {}",
        parent_0.estimate
    );
    let k = result.parameter("k_parent_sink").unwrap();
    assert!((0.28..=0.34).contains(&k.estimate), "k = {}", k.estimate);

    // Confidence bounds bracket the estimate on the natural scale.
    let (lower, upper) = (k.lower.unwrap(), k.upper.unwrap());
    assert!(lower < k.estimate && k.estimate < upper);
    assert!(lower > 0.0);

    let err = result.chi2_error_level("All data").unwrap();
    assert!((13.0..=19.0).contains(&err), "chi2 error level = {}", err);

    let dt50 = result.endpoint("DT50_parent").unwrap();
    assert!((2.0..=2.5).contains(&dt50), "DT50 = {}", dt50);
    let dt90 = result.endpoint("DT90_parent").unwrap();
    assert!((dt90 - dt50 * 10f64.ln() / 2f64.ln()).abs() < 1e-9);

    assert_eq!(result.residuals.len(), data.len());
    assert!(result.residuals.iter().all(|r| r.standardized.is_finite()));
    assert!(result
        .transformed
        .iter()
        .any(|p| p.name == "log_k_parent_sink"));
}

#[test]
fn biexponential_fit_matches_documented_reference() {
    // The documented reference fit of this dataset is biexponential:
    // parent_0 near 85, fast rate near 0.46, error level near 2.6 %.
    let model = ModelSpec::parent_only(SubmodelType::Dfop)
        .compile(UseOfFractions::Min)
        .unwrap();
    let result = Fitter::new(&model, &guidance_dataset(), FitSettings::default())
        .unwrap()
        .with_start("k1", 0.5)
        .with_start("k2", 0.02)
        .fit()
        .unwrap();
    assert!(result.converged);

    let parent_0 = result.parameter("parent_0").unwrap().estimate;
    assert!((79.0..=90.0).contains(&parent_0), "parent_0 = {}", parent_0);
    let k1 = result.parameter("k1").unwrap().estimate;
    let k2 = result.parameter("k2").unwrap().estimate;
    let fast = k1.max(k2);
    assert!((0.35..=0.60).contains(&fast), "fast rate = {}", fast);
    let g = result.parameter("g").unwrap().estimate;
    assert!(g > 0.0 && g < 1.0);

    let err = result.chi2_error_level("All data").unwrap();
    assert!((1.0..=5.0).contains(&err), "chi2 error level = {}", err);
}

#[test]
fn iteration_budget_is_honoured() {
    let settings = FitSettings::builder().set_max_iters(2).build();
    let result = fit(&parent_sfo(), &guidance_dataset(), settings).unwrap();
    assert!(!result.converged);
    assert_eq!(result.iterations, 2);
}

#[test]
fn fixed_parameters_are_held_and_reported() {
    let result = Fitter::new(&parent_sfo(), &guidance_dataset(), FitSettings::default())
        .unwrap()
        .fix("parent_0", 85.0)
        .fit()
        .unwrap();
    let parent_0 = result.parameter("parent_0").unwrap();
    assert!(parent_0.fixed);
    assert_eq!(parent_0.estimate, 85.0);
    assert!(parent_0.lower.is_none());
    let k = result.parameter("k_parent_sink").unwrap().estimate;
    assert!((0.25..=0.40).contains(&k), "k = {}", k);
}

#[test]
fn alternating_variance_fitting_agrees_with_joint() {
    let settings = FitSettings::builder()
        .set_variance_fitting(VarianceFitting::AlternatingReweighting)
        .build();
    let result = fit(&parent_sfo(), &guidance_dataset(), settings).unwrap();
    let k = result.parameter("k_parent_sink").unwrap().estimate;
    assert!((0.28..=0.34).contains(&k), "k = {}", k);
}

#[test]
fn fit_results_serialize_to_json() {
    let result = fit(&parent_sfo(), &guidance_dataset(), FitSettings::default()).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"k_parent_sink\""));
    assert!(json.contains("\"residuals\""));
}

#[test]
fn unknown_dataset_variable_is_rejected() {
    let data = Dataset::from_series("metabolite", &[0.0, 1.0], &[1.0, 0.5]);
    assert!(Fitter::new(&parent_sfo(), &data, FitSettings::default()).is_err());
}

#[test]
fn unknown_parameter_names_are_rejected() {
    let err = Fitter::new(&parent_sfo(), &guidance_dataset(), FitSettings::default())
        .unwrap()
        .fix("k_nonexistent", 0.1)
        .fit()
        .unwrap_err();
    assert!(err.to_string().contains("unknown parameter"));
}

#[test]
fn formation_fractions_cannot_be_fixed_individually() {
    let model = ModelSpec::new()
        .add("parent", CompartmentSpec::new(SubmodelType::Sfo).to("m1"))
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo))
        .compile(UseOfFractions::Max)
        .unwrap();
    let data = Dataset::new(vec![
        ("parent", 0.0, Some(100.0)),
        ("parent", 3.0, Some(40.0)),
        ("parent", 7.0, Some(15.0)),
        ("m1", 3.0, Some(25.0)),
        ("m1", 7.0, Some(30.0)),
    ]);
    let err = Fitter::new(&model, &data, FitSettings::default())
        .unwrap()
        .fix("f_parent_to_m1", 0.5)
        .fit()
        .unwrap_err();
    assert!(err.to_string().contains("formation fractions"));
}
