pub mod error_model;

pub use error_model::ErrorModel;

use crate::data::Dataset;
use crate::model::{submodel::SubmodelType, DegradationModel};
use crate::settings::{FitSettings, VarianceFitting};
use crate::simulator::{self, Output, Strategy, Tolerances};
use crate::transform::Transformations;
use anyhow::{bail, Context, Result};
use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;
use nalgebra::DMatrix;
use ndarray::Array1;
use serde_derive::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};
use std::collections::HashMap;
use std::time::Instant;

const LN_2PI: f64 = 1.8378770664093453;

/// Where a natural parameter value comes from during assembly: the free
/// (estimated) vector, or a fixed override.
#[derive(Debug, Clone, Copy)]
enum ValueSource {
    Free(usize),
    Fixed(f64),
}

/// One natural-scale parameter of a finished fit.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterEstimate {
    pub name: String,
    pub estimate: f64,
    pub fixed: bool,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// True when the parameter sits in a multi-coordinate ILR group, whose
    /// individual intervals do not translate to the natural scale.
    pub ci_untranslatable: bool,
}

/// One internal (transformed-scale) parameter of a finished fit.
#[derive(Debug, Clone, Serialize)]
pub struct TransformedEstimate {
    pub name: String,
    pub estimate: f64,
    pub se: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Residual {
    pub variable: String,
    pub time: f64,
    pub observed: f64,
    pub predicted: f64,
    pub residual: f64,
    pub standardized: f64,
}

/// Immutable result of one fit. Optimizer trouble is recorded in the flags,
/// not raised: non-convergence keeps the best iterate with `converged =
/// false`, a singular Hessian leaves the standard errors unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub parameters: Vec<ParameterEstimate>,
    pub transformed: Vec<TransformedEstimate>,
    pub error_model: ErrorModel,
    pub error_parameters: Vec<(String, f64)>,
    pub residuals: Vec<Residual>,
    pub converged: bool,
    pub iterations: u64,
    pub neg_log_likelihood: f64,
    /// FOCUS chi-squared error level in percent, per observed variable plus
    /// an overall entry.
    pub chi2_error_levels: Vec<(String, f64)>,
    /// Disposition-time endpoints where a closed form exists.
    pub endpoints: Vec<(String, f64)>,
    pub covariance: Option<Vec<Vec<f64>>>,
    pub elapsed_seconds: f64,
}

impl FitResult {
    pub fn parameter(&self, name: &str) -> Option<&ParameterEstimate> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn chi2_error_level(&self, variable: &str) -> Option<f64> {
        self.chi2_error_levels
            .iter()
            .find(|(n, _)| n == variable)
            .map(|(_, v)| *v)
    }

    pub fn endpoint(&self, name: &str) -> Option<f64> {
        self.endpoints
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Constrained maximum-likelihood fit of a compiled model to a dataset.
///
/// The optimizer itself is unconstrained: all constrained parameters travel
/// through the transformation layer, which guarantees a feasible natural
/// vector for any real iterate.
pub struct Fitter<'a> {
    model: &'a DegradationModel,
    data: &'a Dataset,
    settings: FitSettings,
    fixed: HashMap<String, f64>,
    start: HashMap<String, f64>,
}

/// One-call convenience wrapper around [`Fitter`].
pub fn fit(model: &DegradationModel, data: &Dataset, settings: FitSettings) -> Result<FitResult> {
    Fitter::new(model, data, settings)?.fit()
}

impl<'a> Fitter<'a> {
    pub fn new(
        model: &'a DegradationModel,
        data: &'a Dataset,
        settings: FitSettings,
    ) -> Result<Self> {
        if data.is_empty() {
            bail!("dataset contains no usable observations");
        }
        for name in data.variable_names() {
            if !model.observed_variables().iter().any(|v| v == name) {
                bail!(
                    "observed variable \"{}\" in the dataset is not part of the model",
                    name
                );
            }
        }
        Ok(Fitter {
            model,
            data,
            settings,
            fixed: HashMap::new(),
            start: HashMap::new(),
        })
    }

    /// Holds a parameter at a fixed value instead of estimating it.
    pub fn fix(mut self, name: &str, value: f64) -> Self {
        self.fixed.insert(name.to_string(), value);
        self
    }

    /// Overrides the default starting value of a natural parameter.
    pub fn with_start(mut self, name: &str, value: f64) -> Self {
        self.start.insert(name.to_string(), value);
        self
    }

    pub fn fit(self) -> Result<FitResult> {
        let now = Instant::now();
        let model = self.model;
        let strategy = self.settings.strategy().unwrap_or_else(|| {
            if model.observed_variables().len() == 1 {
                Strategy::Analytical
            } else {
                Strategy::Numerical
            }
        });
        tracing::debug!(?strategy, "starting fit");

        let source_name = model.source().0.to_string();
        let source_initial = format!("{}_0", source_name);
        let error_names = self
            .settings
            .error_model()
            .parameter_names(model.observed_variables());

        self.validate_names(&source_initial, &error_names)?;

        // Free-parameter layout and transformations: initial state, then
        // degradation parameters in model order, then error parameters.
        let mut transforms = Transformations::new();
        if !self.fixed.contains_key(&source_initial) {
            transforms.push_identity(&source_initial);
        }
        let mut done = vec![false; model.parameter_names().len()];
        for i in 0..model.parameter_names().len() {
            if done[i] {
                continue;
            }
            let name = &model.parameter_names()[i];
            if let Some(group) = model
                .fraction_groups()
                .iter()
                .find(|g| g.indices.contains(&i))
            {
                let members: Vec<String> = group
                    .indices
                    .iter()
                    .map(|&j| model.parameter_names()[j].clone())
                    .collect();
                if members.iter().any(|m| self.fixed.contains_key(m)) {
                    bail!("formation fractions cannot be fixed individually");
                }
                transforms.push_group(&group.stem, &members, group.implicit_slot);
                for &j in &group.indices {
                    done[j] = true;
                }
            } else {
                if !self.fixed.contains_key(name) {
                    transforms.push_log(name);
                }
                done[i] = true;
            }
        }
        let n_mean_free = transforms.n_transformed();
        let n_mean_natural = transforms.n_natural();
        for name in &error_names {
            if !self.fixed.contains_key(name) {
                transforms.push_log(name);
            }
        }
        if transforms.n_transformed() == 0 {
            bail!("no free parameters to estimate");
        }

        let free_index: HashMap<&str, usize> = transforms
            .natural_names()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let source_fn = |name: &str| -> ValueSource {
            if let Some(&v) = self.fixed.get(name) {
                ValueSource::Fixed(v)
            } else {
                ValueSource::Free(free_index[name])
            }
        };
        let deg_sources: Vec<ValueSource> = model
            .parameter_names()
            .iter()
            .map(|n| source_fn(n))
            .collect();
        let error_sources: Vec<ValueSource> =
            error_names.iter().map(|n| source_fn(n)).collect();
        let mut initial_sources: Vec<(String, ValueSource)> = Vec::new();
        for (ci, (name, _)) in model.compartments().iter().enumerate() {
            let state = model.state_variables()[model.observed_to_state()[ci][0]].clone();
            let pname = format!("{}_0", name);
            let source = if pname == source_initial {
                source_fn(&pname)
            } else if let Some(&v) = self.fixed.get(&pname) {
                ValueSource::Fixed(v)
            } else {
                ValueSource::Fixed(0.0)
            };
            initial_sources.push((state, source));
        }

        // Starting values on the natural scale.
        let natural_start = self.starting_values(&transforms, &source_initial, &error_names)?;
        let x0 = transforms.to_transformed(&natural_start);

        // Observation bookkeeping against the union time grid.
        let mut times_union: Vec<f64> = self.data.observations().iter().map(|o| o.time).collect();
        times_union.sort_by(|a, b| a.partial_cmp(b).unwrap());
        times_union.dedup();
        let observations: Vec<(usize, usize, f64)> = self
            .data
            .observations()
            .iter()
            .map(|o| {
                let var = model
                    .observed_variables()
                    .iter()
                    .position(|v| v == &o.name)
                    .unwrap();
                let tpos = times_union
                    .binary_search_by(|t| t.partial_cmp(&o.time).unwrap())
                    .unwrap();
                (var, tpos, o.value)
            })
            .collect();

        let objective = Objective {
            model,
            strategy,
            tolerances: self.settings.tolerances(),
            error_model: self.settings.error_model(),
            times_union: &times_union,
            observations: &observations,
            transforms: &transforms,
            deg_sources: &deg_sources,
            initial_sources: &initial_sources,
            error_sources: &error_sources,
        };

        let n_free = transforms.n_transformed();
        let all: Vec<usize> = (0..n_free).collect();
        let (best, iterations, converged) = match self.settings.variance_fitting() {
            VarianceFitting::Joint => self.minimize(&objective, &x0, &all)?,
            VarianceFitting::AlternatingReweighting => {
                self.alternating(&objective, &x0, n_mean_free)?
            }
        };
        let best_cost = objective
            .nll(&best)
            .context("objective not finite at the reported optimum")?;
        if !converged {
            tracing::warn!(
                iterations,
                "optimizer did not converge; results may be unreliable"
            );
        }

        // Covariance of the transformed parameters from the numerical
        // Hessian at the optimum.
        let hessian = numerical_hessian(|x| objective.nll(x).unwrap_or(f64::INFINITY), &best);
        let covariance = invert_covariance(&hessian);
        if covariance.is_none() {
            tracing::warn!("Hessian is singular; standard errors are unavailable");
        }

        let df = self.data.len() as i64 - n_free as i64;
        let t_quantile = if df > 0 {
            let dist = StudentsT::new(0.0, 1.0, df as f64)
                .expect("degrees of freedom are positive");
            Some(dist.inverse_cdf(0.5 + self.settings.confidence_level() / 2.0))
        } else {
            None
        };

        let mut transformed = Vec::with_capacity(n_free);
        for i in 0..n_free {
            let se = covariance.as_ref().and_then(|c| {
                let v = c[(i, i)];
                if v.is_finite() && v > 0.0 {
                    Some(v.sqrt())
                } else {
                    None
                }
            });
            let (lower, upper) = match (se, t_quantile) {
                (Some(se), Some(t)) => (Some(best[i] - t * se), Some(best[i] + t * se)),
                _ => (None, None),
            };
            transformed.push(TransformedEstimate {
                name: transforms.transformed_names()[i].clone(),
                estimate: best[i],
                se,
                lower,
                upper,
            });
        }

        // Natural-scale estimates with back-transformed intervals where the
        // mapping is one to one.
        let natural_best = transforms.to_natural(&best);
        let mut natural_ci: HashMap<usize, (Option<f64>, Option<f64>)> = HashMap::new();
        for (i, est) in transformed.iter().enumerate() {
            if let Some(n_idx) = transforms.natural_index(i) {
                let lo = est
                    .lower
                    .and_then(|v| transforms.back_transform_coordinate(i, v));
                let hi = est
                    .upper
                    .and_then(|v| transforms.back_transform_coordinate(i, v));
                natural_ci.insert(n_idx, (lo, hi));
            }
        }
        let mut parameters = Vec::new();
        for (n_idx, name) in transforms.natural_names().iter().enumerate() {
            let (lower, upper) = natural_ci
                .get(&n_idx)
                .cloned()
                .unwrap_or((None, None));
            let translatable = natural_ci.contains_key(&n_idx);
            parameters.push(ParameterEstimate {
                name: name.clone(),
                estimate: natural_best[n_idx],
                fixed: false,
                lower,
                upper,
                ci_untranslatable: !translatable && covariance.is_some(),
            });
        }
        for (name, value) in &self.fixed {
            parameters.push(ParameterEstimate {
                name: name.clone(),
                estimate: *value,
                fixed: true,
                lower: None,
                upper: None,
                ci_untranslatable: false,
            });
        }

        // Final trajectory for residuals and goodness of fit.
        let (deg, initial, err) = objective.assemble(&natural_best);
        let trajectory = simulator::predict(
            model,
            &deg,
            &initial,
            &times_union,
            strategy,
            self.settings.tolerances(),
            Output::Observed,
        )?;
        let mut residuals = Vec::with_capacity(observations.len());
        for &(var, tpos, value) in &observations {
            let predicted = trajectory.columns()[var].1[tpos];
            let sigma = self.settings.error_model().sigma(&err, var, predicted);
            let residual = value - predicted;
            residuals.push(Residual {
                variable: model.observed_variables()[var].clone(),
                time: times_union[tpos],
                observed: value,
                predicted,
                residual,
                standardized: residual / sigma,
            });
        }

        let chi2_error_levels =
            self.chi2_error_levels(&residuals, &transforms, n_mean_free, n_mean_natural);
        let endpoints = endpoints(model, &deg);
        let error_parameters: Vec<(String, f64)> = error_names
            .iter()
            .zip(err.iter())
            .map(|(n, &v)| (n.clone(), v))
            .collect();

        tracing::info!(
            converged,
            iterations,
            nll = best_cost,
            elapsed = ?now.elapsed(),
            "fit finished"
        );

        Ok(FitResult {
            parameters,
            transformed,
            error_model: self.settings.error_model(),
            error_parameters,
            residuals,
            converged,
            iterations,
            neg_log_likelihood: best_cost,
            chi2_error_levels,
            endpoints,
            covariance: covariance
                .map(|c| (0..n_free)
                    .map(|i| (0..n_free).map(|j| c[(i, j)]).collect())
                    .collect()),
            elapsed_seconds: now.elapsed().as_secs_f64(),
        })
    }

    fn validate_names(&self, source_initial: &str, error_names: &[String]) -> Result<()> {
        let initial_names: Vec<String> = self
            .model
            .compartments()
            .iter()
            .map(|(n, _)| format!("{}_0", n))
            .collect();
        for name in self.fixed.keys().chain(self.start.keys()) {
            let known = self.model.param_index(name).is_some()
                || initial_names.iter().any(|n| n == name)
                || error_names.iter().any(|n| n == name)
                || name == source_initial;
            if !known {
                bail!("unknown parameter \"{}\"", name);
            }
        }
        Ok(())
    }

    /// Natural-scale starting vector in the order of the free parameters.
    fn starting_values(
        &self,
        transforms: &Transformations,
        source_initial: &str,
        error_names: &[String],
    ) -> Result<Vec<f64>> {
        let mean_observed = self
            .data
            .observations()
            .iter()
            .map(|o| o.value)
            .sum::<f64>()
            / self.data.len() as f64;
        let error_start = self
            .settings
            .error_model()
            .starting_values(mean_observed, self.model.observed_variables().len());

        let mut values = Vec::with_capacity(transforms.n_natural());
        for name in transforms.natural_names() {
            if let Some(&v) = self.start.get(name) {
                values.push(v);
                continue;
            }
            if name == source_initial {
                // Earliest observation of the source variable.
                let source = self.model.source().0;
                let v = self
                    .data
                    .of(source)
                    .min_by(|a, b| a.time.partial_cmp(&b.time).unwrap())
                    .map(|o| o.value)
                    .unwrap_or(100.0);
                values.push(v);
            } else if let Some(pos) = error_names.iter().position(|n| n == name) {
                values.push(error_start[pos]);
            } else if let Some(group) = self
                .model
                .fraction_groups()
                .iter()
                .find(|g| g.indices.iter().any(|&j| {
                    &self.model.parameter_names()[j] == name
                }))
            {
                let n = group.indices.len() + usize::from(group.implicit_slot);
                values.push(1.0 / n as f64);
            } else {
                values.push(default_start(name));
            }
        }
        Ok(values)
    }

    /// Runs Nelder-Mead over the active coordinates of the transformed
    /// vector, the remaining coordinates held at `base`.
    fn minimize(
        &self,
        objective: &Objective<'_, '_>,
        base: &[f64],
        active: &[usize],
    ) -> Result<(Vec<f64>, u64, bool)> {
        let masked = MaskedObjective {
            objective,
            base: base.to_vec(),
            active: active.to_vec(),
        };
        let init = Array1::from_iter(active.iter().map(|&i| base[i]));
        let simplex = initial_simplex(&init);
        let solver = NelderMead::new(simplex).with_sd_tolerance(self.settings.sd_tolerance())?;
        let max_iters = self.settings.max_iters();
        let res = Executor::new(masked, solver)
            .configure(|state| state.max_iters(max_iters))
            .run()?;
        let iterations = res.state.iter;
        let converged = iterations < max_iters;
        let best_active = res
            .state
            .best_param
            .context("optimizer returned no parameters")?;
        let mut best = base.to_vec();
        for (i, &ai) in active.iter().enumerate() {
            best[ai] = best_active[i];
        }
        Ok((best, iterations, converged))
    }

    /// Legacy iteratively-reweighted scheme: alternate between the kinetic
    /// parameters (variance held fixed) and the variance parameters until
    /// the latter stabilize.
    fn alternating(
        &self,
        objective: &Objective<'_, '_>,
        x0: &[f64],
        n_mean_free: usize,
    ) -> Result<(Vec<f64>, u64, bool)> {
        let mean_idx: Vec<usize> = (0..n_mean_free).collect();
        let error_idx: Vec<usize> = (n_mean_free..x0.len()).collect();
        if error_idx.is_empty() {
            return self.minimize(objective, x0, &mean_idx);
        }
        let mut current = x0.to_vec();
        let mut total_iters = 0;
        let mut converged = false;
        for round in 0..10 {
            let (next, iters, mean_ok) = self.minimize(objective, &current, &mean_idx)?;
            total_iters += iters;
            let (next, iters, _) = self.minimize(objective, &next, &error_idx)?;
            total_iters += iters;
            let shift = error_idx
                .iter()
                .map(|&i| (next[i] - current[i]).abs())
                .fold(0.0, f64::max);
            current = next;
            if shift < 1e-4 {
                tracing::debug!(round, "variance reweighting converged");
                converged = mean_ok;
                break;
            }
        }
        Ok((current, total_iters, converged))
    }

    fn chi2_error_levels(
        &self,
        residuals: &[Residual],
        transforms: &Transformations,
        n_mean_free: usize,
        n_mean_natural: usize,
    ) -> Vec<(String, f64)> {
        let mut levels = Vec::new();
        if let Some(level) = chi2_error_level(residuals.iter(), n_mean_free) {
            levels.push(("All data".to_string(), level));
        }
        for (ci, name) in self.model.observed_variables().iter().enumerate() {
            // Attribute each free kinetic parameter to one variable;
            // transfer parameters count towards their target.
            let n_parms = transforms.natural_names()[..n_mean_natural]
                .iter()
                .filter(|n| self.parameter_variable(n) == Some(ci))
                .count();
            let subset = residuals.iter().filter(|r| &r.variable == name);
            if let Some(level) = chi2_error_level(subset, n_parms) {
                levels.push((name.clone(), level));
            }
        }
        levels
    }

    /// The observed variable a free natural parameter is attributed to.
    fn parameter_variable(&self, name: &str) -> Option<usize> {
        if let Some(i) = self.model.param_index(name) {
            return Some(self.model.parameter_owner()[i]);
        }
        self.model
            .compartments()
            .iter()
            .position(|(n, _)| format!("{}_0", n) == name)
    }
}

fn default_start(name: &str) -> f64 {
    match name {
        "alpha" => 1.0,
        "beta" => 10.0,
        "k1" => 0.1,
        "k2" => 0.01,
        "tb" => 5.0,
        "kmax" => 0.1,
        "k0" => 0.01,
        "r" => 0.2,
        _ if name.starts_with("N_") => 1.1,
        _ => 0.1,
    }
}

struct Objective<'a, 'b> {
    model: &'a DegradationModel,
    strategy: Strategy,
    tolerances: Tolerances,
    error_model: ErrorModel,
    times_union: &'b [f64],
    observations: &'b [(usize, usize, f64)],
    transforms: &'b Transformations,
    deg_sources: &'b [ValueSource],
    initial_sources: &'b [(String, ValueSource)],
    error_sources: &'b [ValueSource],
}

impl Objective<'_, '_> {
    /// Splits a free natural vector into the model parameter vector, the
    /// initial state map and the error parameters.
    fn assemble(&self, natural: &[f64]) -> (Vec<f64>, HashMap<String, f64>, Vec<f64>) {
        let resolve = |s: &ValueSource| match s {
            ValueSource::Free(i) => natural[*i],
            ValueSource::Fixed(v) => *v,
        };
        let deg: Vec<f64> = self.deg_sources.iter().map(resolve).collect();
        let err: Vec<f64> = self.error_sources.iter().map(resolve).collect();
        let initial: HashMap<String, f64> = self
            .initial_sources
            .iter()
            .map(|(state, s)| (state.clone(), resolve(s)))
            .collect();
        (deg, initial, err)
    }

    /// Negative log-likelihood at a full transformed vector; `None` when the
    /// trajectory cannot be computed or the likelihood is not finite.
    fn nll(&self, transformed: &[f64]) -> Option<f64> {
        let natural = self.transforms.to_natural(transformed);
        let (deg, initial, err) = self.assemble(&natural);
        let trajectory = match simulator::predict(
            self.model,
            &deg,
            &initial,
            self.times_union,
            self.strategy,
            self.tolerances,
            Output::Observed,
        ) {
            Ok(t) => t,
            Err(e) => {
                // Steer the optimizer away instead of failing the fit.
                tracing::trace!("trajectory rejected during optimization: {}", e);
                return None;
            }
        };
        let mut nll = 0.0;
        for &(var, tpos, value) in self.observations {
            let predicted = trajectory.columns()[var].1[tpos];
            let sigma = self.error_model.sigma(&err, var, predicted);
            if !(sigma > 0.0) || !sigma.is_finite() {
                return None;
            }
            let z = (value - predicted) / sigma;
            nll += sigma.ln() + 0.5 * z * z + 0.5 * LN_2PI;
        }
        nll.is_finite().then_some(nll)
    }
}

struct MaskedObjective<'a> {
    objective: &'a Objective<'a, 'a>,
    base: Vec<f64>,
    active: Vec<usize>,
}

impl CostFunction for MaskedObjective<'_> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
        let mut full = self.base.clone();
        for (i, &ai) in self.active.iter().enumerate() {
            full[ai] = param[i];
        }
        Ok(self.objective.nll(&full).unwrap_or(f64::INFINITY))
    }
}

/// Initial simplex around a point, one vertex perturbed per dimension.
fn initial_simplex(initial: &Array1<f64>) -> Vec<Array1<f64>> {
    let mut vertices = vec![initial.to_owned()];
    for i in 0..initial.len() {
        let perturbation = if initial[i] == 0.0 {
            0.1
        } else {
            0.1 * initial[i].abs()
        };
        let mut vertex = initial.to_owned();
        vertex[i] += perturbation;
        vertices.push(vertex);
    }
    vertices
}

/// Central finite-difference Hessian.
fn numerical_hessian(f: impl Fn(&[f64]) -> f64, x: &[f64]) -> DMatrix<f64> {
    let n = x.len();
    let h: Vec<f64> = x.iter().map(|&v| 1e-4 * v.abs().max(1.0)).collect();
    let mut hessian = DMatrix::zeros(n, n);
    let eval = |shift_i: usize, si: f64, shift_j: usize, sj: f64| {
        let mut p = x.to_vec();
        p[shift_i] += si;
        p[shift_j] += sj;
        f(&p)
    };
    for i in 0..n {
        for j in i..n {
            let value = if i == j {
                let f0 = f(x);
                let fp = eval(i, h[i], i, 0.0);
                let fm = eval(i, -h[i], i, 0.0);
                (fp - 2.0 * f0 + fm) / (h[i] * h[i])
            } else {
                let fpp = eval(i, h[i], j, h[j]);
                let fpm = eval(i, h[i], j, -h[j]);
                let fmp = eval(i, -h[i], j, h[j]);
                let fmm = eval(i, -h[i], j, -h[j]);
                (fpp - fpm - fmp + fmm) / (4.0 * h[i] * h[j])
            };
            hessian[(i, j)] = value;
            hessian[(j, i)] = value;
        }
    }
    hessian
}

fn invert_covariance(hessian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if hessian.iter().any(|v| !v.is_finite()) {
        return None;
    }
    hessian.clone().try_inverse()
}

/// FOCUS chi-squared error level (percent): the smallest relative error at
/// which the chi-squared test would not reject the fit.
fn chi2_error_level<'r>(
    residuals: impl Iterator<Item = &'r Residual>,
    n_parms: usize,
) -> Option<f64> {
    let mut ssr = 0.0;
    let mut sum = 0.0;
    let mut n = 0usize;
    for r in residuals {
        ssr += r.residual * r.residual;
        sum += r.observed;
        n += 1;
    }
    let df = n as i64 - n_parms as i64;
    if df <= 0 || n == 0 {
        return None;
    }
    let mean = sum / n as f64;
    let quantile = ChiSquared::new(df as f64).ok()?.inverse_cdf(0.95);
    Some(100.0 * (ssr / (quantile * mean * mean)).sqrt())
}

/// Closed-form disposition times where they exist.
fn endpoints(model: &DegradationModel, deg: &[f64]) -> Vec<(String, f64)> {
    let (src, spec) = model.source();
    let mut out = Vec::new();
    match spec.submodel() {
        SubmodelType::Sfo => {
            let prefix = format!("k_{}_", src);
            let single = format!("k_{}", src);
            let k_total: f64 = model
                .parameter_names()
                .iter()
                .zip(deg.iter())
                .filter(|(n, _)| **n == single || n.starts_with(&prefix))
                .map(|(_, &v)| v)
                .sum();
            if k_total > 0.0 {
                out.push((format!("DT50_{}", src), std::f64::consts::LN_2 / k_total));
                out.push((format!("DT90_{}", src), 10f64.ln() / k_total));
            }
        }
        SubmodelType::Fomc => {
            let alpha = deg[model.param_index("alpha").unwrap()];
            let beta = deg[model.param_index("beta").unwrap()];
            out.push((
                format!("DT50_{}", src),
                beta * (2f64.powf(1.0 / alpha) - 1.0),
            ));
            out.push((
                format!("DT90_{}", src),
                beta * (10f64.powf(1.0 / alpha) - 1.0),
            ));
        }
        // No closed form for the remaining parents.
        _ => {}
    }
    out
}
