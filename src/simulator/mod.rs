pub mod analytical;
pub mod eigen;
pub mod ode;

use crate::error::{KinError, Result};
use crate::model::{submodel::SubmodelType, DegradationModel, UseOfFractions};
use nalgebra::DVector;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;

/// Solution strategy for a trajectory call. Choosing is the caller's
/// responsibility; feasibility is validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Closed-form parent-only solution; requires exactly one observed variable.
    Analytical,
    /// Eigen-decomposition of the coefficient matrix; requires a linear model.
    Eigen,
    /// Adaptive Runge-Kutta integration of the differential equations.
    Numerical,
}

/// Error bounds for the numerical integrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            rtol: 1e-8,
            atol: 1e-10,
        }
    }
}

/// Whether trajectory columns are aggregated to observed variables or
/// returned per raw state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Observed,
    States,
}

/// Predicted concentrations: one time column plus one column per observed
/// (or state) variable.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    pub time: Vec<f64>,
    columns: Vec<(String, Vec<f64>)>,
}

impl Trajectory {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }
}

/// Solves the model for one parameter vector and initial state.
///
/// `parms` is ordered as `model.parameter_names()`; `initial` maps state
/// variable names to initial amounts, with missing states starting at zero.
/// Output times need not be sorted, start at zero, or be unique.
pub fn predict(
    model: &DegradationModel,
    parms: &[f64],
    initial: &HashMap<String, f64>,
    times: &[f64],
    strategy: Strategy,
    tolerances: Tolerances,
    output: Output,
) -> Result<Trajectory> {
    if parms.len() != model.parameter_names().len() {
        return Err(KinError::Configuration(format!(
            "expected {} parameters, got {}",
            model.parameter_names().len(),
            parms.len()
        )));
    }
    if let Some(&t) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(KinError::Configuration(format!(
            "output times must be finite and non-negative, got {}",
            t
        )));
    }

    let mut x0 = DVector::zeros(model.n_states());
    for (name, value) in initial {
        let idx = model.state_index(name).ok_or_else(|| {
            KinError::Configuration(format!("unknown state variable \"{}\"", name))
        })?;
        x0[idx] = *value;
    }

    match strategy {
        Strategy::Analytical => {
            if model.observed_variables().len() != 1 {
                return Err(KinError::Strategy(
                    "analytical solution requires exactly one observed variable".to_string(),
                ));
            }
            let values = analytical_observed(model, parms, &x0, times)?;
            Ok(Trajectory {
                time: times.to_vec(),
                columns: vec![(model.observed_variables()[0].clone(), values)],
            })
        }
        Strategy::Eigen => {
            let states = eigen::solve_eigen(model, parms, &x0, times)?;
            Ok(aggregate(model, times, &states, output))
        }
        Strategy::Numerical => {
            let mut sorted = times.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            sorted.dedup();
            let states = ode::solve_numerical(
                model,
                parms,
                &x0,
                &sorted,
                tolerances.rtol,
                tolerances.atol,
            )?;
            // Map each requested time back onto the solved grid.
            let remapped: Vec<DVector<f64>> = times
                .iter()
                .map(|t| {
                    let i = sorted
                        .binary_search_by(|s| s.partial_cmp(t).unwrap())
                        .unwrap();
                    states[i].clone()
                })
                .collect();
            Ok(aggregate(model, times, &remapped, output))
        }
    }
}

fn aggregate(
    model: &DegradationModel,
    times: &[f64],
    states: &[DVector<f64>],
    output: Output,
) -> Trajectory {
    let columns = match output {
        Output::States => model
            .state_variables()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), states.iter().map(|x| x[i]).collect()))
            .collect(),
        Output::Observed => model
            .observed_variables()
            .iter()
            .zip(model.observed_to_state().iter())
            .map(|(name, state_idxs)| {
                let values = states
                    .iter()
                    .map(|x| state_idxs.iter().map(|&i| x[i]).sum())
                    .collect();
                (name.clone(), values)
            })
            .collect(),
    };
    Trajectory {
        time: times.to_vec(),
        columns,
    }
}

/// Dispatches to the closed-form parent-only solution, resolving the
/// mode-dependent rate parameter names.
fn analytical_observed(
    model: &DegradationModel,
    parms: &[f64],
    x0: &DVector<f64>,
    times: &[f64],
) -> Result<Vec<f64>> {
    let (src, spec) = model.source();
    let get = |name: &str| model.param_index(name).map(|i| parms[i]);
    let require = |name: &str| {
        get(name).ok_or_else(|| {
            KinError::Strategy(format!("parameter \"{}\" not present in model", name))
        })
    };
    let min_mode = model.use_of_fractions() == UseOfFractions::Min;
    let c0 = x0[0];

    Ok(match spec.submodel() {
        SubmodelType::Sfo => {
            let k_name = if min_mode {
                format!("k_{}_sink", src)
            } else {
                format!("k_{}", src)
            };
            analytical::sfo(times, c0, get(&k_name).unwrap_or(0.0))
        }
        SubmodelType::Iore => {
            let k_name = if min_mode {
                format!("k__iore_{}_sink", src)
            } else {
                format!("k__iore_{}", src)
            };
            match get(&k_name) {
                Some(k) => analytical::iore(times, c0, k, require(&format!("N_{}", src))?),
                None => vec![c0; times.len()],
            }
        }
        SubmodelType::Sforb => {
            if x0[1] != 0.0 {
                return Err(KinError::Strategy(
                    "analytical SFORB solution assumes the bound state starts at zero"
                        .to_string(),
                ));
            }
            let k_out_name = if min_mode {
                format!("k_{}_free_sink", src)
            } else {
                format!("k_{}_free", src)
            };
            analytical::sforb(
                times,
                c0,
                require(&format!("k_{}_free_bound", src))?,
                require(&format!("k_{}_bound_free", src))?,
                get(&k_out_name).unwrap_or(0.0),
            )
        }
        SubmodelType::Fomc => {
            analytical::fomc(times, c0, require("alpha")?, require("beta")?)
        }
        SubmodelType::Dfop => analytical::dfop(
            times,
            c0,
            require("k1")?,
            require("k2")?,
            require("g")?,
        ),
        SubmodelType::Hs => analytical::hs(
            times,
            c0,
            require("k1")?,
            require("k2")?,
            require("tb")?,
        ),
        SubmodelType::Logistic => analytical::logistic(
            times,
            c0,
            require("kmax")?,
            require("k0")?,
            require("r")?,
        ),
    })
}
