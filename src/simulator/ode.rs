use crate::error::{KinError, Result};
use crate::model::DegradationModel;
use nalgebra::DVector;
use ode_solvers::Dopri5;
use std::cell::RefCell;

type State = DVector<f64>;
type Time = f64;

struct Rhs<'a> {
    model: &'a DegradationModel,
    parms: &'a [f64],
    stack: RefCell<Vec<f64>>,
}

impl ode_solvers::System<Time, State> for Rhs<'_> {
    fn system(&self, t: Time, y: &State, dy: &mut State) {
        let mut stack = self.stack.borrow_mut();
        self.model.derivatives(t, y, self.parms, dy, &mut stack);
    }
}

/// Integrates the model from `t = 0` with initial state `x0` and returns the
/// state at each of `times`, which must be sorted ascending and deduplicated.
/// Any non-finite state value fails the whole call.
pub fn solve_numerical(
    model: &DegradationModel,
    parms: &[f64],
    x0: &DVector<f64>,
    times: &[f64],
    rtol: f64,
    atol: f64,
) -> Result<Vec<DVector<f64>>> {
    let mut states = Vec::with_capacity(times.len());
    let mut x = x0.clone();
    let mut t_prev = 0.0;
    for &t in times {
        if t > t_prev {
            let rhs = Rhs {
                model,
                parms,
                stack: RefCell::new(Vec::new()),
            };
            // Dense output only at the segment end; intermediate steps are
            // the integrator's own.
            let mut stepper = Dopri5::new(rhs, t_prev, t, t - t_prev, x.clone(), rtol, atol);
            stepper.integrate().map_err(|e| {
                KinError::IntegrationFailure(format!(
                    "integrator stopped in [{}, {}]: {:?}",
                    t_prev, t, e
                ))
            })?;
            x = stepper
                .y_out()
                .last()
                .ok_or_else(|| {
                    KinError::IntegrationFailure("integrator produced no output".to_string())
                })?
                .clone();
            t_prev = t;
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(KinError::IntegrationFailure(format!(
                "non-finite state at t = {}",
                t
            )));
        }
        states.push(x.clone());
    }
    Ok(states)
}
