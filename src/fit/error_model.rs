use serde_derive::{Deserialize, Serialize};

/// Observation error model: how the standard deviation of an observation
/// depends on the predicted value and the error parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorModel {
    /// One standard deviation shared by all observations. Maximum likelihood
    /// under this model reduces to ordinary least squares up to a constant.
    Constant,
    /// Two-component model `sd = sqrt(sigma_low^2 + value^2 * rsd_high^2)`:
    /// an additive floor plus a relative component.
    TwoComponent,
    /// One standard deviation per observed variable.
    ByVariable,
}

impl ErrorModel {
    /// Names of the error parameters, in estimation order.
    pub fn parameter_names(&self, observed: &[String]) -> Vec<String> {
        match self {
            ErrorModel::Constant => vec!["sigma".to_string()],
            ErrorModel::TwoComponent => {
                vec!["sigma_low".to_string(), "rsd_high".to_string()]
            }
            ErrorModel::ByVariable => observed
                .iter()
                .map(|name| format!("sigma_{}", name))
                .collect(),
        }
    }

    /// Standard deviation of an observation of variable `variable_index`
    /// with predicted mean `predicted`.
    pub fn sigma(&self, parms: &[f64], variable_index: usize, predicted: f64) -> f64 {
        match self {
            ErrorModel::Constant => parms[0],
            ErrorModel::TwoComponent => {
                (parms[0].powi(2) + predicted.powi(2) * parms[1].powi(2)).sqrt()
            }
            ErrorModel::ByVariable => parms[variable_index],
        }
    }

    /// Rough starting values: a tenth of the mean observed value for
    /// absolute components, 0.1 for relative ones.
    pub fn starting_values(&self, mean_observed: f64, n_observed: usize) -> Vec<f64> {
        let sigma0 = (0.1 * mean_observed).max(0.1);
        match self {
            ErrorModel::Constant => vec![sigma0],
            ErrorModel::TwoComponent => vec![sigma0, 0.1],
            ErrorModel::ByVariable => vec![sigma0; n_observed],
        }
    }
}
