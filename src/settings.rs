use crate::fit::error_model::ErrorModel;
use crate::simulator::{Strategy, Tolerances};
use serde_derive::{Deserialize, Serialize};

/// How variance-model parameters are estimated: jointly with the kinetic
/// parameters (preferred), or by the legacy alternating reweighting scheme
/// kept for parity with historical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarianceFitting {
    Joint,
    AlternatingReweighting,
}

/// Configuration for one fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSettings {
    error_model: ErrorModel,
    variance_fitting: VarianceFitting,
    /// `None` selects automatically: analytical for one observed variable,
    /// numerical integration otherwise.
    strategy: Option<Strategy>,
    tolerances: Tolerances,
    max_iters: u64,
    /// Nelder-Mead standard-deviation termination tolerance.
    sd_tolerance: f64,
    confidence_level: f64,
}

impl Default for FitSettings {
    fn default() -> Self {
        FitSettings {
            error_model: ErrorModel::Constant,
            variance_fitting: VarianceFitting::Joint,
            strategy: None,
            tolerances: Tolerances::default(),
            max_iters: 3000,
            sd_tolerance: 1e-9,
            confidence_level: 0.95,
        }
    }
}

impl FitSettings {
    pub fn builder() -> FitSettingsBuilder {
        FitSettingsBuilder {
            settings: FitSettings::default(),
        }
    }

    pub fn error_model(&self) -> ErrorModel {
        self.error_model
    }

    pub fn variance_fitting(&self) -> VarianceFitting {
        self.variance_fitting
    }

    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    pub fn max_iters(&self) -> u64 {
        self.max_iters
    }

    pub fn sd_tolerance(&self) -> f64 {
        self.sd_tolerance
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }
}

pub struct FitSettingsBuilder {
    settings: FitSettings,
}

impl FitSettingsBuilder {
    pub fn set_error_model(mut self, error_model: ErrorModel) -> Self {
        self.settings.error_model = error_model;
        self
    }

    pub fn set_variance_fitting(mut self, variance_fitting: VarianceFitting) -> Self {
        self.settings.variance_fitting = variance_fitting;
        self
    }

    pub fn set_strategy(mut self, strategy: Strategy) -> Self {
        self.settings.strategy = Some(strategy);
        self
    }

    pub fn set_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.settings.tolerances = Tolerances { rtol, atol };
        self
    }

    pub fn set_max_iters(mut self, max_iters: u64) -> Self {
        self.settings.max_iters = max_iters;
        self
    }

    pub fn set_sd_tolerance(mut self, sd_tolerance: f64) -> Self {
        self.settings.sd_tolerance = sd_tolerance;
        self
    }

    pub fn set_confidence_level(mut self, level: f64) -> Self {
        self.settings.confidence_level = level;
        self
    }

    pub fn build(self) -> FitSettings {
        self.settings
    }
}
