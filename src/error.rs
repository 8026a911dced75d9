use thiserror::Error;

/// Errors raised by model compilation and trajectory solving.
///
/// Fitting-stage problems (non-convergence, singular covariance,
/// untranslatable confidence intervals) are not errors; they are recorded as
/// flags on [`crate::fit::FitResult`].
#[derive(Error, Debug)]
pub enum KinError {
    /// Invalid model specification. Always fatal, raised at build time.
    #[error("invalid model specification: {0}")]
    Configuration(String),

    /// The trajectory could not be computed for the given parameters.
    #[error("integration failed: {0}")]
    IntegrationFailure(String),

    /// The requested solution strategy is not applicable to this model.
    #[error("solution strategy not applicable: {0}")]
    Strategy(String),

    /// The dataset is inconsistent with the model.
    #[error("invalid dataset: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, KinError>;
