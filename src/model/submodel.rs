use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Kinetic submodel of one compartment.
///
/// The catalog is closed: every variant must be handled at decline-term
/// construction, parameter-name derivation, analytical-solution dispatch and
/// program lowering, which exhaustive matching enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmodelType {
    /// Single first-order decay.
    Sfo,
    /// First-order multi-compartment (two-parameter biexponential-like decline).
    Fomc,
    /// Indeterminate-order rate equation (power-law decline).
    Iore,
    /// Double first-order in parallel (biphasic decline).
    Dfop,
    /// Hockey-stick: two sequential first-order rates with a breakpoint.
    Hs,
    /// Single first-order reversible binding; expands to free and bound states.
    Sforb,
    /// Logistic-growth-shaped decline.
    Logistic,
}

impl SubmodelType {
    /// Types that only make sense for the source compartment.
    pub fn source_only(&self) -> bool {
        matches!(
            self,
            SubmodelType::Fomc | SubmodelType::Dfop | SubmodelType::Hs | SubmodelType::Logistic
        )
    }

    /// Types whose decline is linear in the state with constant coefficients,
    /// so they can contribute to a coefficient matrix.
    pub fn linear(&self) -> bool {
        matches!(self, SubmodelType::Sfo | SubmodelType::Sforb)
    }
}

impl fmt::Display for SubmodelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmodelType::Sfo => "SFO",
            SubmodelType::Fomc => "FOMC",
            SubmodelType::Iore => "IORE",
            SubmodelType::Dfop => "DFOP",
            SubmodelType::Hs => "HS",
            SubmodelType::Sforb => "SFORB",
            SubmodelType::Logistic => "logistic",
        };
        write!(f, "{}", name)
    }
}
