pub mod expr;
pub mod submodel;

use crate::error::{KinError, Result};
use expr::{EvaluationStrategy, Expr, Program};
use nalgebra::DVector;
use serde_derive::{Deserialize, Serialize};
use submodel::SubmodelType;

/// Declarative specification of one compartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompartmentSpec {
    submodel: SubmodelType,
    targets: Vec<String>,
    sink: bool,
    full_name: Option<String>,
}

impl CompartmentSpec {
    pub fn new(submodel: SubmodelType) -> Self {
        CompartmentSpec {
            submodel,
            targets: Vec::new(),
            sink: true,
            full_name: None,
        }
    }

    /// Adds a transfer target. Order is significant for parameter ordering.
    pub fn to(mut self, target: &str) -> Self {
        self.targets.push(target.to_string());
        self
    }

    /// Disables the sink term for this compartment.
    pub fn no_sink(mut self) -> Self {
        self.sink = false;
        self
    }

    pub fn with_full_name(mut self, full_name: &str) -> Self {
        self.full_name = Some(full_name.to_string());
        self
    }

    pub fn submodel(&self) -> SubmodelType {
        self.submodel
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn sink(&self) -> bool {
        self.sink
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }
}

/// Whether formation fractions are used only where unavoidable (`Min`,
/// fewest estimated parameters) or for every transfer (`Max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseOfFractions {
    Min,
    Max,
}

/// Ordered set of compartment specifications, compiled into a
/// [`DegradationModel`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSpec {
    compartments: Vec<(String, CompartmentSpec)>,
}

/// A group of formation-fraction parameters sharing an origin compartment.
/// With `implicit_slot` the group carries an unestimated complement (the
/// fraction to sink, or `1 - g` for the biphasic mixing parameter).
#[derive(Debug, Clone)]
pub struct FractionGroup {
    pub origin: String,
    /// Stem for derived transformed-parameter names, e.g. `f_parent`.
    pub stem: String,
    /// Indices into `parameter_names`.
    pub indices: Vec<usize>,
    pub implicit_slot: bool,
}

/// Immutable compiled model: state variables, differential equations,
/// parameter bookkeeping, optional linear coefficient matrix and the
/// evaluation strategy chosen at build time.
#[derive(Debug, Clone)]
pub struct DegradationModel {
    compartments: Vec<(String, CompartmentSpec)>,
    use_of_ff: UseOfFractions,
    state_variables: Vec<String>,
    odes: Vec<Expr>,
    parameter_names: Vec<String>,
    parameter_owner: Vec<usize>,
    observed_variables: Vec<String>,
    observed_to_state: Vec<Vec<usize>>,
    fraction_groups: Vec<FractionGroup>,
    coefficient_matrix: Option<Vec<Vec<Expr>>>,
    strategy: EvaluationStrategy,
}

impl ModelSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a parent-only model.
    pub fn parent_only(submodel: SubmodelType) -> Self {
        Self::new().add("parent", CompartmentSpec::new(submodel))
    }

    pub fn add(mut self, name: &str, spec: CompartmentSpec) -> Self {
        self.compartments.push((name.to_string(), spec));
        self
    }

    /// Compiles the specification into a [`DegradationModel`].
    pub fn compile(self, use_of_ff: UseOfFractions) -> Result<DegradationModel> {
        self.validate(use_of_ff)?;
        let compartments = self.compartments;

        // State variable table; SFORB compartments expand to free and bound.
        let mut state_variables: Vec<String> = Vec::new();
        let mut observed_variables: Vec<String> = Vec::new();
        let mut observed_to_state: Vec<Vec<usize>> = Vec::new();
        for (name, spec) in &compartments {
            observed_variables.push(name.clone());
            if spec.submodel == SubmodelType::Sforb {
                let free = state_variables.len();
                state_variables.push(format!("{}_free", name));
                state_variables.push(format!("{}_bound", name));
                observed_to_state.push(vec![free, free + 1]);
            } else {
                let idx = state_variables.len();
                state_variables.push(name.clone());
                observed_to_state.push(vec![idx]);
            }
        }

        let mut builder = Builder {
            params: Vec::new(),
            owner: Vec::new(),
            groups: Vec::new(),
            losses: Vec::new(),
            gains: Vec::new(),
        };

        for (ci, (name, spec)) in compartments.iter().enumerate() {
            let origin = observed_to_state[ci][0];
            builder.compartment_terms(
                ci,
                name,
                spec,
                origin,
                use_of_ff,
                &compartments,
                &observed_to_state,
            )?;
        }

        // Differential equations from the accumulated loss and gain terms.
        let n_states = state_variables.len();
        let mut odes: Vec<Expr> = Vec::with_capacity(n_states);
        for i in 0..n_states {
            let mut terms: Vec<Expr> = Vec::new();
            for (dest, from, rate) in &builder.gains {
                if *dest == i {
                    terms.push(Expr::product(vec![rate.clone(), Expr::State(*from)]));
                }
            }
            for (state, rate) in &builder.losses {
                if *state == i {
                    terms
                        .push(Expr::product(vec![rate.clone(), Expr::State(*state)]).neg());
                }
            }
            odes.push(Expr::sum(terms));
        }

        // Coefficient matrix, present only when every compartment is linear.
        let all_linear = compartments.iter().all(|(_, s)| s.submodel.linear());
        let coefficient_matrix = if all_linear {
            let mut matrix = vec![vec![Expr::zero(); n_states]; n_states];
            for (state, rate) in &builder.losses {
                let old = std::mem::replace(&mut matrix[*state][*state], Expr::zero());
                matrix[*state][*state] = Expr::sum(vec![old, rate.clone().neg()]);
            }
            for (dest, from, rate) in &builder.gains {
                let old = std::mem::replace(&mut matrix[*dest][*from], Expr::zero());
                matrix[*dest][*from] = Expr::sum(vec![old, rate.clone()]);
            }
            Some(matrix)
        } else {
            None
        };

        let strategy = if observed_variables.len() >= 2 {
            tracing::debug!(
                "compiling derivative programs for {} state variables",
                n_states
            );
            EvaluationStrategy::Compiled(odes.iter().map(Program::compile).collect())
        } else {
            EvaluationStrategy::Interpreted
        };

        Ok(DegradationModel {
            compartments,
            use_of_ff,
            state_variables,
            odes,
            parameter_names: builder.params,
            parameter_owner: builder.owner,
            observed_variables,
            observed_to_state,
            fraction_groups: builder.groups,
            coefficient_matrix,
            strategy,
        })
    }

    fn validate(&self, use_of_ff: UseOfFractions) -> Result<()> {
        if self.compartments.is_empty() {
            return Err(KinError::Configuration(
                "model specification is empty".to_string(),
            ));
        }
        for (i, (name, spec)) in self.compartments.iter().enumerate() {
            if name == "sink" {
                return Err(KinError::Configuration(
                    "\"sink\" is a reserved compartment name".to_string(),
                ));
            }
            if name.contains("_to_") {
                return Err(KinError::Configuration(format!(
                    "compartment name \"{}\" must not contain \"_to_\"",
                    name
                )));
            }
            for (j, (other, _)) in self.compartments.iter().enumerate() {
                if i != j && name.contains(other.as_str()) {
                    return Err(KinError::Configuration(format!(
                        "compartment names must not be substrings of each other: \"{}\" and \"{}\"",
                        other, name
                    )));
                }
            }
            if i > 0 && spec.submodel.source_only() {
                return Err(KinError::Configuration(format!(
                    "{} is only permitted for the source compartment, not \"{}\"",
                    spec.submodel, name
                )));
            }
            if spec.submodel == SubmodelType::Iore
                && !spec.targets.is_empty()
                && use_of_ff == UseOfFractions::Min
            {
                return Err(KinError::Configuration(format!(
                    "IORE compartment \"{}\" with transfer targets requires maximum use of formation fractions",
                    name
                )));
            }
            if !spec.sink && spec.targets.is_empty() && !spec.submodel.linear() {
                return Err(KinError::Configuration(format!(
                    "{} compartment \"{}\" needs a sink or at least one target",
                    spec.submodel, name
                )));
            }
            for target in &spec.targets {
                if target == name {
                    return Err(KinError::Configuration(format!(
                        "compartment \"{}\" cannot transfer to itself",
                        name
                    )));
                }
                if !self.compartments.iter().any(|(n, _)| n == target) {
                    return Err(KinError::Configuration(format!(
                        "transfer target \"{}\" has no compartment specification",
                        target
                    )));
                }
            }
        }
        Ok(())
    }
}

struct Builder {
    params: Vec<String>,
    owner: Vec<usize>,
    groups: Vec<FractionGroup>,
    /// (state, rate coefficient on that state)
    losses: Vec<(usize, Expr)>,
    /// (destination state, origin state, rate coefficient on the origin state)
    gains: Vec<(usize, usize, Expr)>,
}

impl Builder {
    fn param(&mut self, name: String, owner: usize) -> usize {
        self.params.push(name);
        self.owner.push(owner);
        self.params.len() - 1
    }

    #[allow(clippy::too_many_arguments)]
    fn compartment_terms(
        &mut self,
        ci: usize,
        name: &str,
        spec: &CompartmentSpec,
        origin: usize,
        use_of_ff: UseOfFractions,
        compartments: &[(String, CompartmentSpec)],
        observed_to_state: &[Vec<usize>],
    ) -> Result<()> {
        let target_states: Vec<usize> = spec
            .targets
            .iter()
            .map(|t| {
                let idx = compartments.iter().position(|(n, _)| n == t).unwrap();
                observed_to_state[idx][0]
            })
            .collect();
        let target_owners: Vec<usize> = spec
            .targets
            .iter()
            .map(|t| compartments.iter().position(|(n, _)| n == t).unwrap())
            .collect();

        match spec.submodel {
            SubmodelType::Sfo | SubmodelType::Sforb => {
                let stem = if spec.submodel == SubmodelType::Sforb {
                    // Reversible binding between the free and bound states;
                    // degradation only acts on the free form.
                    let k_fb = self.param(format!("k_{}_free_bound", name), ci);
                    let k_bf = self.param(format!("k_{}_bound_free", name), ci);
                    self.losses.push((origin, Expr::Parameter(k_fb)));
                    self.gains.push((origin + 1, origin, Expr::Parameter(k_fb)));
                    self.losses.push((origin + 1, Expr::Parameter(k_bf)));
                    self.gains.push((origin, origin + 1, Expr::Parameter(k_bf)));
                    format!("{}_free", name)
                } else {
                    name.to_string()
                };
                match use_of_ff {
                    UseOfFractions::Min => {
                        if spec.sink {
                            let k = self.param(format!("k_{}_sink", stem), ci);
                            self.losses.push((origin, Expr::Parameter(k)));
                        }
                        for (target, (state, owner)) in spec
                            .targets
                            .iter()
                            .zip(target_states.iter().zip(target_owners.iter()))
                        {
                            let k = self.param(format!("k_{}_{}", stem, target), *owner);
                            self.losses.push((origin, Expr::Parameter(k)));
                            self.gains.push((*state, origin, Expr::Parameter(k)));
                        }
                    }
                    UseOfFractions::Max => {
                        if spec.sink || !spec.targets.is_empty() {
                            let k = self.param(format!("k_{}", stem), ci);
                            self.distribute(
                                name,
                                spec,
                                origin,
                                Expr::Parameter(k),
                                &target_states,
                                &target_owners,
                            );
                        }
                    }
                }
            }
            SubmodelType::Iore => {
                let rate_name = match use_of_ff {
                    // Min mode is only reachable without targets here.
                    UseOfFractions::Min => {
                        if !spec.sink {
                            return Ok(());
                        }
                        format!("k__iore_{}_sink", name)
                    }
                    UseOfFractions::Max => format!("k__iore_{}", name),
                };
                let k = self.param(rate_name, ci);
                let n = self.param(format!("N_{}", name), ci);
                let rate = Expr::product(vec![
                    Expr::Parameter(k),
                    Expr::Pow(
                        Box::new(Expr::State(origin)),
                        Box::new(Expr::sum(vec![Expr::Parameter(n), Expr::Constant(-1.0)])),
                    ),
                ]);
                self.distribute(name, spec, origin, rate, &target_states, &target_owners);
            }
            SubmodelType::Fomc => {
                let alpha = self.param("alpha".to_string(), ci);
                let beta = self.param("beta".to_string(), ci);
                // alpha / (t + beta)
                let rate = Expr::product(vec![
                    Expr::Parameter(alpha),
                    Expr::Pow(
                        Box::new(Expr::sum(vec![Expr::Time, Expr::Parameter(beta)])),
                        Box::new(Expr::Constant(-1.0)),
                    ),
                ]);
                self.distribute(name, spec, origin, rate, &target_states, &target_owners);
            }
            SubmodelType::Dfop => {
                let k1 = self.param("k1".to_string(), ci);
                let k2 = self.param("k2".to_string(), ci);
                let g = self.param("g".to_string(), ci);
                self.groups.push(FractionGroup {
                    origin: name.to_string(),
                    stem: "g".to_string(),
                    indices: vec![g],
                    implicit_slot: true,
                });
                let e1 = Expr::exp(Expr::product(vec![
                    Expr::Constant(-1.0),
                    Expr::Parameter(k1),
                    Expr::Time,
                ]));
                let e2 = Expr::exp(Expr::product(vec![
                    Expr::Constant(-1.0),
                    Expr::Parameter(k2),
                    Expr::Time,
                ]));
                let one_minus_g = Expr::sum(vec![
                    Expr::Constant(1.0),
                    Expr::Parameter(g).neg(),
                ]);
                let num = Expr::sum(vec![
                    Expr::product(vec![
                        Expr::Parameter(k1),
                        Expr::Parameter(g),
                        e1.clone(),
                    ]),
                    Expr::product(vec![
                        Expr::Parameter(k2),
                        one_minus_g.clone(),
                        e2.clone(),
                    ]),
                ]);
                let den = Expr::sum(vec![
                    Expr::product(vec![Expr::Parameter(g), e1]),
                    Expr::product(vec![one_minus_g, e2]),
                ]);
                let rate = Expr::product(vec![
                    num,
                    Expr::Pow(Box::new(den), Box::new(Expr::Constant(-1.0))),
                ]);
                self.distribute(name, spec, origin, rate, &target_states, &target_owners);
            }
            SubmodelType::Hs => {
                let k1 = self.param("k1".to_string(), ci);
                let k2 = self.param("k2".to_string(), ci);
                let tb = self.param("tb".to_string(), ci);
                let rate = Expr::IfLe {
                    lhs: Box::new(Expr::Time),
                    rhs: Box::new(Expr::Parameter(tb)),
                    then: Box::new(Expr::Parameter(k1)),
                    otherwise: Box::new(Expr::Parameter(k2)),
                };
                self.distribute(name, spec, origin, rate, &target_states, &target_owners);
            }
            SubmodelType::Logistic => {
                let kmax = self.param("kmax".to_string(), ci);
                let k0 = self.param("k0".to_string(), ci);
                let r = self.param("r".to_string(), ci);
                let ert = Expr::exp(Expr::product(vec![Expr::Parameter(r), Expr::Time]));
                let num = Expr::product(vec![
                    Expr::Parameter(k0),
                    Expr::Parameter(kmax),
                    ert.clone(),
                ]);
                let den = Expr::sum(vec![
                    Expr::Parameter(kmax),
                    Expr::product(vec![
                        Expr::Parameter(k0),
                        Expr::sum(vec![ert, Expr::Constant(-1.0)]),
                    ]),
                ]);
                let rate = Expr::product(vec![
                    num,
                    Expr::Pow(Box::new(den), Box::new(Expr::Constant(-1.0))),
                ]);
                self.distribute(name, spec, origin, rate, &target_states, &target_owners);
            }
        }
        Ok(())
    }

    /// Applies a shared decline term and routes it to the targets, either
    /// through formation fractions or, for a sink-less single-target origin,
    /// wholesale.
    fn distribute(
        &mut self,
        name: &str,
        spec: &CompartmentSpec,
        origin: usize,
        rate: Expr,
        target_states: &[usize],
        target_owners: &[usize],
    ) {
        self.losses.push((origin, rate.clone()));
        if spec.targets.is_empty() {
            return;
        }
        if !spec.sink && spec.targets.len() == 1 {
            // The entire decline transfers; a fraction of 1 is implied.
            self.gains.push((target_states[0], origin, rate));
            return;
        }
        let mut indices = Vec::with_capacity(spec.targets.len());
        for (target, (state, owner)) in spec
            .targets
            .iter()
            .zip(target_states.iter().zip(target_owners.iter()))
        {
            let f = self.param(format!("f_{}_to_{}", name, target), *owner);
            indices.push(f);
            self.gains.push((
                *state,
                origin,
                Expr::product(vec![Expr::Parameter(f), rate.clone()]),
            ));
        }
        self.groups.push(FractionGroup {
            origin: name.to_string(),
            stem: format!("f_{}", name),
            indices,
            implicit_slot: spec.sink,
        });
    }
}

impl DegradationModel {
    pub fn state_variables(&self) -> &[String] {
        &self.state_variables
    }

    pub fn n_states(&self) -> usize {
        self.state_variables.len()
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// For each parameter, the index of the observed variable it is
    /// attributed to (transfer parameters belong to their target).
    pub fn parameter_owner(&self) -> &[usize] {
        &self.parameter_owner
    }

    pub fn observed_variables(&self) -> &[String] {
        &self.observed_variables
    }

    /// For each observed variable, the state variables summed to obtain it.
    pub fn observed_to_state(&self) -> &[Vec<usize>] {
        &self.observed_to_state
    }

    pub fn fraction_groups(&self) -> &[FractionGroup] {
        &self.fraction_groups
    }

    pub fn coefficient_matrix(&self) -> Option<&Vec<Vec<Expr>>> {
        self.coefficient_matrix.as_ref()
    }

    pub fn use_of_fractions(&self) -> UseOfFractions {
        self.use_of_ff
    }

    pub fn compartments(&self) -> &[(String, CompartmentSpec)] {
        &self.compartments
    }

    pub fn source(&self) -> (&str, &CompartmentSpec) {
        let (name, spec) = &self.compartments[0];
        (name, spec)
    }

    pub fn strategy(&self) -> &EvaluationStrategy {
        &self.strategy
    }

    pub fn differential_equations(&self) -> &[Expr] {
        &self.odes
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.parameter_names.iter().position(|n| n == name)
    }

    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.state_variables.iter().position(|n| n == name)
    }

    /// Evaluates the derivative vector at `(t, x)` for parameter vector `p`
    /// (ordered as `parameter_names`). `stack` is scratch space for the
    /// compiled path.
    pub fn derivatives(
        &self,
        t: f64,
        x: &DVector<f64>,
        p: &[f64],
        dx: &mut DVector<f64>,
        stack: &mut Vec<f64>,
    ) {
        match &self.strategy {
            EvaluationStrategy::Compiled(programs) => {
                for (i, program) in programs.iter().enumerate() {
                    dx[i] = program.run(t, x, p, stack);
                }
            }
            EvaluationStrategy::Interpreted => {
                for (i, ode) in self.odes.iter().enumerate() {
                    dx[i] = ode.eval(t, x, p);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sfo() -> CompartmentSpec {
        CompartmentSpec::new(SubmodelType::Sfo)
    }

    #[test]
    fn rejects_reserved_sink_name() {
        let err = ModelSpec::new()
            .add("sink", sfo())
            .compile(UseOfFractions::Min)
            .unwrap_err();
        assert!(matches!(err, KinError::Configuration(_)));
    }

    #[test]
    fn rejects_to_infix_in_name() {
        let err = ModelSpec::new()
            .add("a_to_b", sfo())
            .compile(UseOfFractions::Min)
            .unwrap_err();
        assert!(matches!(err, KinError::Configuration(_)));
    }

    #[test]
    fn rejects_substring_names() {
        let err = ModelSpec::new()
            .add("parent", sfo().to("par"))
            .add("par", sfo())
            .compile(UseOfFractions::Min)
            .unwrap_err();
        assert!(matches!(err, KinError::Configuration(_)));
    }

    #[test]
    fn rejects_nonlinear_type_off_source() {
        let err = ModelSpec::new()
            .add("parent", sfo().to("m1"))
            .add("m1", CompartmentSpec::new(SubmodelType::Dfop))
            .compile(UseOfFractions::Min)
            .unwrap_err();
        assert!(matches!(err, KinError::Configuration(_)));
    }

    #[test]
    fn rejects_unknown_target() {
        let err = ModelSpec::new()
            .add("parent", sfo().to("m1"))
            .compile(UseOfFractions::Min)
            .unwrap_err();
        assert!(matches!(err, KinError::Configuration(_)));
    }

    #[test]
    fn rejects_iore_with_targets_under_min() {
        let err = ModelSpec::new()
            .add("parent", CompartmentSpec::new(SubmodelType::Iore).to("m1"))
            .add("m1", sfo())
            .compile(UseOfFractions::Min)
            .unwrap_err();
        assert!(matches!(err, KinError::Configuration(_)));
    }

    #[test]
    fn sfo_min_parameter_names() {
        let model = ModelSpec::new()
            .add("parent", sfo().to("m1"))
            .add("m1", sfo())
            .compile(UseOfFractions::Min)
            .unwrap();
        assert_eq!(
            model.parameter_names(),
            &["k_parent_sink", "k_parent_m1", "k_m1_sink"]
        );
        assert!(model.fraction_groups().is_empty());
        assert!(model.coefficient_matrix().is_some());
        // k_parent_m1 is attributed to the metabolite it forms.
        assert_eq!(model.parameter_owner(), &[0, 1, 1]);
    }

    #[test]
    fn sfo_max_parameter_names() {
        let model = ModelSpec::new()
            .add("parent", sfo().to("m1"))
            .add("m1", sfo())
            .compile(UseOfFractions::Max)
            .unwrap();
        assert_eq!(
            model.parameter_names(),
            &["k_parent", "f_parent_to_m1", "k_m1"]
        );
        let groups = model.fraction_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].indices, vec![1]);
        assert!(groups[0].implicit_slot);
    }

    #[test]
    fn sinkless_single_target_needs_no_fraction() {
        let model = ModelSpec::new()
            .add("parent", sfo().no_sink().to("m1"))
            .add("m1", sfo())
            .compile(UseOfFractions::Max)
            .unwrap();
        assert_eq!(model.parameter_names(), &["k_parent", "k_m1"]);
        assert!(model.fraction_groups().is_empty());
    }

    #[test]
    fn sforb_expands_to_two_states() {
        let model = ModelSpec::parent_only(SubmodelType::Sforb)
            .compile(UseOfFractions::Min)
            .unwrap();
        assert_eq!(model.state_variables(), &["parent_free", "parent_bound"]);
        assert_eq!(model.observed_to_state(), &[vec![0, 1]]);
        assert_eq!(
            model.parameter_names(),
            &[
                "k_parent_free_bound",
                "k_parent_bound_free",
                "k_parent_free_sink"
            ]
        );
        assert!(model.coefficient_matrix().is_some());
    }

    #[test]
    fn nonlinear_source_suppresses_matrix() {
        let model = ModelSpec::new()
            .add("parent", CompartmentSpec::new(SubmodelType::Fomc).to("m1"))
            .add("m1", sfo())
            .compile(UseOfFractions::Max)
            .unwrap();
        assert!(model.coefficient_matrix().is_none());
        assert_eq!(
            model.parameter_names(),
            &["alpha", "beta", "f_parent_to_m1", "k_m1"]
        );
    }

    #[test]
    fn dfop_registers_mixing_group() {
        let model = ModelSpec::parent_only(SubmodelType::Dfop)
            .compile(UseOfFractions::Min)
            .unwrap();
        assert_eq!(model.parameter_names(), &["k1", "k2", "g"]);
        let groups = model.fraction_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].stem, "g");
        assert!(groups[0].implicit_slot);
    }

    #[test]
    fn multi_compartment_model_compiles_programs() {
        let model = ModelSpec::new()
            .add("parent", sfo().to("m1"))
            .add("m1", sfo())
            .compile(UseOfFractions::Min)
            .unwrap();
        assert!(matches!(
            model.strategy(),
            EvaluationStrategy::Compiled(p) if p.len() == 2
        ));
        let single = ModelSpec::parent_only(SubmodelType::Sfo)
            .compile(UseOfFractions::Min)
            .unwrap();
        assert!(matches!(single.strategy(), EvaluationStrategy::Interpreted));
    }
}
