//! Bidirectional mapping between natural (constrained) kinetic parameters
//! and the unconstrained internal parameters the optimizer works on.
//!
//! Strictly positive parameters are log-transformed. Formation fractions
//! sharing an origin (including the implicit fraction to sink) form a
//! simplex-constrained group handled by the isometric log-ratio transform,
//! whose inverse lands on the simplex for any real input by construction.

use crate::model::DegradationModel;

/// Isometric log-ratio transform of a point on the `n`-simplex
/// (`n = x.len()`, components positive, summing to one) to `n - 1`
/// unconstrained coordinates.
pub fn ilr(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut z = Vec::with_capacity(n - 1);
    let mut log_sum = 0.0;
    for i in 1..n {
        log_sum += x[i - 1].ln();
        let gm = log_sum / i as f64;
        z.push((i as f64 / (i as f64 + 1.0)).sqrt() * (gm - x[i].ln()));
    }
    z
}

/// Inverse isometric log-ratio transform. For arbitrary real input the
/// result has every component in (0, 1) and sums to one.
pub fn invilr(z: &[f64]) -> Vec<f64> {
    let n = z.len() + 1;
    // y = sum_i z_i e_i with the orthonormal basis
    // e_i = sqrt(i/(i+1)) (1/i, ..., 1/i, -1, 0, ..., 0).
    let mut y = vec![0.0; n];
    for (idx, &z_i) in z.iter().enumerate() {
        let i = idx + 1;
        let scale = (i as f64 / (i as f64 + 1.0)).sqrt();
        for item in y.iter_mut().take(i) {
            *item += z_i * scale / i as f64;
        }
        y[i] -= z_i * scale;
    }
    // Closure via a stabilized softmax.
    let max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = y.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

#[derive(Debug, Clone)]
enum Entry {
    /// Untransformed (initial state amounts).
    Identity { natural: usize, transformed: usize },
    /// Natural logarithm (rate and time constants, shape parameters).
    Log { natural: usize, transformed: usize },
    /// One simplex-constrained group. With `implicit_slot` the group carries
    /// an unestimated complement making up the remainder of the simplex.
    Ilr {
        natural: Vec<usize>,
        transformed: Vec<usize>,
        implicit_slot: bool,
    },
}

/// How one transformed coordinate maps back to the natural scale; used to
/// decide whether a confidence interval can be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateKind {
    Identity,
    Log,
    /// Single-coordinate ILR group; monotone, so intervals translate.
    IlrSingle,
    /// Coordinate of a multi-coordinate ILR group; intervals do not translate.
    IlrMulti,
}

/// An ordered collection of transform entries over a named natural parameter
/// vector.
#[derive(Debug, Clone, Default)]
pub struct Transformations {
    entries: Vec<Entry>,
    natural_names: Vec<String>,
    transformed_names: Vec<String>,
}

impl Transformations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the transformations for all degradation parameters of a model,
    /// in parameter order.
    pub fn for_model(model: &DegradationModel) -> Self {
        let mut tr = Transformations::new();
        tr.extend_from_model(model);
        tr
    }

    pub fn extend_from_model(&mut self, model: &DegradationModel) {
        let mut done = vec![false; model.parameter_names().len()];
        for i in 0..model.parameter_names().len() {
            if done[i] {
                continue;
            }
            if let Some(group) = model
                .fraction_groups()
                .iter()
                .find(|g| g.indices.contains(&i))
            {
                let names: Vec<String> = group
                    .indices
                    .iter()
                    .map(|&j| model.parameter_names()[j].clone())
                    .collect();
                self.push_group(&group.stem, &names, group.implicit_slot);
                for &j in &group.indices {
                    done[j] = true;
                }
            } else {
                self.push_log(&model.parameter_names()[i]);
                done[i] = true;
            }
        }
    }

    pub fn push_identity(&mut self, name: &str) {
        self.entries.push(Entry::Identity {
            natural: self.natural_names.len(),
            transformed: self.transformed_names.len(),
        });
        self.natural_names.push(name.to_string());
        self.transformed_names.push(name.to_string());
    }

    pub fn push_log(&mut self, name: &str) {
        self.entries.push(Entry::Log {
            natural: self.natural_names.len(),
            transformed: self.transformed_names.len(),
        });
        self.natural_names.push(name.to_string());
        self.transformed_names.push(format!("log_{}", name));
    }

    /// Pushes a simplex group. With an implicit slot, `k` natural fractions
    /// map to `k` ILR coordinates over the `(k+1)`-simplex; without one,
    /// `k` fractions summing to one map to `k - 1` coordinates.
    pub fn push_group(&mut self, stem: &str, member_names: &[String], implicit_slot: bool) {
        let natural: Vec<usize> =
            (0..member_names.len()).map(|i| self.natural_names.len() + i).collect();
        let n_coords = if implicit_slot {
            member_names.len()
        } else {
            member_names.len() - 1
        };
        let transformed: Vec<usize> =
            (0..n_coords).map(|i| self.transformed_names.len() + i).collect();
        for name in member_names {
            self.natural_names.push(name.clone());
        }
        for i in 1..=n_coords {
            self.transformed_names.push(format!("{}_ilr_{}", stem, i));
        }
        self.entries.push(Entry::Ilr {
            natural,
            transformed,
            implicit_slot,
        });
    }

    pub fn natural_names(&self) -> &[String] {
        &self.natural_names
    }

    pub fn transformed_names(&self) -> &[String] {
        &self.transformed_names
    }

    pub fn n_natural(&self) -> usize {
        self.natural_names.len()
    }

    pub fn n_transformed(&self) -> usize {
        self.transformed_names.len()
    }

    pub fn to_transformed(&self, natural: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n_transformed()];
        for entry in &self.entries {
            match entry {
                Entry::Identity {
                    natural: n,
                    transformed: t,
                } => out[*t] = natural[*n],
                Entry::Log {
                    natural: n,
                    transformed: t,
                } => out[*t] = natural[*n].ln(),
                Entry::Ilr {
                    natural: n,
                    transformed: t,
                    implicit_slot,
                } => {
                    let mut simplex: Vec<f64> = n.iter().map(|&i| natural[i]).collect();
                    if *implicit_slot {
                        let rest = 1.0 - simplex.iter().sum::<f64>();
                        simplex.push(rest);
                    }
                    for (coord, &ti) in ilr(&simplex).iter().zip(t.iter()) {
                        out[ti] = *coord;
                    }
                }
            }
        }
        out
    }

    pub fn to_natural(&self, transformed: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n_natural()];
        for entry in &self.entries {
            match entry {
                Entry::Identity {
                    natural: n,
                    transformed: t,
                } => out[*n] = transformed[*t],
                Entry::Log {
                    natural: n,
                    transformed: t,
                } => out[*n] = transformed[*t].exp(),
                Entry::Ilr {
                    natural: n,
                    transformed: t,
                    ..
                } => {
                    let coords: Vec<f64> = t.iter().map(|&i| transformed[i]).collect();
                    let simplex = invilr(&coords);
                    // With an implicit slot the last component (the sink or
                    // complement fraction) is dropped.
                    for (&ni, &value) in n.iter().zip(simplex.iter()) {
                        out[ni] = value;
                    }
                }
            }
        }
        out
    }

    /// Classifies each transformed coordinate for interval translation.
    pub fn coordinate_kind(&self, transformed_index: usize) -> CoordinateKind {
        for entry in &self.entries {
            match entry {
                Entry::Identity { transformed, .. } if *transformed == transformed_index => {
                    return CoordinateKind::Identity
                }
                Entry::Log { transformed, .. } if *transformed == transformed_index => {
                    return CoordinateKind::Log
                }
                Entry::Ilr { transformed, .. } if transformed.contains(&transformed_index) => {
                    return if transformed.len() == 1 {
                        CoordinateKind::IlrSingle
                    } else {
                        CoordinateKind::IlrMulti
                    };
                }
                _ => {}
            }
        }
        unreachable!("transformed index out of range")
    }

    /// The natural parameter index a transformed coordinate maps to 1:1,
    /// if any.
    pub fn natural_index(&self, transformed_index: usize) -> Option<usize> {
        for entry in &self.entries {
            match entry {
                Entry::Identity {
                    natural,
                    transformed,
                }
                | Entry::Log {
                    natural,
                    transformed,
                } if *transformed == transformed_index => return Some(*natural),
                Entry::Ilr {
                    natural,
                    transformed,
                    ..
                } if transformed.len() == 1 && transformed[0] == transformed_index => {
                    return Some(natural[0])
                }
                _ => {}
            }
        }
        None
    }

    /// Translates a transformed-scale value of a 1:1-mapped coordinate back
    /// to the natural scale.
    pub fn back_transform_coordinate(&self, transformed_index: usize, value: f64) -> Option<f64> {
        match self.coordinate_kind(transformed_index) {
            CoordinateKind::Identity => Some(value),
            CoordinateKind::Log => Some(value.exp()),
            CoordinateKind::IlrSingle => Some(invilr(&[value])[0]),
            CoordinateKind::IlrMulti => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilr_round_trip() {
        let x = [0.1, 0.3, 0.15, 0.45];
        let z = ilr(&x);
        assert_eq!(z.len(), 3);
        let back = invilr(&z);
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-12, "{} vs {}", a, b);
        }
    }

    #[test]
    fn invilr_is_always_on_the_simplex() {
        for z in [
            vec![0.0],
            vec![50.0],
            vec![-50.0],
            vec![3.0, -7.0],
            vec![100.0, -100.0, 42.0],
        ] {
            let x = invilr(&z);
            let sum: f64 = x.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert!(x.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn uniform_simplex_maps_to_origin() {
        let z = ilr(&[0.25; 4]);
        for v in z {
            assert!(v.abs() < 1e-12);
        }
    }
}
