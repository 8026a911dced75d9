//! Closed-form concentration-time functions for parent-only kinetics.
//!
//! Each function maps a vector of non-negative (not necessarily sorted)
//! times to the same-length vector of concentrations. Negative rate
//! constants are undefined territory; positivity is the caller's business
//! and is normally guaranteed by the parameter transformation layer.

/// Single first-order: `c0 * exp(-k t)`.
pub fn sfo(t: &[f64], c0: f64, k: f64) -> Vec<f64> {
    t.iter().map(|&t| c0 * (-k * t).exp()).collect()
}

/// First-order multi-compartment: `c0 * (t/beta + 1)^-alpha`.
pub fn fomc(t: &[f64], c0: f64, alpha: f64, beta: f64) -> Vec<f64> {
    t.iter()
        .map(|&t| c0 * (t / beta + 1.0).powf(-alpha))
        .collect()
}

/// Indeterminate-order rate equation:
/// `c0 * (1 + (n - 1) k c0^(n-1) t)^(1/(1-n))`.
pub fn iore(t: &[f64], c0: f64, k: f64, n: f64) -> Vec<f64> {
    t.iter()
        .map(|&t| {
            (c0.powf(1.0 - n) + (n - 1.0) * k * t).powf(1.0 / (1.0 - n))
        })
        .collect()
}

/// Double first-order in parallel:
/// `c0 (g exp(-k1 t) + (1-g) exp(-k2 t))`.
pub fn dfop(t: &[f64], c0: f64, k1: f64, k2: f64, g: f64) -> Vec<f64> {
    t.iter()
        .map(|&t| c0 * (g * (-k1 * t).exp() + (1.0 - g) * (-k2 * t).exp()))
        .collect()
}

/// Hockey-stick: rate `k1` up to the breakpoint `tb`, `k2` thereafter,
/// continuous at `tb`.
pub fn hs(t: &[f64], c0: f64, k1: f64, k2: f64, tb: f64) -> Vec<f64> {
    t.iter()
        .map(|&t| {
            if t <= tb {
                c0 * (-k1 * t).exp()
            } else {
                c0 * (-k1 * tb).exp() * (-k2 * (t - tb)).exp()
            }
        })
        .collect()
}

/// Single first-order reversible binding, observed total (free plus bound)
/// for a system starting with everything in the free form. The two decay
/// rates are the eigenvalues of the 2x2 free/bound transfer matrix.
pub fn sforb(t: &[f64], c0: f64, k_free_bound: f64, k_bound_free: f64, k_out: f64) -> Vec<f64> {
    let s = k_free_bound + k_bound_free + k_out;
    let sqrt_exp = (0.25 * s * s - k_out * k_bound_free).sqrt();
    let b1 = 0.5 * s + sqrt_exp;
    let b2 = 0.5 * s - sqrt_exp;
    let kb = k_free_bound + k_bound_free;
    t.iter()
        .map(|&t| {
            c0 * (((kb - b1) / (b2 - b1)) * (-b1 * t).exp()
                + ((kb - b2) / (b1 - b2)) * (-b2 * t).exp())
        })
        .collect()
}

/// Logistic-growth-shaped decline with parameters `kmax`, `k0`, `r`.
pub fn logistic(t: &[f64], c0: f64, kmax: f64, k0: f64, r: f64) -> Vec<f64> {
    t.iter()
        .map(|&t| c0 * (kmax / (kmax - k0 + k0 * (r * t).exp())).powf(kmax / r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sfo_at_zero_is_exactly_c0() {
        let c = sfo(&[0.0], 100.0, 0.3);
        assert_eq!(c[0], 100.0);
    }

    #[test]
    fn sfo_decays() {
        let c = sfo(&[0.0, 1.0, 2.0], 100.0, 0.1);
        assert!((c[1] - 100.0 * (-0.1f64).exp()).abs() < 1e-12);
        assert!(c[0] > c[1] && c[1] > c[2]);
    }

    #[test]
    fn hs_is_continuous_at_breakpoint() {
        let tb = 5.0;
        let eps = 1e-9;
        let c = hs(&[tb - eps, tb, tb + eps], 100.0, 0.2, 0.05, tb);
        assert!((c[0] - c[1]).abs() < 1e-6);
        assert!((c[2] - c[1]).abs() < 1e-6);
    }

    #[test]
    fn dfop_with_g_one_degenerates_to_sfo() {
        let times = [0.0, 1.0, 3.0, 7.0, 14.0];
        let a = dfop(&times, 100.0, 0.2, 0.01, 1.0);
        let b = sfo(&times, 100.0, 0.2);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn iore_with_order_near_one_approaches_sfo() {
        let times = [0.0, 1.0, 5.0, 10.0];
        let k = 0.1;
        let a = iore(&times, 100.0, k * 100.0f64.powf(1.0 - 1.0001), 1.0001);
        let b = sfo(&times, 100.0, k);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() / y < 1e-2);
        }
    }

    #[test]
    fn sforb_starts_at_c0_and_loses_mass() {
        let c = sforb(&[0.0, 1.0, 10.0, 100.0], 100.0, 0.1, 0.02, 0.3);
        assert!((c[0] - 100.0).abs() < 1e-10);
        assert!(c[1] < 100.0);
        assert!(c[3] < c[2]);
    }

    #[test]
    fn logistic_initial_rate_is_k0() {
        let c = logistic(&[0.0, 1e-6], 100.0, 0.5, 0.05, 0.2);
        assert!((c[0] - 100.0).abs() < 1e-10);
        let slope = (c[1] - c[0]) / 1e-6;
        assert!((slope + 0.05 * 100.0).abs() < 1e-3);
    }

    #[test]
    fn unsorted_times_are_respected() {
        let c = sfo(&[10.0, 0.0, 5.0], 50.0, 0.2);
        assert!((c[1] - 50.0).abs() < 1e-12);
        assert!(c[0] < c[2]);
    }
}
