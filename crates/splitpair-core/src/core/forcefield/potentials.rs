//! Closed-form real-space kernels.
//!
//! Every kernel returns a [`PairTerm`] whose `force` is `-r dE/dr` (force times distance);
//! callers obtain the force divided by distance by multiplying the summed terms with `1/r^2`
//! once per pair.

use super::params::TypePairParams;
use super::special::SpecialBonds;

/// Coulomb conversion constant in kcal·Å/(mol·e²).
pub const COULOMB_CONSTANT: f64 = 332.0637;

/// `2 / sqrt(pi)`.
pub const EWALD_F: f64 = 1.128_379_17;
/// Coefficients of the Abramowitz-Stegun 7.1.26 expansion of `erfc`.
pub const EWALD_P: f64 = 0.327_591_1;
pub const A1: f64 = 0.254_829_592;
pub const A2: f64 = -0.284_496_736;
pub const A3: f64 = 1.421_413_741;
pub const A4: f64 = -1.453_152_027;
pub const A5: f64 = 1.061_405_429;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairTerm {
    pub force: f64,
    pub energy: f64,
}

impl PairTerm {
    pub const ZERO: PairTerm = PairTerm {
        force: 0.0,
        energy: 0.0,
    };
}

/// Ewald splitting parameters supplied by the reciprocal-space solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EwaldParams {
    pub g_ewald: f64,
    pub g_ewald_6: f64,
}

/// Screened real-space Coulomb of one pair with unit special factor.
///
/// `prefactor` is `qqrd2e * qi * qj`. Both outputs come from one evaluation of the
/// rational `erfc` expansion and a single `exp`.
#[inline]
pub fn ewald_real_space(rsq: f64, prefactor: f64, g_ewald: f64) -> PairTerm {
    let r = rsq.sqrt();
    let x = g_ewald * r;
    let t = 1.0 / (1.0 + EWALD_P * x);
    let s = prefactor * g_ewald * (-x * x).exp();
    let energy = t * ((((t * A5 + A4) * t + A3) * t + A2) * t + A1) * s / x;
    PairTerm {
        force: energy + EWALD_F * s,
        energy,
    }
}

/// Screened real-space Coulomb with the unscreened excess of a bonded pair removed.
///
/// The reciprocal-space sum contains every pair in full, so a pair scaled by `factor_coul`
/// must lose `(1 - factor_coul)` of the bare `1/r` interaction, not a fraction of the screened one.
#[inline]
pub fn coulomb_long(rsq: f64, prefactor: f64, g_ewald: f64, factor_coul: f64) -> PairTerm {
    let screened = ewald_real_space(rsq, prefactor, g_ewald);
    let excluded = prefactor * (1.0 - factor_coul) / rsq.sqrt();
    PairTerm {
        force: screened.force - excluded,
        energy: screened.energy - excluded,
    }
}

/// Bare `1/r` Coulomb scaled by the special factor.
#[inline]
pub fn coulomb_plain(rsq: f64, prefactor: f64, factor_coul: f64) -> PairTerm {
    let e = factor_coul * prefactor / rsq.sqrt();
    PairTerm {
        force: e,
        energy: e,
    }
}

/// Truncated 12-6 Lennard-Jones with the optional energy shift, scaled by the special factor.
#[inline]
pub fn lj_cut(rsq: f64, p: &TypePairParams, factor_lj: f64) -> PairTerm {
    let r2inv = 1.0 / rsq;
    let rn = r2inv * r2inv * r2inv;
    PairTerm {
        force: factor_lj * rn * (rn * p.lj1 - p.lj2),
        energy: factor_lj * (rn * (rn * p.lj3 - p.lj4) - p.offset),
    }
}

/// Damped real-space dispersion per unit dispersion coefficient `B`.
///
/// Returns the Gaussian-damped `-B/r^6` contribution with the sign removed, i.e.
/// `force = e^{-x}(6 + 6x + 3x^2 + x^3)/r^6` and `energy = e^{-x}(1 + x + x^2/2)/r^6`
/// with `x = g_ewald_6^2 r^2`.
#[inline]
pub fn dispersion_damped_unit(rsq: f64, g_ewald_6: f64) -> PairTerm {
    let g2 = g_ewald_6 * g_ewald_6;
    let g6 = g2 * g2 * g2;
    let g8 = g6 * g2;
    let x2 = g2 * rsq;
    let a2 = 1.0 / x2;
    let damp = a2 * (-x2).exp();
    PairTerm {
        force: g8 * (((6.0 * a2 + 6.0) * a2 + 3.0) * a2 + 1.0) * damp * rsq,
        energy: g6 * ((a2 + 1.0) * a2 + 0.5) * damp,
    }
}

/// Repulsion plus split dispersion, given the already damped part (per unit `B`).
///
/// A bonded pair keeps `factor_lj` of the repulsion and gets `(1 - factor_lj)` of the bare
/// attraction added back, mirroring the Coulomb exclusion.
#[inline]
pub fn lj_long_with_damped(
    rsq: f64,
    p: &TypePairParams,
    factor_lj: f64,
    damped: PairTerm,
) -> PairTerm {
    let r2inv = 1.0 / rsq;
    let rn = r2inv * r2inv * r2inv;
    let rn2 = rn * rn;
    let t = rn * (1.0 - factor_lj);
    PairTerm {
        force: factor_lj * rn2 * p.lj1 - p.lj4 * damped.force + t * p.lj2,
        energy: factor_lj * rn2 * p.lj3 - p.lj4 * damped.energy + t * p.lj4,
    }
}

#[inline]
pub fn lj_long(rsq: f64, p: &TypePairParams, g_ewald_6: f64, factor_lj: f64) -> PairTerm {
    lj_long_with_damped(rsq, p, factor_lj, dispersion_damped_unit(rsq, g_ewald_6))
}

/// Which form each interaction takes inside [`RealSpaceKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelModes {
    pub coulomb: bool,
    pub dispersion_long: bool,
    pub lj: bool,
}

/// Closed-form evaluation of the complete pair interaction, without cutoffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealSpaceKernel {
    pub ewald: EwaldParams,
    pub special: SpecialBonds,
    pub qqrd2e: f64,
    pub modes: KernelModes,
}

impl RealSpaceKernel {
    pub fn coulomb(&self, rsq: f64, qi: f64, qj: f64, factor_coul: f64) -> PairTerm {
        coulomb_long(rsq, self.qqrd2e * qi * qj, self.ewald.g_ewald, factor_coul)
    }

    pub fn lj(&self, rsq: f64, p: &TypePairParams, factor_lj: f64) -> PairTerm {
        if self.modes.dispersion_long {
            lj_long(rsq, p, self.ewald.g_ewald_6, factor_lj)
        } else {
            lj_cut(rsq, p, factor_lj)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{
        MixingRule, PairCoeffs, ParameterTable, ResolveOptions,
    };
    use approx::assert_relative_eq;
    use statrs::function::erf::erfc;

    fn lj_params(epsilon: f64, sigma: f64, cutoff: f64) -> TypePairParams {
        let mut table = ParameterTable::new(1);
        table
            .set(1, 1, PairCoeffs::new(epsilon, sigma, cutoff).unwrap())
            .unwrap();
        table
            .resolve(
                1,
                1,
                &ResolveOptions {
                    mixing: MixingRule::Arithmetic,
                    cut_lj_global: cutoff,
                    cut_coul: None,
                    force_mixing: false,
                    shift_energy: false,
                },
            )
            .unwrap()
    }

    fn assert_force_is_energy_derivative(term: impl Fn(f64) -> PairTerm, radii: &[f64]) {
        for &r in radii {
            let h = 1e-6 * r;
            let e_plus = term((r + h) * (r + h)).energy;
            let e_minus = term((r - h) * (r - h)).energy;
            let numeric = -(e_plus - e_minus) / (2.0 * h);
            let analytic = term(r * r).force / r;
            let scale = analytic.abs().max(1e-3);
            assert!(
                (analytic - numeric).abs() <= 1e-4 * scale,
                "r = {}: analytic {} vs numeric {}",
                r,
                analytic,
                numeric
            );
        }
    }

    fn radii(from: f64, to: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|k| from + (to - from) * k as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn ewald_real_space_matches_reference_erfc() {
        let g = 0.3;
        for r in [0.5, 1.0, 2.0, 3.5, 6.0] {
            let term = ewald_real_space(r * r, 1.0, g);
            let expected_energy = erfc(g * r) / r;
            let expected_force = erfc(g * r) / r + EWALD_F * g * (-(g * r) * (g * r)).exp();
            assert_relative_eq!(term.energy, expected_energy, epsilon = 4e-7);
            assert_relative_eq!(term.force, expected_force, epsilon = 4e-7);
        }
    }

    #[test]
    fn coulomb_long_unit_charges_at_unit_distance_matches_closed_form() {
        let g: f64 = 0.3;
        let term = coulomb_long(1.0, 1.0, g, 1.0);
        let expected = erfc(0.3) + 2.0 * g / std::f64::consts::PI.sqrt() * (-0.09_f64).exp();
        assert_relative_eq!(term.force, expected, max_relative = 1e-6);
    }

    #[test]
    fn coulomb_long_fully_excluded_pair_removes_bare_coulomb() {
        let g = 0.3;
        let full = ewald_real_space(1.0, 1.0, g);
        let excluded = coulomb_long(1.0, 1.0, g, 0.0);
        assert_relative_eq!(excluded.force, full.force - 1.0, epsilon = 1e-14);
        assert_relative_eq!(excluded.energy, full.energy - 1.0, epsilon = 1e-14);
    }

    #[test]
    fn coulomb_long_partial_factor_subtracts_fraction_of_bare_term() {
        let rsq = 4.0;
        let full = ewald_real_space(rsq, 2.0, 0.25);
        let scaled = coulomb_long(rsq, 2.0, 0.25, 0.5);
        assert_relative_eq!(scaled.force, full.force - 0.5 * 2.0 / 2.0, epsilon = 1e-14);
    }

    #[test]
    fn lj_cut_force_vanishes_at_potential_minimum() {
        let p = lj_params(1.0, 1.0, 2.5);
        let r: f64 = 1.122462;
        let term = lj_cut(r * r, &p, 1.0);
        assert!(term.force.abs() < 1e-5, "force at minimum: {}", term.force);
        assert_relative_eq!(term.energy, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn lj_cut_special_factor_scales_and_excludes() {
        let p = lj_params(0.5, 1.2, 5.0);
        let full = lj_cut(2.0, &p, 1.0);
        let excluded = lj_cut(2.0, &p, 0.0);
        let half = lj_cut(2.0, &p, 0.5);
        assert_eq!(excluded, PairTerm::ZERO);
        assert_relative_eq!(half.force, 0.5 * full.force, epsilon = 1e-14);
        assert_relative_eq!(half.energy, 0.5 * full.energy, epsilon = 1e-14);
    }

    #[test]
    fn lj_long_far_beyond_splitting_length_is_pure_repulsion() {
        // At large g*r the damped dispersion is negligible, leaving the r^-12 repulsion.
        let p = lj_params(1.0, 1.0, 10.0);
        let rsq: f64 = 36.0;
        let term = lj_long(rsq, &p, 2.0, 1.0);
        let rn = 1.0 / rsq.powi(3);
        assert_relative_eq!(term.force, rn * rn * p.lj1, max_relative = 1e-10);
        assert_relative_eq!(term.energy, rn * rn * p.lj3, max_relative = 1e-10);
    }

    #[test]
    fn lj_long_small_splitting_parameter_recovers_full_dispersion() {
        let p = lj_params(0.7, 1.1, 10.0);
        let rsq: f64 = 1.7;
        let term = lj_long(rsq, &p, 1e-4, 1.0);
        let plain = lj_cut(rsq, &p, 1.0);
        assert_relative_eq!(term.force, plain.force, max_relative = 1e-6);
        assert_relative_eq!(term.energy, plain.energy, max_relative = 1e-6);
    }

    #[test]
    fn lj_long_exclusion_adds_back_bare_attraction() {
        let p = lj_params(0.7, 1.1, 10.0);
        let rsq = 2.3;
        let full = lj_long(rsq, &p, 0.3, 1.0);
        let excluded = lj_long(rsq, &p, 0.3, 0.0);
        let rn = 1.0 / (rsq * rsq * rsq);
        let repulsion_force = rn * rn * p.lj1;
        let repulsion_energy = rn * rn * p.lj3;
        assert_relative_eq!(
            excluded.force,
            full.force - repulsion_force + rn * p.lj2,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            excluded.energy,
            full.energy - repulsion_energy + rn * p.lj4,
            max_relative = 1e-12
        );
    }

    #[test]
    fn kernel_forces_are_negative_energy_derivatives() {
        let p = lj_params(0.8, 1.0, 10.0);
        let rs = radii(0.95, 4.0, 32);

        assert_force_is_energy_derivative(|rsq| lj_cut(rsq, &p, 1.0), &rs);
        assert_force_is_energy_derivative(|rsq| lj_long(rsq, &p, 0.35, 1.0), &rs);
        assert_force_is_energy_derivative(|rsq| lj_long(rsq, &p, 0.35, 0.5), &rs);
        assert_force_is_energy_derivative(|rsq| coulomb_long(rsq, 1.0, 0.3, 1.0), &rs);
        assert_force_is_energy_derivative(|rsq| coulomb_long(rsq, -1.0, 0.3, 0.5), &rs);
        assert_force_is_energy_derivative(|rsq| coulomb_plain(rsq, 1.0, 1.0), &rs);
    }

    #[test]
    fn kernel_dispatches_lj_on_dispersion_mode() {
        let p = lj_params(0.8, 1.0, 10.0);
        let mut kernel = RealSpaceKernel {
            ewald: EwaldParams {
                g_ewald: 0.3,
                g_ewald_6: 0.3,
            },
            special: SpecialBonds::default(),
            qqrd2e: 2.0,
            modes: KernelModes {
                coulomb: true,
                dispersion_long: false,
                lj: true,
            },
        };
        let rsq = 2.0;
        assert_eq!(kernel.lj(rsq, &p, 0.5), lj_cut(rsq, &p, 0.5));
        assert_eq!(kernel.coulomb(rsq, 1.0, -1.0, 1.0), coulomb_long(rsq, -2.0, 0.3, 1.0));

        kernel.modes.dispersion_long = true;
        assert_eq!(kernel.lj(rsq, &p, 0.5), lj_long(rsq, &p, 0.3, 0.5));
    }
}
