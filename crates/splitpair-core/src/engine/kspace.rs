use crate::core::forcefield::params::{MixingRule, TypePairParams};
use crate::core::forcefield::potentials::EwaldParams;
use crate::core::io::input::KspaceInput;

/// The reciprocal-space solver as seen from the pair kernel.
///
/// It supplies the splitting parameters at initialisation and may consume the resolved
/// cutoffs and dispersion coefficients afterwards.
pub trait KspaceSolver {
    fn g_ewald(&self) -> f64;

    /// Splitting parameter for dispersion; `None` if the solver handles Coulomb only.
    fn g_ewald_6(&self) -> Option<f64> {
        None
    }

    fn accept_exports(&mut self, _exports: &LongRangeExports) {}
}

/// Fixed splitting parameters, as chosen by a solver that has already been set up.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EwaldSplitting {
    pub g_ewald: f64,
    pub g_ewald_6: Option<f64>,
    exports: Option<LongRangeExports>,
}

impl EwaldSplitting {
    pub fn new(g_ewald: f64, g_ewald_6: Option<f64>) -> Self {
        Self {
            g_ewald,
            g_ewald_6,
            exports: None,
        }
    }

    pub fn exports(&self) -> Option<&LongRangeExports> {
        self.exports.as_ref()
    }
}

impl From<KspaceInput> for EwaldSplitting {
    fn from(input: KspaceInput) -> Self {
        Self::new(input.g_ewald, input.g_ewald_6)
    }
}

impl KspaceSolver for EwaldSplitting {
    fn g_ewald(&self) -> f64 {
        self.g_ewald
    }

    fn g_ewald_6(&self) -> Option<f64> {
        self.g_ewald_6
    }

    fn accept_exports(&mut self, exports: &LongRangeExports) {
        self.exports = Some(exports.clone());
    }
}

/// Splitting parameters fixed at initialisation together with the cutoffs they pair with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalEwaldParams {
    pub ewald: EwaldParams,
    pub cut_coul: f64,
    pub cut_lj_global: f64,
    pub coulomb_long: bool,
    pub dispersion_long: bool,
}

impl GlobalEwaldParams {
    /// Bitmask with bit 1 set for split Coulomb and bit 6 for split dispersion.
    pub fn order(&self) -> i32 {
        (i32::from(self.coulomb_long) << 1) | (i32::from(self.dispersion_long) << 6)
    }
}

/// What the pair style hands to the reciprocal-space solver after initialisation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LongRangeExports {
    pub cut_coul: f64,
    pub cut_lj_global: f64,
    pub mixing: MixingRule,
    pub coulomb_long: bool,
    pub dispersion_long: bool,
    ntypes: usize,
    epsilon: Vec<f64>,
    sigma: Vec<f64>,
    dispersion: Vec<f64>,
}

impl LongRangeExports {
    pub(crate) fn new(
        global: &GlobalEwaldParams,
        mixing: MixingRule,
        ntypes: usize,
        params: &[TypePairParams],
    ) -> Self {
        Self {
            cut_coul: global.cut_coul,
            cut_lj_global: global.cut_lj_global,
            mixing,
            coulomb_long: global.coulomb_long,
            dispersion_long: global.dispersion_long,
            ntypes,
            epsilon: params.iter().map(|p| p.epsilon).collect(),
            sigma: params.iter().map(|p| p.sigma).collect(),
            dispersion: params.iter().map(|p| p.lj4).collect(),
        }
    }

    pub fn ntypes(&self) -> usize {
        self.ntypes
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        let n = self.ntypes;
        ((1..=n).contains(&i) && (1..=n).contains(&j)).then(|| (i - 1) * n + (j - 1))
    }

    /// Dispersion coefficient `B_ij = 4 eps sigma^6` of a type pair.
    pub fn dispersion(&self, i: usize, j: usize) -> Option<f64> {
        self.index(i, j).map(|k| self.dispersion[k])
    }

    pub fn epsilon(&self, i: usize, j: usize) -> Option<f64> {
        self.index(i, j).map(|k| self.epsilon[k])
    }

    pub fn sigma(&self, i: usize, j: usize) -> Option<f64> {
        self.index(i, j).map(|k| self.sigma[k])
    }
}
