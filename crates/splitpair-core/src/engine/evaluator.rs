use super::config::PairSettings;
use super::error::EngineError;
use super::kspace::{GlobalEwaldParams, LongRangeExports};
use super::respa::{RespaDecomposer, RespaLevel};
use super::tally::Tally;
use crate::core::forcefield::params::{ParameterError, TypePairParams};
use crate::core::forcefield::potentials::{
    PairTerm, RealSpaceKernel, coulomb_plain, lj_cut, lj_long_with_damped,
};
use crate::core::forcefield::special::SpecialCode;
use crate::core::forcefield::table::InterpolationTable;
use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::neighbor::NeighborList;
use crate::core::models::particles::ParticleSystem;
use tracing::trace;

/// One neighbor pair as seen by the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRecord {
    pub itype: usize,
    pub jtype: usize,
    pub rsq: f64,
    pub qi: f64,
    pub qj: f64,
    pub code: SpecialCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairOutput {
    /// Force divided by distance, as applied to the particles.
    pub fpair: f64,
    /// Force divided by distance entering the virial.
    pub fvirial: f64,
    pub energy: EnergyTerm,
}

/// An initialised pair style: resolved coefficients, splitting parameters and tables.
///
/// Immutable once built; evaluation never allocates.
#[derive(Debug, Clone)]
pub struct SplitRangeEvaluator {
    settings: PairSettings,
    ntypes: usize,
    params: Vec<TypePairParams>,
    global: GlobalEwaldParams,
    kernel: RealSpaceKernel,
    cut_coulsq: f64,
    coulomb_table: Option<InterpolationTable>,
    dispersion_table: Option<InterpolationTable>,
    respa: Option<RespaDecomposer>,
}

impl SplitRangeEvaluator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        settings: PairSettings,
        ntypes: usize,
        params: Vec<TypePairParams>,
        global: GlobalEwaldParams,
        kernel: RealSpaceKernel,
        coulomb_table: Option<InterpolationTable>,
        dispersion_table: Option<InterpolationTable>,
        respa: Option<RespaDecomposer>,
    ) -> Self {
        let cut_coulsq = settings.cut_coul * settings.cut_coul;
        Self {
            settings,
            ntypes,
            params,
            global,
            kernel,
            cut_coulsq,
            coulomb_table,
            dispersion_table,
            respa,
        }
    }

    pub fn settings(&self) -> &PairSettings {
        &self.settings
    }

    pub fn ntypes(&self) -> usize {
        self.ntypes
    }

    pub fn global(&self) -> &GlobalEwaldParams {
        &self.global
    }

    pub fn coulomb_table(&self) -> Option<&InterpolationTable> {
        self.coulomb_table.as_ref()
    }

    pub fn dispersion_table(&self) -> Option<&InterpolationTable> {
        self.dispersion_table.as_ref()
    }

    pub fn respa(&self) -> Option<&RespaDecomposer> {
        self.respa.as_ref()
    }

    /// Resolved parameters of a 1-based type pair.
    pub fn pair_params(&self, itype: usize, jtype: usize) -> Option<&TypePairParams> {
        let n = self.ntypes;
        if (1..=n).contains(&itype) && (1..=n).contains(&jtype) {
            Some(self.params(itype, jtype))
        } else {
            None
        }
    }

    /// Types must lie in `1..=ntypes`; callers validate them beforehand.
    #[inline]
    fn params(&self, itype: usize, jtype: usize) -> &TypePairParams {
        debug_assert!(
            (1..=self.ntypes).contains(&itype) && (1..=self.ntypes).contains(&jtype),
            "type pair ({itype},{jtype}) outside 1..={}",
            self.ntypes
        );
        &self.params[(itype - 1) * self.ntypes + (jtype - 1)]
    }

    fn checked_params(&self, itype: usize, jtype: usize) -> Result<&TypePairParams, EngineError> {
        for index in [itype, jtype] {
            if !(1..=self.ntypes).contains(&index) {
                return Err(ParameterError::InvalidType {
                    index,
                    ntypes: self.ntypes,
                }
                .into());
            }
        }
        Ok(self.params(itype, jtype))
    }

    pub fn exports(&self) -> LongRangeExports {
        LongRangeExports::new(&self.global, self.settings.mixing, self.ntypes, &self.params)
    }

    /// Largest pair cutoff over all type pairs.
    pub fn max_cutoff(&self) -> f64 {
        self.params
            .iter()
            .map(|p| p.cutsq)
            .fold(0.0, f64::max)
            .sqrt()
    }

    /// Full split-range Coulomb and LJ terms, each inside its own cutoff.
    #[inline]
    fn full_terms(
        &self,
        rsq: f64,
        p: &TypePairParams,
        qi: f64,
        qj: f64,
        factor_coul: f64,
        factor_lj: f64,
    ) -> (PairTerm, PairTerm) {
        let modes = self.kernel.modes;
        let coul = if modes.coulomb && rsq < self.cut_coulsq {
            match &self.coulomb_table {
                Some(table) => {
                    let sample = table.evaluate(rsq);
                    let qiqj = qi * qj;
                    let excluded = (1.0 - factor_coul) * sample.correction;
                    PairTerm {
                        force: qiqj * (sample.force - excluded),
                        energy: qiqj * (sample.energy - excluded),
                    }
                }
                None => self.kernel.coulomb(rsq, qi, qj, factor_coul),
            }
        } else {
            PairTerm::ZERO
        };

        let lj = if modes.lj && rsq < p.cut_ljsq {
            match &self.dispersion_table {
                Some(table) if modes.dispersion_long => {
                    let sample = table.evaluate(rsq);
                    let damped = PairTerm {
                        force: sample.force,
                        energy: sample.energy,
                    };
                    lj_long_with_damped(rsq, p, factor_lj, damped)
                }
                _ => self.kernel.lj(rsq, p, factor_lj),
            }
        } else {
            PairTerm::ZERO
        };
        (coul, lj)
    }

    /// Unscreened interaction carried by the fast RESPA levels (force times `r`).
    #[inline]
    fn shortcut_force(
        &self,
        rsq: f64,
        p: &TypePairParams,
        qi: f64,
        qj: f64,
        factor_coul: f64,
        factor_lj: f64,
    ) -> f64 {
        let modes = self.kernel.modes;
        let mut force = 0.0;
        if modes.coulomb && rsq < self.cut_coulsq {
            force += coulomb_plain(rsq, self.kernel.qqrd2e * qi * qj, factor_coul).force;
        }
        if modes.lj && rsq < p.cut_ljsq {
            force += lj_cut(rsq, p, factor_lj).force;
        }
        force
    }

    /// Single-rate evaluation of one pair.
    #[inline]
    pub fn evaluate(&self, record: &PairRecord) -> PairOutput {
        self.evaluate_at(record, RespaLevel::Single)
    }

    /// Contribution of one pair to `level`.
    ///
    /// Without RESPA shells, `Outer` equals `Single` and the fast levels are empty. Both types of
    /// the record must be valid; [`compute`](Self::compute) checks them for a whole system and
    /// [`pair_params`](Self::pair_params) for a single pair.
    pub fn evaluate_at(&self, record: &PairRecord, level: RespaLevel) -> PairOutput {
        let p = self.params(record.itype, record.jtype);
        let rsq = record.rsq;
        if rsq >= p.cutsq {
            return PairOutput::default();
        }
        let special = &self.kernel.special;
        let factor_coul = special.coul(record.code);
        let factor_lj = special.lj(record.code);
        let r2inv = 1.0 / rsq;

        let respa = match (level, &self.respa) {
            (RespaLevel::Single, _) => None,
            (RespaLevel::Outer, None) => None,
            (RespaLevel::Inner | RespaLevel::Middle, None) => return PairOutput::default(),
            (_, Some(respa)) => Some(respa),
        };

        if let Some(respa) = respa.filter(|_| level != RespaLevel::Outer) {
            if respa.beyond_fast_levels(rsq) {
                return PairOutput::default();
            }
            let shortcut = self.shortcut_force(rsq, p, record.qi, record.qj, factor_coul, factor_lj);
            // The fast levels only scale the shortcut; the full force is not needed.
            let force = respa.split(level, rsq.sqrt(), 0.0, shortcut);
            return PairOutput {
                fpair: force * r2inv,
                fvirial: 0.0,
                energy: EnergyTerm::default(),
            };
        }

        let (coul, lj) = self.full_terms(rsq, p, record.qi, record.qj, factor_coul, factor_lj);
        let full = coul.force + lj.force;
        let force = match respa {
            Some(respa) if !respa.beyond_fast_levels(rsq) => {
                let shortcut =
                    self.shortcut_force(rsq, p, record.qi, record.qj, factor_coul, factor_lj);
                respa.split(RespaLevel::Outer, rsq.sqrt(), full, shortcut)
            }
            _ => full,
        };
        PairOutput {
            fpair: force * r2inv,
            fvirial: full * r2inv,
            energy: EnergyTerm::new(lj.energy, coul.energy),
        }
    }

    /// Force divided by distance and energy of one pair with arbitrary special factors.
    #[allow(clippy::too_many_arguments)]
    pub fn single(
        &self,
        itype: usize,
        jtype: usize,
        rsq: f64,
        qi: f64,
        qj: f64,
        factor_coul: f64,
        factor_lj: f64,
    ) -> Result<(f64, EnergyTerm), EngineError> {
        let p = self.checked_params(itype, jtype)?;
        if rsq >= p.cutsq {
            return Ok((0.0, EnergyTerm::default()));
        }
        let r2inv = 1.0 / rsq;
        let (coul, lj) = self.full_terms(rsq, p, qi, qj, factor_coul, factor_lj);
        Ok((
            (coul.force + lj.force) * r2inv,
            EnergyTerm::new(lj.energy, coul.energy),
        ))
    }

    /// Accumulates the forces of every listed pair at `level` into `system`.
    ///
    /// The reaction force is applied to `j` only when newton is on or `j` is owned. Energy and
    /// virial are tallied at the `Single` and `Outer` levels.
    pub fn compute(
        &self,
        system: &mut ParticleSystem,
        list: &NeighborList,
        level: RespaLevel,
        tally: &mut Tally,
    ) -> Result<(), EngineError> {
        system.check_types(self.ntypes)?;
        list.check(system)?;

        let nlocal = system.nlocal();
        let newton = self.settings.newton_pair;
        let tally_pairs =
            tally.flags().any() && matches!(level, RespaLevel::Single | RespaLevel::Outer);
        if tally_pairs {
            tally.check(system.len())?;
        }
        let mut interacting = 0usize;

        for row in list.rows() {
            let i = row.i;
            let xi = system.position(i);
            let qi = system.charge(i);
            let itype = system.itype(i);

            for (j, code) in row.neighbors() {
                let del = xi - system.position(j);
                let record = PairRecord {
                    itype,
                    jtype: system.itype(j),
                    rsq: del.norm_squared(),
                    qi,
                    qj: system.charge(j),
                    code,
                };
                if record.rsq >= self.params(itype, record.jtype).cutsq {
                    continue;
                }
                interacting += 1;

                let out = self.evaluate_at(&record, level);
                let force = del * out.fpair;
                system.add_force(i, force);
                if newton || j < nlocal {
                    system.add_force(j, -force);
                }
                if tally_pairs {
                    tally.pair(i, j, nlocal, newton, out.energy, out.fvirial, &del);
                }
            }
        }

        trace!(
            ?level,
            pairs = list.len(),
            interacting,
            "Pair forces accumulated."
        );
        Ok(())
    }
}
