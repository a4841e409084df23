use super::config::PairSettings;
use super::error::EngineError;
use super::evaluator::SplitRangeEvaluator;
use super::kspace::{GlobalEwaldParams, KspaceSolver};
use super::respa::{RespaCutoffs, RespaDecomposer};
use super::restart;
use crate::core::forcefield::params::{
    CoeffCommand, PairCoeffs, ParameterTable, TypePairParams,
};
use crate::core::forcefield::potentials::{EwaldParams, KernelModes, RealSpaceKernel};
use crate::core::forcefield::special::SpecialBonds;
use crate::core::forcefield::table::InterpolationTable;
use std::fmt;
use std::io::{Read, Write};
use tracing::{info, instrument};

/// Capability interface of a pair style: coefficient assignment, resolution, validation,
/// initialisation into an evaluator, and checkpointing.
pub trait PairStyle: fmt::Debug {
    fn name(&self) -> &'static str;

    fn settings(&self) -> &PairSettings;

    fn coefficients(&self) -> &ParameterTable;

    fn ntypes(&self) -> usize {
        self.coefficients().ntypes()
    }

    fn apply_coeff(&mut self, command: &CoeffCommand) -> Result<usize, EngineError>;

    /// Parses `<i-range> <j-range> <epsilon> <sigma> [cutoff]` and applies it.
    fn coeff(&mut self, args: &[&str]) -> Result<usize, EngineError> {
        let command = CoeffCommand::parse(args, self.ntypes())?;
        self.apply_coeff(&command)
    }

    fn set_special_bonds(&mut self, special: SpecialBonds);

    fn set_respa(&mut self, respa: Option<RespaCutoffs>);

    fn resolve(&self, i: usize, j: usize) -> Result<TypePairParams, EngineError> {
        Ok(self
            .coefficients()
            .resolve(i, j, &self.settings().resolve_options())?)
    }

    /// Resolves every type pair and checks it against the collaborators; returns the dense
    /// resolved matrix.
    fn validate(
        &self,
        kspace: Option<&dyn KspaceSolver>,
    ) -> Result<Vec<TypePairParams>, EngineError>;

    fn init(&self, kspace: Option<&dyn KspaceSolver>) -> Result<SplitRangeEvaluator, EngineError>;

    fn write_restart(&self, writer: &mut dyn Write) -> Result<(), EngineError>;
}

/// 12-6 Lennard-Jones plus Coulomb with either term optionally split Ewald-style.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRangePair {
    name: &'static str,
    settings: PairSettings,
    coefficients: ParameterTable,
    special: SpecialBonds,
    respa: Option<RespaCutoffs>,
}

impl SplitRangePair {
    pub fn new(name: &'static str, settings: PairSettings, ntypes: usize) -> Self {
        Self {
            name,
            settings,
            coefficients: ParameterTable::new(ntypes),
            special: SpecialBonds::default(),
            respa: None,
        }
    }

    /// Rebuilds a style from checkpointed settings and explicit coefficients.
    ///
    /// Every type pair must resolve under the restored mixing rule; the k-space checks are left
    /// to [`PairStyle::init`].
    pub fn from_restart(
        name: &'static str,
        reader: &mut dyn Read,
        ntypes: usize,
    ) -> Result<Self, EngineError> {
        let (settings, coefficients) = restart::read_restart(reader, ntypes)?;
        coefficients.resolve_all(&settings.resolve_options())?;
        Ok(Self {
            name,
            settings,
            coefficients,
            special: SpecialBonds::default(),
            respa: None,
        })
    }

    pub fn special_bonds(&self) -> &SpecialBonds {
        &self.special
    }

    pub fn respa(&self) -> Option<&RespaCutoffs> {
        self.respa.as_ref()
    }

    /// The shortest cutoff any RESPA shortcut of pair `p` must stay inside.
    fn shortcut_limit(&self, p: &TypePairParams) -> f64 {
        match (self.settings.lj_enabled(), self.settings.coulomb_enabled()) {
            (true, true) => p.cut_lj.min(self.settings.cut_coul),
            (true, false) => p.cut_lj,
            (false, true) => self.settings.cut_coul,
            (false, false) => f64::INFINITY,
        }
    }
}

impl PairStyle for SplitRangePair {
    fn name(&self) -> &'static str {
        self.name
    }

    fn settings(&self) -> &PairSettings {
        &self.settings
    }

    fn coefficients(&self) -> &ParameterTable {
        &self.coefficients
    }

    fn apply_coeff(&mut self, command: &CoeffCommand) -> Result<usize, EngineError> {
        let coeffs = PairCoeffs::new(
            command.epsilon,
            command.sigma,
            command.cutoff.unwrap_or(self.settings.cut_lj_global),
        )?;
        Ok(self.coefficients.set_range(command.i, command.j, coeffs)?)
    }

    fn set_special_bonds(&mut self, special: SpecialBonds) {
        self.special = special;
    }

    fn set_respa(&mut self, respa: Option<RespaCutoffs>) {
        self.respa = respa;
    }

    fn validate(
        &self,
        kspace: Option<&dyn KspaceSolver>,
    ) -> Result<Vec<TypePairParams>, EngineError> {
        if self.settings.requires_kspace() && kspace.is_none() {
            return Err(EngineError::MissingKspace { what: "g_ewald" });
        }
        if self.settings.dispersion_long() && kspace.and_then(|k| k.g_ewald_6()).is_none() {
            return Err(EngineError::MissingKspace { what: "g_ewald_6" });
        }

        let params = self
            .coefficients
            .resolve_all(&self.settings.resolve_options())?;

        if let Some(respa) = &self.respa {
            let outermost = respa.outermost();
            let n = self.ntypes();
            for i in 1..=n {
                for j in i..=n {
                    let cutoff = self.shortcut_limit(&params[(i - 1) * n + (j - 1)]);
                    if cutoff < outermost {
                        return Err(EngineError::RespaCutoff {
                            i,
                            j,
                            cutoff,
                            respa: outermost,
                        });
                    }
                }
            }
        }
        Ok(params)
    }

    #[instrument(skip_all, name = "pair_init", fields(style = self.name))]
    fn init(&self, kspace: Option<&dyn KspaceSolver>) -> Result<SplitRangeEvaluator, EngineError> {
        let params = self.validate(kspace)?;
        let settings = &self.settings;

        let ewald = EwaldParams {
            g_ewald: kspace.map_or(0.0, |k| k.g_ewald()),
            g_ewald_6: kspace.and_then(|k| k.g_ewald_6()).unwrap_or(0.0),
        };
        let global = GlobalEwaldParams {
            ewald,
            cut_coul: settings.cut_coul,
            cut_lj_global: settings.cut_lj_global,
            coulomb_long: settings.coulomb_enabled(),
            dispersion_long: settings.dispersion_long(),
        };

        let coulomb_table = if settings.coulomb_enabled() && settings.table.is_enabled() {
            Some(InterpolationTable::coulomb(
                &settings.table,
                settings.cut_coul,
                settings.qqrd2e,
                ewald.g_ewald,
            )?)
        } else {
            None
        };
        let dispersion_settings = settings.dispersion_table();
        let dispersion_table = if settings.dispersion_long() && dispersion_settings.is_enabled() {
            Some(InterpolationTable::dispersion(
                &dispersion_settings,
                settings.cut_lj_global,
                ewald.g_ewald_6,
            )?)
        } else {
            None
        };

        let kernel = RealSpaceKernel {
            ewald,
            special: self.special,
            qqrd2e: settings.qqrd2e,
            modes: KernelModes {
                coulomb: settings.coulomb_enabled(),
                dispersion_long: settings.dispersion_long(),
                lj: settings.lj_enabled(),
            },
        };

        info!(
            ntypes = self.ntypes(),
            coulomb = %settings.coulomb,
            dispersion = %settings.dispersion,
            g_ewald = ewald.g_ewald,
            tabulated = coulomb_table.is_some(),
            respa = self.respa.is_some(),
            "Pair style initialised."
        );

        Ok(SplitRangeEvaluator::new(
            settings.clone(),
            self.ntypes(),
            params,
            global,
            kernel,
            coulomb_table,
            dispersion_table,
            self.respa.map(RespaDecomposer::new),
        ))
    }

    fn write_restart(&self, writer: &mut dyn Write) -> Result<(), EngineError> {
        restart::write_restart(writer, &self.settings, &self.coefficients)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::ParameterError;
    use crate::engine::config::{InteractionMode, PairSettingsBuilder};
    use crate::engine::kspace::EwaldSplitting;
    use std::io::Cursor;

    fn settings(dispersion: InteractionMode) -> PairSettings {
        let mut builder = PairSettingsBuilder::new()
            .dispersion(dispersion)
            .cut_lj(10.0);
        if dispersion != InteractionMode::Long {
            builder = builder.cut_coul(8.0);
        }
        builder.build().unwrap()
    }

    fn two_type_pair(dispersion: InteractionMode) -> SplitRangePair {
        let mut pair = SplitRangePair::new("lj/long/coul/long", settings(dispersion), 2);
        pair.coeff(&["1", "1", "0.1", "3.0"]).unwrap();
        pair.coeff(&["2", "2", "0.2", "3.5", "9.0"]).unwrap();
        pair
    }

    fn kspace() -> EwaldSplitting {
        EwaldSplitting::new(0.3, Some(0.25))
    }

    #[test]
    fn coeff_uses_global_cutoff_when_omitted() {
        let pair = two_type_pair(InteractionMode::Cut);
        let c11 = pair.coefficients().explicit(1, 1).unwrap().unwrap();
        let c22 = pair.coefficients().explicit(2, 2).unwrap().unwrap();
        assert_eq!(c11.cutoff, 10.0);
        assert_eq!(c22.cutoff, 9.0);
    }

    #[test]
    fn coeff_over_wildcard_range_counts_pairs() {
        let mut pair = SplitRangePair::new("lj/long/coul/long", settings(InteractionMode::Cut), 3);
        assert_eq!(pair.coeff(&["*", "*", "0.1", "3.0"]).unwrap(), 6);
        assert!(matches!(
            pair.coeff(&["1", "1", "-0.1", "3.0"]),
            Err(EngineError::Parameter { .. })
        ));
    }

    #[test]
    fn validate_requires_kspace_for_long_range_terms() {
        let pair = two_type_pair(InteractionMode::Cut);
        assert!(matches!(
            pair.validate(None),
            Err(EngineError::MissingKspace { what: "g_ewald" })
        ));
    }

    #[test]
    fn validate_requires_dispersion_splitting_when_dispersion_is_long() {
        let pair = two_type_pair(InteractionMode::Long);
        let coulomb_only = EwaldSplitting::new(0.3, None);
        assert!(matches!(
            pair.validate(Some(&coulomb_only)),
            Err(EngineError::MissingKspace { what: "g_ewald_6" })
        ));
    }

    #[test]
    fn validate_without_long_range_terms_needs_no_kspace() {
        let settings = PairSettingsBuilder::new()
            .dispersion(InteractionMode::Cut)
            .coulomb(InteractionMode::Off)
            .cut_lj(2.5)
            .build()
            .unwrap();
        let mut pair = SplitRangePair::new("lj/long/coul/long", settings, 1);
        pair.coeff(&["1", "1", "1.0", "1.0"]).unwrap();
        assert!(pair.validate(None).is_ok());
    }

    #[test]
    fn validate_fails_when_a_pair_is_missing_coefficients() {
        let mut pair = SplitRangePair::new("lj/long/coul/long", settings(InteractionMode::Cut), 2);
        pair.coeff(&["1", "1", "0.1", "3.0"]).unwrap();
        assert!(matches!(
            pair.validate(Some(&kspace())),
            Err(EngineError::Parameter { .. })
        ));
    }

    #[test]
    fn validate_rejects_respa_shell_beyond_pair_cutoff() {
        let mut pair = two_type_pair(InteractionMode::Cut);
        pair.set_respa(Some(RespaCutoffs::new([2.0, 3.0], Some([7.0, 8.5])).unwrap()));
        match pair.validate(Some(&kspace())) {
            Err(EngineError::RespaCutoff { cutoff, respa, .. }) => {
                assert_eq!(cutoff, 8.0);
                assert_eq!(respa, 8.5);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        pair.set_respa(Some(RespaCutoffs::new([2.0, 3.0], Some([6.0, 8.0])).unwrap()));
        assert!(pair.validate(Some(&kspace())).is_ok());
    }

    #[test]
    fn dispersion_long_forces_mixing_and_global_cutoff() {
        let mut pair = two_type_pair(InteractionMode::Long);
        pair.coeff(&["1", "2", "5.0", "5.0", "4.0"]).unwrap();
        let p12 = pair.resolve(1, 2).unwrap();
        assert!(!p12.explicit);
        assert_eq!(p12.cut_lj, 10.0);
        assert_eq!(p12.sigma, 3.25);
    }

    #[test]
    fn init_builds_tables_as_configured() {
        let pair = two_type_pair(InteractionMode::Long);
        let evaluator = pair.init(Some(&kspace())).unwrap();
        assert!(evaluator.coulomb_table().is_some());
        assert!(evaluator.dispersion_table().is_none());
        assert_eq!(evaluator.global().order(), 0x42);

        let mut untabulated = pair.clone();
        untabulated.settings.table.bits = 0;
        let evaluator = untabulated.init(Some(&kspace())).unwrap();
        assert!(evaluator.coulomb_table().is_none());
    }

    #[test]
    fn init_propagates_table_failures() {
        let mut pair = two_type_pair(InteractionMode::Cut);
        pair.settings.table.bits = 2;
        assert!(matches!(
            pair.init(Some(&kspace())),
            Err(EngineError::Table { .. })
        ));
    }

    #[test]
    fn restart_round_trip_restores_style() {
        let mut pair = two_type_pair(InteractionMode::Cut);
        pair.coeff(&["1", "2", "0.15", "3.2", "9.5"]).unwrap();
        let mut buffer = Vec::new();
        pair.write_restart(&mut buffer).unwrap();

        let restored =
            SplitRangePair::from_restart("lj/long/coul/long", &mut Cursor::new(buffer), 2).unwrap();
        assert_eq!(restored.settings(), pair.settings());
        assert_eq!(restored.coefficients(), pair.coefficients());
        assert_eq!(
            restored.validate(Some(&kspace())).unwrap(),
            pair.validate(Some(&kspace())).unwrap()
        );
    }

    #[test]
    fn restart_with_unresolvable_pair_is_rejected_on_load() {
        let mut pair = SplitRangePair::new("lj/long/coul/long", settings(InteractionMode::Cut), 2);
        pair.coeff(&["1", "1", "0.1", "3.0"]).unwrap();
        let mut buffer = Vec::new();
        pair.write_restart(&mut buffer).unwrap();

        let err = SplitRangePair::from_restart("lj/long/coul/long", &mut Cursor::new(buffer), 2)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Parameter {
                source: ParameterError::MissingCoefficients { k: 2, .. }
            }
        ));
    }
}
