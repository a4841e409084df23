use crate::core::forcefield::params::{CoeffCommand, TypeRange};
use crate::core::forcefield::special::SpecialBonds;
use crate::core::io::input::{PairInput, SettingsInput};
use crate::engine::config::{ConfigError, InteractionMode, PairSettings, PairSettingsBuilder};
use crate::engine::error::EngineError;
use crate::engine::evaluator::SplitRangeEvaluator;
use crate::engine::kspace::{EwaldSplitting, KspaceSolver};
use crate::engine::pair::PairStyle;
use crate::engine::registry::StyleRegistry;
use crate::engine::respa::RespaCutoffs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// A configured style together with its initialised evaluator.
#[derive(Debug)]
pub struct PairSetup {
    pub style: Box<dyn PairStyle>,
    /// The splitting parameters, after the style's exports have been handed over.
    pub kspace: Option<EwaldSplitting>,
    pub evaluator: SplitRangeEvaluator,
}

pub fn settings_from_input(input: &SettingsInput) -> Result<PairSettings, ConfigError> {
    let mut builder = PairSettingsBuilder::new()
        .dispersion(InteractionMode::parse_field("dispersion", &input.dispersion)?)
        .coulomb(InteractionMode::parse_field("coulomb", &input.coulomb)?)
        .cut_lj(input.cut_lj)
        .mixing(input.mixing)
        .shift(input.shift)
        .newton_pair(input.newton_pair)
        .table(input.table)
        .dispersion_table_bits(input.dispersion_table_bits);
    if let Some(cut_coul) = input.cut_coul {
        builder = builder.cut_coul(cut_coul);
    }
    if let Some(qqrd2e) = input.qqrd2e {
        builder = builder.qqrd2e(qqrd2e);
    }
    builder.build()
}

/// Creates the named style and applies special bonds, RESPA shells and coefficients.
pub fn configure(
    input: &PairInput,
    registry: &StyleRegistry,
) -> Result<Box<dyn PairStyle>, EngineError> {
    let settings = settings_from_input(&input.settings)?;
    let mut style = registry.create(&input.style, settings, input.ntypes)?;

    if let Some(config) = input.special_bonds {
        style.set_special_bonds(SpecialBonds::try_from(config)?);
    }
    if let Some(respa) = input.respa {
        style.set_respa(Some(RespaCutoffs::new(respa.inner, respa.middle)?));
    }

    for coeff in &input.coeff {
        let command = CoeffCommand {
            i: TypeRange::parse(&coeff.i, input.ntypes)?,
            j: TypeRange::parse(&coeff.j, input.ntypes)?,
            epsilon: coeff.epsilon,
            sigma: coeff.sigma,
            cutoff: coeff.cutoff,
        };
        let count = style.apply_coeff(&command)?;
        debug!(i = %coeff.i, j = %coeff.j, pairs = count, "Applied pair coefficients.");
    }
    Ok(style)
}

#[instrument(skip_all, name = "setup_workflow")]
pub fn run(input: &PairInput, registry: &StyleRegistry) -> Result<PairSetup, EngineError> {
    info!(style = %input.style, ntypes = input.ntypes, "Configuring pair style.");
    let style = configure(input, registry)?;

    let mut kspace = input.kspace.map(EwaldSplitting::from);
    let evaluator = style.init(kspace.as_ref().map(|k| k as &dyn KspaceSolver))?;
    if let Some(solver) = kspace.as_mut() {
        solver.accept_exports(&evaluator.exports());
    }

    info!(
        cutoff = evaluator.max_cutoff(),
        tabulated = evaluator.coulomb_table().is_some(),
        "Pair style ready."
    );
    Ok(PairSetup {
        style,
        kspace,
        evaluator,
    })
}

/// Loads an input file and runs [`run`] on it.
pub fn load(path: &Path, registry: &StyleRegistry) -> Result<PairSetup, EngineError> {
    let input = PairInput::load(path)?;
    run(&input, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{MixingRule, ParameterError};
    use crate::core::forcefield::potentials::COULOMB_CONSTANT;
    use std::fs;
    use tempfile::tempdir;

    const INPUT: &str = r#"
ntypes = 2

[settings]
dispersion = "long"
coulomb = "long"
cut-lj = 10.0
mixing = "geometric"

[kspace]
g-ewald = 0.3
g-ewald-6 = 0.25

[special-bonds]
coul = [0.0, 0.0, 0.5]
lj = [0.0, 0.0, 0.5]

[respa]
inner = [2.0, 3.0]

[[coeff]]
i = "*"
j = "*"
epsilon = 0.1
sigma = 3.0

[[coeff]]
i = "2"
j = "2"
epsilon = 0.2
sigma = 3.5
"#;

    #[test]
    fn settings_from_input_maps_every_field() {
        let input = PairInput::parse(INPUT).unwrap();
        let settings = settings_from_input(&input.settings).unwrap();
        assert_eq!(settings.dispersion, InteractionMode::Long);
        assert_eq!(settings.cut_coul, 10.0);
        assert_eq!(settings.mixing, MixingRule::Geometric);
        assert_eq!(settings.qqrd2e, COULOMB_CONSTANT);
    }

    #[test]
    fn settings_from_input_rejects_unknown_mode() {
        let mut input = PairInput::parse(INPUT).unwrap();
        input.settings.coulomb = "ewald".to_string();
        assert!(matches!(
            settings_from_input(&input.settings),
            Err(ConfigError::UnknownMode {
                field: "coulomb",
                ..
            })
        ));
    }

    #[test]
    fn run_initialises_evaluator_and_hands_exports_to_kspace() {
        let input = PairInput::parse(INPUT).unwrap();
        let setup = run(&input, &StyleRegistry::default()).unwrap();

        assert_eq!(setup.style.name(), "lj/long/coul/long");
        assert!(setup.evaluator.respa().is_some());
        assert!(setup.evaluator.coulomb_table().is_some());
        let exports = setup.kspace.as_ref().and_then(|k| k.exports()).unwrap();
        assert_eq!(exports, &setup.evaluator.exports());
        let mixed = (0.1f64 * 0.2).sqrt() * 4.0 * (3.0f64 * 3.5).sqrt().powi(6);
        assert!((exports.dispersion(1, 2).unwrap() - mixed).abs() < 1e-9 * mixed);
    }

    #[test]
    fn run_requires_kspace_for_long_interactions() {
        let mut input = PairInput::parse(INPUT).unwrap();
        input.kspace = None;
        let err = run(&input, &StyleRegistry::default()).unwrap_err();
        assert!(matches!(err, EngineError::MissingKspace { what: "g_ewald" }));
    }

    #[test]
    fn configure_reports_bad_type_ranges() {
        let mut input = PairInput::parse(INPUT).unwrap();
        input.coeff[1].i = "3".to_string();
        let err = configure(&input, &StyleRegistry::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Parameter {
                source: ParameterError::InvalidTypeRange { .. }
            }
        ));
    }

    #[test]
    fn configure_rejects_unknown_style() {
        let mut input = PairInput::parse(INPUT).unwrap();
        input.style = "born/coul/long".to_string();
        let err = configure(&input, &StyleRegistry::default()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownStyle(_)));
    }

    #[test]
    fn load_reads_input_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pair.toml");
        fs::write(&path, INPUT).unwrap();
        let setup = load(&path, &StyleRegistry::default()).unwrap();
        assert_eq!(setup.evaluator.ntypes(), 2);

        let missing = load(&dir.path().join("missing.toml"), &StyleRegistry::default());
        assert!(matches!(missing, Err(EngineError::Input { .. })));
    }
}
