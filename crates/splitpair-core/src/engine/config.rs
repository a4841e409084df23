use crate::core::forcefield::params::{MixingRule, ResolveOptions};
use crate::core::forcefield::potentials::COULOMB_CONSTANT;
use crate::core::forcefield::table::TableSettings;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Illegal pair style arguments: expected 3 or 4, got {0}")]
    ArgumentCount(usize),
    #[error("Unknown {field} mode '{value}'. Expected 'long', 'cut' or 'off'")]
    UnknownMode { field: &'static str, value: String },
    #[error("Could not parse '{value}' as a number for '{name}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Cutoff '{name}' must be positive, got {value}")]
    NonPositiveCutoff { name: &'static str, value: f64 },
    #[error("Coulombic cut not supported: Coulomb interactions must be 'long' or 'off'")]
    CoulombCutUnsupported,
    #[error("Only one cutoff allowed when requesting all long")]
    SingleCutoffForAllLong,
    #[error("Invalid RESPA shells: {0}")]
    InvalidRespaShells(String),
}

/// How one interaction is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionMode {
    /// Ewald split: real-space part here, remainder in reciprocal space.
    Long,
    /// Plain truncation at the cutoff.
    Cut,
    Off,
}

static INTERACTION_MODE_NAMES: Map<&'static str, InteractionMode> = phf_map! {
    "long" => InteractionMode::Long,
    "cut" => InteractionMode::Cut,
    "off" => InteractionMode::Off,
};

impl InteractionMode {
    pub(crate) fn parse_field(field: &'static str, value: &str) -> Result<Self, ConfigError> {
        INTERACTION_MODE_NAMES
            .get(value.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnknownMode {
                field,
                value: value.to_string(),
            })
    }
}

impl FromStr for InteractionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_field("interaction", s)
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionMode::Long => "long",
            InteractionMode::Cut => "cut",
            InteractionMode::Off => "off",
        };
        f.write_str(name)
    }
}

/// Global settings of a split-range pair style.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSettings {
    pub dispersion: InteractionMode,
    pub coulomb: InteractionMode,
    pub cut_lj_global: f64,
    pub cut_coul: f64,
    pub mixing: MixingRule,
    pub shift: bool,
    pub qqrd2e: f64,
    pub newton_pair: bool,
    pub table: TableSettings,
    /// `0` disables the dispersion table.
    pub dispersion_table_bits: u32,
}

impl PairSettings {
    /// Parses `<dispersion> <coulomb> <cut_lj> [cut_coul]`, leaving every other setting at
    /// its default.
    pub fn from_style_args(args: &[&str]) -> Result<Self, ConfigError> {
        if args.len() != 3 && args.len() != 4 {
            return Err(ConfigError::ArgumentCount(args.len()));
        }
        let number = |name: &'static str, value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    name,
                    value: value.to_string(),
                })
        };
        let mut builder = PairSettingsBuilder::new()
            .dispersion(InteractionMode::parse_field("dispersion", args[0])?)
            .coulomb(InteractionMode::parse_field("coulomb", args[1])?)
            .cut_lj(number("cut_lj", args[2])?);
        if let Some(cut_coul) = args.get(3) {
            builder = builder.cut_coul(number("cut_coul", cut_coul)?);
        }
        builder.build()
    }

    #[inline]
    pub fn coulomb_enabled(&self) -> bool {
        self.coulomb == InteractionMode::Long
    }

    #[inline]
    pub fn lj_enabled(&self) -> bool {
        self.dispersion != InteractionMode::Off
    }

    #[inline]
    pub fn dispersion_long(&self) -> bool {
        self.dispersion == InteractionMode::Long
    }

    /// True when a reciprocal-space solver must be present.
    pub fn requires_kspace(&self) -> bool {
        self.coulomb_enabled() || self.dispersion_long()
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            mixing: self.mixing,
            cut_lj_global: self.cut_lj_global,
            cut_coul: self.coulomb_enabled().then_some(self.cut_coul),
            force_mixing: self.dispersion_long(),
            shift_energy: self.shift && self.dispersion == InteractionMode::Cut,
        }
    }

    pub fn dispersion_table(&self) -> TableSettings {
        TableSettings {
            bits: self.dispersion_table_bits,
            ..self.table
        }
    }
}

#[derive(Default)]
pub struct PairSettingsBuilder {
    dispersion: Option<InteractionMode>,
    coulomb: Option<InteractionMode>,
    cut_lj: Option<f64>,
    cut_coul: Option<f64>,
    mixing: Option<MixingRule>,
    shift: Option<bool>,
    qqrd2e: Option<f64>,
    newton_pair: Option<bool>,
    table: Option<TableSettings>,
    dispersion_table_bits: Option<u32>,
}

impl PairSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispersion(mut self, mode: InteractionMode) -> Self {
        self.dispersion = Some(mode);
        self
    }
    pub fn coulomb(mut self, mode: InteractionMode) -> Self {
        self.coulomb = Some(mode);
        self
    }
    pub fn cut_lj(mut self, cutoff: f64) -> Self {
        self.cut_lj = Some(cutoff);
        self
    }
    pub fn cut_coul(mut self, cutoff: f64) -> Self {
        self.cut_coul = Some(cutoff);
        self
    }
    pub fn mixing(mut self, rule: MixingRule) -> Self {
        self.mixing = Some(rule);
        self
    }
    pub fn shift(mut self, shift: bool) -> Self {
        self.shift = Some(shift);
        self
    }
    pub fn qqrd2e(mut self, qqrd2e: f64) -> Self {
        self.qqrd2e = Some(qqrd2e);
        self
    }
    pub fn newton_pair(mut self, newton: bool) -> Self {
        self.newton_pair = Some(newton);
        self
    }
    pub fn table(mut self, table: TableSettings) -> Self {
        self.table = Some(table);
        self
    }
    pub fn dispersion_table_bits(mut self, bits: u32) -> Self {
        self.dispersion_table_bits = Some(bits);
        self
    }

    pub fn build(self) -> Result<PairSettings, ConfigError> {
        let dispersion = self.dispersion.unwrap_or(InteractionMode::Long);
        let coulomb = self.coulomb.unwrap_or(InteractionMode::Long);
        if coulomb == InteractionMode::Cut {
            return Err(ConfigError::CoulombCutUnsupported);
        }
        let all_long = dispersion == InteractionMode::Long && coulomb == InteractionMode::Long;
        if all_long && self.cut_coul.is_some() {
            return Err(ConfigError::SingleCutoffForAllLong);
        }

        let cut_lj_global = self.cut_lj.ok_or(ConfigError::MissingParameter("cut_lj"))?;
        let cut_coul = self.cut_coul.unwrap_or(cut_lj_global);
        for (name, value) in [("cut_lj", cut_lj_global), ("cut_coul", cut_coul)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::NonPositiveCutoff { name, value });
            }
        }

        if dispersion == InteractionMode::Long {
            warn!("Mixing forced for lj coefficients");
        }
        if all_long {
            warn!("Using largest cutoff for lj/coul long long");
        }

        Ok(PairSettings {
            dispersion,
            coulomb,
            cut_lj_global,
            cut_coul,
            mixing: self.mixing.unwrap_or_default(),
            shift: self.shift.unwrap_or(false),
            qqrd2e: self.qqrd2e.unwrap_or(COULOMB_CONSTANT),
            newton_pair: self.newton_pair.unwrap_or(true),
            table: self.table.unwrap_or_default(),
            dispersion_table_bits: self.dispersion_table_bits.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fails_without_lj_cutoff() {
        let result = PairSettingsBuilder::new().build();
        assert_eq!(result, Err(ConfigError::MissingParameter("cut_lj")));
    }

    #[test]
    fn build_applies_defaults() {
        let settings = PairSettingsBuilder::new().cut_lj(10.0).build().unwrap();
        assert_eq!(settings.dispersion, InteractionMode::Long);
        assert_eq!(settings.coulomb, InteractionMode::Long);
        assert_eq!(settings.cut_coul, 10.0);
        assert_eq!(settings.mixing, MixingRule::Arithmetic);
        assert_eq!(settings.qqrd2e, COULOMB_CONSTANT);
        assert!(settings.newton_pair);
        assert_eq!(settings.table, TableSettings::default());
        assert_eq!(settings.dispersion_table_bits, 0);
    }

    #[test]
    fn build_rejects_coulomb_cut() {
        let result = PairSettingsBuilder::new()
            .coulomb(InteractionMode::Cut)
            .cut_lj(10.0)
            .build();
        assert_eq!(result, Err(ConfigError::CoulombCutUnsupported));
    }

    #[test]
    fn build_rejects_separate_coulomb_cutoff_when_all_long() {
        let result = PairSettingsBuilder::new().cut_lj(10.0).cut_coul(8.0).build();
        assert_eq!(result, Err(ConfigError::SingleCutoffForAllLong));
    }

    #[test]
    fn build_rejects_non_positive_cutoffs() {
        let result = PairSettingsBuilder::new()
            .dispersion(InteractionMode::Cut)
            .cut_lj(10.0)
            .cut_coul(-1.0)
            .build();
        assert_eq!(
            result,
            Err(ConfigError::NonPositiveCutoff {
                name: "cut_coul",
                value: -1.0
            })
        );
    }

    #[test]
    fn from_style_args_parses_modes_and_cutoffs() {
        let settings = PairSettings::from_style_args(&["cut", "long", "10.0", "8.5"]).unwrap();
        assert_eq!(settings.dispersion, InteractionMode::Cut);
        assert_eq!(settings.coulomb, InteractionMode::Long);
        assert_eq!(settings.cut_lj_global, 10.0);
        assert_eq!(settings.cut_coul, 8.5);
    }

    #[test]
    fn from_style_args_rejects_bad_grammar() {
        assert_eq!(
            PairSettings::from_style_args(&["long", "long"]),
            Err(ConfigError::ArgumentCount(2))
        );
        assert_eq!(
            PairSettings::from_style_args(&["short", "long", "10"]),
            Err(ConfigError::UnknownMode {
                field: "dispersion",
                value: "short".to_string()
            })
        );
        assert_eq!(
            PairSettings::from_style_args(&["long", "long", "ten"]),
            Err(ConfigError::InvalidNumber {
                name: "cut_lj",
                value: "ten".to_string()
            })
        );
    }

    #[test]
    fn resolve_options_follow_modes() {
        let long = PairSettings::from_style_args(&["long", "long", "10"]).unwrap();
        let opts = long.resolve_options();
        assert!(opts.force_mixing);
        assert_eq!(opts.cut_coul, Some(10.0));

        let mut cut = PairSettings::from_style_args(&["cut", "off", "10"]).unwrap();
        cut.shift = true;
        let opts = cut.resolve_options();
        assert!(!opts.force_mixing);
        assert!(opts.shift_energy);
        assert_eq!(opts.cut_coul, None);
        assert!(!cut.requires_kspace());
    }

    #[test]
    fn dispersion_table_shares_inner_and_tolerance() {
        let settings = PairSettingsBuilder::new()
            .cut_lj(10.0)
            .dispersion_table_bits(11)
            .build()
            .unwrap();
        let table = settings.dispersion_table();
        assert_eq!(table.bits, 11);
        assert_eq!(table.inner, settings.table.inner);
        assert_eq!(table.tolerance, settings.table.tolerance);
    }

    #[test]
    fn interaction_mode_round_trips_through_display() {
        for mode in [
            InteractionMode::Long,
            InteractionMode::Cut,
            InteractionMode::Off,
        ] {
            assert_eq!(mode.to_string().parse::<InteractionMode>(), Ok(mode));
        }
    }
}
