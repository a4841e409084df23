use crate::core::forcefield::params::MixingRule;
use crate::core::forcefield::special::SpecialBondsConfig;
use crate::core::forcefield::table::TableSettings;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

fn default_style() -> String {
    "lj/long/coul/long".to_string()
}

fn default_long() -> String {
    "long".to_string()
}

fn default_true() -> bool {
    true
}

/// Complete description of a pair setup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PairInput {
    pub ntypes: usize,
    #[serde(default = "default_style")]
    pub style: String,
    pub settings: SettingsInput,
    #[serde(default)]
    pub kspace: Option<KspaceInput>,
    #[serde(default)]
    pub special_bonds: Option<SpecialBondsConfig>,
    #[serde(default)]
    pub respa: Option<RespaInput>,
    #[serde(default)]
    pub coeff: Vec<CoeffInput>,
}

/// Style settings; `dispersion` and `coulomb` take `long`, `cut` or `off`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsInput {
    #[serde(default = "default_long")]
    pub dispersion: String,
    #[serde(default = "default_long")]
    pub coulomb: String,
    pub cut_lj: f64,
    #[serde(default)]
    pub cut_coul: Option<f64>,
    #[serde(default)]
    pub mixing: MixingRule,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub qqrd2e: Option<f64>,
    #[serde(default = "default_true")]
    pub newton_pair: bool,
    #[serde(default)]
    pub table: TableSettings,
    /// Resolution of the optional dispersion table; it shares `inner` and `tolerance` with `table`.
    #[serde(default)]
    pub dispersion_table_bits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KspaceInput {
    pub g_ewald: f64,
    #[serde(default)]
    pub g_ewald_6: Option<f64>,
}

/// Switching shells as `[on, off]` radii.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RespaInput {
    pub inner: [f64; 2],
    #[serde(default)]
    pub middle: Option<[f64; 2]>,
}

/// One coefficient command; `i` and `j` use the type-range grammar (`*`, `n`, `n*`, `*n`, `m*n`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CoeffInput {
    pub i: String,
    pub j: String,
    pub epsilon: f64,
    pub sigma: f64,
    #[serde(default)]
    pub cutoff: Option<f64>,
}

impl PairInput {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path).map_err(|e| InputError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| InputError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
