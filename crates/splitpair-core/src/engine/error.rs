use thiserror::Error;

use super::config::ConfigError;
use super::restart::RestartError;
use crate::core::forcefield::params::ParameterError;
use crate::core::forcefield::special::SpecialBondError;
use crate::core::forcefield::table::TableError;
use crate::core::io::input::InputError;
use crate::core::models::ModelError;

/// Fatal configuration failures; every variant aborts setup before the force loop runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid settings: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid pair coefficients: {source}")]
    Parameter {
        #[from]
        source: ParameterError,
    },

    #[error("Interpolation table construction failed: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Invalid special bonds: {source}")]
    Special {
        #[from]
        source: SpecialBondError,
    },

    #[error("Inconsistent particle data: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Restart state error: {source}")]
    Restart {
        #[from]
        source: RestartError,
    },

    #[error("Input error: {source}")]
    Input {
        #[from]
        source: InputError,
    },

    #[error("Pair style requires a KSpace style providing {what}")]
    MissingKspace { what: &'static str },

    #[error(
        "Pair cutoff {cutoff} for types ({i},{j}) is smaller than the outermost RESPA cutoff {respa}"
    )]
    RespaCutoff {
        i: usize,
        j: usize,
        cutoff: f64,
        respa: f64,
    },

    #[error("Unknown pair style '{0}'")]
    UnknownStyle(String),
}
