use clap::{Args, Parser, Subcommand, ValueEnum};
use splitpair::engine::respa::RespaLevel;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "splitpair CLI - inspect split-range Lennard-Jones/Coulomb pair styles: sample pair curves, check interpolation tables and manage restart state.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample energy and force of one type pair over a distance range and write them as CSV.
    Curve(CurveArgs),
    /// Initialise a pair style and report its interpolation tables.
    Table(TableArgs),
    /// Write or inspect binary restart state.
    Restart(RestartArgs),
}

/// The force-splitting level to sample.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelArg {
    #[default]
    Single,
    Inner,
    Middle,
    Outer,
}

impl From<LevelArg> for RespaLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Single => RespaLevel::Single,
            LevelArg::Inner => RespaLevel::Inner,
            LevelArg::Middle => RespaLevel::Middle,
            LevelArg::Outer => RespaLevel::Outer,
        }
    }
}

/// Arguments for the `curve` subcommand.
#[derive(Args, Debug)]
pub struct CurveArgs {
    /// Path to the pair setup file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// The type pair to sample.
    #[arg(long, num_args = 2, required = true, value_names = ["I", "J"])]
    pub types: Vec<usize>,

    /// Charges of the two particles.
    #[arg(long, num_args = 2, value_names = ["QI", "QJ"], allow_negative_numbers = true)]
    pub charges: Option<Vec<f64>>,

    /// Special-bond code of the pair (0 = not bonded, 1..3 = 1-2, 1-3, 1-4).
    #[arg(long, default_value_t = 0, value_name = "CODE")]
    pub special: u32,

    #[arg(long, value_enum, default_value_t = LevelArg::Single)]
    pub level: LevelArg,

    /// Smallest sampled distance.
    #[arg(long = "from", default_value_t = 1.0, value_name = "R")]
    pub from: f64,

    /// Largest sampled distance; defaults to the pair cutoff.
    #[arg(long = "to", value_name = "R")]
    pub to: Option<f64>,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 200, value_name = "INT")]
    pub samples: usize,

    /// Path for the output CSV file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `table` subcommand.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Path to the pair setup file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct RestartArgs {
    #[command(subcommand)]
    pub command: RestartCommands,
}

#[derive(Subcommand, Debug)]
pub enum RestartCommands {
    /// Configure a pair style and write its restart state.
    Write {
        /// Path to the pair setup file in TOML format.
        #[arg(short, long, required = true, value_name = "PATH")]
        config: PathBuf,
        /// Path for the binary restart file.
        #[arg(short, long, required = true, value_name = "PATH")]
        output: PathBuf,
    },
    /// Print the settings and explicit coefficients stored in a restart file.
    Show {
        /// Number of atom types the state was written for.
        #[arg(long, required = true, value_name = "INT")]
        ntypes: usize,
        /// The binary restart file.
        #[arg(required = true, value_name = "PATH")]
        input: PathBuf,
    },
}
