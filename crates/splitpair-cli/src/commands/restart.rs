use crate::cli::{RestartArgs, RestartCommands};
use crate::error::Result;
use anyhow::Context;
use splitpair::core::io::input::PairInput;
use splitpair::engine::error::EngineError;
use splitpair::engine::kspace::{EwaldSplitting, KspaceSolver};
use splitpair::engine::pair::{PairStyle, SplitRangePair};
use splitpair::engine::registry::{LJ_LONG_COUL_LONG, StyleRegistry};
use splitpair::workflows::setup;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub fn run(args: RestartArgs) -> Result<()> {
    match args.command {
        RestartCommands::Write { config, output } => handle_write(&config, &output),
        RestartCommands::Show { ntypes, input } => handle_show(ntypes, &input),
    }
}

fn handle_write(config: &Path, output: &Path) -> Result<()> {
    let input = PairInput::load(config).map_err(EngineError::from)?;
    let style = setup::configure(&input, &StyleRegistry::default())?;
    // A state that could never be initialised is not written.
    let kspace = input.kspace.map(EwaldSplitting::from);
    style.validate(kspace.as_ref().map(|k| k as &dyn KspaceSolver))?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create restart file '{}'", output.display()))?;
    let mut writer = BufWriter::new(file);
    style.write_restart(&mut writer)?;
    writer.flush()?;

    info!(path = %output.display(), ntypes = style.ntypes(), "Restart state written.");
    println!("Wrote restart state for {} atom types to {}", style.ntypes(), output.display());
    Ok(())
}

fn handle_show(ntypes: usize, input: &Path) -> Result<()> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open restart file '{}'", input.display()))?;
    let mut reader = BufReader::new(file);
    let style = SplitRangePair::from_restart(LJ_LONG_COUL_LONG, &mut reader, ntypes)?;
    let settings = style.settings();

    println!("dispersion:      {}", settings.dispersion);
    println!("coulomb:         {}", settings.coulomb);
    println!("cut-lj:          {}", settings.cut_lj_global);
    println!("cut-coul:        {}", settings.cut_coul);
    println!("mixing:          {}", settings.mixing);
    println!("shift:           {}", settings.shift);
    println!(
        "table:           {} bits, inner {}, tolerance {:e}",
        settings.table.bits, settings.table.inner, settings.table.tolerance
    );
    println!("dispersion bits: {}", settings.dispersion_table_bits);
    println!();
    println!("{:>4} {:>4} {:>12} {:>12} {:>12}", "i", "j", "epsilon", "sigma", "cutoff");
    for (i, j, coeffs) in style.coefficients().upper_triangle() {
        if let Some(c) = coeffs {
            println!(
                "{i:>4} {j:>4} {:>12.6} {:>12.6} {:>12.6}",
                c.epsilon, c.sigma, c.cutoff
            );
        }
    }
    Ok(())
}
