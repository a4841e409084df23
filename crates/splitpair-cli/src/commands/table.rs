use crate::cli::TableArgs;
use crate::error::Result;
use splitpair::core::forcefield::table::InterpolationTable;
use splitpair::engine::registry::StyleRegistry;
use splitpair::workflows::setup;

fn report(label: &str, table: Option<&InterpolationTable>) {
    match table {
        Some(table) => println!(
            "{label:<11} {} buckets ({} bits) over r in [{:.4}, {:.4}], max relative error {:.3e}",
            table.len(),
            table.bits(),
            table.inner(),
            table.cutoff(),
            table.max_error()
        ),
        None => println!("{label:<11} disabled (closed form)"),
    }
}

pub fn run(args: TableArgs) -> Result<()> {
    let setup = setup::load(&args.config, &StyleRegistry::default())?;
    let evaluator = &setup.evaluator;
    let settings = evaluator.settings();

    println!(
        "Style {} with {} atom types: dispersion {}, coulomb {}",
        setup.style.name(),
        evaluator.ntypes(),
        settings.dispersion,
        settings.coulomb
    );
    println!(
        "Cutoffs: lj {:.4}, coulomb {:.4}, largest pair {:.4}",
        settings.cut_lj_global,
        settings.cut_coul,
        evaluator.max_cutoff()
    );
    report("Coulomb:", evaluator.coulomb_table());
    report("Dispersion:", evaluator.dispersion_table());
    Ok(())
}
