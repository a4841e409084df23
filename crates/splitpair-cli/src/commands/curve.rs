use crate::cli::CurveArgs;
use crate::error::{CliError, Result};
use splitpair::core::forcefield::special::SpecialCode;
use splitpair::engine::registry::StyleRegistry;
use splitpair::workflows::curve::{self, CurveRequest};
use splitpair::workflows::setup;
use tracing::info;

pub fn run(args: CurveArgs) -> Result<()> {
    let (itype, jtype) = match args.types.as_slice() {
        &[i, j] => (i, j),
        other => {
            return Err(CliError::Argument(format!(
                "--types expects two type indices, got {}",
                other.len()
            )));
        }
    };
    let (qi, qj) = match args.charges.as_deref() {
        None => (0.0, 0.0),
        Some(&[qi, qj]) => (qi, qj),
        Some(other) => {
            return Err(CliError::Argument(format!(
                "--charges expects two values, got {}",
                other.len()
            )));
        }
    };
    let code = SpecialCode::new(args.special)
        .map_err(|e| CliError::Argument(format!("--special: {e}")))?;

    let setup = setup::load(&args.config, &StyleRegistry::default())?;
    let to = match args.to {
        Some(to) => to,
        None => setup
            .evaluator
            .pair_params(itype, jtype)
            .map(|p| p.cutsq.sqrt())
            .ok_or_else(|| {
                CliError::Argument(format!("type pair ({itype},{jtype}) does not exist"))
            })?,
    };

    let request = CurveRequest {
        itype,
        jtype,
        qi,
        qj,
        code,
        level: args.level.into(),
        from: args.from,
        to,
        samples: args.samples,
    };
    let rows = curve::sample(&setup.evaluator, &request)?;
    curve::write_csv(&args.output, &rows)?;

    info!(path = %args.output.display(), rows = rows.len(), "Curve written.");
    println!(
        "Wrote {} samples for types ({itype},{jtype}) over [{:.4}, {:.4}] to {}",
        rows.len(),
        request.from,
        request.to,
        args.output.display()
    );
    Ok(())
}
