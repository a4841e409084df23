use crate::core::forcefield::special::SpecialCode;
use crate::engine::evaluator::{PairRecord, SplitRangeEvaluator};
use crate::engine::respa::RespaLevel;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum CurveError {
    #[error("Invalid sampling range [{from}, {to}]: bounds must be positive and increasing")]
    InvalidRange { from: f64, to: f64 },
    #[error("At least two samples are required, got {0}")]
    TooFewSamples(usize),
    #[error("Type pair ({itype},{jtype}) is out of range for {ntypes} atom types")]
    InvalidType {
        itype: usize,
        jtype: usize,
        ntypes: usize,
    },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// Which pair to sample and where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRequest {
    pub itype: usize,
    pub jtype: usize,
    pub qi: f64,
    pub qj: f64,
    pub code: SpecialCode,
    pub level: RespaLevel,
    pub from: f64,
    pub to: f64,
    pub samples: usize,
}

impl CurveRequest {
    /// Single-rate curve of an uncharged, unbonded pair over `[from, to]`.
    pub fn new(itype: usize, jtype: usize, from: f64, to: f64, samples: usize) -> Self {
        Self {
            itype,
            jtype,
            qi: 0.0,
            qj: 0.0,
            code: SpecialCode::NONE,
            level: RespaLevel::Single,
            from,
            to,
            samples,
        }
    }
}

/// One sampled distance; `force` is the radial force, positive when repulsive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveRow {
    pub r: f64,
    pub evdwl: f64,
    pub ecoul: f64,
    pub energy: f64,
    pub force: f64,
}

#[instrument(skip_all, name = "curve_workflow")]
pub fn sample(
    evaluator: &SplitRangeEvaluator,
    request: &CurveRequest,
) -> Result<Vec<CurveRow>, CurveError> {
    let CurveRequest { from, to, .. } = *request;
    if !(from > 0.0) || !(to > from) || !to.is_finite() {
        return Err(CurveError::InvalidRange { from, to });
    }
    if request.samples < 2 {
        return Err(CurveError::TooFewSamples(request.samples));
    }
    if evaluator
        .pair_params(request.itype, request.jtype)
        .is_none()
    {
        return Err(CurveError::InvalidType {
            itype: request.itype,
            jtype: request.jtype,
            ntypes: evaluator.ntypes(),
        });
    }

    let step = (to - from) / (request.samples - 1) as f64;
    let rows: Vec<CurveRow> = (0..request.samples)
        .map(|k| {
            let r = from + step * k as f64;
            let out = evaluator.evaluate_at(
                &PairRecord {
                    itype: request.itype,
                    jtype: request.jtype,
                    rsq: r * r,
                    qi: request.qi,
                    qj: request.qj,
                    code: request.code,
                },
                request.level,
            );
            CurveRow {
                r,
                evdwl: out.energy.vdw,
                ecoul: out.energy.coulomb,
                energy: out.energy.total(),
                force: out.fpair * r,
            }
        })
        .collect();

    info!(
        itype = request.itype,
        jtype = request.jtype,
        level = ?request.level,
        samples = rows.len(),
        "Pair curve sampled."
    );
    Ok(rows)
}

pub fn write_csv(path: &Path, rows: &[CurveRow]) -> Result<(), CurveError> {
    let csv_error = |e: csv::Error| CurveError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| csv_error(e.into()))?;
    Ok(())
}
