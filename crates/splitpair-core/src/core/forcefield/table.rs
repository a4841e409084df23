//! Linear interpolation tables over squared distance.
//!
//! Buckets are addressed through the IEEE-754 bit pattern of `r^2`. For a positive `f64` the
//! bit pattern is monotone in the value, so keeping the exponent and the top `m` mantissa bits,
//!
//! ```text
//! key(r2)   = r2.to_bits() >> (52 - m)
//! bucket k  = [from_bits((K0 + k) << (52 - m)), from_bits((K0 + k + 1) << (52 - m)))
//! ```
//!
//! splits every octave of `r^2` into `2^m` equal-width buckets, `K0 = key(inner^2)`. The
//! relative width of a bucket is therefore bounded by `2^-m` over the whole range, which bounds
//! the relative interpolation error of smooth columns.

use super::potentials::{dispersion_damped_unit, ewald_real_space};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

const MANTISSA_BITS: u32 = 52;
pub const MAX_TABLE_BITS: u32 = 24;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("Table resolution of {bits} bits is outside 1..={max}", max = MAX_TABLE_BITS)]
    InvalidResolution { bits: u32 },
    #[error("Table range is empty: inner radius {inner} must be positive and below cutoff {cutoff}")]
    InvalidRange { inner: f64, cutoff: f64 },
    #[error("Table tolerance must be positive (got {0})")]
    InvalidTolerance(f64),
    #[error(
        "Table with {bits} bits reaches a relative error of {max_error:e}, above the tolerance {tolerance:e}"
    )]
    ToleranceNotMet {
        max_error: f64,
        tolerance: f64,
        bits: u32,
    },
}

/// Resolution and accuracy requested for a table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TableSettings {
    /// Mantissa bits per octave of `r^2`; `0` disables tabulation.
    pub bits: u32,
    /// Pairs closer than this radius always use the closed form.
    pub inner: f64,
    pub tolerance: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            bits: 13,
            inner: std::f64::consts::SQRT_2,
            tolerance: 1e-6,
        }
    }
}

impl TableSettings {
    pub fn disabled() -> Self {
        Self {
            bits: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bits > 0
    }
}

/// Order-preserving map from `r^2` to a bucket index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketTransform {
    bits: u32,
    first_key: u64,
    len: usize,
}

impl BucketTransform {
    /// Covers `[lower bound of key(rsq_lo), rsq_hi]`.
    pub fn new(bits: u32, rsq_lo: f64, rsq_hi: f64) -> Result<Self, TableError> {
        if bits == 0 || bits > MAX_TABLE_BITS {
            return Err(TableError::InvalidResolution { bits });
        }
        if !(rsq_lo > 0.0 && rsq_lo < rsq_hi && rsq_hi.is_finite()) {
            return Err(TableError::InvalidRange {
                inner: rsq_lo.sqrt(),
                cutoff: rsq_hi.sqrt(),
            });
        }
        let shift = MANTISSA_BITS - bits;
        let first_key = rsq_lo.to_bits() >> shift;
        let last_key = rsq_hi.to_bits() >> shift;
        Ok(Self {
            bits,
            first_key,
            len: (last_key - first_key + 1) as usize,
        })
    }

    #[inline]
    fn shift(&self) -> u32 {
        MANTISSA_BITS - self.bits
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn index(&self, rsq: f64) -> Option<usize> {
        let key = rsq.to_bits() >> self.shift();
        let k = key.checked_sub(self.first_key)? as usize;
        (k < self.len).then_some(k)
    }

    /// Lower bound of bucket `k`; `lower_bound(len())` is the upper bound of the last bucket.
    #[inline]
    pub fn lower_bound(&self, k: usize) -> f64 {
        f64::from_bits((self.first_key + k as u64) << self.shift())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Segment {
    base: f64,
    slope: f64,
}

impl Segment {
    #[inline]
    fn at(&self, dr: f64) -> f64 {
        self.base + dr * self.slope
    }
}

/// Interpolated (or exact) column values at one squared distance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TableSample {
    pub force: f64,
    pub energy: f64,
    /// Bare `qqrd2e / r`, the unscreened term removed for bonded pairs.
    pub correction: f64,
}

impl TableSample {
    fn max_relative_error(&self, exact: &TableSample) -> f64 {
        [
            (self.force, exact.force),
            (self.energy, exact.energy),
            (self.correction, exact.correction),
        ]
        .into_iter()
        .map(|(approx, exact)| {
            let diff = (approx - exact).abs();
            if exact == 0.0 { diff } else { diff / exact.abs() }
        })
        .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableKind {
    /// Screened Coulomb per unit charge product.
    Coulomb { qqrd2e: f64, g_ewald: f64 },
    /// Damped dispersion per unit dispersion coefficient.
    Dispersion { g_ewald_6: f64 },
}

impl TableKind {
    #[inline]
    pub fn exact(&self, rsq: f64) -> TableSample {
        match *self {
            TableKind::Coulomb { qqrd2e, g_ewald } => {
                let term = ewald_real_space(rsq, qqrd2e, g_ewald);
                TableSample {
                    force: term.force,
                    energy: term.energy,
                    correction: qqrd2e / rsq.sqrt(),
                }
            }
            TableKind::Dispersion { g_ewald_6 } => {
                let term = dispersion_damped_unit(rsq, g_ewald_6);
                TableSample {
                    force: term.force,
                    energy: term.energy,
                    correction: 0.0,
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TableKind::Coulomb { .. } => "coulomb",
            TableKind::Dispersion { .. } => "dispersion",
        }
    }
}

/// Immutable table covering `(inner^2, cutoff^2)`.
#[derive(Debug, Clone)]
pub struct InterpolationTable {
    kind: TableKind,
    transform: BucketTransform,
    innersq: f64,
    cutsq: f64,
    lower: Vec<f64>,
    segments: Vec<[Segment; 3]>,
    max_error: f64,
}

impl InterpolationTable {
    pub fn coulomb(
        settings: &TableSettings,
        cutoff: f64,
        qqrd2e: f64,
        g_ewald: f64,
    ) -> Result<Self, TableError> {
        Self::build(TableKind::Coulomb { qqrd2e, g_ewald }, settings, cutoff)
    }

    pub fn dispersion(
        settings: &TableSettings,
        cutoff: f64,
        g_ewald_6: f64,
    ) -> Result<Self, TableError> {
        Self::build(TableKind::Dispersion { g_ewald_6 }, settings, cutoff)
    }

    #[instrument(skip_all, name = "build_table", fields(kind = kind.name(), bits = settings.bits))]
    pub fn build(
        kind: TableKind,
        settings: &TableSettings,
        cutoff: f64,
    ) -> Result<Self, TableError> {
        if !(settings.tolerance > 0.0) {
            return Err(TableError::InvalidTolerance(settings.tolerance));
        }
        if !(settings.inner > 0.0 && settings.inner < cutoff) {
            return Err(TableError::InvalidRange {
                inner: settings.inner,
                cutoff,
            });
        }
        let innersq = settings.inner * settings.inner;
        let cutsq = cutoff * cutoff;
        let transform = BucketTransform::new(settings.bits, innersq, cutsq)?;

        let nodes: Vec<(f64, TableSample)> = (0..=transform.len())
            .map(|k| {
                let rsq = transform.lower_bound(k);
                (rsq, kind.exact(rsq))
            })
            .collect();

        let (lower, segments): (Vec<f64>, Vec<[Segment; 3]>) = nodes
            .windows(2)
            .map(|pair| {
                let (r0, v0) = pair[0];
                let (r1, v1) = pair[1];
                let inv = 1.0 / (r1 - r0);
                let column = |a: f64, b: f64| Segment {
                    base: a,
                    slope: (b - a) * inv,
                };
                (
                    r0,
                    [
                        column(v0.force, v1.force),
                        column(v0.energy, v1.energy),
                        column(v0.correction, v1.correction),
                    ],
                )
            })
            .unzip();

        let mut table = Self {
            kind,
            transform,
            innersq,
            cutsq,
            lower,
            segments,
            max_error: 0.0,
        };
        table.max_error = table.verify_midpoints();

        debug!(
            buckets = table.len(),
            max_error = table.max_error,
            "Interpolation table built."
        );

        if table.max_error > settings.tolerance {
            return Err(TableError::ToleranceNotMet {
                max_error: table.max_error,
                tolerance: settings.tolerance,
                bits: settings.bits,
            });
        }
        Ok(table)
    }

    /// Largest relative deviation from the closed form at bucket midpoints inside the range.
    fn verify_midpoints(&self) -> f64 {
        (0..self.len())
            .map(|k| 0.5 * (self.transform.lower_bound(k) + self.transform.lower_bound(k + 1)))
            .filter(|&rsq| rsq > self.innersq && rsq < self.cutsq)
            .map(|rsq| {
                self.interpolate(rsq)
                    .max_relative_error(&self.kind.exact(rsq))
            })
            .fold(0.0, f64::max)
    }

    #[inline]
    fn interpolate(&self, rsq: f64) -> TableSample {
        match self.transform.index(rsq) {
            Some(k) => {
                let dr = rsq - self.lower[k];
                let [force, energy, correction] = &self.segments[k];
                TableSample {
                    force: force.at(dr),
                    energy: energy.at(dr),
                    correction: correction.at(dr),
                }
            }
            None => self.kind.exact(rsq),
        }
    }

    /// Column values at `rsq`: zero at or beyond the cutoff, closed form at or below the inner
    /// radius, interpolated in between.
    #[inline]
    pub fn evaluate(&self, rsq: f64) -> TableSample {
        if rsq >= self.cutsq {
            TableSample::default()
        } else if rsq <= self.innersq {
            self.kind.exact(rsq)
        } else {
            self.interpolate(rsq)
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn bits(&self) -> u32 {
        self.transform.bits()
    }

    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    pub fn inner(&self) -> f64 {
        self.innersq.sqrt()
    }

    pub fn cutoff(&self) -> f64 {
        self.cutsq.sqrt()
    }
}
