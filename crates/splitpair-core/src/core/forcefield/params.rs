use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Type index {index} is out of range (valid types are 1..={ntypes})")]
    InvalidType { index: usize, ntypes: usize },
    #[error("Invalid type range '{text}' for {ntypes} atom types")]
    InvalidTypeRange { text: String, ntypes: usize },
    #[error("Coefficient command matched no type pairs")]
    EmptyRange,
    #[error("Parameter '{name}' must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("Incorrect number of arguments for pair coefficients: expected 4 or 5, got {0}")]
    ArgumentCount(usize),
    #[error("Could not parse '{value}' as a number for '{name}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Pair coefficients for types ({i},{j}) cannot be resolved: ({k},{k}) is not set")]
    MissingCoefficients { i: usize, j: usize, k: usize },
    #[error("Unknown mixing rule '{0}'. Expected 'geometric', 'arithmetic' or 'sixthpower'")]
    UnknownMixingRule(String),
}

/// Rule used to derive off-diagonal coefficients from the per-type diagonal ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixingRule {
    Geometric,
    /// Lorentz-Berthelot: geometric epsilon, arithmetic sigma and cutoff.
    #[default]
    Arithmetic,
    #[serde(alias = "sixthpower")]
    SixthPower,
}

static MIXING_RULE_NAMES: Map<&'static str, MixingRule> = phf_map! {
    "geometric" => MixingRule::Geometric,
    "arithmetic" => MixingRule::Arithmetic,
    "lorentz-berthelot" => MixingRule::Arithmetic,
    "sixthpower" => MixingRule::SixthPower,
    "sixth-power" => MixingRule::SixthPower,
};

impl MixingRule {
    pub fn mix_energy(self, eps1: f64, eps2: f64, sig1: f64, sig2: f64) -> f64 {
        match self {
            MixingRule::Geometric | MixingRule::Arithmetic => (eps1 * eps2).sqrt(),
            MixingRule::SixthPower => {
                let s1_3 = sig1.powi(3);
                let s2_3 = sig2.powi(3);
                2.0 * (eps1 * eps2).sqrt() * (s1_3 * s2_3) / (s1_3 * s1_3 + s2_3 * s2_3)
            }
        }
    }

    pub fn mix_distance(self, d1: f64, d2: f64) -> f64 {
        match self {
            MixingRule::Geometric => (d1 * d2).sqrt(),
            MixingRule::Arithmetic => 0.5 * (d1 + d2),
            MixingRule::SixthPower => (0.5 * (d1.powi(6) + d2.powi(6))).powf(1.0 / 6.0),
        }
    }

    /// Integer tag used by the binary restart record.
    pub fn code(self) -> i32 {
        match self {
            MixingRule::Geometric => 0,
            MixingRule::Arithmetic => 1,
            MixingRule::SixthPower => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(MixingRule::Geometric),
            1 => Some(MixingRule::Arithmetic),
            2 => Some(MixingRule::SixthPower),
            _ => None,
        }
    }
}

impl FromStr for MixingRule {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MIXING_RULE_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParameterError::UnknownMixingRule(s.to_string()))
    }
}

impl fmt::Display for MixingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MixingRule::Geometric => "geometric",
            MixingRule::Arithmetic => "arithmetic",
            MixingRule::SixthPower => "sixthpower",
        };
        f.write_str(name)
    }
}

/// Inclusive range of 1-based atom types, parsed from `n`, `*`, `n*`, `*n` or `m*n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRange {
    pub lo: usize,
    pub hi: usize,
}

impl TypeRange {
    pub fn single(t: usize) -> Self {
        Self { lo: t, hi: t }
    }

    pub fn parse(text: &str, ntypes: usize) -> Result<Self, ParameterError> {
        let invalid = || ParameterError::InvalidTypeRange {
            text: text.to_string(),
            ntypes,
        };
        let parse_bound = |s: &str| -> Result<usize, ParameterError> {
            s.parse::<usize>().map_err(|_| invalid())
        };

        let trimmed = text.trim();
        let (lo, hi) = match trimmed.split_once('*') {
            None => {
                let t = parse_bound(trimmed)?;
                (t, t)
            }
            Some(("", "")) => (1, ntypes),
            Some(("", hi)) => (1, parse_bound(hi)?),
            Some((lo, "")) => (parse_bound(lo)?, ntypes),
            Some((lo, hi)) => (parse_bound(lo)?, parse_bound(hi)?),
        };

        if lo < 1 || hi > ntypes || lo > hi {
            return Err(invalid());
        }
        Ok(Self { lo, hi })
    }
}

/// Coefficients as given by the user for one type pair, before any mixing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCoeffs {
    pub epsilon: f64,
    pub sigma: f64,
    pub cutoff: f64,
}

impl PairCoeffs {
    pub fn new(epsilon: f64, sigma: f64, cutoff: f64) -> Result<Self, ParameterError> {
        for (name, value) in [("epsilon", epsilon), ("sigma", sigma), ("cutoff", cutoff)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ParameterError::NonPositive { name, value });
            }
        }
        Ok(Self {
            epsilon,
            sigma,
            cutoff,
        })
    }
}

/// A parsed `coeff` command: `ilo*ihi jlo*jhi epsilon sigma [cutoff]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffCommand {
    pub i: TypeRange,
    pub j: TypeRange,
    pub epsilon: f64,
    pub sigma: f64,
    pub cutoff: Option<f64>,
}

impl CoeffCommand {
    pub fn parse(args: &[&str], ntypes: usize) -> Result<Self, ParameterError> {
        if args.len() < 4 || args.len() > 5 {
            return Err(ParameterError::ArgumentCount(args.len()));
        }
        let number = |name: &'static str, value: &str| -> Result<f64, ParameterError> {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| ParameterError::InvalidNumber {
                    name,
                    value: value.to_string(),
                })
        };

        Ok(Self {
            i: TypeRange::parse(args[0], ntypes)?,
            j: TypeRange::parse(args[1], ntypes)?,
            epsilon: number("epsilon", args[2])?,
            sigma: number("sigma", args[3])?,
            cutoff: args.get(4).map(|c| number("cutoff", c)).transpose()?,
        })
    }
}

/// Fully resolved interaction parameters of one type pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TypePairParams {
    pub epsilon: f64,
    pub sigma: f64,
    pub cut_lj: f64,
    pub cut_ljsq: f64,
    /// Square of the overall pair cutoff (LJ or Coulomb, whichever is larger).
    pub cutsq: f64,
    pub lj1: f64,
    pub lj2: f64,
    pub lj3: f64,
    /// Dispersion coefficient `B = 4 eps sigma^6`.
    pub lj4: f64,
    pub offset: f64,
    pub explicit: bool,
}

/// Global inputs needed to turn stored coefficients into [`TypePairParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    pub mixing: MixingRule,
    pub cut_lj_global: f64,
    /// `None` when Coulomb interactions are switched off.
    pub cut_coul: Option<f64>,
    /// Ignore explicit off-diagonal coefficients and mix everything, using the global cutoff.
    pub force_mixing: bool,
    pub shift_energy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    ntypes: usize,
    explicit: Vec<Option<PairCoeffs>>,
}

impl ParameterTable {
    pub fn new(ntypes: usize) -> Self {
        Self {
            ntypes,
            explicit: vec![None; ntypes * (ntypes + 1) / 2],
        }
    }

    pub fn ntypes(&self) -> usize {
        self.ntypes
    }

    fn slot(&self, i: usize, j: usize) -> Result<usize, ParameterError> {
        for index in [i, j] {
            if index < 1 || index > self.ntypes {
                return Err(ParameterError::InvalidType {
                    index,
                    ntypes: self.ntypes,
                });
            }
        }
        let (a, b) = if i <= j { (i - 1, j - 1) } else { (j - 1, i - 1) };
        Ok(a * (2 * self.ntypes - a + 1) / 2 + (b - a))
    }

    pub fn set(&mut self, i: usize, j: usize, coeffs: PairCoeffs) -> Result<(), ParameterError> {
        let slot = self.slot(i, j)?;
        self.explicit[slot] = Some(coeffs);
        Ok(())
    }

    /// Applies one coefficient command over a type-range pair; returns the number of pairs set.
    pub fn set_range(
        &mut self,
        irange: TypeRange,
        jrange: TypeRange,
        coeffs: PairCoeffs,
    ) -> Result<usize, ParameterError> {
        let mut count = 0;
        for i in irange.lo..=irange.hi {
            for j in jrange.lo.max(i)..=jrange.hi {
                self.set(i, j, coeffs)?;
                count += 1;
            }
        }
        if count == 0 {
            return Err(ParameterError::EmptyRange);
        }
        Ok(count)
    }

    pub fn explicit(&self, i: usize, j: usize) -> Result<Option<PairCoeffs>, ParameterError> {
        Ok(self.explicit[self.slot(i, j)?])
    }

    /// Upper-triangle walk (i <= j) in row-major order, as persisted in restart files.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, Option<PairCoeffs>)> + '_ {
        let n = self.ntypes;
        (1..=n)
            .flat_map(move |i| (i..=n).map(move |j| (i, j)))
            .zip(self.explicit.iter().copied())
            .map(|((i, j), c)| (i, j, c))
    }

    pub fn resolve(
        &self,
        i: usize,
        j: usize,
        opts: &ResolveOptions,
    ) -> Result<TypePairParams, ParameterError> {
        let (i, j) = (i.min(j), i.max(j));
        let entry = self.explicit(i, j)?;
        let (epsilon, sigma, cut_lj, explicit) = match entry {
            Some(c) if !opts.force_mixing => (c.epsilon, c.sigma, c.cutoff, true),
            _ => {
                let ii = self
                    .explicit(i, i)?
                    .ok_or(ParameterError::MissingCoefficients { i, j, k: i })?;
                let jj = self
                    .explicit(j, j)?
                    .ok_or(ParameterError::MissingCoefficients { i, j, k: j })?;
                let epsilon = opts
                    .mixing
                    .mix_energy(ii.epsilon, jj.epsilon, ii.sigma, jj.sigma);
                let sigma = opts.mixing.mix_distance(ii.sigma, jj.sigma);
                let cut_lj = if opts.force_mixing {
                    opts.cut_lj_global
                } else {
                    opts.mixing.mix_distance(ii.cutoff, jj.cutoff)
                };
                (epsilon, sigma, cut_lj, false)
            }
        };

        let cut = match opts.cut_coul {
            Some(cut_coul) => cut_lj.max(cut_coul),
            None => cut_lj,
        };
        let sigma6 = sigma.powi(6);
        let sigma12 = sigma6 * sigma6;
        let offset = if opts.shift_energy {
            let ratio6 = (sigma / cut_lj).powi(6);
            4.0 * epsilon * (ratio6 * ratio6 - ratio6)
        } else {
            0.0
        };

        Ok(TypePairParams {
            epsilon,
            sigma,
            cut_lj,
            cut_ljsq: cut_lj * cut_lj,
            cutsq: cut * cut,
            lj1: 48.0 * epsilon * sigma12,
            lj2: 24.0 * epsilon * sigma6,
            lj3: 4.0 * epsilon * sigma12,
            lj4: 4.0 * epsilon * sigma6,
            offset,
            explicit,
        })
    }

    /// Resolves every type pair into a dense, symmetric `ntypes x ntypes` matrix (row-major, 0-based).
    pub fn resolve_all(
        &self,
        opts: &ResolveOptions,
    ) -> Result<Vec<TypePairParams>, ParameterError> {
        let n = self.ntypes;
        let mut dense = vec![TypePairParams::default(); n * n];
        for i in 1..=n {
            for j in i..=n {
                let params = self.resolve(i, j, opts)?;
                dense[(i - 1) * n + (j - 1)] = params;
                dense[(j - 1) * n + (i - 1)] = params;
            }
        }
        Ok(dense)
    }
}
