use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpecialBondError {
    #[error("Special-bond code {0} is out of range 0..=3")]
    InvalidCode(u32),
    #[error("Special-bond factor {value} for {kind} is outside [0, 1]")]
    InvalidFactor { kind: &'static str, value: f64 },
}

/// Bonded-neighbor marker carried in the top two bits of a neighbor index.
///
/// `0` is an ordinary nonbonded pair; `1..=3` mark 1-2, 1-3 and 1-4 neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpecialCode(u8);

impl SpecialCode {
    pub const NONE: SpecialCode = SpecialCode(0);
    pub const SHIFT: u32 = 30;
    pub const INDEX_MASK: u32 = 0x3FFF_FFFF;

    pub fn new(code: u32) -> Result<Self, SpecialBondError> {
        if code > 3 {
            return Err(SpecialBondError::InvalidCode(code));
        }
        Ok(Self(code as u8))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Packs a neighbor index together with this code.
    #[inline]
    pub fn pack(self, index: u32) -> u32 {
        (index & Self::INDEX_MASK) | ((self.0 as u32) << Self::SHIFT)
    }

    /// Splits a packed neighbor entry into its index and code.
    #[inline]
    pub fn unpack(entry: u32) -> (usize, SpecialCode) {
        (
            (entry & Self::INDEX_MASK) as usize,
            SpecialCode((entry >> Self::SHIFT) as u8),
        )
    }
}

/// Scale factors for bonded neighbors. Index 0 is always 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialBonds {
    coul: [f64; 4],
    lj: [f64; 4],
}

impl Default for SpecialBonds {
    fn default() -> Self {
        Self {
            coul: [1.0, 0.0, 0.0, 0.0],
            lj: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpecialBondsConfig {
    pub coul: [f64; 3],
    pub lj: [f64; 3],
}

impl SpecialBonds {
    pub fn new(coul: [f64; 3], lj: [f64; 3]) -> Result<Self, SpecialBondError> {
        for (kind, values) in [("coul", &coul), ("lj", &lj)] {
            if let Some(&value) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
                return Err(SpecialBondError::InvalidFactor { kind, value });
            }
        }
        Ok(Self {
            coul: [1.0, coul[0], coul[1], coul[2]],
            lj: [1.0, lj[0], lj[1], lj[2]],
        })
    }

    /// Every bonded neighbor interacts at full strength.
    pub fn unscaled() -> Self {
        Self {
            coul: [1.0; 4],
            lj: [1.0; 4],
        }
    }

    #[inline]
    pub fn coul(&self, code: SpecialCode) -> f64 {
        self.coul[code.get()]
    }

    #[inline]
    pub fn lj(&self, code: SpecialCode) -> f64 {
        self.lj[code.get()]
    }
}

impl TryFrom<SpecialBondsConfig> for SpecialBonds {
    type Error = SpecialBondError;

    fn try_from(config: SpecialBondsConfig) -> Result<Self, Self::Error> {
        Self::new(config.coul, config.lj)
    }
}
