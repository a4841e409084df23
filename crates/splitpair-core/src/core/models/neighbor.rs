use super::ModelError;
use super::particles::ParticleSystem;
use crate::core::forcefield::special::SpecialCode;
use std::collections::HashMap;

/// Neighbors of one owned particle; each entry packs an index with a special-bond code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NeighborRow {
    pub i: usize,
    pub entries: Vec<u32>,
}

impl NeighborRow {
    pub fn new(i: usize) -> Self {
        Self {
            i,
            entries: Vec::new(),
        }
    }

    /// Appends neighbor `j`; fails when `j` does not fit below the code bits.
    pub fn push(&mut self, j: usize, code: SpecialCode) -> Result<(), ModelError> {
        let index = u32::try_from(j)
            .ok()
            .filter(|&index| index <= SpecialCode::INDEX_MASK)
            .ok_or(ModelError::NeighborIndexTooLarge {
                index: j,
                max: SpecialCode::INDEX_MASK as usize,
            })?;
        self.entries.push(code.pack(index));
        Ok(())
    }

    /// Unpacked `(j, code)` pairs.
    pub fn neighbors(&self) -> impl Iterator<Item = (usize, SpecialCode)> + '_ {
        self.entries.iter().map(|&entry| SpecialCode::unpack(entry))
    }
}

/// Half neighbor list: every interacting pair appears once, in the row of an owned particle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NeighborList {
    rows: Vec<NeighborRow>,
}

impl NeighborList {
    pub fn new(rows: Vec<NeighborRow>) -> Self {
        Self { rows }
    }

    /// Brute-force O(N^2) list of all pairs closer than `cutoff`, pairing every owned particle
    /// with all later particles.
    ///
    /// `special` maps unordered index pairs to their bonded code.
    pub fn all_pairs(
        system: &ParticleSystem,
        cutoff: f64,
        special: &HashMap<(usize, usize), SpecialCode>,
    ) -> Result<Self, ModelError> {
        let cutsq = cutoff * cutoff;
        let rows = (0..system.nlocal())
            .map(|i| {
                let mut row = NeighborRow::new(i);
                let xi = system.position(i);
                for j in i + 1..system.len() {
                    if (system.position(j) - xi).norm_squared() < cutsq {
                        let code = special
                            .get(&(i, j))
                            .or_else(|| special.get(&(j, i)))
                            .copied()
                            .unwrap_or(SpecialCode::NONE);
                        row.push(j, code)?;
                    }
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[NeighborRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|row| row.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails if a row belongs to a ghost or an entry points past the particle arrays.
    pub fn check(&self, system: &ParticleSystem) -> Result<(), ModelError> {
        for row in &self.rows {
            if !system.is_local(row.i) {
                return Err(ModelError::RowNotOwned(row.i));
            }
            if let Some((index, _)) = row.neighbors().find(|&(j, _)| j >= system.len()) {
                return Err(ModelError::NeighborOutOfRange {
                    index,
                    len: system.len(),
                });
            }
        }
        Ok(())
    }
}
