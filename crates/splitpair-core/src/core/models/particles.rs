use super::ModelError;
use nalgebra::{Point3, Vector3};

/// Particle storage of one process.
///
/// The first `nlocal` particles are owned by this process; the rest are read-only ghost
/// replicas of particles owned elsewhere. Types are 1-based.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    positions: Vec<Point3<f64>>,
    types: Vec<usize>,
    charges: Vec<f64>,
    forces: Vec<Vector3<f64>>,
    nlocal: usize,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        positions: Vec<Point3<f64>>,
        types: Vec<usize>,
        charges: Vec<f64>,
        nlocal: usize,
    ) -> Result<Self, ModelError> {
        let len = positions.len();
        for (what, found) in [("types", types.len()), ("charges", charges.len())] {
            if found != len {
                return Err(ModelError::LengthMismatch {
                    what,
                    expected: len,
                    found,
                });
            }
        }
        if nlocal > len {
            return Err(ModelError::OwnedCountExceeds { nlocal, len });
        }
        Ok(Self {
            forces: vec![Vector3::zeros(); len],
            positions,
            types,
            charges,
            nlocal,
        })
    }

    /// Appends an owned particle. Must be called before any ghost is added.
    pub fn add_local(&mut self, position: Point3<f64>, itype: usize, charge: f64) -> usize {
        debug_assert_eq!(self.nlocal, self.len(), "owned particles precede ghosts");
        self.nlocal += 1;
        self.push(position, itype, charge)
    }

    pub fn add_ghost(&mut self, position: Point3<f64>, itype: usize, charge: f64) -> usize {
        self.push(position, itype, charge)
    }

    fn push(&mut self, position: Point3<f64>, itype: usize, charge: f64) -> usize {
        self.positions.push(position);
        self.types.push(itype);
        self.charges.push(charge);
        self.forces.push(Vector3::zeros());
        self.positions.len() - 1
    }

    /// Fails if any particle carries a type outside `1..=ntypes`.
    pub fn check_types(&self, ntypes: usize) -> Result<(), ModelError> {
        match self
            .types
            .iter()
            .position(|&t| t == 0 || t > ntypes)
        {
            Some(index) => Err(ModelError::InvalidType {
                index,
                itype: self.types[index],
                ntypes,
            }),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn nlocal(&self) -> usize {
        self.nlocal
    }

    #[inline]
    pub fn is_local(&self, index: usize) -> bool {
        index < self.nlocal
    }

    #[inline]
    pub fn position(&self, index: usize) -> Point3<f64> {
        self.positions[index]
    }

    #[inline]
    pub fn itype(&self, index: usize) -> usize {
        self.types[index]
    }

    #[inline]
    pub fn charge(&self, index: usize) -> f64 {
        self.charges[index]
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn forces(&self) -> &[Vector3<f64>] {
        &self.forces
    }

    pub fn force(&self, index: usize) -> Vector3<f64> {
        self.forces[index]
    }

    #[inline]
    pub(crate) fn add_force(&mut self, index: usize, force: Vector3<f64>) {
        self.forces[index] += force;
    }

    pub fn clear_forces(&mut self) {
        self.forces.iter_mut().for_each(|f| *f = Vector3::zeros());
    }

    /// Sum of all stored forces, ghosts included.
    pub fn net_force(&self) -> Vector3<f64> {
        self.forces.iter().sum()
    }
}
