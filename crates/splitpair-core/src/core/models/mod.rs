//! # Core Models Module
//!
//! Particle-side data consumed by the pair kernel.
//!
//! - [`particles`] - Positions, types, charges and force accumulators, with locally owned
//!   particles stored ahead of ghost replicas
//! - [`neighbor`] - Half neighbor lists whose entries carry a special-bond code in their top bits

pub mod neighbor;
pub mod particles;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Array '{what}' has {found} entries but the system holds {expected} particles")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Particle {index} has type {itype}, outside 1..={ntypes}")]
    InvalidType {
        index: usize,
        itype: usize,
        ntypes: usize,
    },
    #[error("Owned particle count {nlocal} exceeds the {len} stored particles")]
    OwnedCountExceeds { nlocal: usize, len: usize },
    #[error("Neighbor index {index} is out of range for {len} particles")]
    NeighborOutOfRange { index: usize, len: usize },
    #[error("Neighbor index {index} exceeds the packable maximum {max}")]
    NeighborIndexTooLarge { index: usize, max: usize },
    #[error("Neighbor list row refers to particle {0}, which is not locally owned")]
    RowNotOwned(usize),
}
