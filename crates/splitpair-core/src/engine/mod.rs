//! # Engine Module
//!
//! Stateful orchestration of the split-range pair interaction: settings, the pair-style
//! capability interface, the initialised evaluator and its multi-rate decomposition.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Interaction modes, cutoffs, mixing and table settings
//! - **Pair styles** ([`pair`], [`registry`]) - Coefficient assignment, validation and
//!   initialisation, with styles looked up by name at runtime
//! - **Evaluation** ([`evaluator`], [`respa`], [`tally`]) - The per-pair force loop, its
//!   RESPA level split, and energy/virial accumulation under the newton ownership rule
//! - **Collaborators** ([`kspace`]) - The reciprocal-space solver seam
//! - **Checkpointing** ([`restart`]) - Binary settings and coefficient records
//! - **Error Handling** ([`error`]) - The fatal configuration error umbrella
//!
//! Everything that can fail does so while a style is being configured or initialised; the
//! force loop itself only reports inconsistent particle data.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod kspace;
pub mod pair;
pub mod registry;
pub mod respa;
pub mod restart;
pub mod tally;
