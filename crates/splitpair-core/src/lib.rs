//! # splitpair Core Library
//!
//! A split-range pairwise interaction kernel for particle simulations: 12-6 Lennard-Jones
//! plus Coulomb, with the long-range part of either interaction handed to a reciprocal-space
//! (Ewald-type) solver, evaluated in closed form or through bounded-error interpolation tables,
//! and optionally decomposed across the levels of a multi-rate (RESPA) integrator.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data and mathematics: per-type-pair parameters
//!   and mixing rules, the real-space kernels, interpolation tables, special-bond factors,
//!   particle storage, packed neighbor lists and the TOML input format.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer. It validates settings against the
//!   k-space collaborator, resolves every type pair, builds tables, and runs the per-pair loop
//!   with newton-rule force accumulation, energy/virial tallies and RESPA decomposition. It
//!   also owns checkpoint state I/O and the runtime registry of pair styles.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures built on the engine, such as
//!   setting up an initialised evaluator from an input file or tabulating a pair curve.

pub mod core;
pub mod engine;
pub mod workflows;
