//! # Core Module
//!
//! Stateless building blocks of the pair kernel.
//!
//! - **Interaction mathematics** ([`forcefield`]) - Coefficients, mixing rules, closed-form
//!   kernels, interpolation tables and special-bond scaling
//! - **Particle data** ([`models`]) - Positions, types and charges of owned and ghost particles,
//!   and neighbor lists with packed special-bond codes
//! - **File I/O** ([`io`]) - The TOML description of a pair setup

pub mod forcefield;
pub mod io;
pub mod models;
