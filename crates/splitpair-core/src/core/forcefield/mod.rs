//! # Force Field Module
//!
//! The mathematics of one split-range pair interaction.
//!
//! ## Overview
//!
//! The interaction between two particles is a 12-6 Lennard-Jones term plus a Coulomb term.
//! Either term may be split Ewald-style: the real-space part handled here decays quickly
//! (Gaussian screening) while the smooth remainder is summed in reciprocal space by an
//! external solver. Bonded neighbors are scaled by special-bond factors, and for split terms
//! the excess bare interaction of a scaled pair is subtracted explicitly.
//!
//! ## Key Components
//!
//! - [`params`] - Explicit coefficients, type ranges, mixing rules and derived prefactors
//! - [`potentials`] - Closed-form kernels (screened Coulomb via a rational `erfc`
//!   approximation, damped dispersion, truncated LJ)
//! - [`table`] - Bit-pattern bucketed interpolation tables replacing the transcendental parts
//! - [`special`] - Special-bond codes and scale factors
//! - [`term`] - Energy aggregation by interaction kind

pub mod params;
pub mod potentials;
pub mod special;
pub mod table;
pub mod term;
