//! Reading pair setups from disk.
//!
//! A setup file is TOML describing the type count, the style and its settings, the
//! Ewald splitting parameters, special-bond factors, optional RESPA shells and the
//! coefficient assignments.

pub mod input;
