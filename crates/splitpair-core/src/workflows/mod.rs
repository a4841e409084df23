//! # Workflows Module
//!
//! End-to-end entry points that tie [`crate::core`] and [`crate::engine`] together.
//!
//! - **Setup** ([`setup`]) - Builds an initialised evaluator from a TOML input description,
//!   including the hand-off of exports to the reciprocal-space collaborator.
//! - **Curves** ([`curve`]) - Samples energy and force of one type pair over a distance range
//!   and writes the result as CSV.

pub mod curve;
pub mod setup;
