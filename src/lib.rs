//! Viability engine for rural mobile health units.
//!
//! The empirical side simulates real operation ([`simulation`]), the normative
//! side resolves an ideal configuration under goals and constraints
//! ([`optimizer`]), and [`gaps`] compares the two.

pub mod config;
pub mod finance;
pub mod gaps;
pub mod indicators;
pub mod model;
pub mod optimizer;
pub mod output;
pub mod params;
pub mod server;
pub mod simulation;
