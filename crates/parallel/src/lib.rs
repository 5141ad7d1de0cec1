//! # covmap parallel
//!
//! Execution of independent (country, year, indicator) units.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, all cores, or a bounded pool
//! - `run_isolated`: runs every unit and turns its error or panic into a
//!   per-unit `TaskOutcome` instead of aborting the batch

pub mod isolation;
pub mod strategy;

pub use isolation::{run_isolated, TaskOutcome};
pub use strategy::{num_cpus, ParallelError, ParallelStrategy, ProcessingMode};
