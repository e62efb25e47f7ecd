//! Domain types and pure scheduling logic for the study planner.
//!
//! This crate has zero internal dependencies and performs no I/O. The
//! `db` crate persists what these modules compute; the `planner` crate
//! orchestrates them against real collaborators.

pub mod adaptation;
pub mod assignment;
pub mod catalog;
pub mod dependency;
pub mod error;
pub mod feasibility;
pub mod preferences;
pub mod progress;
pub mod stats;
pub mod types;
