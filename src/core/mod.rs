// src/core/mod.rs

//! Core data structures and types

// Declare modules within core
pub mod error;
pub mod qubit;
pub mod state;

// Re-export public types for convenient access via `mcalc::core::TypeName`
pub use error::{MbqcError, Result};
pub use qubit::Qubit;
pub use state::{JointState, QubitState};

pub mod constants;
pub use constants::mcalc_constants::{DEFAULT_TOLERANCE, FRAC_1_SQRT_2, PI, PROBABILITY_FLOOR};
