// src/core/qubit.rs

use std::fmt;

/// Identifier of a qubit inside a single pattern.
///
/// Identifiers are plain indices: a well-formed pattern prepares exactly the
/// qubits `0..n`, which lets the simulation engine use the id directly as an
/// index into flat per-qubit arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qubit(pub usize);

impl Qubit {
    /// Returns the raw index of this qubit.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for Qubit {
    fn from(index: usize) -> Self {
        Qubit(index)
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}
