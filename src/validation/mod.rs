// src/validation/mod.rs

//! Well-formedness checking of patterns (the D0–D4 conditions of the
//! measurement calculus) and numeric consistency checks on joint states.

use crate::core::{JointState, MbqcError, Qubit, Result};
use crate::operations::Command;
use crate::pattern::Pattern;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Which condition a [`Violation`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A signal references a qubit that has not been measured yet.
    D0,
    /// A command acts on a qubit that has already been measured.
    D1,
    /// A command acts on a qubit that was never prepared.
    D2,
    /// The prepared identifiers are not exactly `0..n`.
    D4,
    /// The same qubit is declared by more than one preparation.
    DuplicatePreparation,
    /// `Entangle(q, q)`.
    SelfEntanglement,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::D0 => "D0",
            ViolationKind::D1 => "D1",
            ViolationKind::D2 => "D2",
            ViolationKind::D4 => "D4",
            ViolationKind::DuplicatePreparation => "duplicate preparation",
            ViolationKind::SelfEntanglement => "self-entanglement",
        };
        f.write_str(name)
    }
}

/// One diagnostic produced by [`check`].
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The broken condition.
    pub kind: ViolationKind,
    /// Index and copy of the offending command; `None` for program-level
    /// violations (D4, duplicate preparations).
    pub command: Option<(usize, Command)>,
    /// Qubits the violation is about (e.g. the unmeasured signal, the
    /// missing identifiers).
    pub qubits: Vec<Qubit>,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    fn at(kind: ViolationKind, index: usize, command: &Command, qubits: Vec<Qubit>, message: String) -> Self {
        Self { kind, command: Some((index, command.clone())), qubits, message }
    }

    fn global(kind: ViolationKind, qubits: Vec<Qubit>, message: String) -> Self {
        Self { kind, command: None, qubits, message }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command {
            Some((index, command)) => write!(f, "[{}] command #{} {:?}: {}", self.kind, index, command, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Checks the D0–D4 conditions and returns the number of qubits.
///
/// All violations are collected in a single pass over the commands followed
/// by a global pass over the prepared identifiers; checking does not stop at
/// the first problem.
///
/// # Returns
/// * `Ok(n)` if the pattern is well-formed; `n` equals the number of distinct
///   prepared qubits and the prepared identifiers are exactly `0..n`.
/// * `Err(violations)` with at least one entry otherwise.
pub fn check(pattern: &Pattern) -> std::result::Result<usize, Vec<Violation>> {
    let mut violations = Vec::new();

    // 1. Prepared set (and duplicates) from the preparation list.
    let mut prepared: BTreeSet<Qubit> = BTreeSet::new();
    for preparation in pattern.preparations() {
        for (qubit, _) in preparation.declared() {
            if !prepared.insert(qubit) {
                violations.push(Violation::global(
                    ViolationKind::DuplicatePreparation,
                    vec![qubit],
                    format!("qubit {} is prepared more than once", qubit),
                ));
            }
        }
    }

    // 2. Walk the commands in program order.
    let mut measured: BTreeSet<Qubit> = BTreeSet::new();
    for (index, command) in pattern.commands().iter().enumerate() {
        if let Command::Entangle(a, b) = command {
            if a == b {
                violations.push(Violation::at(
                    ViolationKind::SelfEntanglement,
                    index,
                    command,
                    vec![*a],
                    format!("qubit {} cannot be entangled with itself", a),
                ));
            }
        }

        for qubit in command.targets() {
            if !prepared.contains(&qubit) {
                violations.push(Violation::at(
                    ViolationKind::D2,
                    index,
                    command,
                    vec![qubit],
                    format!("qubit {} is used but never prepared", qubit),
                ));
            }
            if measured.contains(&qubit) {
                violations.push(Violation::at(
                    ViolationKind::D1,
                    index,
                    command,
                    vec![qubit],
                    format!("qubit {} is acted on after it was measured", qubit),
                ));
            }
        }

        for signal in command.signals() {
            if !measured.contains(&signal) {
                violations.push(Violation::at(
                    ViolationKind::D0,
                    index,
                    command,
                    vec![signal],
                    format!("signal {} is read before it is measured", signal),
                ));
            }
        }

        if let Command::Measure { qubit, .. } = command {
            measured.insert(*qubit);
        }
    }

    // 3. Prepared identifiers must be exactly 0..n.
    let n = prepared.len();
    let expected: BTreeSet<Qubit> = (0..n).map(Qubit).collect();
    if prepared != expected {
        let missing: Vec<Qubit> = match prepared.last() {
            Some(max) => (0..max.index()).map(Qubit).filter(|q| !prepared.contains(q)).collect(),
            None => Vec::new(),
        };
        let listed: Vec<String> = missing.iter().map(|q| q.to_string()).collect();
        violations.push(Violation::global(
            ViolationKind::D4,
            missing,
            format!(
                "prepared qubits are not contiguous from q0: {} prepared, missing [{}]",
                n,
                listed.join(", ")
            ),
        ));
    }

    if violations.is_empty() {
        Ok(n)
    } else {
        debug!(violations = violations.len(), "pattern rejected by well-formedness check");
        Err(violations)
    }
}

/// A pattern that has passed [`check`], together with its qubit count.
///
/// The simulation engine only accepts this type, so executing an unchecked
/// or rejected pattern cannot be expressed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedPattern {
    pattern: Pattern,
    num_qubits: usize,
}

impl CheckedPattern {
    /// Checks `pattern` and wraps it on success.
    ///
    /// # Errors
    /// `MbqcError::IllFormed` carrying every violation found.
    pub fn new(pattern: Pattern) -> Result<Self> {
        let num_qubits = check(&pattern).map_err(MbqcError::IllFormed)?;
        Ok(Self { pattern, num_qubits })
    }

    /// The checked pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Number of qubits (`n`, with identifiers `0..n`).
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Unwraps the pattern.
    pub fn into_pattern(self) -> Pattern {
        self.pattern
    }
}

impl TryFrom<Pattern> for CheckedPattern {
    type Error = MbqcError;

    fn try_from(pattern: Pattern) -> Result<Self> {
        CheckedPattern::new(pattern)
    }
}

/// Checks if the state vector is normalized (sum of squared amplitudes ≈ 1.0).
///
/// # Arguments
/// * `state` - The `JointState` to check.
/// * `tolerance` - Allowed deviation from 1.0.
/// * `context` - Where the check happens; copied into the error.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(MbqcError::NumericConsistency)` otherwise.
pub fn check_normalization(state: &JointState, tolerance: f64, context: &str) -> Result<()> {
    check_total(state.norm_sqr(), tolerance, context)
}

/// Checks that a total probability is within `tolerance` of 1.
pub fn check_total(total: f64, tolerance: f64, context: &str) -> Result<()> {
    if (total - 1.0).abs() > tolerance || !total.is_finite() {
        Err(MbqcError::NumericConsistency { context: context.to_string(), total, tolerance })
    } else {
        Ok(())
    }
}
