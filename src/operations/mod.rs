// src/operations/mod.rs

//! Defines the elementary preparations and commands of the measurement
//! calculus.
//!
//! A pattern is built from exactly these variants. Both enums are closed:
//! the checker, the standardizer and the simulation engine all match on them
//! exhaustively, so adding a new kind of command forces each of them to be
//! updated.

use crate::core::{Qubit, QubitState};
use std::collections::BTreeSet;

/// A set of measured qubits whose outcomes are XOR-ed together.
///
/// Kept as a list: a qubit listed twice contributes twice and therefore
/// cancels, which is exactly the parity semantics of the calculus.
pub type Signals = Vec<Qubit>;

/// Declares the initial state of one or more qubits before any command
/// touches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Preparation {
    /// Input qubit in `|+_α> = (|0> + e^{iα}|1>)/√2`.
    Init(Qubit, f64),
    /// Input qubit in `|0>`.
    Init0(Qubit),
    /// Input qubit in `|1>`.
    Init1(Qubit),
    /// Input qubit in `|+>`.
    InitPlus(Qubit),
    /// Input qubit in `|->`.
    InitMinus(Qubit),
    /// A batch of ancillary (non-input) qubits, each implicitly in `|+>`.
    InitNonInput(Vec<Qubit>),
}

impl Preparation {
    /// Returns every qubit this preparation declares, together with the
    /// state it starts in.
    pub fn declared(&self) -> Vec<(Qubit, QubitState)> {
        match self {
            Preparation::Init(q, angle) => vec![(*q, QubitState::Equatorial(*angle))],
            Preparation::Init0(q) => vec![(*q, QubitState::Zero)],
            Preparation::Init1(q) => vec![(*q, QubitState::One)],
            Preparation::InitPlus(q) => vec![(*q, QubitState::Plus)],
            Preparation::InitMinus(q) => vec![(*q, QubitState::Minus)],
            Preparation::InitNonInput(qs) => qs.iter().map(|q| (*q, QubitState::Plus)).collect(),
        }
    }

    /// `true` if the declared qubits are inputs of the pattern.
    pub fn is_input(&self) -> bool {
        !matches!(self, Preparation::InitNonInput(_))
    }
}

/// An elementary command of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Controlled-Z interaction between two prepared qubits.
    Entangle(Qubit, Qubit),

    /// Measurement in the XY plane.
    ///
    /// The effective angle is `(-1)^{parity(s)}·angle + parity(t)·π`, where
    /// `s` and `t` are the two signal sets. Outcome 0 corresponds to the
    /// projection onto `|+_θ>`, outcome 1 to `|-_θ>`.
    Measure {
        /// The measured qubit.
        qubit: Qubit,
        /// Base measurement angle in radians.
        angle: f64,
        /// Signals flipping the sign of the angle (pending X corrections).
        s: Signals,
        /// Signals adding π to the angle (pending Z corrections).
        t: Signals,
    },

    /// Pauli X on `qubit` if the parity of `signals` is 1.
    XCorrect(Qubit, Signals),

    /// Pauli Z on `qubit` if the parity of `signals` is 1.
    ZCorrect(Qubit, Signals),
}

impl Command {
    /// Convenience constructor for a measurement.
    pub fn measure(qubit: Qubit, angle: f64, s: Signals, t: Signals) -> Self {
        Command::Measure { qubit, angle, s, t }
    }

    /// Returns the qubits this command acts on (not the ones it reads signals from).
    pub fn targets(&self) -> Vec<Qubit> {
        match self {
            Command::Entangle(a, b) => vec![*a, *b],
            Command::Measure { qubit, .. } => vec![*qubit],
            Command::XCorrect(q, _) | Command::ZCorrect(q, _) => vec![*q],
        }
    }

    /// Returns every signal this command depends on, in declaration order.
    pub fn signals(&self) -> Vec<Qubit> {
        match self {
            Command::Entangle(..) => Vec::new(),
            Command::Measure { s, t, .. } => s.iter().chain(t.iter()).copied().collect(),
            Command::XCorrect(_, signals) | Command::ZCorrect(_, signals) => signals.clone(),
        }
    }

    /// `true` for `XCorrect` and `ZCorrect`.
    pub fn is_correction(&self) -> bool {
        matches!(self, Command::XCorrect(..) | Command::ZCorrect(..))
    }
}

/// Parity (XOR) of the recorded outcomes of `signals`.
///
/// `outcome` looks up the bit of a measured qubit; the caller guarantees
/// every signal has been measured (D0).
pub fn parity<F>(signals: &[Qubit], mut outcome: F) -> u8
where
    F: FnMut(Qubit) -> u8,
{
    signals.iter().fold(0, |acc, q| acc ^ (outcome(*q) & 1))
}

/// Merges two signal sets while keeping their combined parity.
///
/// Qubits appearing an even number of times across both sets cancel; the
/// result is sorted and free of duplicates.
pub fn merge_signals(a: &[Qubit], b: &[Qubit]) -> Signals {
    let mut odd: BTreeSet<Qubit> = BTreeSet::new();
    for q in a.iter().chain(b.iter()) {
        if !odd.remove(q) {
            odd.insert(*q);
        }
    }
    odd.into_iter().collect()
}
