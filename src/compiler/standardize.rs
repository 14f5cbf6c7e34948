// src/compiler/standardize.rs

//! Rewrites a pattern into standard form: all entanglements first, then
//! measurements, then the corrections that remain on output qubits.
//!
//! The rewrite uses the commutation rules of the measurement calculus
//! (commands in program order, left to right):
//!
//! - `X_i^s ; E_ij` becomes `E_ij ; X_i^s ; Z_j^s`,
//! - `Z_i^s ; E_ij` becomes `E_ij ; Z_i^s`,
//! - `X_i^s ; M_i^{α,S,T}` becomes `M_i^{α,S⊕s,T}`,
//! - `Z_i^s ; M_i^{α,S,T}` becomes `M_i^{α,S,T⊕s}`,
//! - commands on disjoint qubits commute.
//!
//! Outcome distributions are unchanged; only global phases differ.

use crate::core::{MbqcError, Result};
use crate::operations::{Command, merge_signals};
use crate::pattern::Pattern;
use crate::validation::check;
use tracing::debug;

/// Brings a well-formed pattern into standard form.
///
/// # Errors
/// `MbqcError::IllFormed` if `pattern` fails the well-formedness check; the
/// rewrite rules are only sound on well-formed patterns.
pub fn standardize(pattern: &Pattern) -> Result<Pattern> {
    check(pattern).map_err(MbqcError::IllFormed)?;

    let (entangles, rest) = hoist_entanglements(pattern.commands());
    let tail = absorb_corrections(rest);

    let mut commands = entangles;
    commands.extend(tail);
    debug!(
        before = pattern.len(),
        after = commands.len(),
        "pattern standardized"
    );
    Ok(Pattern::new(pattern.preparations().to_vec(), commands))
}

/// `true` if every entanglement precedes every measurement and correction,
/// and no correction precedes a measurement.
pub fn is_standard(pattern: &Pattern) -> bool {
    let mut seen_measure = false;
    let mut seen_correction = false;
    for command in pattern.commands() {
        match command {
            Command::Entangle(..) if seen_measure || seen_correction => return false,
            Command::Entangle(..) => {}
            Command::Measure { .. } if seen_correction => return false,
            Command::Measure { .. } => seen_measure = true,
            Command::XCorrect(..) | Command::ZCorrect(..) => seen_correction = true,
        }
    }
    true
}

/// Moves every `Entangle` to the front, in original relative order.
///
/// Each entanglement is commuted leftward over the non-entangling commands
/// preceding it. Passing `X_i^s` with `i` one of its qubits spawns `Z_j^s`
/// on the partner `j`, inserted right after that X correction.
fn hoist_entanglements(commands: &[Command]) -> (Vec<Command>, Vec<Command>) {
    let mut entangles = Vec::new();
    let mut rest: Vec<Command> = Vec::new();

    for command in commands {
        let (a, b) = match command {
            Command::Entangle(a, b) => (*a, *b),
            _ => {
                rest.push(command.clone());
                continue;
            }
        };

        let mut commuted = Vec::with_capacity(rest.len());
        for earlier in rest.drain(..) {
            let spawned = match &earlier {
                Command::XCorrect(q, signals) if *q == a => Some(Command::ZCorrect(b, signals.clone())),
                Command::XCorrect(q, signals) if *q == b => Some(Command::ZCorrect(a, signals.clone())),
                // Z commutes with E; D1 rules out measurements of a or b here.
                _ => None,
            };
            commuted.push(earlier);
            commuted.extend(spawned);
        }
        rest = commuted;
        entangles.push(command.clone());
    }

    (entangles, rest)
}

/// Pushes corrections rightward, folding each into the measurement of its
/// qubit when one follows. Corrections on output qubits end up at the end,
/// in their original relative order.
fn absorb_corrections(commands: Vec<Command>) -> Vec<Command> {
    let mut measurements = Vec::new();
    let mut pending: Vec<Command> = Vec::new();

    for command in commands {
        match command {
            Command::Measure { qubit, angle, mut s, mut t } => {
                pending.retain(|correction| match correction {
                    Command::XCorrect(q, signals) if *q == qubit => {
                        s = merge_signals(&s, signals);
                        false
                    }
                    Command::ZCorrect(q, signals) if *q == qubit => {
                        t = merge_signals(&t, signals);
                        false
                    }
                    _ => true,
                });
                measurements.push(Command::Measure { qubit, angle, s, t });
            }
            Command::XCorrect(..) | Command::ZCorrect(..) => pending.push(command),
            // Only reachable if called before hoisting; keep program order.
            Command::Entangle(..) => measurements.push(command),
        }
    }

    measurements.extend(pending.into_iter().filter(|c| !has_empty_signals(c)));
    measurements
}

/// A correction conditioned on no signals never fires.
fn has_empty_signals(command: &Command) -> bool {
    match command {
        Command::XCorrect(_, signals) | Command::ZCorrect(_, signals) => {
            merge_signals(signals, &[]).is_empty()
        }
        _ => false,
    }
}
