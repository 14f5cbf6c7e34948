// src/pattern/mod.rs

//! Defines the pattern: the `(preparations, commands)` pair that makes up a
//! measurement-calculus program, and a builder for constructing it.

use crate::core::Qubit;
use crate::operations::{Command, Preparation, Signals};
use std::collections::BTreeSet;

/// An MBQC program: an ordered list of preparations followed by an ordered
/// list of commands.
///
/// A `Pattern` is plain data. It is not guaranteed to be well-formed; run it
/// through [`crate::validation::check`] (or wrap it in a
/// [`crate::validation::CheckedPattern`]) before simulating.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    preparations: Vec<Preparation>,
    commands: Vec<Command>,
}

impl Pattern {
    /// Creates a pattern from its two lists.
    pub fn new(preparations: Vec<Preparation>, commands: Vec<Command>) -> Self {
        Self { preparations, commands }
    }

    /// The preparation list.
    pub fn preparations(&self) -> &[Preparation] {
        &self.preparations
    }

    /// The command list, in program order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Splits the pattern back into its two lists.
    pub fn into_parts(self) -> (Vec<Preparation>, Vec<Command>) {
        (self.preparations, self.commands)
    }

    /// Every qubit declared by a preparation.
    pub fn prepared(&self) -> BTreeSet<Qubit> {
        self.preparations
            .iter()
            .flat_map(|p| p.declared())
            .map(|(q, _)| q)
            .collect()
    }

    /// Qubits declared by input preparations (everything but `InitNonInput`).
    pub fn inputs(&self) -> BTreeSet<Qubit> {
        self.preparations
            .iter()
            .filter(|p| p.is_input())
            .flat_map(|p| p.declared())
            .map(|(q, _)| q)
            .collect()
    }

    /// Measured qubits in measurement order.
    pub fn measured(&self) -> Vec<Qubit> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Measure { qubit, .. } => Some(*qubit),
                _ => None,
            })
            .collect()
    }

    /// Output qubits: prepared but never measured (D3).
    pub fn outputs(&self) -> BTreeSet<Qubit> {
        let measured: BTreeSet<Qubit> = self.measured().into_iter().collect();
        self.prepared().difference(&measured).copied().collect()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if the pattern has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Fluent builder for [`Pattern`].
///
/// ```
/// use mcalc::{Qubit, PatternBuilder, check};
///
/// let (q0, q1) = (Qubit(0), Qubit(1));
/// let pattern = PatternBuilder::new()
///     .init_plus(q0)
///     .non_input(vec![q1])
///     .entangle(q0, q1)
///     .measure(q0, 0.0, vec![], vec![])
///     .x_correct(q1, vec![q0])
///     .build();
///
/// assert_eq!(check(&pattern), Ok(2));
/// ```
#[derive(Debug, Default)]
pub struct PatternBuilder {
    pattern: Pattern,
}

impl PatternBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a preparation.
    pub fn prepare(mut self, preparation: Preparation) -> Self {
        self.pattern.preparations.push(preparation);
        self
    }

    /// Appends a command.
    pub fn command(mut self, command: Command) -> Self {
        self.pattern.commands.push(command);
        self
    }

    /// Appends several commands.
    pub fn commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = Command>,
    {
        self.pattern.commands.extend(commands);
        self
    }

    /// `InitPlus(qubit)`
    pub fn init_plus(self, qubit: Qubit) -> Self {
        self.prepare(Preparation::InitPlus(qubit))
    }

    /// `InitNonInput(qubits)`
    pub fn non_input(self, qubits: Vec<Qubit>) -> Self {
        self.prepare(Preparation::InitNonInput(qubits))
    }

    /// `Entangle(a, b)`
    pub fn entangle(self, a: Qubit, b: Qubit) -> Self {
        self.command(Command::Entangle(a, b))
    }

    /// `Measure(qubit, angle, s, t)`
    pub fn measure(self, qubit: Qubit, angle: f64, s: Signals, t: Signals) -> Self {
        self.command(Command::measure(qubit, angle, s, t))
    }

    /// `XCorrect(qubit, signals)`
    pub fn x_correct(self, qubit: Qubit, signals: Signals) -> Self {
        self.command(Command::XCorrect(qubit, signals))
    }

    /// `ZCorrect(qubit, signals)`
    pub fn z_correct(self, qubit: Qubit, signals: Signals) -> Self {
        self.command(Command::ZCorrect(qubit, signals))
    }

    /// Finalizes the construction process and returns the built `Pattern`.
    pub fn build(self) -> Pattern {
        self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_qubit_sets() {
        let pattern = PatternBuilder::new()
            .prepare(Preparation::Init0(Qubit(0)))
            .non_input(vec![Qubit(1), Qubit(2)])
            .entangle(Qubit(0), Qubit(1))
            .measure(Qubit(0), 0.0, vec![], vec![])
            .entangle(Qubit(1), Qubit(2))
            .measure(Qubit(1), 0.0, vec![Qubit(0)], vec![])
            .build();

        assert_eq!(pattern.len(), 4);
        assert_eq!(pattern.inputs().into_iter().collect::<Vec<_>>(), vec![Qubit(0)]);
        assert_eq!(pattern.measured(), vec![Qubit(0), Qubit(1)]);
        assert_eq!(pattern.outputs().into_iter().collect::<Vec<_>>(), vec![Qubit(2)]);
        assert_eq!(pattern.prepared().len(), 3);
    }

    #[test]
    fn empty_pattern_has_no_outputs() {
        let pattern = Pattern::default();
        assert!(pattern.is_empty());
        assert!(pattern.outputs().is_empty());
    }
}
