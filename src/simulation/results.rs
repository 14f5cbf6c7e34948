// src/simulation/results.rs
use crate::core::Qubit;
use std::collections::BTreeMap;
use std::fmt;

/// The classical record of one run: the outcome bit of every measured qubit,
/// in measurement order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Outcome {
    bits: Vec<(Qubit, u8)>,
}

impl Outcome {
    /// Creates an outcome from `(qubit, bit)` pairs in measurement order.
    pub fn new(bits: Vec<(Qubit, u8)>) -> Self {
        Self { bits }
    }

    /// All `(qubit, bit)` pairs in measurement order.
    pub fn bits(&self) -> &[(Qubit, u8)] {
        &self.bits
    }

    /// The bit recorded for `qubit`, if it was measured.
    pub fn bit(&self, qubit: Qubit) -> Option<u8> {
        self.bits.iter().find(|(q, _)| *q == qubit).map(|(_, b)| *b)
    }

    /// The bits of `qubits`, in the order given. `None` if any was not measured.
    pub fn values(&self, qubits: &[Qubit]) -> Option<Vec<u8>> {
        qubits.iter().map(|q| self.bit(*q)).collect()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (q, b)) in self.bits.iter().enumerate() {
            write!(f, "{}{}={}", if i > 0 { ", " } else { "" }, q, b)?;
        }
        write!(f, "]")
    }
}

/// A probability distribution over outcomes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution {
    probabilities: BTreeMap<Outcome, f64>,
}

impl Distribution {
    /// Creates an empty distribution. (Internal visibility)
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `probability` to the mass of `outcome`. (Internal visibility)
    pub(crate) fn record(&mut self, outcome: Outcome, probability: f64) {
        *self.probabilities.entry(outcome).or_insert(0.0) += probability;
    }

    /// Empirical distribution of a list of shot outcomes.
    pub fn from_shots(shots: &[Outcome]) -> Self {
        let mut distribution = Self::new();
        if shots.is_empty() {
            return distribution;
        }
        let weight = 1.0 / shots.len() as f64;
        for outcome in shots {
            distribution.record(outcome.clone(), weight);
        }
        distribution
    }

    /// Probability of `outcome`; 0 if it never occurs.
    pub fn probability(&self, outcome: &Outcome) -> f64 {
        self.probabilities.get(outcome).copied().unwrap_or(0.0)
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }

    /// Number of outcomes with recorded mass.
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Returns `true` if no outcome has been recorded.
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Iterates over `(outcome, probability)` in outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (&Outcome, f64)> {
        self.probabilities.iter().map(|(o, p)| (o, *p))
    }

    /// Marginal distribution of the bits of `qubits`.
    /// Outcomes lacking any of the qubits are skipped.
    pub fn marginal(&self, qubits: &[Qubit]) -> BTreeMap<Vec<u8>, f64> {
        let mut marginal = BTreeMap::new();
        for (outcome, p) in &self.probabilities {
            if let Some(values) = outcome.values(qubits) {
                *marginal.entry(values).or_insert(0.0) += p;
            }
        }
        marginal
    }

    /// Largest absolute probability difference over the union of both supports.
    pub fn max_abs_difference(&self, other: &Distribution) -> f64 {
        self.probabilities
            .keys()
            .chain(other.probabilities.keys())
            .map(|o| (self.probability(o) - other.probability(o)).abs())
            .fold(0.0, f64::max)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distribution ({} outcomes):", self.len())?;
        for (outcome, p) in self.iter() {
            writeln!(f, "  {}: {:.6}", outcome, p)?;
        }
        Ok(())
    }
}

/// What [`super::Simulator::evaluate`] produces for each mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// One outcome per shot.
    Shots(Vec<Outcome>),
    /// The exact distribution over outcomes.
    Exact(Distribution),
}

impl Evaluation {
    /// The shot outcomes, if this is a shot-mode evaluation.
    pub fn shots(&self) -> Option<&[Outcome]> {
        match self {
            Evaluation::Shots(shots) => Some(shots),
            Evaluation::Exact(_) => None,
        }
    }

    /// The exact distribution, if this is an exact-mode evaluation.
    pub fn distribution(&self) -> Option<&Distribution> {
        match self {
            Evaluation::Exact(distribution) => Some(distribution),
            Evaluation::Shots(_) => None,
        }
    }

    /// Turns either mode into a distribution (empirical for shots).
    pub fn into_distribution(self) -> Distribution {
        match self {
            Evaluation::Exact(distribution) => distribution,
            Evaluation::Shots(shots) => Distribution::from_shots(&shots),
        }
    }
}
