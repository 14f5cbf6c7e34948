// src/simulation/mod.rs

//! Executes checked patterns on a dense state vector.
//! This module contains the `Simulator` entry point, its configuration, and
//! the internal `SimulationEngine` that evolves the state command by command.

mod results;
pub(crate) mod engine;

pub use results::{Distribution, Evaluation, Outcome};

use crate::core::constants::mcalc_constants::DEFAULT_MAX_QUBITS;
use crate::core::{DEFAULT_TOLERANCE, MbqcError, Result};
use crate::pattern::Pattern;
use crate::validation::CheckedPattern;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

/// How a pattern is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run the pattern this many times, sampling every measurement.
    Shots(usize),
    /// Enumerate every measurement branch and return exact probabilities.
    Exact,
}

/// Simulator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Master seed for shot mode. `None` draws a fresh seed per evaluation.
    pub seed: Option<u64>,
    /// Run shots on the rayon thread pool.
    pub parallel: bool,
    /// Allowed deviation of totals and norms from 1.
    pub tolerance: f64,
    /// Largest qubit count accepted before any state is allocated.
    pub max_qubits: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { seed: None, parallel: false, tolerance: DEFAULT_TOLERANCE, max_qubits: DEFAULT_MAX_QUBITS }
    }
}

impl SimulatorConfig {
    /// Fixes the master seed so shot runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Runs shots on the rayon pool when `true`.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the allowed deviation of probability totals and norms from 1.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the largest qubit count the simulator accepts.
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }
}

/// The main simulator orchestrating pattern evaluation.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Creates a new Simulator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a simulator with the given settings.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// The settings this simulator runs with.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Checks `pattern` and evaluates it.
    ///
    /// # Errors
    /// * `MbqcError::Precondition` if the pattern is not well-formed (every
    ///   violation is carried in `violations` and listed in the message) or
    ///   has more than `max_qubits` qubits.
    /// * `MbqcError::NumericConsistency` if a probability total or a
    ///   post-collapse norm drifts from 1 beyond the tolerance.
    pub fn evaluate(&self, pattern: &Pattern, mode: Mode) -> Result<Evaluation> {
        let checked = CheckedPattern::new(pattern.clone()).map_err(|err| match err {
            MbqcError::IllFormed(violations) => {
                let listed: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                MbqcError::Precondition {
                    message: format!("cannot evaluate a rejected pattern: {}", listed.join("; ")),
                    violations,
                }
            }
            other => other,
        })?;
        self.evaluate_checked(&checked, mode)
    }

    /// Evaluates an already checked pattern.
    pub fn evaluate_checked(&self, pattern: &CheckedPattern, mode: Mode) -> Result<Evaluation> {
        self.ensure_capacity(pattern)?;
        debug!(qubits = pattern.num_qubits(), commands = pattern.pattern().len(), ?mode, "evaluation started");
        let evaluation = match mode {
            Mode::Shots(shots) => {
                let mut rng = match self.config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::seed_from_u64(rand::random::<u64>()),
                };
                Evaluation::Shots(self.run_shots_with(pattern, shots, &mut rng)?)
            }
            Mode::Exact => Evaluation::Exact(self.exact_distribution(pattern)?),
        };
        debug!(?mode, "evaluation finished");
        Ok(evaluation)
    }

    /// Runs `shots` randomized executions, drawing every random choice from `rng`.
    ///
    /// Each shot gets its own generator seeded from `rng`, so a given `rng`
    /// state yields the same outcomes with or without `parallel`.
    pub fn run_shots_with(&self, pattern: &CheckedPattern, shots: usize, rng: &mut StdRng) -> Result<Vec<Outcome>> {
        self.ensure_capacity(pattern)?;
        let seeds: Vec<u64> = (0..shots).map(|_| rng.random::<u64>()).collect();
        let tolerance = self.config.tolerance;
        let run = |seed: u64| engine::run_shot(pattern, tolerance, &mut StdRng::seed_from_u64(seed));

        if self.config.parallel {
            seeds.into_par_iter().map(run).collect()
        } else {
            seeds.into_iter().map(run).collect()
        }
    }

    /// Shot mode with the configured seed, see [`Self::run_shots_with`].
    pub fn run_shots(&self, pattern: &CheckedPattern, shots: usize) -> Result<Vec<Outcome>> {
        match self.evaluate_checked(pattern, Mode::Shots(shots))? {
            Evaluation::Shots(outcomes) => Ok(outcomes),
            Evaluation::Exact(_) => Err(MbqcError::Internal {
                message: "shot mode produced an exact distribution".to_string(),
            }),
        }
    }

    /// The exact outcome distribution of `pattern`.
    pub fn exact_distribution(&self, pattern: &CheckedPattern) -> Result<Distribution> {
        self.ensure_capacity(pattern)?;
        engine::enumerate(pattern, self.config.tolerance)
    }

    fn ensure_capacity(&self, pattern: &CheckedPattern) -> Result<()> {
        if pattern.num_qubits() > self.config.max_qubits {
            return Err(MbqcError::precondition(format!(
                "pattern uses {} qubits, simulator is limited to {}",
                pattern.num_qubits(),
                self.config.max_qubits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Qubit;
    use crate::pattern::PatternBuilder;

    fn q(i: usize) -> Qubit {
        Qubit(i)
    }

    fn coin() -> CheckedPattern {
        CheckedPattern::new(
            PatternBuilder::new()
                .init_plus(q(0))
                .measure(q(0), std::f64::consts::FRAC_PI_2, vec![], vec![])
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn config_defaults_and_setters() {
        let config = SimulatorConfig::default();
        assert_eq!(config.seed, None);
        assert!(!config.parallel);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.max_qubits, DEFAULT_MAX_QUBITS);

        let config = config.with_seed(3).with_parallel(true).with_tolerance(1e-6).with_max_qubits(4);
        assert_eq!(config, SimulatorConfig { seed: Some(3), parallel: true, tolerance: 1e-6, max_qubits: 4 });
        assert_eq!(Simulator::with_config(config).config(), &config);
    }

    #[test]
    fn seeded_shots_are_reproducible() {
        let simulator = Simulator::with_config(SimulatorConfig::default().with_seed(42));
        let first = simulator.run_shots(&coin(), 64).unwrap();
        let second = simulator.run_shots(&coin(), 64).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn parallel_matches_sequential() {
        let pattern = coin();
        let sequential = Simulator::new()
            .run_shots_with(&pattern, 100, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let parallel = Simulator::with_config(SimulatorConfig::default().with_parallel(true))
            .run_shots_with(&pattern, 100, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn qubit_limit_is_a_precondition() {
        let simulator = Simulator::with_config(SimulatorConfig::default().with_max_qubits(0));
        assert!(matches!(simulator.evaluate_checked(&coin(), Mode::Exact), Err(MbqcError::Precondition { .. })));
    }

    #[test]
    fn zero_shots_yield_no_outcomes() {
        let outcomes = Simulator::new().run_shots(&coin(), 0).unwrap();
        assert!(outcomes.is_empty());
    }
}
