// src/simulation/engine.rs
use crate::core::{FRAC_1_SQRT_2, JointState, MbqcError, PI, PROBABILITY_FLOOR, Qubit, QubitState, Result};
use crate::operations::Command;
use crate::simulation::{Distribution, Outcome};
use crate::validation::{CheckedPattern, check_normalization, check_total};
use num_complex::Complex;
use rand::RngExt;
use rand::rngs::StdRng;
use tracing::trace;

/// The state of one execution: the joint state vector plus the classical
/// outcomes recorded so far.
///
/// Outcomes are kept in a flat arena indexed by qubit id, which is sound
/// because a checked pattern prepares exactly the qubits `0..n`.
/// (Internal visibility)
#[derive(Debug, Clone)]
pub(crate) struct SimulationEngine {
    state: JointState,
    /// `outcomes[q]` is the bit recorded when qubit `q` was measured.
    outcomes: Vec<Option<u8>>,
    /// Measured qubits in measurement order.
    order: Vec<Qubit>,
    tolerance: f64,
}

/// The two outcome probabilities of a pending measurement at effective angle `theta`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Measurement {
    qubit: Qubit,
    theta: f64,
    probabilities: [f64; 2],
}

impl SimulationEngine {
    /// Builds the initial product state from the preparations of `pattern`.
    pub(crate) fn init(pattern: &CheckedPattern, tolerance: f64) -> Result<Self> {
        let n = pattern.num_qubits();
        let mut states: Vec<Option<QubitState>> = vec![None; n];
        for preparation in pattern.pattern().preparations() {
            for (qubit, state) in preparation.declared() {
                let slot = states.get_mut(qubit.index()).ok_or_else(|| MbqcError::Internal {
                    message: format!("qubit {} is outside the checked range 0..{}", qubit, n),
                })?;
                *slot = Some(state);
            }
        }
        let states = states
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| MbqcError::Internal { message: format!("qubit q{} has no preparation", i) })
            })
            .collect::<Result<Vec<_>>>()?;

        let state = JointState::product(states);
        check_normalization(&state, tolerance, "initial product state")?;
        Ok(Self { state, outcomes: vec![None; n], order: Vec::new(), tolerance })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &JointState {
        &self.state
    }

    /// The outcome recorded so far, in measurement order.
    pub(crate) fn outcome(&self) -> Result<Outcome> {
        let bits = self
            .order
            .iter()
            .map(|q| Ok((*q, self.recorded(*q)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Outcome::new(bits))
    }

    /// The bit recorded for `qubit`.
    ///
    /// # Errors
    /// `Internal` if `qubit` has not been measured; D0 rules this out for
    /// checked patterns.
    fn recorded(&self, qubit: Qubit) -> Result<u8> {
        self.outcomes.get(qubit.index()).copied().flatten().ok_or_else(|| MbqcError::Internal {
            message: format!("outcome of {} read before it was measured", qubit),
        })
    }

    /// XOR of the recorded outcomes of `signals`.
    fn signal_parity(&self, signals: &[Qubit]) -> Result<u8> {
        signals.iter().try_fold(0u8, |acc, q| -> Result<u8> { Ok(acc ^ (self.recorded(*q)? & 1)) })
    }

    /// Effective measurement angle `(-1)^{p(s)}·α + p(t)·π`.
    pub(crate) fn effective_angle(&self, angle: f64, s: &[Qubit], t: &[Qubit]) -> Result<f64> {
        let signed = if self.signal_parity(s)? == 1 { -angle } else { angle };
        Ok(signed + f64::from(self.signal_parity(t)?) * PI)
    }

    /// Applies a non-measuring command; measurements go through
    /// [`Self::prepare_measurement`] and [`Self::collapse`].
    pub(crate) fn apply(&mut self, index: usize, command: &Command) -> Result<()> {
        trace!(index, ?command, "applying command");
        match command {
            Command::Entangle(a, b) => self.apply_cz(a.index(), b.index()),
            Command::XCorrect(q, signals) => {
                if self.signal_parity(signals)? == 1 {
                    self.apply_x(q.index());
                }
            }
            Command::ZCorrect(q, signals) => {
                if self.signal_parity(signals)? == 1 {
                    self.apply_z(q.index());
                }
            }
            Command::Measure { .. } => {
                return Err(MbqcError::Internal {
                    message: format!("command #{} is a measurement and must be sampled or branched", index),
                });
            }
        }
        Ok(())
    }

    /// Computes the Born-rule probabilities of measuring `qubit` at `angle`
    /// adjusted by the signal sets.
    ///
    /// # Errors
    /// `NumericConsistency` if `p0 + p1` is not within tolerance of 1.
    pub(crate) fn prepare_measurement(
        &self,
        index: usize,
        qubit: Qubit,
        angle: f64,
        s: &[Qubit],
        t: &[Qubit],
    ) -> Result<Measurement> {
        let theta = self.effective_angle(angle, s, t)?;
        let probabilities = [0u8, 1].map(|k| self.projected(qubit.index(), theta, k).map(|(_, _, c)| c.norm_sqr()).sum::<f64>());
        check_total(
            probabilities[0] + probabilities[1],
            self.tolerance,
            &format!("measurement of {} (command #{})", qubit, index),
        )?;
        Ok(Measurement { qubit, theta, probabilities })
    }

    /// Collapses onto `outcome` of `measurement`, renormalizes, and records the bit.
    pub(crate) fn collapse(&mut self, index: usize, measurement: &Measurement, outcome: u8) -> Result<()> {
        let Measurement { qubit, theta, probabilities } = *measurement;
        let p = probabilities[usize::from(outcome)];
        if p <= PROBABILITY_FLOOR {
            return Err(MbqcError::NumericConsistency {
                context: format!("collapse of {} onto impossible outcome {} (command #{})", qubit, outcome, index),
                total: p,
                tolerance: PROBABILITY_FLOOR,
            });
        }

        let scale = 1.0 / p.sqrt();
        let sign = if outcome == 0 { 1.0 } else { -1.0 };
        // Post-measurement basis vector |±_θ> = (|0> ± e^{iθ}|1>)/√2.
        let basis_one = Complex::from_polar(sign * FRAC_1_SQRT_2, theta);
        let basis_zero = Complex::new(FRAC_1_SQRT_2, 0.0);

        let projected: Vec<(usize, usize, Complex<f64>)> = self.projected(qubit.index(), theta, outcome).collect();
        let amplitudes = self.state.amplitudes_mut();
        for (i0, i1, c) in projected {
            let c = c * scale;
            amplitudes[i0] = c * basis_zero;
            amplitudes[i1] = c * basis_one;
        }
        check_normalization(&self.state, self.tolerance, &format!("collapse of {} (command #{})", qubit, index))?;

        self.outcomes[qubit.index()] = Some(outcome);
        self.order.push(qubit);
        trace!(index, %qubit, outcome, probability = p, "measured");
        Ok(())
    }

    /// Projections `⟨±_θ|_q ψ` for every index pair of `qubit`, as
    /// `(i0, i1, (ψ_{i0} ± e^{-iθ}ψ_{i1})/√2)`.
    fn projected(&self, qubit: usize, theta: f64, outcome: u8) -> impl Iterator<Item = (usize, usize, Complex<f64>)> + '_ {
        let sign = if outcome == 0 { 1.0 } else { -1.0 };
        let phase = Complex::from_polar(sign, -theta);
        let amplitudes = self.state.amplitudes();
        self.state
            .pairs(qubit)
            .map(move |(i0, i1)| (i0, i1, (amplitudes[i0] + phase * amplitudes[i1]) * FRAC_1_SQRT_2))
    }

    /// Controlled-Z: negates every amplitude with both qubits set.
    fn apply_cz(&mut self, a: usize, b: usize) {
        let mask = self.state.mask(a) | self.state.mask(b);
        for (i, amp) in self.state.amplitudes_mut().iter_mut().enumerate() {
            if i & mask == mask {
                *amp = -*amp;
            }
        }
    }

    fn apply_x(&mut self, qubit: usize) {
        let pairs: Vec<(usize, usize)> = self.state.pairs(qubit).collect();
        let amplitudes = self.state.amplitudes_mut();
        for (i0, i1) in pairs {
            amplitudes.swap(i0, i1);
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        let mask = self.state.mask(qubit);
        for (i, amp) in self.state.amplitudes_mut().iter_mut().enumerate() {
            if i & mask != 0 {
                *amp = -*amp;
            }
        }
    }
}

impl Measurement {
    /// Draws an outcome with the Born-rule probabilities.
    fn sample(&self, rng: &mut StdRng) -> u8 {
        let total = self.probabilities[0] + self.probabilities[1];
        let drawn = if rng.random::<f64>() * total < self.probabilities[0] { 0 } else { 1 };
        // Never pick an outcome that cannot occur.
        if self.probabilities[usize::from(drawn)] <= PROBABILITY_FLOOR { 1 - drawn } else { drawn }
    }
}

/// Executes one randomized run of `pattern`, drawing measurement outcomes from `rng`.
pub(crate) fn run_shot(pattern: &CheckedPattern, tolerance: f64, rng: &mut StdRng) -> Result<Outcome> {
    let mut engine = SimulationEngine::init(pattern, tolerance)?;
    for (index, command) in pattern.pattern().commands().iter().enumerate() {
        match command {
            Command::Measure { qubit, angle, s, t } => {
                let measurement = engine.prepare_measurement(index, *qubit, *angle, s, t)?;
                let outcome = measurement.sample(rng);
                engine.collapse(index, &measurement, outcome)?;
            }
            _ => engine.apply(index, command)?,
        }
    }
    engine.outcome()
}

/// One branch of the exact enumeration.
struct Branch {
    engine: SimulationEngine,
    probability: f64,
}

/// Enumerates every measurement branch of `pattern` and returns the exact
/// outcome distribution.
///
/// # Errors
/// `NumericConsistency` if a branch loses normalization or the branch
/// probabilities do not sum to 1 within tolerance.
pub(crate) fn enumerate(pattern: &CheckedPattern, tolerance: f64) -> Result<Distribution> {
    let mut branches = vec![Branch { engine: SimulationEngine::init(pattern, tolerance)?, probability: 1.0 }];

    for (index, command) in pattern.pattern().commands().iter().enumerate() {
        match command {
            Command::Measure { qubit, angle, s, t } => {
                let mut next = Vec::with_capacity(branches.len() * 2);
                for branch in branches {
                    let measurement = branch.engine.prepare_measurement(index, *qubit, *angle, s, t)?;
                    let possible: Vec<u8> = [0u8, 1]
                        .into_iter()
                        .filter(|k| measurement.probabilities[usize::from(*k)] > PROBABILITY_FLOOR)
                        .collect();
                    let total = measurement.probabilities[0] + measurement.probabilities[1];
                    for outcome in possible {
                        let mut engine = branch.engine.clone();
                        engine.collapse(index, &measurement, outcome)?;
                        next.push(Branch {
                            engine,
                            probability: branch.probability * measurement.probabilities[usize::from(outcome)] / total,
                        });
                    }
                }
                branches = next;
                trace!(index, branches = branches.len(), "branched on measurement");
            }
            _ => {
                for branch in &mut branches {
                    branch.engine.apply(index, command)?;
                }
            }
        }
    }

    let mut distribution = Distribution::new();
    for branch in &branches {
        distribution.record(branch.engine.outcome()?, branch.probability);
    }
    check_total(distribution.total(), tolerance, "exact distribution")?;
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_TOLERANCE;
    use crate::operations::Preparation;
    use crate::pattern::PatternBuilder;
    use num_traits::Zero;
    use rand::SeedableRng;

    const TEST_TOLERANCE: f64 = 1e-9;

    fn q(i: usize) -> Qubit {
        Qubit(i)
    }

    /// Asserts that two complex state vectors are approximately equal component-wise.
    fn assert_complex_vec_approx_equal(actual: &[Complex<f64>], expected: &[Complex<f64>], context: &str) {
        assert_eq!(actual.len(), expected.len(), "Vector length mismatch - {}", context);
        for i in 0..actual.len() {
            let dist_sq = (actual[i] - expected[i]).norm_sqr();
            assert!(
                dist_sq < TEST_TOLERANCE * TEST_TOLERANCE,
                "Vector mismatch at index {} - Actual: {}, Expected: {}, Context: {}",
                i, actual[i], expected[i], context
            );
        }
    }

    fn checked(pattern: crate::pattern::Pattern) -> CheckedPattern {
        CheckedPattern::new(pattern).expect("test pattern is well-formed")
    }

    #[test]
    fn entangle_twice_restores_state() -> Result<()> {
        let pattern = checked(
            PatternBuilder::new()
                .prepare(Preparation::Init(q(0), 0.4))
                .prepare(Preparation::InitMinus(q(1)))
                .init_plus(q(2))
                .build(),
        );
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        let before = engine.state().clone();

        engine.apply(0, &Command::Entangle(q(0), q(2)))?;
        assert_ne!(engine.state(), &before);
        engine.apply(1, &Command::Entangle(q(0), q(2)))?;
        assert_complex_vec_approx_equal(engine.state().amplitudes(), before.amplitudes(), "CZ·CZ");
        Ok(())
    }

    #[test]
    fn cz_on_plus_plus() -> Result<()> {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).init_plus(q(1)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        engine.apply(0, &Command::Entangle(q(0), q(1)))?;
        let h = Complex::new(0.5, 0.0);
        assert_complex_vec_approx_equal(engine.state().amplitudes(), &[h, h, h, -h], "CZ|++>");
        Ok(())
    }

    #[test]
    fn corrections_follow_signal_parity() -> Result<()> {
        let pattern = checked(
            PatternBuilder::new()
                .prepare(Preparation::Init1(q(0)))
                .prepare(Preparation::Init0(q(1)))
                .build(),
        );
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        // Measure q0 at angle 0: |1> = (|+> - |->)/√2, either outcome possible.
        let m = engine.prepare_measurement(0, q(0), 0.0, &[], &[])?;
        assert!((m.probabilities[0] - 0.5).abs() < TEST_TOLERANCE);
        engine.collapse(0, &m, 1)?;

        // Parity of {q0} is 1: X fires on q1 (|0> -> |1>).
        engine.apply(1, &Command::XCorrect(q(1), vec![q(0)]))?;
        // Parity of {q0, q0} is 0: nothing happens.
        engine.apply(2, &Command::XCorrect(q(1), vec![q(0), q(0)]))?;

        // q0 collapsed to -|-> = (|1> - |0>)/√2, q1 is |1>.
        let r = Complex::new(FRAC_1_SQRT_2, 0.0);
        let zero = Complex::zero();
        assert_complex_vec_approx_equal(engine.state().amplitudes(), &[zero, -r, zero, r], "after X");
        Ok(())
    }

    #[test]
    fn effective_angle_uses_sign_flip_and_pi_shift() -> Result<()> {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).init_plus(q(1)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        // |+> measured at 0 always yields outcome 0.
        let m = engine.prepare_measurement(0, q(0), 0.0, &[], &[])?;
        assert!((m.probabilities[0] - 1.0).abs() < TEST_TOLERANCE);
        engine.collapse(0, &m, 0)?;

        assert!((engine.effective_angle(0.3, &[q(0)], &[])? - 0.3).abs() < TEST_TOLERANCE);
        engine.outcomes[0] = Some(1);
        assert!((engine.effective_angle(0.3, &[q(0)], &[])? + 0.3).abs() < TEST_TOLERANCE);
        assert!((engine.effective_angle(0.3, &[], &[q(0)])? - (0.3 + PI)).abs() < TEST_TOLERANCE);
        assert!((engine.effective_angle(0.3, &[q(0)], &[q(0)])? - (PI - 0.3)).abs() < TEST_TOLERANCE);
        assert!((engine.effective_angle(0.3, &[q(0), q(0)], &[])? - 0.3).abs() < TEST_TOLERANCE);
        Ok(())
    }

    #[test]
    fn plus_measured_at_pi_yields_one() -> Result<()> {
        let pattern = checked(
            PatternBuilder::new()
                .init_plus(q(0))
                .measure(q(0), PI, vec![], vec![])
                .build(),
        );
        let distribution = enumerate(&pattern, DEFAULT_TOLERANCE)?;
        assert_eq!(distribution.len(), 1);
        assert!((distribution.probability(&Outcome::new(vec![(q(0), 1)])) - 1.0).abs() < TEST_TOLERANCE);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(run_shot(&pattern, DEFAULT_TOLERANCE, &mut rng)?.bit(q(0)), Some(1));
        }
        Ok(())
    }

    #[test]
    fn zero_measured_in_xy_plane_is_uniform() -> Result<()> {
        let pattern = checked(
            PatternBuilder::new()
                .prepare(Preparation::Init0(q(0)))
                .measure(q(0), 1.234, vec![], vec![])
                .build(),
        );
        let distribution = enumerate(&pattern, DEFAULT_TOLERANCE)?;
        assert_eq!(distribution.len(), 2);
        for (_, p) in distribution.iter() {
            assert!((p - 0.5).abs() < TEST_TOLERANCE);
        }
        Ok(())
    }

    #[test]
    fn unnormalized_state_is_a_numeric_error() {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE).unwrap();
        engine.state = JointState::from_amplitudes(vec![Complex::new(0.9, 0.0), Complex::zero()]);
        let result = engine.prepare_measurement(3, q(0), 0.0, &[], &[]);
        match result {
            Err(MbqcError::NumericConsistency { context, .. }) => assert!(context.contains("#3")),
            other => panic!("expected NumericConsistency, got {:?}", other),
        }
    }

    #[test]
    fn collapse_onto_impossible_outcome_is_a_numeric_error() -> Result<()> {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        // |+> at angle 0 never reads 1.
        let m = engine.prepare_measurement(4, q(0), 0.0, &[], &[])?;
        match engine.collapse(4, &m, 1) {
            Err(MbqcError::NumericConsistency { context, total, .. }) => {
                assert!(context.contains("impossible outcome 1"), "{}", context);
                assert!(context.contains("#4"), "{}", context);
                assert!(total <= PROBABILITY_FLOOR);
            }
            other => panic!("expected NumericConsistency, got {:?}", other),
        }
        assert!(engine.outcome()?.bits().is_empty());
        Ok(())
    }

    #[test]
    fn norm_drift_after_collapse_is_a_numeric_error() -> Result<()> {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        let m = engine.prepare_measurement(2, q(0), std::f64::consts::FRAC_PI_2, &[], &[])?;
        // Rescale the state after the probabilities were taken, so the
        // renormalized post-measurement state has squared norm 4.
        let r = Complex::new(2.0 * FRAC_1_SQRT_2, 0.0);
        engine.state = JointState::from_amplitudes(vec![r, r]);
        match engine.collapse(2, &m, 0) {
            Err(MbqcError::NumericConsistency { context, total, .. }) => {
                assert!(context.contains("collapse of q0"), "{}", context);
                assert!((total - 4.0).abs() < 1e-6, "total {}", total);
            }
            other => panic!("expected NumericConsistency, got {:?}", other),
        }
        assert!(engine.outcome()?.bits().is_empty());
        Ok(())
    }

    #[test]
    fn unmeasured_signal_is_an_internal_error() -> Result<()> {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).init_plus(q(1)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        assert!(matches!(engine.effective_angle(0.3, &[q(1)], &[]), Err(MbqcError::Internal { .. })));
        match engine.apply(0, &Command::ZCorrect(q(0), vec![q(1)])) {
            Err(MbqcError::Internal { message }) => assert!(message.contains("q1"), "{}", message),
            other => panic!("expected Internal, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn measurement_routed_to_apply_is_an_internal_error() -> Result<()> {
        let pattern = checked(PatternBuilder::new().init_plus(q(0)).build());
        let mut engine = SimulationEngine::init(&pattern, DEFAULT_TOLERANCE)?;
        let result = engine.apply(5, &Command::measure(q(0), 0.0, vec![], vec![]));
        match result {
            Err(MbqcError::Internal { message }) => assert!(message.contains("#5"), "{}", message),
            other => panic!("expected Internal, got {:?}", other),
        }
        Ok(())
    }
}
