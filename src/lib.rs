// src/lib.rs

//! `mcalc` - A library for writing and simulating measurement-based quantum
//! computations
//!
//! Programs are *patterns*: qubit preparations followed by entanglement,
//! measurement and correction commands. The crate checks patterns for
//! well-formedness, compiles gate templates into patterns, rewrites patterns
//! into standard form, and evaluates them on a state vector either by
//! sampling shots or by enumerating the exact outcome distribution.

pub mod core;
pub mod operations;
pub mod pattern;
pub mod validation;
pub mod compiler;
pub mod simulation;

// Re-export the most common types for easier top-level use
pub use core::{JointState, MbqcError, Qubit, QubitState, Result};
pub use operations::{Command, Preparation, Signals, merge_signals, parity};
pub use pattern::{Pattern, PatternBuilder};
pub use validation::{CheckedPattern, Violation, ViolationKind, check};
pub use compiler::{
    Directive, Template, TemplateBuilder, Wire, boolean_angles, compile, parse_pattern, standardize,
};
pub use simulation::{Distribution, Evaluation, Mode, Outcome, Simulator, SimulatorConfig};

// Example 1: Teleporting a rotation through a two-qubit pattern
// A single J(α) gadget applied to |+>: entangle, measure the input at -α,
// then correct the output. Exact evaluation yields each outcome of the
// input measurement with probability 1/2.
/// ```
/// use mcalc::{Qubit, PatternBuilder, Simulator, Mode, MbqcError};
///
/// fn q(id: usize) -> Qubit { Qubit(id) }
///
/// let pattern = PatternBuilder::new()
///     .init_plus(q(0))
///     .non_input(vec![q(1)])
///     .entangle(q(0), q(1))
///     .measure(q(0), -0.5, vec![], vec![])
///     .x_correct(q(1), vec![q(0)])
///     .build();
///
/// let simulator = Simulator::new();
/// match simulator.evaluate(&pattern, Mode::Exact) {
///     Ok(evaluation) => {
///         let distribution = evaluation.distribution().expect("exact mode");
///         println!("{}", distribution);
///         assert_eq!(distribution.len(), 2);
///         assert!((distribution.total() - 1.0).abs() < 1e-9);
///     }
///     Err(e) => panic!("evaluation failed: {}", e),
/// }
/// # Ok::<(), MbqcError>(())
/// ```
#[doc(hidden)]
const _: () = ();

// Example 2: Grover search on the four-qubit box cluster
// Compiles the search template for the marked element |10> and reads the
// answer off the two readout qubits.
/// ```
/// use mcalc::compiler::gates::grover_search;
/// use mcalc::{compile, Qubit, Simulator, SimulatorConfig, Mode, MbqcError};
///
/// let pattern = compile(&grover_search(true, false))?;
///
/// let simulator = Simulator::with_config(SimulatorConfig::default().with_seed(7));
/// let shots = simulator.evaluate(&pattern, Mode::Shots(20))?;
/// for outcome in shots.shots().expect("shot mode") {
///     assert_eq!(outcome.values(&[Qubit(2), Qubit(3)]), Some(vec![1, 0]));
/// }
/// # Ok::<(), MbqcError>(())
/// ```
#[doc(hidden)]
const _: () = ();

// Example 3: Rejected patterns
// Measuring a qubit that was never prepared violates D2; the simulator
// refuses to run it.
/// ```
/// use mcalc::{Qubit, PatternBuilder, Simulator, Mode, MbqcError, ViolationKind, check};
///
/// let pattern = PatternBuilder::new()
///     .init_plus(Qubit(0))
///     .measure(Qubit(1), 0.0, vec![], vec![])
///     .build();
///
/// let violations = check(&pattern).unwrap_err();
/// assert!(violations.iter().any(|v| v.kind == ViolationKind::D2));
/// assert!(matches!(
///     Simulator::new().evaluate(&pattern, Mode::Exact),
///     Err(MbqcError::Precondition { .. })
/// ));
/// ```
#[doc(hidden)]
const _: () = ();
