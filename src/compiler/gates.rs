// src/compiler/gates.rs

//! A small library of gate templates built from `J` rotations and `CZ`
//! entanglers.
//!
//! `J(α) = H·diag(1, e^{iα})` together with `CZ` is universal, and every
//! template here lowers to a well-formed pattern through
//! [`compile`](super::compile).

use super::template::{Template, TemplateBuilder, Wire};
use crate::core::{PI, QubitState};

/// Maps two boolean control values to the `(α, β)` measurement angles that
/// mark the basis state `|ab>` in [`grover_search`].
///
/// | a | b | (α, β) |
/// |---|---|--------|
/// | 0 | 0 | (π, π) |
/// | 0 | 1 | (π, 0) |
/// | 1 | 0 | (0, π) |
/// | 1 | 1 | (0, 0) |
pub fn boolean_angles(a: bool, b: bool) -> (f64, f64) {
    match (a, b) {
        (false, false) => (PI, PI),
        (false, true) => (PI, 0.0),
        (true, false) => (0.0, PI),
        (true, true) => (0.0, 0.0),
    }
}

/// A single `J(α)` rotation on one input.
/// The output is the unmeasured ancilla, qubit 1.
pub fn j_gate(angle: f64, input: QubitState) -> Template {
    TemplateBuilder::new("J")
        .input(input)
        .prep_list(1)
        .j(angle, Wire::Input(0), Wire::Ancilla(0))
        .build()
}

/// Hadamard, realized as `J(0)`.
pub fn hadamard(input: QubitState) -> Template {
    let mut template = j_gate(0.0, input);
    template.name = "H".to_string();
    template
}

/// Phase gate `diag(1, e^{iα})`, realized as `J(0)·J(α)`.
/// The output is qubit 2.
pub fn phase(angle: f64, input: QubitState) -> Template {
    TemplateBuilder::new("P")
        .input(input)
        .prep_list(2)
        .j(angle, Wire::Input(0), Wire::Ancilla(0))
        .j(0.0, Wire::Ancilla(0), Wire::Ancilla(1))
        .build()
}

/// Controlled-Z between two inputs. Needs no ancillas.
pub fn cz(a: QubitState, b: QubitState) -> Template {
    TemplateBuilder::new("CZ")
        .inputs([a, b])
        .cz(Wire::Input(0), Wire::Input(1))
        .build()
}

/// Two-qubit Grover search on the four-qubit box cluster, marking `|ab>`.
///
/// One Grover iteration on two qubits is exact: starting from `|++>`, the
/// oracle phase-flips `|ab>` (`CZ` up to `Z` rotations selected by
/// [`boolean_angles`]) and the diffusion step (`CZ` conjugated by Hadamards)
/// rotates the state onto `|ab>`. Written with `J` gates this becomes
///
/// ```text
/// CZ(0,1) ; J(β) 0→2 ; J(α) 1→3 ; CZ(2,3) ; M_2^π ; M_3^π
/// ```
///
/// so the readout outcomes of qubits 2 and 3 are `a` and `b` with
/// probability 1, while the outcomes of qubits 0 and 1 are uniformly random.
pub fn grover_search(a: bool, b: bool) -> Template {
    let (alpha, beta) = boolean_angles(a, b);
    TemplateBuilder::new(format!("grover[{}{}]", a as u8, b as u8))
        .inputs([QubitState::Plus, QubitState::Plus])
        .prep_list(2)
        .cz(Wire::Input(0), Wire::Input(1))
        .j(beta, Wire::Input(0), Wire::Ancilla(0))
        .j(alpha, Wire::Input(1), Wire::Ancilla(1))
        .cz(Wire::Ancilla(0), Wire::Ancilla(1))
        .measure_pi(Wire::Ancilla(0))
        .measure_pi(Wire::Ancilla(1))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::core::Qubit;
    use crate::validation::check;

    #[test]
    fn angle_table_is_exhaustive() {
        assert_eq!(boolean_angles(false, false), (PI, PI));
        assert_eq!(boolean_angles(false, true), (PI, 0.0));
        assert_eq!(boolean_angles(true, false), (0.0, PI));
        assert_eq!(boolean_angles(true, true), (0.0, 0.0));
    }

    #[test]
    fn grover_lowers_to_box_cluster() {
        let pattern = compile(&grover_search(true, false)).unwrap();
        assert_eq!(check(&pattern), Ok(4));
        assert_eq!(pattern.measured(), vec![Qubit(0), Qubit(1), Qubit(2), Qubit(3)]);
        assert!(pattern.outputs().is_empty());
        let entangles = pattern
            .commands()
            .iter()
            .filter(|c| matches!(c, crate::operations::Command::Entangle(..)))
            .count();
        assert_eq!(entangles, 4);
    }

    #[test]
    fn library_templates_compile() {
        for template in [
            j_gate(0.4, QubitState::Zero),
            hadamard(QubitState::One),
            phase(1.1, QubitState::Plus),
            cz(QubitState::Plus, QubitState::Minus),
        ] {
            let pattern = compile(&template).unwrap();
            assert!(check(&pattern).is_ok(), "{} failed", template.name());
        }
    }
}
