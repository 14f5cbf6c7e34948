// src/core/state.rs

use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt;

use super::constants::mcalc_constants::FRAC_1_SQRT_2;

/// The initial single-qubit state contributed by a preparation.
///
/// Each variant maps to a normalized 2-component amplitude vector in the
/// computational basis `{|0>, |1>}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QubitState {
    /// `|0>`
    Zero,
    /// `|1>`
    One,
    /// `|+> = (|0> + |1>)/√2`
    Plus,
    /// `|-> = (|0> - |1>)/√2`
    Minus,
    /// `|+_α> = (|0> + e^{iα}|1>)/√2`, a point on the equator of the Bloch sphere.
    Equatorial(f64),
}

impl QubitState {
    /// Amplitudes `[⟨0|ψ⟩, ⟨1|ψ⟩]` of this state.
    pub fn amplitudes(&self) -> [Complex<f64>; 2] {
        let r = Complex::new(FRAC_1_SQRT_2, 0.0);
        match self {
            QubitState::Zero => [Complex::one(), Complex::zero()],
            QubitState::One => [Complex::zero(), Complex::one()],
            QubitState::Plus => [r, r],
            QubitState::Minus => [r, -r],
            QubitState::Equatorial(angle) => [r, r * Complex::from_polar(1.0, *angle)],
        }
    }
}

/// The joint state of all qubits of a pattern as a dense vector of `2^n`
/// complex amplitudes.
///
/// Qubit 0 is the most significant bit of the basis index, so the vector is
/// the tensor product `|q0> ⊗ |q1> ⊗ … ⊗ |q(n-1)>` in qubit-index order.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct JointState {
    amplitudes: Vec<Complex<f64>>,
    num_qubits: usize,
}

impl JointState {
    /// The zero-qubit state: a single amplitude equal to 1.
    pub fn empty() -> Self {
        Self { amplitudes: vec![Complex::one()], num_qubits: 0 }
    }

    /// Builds the product state of the given single-qubit states, in order.
    pub fn product<I>(states: I) -> Self
    where
        I: IntoIterator<Item = QubitState>,
    {
        states
            .into_iter()
            .fold(Self::empty(), |joint, state| joint.tensor(&state.amplitudes()))
    }

    /// Creates a joint state from a raw amplitude vector.
    /// The length must be a power of two; normalization is checked by the engine.
    #[cfg(test)]
    pub(crate) fn from_amplitudes(amplitudes: Vec<Complex<f64>>) -> Self {
        debug_assert!(amplitudes.len().is_power_of_two());
        let num_qubits = amplitudes.len().trailing_zeros() as usize;
        Self { amplitudes, num_qubits }
    }

    /// Appends one more qubit as the new least significant position.
    pub fn tensor(&self, qubit: &[Complex<f64>; 2]) -> Self {
        let mut amplitudes = Vec::with_capacity(self.amplitudes.len() * 2);
        for amp in &self.amplitudes {
            amplitudes.push(amp * qubit[0]);
            amplitudes.push(amp * qubit[1]);
        }
        Self { amplitudes, num_qubits: self.num_qubits + 1 }
    }

    /// Provides read-only access to the amplitudes.
    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    /// Mutable access for the simulation engine.
    pub(crate) fn amplitudes_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.amplitudes
    }

    /// Number of qubits represented.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Dimension of the vector (`2^n`).
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Sum of squared amplitude magnitudes.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Bit mask selecting `qubit` in a basis index.
    pub(crate) fn mask(&self, qubit: usize) -> usize {
        1 << (self.num_qubits - 1 - qubit)
    }

    /// Index pairs `(i0, i1)` that differ only in the bit of `qubit`,
    /// with that bit 0 in `i0` and 1 in `i1`.
    pub(crate) fn pairs(&self, qubit: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let mask = self.mask(qubit);
        (0..self.dim()).filter(move |i| i & mask == 0).map(move |i| (i, i | mask))
    }
}

impl fmt::Display for JointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State[")?;
        for (i, c) in self.amplitudes.iter().enumerate() {
            write!(f, "{}{:.4}", if i > 0 { ", " } else { "" }, c)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn product_orders_qubit_zero_most_significant() {
        // |1> ⊗ |0> = |10> -> index 2
        let joint = JointState::product([QubitState::One, QubitState::Zero]);
        assert_eq!(joint.num_qubits(), 2);
        assert_eq!(joint.dim(), 4);
        assert!((joint.amplitudes()[2].re - 1.0).abs() < TOL);
        assert!(joint.amplitudes().iter().enumerate().all(|(i, c)| i == 2 || c.norm() < TOL));
    }

    #[test]
    fn equatorial_state_is_normalized() {
        for angle in [0.0, 0.3, 1.7, -2.2] {
            let joint = JointState::product([QubitState::Equatorial(angle)]);
            assert!((joint.norm_sqr() - 1.0).abs() < TOL);
        }
        let plus = QubitState::Plus.amplitudes();
        let zero_angle = QubitState::Equatorial(0.0).amplitudes();
        assert!((plus[1] - zero_angle[1]).norm() < TOL);
    }

    #[test]
    fn pairs_cover_every_index_once() {
        let joint = JointState::product([QubitState::Plus; 3]);
        let mut seen: Vec<usize> = joint.pairs(1).flat_map(|(a, b)| [a, b]).collect();
        seen.sort();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert!(joint.pairs(1).all(|(a, b)| b - a == 2));
    }
}
