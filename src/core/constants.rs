//! Numeric constants shared by the checker, compiler and simulation engine.

/// Constants used throughout pattern simulation.
pub mod mcalc_constants {
    /// Used for measurement angles and the π shift applied by t-signals.
    pub const PI: f64 = std::f64::consts::PI;
    /// Amplitude of each basis component in `|+>`, `|->` and `|+_α>`.
    pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
    /// Allowed deviation of a total probability (or squared norm) from 1.
    pub const DEFAULT_TOLERANCE: f64 = 1e-9;
    /// Branch probabilities at or below this are treated as impossible outcomes.
    pub const PROBABILITY_FLOOR: f64 = 1e-14;
    /// Largest qubit count a default-configured simulator accepts.
    pub const DEFAULT_MAX_QUBITS: usize = 20;
}
