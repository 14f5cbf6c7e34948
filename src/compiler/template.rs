// src/compiler/template.rs

//! Declarative gate templates: the directive set and its builder.

use crate::core::{PI, QubitState};

/// A reference to a qubit inside a template, resolved to a concrete
/// [`crate::core::Qubit`] during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wire {
    /// The i-th input of the template; lowered to qubit `i`.
    Input(usize),
    /// The j-th ancilla allocated by `PrepList` directives, counted across
    /// all batches in order; lowered to qubit `inputs + j`.
    Ancilla(usize),
}

/// A single directive of a gate template.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Allocate a batch of fresh ancilla qubits in `|+>`.
    PrepList(usize),
    /// Entangle two wires with a controlled-Z.
    CZ(Wire, Wire),
    /// Measurement-based rotation `J(α) = H·diag(1, e^{iα})` moving the
    /// logical qubit from `input` to the fresh `output` wire.
    ///
    /// Lowers to `Entangle(in, out)`, `Measure(in, -α)`, `XCorrect(out, [in])`.
    J {
        /// Rotation angle α.
        angle: f64,
        /// Wire carrying the logical qubit; measured by the gadget.
        input: Wire,
        /// Wire receiving the logical qubit.
        output: Wire,
    },
    /// Readout measurement of a wire at a fixed angle.
    Measure {
        /// Measurement angle.
        angle: f64,
        /// Measured wire.
        wire: Wire,
    },
}

/// A named gate template: input states plus a directive sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub(crate) name: String,
    pub(crate) inputs: Vec<QubitState>,
    pub(crate) directives: Vec<Directive>,
}

impl Template {
    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial states of the input wires.
    pub fn inputs(&self) -> &[QubitState] {
        &self.inputs
    }

    /// The directive sequence.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Number of ancillas the directives allocate.
    pub fn ancilla_count(&self) -> usize {
        self.directives
            .iter()
            .map(|d| match d {
                Directive::PrepList(k) => *k,
                _ => 0,
            })
            .sum()
    }
}

/// Facilitates the construction of [`Template`] instances using a fluent API.
///
/// # Examples
/// ```
/// use mcalc::compiler::{TemplateBuilder, Wire, compile};
/// use mcalc::core::QubitState;
///
/// // A single J(π/2) rotation acting on |+>.
/// let template = TemplateBuilder::new("j")
///     .input(QubitState::Plus)
///     .prep_list(1)
///     .j(std::f64::consts::FRAC_PI_2, Wire::Input(0), Wire::Ancilla(0))
///     .build();
///
/// let pattern = compile(&template).expect("template lowers");
/// assert_eq!(pattern.commands().len(), 3);
/// ```
#[derive(Debug)]
pub struct TemplateBuilder {
    template: Template,
}

impl TemplateBuilder {
    /// Starts an empty template with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            template: Template { name: name.into(), inputs: Vec::new(), directives: Vec::new() },
        }
    }

    /// Declares one more input wire in the given state.
    pub fn input(mut self, state: QubitState) -> Self {
        self.template.inputs.push(state);
        self
    }

    /// Declares several input wires.
    pub fn inputs<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = QubitState>,
    {
        self.template.inputs.extend(states);
        self
    }

    /// Adds a raw directive.
    pub fn directive(mut self, directive: Directive) -> Self {
        self.template.directives.push(directive);
        self
    }

    /// `PrepList(count)`
    pub fn prep_list(self, count: usize) -> Self {
        self.directive(Directive::PrepList(count))
    }

    /// `CZ(a, b)`
    pub fn cz(self, a: Wire, b: Wire) -> Self {
        self.directive(Directive::CZ(a, b))
    }

    /// `J(angle, input, output)`
    pub fn j(self, angle: f64, input: Wire, output: Wire) -> Self {
        self.directive(Directive::J { angle, input, output })
    }

    /// Readout measurement at `angle`.
    pub fn measure(self, angle: f64, wire: Wire) -> Self {
        self.directive(Directive::Measure { angle, wire })
    }

    /// X-basis readout (angle 0). Equivalent to `H` followed by a Z-basis readout.
    pub fn measure_x(self, wire: Wire) -> Self {
        self.measure(0.0, wire)
    }

    /// Readout at angle π, equivalent to `Z` followed by an X-basis readout.
    pub fn measure_pi(self, wire: Wire) -> Self {
        self.measure(PI, wire)
    }

    /// Finalizes the template.
    pub fn build(self) -> Template {
        self.template
    }
}
