// src/compiler/lowering.rs

//! Lowers gate templates into elementary patterns.

use super::template::{Directive, Template, Wire};
use crate::core::{MbqcError, Qubit, QubitState, Result};
use crate::operations::{Command, Preparation};
use crate::pattern::Pattern;
use crate::validation::check;
use tracing::{debug, trace};

/// Lowers a template into an elementary `(preparations, commands)` pattern.
///
/// Input wire `i` becomes qubit `i`; ancillas are numbered after the inputs
/// in allocation order, so the result always prepares exactly `0..n`.
///
/// # Errors
/// `MbqcError::TemplateCompilation` if a directive references an undefined
/// wire, allocates an empty batch, entangles a wire with itself, uses the same
/// wire as J input and output, or if the lowered pattern is not well-formed.
/// These indicate a defect in the template and are never papered over.
pub fn compile(template: &Template) -> Result<Pattern> {
    let mut lowering = Lowering::new(template);
    for (index, directive) in template.directives.iter().enumerate() {
        lowering.lower(index, directive)?;
    }
    lowering.finish()
}

/// Alias of [`compile`] under the name used by the directive parser.
pub fn parse_pattern(template: &Template) -> Result<Pattern> {
    compile(template)
}

/// Maps an input state to the preparation declaring it.
pub(crate) fn input_preparation(qubit: Qubit, state: QubitState) -> Preparation {
    match state {
        QubitState::Zero => Preparation::Init0(qubit),
        QubitState::One => Preparation::Init1(qubit),
        QubitState::Plus => Preparation::InitPlus(qubit),
        QubitState::Minus => Preparation::InitMinus(qubit),
        QubitState::Equatorial(angle) => Preparation::Init(qubit, angle),
    }
}

/// Lowering state for one template.
struct Lowering<'t> {
    template: &'t Template,
    /// Number of ancillas allocated so far.
    allocated: usize,
    preparations: Vec<Preparation>,
    commands: Vec<Command>,
}

impl<'t> Lowering<'t> {
    fn new(template: &'t Template) -> Self {
        let preparations = template
            .inputs
            .iter()
            .enumerate()
            .map(|(i, state)| input_preparation(Qubit(i), *state))
            .collect();
        Self { template, allocated: 0, preparations, commands: Vec::new() }
    }

    fn error(&self, index: usize, message: String) -> MbqcError {
        MbqcError::TemplateCompilation {
            template: self.template.name.clone(),
            message: format!("directive #{}: {}", index, message),
        }
    }

    /// Resolves a wire to its qubit.
    fn resolve(&self, index: usize, wire: Wire) -> Result<Qubit> {
        let arity = self.template.inputs.len();
        match wire {
            Wire::Input(i) if i < arity => Ok(Qubit(i)),
            Wire::Input(i) => Err(self.error(index, format!("input wire {} is undefined (template has {} inputs)", i, arity))),
            Wire::Ancilla(j) if j < self.allocated => Ok(Qubit(arity + j)),
            Wire::Ancilla(j) => Err(self.error(index, format!("ancilla {} is used before allocation ({} allocated)", j, self.allocated))),
        }
    }

    fn lower(&mut self, index: usize, directive: &Directive) -> Result<()> {
        trace!(index, ?directive, "lowering directive");
        match directive {
            Directive::PrepList(count) => {
                if *count == 0 {
                    return Err(self.error(index, "empty ancilla batch".to_string()));
                }
                let base = self.template.inputs.len() + self.allocated;
                let batch = (base..base + count).map(Qubit).collect();
                self.preparations.push(Preparation::InitNonInput(batch));
                self.allocated += count;
            }
            Directive::CZ(a, b) => {
                let (qa, qb) = (self.resolve(index, *a)?, self.resolve(index, *b)?);
                if qa == qb {
                    return Err(self.error(index, format!("CZ on a single wire ({})", qa)));
                }
                self.commands.push(Command::Entangle(qa, qb));
            }
            Directive::J { angle, input, output } => {
                let (qi, qo) = (self.resolve(index, *input)?, self.resolve(index, *output)?);
                if qi == qo {
                    return Err(self.error(index, format!("J input and output are the same wire ({})", qi)));
                }
                self.commands.push(Command::Entangle(qi, qo));
                self.commands.push(Command::measure(qi, -angle, vec![], vec![]));
                self.commands.push(Command::XCorrect(qo, vec![qi]));
            }
            Directive::Measure { angle, wire } => {
                let q = self.resolve(index, *wire)?;
                self.commands.push(Command::measure(q, *angle, vec![], vec![]));
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Pattern> {
        let pattern = Pattern::new(self.preparations, self.commands);
        if let Err(violations) = check(&pattern) {
            let details: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
            return Err(MbqcError::TemplateCompilation {
                template: self.template.name.clone(),
                message: format!("lowered pattern is not well-formed: {}", details.join("; ")),
            });
        }
        debug!(
            template = %self.template.name,
            qubits = pattern.prepared().len(),
            commands = pattern.len(),
            "template compiled"
        );
        Ok(pattern)
    }
}
