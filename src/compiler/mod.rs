// src/compiler/mod.rs

//! The pattern compiler: gate templates lowered into elementary patterns,
//! and standardization of patterns into canonical command order.

mod lowering;
mod standardize;
mod template;
pub mod gates;

pub use gates::boolean_angles;
pub use lowering::{compile, parse_pattern};
pub use standardize::{is_standard, standardize};
pub use template::{Directive, Template, TemplateBuilder, Wire};
