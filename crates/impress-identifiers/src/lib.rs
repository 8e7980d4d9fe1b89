//! Identifier syntax for persistent identifiers
//!
//! This crate provides the pure, I/O-free part of PID handling:
//! - DOI validation, normalization and prefix extraction
//! - OAI identifier validation and construction
//! - `IdentifierSyntax`, the closed set of syntaxes a PID scheme can declare

pub mod syntax;
pub mod validators;

pub use syntax::*;
pub use validators::*;
