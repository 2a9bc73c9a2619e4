//! LanceScript Interpreter Library
//!
//! A small imperative language over 64-bit integers: scalars, fixed-size
//! arrays, constants, functions and structured control flow, executed by
//! walking the syntax tree.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;
mod stack;

pub use ast::{NodeKind, Span, Tree};
pub use error::{CompileError, Result};

/// Tokenize and parse a whole source file
pub fn parse_source(filename: &str, source: &str) -> Result<Tree> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(filename, source, tokens)
}
