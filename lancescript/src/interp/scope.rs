//! Scope stack and symbol tables
//!
//! Variables live in a stack of frames. Index 0 is the global frame and is
//! never popped. Lookup walks from the innermost frame outwards, so code
//! running in a pushed frame (a block or a function call) sees every name
//! of every frame still below it, including its caller's locals.
//! Constants and functions live in flat tables beside the stack.

use super::error::{InterpResult, RuntimeError};
use super::function::Function;
use super::value::{Constant, Variable};
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of bindings
pub type Frame = HashMap<String, Variable>;

/// Stack-based scope management for the interpreter
#[derive(Debug)]
pub struct ScopeStack {
    /// Stack of frames, index 0 is global
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// Create a new scope stack with a global frame
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame::new()],
        }
    }

    /// Push a frame holding exactly `bindings`
    /// Returns the new depth (for debugging)
    pub fn push(&mut self, bindings: Frame) -> usize {
        self.frames.push(bindings);
        self.frames.len()
    }

    /// Pop the current frame
    /// Panics if trying to pop the global frame
    pub fn pop(&mut self) {
        if self.frames.len() <= 1 {
            panic!("Cannot pop global scope");
        }
        self.frames.pop();
    }

    /// Current number of frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind a variable in the current (topmost) frame
    pub fn define(&mut self, name: String, variable: Variable) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, variable);
        }
    }

    /// Look up a variable, searching from the current frame to global
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
    }

    /// Check if a variable exists in any frame
    pub fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains_key(name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

/// What a name resolves to when read
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    Constant(&'a Constant),
    Variable(&'a Variable),
}

/// Scope stack plus constant and function tables, with the name-conflict rules
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub scopes: ScopeStack,
    constants: HashMap<String, Constant>,
    functions: HashMap<String, Rc<Function>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Resolution ============

    pub fn resolve_variable(&self, name: &str) -> InterpResult<&Variable> {
        self.scopes
            .get(name)
            .ok_or_else(|| RuntimeError::undeclared_symbol(name))
    }

    pub fn resolve_variable_mut(&mut self, name: &str) -> InterpResult<&mut Variable> {
        self.scopes
            .get_mut(name)
            .ok_or_else(|| RuntimeError::undeclared_symbol(name))
    }

    /// Constants shadow variables of the same name
    pub fn resolve_symbol(&self, name: &str) -> InterpResult<Symbol<'_>> {
        if let Some(constant) = self.constants.get(name) {
            return Ok(Symbol::Constant(constant));
        }
        self.resolve_variable(name).map(Symbol::Variable)
    }

    pub fn resolve_function(&self, name: &str) -> InterpResult<Rc<Function>> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::undeclared_function(name))
    }

    pub fn is_declared_anywhere(&self, name: &str) -> bool {
        self.scopes.contains(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Variable, constant or function
    pub fn is_symbol_declared(&self, name: &str) -> bool {
        self.is_declared_anywhere(name) || self.is_constant(name) || self.is_function(name)
    }

    // ============ Declaration ============

    /// Variables and constants only conflict with variables and constants
    pub fn check_data_name(&self, name: &str) -> InterpResult<()> {
        if self.is_declared_anywhere(name) {
            return Err(RuntimeError::variable_already_declared(name));
        }
        if self.is_constant(name) {
            return Err(RuntimeError::constant_already_declared(name));
        }
        Ok(())
    }

    pub fn declare_variable(&mut self, name: &str, variable: Variable) -> InterpResult<()> {
        self.check_data_name(name)?;
        self.scopes.define(name.to_string(), variable);
        Ok(())
    }

    pub fn declare_constant(&mut self, constant: Constant) -> InterpResult<()> {
        self.check_data_name(&constant.name)?;
        self.constants.insert(constant.name.clone(), constant);
        Ok(())
    }

    /// Functions conflict with every kind of symbol
    pub fn declare_function(&mut self, function: Function) -> InterpResult<()> {
        if self.is_symbol_declared(&function.name) {
            return Err(RuntimeError::symbol_already_in_use(&function.name));
        }
        self.functions
            .insert(function.name.clone(), Rc::new(function));
        Ok(())
    }
}
