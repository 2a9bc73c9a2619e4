//! User-defined function records

use super::error::{InterpResult, RuntimeError};
use super::value::VarType;
use crate::ast::Tree;

/// Declared parameter slot
#[derive(Debug, Clone, PartialEq)]
pub struct FormalParameter {
    pub name: String,
    pub ty: VarType,
    /// Array parameters bind by reference, scalars by value
    pub is_array: bool,
}

impl FormalParameter {
    pub fn scalar(name: impl Into<String>, ty: VarType) -> Self {
        FormalParameter {
            name: name.into(),
            ty,
            is_array: false,
        }
    }

    pub fn array(name: impl Into<String>, ty: VarType) -> Self {
        FormalParameter {
            name: name.into(),
            ty,
            is_array: true,
        }
    }
}

/// Registered function: signature plus the body subtree
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: VarType,
    pub parameters: Vec<FormalParameter>,
    pub body: Tree,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn check_arity(&self, given: usize) -> InterpResult<()> {
        if given != self.arity() {
            return Err(RuntimeError::call_with_wrong_arity(
                &self.name,
                self.arity(),
                given,
            ));
        }
        Ok(())
    }
}
