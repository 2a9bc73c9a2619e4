//! Runtime errors for the interpreter

use super::value::MAX_ARRAY_SIZE;
use thiserror::Error;

/// Runtime error during interpretation
#[derive(Debug, Clone, Error)]
#[error("Runtime error: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Declaration conflicts
    VariableAlreadyDeclared,
    ConstantAlreadyDeclared,
    SymbolAlreadyInUse,

    // Resolution failures
    UndeclaredSymbol,
    UndeclaredFunction,
    VariableUndeclared,

    // Assignment failures
    CannotAssignConstant,
    AssignmentToUndefinedVariable,
    WrongAssignment,
    CannotReadArray,

    // Access failures
    WrongAccess,
    UninitializedValueAccess,
    OutOfBoundsAccess,
    InvalidArraySize,

    InvalidType,
    CallWithWrongArity,
    UnimplementedOperation,
    DivisionByZero,
    /// A non-integer value reached an integer context
    TypeMismatch,
    /// Call depth exceeded the configured limit
    StackOverflow,
    IoError,
    /// Node is missing a child or token its kind requires
    MalformedTree,
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: String) -> Self {
        RuntimeError { kind, message }
    }

    pub fn variable_already_declared(name: &str) -> Self {
        Self::new(
            ErrorKind::VariableAlreadyDeclared,
            format!("symbol {name} is already declared as a variable"),
        )
    }

    pub fn constant_already_declared(name: &str) -> Self {
        Self::new(
            ErrorKind::ConstantAlreadyDeclared,
            format!("symbol {name} is already declared as a constant"),
        )
    }

    pub fn symbol_already_in_use(name: &str) -> Self {
        Self::new(
            ErrorKind::SymbolAlreadyInUse,
            format!("symbol {name} is already in use"),
        )
    }

    pub fn undeclared_symbol(name: &str) -> Self {
        Self::new(ErrorKind::UndeclaredSymbol, format!("{name} is not declared"))
    }

    pub fn undeclared_function(name: &str) -> Self {
        Self::new(
            ErrorKind::UndeclaredFunction,
            format!("call to undeclared function {name}"),
        )
    }

    pub fn variable_undeclared(name: &str) -> Self {
        Self::new(
            ErrorKind::VariableUndeclared,
            format!("cannot read into undeclared variable {name}"),
        )
    }

    pub fn cannot_assign_constant(name: &str) -> Self {
        Self::new(
            ErrorKind::CannotAssignConstant,
            format!("cannot assign to constant {name}"),
        )
    }

    pub fn assignment_to_undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::AssignmentToUndefinedVariable,
            format!("variable {name} is not declared"),
        )
    }

    pub fn wrong_assignment(name: &str, target: &str, actual: &str) -> Self {
        Self::new(
            ErrorKind::WrongAssignment,
            format!("cannot assign {name} as {target}: it is {actual}"),
        )
    }

    pub fn cannot_read_array(name: &str) -> Self {
        Self::new(
            ErrorKind::CannotReadArray,
            format!("cannot read a value into array {name}"),
        )
    }

    pub fn wrong_access(name: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorKind::WrongAccess,
            format!("{name} used as {expected}, but it is {actual}"),
        )
    }

    pub fn uninitialized_value_access(name: &str) -> Self {
        Self::new(
            ErrorKind::UninitializedValueAccess,
            format!("access to uninitialized variable {name}"),
        )
    }

    pub fn out_of_bounds(access: &str, index: i64, name: &str, size: usize) -> Self {
        Self::new(
            ErrorKind::OutOfBoundsAccess,
            format!("out of bounds {access} access to index {index} of {name} (size {size})"),
        )
    }

    pub fn invalid_array_size(name: &str, size: i64) -> Self {
        Self::new(
            ErrorKind::InvalidArraySize,
            format!("array {name} declared with invalid size {size} (allowed 0 to {MAX_ARRAY_SIZE})"),
        )
    }

    pub fn invalid_type(ty: &str) -> Self {
        Self::new(ErrorKind::InvalidType, format!("type {ty} is not implemented"))
    }

    pub fn call_with_wrong_arity(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::CallWithWrongArity,
            format!("function {name} expects {expected} parameter(s), {got} given"),
        )
    }

    pub fn unimplemented_operation(op: &str) -> Self {
        Self::new(
            ErrorKind::UnimplementedOperation,
            format!("operation {op} is not implemented"),
        )
    }

    pub fn division_by_zero(op: &str) -> Self {
        Self::new(ErrorKind::DivisionByZero, format!("division by zero in `{op}`"))
    }

    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("expected {expected}, got {got}"),
        )
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            format!("stack overflow: call depth exceeded {limit}"),
        )
    }

    pub fn io_error(msg: &str) -> Self {
        Self::new(ErrorKind::IoError, format!("IO error: {msg}"))
    }

    pub fn malformed_tree(kind: &str, what: &str) -> Self {
        Self::new(
            ErrorKind::MalformedTree,
            format!("malformed {kind} node: missing {what}"),
        )
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
