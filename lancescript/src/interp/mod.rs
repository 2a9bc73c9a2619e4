//! Tree-walking interpreter

mod console;
mod error;
mod eval;
mod function;
mod scope;
mod value;

pub use console::{Console, SharedOutput, MOCK_INPUT_MAX};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{eval_binary, Interpreter, InterpreterConfig, DEFAULT_MAX_RECURSION_DEPTH};
pub use function::{FormalParameter, Function};
pub use scope::{Frame, ScopeStack, Symbol, SymbolTable};
pub use value::{
    ArrayRef, ArrayVariable, Constant, ScalarVariable, Value, VarType, Variable, MAX_ARRAY_SIZE,
};
