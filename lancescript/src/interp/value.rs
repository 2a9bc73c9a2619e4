//! Runtime values and variable storage

use super::error::{InterpResult, RuntimeError};
use crate::ast::Tree;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Declared type of a variable, constant, parameter or function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Int,
}

impl FromStr for VarType {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(VarType::Int),
            other => Err(RuntimeError::invalid_type(other)),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Int => write!(f, "int"),
        }
    }
}

/// Result of evaluating a node
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    /// Statements, function calls and early-exited blocks
    Unit,
    /// Node handed back unevaluated because no handler exists for its kind
    Node(Tree),
}

impl Value {
    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "int",
            Value::Unit => "()",
            Value::Node(tree) => tree.kind.tag(),
        }
    }

    /// Integer payload, or a type mismatch for anything else
    pub fn as_int(&self) -> InterpResult<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(RuntimeError::type_mismatch("int", other.type_name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Unit => write!(f, "()"),
            Value::Node(tree) => write!(f, "<{} node>", tree.kind),
        }
    }
}

/// Integer slot that remembers whether it was ever written
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarVariable {
    pub name: String,
    pub ty: VarType,
    value: Option<i64>,
}

impl ScalarVariable {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        ScalarVariable {
            name: name.into(),
            ty,
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, ty: VarType, value: i64) -> Self {
        ScalarVariable {
            name: name.into(),
            ty,
            value: Some(value),
        }
    }

    pub fn get(&self) -> InterpResult<i64> {
        self.value
            .ok_or_else(|| RuntimeError::uninitialized_value_access(&self.name))
    }

    pub fn set(&mut self, value: i64) {
        self.value = Some(value);
    }
}

/// Largest number of elements a single array may hold
pub const MAX_ARRAY_SIZE: usize = 1 << 24;

/// Fixed-size array; each element tracks its own initialization
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVariable {
    pub name: String,
    pub ty: VarType,
    elements: Vec<Option<i64>>,
}

impl ArrayVariable {
    /// Array of `size` uninitialized elements. Sizes outside
    /// `0..=MAX_ARRAY_SIZE`, or ones that cannot be allocated, are rejected.
    pub fn new(name: impl Into<String>, ty: VarType, size: i64) -> InterpResult<Self> {
        let name = name.into();
        let len = usize::try_from(size)
            .ok()
            .filter(|&len| len <= MAX_ARRAY_SIZE)
            .ok_or_else(|| RuntimeError::invalid_array_size(&name, size))?;

        let mut elements = Vec::new();
        elements
            .try_reserve_exact(len)
            .map_err(|_| RuntimeError::invalid_array_size(&name, size))?;
        elements.resize(len, None);
        Ok(ArrayVariable { name, ty, elements })
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn get(&self, index: i64) -> InterpResult<i64> {
        let slot = self.slot(index, "read")?;
        self.elements[slot]
            .ok_or_else(|| RuntimeError::uninitialized_value_access(&format!("{}_{slot}", self.name)))
    }

    pub fn set(&mut self, index: i64, value: i64) -> InterpResult<()> {
        let slot = self.slot(index, "write")?;
        self.elements[slot] = Some(value);
        Ok(())
    }

    /// Bounds-checked position of `index` within the elements
    fn slot(&self, index: i64, access: &str) -> InterpResult<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.elements.len())
            .ok_or_else(|| RuntimeError::out_of_bounds(access, index, &self.name, self.size()))
    }
}

/// Arrays are shared so that array parameters alias the caller's storage
pub type ArrayRef = Rc<RefCell<ArrayVariable>>;

/// Entry of a scope frame
#[derive(Debug, Clone)]
pub enum Variable {
    Scalar(ScalarVariable),
    Array(ArrayRef),
}

impl Variable {
    pub fn array(array: ArrayVariable) -> Self {
        Variable::Array(Rc::new(RefCell::new(array)))
    }

    /// Article-prefixed shape, for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Variable::Scalar(_) => "a scalar",
            Variable::Array(_) => "an array",
        }
    }
}

/// Immutable named value
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub ty: VarType,
    pub value: i64,
}

impl Constant {
    pub fn new(name: impl Into<String>, ty: VarType, value: i64) -> Self {
        Constant {
            name: name.into(),
            ty,
            value,
        }
    }
}
