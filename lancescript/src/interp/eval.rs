//! Tree evaluator

use super::console::Console;
use super::error::{InterpResult, RuntimeError};
use super::function::{FormalParameter, Function};
use super::scope::{Frame, Symbol, SymbolTable};
use super::value::{ArrayVariable, Constant, ScalarVariable, Value, VarType, Variable};
use crate::ast::{Child, NodeKind, Tree};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Default limit on nested function calls
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 10_000;

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Answer `read` with seeded pseudo-random values instead of blocking
    pub mock_input: bool,
    pub seed: u64,
    pub max_recursion_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            mock_input: false,
            seed: 0,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

/// The interpreter. One instance runs one program (or one REPL session).
pub struct Interpreter {
    symbols: SymbolTable,
    console: Console,
    /// Current function call depth
    recursion_depth: usize,
    max_recursion_depth: usize,
}

impl Interpreter {
    /// Interpreter on stdin/stdout with default settings
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self::with_console(config, Console::stdio())
    }

    pub fn with_console(config: InterpreterConfig, console: Console) -> Self {
        let console = if config.mock_input {
            console.with_mock_input(config.seed)
        } else {
            console
        };
        Interpreter {
            symbols: SymbolTable::new(),
            console,
            recursion_depth: 0,
            max_recursion_depth: config.max_recursion_depth,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Forget every variable, constant and function
    pub fn reset(&mut self) {
        self.symbols = SymbolTable::new();
        self.recursion_depth = 0;
    }

    /// Run a whole program tree
    pub fn run(&mut self, program: &Tree) -> InterpResult<()> {
        self.evaluate(program, None).map(|_| ())
    }

    /// Evaluate `node`, inside a new frame holding `bindings` when given.
    /// The frame is popped whether or not evaluation succeeds.
    pub fn evaluate(&mut self, node: &Tree, bindings: Option<Frame>) -> InterpResult<Value> {
        match bindings {
            Some(frame) => self.in_frame(frame, |interp| interp.eval(node)),
            None => self.eval(node),
        }
    }

    fn in_frame<T>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> InterpResult<T>,
    ) -> InterpResult<T> {
        let depth = self.symbols.scopes.push(frame);
        trace!(depth, "push frame");
        let result = f(self);
        self.symbols.scopes.pop();
        result
    }

    /// Evaluate with automatic stack growth for deep trees
    fn eval(&mut self, node: &Tree) -> InterpResult<Value> {
        ensure_sufficient_stack(|| self.eval_inner(node))
    }

    fn eval_int(&mut self, node: &Tree) -> InterpResult<i64> {
        self.eval(node)?.as_int()
    }

    fn eval_inner(&mut self, node: &Tree) -> InterpResult<Value> {
        trace!(kind = %node.kind, span = %node.span, "eval");
        match &node.kind {
            NodeKind::Program => self.eval_sequence(node),
            NodeKind::CodeBlock => self.in_frame(Frame::new(), |interp| interp.eval_sequence(node)),

            // Declarations and assignment
            NodeKind::ConstDecl => self.eval_const_decl(node),
            NodeKind::VarDecl => self.eval_var_decl(node),
            NodeKind::ScalarAssignment => self.eval_scalar_assignment(node),
            NodeKind::ArrayAssignment => self.eval_array_assignment(node),

            // Functions
            NodeKind::FunctionDeclaration => self.eval_function_declaration(node),
            NodeKind::FunctionCall => self.eval_function_call(node),

            // I/O
            NodeKind::ReadStmt => self.eval_read(node),
            NodeKind::WriteStmt => {
                let value = self.eval_int(node_at(node, 0, "expression")?)?;
                self.console.write_int(value)?;
                Ok(Value::Unit)
            }
            // Only meaningful as a direct child of a block, where it ends the sequence
            NodeKind::ReturnStmt => {
                debug!(span = %node.span, "return outside a statement sequence has no effect");
                Ok(Value::Unit)
            }

            // Expressions
            NodeKind::BinExpr => self.eval_binexpr(node),
            NodeKind::IntExpr => {
                let text = leaf_at(node, 0, "integer literal")?;
                text.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| {
                        RuntimeError::malformed_tree("intexpr", &format!("integer literal (got {text:?})"))
                    })
            }
            NodeKind::ScalarExpr => self.eval_scalar_expr(node),
            NodeKind::ArrayExpr => self.eval_array_expr(node),
            NodeKind::LnotExpr => {
                let value = self.eval_int(node_at(node, 0, "operand")?)?;
                Ok(Value::Int(bool_to_int(value == 0)))
            }
            NodeKind::NegExpr => {
                let value = self.eval_int(node_at(node, 1, "operand")?)?;
                Ok(Value::Int(value.wrapping_neg()))
            }

            // Control flow
            NodeKind::IfStatement => {
                if self.eval_int(node_at(node, 0, "condition")?)? != 0 {
                    self.eval(node_at(node, 1, "body")?)?;
                }
                Ok(Value::Unit)
            }
            NodeKind::IfElseStatement => self.eval_if_else(node),
            NodeKind::WhileConstruct => {
                let cond = node_at(node, 0, "condition")?;
                let body = node_at(node, 1, "body")?;
                while self.eval_int(cond)? != 0 {
                    self.eval(body)?;
                }
                Ok(Value::Unit)
            }
            NodeKind::DoWhileConstruct => {
                let body = node_at(node, 0, "body")?;
                let cond = node_at(node, 1, "condition")?;
                self.eval(body)?;
                while self.eval_int(cond)? != 0 {
                    self.eval(body)?;
                }
                Ok(Value::Unit)
            }
            NodeKind::ForConstruct => {
                let init = node_at(node, 0, "initializer")?;
                let cond = node_at(node, 1, "condition")?;
                let step = node_at(node, 2, "step")?;
                let body = node_at(node, 3, "body")?;
                self.eval(init)?;
                while self.eval_int(cond)? != 0 {
                    self.eval(body)?;
                    self.eval(step)?;
                }
                Ok(Value::Unit)
            }

            // Structural kinds are consumed by their parents; reaching one
            // here, or any unknown kind, hands the node back untouched.
            NodeKind::DeclarationList
            | NodeKind::ScalarDeclaration
            | NodeKind::ArrayDeclaration
            | NodeKind::DeclarationAndAssignment
            | NodeKind::FunctionParametersDeclaration
            | NodeKind::ScalarParameter
            | NodeKind::ArrayParameter
            | NodeKind::CallArguments
            | NodeKind::Other(_) => {
                warn!(kind = %node.kind, span = %node.span, "action not implemented");
                Ok(Value::Node(node.clone()))
            }
        }
    }

    /// Children in order, stopping before the first `return_stmt`
    fn eval_sequence(&mut self, node: &Tree) -> InterpResult<Value> {
        for child in &node.children {
            let Child::Node(stmt) = child else {
                return Err(RuntimeError::malformed_tree(node.kind.tag(), "statement node"));
            };
            if stmt.is(&NodeKind::ReturnStmt) {
                debug!(span = %stmt.span, "return ends the sequence");
                break;
            }
            self.eval(stmt)?;
        }
        Ok(Value::Unit)
    }

    // ============ Variables & constants ============

    fn eval_const_decl(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "constant name")?;
        let value = self.eval_int(node_at(node, 1, "value")?)?;
        debug!(name, value, "declaring constant");
        self.symbols
            .declare_constant(Constant::new(name, VarType::Int, value))?;
        Ok(Value::Unit)
    }

    fn eval_var_decl(&mut self, node: &Tree) -> InterpResult<Value> {
        let ty: VarType = leaf_at(node, 0, "type")?.parse()?;
        let list = node_at(node, 1, "declaration list")?;

        for child in &list.children {
            let Child::Node(decl) = child else {
                return Err(RuntimeError::malformed_tree("declaration_list", "declaration node"));
            };
            let name = leaf_at(decl, 0, "variable name")?;
            self.symbols.check_data_name(name)?;

            let variable = match &decl.kind {
                NodeKind::ScalarDeclaration => Variable::Scalar(ScalarVariable::new(name, ty)),
                NodeKind::ArrayDeclaration => {
                    let size = self.eval_int(node_at(decl, 1, "array size")?)?;
                    Variable::array(ArrayVariable::new(name, ty, size)?)
                }
                NodeKind::DeclarationAndAssignment => {
                    let value = self.eval_int(node_at(decl, 1, "initial value")?)?;
                    Variable::Scalar(ScalarVariable::with_value(name, ty, value))
                }
                other => {
                    warn!(kind = %other, "unknown declaration form skipped");
                    continue;
                }
            };
            debug!(name, shape = variable.describe(), "declaring variable");
            self.symbols.declare_variable(name, variable)?;
        }
        Ok(Value::Unit)
    }

    /// Shared checks of both assignment forms, in reporting order
    fn check_assignable(&self, name: &str) -> InterpResult<()> {
        if self.symbols.is_constant(name) {
            return Err(RuntimeError::cannot_assign_constant(name));
        }
        if !self.symbols.is_declared_anywhere(name) {
            return Err(RuntimeError::assignment_to_undefined_variable(name));
        }
        Ok(())
    }

    fn eval_scalar_assignment(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "variable name")?;
        let value = self.eval_int(node_at(node, 1, "value")?)?;
        self.check_assignable(name)?;

        match self.symbols.resolve_variable_mut(name)? {
            Variable::Scalar(scalar) => scalar.set(value),
            Variable::Array(_) => {
                return Err(RuntimeError::wrong_assignment(name, "scalar", "an array"));
            }
        }
        Ok(Value::Unit)
    }

    fn eval_array_assignment(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "array name")?;
        let index = self.eval_int(node_at(node, 1, "index")?)?;
        let value = self.eval_int(node_at(node, 2, "value")?)?;
        self.check_assignable(name)?;

        match self.symbols.resolve_variable(name)? {
            Variable::Array(array) => array.borrow_mut().set(index, value)?,
            Variable::Scalar(_) => {
                return Err(RuntimeError::wrong_assignment(name, "array", "a scalar"));
            }
        }
        Ok(Value::Unit)
    }

    // ============ Functions ============

    fn eval_function_declaration(&mut self, node: &Tree) -> InterpResult<Value> {
        let return_type: VarType = leaf_at(node, 0, "return type")?.parse()?;
        let name = leaf_at(node, 1, "function name")?;
        if self.symbols.is_symbol_declared(name) {
            return Err(RuntimeError::symbol_already_in_use(name));
        }

        let (parameters, body) = if node.children.len() == 4 {
            let params = node_at(node, 2, "parameter list")?;
            (self.formal_parameters(params)?, node_at(node, 3, "body")?)
        } else {
            (Vec::new(), node_at(node, 2, "body")?)
        };

        debug!(name, arity = parameters.len(), "declaring function");
        self.symbols.declare_function(Function {
            name: name.to_string(),
            return_type,
            parameters,
            body: body.clone(),
        })?;
        Ok(Value::Unit)
    }

    fn formal_parameters(&self, params: &Tree) -> InterpResult<Vec<FormalParameter>> {
        let mut parameters = Vec::with_capacity(params.children.len());
        for child in &params.children {
            let Child::Node(param) = child else {
                return Err(RuntimeError::malformed_tree(params.kind.tag(), "parameter node"));
            };
            let ty: VarType = leaf_at(param, 0, "parameter type")?.parse()?;
            let name = leaf_at(param, 1, "parameter name")?;
            let parameter = match &param.kind {
                NodeKind::ScalarParameter => FormalParameter::scalar(name, ty),
                NodeKind::ArrayParameter => FormalParameter::array(name, ty),
                _ => {
                    return Err(RuntimeError::malformed_tree(param.kind.tag(), "parameter kind"));
                }
            };
            parameters.push(parameter);
        }
        Ok(parameters)
    }

    fn eval_function_call(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "function name")?;
        let function = self.symbols.resolve_function(name)?;

        let arg_list = node_at(node, 1, "argument list")?;
        let mut args = Vec::with_capacity(arg_list.children.len());
        for child in &arg_list.children {
            let Child::Node(arg) = child else {
                return Err(RuntimeError::malformed_tree(arg_list.kind.tag(), "argument node"));
            };
            args.push(arg);
        }
        function.check_arity(args.len())?;

        let bindings = self.bind_parameters(&function, &args)?;
        self.call_function(&function, bindings)
    }

    /// Scalars are copied from the caller's scope; arrays alias the caller's storage
    fn bind_parameters(&mut self, function: &Function, args: &[&Tree]) -> InterpResult<Frame> {
        let mut frame = Frame::new();
        for (param, arg) in function.parameters.iter().zip(args) {
            let variable = if param.is_array {
                if !arg.is(&NodeKind::ScalarExpr) {
                    return Err(RuntimeError::wrong_access(
                        &format!("argument for {}", param.name),
                        "an array name",
                        "an expression",
                    ));
                }
                let source = leaf_at(arg, 0, "array name")?;
                match self.symbols.resolve_variable(source)? {
                    Variable::Array(array) => Variable::Array(Rc::clone(array)),
                    Variable::Scalar(_) => {
                        return Err(RuntimeError::wrong_access(source, "an array", "a scalar"));
                    }
                }
            } else {
                let value = self.eval_int(arg)?;
                Variable::Scalar(ScalarVariable::with_value(&param.name, param.ty, value))
            };
            frame.insert(param.name.clone(), variable);
        }
        Ok(frame)
    }

    /// Call a function with automatic stack growth
    fn call_function(&mut self, function: &Function, bindings: Frame) -> InterpResult<Value> {
        ensure_sufficient_stack(|| {
            self.call_function_inner(function, bindings)
        })
    }

    fn call_function_inner(&mut self, function: &Function, bindings: Frame) -> InterpResult<Value> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_recursion_depth {
            self.recursion_depth -= 1;
            return Err(RuntimeError::stack_overflow(self.max_recursion_depth));
        }
        debug!(name = %function.name, depth = self.recursion_depth, "call");

        let result = self.evaluate(&function.body, Some(bindings));
        self.recursion_depth -= 1;
        result
    }

    // ============ I/O ============

    fn eval_read(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "variable name")?;
        if self.symbols.is_constant(name) {
            return Err(RuntimeError::cannot_assign_constant(name));
        }
        match self.symbols.scopes.get(name) {
            None => return Err(RuntimeError::variable_undeclared(name)),
            Some(Variable::Array(_)) => return Err(RuntimeError::cannot_read_array(name)),
            Some(Variable::Scalar(_)) => {}
        }

        let value = self.console.read_int(name)?;
        if let Variable::Scalar(scalar) = self.symbols.resolve_variable_mut(name)? {
            scalar.set(value);
        }
        Ok(Value::Unit)
    }

    // ============ Expressions ============

    fn eval_binexpr(&mut self, node: &Tree) -> InterpResult<Value> {
        let lhs = node_at(node, 0, "left operand")?;
        let op = leaf_at(node, 1, "operator")?;
        let rhs = node_at(node, 2, "right operand")?;

        // Each operand tree is evaluated at most once; the right one only when needed
        let result = match op {
            "&&" => {
                if self.eval_int(lhs)? == 0 {
                    0
                } else {
                    bool_to_int(self.eval_int(rhs)? != 0)
                }
            }
            "||" => {
                if self.eval_int(lhs)? != 0 {
                    1
                } else {
                    bool_to_int(self.eval_int(rhs)? != 0)
                }
            }
            _ => {
                let left = self.eval_int(lhs)?;
                let right = self.eval_int(rhs)?;
                eval_binary(op, left, right)?
            }
        };
        Ok(Value::Int(result))
    }

    fn eval_scalar_expr(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "name")?;
        let value = match self.symbols.resolve_symbol(name)? {
            Symbol::Constant(constant) => constant.value,
            Symbol::Variable(Variable::Scalar(scalar)) => scalar.get()?,
            Symbol::Variable(Variable::Array(_)) => {
                return Err(RuntimeError::wrong_access(name, "a scalar", "an array"));
            }
        };
        Ok(Value::Int(value))
    }

    fn eval_array_expr(&mut self, node: &Tree) -> InterpResult<Value> {
        let name = leaf_at(node, 0, "array name")?;
        let index = self.eval_int(node_at(node, 1, "index")?)?;
        match self.symbols.resolve_variable(name)? {
            Variable::Array(array) => Ok(Value::Int(array.borrow().get(index)?)),
            Variable::Scalar(_) => Err(RuntimeError::wrong_access(name, "an array", "a scalar")),
        }
    }

    fn eval_if_else(&mut self, node: &Tree) -> InterpResult<Value> {
        let if_node = node_at(node, 0, "if branch")?;
        let cond = node_at(if_node, 0, "condition")?;
        let then_block = node_at(if_node, 1, "body")?;
        let else_block = node_at(node, 1, "else branch")?;

        if self.eval_int(cond)? != 0 {
            self.eval(then_block)?;
        } else {
            self.eval(else_block)?;
        }
        Ok(Value::Unit)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a non-short-circuit binary operator to two integers
pub fn eval_binary(op: &str, left: i64, right: i64) -> InterpResult<i64> {
    let value = match op {
        "+" => left.wrapping_add(right),
        "-" => left.wrapping_sub(right),
        "*" => left.wrapping_mul(right),
        "/" => floor_div(left, right).ok_or_else(|| RuntimeError::division_by_zero(op))?,
        "%" => floor_mod(left, right).ok_or_else(|| RuntimeError::division_by_zero(op))?,
        "==" => bool_to_int(left == right),
        "!=" => bool_to_int(left != right),
        ">" => bool_to_int(left > right),
        ">=" => bool_to_int(left >= right),
        "<" => bool_to_int(left < right),
        "<=" => bool_to_int(left <= right),
        "&" => left & right,
        "|" => left | right,
        "^" => left ^ right,
        other => return Err(RuntimeError::unimplemented_operation(other)),
    };
    Ok(value)
}

/// Quotient rounded toward negative infinity; `None` when dividing by zero
fn floor_div(left: i64, right: i64) -> Option<i64> {
    if right == 0 {
        return None;
    }
    let quotient = left.wrapping_div(right);
    let remainder = left.wrapping_rem(right);
    if remainder != 0 && ((remainder < 0) != (right < 0)) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Remainder carrying the sign of the divisor; `None` when dividing by zero
fn floor_mod(left: i64, right: i64) -> Option<i64> {
    if right == 0 {
        return None;
    }
    let remainder = left.wrapping_rem(right);
    if remainder != 0 && ((remainder < 0) != (right < 0)) {
        Some(remainder + right)
    } else {
        Some(remainder)
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn node_at<'t>(node: &'t Tree, index: usize, what: &str) -> InterpResult<&'t Tree> {
    node.node(index)
        .ok_or_else(|| RuntimeError::malformed_tree(node.kind.tag(), what))
}

fn leaf_at<'t>(node: &'t Tree, index: usize, what: &str) -> InterpResult<&'t str> {
    node.leaf(index)
        .ok_or_else(|| RuntimeError::malformed_tree(node.kind.tag(), what))
}
