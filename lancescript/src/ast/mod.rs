//! Syntax tree contract shared by the parser and the interpreter
//!
//! A tree is deliberately generic: every node carries a kind tag and an
//! ordered list of children, and leaves carry the literal token text.
//! The interpreter only relies on this shape, so trees can come from the
//! bundled parser or from JSON produced elsewhere.

mod span;

pub use span::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag of a syntax tree node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Program,
    CodeBlock,
    ConstDecl,
    VarDecl,
    DeclarationList,
    ScalarDeclaration,
    ArrayDeclaration,
    DeclarationAndAssignment,
    ScalarAssignment,
    ArrayAssignment,
    FunctionDeclaration,
    FunctionParametersDeclaration,
    ScalarParameter,
    ArrayParameter,
    FunctionCall,
    CallArguments,
    ReadStmt,
    WriteStmt,
    ReturnStmt,
    BinExpr,
    IntExpr,
    ScalarExpr,
    ArrayExpr,
    LnotExpr,
    NegExpr,
    IfStatement,
    IfElseStatement,
    WhileConstruct,
    DoWhileConstruct,
    ForConstruct,
    /// Any tag the interpreter has no handler for
    Other(String),
}

impl NodeKind {
    /// Map a snake_case tag to its kind; unknown tags become `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "program" => NodeKind::Program,
            "code_block" => NodeKind::CodeBlock,
            "const_decl" => NodeKind::ConstDecl,
            "var_decl" => NodeKind::VarDecl,
            "declaration_list" => NodeKind::DeclarationList,
            "scalar_declaration" => NodeKind::ScalarDeclaration,
            "array_declaration" => NodeKind::ArrayDeclaration,
            "declaration_and_assignment" => NodeKind::DeclarationAndAssignment,
            "scalar_assignment" => NodeKind::ScalarAssignment,
            "array_assignment" => NodeKind::ArrayAssignment,
            "function_declaration" => NodeKind::FunctionDeclaration,
            "function_parameters_declaration" => NodeKind::FunctionParametersDeclaration,
            "scalar_parameter" => NodeKind::ScalarParameter,
            "array_parameter" => NodeKind::ArrayParameter,
            "function_call" => NodeKind::FunctionCall,
            "call_arguments" => NodeKind::CallArguments,
            "read_stmt" => NodeKind::ReadStmt,
            "write_stmt" => NodeKind::WriteStmt,
            "return_stmt" => NodeKind::ReturnStmt,
            "binexpr" => NodeKind::BinExpr,
            "intexpr" => NodeKind::IntExpr,
            "scalar_expr" => NodeKind::ScalarExpr,
            "array_expr" => NodeKind::ArrayExpr,
            "lnot_expr" => NodeKind::LnotExpr,
            "neg_expr" => NodeKind::NegExpr,
            "if_statement" => NodeKind::IfStatement,
            "if_else_statement" => NodeKind::IfElseStatement,
            "while_construct" => NodeKind::WhileConstruct,
            "do_while_construct" => NodeKind::DoWhileConstruct,
            "for_construct" => NodeKind::ForConstruct,
            other => NodeKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Program => "program",
            NodeKind::CodeBlock => "code_block",
            NodeKind::ConstDecl => "const_decl",
            NodeKind::VarDecl => "var_decl",
            NodeKind::DeclarationList => "declaration_list",
            NodeKind::ScalarDeclaration => "scalar_declaration",
            NodeKind::ArrayDeclaration => "array_declaration",
            NodeKind::DeclarationAndAssignment => "declaration_and_assignment",
            NodeKind::ScalarAssignment => "scalar_assignment",
            NodeKind::ArrayAssignment => "array_assignment",
            NodeKind::FunctionDeclaration => "function_declaration",
            NodeKind::FunctionParametersDeclaration => "function_parameters_declaration",
            NodeKind::ScalarParameter => "scalar_parameter",
            NodeKind::ArrayParameter => "array_parameter",
            NodeKind::FunctionCall => "function_call",
            NodeKind::CallArguments => "call_arguments",
            NodeKind::ReadStmt => "read_stmt",
            NodeKind::WriteStmt => "write_stmt",
            NodeKind::ReturnStmt => "return_stmt",
            NodeKind::BinExpr => "binexpr",
            NodeKind::IntExpr => "intexpr",
            NodeKind::ScalarExpr => "scalar_expr",
            NodeKind::ArrayExpr => "array_expr",
            NodeKind::LnotExpr => "lnot_expr",
            NodeKind::NegExpr => "neg_expr",
            NodeKind::IfStatement => "if_statement",
            NodeKind::IfElseStatement => "if_else_statement",
            NodeKind::WhileConstruct => "while_construct",
            NodeKind::DoWhileConstruct => "do_while_construct",
            NodeKind::ForConstruct => "for_construct",
            NodeKind::Other(tag) => tag,
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::from_tag(&tag)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.tag().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Leaf token: identifier, integer literal or operator symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub value: String,
    #[serde(default)]
    pub span: Span,
}

impl Leaf {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }
}

/// A child slot is either a nested node or a leaf token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Node(Tree),
    Leaf(Leaf),
}

impl Child {
    pub fn as_node(&self) -> Option<&Tree> {
        match self {
            Child::Node(tree) => Some(tree),
            Child::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Child::Leaf(leaf) => Some(leaf),
            Child::Node(_) => None,
        }
    }
}

impl From<Tree> for Child {
    fn from(tree: Tree) -> Self {
        Child::Node(tree)
    }
}

impl From<Leaf> for Child {
    fn from(leaf: Leaf) -> Self {
        Child::Leaf(leaf)
    }
}

/// Syntax tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub span: Span,
}

impl Tree {
    pub fn new(kind: NodeKind, children: Vec<Child>, span: Span) -> Self {
        Self {
            kind,
            children,
            span,
        }
    }

    /// Nested node at position `index`, if that slot holds one
    pub fn node(&self, index: usize) -> Option<&Tree> {
        self.children.get(index).and_then(Child::as_node)
    }

    /// Token text at position `index`, if that slot holds a leaf
    pub fn leaf(&self, index: usize) -> Option<&str> {
        self.children
            .get(index)
            .and_then(Child::as_leaf)
            .map(|leaf| leaf.value.as_str())
    }

    pub fn is(&self, kind: &NodeKind) -> bool {
        &self.kind == kind
    }

    /// Indented outline of the tree, one node or token per line
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.kind.tag());
        out.push('\n');
        for child in &self.children {
            match child {
                Child::Node(tree) => tree.write_pretty(out, depth + 1),
                Child::Leaf(leaf) => {
                    out.push_str(&"  ".repeat(depth + 1));
                    out.push_str(&format!("{:?}\n", leaf.value));
                }
            }
        }
    }
}
