//! Recursive-descent parser producing the generic syntax tree

use crate::ast::{Child, Leaf, NodeKind, Span, Tree};
use crate::error::{CompileError, Result};
use crate::lexer::Token;
use crate::stack::ensure_sufficient_stack;


/// Binary operator precedence levels, loosest first
const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &["<", "<=", ">", ">="],
    &["+", "-"],
    &["*", "/", "%"],
];

/// Deepest allowed nesting of statements and expressions
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Parse tokens into a `program` tree
pub fn parse(_filename: &str, source: &str, tokens: Vec<(Token, Span)>) -> Result<Tree> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        last_end: 0,
        eof: source.len(),
        depth: 0,
    };
    parser.program()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    /// End offset of the most recently consumed token
    last_end: usize,
    eof: usize,
    /// Statements and expressions currently open
    depth: usize,
}

impl Parser {
    // ============ Token cursor ============

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(tok, _)| tok)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| *span)
            .unwrap_or_else(|| Span::point(self.eof))
    }

    fn start(&self) -> usize {
        self.current_span().start
    }

    fn finish(&self, start: usize) -> Span {
        Span::new(start, self.last_end.max(start))
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        self.last_end = item.1.end;
        Some(item)
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Span> {
        match self.advance() {
            Some((tok, span)) if tok == expected => Ok(span),
            Some((tok, span)) => Err(CompileError::parser(
                format!("expected `{expected}`, found `{tok}`"),
                span,
            )),
            None => Err(self.eof_error(&format!("`{expected}`"))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Leaf> {
        match self.advance() {
            Some((Token::Ident(name), span)) => Ok(Leaf::new(name, span)),
            Some((tok, span)) => Err(CompileError::parser(
                format!("expected {what}, found `{tok}`"),
                span,
            )),
            None => Err(self.eof_error(what)),
        }
    }

    fn eof_error(&self, what: &str) -> CompileError {
        CompileError::parser(
            format!("expected {what}, found end of input"),
            Span::point(self.eof),
        )
    }

    fn unexpected(&self, what: &str) -> CompileError {
        match self.peek() {
            Some(tok) => CompileError::parser(
                format!("expected {what}, found `{tok}`"),
                self.current_span(),
            ),
            None => self.eof_error(what),
        }
    }

    /// Run `f` one nesting level deeper, refusing to go past `MAX_NESTING_DEPTH`
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CompileError::parser(
                format!("nesting exceeds {MAX_NESTING_DEPTH} levels"),
                self.current_span(),
            ));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    // ============ Items and statements ============

    fn program(&mut self) -> Result<Tree> {
        let mut items = Vec::new();
        while self.peek().is_some() {
            let is_function = matches!(
                (self.peek(), self.peek_at(1), self.peek_at(2)),
                (Some(Token::Ident(_)), Some(Token::Ident(_)), Some(Token::LParen))
            );
            let item = if is_function {
                self.function_declaration()?
            } else {
                self.statement()?
            };
            items.push(Child::Node(item));
        }
        Ok(Tree::new(NodeKind::Program, items, Span::new(0, self.eof)))
    }

    fn function_declaration(&mut self) -> Result<Tree> {
        let start = self.start();
        let ty = self.expect_ident("return type")?;
        let name = self.expect_ident("function name")?;
        self.expect(Token::LParen)?;

        let mut children = vec![Child::Leaf(ty), Child::Leaf(name)];
        if !self.check(&Token::RParen) {
            let params_start = self.start();
            let mut params = vec![Child::Node(self.parameter()?)];
            while self.eat(&Token::Comma) {
                params.push(Child::Node(self.parameter()?));
            }
            children.push(Child::Node(Tree::new(
                NodeKind::FunctionParametersDeclaration,
                params,
                self.finish(params_start),
            )));
        }
        self.expect(Token::RParen)?;

        if !self.check(&Token::LBrace) {
            return Err(self.unexpected("function body"));
        }
        children.push(Child::Node(self.block()?));
        Ok(Tree::new(NodeKind::FunctionDeclaration, children, self.finish(start)))
    }

    fn parameter(&mut self) -> Result<Tree> {
        let start = self.start();
        let ty = self.expect_ident("parameter type")?;
        let name = self.expect_ident("parameter name")?;
        let kind = if self.eat(&Token::LBracket) {
            self.expect(Token::RBracket)?;
            NodeKind::ArrayParameter
        } else {
            NodeKind::ScalarParameter
        };
        Ok(Tree::new(
            kind,
            vec![Child::Leaf(ty), Child::Leaf(name)],
            self.finish(start),
        ))
    }

    fn statement(&mut self) -> Result<Tree> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> Result<Tree> {
        match self.peek() {
            Some(Token::Const) => self.const_decl(),
            Some(Token::LBrace) => self.block(),
            Some(Token::If) => self.if_statement(),
            Some(Token::While) => self.while_construct(),
            Some(Token::Do) => self.do_while_construct(),
            Some(Token::For) => self.for_construct(),
            Some(Token::Read) => self.read_stmt(),
            Some(Token::Write) => self.write_stmt(),
            Some(Token::Return) => self.return_stmt(),
            Some(Token::Ident(_)) if matches!(self.peek_at(1), Some(Token::Ident(_))) => {
                self.var_decl()
            }
            Some(Token::Ident(_)) => {
                let start = self.start();
                let mut stmt = self.simple_statement()?;
                self.expect(Token::Semi)?;
                stmt.span = self.finish(start);
                Ok(stmt)
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    fn block(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.eof_error("`}`"));
            }
            stmts.push(Child::Node(self.statement()?));
        }
        self.expect(Token::RBrace)?;
        Ok(Tree::new(NodeKind::CodeBlock, stmts, self.finish(start)))
    }

    fn var_decl(&mut self) -> Result<Tree> {
        let start = self.start();
        let ty = self.expect_ident("type")?;

        let list_start = self.start();
        let mut decls = vec![Child::Node(self.declarator()?)];
        while self.eat(&Token::Comma) {
            decls.push(Child::Node(self.declarator()?));
        }
        let list = Tree::new(NodeKind::DeclarationList, decls, self.finish(list_start));

        self.expect(Token::Semi)?;
        Ok(Tree::new(
            NodeKind::VarDecl,
            vec![Child::Leaf(ty), Child::Node(list)],
            self.finish(start),
        ))
    }

    fn declarator(&mut self) -> Result<Tree> {
        let start = self.start();
        let name = Child::Leaf(self.expect_ident("variable name")?);
        let (kind, children) = if self.eat(&Token::LBracket) {
            let size = self.expression()?;
            self.expect(Token::RBracket)?;
            (NodeKind::ArrayDeclaration, vec![name, Child::Node(size)])
        } else if self.eat(&Token::Eq) {
            let value = self.expression()?;
            (NodeKind::DeclarationAndAssignment, vec![name, Child::Node(value)])
        } else {
            (NodeKind::ScalarDeclaration, vec![name])
        };
        Ok(Tree::new(kind, children, self.finish(start)))
    }

    fn const_decl(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::Const)?;
        let mut name = self.expect_ident("constant name")?;
        // `const int N = ...`: the leading word was the type
        if matches!(self.peek(), Some(Token::Ident(_))) {
            name = self.expect_ident("constant name")?;
        }
        self.expect(Token::Eq)?;
        let value = self.expression()?;
        self.expect(Token::Semi)?;
        Ok(Tree::new(
            NodeKind::ConstDecl,
            vec![Child::Leaf(name), Child::Node(value)],
            self.finish(start),
        ))
    }

    /// Assignment or call, without the trailing `;`
    fn simple_statement(&mut self) -> Result<Tree> {
        let start = self.start();
        let name = self.expect_ident("assignment or call")?;
        match self.peek() {
            Some(Token::Eq) => {
                self.advance();
                let value = self.expression()?;
                Ok(Tree::new(
                    NodeKind::ScalarAssignment,
                    vec![Child::Leaf(name), Child::Node(value)],
                    self.finish(start),
                ))
            }
            Some(Token::LBracket) => {
                self.advance();
                let index = self.expression()?;
                self.expect(Token::RBracket)?;
                self.expect(Token::Eq)?;
                let value = self.expression()?;
                Ok(Tree::new(
                    NodeKind::ArrayAssignment,
                    vec![Child::Leaf(name), Child::Node(index), Child::Node(value)],
                    self.finish(start),
                ))
            }
            Some(Token::LParen) => self.call(name, start),
            _ => Err(self.unexpected("`=`, `[` or `(`")),
        }
    }

    fn if_statement(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::If)?;
        let cond = self.condition()?;
        let then_branch = self.statement()?;
        let if_node = Tree::new(
            NodeKind::IfStatement,
            vec![Child::Node(cond), Child::Node(then_branch)],
            self.finish(start),
        );

        if !self.eat(&Token::Else) {
            return Ok(if_node);
        }
        let else_branch = self.statement()?;
        Ok(Tree::new(
            NodeKind::IfElseStatement,
            vec![Child::Node(if_node), Child::Node(else_branch)],
            self.finish(start),
        ))
    }

    fn while_construct(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::While)?;
        let cond = self.condition()?;
        let body = self.statement()?;
        Ok(Tree::new(
            NodeKind::WhileConstruct,
            vec![Child::Node(cond), Child::Node(body)],
            self.finish(start),
        ))
    }

    fn do_while_construct(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::Do)?;
        let body = self.statement()?;
        self.expect(Token::While)?;
        let cond = self.condition()?;
        self.expect(Token::Semi)?;
        Ok(Tree::new(
            NodeKind::DoWhileConstruct,
            vec![Child::Node(body), Child::Node(cond)],
            self.finish(start),
        ))
    }

    fn for_construct(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::For)?;
        self.expect(Token::LParen)?;
        let init = self.simple_statement()?;
        self.expect(Token::Semi)?;
        let cond = self.expression()?;
        self.expect(Token::Semi)?;
        let step = self.simple_statement()?;
        self.expect(Token::RParen)?;
        let body = self.statement()?;
        Ok(Tree::new(
            NodeKind::ForConstruct,
            vec![
                Child::Node(init),
                Child::Node(cond),
                Child::Node(step),
                Child::Node(body),
            ],
            self.finish(start),
        ))
    }

    fn read_stmt(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::Read)?;
        let name = self.expect_ident("variable name")?;
        self.expect(Token::Semi)?;
        Ok(Tree::new(NodeKind::ReadStmt, vec![Child::Leaf(name)], self.finish(start)))
    }

    fn write_stmt(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::Write)?;
        let value = self.expression()?;
        self.expect(Token::Semi)?;
        Ok(Tree::new(NodeKind::WriteStmt, vec![Child::Node(value)], self.finish(start)))
    }

    fn return_stmt(&mut self) -> Result<Tree> {
        let start = self.start();
        self.expect(Token::Return)?;
        let mut children = Vec::new();
        if !self.check(&Token::Semi) {
            children.push(Child::Node(self.expression()?));
        }
        self.expect(Token::Semi)?;
        Ok(Tree::new(NodeKind::ReturnStmt, children, self.finish(start)))
    }

    fn condition(&mut self) -> Result<Tree> {
        self.expect(Token::LParen)?;
        let cond = self.expression()?;
        self.expect(Token::RParen)?;
        Ok(cond)
    }

    // ============ Expressions ============

    fn expression(&mut self) -> Result<Tree> {
        self.nested(|parser| parser.binary(0))
    }

    fn binary(&mut self, level: usize) -> Result<Tree> {
        let Some(ops) = BINARY_LEVELS.get(level) else {
            return self.unary();
        };

        let mut left = self.binary(level + 1)?;
        loop {
            let op = match self.peek().and_then(Token::binary_op) {
                Some(op) if ops.contains(&op) => op,
                _ => break,
            };
            let op_span = self.current_span();
            self.advance();
            let right = self.binary(level + 1)?;
            let span = left.span.merge(right.span);
            left = Tree::new(
                NodeKind::BinExpr,
                vec![
                    Child::Node(left),
                    Child::Leaf(Leaf::new(op, op_span)),
                    Child::Node(right),
                ],
                span,
            );
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Tree> {
        let start = self.start();
        match self.peek() {
            Some(Token::Bang) => {
                self.advance();
                let operand = self.nested(Self::unary)?;
                Ok(Tree::new(NodeKind::LnotExpr, vec![Child::Node(operand)], self.finish(start)))
            }
            Some(Token::Minus) => {
                let minus_span = self.current_span();
                self.advance();
                let operand = self.nested(Self::unary)?;
                Ok(Tree::new(
                    NodeKind::NegExpr,
                    vec![Child::Leaf(Leaf::new("-", minus_span)), Child::Node(operand)],
                    self.finish(start),
                ))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Tree> {
        let start = self.start();
        match self.advance() {
            Some((Token::IntLit(n), span)) => Ok(Tree::new(
                NodeKind::IntExpr,
                vec![Child::Leaf(Leaf::new(n.to_string(), span))],
                span,
            )),
            Some((Token::Ident(name), span)) => {
                let name = Leaf::new(name, span);
                match self.peek() {
                    Some(Token::LBracket) => {
                        self.advance();
                        let index = self.expression()?;
                        self.expect(Token::RBracket)?;
                        Ok(Tree::new(
                            NodeKind::ArrayExpr,
                            vec![Child::Leaf(name), Child::Node(index)],
                            self.finish(start),
                        ))
                    }
                    Some(Token::LParen) => self.call(name, start),
                    _ => Ok(Tree::new(NodeKind::ScalarExpr, vec![Child::Leaf(name)], span)),
                }
            }
            Some((Token::LParen, _)) => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some((tok, span)) => Err(CompileError::parser(
                format!("expected expression, found `{tok}`"),
                span,
            )),
            None => Err(self.eof_error("expression")),
        }
    }

    /// Argument list of a call whose name has already been consumed
    fn call(&mut self, name: Leaf, start: usize) -> Result<Tree> {
        let args_start = self.start();
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            args.push(Child::Node(self.expression()?));
            while self.eat(&Token::Comma) {
                args.push(Child::Node(self.expression()?));
            }
        }
        self.expect(Token::RParen)?;
        let args = Tree::new(NodeKind::CallArguments, args, self.finish(args_start));
        Ok(Tree::new(
            NodeKind::FunctionCall,
            vec![Child::Leaf(name), Child::Node(args)],
            self.finish(start),
        ))
    }
}
