// ABOUTME: Hand-written Pratt parser - turns a Lexer's token stream into a Program

use crate::ast::{
    BinaryOp, Expr, ExprKind, ExternArgType, Param, Program, Stmt, StmtKind, StructFieldDecl,
    StructFieldInit, TypeName, UnaryOp,
};
use crate::error::LexParseError;
use crate::lexer::Lexer;
use crate::token::{Literal, Location, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assignment,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        Assign | PlusEq | MinusEq | StarEq | SlashEq => Precedence::Assignment,
        Eq | NotEq => Precedence::Equals,
        Less | LessEq | Greater | GreaterEq => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Star | Slash => Precedence::Product,
        LParen => Precedence::Call,
        LSquare | Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn binary_op_of(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Less => BinaryOp::Lt,
        LessEq => BinaryOp::LtEq,
        Greater => BinaryOp::Gt,
        GreaterEq => BinaryOp::GtEq,
        Eq => BinaryOp::Eq,
        NotEq => BinaryOp::NotEq,
        _ => return None,
    })
}

fn type_name_of(kind: TokenKind) -> Option<TypeName> {
    use TokenKind::*;
    Some(match kind {
        IntType => TypeName::Int,
        FloatType => TypeName::Float,
        BoolType => TypeName::Bool,
        StringType => TypeName::String,
        VoidType => TypeName::Void,
        _ => return None,
    })
}

/// Drives a Lexer and produces a Program, accumulating diagnostics rather
/// than stopping at the first one.
pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    errors: Vec<LexParseError>,
    no_struct_literal: bool,
}

impl Parser {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        let mut lexer = Lexer::new(filename, source);
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
            no_struct_literal: false,
        }
    }

    pub fn errors(&self) -> &[LexParseError] {
        &self.errors
    }

    /// Reclaims the underlying Lexer once parsing is done, so the driver can
    /// hand it to the evaluator for error-location formatting.
    pub fn into_lexer(self) -> Lexer {
        self.lexer
    }

    /// Parses the whole token stream. A program is only returned when no
    /// diagnostics were raised; otherwise an empty Program signals the
    /// driver to print `errors()` and abort before evaluation.
    pub fn parse_program(&mut self) -> Program {
        let mut stmts = Vec::new();
        while self.cur.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            self.advance();
        }
        if self.errors.is_empty() {
            stmts
        } else {
            Vec::new()
        }
    }

    fn advance(&mut self) {
        std::mem::swap(&mut self.cur, &mut self.peek);
        self.peek = self.lexer.next_token();
    }

    fn push_error(&mut self, loc: Location, msg: impl Into<String>) {
        self.errors
            .push(LexParseError::new(self.lexer.fmt_error(loc, &msg.into())));
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek.kind == kind {
            self.advance();
            true
        } else {
            let loc = self.peek.loc;
            let msg = format!("expected {:?}, found {:?}", kind, self.peek.kind);
            self.push_error(loc, msg);
            false
        }
    }

    fn current_identifier(&mut self) -> Option<String> {
        match &self.cur.literal {
            Some(Literal::Str(s)) if self.cur.kind == TokenKind::Identifier => Some(s.clone()),
            _ => {
                self.push_error(self.cur.loc, "expected identifier");
                None
            }
        }
    }

    fn current_int(&mut self) -> Option<i64> {
        match self.cur.literal {
            Some(Literal::Int(n)) => Some(n),
            _ => {
                self.push_error(self.cur.loc, "expected integer literal");
                None
            }
        }
    }

    fn current_float(&mut self) -> Option<f64> {
        match self.cur.literal {
            Some(Literal::Float(n)) => Some(n),
            _ => {
                self.push_error(self.cur.loc, "expected float literal");
                None
            }
        }
    }

    fn current_bool(&mut self) -> Option<bool> {
        match self.cur.literal {
            Some(Literal::Bool(b)) => Some(b),
            _ => {
                self.push_error(self.cur.loc, "expected bool literal");
                None
            }
        }
    }

    fn current_string(&mut self) -> Option<String> {
        match &self.cur.literal {
            Some(Literal::Str(s)) => Some(s.clone()),
            _ => {
                self.push_error(self.cur.loc, "expected string literal");
                None
            }
        }
    }

    fn current_type_name(&mut self) -> Option<TypeName> {
        match type_name_of(self.cur.kind) {
            Some(t) => Some(t),
            None => {
                self.push_error(
                    self.cur.loc,
                    format!("expected type name, found {:?}", self.cur.kind),
                );
                None
            }
        }
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Func => self.parse_func_decl(),
            TokenKind::Extern => self.parse_extern_decl(),
            TokenKind::Struct => self.parse_struct_decl(),
            TokenKind::Error => {
                self.push_error(self.cur.loc, "unknown token");
                None
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_let_stmt(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.current_identifier()?;
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.advance();
        let init = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::new(StmtKind::Let { name, init }, loc))
    }

    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
            return Some(Stmt::new(StmtKind::Return(None), loc));
        }
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::new(StmtKind::Return(Some(value)), loc))
    }

    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::new(StmtKind::ExprStmt(expr), loc))
    }

    /// Precondition: `self.cur` is `{`. Consumes through the matching `}`.
    fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.advance();
        while self.cur.kind != TokenKind::RCurly {
            if self.cur.kind == TokenKind::Eof {
                self.push_error(self.cur.loc, "expected '}'");
                return None;
            }
            if self.cur.kind == TokenKind::Error {
                self.push_error(self.cur.loc, "unknown token");
                return None;
            }
            let stmt = self.parse_statement()?;
            stmts.push(stmt);
            self.advance();
        }
        Some(stmts)
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        self.advance();
        let saved = self.no_struct_literal;
        self.no_struct_literal = true;
        let cond = self.parse_expression(Precedence::Lowest);
        self.no_struct_literal = saved;
        let cond = cond?;
        if !self.expect_peek(TokenKind::LCurly) {
            return None;
        }
        let consequence = self.parse_block()?;

        let alternative = if self.peek.kind == TokenKind::Else {
            self.advance();
            if self.peek.kind == TokenKind::If {
                self.advance();
                let nested = self.parse_if_stmt()?;
                Some(vec![nested])
            } else {
                if !self.expect_peek(TokenKind::LCurly) {
                    return None;
                }
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Some(Stmt::new(
            StmtKind::If {
                cond,
                consequence,
                alternative,
            },
            loc,
        ))
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let init = if self.peek.kind == TokenKind::Semicolon {
            self.advance();
            None
        } else {
            self.advance();
            let stmt = match self.cur.kind {
                TokenKind::Let => self.parse_let_stmt()?,
                _ => self.parse_expr_stmt()?,
            };
            Some(Box::new(stmt))
        };
        // self.cur is now the init-slot's terminating ';'.

        let saved = self.no_struct_literal;
        self.no_struct_literal = true;
        let cond = if self.peek.kind == TokenKind::Semicolon {
            self.advance();
            None
        } else {
            self.advance();
            let e = self.parse_expression(Precedence::Lowest);
            match e {
                Some(e) => {
                    if !self.expect_peek(TokenKind::Semicolon) {
                        self.no_struct_literal = saved;
                        return None;
                    }
                    Some(e)
                }
                None => {
                    self.no_struct_literal = saved;
                    return None;
                }
            }
        };

        let post = if self.peek.kind == TokenKind::RParen {
            self.advance();
            None
        } else {
            self.advance();
            let e = self.parse_expression(Precedence::Lowest);
            self.no_struct_literal = saved;
            let e = e?;
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
            let e_loc = e.loc;
            Some(Box::new(Stmt::new(StmtKind::ExprStmt(e), e_loc)))
        };
        self.no_struct_literal = saved;

        if !self.expect_peek(TokenKind::LCurly) {
            return None;
        }
        let body = self.parse_block()?;

        Some(Stmt::new(
            StmtKind::For {
                init,
                cond,
                post,
                body,
            },
            loc,
        ))
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if self.peek.kind == TokenKind::RParen {
            self.advance();
            return Some(params);
        }
        loop {
            if !self.expect_peek(TokenKind::Identifier) {
                return None;
            }
            let name = self.current_identifier()?;
            params.push(Param { name });
            if self.peek.kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(params)
    }

    fn parse_func_decl(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.current_identifier()?;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let params = self.parse_params()?;
        if !self.expect_peek(TokenKind::LCurly) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Stmt::new(StmtKind::FuncDecl { name, params, body }, loc))
    }

    /// Parses the extern argument-type list. `self.cur` must be `(` on
    /// entry; on success `self.cur` is the matching `)`. At most one
    /// variadic marker is accepted, and only at the tail.
    fn parse_extern_arg_types(&mut self) -> Option<Vec<ExternArgType>> {
        let mut types = Vec::new();
        if self.peek.kind == TokenKind::RParen {
            self.advance();
            return Some(types);
        }
        loop {
            self.advance();
            if self.cur.kind == TokenKind::Ellipsis {
                types.push(ExternArgType::Variadic);
            } else {
                let t = self.current_type_name()?;
                types.push(ExternArgType::Concrete(t));
            }
            if self.peek.kind == TokenKind::Comma {
                if types.last() == Some(&ExternArgType::Variadic) {
                    self.push_error(self.peek.loc, "variadic marker must be the last argument type");
                    return None;
                }
                self.advance();
            } else {
                break;
            }
        }
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(types)
    }

    fn parse_extern_decl(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let library = self.current_identifier()?;
        if !self.expect_peek(TokenKind::Func) {
            return None;
        }
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let function = self.current_identifier()?;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let arg_types = self.parse_extern_arg_types()?;
        if !self.expect_peek(TokenKind::Colon) {
            return None;
        }
        self.advance();
        let return_type = self.current_type_name()?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::new(
            StmtKind::ExternDecl {
                library,
                function,
                arg_types,
                return_type,
            },
            loc,
        ))
    }

    fn parse_struct_field_decl(&mut self) -> Option<StructFieldDecl> {
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let fname = self.current_identifier()?;
        if !self.expect_peek(TokenKind::Colon) {
            return None;
        }
        self.advance();
        let type_name = self.current_type_name()?.to_string();
        Some(StructFieldDecl {
            name: fname,
            type_name,
        })
    }

    /// `struct` has no statement terminator: the closing `}` ends it, the
    /// same way a block-bodied `if`/`for`/`func` needs no trailing `;`. The
    /// field list accepts an optional trailing comma, like other
    /// comma-separated lists in this grammar.
    fn parse_struct_decl(&mut self) -> Option<Stmt> {
        let loc = self.cur.loc;
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.current_identifier()?;
        if !self.expect_peek(TokenKind::LCurly) {
            return None;
        }

        let mut fields = Vec::new();
        if self.peek.kind == TokenKind::RCurly {
            self.advance();
        } else {
            fields.push(self.parse_struct_field_decl()?);
            while self.peek.kind == TokenKind::Comma {
                self.advance();
                if self.peek.kind == TokenKind::RCurly {
                    break;
                }
                fields.push(self.parse_struct_field_decl()?);
            }
            if !self.expect_peek(TokenKind::RCurly) {
                return None;
            }
        }
        Some(Stmt::new(StmtKind::StructDecl { name, fields }, loc))
    }

    // ---- expressions ----

    /// Parses a comma-separated expression list up to and including `end`.
    /// `self.cur` must be the opening delimiter on entry. Trailing commas
    /// are rejected.
    fn parse_expr_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek.kind == end {
            self.advance();
            return Some(list);
        }
        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            if self.peek.kind == end {
                let loc = self.peek.loc;
                self.push_error(loc, format!("expected , or {:?}", end));
                return None;
            }
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_expression(&mut self, min_prec: Precedence) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        while self.peek.kind != TokenKind::Semicolon && min_prec < precedence_of(self.peek.kind) {
            left = match self.peek.kind {
                TokenKind::Assign => {
                    self.advance();
                    self.parse_assign(left)?
                }
                TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq | TokenKind::SlashEq => {
                    self.advance();
                    self.parse_compound_assign(left)?
                }
                TokenKind::LParen => {
                    self.advance();
                    self.parse_call(left)?
                }
                TokenKind::LSquare => {
                    self.advance();
                    self.parse_index(left)?
                }
                TokenKind::Dot => {
                    self.advance();
                    self.parse_member(left)?
                }
                _ => {
                    self.advance();
                    self.parse_binary(left)?
                }
            };
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let loc = self.cur.loc;
        match self.cur.kind {
            TokenKind::Identifier => self.parse_identifier_or_struct_literal(),
            TokenKind::Null => Some(Expr::new(ExprKind::Null, loc)),
            TokenKind::IntLit => {
                let v = self.current_int()?;
                Some(Expr::new(ExprKind::Int(v), loc))
            }
            TokenKind::FloatLit => {
                let v = self.current_float()?;
                Some(Expr::new(ExprKind::Float(v), loc))
            }
            TokenKind::BoolLit => {
                let v = self.current_bool()?;
                Some(Expr::new(ExprKind::Bool(v), loc))
            }
            TokenKind::StringLit => {
                let v = self.current_string()?;
                Some(Expr::new(ExprKind::Str(v), loc))
            }
            TokenKind::LSquare => {
                let items = self.parse_expr_list(TokenKind::RSquare)?;
                Some(Expr::new(ExprKind::Array(items), loc))
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_expression(Precedence::Prefix)?;
                Some(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expression(Precedence::Prefix)?;
                Some(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let e = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenKind::RParen) {
                    return None;
                }
                Some(e)
            }
            TokenKind::Error => {
                self.push_error(loc, "unknown token");
                None
            }
            other => {
                self.push_error(loc, format!("unexpected token {:?} in expression", other));
                None
            }
        }
    }

    fn parse_identifier_or_struct_literal(&mut self) -> Option<Expr> {
        let loc = self.cur.loc;
        let name = self.current_identifier()?;
        if !self.no_struct_literal && self.peek.kind == TokenKind::LCurly {
            self.advance();
            return self.parse_struct_literal_body(name, loc);
        }
        Some(Expr::new(ExprKind::Identifier(name), loc))
    }

    /// Precondition: `self.cur` is `{`.
    fn parse_struct_literal_body(&mut self, struct_name: String, loc: Location) -> Option<Expr> {
        let mut fields = Vec::new();
        if self.peek.kind == TokenKind::RCurly {
            self.advance();
            return Some(Expr::new(
                ExprKind::StructLiteral {
                    struct_name,
                    fields,
                },
                loc,
            ));
        }
        loop {
            if !self.expect_peek(TokenKind::Identifier) {
                return None;
            }
            let fname = self.current_identifier()?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            fields.push(StructFieldInit { name: fname, value });
            if self.peek.kind == TokenKind::Comma {
                self.advance();
                if self.peek.kind == TokenKind::RCurly {
                    break;
                }
            } else {
                break;
            }
        }
        if !self.expect_peek(TokenKind::RCurly) {
            return None;
        }
        Some(Expr::new(
            ExprKind::StructLiteral {
                struct_name,
                fields,
            },
            loc,
        ))
    }

    fn parse_assign(&mut self, target: Expr) -> Option<Expr> {
        let loc = self.cur.loc;
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            loc,
        ))
    }

    fn parse_compound_assign(&mut self, target: Expr) -> Option<Expr> {
        let loc = self.cur.loc;
        let op = BinaryOp::from_compound_assign(self.cur.kind)?;
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::new(
            ExprKind::CompoundAssign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            loc,
        ))
    }

    fn parse_binary(&mut self, left: Expr) -> Option<Expr> {
        let loc = self.cur.loc;
        let op = match binary_op_of(self.cur.kind) {
            Some(op) => op,
            None => {
                self.push_error(loc, format!("unexpected operator {:?}", self.cur.kind));
                return None;
            }
        };
        let prec = precedence_of(self.cur.kind);
        self.advance();
        let right = self.parse_expression(prec)?;
        Some(Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            loc,
        ))
    }

    fn parse_call(&mut self, callee: Expr) -> Option<Expr> {
        let loc = self.cur.loc;
        let args = self.parse_expr_list(TokenKind::RParen)?;
        Some(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            loc,
        ))
    }

    fn parse_index(&mut self, indexee: Expr) -> Option<Expr> {
        let loc = self.cur.loc;
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RSquare) {
            return None;
        }
        Some(Expr::new(
            ExprKind::Index {
                indexee: Box::new(indexee),
                index: Box::new(index),
            },
            loc,
        ))
    }

    fn parse_member(&mut self, value: Expr) -> Option<Expr> {
        let loc = self.cur.loc;
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let field = self.current_identifier()?;
        Some(Expr::new(
            ExprKind::Member {
                value: Box::new(value),
                field,
            },
            loc,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let mut p = Parser::new("t.eta", src);
        let program = p.parse_program();
        assert!(p.errors().is_empty(), "unexpected errors: {:?}", p.errors());
        program
    }

    #[test]
    fn parses_let_binding() {
        let prog = parse_ok("let x = 1 + 2;");
        assert_eq!(prog.len(), 1);
        match &prog[0].kind {
            StmtKind::Let { name, init } => {
                assert_eq!(name, "x");
                assert!(matches!(init.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn parses_assignment_as_right_associative() {
        let prog = parse_ok("a = b = 1;");
        match &prog[0].kind {
            StmtKind::ExprStmt(e) => match &e.kind {
                ExprKind::Assign { value, .. } => {
                    assert!(matches!(value.kind, ExprKind::Assign { .. }));
                }
                other => panic!("expected Assign, got {:?}", other),
            },
            other => panic!("expected ExprStmt, got {:?}", other),
        }
    }

    #[test]
    fn parses_if_else() {
        let prog = parse_ok("if x < 1 { return 1; } else { return 2; }");
        match &prog[0].kind {
            StmtKind::If {
                consequence,
                alternative,
                ..
            } => {
                assert_eq!(consequence.len(), 1);
                assert!(alternative.is_some());
            }
            other => panic!("expected If, got {:?}", other),
        }
    }

    #[test]
    fn parses_else_if_chain() {
        let prog = parse_ok("if x { } else if y { } else { }");
        match &prog[0].kind {
            StmtKind::If { alternative, .. } => {
                let alt = alternative.as_ref().unwrap();
                assert_eq!(alt.len(), 1);
                assert!(matches!(alt[0].kind, StmtKind::If { .. }));
            }
            other => panic!("expected If, got {:?}", other),
        }
    }

    #[test]
    fn parses_for_loop_with_full_header() {
        let prog = parse_ok("for (let i = 0; i < 5; i = i + 1) { println(i); }");
        match &prog[0].kind {
            StmtKind::For {
                init, cond, post, ..
            } => {
                assert!(init.is_some());
                assert!(cond.is_some());
                assert!(post.is_some());
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn parses_for_loop_with_empty_slots() {
        let prog = parse_ok("for (;;) { }");
        match &prog[0].kind {
            StmtKind::For {
                init, cond, post, ..
            } => {
                assert!(init.is_none());
                assert!(cond.is_none());
                assert!(post.is_none());
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn parses_func_decl() {
        let prog = parse_ok("func add(a, b) { return a + b; }");
        match &prog[0].kind {
            StmtKind::FuncDecl { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected FuncDecl, got {:?}", other),
        }
    }

    #[test]
    fn parses_struct_decl_and_literal() {
        let prog = parse_ok("struct Point { x: int, y: int, } let p = Point{x: 1, y: 2};");
        assert_eq!(prog.len(), 2);
        match &prog[0].kind {
            StmtKind::StructDecl { name, fields } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].type_name, "int");
            }
            other => panic!("expected StructDecl, got {:?}", other),
        }
        match &prog[1].kind {
            StmtKind::Let { init, .. } => match &init.kind {
                ExprKind::StructLiteral { struct_name, fields } => {
                    assert_eq!(struct_name, "Point");
                    assert_eq!(fields.len(), 2);
                }
                other => panic!("expected StructLiteral, got {:?}", other),
            },
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn struct_decl_without_trailing_comma_on_last_field_is_accepted() {
        let prog = parse_ok("struct P { x: int, y: int } let p = P{x: 1, y: 2};");
        match &prog[0].kind {
            StmtKind::StructDecl { name, fields } => {
                assert_eq!(name, "P");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected StructDecl, got {:?}", other),
        }
    }

    #[test]
    fn struct_decl_with_a_malformed_field_is_an_error() {
        let mut p = Parser::new("t.eta", "struct P { x int }");
        p.parse_program();
        assert!(!p.errors().is_empty());
    }

    #[test]
    fn parses_extern_decl_with_variadic() {
        let prog = parse_ok("extern libc func printf(string, ...): int;");
        match &prog[0].kind {
            StmtKind::ExternDecl {
                library,
                function,
                arg_types,
                return_type,
            } => {
                assert_eq!(library, "libc");
                assert_eq!(function, "printf");
                assert_eq!(arg_types.len(), 2);
                assert_eq!(arg_types[1], ExternArgType::Variadic);
                assert_eq!(*return_type, TypeName::Int);
            }
            other => panic!("expected ExternDecl, got {:?}", other),
        }
    }

    #[test]
    fn rejects_variadic_marker_not_at_tail() {
        let mut p = Parser::new("t.eta", "extern libc func f(..., int): void;");
        p.parse_program();
        assert!(!p.errors().is_empty());
    }

    #[test]
    fn parses_index_member_and_call_chain() {
        let prog = parse_ok("let z = a[0].field(1, 2);");
        match &prog[0].kind {
            StmtKind::Let { init, .. } => {
                assert!(matches!(init.kind, ExprKind::Call { .. }));
            }
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn parses_compound_assignment() {
        let prog = parse_ok("x += 1;");
        match &prog[0].kind {
            StmtKind::ExprStmt(e) => {
                assert!(matches!(
                    e.kind,
                    ExprKind::CompoundAssign {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected ExprStmt, got {:?}", other),
        }
    }

    #[test]
    fn does_not_treat_if_condition_brace_as_struct_literal() {
        let prog = parse_ok("if x { return 1; }");
        match &prog[0].kind {
            StmtKind::If { cond, .. } => {
                assert!(matches!(cond.kind, ExprKind::Identifier(_)));
            }
            other => panic!("expected If, got {:?}", other),
        }
    }

    #[test]
    fn precedence_binds_product_tighter_than_sum() {
        let prog = parse_ok("let x = 1 + 2 * 3;");
        match &prog[0].kind {
            StmtKind::Let { init, .. } => {
                assert_eq!(crate::ast::print_expr(init), "(1 + (2 * 3))");
            }
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn trailing_comma_in_call_args_is_rejected() {
        let mut p = Parser::new("t.eta", "f(1, 2,);");
        p.parse_program();
        assert!(!p.errors().is_empty());
    }

    #[test]
    fn missing_semicolon_is_an_accumulated_error_and_program_is_empty() {
        let mut p = Parser::new("t.eta", "let x = 1\nlet y = 2;");
        let prog = p.parse_program();
        assert!(!p.errors().is_empty());
        assert!(prog.is_empty());
    }

    #[test]
    fn unknown_character_reports_error_without_panicking() {
        let mut p = Parser::new("t.eta", "let x = @;");
        p.parse_program();
        assert!(!p.errors().is_empty());
    }
}
