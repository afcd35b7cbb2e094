// ABOUTME: AST node definitions - typed Expr/Stmt sum types, each carrying a source Location

use crate::token::{Literal, Location};
use std::fmt;

/// One of the fixed type-name tokens (`int`, `float`, `bool`, `string`, `void`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Int,
    Float,
    Bool,
    String,
    Void,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::Bool => "bool",
            TypeName::String => "string",
            TypeName::Void => "void",
        };
        write!(f, "{}", s)
    }
}

/// An extern argument-type slot: a concrete type, or the variadic tail marker `...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternArgType {
    Concrete(TypeName),
    Variadic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
}

impl BinaryOp {
    pub fn from_compound_assign(kind: crate::token::TokenKind) -> Option<BinaryOp> {
        use crate::token::TokenKind::*;
        Some(match kind {
            PlusEq => BinaryOp::Add,
            MinusEq => BinaryOp::Sub,
            StarEq => BinaryOp::Mul,
            SlashEq => BinaryOp::Div,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct StructFieldInit {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Identifier(String),
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<Expr>),
    StructLiteral {
        struct_name: String,
        fields: Vec<StructFieldInit>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    CompoundAssign {
        op: BinaryOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        indexee: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        value: Box<Expr>,
        field: String,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Location,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Location) -> Self {
        Expr { kind, loc }
    }
}

#[derive(Debug, Clone)]
pub struct StructFieldDecl {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let {
        name: String,
        init: Expr,
    },
    StructDecl {
        name: String,
        fields: Vec<StructFieldDecl>,
    },
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        consequence: Vec<Stmt>,
        alternative: Option<Vec<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    FuncDecl {
        name: String,
        params: Vec<Param>,
        body: Vec<Stmt>,
    },
    ExternDecl {
        library: String,
        function: String,
        arg_types: Vec<ExternArgType>,
        return_type: TypeName,
    },
    ExprStmt(Expr),
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Location,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Location) -> Self {
        Stmt { kind, loc }
    }
}

pub type Program = Vec<Stmt>;

/// Renders an Expr back to source-ish text, for debug printing and for
/// round-trip tests that re-parse the rendered form and compare ASTs.
pub fn print_expr(e: &Expr) -> String {
    match &e.kind {
        ExprKind::Identifier(n) => n.clone(),
        ExprKind::Null => "null".to_string(),
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Float(n) => n.to_string(),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::Str(s) => format!("'{}'", s),
        ExprKind::Array(items) => format!(
            "[{}]",
            items.iter().map(print_expr).collect::<Vec<_>>().join(", ")
        ),
        ExprKind::StructLiteral {
            struct_name,
            fields,
        } => format!(
            "{}{{{}}}",
            struct_name,
            fields
                .iter()
                .map(|f| format!("{}: {}", f.name, print_expr(&f.value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        ExprKind::Unary { op, operand } => {
            let op_s = match op {
                UnaryOp::Not => "!",
                UnaryOp::Neg => "-",
            };
            format!("({}{})", op_s, print_expr(operand))
        }
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", print_expr(left), op, print_expr(right))
        }
        ExprKind::Assign { target, value } => {
            format!("({} = {})", print_expr(target), print_expr(value))
        }
        ExprKind::CompoundAssign { op, target, value } => {
            format!("({} {}= {})", print_expr(target), op, print_expr(value))
        }
        ExprKind::Call { callee, args } => format!(
            "{}({})",
            print_expr(callee),
            args.iter().map(print_expr).collect::<Vec<_>>().join(", ")
        ),
        ExprKind::Index { indexee, index } => {
            format!("{}[{}]", print_expr(indexee), print_expr(index))
        }
        ExprKind::Member { value, field } => format!("{}.{}", print_expr(value), field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Location;

    fn dummy() -> Location {
        Location::start()
    }

    #[test]
    fn print_expr_round_trips_binary() {
        let e = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::new(ExprKind::Int(2), dummy())),
                right: Box::new(Expr::new(ExprKind::Int(3), dummy())),
            },
            dummy(),
        );
        assert_eq!(print_expr(&e), "(2 + 3)");
    }

    #[test]
    fn print_expr_call_and_index() {
        let callee = Expr::new(ExprKind::Identifier("f".into()), dummy());
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args: vec![Expr::new(ExprKind::Int(1), dummy())],
            },
            dummy(),
        );
        assert_eq!(print_expr(&call), "f(1)");

        let idx = Expr::new(
            ExprKind::Index {
                indexee: Box::new(Expr::new(ExprKind::Identifier("a".into()), dummy())),
                index: Box::new(Expr::new(ExprKind::Int(0), dummy())),
            },
            dummy(),
        );
        assert_eq!(print_expr(&idx), "a[0]");
    }

    #[test]
    fn from_compound_assign_maps_operators() {
        use crate::token::TokenKind;
        assert_eq!(
            BinaryOp::from_compound_assign(TokenKind::PlusEq),
            Some(BinaryOp::Add)
        );
        assert_eq!(BinaryOp::from_compound_assign(TokenKind::Assign), None);
    }

    #[test]
    fn literal_payload_is_reachable_from_token_module() {
        let _ = Literal::Int(1);
    }
}
