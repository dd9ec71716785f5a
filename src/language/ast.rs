use crate::language::span::Location;
use std::rc::Rc;

/// A whole program: top-level statements and function definitions in
/// source order.
#[derive(Clone, Debug)]
pub struct Unit {
    pub items: Vec<TopLevel>,
}

#[derive(Clone, Debug)]
pub enum TopLevel {
    Function(Rc<FunctionDef>),
    Stmt(Stmt),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub location: Location,
}

/// Shared between the program tree and every function value created from
/// it, so a body outlives all of its calls.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub body: Block,
    pub location: Location,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    VarDef {
        name: Identifier,
        location: Location,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        location: Location,
    },
    While {
        cond: Expr,
        body: Block,
        location: Location,
    },
    Expr(Expr),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
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
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
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
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    IntLiteral {
        text: String,
        location: Location,
    },
    StringLiteral {
        value: String,
        location: Location,
    },
    VarRef(Identifier),
    Assign {
        target: Identifier,
        value: Box<Expr>,
        location: Location,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: Location,
    },
    Call {
        callee: Identifier,
        args: Vec<Expr>,
        location: Location,
    },
}

impl Expr {
    pub fn location(&self) -> &Location {
        match self {
            Expr::IntLiteral { location, .. }
            | Expr::StringLiteral { location, .. }
            | Expr::Assign { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Call { location, .. } => location,
            Expr::VarRef(ident) => &ident.location,
        }
    }
}
