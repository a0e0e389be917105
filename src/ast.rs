use std::fmt;

use derive_more::{From, TryInto};

use crate::token::TokenKind;

/// Discriminant naming the concrete shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    // statements
    Program,
    VarDeclaration,
    FunctionDeclaration,
    Branch,

    // literals
    NumericLiteral,
    NullLiteral,
    BooleanLiteral,
    Identifier,
    PropertyLiteral,
    ObjectLiteral,

    // expressions
    BinaryExpr,
    ComparisonExpr,
    AssignmentExpr,
    MemberExpr,
    CallExpr,
}

pub trait Node {
    fn kind(&self) -> NodeKind;

    /// Whether the node produces a value and may appear inside other
    /// expressions. Every expression is also a statement.
    fn is_expr(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Add),
            TokenKind::Minus => Some(Self::Sub),
            TokenKind::Star => Some(Self::Mul),
            TokenKind::Slash => Some(Self::Div),
            TokenKind::Percent => Some(Self::Mod),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Greater,
    Lesser,
    GreaterEqual,
    LesserEqual,
    And,
    Or,
}

impl ComparisonOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::EqualEqual => Some(Self::Equal),
            TokenKind::BangEqual => Some(Self::NotEqual),
            TokenKind::Greater => Some(Self::Greater),
            TokenKind::Lesser => Some(Self::Lesser),
            TokenKind::GreaterEqual => Some(Self::GreaterEqual),
            TokenKind::LesserEqual => Some(Self::LesserEqual),
            TokenKind::AndAnd => Some(Self::And),
            TokenKind::OrOr => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Lesser => "<",
            Self::GreaterEqual => ">=",
            Self::LesserEqual => "<=",
            Self::And => "&&",
            Self::Or => "||",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericLiteral {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullLiteral;

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub operator: BinaryOp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub operator: ComparisonOp,
}

/// `key: value`, or a bare `key` that is looked up as an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLiteral {
    pub key: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLiteral {
    pub properties: Vec<PropertyLiteral>,
}

/// `object.field` or, when `computed`, `object[field]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub field: Box<Expr>,
    pub computed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub caller: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpr {
    pub assignee: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, From, TryInto)]
pub enum Expr {
    NumericLiteral(NumericLiteral),
    BooleanLiteral(BooleanLiteral),
    NullLiteral(NullLiteral),
    Identifier(Identifier),
    Binary(BinaryExpr),
    Comparison(ComparisonExpr),
    Object(ObjectLiteral),
    Member(MemberExpr),
    Call(CallExpr),
    Assignment(AssignmentExpr),
}

impl Node for Expr {
    fn kind(&self) -> NodeKind {
        match self {
            Expr::NumericLiteral(_) => NodeKind::NumericLiteral,
            Expr::BooleanLiteral(_) => NodeKind::BooleanLiteral,
            Expr::NullLiteral(_) => NodeKind::NullLiteral,
            Expr::Identifier(_) => NodeKind::Identifier,
            Expr::Binary(_) => NodeKind::BinaryExpr,
            Expr::Comparison(_) => NodeKind::ComparisonExpr,
            Expr::Object(_) => NodeKind::ObjectLiteral,
            Expr::Member(_) => NodeKind::MemberExpr,
            Expr::Call(_) => NodeKind::CallExpr,
            Expr::Assignment(_) => NodeKind::AssignmentExpr,
        }
    }

    fn is_expr(&self) -> bool {
        true
    }
}

impl Node for PropertyLiteral {
    fn kind(&self) -> NodeKind {
        NodeKind::PropertyLiteral
    }

    fn is_expr(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub identifier: String,
    pub constant: bool,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub else_body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, From, TryInto)]
pub enum Stmt {
    VarDeclaration(VarDeclaration),
    FunctionDeclaration(FunctionDeclaration),
    Branch(BranchStmt),
    Expr(Expr),
}

impl Node for Stmt {
    fn kind(&self) -> NodeKind {
        match self {
            Stmt::VarDeclaration(_) => NodeKind::VarDeclaration,
            Stmt::FunctionDeclaration(_) => NodeKind::FunctionDeclaration,
            Stmt::Branch(_) => NodeKind::Branch,
            Stmt::Expr(expr) => expr.kind(),
        }
    }

    fn is_expr(&self) -> bool {
        matches!(self, Stmt::Expr(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Node for Program {
    fn kind(&self) -> NodeKind {
        NodeKind::Program
    }
}
