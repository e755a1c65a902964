//! Abstract Syntax Tree definitions consumed by the req evaluator
//!
//! The parser lives outside this crate. It hands the evaluator a sequence of
//! [`Statement`]s; the evaluator never synthesizes nodes itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location information attached by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize) -> Self {
        SourceSpan {
            line,
            column,
            offset: 0,
            length: 0,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Top-level statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Variable declaration: `Name = value`
    VarDecl {
        name: String,
        value: Expression,
        span: Option<SourceSpan>,
    },

    /// Expression statement, usually a command call: `print $Name`
    Expr {
        expr: Expression,
        span: Option<SourceSpan>,
    },
}

impl Statement {
    /// Get the span of this statement, if available
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Statement::VarDecl { span, .. } => span.as_ref(),
            Statement::Expr { span, .. } => span.as_ref(),
        }
    }
}

/// Literal scalar written directly in the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Nil,
    /// String literals may contain `{$...}` placeholders
    String(String),
    Int(i64),
    Bool(bool),
}

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal {
        value: Literal,
        span: Option<SourceSpan>,
    },

    /// Array literal: `[1, 2, 3]`
    Array {
        items: Vec<Expression>,
        span: Option<SourceSpan>,
    },

    /// Hash literal: `("Key": value, ...)`, in source order
    Hash {
        pairs: Vec<(String, Expression)>,
        span: Option<SourceSpan>,
    },

    /// Variable reference: `$Name`
    Ref {
        name: String,
        span: Option<SourceSpan>,
    },

    /// Bracket selection: `$Array[0]` or `$Hash["Key"]`
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
        span: Option<SourceSpan>,
    },

    /// Field selection: `$Resp.StatusCode`
    Field {
        object: Box<Expression>,
        name: String,
        span: Option<SourceSpan>,
    },

    /// Command call: `GET "https://example.com"`
    Call {
        name: String,
        args: Vec<Expression>,
        span: Option<SourceSpan>,
    },

    /// Comparison: `$Resp.StatusCode == 200`
    Compare {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Option<SourceSpan>,
    },

    /// Two-alternative value: `(200, 201)`
    Tuple {
        first: Box<Expression>,
        second: Box<Expression>,
        span: Option<SourceSpan>,
    },
}

impl Expression {
    /// Get the span of this expression, if available
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Expression::Literal { span, .. } => span.as_ref(),
            Expression::Array { span, .. } => span.as_ref(),
            Expression::Hash { span, .. } => span.as_ref(),
            Expression::Ref { span, .. } => span.as_ref(),
            Expression::Index { span, .. } => span.as_ref(),
            Expression::Field { span, .. } => span.as_ref(),
            Expression::Call { span, .. } => span.as_ref(),
            Expression::Compare { span, .. } => span.as_ref(),
            Expression::Tuple { span, .. } => span.as_ref(),
        }
    }
}

/// Relational and equality operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,    // ==
    NotEq, // !=
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}
