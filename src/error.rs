//! Error kinds surfaced by the req evaluation core
//!
//! Every failing operation returns one of these synchronously. Nothing inside
//! the core retries or recovers; a failing statement aborts the run.

use crate::ast::{CompareOp, SourceSpan};
use crate::value::Type;
use thiserror::Error;

/// Evaluation error
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The container type has no selector capability at all
    #[error("type {0} does not support selection")]
    NotSelectable(Type),

    /// The container supports selection but not with this key type
    #[error("cannot use type {key} as selector for {container}")]
    InvalidSelector { container: Type, key: Type },

    #[error("cannot compare {left} {op} {right}: mismatched types")]
    TypeMismatch { op: CompareOp, left: Type, right: Type },

    #[error("invalid operation {op} on type {ty}")]
    InvalidOperation { op: CompareOp, ty: Type },

    #[error("type {ty} has no field {field}")]
    UnknownField { ty: Type, field: String },

    #[error("index out of range: {index} (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("no such key in hash: {0:?}")]
    MissingKey(String),

    #[error("malformed placeholder {placeholder}: {reason}")]
    MalformedPlaceholder { placeholder: String, reason: String },

    /// A well-formed placeholder that failed to resolve
    #[error("cannot interpolate {placeholder}: {source}")]
    Placeholder {
        placeholder: String,
        #[source]
        source: Box<EvalError>,
    },

    #[error("{name}: {source}")]
    Command {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Positional wrapper added by the evaluator for diagnostics
    #[error("{span} - {source}")]
    At {
        span: SourceSpan,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    /// Attach a source position, unless one is already attached
    pub fn at(self, span: Option<&SourceSpan>) -> Self {
        match (self, span) {
            (err @ EvalError::At { .. }, _) => err,
            (err, Some(span)) => EvalError::At {
                span: *span,
                source: Box::new(err),
            },
            (err, None) => err,
        }
    }

    /// The underlying error kind with positional and placeholder context peeled off
    pub fn root(&self) -> &EvalError {
        match self {
            EvalError::At { source, .. } | EvalError::Placeholder { source, .. } => source.root(),
            err => err,
        }
    }

    /// Whether this is one of the wrong-operand-type kinds
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self.root(),
            EvalError::NotSelectable(_)
                | EvalError::InvalidSelector { .. }
                | EvalError::TypeMismatch { .. }
                | EvalError::InvalidOperation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_wraps_once() {
        let span = SourceSpan::new(2, 5);
        let err = EvalError::UndefinedVariable("Resp".to_string())
            .at(Some(&span))
            .at(Some(&SourceSpan::new(9, 9)));

        assert_eq!(err.to_string(), "2:5 - undefined variable: Resp");
        assert!(matches!(err.root(), EvalError::UndefinedVariable(name) if name == "Resp"));
    }

    #[test]
    fn test_at_without_span() {
        let err = EvalError::UnknownCommand("GET".to_string()).at(None);
        assert!(matches!(err, EvalError::UnknownCommand(_)));
    }

    #[test]
    fn test_type_mismatch_kinds() {
        let err = EvalError::InvalidSelector {
            container: Type::Array,
            key: Type::String,
        };
        assert!(err.is_type_mismatch());
        assert_eq!(err.to_string(), "cannot use type string as selector for array");
        assert!(!EvalError::MissingKey("x".to_string()).is_type_mismatch());
    }
}
