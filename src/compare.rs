//! Relational and equality comparison between values
//!
//! Each type has its own rules. Pairs of different types are a mismatch,
//! except when one side is a tuple: a tuple matches if either alternative
//! does, trying the first alternative first.

use crate::ast::CompareOp;
use crate::error::EvalError;
use crate::value::{Type, Value};
use std::cmp::Ordering;

/// Evaluate `left op right`
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Tuple(first, second), _) => {
            compare_alternatives(first, second, |alt| compare(op, alt, right))
                .ok_or_else(|| mismatch(op, left, right))?
        }
        (_, Value::Tuple(first, second)) => {
            compare_alternatives(first, second, |alt| compare(op, left, alt))
                .ok_or_else(|| mismatch(op, left, right))?
        }
        (Value::Int(l), Value::Int(r)) => Ok(ordered(op, l.cmp(r))),
        (Value::String(l), Value::String(r)) => Ok(ordered(op, l.as_bytes().cmp(r.as_bytes()))),
        (Value::Bool(l), Value::Bool(r)) => equality(op, Type::Bool, l == r),
        (Value::Nil, Value::Nil) => equality(op, Type::Nil, true),
        _ => Err(mismatch(op, left, right)),
    }
}

fn mismatch(op: CompareOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op,
        left: left.get_type(),
        right: right.get_type(),
    }
}

/// The tuple rule: a truthy result from the first alternative wins without
/// looking at the second; otherwise the second alternative decides.
///
/// `None` when neither alternative is comparable.
fn compare_alternatives(
    first: &Value,
    second: &Value,
    mut cmp: impl FnMut(&Value) -> Result<Value, EvalError>,
) -> Option<Result<Value, EvalError>> {
    let first = match cmp(first) {
        Ok(result) if result.is_truthy() => return Some(Ok(result)),
        other => other,
    };

    match (cmp(second), first) {
        (Ok(result), _) => Some(Ok(result)),
        // Second alternative not comparable, but the first one was.
        (Err(_), Ok(result)) => Some(Ok(result)),
        (Err(_), Err(_)) => None,
    }
}

fn ordered(op: CompareOp, ord: Ordering) -> Value {
    Value::Bool(match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::NotEq => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::LtEq => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::GtEq => ord != Ordering::Less,
    })
}

fn equality(op: CompareOp, ty: Type, equal: bool) -> Result<Value, EvalError> {
    match op {
        CompareOp::Eq => Ok(Value::Bool(equal)),
        CompareOp::NotEq => Ok(Value::Bool(!equal)),
        _ => Err(EvalError::InvalidOperation { op, ty }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Body;

    fn check(op: CompareOp, left: Value, right: Value) -> bool {
        compare(op, &left, &right).unwrap().is_truthy()
    }

    #[test]
    fn test_compare_int() {
        assert!(check(CompareOp::Eq, Value::Int(200), Value::Int(200)));
        assert!(check(CompareOp::NotEq, Value::Int(200), Value::Int(404)));
        assert!(check(CompareOp::Lt, Value::Int(1), Value::Int(2)));
        assert!(check(CompareOp::LtEq, Value::Int(2), Value::Int(2)));
        assert!(check(CompareOp::Gt, Value::Int(3), Value::Int(2)));
        assert!(check(CompareOp::GtEq, Value::Int(-1), Value::Int(-1)));
        assert!(!check(CompareOp::Gt, Value::Int(-5), Value::Int(2)));
    }

    #[test]
    fn test_compare_string() {
        assert!(check(CompareOp::Eq, Value::string("ok"), Value::string("ok")));
        assert!(check(CompareOp::Lt, Value::string("abc"), Value::string("abd")));
        assert!(check(CompareOp::Gt, Value::string("b"), Value::string("abc")));
        assert!(!check(CompareOp::Eq, Value::string("ok"), Value::string("OK")));
    }

    #[test]
    fn test_compare_bool_and_nil() {
        assert!(check(CompareOp::Eq, Value::Bool(true), Value::Bool(true)));
        assert!(check(CompareOp::NotEq, Value::Bool(true), Value::Bool(false)));
        assert!(check(CompareOp::Eq, Value::Nil, Value::Nil));

        let err = compare(CompareOp::Lt, &Value::Bool(false), &Value::Bool(true)).unwrap_err();
        assert!(matches!(
            err,
            EvalError::InvalidOperation {
                op: CompareOp::Lt,
                ty: Type::Bool
            }
        ));
    }

    #[test]
    fn test_compare_mismatched_types() {
        let err = compare(CompareOp::Eq, &Value::Int(200), &Value::string("200")).unwrap_err();
        assert!(matches!(
            err,
            EvalError::TypeMismatch {
                left: Type::Int,
                right: Type::String,
                ..
            }
        ));
        assert_eq!(err.to_string(), "cannot compare int == string: mismatched types");

        let array = Value::Array(vec![]);
        assert!(compare(CompareOp::Eq, &array, &array).is_err());

        let resp = Value::response(http::Response::new(Body::empty()));
        assert!(compare(CompareOp::Eq, &resp, &resp).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_tuple_matches_either_alternative() {
        let codes = Value::tuple(Value::Int(200), Value::Int(201));

        assert!(check(CompareOp::Eq, codes.clone(), Value::Int(200)));
        assert!(check(CompareOp::Eq, codes.clone(), Value::Int(201)));
        assert!(!check(CompareOp::Eq, codes.clone(), Value::Int(404)));
        assert!(check(CompareOp::Eq, Value::Int(201), codes));
    }

    #[test]
    fn test_tuple_short_circuits() {
        // The second alternative would be a mismatch against an int.
        let tuple = Value::tuple(Value::Int(1), Value::Array(vec![]));
        assert!(check(CompareOp::Eq, tuple.clone(), Value::Int(1)));

        // First is comparable but false; second is not comparable.
        let result = compare(CompareOp::Eq, &tuple, &Value::Int(2)).unwrap();
        assert_eq!(result, Value::Bool(false));
    }

    #[test]
    fn test_tuple_second_alternative_decides() {
        let tuple = Value::tuple(Value::string("x"), Value::Int(5));
        assert!(check(CompareOp::Gt, tuple.clone(), Value::Int(4)));
        assert!(!check(CompareOp::Gt, tuple, Value::Int(9)));
    }

    #[test]
    fn test_tuple_neither_comparable() {
        let tuple = Value::tuple(Value::string("a"), Value::Bool(true));
        let err = compare(CompareOp::Eq, &tuple, &Value::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            EvalError::TypeMismatch {
                left: Type::Tuple,
                right: Type::Int,
                ..
            }
        ));
        assert_eq!(err.to_string(), "cannot compare tuple == int: mismatched types");

        let err = compare(CompareOp::Lt, &Value::Int(1), &tuple).unwrap_err();
        assert!(matches!(
            err,
            EvalError::TypeMismatch {
                left: Type::Int,
                right: Type::Tuple,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_tuple() {
        let tuple = Value::tuple(
            Value::Int(1),
            Value::tuple(Value::Int(2), Value::Int(3)),
        );
        assert!(check(CompareOp::Eq, tuple.clone(), Value::Int(3)));
        assert!(!check(CompareOp::Eq, tuple, Value::Int(4)));
    }
}
