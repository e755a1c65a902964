//! Selection of sub-values from composite values
//!
//! | Container  | Key           | Result                                   |
//! |------------|---------------|------------------------------------------|
//! | array      | int           | element at the zero-based index          |
//! | hash       | string, key   | bound value                              |
//! | request    | name, key     | `Method`, `URL`, `Header`, `Body`        |
//! | response   | name, key     | `Status`, `StatusCode`, `Header`, `Body` |
//!
//! Results may themselves be selected from, so selections chain.

use crate::error::EvalError;
use crate::message::{Request, Response};
use crate::value::{Type, Value};
use std::borrow::Cow;

/// Resolve `key` against `container`
pub fn select(container: &Value, key: &Value) -> Result<Value, EvalError> {
    tracing::trace!(container = %container.get_type(), key = %key, "select");

    match container {
        Value::Array(items) => select_index(items, key),
        Value::Hash(pairs) => {
            let k = match key {
                Value::String(k) | Value::Key(k) => k,
                other => return Err(invalid_selector(container, other)),
            };
            pairs
                .get(k)
                .cloned()
                .ok_or_else(|| EvalError::MissingKey(k.clone()))
        }
        Value::Request(req) => select_request(req, field_name(container, key)?),
        Value::Response(resp) => select_response(resp, field_name(container, key)?),
        other => Err(EvalError::NotSelectable(other.get_type())),
    }
}

/// Apply a chain of keys left to right
pub fn select_path<'a>(
    container: &Value,
    keys: impl IntoIterator<Item = &'a Value>,
) -> Result<Value, EvalError> {
    let mut current = Cow::Borrowed(container);
    for key in keys {
        current = Cow::Owned(select(&current, key)?);
    }
    Ok(current.into_owned())
}

fn select_index(items: &[Value], key: &Value) -> Result<Value, EvalError> {
    let index = match key {
        Value::Int(i) => *i,
        other => {
            return Err(EvalError::InvalidSelector {
                container: Type::Array,
                key: other.get_type(),
            })
        }
    };

    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(EvalError::IndexOutOfRange {
            index,
            len: items.len(),
        })
}

fn field_name<'a>(container: &Value, key: &'a Value) -> Result<&'a str, EvalError> {
    match key {
        Value::Name(name) | Value::Key(name) => Ok(name),
        other => Err(invalid_selector(container, other)),
    }
}

fn invalid_selector(container: &Value, key: &Value) -> EvalError {
    EvalError::InvalidSelector {
        container: container.get_type(),
        key: key.get_type(),
    }
}

fn select_request(req: &Request, field: &str) -> Result<Value, EvalError> {
    match field {
        "Method" => Ok(Value::string(req.method())),
        "URL" => Ok(Value::String(req.url())),
        "Header" => Ok(Value::Hash(req.header_hash())),
        "Body" => Ok(Value::Stream(req.body().stream()?)),
        _ => Err(EvalError::UnknownField {
            ty: Type::Request,
            field: field.to_string(),
        }),
    }
}

fn select_response(resp: &Response, field: &str) -> Result<Value, EvalError> {
    match field {
        "Status" => Ok(Value::String(resp.status())),
        "StatusCode" => Ok(Value::Int(i64::from(resp.status_code()))),
        "Header" => Ok(Value::Hash(resp.header_hash())),
        "Body" => Ok(Value::Stream(resp.body().stream()?)),
        _ => Err(EvalError::UnknownField {
            ty: Type::Response,
            field: field.to_string(),
        }),
    }
}
