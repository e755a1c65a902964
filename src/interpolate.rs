//! String interpolation
//!
//! String literals may embed placeholders that are replaced by the display
//! form of a variable, optionally reached through a chain of selectors:
//!
//! | Placeholder                 | Meaning                                  |
//! |-----------------------------|------------------------------------------|
//! | `{$Name}`                   | Value of `Name`                          |
//! | `{$Name[2]}`                | Element 2 of the array `Name`            |
//! | `{$Name["Key"]}`            | Hash key, or request/response field      |
//! | `{$Name["Child"]["A"][0]}`  | Selectors chain left to right            |
//!
//! Only `{$` opens a placeholder. Any other brace is ordinary text, so JSON
//! written inside a string literal passes through untouched.

use crate::context::Context;
use crate::error::EvalError;
use crate::select::select_path;
use crate::value::Value;

/// Substitute every placeholder in `text`, producing a string value
pub fn interpolate(ctx: &Context, text: &str) -> Result<Value, EvalError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{$") {
        out.push_str(&rest[..start]);

        let src = &rest[start..];
        let (placeholder, len) = Placeholder::parse(src)?;
        let raw = &src[..len];

        tracing::trace!(placeholder = raw, "interpolate");

        let text = placeholder
            .resolve(ctx)
            .and_then(|value| value.render())
            .map_err(|err| EvalError::Placeholder {
                placeholder: raw.to_string(),
                source: Box::new(err),
            })?;
        out.push_str(&text);

        rest = &src[len..];
    }

    out.push_str(rest);
    Ok(Value::String(out))
}

/// A parsed `{$...}` span
#[derive(Debug, PartialEq)]
struct Placeholder<'a> {
    name: &'a str,
    path: Vec<Value>,
}

impl<'a> Placeholder<'a> {
    /// Parse the placeholder at the start of `src`, returning it and its length
    fn parse(src: &'a str) -> Result<(Self, usize), EvalError> {
        let bytes = src.as_bytes();
        let malformed = |reason: &str| EvalError::MalformedPlaceholder {
            placeholder: snippet(src).to_string(),
            reason: reason.to_string(),
        };

        // Skip "{$".
        let mut pos = 2;

        let name_end = pos
            + bytes[pos..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                .count();
        if name_end == pos || bytes[pos].is_ascii_digit() {
            return Err(malformed("expected variable name after '$'"));
        }
        let name = &src[pos..name_end];
        pos = name_end;

        let mut path = Vec::new();
        loop {
            match bytes.get(pos) {
                Some(b'}') => return Ok((Placeholder { name, path }, pos + 1)),
                Some(b'[') => pos += 1,
                Some(_) => {
                    let c = src[pos..].chars().next().unwrap_or_default();
                    return Err(malformed(&format!("unexpected character {:?}", c)));
                }
                None => return Err(malformed("missing closing '}'")),
            }

            if bytes.get(pos) == Some(&b'"') {
                let key_start = pos + 1;
                let key_len = src[key_start..]
                    .find('"')
                    .ok_or_else(|| malformed("unterminated key string"))?;
                path.push(Value::key(&src[key_start..key_start + key_len]));
                pos = key_start + key_len + 1;
            } else {
                let digits_start = pos + usize::from(bytes.get(pos) == Some(&b'-'));
                let digits = bytes[digits_start..]
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                if digits == 0 {
                    return Err(malformed("expected integer index or quoted key"));
                }
                let end = digits_start + digits;
                let index = src[pos..end]
                    .parse::<i64>()
                    .map_err(|_| malformed("index does not fit in a 64-bit integer"))?;
                path.push(Value::Int(index));
                pos = end;
            }

            if bytes.get(pos) != Some(&b']') {
                return Err(malformed("expected ']'"));
            }
            pos += 1;
        }
    }

    fn resolve(&self, ctx: &Context) -> Result<Value, EvalError> {
        select_path(ctx.get(self.name)?, &self.path)
    }
}

/// The placeholder text for diagnostics: up to and including the next `}`
fn snippet(src: &str) -> &str {
    match src.find('}') {
        Some(end) => &src[..=end],
        None => src,
    }
}
