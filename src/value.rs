//! Runtime values for req scripts
//!
//! The set of types is closed. Every value carries exactly one [`Type`] tag,
//! which is what printing, selection and comparison dispatch on.

use crate::error::EvalError;
use crate::message::{Body, Request, Response, Stream};
use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use std::fmt;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type tag of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Nil,
    String,
    Int,
    Bool,
    Array,
    Hash,
    File,
    Stream,
    Name,
    Key,
    Request,
    Response,
    Tuple,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Nil => "nil",
            Type::String => "string",
            Type::Int => "int",
            Type::Bool => "bool",
            Type::Array => "array",
            Type::Hash => "hash",
            Type::File => "file",
            Type::Stream => "stream",
            Type::Name => "name",
            Type::Key => "key",
            Type::Request => "request",
            Type::Response => "response",
            Type::Tuple => "tuple",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value representation (runtime values)
///
/// Handles (files, requests, responses) are reference counted so that a value
/// can be cloned out of the context without duplicating the resource.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    String(String),
    Int(i64),
    Bool(bool),
    Array(Vec<Value>),
    Hash(IndexMap<String, Value>),
    File(Rc<FileHandle>),
    Stream(Stream),
    /// Unresolved identifier, only ever used as a selector operand
    Name(String),
    /// Literal selector key, only ever used as a selector operand
    Key(String),
    Request(Rc<Request>),
    Response(Rc<Response>),
    /// Matches either alternative when compared
    Tuple(Box<Value>, Box<Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn name(s: impl Into<String>) -> Self {
        Value::Name(s.into())
    }

    pub fn key(s: impl Into<String>) -> Self {
        Value::Key(s.into())
    }

    pub fn tuple(first: Value, second: Value) -> Self {
        Value::Tuple(Box::new(first), Box::new(second))
    }

    pub fn hash<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Hash(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn request(req: http::Request<Body>) -> Self {
        Value::Request(Rc::new(Request::new(req)))
    }

    pub fn response(resp: http::Response<Body>) -> Self {
        Value::Response(Rc::new(Response::new(resp)))
    }

    pub fn file(handle: FileHandle) -> Self {
        Value::File(Rc::new(handle))
    }

    /// Get type of this value
    pub fn get_type(&self) -> Type {
        match self {
            Value::Nil => Type::Nil,
            Value::String(_) => Type::String,
            Value::Int(_) => Type::Int,
            Value::Bool(_) => Type::Bool,
            Value::Array(_) => Type::Array,
            Value::Hash(_) => Type::Hash,
            Value::File(_) => Type::File,
            Value::Stream(_) => Type::Stream,
            Value::Name(_) => Type::Name,
            Value::Key(_) => Type::Key,
            Value::Request(_) => Type::Request,
            Value::Response(_) => Type::Response,
            Value::Tuple(..) => Type::Tuple,
        }
    }

    /// Only `true` is truthy
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Display form, failing where a handle's body cannot be read
    ///
    /// `Display` logs and skips such a body instead.
    pub fn render(&self) -> std::result::Result<String, EvalError> {
        match self {
            Value::Request(req) => req.render(),
            Value::Response(resp) => resp.render(),
            other => Ok(other.to_string()),
        }
    }

    /// Structured JSON form of this value
    ///
    /// Handles and tuples have no JSON form.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            Value::Nil => Ok(serde_json::Value::Null),
            Value::String(s) | Value::Name(s) | Value::Key(s) => {
                Ok(serde_json::Value::String(s.clone()))
            }
            Value::Int(i) => Ok(serde_json::Value::Number((*i).into())),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Stream(stream) => Ok(serde_json::Value::String(stream.text().into_owned())),
            Value::Array(items) => {
                let json_items: Result<Vec<serde_json::Value>> =
                    items.iter().map(Value::to_json).collect();
                Ok(serde_json::Value::Array(json_items?))
            }
            Value::Hash(pairs) => {
                let mut json_map = serde_json::Map::new();
                for (key, val) in pairs {
                    json_map.insert(key.clone(), val.to_json()?);
                }
                Ok(serde_json::Value::Object(json_map))
            }
            Value::File(_) | Value::Request(_) | Value::Response(_) | Value::Tuple(..) => {
                Err(anyhow!("cannot serialize {} to JSON", self.get_type()))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Stream(a), Value::Stream(b)) => a == b,
            (Value::Name(a), Value::Name(b)) => a == b,
            (Value::Key(a), Value::Key(b)) => a == b,
            (Value::Tuple(a1, a2), Value::Tuple(b1, b2)) => a1 == b1 && a2 == b2,
            // Handles are equal only when they are the same handle.
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            (Value::Request(a), Value::Request(b)) => Rc::ptr_eq(a, b),
            (Value::Response(a), Value::Response(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("<nil>"),
            Value::String(s) | Value::Name(s) | Value::Key(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(_) => f.write_str(&json_or(self, "[]")),
            Value::Hash(_) => f.write_str(&json_or(self, "{}")),
            Value::File(file) => write!(f, "{}", file),
            Value::Stream(stream) => write!(f, "{}", stream),
            Value::Request(req) => write!(f, "{}", req),
            Value::Response(resp) => write!(f, "{}", resp),
            Value::Tuple(a, b) => write!(f, "Tuple<{}, {}>", a.get_type(), b.get_type()),
        }
    }
}

/// Compact JSON, or the empty container literal if any element has no JSON form
fn json_or(value: &Value, empty: &str) -> String {
    match value.to_json() {
        Ok(json) => json.to_string(),
        Err(_) => empty.to_string(),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// An open file plus the path it was opened from
///
/// The descriptor is closed when the last value referring to it is dropped.
#[derive(Debug)]
pub struct FileHandle {
    file: fs::File,
    path: PathBuf,
    id: u64,
}

impl FileHandle {
    /// Open a file for reading
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        Ok(Self::new(file, path))
    }

    pub fn new(file: fs::File, path: impl Into<PathBuf>) -> Self {
        FileHandle {
            file,
            path: path.into(),
            id: NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical identifier, unique within the process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read the whole file from the start into a stream
    pub fn stream(&self) -> io::Result<Stream> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(Stream::new(buf))
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File<id={}, name={:?}>",
            self.id,
            self.path.display().to_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_value_to_string() {
        assert_eq!(Value::string("hello").to_string(), "hello");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "<nil>");
        assert_eq!(Value::name("Body").to_string(), "Body");
    }

    #[test]
    fn test_value_get_type() {
        assert_eq!(Value::string("hello").get_type(), Type::String);
        assert_eq!(Value::Int(42).get_type(), Type::Int);
        assert_eq!(Value::Bool(true).get_type(), Type::Bool);
        assert_eq!(Value::Nil.get_type(), Type::Nil);
        assert_eq!(Value::Stream(Stream::absent()).get_type(), Type::Stream);
        assert_eq!(
            Value::tuple(Value::Int(1), Value::Int(2)).get_type(),
            Type::Tuple
        );
    }

    #[test]
    fn test_array_and_hash_render_as_json() {
        let array = Value::Array(vec![
            Value::Int(1),
            Value::string("two"),
            Value::Bool(false),
            Value::Nil,
        ]);
        assert_eq!(array.to_string(), r#"[1,"two",false,null]"#);

        let hash = Value::hash([
            ("Name", Value::string("req")),
            ("Child", Value::hash([("Array", Value::Array(vec![Value::Int(1)]))])),
        ]);
        assert_eq!(hash.to_string(), r#"{"Name":"req","Child":{"Array":[1]}}"#);
    }

    #[test]
    fn test_unserializable_elements_fail_closed() {
        let array = Value::Array(vec![
            Value::Int(1),
            Value::tuple(Value::Int(1), Value::Int(2)),
        ]);
        assert_eq!(array.to_string(), "[]");

        let resp = http::Response::new(Body::empty());
        let hash = Value::hash([("Resp", Value::response(resp))]);
        assert_eq!(hash.to_string(), "{}");
    }

    #[test]
    fn test_tuple_display() {
        let tuple = Value::tuple(Value::Int(200), Value::string("ok"));
        assert_eq!(tuple.to_string(), "Tuple<int, string>");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(1).is_truthy());
        assert!(!Value::string("true").is_truthy());
    }

    #[test]
    fn test_file_display_is_stable() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "contents").unwrap();

        let handle = FileHandle::open(tmp.path()).unwrap();
        let rendered = Value::file(handle).to_string();

        assert!(rendered.starts_with("File<id="));
        assert!(rendered.contains(&format!("{:?}", tmp.path().display().to_string())));
        assert!(!rendered.contains("0x"));
    }

    #[test]
    fn test_file_stream_rereads_from_start() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "line one").unwrap();

        let handle = FileHandle::open(tmp.path()).unwrap();
        assert_eq!(handle.stream().unwrap().to_string(), "line one");
        assert_eq!(handle.stream().unwrap().to_string(), "line one");
    }

    #[test]
    fn test_file_ids_are_unique() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let a = FileHandle::open(tmp.path()).unwrap();
        let b = FileHandle::open(tmp.path()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_handle_equality_is_identity() {
        let resp = Value::response(http::Response::new(Body::empty()));
        let other = Value::response(http::Response::new(Body::empty()));
        assert_eq!(resp.clone(), resp);
        assert_ne!(resp, other);
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Int(7).render().unwrap(), "7");
        assert_eq!(Value::Nil.render().unwrap(), "<nil>");

        let resp = Value::response(http::Response::new(Body::from_bytes("ok")));
        assert_eq!(resp.render().unwrap(), resp.to_string());

        let resp = Value::response(http::Response::new(
            Body::from_reader(io::Cursor::new(vec![b'x'; 8])).with_limit(Some(2)),
        ));
        assert!(matches!(resp.render().unwrap_err(), EvalError::Io(_)));
    }
}
