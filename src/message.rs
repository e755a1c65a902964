//! HTTP handles wrapped by request and response values
//!
//! Bodies are copy-on-read: the first inspection drains the underlying source
//! into an owned buffer that replaces it, and every reader after that gets an
//! independent clone of the buffer. A wrapper is therefore never left drained,
//! whether it is inspected by selectors, rendered, or handed on for sending.

use crate::error::EvalError;
use crate::value::Value;
use bytes::Bytes;
use http::HeaderMap;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Cursor, Read};

enum BodySource {
    Absent,
    Reader(Box<dyn Read>),
    Buffered(Bytes),
    /// The first read failed; the source is gone and every read repeats the error
    Failed(io::ErrorKind, String),
}

/// Request or response body
pub struct Body {
    source: RefCell<BodySource>,
    limit: Option<usize>,
}

impl Body {
    /// A missing body. Reading it yields an absent stream.
    pub fn empty() -> Self {
        Self::with_source(BodySource::Absent)
    }

    /// A body backed by an unread byte source
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self::with_source(BodySource::Reader(Box::new(reader)))
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::with_source(BodySource::Buffered(bytes.into()))
    }

    fn with_source(source: BodySource) -> Self {
        Body {
            source: RefCell::new(source),
            limit: None,
        }
    }

    /// Bound the number of bytes buffered on first read
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn is_absent(&self) -> bool {
        matches!(*self.source.borrow(), BodySource::Absent)
    }

    /// An independent copy of the body content, or `None` when there is no body
    pub fn snapshot(&self) -> io::Result<Option<Bytes>> {
        let mut source = self.source.borrow_mut();

        let result = match &mut *source {
            BodySource::Absent => return Ok(None),
            BodySource::Buffered(bytes) => return Ok(Some(bytes.clone())),
            BodySource::Failed(kind, message) => {
                return Err(io::Error::new(*kind, message.clone()))
            }
            BodySource::Reader(reader) => read_limited(reader.as_mut(), self.limit),
        };

        match result {
            Ok(bytes) => {
                tracing::trace!(len = bytes.len(), "buffered body");
                *source = BodySource::Buffered(bytes.clone());
                Ok(Some(bytes))
            }
            Err(err) => {
                tracing::debug!(error = %err, "body read failed");
                *source = BodySource::Failed(err.kind(), err.to_string());
                Err(err)
            }
        }
    }

    /// A fresh seekable reader over the body, for downstream transmission
    pub fn reader(&self) -> io::Result<Cursor<Bytes>> {
        Ok(Cursor::new(self.snapshot()?.unwrap_or_default()))
    }

    /// The body as a stream value
    pub fn stream(&self) -> io::Result<Stream> {
        Ok(match self.snapshot()? {
            Some(bytes) => Stream::new(bytes),
            None => Stream::absent(),
        })
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.source.borrow() {
            BodySource::Absent => "absent",
            BodySource::Reader(_) => "unread",
            BodySource::Buffered(_) => "buffered",
            BodySource::Failed(..) => "failed",
        };
        f.debug_struct("Body")
            .field("state", &state)
            .field("limit", &self.limit)
            .finish()
    }
}

fn read_limited(reader: &mut dyn Read, limit: Option<usize>) -> io::Result<Bytes> {
    let mut buf = Vec::new();

    match limit {
        Some(limit) => {
            reader.take(limit as u64 + 1).read_to_end(&mut buf)?;
            if buf.len() > limit {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("body exceeds the {} byte limit", limit),
                ));
            }
        }
        None => {
            reader.read_to_end(&mut buf)?;
        }
    }

    Ok(Bytes::from(buf))
}

/// Seekable byte source, possibly absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    data: Option<Bytes>,
}

impl Stream {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Stream {
            data: Some(bytes.into()),
        }
    }

    pub fn absent() -> Self {
        Stream { data: None }
    }

    pub fn is_absent(&self) -> bool {
        self.data.is_none()
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Content as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes())
    }

    /// A new reader positioned at the start; readers never affect each other
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.data.clone().unwrap_or_default())
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Outgoing HTTP request handle
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Body>,
}

impl Request {
    pub fn new(inner: http::Request<Body>) -> Self {
        Request { inner }
    }

    pub fn body(&self) -> &Body {
        self.inner.body()
    }

    pub fn method(&self) -> &str {
        self.inner.method().as_str()
    }

    pub fn url(&self) -> String {
        self.inner.uri().to_string()
    }

    pub fn header_hash(&self) -> IndexMap<String, Value> {
        header_hash(self.inner.headers())
    }

    /// A buffered copy suitable for sending, leaving this handle readable
    pub fn to_http(&self) -> io::Result<http::Request<Bytes>> {
        let body = self.body().snapshot()?.unwrap_or_default();

        let mut out = http::Request::new(body);
        *out.method_mut() = self.inner.method().clone();
        *out.uri_mut() = self.inner.uri().clone();
        *out.version_mut() = self.inner.version();
        *out.headers_mut() = self.inner.headers().clone();
        Ok(out)
    }

    /// Request line, headers and body as text
    ///
    /// Fails when the body cannot be read.
    pub fn render(&self) -> Result<String, EvalError> {
        let mut out = self.head();
        if let Some(bytes) = self.body().snapshot()? {
            out.push('\n');
            out.push_str(&String::from_utf8_lossy(&bytes));
        }
        Ok(out)
    }

    fn head(&self) -> String {
        let mut head = format!("{} {:?}\n", self.inner.method(), self.inner.version());
        push_headers(&mut head, self.inner.headers());
        head
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read request body for display");
                f.write_str(&self.head())
            }
        }
    }
}

/// HTTP response handle
#[derive(Debug)]
pub struct Response {
    inner: http::Response<Body>,
}

impl Response {
    pub fn new(inner: http::Response<Body>) -> Self {
        Response { inner }
    }

    pub fn body(&self) -> &Body {
        self.inner.body()
    }

    /// Status line text, e.g. `200 OK`
    pub fn status(&self) -> String {
        let status = self.inner.status();
        match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_str(), reason),
            None => status.as_str().to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub fn header_hash(&self) -> IndexMap<String, Value> {
        header_hash(self.inner.headers())
    }

    /// A buffered copy of the response, leaving this handle readable
    pub fn to_http(&self) -> io::Result<http::Response<Bytes>> {
        let body = self.body().snapshot()?.unwrap_or_default();

        let mut out = http::Response::new(body);
        *out.status_mut() = self.inner.status();
        *out.version_mut() = self.inner.version();
        *out.headers_mut() = self.inner.headers().clone();
        Ok(out)
    }

    /// Status line, headers, blank line and body as text
    ///
    /// Fails when the body cannot be read.
    pub fn render(&self) -> Result<String, EvalError> {
        let mut out = self.head();
        out.push('\n');
        if let Some(bytes) = self.body().snapshot()? {
            out.push_str(&String::from_utf8_lossy(&bytes));
        }
        Ok(out)
    }

    fn head(&self) -> String {
        let mut head = format!("{:?} {}\n", self.inner.version(), self.status());
        push_headers(&mut head, self.inner.headers());
        head
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read response body for display");
                f.write_str(&self.head())?;
                f.write_str("\n")
            }
        }
    }
}

/// Flatten headers to one value per name, keeping the first value
fn header_hash(headers: &HeaderMap) -> IndexMap<String, Value> {
    headers
        .keys()
        .filter_map(|name| {
            let value = headers.get(name)?;
            let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
            Some((name.as_str().to_string(), Value::String(text)))
        })
        .collect()
}

fn push_headers(out: &mut String, headers: &HeaderMap) {
    let mut names: Vec<_> = headers.keys().collect();
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    for name in names {
        for value in headers.get_all(name) {
            out.push_str(name.as_str());
            out.push_str(": ");
            out.push_str(&String::from_utf8_lossy(value.as_bytes()));
            out.push_str("\r\n");
        }
    }
}
