//! Command registry and the minimal built-in commands
//!
//! Commands receive already evaluated arguments and may perform blocking I/O.
//! Their failures are plain `anyhow` errors; the evaluator wraps them with the
//! command name without otherwise changing them.

use crate::value::{FileHandle, Value};
use anyhow::{anyhow, Context as _, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

/// Command handler signature
pub type Command = Box<dyn Fn(&[Value]) -> Result<Value>>;

/// Command registry
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in commands, printing to stdout
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("print", print_to(std::io::stdout()));
        registry.register("open", cmd_open);
        registry
    }

    /// Register a command, replacing any command already using the name
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.commands.insert(name.to_string(), Box::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Check if a command exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// List all command names, sorted
    pub fn list_commands(&self) -> Vec<String> {
        let mut names: Vec<_> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands())
            .finish()
    }
}

/// `print` writing to `out`: arguments separated by spaces, then a newline
pub fn print_to<W: Write + 'static>(out: W) -> impl Fn(&[Value]) -> Result<Value> {
    let out = RefCell::new(out);

    move |args: &[Value]| {
        let line = args
            .iter()
            .map(Value::render)
            .collect::<std::result::Result<Vec<_>, _>>()?
            .join(" ");

        let mut out = out.borrow_mut();
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(Value::Nil)
    }
}

/// `open PATH`: open a file for reading
fn cmd_open(args: &[Value]) -> Result<Value> {
    require_args(args, 1, "open")?;
    let path = match &args[0] {
        Value::String(s) => s,
        other => return Err(anyhow!("Expected string path, got {}", other.get_type())),
    };

    let handle = FileHandle::open(path).with_context(|| format!("Failed to open file: {}", path))?;
    Ok(Value::file(handle))
}

fn require_args(args: &[Value], expected: usize, name: &str) -> Result<()> {
    if args.len() != expected {
        return Err(anyhow!(
            "{}() requires {} argument(s), got {}",
            name,
            expected,
            args.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Body;
    use std::io::Cursor;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    #[test]
    fn test_print_joins_arguments() {
        let buf = SharedBuf::default();
        let print = print_to(buf.clone());

        let result = print(&[Value::string("status:"), Value::Int(200)]).unwrap();
        assert_eq!(result, Value::Nil);

        print(&[Value::Array(vec![Value::Int(1), Value::Int(2)])]).unwrap();
        assert_eq!(buf.contents(), "status: 200\n[1,2]\n");
    }

    #[test]
    fn test_print_fails_on_unreadable_body() {
        let buf = SharedBuf::default();
        let print = print_to(buf.clone());
        let resp = Value::response(http::Response::new(
            Body::from_reader(Cursor::new(vec![b'x'; 16])).with_limit(Some(8)),
        ));

        let err = print(&[Value::string("got"), resp]).unwrap_err();
        assert!(err.to_string().contains("byte limit"));
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn test_open() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().display().to_string();

        match cmd_open(&[Value::String(path.clone())]).unwrap() {
            Value::File(file) => assert_eq!(file.path().display().to_string(), path),
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn test_open_errors() {
        assert!(cmd_open(&[]).is_err());
        assert!(cmd_open(&[Value::Int(1)]).is_err());

        let err = cmd_open(&[Value::string("/nonexistent/req/file")]).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn test_registry() {
        let mut registry = CommandRegistry::with_builtins();
        assert!(registry.has_command("print"));
        assert!(registry.has_command("open"));
        assert!(!registry.has_command("GET"));

        registry.register("GET", |_args: &[Value]| Ok(Value::Nil));
        assert_eq!(registry.list_commands(), vec!["GET", "open", "print"]);
    }
}
