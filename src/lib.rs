//! req - evaluation core
//!
//! req is a small scripting language for constructing, inspecting and
//! comparing HTTP requests and responses. This crate holds the part that runs
//! already-parsed scripts: the value model, selection and comparison of
//! values, the execution context, the statement evaluator, and string
//! interpolation.
//!
//! ```rust
//! use req::ast::{Expression, Literal, Statement};
//! use req::{Evaluator, Value};
//!
//! let evaluator = Evaluator::new();
//! let ctx = evaluator
//!     .run(&[
//!         Statement::VarDecl {
//!             name: "Id".to_string(),
//!             value: Expression::Literal { value: Literal::Int(7), span: None },
//!             span: None,
//!         },
//!         Statement::VarDecl {
//!             name: "Path".to_string(),
//!             value: Expression::Literal {
//!                 value: Literal::String("/users/{$Id}".to_string()),
//!                 span: None,
//!             },
//!             span: None,
//!         },
//!     ])
//!     .unwrap();
//!
//! assert_eq!(ctx.get("Path").unwrap(), &Value::string("/users/7"));
//! ```

pub mod ast;
pub mod commands;
pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod interpolate;
pub mod message;
pub mod select;
pub mod value;

// Re-export commonly used types
pub use ast::{CompareOp, Expression, Literal, SourceSpan, Statement};
pub use commands::CommandRegistry;
pub use compare::compare;
pub use config::EvalConfig;
pub use context::Context;
pub use error::EvalError;
pub use evaluator::Evaluator;
pub use interpolate::interpolate;
pub use message::{Body, Request, Response, Stream};
pub use select::{select, select_path};
pub use value::{FileHandle, Type, Value};

/// req core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
