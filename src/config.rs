//! Evaluator configuration
//!
//! # Environment
//!
//! The body buffer limit can be set with `REQ_MAX_BODY_BYTES`:
//!
//! ```bash
//! # Refuse to buffer bodies larger than 10 MiB
//! export REQ_MAX_BODY_BYTES=10485760
//!
//! # No limit (the default)
//! export REQ_MAX_BODY_BYTES=0
//! ```

use serde::{Deserialize, Serialize};

/// Name of the environment variable holding the body limit
pub const MAX_BODY_BYTES_VAR: &str = "REQ_MAX_BODY_BYTES";

/// Settings shared by the evaluator and the commands it dispatches to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Upper bound on how many bytes a request/response body may buffer
    /// when it is read for inspection. `None` means unbounded.
    pub max_body_bytes: Option<usize>,
}

impl EvalConfig {
    /// Build a config from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let max_body_bytes = std::env::var(MAX_BODY_BYTES_VAR)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);

        Self { max_body_bytes }
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }
}
