//! Host hook protocol.
//!
//! The host invokes `heddle hook <event>` with one JSON payload on stdin:
//!
//! ```json
//! { "tool_input": { "file_path": "...", "subagent_type": "...", "prompt": "..." },
//!   "tool_result": "..." }
//! ```
//!
//! # Events
//!
//! - `pre-write` - write admission on `tool_input.file_path`
//! - `pre-task` - delegation admission on `subagent_type` + `prompt`
//! - `post-task` - completion reduction on `subagent_type`, `prompt` and `tool_result`
//!
//! # Exit codes
//!
//! 0 = allow (post-task guidance goes to stdout as JSON), 2 = deny with the
//! reason on stderr, 1 = the payload could not be decoded.

pub mod runner;
pub mod types;

pub use runner::HookRunner;
pub use types::{HookEvent, HookOutcome, HookPayload, ToolInput};
