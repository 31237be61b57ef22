//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `hook`   | `Hook`           |
//! | `state`  | `State`          |
//! | `check`  | `Check`          |
//! | `config` | `Config`         |

pub mod check;
pub mod config;
pub mod hook;
pub mod state;

pub use check::cmd_check;
pub use config::cmd_config;
pub use hook::cmd_hook;
pub use state::cmd_state;
