pub mod artifacts;
pub mod completion;
pub mod config;
pub mod engine;
pub mod errors;
pub mod gates;
pub mod hooks;
pub mod logging;
pub mod state;
pub mod workflow;

pub use engine::Engine;
