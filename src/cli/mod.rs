//! CLI command handling

pub mod config;
pub mod replay;

pub use config::*;
pub use replay::*;
