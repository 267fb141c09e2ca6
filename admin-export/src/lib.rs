//! Library module for admin-export
//!
//! Exposes the CLI definition, the file-backed collaborators and the
//! command runner so they can be tested. The binary entry point is in
//! main.rs.

pub mod cli;
pub mod commands;
pub mod store;

pub use cli::Cli;
pub use commands::execute;
pub use store::{JsonFileStore, load_schemas, select_schema};
