//! Local note-taking library
//!
//! This library provides a notes store that keeps an ordered list of notes
//! and a current selection in memory, mirrors the list to a single
//! key-value slot after every change, and searches it by title or content.

mod cli;
mod config;
mod errors;
mod note;
mod sources;
mod storage;
mod store;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use note::*;
pub use sources::*;
pub use storage::*;
pub use store::*;
pub use types::*;
