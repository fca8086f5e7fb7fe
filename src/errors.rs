//! Error types for the quicknotes application.
//!
//! Store mutations never return these; they surface from the storage
//! backends, configuration loading and the command-line front end.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the quicknotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A storage key that cannot be mapped onto the backend.
    #[error("Invalid storage key: {key:?}")]
    InvalidKey { key: String },

    /// The snapshot slot exists but could not be read, so it is never
    /// overwritten.
    #[error("Storage slot {key} could not be read and is left untouched")]
    SlotUnreadable { key: String },

    /// A snapshot that parsed but breaks the collection invariants.
    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("{message}")]
    EditorError { message: String },

    /// Note was not found when resolving a user supplied id.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// An id prefix matched more than one note.
    #[error("Id prefix {prefix} matches {count} notes")]
    AmbiguousId { prefix: String, count: usize },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
