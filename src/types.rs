//! Shared result alias and the command-line subcommands.
use clap::Subcommand;

use crate::NotesError;

/// A specialized Result type for quicknotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Available subcommands for the quicknotes application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    New {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note
        #[clap(short, long, conflicts_with = "edit")]
        content: Option<String>,

        /// Write the content in an external editor
        #[clap(short, long)]
        edit: bool,
    },

    /// List all notes, newest first
    List {
        /// Limit the number of notes shown (0 shows all)
        #[clap(short = 'n', long, default_value_t = 0)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Search notes by title or content
    Search {
        /// Search query text, matched case-insensitively
        query: String,

        /// Limit the number of search results (0 shows all)
        #[clap(short = 'n', long, default_value_t = 0)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show a note by ID or unique ID prefix
    Show {
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID or unique ID prefix of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long, conflicts_with = "edit")]
        content: Option<String>,

        /// Open the current content in an external editor
        #[clap(short, long)]
        edit: bool,
    },

    /// Delete a note by ID or unique ID prefix
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Config,
}
