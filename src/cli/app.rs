//! CLI module for the quicknotes application
//!
//! This module turns parsed commands into store operations and renders the
//! results. It plays the part of the UI layer: the store never prints.
use std::{
    fs::{read_to_string, write},
    io::{stdin, Write},
    path::Path,
    process::Command,
};

use log::{debug, info};
use shell_words::split;
use tempfile::Builder;

use crate::{Commands, Config, KeyValueStore, Note, NoteUpdate, NotesError, NotesStore, Result};

/// CLI Application handler - processes CLI commands against a notes store
pub struct App<B: KeyValueStore, W: Write> {
    store: NotesStore<B>,
    config: Config,
    out: W,
}

impl<B: KeyValueStore, W: Write> App<B, W> {
    pub fn new(store: NotesStore<B>, config: Config, out: W) -> Self {
        Self { store, config, out }
    }

    pub fn store(&self) -> &NotesStore<B> {
        &self.store
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the CLI application with the given command
    ///
    /// A snapshot write that failed during the command is retried once at
    /// the end and reported as the command's error.
    pub fn run(&mut self, command: Commands) -> Result<()> {
        debug!("Running command {:?}", command);
        match command {
            Commands::New {
                title,
                content,
                edit,
            } => self.handle_new(title, content, edit)?,

            Commands::List { limit, json } => {
                let notes: Vec<Note> = self.store.notes().to_vec();
                self.display_notes(&notes, limit, json)?;
            }

            Commands::Search { query, limit, json } => self.handle_search(&query, limit, json)?,

            Commands::Show { id, json } => self.handle_show(&id, json)?,

            Commands::Edit {
                id,
                title,
                content,
                edit,
            } => self.handle_edit(&id, title, content, edit)?,

            Commands::Delete { id, force } => self.handle_delete(&id, force)?,

            Commands::Config => {
                writeln!(self.out, "{}", serde_json::to_string_pretty(&self.config)?)?;
            }
        }

        self.store.flush()
    }

    /// Resolves a full id or a unique id prefix to a full id.
    pub fn resolve_id(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(NotesError::NoteNotFound { id: String::new() });
        }
        if self.store.get(id).is_some() {
            return Ok(id.to_string());
        }

        let matches: Vec<&Note> = self
            .store
            .notes()
            .iter()
            .filter(|n| n.id.starts_with(id))
            .collect();

        match matches.as_slice() {
            [note] => Ok(note.id.clone()),
            [] => Err(NotesError::NoteNotFound { id: id.to_string() }),
            _ => Err(NotesError::AmbiguousId {
                prefix: id.to_string(),
                count: matches.len(),
            }),
        }
    }

    fn handle_new(&mut self, title: Option<String>, content: Option<String>, edit: bool) -> Result<()> {
        let content = if edit {
            Some(self.open_editor_with_content("")?)
        } else {
            content
        };

        let id = self.store.create();
        let update = NoteUpdate { title, content };
        if !update.is_empty() {
            self.store.update(&id, update);
        }

        writeln!(self.out, "Note created with ID: {}", id)?;
        Ok(())
    }

    fn handle_search(&mut self, query: &str, limit: usize, json: bool) -> Result<()> {
        let results: Vec<Note> = self.store.search(query).into_iter().cloned().collect();
        info!("Search {:?} returned {} notes", query, results.len());

        if results.is_empty() && !json {
            writeln!(self.out, "No notes found matching query: \"{}\"", query)?;
            return Ok(());
        }
        self.display_notes(&results, limit, json)
    }

    fn handle_show(&mut self, id: &str, json: bool) -> Result<()> {
        let id = self.resolve_id(id)?;
        let Some(note) = self.store.get(&id).cloned() else {
            return Err(NotesError::NoteNotFound { id });
        };

        if json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(&note)?)?;
        } else {
            self.write_note_header(&note)?;
            writeln!(self.out, "Updated: {}", note.updated().format("%Y-%m-%d %H:%M"))?;
            writeln!(self.out, "\n{}", note.content)?;
        }
        Ok(())
    }

    fn handle_edit(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        edit: bool,
    ) -> Result<()> {
        let id = self.resolve_id(id)?;

        let content = if edit {
            let existing = self
                .store
                .get(&id)
                .map(|n| n.content.clone())
                .unwrap_or_default();
            Some(self.open_editor_with_content(&existing)?)
        } else {
            content
        };

        let update = NoteUpdate { title, content };
        if update.is_empty() {
            return Err(NotesError::ApplicationError {
                message: "Nothing to change: pass --title, --content or --edit".to_string(),
            });
        }

        self.store.update(&id, update);
        writeln!(self.out, "Note {} updated successfully", id)?;
        Ok(())
    }

    fn handle_delete(&mut self, id: &str, force: bool) -> Result<()> {
        let id = self.resolve_id(id)?;
        let Some(note) = self.store.get(&id).cloned() else {
            return Err(NotesError::NoteNotFound { id });
        };

        if !force {
            writeln!(self.out, "You are about to delete the following note:")?;
            self.write_note_header(&note)?;
            let preview = note.preview(self.config.preview_length);
            if !preview.is_empty() {
                writeln!(self.out, "\n{}", preview)?;
            }

            write!(self.out, "\nAre you sure you want to delete this note? [y/N]: ")?;
            self.out.flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;
            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                writeln!(self.out, "Deletion cancelled.")?;
                return Ok(());
            }
        }

        self.store.delete(&id);
        writeln!(
            self.out,
            "Note '{}' ({}) has been permanently deleted.",
            note.display_title(),
            note.id
        )?;
        Ok(())
    }

    /// Display notes in the requested format. A `limit` of 0 shows all.
    fn display_notes(&mut self, notes: &[Note], limit: usize, json: bool) -> Result<()> {
        let shown = if limit > 0 && notes.len() > limit {
            &notes[..limit]
        } else {
            notes
        };

        if json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(shown)?)?;
            return Ok(());
        }

        if shown.is_empty() {
            writeln!(self.out, "No notes found.")?;
            return Ok(());
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        let selected = self.store.selected().map(|n| n.id.clone());

        for (i, note) in shown.iter().enumerate() {
            if i > 0 {
                writeln!(self.out, "{}", "-".repeat(term_width.min(50)))?;
            }
            if selected.as_deref() == Some(note.id.as_str()) {
                write!(self.out, "{} ", console::style("*").green())?;
            }
            self.write_note_header(note)?;

            let preview = note.preview(self.config.preview_length);
            if !preview.is_empty() {
                writeln!(self.out, "{}", console::style(preview).dim())?;
            }
        }

        if shown.len() < notes.len() {
            writeln!(self.out, "\nShowing {} of {} notes", shown.len(), notes.len())?;
        } else {
            writeln!(
                self.out,
                "\nFound {} note{}",
                notes.len(),
                if notes.len() == 1 { "" } else { "s" }
            )?;
        }
        Ok(())
    }

    fn write_note_header(&mut self, note: &Note) -> Result<()> {
        writeln!(
            self.out,
            "ID: {} | Created: {}",
            note.id,
            note.created().format("%Y-%m-%d %H:%M")
        )?;
        writeln!(self.out, "Title: {}", console::style(note.display_title()).bold())?;
        Ok(())
    }

    fn open_editor_with_content(&self, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();
        write(&temp_path, existing_content)?;

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write note content. Save and exit when done...");
        launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(content.strip_suffix('\n').unwrap_or(&content).to_string())
    }
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split(editor_cmd).map_err(|e| NotesError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(NotesError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program)
        .args(rest)
        .arg(file_path)
        .status()
        .map_err(|e| NotesError::EditorError {
            message: format!("Failed to execute editor command {}: {}", program, e),
        })?;

    if !status.success() {
        return Err(NotesError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }

    Ok(())
}
