//! The notes store: the in-memory note list, the current selection, and the
//! single persisted snapshot that mirrors them.
//!
//! Every successful mutation rewrites the whole snapshot. Mutations on ids
//! the store does not hold are silent no-ops, and persistence failures are
//! logged rather than returned, so callers driving the store from input
//! events never have to handle errors.
use std::collections::HashSet;

use log::{debug, error, info, trace, warn};

use crate::{
    Clock, Config, IdSource, KeyValueStore, Note, NoteUpdate, NotesError, Result, SystemClock,
    UuidIds,
};

pub const WELCOME_TITLE: &str = "Welcome to Notes";
pub const WELCOME_CONTENT: &str = "Start writing your thoughts here...";

/// Emitted to observers after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { id: String },
    Updated { id: String },
    Deleted { id: String },
}

/// Receives store events. Observers cannot affect the mutation that fired them.
pub trait NotesObserver {
    fn notify(&self, event: &StoreEvent);
}

impl<F: Fn(&StoreEvent)> NotesObserver for F {
    fn notify(&self, event: &StoreEvent) {
        self(event)
    }
}

/// Where the initial note list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Nothing was persisted; the welcome note was created.
    Seeded,
    /// A valid snapshot was loaded.
    Restored,
    /// The persisted snapshot was unreadable; the welcome note was created.
    Recovered,
}

/// Persistence settings for a [`NotesStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub storage_key: String,
    pub persist_empty: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: "notes".to_string(),
            persist_empty: false,
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            persist_empty: config.persist_empty,
        }
    }
}

pub struct NotesStore<B: KeyValueStore> {
    backend: B,
    options: StoreOptions,
    ids: Box<dyn IdSource>,
    clock: Box<dyn Clock>,
    /// Most recently created first
    notes: Vec<Note>,
    /// Id of the selected note; always present in `notes` when set
    selected: Option<String>,
    observers: Vec<Box<dyn NotesObserver>>,
    origin: Origin,
    /// The persisted list differs from memory because a write failed or
    /// was held back
    dirty: bool,
    /// The slot exists but could not be read; never write over it
    slot_locked: bool,
}

impl<B: KeyValueStore> NotesStore<B> {
    /// Opens a store with random UUID ids and the system clock.
    pub fn open(backend: B, options: StoreOptions) -> Self {
        Self::with_sources(backend, options, UuidIds, SystemClock)
    }

    /// Opens a store over `backend` and hydrates it from the snapshot slot.
    ///
    /// Never fails: a missing or unreadable snapshot falls back to a single
    /// selected welcome note. Snapshots that read but do not parse are copied
    /// to `<storage_key>.corrupt` before the welcome note replaces them. If
    /// the slot cannot be read at all, the store keeps working in memory and
    /// leaves the slot untouched; every write then fails with
    /// [`NotesError::SlotUnreadable`] and the store stays dirty.
    pub fn with_sources(
        backend: B,
        options: StoreOptions,
        ids: impl IdSource + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let mut store = Self {
            backend,
            options,
            ids: Box::new(ids),
            clock: Box::new(clock),
            notes: Vec::new(),
            selected: None,
            observers: Vec::new(),
            origin: Origin::Seeded,
            dirty: false,
            slot_locked: false,
        };
        store.hydrate();
        store
    }

    fn hydrate(&mut self) {
        let key = self.options.storage_key.clone();
        debug!("Hydrating notes from slot {}", key);

        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No saved notes found, creating welcome note");
                self.seed(Origin::Seeded);
                return;
            }
            Err(e) => {
                error!("Failed to read notes from slot {}: {}", key, e);
                warn!("Slot {} will not be written during this session", key);
                self.slot_locked = true;
                self.seed(Origin::Recovered);
                return;
            }
        };

        match parse_snapshot(&raw) {
            Ok(notes) => {
                info!("Loaded {} notes", notes.len());
                self.notes = notes;
                self.origin = Origin::Restored;
            }
            Err(e) => {
                error!("Failed to parse notes from slot {}: {}", key, e);
                let backup_key = format!("{}.corrupt", key);
                match self.backend.set(&backup_key, &raw) {
                    Ok(()) => warn!("Unreadable snapshot preserved under {}", backup_key),
                    Err(e) => error!("Failed to preserve unreadable snapshot: {}", e),
                }
                self.seed(Origin::Recovered);
            }
        }
    }

    fn seed(&mut self, origin: Origin) {
        let now = self.clock.now_millis();
        let mut welcome = Note::new(self.ids.next_id(), now);
        welcome.title = WELCOME_TITLE.to_string();
        welcome.content = WELCOME_CONTENT.to_string();

        self.selected = Some(welcome.id.clone());
        self.notes = vec![welcome];
        self.origin = origin;
        self.persist();
    }

    /// Creates an empty note at the front of the list and selects it.
    ///
    /// Returns the new note's id.
    pub fn create(&mut self) -> String {
        let now = self.clock.now_millis();
        let mut id = self.ids.next_id();
        while self.get(&id).is_some() {
            warn!("Id source produced a duplicate id {}, drawing again", id);
            id = self.ids.next_id();
        }

        self.notes.insert(0, Note::new(id.clone(), now));
        self.selected = Some(id.clone());
        info!("Created note {}", id);

        self.persist();
        self.emit(StoreEvent::Created { id: id.clone() });
        id
    }

    /// Merges `update` into the note with `id` and refreshes its `updated_at`.
    ///
    /// Returns `false`, touching nothing, if no such note exists.
    pub fn update(&mut self, id: &str, update: NoteUpdate) -> bool {
        let now = self.clock.now_millis();
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            debug!("Ignoring update for unknown note {}", id);
            return false;
        };

        note.apply(&update, now);
        debug!("Updated note {} at {}", id, note.updated_at);

        self.persist();
        self.emit(StoreEvent::Updated { id: id.to_string() });
        true
    }

    /// Removes the note with `id`, clearing the selection if it pointed there.
    ///
    /// Returns `false`, touching nothing, if no such note exists.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.notes.iter().position(|n| n.id == id) else {
            debug!("Ignoring delete for unknown note {}", id);
            return false;
        };

        self.notes.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        info!("Deleted note {}", id);

        self.persist();
        self.emit(StoreEvent::Deleted { id: id.to_string() });
        true
    }

    /// Notes whose title or content contains `query`, ignoring case, in
    /// list order. A blank query returns every note.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        if query.trim().is_empty() {
            return self.notes.iter().collect();
        }

        let query = query.to_lowercase();
        let found: Vec<&Note> = self.notes.iter().filter(|n| n.matches(&query)).collect();
        trace!("Search {:?} matched {} of {} notes", query, found.len(), self.notes.len());
        found
    }

    /// Changes the selection. Selecting an id the store does not hold is a
    /// no-op and returns `false`.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.get(id).is_some() => {
                self.selected = Some(id.to_string());
                true
            }
            Some(id) => {
                debug!("Ignoring selection of unknown note {}", id);
                false
            }
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn selected(&self) -> Option<&Note> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Whether the persisted snapshot lags behind the in-memory list.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn subscribe(&mut self, observer: Box<dyn NotesObserver>) {
        self.observers.push(observer);
    }

    /// The current note list as the JSON stored in the snapshot slot.
    pub fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.notes)?)
    }

    /// Retries a snapshot write that previously failed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if self.write_snapshot()? {
            self.dirty = false;
        }
        Ok(())
    }

    fn persist(&mut self) {
        match self.write_snapshot() {
            Ok(true) => self.dirty = false,
            Ok(false) => {}
            Err(e) => {
                error!("Failed to save notes: {}", e);
                self.dirty = true;
            }
        }
    }

    /// Returns `false` when the write was held back by the empty-list policy.
    fn write_snapshot(&mut self) -> Result<bool> {
        if self.slot_locked {
            return Err(NotesError::SlotUnreadable {
                key: self.options.storage_key.clone(),
            });
        }
        if self.notes.is_empty() && !self.options.persist_empty {
            warn!(
                "Note list is empty, keeping the previous snapshot in slot {}",
                self.options.storage_key
            );
            return Ok(false);
        }

        let json = self.snapshot()?;
        self.backend.set(&self.options.storage_key, &json)?;
        trace!("Saved {} notes", self.notes.len());
        Ok(true)
    }

    fn emit(&self, event: StoreEvent) {
        for observer in &self.observers {
            observer.notify(&event);
        }
    }
}

/// Parses a snapshot and checks the collection invariants: non-empty unique
/// ids and `updatedAt >= createdAt`.
pub fn parse_snapshot(raw: &str) -> Result<Vec<Note>> {
    let notes: Vec<Note> = serde_json::from_str(raw)?;

    let mut seen = HashSet::with_capacity(notes.len());
    for note in &notes {
        if note.id.is_empty() {
            return Err(NotesError::InvalidSnapshot {
                message: "note with an empty id".to_string(),
            });
        }
        if !seen.insert(note.id.as_str()) {
            return Err(NotesError::InvalidSnapshot {
                message: format!("duplicate note id {}", note.id),
            });
        }
        if note.updated_at < note.created_at {
            return Err(NotesError::InvalidSnapshot {
                message: format!("note {} updated before it was created", note.id),
            });
        }
    }

    Ok(notes)
}
