use std::{collections::HashSet, fs, rc::Rc};

use quicknotes::{
    parse_snapshot, FileStore, FixedClock, KeyValueStore, MemoryStore, NoteUpdate, NotesError,
    NotesStore, Origin, SequentialIds, StoreOptions, UuidIds, WELCOME_TITLE,
};
use tempfile::TempDir;

fn file_store(dir: &TempDir, clock: &Rc<FixedClock>) -> NotesStore<FileStore> {
    NotesStore::with_sources(
        FileStore::open(dir.path()).unwrap(),
        StoreOptions::default(),
        UuidIds,
        Rc::clone(clock),
    )
}

#[test]
fn created_notes_have_distinct_ids_and_equal_timestamps() {
    let clock = Rc::new(FixedClock::new(1_000));
    let mut store = NotesStore::with_sources(
        MemoryStore::new(),
        StoreOptions::default(),
        UuidIds,
        Rc::clone(&clock),
    );

    let mut ids = HashSet::new();
    for _ in 0..50 {
        clock.advance(3);
        let id = store.create();
        let note = store.get(&id).unwrap();
        assert_eq!(note.created_at, note.updated_at);
        assert!(ids.insert(id));
    }
    assert_eq!(store.len(), 51);
}

#[test]
fn update_keeps_identity_and_creation_time() {
    let clock = Rc::new(FixedClock::new(1_000));
    let mut store = NotesStore::with_sources(
        MemoryStore::new(),
        StoreOptions::default(),
        SequentialIds::new("n"),
        Rc::clone(&clock),
    );
    let id = store.create();
    store.update(&id, NoteUpdate::content("body"));
    let before = store.get(&id).unwrap().clone();

    clock.advance(250);
    assert!(store.update(&id, NoteUpdate::title("X")));

    let after = store.get(&id).unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.title, "X");
    assert_eq!(after.content, "body");
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.updated_at, 1_250);
}

#[test]
fn update_on_unknown_id_leaves_everything_unchanged() {
    let dir = TempDir::new().unwrap();
    let clock = Rc::new(FixedClock::new(1_000));
    let mut store = file_store(&dir, &clock);
    store.create();

    let notes = store.notes().to_vec();
    let selected = store.selected().cloned();
    let saved = fs::read_to_string(dir.path().join("notes.json")).unwrap();

    clock.advance(10);
    assert!(!store.update("nonexistent", NoteUpdate::title("X")));

    assert_eq!(store.notes(), notes.as_slice());
    assert_eq!(store.selected().cloned(), selected);
    assert_eq!(fs::read_to_string(dir.path().join("notes.json")).unwrap(), saved);
}

#[test]
fn delete_removes_exactly_one_in_order() {
    let clock = Rc::new(FixedClock::new(0));
    let mut store = NotesStore::with_sources(
        MemoryStore::new(),
        StoreOptions::default(),
        SequentialIds::new("n"),
        Rc::clone(&clock),
    );
    let welcome = store.notes()[0].id.clone();
    store.delete(&welcome);

    let c = store.create();
    let b = store.create();
    let a = store.create();
    assert!(store.select(Some(&b)));

    assert!(store.delete(&b));

    let ids: Vec<&str> = store.notes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec![a.as_str(), c.as_str()]);
    assert!(store.selected().is_none());
}

#[test]
fn search_matches_title_or_content_ignoring_case() {
    let clock = Rc::new(FixedClock::new(0));
    let mut store = NotesStore::with_sources(
        MemoryStore::new(),
        StoreOptions::default(),
        SequentialIds::new("n"),
        Rc::clone(&clock),
    );
    let groceries = store.create();
    store.update(&groceries, NoteUpdate::title("Groceries"));
    let budget = store.create();
    store.update(
        &budget,
        NoteUpdate {
            title: Some("Budget".to_string()),
            content: Some("grocery list".to_string()),
        },
    );

    let found: Vec<&str> = store.search("grocer").iter().map(|n| n.id.as_str()).collect();
    assert_eq!(found, vec![budget.as_str(), groceries.as_str()]);

    let all: Vec<&str> = store.search("").iter().map(|n| n.id.as_str()).collect();
    let listed: Vec<&str> = store.notes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(all, listed);

    assert!(store.search("zzz").is_empty());
}

#[test]
fn snapshot_round_trips_through_a_fresh_store() {
    let dir = TempDir::new().unwrap();
    let clock = Rc::new(FixedClock::new(5_000));
    let original = {
        let mut store = file_store(&dir, &clock);
        for title in ["one", "two", "three"] {
            clock.advance(7);
            let id = store.create();
            store.update(&id, NoteUpdate::title(title));
            store.update(&id, NoteUpdate::content(format!("{} body\nwith <i>markup</i>", title)));
        }
        store.notes().to_vec()
    };

    let reopened = file_store(&dir, &clock);
    assert_eq!(reopened.origin(), Origin::Restored);
    assert_eq!(reopened.notes(), original.as_slice());
    assert!(reopened.selected().is_none());
}

#[test]
fn persisted_layout_uses_camel_case_millis() {
    let dir = TempDir::new().unwrap();
    let clock = Rc::new(FixedClock::new(1_700_000_000_000));
    let _store = file_store(&dir, &clock);

    let raw = fs::read_to_string(dir.path().join("notes.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &value.as_array().unwrap()[0];
    assert_eq!(first["title"], WELCOME_TITLE);
    assert_eq!(first["createdAt"], 1_700_000_000_000i64);
    assert_eq!(first["updatedAt"], 1_700_000_000_000i64);
    assert!(first["id"].is_string());
}

#[test]
fn first_run_seeds_one_selected_note() {
    let dir = TempDir::new().unwrap();
    let clock = Rc::new(FixedClock::new(0));
    let store = file_store(&dir, &clock);

    assert_eq!(store.origin(), Origin::Seeded);
    assert_eq!(store.len(), 1);
    assert_eq!(store.selected().unwrap().title, WELCOME_TITLE);
}

#[test]
fn unreadable_snapshot_is_kept_aside_and_seeded_over() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.json"), "[{\"id\": broken").unwrap();
    let clock = Rc::new(FixedClock::new(0));

    let store = file_store(&dir, &clock);

    assert_eq!(store.origin(), Origin::Recovered);
    assert_eq!(store.len(), 1);
    assert_eq!(store.selected().unwrap().title, WELCOME_TITLE);
    assert_eq!(
        fs::read_to_string(dir.path().join("notes.corrupt.json")).unwrap(),
        "[{\"id\": broken"
    );
    let saved = fs::read_to_string(dir.path().join("notes.json")).unwrap();
    assert_eq!(parse_snapshot(&saved).unwrap(), store.notes());
}

#[test]
fn deleting_everything_keeps_last_snapshot() {
    let dir = TempDir::new().unwrap();
    let clock = Rc::new(FixedClock::new(0));
    {
        let mut store = file_store(&dir, &clock);
        let ids: Vec<String> = store.notes().iter().map(|n| n.id.clone()).collect();
        for id in ids {
            store.delete(&id);
        }
        assert!(store.is_empty());
    }

    let reopened = file_store(&dir, &clock);
    assert_eq!(reopened.origin(), Origin::Restored);
    assert_eq!(reopened.len(), 1);
}

#[test]
fn deleting_everything_persists_when_enabled() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions {
        storage_key: "notes".to_string(),
        persist_empty: true,
    };
    let open = || {
        NotesStore::with_sources(
            FileStore::open(dir.path()).unwrap(),
            options.clone(),
            UuidIds,
            FixedClock::new(0),
        )
    };

    {
        let mut store = open();
        let id = store.notes()[0].id.clone();
        store.delete(&id);
    }

    let reopened = open();
    assert_eq!(reopened.origin(), Origin::Restored);
    assert!(reopened.is_empty());
    assert!(reopened.selected().is_none());
}

struct FailingWrites;

impl KeyValueStore for FailingWrites {
    fn get(&self, _key: &str) -> quicknotes::Result<Option<String>> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: &str) -> quicknotes::Result<()> {
        Err(std::io::Error::other("disk full").into())
    }

    fn remove(&mut self, _key: &str) -> quicknotes::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failures_do_not_break_mutations() {
    let mut store = NotesStore::open(FailingWrites, StoreOptions::default());
    assert!(store.is_dirty());

    let id = store.create();
    assert!(store.update(&id, NoteUpdate::title("still here")));
    assert_eq!(store.get(&id).unwrap().title, "still here");
    assert!(store.is_dirty());
    assert!(store.flush().is_err());
}

#[test]
fn non_utf8_snapshot_is_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.json");
    let original: &[u8] = b"[{\"id\":\"a\",\"title\":\"caf\xE9\",\"content\":\"precious\",\"createdAt\":1,\"updatedAt\":1}]";
    fs::write(&path, original).unwrap();
    let clock = Rc::new(FixedClock::new(0));

    let mut store = file_store(&dir, &clock);
    assert_eq!(store.origin(), Origin::Recovered);
    assert_eq!(store.len(), 1);
    assert_eq!(store.selected().unwrap().title, WELCOME_TITLE);
    assert!(store.is_dirty());

    let id = store.create();
    store.update(&id, NoteUpdate::title("in memory only"));
    assert!(matches!(
        store.flush(),
        Err(NotesError::SlotUnreadable { .. })
    ));

    assert_eq!(fs::read(&path).unwrap(), original);
}

struct UnreadableSlot {
    writes: Vec<(String, String)>,
}

impl KeyValueStore for UnreadableSlot {
    fn get(&self, _key: &str) -> quicknotes::Result<Option<String>> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
    }

    fn set(&mut self, key: &str, value: &str) -> quicknotes::Result<()> {
        self.writes.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn remove(&mut self, _key: &str) -> quicknotes::Result<()> {
        Ok(())
    }
}

#[test]
fn read_error_seeds_in_memory_without_writing() {
    let mut store = NotesStore::with_sources(
        UnreadableSlot { writes: Vec::new() },
        StoreOptions::default(),
        SequentialIds::new("n"),
        FixedClock::new(0),
    );

    assert_eq!(store.origin(), Origin::Recovered);
    assert_eq!(store.len(), 1);
    assert_eq!(store.selected().unwrap().title, WELCOME_TITLE);

    let id = store.create();
    store.update(&id, NoteUpdate::content("kept in memory"));
    store.delete(&id);

    assert!(store.backend().writes.is_empty());
    assert!(store.is_dirty());
}
