//! The note record and its partial update.
//!
//! Notes are persisted as a JSON array with camelCase field names and
//! timestamps as integer epoch milliseconds.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title shown for notes whose title is blank.
pub const UNTITLED: &str = "Untitled Note";

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Plain text body, markup is stored as typed
    pub content: String,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
    /// Last modification time in epoch milliseconds
    pub updated_at: i64,
}

/// Fields to merge into an existing note. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

impl Note {
    /// Creates an empty note stamped with `now` for both timestamps.
    pub fn new(id: String, now: i64) -> Self {
        Note {
            id,
            title: String::new(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `update` into the note and refreshes `updated_at`.
    ///
    /// `updated_at` never moves backwards, even if `now` does.
    pub fn apply(&mut self, update: &NoteUpdate, now: i64) {
        if let Some(title) = &update.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &update.content {
            self.content.clone_from(content);
        }
        self.updated_at = now.max(self.updated_at);
    }

    /// Case-insensitive containment check against title or content.
    ///
    /// `lowercase_query` must already be lowercased.
    pub fn matches(&self, lowercase_query: &str) -> bool {
        self.title.to_lowercase().contains(lowercase_query)
            || self.content.to_lowercase().contains(lowercase_query)
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Short single-line preview of the content for list views.
    ///
    /// Anything between `<` and `>` is dropped, whitespace runs collapse to a
    /// single space, and the result is cut at `max_chars` characters with
    /// `...` appended when something was cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut plain = String::with_capacity(self.content.len());
        let mut in_tag = false;
        for c in self.content.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if in_tag => {}
                c if c.is_whitespace() => {
                    if !plain.ends_with(' ') && !plain.is_empty() {
                        plain.push(' ');
                    }
                }
                c => plain.push(c),
            }
        }
        let plain = plain.trim_end();

        if plain.chars().count() > max_chars {
            let cut: String = plain.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            plain.to_string()
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.created_at).unwrap_or_default()
    }

    pub fn updated(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.updated_at).unwrap_or_default()
    }
}
