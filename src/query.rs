use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::{Mood, Note};

/// Raw `/notes` query-string parameters, exactly as the client sent them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteQuery {
    pub q: Option<String>,
    pub tags: Option<String>,
    pub archived: Option<String>,
    pub mood: Option<String>,
}

impl NoteQuery {
    pub fn to_filter(&self) -> NoteFilter {
        build_filter(
            self.q.as_deref(),
            self.tags.as_deref(),
            self.archived.as_deref(),
            self.mood.as_deref(),
        )
    }
}

/// A conjunction of note predicates. The default value matches every note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub archived: Option<bool>,
    /// Lowercased search needle matched against title or content.
    pub text: Option<String>,
    /// Every listed tag must be present on the note.
    pub tags: Vec<String>,
    /// Stored mood spellings, any of which matches.
    pub moods: Vec<String>,
}

/// Translate loosely-typed filter parameters into a [`NoteFilter`].
///
/// Malformed input never fails: it degrades to no restriction for that clause.
pub fn build_filter(
    free_text: Option<&str>,
    tags_csv: Option<&str>,
    archived: Option<&str>,
    mood: Option<&str>,
) -> NoteFilter {
    let archived = archived.and_then(|value| match value {
        "true" => Some(true),
        "false" => Some(false),
        other => {
            tracing::debug!("Ignoring archived filter value {other:?}");
            None
        }
    });

    let text = free_text
        .filter(|q| !q.is_empty())
        .map(|q| q.to_lowercase());

    let tags = tags_csv
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let moods = match mood.filter(|m| !m.is_empty()) {
        Some(requested) => match Mood::ALL.into_iter().find(|m| m.as_str() == requested) {
            Some(canonical) => canonical.stored_values().map(str::to_string).to_vec(),
            None => vec![requested.to_string()],
        },
        None => Vec::new(),
    };

    NoteFilter {
        archived,
        text,
        tags,
        moods,
    }
}

impl NoteFilter {
    pub fn is_match_all(&self) -> bool {
        *self == NoteFilter::default()
    }

    /// Append the SQL-expressible clauses as a `WHERE` clause.
    ///
    /// Free text is left out: SQLite's `lower()` folds ASCII only, so rows
    /// fetched with this clause must still pass [`NoteFilter::matches_text`].
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let mut clauses = 0;

        if let Some(archived) = self.archived {
            push_conjunction(qb, &mut clauses);
            qb.push("archived = ").push_bind(archived);
        }

        for tag in &self.tags {
            push_conjunction(qb, &mut clauses);
            qb.push("EXISTS (SELECT 1 FROM json_each(notes.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }

        if !self.moods.is_empty() {
            push_conjunction(qb, &mut clauses);
            qb.push("mood IN (");
            let mut separated = qb.separated(", ");
            for mood in &self.moods {
                separated.push_bind(mood.clone());
            }
            separated.push_unseparated(")");
        }
    }

    /// Case-insensitive substring match of the free text against title or
    /// content. True when no free text was given.
    pub fn matches_text(&self, note: &Note) -> bool {
        let Some(text) = &self.text else {
            return true;
        };
        note.title.to_lowercase().contains(text.as_str())
            || note.content.to_lowercase().contains(text.as_str())
    }

    /// The whole filter evaluated in memory.
    pub fn matches(&self, note: &Note) -> bool {
        if self.archived.is_some_and(|archived| note.archived != archived) {
            return false;
        }
        if !self.matches_text(note) {
            return false;
        }
        if !self.tags.iter().all(|tag| note.tags.contains(tag)) {
            return false;
        }
        self.moods.is_empty() || self.moods.iter().any(|m| m == note.mood.as_str())
    }
}

fn push_conjunction(qb: &mut QueryBuilder<'_, Sqlite>, clauses: &mut usize) {
    qb.push(if *clauses == 0 { " WHERE " } else { " AND " });
    *clauses += 1;
}
