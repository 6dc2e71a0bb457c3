//! Client-side view state for the note list.
//!
//! The list is never patched in place: every filter change and every
//! completed mutation refetches the whole list from the server and replaces
//! it. The only speculative state is the progress indicator, which shows a
//! pending value until the server confirms it or the request fails.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::client::{ClientError, ListParams, NoteGateway, RawNote};
use crate::models::note::timestamp_now;
use crate::models::{Attachment, Mood, NewNote, Note, NotePatch, Progress};

/// Turn a wire note into the canonical shape, filling every missing or
/// unrecognized field with its default.
pub fn normalize(raw: RawNote) -> Note {
    let updated_at = raw.updated_at.unwrap_or_else(timestamp_now);
    let created_at = raw.created_at.unwrap_or_else(|| updated_at.clone());

    Note {
        id: raw.id.or(raw.legacy_id).unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        content: raw.content.unwrap_or_default(),
        tags: raw.tags.map(string_list).unwrap_or_default(),
        attachments: raw.attachments.map(attachment_list).unwrap_or_default(),
        archived: raw.archived.as_ref().is_some_and(truthy),
        pinned: raw.pinned.as_ref().is_some_and(truthy),
        mood: raw
            .mood
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Mood::parse)
            .unwrap_or_default(),
        progress: raw
            .progress
            .as_ref()
            .and_then(progress_number)
            .and_then(|value| Progress::try_from(value).ok())
            .unwrap_or_default(),
        created_at,
        updated_at,
    }
}

fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn attachment_list(value: Value) -> Vec<Attachment> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn progress_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn updated_instant(note: &Note) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&note.updated_at)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Pinned first, then most recently updated. Unparseable timestamps sort last.
pub fn compare_notes(a: &Note, b: &Note) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| updated_instant(b).cmp(&updated_instant(a)))
}

pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(compare_notes);
}

/// Progress value shown for one note: the last confirmed value, or a pending
/// value while a request for it is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressIndicator {
    confirmed: Progress,
    pending: Option<Progress>,
}

impl ProgressIndicator {
    pub fn new(confirmed: Progress) -> Self {
        Self {
            confirmed,
            pending: None,
        }
    }

    pub fn displayed(&self) -> Progress {
        self.pending.unwrap_or(self.confirmed)
    }

    pub fn begin(&mut self, value: Progress) {
        self.pending = Some(value);
    }

    pub fn commit(&mut self, confirmed: Progress) {
        self.confirmed = confirmed;
        self.pending = None;
    }

    pub fn rollback(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-visible notification, rendered by the UI as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn success(title: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    fn error(title: &str, error: &ClientError) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.to_string(),
            description: error.to_string(),
        }
    }
}

/// Filters the user currently has applied to the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: String,
    pub tags: Vec<String>,
    pub show_archived: bool,
    pub mood: Option<Mood>,
}

impl Filters {
    pub fn to_params(&self) -> ListParams {
        ListParams {
            q: Some(self.search.trim().to_string()).filter(|q| !q.is_empty()),
            tags: self.tags.clone(),
            archived: Some(self.show_archived),
            mood: self.mood,
        }
    }
}

pub struct NoteList<G> {
    gateway: G,
    filters: Filters,
    notes: Vec<Note>,
    available_tags: Vec<String>,
    progress: HashMap<String, ProgressIndicator>,
    notices: Vec<Notice>,
}

impl<G: NoteGateway> NoteList<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_filters(gateway, Filters::default())
    }

    pub fn with_filters(gateway: G, filters: Filters) -> Self {
        Self {
            gateway,
            filters,
            notes: Vec::new(),
            available_tags: Vec::new(),
            progress: HashMap::new(),
            notices: Vec::new(),
        }
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn available_tags(&self) -> &[String] {
        &self.available_tags
    }

    /// Non-archived notes in the current list.
    pub fn active_count(&self) -> usize {
        self.notes.iter().filter(|note| !note.archived).count()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn displayed_progress(&self, id: &str) -> Option<Progress> {
        self.progress.get(id).map(ProgressIndicator::displayed)
    }

    /// Fetch the list for the current filters and replace the local copy.
    pub async fn reload(&mut self) -> Result<(), ClientError> {
        let params = self.filters.to_params();
        let result = self.gateway.list_notes(&params).await;
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                self.notices.push(Notice::error("Could not load notes", &e));
                return Err(e);
            }
        };

        let mut notes: Vec<Note> = raw.into_iter().map(normalize).collect();
        sort_notes(&mut notes);

        let previous = std::mem::take(&mut self.progress);
        self.progress = notes
            .iter()
            .map(|note| {
                let mut indicator = ProgressIndicator::new(note.progress);
                if let Some(pending) = previous.get(&note.id).and_then(|p| p.pending) {
                    indicator.begin(pending);
                }
                (note.id.clone(), indicator)
            })
            .collect();
        self.notes = notes;

        let result = self.gateway.list_tags().await;
        match result {
            Ok(tags) => self.available_tags = tags,
            Err(e) => {
                self.notices.push(Notice::error("Could not load tags", &e));
                return Err(e);
            }
        }
        Ok(())
    }

    pub async fn set_search(&mut self, search: impl Into<String>) -> Result<(), ClientError> {
        self.filters.search = search.into();
        self.reload().await
    }

    pub async fn set_tags(&mut self, tags: Vec<String>) -> Result<(), ClientError> {
        self.filters.tags = tags;
        self.reload().await
    }

    pub async fn toggle_tag(&mut self, tag: &str) -> Result<(), ClientError> {
        if let Some(pos) = self.filters.tags.iter().position(|t| t == tag) {
            self.filters.tags.remove(pos);
        } else {
            self.filters.tags.push(tag.to_string());
        }
        self.reload().await
    }

    pub async fn set_show_archived(&mut self, show_archived: bool) -> Result<(), ClientError> {
        self.filters.show_archived = show_archived;
        self.reload().await
    }

    pub async fn set_mood(&mut self, mood: Option<Mood>) -> Result<(), ClientError> {
        self.filters.mood = mood;
        self.reload().await
    }

    pub async fn create(&mut self, fields: NewNote) -> Result<Note, ClientError> {
        let result = self.gateway.create_note(&fields).await;
        let created = self.record("Could not save note", result)?;
        let note = normalize(created);
        self.notices
            .push(Notice::success("Note saved", "Your note was created"));
        self.reload().await?;
        Ok(note)
    }

    pub async fn update(&mut self, id: &str, patch: NotePatch) -> Result<Note, ClientError> {
        let result = self.gateway.update_note(id, &patch).await;
        let updated = self.record("Could not save note", result)?;
        let note = normalize(updated);
        self.notices
            .push(Notice::success("Note saved", "Your changes were saved"));
        self.reload().await?;
        Ok(note)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        let result = self.gateway.delete_note(id).await;
        self.record("Could not delete note", result)?;
        self.notices
            .push(Notice::success("Note deleted", "The note was removed"));
        self.reload().await
    }

    pub async fn toggle_pin(&mut self, id: &str) -> Result<(), ClientError> {
        let result = self.gateway.toggle_pin(id).await;
        let raw = self.record("Could not pin note", result)?;
        let notice = if normalize(raw).pinned {
            Notice::success("Note pinned", "The note was added to highlights")
        } else {
            Notice::success("Note unpinned", "The note was removed from highlights")
        };
        self.notices.push(notice);
        self.reload().await
    }

    pub async fn toggle_archive(&mut self, id: &str) -> Result<(), ClientError> {
        let result = self.gateway.toggle_archive(id).await;
        let raw = self.record("Could not archive note", result)?;
        let notice = if normalize(raw).archived {
            Notice::success("Note archived", "The note was archived")
        } else {
            Notice::success("Note restored", "The note was unarchived")
        };
        self.notices.push(notice);
        self.reload().await
    }

    /// Show `value` immediately for note `id`. Returns false when the note is
    /// not in the current list.
    pub fn begin_progress(&mut self, id: &str, value: Progress) -> bool {
        match self.progress.get_mut(id) {
            Some(indicator) => {
                indicator.begin(value);
                true
            }
            None => false,
        }
    }

    /// Settle a pending progress change with the server's answer.
    pub fn finish_progress(&mut self, id: &str, outcome: &Result<RawNote, ClientError>) {
        let Some(indicator) = self.progress.get_mut(id) else {
            return;
        };
        match outcome {
            Ok(raw) => {
                let confirmed = normalize(raw.clone()).progress;
                indicator.commit(confirmed);
                if let Some(note) = self.notes.iter_mut().find(|note| note.id == id) {
                    note.progress = confirmed;
                }
            }
            Err(e) => {
                indicator.rollback();
                self.notices
                    .push(Notice::error("Could not update progress", e));
            }
        }
    }

    /// Optimistically set progress, confirm with the server, then reload.
    pub async fn set_progress(&mut self, id: &str, value: Progress) -> Result<(), ClientError> {
        self.begin_progress(id, value);
        let outcome = self.gateway.set_progress(id, value).await;
        self.finish_progress(id, &outcome);
        outcome?;
        self.reload().await
    }

    fn record<T>(
        &mut self,
        failure_title: &str,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if let Err(e) = &result {
            self.notices.push(Notice::error(failure_title, e));
        }
        result
    }
}
