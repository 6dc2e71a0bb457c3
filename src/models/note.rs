use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text::{derive_title, validate_content};

pub const EMPTY_CONTENT_MESSAGE: &str = "content must not be empty";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mood {
    #[serde(rename = "feliz", alias = "happy")]
    Feliz,
    #[default]
    #[serde(rename = "neutro", alias = "neutral")]
    Neutro,
    #[serde(rename = "triste", alias = "sad")]
    Triste,
    #[serde(rename = "animado", alias = "excited")]
    Animado,
    #[serde(rename = "deboa", alias = "calm")]
    Deboa,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Feliz,
        Mood::Neutro,
        Mood::Triste,
        Mood::Animado,
        Mood::Deboa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Feliz => "feliz",
            Mood::Neutro => "neutro",
            Mood::Triste => "triste",
            Mood::Animado => "animado",
            Mood::Deboa => "deboa",
        }
    }

    /// The English name older records were stored with.
    pub fn legacy_alias(self) -> &'static str {
        match self {
            Mood::Feliz => "happy",
            Mood::Neutro => "neutral",
            Mood::Triste => "sad",
            Mood::Animado => "excited",
            Mood::Deboa => "calm",
        }
    }

    /// Every stored spelling that means this mood.
    pub fn stored_values(self) -> [&'static str; 2] {
        [self.as_str(), self.legacy_alias()]
    }

    /// Accepts canonical values and retired aliases.
    pub fn parse(value: &str) -> Option<Mood> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == value || mood.legacy_alias() == value)
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid progress value {0}; expected one of 0, 25, 50, 75, 100")]
pub struct InvalidProgress(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Progress {
    #[default]
    Open,
    Started,
    InProgress,
    Finishing,
    Done,
}

impl Progress {
    pub const ALL: [Progress; 5] = [
        Progress::Open,
        Progress::Started,
        Progress::InProgress,
        Progress::Finishing,
        Progress::Done,
    ];

    pub fn value(self) -> i64 {
        match self {
            Progress::Open => 0,
            Progress::Started => 25,
            Progress::InProgress => 50,
            Progress::Finishing => 75,
            Progress::Done => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Progress::Open => "Open",
            Progress::Started => "Started",
            Progress::InProgress => "In progress",
            Progress::Finishing => "Finishing",
            Progress::Done => "Done",
        }
    }
}

impl TryFrom<i64> for Progress {
    type Error = InvalidProgress;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Progress::ALL
            .into_iter()
            .find(|p| p.value() == value)
            .ok_or(InvalidProgress(value))
    }
}

impl From<Progress> for i64 {
    fn from(progress: Progress) -> Self {
        progress.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Link,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub archived: bool,
    pub pinned: bool,
    pub mood: Mood,
    pub progress: Progress,
    pub created_at: String,
    pub updated_at: String,
}

impl Note {
    pub fn new(fields: NewNote) -> Self {
        let now = timestamp_now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            content: fields.content,
            tags: fields.tags,
            attachments: fields.attachments,
            archived: false,
            pinned: false,
            mood: fields.mood.unwrap_or_default(),
            progress: fields.progress.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Pre-save hook: a blank title is derived from content, then content
    /// must contain visible text. Returns the validation message on failure.
    pub fn prepare_for_save(&mut self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            self.title = derive_title(&self.content);
        }
        if !validate_content(&self.content) {
            return Err(EMPTY_CONTENT_MESSAGE.to_string());
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = advance_timestamp(&self.updated_at);
    }
}

/// Fields accepted when creating a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Merge patch for a full update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl NotePatch {
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(tags) = self.tags {
            note.tags = tags;
        }
        if let Some(archived) = self.archived {
            note.archived = archived;
        }
        if let Some(pinned) = self.pinned {
            note.pinned = pinned;
        }
        if let Some(mood) = self.mood {
            note.mood = mood;
        }
        if let Some(progress) = self.progress {
            note.progress = progress;
        }
        if let Some(attachments) = self.attachments {
            note.attachments = attachments;
        }
    }
}

/// A `notes` row as stored. Converted into [`Note`] before leaving the store.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub attachments: String,
    pub archived: bool,
    pub pinned: bool,
    pub mood: String,
    pub progress: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        let tags = serde_json::from_str(&row.tags).unwrap_or_else(|e| {
            tracing::warn!("Unreadable tags on note {}: {e}", row.id);
            Vec::new()
        });
        let attachments = serde_json::from_str(&row.attachments).unwrap_or_else(|e| {
            tracing::warn!("Unreadable attachments on note {}: {e}", row.id);
            Vec::new()
        });
        Note {
            mood: Mood::parse(&row.mood).unwrap_or_default(),
            progress: Progress::try_from(row.progress).unwrap_or_default(),
            id: row.id,
            title: row.title,
            content: row.content,
            tags,
            attachments,
            archived: row.archived,
            pinned: row.pinned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Current time as fixed-width RFC 3339, so stored values order lexically.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Rewrite any RFC 3339 timestamp in the stored fixed-width UTC form.
pub fn canonical_timestamp(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// A timestamp strictly after `previous`, normally the current time.
pub fn advance_timestamp(previous: &str) -> String {
    let now = Utc::now();
    match previous.parse::<DateTime<Utc>>() {
        Ok(previous) if previous >= now => (previous + Duration::microseconds(1))
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        _ => now.to_rfc3339_opts(SecondsFormat::Micros, true),
    }
}
