use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::types::Json;
use sqlx::{Executor, QueryBuilder};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{NewNote, Note, NotePatch, NoteRow, Progress};
use crate::query::NoteFilter;

/// Note persistence over an explicitly owned connection pool.
///
/// Every operation is independent; there is no cross-document atomicity.
#[derive(Clone)]
pub struct NoteStore {
    pool: SqlitePool,
}

impl NoteStore {
    /// Wrap a pool whose migrations have already been applied.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self::new(db::init_pool(database_url).await?))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create(&self, fields: NewNote) -> Result<Note, AppError> {
        let mut note = Note::new(fields);
        note.prepare_for_save().map_err(AppError::Validation)?;
        insert_note(&self.pool, &note).await?;
        tracing::info!("Created note {}", note.id);
        Ok(note)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Note, AppError> {
        let id = parse_id(id)?;
        self.fetch(&id).await?.ok_or(AppError::NotFound)
    }

    /// Notes matching `filter`, pinned first, then most recently updated.
    ///
    /// Free text is matched after the fetch so case folding covers non-ASCII
    /// letters.
    pub async fn list(&self, filter: &NoteFilter) -> Result<Vec<Note>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM notes");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY pinned DESC, updated_at DESC");

        let rows: Vec<NoteRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(Note::from)
            .filter(|note| filter.matches_text(note))
            .collect())
    }

    pub async fn update(&self, id: &str, patch: NotePatch) -> Result<Note, AppError> {
        let mut note = self.get_by_id(id).await?;
        patch.apply(&mut note);
        note.prepare_for_save().map_err(AppError::Validation)?;
        note.touch();
        self.save(&note).await?;
        Ok(note)
    }

    pub async fn toggle_pin(&self, id: &str) -> Result<Note, AppError> {
        let mut note = self.get_by_id(id).await?;
        note.pinned = !note.pinned;
        note.touch();
        self.save(&note).await?;
        Ok(note)
    }

    pub async fn toggle_archive(&self, id: &str) -> Result<Note, AppError> {
        let mut note = self.get_by_id(id).await?;
        note.archived = !note.archived;
        note.touch();
        self.save(&note).await?;
        Ok(note)
    }

    pub async fn set_progress(&self, id: &str, value: i64) -> Result<Note, AppError> {
        let id = parse_id(id)?;
        let progress =
            Progress::try_from(value).map_err(|e| AppError::InvalidArgument(e.to_string()))?;
        let mut note = self.fetch(&id).await?.ok_or(AppError::NotFound)?;
        note.progress = progress;
        note.touch();
        self.save(&note).await?;
        Ok(note)
    }

    /// Hard delete.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(&id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Deleted note {id}");
        Ok(())
    }

    /// Every tag in use across all notes, deduplicated and sorted ascending.
    pub async fn list_distinct_tags(&self) -> Result<Vec<String>, AppError> {
        let tags: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT json_each.value
            FROM notes, json_each(notes.tags)
            WHERE json_each.type = 'text'
            ORDER BY json_each.value ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags.into_iter().map(|(tag,)| tag).collect())
    }

    async fn fetch(&self, id: &str) -> Result<Option<Note>, AppError> {
        let row: Option<NoteRow> = sqlx::query_as("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Note::from))
    }

    async fn save(&self, note: &Note) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE notes
            SET title = ?, content = ?, tags = ?, attachments = ?, archived = ?, pinned = ?,
                mood = ?, progress = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(Json(&note.tags))
        .bind(Json(&note.attachments))
        .bind(note.archived)
        .bind(note.pinned)
        .bind(note.mood.as_str())
        .bind(note.progress.value())
        .bind(&note.updated_at)
        .bind(&note.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub(crate) async fn insert_note<'e, E>(executor: E, note: &Note) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO notes (id, title, content, tags, attachments, archived, pinned, mood, progress, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&note.id)
    .bind(&note.title)
    .bind(&note.content)
    .bind(Json(&note.tags))
    .bind(Json(&note.attachments))
    .bind(note.archived)
    .bind(note.pinned)
    .bind(note.mood.as_str())
    .bind(note.progress.value())
    .bind(&note.created_at)
    .bind(&note.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Canonical form of a structurally valid id.
fn parse_id(id: &str) -> Result<String, AppError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| AppError::InvalidId)
}
