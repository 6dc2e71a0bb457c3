use std::fs;

use uuid::Uuid;

use crate::client::{NoteGateway, NotesClient, RawNote};
use crate::models::note::{canonical_timestamp, timestamp_now};
use crate::models::{Mood, Note};
use crate::store::{insert_note, NoteStore};
use crate::sync::{normalize, Filters, NoteList};

/// Import an exported JSON array of note documents.
///
/// Documents may come from older versions of the app (`_id` keys, English
/// mood names, missing fields). Each one is normalized and validated; invalid
/// documents are skipped. Returns the number of notes imported.
pub async fn import_notes(
    store: &NoteStore,
    file_path: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let documents: Vec<RawNote> = serde_json::from_str(&content)?;

    let mut imported = 0;
    let mut tx = store.pool().begin().await?;

    for document in documents {
        let mut note: Note = normalize(document);
        let source_id = std::mem::replace(&mut note.id, Uuid::new_v4().to_string());
        canonicalize_timestamps(&mut note);

        if let Err(reason) = note.prepare_for_save() {
            tracing::warn!("Skipping note {source_id:?}: {reason}");
            continue;
        }

        insert_note(&mut *tx, &note).await?;
        imported += 1;
    }

    tx.commit().await?;
    println!("Imported {} notes", imported);
    Ok(imported)
}

/// Stored timestamps must share one format so the list orders by time.
/// An unreadable `updatedAt` becomes now; an unreadable `createdAt` follows it.
fn canonicalize_timestamps(note: &mut Note) {
    let updated_at = canonical_timestamp(&note.updated_at).unwrap_or_else(|| {
        tracing::warn!("Unreadable updatedAt {:?}, using now", note.updated_at);
        timestamp_now()
    });
    note.created_at = canonical_timestamp(&note.created_at).unwrap_or_else(|| updated_at.clone());
    note.updated_at = updated_at;
}

/// Options for `sunstone notes`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NotesArgs {
    pub archived: bool,
    pub q: Option<String>,
    pub tags: Vec<String>,
    pub mood: Option<Mood>,
}

impl NotesArgs {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = NotesArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--archived" => parsed.archived = true,
                "--q" => parsed.q = Some(next_value(&mut iter, "--q")?),
                "--tag" => parsed.tags.push(next_value(&mut iter, "--tag")?),
                "--mood" => {
                    let raw = next_value(&mut iter, "--mood")?;
                    let mood = Mood::parse(&raw).ok_or_else(|| format!("Unknown mood: {raw}"))?;
                    parsed.mood = Some(mood);
                }
                other => return Err(format!("Unknown option: {other}")),
            }
        }
        Ok(parsed)
    }

    fn to_filters(&self) -> Filters {
        Filters {
            search: self.q.clone().unwrap_or_default(),
            tags: self.tags.clone(),
            show_archived: self.archived,
            mood: self.mood,
        }
    }
}

fn next_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("{flag} needs a value"))
}

/// Print the notes a running API returns for the given filters.
pub async fn print_notes(
    client: NotesClient,
    args: &NotesArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut list = NoteList::with_filters(client, args.to_filters());
    list.reload().await?;

    for note in list.notes() {
        let pin = if note.pinned { "*" } else { " " };
        println!(
            "{pin} {}  {}  [{}] {} {} ({}%)  {}",
            note.id,
            note.title,
            note.tags.join(", "),
            note.mood,
            note.progress.label(),
            note.progress.value(),
            note.updated_at
        );
    }
    println!("{} notes ({} active)", list.notes().len(), list.active_count());
    Ok(())
}

pub async fn print_tags(client: NotesClient) -> Result<(), Box<dyn std::error::Error>> {
    for tag in client.list_tags().await? {
        println!("{tag}");
    }
    Ok(())
}
