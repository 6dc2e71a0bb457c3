pub mod note;
pub mod text;

pub use note::{
    Attachment, AttachmentKind, InvalidProgress, Mood, NewNote, Note, NotePatch, NoteRow, Progress,
};
