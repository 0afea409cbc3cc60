pub mod notes;
pub mod scroll;
pub mod todos;

use futures::future::BoxFuture;

pub use notes::{NoteOutcome, NoteStore};
pub use scroll::ScrollFollower;
pub use todos::{Focus, TodoDraft, TodoOutcome, TodoStore};

/// Remote work handed out by a store operation.
///
/// The job owns everything it needs, so the store stays free for other
/// events while it runs. Its output goes back to the store that created it
/// (`TodoStore::on_remote` / `NoteStore::on_remote`).
pub type RemoteJob<T> = BoxFuture<'static, T>;

/// Load state of a list, shown as a spinner or an error banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last load failed; the list is empty until the next successful load.
    Error(String),
}

impl ListStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}
