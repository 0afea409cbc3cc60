use futures::FutureExt;

use super::{ListStatus, RemoteJob, ScrollFollower};
use crate::core::RecordId;
use crate::core::note::{NewNote, Note};
use crate::sync::{DataAccess, RemoteError, Table, from_row, from_rows, to_row};

/// What a finished [`NoteStore`] job reports back.
#[derive(Debug)]
pub enum NoteOutcome {
    Loaded(Result<Vec<Note>, RemoteError>),
    Added(Result<Note, RemoteError>),
    Removed {
        id: RecordId,
        result: Result<(), RemoteError>,
    },
}

/// The note log, oldest first.
///
/// Unlike todo mutations, a failed note submission is shown to the user and
/// the typed text is kept so it can be sent again.
pub struct NoteStore<B> {
    backend: B,
    notes: Vec<Note>,
    status: ListStatus,
    pub input: String,
    submit_error: Option<String>,
    scroll: ScrollFollower,
}

impl<B> NoteStore<B>
where
    B: DataAccess + Clone + Send + Sync + 'static,
{
    pub fn new(backend: B) -> Self {
        Self::with_scroll(backend, ScrollFollower::default())
    }

    pub fn with_scroll(backend: B, scroll: ScrollFollower) -> Self {
        Self {
            backend,
            notes: Vec::new(),
            status: ListStatus::default(),
            input: String::new(),
            submit_error: None,
            scroll,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    /// Message from the last failed submission, cleared by the next success.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn scroll(&self) -> &ScrollFollower {
        &self.scroll
    }

    pub fn load(&mut self) -> RemoteJob<NoteOutcome> {
        self.status = ListStatus::Loading;
        let backend = self.backend.clone();
        async move {
            let fetched = backend
                .select_all(Table::Notes, "inserted_at", true)
                .await
                .and_then(from_rows::<Note>);
            NoteOutcome::Loaded(fetched)
        }
        .boxed()
    }

    /// Creates a note remotely; it is appended once the created row comes
    /// back. Blank text gives no job.
    pub fn add(&mut self, text: &str) -> Option<RemoteJob<NoteOutcome>> {
        let new_note = NewNote::new(text)?;
        let backend = self.backend.clone();
        Some(
            async move {
                let created = match to_row(&new_note) {
                    Ok(fields) => backend.insert(Table::Notes, fields).await,
                    Err(e) => Err(e),
                }
                .and_then(from_row::<Note>);
                NoteOutcome::Added(created)
            }
            .boxed(),
        )
    }

    /// Sends the current input as a new note. The input is cleared when the
    /// note is stored.
    pub fn submit(&mut self) -> Option<RemoteJob<NoteOutcome>> {
        let text = self.input.clone();
        self.add(&text)
    }

    pub fn remove(&mut self, id: &RecordId) -> Option<RemoteJob<NoteOutcome>> {
        let before = self.notes.len();
        self.notes.retain(|n| &n.id != id);
        if self.notes.len() == before {
            log::debug!("Removal of unknown note {} ignored", id);
            return None;
        }
        let backend = self.backend.clone();
        let id = id.clone();
        Some(
            async move {
                let result = backend.delete(Table::Notes, &id).await;
                NoteOutcome::Removed { id, result }
            }
            .boxed(),
        )
    }

    /// Applies the outcome of a finished job.
    pub fn on_remote(&mut self, outcome: NoteOutcome) {
        match outcome {
            NoteOutcome::Loaded(Ok(notes)) => {
                log::info!("Loaded {} notes", notes.len());
                self.notes = notes;
                self.status = ListStatus::Ready;
                self.scroll.content_changed();
            }
            NoteOutcome::Loaded(Err(e)) => {
                log::error!("Failed to load notes: {}", e);
                self.notes.clear();
                self.status = ListStatus::Error(e.to_string());
            }
            NoteOutcome::Added(Ok(note)) => {
                self.notes.push(note);
                self.input.clear();
                self.submit_error = None;
                self.scroll.content_changed();
            }
            NoteOutcome::Added(Err(e)) => {
                log::error!("Failed to add note: {}", e);
                self.submit_error = Some(format!("Could not save note: {}", e));
            }
            NoteOutcome::Removed { id, result: Err(e) } => {
                log::error!("Failed to delete note {}: {}", id, e);
            }
            NoteOutcome::Removed { result: Ok(()), .. } => {}
        }
    }

    /// Runs a job to the end and applies its outcome, for callers with nothing
    /// else to handle in the meantime.
    pub async fn complete(&mut self, job: impl Into<Option<RemoteJob<NoteOutcome>>>) {
        if let Some(job) = job.into() {
            let outcome = job.await;
            self.on_remote(outcome);
        }
    }

    pub fn on_scroll(&mut self, scroll_top: f64, viewport_height: f64, content_height: f64) {
        self.scroll.on_scroll(scroll_top, viewport_height, content_height);
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.scroll.set_expanded(expanded);
    }

    /// Whether the view should jump to the newest note now.
    pub fn take_scroll_request(&mut self) -> bool {
        self.scroll.take_scroll_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::memory::{MemoryBackend, Op};
    use crate::sync::row;
    use serde_json::json;

    fn seed(backend: &MemoryBackend, id: &str, text: &str, at: &str) {
        backend.seed(
            Table::Notes,
            row([("id", json!(id)), ("text", json!(text)), ("inserted_at", json!(at))]),
        );
    }

    async fn load(store: &mut NoteStore<MemoryBackend>) {
        let job = store.load();
        store.complete(job).await;
    }

    async fn loaded() -> NoteStore<MemoryBackend> {
        let backend = MemoryBackend::new();
        seed(&backend, "2", "second", "2026-01-02T08:00:00+00:00");
        seed(&backend, "1", "first", "2026-01-01T08:00:00+00:00");
        let mut store = NoteStore::new(backend);
        load(&mut store).await;
        store.take_scroll_request();
        store.backend().clear_calls();
        store
    }

    #[tokio::test]
    async fn load_is_chronological() {
        let store = loaded().await;
        let texts: Vec<&str> = store.notes().iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(store.status(), &ListStatus::Ready);
    }

    #[tokio::test]
    async fn successful_load_scrolls_to_newest() {
        let mut store = loaded().await;
        load(&mut store).await;
        assert!(store.take_scroll_request());
    }

    #[tokio::test]
    async fn failed_load_sets_error_without_scrolling() {
        let mut store = loaded().await;
        store.backend().set_failing(Op::Select, true);
        load(&mut store).await;
        assert!(store.notes().is_empty());
        assert!(store.status().error().is_some());
        assert!(!store.take_scroll_request());
    }

    #[tokio::test]
    async fn successful_submit_appends_clears_and_scrolls() {
        let mut store = loaded().await;
        store.input = "hello".to_string();

        let job = store.submit();
        assert_eq!(store.input, "hello");
        store.complete(job).await;

        assert_eq!(store.notes().len(), 3);
        assert_eq!(store.notes().last().unwrap().text, "hello");
        assert!(store.input.is_empty());
        assert!(store.take_scroll_request());
    }

    #[tokio::test]
    async fn no_scroll_when_reading_history() {
        let mut store = loaded().await;
        store.on_scroll(0.0, 300.0, 1200.0);
        let job = store.add("hello");
        store.complete(job).await;
        assert_eq!(store.notes().len(), 3);
        assert!(!store.take_scroll_request());
    }

    #[tokio::test]
    async fn failed_submit_is_shown_and_input_kept() {
        let mut store = loaded().await;
        store.backend().set_failing(Op::Insert, true);
        store.input = "keep me".to_string();

        let job = store.submit();
        store.complete(job).await;
        assert_eq!(store.notes().len(), 2);
        assert_eq!(store.input, "keep me");
        assert!(store.submit_error().unwrap().contains("rejected"));

        store.backend().set_failing(Op::Insert, false);
        let job = store.submit();
        store.complete(job).await;
        assert!(store.submit_error().is_none());
    }

    #[tokio::test]
    async fn blank_note_makes_no_call() {
        let mut store = loaded().await;
        store.input = "   ".to_string();
        assert!(store.submit().is_none());
        assert_eq!(store.notes().len(), 2);
        assert!(store.backend().calls().is_empty());
        assert!(store.submit_error().is_none());
    }

    #[tokio::test]
    async fn remove_deletes_the_remote_row_without_scrolling() {
        let mut store = loaded().await;
        let id = RecordId::from("1");

        let job = store.remove(&id);
        assert_eq!(store.notes().len(), 1);
        store.complete(job).await;

        let calls = store.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, Op::Delete);
        assert_eq!(calls[0].id, Some(id));
        let remaining = store.backend().rows(Table::Notes);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"], json!("2"));
        assert!(!store.take_scroll_request());
    }

    #[tokio::test]
    async fn remove_is_local_first() {
        let mut store = loaded().await;
        store.backend().set_failing(Op::Delete, true);
        let job = store.remove(&"1".into());
        store.complete(job).await;
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.backend().rows(Table::Notes).len(), 2);
    }
}
