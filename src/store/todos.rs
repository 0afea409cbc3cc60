use chrono::NaiveDate;
use futures::FutureExt;
use serde_json::json;

use super::{ListStatus, RemoteJob};
use crate::core::RecordId;
use crate::core::category::category_suggestions;
use crate::core::todo::{NewTodo, Priority, Todo, UNCATEGORIZED, next_position};
use crate::core::view::{self, CategoryGroup};
use crate::sync::ordering::persist_positions;
use crate::sync::{DataAccess, RemoteError, Row, Table, from_row, from_rows, row, to_row};

/// Pending contents of the add form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoDraft {
    pub text: String,
    pub category: String,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
}

/// Which add-form field should hold input focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Text,
    Category,
}

/// What a finished [`TodoStore`] job reports back.
#[derive(Debug)]
pub enum TodoOutcome {
    Loaded(Result<Vec<Todo>, RemoteError>),
    Added {
        text: String,
        result: Result<Todo, RemoteError>,
    },
    /// An update or delete of a single row.
    Written {
        action: &'static str,
        id: RecordId,
        result: Result<(), RemoteError>,
    },
    Reordered {
        moved: RecordId,
        result: Result<(), RemoteError>,
    },
}

/// The todo list, kept optimistically in step with the remote `todos` table.
///
/// Every operation changes local state right away and hands back the remote
/// write as a [`RemoteJob`]. The caller runs the job however it likes and
/// passes the outcome to [`TodoStore::on_remote`]. A failed write is logged
/// and local state is kept, so the two can differ until the next load.
pub struct TodoStore<B> {
    backend: B,
    todos: Vec<Todo>,
    status: ListStatus,
    editing: Option<RecordId>,
    pub draft: TodoDraft,
    focus: Focus,
}

impl<B> TodoStore<B>
where
    B: DataAccess + Clone + Send + Sync + 'static,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            todos: Vec::new(),
            status: ListStatus::default(),
            editing: None,
            draft: TodoDraft::default(),
            focus: Focus::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &RecordId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn editing(&self) -> Option<&RecordId> {
        self.editing.as_ref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Todos in display order.
    pub fn sorted(&self) -> Vec<&Todo> {
        view::sorted_by_position(&self.todos)
    }

    /// Todos grouped by category, rebuilt from the current list on every call.
    pub fn grouped(&self) -> Vec<CategoryGroup<'_>> {
        view::group_by_category(&self.todos)
    }

    pub fn categories(&self) -> Vec<String> {
        category_suggestions(&self.todos)
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Todo> {
        self.sorted()
            .into_iter()
            .filter(|t| t.is_overdue(today))
            .collect()
    }

    /// Fetches every remote row ordered by position. The list is replaced when
    /// the outcome arrives.
    pub fn load(&mut self) -> RemoteJob<TodoOutcome> {
        self.status = ListStatus::Loading;
        let backend = self.backend.clone();
        async move {
            let fetched = backend
                .select_all(Table::Todos, "position", true)
                .await
                .and_then(from_rows::<Todo>);
            TodoOutcome::Loaded(fetched)
        }
        .boxed()
    }

    /// Creates a todo at the end of the list.
    ///
    /// Blank text is ignored and gives no job. The todo is added locally only
    /// once the remote store returns the created row, so local ids are always
    /// the server's.
    pub fn add(
        &mut self,
        text: &str,
        category: &str,
        deadline: Option<NaiveDate>,
        priority: Priority,
    ) -> Option<RemoteJob<TodoOutcome>> {
        let new_todo = NewTodo::new(text, category, deadline, priority, next_position(&self.todos))?;
        let backend = self.backend.clone();
        Some(
            async move {
                let result = match to_row(&new_todo) {
                    Ok(fields) => backend.insert(Table::Todos, fields).await,
                    Err(e) => Err(e),
                }
                .and_then(from_row::<Todo>);
                TodoOutcome::Added {
                    text: new_todo.text,
                    result,
                }
            }
            .boxed(),
        )
    }

    /// Submits the add form. The form is cleared whether or not the remote
    /// insert succeeds; a draft with blank text is left as it is.
    pub fn submit_draft(&mut self) -> Option<RemoteJob<TodoOutcome>> {
        if self.draft.text.trim().is_empty() {
            return None;
        }
        let draft = std::mem::take(&mut self.draft);
        self.focus = Focus::Text;
        self.add(&draft.text, &draft.category, draft.deadline, draft.priority)
    }

    /// Puts a suggested category into the add form and focuses that field.
    pub fn select_category(&mut self, category: &str) {
        self.draft.category = category.to_string();
        self.focus = Focus::Category;
    }

    pub fn begin_edit(&mut self, id: &RecordId) {
        if self.get(id).is_some() {
            self.editing = Some(id.clone());
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replaces a todo's text. Blank text just leaves edit mode.
    pub fn edit_text(&mut self, id: &RecordId, new_text: &str) -> Option<RemoteJob<TodoOutcome>> {
        self.editing = None;
        let text = new_text.trim();
        if text.is_empty() {
            return None;
        }
        let Some(todo) = self.todos.iter_mut().find(|t| &t.id == id) else {
            log::debug!("Edit of unknown todo {} ignored", id);
            return None;
        };
        todo.text = text.to_string();
        Some(self.write(id, row([("text", json!(text))]), "edit"))
    }

    pub fn toggle_done(&mut self, id: &RecordId) -> Option<RemoteJob<TodoOutcome>> {
        let Some(todo) = self.todos.iter_mut().find(|t| &t.id == id) else {
            log::debug!("Toggle of unknown todo {} ignored", id);
            return None;
        };
        todo.done = !todo.done;
        let done = todo.done;
        Some(self.write(id, row([("done", json!(done))]), "toggle"))
    }

    /// Moves a todo into another category, e.g. when it is dropped on a group.
    pub fn recategorize(&mut self, id: &RecordId, new_category: &str) -> Option<RemoteJob<TodoOutcome>> {
        let category = match new_category.trim() {
            "" => UNCATEGORIZED,
            c => c,
        };
        let Some(todo) = self.todos.iter_mut().find(|t| &t.id == id) else {
            log::debug!("Recategorize of unknown todo {} ignored", id);
            return None;
        };
        todo.category = category.to_string();
        Some(self.write(id, row([("category", json!(category))]), "recategorize"))
    }

    /// Removes a todo. If the remote delete fails the todo comes back on the
    /// next load.
    pub fn remove(&mut self, id: &RecordId) -> Option<RemoteJob<TodoOutcome>> {
        let before = self.todos.len();
        self.todos.retain(|t| &t.id != id);
        if self.todos.len() == before {
            log::debug!("Removal of unknown todo {} ignored", id);
            return None;
        }
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        let backend = self.backend.clone();
        let id = id.clone();
        Some(
            async move {
                let result = backend.delete(Table::Todos, &id).await;
                TodoOutcome::Written {
                    action: "delete",
                    id,
                    result,
                }
            }
            .boxed(),
        )
    }

    /// Drops `moved` onto `target`'s slot, renumbers the whole list and
    /// writes every position back.
    pub fn reorder(&mut self, moved: &RecordId, target: &RecordId) -> Option<RemoteJob<TodoOutcome>> {
        let ordered = view::reordered(&self.todos, moved, target)?;
        self.todos = ordered.clone();
        let backend = self.backend.clone();
        let moved = moved.clone();
        Some(
            async move {
                let result = persist_positions(&backend, &ordered).await;
                TodoOutcome::Reordered { moved, result }
            }
            .boxed(),
        )
    }

    /// Applies the outcome of a finished job.
    pub fn on_remote(&mut self, outcome: TodoOutcome) {
        match outcome {
            TodoOutcome::Loaded(Ok(todos)) => {
                log::info!("Loaded {} todos", todos.len());
                self.todos = todos;
                self.status = ListStatus::Ready;
            }
            TodoOutcome::Loaded(Err(e)) => {
                log::error!("Failed to load todos: {}", e);
                self.todos.clear();
                self.status = ListStatus::Error(e.to_string());
            }
            TodoOutcome::Added { result: Ok(todo), .. } => {
                log::debug!("Added todo {} at position {}", todo.id, todo.position());
                self.todos.push(todo);
            }
            TodoOutcome::Added { text, result: Err(e) } => {
                log::error!("Failed to add todo {:?}: {}", text, e);
            }
            TodoOutcome::Written {
                action,
                id,
                result: Err(e),
            } => {
                log::error!("Failed to {} todo {}: {}", action, id, e);
            }
            TodoOutcome::Reordered { moved, result: Err(e) } => {
                log::error!("Failed to persist todo positions after moving {}: {}", moved, e);
            }
            TodoOutcome::Written { result: Ok(()), .. } | TodoOutcome::Reordered { result: Ok(()), .. } => {}
        }
    }

    /// Runs a job to the end and applies its outcome, for callers with nothing
    /// else to handle in the meantime.
    pub async fn complete(&mut self, job: impl Into<Option<RemoteJob<TodoOutcome>>>) {
        if let Some(job) = job.into() {
            let outcome = job.await;
            self.on_remote(outcome);
        }
    }

    fn write(&self, id: &RecordId, fields: Row, action: &'static str) -> RemoteJob<TodoOutcome> {
        let backend = self.backend.clone();
        let id = id.clone();
        async move {
            let result = backend.update(Table::Todos, fields, &id).await;
            TodoOutcome::Written { action, id, result }
        }
        .boxed()
    }
}
