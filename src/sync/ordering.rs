use futures::future::join_all;
use serde_json::json;

use super::{DataAccess, RemoteError, Table, row};
use crate::core::todo::Todo;

/// Writes every todo's position to the remote store.
///
/// One update per todo, all in flight at once and awaited together. There is
/// no transaction around the batch: the writes that succeed stay written, and
/// only the first failure (in list order) is returned.
pub async fn persist_positions<B: DataAccess>(
    backend: &B,
    ordered: &[Todo],
) -> Result<(), RemoteError> {
    let writes = ordered.iter().map(|todo| {
        backend.update(
            Table::Todos,
            row([("position", json!(todo.position()))]),
            &todo.id,
        )
    });

    let results = join_all(writes).await;
    let failed = results.iter().filter(|r| r.is_err()).count();
    log::debug!(
        "Persisted {} positions, {} failed",
        results.len() - failed,
        failed
    );

    match results.into_iter().find_map(Result::err) {
        Some(first) => Err(first),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordId;
    use crate::core::view::reordered;
    use crate::sync::memory::{MemoryBackend, Op};
    use crate::sync::from_rows;

    async fn seeded(ids: &[&str]) -> (MemoryBackend, Vec<Todo>) {
        let backend = MemoryBackend::new();
        for (i, id) in ids.iter().enumerate() {
            backend.seed(
                Table::Todos,
                row([
                    ("id", json!(id)),
                    ("text", json!(format!("item {}", id))),
                    ("category", json!("uncategorized")),
                    ("position", json!(i)),
                ]),
            );
        }
        let rows = backend.select_all(Table::Todos, "position", true).await.unwrap();
        let todos: Vec<Todo> = from_rows(rows).unwrap();
        backend.clear_calls();
        (backend, todos)
    }

    #[tokio::test]
    async fn writes_one_update_per_todo() {
        let (backend, todos) = seeded(&["a", "b", "c"]).await;
        let ordered = reordered(&todos, &"c".into(), &"a".into()).unwrap();

        persist_positions(&backend, &ordered).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.op == Op::Update));

        let rows = backend.select_all(Table::Todos, "position", true).await.unwrap();
        let stored: Vec<Todo> = from_rows(rows).unwrap();
        let order: Vec<&str> = stored.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn reports_first_failure_but_keeps_other_writes() {
        let (backend, todos) = seeded(&["a", "b", "c"]).await;
        backend.fail_for_id(RecordId::from("a"));
        backend.fail_for_id(RecordId::from("b"));
        let ordered = reordered(&todos, &"c".into(), &"a".into()).unwrap();

        let err = persist_positions(&backend, &ordered).await.unwrap_err();
        assert!(err.to_string().contains(" a "), "unexpected error: {}", err);

        let c = backend
            .rows(Table::Todos)
            .into_iter()
            .find(|r| r["id"] == json!("c"))
            .unwrap();
        assert_eq!(c["position"], json!(0));
    }

    #[tokio::test]
    async fn empty_list_makes_no_calls() {
        let backend = MemoryBackend::new();
        persist_positions(&backend, &[]).await.unwrap();
        assert!(backend.calls().is_empty());
    }
}
