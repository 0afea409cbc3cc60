use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use uuid::Uuid;

use super::{DataAccess, RemoteError, Row, Table};
use crate::core::RecordId;

/// The kind of call made against a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

/// A call as recorded by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Op,
    pub table: Table,
    pub id: Option<RecordId>,
    pub fields: Option<Row>,
}

#[derive(Default)]
struct State {
    tables: HashMap<Table, Vec<Row>>,
    calls: Vec<Call>,
    failing_ops: HashSet<Op>,
    failing_ids: HashSet<RecordId>,
}

/// Process-local table store with call recording and injectable failures.
///
/// Used for `--offline` runs and as the backend under test. Clones share
/// the same tables.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a row directly, bypassing call recording. A missing `id` is filled in.
    pub fn seed(&self, table: Table, mut fields: Row) -> RecordId {
        let id = ensure_id(&mut fields);
        self.state().tables.entry(table).or_default().push(fields);
        id
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.state().tables.get(&table).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Makes every subsequent call of `op` fail (or succeed again).
    pub fn set_failing(&self, op: Op, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing_ops.insert(op);
        } else {
            state.failing_ops.remove(&op);
        }
    }

    /// Makes updates and deletes addressed to `id` fail.
    pub fn fail_for_id(&self, id: RecordId) {
        self.state().failing_ids.insert(id);
    }

    fn record(&self, op: Op, table: Table, id: Option<&RecordId>, fields: Option<&Row>) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.push(Call {
            op,
            table,
            id: id.cloned(),
            fields: fields.cloned(),
        });
        if state.failing_ops.contains(&op) {
            return Err(RemoteError::Rejected(format!("{:?} on {} rejected", op, table)));
        }
        if let Some(id) = id {
            if state.failing_ids.contains(id) {
                return Err(RemoteError::Rejected(format!("{:?} of {} {} rejected", op, table, id)));
            }
        }
        Ok(())
    }
}

impl DataAccess for MemoryBackend {
    async fn select_all(
        &self,
        table: Table,
        order_column: &str,
        ascending: bool,
    ) -> Result<Vec<Row>, RemoteError> {
        self.record(Op::Select, table, None, None)?;
        let mut rows = self.rows(table);
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(order_column), b.get(order_column));
            if ascending { ord } else { ord.reverse() }
        });
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut fields: Row) -> Result<Row, RemoteError> {
        self.record(Op::Insert, table, None, Some(&fields))?;
        ensure_id(&mut fields);
        if table == Table::Notes && !fields.contains_key("inserted_at") {
            fields.insert(
                "inserted_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        self.state().tables.entry(table).or_default().push(fields.clone());
        Ok(fields)
    }

    async fn update(&self, table: Table, fields: Row, id: &RecordId) -> Result<(), RemoteError> {
        self.record(Op::Update, table, Some(id), Some(&fields))?;
        let mut state = self.state();
        let row = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r).as_ref() == Some(id)))
            .ok_or_else(|| RemoteError::Rejected(format!("no {} row with id {}", table, id)))?;
        for (column, value) in fields {
            row.insert(column, value);
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<(), RemoteError> {
        self.record(Op::Delete, table, Some(id), None)?;
        if let Some(rows) = self.state().tables.get_mut(&table) {
            rows.retain(|r| row_id(r).as_ref() != Some(id));
        }
        Ok(())
    }
}

fn row_id(row: &Row) -> Option<RecordId> {
    row.get("id")
        .and_then(|v| serde_json::from_value::<RecordId>(v.clone()).ok())
}

fn ensure_id(fields: &mut Row) -> RecordId {
    if let Some(id) = row_id(fields) {
        return id;
    }
    let id = Uuid::new_v4().to_string();
    fields.insert("id".to_string(), Value::String(id.clone()));
    RecordId::new(id)
}

/// Orders JSON column values the way a SQL `ORDER BY ... NULLS FIRST` would
/// for the types the tables hold.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
