pub mod memory;
pub mod ordering;
pub mod rest;

use std::fmt;
use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::RecordId;

/// A row as exchanged with the remote store: a JSON object keyed by column.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Remote tables the stores read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Todos,
    Notes,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected row shape: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("insert into {0} returned no row")]
    MissingRow(Table),
    #[error("{0}")]
    Rejected(String),
}

/// Row-level access to the hosted table service.
///
/// Each call is independent: there are no transactions, retries or
/// cancellation, and a failure is final for that call.
pub trait DataAccess {
    /// Every row of `table`, ordered by `order_column`.
    fn select_all(
        &self,
        table: Table,
        order_column: &str,
        ascending: bool,
    ) -> impl Future<Output = Result<Vec<Row>, RemoteError>> + Send;

    /// Creates a row and returns it as stored, including its assigned id.
    fn insert(
        &self,
        table: Table,
        fields: Row,
    ) -> impl Future<Output = Result<Row, RemoteError>> + Send;

    /// Overwrites the given columns of the row with id `id`.
    fn update(
        &self,
        table: Table,
        fields: Row,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn delete(
        &self,
        table: Table,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Serializes a payload struct into a row.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, RemoteError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(RemoteError::Rejected(format!(
            "expected an object payload, got {}",
            other
        ))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, RemoteError> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, RemoteError> {
    rows.into_iter().map(from_row).collect()
}

/// Builds a row from column/value pairs.
pub fn row<const N: usize>(fields: [(&str, serde_json::Value); N]) -> Row {
    fields
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}
