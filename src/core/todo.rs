use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RecordId, null_as_default};

/// Category assigned when a todo is created with a blank category.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A todo row as held by the store and returned by the remote `todos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: RecordId,
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
    /// Rows written before ordering existed may carry no position.
    #[serde(default)]
    pub position: Option<i64>,
}

impl Todo {
    /// Order key, with a missing position read as 0.
    pub fn position(&self) -> i64 {
        self.position.unwrap_or(0)
    }

    /// Past its deadline and still open. A deadline of today is not overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.done {
            return false;
        }
        self.deadline.is_some_and(|deadline| deadline < today)
    }
}

/// Fields sent to the remote store when creating a todo; the id comes back
/// with the created row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTodo {
    pub text: String,
    pub category: String,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub done: bool,
    pub position: i64,
}

impl NewTodo {
    /// Builds a creation payload, or `None` when the text is blank.
    pub fn new(
        text: &str,
        category: &str,
        deadline: Option<NaiveDate>,
        priority: Priority,
        position: i64,
    ) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let category = match category.trim() {
            "" => UNCATEGORIZED.to_string(),
            c => c.to_string(),
        };
        Some(Self {
            text: text.to_string(),
            category,
            deadline,
            priority,
            done: false,
            position,
        })
    }
}

/// Next free position at the end of the list: one past the current maximum,
/// or 0 for an empty list. Stays at `i64::MAX` once the maximum is reached.
pub fn next_position(todos: &[Todo]) -> i64 {
    todos
        .iter()
        .map(Todo::position)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}
