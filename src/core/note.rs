use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

/// An entry in the chronological note log. Notes are never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    pub text: String,
    pub inserted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNote {
    pub text: String,
}

impl NewNote {
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self {
                text: text.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hosted_timestamp() {
        let note: Note = serde_json::from_value(serde_json::json!({
            "id": 3,
            "text": "call back",
            "inserted_at": "2026-02-14T09:30:00.123456+00:00"
        }))
        .unwrap();
        assert_eq!(note.id.as_str(), "3");
        assert_eq!(note.inserted_at.to_rfc3339(), "2026-02-14T09:30:00.123456+00:00");
    }

    #[test]
    fn blank_note_is_rejected() {
        assert!(NewNote::new(" \n\t").is_none());
        assert_eq!(NewNote::new(" hi ").unwrap().text, "hi");
    }
}
