pub mod category;
pub mod note;
pub mod todo;
pub mod view;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque row identifier assigned by the remote store.
///
/// Hosted tables hand these out either as integers (identity columns) or as
/// strings (uuid columns). Both compare by their text; serialization writes an
/// id back in the JSON kind it arrived in.
#[derive(Debug, Clone)]
pub struct RecordId {
    text: String,
    int: Option<i64>,
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            text: id.into(),
            int: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self {
            text: n.to_string(),
            int: Some(n),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.int {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self::from(n),
            RawId::Text(s) => Self::new(s),
        })
    }
}

/// Reads an explicit JSON `null` the same as a missing column.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_text_ids_deserialize() {
        let int: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(int.as_str(), "42");

        let text: RecordId = serde_json::from_str("\"0b5c-77\"").unwrap();
        assert_eq!(text.as_str(), "0b5c-77");
    }

    #[test]
    fn ids_are_written_back_in_their_original_kind() {
        let int: RecordId = serde_json::from_str("7").unwrap();
        assert_eq!(serde_json::to_string(&int).unwrap(), "7");

        let padded: RecordId = serde_json::from_str("\"007\"").unwrap();
        assert_eq!(serde_json::to_string(&padded).unwrap(), "\"007\"");

        assert_eq!(serde_json::to_string(&RecordId::from("7")).unwrap(), "\"7\"");
    }

    #[test]
    fn integer_and_text_forms_of_an_id_are_equal() {
        let int: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(int, RecordId::from("42"));
        assert_ne!(int, RecordId::from("042"));
    }
}
