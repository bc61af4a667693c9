//! Table shapes returned by the model, parsed leniently.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// A single cell as the model wrote it.
///
/// The prompts ask for strings, but models regularly emit bare numbers,
/// booleans or `null`; anything structured is kept as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(Number),
    Text(String),
    Nested(Value),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Nested(v) => v.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

fn default_table_id() -> u32 {
    1
}

/// One table: optional header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    #[serde(default = "default_table_id")]
    pub table_id: u32,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<CellValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Vec<CellValue>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: String,
}

impl ExtractedTable {
    pub fn column_count(&self) -> usize {
        self.data
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// True when neither headers nor any data cell carry content.
    pub fn is_empty(&self) -> bool {
        self.headers.iter().all(CellValue::is_blank)
            && self.data.iter().flatten().all(CellValue::is_blank)
    }

    pub fn metadata_str(&self, key: &str) -> String {
        match self.metadata.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "unknown".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Accepts any JSON value where a string is expected.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Treats an explicit `null` like a missing value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
