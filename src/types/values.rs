use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FillError, Result};
use crate::types::grid::format_number;

/// A raw value collected for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Empty or whitespace-only text. `0` and `false` are real values.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// `true`, `"true"`, `"X"` and `1` count as checked.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => (*n - 1.0).abs() < f64::EPSILON,
            Self::Text(s) => {
                let t = s.trim();
                t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("x") || t == "1"
            }
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.trim().to_string(),
        }
    }

    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// A value plus its completion flag as collected by the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    pub field_id: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub completed: bool,
}

impl FieldValue {
    /// The value to write, if any: completed, present and non-blank.
    pub fn writable(&self) -> Option<&Value> {
        if !self.completed {
            return None;
        }
        self.value.as_ref().filter(|v| !v.is_blank())
    }
}

/// All values for one fill, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues {
    map: BTreeMap<String, FieldValue>,
}

#[derive(Deserialize)]
struct FormData {
    #[serde(default)]
    sheets: Vec<SheetData>,
}

#[derive(Deserialize)]
struct SheetData {
    #[serde(default)]
    sections: Vec<SectionData>,
}

#[derive(Deserialize)]
struct SectionData {
    #[serde(default)]
    fields: Vec<RawFieldData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFieldData {
    field_id: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    completed: bool,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed value.
    pub fn set(&mut self, field_id: impl Into<String>, value: impl Into<Value>) {
        let field_id = field_id.into();
        self.map.insert(
            field_id.clone(),
            FieldValue {
                field_id,
                value: Some(value.into()),
                completed: true,
            },
        );
    }

    pub fn insert(&mut self, value: FieldValue) {
        self.map.insert(value.field_id.clone(), value);
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.map.get(field_id)
    }

    /// The value for `field_id` if it should be written.
    pub fn writable(&self, field_id: &str) -> Option<&Value> {
        self.map.get(field_id).and_then(FieldValue::writable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.map.values()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Nested wizard form data: `sheets[].sections[].fields[] {fieldId, value, completed}`.
    ///
    /// Values that are not scalars (arrays, objects) are kept as absent.
    pub fn from_form_data_json(json: &str) -> Result<Self> {
        let data: FormData = serde_json::from_str(json)?;
        let mut values = Self::new();
        for field in data
            .sheets
            .into_iter()
            .flat_map(|s| s.sections)
            .flat_map(|s| s.fields)
        {
            values.insert(FieldValue {
                field_id: field.field_id,
                value: Value::from_json(field.value),
                completed: field.completed,
            });
        }
        Ok(values)
    }

    /// Flat `{ "field_id": value }` object; every present entry is completed.
    pub fn from_flat_json(json: &str) -> Result<Self> {
        let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut values = Self::new();
        for (field_id, raw) in map {
            let value = Value::from_json(raw);
            values.insert(FieldValue {
                completed: value.is_some(),
                field_id,
                value,
            });
        }
        Ok(values)
    }

    /// Accept either shape, choosing by the presence of a top-level `sheets` array.
    pub fn from_json(json: &str) -> Result<Self> {
        let probe: serde_json::Value = serde_json::from_str(json)?;
        match probe.get("sheets") {
            Some(serde_json::Value::Array(_)) => Self::from_form_data_json(json),
            Some(_) => Err(FillError::Parse("'sheets' must be an array".to_string())),
            None => Self::from_flat_json(json),
        }
    }
}
