//! Field Schema - Typed Row Coercion
//!
//! Every category declares the type of its non-text fields. Cells are coerced
//! at load time; a cell that fails to coerce keeps its text and produces a
//! structured warning instead of passing through silently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::Category;

/// Separator for multi-valued cells.
pub const LIST_DELIMITER: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    List,
    Int,
    Float,
}

/// A coerced cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// View as an ordered list. A single text value is a one-element list.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
            FieldValue::Text(s) if !s.trim().is_empty() => vec![s.as_str()],
            _ => vec![],
        }
    }

    /// Flatten to prompt text; lists are joined with a single space.
    pub fn flatten(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(" "),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Int(_) | FieldValue::Float(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Warning,
    Info,
}

/// A coercion problem recorded while loading a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldWarning {
    pub category: String,
    /// 1-based data row.
    pub row: usize,
    pub field: String,
    pub severity: WarningSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Field types for one category. Unlisted fields are text.
#[derive(Debug, Clone, Default)]
pub struct CategorySchema {
    fields: BTreeMap<&'static str, FieldType>,
}

impl CategorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &'static str, field_type: FieldType) -> Self {
        self.fields.insert(name, field_type);
        self
    }

    pub fn field_type(&self, name: &str) -> FieldType {
        self.fields.get(name).copied().unwrap_or(FieldType::Text)
    }

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Characters => Self::new().with_field("anthro_ratio", FieldType::Float),
            Category::Poses => Self::new().with_field("wardrobe_zones_allowed", FieldType::List),
            Category::Orientations => Self::new().with_field("rotation_deg", FieldType::Float),
            Category::Wardrobe => Self::new().with_field("zones", FieldType::List),
            Category::Lighting => Self::new()
                .with_field("temperature_K", FieldType::Int)
                .with_field("key_dir_deg", FieldType::Float),
            Category::Models => Self::new()
                .with_field("steps", FieldType::Int)
                .with_field("cfg", FieldType::Float),
            Category::Scenes | Category::Props => Self::new(),
        }
    }

    /// Coerce one raw cell. Returns the value and, on a failed numeric
    /// parse, the reason.
    pub fn coerce(&self, field: &str, raw: &str) -> (FieldValue, Option<String>) {
        let field_type = self.field_type(field);

        if raw.contains(LIST_DELIMITER) || field_type == FieldType::List {
            return (FieldValue::List(split_list(raw)), None);
        }

        match field_type {
            FieldType::Int => match raw.trim().parse::<i64>() {
                Ok(v) => (FieldValue::Int(v), None),
                Err(e) => (FieldValue::Text(raw.to_string()), Some(e.to_string())),
            },
            FieldType::Float => match raw.trim().parse::<f64>() {
                Ok(v) => (FieldValue::Float(v), None),
                Err(e) => (FieldValue::Text(raw.to_string()), Some(e.to_string())),
            },
            FieldType::Text | FieldType::List => (FieldValue::Text(raw.to_string()), None),
        }
    }
}

/// Split a multi-valued cell into trimmed non-empty parts.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
