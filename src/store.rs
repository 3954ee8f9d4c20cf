//! Asset Store - Read-Only Category Tables
//!
//! Tabular rows are loaded once per generation run and never mutated. The
//! store is constructed explicitly and passed by reference; there is no
//! process-wide cache.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::{CategorySchema, FieldValue, FieldWarning, WarningSeverity};

pub const DEFAULT_ASSET_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Characters,
    Poses,
    Orientations,
    Scenes,
    Wardrobe,
    Props,
    Lighting,
    Models,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Characters,
        Category::Poses,
        Category::Orientations,
        Category::Scenes,
        Category::Wardrobe,
        Category::Props,
        Category::Lighting,
        Category::Models,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Category::Characters => "characters.csv",
            Category::Poses => "poses.csv",
            Category::Orientations => "orientations.csv",
            Category::Scenes => "scenes.csv",
            Category::Wardrobe => "wardrobe.csv",
            Category::Props => "props.csv",
            Category::Lighting => "lighting_profiles.csv",
            Category::Models => "model_profiles.csv",
        }
    }

    /// Singular name used in spec fields and error messages.
    pub fn singular(self) -> &'static str {
        match self {
            Category::Characters => "character",
            Category::Poses => "pose",
            Category::Orientations => "orientation",
            Category::Scenes => "scene",
            Category::Wardrobe => "wardrobe",
            Category::Props => "props",
            Category::Lighting => "lighting",
            Category::Models => "model",
        }
    }

    /// Accepts plural, singular, and the matrix axis names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "characters" | "character" => Some(Category::Characters),
            "poses" | "pose" => Some(Category::Poses),
            "orientations" | "orientation" => Some(Category::Orientations),
            "scenes" | "scene" => Some(Category::Scenes),
            "wardrobe" => Some(Category::Wardrobe),
            "props" | "prop" => Some(Category::Props),
            "lighting" | "lighting_profiles" => Some(Category::Lighting),
            "models" | "model" | "model_profiles" => Some(Category::Models),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// One asset row: a field mapping with typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl AssetRecord {
    pub fn new(id: &str) -> Self {
        Self::default().with("id", id)
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn list(&self, field: &str) -> Vec<&str> {
        self.get(field).map(FieldValue::as_list).unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        self.text("id").unwrap_or("")
    }

    pub fn version(&self) -> &str {
        self.text("version")
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ASSET_VERSION)
    }

    /// Flattened descriptor, `None` when absent or empty.
    pub fn descriptor(&self) -> Option<String> {
        self.get("descriptor")
            .map(FieldValue::flatten)
            .filter(|d| !d.is_empty())
    }

    /// `id@version` reference used in bundle spec snapshots.
    pub fn reference(&self) -> String {
        format!("{}@{}", self.id(), self.version())
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }
}

/// Result of reading one tabular source.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    /// Whether the source file existed.
    pub found: bool,
    pub records: Vec<AssetRecord>,
    pub warnings: Vec<FieldWarning>,
}

/// Read a CSV source into typed records. A missing file is an empty table.
pub fn read_table(path: &Path, label: &str, schema: &CategorySchema) -> Result<LoadedTable> {
    if !path.exists() {
        debug!(path = %path.display(), category = label, "tabular source absent");
        return Ok(LoadedTable::default());
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut table = LoadedTable {
        found: true,
        ..LoadedTable::default()
    };

    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let mut record = AssetRecord::default();
        for (field, raw) in headers.iter().zip(row.iter()) {
            let (value, failure) = schema.coerce(field, raw);
            if let Some(reason) = failure {
                table.warnings.push(FieldWarning {
                    category: label.to_string(),
                    row: i + 1,
                    field: field.to_string(),
                    severity: WarningSeverity::Warning,
                    message: format!("Numeric coercion failed: {}", reason),
                    expected: Some(format!("{:?}", schema.field_type(field)).to_lowercase()),
                    actual: Some(raw.to_string()),
                });
            }
            record.fields.insert(field.to_string(), value);
        }

        if let Some(version) = record.text("version") {
            if !version.is_empty() && semver::Version::parse(version).is_err() {
                table.warnings.push(FieldWarning {
                    category: label.to_string(),
                    row: i + 1,
                    field: "version".to_string(),
                    severity: WarningSeverity::Info,
                    message: "Version is not a semantic version".to_string(),
                    expected: Some("MAJOR.MINOR.PATCH".to_string()),
                    actual: Some(version.to_string()),
                });
            }
        }

        table.records.push(record);
    }

    for w in &table.warnings {
        warn!(category = %w.category, row = w.row, field = %w.field, actual = ?w.actual, "{}", w.message);
    }

    Ok(table)
}

#[derive(Debug, Clone, Default)]
struct Table {
    records: Vec<AssetRecord>,
    index: HashMap<String, usize>,
}

impl Table {
    fn new(records: Vec<AssetRecord>) -> Self {
        // Later rows shadow earlier ones with the same id.
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().to_string(), i))
            .collect();
        Self { records, index }
    }
}

/// In-memory view of every category table for one generation run.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    root: PathBuf,
    tables: HashMap<Category, Table>,
    warnings: Vec<FieldWarning>,
}

impl AssetStore {
    /// Empty store rooted at `root`; categories are loaded on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load every category found under `root`.
    pub fn load_all(root: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(root);
        for category in Category::ALL {
            store.load(category)?;
        }
        Ok(store)
    }

    /// Load (or reload) one category from its source file.
    pub fn load(&mut self, category: Category) -> Result<&[AssetRecord]> {
        let path = self.root.join(category.file_name());
        let schema = CategorySchema::for_category(category);
        let loaded = read_table(&path, category.singular(), &schema)?;
        if loaded.found {
            debug!(category = %category, rows = loaded.records.len(), "loaded category");
        }
        self.warnings.extend(loaded.warnings);
        self.tables.insert(category, Table::new(loaded.records));
        Ok(self.list(category))
    }

    /// Replace a category with in-memory records.
    pub fn insert(&mut self, category: Category, records: Vec<AssetRecord>) {
        self.tables.insert(category, Table::new(records));
    }

    pub fn with(mut self, category: Category, records: Vec<AssetRecord>) -> Self {
        self.insert(category, records);
        self
    }

    pub fn list(&self, category: Category) -> &[AssetRecord] {
        self.tables
            .get(&category)
            .map(|t| t.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn find(&self, category: Category, id: &str) -> Option<&AssetRecord> {
        let table = self.tables.get(&category)?;
        table.index.get(id).map(|&i| &table.records[i])
    }

    pub fn first(&self, category: Category) -> Option<&AssetRecord> {
        self.list(category).first()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn warnings(&self) -> &[FieldWarning] {
        &self.warnings
    }
}
