//! Skeleton Templates - Semantic Chunk Text
//!
//! A skeleton is a text pattern with `<Tn>` placeholders, registered under a
//! strict [`ChunkId`] key.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::chunk::ChunkId;
use crate::error::Result;

/// Column that names the skeleton in the legacy row format.
const LEGACY_ID_COLUMN: &str = "SKELETON_1";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkeletonSource {
    Map(HashMap<String, String>),
    Rows(Vec<SourceRow>),
}

/// One legacy row with its columns in file order.
#[derive(Debug)]
struct SourceRow(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for SourceRow {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = SourceRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a skeleton row object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<SourceRow, A::Error> {
                let mut columns = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    columns.push(entry);
                }
                Ok(SourceRow(columns))
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Skeleton registry - loads and holds chunk templates
#[derive(Debug, Clone, Default)]
pub struct SkeletonRegistry {
    templates: HashMap<ChunkId, String>,
}

impl SkeletonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load skeletons from a JSON file. A missing file is an empty registry.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut registry = Self::new();
        if !path.exists() {
            debug!(path = %path.display(), "no skeleton source");
            return Ok(registry);
        }
        let content = fs::read_to_string(path)?;
        match serde_json::from_str::<SkeletonSource>(&content)? {
            SkeletonSource::Map(map) => {
                for (key, template) in map {
                    registry.register_key(&key, template);
                }
            }
            SkeletonSource::Rows(rows) => {
                for row in rows {
                    registry.register_row(&row);
                }
            }
        }
        debug!(count = registry.templates.len(), "loaded skeletons");
        Ok(registry)
    }

    fn register_key(&mut self, key: &str, template: String) {
        match key.parse::<ChunkId>() {
            Ok(id) => self.register(id, template),
            Err(_) => warn!(key, "ignoring skeleton with unrecognised key"),
        }
    }

    /// The template is the last non-empty text column after the id column.
    fn register_row(&mut self, row: &SourceRow) {
        let Some(key) = row
            .0
            .iter()
            .find(|(column, _)| column == LEGACY_ID_COLUMN)
            .and_then(|(_, v)| v.as_str())
        else {
            return;
        };
        let template = row
            .0
            .iter()
            .filter(|(column, _)| !column.starts_with(LEGACY_ID_COLUMN))
            .filter_map(|(_, v)| v.as_str())
            .filter(|t| !t.trim().is_empty())
            .last();
        if let Some(template) = template {
            self.register_key(key, template.to_string());
        }
    }

    pub fn register(&mut self, id: ChunkId, template: impl Into<String>) {
        self.templates.insert(id, template.into());
    }

    pub fn get(&self, id: ChunkId) -> Option<&str> {
        self.templates.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_rows_with_inconsistent_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skeletons.json");
        fs::write(
            &path,
            r#"[
                {"SKELETON_1": "SKELETON_1", "template": "A <T1> with <T2>"},
                {"SKELETON_1": "SKELETON _2", "template": "<T3> near <T4>"},
                {"SKELETON_1": "", "template": "orphan"}
            ]"#,
        )
        .unwrap();

        let registry = SkeletonRegistry::load_from_file(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(ChunkId(1)), Some("A <T1> with <T2>"));
        assert_eq!(registry.get(ChunkId(2)), Some("<T3> near <T4>"));
    }

    #[test]
    fn test_legacy_row_keeps_last_template_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skeletons.json");
        fs::write(
            &path,
            r#"[{"SKELETON_1": "SKELETON_1", "zeta": "first <T1>", "alpha": "second <T1>", "note": ""}]"#,
        )
        .unwrap();

        let registry = SkeletonRegistry::load_from_file(&path).unwrap();
        assert_eq!(registry.get(ChunkId(1)), Some("second <T1>"));
    }

    #[test]
    fn test_map_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skeletons.json");
        fs::write(&path, r#"{"CHUNK12": "<T1>", "CHUNK 3": "<T2>"}"#).unwrap();

        let registry = SkeletonRegistry::load_from_file(&path).unwrap();
        assert_eq!(registry.get(ChunkId(12)), Some("<T1>"));
        assert_eq!(registry.get(ChunkId(3)), Some("<T2>"));
        assert!(registry.get(ChunkId(1)).is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let registry = SkeletonRegistry::load_from_file(Path::new("/nonexistent/s.json")).unwrap();
        assert!(registry.is_empty());
    }
}
