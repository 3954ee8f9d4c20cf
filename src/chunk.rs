//! Chunk Combinations - Products Over Tenner Components
//!
//! A chunk names a few numbered Tenners. Every product tuple of their first
//! ten descriptors is a combination; tuples holding an empty descriptor are
//! skipped but keep their place in the index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::bundle::{
    reference_or_default, Bundle, BundleDraft, BundleFactory, BundleId, BundleMetadata, Extension,
    SpecSnapshot,
};
use crate::composer::{camera_framing, PromptComposer};
use crate::error::{EngineError, Result};
use crate::resolver::ContextAssets;
use crate::skeleton::SkeletonRegistry;
use crate::store::AssetRecord;
use crate::tenner::TennerNumber;

/// Components of a chunk are numbered Tenners.
pub type ComponentRef = TennerNumber;

const CHUNK_ID_KEY: &str = "CHUNK ID";
const COMPONENT_PREFIXES: [&str; 2] = ["tenner_component", "tenner_componenet"];

/// Integer chunk key. Parses `CHUNK12`, `CHUNK 12`, `SKELETON_12` and
/// `SKELETON _12`; always renders as `CHUNK12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkId(pub u32);

impl ChunkId {
    /// Lower-case form used in bundle ids, e.g. `chunk12`.
    pub fn slug(self) -> String {
        format!("chunk{}", self.0)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CHUNK{}", self.0)
    }
}

impl FromStr for ChunkId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let rest = upper
            .strip_prefix("CHUNK")
            .or_else(|| upper.strip_prefix("SKELETON"))
            .ok_or_else(|| EngineError::InvalidChunkId(s.to_string()))?;
        rest.trim_start_matches(|c: char| c == ' ' || c == '_')
            .parse::<u32>()
            .map(ChunkId)
            .map_err(|_| EngineError::InvalidChunkId(s.to_string()))
    }
}

impl TryFrom<String> for ChunkId {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ChunkId> for String {
    fn from(id: ChunkId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDefinition {
    pub id: ChunkId,
    pub components: Vec<ComponentRef>,
}

impl ChunkDefinition {
    pub fn new(id: ChunkId, components: Vec<ComponentRef>) -> Self {
        Self { id, components }
    }

    /// Parse one definition object. Component keys are ordered by their
    /// numeric suffix; empty values are skipped.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| EngineError::InvalidChunkId(value.to_string()))?;
        let id: ChunkId = object
            .get(CHUNK_ID_KEY)
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::InvalidChunkId(value.to_string()))?
            .parse()?;

        let mut keyed = Vec::new();
        for (key, v) in object {
            let Some(suffix) = COMPONENT_PREFIXES.iter().find_map(|p| key.strip_prefix(*p)) else {
                continue;
            };
            let Some(raw) = v.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let order = suffix
                .trim_start_matches('_')
                .parse::<u32>()
                .unwrap_or(0);
            keyed.push((order, raw.parse::<ComponentRef>()?));
        }
        keyed.sort_by_key(|&(order, _)| order);

        Ok(Self {
            id,
            components: keyed.into_iter().map(|(_, c)| c).collect(),
        })
    }
}

/// Read chunk definitions from a JSON list. A missing file is fatal.
pub fn load_definitions(path: &Path) -> Result<Vec<ChunkDefinition>> {
    if !path.exists() {
        return Err(EngineError::missing_source("chunks", path));
    }
    let content = fs::read_to_string(path)?;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&content)?;
    rows.iter().map(ChunkDefinition::from_json).collect()
}

/// Definitions matching `ids`, in request order. Unknown ids are returned
/// separately.
pub fn select_definitions<'a>(
    definitions: &'a [ChunkDefinition],
    ids: &[ChunkId],
) -> (Vec<&'a ChunkDefinition>, Vec<ChunkId>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for &id in ids {
        match definitions.iter().find(|d| d.id == id) {
            Some(d) => found.push(d),
            None => missing.push(id),
        }
    }
    (found, missing)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkCombination {
    /// Raw index into the component product.
    pub permutation_index: usize,
    pub values: Vec<String>,
    pub assembled_text: String,
}

#[derive(Debug, Clone)]
pub struct ChunkCombinationGenerator<'a> {
    chunk: &'a ChunkDefinition,
    columns: Vec<Vec<String>>,
    skeleton: Option<&'a str>,
}

impl<'a> ChunkCombinationGenerator<'a> {
    pub fn new(chunk: &'a ChunkDefinition, columns: Vec<Vec<String>>, skeleton: Option<&'a str>) -> Self {
        Self {
            chunk,
            columns,
            skeleton,
        }
    }

    /// Load every component column from `tenner_dir`. Any missing component
    /// table fails the whole chunk.
    pub fn load(
        chunk: &'a ChunkDefinition,
        tenner_dir: &Path,
        skeletons: &'a SkeletonRegistry,
    ) -> Result<Self> {
        let columns = chunk
            .components
            .iter()
            .map(|c| c.load_column(tenner_dir))
            .collect::<Result<Vec<_>>>()?;
        debug!(chunk = %chunk.id, components = columns.len(), "loaded chunk columns");
        Ok(Self::new(chunk, columns, skeletons.get(chunk.id)))
    }

    pub fn chunk(&self) -> &ChunkDefinition {
        self.chunk
    }

    /// Size of the raw product, before skipping.
    pub fn space(&self) -> usize {
        if self.columns.is_empty() {
            return 0;
        }
        self.columns.iter().map(Vec::len).product()
    }

    /// Lazily yield non-degenerate combinations, last component fastest.
    pub fn iter(&self) -> impl Iterator<Item = ChunkCombination> + '_ {
        (0..self.space()).filter_map(move |i| self.combination(i))
    }

    /// The combination at raw index `index`, or `None` if skipped.
    pub fn combination(&self, index: usize) -> Option<ChunkCombination> {
        if index >= self.space() {
            return None;
        }
        let mut rest = index;
        let mut picks = vec![0; self.columns.len()];
        for (slot, column) in picks.iter_mut().zip(&self.columns).rev() {
            *slot = rest % column.len();
            rest /= column.len();
        }

        let values: Vec<String> = picks
            .iter()
            .zip(&self.columns)
            .map(|(&i, column)| column[i].clone())
            .collect();
        if values.iter().any(|v| v.is_empty()) {
            return None;
        }

        Some(ChunkCombination {
            permutation_index: index,
            assembled_text: self.render(&values),
            values,
        })
    }

    fn render(&self, values: &[String]) -> String {
        match self.skeleton {
            Some(template) => {
                let slots: Vec<(String, &str)> = self
                    .chunk
                    .components
                    .iter()
                    .map(|c| c.placeholder())
                    .zip(values.iter().map(String::as_str))
                    .collect();
                fill_placeholders(template, &slots)
            }
            None => values.join(" "),
        }
    }
}

/// Replace each `<Tn>` in one left-to-right pass. Inserted values are never
/// rescanned; unknown placeholders stay as written.
fn fill_placeholders(template: &str, slots: &[(String, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match slots.iter().find(|(p, _)| tail.starts_with(p.as_str())) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_id: ChunkId,
    pub components: Vec<ComponentRef>,
    pub chunk_values: Vec<String>,
    pub permutation_index: usize,
}

impl ChunkCombination {
    pub fn combination_id(&self, chunk: ChunkId) -> String {
        format!("{}_perm_{:03}", chunk.slug(), self.permutation_index)
    }

    pub fn to_bundle(
        &self,
        chunk: &ChunkDefinition,
        composer: &PromptComposer,
        factory: &BundleFactory,
        context: &ContextAssets<'_>,
    ) -> Result<Bundle> {
        let combination_id = self.combination_id(chunk.id);

        let prompt_text = composer.compose_parts(
            [
                context.pose_descriptor(),
                Some(self.assembled_text.clone()),
                context.scene_descriptor(),
                context.lighting_descriptor(),
            ]
            .into_iter()
            .flatten(),
            camera_framing(context.scene).as_deref(),
            None,
        );

        let spec = SpecSnapshot {
            film_bible: factory.film_bible_version().to_string(),
            character: format!("{}@1.0.0", combination_id),
            pose: reference_or_default(context.pose),
            orientation: None,
            wardrobe: vec![],
            props: vec![],
            scene: reference_or_default(context.scene),
            lighting: reference_or_default(context.lighting),
            model: context.model.map(AssetRecord::reference),
            camera_override: None,
        };

        let mut tags = vec![chunk.id.slug(), "chunk".to_string()];
        tags.extend(chunk.components.iter().map(|c| format!("tenner_{}", c.0)));

        factory.assemble(BundleDraft {
            id: BundleId::Indexed(format!("chunk_{}", combination_id)),
            spec,
            prompt_text,
            model: context.model,
            metadata: BundleMetadata::pending(
                format!("{} chunk with {} components", chunk.id, self.values.len()),
                tags,
                "Generated by Tenner Chunking System",
            ),
            extension: Extension::Chunk(ChunkMetadata {
                chunk_id: chunk.id,
                components: chunk.components.clone(),
                chunk_values: self.values.clone(),
                permutation_index: self.permutation_index,
            }),
        })
    }
}
