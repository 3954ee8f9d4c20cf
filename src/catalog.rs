//! Chunk Catalog - Aggregate Over Every Defined Chunk
//!
//! A chunk whose component tables cannot be read is recorded as a failure
//! and contributes zero combinations; the build carries on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::bundle::{Bundle, BundleFactory};
use crate::chunk::{ChunkCombinationGenerator, ChunkDefinition, ChunkId, ComponentRef};
use crate::composer::PromptComposer;
use crate::error::Result;
use crate::resolver::ContextAssets;
use crate::skeleton::SkeletonRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_chunks: usize,
    pub film_bible_version: String,
    pub lexicon_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCombination {
    pub combination_id: String,
    pub permutation_index: usize,
    pub components: Vec<ComponentRef>,
    pub values: Vec<String>,
    pub assembled_text: String,
    pub prompt_bundle: Bundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogChunk {
    pub chunk_id: ChunkId,
    pub components: Vec<ComponentRef>,
    pub total_combinations: usize,
    pub combinations: Vec<CatalogCombination>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub chunk_id: ChunkId,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    pub chunks: BTreeMap<ChunkId, CatalogChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ChunkFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub total_chunks: usize,
    pub total_combinations: usize,
    pub chunk_breakdown: BTreeMap<ChunkId, usize>,
    pub average_combinations_per_chunk: f64,
    pub failed_chunks: Vec<ChunkFailure>,
}

#[derive(Debug, Serialize)]
struct CatalogRow<'a> {
    chunk_id: String,
    combination_id: &'a str,
    permutation_index: usize,
    components: String,
    values: String,
    assembled_text: &'a str,
}

impl Catalog {
    pub fn total_combinations(&self) -> usize {
        self.chunks.values().map(|c| c.total_combinations).sum()
    }

    pub fn summary(&self) -> CatalogSummary {
        let total = self.total_combinations();
        let average = if self.chunks.is_empty() {
            0.0
        } else {
            total as f64 / self.chunks.len() as f64
        };
        CatalogSummary {
            total_chunks: self.chunks.len(),
            total_combinations: total,
            chunk_breakdown: self
                .chunks
                .iter()
                .map(|(id, c)| (*id, c.total_combinations))
                .collect(),
            average_combinations_per_chunk: average,
            failed_chunks: self.failures.clone(),
        }
    }

    /// One row per combination. Returns rows written.
    pub fn write_csv(&self, path: &Path) -> Result<usize> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut rows = 0;
        for chunk in self.chunks.values() {
            for combo in &chunk.combinations {
                writer.serialize(CatalogRow {
                    chunk_id: chunk.chunk_id.to_string(),
                    combination_id: &combo.combination_id,
                    permutation_index: combo.permutation_index,
                    components: join_components(&combo.components),
                    values: combo.values.join("|"),
                    assembled_text: &combo.assembled_text,
                })?;
                rows += 1;
            }
        }
        writer.flush()?;
        Ok(rows)
    }
}

fn join_components(components: &[ComponentRef]) -> String {
    components
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

pub struct CatalogBuilder<'a> {
    tenner_dir: &'a Path,
    skeletons: &'a SkeletonRegistry,
    composer: &'a PromptComposer,
    factory: &'a BundleFactory,
    context: ContextAssets<'a>,
    lexicon_version: String,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(
        tenner_dir: &'a Path,
        skeletons: &'a SkeletonRegistry,
        composer: &'a PromptComposer,
        factory: &'a BundleFactory,
        context: ContextAssets<'a>,
    ) -> Self {
        Self {
            tenner_dir,
            skeletons,
            composer,
            factory,
            context,
            lexicon_version: factory.lexicon_version().to_string(),
        }
    }

    pub fn build(&self, definitions: &[ChunkDefinition]) -> Catalog {
        let mut chunks = BTreeMap::new();
        let mut failures = Vec::new();

        for chunk in definitions {
            let entry = match self.build_chunk(chunk) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(chunk = %chunk.id, error = %e, "chunk failed, contributing no combinations");
                    failures.push(ChunkFailure {
                        chunk_id: chunk.id,
                        error: e.to_string(),
                    });
                    CatalogChunk {
                        chunk_id: chunk.id,
                        components: chunk.components.clone(),
                        total_combinations: 0,
                        combinations: vec![],
                    }
                }
            };
            info!(chunk = %chunk.id, combinations = entry.total_combinations, "cataloged chunk");
            chunks.insert(chunk.id, entry);
        }

        Catalog {
            metadata: CatalogMetadata {
                generated_at: Utc::now(),
                total_chunks: definitions.len(),
                film_bible_version: self.factory.film_bible_version().to_string(),
                lexicon_version: self.lexicon_version.clone(),
            },
            chunks,
            failures,
        }
    }

    fn build_chunk(&self, chunk: &ChunkDefinition) -> Result<CatalogChunk> {
        let generator = ChunkCombinationGenerator::load(chunk, self.tenner_dir, self.skeletons)?;
        let mut combinations = Vec::new();
        for combo in generator.iter() {
            let prompt_bundle = combo.to_bundle(chunk, self.composer, self.factory, &self.context)?;
            combinations.push(CatalogCombination {
                combination_id: combo.combination_id(chunk.id),
                permutation_index: combo.permutation_index,
                components: chunk.components.clone(),
                values: combo.values,
                assembled_text: combo.assembled_text,
                prompt_bundle,
            });
        }
        Ok(CatalogChunk {
            chunk_id: chunk.id,
            components: chunk.components.clone(),
            total_combinations: combinations.len(),
            combinations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenner::TennerNumber;
    use std::fs;

    fn write_tenner(dir: &Path, n: u8, blank: Option<usize>) {
        let mut csv = String::from("id,version,descriptor\n");
        for i in 0..10 {
            let descriptor = if Some(i) == blank { String::new() } else { format!("t{}v{}", n, i) };
            csv.push_str(&format!("tenner_{:02}_{:02},1.0.0,{}\n", n, i, descriptor));
        }
        fs::write(dir.join(TennerNumber(n).file_name()), csv).unwrap();
    }

    #[test]
    fn test_failed_chunk_contributes_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_tenner(dir.path(), 1, None);
        write_tenner(dir.path(), 2, Some(4));

        let definitions = vec![
            ChunkDefinition::new(ChunkId(1), vec![TennerNumber(1), TennerNumber(2)]),
            ChunkDefinition::new(ChunkId(2), vec![TennerNumber(1), TennerNumber(9)]),
        ];
        let skeletons = SkeletonRegistry::new();
        let composer = PromptComposer::new("FB");
        let factory = BundleFactory::default();
        let catalog = CatalogBuilder::new(
            dir.path(),
            &skeletons,
            &composer,
            &factory,
            ContextAssets::default(),
        )
        .build(&definitions);

        let summary = catalog.summary();
        assert_eq!(summary.total_chunks, 2);
        assert_eq!(summary.total_combinations, 90);
        assert_eq!(summary.chunk_breakdown[&ChunkId(2)], 0);
        assert_eq!(summary.average_combinations_per_chunk, 45.0);
        assert_eq!(summary.failed_chunks.len(), 1);
        assert_eq!(summary.failed_chunks[0].chunk_id, ChunkId(2));

        let first = &catalog.chunks[&ChunkId(1)].combinations[0];
        assert_eq!(first.prompt_bundle.id, format!("chunk_{}", first.combination_id));

        let csv_path = dir.path().join("catalog.csv");
        assert_eq!(catalog.write_csv(&csv_path).unwrap(), 90);
        let text = fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with(
            "chunk_id,combination_id,permutation_index,components,values,assembled_text\n"
        ));
        assert!(text.contains("CHUNK1,chunk1_perm_000,0,T1|T2,t1v0|t2v0,t1v0 t2v0"));
    }
}
