//! Assembly Pipeline - Single Entry Point
//!
//! Every bundle, whatever generator produced the work item, is built from
//! one store snapshot, one composer and one factory. Per-item failures are
//! collected into a [`BatchReport`]; they never abort the batch.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::bundle::{Bundle, BundleFactory, BundleId};
use crate::chunk::ChunkDefinition;
use crate::chunk::ChunkCombinationGenerator;
use crate::composer::PromptComposer;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::matrix::{AssetFilter, MatrixGenerator};
use crate::resolver::{resolve, ContextAssets};
use crate::skeleton::SkeletonRegistry;
use crate::spec::{Spec, SpecDocument, SpecEnvelope};
use crate::store::{AssetStore, Category};
use crate::tenner::{individual_bundles, TennerGenerator, TennerNumber};

/// One work item that did not produce a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// Destination for bundles as they are assembled. Drivers hand each bundle
/// over immediately and keep only counts.
pub trait BundleSink {
    fn accept(&mut self, bundle: Bundle) -> Result<()>;
}

/// Collects bundles in memory.
impl BundleSink for Vec<Bundle> {
    fn accept(&mut self, bundle: Bundle) -> Result<()> {
        self.push(bundle);
        Ok(())
    }
}

/// Writes each bundle as pretty JSON named `{id}.json`.
#[derive(Debug)]
pub struct BundleWriter {
    dir: PathBuf,
    written: usize,
}

impl BundleWriter {
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl BundleSink for BundleWriter {
    fn accept(&mut self, bundle: Bundle) -> Result<()> {
        let path = self.dir.join(format!("{}.json", bundle.id));
        fs::write(&path, serde_json::to_string_pretty(&bundle)?)?;
        self.written += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    converted: usize,
    pub failures: Vec<ItemFailure>,
}

/// Counts reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub converted: usize,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.converted
    }

    pub fn errors(&self) -> usize {
        self.failures.len()
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.converted == 0 && !self.failures.is_empty()
    }

    /// Hand a built bundle to `sink`; a build or sink error fails the item.
    pub fn record<S: BundleSink + ?Sized>(
        &mut self,
        item: impl Into<String>,
        outcome: Result<Bundle>,
        sink: &mut S,
    ) {
        let item = item.into();
        let delivered = outcome.and_then(|bundle| {
            debug!(id = %bundle.id, "assembled bundle");
            sink.accept(bundle)
        });
        match delivered {
            Ok(()) => self.converted += 1,
            Err(e) => self.fail(item, &e),
        }
    }

    pub fn fail(&mut self, item: impl Into<String>, e: &EngineError) {
        let item = item.into();
        error!(item = %item, error = %e, "work item failed");
        self.failures.push(ItemFailure {
            item,
            error: e.to_string(),
        });
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.converted += other.converted;
        self.failures.extend(other.failures);
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            converted: self.converted(),
            errors: self.errors(),
            failures: self.failures.clone(),
        }
    }
}

/// Filters for direct assembly from the store. Wardrobe `none` assembles
/// without wardrobe; otherwise each pose gets its compatible filtered items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblySelection {
    pub characters: AssetFilter,
    pub poses: AssetFilter,
    pub scenes: AssetFilter,
    pub wardrobe: AssetFilter,
}

impl Default for AssemblySelection {
    fn default() -> Self {
        Self {
            characters: AssetFilter::All,
            poses: AssetFilter::All,
            scenes: AssetFilter::All,
            wardrobe: AssetFilter::None,
        }
    }
}

/// The assembly pipeline - single entry point for bundle construction
pub struct AssemblyPipeline {
    store: AssetStore,
    composer: PromptComposer,
    factory: BundleFactory,
}

impl AssemblyPipeline {
    pub fn new(store: AssetStore, composer: PromptComposer, factory: BundleFactory) -> Self {
        Self {
            store,
            composer,
            factory,
        }
    }

    /// Load the store, film bible and versions described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let store = AssetStore::load_all(&config.data_dir)?;
        let composer = PromptComposer::new(config.film_bible_text()?);
        let factory = BundleFactory::from_config(config);
        info!(
            data_dir = %config.data_dir.display(),
            warnings = store.warnings().len(),
            "pipeline ready"
        );
        Ok(Self::new(store, composer, factory))
    }

    pub fn with_factory(mut self, factory: BundleFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    pub fn factory(&self) -> &BundleFactory {
        &self.factory
    }

    pub fn context(&self) -> ContextAssets<'_> {
        ContextAssets::from_store(&self.store)
    }

    /// Resolve, compose and package one spec.
    pub fn assemble_spec(&self, spec: &Spec) -> Result<Bundle> {
        let resolved = resolve(spec, &self.store)?;
        let text = self.composer.compose(&resolved);
        self.factory.build(&resolved, text)
    }

    fn assemble_indexed(&self, spec: &Spec, id: String) -> Result<Bundle> {
        let resolved = resolve(spec, &self.store)?;
        let text = self.composer.compose(&resolved);
        self.factory.build_with_id(&resolved, text, BundleId::Indexed(id))
    }

    pub fn assemble_batch<I, L, S>(&self, items: I, sink: &mut S) -> BatchReport
    where
        I: IntoIterator<Item = (L, Spec)>,
        L: Into<String>,
        S: BundleSink + ?Sized,
    {
        let mut report = BatchReport::default();
        for (label, spec) in items {
            report.record(label, self.assemble_spec(&spec), sink);
        }
        report
    }

    /// Assemble every `*.json` spec document in `dir`, in file-name order.
    /// Unreadable directory entries are reported as failures.
    pub fn assemble_spec_dir<S: BundleSink + ?Sized>(&self, dir: &Path, sink: &mut S) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => report.fail(format!("entry in {}", dir.display()), &e.into()),
            }
        }
        paths.retain(|p| p.extension().map_or(false, |e| e == "json"));
        paths.sort();

        for path in paths {
            let label = path.display().to_string();
            let outcome = SpecDocument::from_file(&path).and_then(|doc| self.assemble_spec(doc.spec()));
            report.record(label, outcome, sink);
        }
        Ok(report)
    }

    /// Characters x poses x scenes from the filtered store. Each pose carries
    /// the filtered wardrobe items compatible with it, possibly none. The
    /// first lighting and model rows apply to every bundle.
    pub fn assemble_selection<S: BundleSink + ?Sized>(
        &self,
        selection: &AssemblySelection,
        sink: &mut S,
    ) -> BatchReport {
        let mut generator = MatrixGenerator::new(vec![
            (Category::Characters, selection.characters.apply(self.store.list(Category::Characters))),
            (Category::Poses, selection.poses.apply(self.store.list(Category::Poses))),
            (Category::Scenes, selection.scenes.apply(self.store.list(Category::Scenes))),
        ]);
        let pool = selection.wardrobe.apply(self.store.list(Category::Wardrobe));
        let pool_size = pool.len();
        if !pool.is_empty() {
            generator = generator.with_wardrobe_filter(pool);
        }
        let lighting = self.store.first(Category::Lighting).map(|r| r.id().to_string());
        let model = self.store.first(Category::Models).map(|r| r.id().to_string());
        info!(combinations = generator.len(), wardrobe = pool_size, "filtered assembly");

        let mut report = BatchReport::default();
        for (i, mut spec) in generator.iter().enumerate() {
            spec.lighting = lighting.clone();
            spec.model = model.clone();
            report.record(format!("combination {}", i), self.assemble_spec(&spec), sink);
        }
        report
    }

    /// Build the matrix over `axes` from the store and assemble every tuple.
    pub fn assemble_matrix<S: BundleSink + ?Sized>(&self, axes: &[Category], sink: &mut S) -> BatchReport {
        let generator = MatrixGenerator::new(
            axes.iter()
                .map(|&c| (c, self.store.list(c).to_vec()))
                .collect(),
        );
        info!(axes = axes.len(), combinations = generator.len(), "matrix generation");

        let mut report = BatchReport::default();
        for (i, spec) in generator.iter().enumerate() {
            report.record(
                format!("combination {}", i),
                self.assemble_indexed(&spec, format!("matrix_{:04}", i)),
                sink,
            );
        }
        report
    }

    /// Spec stubs for every combination of the filtered categories. The
    /// filtered wardrobe is attached to every stub; categories with no rows
    /// at all are left unset.
    pub fn compose_specs(&self, filters: &[(Category, AssetFilter)]) -> Vec<SpecEnvelope> {
        let filtered = |category: Category| {
            let records = self.store.list(category);
            filters
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, f)| f.apply(records))
                .unwrap_or_else(|| records.to_vec())
        };

        let wardrobe: Vec<String> = filtered(Category::Wardrobe)
            .iter()
            .map(|w| w.id().to_string())
            .collect();
        let generator = MatrixGenerator::new(
            [
                Category::Characters,
                Category::Poses,
                Category::Orientations,
                Category::Scenes,
                Category::Lighting,
                Category::Models,
            ]
            .into_iter()
            .filter(|&c| !self.store.list(c).is_empty())
            .map(|c| (c, filtered(c)))
            .collect(),
        );

        generator
            .iter()
            .enumerate()
            .map(|(i, mut spec)| {
                spec.wardrobe = wardrobe.clone();
                SpecEnvelope::numbered(i, spec)
            })
            .collect()
    }

    /// Bundles for the first `limit` Tenner permutations (all when `None`).
    pub fn generate_tenner<S: BundleSink + ?Sized>(
        &self,
        generator: &TennerGenerator,
        limit: Option<u64>,
        sink: &mut S,
    ) -> BatchReport {
        let context = self.context();
        let take = limit.map_or(generator.len(), |l| l.min(generator.len()));
        info!(space = generator.len(), taking = take, "tenner generation");

        let mut report = BatchReport::default();
        for permutation in generator.iter().take(take as usize) {
            report.record(
                format!("permutation {}", permutation.index),
                permutation.to_bundle(&self.composer, &self.factory, &context),
                sink,
            );
        }
        report
    }

    /// One bundle per non-empty entry of each numbered Tenner. A missing
    /// table fails only that Tenner.
    pub fn generate_individual_tenners<S: BundleSink + ?Sized>(
        &self,
        numbers: &[TennerNumber],
        tenner_dir: &Path,
        sink: &mut S,
    ) -> BatchReport {
        let context = self.context();
        let mut report = BatchReport::default();
        for &number in numbers {
            let outcome = number
                .load_entries(tenner_dir)
                .and_then(|entries| {
                    individual_bundles(number, &entries, &self.composer, &self.factory, &context)
                });
            match outcome {
                Ok(bundles) => {
                    for bundle in bundles {
                        let item = bundle.id.clone();
                        report.record(item, Ok(bundle), sink);
                    }
                }
                Err(e) => report.fail(number.to_string(), &e),
            }
        }
        report
    }

    /// Every combination of every chunk. A chunk with a missing component
    /// table is recorded as one failure.
    pub fn generate_chunks<S: BundleSink + ?Sized>(
        &self,
        chunks: &[&ChunkDefinition],
        tenner_dir: &Path,
        skeletons: &SkeletonRegistry,
        sink: &mut S,
    ) -> BatchReport {
        let context = self.context();
        let mut report = BatchReport::default();
        for &chunk in chunks {
            let generator = match ChunkCombinationGenerator::load(chunk, tenner_dir, skeletons) {
                Ok(g) => g,
                Err(e) => {
                    report.fail(chunk.id.to_string(), &e);
                    continue;
                }
            };
            let before = report.converted();
            for combo in generator.iter() {
                report.record(
                    combo.combination_id(chunk.id),
                    combo.to_bundle(chunk, &self.composer, &self.factory, &context),
                    sink,
                );
            }
            info!(chunk = %chunk.id, bundles = report.converted() - before, "chunk generated");
        }
        report
    }
}
