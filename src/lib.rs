//! Prompt Assembler Core - Bundle Assembly Engine
//!
//! Turns symbolic specs into reproducible prompt bundles.
//!
//! # Guarantees
//! 1. The store is a read-only snapshot, passed explicitly
//! 2. Prompt part order and punctuation are a compatibility contract
//! 3. Seed and checksum depend only on spec and snapshot
//! 4. Ids never depend on the wall clock
//! 5. One failed work item never aborts a batch

pub mod error;
pub mod schema;
pub mod store;
pub mod spec;
pub mod resolver;
pub mod camera;
pub mod composer;
pub mod hashing;
pub mod config;
pub mod bundle;
pub mod matrix;
pub mod tenner;
pub mod skeleton;
pub mod chunk;
pub mod catalog;
pub mod pipeline;

pub use error::{EngineError, Result};
pub use store::{AssetRecord, AssetStore, Category};
pub use spec::{CameraOverride, Spec, SpecDocument, SpecEnvelope};
pub use resolver::{resolve, ContextAssets, ResolvedAssets};
pub use composer::{compose, PromptComposer};
pub use hashing::{canonical_json, derive_seed, inputs_checksum};
pub use config::EngineConfig;
pub use bundle::{Bundle, BundleFactory, SpecSnapshot};
pub use matrix::{AssetFilter, MatrixGenerator};
pub use tenner::{decode, TennerGenerator, TennerNumber, TennerSet};
pub use skeleton::SkeletonRegistry;
pub use chunk::{ChunkCombinationGenerator, ChunkDefinition, ChunkId};
pub use catalog::{Catalog, CatalogBuilder, CatalogSummary};
pub use pipeline::{
    AssemblyPipeline, AssemblySelection, BatchReport, BatchSummary, BundleSink, BundleWriter,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
